//! Scene kernel: node hierarchy, world transforms and frame stepping.
//!
//! # Invariants
//! - Every mutation flows through an explicit operation and is logged.
//! - A node's world transform is its local transform composed under its parent chain.
//! - Iteration order is deterministic (BTreeMap).

pub mod scene;

pub use scene::{NodeData, Scene, SceneEvent};
