//! Developer tooling: read-only inspection of furs and shader surfaces.

mod inspector;

pub use inspector::{FurInspector, FurSummary, ShellInfo};
