use shellfur_common::{EntityId, MaterialHandle, MeshHandle};
use std::path::PathBuf;

/// Configuration errors raised when shell instances cannot be built.
///
/// Activation checks everything before creating a single instance, so an
/// error never leaves half-built shells behind.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("no shell mesh assigned")]
    MissingMesh,
    #[error("no shell material assigned")]
    MissingMaterial,
    #[error("shell mesh {0:?} is not registered")]
    UnknownMesh(MeshHandle),
    #[error("shell material {0:?} is not registered")]
    UnknownMaterial(MaterialHandle),
    #[error("owner {0:?} is not in the scene")]
    OwnerNotFound(EntityId),
}

/// Errors from loading a fur configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}
