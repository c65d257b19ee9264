//! Error types of the runtime crate

use glprog_build::{CompileError, GenerateError, PropertiesError};

/// Error raised while locating or reading shader assets
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Some but not all of the stage-pair files exist
    #[error("Missing files for GLSL shader {name}: {}", .missing.join(", "))]
    Incomplete { name: String, missing: Vec<String> },
    /// Neither a stage pair nor a unified program exists
    #[error("No shader program found for {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {path}: {source}")]
    Properties {
        path: String,
        #[source]
        source: PropertiesError,
    },
}

/// Error returned by program creation
///
/// Compile and link diagnostics reported by the driver are not errors; they
/// are logged and reflected in the returned program's status.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to compile shader program: {0}")]
    Compile(#[from] CompileError),
    #[error("failed to generate shader program: {0}")]
    Generate(#[from] GenerateError),
    /// The source names more attribute or uniform slots than a program can hold
    #[error("program source has {attributes} attribute slots and {uniforms} uniform slots, limits are {max_attributes} and {max_uniforms}")]
    Capacity {
        attributes: usize,
        uniforms: usize,
        max_attributes: usize,
        max_uniforms: usize,
    },
    /// The backend could not allocate a stage or program object
    #[error("graphics backend error: {0}")]
    Backend(String),
}
