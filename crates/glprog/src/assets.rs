//! Shader asset resolution
//!
//! A program named `shader/Basic` is either a stage pair
//! (`shader/Basic.vsh`, `shader/Basic.fsh`, `shader/Basic.properties`) or a
//! single unified `shader/Basic.program`. The stage pair wins when any of its
//! files exists, in which case all three must.

use crate::error::AssetError;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Read access to named text assets
pub trait AssetSource {
    /// Reads `path`, returning `None` if the asset does not exist
    ///
    /// # Errors
    /// Returns an I/O error for any failure other than a missing asset.
    fn read(&self, path: &str) -> io::Result<Option<String>>;
}

/// Assets stored under a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn read(&self, path: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.root.join(path)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// In-memory assets keyed by path
impl AssetSource for HashMap<String, String> {
    fn read(&self, path: &str) -> io::Result<Option<String>> {
        Ok(self.get(path).cloned())
    }
}

/// Raw text of a resolved program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramAsset {
    /// Hand-written stages plus their slot file
    StagePair { vertex: String, fragment: String, properties: String },
    /// Shader language source
    Unified(String),
}

/// Looks up the files making up program `name`
///
/// # Errors
/// Returns [`AssetError::Incomplete`] when only part of a stage pair exists,
/// [`AssetError::NotFound`] when neither form exists, and
/// [`AssetError::Io`] when a read fails.
pub fn resolve_program(assets: &impl AssetSource, name: &str) -> Result<ProgramAsset, AssetError> {
    let read = |path: String| -> Result<(String, Option<String>), AssetError> {
        match assets.read(&path) {
            Ok(text) => Ok((path, text)),
            Err(source) => Err(AssetError::Io { path, source }),
        }
    };

    let (vertex_path, vertex) = read(format!("{name}.vsh"))?;
    let (fragment_path, fragment) = read(format!("{name}.fsh"))?;
    let (properties_path, properties) = read(format!("{name}.properties"))?;

    match (vertex, fragment, properties) {
        (Some(vertex), Some(fragment), Some(properties)) => {
            tracing::debug!(asset = name, "Resolved stage-pair shader program");
            Ok(ProgramAsset::StagePair { vertex, fragment, properties })
        }
        (None, None, None) => {
            let (_, program) = read(format!("{name}.program"))?;
            let program = program.ok_or_else(|| AssetError::NotFound(name.to_string()))?;
            tracing::debug!(asset = name, "Resolved unified shader program");
            Ok(ProgramAsset::Unified(program))
        }
        (vertex, fragment, properties) => {
            let missing = [(vertex_path, vertex), (fragment_path, fragment), (properties_path, properties)]
                .into_iter()
                .filter_map(|(path, text)| text.is_none().then_some(path))
                .collect();
            Err(AssetError::Incomplete {
                name: name.to_string(),
                missing,
            })
        }
    }
}
