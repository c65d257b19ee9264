//! Shader manager
//!
//! Ties asset resolution, the compilation cache, the stage generator and the
//! program assembler together behind [`ShaderManager::create_program`].

use crate::assembler::{LinkedProgram, assemble};
use crate::assets::{AssetSource, ProgramAsset, resolve_program};
use crate::backend::GpuBackend;
use crate::error::{AssetError, ProgramError};
use glprog_build::{ConfigError, ProgramSource, PropertyContext, RawProgram, ShaderCache, ShaderConfig, generate_program_source};
use std::sync::Arc;

/// Creates GPU programs from named shader assets
#[derive(Debug, Clone, Default)]
pub struct ShaderManager {
    config: ShaderConfig,
    cache: Arc<ShaderCache>,
}

impl ShaderManager {
    /// Creates a manager with its own empty cache
    pub fn new(config: ShaderConfig) -> Self {
        Self::with_cache(config, Arc::new(ShaderCache::new()))
    }

    /// Creates a manager sharing `cache` with other managers or threads
    pub fn with_cache(config: ShaderConfig, cache: Arc<ShaderCache>) -> Self {
        Self { config, cache }
    }

    /// Creates a manager from YAML configuration content
    pub fn from_yaml(yaml_content: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(ShaderConfig::from_yaml(yaml_content)?))
    }

    pub fn config(&self) -> &ShaderConfig {
        &self.config
    }

    /// The compilation cache; clone the `Arc` to pre-compile on other threads
    pub fn cache(&self) -> &Arc<ShaderCache> {
        &self.cache
    }

    /// Resolves and prepares program `name` without touching the GPU
    ///
    /// `properties` is layered over the configured defaults. Callers normally
    /// pass a context built with [`PropertyContext::from_viewport`] so that the
    /// engine viewport properties are available.
    ///
    /// # Errors
    /// Returns a [`ProgramError`] if the asset cannot be resolved, compiled or
    /// generated.
    pub fn program_source(&self, assets: &impl AssetSource, name: &str, properties: &PropertyContext) -> Result<ProgramSource, ProgramError> {
        match resolve_program(assets, name)? {
            ProgramAsset::StagePair {
                vertex,
                fragment,
                properties: slot_file,
            } => {
                let raw = RawProgram::parse_properties(&slot_file).map_err(|source| AssetError::Properties {
                    path: format!("{name}.properties"),
                    source,
                })?;
                Ok(raw.into_program_source(vertex, fragment))
            }
            ProgramAsset::Unified(source) => {
                let shader = self.cache.get_or_compile(&source).inspect_err(|e| tracing::error!(asset = name, "Failed to compile shader program: {e}"))?;
                let properties = self.config.properties.merged_with(properties);
                Ok(generate_program_source(&shader, &properties, self.config.version)?)
            }
        }
    }

    /// Resolves, prepares and links program `name`
    ///
    /// Nothing is sent to the GPU unless the asset resolves and generates
    /// cleanly. Driver compile and link failures do not fail this call; check
    /// [`LinkedProgram::status`].
    ///
    /// # Arguments
    /// * `backend` - Graphics backend bound to the current context
    /// * `assets` - Where shader files are read from
    /// * `name` - Asset name without extension, e.g. `shader/Basic`
    /// * `properties` - Values layered over the configured defaults
    ///
    /// # Errors
    /// Returns a [`ProgramError`] if the asset cannot be prepared or the
    /// backend cannot allocate objects.
    pub fn create_program<B: GpuBackend>(
        &self,
        backend: &mut B,
        assets: &impl AssetSource,
        name: &str,
        properties: &PropertyContext,
    ) -> Result<LinkedProgram<B::Program>, ProgramError> {
        let source = self.program_source(assets, name, properties)?;
        tracing::debug!(program = name, "Assembling shader program");
        assemble(backend, &source)
    }
}
