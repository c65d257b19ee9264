//! Concurrent compilation cache
//!
//! Compiled shaders are keyed by their exact source text. Compilation happens
//! outside any lock, so two threads missing on the same source may both
//! compile; the first result stored wins and every caller receives that one.

use crate::compiler::{self, CompileError, CompiledShader};
use dashmap::DashMap;
use std::sync::Arc;

type CompileFn = dyn Fn(&str) -> Result<CompiledShader, CompileError> + Send + Sync;

/// Map from source text to its compiled form
pub struct ShaderCache {
    entries: DashMap<String, Arc<CompiledShader>>,
    compiler: Box<CompileFn>,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderCache").field("entries", &self.entries.len()).finish_non_exhaustive()
    }
}

impl ShaderCache {
    /// Creates an empty cache backed by [`compiler::compile`]
    pub fn new() -> Self {
        Self::with_compiler(compiler::compile)
    }

    /// Creates an empty cache that compiles with `compiler`
    pub fn with_compiler(compiler: impl Fn(&str) -> Result<CompiledShader, CompileError> + Send + Sync + 'static) -> Self {
        Self {
            entries: DashMap::with_capacity(16),
            compiler: Box::new(compiler),
        }
    }

    /// Returns the compiled form of `source`, compiling it on a miss
    ///
    /// # Errors
    /// Returns the [`CompileError`] of a failed compilation. Failures are not
    /// cached, so a later call with the same text compiles again.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<CompiledShader>, CompileError> {
        if let Some(shader) = self.entries.get(source) {
            tracing::trace!(bytes = source.len(), "Shader cache hit");
            return Ok(Arc::clone(shader.value()));
        }

        tracing::debug!(bytes = source.len(), "Shader cache miss, compiling");
        let compiled = Arc::new((self.compiler)(source)?);
        let stored = self.entries.entry(source.to_string()).or_insert(compiled);
        Ok(Arc::clone(stored.value()))
    }

    /// Returns the cached entry for `source` without compiling
    pub fn get(&self, source: &str) -> Option<Arc<CompiledShader>> {
        self.entries.get(source).map(|shader| Arc::clone(shader.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
