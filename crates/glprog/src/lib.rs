//! Shader program creation for OpenGL-style graphics backends
//!
//! This crate links [`ProgramSource`]s produced by `glprog-build` into GPU
//! programs. It resolves named shader assets, runs unified programs through
//! the shared compilation cache and stage generator, and drives the compile,
//! link and introspection steps through a [`GpuBackend`].
//!
//! Everything that talks to a backend must run on the thread owning the
//! graphics context. Compilation and generation may run anywhere.

mod error;
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod glow_backend;
#[cfg(test)]
mod recording;

pub mod assembler;
pub mod assets;
pub mod backend;
pub mod manager;
pub mod tracker;

pub use assembler::{LinkStatus, LinkedProgram, UNRESOLVED_LOCATION, UniformLocations, assemble};
pub use assets::{AssetSource, DirectoryAssets, ProgramAsset, resolve_program};
pub use backend::{GpuBackend, StageKind, StateBackend};
pub use error::{AssetError, ProgramError};
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use glow_backend::GlowBackend;
pub use glprog_build::{ProgramSource, PropertyContext, ShaderConfig, Viewport};
pub use manager::ShaderManager;
pub use tracker::{BindingTracker, TrackerError};
