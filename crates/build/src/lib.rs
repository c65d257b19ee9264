//! glprog build utilities
//!
//! This crate holds everything in the shader program pipeline that does not
//! need a GPU: the property context, the shader language compiler and its
//! compilation cache, the GLSL stage generator, and the reader for raw
//! `.properties` slot files. Its output is a [`ProgramSource`], which the
//! `glprog` runtime crate links into a GPU program.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod generator;
pub mod properties;
pub mod raw;
pub mod source;

pub use cache::ShaderCache;
pub use compiler::{CompileError, CompiledShader, compile};
pub use config::{ConfigError, ShaderConfig};
pub use generator::{GenerateError, GeneratedProgram, GlslGenerator, GlslVersion, generate_program_source};
pub use properties::{PropertyContext, PropertyType, PropertyValue, Viewport};
pub use raw::{PropertiesError, RawProgram};
pub use source::{ProgramSource, StageKind};

/// Compiles a unified `.program` file and generates both stages for `config`
///
/// Convenience wrapper used by tooling; runtime callers go through a
/// [`ShaderCache`] so the compilation is shared.
///
/// # Arguments
/// * `program_filepath` - Path to the `.program` source
/// * `config` - Target dialect and default properties
/// * `properties` - Values layered over the configured defaults
///
/// # Returns
/// The compiled IR together with the generated program source
pub fn program_file_to_source(
    program_filepath: &str,
    config: &ShaderConfig,
    properties: &PropertyContext,
) -> Result<(CompiledShader, ProgramSource), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(program_filepath)?;
    let shader = compile(&source)?;
    let properties = config.properties.merged_with(properties);
    let program = generate_program_source(&shader, &properties, config.version)?;
    Ok((shader, program))
}
