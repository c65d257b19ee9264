//! [`GpuBackend`] implementation on top of `glow`

use crate::backend::{GpuBackend, StageKind, StateBackend};
use glow::HasContext;

/// Backend issuing calls on a native `glow` context
///
/// The context must be current on the calling thread for as long as the
/// backend is used.
pub struct GlowBackend<'a> {
    gl: &'a glow::Context,
}

impl<'a> GlowBackend<'a> {
    /// Wraps `gl`
    ///
    /// Use the backend only on the thread where `gl` is current.
    pub fn new(gl: &'a glow::Context) -> Self {
        Self { gl }
    }
}

impl GpuBackend for GlowBackend<'_> {
    type Stage = glow::Shader;
    type Program = glow::Program;

    fn create_stage(&mut self, kind: StageKind) -> Result<glow::Shader, String> {
        let shader_type = match kind {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(shader_type) }
    }

    fn compile_stage(&mut self, stage: &glow::Shader, source: &str) {
        unsafe {
            self.gl.shader_source(*stage, source);
            self.gl.compile_shader(*stage);
        }
    }

    fn stage_compiled(&mut self, stage: &glow::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(*stage) }
    }

    fn stage_log(&mut self, stage: &glow::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(*stage) }
    }

    fn delete_stage(&mut self, stage: glow::Shader) {
        unsafe { self.gl.delete_shader(stage) }
    }

    fn create_program(&mut self) -> Result<glow::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_stage(&mut self, program: &glow::Program, stage: &glow::Shader) {
        unsafe { self.gl.attach_shader(*program, *stage) }
    }

    fn detach_stage(&mut self, program: &glow::Program, stage: &glow::Shader) {
        unsafe { self.gl.detach_shader(*program, *stage) }
    }

    fn bind_attribute(&mut self, program: &glow::Program, slot: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(*program, slot, name) }
    }

    fn link_program(&mut self, program: &glow::Program) {
        unsafe { self.gl.link_program(*program) }
    }

    fn program_linked(&mut self, program: &glow::Program) -> bool {
        unsafe { self.gl.get_program_link_status(*program) }
    }

    fn program_log(&mut self, program: &glow::Program) -> String {
        unsafe { self.gl.get_program_info_log(*program) }
    }

    fn uniform_location(&mut self, program: &glow::Program, name: &str) -> Option<i32> {
        let location = unsafe { self.gl.get_uniform_location(*program, name) }?;
        i32::try_from(location.0).ok()
    }

    fn delete_program(&mut self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }
}

impl StateBackend for GlowBackend<'_> {
    type Texture = glow::Texture;

    fn use_program(&mut self, program: Option<&glow::Program>) {
        unsafe { self.gl.use_program(program.copied()) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, texture: Option<&glow::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture.copied()) }
    }
}
