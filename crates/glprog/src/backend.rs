//! Graphics API seam
//!
//! The assembler and the binding tracker only talk to the GPU through these
//! traits. Every method must be called from the thread that owns the graphics
//! context; implementations are not expected to be `Sync`.

pub use glprog_build::StageKind;

/// Shader object and program lifecycle operations
pub trait GpuBackend {
    /// Handle of a compiled stage object
    type Stage;
    /// Handle of a linked program
    type Program: Clone + PartialEq;

    /// Allocates a stage object
    ///
    /// # Errors
    /// Returns a description of the failure if the driver cannot allocate one.
    fn create_stage(&mut self, kind: StageKind) -> Result<Self::Stage, String>;
    /// Uploads `source` and requests compilation
    fn compile_stage(&mut self, stage: &Self::Stage, source: &str);
    /// Returns whether the last compilation of `stage` succeeded
    fn stage_compiled(&mut self, stage: &Self::Stage) -> bool;
    /// Returns the compiler log of `stage`, possibly empty
    fn stage_log(&mut self, stage: &Self::Stage) -> String;
    fn delete_stage(&mut self, stage: Self::Stage);

    /// Allocates a program object
    ///
    /// # Errors
    /// Returns a description of the failure if the driver cannot allocate one.
    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_stage(&mut self, program: &Self::Program, stage: &Self::Stage);
    fn detach_stage(&mut self, program: &Self::Program, stage: &Self::Stage);
    /// Binds attribute `name` to `slot`; only takes effect on the next link
    fn bind_attribute(&mut self, program: &Self::Program, slot: u32, name: &str);
    fn link_program(&mut self, program: &Self::Program);
    /// Returns whether the last link of `program` succeeded
    fn program_linked(&mut self, program: &Self::Program) -> bool;
    /// Returns the linker log of `program`, possibly empty
    fn program_log(&mut self, program: &Self::Program) -> String;
    /// Looks up a uniform; `None` if the program has no active uniform by that name
    fn uniform_location(&mut self, program: &Self::Program, name: &str) -> Option<i32>;
    fn delete_program(&mut self, program: Self::Program);
}

/// Bind-state operations used by the binding tracker
pub trait StateBackend: GpuBackend {
    /// Handle of a texture object
    type Texture: Clone + PartialEq;

    /// Makes `program` current, or unbinds the current program
    fn use_program(&mut self, program: Option<&Self::Program>);
    /// Selects texture unit `unit` for subsequent binds
    fn active_texture(&mut self, unit: u32);
    /// Binds `texture` as a 2D texture on the active unit
    fn bind_texture(&mut self, texture: Option<&Self::Texture>);
}
