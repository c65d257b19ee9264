//! Backend that records every call, for tests

use crate::backend::{GpuBackend, StageKind, StateBackend};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateStage(StageKind),
    CompileStage { stage: u32, source: String },
    DeleteStage(u32),
    CreateProgram,
    AttachStage { program: u32, stage: u32 },
    DetachStage { program: u32, stage: u32 },
    BindAttribute { program: u32, slot: u32, name: String },
    LinkProgram(u32),
    UniformLocation { program: u32, name: String },
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    ActiveTexture(u32),
    BindTexture(Option<u32>),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    /// Uniform locations reported by the fake linker
    pub locations: HashMap<String, i32>,
    /// Stages whose compilation reports failure
    pub failing_stages: HashSet<StageKind>,
    /// Stages that cannot be allocated
    pub unallocatable_stages: HashSet<StageKind>,
    pub fail_link: bool,
    pub fail_create_program: bool,
    next_handle: u32,
    stage_kinds: HashMap<u32, StageKind>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(locations: &[(&str, i32)]) -> Self {
        Self {
            locations: locations.iter().map(|(name, location)| (name.to_string(), *location)).collect(),
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Position of the first call matching `predicate`
    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Source uploaded to the first stage of `kind`
    pub fn uploaded_source(&self, kind: StageKind) -> Option<&str> {
        self.calls.iter().find_map(|call| match call {
            Call::CompileStage { stage, source } if self.stage_kinds.get(stage) == Some(&kind) => Some(source.as_str()),
            _ => None,
        })
    }
}

impl GpuBackend for RecordingBackend {
    type Stage = u32;
    type Program = u32;

    fn create_stage(&mut self, kind: StageKind) -> Result<u32, String> {
        self.calls.push(Call::CreateStage(kind));
        if self.unallocatable_stages.contains(&kind) {
            return Err(format!("out of {kind} stage objects"));
        }
        let stage = self.allocate();
        self.stage_kinds.insert(stage, kind);
        Ok(stage)
    }

    fn compile_stage(&mut self, stage: &u32, source: &str) {
        self.calls.push(Call::CompileStage {
            stage: *stage,
            source: source.to_string(),
        });
    }

    fn stage_compiled(&mut self, stage: &u32) -> bool {
        self.stage_kinds.get(stage).is_some_and(|kind| !self.failing_stages.contains(kind))
    }

    fn stage_log(&mut self, stage: &u32) -> String {
        if self.stage_compiled(stage) { String::new() } else { "0:1(1): error: syntax error".to_string() }
    }

    fn delete_stage(&mut self, stage: u32) {
        self.calls.push(Call::DeleteStage(stage));
    }

    fn create_program(&mut self) -> Result<u32, String> {
        self.calls.push(Call::CreateProgram);
        if self.fail_create_program {
            return Err("out of program objects".to_string());
        }
        Ok(self.allocate())
    }

    fn attach_stage(&mut self, program: &u32, stage: &u32) {
        self.calls.push(Call::AttachStage {
            program: *program,
            stage: *stage,
        });
    }

    fn detach_stage(&mut self, program: &u32, stage: &u32) {
        self.calls.push(Call::DetachStage {
            program: *program,
            stage: *stage,
        });
    }

    fn bind_attribute(&mut self, program: &u32, slot: u32, name: &str) {
        self.calls.push(Call::BindAttribute {
            program: *program,
            slot,
            name: name.to_string(),
        });
    }

    fn link_program(&mut self, program: &u32) {
        self.calls.push(Call::LinkProgram(*program));
    }

    fn program_linked(&mut self, _program: &u32) -> bool {
        !self.fail_link
    }

    fn program_log(&mut self, _program: &u32) -> String {
        if self.fail_link { "error: vertex output v_uv not read by fragment stage".to_string() } else { String::new() }
    }

    fn uniform_location(&mut self, program: &u32, name: &str) -> Option<i32> {
        self.calls.push(Call::UniformLocation {
            program: *program,
            name: name.to_string(),
        });
        self.locations.get(name).copied()
    }

    fn delete_program(&mut self, program: u32) {
        self.calls.push(Call::DeleteProgram(program));
    }
}

impl StateBackend for RecordingBackend {
    type Texture = u32;

    fn use_program(&mut self, program: Option<&u32>) {
        self.calls.push(Call::UseProgram(program.copied()));
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(Call::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<&u32>) {
        self.calls.push(Call::BindTexture(texture.copied()));
    }
}
