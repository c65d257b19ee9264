//! Program assembler
//!
//! Drives a [`ProgramSource`] through the GPU lifecycle: create and compile
//! both stages, create the program, bind attributes, link, resolve uniform
//! locations, then free the stage objects.
//!
//! Driver diagnostics never abort assembly. A stage that fails to compile or a
//! program that fails to link is logged and reported through
//! [`LinkedProgram::status`], and the caller still receives a program handle
//! and a complete location table. Only oversized slot tables and allocation
//! failures are errors.

use crate::backend::{GpuBackend, StageKind};
use crate::error::ProgramError;
use glprog_build::ProgramSource;
use glprog_build::compiler::{MAX_ATTRIBUTES, MAX_UNIFORMS};

/// Location reported for unnamed slots and uniforms the linker did not keep
pub const UNRESOLVED_LOCATION: i32 = -1;

/// Uniform locations indexed by slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformLocations(Vec<i32>);

impl UniformLocations {
    /// Location of `slot`, or [`UNRESOLVED_LOCATION`] past the end of the table
    pub fn get(&self, slot: usize) -> i32 {
        self.0.get(slot).copied().unwrap_or(UNRESOLVED_LOCATION)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of the link step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Linked,
    LinkFailed,
}

/// A program handle together with its resolved uniform locations
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedProgram<P> {
    /// Program handle, owned by the caller from here on
    pub handle: P,
    /// One entry per uniform slot of the source
    pub uniform_locations: UniformLocations,
    pub status: LinkStatus,
    /// Stages whose compilation reported failure
    pub failed_stages: Vec<StageKind>,
}

impl<P> LinkedProgram<P> {
    /// Returns true if every stage compiled and the program linked
    pub fn is_usable(&self) -> bool {
        self.status == LinkStatus::Linked && self.failed_stages.is_empty()
    }
}

/// Compiles, links and introspects a program
///
/// # Arguments
/// * `backend` - Graphics backend bound to the current context
/// * `source` - Stage texts and slot names
///
/// # Returns
/// The program handle, its uniform location table and link status
///
/// # Errors
/// Returns [`ProgramError::Capacity`] before any backend call if the slot
/// tables exceed [`MAX_ATTRIBUTES`] or [`MAX_UNIFORMS`], and
/// [`ProgramError::Backend`] if a stage or program object cannot be
/// allocated. Stage objects created before the failure are deleted.
pub fn assemble<B: GpuBackend>(backend: &mut B, source: &ProgramSource) -> Result<LinkedProgram<B::Program>, ProgramError> {
    if !source.is_within_capacity() {
        return Err(ProgramError::Capacity {
            attributes: source.attributes.len(),
            uniforms: source.uniforms.len(),
            max_attributes: MAX_ATTRIBUTES,
            max_uniforms: MAX_UNIFORMS,
        });
    }

    // Create stages
    let vertex = backend.create_stage(StageKind::Vertex).map_err(ProgramError::Backend)?;
    let fragment = match backend.create_stage(StageKind::Fragment) {
        Ok(stage) => stage,
        Err(e) => {
            backend.delete_stage(vertex);
            return Err(ProgramError::Backend(e));
        }
    };

    // Upload and compile; failures are recorded, not fatal
    let mut failed_stages = Vec::new();
    for (kind, stage) in [(StageKind::Vertex, &vertex), (StageKind::Fragment, &fragment)] {
        backend.compile_stage(stage, source.stage(kind));
        let compiled = backend.stage_compiled(stage);
        let log = backend.stage_log(stage);
        let log = log.trim();
        if !compiled {
            tracing::warn!(stage = %kind, "Failed to compile shader stage:\n{log}");
            failed_stages.push(kind);
        } else if !log.is_empty() {
            tracing::info!(stage = %kind, "Shader stage compile log:\n{log}");
        }
    }

    let program = match backend.create_program() {
        Ok(program) => program,
        Err(e) => {
            backend.delete_stage(vertex);
            backend.delete_stage(fragment);
            return Err(ProgramError::Backend(e));
        }
    };
    backend.attach_stage(&program, &vertex);
    backend.attach_stage(&program, &fragment);

    // Attribute bindings only take effect on link
    for (slot, name) in source.named_attributes() {
        backend.bind_attribute(&program, slot, name);
    }

    backend.link_program(&program);
    let status = if backend.program_linked(&program) { LinkStatus::Linked } else { LinkStatus::LinkFailed };
    let log = backend.program_log(&program);
    let log = log.trim();
    match status {
        LinkStatus::LinkFailed => tracing::error!("Failed to link shader program:\n{log}"),
        LinkStatus::Linked if !log.is_empty() => tracing::info!("Shader program link log:\n{log}"),
        LinkStatus::Linked => {}
    }

    let locations = source
        .uniforms
        .iter()
        .map(|name| match name {
            Some(name) => backend.uniform_location(&program, name).unwrap_or(UNRESOLVED_LOCATION),
            None => UNRESOLVED_LOCATION,
        })
        .collect();

    backend.detach_stage(&program, &vertex);
    backend.detach_stage(&program, &fragment);
    backend.delete_stage(vertex);
    backend.delete_stage(fragment);

    Ok(LinkedProgram {
        handle: program,
        uniform_locations: UniformLocations(locations),
        status,
        failed_stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingBackend};
    use glprog_build::RawProgram;

    fn stage_pair() -> ProgramSource {
        RawProgram::parse_properties("Attribute.0 = in_Position\nUniform.0 = mvpMatrix\nUniform.2 = texture\n")
            .unwrap()
            .into_program_source("void main() { gl_Position = vec4(0.0); }", "void main() {}")
    }

    #[test]
    fn test_stage_pair_end_to_end() {
        let mut backend = RecordingBackend::with_locations(&[("mvpMatrix", 3), ("texture", 7)]);
        let program = assemble(&mut backend, &stage_pair()).unwrap();

        assert_eq!(program.status, LinkStatus::Linked);
        assert!(program.is_usable());
        assert_eq!(program.uniform_locations.len(), MAX_UNIFORMS);
        assert_eq!(program.uniform_locations.get(0), 3);
        assert_eq!(program.uniform_locations.get(1), UNRESOLVED_LOCATION);
        assert_eq!(program.uniform_locations.get(2), 7);

        let bind = backend
            .position(|call| matches!(call, Call::BindAttribute { slot: 0, name, .. } if name == "in_Position"))
            .unwrap();
        let link = backend.position(|call| matches!(call, Call::LinkProgram(_))).unwrap();
        assert!(bind < link);
    }

    #[test]
    fn test_unnamed_slots_are_never_queried() {
        let source = ProgramSource {
            uniforms: vec![None, Some("u_color".to_string()), None, Some("u_missing".to_string())],
            ..Default::default()
        };
        let mut backend = RecordingBackend::with_locations(&[("u_color", 4)]);
        let program = assemble(&mut backend, &source).unwrap();

        assert_eq!(program.uniform_locations.as_slice(), &[-1, 4, -1, -1]);
        assert_eq!(backend.count(|call| matches!(call, Call::UniformLocation { .. })), 2);
    }

    #[test]
    fn test_link_failure_still_returns_program() {
        let mut backend = RecordingBackend::with_locations(&[("mvpMatrix", 0)]);
        backend.fail_link = true;
        let program = assemble(&mut backend, &stage_pair()).unwrap();

        assert_eq!(program.status, LinkStatus::LinkFailed);
        assert!(!program.is_usable());
        assert_eq!(program.uniform_locations.len(), MAX_UNIFORMS);
        assert_eq!(program.uniform_locations.get(0), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::DeleteStage(_))), 2);
        assert_eq!(backend.count(|call| matches!(call, Call::DeleteProgram(_))), 0);
    }

    #[test]
    fn test_compile_failure_is_recorded() {
        let mut backend = RecordingBackend::new();
        backend.failing_stages.insert(StageKind::Fragment);
        let program = assemble(&mut backend, &stage_pair()).unwrap();

        assert_eq!(program.failed_stages, vec![StageKind::Fragment]);
        assert!(backend.position(|call| matches!(call, Call::LinkProgram(_))).is_some());
    }

    #[test]
    fn test_stages_are_always_cleaned_up() {
        let mut backend = RecordingBackend::new();
        let program = assemble(&mut backend, &stage_pair()).unwrap();

        let link = backend.position(|call| matches!(call, Call::LinkProgram(_))).unwrap();
        for call in &backend.calls[..link] {
            assert!(!matches!(call, Call::DetachStage { .. } | Call::DeleteStage(_)));
        }
        assert_eq!(backend.count(|call| matches!(call, Call::DetachStage { program: p, .. } if *p == program.handle)), 2);
        assert_eq!(backend.count(|call| matches!(call, Call::DeleteStage(_))), 2);
    }

    #[test]
    fn test_sources_are_uploaded_per_stage() {
        let mut backend = RecordingBackend::new();
        let source = stage_pair();
        assemble(&mut backend, &source).unwrap();

        assert_eq!(backend.uploaded_source(StageKind::Vertex), Some(source.vertex.as_str()));
        assert_eq!(backend.uploaded_source(StageKind::Fragment), Some(source.fragment.as_str()));
    }

    #[test]
    fn test_oversized_slot_tables_are_rejected_before_gpu_calls() {
        let source = ProgramSource {
            uniforms: (0..MAX_UNIFORMS + 8).map(|slot| Some(format!("u_{slot}"))).collect(),
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let error = assemble(&mut backend, &source).unwrap_err();
        assert!(matches!(error, ProgramError::Capacity { uniforms: 40, max_uniforms: 32, .. }));
        assert!(backend.calls.is_empty());

        let source = ProgramSource {
            attributes: vec![None; MAX_ATTRIBUTES + 1],
            ..Default::default()
        };
        assert!(matches!(assemble(&mut backend, &source), Err(ProgramError::Capacity { attributes: 9, .. })));
        assert!(backend.calls.is_empty());

        let source = ProgramSource {
            uniforms: vec![None; MAX_UNIFORMS],
            ..Default::default()
        };
        assert_eq!(assemble(&mut backend, &source).unwrap().uniform_locations.len(), MAX_UNIFORMS);
    }

    #[test]
    fn test_allocation_failures_release_stages() {
        let mut backend = RecordingBackend::new();
        backend.unallocatable_stages.insert(StageKind::Fragment);
        let error = assemble(&mut backend, &stage_pair()).unwrap_err();
        assert!(matches!(error, ProgramError::Backend(_)));
        assert_eq!(backend.calls.last(), Some(&Call::DeleteStage(1)));

        let mut backend = RecordingBackend::new();
        backend.fail_create_program = true;
        let error = assemble(&mut backend, &stage_pair()).unwrap_err();
        assert!(matches!(error, ProgramError::Backend(_)));
        assert_eq!(backend.count(|call| matches!(call, Call::DeleteStage(_))), 2);
        assert_eq!(backend.count(|call| matches!(call, Call::CompileStage { .. })), 2);
    }
}
