//! Redundant bind elision
//!
//! The tracker remembers which program is current, which texture unit is
//! active and which texture is bound to each unit, and skips backend calls
//! that would not change anything. It mirrors driver state only as long as
//! every bind goes through it, so call [`BindingTracker::reset`] after anything
//! else touches the context.

use crate::backend::StateBackend;

/// Number of texture units tracked
pub const MAX_TEXTURE_UNITS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("texture unit {0} is out of range (maximum {max})", max = MAX_TEXTURE_UNITS - 1)]
    UnitOutOfRange(usize),
}

/// Cached bind state for a single graphics context
pub struct BindingTracker<B: StateBackend> {
    active_program: Option<B::Program>,
    active_unit: Option<usize>,
    textures: Vec<Option<B::Texture>>,
}

impl<B: StateBackend> Default for BindingTracker<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StateBackend> BindingTracker<B> {
    pub fn new() -> Self {
        Self {
            active_program: None,
            active_unit: None,
            textures: vec![None; MAX_TEXTURE_UNITS],
        }
    }

    /// Makes `program` current unless it already is
    ///
    /// # Returns
    /// Whether a backend call was issued
    pub fn activate_program(&mut self, backend: &mut B, program: &B::Program) -> bool {
        if self.active_program.as_ref() == Some(program) {
            return false;
        }
        backend.use_program(Some(program));
        self.active_program = Some(program.clone());
        true
    }

    /// Unbinds the current program, if any
    pub fn deactivate_program(&mut self, backend: &mut B) {
        if self.active_program.take().is_some() {
            backend.use_program(None);
        }
    }

    pub fn active_program(&self) -> Option<&B::Program> {
        self.active_program.as_ref()
    }

    /// Binds `texture` to `unit`, switching the active unit only when needed
    ///
    /// # Returns
    /// Whether a bind was issued
    ///
    /// # Errors
    /// Returns [`TrackerError::UnitOutOfRange`] if `unit` is not below [`MAX_TEXTURE_UNITS`].
    pub fn bind_texture(&mut self, backend: &mut B, unit: usize, texture: &B::Texture) -> Result<bool, TrackerError> {
        let bound = self.textures.get_mut(unit).ok_or(TrackerError::UnitOutOfRange(unit))?;
        if bound.as_ref() == Some(texture) {
            return Ok(false);
        }
        if self.active_unit != Some(unit) {
            backend.active_texture(unit as u32);
            self.active_unit = Some(unit);
        }
        backend.bind_texture(Some(texture));
        *bound = Some(texture.clone());
        Ok(true)
    }

    /// Texture last bound to `unit` through this tracker
    pub fn bound_texture(&self, unit: usize) -> Option<&B::Texture> {
        self.textures.get(unit).and_then(Option::as_ref)
    }

    /// Deletes `program`, clearing the current program if it was this one
    pub fn delete_program(&mut self, backend: &mut B, program: B::Program) {
        if self.active_program.as_ref() == Some(&program) {
            self.active_program = None;
        }
        backend.delete_program(program);
    }

    /// Drops `texture` from every unit it is recorded on
    ///
    /// Call after deleting a texture so that a new texture reusing the same
    /// handle is bound again.
    pub fn forget_texture(&mut self, texture: &B::Texture) {
        for bound in &mut self.textures {
            if bound.as_ref() == Some(texture) {
                *bound = None;
            }
        }
    }

    /// Forgets all cached state
    pub fn reset(&mut self) {
        self.active_program = None;
        self.active_unit = None;
        self.textures.iter_mut().for_each(|bound| *bound = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingBackend};

    #[test]
    fn test_redundant_program_activation_is_elided() {
        let mut backend = RecordingBackend::new();
        let mut tracker = BindingTracker::new();

        assert!(tracker.activate_program(&mut backend, &1));
        assert!(!tracker.activate_program(&mut backend, &1));
        assert!(tracker.activate_program(&mut backend, &2));
        assert_eq!(backend.calls, vec![Call::UseProgram(Some(1)), Call::UseProgram(Some(2))]);
        assert_eq!(tracker.active_program(), Some(&2));

        tracker.deactivate_program(&mut backend);
        tracker.deactivate_program(&mut backend);
        assert_eq!(backend.calls.last(), Some(&Call::UseProgram(None)));
        assert_eq!(backend.count(|call| *call == Call::UseProgram(None)), 1);
    }

    #[test]
    fn test_texture_binds_per_unit() {
        let mut backend = RecordingBackend::new();
        let mut tracker = BindingTracker::new();

        assert!(tracker.bind_texture(&mut backend, 0, &10).unwrap());
        assert!(!tracker.bind_texture(&mut backend, 0, &10).unwrap());
        assert!(tracker.bind_texture(&mut backend, 3, &10).unwrap());
        assert!(tracker.bind_texture(&mut backend, 3, &11).unwrap());

        assert_eq!(
            backend.calls,
            vec![
                Call::ActiveTexture(0),
                Call::BindTexture(Some(10)),
                Call::ActiveTexture(3),
                Call::BindTexture(Some(10)),
                Call::BindTexture(Some(11)),
            ]
        );
        assert_eq!(tracker.bound_texture(0), Some(&10));
        assert_eq!(tracker.bound_texture(3), Some(&11));
    }

    #[test]
    fn test_unit_out_of_range() {
        let mut backend = RecordingBackend::new();
        let mut tracker = BindingTracker::new();
        assert_eq!(tracker.bind_texture(&mut backend, MAX_TEXTURE_UNITS, &1), Err(TrackerError::UnitOutOfRange(32)));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_deleting_active_program_clears_it() {
        let mut backend = RecordingBackend::new();
        let mut tracker = BindingTracker::new();

        tracker.activate_program(&mut backend, &5);
        tracker.delete_program(&mut backend, 5);
        assert_eq!(tracker.active_program(), None);
        assert!(tracker.activate_program(&mut backend, &5));

        tracker.delete_program(&mut backend, 9);
        assert_eq!(tracker.active_program(), Some(&5));
    }

    #[test]
    fn test_forget_texture_and_reset() {
        let mut backend = RecordingBackend::new();
        let mut tracker = BindingTracker::new();

        tracker.bind_texture(&mut backend, 0, &7).unwrap();
        tracker.bind_texture(&mut backend, 1, &7).unwrap();
        tracker.forget_texture(&7);
        assert_eq!(tracker.bound_texture(0), None);
        assert_eq!(tracker.bound_texture(1), None);
        assert!(tracker.bind_texture(&mut backend, 1, &7).unwrap());

        tracker.activate_program(&mut backend, &1);
        tracker.reset();
        let before = backend.calls.len();
        assert!(tracker.activate_program(&mut backend, &1));
        assert!(tracker.bind_texture(&mut backend, 1, &7).unwrap());
        assert_eq!(backend.calls[before..], [Call::UseProgram(Some(1)), Call::ActiveTexture(1), Call::BindTexture(Some(7))]);
    }
}
