//! Program source handed to the program assembler
//!
//! Both producers, the stage generator and the raw `.vsh`/`.fsh` path, end in
//! a [`ProgramSource`], so the assembler never needs to know where a program
//! came from.

use crate::compiler::{MAX_ATTRIBUTES, MAX_UNIFORMS};
use serde::Serialize;
use std::fmt;

/// Pipeline stage of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    /// Both stages in pipeline order
    pub const ALL: [StageKind; 2] = [StageKind::Vertex, StageKind::Fragment];
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Stage texts plus the symbol names bound to each slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramSource {
    /// Vertex stage text
    pub vertex: String,
    /// Fragment stage text
    pub fragment: String,
    /// Attribute name per slot, bound before linking
    pub attributes: Vec<Option<String>>,
    /// Uniform name per slot; the assembler reports one location per entry
    pub uniforms: Vec<Option<String>>,
}

impl ProgramSource {
    /// Returns the text of `stage`
    pub fn stage(&self, stage: StageKind) -> &str {
        match stage {
            StageKind::Vertex => &self.vertex,
            StageKind::Fragment => &self.fragment,
        }
    }

    /// Iterates over named attribute slots as `(slot, name)`
    pub fn named_attributes(&self) -> impl Iterator<Item = (u32, &str)> {
        Self::named(&self.attributes)
    }

    /// Iterates over named uniform slots as `(slot, name)`
    pub fn named_uniforms(&self) -> impl Iterator<Item = (u32, &str)> {
        Self::named(&self.uniforms)
    }

    fn named(slots: &[Option<String>]) -> impl Iterator<Item = (u32, &str)> {
        slots.iter().enumerate().filter_map(|(slot, name)| name.as_deref().map(|name| (slot as u32, name)))
    }

    /// Returns true if the slot tables fit the fixed capacities
    pub fn is_within_capacity(&self) -> bool {
        self.attributes.len() <= MAX_ATTRIBUTES && self.uniforms.len() <= MAX_UNIFORMS
    }
}
