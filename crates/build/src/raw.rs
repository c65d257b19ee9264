//! Raw stage-pair programs
//!
//! A raw program is a hand-written `.vsh`/`.fsh` pair plus a `.properties`
//! file that names the attribute and uniform slots:
//!
//! ```text
//! # bound before linking
//! Attribute.0 = in_Position
//! Attribute.1 = in_Color
//! Uniform.0 = mvpMatrix
//! Uniform.1 = texture
//! ```
//!
//! The file uses the usual flat key/value format: `key=value`, `key: value` or
//! `key value`, `#`/`!` comment lines, and a trailing `\` joining a line with
//! the next one.

use crate::compiler::{MAX_ATTRIBUTES, MAX_UNIFORMS};
use crate::source::ProgramSource;
use regex::Regex;
use std::sync::LazyLock;

static SLOT_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?<kind>Attribute|Uniform)\.(?<slot>.*)$").unwrap());

/// Error raised for a malformed `.properties` slot file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertiesError {
    /// The slot suffix is not a decimal number
    #[error("line {line}: invalid slot in key '{key}'")]
    InvalidSlot { line: usize, key: String },
    /// The slot does not fit the fixed location table
    #[error("line {line}: slot {slot} in key '{key}' is out of range (maximum {max})")]
    SlotOutOfRange { line: usize, key: String, slot: usize, max: usize },
    /// A slot key was given without a symbol name
    #[error("line {line}: no symbol name given for '{key}'")]
    EmptyName { line: usize, key: String },
}

/// Slot names read from a `.properties` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProgram {
    /// Always [`MAX_ATTRIBUTES`] entries
    pub attributes: Vec<Option<String>>,
    /// Always [`MAX_UNIFORMS`] entries
    pub uniforms: Vec<Option<String>>,
}

impl Default for RawProgram {
    fn default() -> Self {
        Self {
            attributes: vec![None; MAX_ATTRIBUTES],
            uniforms: vec![None; MAX_UNIFORMS],
        }
    }
}

impl RawProgram {
    /// Parses a `.properties` slot file
    ///
    /// Keys other than `Attribute.<slot>` and `Uniform.<slot>` are ignored.
    /// When a key repeats, the last value wins.
    ///
    /// # Errors
    /// Returns a [`PropertiesError`] for a non-numeric or out-of-range slot,
    /// or for a slot key with an empty value.
    pub fn parse_properties(text: &str) -> Result<Self, PropertiesError> {
        let mut program = Self::default();

        for (line, key, value) in logical_lines(text) {
            let Some(captures) = SLOT_KEY_RE.captures(&key) else {
                continue;
            };
            let slot_text = &captures["slot"];
            if slot_text.is_empty() || !slot_text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PropertiesError::InvalidSlot { line, key });
            }

            let table = match &captures["kind"] {
                "Attribute" => &mut program.attributes,
                _ => &mut program.uniforms,
            };
            let max = table.len() - 1;
            let slot = match slot_text.parse::<usize>() {
                Ok(slot) if slot <= max => slot,
                Ok(slot) => return Err(PropertiesError::SlotOutOfRange { line, key, slot, max }),
                Err(_) => return Err(PropertiesError::SlotOutOfRange { line, key, slot: usize::MAX, max }),
            };
            if value.is_empty() {
                return Err(PropertiesError::EmptyName { line, key });
            }
            table[slot] = Some(value);
        }

        Ok(program)
    }

    /// Pairs the slot names with the stage texts
    pub fn into_program_source(self, vertex: impl Into<String>, fragment: impl Into<String>) -> ProgramSource {
        ProgramSource {
            vertex: vertex.into(),
            fragment: fragment.into(),
            attributes: self.attributes,
            uniforms: self.uniforms,
        }
    }
}

/// Splits `text` into `(first line number, key, value)` entries
fn logical_lines(text: &str) -> Vec<(usize, String, String)> {
    let mut entries = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        entries.push((index + 1, key, value));
    }

    entries
}

/// A line continues when it ends in an odd number of backslashes
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(unescape(escaped));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_some_and(|&c| c == '=' || c == ':') {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    value.push(unescape(escaped));
                }
            }
            c => value.push(c),
        }
    }

    (key, value.trim_end().to_string())
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slots() {
        let text = "\
# Comment
! another comment

Attribute.0 = in_Position
Attribute.1:in_Color
Uniform.0 mvpMatrix
Uniform.3=texture
Unrelated.Key = ignored
";
        let program = RawProgram::parse_properties(text).unwrap();

        assert_eq!(program.attributes.len(), MAX_ATTRIBUTES);
        assert_eq!(program.uniforms.len(), MAX_UNIFORMS);
        assert_eq!(program.attributes[0].as_deref(), Some("in_Position"));
        assert_eq!(program.attributes[1].as_deref(), Some("in_Color"));
        assert_eq!(program.attributes[2], None);
        assert_eq!(program.uniforms[0].as_deref(), Some("mvpMatrix"));
        assert_eq!(program.uniforms[1], None);
        assert_eq!(program.uniforms[3].as_deref(), Some("texture"));
    }

    #[test]
    fn test_line_continuation_and_last_value_wins() {
        let text = "Uniform.0 = first\nUniform.0 = mvp\\\n    Matrix\n";
        let program = RawProgram::parse_properties(text).unwrap();
        assert_eq!(program.uniforms[0].as_deref(), Some("mvpMatrix"));
    }

    #[test]
    fn test_out_of_range_slots_are_rejected() {
        let error = RawProgram::parse_properties("Uniform.0 = a\nUniform.32 = b\n").unwrap_err();
        assert_eq!(
            error,
            PropertiesError::SlotOutOfRange {
                line: 2,
                key: "Uniform.32".to_string(),
                slot: 32,
                max: 31,
            }
        );

        let error = RawProgram::parse_properties("Attribute.8 = a").unwrap_err();
        assert!(matches!(error, PropertiesError::SlotOutOfRange { slot: 8, max: 7, .. }));
    }

    #[test]
    fn test_invalid_slot_and_empty_name() {
        let error = RawProgram::parse_properties("Uniform.x = a").unwrap_err();
        assert_eq!(error, PropertiesError::InvalidSlot { line: 1, key: "Uniform.x".to_string() });

        let error = RawProgram::parse_properties("Attribute.0 =").unwrap_err();
        assert_eq!(error, PropertiesError::EmptyName { line: 1, key: "Attribute.0".to_string() });
    }

    #[test]
    fn test_into_program_source() {
        let program = RawProgram::parse_properties("Attribute.0=in_Position\nUniform.0=mvpMatrix").unwrap();
        let source = program.into_program_source("void main() {}", "void main() {}");

        assert_eq!(source.vertex, "void main() {}");
        assert_eq!(source.named_attributes().collect::<Vec<_>>(), vec![(0, "in_Position")]);
        assert_eq!(source.named_uniforms().collect::<Vec<_>>(), vec![(0, "mvpMatrix")]);
        assert_eq!(source.uniforms.len(), MAX_UNIFORMS);
    }
}
