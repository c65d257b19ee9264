//! GLSL stage source generation
//!
//! Generation is a pure function of a [`CompiledShader`], a [`PropertyContext`]
//! and the target dialect. Nothing here touches the GPU, so generators may run
//! on any thread.

use crate::compiler::{ArrayLength, Body, CompiledShader, Declaration, MAX_ATTRIBUTES, PropertyRef, Segment, SlotDecl};
use crate::properties::{PropertyContext, PropertyType, PropertyValue};
use crate::source::ProgramSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target shading language dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlslVersion {
    /// Desktop OpenGL 3.3 core
    #[default]
    Gl330,
    /// OpenGL ES 3.0 / WebGL 2
    Gles300,
}

impl GlslVersion {
    /// Lines emitted at the very top of every stage
    fn header(&self) -> &'static str {
        match self {
            Self::Gl330 => "#version 330\n",
            Self::Gles300 => "#version 300 es\nprecision highp float;\nprecision highp int;\nprecision highp sampler2D;\n",
        }
    }

    fn uses_precision(&self) -> bool {
        matches!(self, Self::Gles300)
    }
}

/// Error raised when a compiled shader cannot be specialized with the given properties
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    /// The shader declares a property the context does not supply
    #[error("No value defined for property: {0}")]
    MissingProperty(String),
    /// The supplied value does not have the declared type
    #[error("Property declaration for {name} and value type conflict: {expected} <-> {found}")]
    TypeMismatch { name: String, expected: PropertyType, found: PropertyType },
    /// Float values must be representable as GLSL literals
    #[error("Property {0} has a non-finite value")]
    NonFiniteValue(String),
    /// Array lengths taken from properties must be positive
    #[error("Property {name} has value {value}, which is not a valid array length")]
    InvalidArrayLength { name: String, value: i64 },
}

/// A pair of generated stage sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    pub vertex: String,
    pub fragment: String,
}

/// Property values resolved against a shader's declarations
struct ResolvedProperties<'a> {
    values: HashMap<&'a str, PropertyValue>,
}

impl<'a> ResolvedProperties<'a> {
    /// Checks that every declared property is supplied with a compatible value
    ///
    /// Int values are accepted for float properties and promoted.
    fn new(shader: &'a CompiledShader, properties: &PropertyContext) -> Result<Self, GenerateError> {
        let mut values = HashMap::new();
        for declaration in &shader.properties {
            let value = properties
                .get(&declaration.name)
                .ok_or_else(|| GenerateError::MissingProperty(declaration.name.clone()))?;
            let value = match (declaration.ty, value) {
                (PropertyType::Float, PropertyValue::Int(value)) => PropertyValue::Float(*value as f64),
                (expected, value) if expected != value.property_type() => {
                    return Err(GenerateError::TypeMismatch {
                        name: declaration.name.clone(),
                        expected,
                        found: value.property_type(),
                    });
                }
                (_, value) => value.clone(),
            };
            if let PropertyValue::Float(float) = value {
                if !float.is_finite() {
                    return Err(GenerateError::NonFiniteValue(declaration.name.clone()));
                }
            }
            values.insert(declaration.name.as_str(), value);
        }
        Ok(Self { values })
    }

    fn get(&self, reference: &PropertyRef) -> Result<&PropertyValue, GenerateError> {
        self.values.get(reference.name.as_str()).ok_or_else(|| GenerateError::MissingProperty(reference.name.clone()))
    }

    /// Formats a property as target-language text
    fn literal(&self, reference: &PropertyRef) -> Result<String, GenerateError> {
        Ok(format_value(self.get(reference)?))
    }

    fn is_enabled(&self, condition: Option<&PropertyRef>) -> Result<bool, GenerateError> {
        match condition {
            None => Ok(true),
            Some(reference) => match self.get(reference)? {
                PropertyValue::Bool(enabled) => Ok(*enabled),
                other => Err(GenerateError::TypeMismatch {
                    name: reference.name.clone(),
                    expected: PropertyType::Bool,
                    found: other.property_type(),
                }),
            },
        }
    }

    fn array_length(&self, length: &ArrayLength) -> Result<String, GenerateError> {
        match length {
            ArrayLength::Fixed(length) => Ok(length.to_string()),
            ArrayLength::Property(reference) => match self.get(reference)? {
                PropertyValue::Int(value) if *value > 0 => Ok(value.to_string()),
                PropertyValue::Int(value) => Err(GenerateError::InvalidArrayLength {
                    name: reference.name.clone(),
                    value: *value,
                }),
                other => Err(GenerateError::TypeMismatch {
                    name: reference.name.clone(),
                    expected: PropertyType::Int,
                    found: other.property_type(),
                }),
            },
        }
    }
}

/// Formats a value the same way regardless of host locale
///
/// Floats always carry a decimal point so GLSL reads them as `float`.
pub fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Bool(value) => value.to_string(),
        PropertyValue::Int(value) => value.to_string(),
        PropertyValue::Float(value) => {
            let text = value.to_string();
            if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") }
        }
        PropertyValue::Text(value) => value.clone(),
    }
}

/// Generates GLSL for both stages of a compiled shader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlslGenerator {
    version: GlslVersion,
}

impl GlslGenerator {
    pub fn new(version: GlslVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> GlslVersion {
        self.version
    }

    /// Generates the vertex stage
    ///
    /// # Errors
    /// Returns a [`GenerateError`] if a declared property is missing from
    /// `properties` or has an incompatible type.
    pub fn generate_vertex(&self, shader: &CompiledShader, properties: &PropertyContext) -> Result<String, GenerateError> {
        let resolved = ResolvedProperties::new(shader, properties)?;
        let mut out = self.preamble(shader, &resolved)?;

        for attribute in Self::enabled(&shader.attributes, &resolved)? {
            let declaration = self.declaration(&attribute.declaration, &resolved)?;
            out.push_str(&format!("layout(location = {}) in {declaration};\n", attribute.slot));
        }
        for varying in &shader.varyings {
            out.push_str(&format!("out {};\n", self.declaration(varying, &resolved)?));
        }
        out.push('\n');

        self.main(&mut out, shader, &shader.vertex, &resolved)?;
        Ok(out)
    }

    /// Generates the fragment stage
    ///
    /// # Errors
    /// Returns a [`GenerateError`] under the same conditions as
    /// [`GlslGenerator::generate_vertex`].
    pub fn generate_fragment(&self, shader: &CompiledShader, properties: &PropertyContext) -> Result<String, GenerateError> {
        let resolved = ResolvedProperties::new(shader, properties)?;
        let mut out = self.preamble(shader, &resolved)?;

        for varying in &shader.varyings {
            out.push_str(&format!("in {};\n", self.declaration(varying, &resolved)?));
        }
        for output in Self::enabled(&shader.outputs, &resolved)? {
            let declaration = self.declaration(&output.declaration, &resolved)?;
            out.push_str(&format!("layout(location = {}) out {declaration};\n", output.slot));
        }
        out.push('\n');

        self.main(&mut out, shader, &shader.fragment, &resolved)?;
        Ok(out)
    }

    /// Generates both stages
    pub fn generate(&self, shader: &CompiledShader, properties: &PropertyContext) -> Result<GeneratedProgram, GenerateError> {
        Ok(GeneratedProgram {
            vertex: self.generate_vertex(shader, properties)?,
            fragment: self.generate_fragment(shader, properties)?,
        })
    }

    /// Generates both stages and pairs them with the slot names the assembler binds
    ///
    /// Attributes whose condition evaluates to `false` are neither emitted nor bound.
    pub fn program_source(&self, shader: &CompiledShader, properties: &PropertyContext) -> Result<ProgramSource, GenerateError> {
        let GeneratedProgram { vertex, fragment } = self.generate(shader, properties)?;
        let resolved = ResolvedProperties::new(shader, properties)?;

        let mut attributes = vec![None; MAX_ATTRIBUTES];
        for attribute in Self::enabled(&shader.attributes, &resolved)? {
            attributes[attribute.slot] = Some(attribute.declaration.name.clone());
        }

        Ok(ProgramSource {
            vertex,
            fragment,
            attributes,
            uniforms: shader.uniform_names(),
        })
    }

    fn enabled<'s>(declarations: &'s [SlotDecl], resolved: &ResolvedProperties<'_>) -> Result<Vec<&'s SlotDecl>, GenerateError> {
        let mut enabled = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            if resolved.is_enabled(declaration.condition.as_ref())? {
                enabled.push(declaration);
            }
        }
        Ok(enabled)
    }

    /// Version header and uniforms, shared by both stages
    fn preamble(&self, shader: &CompiledShader, resolved: &ResolvedProperties<'_>) -> Result<String, GenerateError> {
        let mut out = String::with_capacity(2048);
        out.push_str(self.version.header());
        out.push('\n');
        for uniform in shader.uniforms.iter().flatten() {
            out.push_str(&format!("uniform {};\n", self.declaration(&uniform.declaration, resolved)?));
        }
        out.push('\n');
        Ok(out)
    }

    fn declaration(&self, declaration: &Declaration, resolved: &ResolvedProperties<'_>) -> Result<String, GenerateError> {
        let mut text = String::with_capacity(32);
        if let Some(precision) = declaration.precision.filter(|_| self.version.uses_precision()) {
            text.push_str(precision.keyword());
            text.push(' ');
        }
        text.push_str(declaration.ty.keyword());
        text.push(' ');
        text.push_str(&declaration.name);
        if let Some(length) = &declaration.array {
            text.push_str(&format!("[{}]", resolved.array_length(length)?));
        }
        Ok(text)
    }

    fn body(out: &mut String, body: &Body, resolved: &ResolvedProperties<'_>) -> Result<(), GenerateError> {
        for segment in &body.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Property(reference) => out.push_str(&resolved.literal(reference)?),
            }
        }
        out.push('\n');
        Ok(())
    }

    fn main(&self, out: &mut String, shader: &CompiledShader, body: &Body, resolved: &ResolvedProperties<'_>) -> Result<(), GenerateError> {
        if let Some(shared) = &shader.shared {
            Self::body(out, shared, resolved)?;
            out.push('\n');
        }
        out.push_str("void main(void)\n{\n");
        if !body.segments.is_empty() {
            Self::body(out, body, resolved)?;
        }
        out.push_str("}\n");
        Ok(())
    }
}

/// Specializes a compiled shader for `version` and pairs it with its slot names
///
/// # Arguments
/// * `shader` - Compiled program, usually obtained from the cache
/// * `properties` - Values for every property the program declares
/// * `version` - Target dialect
///
/// # Errors
/// Returns a [`GenerateError`] if a declared property is missing or mistyped.
pub fn generate_program_source(shader: &CompiledShader, properties: &PropertyContext, version: GlslVersion) -> Result<ProgramSource, GenerateError> {
    GlslGenerator::new(version).program_source(shader, properties)
}
