//! Intermediate representation produced by the shader language compiler
//!
//! A [`CompiledShader`] is independent of the target dialect. It is shared
//! through the compilation cache, so it is immutable once built.

use crate::properties::PropertyType;
use serde::Serialize;
use std::fmt;

/// Maximum number of uniform slots a program may declare
pub const MAX_UNIFORMS: usize = 32;
/// Maximum number of vertex attribute slots
pub const MAX_ATTRIBUTES: usize = 8;
/// Maximum number of fragment output slots
pub const MAX_OUTPUTS: usize = 8;

/// A position in shader language source (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Types that may appear in uniform, attribute, varying and output declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GlslType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
}

impl GlslType {
    /// Parses a type keyword as written in shader source
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "float" => Self::Float,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "ivec2" => Self::IVec2,
            "ivec3" => Self::IVec3,
            "ivec4" => Self::IVec4,
            "bvec2" => Self::BVec2,
            "bvec3" => Self::BVec3,
            "bvec4" => Self::BVec4,
            "mat2" => Self::Mat2,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "sampler2D" => Self::Sampler2D,
            _ => return None,
        })
    }

    /// The GLSL spelling of this type
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::BVec2 => "bvec2",
            Self::BVec3 => "bvec3",
            Self::BVec4 => "bvec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Sampler2D => "sampler2D",
        }
    }
}

/// Precision qualifier, only emitted for GLSL ES targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "lowp" => Some(Self::Low),
            "mediump" => Some(Self::Medium),
            "highp" => Some(Self::High),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Low => "lowp",
            Self::Medium => "mediump",
            Self::High => "highp",
        }
    }
}

/// Length of an array declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ArrayLength {
    /// Literal length
    Fixed(u32),
    /// Length taken from an `int` property at generation time
    Property(PropertyRef),
}

/// A `$NAME` reference to a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRef {
    pub name: String,
    pub location: SourceLocation,
}

/// A typed, named declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub ty: GlslType,
    pub precision: Option<Precision>,
    pub array: Option<ArrayLength>,
    pub location: SourceLocation,
}

/// `property <type> NAME;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: PropertyType,
    pub location: SourceLocation,
}

/// A uniform bound to a fixed slot of the location table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniformDecl {
    pub slot: usize,
    pub declaration: Declaration,
}

impl UniformDecl {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }
}

/// An attribute or fragment output bound to a fixed slot
///
/// When `condition` names a `bool` property, the declaration only exists in
/// generated source if that property is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotDecl {
    pub slot: usize,
    pub declaration: Declaration,
    pub condition: Option<PropertyRef>,
}

/// Piece of a stage body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Target-language text copied verbatim
    Text(String),
    /// Property substituted at generation time
    Property(PropertyRef),
}

/// Body of a `shared`, `vertex` or `fragment` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Body {
    pub segments: Vec<Segment>,
}

impl Body {
    /// Iterates over every property referenced in this body
    pub fn property_refs(&self) -> impl Iterator<Item = &PropertyRef> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Property(reference) => Some(reference),
            Segment::Text(_) => None,
        })
    }
}

/// The compiled form of a unified shader program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledShader {
    /// Properties the program expects from the context, in declaration order
    pub properties: Vec<PropertyDecl>,
    /// Uniforms indexed by slot; `None` marks an unused slot
    pub uniforms: Vec<Option<UniformDecl>>,
    /// Vertex inputs, in declaration order
    pub attributes: Vec<SlotDecl>,
    /// Values passed from the vertex to the fragment stage
    pub varyings: Vec<Declaration>,
    /// Fragment outputs, in declaration order
    pub outputs: Vec<SlotDecl>,
    /// Code emitted ahead of `main` in both stages
    pub shared: Option<Body>,
    pub vertex: Body,
    pub fragment: Body,
}

impl CompiledShader {
    /// Returns the uniform name bound to each slot
    ///
    /// The result has one entry per slot up to the highest declared one, so it
    /// can be handed to the program assembler as-is.
    pub fn uniform_names(&self) -> Vec<Option<String>> {
        self.uniforms.iter().map(|uniform| uniform.as_ref().map(|uniform| uniform.name().to_string())).collect()
    }

    /// Finds a property declaration by name
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|property| property.name == name)
    }
}
