//! Property context supplied to the stage generator
//!
//! Properties are named values a shader may reference through `$NAME` in its
//! stage bodies, array lengths and availability conditions. The engine always
//! supplies the viewport properties listed in [`ENGINE_PROPERTIES`]; callers add
//! whatever else their shaders declare.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Width of the scene framebuffer in pixels
pub const SCENE_WIDTH: &str = "SCENE_WIDTH";
/// Height of the scene framebuffer in pixels
pub const SCENE_HEIGHT: &str = "SCENE_HEIGHT";
/// Width of the window container in pixels
pub const CONTAINER_WIDTH: &str = "CONTAINER_WIDTH";
/// Height of the window container in pixels
pub const CONTAINER_HEIGHT: &str = "CONTAINER_HEIGHT";
/// Width of the content area in pixels
pub const CONTENT_WIDTH: &str = "CONTENT_WIDTH";
/// Height of the content area in pixels
pub const CONTENT_HEIGHT: &str = "CONTENT_HEIGHT";

/// Property names populated from a [`Viewport`]
pub const ENGINE_PROPERTIES: &[&str] = &[SCENE_WIDTH, SCENE_HEIGHT, CONTAINER_WIDTH, CONTAINER_HEIGHT, CONTENT_WIDTH, CONTENT_HEIGHT];

/// Declared type of a shader property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Int,
    Float,
    Bool,
    String,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
        }
    }
}

/// A single property value
///
/// Deserializes from plain YAML/JSON scalars, so configuration files can write
/// `FOG_DENSITY: 0.05` instead of a tagged form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Returns the type this value naturally has
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int(_) => PropertyType::Int,
            Self::Float(_) => PropertyType::Float,
            Self::Text(_) => PropertyType::String,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Dimensions the engine exposes to every shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Scene framebuffer size (width, height)
    pub scene: (u32, u32),
    /// Window container size (width, height)
    pub container: (u32, u32),
    /// Content area size (width, height)
    pub content: (u32, u32),
}

/// Ordered mapping from property names to values
///
/// A context is treated as an immutable snapshot for the duration of one
/// generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyContext {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context holding the engine viewport properties
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let mut context = Self::new();
        context.supply_viewport(viewport);
        context
    }

    /// Sets a property, replacing any previous value
    pub fn supply(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`PropertyContext::supply`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.supply(name, value);
        self
    }

    /// Sets the six engine viewport properties
    pub fn supply_viewport(&mut self, viewport: &Viewport) {
        self.supply(SCENE_WIDTH, viewport.scene.0);
        self.supply(SCENE_HEIGHT, viewport.scene.1);
        self.supply(CONTAINER_WIDTH, viewport.container.0);
        self.supply(CONTAINER_HEIGHT, viewport.container.1);
        self.supply(CONTENT_WIDTH, viewport.content.0);
        self.supply(CONTENT_HEIGHT, viewport.content.1);
    }

    /// Looks up a property value
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Returns true if the property is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns a new context with `overrides` layered on top of `self`
    pub fn merged_with(&self, overrides: &PropertyContext) -> PropertyContext {
        let mut values = self.values.clone();
        values.extend(overrides.values.iter().map(|(name, value)| (name.clone(), value.clone())));
        PropertyContext { values }
    }

    /// Iterates over properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (name, value) in iter {
            context.supply(name, value);
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_supplies_engine_properties() {
        let viewport = Viewport {
            scene: (1920, 1080),
            container: (1280, 720),
            content: (800, 600),
        };
        let context = PropertyContext::from_viewport(&viewport);

        for name in ENGINE_PROPERTIES {
            assert!(context.contains(name), "missing {name}");
        }
        assert_eq!(context.get(CONTENT_WIDTH), Some(&PropertyValue::Int(800)));
        assert_eq!(context.get(SCENE_HEIGHT), Some(&PropertyValue::Int(1080)));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let defaults = PropertyContext::new().with("FOG", true).with("SAMPLES", 4i64);
        let overrides = PropertyContext::new().with("FOG", false);

        let merged = defaults.merged_with(&overrides);
        assert_eq!(merged.get("FOG"), Some(&PropertyValue::Bool(false)));
        assert_eq!(merged.get("SAMPLES"), Some(&PropertyValue::Int(4)));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_untagged_yaml_values() {
        let context: PropertyContext = serde_norway::from_str("A: true\nB: 3\nC: 0.5\nD: hello\n").unwrap();
        assert_eq!(context.get("A"), Some(&PropertyValue::Bool(true)));
        assert_eq!(context.get("B"), Some(&PropertyValue::Int(3)));
        assert_eq!(context.get("C"), Some(&PropertyValue::Float(0.5)));
        assert_eq!(context.get("D"), Some(&PropertyValue::Text("hello".to_string())));
    }
}
