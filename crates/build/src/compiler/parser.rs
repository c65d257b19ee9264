//! Recursive-descent parser and semantic checks for the shader language

use super::CompileError;
use super::ir::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::properties::PropertyType;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Compiles unified shader language source into its intermediate representation
///
/// # Arguments
/// * `source` - Complete `.program` source text
///
/// # Returns
/// The compiled shader, or the first error found. The result never reflects a
/// partially parsed program.
///
/// # Errors
/// Returns a [`CompileError`] if:
/// - A top-level keyword, type or token is not recognized
/// - A slot is duplicated or exceeds its capacity
/// - An identifier or block is declared twice
/// - The vertex or fragment block is missing
/// - A property is referenced without being declared, or with the wrong type
pub fn compile(source: &str) -> Result<CompiledShader, CompileError> {
    Parser::new(source).parse()
}

/// Block kinds that may appear at the top level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Shared,
    Vertex,
    Fragment,
}

struct Parser {
    lexer: Lexer,
    properties: Vec<PropertyDecl>,
    uniforms: BTreeMap<usize, UniformDecl>,
    attributes: Vec<SlotDecl>,
    varyings: Vec<Declaration>,
    outputs: Vec<SlotDecl>,
    shared: Option<Body>,
    vertex: Option<Body>,
    fragment: Option<Body>,
    identifiers: HashSet<String>,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            properties: Vec::new(),
            uniforms: BTreeMap::new(),
            attributes: Vec::new(),
            varyings: Vec::new(),
            outputs: Vec::new(),
            shared: None,
            vertex: None,
            fragment: None,
            identifiers: HashSet::new(),
        }
    }

    fn parse(mut self) -> Result<CompiledShader, CompileError> {
        while let Some(token) = self.lexer.next_token()? {
            let TokenKind::Ident(keyword) = &token.kind else {
                return Err(CompileError::at(token.location, format!("Expected a declaration or block, found {}", token.kind.describe())));
            };
            match keyword.as_str() {
                "property" => self.property()?,
                "uniform" => self.uniform()?,
                "attribute" => self.attribute()?,
                "varying" => self.varying()?,
                "output" => self.output()?,
                "shared" => self.block(BlockKind::Shared, token.location)?,
                "vertex" => self.block(BlockKind::Vertex, token.location)?,
                "fragment" => self.block(BlockKind::Fragment, token.location)?,
                other => return Err(CompileError::at(token.location, format!("Unknown directive: {other}"))),
            }
        }
        self.finish()
    }

    fn next(&mut self, expected: &str) -> Result<Token, CompileError> {
        let location = self.lexer.location();
        self.lexer
            .next_token()?
            .ok_or_else(|| CompileError::at(location, format!("Unexpected end of input, expected {expected}")))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        let token = self.next(&kind.describe())?;
        if token.kind != kind {
            return Err(CompileError::at(token.location, format!("Expected {}, found {}", kind.describe(), token.kind.describe())));
        }
        Ok(token)
    }

    fn ident(&mut self, expected: &str) -> Result<(String, SourceLocation), CompileError> {
        let token = self.next(expected)?;
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.location)),
            other => Err(CompileError::at(token.location, format!("Expected {expected}, found {}", other.describe()))),
        }
    }

    fn slot(&mut self, capacity: usize, what: &str) -> Result<(usize, SourceLocation), CompileError> {
        let token = self.next("a slot index")?;
        let TokenKind::Integer(value) = token.kind else {
            return Err(CompileError::at(token.location, format!("Expected a {what} slot index, found {}", token.kind.describe())));
        };
        let slot = value as usize;
        if slot >= capacity {
            return Err(CompileError::at(token.location, format!("{what} slot {slot} out of range, must be below {capacity}")));
        }
        Ok((slot, token.location))
    }

    fn declare(&mut self, name: &str, location: SourceLocation) -> Result<(), CompileError> {
        if !self.identifiers.insert(name.to_string()) {
            return Err(CompileError::at(location, format!("Redeclaring identifier: {name}")));
        }
        Ok(())
    }

    /// `precision? type NAME array?`
    ///
    /// Returns the declaration and the token following it.
    fn declaration(&mut self) -> Result<(Declaration, Token), CompileError> {
        let (mut keyword, mut keyword_location) = self.ident("a type")?;
        let precision = Precision::from_keyword(&keyword);
        if precision.is_some() {
            (keyword, keyword_location) = self.ident("a type")?;
        }
        let ty = GlslType::from_keyword(&keyword).ok_or_else(|| CompileError::at(keyword_location, format!("Unknown type: {keyword}")))?;
        let (name, location) = self.ident("an identifier")?;
        self.declare(&name, location)?;

        let mut next = self.next("';'")?;
        let array = if next.kind == TokenKind::LeftBracket {
            let length_token = self.next("an array length")?;
            let length = match length_token.kind {
                TokenKind::Integer(0) => return Err(CompileError::at(length_token.location, "Array length must be positive")),
                TokenKind::Integer(value) => ArrayLength::Fixed(value),
                TokenKind::Dollar => {
                    let (property, _) = self.ident("a property name")?;
                    ArrayLength::Property(PropertyRef {
                        name: property,
                        location: length_token.location,
                    })
                }
                other => return Err(CompileError::at(length_token.location, format!("Expected an array length, found {}", other.describe()))),
            };
            self.expect(TokenKind::RightBracket)?;
            next = self.next("';'")?;
            Some(length)
        } else {
            None
        };

        Ok((
            Declaration {
                name,
                ty,
                precision,
                array,
                location,
            },
            next,
        ))
    }

    fn end_of_declaration(token: Token) -> Result<(), CompileError> {
        if token.kind != TokenKind::Semicolon {
            return Err(CompileError::at(token.location, format!("Expected ';', found {}", token.kind.describe())));
        }
        Ok(())
    }

    /// `if NAME` or `;`
    fn condition(&mut self, token: Token) -> Result<Option<PropertyRef>, CompileError> {
        match token.kind {
            TokenKind::Ident(keyword) if keyword == "if" => {
                let (name, location) = self.ident("a property name")?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Some(PropertyRef { name, location }))
            }
            kind => {
                Self::end_of_declaration(Token { kind, location: token.location })?;
                Ok(None)
            }
        }
    }

    fn property(&mut self) -> Result<(), CompileError> {
        let (keyword, keyword_location) = self.ident("a property type")?;
        let ty = match keyword.as_str() {
            "int" => PropertyType::Int,
            "float" => PropertyType::Float,
            "bool" => PropertyType::Bool,
            "string" => PropertyType::String,
            other => return Err(CompileError::at(keyword_location, format!("Unknown property type: {other}"))),
        };
        let (name, location) = self.ident("a property name")?;
        self.declare(&name, location)?;
        self.expect(TokenKind::Semicolon)?;
        self.properties.push(PropertyDecl { name, ty, location });
        Ok(())
    }

    fn uniform(&mut self) -> Result<(), CompileError> {
        let (slot, slot_location) = self.slot(MAX_UNIFORMS, "Uniform")?;
        if self.uniforms.contains_key(&slot) {
            return Err(CompileError::at(slot_location, format!("Duplicate uniform slot: {slot}")));
        }
        let (declaration, end) = self.declaration()?;
        Self::end_of_declaration(end)?;
        self.uniforms.insert(slot, UniformDecl { slot, declaration });
        Ok(())
    }

    fn attribute(&mut self) -> Result<(), CompileError> {
        let (slot, slot_location) = self.slot(MAX_ATTRIBUTES, "Attribute")?;
        if self.attributes.iter().any(|attribute| attribute.slot == slot) {
            return Err(CompileError::at(slot_location, format!("Duplicate attribute slot: {slot}")));
        }
        let (declaration, end) = self.declaration()?;
        let condition = self.condition(end)?;
        self.attributes.push(SlotDecl { slot, declaration, condition });
        Ok(())
    }

    fn varying(&mut self) -> Result<(), CompileError> {
        let (declaration, end) = self.declaration()?;
        Self::end_of_declaration(end)?;
        self.varyings.push(declaration);
        Ok(())
    }

    fn output(&mut self) -> Result<(), CompileError> {
        let (slot, slot_location) = self.slot(MAX_OUTPUTS, "Output")?;
        if self.outputs.iter().any(|output| output.slot == slot) {
            return Err(CompileError::at(slot_location, format!("Duplicate output slot: {slot}")));
        }
        let (declaration, end) = self.declaration()?;
        let condition = self.condition(end)?;
        self.outputs.push(SlotDecl { slot, declaration, condition });
        Ok(())
    }

    fn block(&mut self, kind: BlockKind, location: SourceLocation) -> Result<(), CompileError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let body = self.lexer.read_body(open.location)?;
        let (target, name) = match kind {
            BlockKind::Shared => (&mut self.shared, "shared"),
            BlockKind::Vertex => (&mut self.vertex, "vertex"),
            BlockKind::Fragment => (&mut self.fragment, "fragment"),
        };
        if target.is_some() {
            return Err(CompileError::at(location, format!("Duplicate {name} block")));
        }
        *target = Some(body);
        Ok(())
    }

    /// Checks every property reference against the declarations and assembles the IR
    fn finish(self) -> Result<CompiledShader, CompileError> {
        let vertex = self.vertex.ok_or_else(|| CompileError::new("Missing vertex block"))?;
        let fragment = self.fragment.ok_or_else(|| CompileError::new("Missing fragment block"))?;

        let declared: HashMap<&str, PropertyType> = self.properties.iter().map(|property| (property.name.as_str(), property.ty)).collect();
        let lookup = |reference: &PropertyRef| {
            declared
                .get(reference.name.as_str())
                .copied()
                .ok_or_else(|| CompileError::at(reference.location, format!("Undeclared property: {}", reference.name)))
        };
        let check_type = |reference: &PropertyRef, expected: PropertyType, usage: &str| -> Result<(), CompileError> {
            let found = lookup(reference)?;
            if found != expected {
                return Err(CompileError::at(
                    reference.location,
                    format!("Property {} is used as {usage} and must be {expected}, but is declared {found}", reference.name),
                ));
            }
            Ok(())
        };

        let declarations = self
            .uniforms
            .values()
            .map(|uniform| &uniform.declaration)
            .chain(self.attributes.iter().map(|attribute| &attribute.declaration))
            .chain(self.varyings.iter())
            .chain(self.outputs.iter().map(|output| &output.declaration));
        for declaration in declarations {
            if let Some(ArrayLength::Property(reference)) = &declaration.array {
                check_type(reference, PropertyType::Int, "an array length")?;
            }
        }

        for condition in self.attributes.iter().chain(self.outputs.iter()).filter_map(|decl| decl.condition.as_ref()) {
            check_type(condition, PropertyType::Bool, "a condition")?;
        }

        for body in [self.shared.as_ref(), Some(&vertex), Some(&fragment)].into_iter().flatten() {
            for reference in body.property_refs() {
                lookup(reference)?;
            }
        }

        let uniform_count = self.uniforms.keys().next_back().map_or(0, |slot| slot + 1);
        let mut uniforms = vec![None; uniform_count];
        for (slot, uniform) in self.uniforms {
            uniforms[slot] = Some(uniform);
        }

        Ok(CompiledShader {
            properties: self.properties,
            uniforms,
            attributes: self.attributes,
            varyings: self.varyings,
            outputs: self.outputs,
            shared: self.shared,
            vertex,
            fragment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEXTURED: &str = r#"
// Textured quad scaled to the content area
property int CONTENT_WIDTH;
property bool USE_COLOR;

uniform 0 mat4 uniform_ModelViewProjectionMatrix;
uniform 2 highp sampler2D uniform_Texture;

attribute 0 vec4 attribute_Position;
attribute 1 vec4 attribute_Color if USE_COLOR;
attribute 2 vec2 attribute_Texture;

varying vec2 varying_Texture;
output 0 vec4 out_Color;

vertex {
    varying_Texture = attribute_Texture;
    gl_Position = uniform_ModelViewProjectionMatrix * attribute_Position;
}

fragment {
    out_Color = texture(uniform_Texture, varying_Texture * float($CONTENT_WIDTH));
}
"#;

    #[test]
    fn test_compile_textured_program() {
        let shader = compile(TEXTURED).unwrap();

        assert_eq!(shader.properties.len(), 2);
        assert_eq!(shader.property("USE_COLOR").map(|property| property.ty), Some(PropertyType::Bool));
        assert!(shader.property("CONTENT_HEIGHT").is_none());

        assert_eq!(shader.uniforms.len(), 3);
        assert_eq!(shader.uniforms[0].as_ref().unwrap().name(), "uniform_ModelViewProjectionMatrix");
        assert!(shader.uniforms[1].is_none());
        let texture = shader.uniforms[2].as_ref().unwrap();
        assert_eq!(texture.declaration.ty, GlslType::Sampler2D);
        assert_eq!(texture.declaration.precision, Some(Precision::High));

        assert_eq!(shader.attributes.len(), 3);
        assert_eq!(shader.attributes[1].condition.as_ref().unwrap().name, "USE_COLOR");
        assert_eq!(shader.varyings[0].name, "varying_Texture");
        assert_eq!(shader.outputs[0].slot, 0);
        assert!(shader.shared.is_none());

        let references: Vec<_> = shader.fragment.property_refs().map(|reference| reference.name.as_str()).collect();
        assert_eq!(references, vec!["CONTENT_WIDTH"]);
    }

    #[test]
    fn test_uniform_names_keep_holes() {
        let shader = compile(TEXTURED).unwrap();
        assert_eq!(
            shader.uniform_names(),
            vec![Some("uniform_ModelViewProjectionMatrix".to_string()), None, Some("uniform_Texture".to_string())]
        );
    }

    #[test]
    fn test_array_length_from_property() {
        let shader = compile("property int LIGHTS; uniform 0 vec4 u_lights[$LIGHTS]; uniform 1 float u_weights[4]; vertex {} fragment {}").unwrap();
        let lights = &shader.uniforms[0].as_ref().unwrap().declaration;
        assert!(matches!(&lights.array, Some(ArrayLength::Property(reference)) if reference.name == "LIGHTS"));
        let weights = &shader.uniforms[1].as_ref().unwrap().declaration;
        assert_eq!(weights.array, Some(ArrayLength::Fixed(4)));
    }

    #[test]
    fn test_duplicate_uniform_slot() {
        let error = compile("uniform 1 float a;\nuniform 1 float b;\nvertex {} fragment {}").unwrap_err();
        assert!(error.message.contains("Duplicate uniform slot"));
        assert_eq!(error.location, Some(SourceLocation::new(2, 9)));
    }

    #[test]
    fn test_slot_capacity_is_validated() {
        let error = compile("uniform 32 float a; vertex {} fragment {}").unwrap_err();
        assert!(error.message.contains("out of range"));
        let error = compile("attribute 8 vec4 a; vertex {} fragment {}").unwrap_err();
        assert!(error.message.contains("out of range"));
    }

    #[test]
    fn test_unknown_directive() {
        let error = compile("texture 0 sampler2D t;").unwrap_err();
        assert_eq!(error.message, "Unknown directive: texture");
        assert_eq!(error.location, Some(SourceLocation::new(1, 1)));
    }

    #[test]
    fn test_malformed_declarations() {
        assert!(compile("uniform 0 vec5 a; vertex {} fragment {}").unwrap_err().message.contains("Unknown type"));
        assert!(compile("uniform 0 vec4 a vertex {} fragment {}").unwrap_err().message.contains("Expected ';'"));
        assert!(compile("uniform a vec4 b; vertex {} fragment {}").unwrap_err().message.contains("slot index"));
        assert!(compile("uniform 0 vec4 a[0]; vertex {} fragment {}").unwrap_err().message.contains("positive"));
        assert!(compile("uniform 0 vec4").unwrap_err().message.contains("Unexpected end of input"));
    }

    #[test]
    fn test_redeclared_identifier() {
        let error = compile("uniform 0 vec4 a; varying vec4 a; vertex {} fragment {}").unwrap_err();
        assert_eq!(error.message, "Redeclaring identifier: a");
    }

    #[test]
    fn test_missing_and_duplicate_blocks() {
        assert_eq!(compile("vertex {}").unwrap_err().message, "Missing fragment block");
        assert_eq!(compile("fragment {}").unwrap_err().message, "Missing vertex block");
        assert!(compile("vertex {} vertex {} fragment {}").unwrap_err().message.contains("Duplicate vertex block"));
    }

    #[test]
    fn test_undeclared_property_reference() {
        let error = compile("vertex { gl_Position = vec4($WIDTH); } fragment {}").unwrap_err();
        assert_eq!(error.message, "Undeclared property: WIDTH");
        assert_eq!(error.location, Some(SourceLocation::new(1, 29)));
    }

    #[test]
    fn test_property_types_are_checked() {
        let error = compile("property float N; uniform 0 vec4 a[$N]; vertex {} fragment {}").unwrap_err();
        assert!(error.message.contains("must be int"));
        let error = compile("property int ENABLED; attribute 0 vec4 a if ENABLED; vertex {} fragment {}").unwrap_err();
        assert!(error.message.contains("must be bool"));
    }

    #[test]
    fn test_compile_error_never_partial() {
        // The error surfaces even though everything before it was valid
        assert!(compile(&format!("{TEXTURED}\nbogus;")).is_err());
    }

    proptest! {
        #[test]
        fn prop_compile_is_deterministic(slots in proptest::collection::btree_set(0usize..MAX_UNIFORMS, 0..8)) {
            let mut source = String::new();
            for slot in &slots {
                source.push_str(&format!("uniform {slot} vec4 u_{slot};\n"));
            }
            source.push_str("vertex { gl_Position = vec4(0.0); }\nfragment { }\n");

            let first = compile(&source).unwrap();
            let second = compile(&source).unwrap();
            prop_assert_eq!(&first, &second);

            let declared: Vec<usize> = first.uniforms.iter().flatten().map(|uniform| uniform.slot).collect();
            prop_assert_eq!(declared, slots.iter().copied().collect::<Vec<_>>());
        }
    }
}
