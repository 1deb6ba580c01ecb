//! Shared fixtures for the integration tests.
//!
//! [`TestMetadata`] implements the metadata capabilities over plain maps, the
//! way a host embedding the decompiler would back them with its own metadata
//! reader. Bodies are assembled by hand; `push_token` appends a token-carrying
//! instruction so offsets stay readable at the call site.

#![allow(dead_code)]

use std::collections::HashMap;

use exprscope::prelude::*;

/// In-memory metadata for the integration scenarios.
#[derive(Default)]
pub struct TestMetadata {
    strings: HashMap<u32, String>,
    methods: HashMap<u32, MethodRef>,
    fields: HashMap<u32, FieldRef>,
    accessors: HashMap<(String, String), MethodDef>,
    next_token: u32,
}

impl TestMetadata {
    pub fn new() -> Self {
        TestMetadata::default()
    }

    fn next(&mut self) -> u32 {
        self.next_token += 1;
        self.next_token
    }

    pub fn add_string(&mut self, value: &str) -> u32 {
        let token = self.next();
        self.strings.insert(token, value.to_string());
        token
    }

    pub fn add_method(&mut self, method: MethodRef) -> u32 {
        let token = self.next();
        self.methods.insert(token, method);
        token
    }

    /// Instance `get_*` accessor reference on `declaring_type`.
    pub fn add_getter(&mut self, declaring_type: &str, property: &str) -> u32 {
        self.add_method(MethodRef {
            declaring_type: declaring_type.to_string(),
            name: format!("get_{property}"),
            is_static: false,
            param_count: 0,
        })
    }

    /// Instance method reference with `param_count` declared parameters.
    pub fn add_instance_method(
        &mut self,
        declaring_type: &str,
        name: &str,
        param_count: usize,
    ) -> u32 {
        self.add_method(MethodRef {
            declaring_type: declaring_type.to_string(),
            name: name.to_string(),
            is_static: false,
            param_count,
        })
    }

    /// Static method reference with `param_count` declared parameters.
    pub fn add_static_method(
        &mut self,
        declaring_type: &str,
        name: &str,
        param_count: usize,
    ) -> u32 {
        self.add_method(MethodRef {
            declaring_type: declaring_type.to_string(),
            name: name.to_string(),
            is_static: true,
            param_count,
        })
    }

    pub fn add_field(&mut self, declaring_type: &str, name: &str) -> u32 {
        let token = self.next();
        self.fields.insert(
            token,
            FieldRef {
                declaring_type: declaring_type.to_string(),
                name: name.to_string(),
            },
        );
        token
    }

    /// Registers `method` as the accessor body backing `property` on the
    /// method's declaring type.
    pub fn add_accessor(&mut self, property: &str, method: MethodDef) {
        let declaring_type = method.reference.declaring_type.clone();
        self.accessors
            .insert((declaring_type, property.to_string()), method);
    }
}

impl TokenResolver for TestMetadata {
    fn resolve_string(&self, token: u32) -> Result<String> {
        self.strings
            .get(&token)
            .cloned()
            .ok_or_else(|| unknown_token("string", token))
    }

    fn resolve_method(&self, token: u32) -> Result<MethodRef> {
        self.methods
            .get(&token)
            .cloned()
            .ok_or_else(|| unknown_token("method", token))
    }

    fn resolve_field(&self, token: u32) -> Result<FieldRef> {
        self.fields
            .get(&token)
            .cloned()
            .ok_or_else(|| unknown_token("field", token))
    }

    fn resolve_type(&self, token: u32) -> Result<TypeRef> {
        Err(unknown_token("type", token))
    }
}

impl MetadataProvider for TestMetadata {
    fn accessor(&self, member: &MemberRef) -> Option<&MethodDef> {
        self.accessors
            .get(&(member.declaring_type.clone(), member.name.clone()))
    }
}

fn unknown_token(kind: &str, token: u32) -> Error {
    Error::Malformed {
        message: format!("unknown {kind} token {token:#010X}"),
        file: file!(),
        line: line!(),
    }
}

/// A static lambda method named `Lambda` over `parameters`, with `body`.
pub fn lambda(parameters: &[&str], body: Vec<u8>) -> MethodDef {
    MethodDef {
        reference: MethodRef {
            declaring_type: "Program".to_string(),
            name: "Lambda".to_string(),
            is_static: true,
            param_count: parameters.len(),
        },
        parameters: parameters
            .iter()
            .map(|name| ParamDef {
                name: (*name).to_string(),
                param_type: "Object".to_string(),
            })
            .collect(),
        body,
    }
}

/// An instance `get_*` accessor body on `declaring_type`.
pub fn accessor(declaring_type: &str, property: &str, body: Vec<u8>) -> MethodDef {
    MethodDef {
        reference: MethodRef {
            declaring_type: declaring_type.to_string(),
            name: format!("get_{property}"),
            is_static: false,
            param_count: 0,
        },
        parameters: Vec::new(),
        body,
    }
}

/// Appends `opcode` followed by the little-endian `token`.
pub fn push_token(body: &mut Vec<u8>, opcode: u8, token: u32) {
    body.push(opcode);
    body.extend_from_slice(&token.to_le_bytes());
}
