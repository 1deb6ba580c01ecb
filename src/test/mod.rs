//! Shared fixtures for the unit tests.
//!
//! [`FakeMetadata`] is a token resolver over plain maps: tests register the
//! strings, methods and fields a body references and get back the token to
//! embed in the byte stream. Tokens are handed out sequentially; their numeric
//! value carries no meaning.

use std::collections::HashMap;

use crate::{
    disassembler::{Instruction, Operand, INSTRUCTIONS, INSTRUCTIONS_FE},
    metadata::{
        FieldRef, MemberRef, MetadataProvider, MethodDef, MethodRef, TokenResolver, TypeRef,
    },
    Result,
};

/// In-memory metadata for tests.
#[derive(Default)]
pub(crate) struct FakeMetadata {
    strings: HashMap<u32, String>,
    methods: HashMap<u32, MethodRef>,
    fields: HashMap<u32, FieldRef>,
    types: HashMap<u32, TypeRef>,
    accessors: HashMap<(String, String), MethodDef>,
    next_token: u32,
}

impl FakeMetadata {
    pub(crate) fn new() -> Self {
        FakeMetadata::default()
    }

    fn next(&mut self) -> u32 {
        self.next_token += 1;
        self.next_token
    }

    pub(crate) fn add_string(&mut self, value: &str) -> u32 {
        let token = self.next();
        self.strings.insert(token, value.to_string());
        token
    }

    pub(crate) fn add_method(&mut self, method: MethodRef) -> u32 {
        let token = self.next();
        self.methods.insert(token, method);
        token
    }

    /// Registers an instance `get_*` accessor reference and returns its token.
    pub(crate) fn add_getter(&mut self, declaring_type: &str, property: &str) -> u32 {
        self.add_method(MethodRef {
            declaring_type: declaring_type.to_string(),
            name: format!("get_{property}"),
            is_static: false,
            param_count: 0,
        })
    }

    pub(crate) fn add_field(&mut self, declaring_type: &str, name: &str) -> u32 {
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

    /// Registers the accessor body backing `declaring_type.property`.
    pub(crate) fn add_accessor(&mut self, property: &str, method: MethodDef) {
        let declaring_type = method.reference.declaring_type.clone();
        self.accessors
            .insert((declaring_type, property.to_string()), method);
    }
}

impl TokenResolver for FakeMetadata {
    fn resolve_string(&self, token: u32) -> Result<String> {
        self.strings
            .get(&token)
            .cloned()
            .ok_or_else(|| malformed_error!("unknown string token {:#010X}", token))
    }

    fn resolve_method(&self, token: u32) -> Result<MethodRef> {
        self.methods
            .get(&token)
            .cloned()
            .ok_or_else(|| malformed_error!("unknown method token {:#010X}", token))
    }

    fn resolve_field(&self, token: u32) -> Result<FieldRef> {
        self.fields
            .get(&token)
            .cloned()
            .ok_or_else(|| malformed_error!("unknown field token {:#010X}", token))
    }

    fn resolve_type(&self, token: u32) -> Result<TypeRef> {
        self.types
            .get(&token)
            .cloned()
            .ok_or_else(|| malformed_error!("unknown type token {:#010X}", token))
    }
}

impl MetadataProvider for FakeMetadata {
    fn accessor(&self, member: &MemberRef) -> Option<&MethodDef> {
        self.accessors
            .get(&(member.declaring_type.clone(), member.name.clone()))
    }
}

fn table_instruction(offset: usize, mnemonic: &str, operand: Operand) -> Instruction {
    if let Some((opcode, entry)) = INSTRUCTIONS
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.mnemonic == mnemonic)
    {
        return Instruction {
            offset,
            prefix: 0,
            opcode: u8::try_from(opcode).unwrap(),
            mnemonic: entry.mnemonic,
            flow: entry.flow,
            operand,
        };
    }

    let (opcode, entry) = INSTRUCTIONS_FE
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.mnemonic == mnemonic)
        .unwrap_or_else(|| panic!("unknown mnemonic '{mnemonic}' in test fixture"));

    Instruction {
        offset,
        prefix: 0xFE,
        opcode: u8::try_from(opcode).unwrap(),
        mnemonic: entry.mnemonic,
        flow: entry.flow,
        operand,
    }
}

/// An operand-less instruction at `offset`, looked up from the opcode tables.
pub(crate) fn instruction_at(offset: usize, mnemonic: &str) -> Instruction {
    table_instruction(offset, mnemonic, Operand::None)
}

/// A branch instruction at `offset` with an absolute `target`.
pub(crate) fn branch_at(offset: usize, mnemonic: &str, target: i64) -> Instruction {
    table_instruction(offset, mnemonic, Operand::Target(target))
}
