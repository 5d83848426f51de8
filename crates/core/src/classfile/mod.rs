//! Class Model Decoder.
//!
//! Parses one binary class file into a [`ClassModel`]: identity, supertypes,
//! annotations, generic signature, declared fields, and per-method facts
//! (field accesses, invocation targets with counts, lambda implementations).
//!
//! Decoding is all-or-nothing per class; callers decide what to do with a
//! failure (the analysis pass logs and skips).

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{dotted, ClassKind, ClassModel, FieldModel, LineRange, MethodId, MethodModel};

mod attributes;
mod code;
mod constant_pool;
mod reader;
pub mod signature;

use attributes::BootstrapMethod;
use constant_pool::ConstantPool;
use reader::ByteReader;

/// Class-file magic number.
pub const MAGIC: u32 = 0xCAFEBABE;

#[derive(Debug, Error)]
pub enum ClassFileError {
    #[error("Failed to read class file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Bad magic number 0x{0:08X}")]
    BadMagic(u32),
    #[error("Unexpected end of data at offset {offset} (needed {needed} bytes)")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("Invalid modified UTF-8 in constant #{index}")]
    InvalidUtf8 { index: u16 },
    #[error("Invalid constant pool tag {tag} at #{index}")]
    InvalidConstantTag { tag: u8, index: u16 },
    #[error("Constant pool index #{index} is out of range or unusable")]
    BadConstantIndex { index: u16 },
    #[error("Constant #{index} is not a {expected} entry")]
    ConstantTypeMismatch { index: u16, expected: &'static str },
    #[error("Invalid annotation element tag {tag:#04x}")]
    InvalidElementTag { tag: u8 },
    #[error("Invalid opcode 0x{opcode:02X} at pc {pc}")]
    InvalidOpcode { opcode: u8, pc: usize },
    #[error("Truncated instruction at pc {pc}")]
    TruncatedInstruction { pc: usize },
    #[error("Invokedynamic refers to missing bootstrap method #{index}")]
    MissingBootstrapMethod { index: u16 },
    #[error("Malformed generic signature {signature:?} at offset {offset}")]
    MalformedSignature { signature: String, offset: usize },
}

/// Method header plus its (not yet scanned) code.
struct PendingMethod<'a> {
    id: MethodId,
    access_flags: u16,
    code: Option<&'a [u8]>,
    line_range: Option<LineRange>,
}

/// Decode a class file from disk.
pub fn decode_file(path: &Path) -> Result<ClassModel, ClassFileError> {
    let bytes = std::fs::read(path)
        .map_err(|source| ClassFileError::Io { path: path.to_path_buf(), source })?;
    decode_class(&bytes)
}

/// Decode one class file image.
pub fn decode_class(bytes: &[u8]) -> Result<ClassModel, ClassFileError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.u4()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    let _minor = reader.u2()?;
    let _major = reader.u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access_flags = reader.u2()?;
    let name = dotted(pool.class_name(reader.u2()?)?);
    let superclass = match reader.u2()? {
        0 => None,
        index => Some(dotted(pool.class_name(index)?)),
    };
    let interface_count = reader.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(dotted(pool.class_name(reader.u2()?)?));
    }

    let field_count = reader.u2()?;
    let mut declared_fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let access_flags = reader.u2()?;
        let field_name = pool.utf8(reader.u2()?)?.to_string();
        let descriptor = pool.utf8(reader.u2()?)?.to_string();
        attributes::read_attributes(&mut reader, &pool)?;
        declared_fields.push(FieldModel { name: field_name, descriptor, access_flags });
    }

    let method_count = reader.u2()?;
    let mut pending = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        let access_flags = reader.u2()?;
        let method_name = pool.utf8(reader.u2()?)?;
        let descriptor = pool.utf8(reader.u2()?)?;
        let mut code = None;
        let mut line_range = None;
        for attr in attributes::read_attributes(&mut reader, &pool)? {
            if attr.name == attributes::CODE {
                let parsed = code::parse_code_attribute(attr.data, &pool)?;
                code = Some(parsed.code);
                line_range = parsed.line_range;
            }
        }
        pending.push(PendingMethod {
            id: MethodId::new(name.clone(), method_name, descriptor),
            access_flags,
            code,
            line_range,
        });
    }

    let mut generic_signature = None;
    let mut source_file = None;
    let mut annotations = Vec::new();
    let mut bootstrap_methods: Vec<BootstrapMethod> = Vec::new();
    for attr in attributes::read_attributes(&mut reader, &pool)? {
        match attr.name {
            attributes::SIGNATURE => generic_signature = Some(attributes::utf8_payload(&attr, &pool)?),
            attributes::SOURCE_FILE => source_file = Some(attributes::utf8_payload(&attr, &pool)?),
            attributes::RUNTIME_VISIBLE_ANNOTATIONS | attributes::RUNTIME_INVISIBLE_ANNOTATIONS => {
                annotations.extend(attributes::parse_annotations(attr.data, &pool)?);
            }
            attributes::BOOTSTRAP_METHODS => {
                bootstrap_methods = attributes::parse_bootstrap_methods(attr.data)?;
            }
            _ => {}
        }
    }

    // Bootstrap methods live after the method table, so code is scanned last.
    let methods = pending
        .into_iter()
        .map(|m| build_method(m, &pool, &bootstrap_methods))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassModel {
        name,
        kind: ClassKind::from_access_flags(access_flags),
        access_flags,
        superclass,
        interfaces,
        generic_signature,
        annotations,
        declared_fields,
        methods,
        source_file,
    })
}

fn build_method(
    pending: PendingMethod<'_>,
    pool: &ConstantPool,
    bootstrap_methods: &[BootstrapMethod],
) -> Result<MethodModel, ClassFileError> {
    let mut method = MethodModel::new(pending.id, pending.access_flags);
    method.line_range = pending.line_range;
    if let Some(code) = pending.code {
        code::scan_instructions(code, pool, bootstrap_methods, &mut method)?;
    }
    Ok(method)
}
