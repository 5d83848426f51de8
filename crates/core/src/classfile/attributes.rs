//! Attribute table parsing: annotations, bootstrap methods and line numbers.

use std::collections::BTreeMap;

use super::constant_pool::{Constant, ConstantPool};
use super::reader::ByteReader;
use super::signature::object_type_name;
use super::ClassFileError;
use crate::model::{AnnotationModel, ElementValue, LineRange};

pub(crate) const CODE: &str = "Code";
pub(crate) const SIGNATURE: &str = "Signature";
pub(crate) const SOURCE_FILE: &str = "SourceFile";
pub(crate) const BOOTSTRAP_METHODS: &str = "BootstrapMethods";
pub(crate) const LINE_NUMBER_TABLE: &str = "LineNumberTable";
pub(crate) const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub(crate) const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// An attribute whose payload has not been interpreted yet.
pub(crate) struct RawAttribute<'p, 'a> {
    pub name: &'p str,
    pub data: &'a [u8],
}

pub(crate) fn read_attributes<'p, 'a>(
    reader: &mut ByteReader<'a>,
    pool: &'p ConstantPool,
) -> Result<Vec<RawAttribute<'p, 'a>>, ClassFileError> {
    let count = reader.u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = pool.utf8(reader.u2()?)?;
        let len = reader.u4()? as usize;
        let data = reader.take(len)?;
        attributes.push(RawAttribute { name, data });
    }
    Ok(attributes)
}

/// Single `u2` constant-pool index payload (e.g. `Signature`, `SourceFile`).
pub(crate) fn utf8_payload(attr: &RawAttribute<'_, '_>, pool: &ConstantPool) -> Result<String, ClassFileError> {
    let mut reader = ByteReader::new(attr.data);
    Ok(pool.utf8(reader.u2()?)?.to_string())
}

pub(crate) fn parse_annotations(
    data: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<AnnotationModel>, ClassFileError> {
    let mut reader = ByteReader::new(data);
    let count = reader.u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(annotation(&mut reader, pool)?);
    }
    Ok(annotations)
}

fn type_name_of(descriptor: &str) -> String {
    object_type_name(descriptor).unwrap_or_else(|| descriptor.to_string())
}

fn annotation(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<AnnotationModel, ClassFileError> {
    let type_name = type_name_of(pool.utf8(reader.u2()?)?);
    let pairs = reader.u2()?;
    let mut elements = BTreeMap::new();
    for _ in 0..pairs {
        let name = pool.utf8(reader.u2()?)?.to_string();
        let value = element_value(reader, pool)?;
        elements.insert(name, value);
    }
    Ok(AnnotationModel { type_name, elements })
}

fn int_constant(pool: &ConstantPool, index: u16) -> Result<i64, ClassFileError> {
    match pool.get(index)? {
        Constant::Integer(v) => Ok(*v as i64),
        Constant::Long(v) => Ok(*v),
        _ => Err(ClassFileError::ConstantTypeMismatch { index, expected: "Integer" }),
    }
}

fn float_constant(pool: &ConstantPool, index: u16) -> Result<f64, ClassFileError> {
    match pool.get(index)? {
        Constant::Float(v) => Ok(*v as f64),
        Constant::Double(v) => Ok(*v),
        _ => Err(ClassFileError::ConstantTypeMismatch { index, expected: "Float" }),
    }
}

fn element_value(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<ElementValue, ClassFileError> {
    let tag = reader.u1()?;
    let value = match tag {
        b'B' | b'I' | b'S' | b'J' => ElementValue::Int(int_constant(pool, reader.u2()?)?),
        b'C' => {
            let code = int_constant(pool, reader.u2()?)?;
            ElementValue::Char(char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        b'Z' => ElementValue::Bool(int_constant(pool, reader.u2()?)? != 0),
        b'F' | b'D' => ElementValue::Float(float_constant(pool, reader.u2()?)?),
        b's' => ElementValue::String(pool.utf8(reader.u2()?)?.to_string()),
        b'e' => {
            let type_name = type_name_of(pool.utf8(reader.u2()?)?);
            let constant = pool.utf8(reader.u2()?)?.to_string();
            ElementValue::Enum { type_name, constant }
        }
        b'c' => ElementValue::Class(type_name_of(pool.utf8(reader.u2()?)?)),
        b'@' => ElementValue::Annotation(Box::new(annotation(reader, pool)?)),
        b'[' => {
            let count = reader.u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(element_value(reader, pool)?);
            }
            ElementValue::Array(values)
        }
        other => return Err(ClassFileError::InvalidElementTag { tag: other }),
    };
    Ok(value)
}

/// One entry of the `BootstrapMethods` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BootstrapMethod {
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

pub(crate) fn parse_bootstrap_methods(data: &[u8]) -> Result<Vec<BootstrapMethod>, ClassFileError> {
    let mut reader = ByteReader::new(data);
    let count = reader.u2()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_ref = reader.u2()?;
        let arg_count = reader.u2()?;
        let mut arguments = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            arguments.push(reader.u2()?);
        }
        methods.push(BootstrapMethod { method_ref, arguments });
    }
    Ok(methods)
}

/// Reduce a `LineNumberTable` to its first/last line.
pub(crate) fn parse_line_range(data: &[u8]) -> Result<Option<LineRange>, ClassFileError> {
    let mut reader = ByteReader::new(data);
    let count = reader.u2()?;
    let mut range: Option<LineRange> = None;
    for _ in 0..count {
        let _start_pc = reader.u2()?;
        let line = reader.u2()? as u32;
        range = Some(match range {
            Some(r) => r.include(line),
            None => LineRange::new(line, line),
        });
    }
    Ok(range)
}
