//! Bytecode walker: extracts field accesses, invocations and lambda targets.

use super::attributes::{self, BootstrapMethod};
use super::constant_pool::ConstantPool;
use super::reader::ByteReader;
use super::signature::{object_type_name, return_type};
use super::ClassFileError;
use crate::model::{dotted, AccessKind, FieldAccess, LambdaImplementation, LineRange, MethodId, MethodModel};

pub(crate) const GETSTATIC: u8 = 0xb2;
pub(crate) const PUTSTATIC: u8 = 0xb3;
pub(crate) const GETFIELD: u8 = 0xb4;
pub(crate) const PUTFIELD: u8 = 0xb5;
pub(crate) const INVOKEVIRTUAL: u8 = 0xb6;
pub(crate) const INVOKESPECIAL: u8 = 0xb7;
pub(crate) const INVOKESTATIC: u8 = 0xb8;
pub(crate) const INVOKEINTERFACE: u8 = 0xb9;
pub(crate) const INVOKEDYNAMIC: u8 = 0xba;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";
const METAFACTORY_METHODS: [&str; 2] = ["metafactory", "altMetafactory"];
/// Position of the implementation method handle among metafactory static arguments.
const IMPL_HANDLE_ARGUMENT: usize = 1;

/// Interesting parts of a `Code` attribute.
pub(crate) struct CodeAttribute<'a> {
    pub code: &'a [u8],
    pub line_range: Option<LineRange>,
}

pub(crate) fn parse_code_attribute<'a>(
    data: &'a [u8],
    pool: &ConstantPool,
) -> Result<CodeAttribute<'a>, ClassFileError> {
    let mut reader = ByteReader::new(data);
    let _max_stack = reader.u2()?;
    let _max_locals = reader.u2()?;
    let code_len = reader.u4()? as usize;
    let code = reader.take(code_len)?;
    let exception_entries = reader.u2()? as usize;
    reader.skip(exception_entries * 8)?;

    let mut line_range: Option<LineRange> = None;
    for attr in attributes::read_attributes(&mut reader, pool)? {
        if attr.name == attributes::LINE_NUMBER_TABLE {
            if let Some(range) = attributes::parse_line_range(attr.data)? {
                line_range = Some(match line_range {
                    Some(existing) => existing.include(range.start).include(range.end),
                    None => range,
                });
            }
        }
    }
    Ok(CodeAttribute { code, line_range })
}

/// Length in bytes of the instruction starting at `pc`.
pub(crate) fn instruction_length(code: &[u8], pc: usize) -> Result<usize, ClassFileError> {
    let opcode = code[pc];
    let len = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        0x12 => 2,
        0x13 | 0x14 => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let base = pc + 1 + padding(pc);
            let low = read_i32(code, base + 4, pc)?;
            let high = read_i32(code, base + 8, pc)?;
            if high < low {
                return Err(ClassFileError::TruncatedInstruction { pc });
            }
            let targets = (high as i64 - low as i64 + 1) as usize;
            1 + padding(pc) + 12 + targets * 4
        }
        LOOKUPSWITCH => {
            let base = pc + 1 + padding(pc);
            let pairs = read_i32(code, base + 4, pc)?;
            if pairs < 0 {
                return Err(ClassFileError::TruncatedInstruction { pc });
            }
            1 + padding(pc) + 8 + pairs as usize * 8
        }
        0xac..=0xb1 => 1,
        0xb2..=0xb8 => 3,
        INVOKEINTERFACE | INVOKEDYNAMIC => 5,
        0xbb => 3,
        0xbc => 2,
        0xbd => 3,
        0xbe | 0xbf => 1,
        0xc0 | 0xc1 => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(ClassFileError::TruncatedInstruction { pc }),
        },
        0xc5 => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        0xca | 0xfe | 0xff => 1,
        other => return Err(ClassFileError::InvalidOpcode { opcode: other, pc }),
    };
    if pc + len > code.len() {
        return Err(ClassFileError::TruncatedInstruction { pc });
    }
    Ok(len)
}

/// Switch operands are 4-byte aligned relative to the start of the code array.
fn padding(pc: usize) -> usize {
    (4 - (pc + 1) % 4) % 4
}

fn read_i32(code: &[u8], at: usize, pc: usize) -> Result<i32, ClassFileError> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ClassFileError::TruncatedInstruction { pc })
}

fn operand_u16(code: &[u8], pc: usize) -> u16 {
    u16::from_be_bytes([code[pc + 1], code[pc + 2]])
}

/// Walk `code` and record the facts of interest into `method`.
pub(crate) fn scan_instructions(
    code: &[u8],
    pool: &ConstantPool,
    bootstrap_methods: &[BootstrapMethod],
    method: &mut MethodModel,
) -> Result<(), ClassFileError> {
    let mut pc = 0;
    while pc < code.len() {
        let len = instruction_length(code, pc)?;
        match code[pc] {
            op @ (GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD) => {
                let field = pool.field_ref(operand_u16(code, pc))?;
                let kind = if matches!(op, GETSTATIC | GETFIELD) {
                    AccessKind::Read
                } else {
                    AccessKind::Write
                };
                method.field_accesses.insert(FieldAccess::new(dotted(field.class_name), field.name, kind));
            }
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => {
                let target = pool.method_ref(operand_u16(code, pc))?;
                method.record_call(MethodId::new(dotted(target.class_name), target.name, target.descriptor));
            }
            INVOKEDYNAMIC => {
                if let Some(lambda) = lambda_target(operand_u16(code, pc), pool, bootstrap_methods)? {
                    method.lambda_implementations.push(lambda);
                }
            }
            _ => {}
        }
        pc += len;
    }
    Ok(())
}

/// Resolve an invokedynamic call site to its lambda body, when the bootstrap
/// is the lambda metafactory. Other bootstraps (string concat, records) yield `None`.
fn lambda_target(
    index: u16,
    pool: &ConstantPool,
    bootstrap_methods: &[BootstrapMethod],
) -> Result<Option<LambdaImplementation>, ClassFileError> {
    let call_site = pool.invoke_dynamic(index)?;
    let bootstrap = bootstrap_methods
        .get(call_site.bootstrap_index as usize)
        .ok_or(ClassFileError::MissingBootstrapMethod { index: call_site.bootstrap_index })?;

    let (_, factory) = pool.method_handle(bootstrap.method_ref)?;
    if factory.class_name != LAMBDA_METAFACTORY || !METAFACTORY_METHODS.contains(&factory.name) {
        return Ok(None);
    }
    let Some(&handle_index) = bootstrap.arguments.get(IMPL_HANDLE_ARGUMENT) else {
        return Ok(None);
    };
    let (_, implementation) = pool.method_handle(handle_index)?;
    let functional_interface = return_type(call_site.descriptor)
        .and_then(object_type_name)
        .unwrap_or_else(|| call_site.descriptor.to_string());

    Ok(Some(LambdaImplementation {
        implementation: MethodId::new(
            dotted(implementation.class_name),
            implementation.name,
            implementation.descriptor,
        ),
        functional_interface,
        interface_method: call_site.name.to_string(),
    }))
}
