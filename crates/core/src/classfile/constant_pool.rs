//! Constant pool decoding and typed lookups.

use super::reader::ByteReader;
use super::ClassFileError;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Constant {
    /// Index 0 and the second slot of Long/Double entries.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// Resolved field or method reference. `class_name` stays in internal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberRef<'a> {
    pub class_name: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InvokeDynamicRef<'a> {
    pub bootstrap_index: u16,
    pub name: &'a str,
    pub descriptor: &'a str,
}

pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let index = entries.len();
            let tag = reader.u1()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = reader.u2()? as usize;
                    let raw = reader.take(len)?;
                    Constant::Utf8(decode_modified_utf8(raw).ok_or(
                        ClassFileError::InvalidUtf8 { index: index as u16 },
                    )?)
                }
                TAG_INTEGER => Constant::Integer(reader.i4()?),
                TAG_FLOAT => Constant::Float(f32::from_bits(reader.u4()?)),
                TAG_LONG => {
                    let high = reader.u4()? as u64;
                    let low = reader.u4()? as u64;
                    Constant::Long(((high << 32) | low) as i64)
                }
                TAG_DOUBLE => {
                    let high = reader.u4()? as u64;
                    let low = reader.u4()? as u64;
                    Constant::Double(f64::from_bits((high << 32) | low))
                }
                TAG_CLASS => Constant::Class { name_index: reader.u2()? },
                TAG_STRING => Constant::String { string_index: reader.u2()? },
                TAG_FIELDREF => Constant::FieldRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_METHODREF => Constant::MethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: reader.u1()?,
                    reference_index: reader.u2()?,
                },
                TAG_METHOD_TYPE => Constant::MethodType { descriptor_index: reader.u2()? },
                TAG_DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_MODULE => Constant::Module { name_index: reader.u2()? },
                TAG_PACKAGE => Constant::Package { name_index: reader.u2()? },
                other => {
                    return Err(ClassFileError::InvalidConstantTag { tag: other, index: index as u16 })
                }
            };
            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: u16) -> Result<&Constant, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFileError::BadConstantIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    fn mismatch(index: u16, expected: &'static str) -> ClassFileError {
        ClassFileError::ConstantTypeMismatch { index, expected }
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(Self::mismatch(index, "Utf8")),
        }
    }

    /// Internal-form name of a `Class` entry.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(Self::mismatch(index, "Class")),
        }
    }

    pub(crate) fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFileError> {
        match self.get(index)? {
            Constant::NameAndType { name_index, descriptor_index } => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            _ => Err(Self::mismatch(index, "NameAndType")),
        }
    }

    fn member(&self, class_index: u16, nat_index: u16) -> Result<MemberRef<'_>, ClassFileError> {
        let class_name = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef { class_name, name, descriptor })
    }

    pub(crate) fn field_ref(&self, index: u16) -> Result<MemberRef<'_>, ClassFileError> {
        match self.get(index)? {
            Constant::FieldRef { class_index, name_and_type_index } => {
                self.member(*class_index, *name_and_type_index)
            }
            _ => Err(Self::mismatch(index, "Fieldref")),
        }
    }

    /// Either a `Methodref` or an `InterfaceMethodref`.
    pub(crate) fn method_ref(&self, index: u16) -> Result<MemberRef<'_>, ClassFileError> {
        match self.get(index)? {
            Constant::MethodRef { class_index, name_and_type_index }
            | Constant::InterfaceMethodRef { class_index, name_and_type_index } => {
                self.member(*class_index, *name_and_type_index)
            }
            _ => Err(Self::mismatch(index, "Methodref")),
        }
    }

    /// Target of a `MethodHandle` entry: its reference kind and member.
    pub(crate) fn method_handle(&self, index: u16) -> Result<(u8, MemberRef<'_>), ClassFileError> {
        match self.get(index)? {
            Constant::MethodHandle { reference_kind, reference_index } => {
                let member = match self.get(*reference_index)? {
                    Constant::FieldRef { class_index, name_and_type_index }
                    | Constant::MethodRef { class_index, name_and_type_index }
                    | Constant::InterfaceMethodRef { class_index, name_and_type_index } => {
                        self.member(*class_index, *name_and_type_index)?
                    }
                    _ => return Err(Self::mismatch(*reference_index, "member reference")),
                };
                Ok((*reference_kind, member))
            }
            _ => Err(Self::mismatch(index, "MethodHandle")),
        }
    }

    pub(crate) fn invoke_dynamic(&self, index: u16) -> Result<InvokeDynamicRef<'_>, ClassFileError> {
        match self.get(index)? {
            Constant::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok(InvokeDynamicRef { bootstrap_index: *bootstrap_method_attr_index, name, descriptor })
            }
            _ => Err(Self::mismatch(index, "InvokeDynamic")),
        }
    }
}

/// Decode the JVM's modified UTF-8 (encoded NUL, surrogate pairs as two 3-byte units).
pub(crate) fn decode_modified_utf8(raw: &[u8]) -> Option<String> {
    if !raw.contains(&0xC0) && !raw.contains(&0xED) {
        if let Ok(s) = std::str::from_utf8(raw) {
            return Some(s.to_string());
        }
    }

    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *raw.get(i + 1)?;
            units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *raw.get(i + 1)?;
            let b3 = *raw.get(i + 2)?;
            units.push(
                (((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16,
            );
            i += 3;
        } else {
            return None;
        }
    }
    Some(String::from_utf16_lossy(&units))
}
