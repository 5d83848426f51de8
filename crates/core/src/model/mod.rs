//! Core data model for decoded classes.
//!
//! Everything here is produced by the class-file decoder and never mutated
//! afterwards. Method references everywhere use [`MethodId`], the
//! `(owner, name, descriptor)` triple.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

mod arena;

pub use arena::ClassArena;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;
pub const ACC_MODULE: u16 = 0x8000;

/// Canonical identifier of a method: owner class, name and JVM descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodId {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodId {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self { owner: owner.into(), name: name.into(), descriptor: descriptor.into() }
    }

    /// `name + descriptor`, the key used for repository methods in reports.
    pub fn signature_key(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    pub fn is_owned_by(&self, class_name: &str) -> bool {
        self.owner == class_name
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessKind {
    Read,
    Write,
}

/// A single field-access fact: the field's owner as named by the instruction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldAccess {
    pub owner: String,
    pub name: String,
    pub kind: AccessKind,
}

impl FieldAccess {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, kind: AccessKind) -> Self {
        Self { owner: owner.into(), name: name.into(), kind }
    }
}

/// Synthetic implementation method captured by a lambda metafactory call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LambdaImplementation {
    pub implementation: MethodId,
    /// Dotted name of the functional interface being synthesized.
    pub functional_interface: String,
    /// Name of the single abstract method it implements (e.g. `accept`).
    pub interface_method: String,
}

/// Inclusive source line range derived from a method's `LineNumberTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start: start.min(end), end: start.max(end) }
    }

    pub fn include(self, line: u32) -> Self {
        Self { start: self.start.min(line), end: self.end.max(line) }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Value of an annotation element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ElementValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
    Enum { type_name: String, constant: String },
    /// Class literal; object types are dotted names, primitives keep their descriptor.
    Class(String),
    Annotation(Box<AnnotationModel>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationModel {
    /// Dotted fully qualified annotation type name.
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub elements: BTreeMap<String, ElementValue>,
}

impl AnnotationModel {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.type_name)
    }

    /// Class literal value of the named element, if it holds one.
    pub fn class_element(&self, name: &str) -> Option<&str> {
        match self.elements.get(name)? {
            ElementValue::Class(class_name) => Some(class_name),
            ElementValue::Array(values) if values.len() == 1 => match &values[0] {
                ElementValue::Class(class_name) => Some(class_name),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Annotation,
    Enum,
    Module,
}

impl ClassKind {
    pub fn from_access_flags(flags: u16) -> Self {
        if flags & ACC_MODULE != 0 {
            ClassKind::Module
        } else if flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModel {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
}

impl FieldModel {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodModel {
    pub id: MethodId,
    pub access_flags: u16,
    /// Direct invocation targets with their call counts.
    #[serde(with = "call_counts")]
    pub called_methods: BTreeMap<MethodId, u32>,
    pub field_accesses: BTreeSet<FieldAccess>,
    pub lambda_implementations: Vec<LambdaImplementation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
}

impl MethodModel {
    pub fn new(id: MethodId, access_flags: u16) -> Self {
        Self {
            id,
            access_flags,
            called_methods: BTreeMap::new(),
            field_accesses: BTreeSet::new(),
            lambda_implementations: Vec::new(),
            line_range: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.access_flags & ACC_SYNTHETIC != 0
    }

    pub fn record_call(&mut self, target: MethodId) {
        *self.called_methods.entry(target).or_insert(0) += 1;
    }
}

/// Structural model of one decoded class file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    /// Dotted fully qualified name.
    pub name: String,
    pub kind: ClassKind,
    pub access_flags: u16,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_signature: Option<String>,
    pub annotations: Vec<AnnotationModel>,
    pub declared_fields: Vec<FieldModel>,
    pub methods: Vec<MethodModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl ClassModel {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn package(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.declared_fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodModel> {
        self.methods.iter().find(|m| m.id.name == name && m.id.descriptor == descriptor)
    }
}

/// Simple (unqualified) part of a dotted class name; nested classes keep their `$` suffix.
pub fn simple_name(class_name: &str) -> &str {
    match class_name.rfind('.') {
        Some(idx) => &class_name[idx + 1..],
        None => class_name,
    }
}

/// Convert an internal class name (`com/shop/Order`) to its dotted form.
pub fn dotted(internal: &str) -> String {
    internal.replace('/', ".")
}

/// JSON maps need string keys, so call counts travel as `[{target, count}]`.
mod call_counts {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::MethodId;

    #[derive(Serialize, Deserialize)]
    struct CallCount {
        target: MethodId,
        count: u32,
    }

    pub fn serialize<S: Serializer>(
        calls: &BTreeMap<MethodId, u32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<CallCount> = calls
            .iter()
            .map(|(target, count)| CallCount { target: target.clone(), count: *count })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<MethodId, u32>, D::Error> {
        let entries = Vec::<CallCount>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.target, e.count)).collect())
    }
}
