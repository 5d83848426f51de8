//! Test-only class-file writer.
//!
//! Produces real class-file images (Java 8 layout) so the decoder and the
//! whole pass can be exercised without a JDK. Names use internal form
//! (`com/shop/Order`).
#![allow(dead_code)]

use std::collections::HashMap;

pub use fieldscope_core::model::{
    ACC_ABSTRACT, ACC_ANNOTATION, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC, ACC_SYNTHETIC,
};

const ACC_PRIVATE: u16 = 0x0002;

const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const INVOKEDYNAMIC: u8 = 0xba;
const RETURN: u8 = 0xb1;

const METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";
const CONCAT_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/invoke/CallSite;";

#[derive(Debug, Clone)]
pub enum Value {
    Class(String),
    Str(String),
    Int(i32),
    Enum(String, String),
    Array(Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub descriptor: String,
    pub elements: Vec<(String, Value)>,
}

impl Annotation {
    /// `type_name` in internal form, e.g. `com/shop/AggregateRoot`.
    pub fn new(type_name: &str) -> Self {
        Self { descriptor: format!("L{type_name};"), elements: Vec::new() }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.elements.push((name.to_string(), value));
        self
    }
}

#[derive(Debug, Clone)]
enum Insn {
    Raw(Vec<u8>),
    Field { op: u8, owner: String, name: String, descriptor: String },
    Invoke { op: u8, owner: String, name: String, descriptor: String },
    Lambda {
        implementation: (String, String, String),
        interface_method: String,
        call_site_descriptor: String,
        erased_descriptor: String,
    },
    StringConcat,
}

#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    descriptor: String,
    access: u16,
    code: Option<Vec<Insn>>,
    lines: Option<(u16, u16)>,
}

impl MethodBuilder {
    fn new(name: &str, descriptor: &str, access: u16) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access,
            code: Some(Vec::new()),
            lines: None,
        }
    }

    fn push(mut self, insn: Insn) -> Self {
        self.code.get_or_insert_with(Vec::new).push(insn);
        self
    }

    pub fn abstract_method(mut self) -> Self {
        self.code = None;
        self.access |= ACC_ABSTRACT;
        self
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn lines(mut self, first: u16, last: u16) -> Self {
        self.lines = Some((first, last));
        self
    }

    pub fn raw(self, bytes: &[u8]) -> Self {
        self.push(Insn::Raw(bytes.to_vec()))
    }

    fn field(self, op: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        self.push(Insn::Field {
            op,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    pub fn getfield(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field(GETFIELD, owner, name, descriptor)
    }

    pub fn putfield(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field(PUTFIELD, owner, name, descriptor)
    }

    pub fn getstatic(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field(GETSTATIC, owner, name, descriptor)
    }

    pub fn putstatic(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.field(PUTSTATIC, owner, name, descriptor)
    }

    fn invoke(self, op: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        self.push(Insn::Invoke {
            op,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    pub fn invokevirtual(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.invoke(INVOKEVIRTUAL, owner, name, descriptor)
    }

    pub fn invokeinterface(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.invoke(INVOKEINTERFACE, owner, name, descriptor)
    }

    pub fn invokestatic(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.invoke(INVOKESTATIC, owner, name, descriptor)
    }

    pub fn invokespecial(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.invoke(INVOKESPECIAL, owner, name, descriptor)
    }

    /// `invokedynamic` through `LambdaMetafactory.metafactory` producing a
    /// `java.util.function.Consumer` backed by `owner.name descriptor`.
    pub fn consumer_lambda(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.lambda(owner, name, descriptor, "accept", "()Ljava/util/function/Consumer;", "(Ljava/lang/Object;)V")
    }

    pub fn lambda(
        self,
        owner: &str,
        name: &str,
        descriptor: &str,
        interface_method: &str,
        call_site_descriptor: &str,
        erased_descriptor: &str,
    ) -> Self {
        self.push(Insn::Lambda {
            implementation: (owner.to_string(), name.to_string(), descriptor.to_string()),
            interface_method: interface_method.to_string(),
            call_site_descriptor: call_site_descriptor.to_string(),
            erased_descriptor: erased_descriptor.to_string(),
        })
    }

    /// `invokedynamic` through `StringConcatFactory`, which is not a lambda.
    pub fn string_concat(self) -> Self {
        self.push(Insn::StringConcat)
    }
}

#[derive(Debug, Clone)]
struct FieldDef {
    name: String,
    descriptor: String,
    access: u16,
}

#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    access: u16,
    superclass: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    source_file: Option<String>,
    visible: Vec<Annotation>,
    invisible: Vec<Annotation>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodBuilder>,
}

impl ClassBuilder {
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            access: ACC_PUBLIC,
            superclass: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            source_file: None,
            visible: Vec::new(),
            invisible: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: &str) -> Self {
        let mut builder = Self::class(name);
        builder.access = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        builder
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn superclass(mut self, name: &str) -> Self {
        self.superclass = Some(name.to_string());
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn source_file(mut self, file: &str) -> Self {
        self.source_file = Some(file.to_string());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.visible.push(annotation);
        self
    }

    /// Marker annotation with no elements, stored as runtime-visible.
    pub fn marker(self, type_name: &str) -> Self {
        self.annotated(Annotation::new(type_name))
    }

    /// Annotation stored in `RuntimeInvisibleAnnotations` (class retention).
    pub fn class_retained(mut self, annotation: Annotation) -> Self {
        self.invisible.push(annotation);
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push(FieldDef { name: name.to_string(), descriptor: descriptor.to_string(), access: 0x0002 });
        self
    }

    pub fn static_field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: ACC_STATIC | ACC_PRIVATE,
        });
        self
    }

    pub fn method(
        mut self,
        name: &str,
        descriptor: &str,
        body: impl FnOnce(MethodBuilder) -> MethodBuilder,
    ) -> Self {
        self.methods.push(body(MethodBuilder::new(name, descriptor, ACC_PUBLIC)));
        self
    }

    /// Method without code (interface or abstract method).
    pub fn abstract_method(self, name: &str, descriptor: &str) -> Self {
        self.method(name, descriptor, MethodBuilder::abstract_method)
    }

    /// Private static synthetic method, as javac emits for lambda bodies.
    pub fn lambda_body(
        mut self,
        name: &str,
        descriptor: &str,
        body: impl FnOnce(MethodBuilder) -> MethodBuilder,
    ) -> Self {
        let access = ACC_PRIVATE | ACC_STATIC | ACC_SYNTHETIC;
        self.methods.push(body(MethodBuilder::new(name, descriptor, access)));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_index = pool.class(&self.name);
        let super_index = self.superclass.as_deref().map(|s| pool.class(s)).unwrap_or(0);
        let interface_indices: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let mut bootstraps: Vec<(u16, Vec<u16>)> = Vec::new();

        let mut body = Vec::new();
        put_u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u2(&mut body, field.access);
            put_u2(&mut body, pool.utf8(&field.name));
            put_u2(&mut body, pool.utf8(&field.descriptor));
            put_u2(&mut body, 0);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access);
            put_u2(&mut body, pool.utf8(&method.name));
            put_u2(&mut body, pool.utf8(&method.descriptor));
            match &method.code {
                None => put_u2(&mut body, 0),
                Some(insns) => {
                    put_u2(&mut body, 1);
                    let code_attr = encode_code(insns, method.lines, &mut pool, &mut bootstraps);
                    put_u2(&mut body, pool.utf8("Code"));
                    put_u4(&mut body, code_attr.len() as u32);
                    body.extend_from_slice(&code_attr);
                }
            }
        }

        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        if let Some(signature) = &self.signature {
            let mut data = Vec::new();
            put_u2(&mut data, pool.utf8(signature));
            attributes.push((pool.utf8("Signature"), data));
        }
        if let Some(file) = &self.source_file {
            let mut data = Vec::new();
            put_u2(&mut data, pool.utf8(file));
            attributes.push((pool.utf8("SourceFile"), data));
        }
        if !self.visible.is_empty() {
            let data = encode_annotations(&self.visible, &mut pool);
            attributes.push((pool.utf8("RuntimeVisibleAnnotations"), data));
        }
        if !self.invisible.is_empty() {
            let data = encode_annotations(&self.invisible, &mut pool);
            attributes.push((pool.utf8("RuntimeInvisibleAnnotations"), data));
        }
        if !bootstraps.is_empty() {
            let mut data = Vec::new();
            put_u2(&mut data, bootstraps.len() as u16);
            for (handle, args) in &bootstraps {
                put_u2(&mut data, *handle);
                put_u2(&mut data, args.len() as u16);
                for arg in args {
                    put_u2(&mut data, *arg);
                }
            }
            attributes.push((pool.utf8("BootstrapMethods"), data));
        }
        put_u2(&mut body, attributes.len() as u16);
        for (name, data) in &attributes {
            put_u2(&mut body, *name);
            put_u4(&mut body, data.len() as u32);
            body.extend_from_slice(data);
        }

        let mut out = Vec::new();
        put_u4(&mut out, 0xCAFEBABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, 52);
        put_u2(&mut out, pool.next);
        out.extend_from_slice(&pool.bytes);
        put_u2(&mut out, self.access);
        put_u2(&mut out, this_index);
        put_u2(&mut out, super_index);
        put_u2(&mut out, interface_indices.len() as u16);
        for index in interface_indices {
            put_u2(&mut out, index);
        }
        out.extend_from_slice(&body);
        out
    }

    /// Dotted name, as the decoder reports it.
    pub fn dotted_name(&self) -> String {
        self.name.replace('/', ".")
    }

    /// Write the class under `root` at its package path.
    pub fn write_to(&self, root: &std::path::Path) -> std::path::PathBuf {
        let path = root.join(format!("{}.class", self.name));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create package dirs");
        }
        std::fs::write(&path, self.build()).expect("write class file");
        path
    }
}

/// Decode fixtures into an arena, the way a pass would after its barrier.
pub fn arena_of(builders: &[ClassBuilder]) -> fieldscope_core::model::ClassArena {
    builders
        .iter()
        .map(|b| fieldscope_core::classfile::decode_class(&b.build()).expect("fixture decodes"))
        .collect()
}

fn encode_code(
    insns: &[Insn],
    lines: Option<(u16, u16)>,
    pool: &mut Pool,
    bootstraps: &mut Vec<(u16, Vec<u16>)>,
) -> Vec<u8> {
    let mut code = Vec::new();
    for insn in insns {
        match insn {
            Insn::Raw(bytes) => code.extend_from_slice(bytes),
            Insn::Field { op, owner, name, descriptor } => {
                code.push(*op);
                put_u2(&mut code, pool.member(9, owner, name, descriptor));
            }
            Insn::Invoke { op, owner, name, descriptor } => {
                code.push(*op);
                if *op == INVOKEINTERFACE {
                    put_u2(&mut code, pool.member(11, owner, name, descriptor));
                    let args = 1 + descriptor_slots(descriptor);
                    code.push(args);
                    code.push(0);
                } else {
                    put_u2(&mut code, pool.member(10, owner, name, descriptor));
                }
            }
            Insn::Lambda { implementation, interface_method, call_site_descriptor, erased_descriptor } => {
                let factory = pool.member(10, "java/lang/invoke/LambdaMetafactory", "metafactory", METAFACTORY_DESC);
                let factory_handle = pool.method_handle(6, factory);
                let (owner, name, descriptor) = implementation;
                let target = pool.member(10, owner, name, descriptor);
                let args = vec![
                    pool.method_type(erased_descriptor),
                    pool.method_handle(6, target),
                    pool.method_type(erased_descriptor),
                ];
                bootstraps.push((factory_handle, args));
                let index = pool.invoke_dynamic(bootstraps.len() as u16 - 1, interface_method, call_site_descriptor);
                code.push(INVOKEDYNAMIC);
                put_u2(&mut code, index);
                code.extend_from_slice(&[0, 0]);
            }
            Insn::StringConcat => {
                let factory = pool.member(
                    10,
                    "java/lang/invoke/StringConcatFactory",
                    "makeConcatWithConstants",
                    CONCAT_DESC,
                );
                let factory_handle = pool.method_handle(6, factory);
                let recipe = pool.string("\u{1}!");
                bootstraps.push((factory_handle, vec![recipe]));
                let index = pool.invoke_dynamic(
                    bootstraps.len() as u16 - 1,
                    "makeConcatWithConstants",
                    "(Ljava/lang/String;)Ljava/lang/String;",
                );
                code.push(INVOKEDYNAMIC);
                put_u2(&mut code, index);
                code.extend_from_slice(&[0, 0]);
            }
        }
    }
    code.push(RETURN);

    let mut out = Vec::new();
    put_u2(&mut out, 8);
    put_u2(&mut out, 8);
    put_u4(&mut out, code.len() as u32);
    out.extend_from_slice(&code);
    put_u2(&mut out, 0);
    match lines {
        Some((first, last)) => {
            put_u2(&mut out, 1);
            put_u2(&mut out, pool.utf8("LineNumberTable"));
            put_u4(&mut out, 2 + 2 * 4);
            put_u2(&mut out, 2);
            put_u2(&mut out, 0);
            put_u2(&mut out, first);
            put_u2(&mut out, (code.len() - 1) as u16);
            put_u2(&mut out, last);
        }
        None => put_u2(&mut out, 0),
    }
    out
}

/// Argument slots of a method descriptor (long/double count twice).
fn descriptor_slots(descriptor: &str) -> u8 {
    let params = descriptor.trim_start_matches('(').split(')').next().unwrap_or("");
    let bytes = params.as_bytes();
    let mut slots = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'J' | b'D' => slots += 2,
            b'L' => {
                slots += 1;
                while bytes[i] != b';' {
                    i += 1;
                }
            }
            b'[' => {
                slots += 1;
                while bytes[i] == b'[' {
                    i += 1;
                }
                if bytes[i] == b'L' {
                    while bytes[i] != b';' {
                        i += 1;
                    }
                }
            }
            _ => slots += 1,
        }
        i += 1;
    }
    slots
}

fn encode_annotations(annotations: &[Annotation], pool: &mut Pool) -> Vec<u8> {
    let mut out = Vec::new();
    put_u2(&mut out, annotations.len() as u16);
    for annotation in annotations {
        encode_annotation(annotation, pool, &mut out);
    }
    out
}

fn encode_annotation(annotation: &Annotation, pool: &mut Pool, out: &mut Vec<u8>) {
    put_u2(out, pool.utf8(&annotation.descriptor));
    put_u2(out, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        put_u2(out, pool.utf8(name));
        encode_value(value, pool, out);
    }
}

fn encode_value(value: &Value, pool: &mut Pool, out: &mut Vec<u8>) {
    match value {
        Value::Class(descriptor) => {
            out.push(b'c');
            put_u2(out, pool.utf8(descriptor));
        }
        Value::Str(text) => {
            out.push(b's');
            put_u2(out, pool.utf8(text));
        }
        Value::Int(v) => {
            out.push(b'I');
            put_u2(out, pool.integer(*v));
        }
        Value::Enum(descriptor, constant) => {
            out.push(b'e');
            put_u2(out, pool.utf8(descriptor));
            put_u2(out, pool.utf8(constant));
        }
        Value::Array(values) => {
            out.push(b'[');
            put_u2(out, values.len() as u16);
            for v in values {
                encode_value(v, pool, out);
            }
        }
    }
}

/// Growing constant pool with de-duplication.
struct Pool {
    bytes: Vec<u8>,
    next: u16,
    index: HashMap<Vec<u8>, u16>,
}

impl Default for Pool {
    fn default() -> Self {
        Self { bytes: Vec::new(), next: 1, index: HashMap::new() }
    }
}

impl Pool {
    fn add(&mut self, entry: Vec<u8>) -> u16 {
        if let Some(&existing) = self.index.get(&entry) {
            return existing;
        }
        let index = self.next;
        self.bytes.extend_from_slice(&entry);
        self.index.insert(entry, index);
        self.next += 1;
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        let mut entry = vec![1];
        put_u2(&mut entry, text.len() as u16);
        entry.extend_from_slice(text.as_bytes());
        self.add(entry)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend_from_slice(&value.to_be_bytes());
        self.add(entry)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        put_u2(&mut entry, name_index);
        self.add(entry)
    }

    fn string(&mut self, text: &str) -> u16 {
        let utf8 = self.utf8(text);
        let mut entry = vec![8];
        put_u2(&mut entry, utf8);
        self.add(entry)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut entry = vec![12];
        put_u2(&mut entry, name_index);
        put_u2(&mut entry, descriptor_index);
        self.add(entry)
    }

    /// Fieldref (9), Methodref (10) or InterfaceMethodref (11).
    fn member(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        let mut entry = vec![tag];
        put_u2(&mut entry, class_index);
        put_u2(&mut entry, nat);
        self.add(entry)
    }

    fn method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        let mut entry = vec![15, kind];
        put_u2(&mut entry, reference);
        self.add(entry)
    }

    fn method_type(&mut self, descriptor: &str) -> u16 {
        let utf8 = self.utf8(descriptor);
        let mut entry = vec![16];
        put_u2(&mut entry, utf8);
        self.add(entry)
    }

    fn invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let nat = self.name_and_type(name, descriptor);
        let mut entry = vec![18];
        put_u2(&mut entry, bootstrap);
        put_u2(&mut entry, nat);
        self.add(entry)
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub mod shop {
    //! A small domain used across tests.
    //!
    //! - `com.shop.domain.Order` (aggregate root): fields `id`, `status`,
    //!   `total`, `customer`, static `SEQUENCE`.
    //! - `com.shop.domain.Customer` (entity): field `name`.
    //! - `com.shop.repository.OrderRepository`: generic `DomainRepository<Order>`.
    //! - `com.shop.app.OrderService`: repository callers.

    use super::*;

    pub const ORDER: &str = "com/shop/domain/Order";
    pub const CUSTOMER: &str = "com/shop/domain/Customer";
    pub const ORDER_REPOSITORY: &str = "com/shop/repository/OrderRepository";
    pub const ORDER_SERVICE: &str = "com/shop/app/OrderService";
    pub const DOMAIN_REPOSITORY: &str = "com/shop/ddd/DomainRepository";
    pub const FIND_BY_ID: &str = "(J)Lcom/shop/domain/Order;";

    pub fn order() -> ClassBuilder {
        ClassBuilder::class(ORDER)
            .marker("com/shop/ddd/AggregateRoot")
            .source_file("Order.java")
            .field("id", "J")
            .field("status", "Ljava/lang/String;")
            .field("total", "J")
            .field("customer", "Lcom/shop/domain/Customer;")
            .static_field("SEQUENCE", "J")
            .method("getId", "()J", |m| m.getfield(ORDER, "id", "J").lines(10, 10))
            .method("getStatus", "()Ljava/lang/String;", |m| {
                m.getfield(ORDER, "status", "Ljava/lang/String;").lines(12, 12)
            })
            .method("getTotal", "()J", |m| m.getfield(ORDER, "total", "J").lines(14, 14))
            .method("isOpen", "()Z", |m| {
                m.invokevirtual(ORDER, "getStatus", "()Ljava/lang/String;").lines(16, 18)
            })
            .method("nextId", "()J", |m| m.getstatic(ORDER, "SEQUENCE", "J").getfield(ORDER, "id", "J"))
            .method("customerName", "()Ljava/lang/String;", |m| {
                m.getfield(ORDER, "customer", "Lcom/shop/domain/Customer;").invokevirtual(
                    CUSTOMER,
                    "getName",
                    "()Ljava/lang/String;",
                )
            })
    }

    pub fn customer() -> ClassBuilder {
        ClassBuilder::class(CUSTOMER)
            .marker("com/shop/ddd/DomainEntity")
            .field("name", "Ljava/lang/String;")
            .method("getName", "()Ljava/lang/String;", |m| {
                m.getfield(CUSTOMER, "name", "Ljava/lang/String;")
            })
    }

    pub fn domain_repository() -> ClassBuilder {
        ClassBuilder::interface(DOMAIN_REPOSITORY)
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
    }

    pub fn order_repository() -> ClassBuilder {
        ClassBuilder::interface(ORDER_REPOSITORY)
            .implements(DOMAIN_REPOSITORY)
            .signature("Ljava/lang/Object;Lcom/shop/ddd/DomainRepository<Lcom/shop/domain/Order;>;")
            .abstract_method("findById", FIND_BY_ID)
            .abstract_method("save", "(Lcom/shop/domain/Order;)V")
    }

    /// `summary` reads the total through a getter; `audit` touches the order
    /// only inside a lambda passed to `forEach`.
    pub fn order_service() -> ClassBuilder {
        ClassBuilder::class(ORDER_SERVICE)
            .field("orders", "Lcom/shop/repository/OrderRepository;")
            .method("summary", "(J)J", |m| {
                m.getfield(ORDER_SERVICE, "orders", "Lcom/shop/repository/OrderRepository;")
                    .invokeinterface(ORDER_REPOSITORY, "findById", FIND_BY_ID)
                    .invokevirtual(ORDER, "getTotal", "()J")
                    .lines(20, 24)
            })
            .method("audit", "(Ljava/util/List;)V", |m| {
                m.invokeinterface(ORDER_REPOSITORY, "findById", FIND_BY_ID)
                    .consumer_lambda(ORDER_SERVICE, "lambda$audit$0", "(Lcom/shop/domain/Order;)V")
                    .invokeinterface("java/util/List", "forEach", "(Ljava/util/function/Consumer;)V")
                    .lines(30, 33)
            })
            .lambda_body("lambda$audit$0", "(Lcom/shop/domain/Order;)V", |m| {
                m.invokevirtual(ORDER, "isOpen", "()Z").lines(31, 31)
            })
    }

    /// The whole shop domain, ready to decode.
    pub fn all() -> Vec<ClassBuilder> {
        vec![order(), customer(), domain_repository(), order_repository(), order_service()]
    }
}
