//! Parser for generic class signatures (`Signature` attribute on classes).
//!
//! Only the parts the classifier needs are modelled: type parameters are kept
//! by name, and super types keep their type arguments.

use super::ClassFileError;
use crate::model::dotted;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<String>,
    pub superclass: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Dotted erased name; nested classes are joined with `$`.
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Wildcard,
    Extends(ReferenceType),
    Super(ReferenceType),
    Exact(ReferenceType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceType {
    Class(ClassTypeSignature),
    TypeVariable(String),
    /// Array types keep their raw signature text.
    Array(String),
}

impl TypeArgument {
    /// Erased class name when the argument is an exact class type.
    pub fn concrete_class(&self) -> Option<&str> {
        match self {
            TypeArgument::Exact(ReferenceType::Class(class)) => Some(&class.name),
            _ => None,
        }
    }
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, ClassFileError> {
    let mut parser = SignatureParser { text: signature.as_bytes(), pos: 0, source: signature };
    let type_parameters = if parser.peek() == Some(b'<') {
        parser.type_parameters()?
    } else {
        Vec::new()
    };
    let superclass = parser.class_type()?;
    let mut interfaces = Vec::new();
    while parser.peek().is_some() {
        interfaces.push(parser.class_type()?);
    }
    Ok(ClassSignature { type_parameters, superclass, interfaces })
}

struct SignatureParser<'a> {
    text: &'a [u8],
    pos: usize,
    source: &'a str,
}

impl<'a> SignatureParser<'a> {
    fn error(&self) -> ClassFileError {
        ClassFileError::MalformedSignature { signature: self.source.to_string(), offset: self.pos }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, ClassFileError> {
        let b = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, expected: u8) -> Result<(), ClassFileError> {
        if self.next()? == expected {
            Ok(())
        } else {
            self.pos -= 1;
            Err(self.error())
        }
    }

    /// Identifier up to (not including) one of the stop bytes.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, ClassFileError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.peek().is_none() {
            return Err(self.error());
        }
        let text: &'a [u8] = self.text;
        std::str::from_utf8(&text[start..self.pos]).map_err(|_| self.error())
    }

    fn type_parameters(&mut self) -> Result<Vec<String>, ClassFileError> {
        self.expect(b'<')?;
        let mut names = Vec::new();
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":")?.to_string();
            // Class bound (may be empty) followed by any interface bounds.
            self.expect(b':')?;
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.reference_type()?;
            }
            names.push(name);
            if self.peek().is_none() {
                return Err(self.error());
            }
        }
        self.expect(b'>')?;
        Ok(names)
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature, ClassFileError> {
        self.expect(b'L')?;
        let mut name = dotted(self.identifier(b"<.;")?);
        let mut type_arguments = self.optional_type_arguments()?;
        while self.peek() == Some(b'.') {
            self.pos += 1;
            let inner = self.identifier(b"<.;")?;
            name.push('$');
            name.push_str(inner);
            // Arguments of the innermost class are the ones that matter.
            type_arguments = self.optional_type_arguments()?;
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature { name, type_arguments })
    }

    fn optional_type_arguments(&mut self) -> Result<Vec<TypeArgument>, ClassFileError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'*') => {
                    self.pos += 1;
                    args.push(TypeArgument::Wildcard);
                }
                Some(b'+') => {
                    self.pos += 1;
                    args.push(TypeArgument::Extends(self.reference_type()?));
                }
                Some(b'-') => {
                    self.pos += 1;
                    args.push(TypeArgument::Super(self.reference_type()?));
                }
                Some(_) => args.push(TypeArgument::Exact(self.reference_type()?)),
                None => return Err(self.error()),
            }
        }
        Ok(args)
    }

    fn reference_type(&mut self) -> Result<ReferenceType, ClassFileError> {
        match self.peek() {
            Some(b'L') => Ok(ReferenceType::Class(self.class_type()?)),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(ReferenceType::TypeVariable(name))
            }
            Some(b'[') => {
                let start = self.pos;
                while self.peek() == Some(b'[') {
                    self.pos += 1;
                }
                match self.peek() {
                    Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => self.pos += 1,
                    _ => {
                        self.reference_type()?;
                    }
                }
                let raw = std::str::from_utf8(&self.text[start..self.pos]).map_err(|_| self.error())?;
                Ok(ReferenceType::Array(raw.to_string()))
            }
            _ => Err(self.error()),
        }
    }
}

/// Dotted class name of an object field descriptor (`Lcom/shop/Order;`).
pub fn object_type_name(descriptor: &str) -> Option<String> {
    descriptor.strip_prefix('L').and_then(|rest| rest.strip_suffix(';')).map(dotted)
}

/// Return type of a method descriptor, e.g. `Ljava/util/function/Consumer;`.
pub fn return_type(method_descriptor: &str) -> Option<&str> {
    method_descriptor.rfind(')').map(|idx| &method_descriptor[idx + 1..])
}
