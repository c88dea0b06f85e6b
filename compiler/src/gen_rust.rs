use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{EnumType, Field, FieldType, MessageType, Scalar, SchemaIr};
use crate::utils::{type_ident, value_ident};
use crate::verifier::MAX_ENUM_MEMBERS;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// Path generated code names the runtime crate by.
    pub runtime_path: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            runtime_path: "::polyglot".to_string(),
        }
    }
}

/// A field's element type once references are sorted into enums and
/// messages.
#[derive(Debug, Clone, Copy)]
enum Element<'a> {
    Scalar(Scalar),
    Enum(&'a str),
    Message(&'a str),
}

struct Generator<'a> {
    rt:    &'a str,
    enums: HashSet<&'a str>,
}

impl<'a> Generator<'a> {
    fn new(ir: &'a SchemaIr, options: &'a GeneratorOptions) -> Self {
        Generator {
            rt:    options.runtime_path.trim_end_matches("::"),
            enums: ir.enums.iter().map(|enumeration| enumeration.name.as_str()).collect(),
        }
    }

    /// References that name no enum are generated as messages.
    fn element(&self, type_: &'a FieldType) -> Element<'a> {
        match type_ {
            FieldType::Scalar(scalar) => Element::Scalar(*scalar),
            FieldType::Reference(name) if self.enums.contains(name.as_str()) => Element::Enum(name),
            FieldType::Reference(name) => Element::Message(name),
        }
    }

    fn element_type(&self, element: Element<'_>) -> String {
        match element {
            Element::Scalar(scalar) => scalar.rust_type().to_string(),
            Element::Enum(name) | Element::Message(name) => type_ident(name),
        }
    }

    /// The kind written in array and map headers. Enums and messages are
    /// `Any` because their elements are not a single primitive.
    fn element_kind(&self, element: Element<'_>) -> String {
        let kind = match element {
            Element::Scalar(scalar) => scalar.kind().name(),
            _ => "Any",
        };
        format!("{}::Kind::{}", self.rt, kind)
    }

    fn field_type(&self, field: &'a Field) -> String {
        let value = self.element_type(self.element(&field.type_));
        match field.key_type {
            Some(key) => format!("::std::collections::BTreeMap<{}, {}>", key.rust_type(), value),
            None if field.is_array => format!("::std::vec::Vec<{}>", value),
            None => value,
        }
    }

    /// An expression that appends `value` to `encoded` and evaluates to the
    /// new buffer. `by_ref` says whether `value` is already a reference.
    fn encode_element(&self, element: Element<'_>, value: &str, by_ref: bool) -> String {
        match element {
            Element::Scalar(scalar) => {
                let arg = match (scalar.is_copy(), by_ref) {
                    (true, true) => format!("*{}", value),
                    (false, false) => format!("&{}", value),
                    _ => value.to_string(),
                };
                format!(
                    "{}::encode_{}(encoded, {})",
                    self.rt,
                    scalar.kind().name().to_lowercase(),
                    arg
                )
            }
            Element::Enum(_) => format!("{}::encode_u8(encoded, {}.index())", self.rt, value),
            Element::Message(_) => {
                let arg = if by_ref { value.to_string() } else { format!("&{}", value) };
                format!("{}::Message::encode({}, encoded)", self.rt, arg)
            }
        }
    }

    /// An expression that reads one element from `decoded`, evaluating to a
    /// `Decoded` of its wire form.
    fn decode_element(&self, element: Element<'_>) -> String {
        match element {
            Element::Scalar(scalar) => format!(
                "{}::decode_{}(decoded)?",
                self.rt,
                scalar.kind().name().to_lowercase()
            ),
            Element::Enum(_) => format!("{}::decode_u8(decoded)?", self.rt),
            Element::Message(name) => format!(
                "<{} as {}::Message>::decode(decoded)?",
                type_ident(name),
                self.rt
            ),
        }
    }

    /// Turns the wire form read by `decode_element` into the field's type.
    fn convert_element(&self, element: Element<'_>, value: &str) -> String {
        match element {
            Element::Enum(name) => format!(
                "{}::from_index({}).ok_or({}::DecodeError::InvalidEnum({}))?",
                type_ident(name),
                value,
                self.rt,
                value
            ),
            _ => value.to_string(),
        }
    }

    fn generate_enum(&self, enumeration: &EnumType) -> Vec<String> {
        let enum_name = type_ident(&enumeration.name);
        let mut members = enumeration.values.as_slice();
        if members.len() > MAX_ENUM_MEMBERS {
            warn!(
                enumeration = %enumeration.name,
                members = members.len(),
                "enum has more members than a u8 index can address, truncating"
            );
            members = &members[..MAX_ENUM_MEMBERS];
        }
        let variants: Vec<String> = members.iter().map(|member| type_ident(member)).collect();

        let mut lines = Vec::new();
        if variants.is_empty() {
            lines.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]".to_string());
            lines.push(format!("pub enum {} {{}}", enum_name));
        } else {
            lines.push(
                "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]".to_string(),
            );
            lines.push("#[repr(u8)]".to_string());
            lines.push(format!("pub enum {} {{", enum_name));
            for (index, variant) in variants.iter().enumerate() {
                if index == 0 {
                    lines.push(format!("{}#[default]", INDENT));
                }
                lines.push(format!("{}{} = {},", INDENT, variant, index));
            }
            lines.push("}".to_string());
        }
        lines.push(String::new());

        lines.push(format!("impl {} {{", enum_name));
        lines.push(format!("{}/// The member written as `index` on the wire.", INDENT));
        lines.push(format!(
            "{}pub fn from_index(index: u8) -> ::core::option::Option<Self> {{",
            INDENT
        ));
        if variants.is_empty() {
            lines.push(format!("{0}{0}let _ = index;", INDENT));
            lines.push(format!("{0}{0}::core::option::Option::None", INDENT));
        } else {
            lines.push(format!("{0}{0}match index {{", INDENT));
            for (index, variant) in variants.iter().enumerate() {
                lines.push(format!(
                    "{0}{0}{0}{1} => ::core::option::Option::Some(Self::{2}),",
                    INDENT, index, variant
                ));
            }
            lines.push(format!("{0}{0}{0}_ => ::core::option::Option::None,", INDENT));
            lines.push(format!("{0}{0}}}", INDENT));
        }
        lines.push(format!("{}}}", INDENT));
        lines.push(String::new());
        lines.push(format!("{}/// The index this member is written as on the wire.", INDENT));
        lines.push(format!("{}pub fn index(self) -> u8 {{", INDENT));
        if variants.is_empty() {
            lines.push(format!("{0}{0}match self {{}}", INDENT));
        } else {
            lines.push(format!("{0}{0}self as u8", INDENT));
        }
        lines.push(format!("{}}}", INDENT));
        lines.push("}".to_string());
        lines
    }

    fn generate_struct(&self, message: &'a MessageType) -> Vec<String> {
        let struct_name = type_ident(&message.name);
        let idents: Vec<String> = message.fields.iter().map(|field| value_ident(&field.name)).collect();
        let types: Vec<String> = message.fields.iter().map(|field| self.field_type(field)).collect();

        let mut lines = Vec::new();
        lines.push("#[derive(Debug, Clone, PartialEq, Default)]".to_string());
        if message.fields.is_empty() {
            lines.push(format!("pub struct {} {{}}", struct_name));
        } else {
            lines.push(format!("pub struct {} {{", struct_name));
            for (ident, type_) in idents.iter().zip(&types) {
                lines.push(format!("{}{}: {},", INDENT, ident, type_));
            }
            lines.push("}".to_string());
        }
        lines.push(String::new());

        // Constructor and accessors
        let params: Vec<String> = idents
            .iter()
            .zip(&types)
            .map(|(ident, type_)| format!("{}: {}", ident, type_))
            .collect();
        lines.push(format!("impl {} {{", struct_name));
        if params.len() > 7 {
            lines.push(format!("{}#[allow(clippy::too_many_arguments)]", INDENT));
        }
        lines.push(format!("{}pub fn new({}) -> Self {{", INDENT, params.join(", ")));
        if idents.is_empty() {
            lines.push(format!("{0}{0}Self {{}}", INDENT));
        } else {
            lines.push(format!("{0}{0}Self {{ {1} }}", INDENT, idents.join(", ")));
        }
        lines.push(format!("{}}}", INDENT));

        for ((field, ident), type_) in message.fields.iter().zip(&idents).zip(&types) {
            let element = self.element(&field.type_);
            let (returns, body) = match element {
                _ if field.is_map() => (format!("&{}", type_), format!("&self.{}", ident)),
                _ if field.is_array => (
                    format!("&[{}]", self.element_type(element)),
                    format!("&self.{}", ident),
                ),
                Element::Scalar(Scalar::String) => ("&str".to_string(), format!("&self.{}", ident)),
                Element::Scalar(Scalar::Bytes) => ("&[u8]".to_string(), format!("&self.{}", ident)),
                Element::Scalar(_) | Element::Enum(_) => (type_.clone(), format!("self.{}", ident)),
                Element::Message(_) => (format!("&{}", type_), format!("&self.{}", ident)),
            };
            lines.push(String::new());
            lines.push(format!("{}pub fn {}(&self) -> {} {{", INDENT, ident, returns));
            lines.push(format!("{0}{0}{1}", INDENT, body));
            lines.push(format!("{}}}", INDENT));
            lines.push(String::new());
            lines.push(format!(
                "{}pub fn set_{}(&mut self, {}: {}) {{",
                INDENT,
                ident.trim_end_matches('_'),
                ident,
                type_
            ));
            lines.push(format!("{0}{0}self.{1} = {1};", INDENT, ident));
            lines.push(format!("{}}}", INDENT));
        }
        lines.push("}".to_string());
        lines.push(String::new());

        // Message implementation
        lines.push(format!("impl {}::Message for {} {{", self.rt, struct_name));
        lines.extend(self.generate_encode(message, &idents));
        lines.push(String::new());
        lines.extend(self.generate_decode(message, &idents));
        lines.push("}".to_string());
        lines
    }

    fn generate_encode(&self, message: &'a MessageType, idents: &[String]) -> Vec<String> {
        let body = |depth: usize, text: String| format!("{}{}", INDENT.repeat(depth), text);
        let mut lines = Vec::new();
        lines.push(body(
            1,
            "fn encode(&self, buf: ::std::vec::Vec<u8>) -> ::std::vec::Vec<u8> {".to_string(),
        ));
        if message.fields.is_empty() {
            lines.push(body(2, "buf".to_string()));
            lines.push(body(1, "}".to_string()));
            return lines;
        }

        lines.push(body(2, "let mut encoded = buf;".to_string()));
        for (field, ident) in message.fields.iter().zip(idents) {
            let element = self.element(&field.type_);
            let value = format!("self.{}", ident);
            if let Some(key) = field.key_type {
                lines.push(body(
                    2,
                    format!(
                        "encoded = {0}::encode_map(encoded, {0}::wire_len({1}.len()), {2}, {3});",
                        self.rt,
                        value,
                        self.element_kind(Element::Scalar(key)),
                        self.element_kind(element)
                    ),
                ));
                lines.push(body(2, format!("for (key, value) in &{} {{", value)));
                lines.push(body(3, format!("encoded = {};", self.encode_element(Element::Scalar(key), "key", true))));
                lines.push(body(3, format!("encoded = {};", self.encode_element(element, "value", true))));
                lines.push(body(2, "}".to_string()));
            } else if field.is_array {
                lines.push(body(
                    2,
                    format!(
                        "encoded = {0}::encode_array(encoded, {0}::wire_len({1}.len()), {2});",
                        self.rt,
                        value,
                        self.element_kind(element)
                    ),
                ));
                lines.push(body(2, format!("for element in &{} {{", value)));
                lines.push(body(3, format!("encoded = {};", self.encode_element(element, "element", true))));
                lines.push(body(2, "}".to_string()));
            } else {
                lines.push(body(2, format!("encoded = {};", self.encode_element(element, &value, false))));
            }
        }
        lines.push(body(2, "encoded".to_string()));
        lines.push(body(1, "}".to_string()));
        lines
    }

    fn generate_decode(&self, message: &'a MessageType, idents: &[String]) -> Vec<String> {
        let body = |depth: usize, text: String| format!("{}{}", INDENT.repeat(depth), text);
        let mut lines = Vec::new();
        lines.push(body(
            1,
            format!(
                "fn decode(buf: &[u8]) -> ::core::result::Result<{0}::Decoded<'_, Self>, {0}::DecodeError> {{",
                self.rt
            ),
        ));
        if message.fields.is_empty() {
            lines.push(body(
                2,
                format!("::core::result::Result::Ok({}::Decoded::new(Self {{}}, buf))", self.rt),
            ));
            lines.push(body(1, "}".to_string()));
            return lines;
        }

        lines.push(body(2, "let mut decoded = buf;".to_string()));
        for (field, ident) in message.fields.iter().zip(idents) {
            let element = self.element(&field.type_);
            let local = format!("field_{}", ident);
            if let Some(key) = field.key_type {
                let key = Element::Scalar(key);
                lines.push(body(2, format!("let header = {}::decode_map(decoded)?;", self.rt)));
                lines.push(body(2, "decoded = header.remainder;".to_string()));
                lines.push(body(2, format!("let mut {} = ::std::collections::BTreeMap::new();", local)));
                lines.push(body(2, "for _ in 0..header.value {".to_string()));
                lines.push(body(3, format!("let key = {};", self.decode_element(key))));
                lines.push(body(3, "decoded = key.remainder;".to_string()));
                lines.push(body(3, format!("let value = {};", self.decode_element(element))));
                lines.push(body(3, "decoded = value.remainder;".to_string()));
                lines.push(body(
                    3,
                    format!(
                        "{}.insert({}, {});",
                        local,
                        self.convert_element(key, "key.value"),
                        self.convert_element(element, "value.value")
                    ),
                ));
                lines.push(body(2, "}".to_string()));
            } else if field.is_array {
                lines.push(body(2, format!("let header = {}::decode_array(decoded)?;", self.rt)));
                lines.push(body(2, "decoded = header.remainder;".to_string()));
                lines.push(body(2, format!("let mut {} = ::std::vec::Vec::new();", local)));
                lines.push(body(2, "for _ in 0..header.value {".to_string()));
                lines.push(body(3, format!("let element = {};", self.decode_element(element))));
                lines.push(body(3, "decoded = element.remainder;".to_string()));
                lines.push(body(
                    3,
                    format!("{}.push({});", local, self.convert_element(element, "element.value")),
                ));
                lines.push(body(2, "}".to_string()));
            } else {
                lines.push(body(2, format!("let next = {};", self.decode_element(element))));
                lines.push(body(2, "decoded = next.remainder;".to_string()));
                lines.push(body(
                    2,
                    format!("let {} = {};", local, self.convert_element(element, "next.value")),
                ));
            }
        }

        let assignments: Vec<String> = idents
            .iter()
            .map(|ident| format!("{0}: field_{0}", ident))
            .collect();
        lines.push(body(
            2,
            format!(
                "::core::result::Result::Ok({}::Decoded::new(Self {{ {} }}, decoded))",
                self.rt,
                assignments.join(", ")
            ),
        ));
        lines.push(body(1, "}".to_string()));
        lines
    }
}

/// Generates Rust source for `ir`: one module per namespace segment, an
/// enum per schema enum and a struct implementing `Message` per schema
/// message.
pub fn generate_rust(ir: &SchemaIr, options: &GeneratorOptions) -> String {
    let generator = Generator::new(ir, options);
    let mut body: Vec<String> = Vec::new();

    for enumeration in &ir.enums {
        body.extend(generator.generate_enum(enumeration));
        body.push(String::new());
    }
    for message in &ir.messages {
        body.extend(generator.generate_struct(message));
        body.push(String::new());
    }
    body.pop();

    let mut rust_code: Vec<String> = Vec::new();
    rust_code.push(format!(
        "// Code generated by polyglot-compiler {}. DO NOT EDIT.",
        env!("CARGO_PKG_VERSION")
    ));
    rust_code.push(String::new());

    // Start modules
    let depth = ir.namespace.len();
    for (level, segment) in ir.namespace.iter().enumerate() {
        rust_code.push(format!("{}pub mod {} {{", INDENT.repeat(level), value_ident(segment)));
    }
    for line in body {
        if line.is_empty() {
            rust_code.push(line);
        } else {
            rust_code.push(format!("{}{}", INDENT.repeat(depth), line));
        }
    }
    for level in (0..depth).rev() {
        rust_code.push(format!("{}}}", INDENT.repeat(level)));
    }

    debug!(
        messages = ir.messages.len(),
        enums = ir.enums.len(),
        runtime = %generator.rt,
        "generated Rust source"
    );
    rust_code.join("\n") + "\n"
}

#[cfg(test)]
fn person_ir(namespace: &[&str]) -> SchemaIr {
    SchemaIr {
        namespace: namespace.iter().map(|segment| segment.to_string()).collect(),
        messages:  vec![MessageType {
            name:   "Person".into(),
            fields: vec![
                Field {
                    name:     "name".into(),
                    id:       1,
                    type_:    FieldType::Scalar(Scalar::String),
                    key_type: None,
                    is_array: false,
                },
                Field {
                    name:     "age".into(),
                    id:       2,
                    type_:    FieldType::Scalar(Scalar::Uint32),
                    key_type: None,
                    is_array: false,
                },
            ],
        }],
        enums:     vec![EnumType {
            name:   "Priority".into(),
            values: vec!["LOW".into(), "HIGH".into()],
        }],
    }
}

#[test]
fn wraps_namespace_in_modules() {
    let code = generate_rust(&person_ir(&["io", "data"]), &GeneratorOptions::default());
    assert!(code.starts_with("// Code generated by polyglot-compiler"));
    assert!(code.contains("pub mod io {\n    pub mod data {\n"));
    assert!(code.contains("        pub struct Person {\n            name: ::std::string::String,\n            age: u32,\n        }"));
    assert!(code.ends_with("    }\n}\n"));
}

#[test]
fn encodes_fields_in_id_order() {
    let code = generate_rust(&person_ir(&[]), &GeneratorOptions::default());
    let name = code.find("encoded = ::polyglot::encode_string(encoded, &self.name);").unwrap();
    let age = code.find("encoded = ::polyglot::encode_u32(encoded, self.age);").unwrap();
    assert!(name < age);
    assert!(code.contains("let next = ::polyglot::decode_u32(decoded)?;"));
    assert!(code.contains(
        "::core::result::Result::Ok(::polyglot::Decoded::new(Self { name: field_name, age: field_age }, decoded))"
    ));
}

#[test]
fn enums_use_positional_indices() {
    let code = generate_rust(&person_ir(&[]), &GeneratorOptions::default());
    assert!(code.contains("#[repr(u8)]\npub enum Priority {\n    #[default]\n    Low = 0,\n    High = 1,\n}"));
    assert!(code.contains("            1 => ::core::option::Option::Some(Self::High),"));
    assert!(code.contains("            _ => ::core::option::Option::None,"));
}

#[test]
fn honours_runtime_path() {
    let options = GeneratorOptions {
        runtime_path: "crate::rt::".to_string(),
    };
    let code = generate_rust(&person_ir(&[]), &options);
    assert!(code.contains("impl crate::rt::Message for Person {"));
    assert!(!code.contains("::polyglot"));
}

#[test]
fn empty_schema_generates_only_the_header() {
    let code = generate_rust(&SchemaIr::default(), &GeneratorOptions::default());
    assert_eq!(code.lines().count(), 2);
}

#[test]
fn constructor_takes_every_field() {
    let code = generate_rust(&person_ir(&[]), &GeneratorOptions::default());
    assert!(code.contains(
        "    pub fn new(name: ::std::string::String, age: u32) -> Self {\n        Self { name, age }\n    }"
    ));
}

#[test]
fn prelude_names_are_not_shadowed() {
    let ir = SchemaIr {
        namespace: Vec::new(),
        messages:  vec![MessageType {
            name:   "Unit".into(),
            fields: Vec::new(),
        }],
        enums:     vec![EnumType {
            name:   "Nothing".into(),
            values: Vec::new(),
        }],
    };
    let code = generate_rust(&ir, &GeneratorOptions::default());
    assert!(code.contains("::core::result::Result::Ok(::polyglot::Decoded::new(Self {}, buf))"));
    assert!(code.contains("        let _ = index;\n        ::core::option::Option::None\n"));
    for bare in [" Some(", " None", " Ok("] {
        assert!(!code.contains(bare), "{} in generated code", bare);
    }
}

#[test]
fn keyword_fields_are_escaped() {
    let field = |name: &str, id: i64, scalar: Scalar| Field {
        name: name.into(),
        id,
        type_: FieldType::Scalar(scalar),
        key_type: None,
        is_array: false,
    };
    let ir = SchemaIr {
        namespace: Vec::new(),
        messages:  vec![MessageType {
            name:   "Rule".into(),
            fields: vec![
                field("final", 1, Scalar::Bool),
                field("override", 2, Scalar::String),
                field("try", 3, Scalar::Uint32),
            ],
        }],
        enums:     Vec::new(),
    };
    let code = generate_rust(&ir, &GeneratorOptions::default());
    assert!(code.contains("pub struct Rule {\n    final_: bool,\n    override_: ::std::string::String,\n    try_: u32,\n}"));
    assert!(code.contains("Self { final_, override_, try_ }"));
    assert!(code.contains("pub fn set_final(&mut self, final_: bool) {"));
    assert!(code.contains("let field_try_ = next.value;"));
}
