use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::warn;

use crate::{
    error::CompileError,
    types::{FieldType, MessageType, SchemaIr},
    utils::quote,
};

/// Enum members are written as a `U8` index.
pub const MAX_ENUM_MEMBERS: usize = 256;

/// Something in a schema that generated code will not handle well. None of
/// these stop generation on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DuplicateType { name: String },
    DuplicateFieldId { message: String, field: String, id: i64 },
    UndefinedType { message: String, field: String, type_name: String },
    EmptyEnum { name: String },
    TooManyEnumMembers { name: String, count: usize },
    RecursiveNesting { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateType { name } => {
                write!(f, "The type {} is defined twice", quote(name))
            }
            Diagnostic::DuplicateFieldId { message, field, id } => write!(
                f,
                "The id {} for field {} in {} is used twice",
                id,
                quote(field),
                quote(message)
            ),
            Diagnostic::UndefinedType { message, field, type_name } => write!(
                f,
                "The type {} is not defined for field {} in {}",
                quote(type_name),
                quote(field),
                quote(message)
            ),
            Diagnostic::EmptyEnum { name } => {
                write!(f, "The enum {} has no members", quote(name))
            }
            Diagnostic::TooManyEnumMembers { name, count } => write!(
                f,
                "The enum {} has {} members, more than the {} a u8 index can address",
                quote(name),
                count,
                MAX_ENUM_MEMBERS
            ),
            Diagnostic::RecursiveNesting { name } => {
                write!(f, "Recursive nesting of {} is not allowed", quote(name))
            }
        }
    }
}

/// Returns every diagnostic for `ir`, in the order the checks run.
pub fn verify(ir: &SchemaIr) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // 1) Check duplicate type names across messages and enums
    let mut defined: HashSet<&str> = HashSet::new();
    let names = ir
        .enums
        .iter()
        .map(|enumeration| enumeration.name.as_str())
        .chain(ir.messages.iter().map(|message| message.name.as_str()));
    for name in names {
        if !defined.insert(name) {
            diagnostics.push(Diagnostic::DuplicateType { name: name.to_string() });
        }
    }

    // 2) Check enum sizes
    for enumeration in &ir.enums {
        let count = enumeration.values.len();
        if count == 0 {
            diagnostics.push(Diagnostic::EmptyEnum { name: enumeration.name.clone() });
        } else if count > MAX_ENUM_MEMBERS {
            diagnostics.push(Diagnostic::TooManyEnumMembers {
                name: enumeration.name.clone(),
                count,
            });
        }
    }

    // 3) Check fields inside each message
    for message in &ir.messages {
        let mut ids = HashSet::new();
        for field in &message.fields {
            if !ids.insert(field.id) {
                diagnostics.push(Diagnostic::DuplicateFieldId {
                    message: message.name.clone(),
                    field:   field.name.clone(),
                    id:      field.id,
                });
            }
            if let FieldType::Reference(type_name) = &field.type_ {
                if !defined.contains(type_name.as_str()) {
                    diagnostics.push(Diagnostic::UndefinedType {
                        message:   message.name.clone(),
                        field:     field.name.clone(),
                        type_name: type_name.clone(),
                    });
                }
            }
        }
    }

    // 4) Check that messages do not contain themselves by value
    let messages: HashMap<&str, &MessageType> = ir
        .messages
        .iter()
        .map(|message| (message.name.as_str(), message))
        .collect();
    let mut state: HashMap<&str, u8> = HashMap::new();
    fn check_recursion<'a>(
        name: &'a str,
        messages: &HashMap<&'a str, &'a MessageType>,
        state: &mut HashMap<&'a str, u8>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(&message) = messages.get(name) else {
            return;
        };
        match state.get(name) {
            Some(1) => {
                diagnostics.push(Diagnostic::RecursiveNesting { name: name.to_string() });
                return;
            }
            Some(2) => return,
            _ => {}
        }
        state.insert(name, 1);
        for field in &message.fields {
            if field.is_array || field.is_map() {
                continue;
            }
            if let FieldType::Reference(type_name) = &field.type_ {
                check_recursion(type_name, messages, state, diagnostics);
            }
        }
        state.insert(name, 2);
    }

    for message in &ir.messages {
        check_recursion(&message.name, &messages, &mut state, &mut diagnostics);
    }

    diagnostics
}

impl From<Diagnostic> for CompileError {
    fn from(diagnostic: Diagnostic) -> Self {
        CompileError::Verifier(diagnostic.to_string())
    }
}

/// Returns `Ok(())` if `ir` has no diagnostics, or
/// `Err(CompileError::Verifier(_))` naming the first one otherwise.
pub fn verify_schema(ir: &SchemaIr) -> Result<(), CompileError> {
    match verify(ir).into_iter().next() {
        Some(diagnostic) => Err(diagnostic.into()),
        None => Ok(()),
    }
}

/// Logs every diagnostic for `ir` as a warning. With `deny_warnings` the
/// first one also fails the check.
pub fn check_schema(ir: &SchemaIr, deny_warnings: bool) -> Result<(), CompileError> {
    let diagnostics = verify(ir);
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }
    match diagnostics.into_iter().next() {
        Some(diagnostic) if deny_warnings => Err(diagnostic.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
fn message(name: &str, fields: &[(&str, i64, &str)]) -> MessageType {
    use crate::types::{Field, Scalar};
    MessageType {
        name:   name.to_string(),
        fields: fields
            .iter()
            .map(|(field, id, type_name)| Field {
                name:     field.to_string(),
                id:       *id,
                type_:    Scalar::from_schema_name(type_name)
                    .map(FieldType::Scalar)
                    .unwrap_or_else(|| FieldType::Reference(type_name.to_string())),
                key_type: None,
                is_array: false,
            })
            .collect(),
    }
}

#[test]
fn clean_schema_has_no_diagnostics() {
    let ir = SchemaIr {
        namespace: vec![],
        messages:  vec![
            message("Person", &[("name", 1, "string"), ("home", 2, "Address")]),
            message("Address", &[("street", 1, "string")]),
        ],
        enums:     vec![],
    };
    assert!(verify(&ir).is_empty());
    assert!(verify_schema(&ir).is_ok());
}

#[test]
fn reports_duplicates_and_undefined_types() {
    let ir = SchemaIr {
        namespace: vec![],
        messages:  vec![
            message("Person", &[("name", 1, "string"), ("nick", 1, "string"), ("pet", 2, "Dog")]),
            message("Person", &[]),
        ],
        enums:     vec![],
    };
    let diagnostics = verify(&ir);
    assert_eq!(
        diagnostics,
        [
            Diagnostic::DuplicateType { name: "Person".into() },
            Diagnostic::DuplicateFieldId {
                message: "Person".into(),
                field:   "nick".into(),
                id:      1,
            },
            Diagnostic::UndefinedType {
                message:   "Person".into(),
                field:     "pet".into(),
                type_name: "Dog".into(),
            },
        ]
    );
    match verify_schema(&ir) {
        Err(CompileError::Verifier(text)) => assert_eq!(text, "The type \"Person\" is defined twice"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn reports_recursive_nesting_but_not_arrays() {
    let mut ir = SchemaIr {
        namespace: vec![],
        messages:  vec![
            message("Node", &[("next", 1, "Link")]),
            message("Link", &[("node", 1, "Node")]),
        ],
        enums:     vec![],
    };
    assert_eq!(verify(&ir), [Diagnostic::RecursiveNesting { name: "Node".into() }]);

    ir.messages[1].fields[0].is_array = true;
    assert!(verify(&ir).is_empty());
}

#[test]
fn reports_enum_sizes() {
    use crate::types::EnumType;
    let ir = SchemaIr {
        namespace: vec![],
        messages:  vec![],
        enums:     vec![
            EnumType { name: "Empty".into(), values: vec![] },
            EnumType {
                name:   "Huge".into(),
                values: (0..300).map(|i| format!("V{}", i)).collect(),
            },
        ],
    };
    assert_eq!(
        verify(&ir),
        [
            Diagnostic::EmptyEnum { name: "Empty".into() },
            Diagnostic::TooManyEnumMembers { name: "Huge".into(), count: 300 },
        ]
    );
}

#[test]
fn deny_warnings_turns_the_first_diagnostic_into_an_error() {
    let ir = SchemaIr {
        namespace: vec![],
        messages:  vec![message("Person", &[("home", 1, "Address"), ("age", 1, "uint32")])],
        enums:     vec![],
    };
    assert!(check_schema(&ir, false).is_ok());
    match check_schema(&ir, true) {
        Err(CompileError::Verifier(message)) => {
            assert_eq!(message, "The type \"Address\" is not defined for field \"home\" in \"Person\"");
        }
        other => panic!("expected a verifier error, got {:?}", other),
    }

    let clean = SchemaIr {
        namespace: vec![],
        messages:  vec![message("Address", &[("street", 1, "string")])],
        enums:     vec![],
    };
    assert!(check_schema(&clean, true).is_ok());
}
