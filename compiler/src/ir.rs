//! Builds the flat [`SchemaIr`] from a protobuf JSON tree.
//!
//! The tree is walked twice: once to learn every message and enum name, and
//! once to resolve field types against those names. Nested declarations are
//! flattened by concatenating the enclosing type names, so `User.Address`
//! becomes `UserAddress`.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ast::{Node, Tree};
use crate::types::{EnumType, Field, FieldType, MessageType, Scalar, SchemaIr};

/// The object whose children are the schema's top-level declarations, and
/// the package segments leading to it.
#[derive(Debug, Clone)]
pub struct RootAndNamespace<'a> {
    pub root:      Option<Node<'a>>,
    pub namespace: Vec<String>,
}

/// Follows the package path down from the top of the tree. `nested` keys are
/// transparent and `options` keys are never followed. The walk stops at the
/// first object that is empty or already declares fields, values or methods.
pub fn locate_root_and_namespace(tree: &Tree) -> RootAndNamespace<'_> {
    let mut current = Some(Node::new(tree));
    let mut previous = None;
    let mut path: Vec<String> = Vec::new();

    while let Some(node) = current {
        if node.is_empty() || node.has_fields() || node.has_values() || node.has_methods() {
            break;
        }
        let Some(key) = node.keys().find(|key| *key != "options") else {
            break;
        };
        if key != "nested" {
            path.push(key.to_string());
        }
        previous = Some(node);
        current = node.get(key).and_then(Node::from_value);
    }

    path.pop();
    RootAndNamespace {
        root:      previous,
        namespace: path,
    }
}

/// Qualified names of every message and enum under `root`.
pub fn known_names(root: Node<'_>) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut pending = vec![(String::new(), root)];
    while let Some((prefix, container)) = pending.pop() {
        for (key, child) in container.children() {
            let name = format!("{}{}", prefix, key);
            if child.is_message() || child.is_enum() {
                names.insert(name.clone());
            }
            if let Some(nested) = child.nested() {
                pending.push((name, nested));
            }
        }
    }
    names
}

/// A declaration waiting to be visited, with the qualified names of the
/// messages enclosing it (outermost first).
struct Pending<'a> {
    name:   String,
    node:   Node<'a>,
    scopes: Vec<String>,
}

/// Pushes the children of `container` so that they pop in document order.
fn push_children<'a>(
    pending: &mut Vec<Pending<'a>>,
    container: Node<'a>,
    prefix: &str,
    scopes: &[String],
) {
    let children: Vec<_> = container.children().collect();
    for (key, node) in children.into_iter().rev() {
        pending.push(Pending {
            name: format!("{}{}", prefix, key),
            node,
            scopes: scopes.to_vec(),
        });
    }
}

/// Every message under `root`, parents before their nested types and
/// siblings in document order.
pub fn collect_types(root: Node<'_>, known_names: &HashSet<String>, prefix: &str) -> Vec<MessageType> {
    let mut messages = Vec::new();
    let mut pending = Vec::new();
    push_children(&mut pending, root, prefix, &[]);

    while let Some(Pending { name, node, mut scopes }) = pending.pop() {
        if node.is_message() {
            messages.push(MessageType {
                fields: build_fields(&name, node, &scopes, known_names),
                name:   name.clone(),
            });
        }
        if let Some(nested) = node.nested() {
            scopes.push(name.clone());
            push_children(&mut pending, nested, &name, &scopes);
        }
    }
    messages
}

/// Every enum under `root`, in the same order `collect_types` visits
/// messages. Members are ordered by their declared numbers.
pub fn collect_enums(root: Node<'_>, prefix: &str) -> Vec<EnumType> {
    let mut enums = Vec::new();
    let mut pending = Vec::new();
    push_children(&mut pending, root, prefix, &[]);

    while let Some(Pending { name, node, .. }) = pending.pop() {
        if node.is_enum() {
            let mut members = node.enum_values();
            members.sort_by_key(|(_, number)| *number);
            enums.push(EnumType {
                values: members.into_iter().map(|(member, _)| member.to_string()).collect(),
                name:   name.clone(),
            });
        }
        if let Some(nested) = node.nested() {
            push_children(&mut pending, nested, &name, &[]);
        }
    }
    enums
}

fn build_fields(
    message: &str,
    node: Node<'_>,
    scopes: &[String],
    known_names: &HashSet<String>,
) -> Vec<Field> {
    let oneof_members = node.oneof_members();
    let mut fields = Vec::new();

    for (name, declared) in node.field_nodes() {
        if oneof_members.contains(name) {
            warn!(message = %message, field = %name, "oneof fields are not supported, dropping");
            continue;
        }

        let key_type = match declared.key_type.as_deref() {
            None => None,
            Some(key) => match Scalar::from_schema_name(key) {
                Some(scalar) if !scalar.is_float() => Some(scalar),
                _ => {
                    warn!(message = %message, field = %name, key_type = %key, "unsupported map key type, dropping");
                    continue;
                }
            },
        };

        fields.push(Field {
            name: name.to_string(),
            id: declared.id,
            type_: resolve_type(&declared.type_name, message, scopes, known_names),
            is_array: key_type.is_none() && declared.is_repeated(),
            key_type,
        });
    }

    fields.sort_by_key(|field| field.id);
    fields
}

/// Resolves a declared field type to a scalar or a qualified type name.
///
/// A name that is known once its dots are removed wins, then the scalars.
/// Anything else is looked up in the enclosing messages, innermost first,
/// and finally assumed to be nested in the declaring message.
pub fn resolve_type(
    declared: &str,
    message: &str,
    scopes: &[String],
    known_names: &HashSet<String>,
) -> FieldType {
    let stripped = declared.replace('.', "");
    if known_names.contains(&stripped) {
        return FieldType::Reference(stripped);
    }
    if let Some(scalar) = Scalar::from_schema_name(declared) {
        return FieldType::Scalar(scalar);
    }
    let scoped = std::iter::once(message)
        .chain(scopes.iter().rev().map(String::as_str))
        .map(|scope| format!("{}{}", scope, stripped))
        .find(|candidate| known_names.contains(candidate));
    FieldType::Reference(scoped.unwrap_or_else(|| format!("{}{}", message, stripped)))
}

/// Builds the IR for a whole schema tree. A tree with no declarations gives
/// an IR with no messages or enums.
pub fn build(tree: &Tree) -> SchemaIr {
    let RootAndNamespace { root, namespace } = locate_root_and_namespace(tree);
    let Some(root) = root else {
        debug!("schema tree has no declarations");
        return SchemaIr {
            namespace,
            ..SchemaIr::default()
        };
    };

    let known = known_names(root);
    let ir = SchemaIr {
        messages: collect_types(root, &known, ""),
        enums: collect_enums(root, ""),
        namespace,
    };
    debug!(
        namespace = ?ir.namespace,
        messages = ir.messages.len(),
        enums = ir.enums.len(),
        "built schema IR"
    );
    ir
}

/// Like [`build`], for any JSON value. Non-objects give an empty IR.
pub fn build_from_value(value: &Value) -> SchemaIr {
    match value.as_object() {
        Some(tree) => build(tree),
        None => {
            warn!("schema tree is not a JSON object");
            SchemaIr::default()
        }
    }
}

#[cfg(test)]
fn tree(value: Value) -> Tree {
    match value {
        Value::Object(tree) => tree,
        _ => panic!("fixture must be an object"),
    }
}

#[test]
fn locates_root_through_nested_and_options() {
    let schema = tree(serde_json::json!({
        "options": { "go_package": "x" },
        "nested": {
            "io": { "nested": { "data": {
                "options": { "java_package": "y" },
                "nested": { "Person": { "fields": { "name": { "type": "string", "id": 1 } } } }
            } } }
        }
    }));
    let found = locate_root_and_namespace(&schema);
    assert_eq!(found.namespace, ["io", "data"]);
    let root = found.root.unwrap();
    assert!(root.get("Person").is_some());
}

#[test]
fn locates_root_without_package() {
    let schema = tree(serde_json::json!({
        "nested": { "Person": { "fields": { "name": { "type": "string", "id": 1 } } } }
    }));
    let found = locate_root_and_namespace(&schema);
    assert!(found.namespace.is_empty());
    assert!(found.root.unwrap().get("Person").is_some());
}

#[test]
fn empty_tree_has_no_root() {
    let empty = Tree::new();
    let found = locate_root_and_namespace(&empty);
    assert!(found.root.is_none());
    assert!(found.namespace.is_empty());
    assert_eq!(build(&empty), SchemaIr::default());
}

#[test]
fn resolves_scalars_known_and_nested_names() {
    let known: HashSet<String> = ["Department", "User", "UserAddress", "UserGeo"]
        .into_iter()
        .map(String::from)
        .collect();
    let scopes = ["User".to_string()];
    assert_eq!(resolve_type("int64", "User", &[], &known), FieldType::Scalar(Scalar::Int64));
    assert_eq!(resolve_type("Department", "User", &[], &known), FieldType::Reference("Department".into()));
    assert_eq!(resolve_type("User.Address", "Team", &[], &known), FieldType::Reference("UserAddress".into()));
    assert_eq!(resolve_type("Address", "User", &[], &known), FieldType::Reference("UserAddress".into()));
    assert_eq!(resolve_type("Geo", "UserAddress", &scopes, &known), FieldType::Reference("UserGeo".into()));
    assert_eq!(resolve_type("Missing", "User", &[], &known), FieldType::Reference("UserMissing".into()));
}
