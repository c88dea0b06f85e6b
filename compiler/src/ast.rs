//! Read-only views over the JSON object tree a protobuf parser emits for a
//! schema (the `toJSON()` form: `nested`, `fields`, `values`, `oneofs`,
//! `methods`, `options`).

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

pub type Tree = Map<String, Value>;

/// One object in the tree: a namespace, message, enum or service.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(&'a Tree);

impl<'a> Node<'a> {
    pub fn new(tree: &'a Tree) -> Self {
        Node(tree)
    }

    /// `None` unless `value` is an object.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Node)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries whose values are objects, in document order.
    pub fn children(&self) -> impl Iterator<Item = (&'a str, Node<'a>)> {
        self.0
            .iter()
            .filter_map(|(key, value)| Node::from_value(value).map(|node| (key.as_str(), node)))
    }

    pub fn fields(&self) -> Option<&'a Tree> {
        self.get("fields").and_then(Value::as_object)
    }

    pub fn values(&self) -> Option<&'a Tree> {
        self.get("values").and_then(Value::as_object)
    }

    pub fn nested(&self) -> Option<Node<'a>> {
        self.get("nested").and_then(Node::from_value)
    }

    pub fn has_fields(&self) -> bool {
        self.0.contains_key("fields")
    }

    pub fn has_values(&self) -> bool {
        self.0.contains_key("values")
    }

    pub fn has_methods(&self) -> bool {
        self.0.contains_key("methods")
    }

    pub fn is_message(&self) -> bool {
        self.fields().is_some()
    }

    pub fn is_enum(&self) -> bool {
        self.values().is_some()
    }

    /// Names of every field that belongs to a oneof group of this message.
    pub fn oneof_members(&self) -> HashSet<String> {
        let mut members = HashSet::new();
        let Some(oneofs) = self.get("oneofs").and_then(Value::as_object) else {
            return members;
        };
        for (group, value) in oneofs {
            match OneofNode::deserialize(value) {
                Ok(oneof) => members.extend(oneof.oneof),
                Err(err) => warn!(group = %group, error = %err, "skipping malformed oneof"),
            }
        }
        members
    }

    /// Field declarations in document order. Entries that do not have the
    /// shape of a field are logged and skipped.
    pub fn field_nodes(&self) -> Vec<(&'a str, FieldNode)> {
        let Some(fields) = self.fields() else {
            return Vec::new();
        };
        fields
            .iter()
            .filter_map(|(name, value)| match FieldNode::deserialize(value) {
                Ok(field) => Some((name.as_str(), field)),
                Err(err) => {
                    warn!(field = %name, error = %err, "skipping malformed field");
                    None
                }
            })
            .collect()
    }

    /// Enum members with their declared numbers, in document order.
    pub fn enum_values(&self) -> Vec<(&'a str, i64)> {
        let Some(values) = self.values() else {
            return Vec::new();
        };
        values
            .iter()
            .filter_map(|(name, value)| match value.as_i64() {
                Some(number) => Some((name.as_str(), number)),
                None => {
                    warn!(member = %name, "skipping enum member without an integer value");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id:        i64,
    #[serde(default)]
    pub rule:      Option<String>,
    #[serde(default)]
    pub key_type:  Option<String>,
}

impl FieldNode {
    pub fn is_repeated(&self) -> bool {
        self.rule.as_deref() == Some("repeated")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OneofNode {
    pub oneof: Vec<String>,
}

#[test]
fn reads_fields_and_oneofs() {
    let value = serde_json::json!({
        "fields": {
            "name":  { "type": "string", "id": 1 },
            "tags":  { "rule": "repeated", "type": "string", "id": 2 },
            "score": { "keyType": "string", "type": "int64", "id": 3 },
            "email": { "type": "string", "id": 4 },
            "bad":   { "type": 7 }
        },
        "oneofs": { "contact": { "oneof": ["email"] } }
    });
    let node = Node::from_value(&value).unwrap();
    assert!(node.is_message());
    assert!(!node.is_enum());

    let fields = node.field_nodes();
    let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, ["name", "tags", "score", "email"]);
    assert!(fields[1].1.is_repeated());
    assert_eq!(fields[2].1.key_type.as_deref(), Some("string"));

    assert_eq!(node.oneof_members(), HashSet::from(["email".to_string()]));
}

#[test]
fn reads_enum_values() {
    let value = serde_json::json!({ "values": { "HIGH": 5, "LOW": 1, "ODD": "x" } });
    let node = Node::from_value(&value).unwrap();
    assert!(node.is_enum());
    assert_eq!(node.enum_values(), [("HIGH", 5), ("LOW", 1)]);
}
