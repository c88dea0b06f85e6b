#![cfg(test)]

use polyglot_compiler::{
    compile_json,
    gen_rust::{generate_rust, GeneratorOptions},
    ir::{build, build_from_value, locate_root_and_namespace},
    types::{FieldType, Scalar},
    verify,
};
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "nested": { "io": { "nested": { "loopholelabs": { "nested": { "polyglot": { "nested": {
            "test": { "nested": { "data": {
                "options": { "go_package": "x" },
                "nested": {
                    "Priority": { "values": { "A": 5, "B": 1, "C": 9 } },
                    "User": {
                        "oneofs": { "contact": { "oneof": ["email"] } },
                        "fields": {
                            "id":      { "type": "uint64", "id": 2 },
                            "name":    { "type": "string", "id": 1 },
                            "home":    { "type": "Address", "id": 3 },
                            "tags":    { "rule": "repeated", "type": "string", "id": 4 },
                            "scores":  { "keyType": "string", "type": "int64", "id": 5 },
                            "level":   { "type": "Priority", "id": 6 },
                            "email":   { "type": "string", "id": 7 },
                            "weights": { "keyType": "float", "type": "string", "id": 8 },
                            "team":    { "type": ".Team", "id": 9 }
                        },
                        "nested": {
                            "Address": { "fields": { "street": { "type": "string", "id": 1 } } }
                        }
                    },
                    "Team": { "fields": { "members": { "rule": "repeated", "type": "User", "id": 1 } } }
                }
            } } }
        } } } } } } }
    })
}

#[test]
fn test_build_ir() {
    let ir = build_from_value(&schema());

    assert_eq!(ir.namespace, ["io", "loopholelabs", "polyglot", "test", "data"]);

    // Enum members sorted ascending by declared value (B=1, A=5, C=9)
    assert_eq!(ir.enums.len(), 1);
    assert_eq!(ir.enums[0].name, "Priority");
    assert_eq!(ir.enums[0].values, ["B", "A", "C"]);

    // Pre-order: a message before its nested messages, siblings in order
    let names: Vec<&str> = ir.messages.iter().map(|message| message.name.as_str()).collect();
    assert_eq!(names, ["User", "UserAddress", "Team"]);

    let user = ir.message("User").unwrap();
    let fields: Vec<(&str, i64)> = user.fields.iter().map(|field| (field.name.as_str(), field.id)).collect();
    assert_eq!(
        fields,
        [("name", 1), ("id", 2), ("home", 3), ("tags", 4), ("scores", 5), ("level", 6), ("team", 9)]
    );

    assert_eq!(user.fields[0].type_, FieldType::Scalar(Scalar::String));
    assert_eq!(user.fields[2].type_, FieldType::Reference("UserAddress".into()));
    assert!(user.fields[3].is_array);
    assert_eq!(user.fields[4].key_type, Some(Scalar::String));
    assert_eq!(user.fields[4].type_, FieldType::Scalar(Scalar::Int64));
    assert!(!user.fields[4].is_array);
    assert_eq!(user.fields[5].type_, FieldType::Reference("Priority".into()));
    assert_eq!(user.fields[6].type_, FieldType::Reference("Team".into()));

    assert!(verify(&ir).is_empty());
}

#[test]
fn test_tree_without_declarations() {
    let empty = json!({});
    let found = locate_root_and_namespace(empty.as_object().unwrap());
    assert!(found.root.is_none());

    let ir = build_from_value(&json!([1, 2, 3]));
    assert!(ir.messages.is_empty() && ir.enums.is_empty());

    let only_options = json!({ "options": { "a": 1 } });
    let ir = build(only_options.as_object().unwrap());
    assert!(ir.messages.is_empty());
}

#[test]
fn test_generated_rust() {
    let ir = build_from_value(&schema());
    let code = generate_rust(&ir, &GeneratorOptions::default());

    let modules = "pub mod io {\n    pub mod loopholelabs {\n        pub mod polyglot {\n            pub mod test {\n                pub mod data {\n";
    assert!(code.contains(modules));

    // Enums come before messages
    let priority = code.find("pub enum Priority {").unwrap();
    let user = code.find("pub struct User {").unwrap();
    assert!(priority < user);
    assert!(code.contains("B = 0,"));
    assert!(code.contains("A = 1,"));
    assert!(code.contains("C = 2,"));

    // Collections and references
    assert!(code.contains("tags: ::std::vec::Vec<::std::string::String>,"));
    assert!(code.contains("scores: ::std::collections::BTreeMap<::std::string::String, i64>,"));
    assert!(code.contains("home: UserAddress,"));
    assert!(!code.contains("email"));
    assert!(!code.contains("weights"));

    // Encoding
    assert!(code.contains(
        "encoded = ::polyglot::encode_array(encoded, ::polyglot::wire_len(self.tags.len()), ::polyglot::Kind::String);"
    ));
    assert!(code.contains(
        "encoded = ::polyglot::encode_map(encoded, ::polyglot::wire_len(self.scores.len()), ::polyglot::Kind::String, ::polyglot::Kind::I64);"
    ));
    assert!(code.contains("encoded = ::polyglot::encode_u8(encoded, self.level.index());"));
    assert!(code.contains("encoded = ::polyglot::Message::encode(&self.home, encoded);"));
    assert!(code.contains(
        "encoded = ::polyglot::encode_array(encoded, ::polyglot::wire_len(self.members.len()), ::polyglot::Kind::Any);"
    ));

    // Decoding
    assert!(code.contains(
        "let field_level = Priority::from_index(next.value).ok_or(::polyglot::DecodeError::InvalidEnum(next.value))?;"
    ));
    assert!(code.contains("let element = <User as ::polyglot::Message>::decode(decoded)?;"));
    assert!(!code.contains("with_capacity"));

    // Accessors
    assert!(code.contains("pub fn name(&self) -> &str {"));
    assert!(code.contains("pub fn id(&self) -> u64 {"));
    assert!(code.contains("pub fn level(&self) -> Priority {"));
    assert!(code.contains("pub fn tags(&self) -> &[::std::string::String] {"));
    assert!(code.contains("pub fn set_home(&mut self, home: UserAddress) {"));
}

#[test]
fn test_generation_is_deterministic() {
    let text = schema().to_string();
    let options = GeneratorOptions::default();
    assert_eq!(compile_json(&text, &options).unwrap(), compile_json(&text, &options).unwrap());
    assert!(compile_json("{ not json", &options).is_err());
}
