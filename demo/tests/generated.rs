use std::collections::BTreeMap;

use polyglot::{decode_to_json, encode_u32, DecodeError, Kind, Message};
use polyglot_demo::data::{Department, Person, Priority, User, UserAddress, UserGeo};
use polyglot_demo::flat::{self, Empty, Ping, Rule};

const ANN_30: [u8; 14] = [
    0x05, 0x0a, 0x00, 0x00, 0x00, 0x03, b'A', b'n', b'n', // name
    0x0a, 0x00, 0x00, 0x00, 0x1e, // age
];

fn sample_user() -> User {
    User::new(
        "ann".to_string(),
        42,
        UserAddress::new("1 Main St".to_string(), "Springfield".to_string(), UserGeo::new(39.8, -89.6)),
        vec!["admin".to_string(), "ops".to_string()],
        BTreeMap::from([("a".to_string(), -1), ("b".to_string(), i64::MAX)]),
        Priority::High,
        vec![Priority::Urgent, Priority::Low],
        BTreeMap::from([(
            "infra".to_string(),
            Department::new(
                "Infrastructure".to_string(),
                vec![Person::new("Ann".to_string(), 30), Person::new("Bo".to_string(), 41)],
            ),
        )]),
        vec![0xde, 0xad],
        -12.5,
        true,
        vec![UserAddress::new("old".to_string(), "town".to_string(), UserGeo::default())],
        BTreeMap::from([(1, Priority::Low), (2, Priority::Urgent)]),
        -7,
        0.25,
    )
}

#[test]
fn person_encodes_to_exact_bytes() {
    let person = Person::new("Ann".to_string(), 30);
    assert_eq!(person.to_bytes(), ANN_30);

    let decoded = Person::decode(&ANN_30).unwrap();
    assert_eq!(decoded.value, person);
    assert!(decoded.remainder.is_empty());
}

#[test]
fn decode_leaves_trailing_bytes() {
    let mut bytes = ANN_30.to_vec();
    bytes.extend_from_slice(&[0x07, 0x01]);
    let decoded = Person::decode(&bytes).unwrap();
    assert_eq!(decoded.value.name(), "Ann");
    assert_eq!(decoded.remainder, [0x07, 0x01]);
}

#[test]
fn fields_are_written_in_id_order() {
    // `id` (2) is declared before `name` (1) in the schema.
    let bytes = User::default().to_bytes();
    assert_eq!(bytes[0], Kind::String.as_byte());
    assert_eq!(bytes[6], Kind::U64.as_byte());
}

#[test]
fn enum_members_are_indexed_by_declared_order() {
    // Declared as HIGH = 5, LOW = 1, URGENT = 9.
    assert_eq!(Priority::Low.index(), 0);
    assert_eq!(Priority::High.index(), 1);
    assert_eq!(Priority::Urgent.index(), 2);
    assert_eq!(Priority::from_index(2), Some(Priority::Urgent));
    assert_eq!(Priority::from_index(3), None);
    assert_eq!(Priority::default(), Priority::Low);

    let mut user = User::default();
    user.set_priority(Priority::Urgent);
    let bytes = user.to_bytes();
    assert!(bytes.windows(2).any(|window| window == [0x08, 0x02]));
}

#[test]
fn user_round_trips() {
    let user = sample_user();
    let bytes = user.to_bytes();
    let decoded = User::decode(&bytes).unwrap();
    assert_eq!(decoded.value, user);
    assert!(decoded.remainder.is_empty());

    assert_eq!(decoded.value.id(), 42);
    assert_eq!(decoded.value.tags(), ["admin", "ops"]);
    assert_eq!(decoded.value.address().geo().lat(), 39.8);
    assert_eq!(decoded.value.teams()["infra"].members()[1].name(), "Bo");
    assert_eq!(decoded.value.levels()[&2], Priority::Urgent);
    assert_eq!(decoded.value.avatar(), [0xde, 0xad]);
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(sample_user().to_bytes(), sample_user().to_bytes());
}

#[test]
fn enum_index_out_of_range_is_rejected() {
    let mut user = User::default();
    user.set_priority(Priority::Urgent);
    let mut bytes = user.to_bytes();
    let at = bytes.windows(2).position(|window| window == [0x08, 0x02]).unwrap();
    bytes[at + 1] = 7;
    assert_eq!(User::decode(&bytes), Err(DecodeError::InvalidEnum(7)));
}

#[test]
fn truncated_input_reports_the_field_kind() {
    assert_eq!(Person::decode(&ANN_30[..8]), Err(DecodeError::InvalidString));
    assert_eq!(Person::decode(&ANN_30[..12]), Err(DecodeError::InvalidU32));
    assert_eq!(Person::decode(&[]), Err(DecodeError::InvalidString));
    assert_eq!(Person::decode(&encode_u32(Vec::new(), 1)), Err(DecodeError::InvalidString));
}

#[test]
fn messages_without_a_package_are_top_level() {
    let ping = Ping::new(9, vec![1, 2, 3], u64::MAX);
    let bytes = ping.to_bytes();
    assert_eq!(bytes[0], Kind::U32.as_byte());
    assert_eq!(Ping::decode(&bytes).unwrap().value, ping);

    assert!(Empty::new().to_bytes().is_empty());
    let decoded = Empty::decode(&[0x00]).unwrap();
    assert_eq!(decoded.remainder, [0x00]);
}

#[test]
fn schema_less_reader_sees_scalar_fields() {
    let json = decode_to_json(&ANN_30).unwrap();
    assert_eq!(json.split_whitespace().collect::<String>(), r#"["Ann",30]"#);

    let bytes = sample_user().to_bytes();
    assert_eq!(decode_to_json(&bytes), Err(DecodeError::SchemaRequired(Kind::Any)));
}

#[test]
fn keyword_fields_and_prelude_names_compile() {
    let mut rule = Rule::new(true, "deny".to_string(), 3);
    assert!(rule.final_());
    assert_eq!(rule.override_(), "deny");
    rule.set_try(4);
    assert_eq!(rule.try_(), 4);

    let wrapper = flat::Ok::new(rule.clone());
    let bytes = wrapper.to_bytes();
    let decoded = flat::Ok::decode(&bytes).unwrap();
    assert_eq!(decoded.value.rule(), &rule);
    assert!(decoded.remainder.is_empty());
}
