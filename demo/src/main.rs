// demo/src/main.rs

use std::collections::BTreeMap;

use polyglot::{decode_to_json, DecodeError, Message};
use polyglot_demo::data::{Department, Person, Priority, User, UserAddress, UserGeo};

fn main() -> Result<(), DecodeError> {
    // A plain two-field message, and what it looks like on the wire.
    let ann = Person::new("Ann".to_string(), 30);
    let bytes = ann.to_bytes();
    println!("Person bytes = {:02x?}", bytes);
    println!("Person as JSON = {}", decode_to_json(&bytes)?);

    let decoded = Person::decode(&bytes)?;
    assert!(decoded.remainder.is_empty());
    println!("decoded {} ({})", decoded.value.name(), decoded.value.age());

    // A message using nested types, collections and enums.
    let mut user = User::default();
    user.set_name("ann".to_string());
    user.set_id(7);
    user.set_address(UserAddress::new(
        "1 Main St".to_string(),
        "Springfield".to_string(),
        UserGeo::new(39.8, -89.6),
    ));
    user.set_tags(vec!["admin".to_string(), "ops".to_string()]);
    user.set_priority(Priority::Urgent);
    user.set_history(vec![Priority::Low, Priority::High]);
    user.set_teams(BTreeMap::from([(
        "infra".to_string(),
        Department::new("Infrastructure".to_string(), vec![ann]),
    )]));

    let bytes = user.to_bytes();
    println!("User is {} bytes", bytes.len());

    let decoded = User::decode(&bytes)?;
    assert_eq!(decoded.value, user);
    println!(
        "decoded {} with priority {:?} and {} team(s)",
        decoded.value.name(),
        decoded.value.priority(),
        decoded.value.teams().len()
    );
    Ok(())
}
