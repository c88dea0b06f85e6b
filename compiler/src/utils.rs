use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NOT_IDENTIFIER: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
    static ref LEADING_DIGIT:  Regex = Regex::new(r"^[0-9]").unwrap();
}

/// Strict and reserved keywords. None of these can name a field or type.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
    "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop",
    "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while",
    // reserved
    "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// JSON-quotes `text` for use in messages.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

fn capitalize(word: &str, lower_rest: bool) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) if lower_rest => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and
///   capitalizes each word, lowercasing the rest of it.
/// - If the string is fully uppercase (e.g. "SIGNAL"), only the first letter
///   stays uppercase.
/// - Otherwise, only the first letter is changed.
pub fn to_pascal_case(s: &str) -> String {
    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case without splitting acronyms, so that
/// "sessionID" becomes "session_id".
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev != '_' && (!prev.is_uppercase() || next_is_lower) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
pub fn escape_rust_keyword(s: &str) -> String {
    if RUST_KEYWORDS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Replaces anything that cannot appear in a Rust identifier and keeps the
/// result from starting with a digit.
pub fn sanitize_identifier(s: &str) -> String {
    let cleaned = NOT_IDENTIFIER.replace_all(s, "_");
    if cleaned.is_empty() || LEADING_DIGIT.is_match(&cleaned) {
        format!("_{}", cleaned)
    } else {
        cleaned.into_owned()
    }
}

/// Identifier for a type: PascalCase, sanitized, keyword-escaped.
pub fn type_ident(name: &str) -> String {
    escape_rust_keyword(&sanitize_identifier(&to_pascal_case(name)))
}

/// Identifier for a field, module or local: snake_case, sanitized,
/// keyword-escaped.
pub fn value_ident(name: &str) -> String {
    escape_rust_keyword(&sanitize_identifier(&to_snake_case(name)))
}

#[test]
fn pascal_case() {
    assert_eq!(to_pascal_case("UserAddress"), "UserAddress");
    assert_eq!(to_pascal_case("STATUS_OK"), "StatusOk");
    assert_eq!(to_pascal_case("URGENT"), "Urgent");
    assert_eq!(to_pascal_case("user_address_v2"), "UserAddressV2");
    assert_eq!(to_pascal_case("department"), "Department");
    assert_eq!(to_pascal_case(""), "");
}

#[test]
fn snake_case() {
    assert_eq!(to_snake_case("sessionID"), "session_id");
    assert_eq!(to_snake_case("clientID"), "client_id");
    assert_eq!(to_snake_case("HTTPRequest"), "http_request");
    assert_eq!(to_snake_case("already_snake"), "already_snake");
    assert_eq!(to_snake_case("With_Underscore"), "with_underscore");
}

#[test]
fn identifiers() {
    assert_eq!(value_ident("type"), "type_");
    assert_eq!(type_ident("SELF"), "Self_");
    assert_eq!(sanitize_identifier("2fa"), "_2fa");
    assert_eq!(sanitize_identifier("a-b"), "a_b");
    assert_eq!(quote("a\"b"), r#""a\"b""#);
}

#[test]
fn reserved_keywords_are_escaped() {
    for word in ["final", "override", "try", "abstract", "yield", "gen", "box", "macro"] {
        assert_eq!(value_ident(word), format!("{}_", word));
    }
    assert_eq!(type_ident("virtual"), "Virtual");
    assert_eq!(value_ident("finally"), "finally");
}
