use polyglot_codec::Kind;
use serde::Serialize;

/// The protobuf scalar types a field may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Double,
    Float,
    Int32,
    Uint32,
    Sint32,
    Fixed32,
    Sfixed32,
    Int64,
    Uint64,
    Sint64,
    Fixed64,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl Scalar {
    pub const ALL: [Scalar; 15] = [
        Scalar::Double,
        Scalar::Float,
        Scalar::Int32,
        Scalar::Uint32,
        Scalar::Sint32,
        Scalar::Fixed32,
        Scalar::Sfixed32,
        Scalar::Int64,
        Scalar::Uint64,
        Scalar::Sint64,
        Scalar::Fixed64,
        Scalar::Sfixed64,
        Scalar::Bool,
        Scalar::String,
        Scalar::Bytes,
    ];

    pub fn from_schema_name(name: &str) -> Option<Scalar> {
        Scalar::ALL.into_iter().find(|scalar| scalar.schema_name() == name)
    }

    /// The name used for this type in a `.proto` file.
    pub fn schema_name(self) -> &'static str {
        match self {
            Scalar::Double   => "double",
            Scalar::Float    => "float",
            Scalar::Int32    => "int32",
            Scalar::Uint32   => "uint32",
            Scalar::Sint32   => "sint32",
            Scalar::Fixed32  => "fixed32",
            Scalar::Sfixed32 => "sfixed32",
            Scalar::Int64    => "int64",
            Scalar::Uint64   => "uint64",
            Scalar::Sint64   => "sint64",
            Scalar::Fixed64  => "fixed64",
            Scalar::Sfixed64 => "sfixed64",
            Scalar::Bool     => "bool",
            Scalar::String   => "string",
            Scalar::Bytes    => "bytes",
        }
    }

    /// The wire kind values of this type are written as.
    pub fn kind(self) -> Kind {
        match self {
            Scalar::Double => Kind::F64,
            Scalar::Float => Kind::F32,
            Scalar::Int32 | Scalar::Sint32 | Scalar::Sfixed32 => Kind::I32,
            Scalar::Uint32 | Scalar::Fixed32 => Kind::U32,
            Scalar::Int64 | Scalar::Sint64 | Scalar::Sfixed64 => Kind::I64,
            Scalar::Uint64 | Scalar::Fixed64 => Kind::U64,
            Scalar::Bool => Kind::Bool,
            Scalar::String => Kind::String,
            Scalar::Bytes => Kind::Bytes,
        }
    }

    /// The Rust type generated code stores this scalar as. Owned types are
    /// written with absolute paths so a schema type named `String` cannot
    /// shadow them.
    pub fn rust_type(self) -> &'static str {
        match self.kind() {
            Kind::F64 => "f64",
            Kind::F32 => "f32",
            Kind::I32 => "i32",
            Kind::U32 => "u32",
            Kind::I64 => "i64",
            Kind::U64 => "u64",
            Kind::Bool => "bool",
            Kind::Bytes => "::std::vec::Vec<u8>",
            _ => "::std::string::String",
        }
    }

    pub fn is_copy(self) -> bool {
        !matches!(self, Scalar::String | Scalar::Bytes)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Double | Scalar::Float)
    }
}

/// What a field holds: a scalar, or a message/enum named by its qualified
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Scalar(Scalar),
    Reference(String),
}

impl FieldType {
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Scalar(scalar) => scalar.schema_name(),
            FieldType::Reference(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name:     String,
    pub id:       i64,
    #[serde(rename = "type")]
    pub type_:    FieldType,
    /// Set only for map fields; `type_` is then the value type.
    pub key_type: Option<Scalar>,
    pub is_array: bool,
}

impl Field {
    pub fn is_map(&self) -> bool {
        self.key_type.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageType {
    pub name:   String,
    /// Sorted by field id.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    pub name:   String,
    /// Member names in ascending order of their declared values; a member's
    /// position is its wire index.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaIr {
    pub namespace: Vec<String>,
    pub messages:  Vec<MessageType>,
    pub enums:     Vec<EnumType>,
}

impl SchemaIr {
    pub fn message(&self, name: &str) -> Option<&MessageType> {
        self.messages.iter().find(|message| message.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|enumeration| enumeration.name == name)
    }
}

#[test]
fn scalar_mapping() {
    assert_eq!(Scalar::from_schema_name("sfixed32"), Some(Scalar::Sfixed32));
    assert_eq!(Scalar::from_schema_name("Department"), None);
    assert_eq!(Scalar::Sint64.kind(), Kind::I64);
    assert_eq!(Scalar::Fixed32.rust_type(), "u32");
    assert_eq!(Scalar::Bytes.rust_type(), "::std::vec::Vec<u8>");
    assert!(Scalar::Double.is_float());
    assert!(!Scalar::String.is_copy());
    for scalar in Scalar::ALL {
        assert_eq!(Scalar::from_schema_name(scalar.schema_name()), Some(scalar));
    }
}
