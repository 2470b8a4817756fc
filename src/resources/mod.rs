// Resource kinds administered through the back office.
//
// Each kind is a zero-sized type carrying its collection name, realtime topic,
// known fields and access policy as associated constants, so the CRUD engine and
// the store adapters are bound to a table at compile time.

pub mod catalog;

use serde::Serialize;

pub use catalog::{BlogPost, Contact, Product, Quote, Service, Testimonial};

/// JSON kind a known field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Bool,
    Array,
    Object,
}

impl FieldKind {
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Array, Value::Array(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Bool => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// Who may call which operation without passing the admin check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone may list and read; writes need an admin
    PublicRead,
    /// Anyone may submit (intake forms); everything else needs an admin
    PublicCreate,
    /// Every operation needs an admin
    AdminOnly,
}

impl Access {
    pub fn public_read(&self) -> bool {
        matches!(self, Access::PublicRead)
    }

    pub fn public_create(&self) -> bool {
        matches!(self, Access::PublicCreate)
    }
}

/// A named record collection
pub trait Resource: Send + Sync + 'static {
    /// Collection (table) name, also the URL segment under `/api`
    const NAME: &'static str;
    /// Realtime topic published after every successful mutation
    const TOPIC: &'static str;
    const FIELDS: &'static [FieldSpec];
    /// Fields matched by the `search` list parameter. Empty means search is ignored.
    const SEARCH_FIELDS: &'static [&'static str] = &[];
    const ACCESS: Access = Access::PublicRead;

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

/// Runtime view of a resource kind, for listings and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub name: &'static str,
    pub topic: &'static str,
    #[serde(skip)]
    pub access: Access,
}

impl ResourceDescriptor {
    pub fn of<R: Resource>() -> Self {
        Self { name: R::NAME, topic: R::TOPIC, access: R::ACCESS }
    }
}

/// Topics of every resource kind served by the application
pub const KNOWN_TOPICS: &[&str] = &[
    Product::TOPIC,
    Service::TOPIC,
    Testimonial::TOPIC,
    BlogPost::TOPIC,
    Contact::TOPIC,
    Quote::TOPIC,
];
