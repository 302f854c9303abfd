//! The fixed invoice extraction schema and the conformance check applied to
//! decoded model output.
//!
//! [`INVOICE_FIELDS`] and [`LINE_ITEM_FIELDS`] are the single definition of
//! the field set and its order; the prompt template in
//! [`crate::llm::extraction`] is tested against them.
//!
//! [`check_schema`] turns a decoded `serde_json::Value` into a typed
//! [`InvoiceRecord`], or reports every [`SchemaViolation`] it finds.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Field definitions
// ---------------------------------------------------------------------------

/// Value shape accepted for a schema field.  Every kind admits `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text: string or null.
    Text,
    /// Identifier that may be spoken as a number: string, number or null.
    Identifier,
    /// Monetary value or count: number or null.
    Amount,
    /// Ordered list of line-item objects, or null (treated as empty).
    Items,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text => "string or null",
            FieldKind::Identifier => "string, number or null",
            FieldKind::Amount => "number or null",
            FieldKind::Items => "array or null",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Identifier, Value::String(_) | Value::Number(_)) => true,
            (FieldKind::Amount, Value::Number(_)) => true,
            (FieldKind::Items, Value::Array(_)) => true,
            _ => false,
        }
    }
}

/// One named field of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> SchemaField {
    SchemaField { name, kind }
}

/// Top-level invoice fields, in prompt order.
pub const INVOICE_FIELDS: &[SchemaField] = &[
    field("invoice_number", FieldKind::Identifier),
    field("company_name", FieldKind::Text),
    field("invoice_date", FieldKind::Text),
    field("due_date", FieldKind::Text),
    field("total_amount", FieldKind::Amount),
    field("currency", FieldKind::Text),
    field("items", FieldKind::Items),
    field("notes", FieldKind::Text),
];

/// Fields of each entry in `items`, in prompt order.
pub const LINE_ITEM_FIELDS: &[SchemaField] = &[
    field("description", FieldKind::Text),
    field("quantity", FieldKind::Amount),
    field("unit_price", FieldKind::Amount),
    field("total_price", FieldKind::Amount),
];

// ---------------------------------------------------------------------------
// Typed record
// ---------------------------------------------------------------------------

/// A decoded extraction that conforms to the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceRecord {
    pub invoice_number: Option<String>,
    pub company_name: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
}

/// One entry of [`InvoiceRecord::items`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
}

impl InvoiceRecord {
    /// `true` when the model found nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// SchemaViolation
// ---------------------------------------------------------------------------

/// A single way in which decoded JSON deviates from the schema.
///
/// Paths use a JSONPath-like notation: `$`, `$.currency`,
/// `$.items[2].unit_price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A required key is absent.
    MissingKey { path: String },
    /// A key is present but holds the wrong JSON type.
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The value at `path` should be an object.
    NotAnObject { path: String, found: &'static str },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingKey { path } => write!(f, "{path}: missing"),
            SchemaViolation::WrongType {
                path,
                expected,
                found,
            } => write!(f, "{path}: expected {expected}, found {found}"),
            SchemaViolation::NotAnObject { path, found } => {
                write!(f, "{path}: expected an object, found {found}")
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// check_schema
// ---------------------------------------------------------------------------

/// Check `value` against the invoice schema.
///
/// All required keys must be present (with `null` allowed everywhere) and
/// every value must match its [`FieldKind`].  Unknown keys are ignored.
/// On failure every violation found is returned, in document order.
pub fn check_schema(value: &Value) -> Result<InvoiceRecord, Vec<SchemaViolation>> {
    let Some(root) = value.as_object() else {
        return Err(vec![SchemaViolation::NotAnObject {
            path: "$".into(),
            found: json_type(value),
        }]);
    };

    let mut violations = Vec::new();
    check_object(root, "$", INVOICE_FIELDS, &mut violations);

    if let Some(Value::Array(items)) = root.get("items") {
        for (i, item) in items.iter().enumerate() {
            let path = format!("$.items[{i}]");
            match item.as_object() {
                Some(obj) => check_object(obj, &path, LINE_ITEM_FIELDS, &mut violations),
                None => violations.push(SchemaViolation::NotAnObject {
                    path,
                    found: json_type(item),
                }),
            }
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(InvoiceRecord {
        invoice_number: text_of(root, "invoice_number"),
        company_name: text_of(root, "company_name"),
        invoice_date: text_of(root, "invoice_date"),
        due_date: text_of(root, "due_date"),
        total_amount: amount_of(root, "total_amount"),
        currency: text_of(root, "currency"),
        items: root
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|obj| LineItem {
                        description: text_of(obj, "description"),
                        quantity: amount_of(obj, "quantity"),
                        unit_price: amount_of(obj, "unit_price"),
                        total_price: amount_of(obj, "total_price"),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        notes: text_of(root, "notes"),
    })
}

fn check_object(
    obj: &Map<String, Value>,
    path: &str,
    fields: &[SchemaField],
    violations: &mut Vec<SchemaViolation>,
) {
    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        match obj.get(field.name) {
            None => violations.push(SchemaViolation::MissingKey { path: field_path }),
            Some(v) if !field.kind.accepts(v) => violations.push(SchemaViolation::WrongType {
                path: field_path,
                expected: field.kind.expected(),
                found: json_type(v),
            }),
            Some(_) => {}
        }
    }
}

/// Only called after the checks above have passed.
fn text_of(obj: &Map<String, Value>, name: &str) -> Option<String> {
    match obj.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount_of(obj: &Map<String, Value>, name: &str) -> Option<f64> {
    obj.get(name).and_then(Value::as_f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
