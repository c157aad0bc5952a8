// 🧩 Slice - CMS-authored content block
//
// The CMS owns the schema, so nothing here is trusted: every attribute is
// optional and every accessor returns Option / a default instead of failing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// SLICE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Tag selecting the renderer ("text", "accordion", ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub slice_type: String,

    /// Optional variant of the tag ("default", "withHeader", ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub variation: Option<String>,

    /// Non-repeatable attributes
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary: Map<String, Value>,

    /// Repeatable attributes (rows, panels, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Value>,
}

/// `null` (or a type mismatch at the top level) becomes `T::default()`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl Slice {
    pub fn new(slice_type: impl Into<String>) -> Self {
        Slice {
            slice_type: slice_type.into(),
            ..Default::default()
        }
    }

    /// Builder: set the variation
    pub fn with_variation(mut self, variation: impl Into<String>) -> Self {
        self.variation = Some(variation.into());
        self
    }

    /// Builder: set one primary attribute
    pub fn with_primary(mut self, key: impl Into<String>, value: Value) -> Self {
        self.primary.insert(key.into(), value);
        self
    }

    /// Builder: append one item
    pub fn with_item(mut self, item: Value) -> Self {
        self.items.push(item);
        self
    }

    pub fn primary(&self) -> Attrs<'_> {
        Attrs::new(&self.primary)
    }

    /// Items that are objects; anything else is skipped
    pub fn items(&self) -> impl Iterator<Item = Attrs<'_>> {
        self.items
            .iter()
            .filter_map(|item| item.as_object().map(Attrs::new))
    }

    pub fn variation(&self) -> Option<&str> {
        self.variation.as_deref().filter(|v| !v.is_empty())
    }
}

/// Parse a slice list from a CMS document body.
///
/// Entries that are not objects are skipped; a non-array body is empty.
/// Every object yields a slice, so an unrenderable one still gets a placeholder.
pub fn parse_slices(body: &Value) -> Vec<Slice> {
    body.as_array()
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| entry.is_object())
                .map(decode_slice)
                .collect()
        })
        .unwrap_or_default()
}

/// Decode one slice object, keeping at least its tag when the rest is unusable
fn decode_slice(entry: &Value) -> Slice {
    Slice::deserialize(entry).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "slice attributes dropped");
        Slice::new(
            entry
                .get("slice_type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        )
    })
}

/// Slice list from a whole document: a bare array, or an object holding it
/// under `body` or `slices`
pub fn slices_from_document(document: &Value) -> Vec<Slice> {
    if document.is_array() {
        return parse_slices(document);
    }
    ["body", "slices"]
        .iter()
        .find_map(|key| document.get(*key).filter(|v| v.is_array()))
        .map(parse_slices)
        .unwrap_or_default()
}

// ============================================================================
// ATTRIBUTE ACCESS
// ============================================================================

/// Defensive view over an attribute map
#[derive(Debug, Clone, Copy)]
pub struct Attrs<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Attrs<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Attrs { map }
    }

    /// Raw value, `null` treated as absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty string value (numbers are stringified)
    pub fn str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.to_lowercase().as_str(), "true" | "yes"),
            _ => false,
        }
    }

    /// Link field: either `{ "url": ... }` or a bare string
    pub fn link(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(obj) => Attrs::new(obj).str("url"),
            _ => None,
        }
    }

    /// Nested object as another attribute view
    pub fn object(&self, key: &str) -> Option<Attrs<'a>> {
        self.get(key)?.as_object().map(Attrs::new)
    }

    /// All keys in map order
    pub fn keys(&self) -> impl Iterator<Item = &'a String> {
        self.map.keys()
    }
}
