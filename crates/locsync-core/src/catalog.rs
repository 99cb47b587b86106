use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One node of a language catalog: either a translated string or a nested
/// group of further nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Leaf(String),
    Branch(Catalog),
}

impl TranslationNode {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            Self::Branch(_) => None,
        }
    }

    /// Consumes the node as a group. A leaf becomes an empty group and its
    /// text is handed back.
    pub(crate) fn into_branch(self) -> (Catalog, Option<String>) {
        match self {
            Self::Branch(inner) => (inner, None),
            Self::Leaf(text) => (Catalog::new(), Some(text)),
        }
    }
}

/// The nested key -> string document of one language. Insertion order is
/// kept so a load/save cycle does not reshuffle a human-maintained file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: IndexMap<String, TranslationNode>,
}

#[derive(Debug, Error)]
pub enum CatalogFormatError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("top level must be an object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("`{key}` holds {found}; only strings and objects are allowed")]
    InvalidValue { key: String, found: &'static str },
    #[error("`{key}` is not a usable key segment")]
    InvalidSegment { key: String },
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, segment: &str) -> Option<&TranslationNode> {
        self.entries.get(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entries_mut(&mut self) -> &mut IndexMap<String, TranslationNode> {
        &mut self.entries
    }

    /// Parse catalog text. Blank input is an empty catalog.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogFormatError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Convert a JSON value into a catalog, rejecting anything that is not a
    /// string leaf or a nested object.
    pub fn from_value(value: Value) -> Result<Self, CatalogFormatError> {
        match value {
            Value::Object(map) => convert_object(map, ""),
            other => Err(CatalogFormatError::NotAnObject {
                found: kind_of(&other),
            }),
        }
    }

    /// Pretty JSON with two-space indentation and a trailing newline.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

fn convert_object(
    map: serde_json::Map<String, Value>,
    prefix: &str,
) -> Result<Catalog, CatalogFormatError> {
    let mut catalog = Catalog::new();
    for (segment, value) in map {
        let dotted = if prefix.is_empty() {
            segment.clone()
        } else {
            format!("{prefix}.{segment}")
        };
        if segment.is_empty() || segment.contains('.') {
            return Err(CatalogFormatError::InvalidSegment { key: dotted });
        }
        let node = match value {
            Value::String(text) => TranslationNode::Leaf(text),
            Value::Object(inner) => TranslationNode::Branch(convert_object(inner, &dotted)?),
            other => {
                return Err(CatalogFormatError::InvalidValue {
                    key: dotted,
                    found: kind_of(&other),
                })
            }
        };
        catalog.entries.insert(segment, node);
    }
    Ok(catalog)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
