//! Front-matter parsing

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use super::error::{ContentError, Result};

/// Opening and closing delimiter of a front-matter block
const DELIMITER: &str = "---";

/// YAML document end marker, accepted as a closing delimiter
const DOCUMENT_END: &str = "...";

/// Front-matter data from a document
///
/// Keys keep their source order. Keys the generator doesn't know about are
/// kept verbatim so layouts can still read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, Value>,
}

impl FrontMatter {
    /// Split raw file text into front matter and body.
    ///
    /// Text that does not open with a `---` line has no front matter and is
    /// returned untouched as the body.
    pub fn parse<'a>(content: &'a str, path: &Path) -> Result<(Self, &'a str)> {
        let text = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = text.split_inclusive('\n');

        let opened = lines
            .next()
            .map(|line| is_delimiter(line, DELIMITER))
            .unwrap_or(false);
        if !opened {
            return Ok((FrontMatter::default(), content));
        }

        let block_start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
        let mut offset = block_start;

        for line in lines {
            if is_delimiter(line, DELIMITER) || is_delimiter(line, DOCUMENT_END) {
                let block = &text[block_start..offset];
                let body = &text[offset + line.len()..];
                let fm = Self::from_yaml(block, path)?;
                return Ok((fm, body));
            }
            offset += line.len();
        }

        Err(ContentError::malformed(
            path,
            "missing closing `---` delimiter",
        ))
    }

    /// Parse the text between the delimiters
    fn from_yaml(block: &str, path: &Path) -> Result<Self> {
        if block.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let value: Value = serde_yaml::from_str(block)
            .map_err(|e| ContentError::malformed(path, e.to_string()))?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            // A block holding nothing but comments
            Value::Null => return Ok(FrontMatter::default()),
            _ => {
                return Err(ContentError::malformed(
                    path,
                    "expected `key: value` pairs",
                ))
            }
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(key) => key,
                other => {
                    return Err(ContentError::malformed(
                        path,
                        format!("non-string key {:?}", other),
                    ))
                }
            };
            fields.insert(key, value);
        }

        Ok(Self { fields })
    }

    /// Serialize back to a delimited block, ready to be prepended to a body.
    ///
    /// An empty mapping serializes to an empty string.
    pub fn to_block(&self) -> serde_yaml::Result<String> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        let yaml = serde_yaml::to_string(&self.fields)?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// All fields in source order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// A scalar field rendered as text. Numbers and booleans are stringified,
    /// blank strings count as missing.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    pub fn title(&self) -> Option<String> {
        self.get_string("title")
    }

    pub fn description(&self) -> Option<String> {
        self.get_string("description")
    }

    pub fn layout(&self) -> Option<String> {
        self.get_string("layout")
    }

    pub fn permalink(&self) -> Option<String> {
        self.get_string("permalink")
    }

    /// Keywords, given either as a YAML list or a comma-separated string
    pub fn keywords(&self) -> Vec<String> {
        match self.get("keywords") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn is_delimiter(line: &str, marker: &str) -> bool {
    line.trim_end() == marker
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
