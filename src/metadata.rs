//! The embedded metadata document and its chunk payload encoding
//!
//! An `aiip` chunk's data is `[method: 1 byte][compressed UTF-8 JSON]`. The
//! JSON must be an object; beyond that the reader imposes no schema. The
//! accessors on [`Metadata`] cover the keys the reference writer emits
//! (`version`, `canvas`, `meta`) and return `None` for anything else.

use crate::{
    compression::{CompressionMethod, DEFAULT_COMPRESSION_LEVEL},
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options controlling how a metadata document is written
///
/// # Example
///
/// ```
/// use aiip_io::WriteOptions;
///
/// let options = WriteOptions::new().compression_level(9);
/// assert_eq!(options.level, 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method recorded in the method byte
    pub method: CompressionMethod,
    /// zlib level, 0 (store) to 9 (best)
    pub level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::default(),
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl WriteOptions {
    /// Default options: DEFLATE at level 6
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level (values above 9 are clamped)
    pub fn compression_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Set the compression method
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }
}

/// Canvas size recorded in a document's `canvas` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// An AIIP metadata document: an arbitrary JSON object
///
/// The wrapped value is always a [`Value::Object`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(Value);

impl Default for Metadata {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(Self::from)
    }
}

impl Metadata {
    /// An empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(Self(value)),
            other => Err(Error::MalformedPayload(format!(
                "document must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Serialize any value into a document
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Deserialize the document into a caller-defined type
    pub fn to_typed<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    /// Borrow the document as a JSON value (always an object)
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Borrow the underlying object
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Convert into a plain JSON value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a value by JSON pointer (e.g. `/regions/0/name`)
    ///
    /// The empty pointer `""` names the whole document.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Insert a top-level key, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0
            .as_object_mut()
            .and_then(|map| map.insert(key.into(), value))
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.0.as_object().map_or(0, Map::len)
    }

    /// True when the document has no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display title: `meta.title`, falling back to a top-level `title`
    pub fn title(&self) -> Option<&str> {
        self.pointer("/meta/title")
            .or_else(|| self.get("title"))
            .and_then(Value::as_str)
    }

    /// Format version string (e.g. `"3.0"`)
    pub fn version(&self) -> Option<&str> {
        self.get("version").and_then(Value::as_str)
    }

    /// Canvas dimensions, when present and well-formed
    pub fn canvas(&self) -> Option<Canvas> {
        Canvas::deserialize(self.get("canvas")?).ok()
    }

    /// Set `version`
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.with("version", Value::String(version.into()))
    }

    /// Set `canvas.width` and `canvas.height`
    pub fn with_canvas(self, width: u32, height: u32) -> Self {
        self.with(
            "canvas",
            serde_json::json!({ "width": width, "height": height }),
        )
    }

    /// Set `meta.title`, keeping any other `meta` fields
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        if let Some(map) = self.0.as_object_mut() {
            let meta = map
                .entry("meta")
                .or_insert_with(|| Value::Object(Map::new()));
            if !meta.is_object() {
                *meta = Value::Object(Map::new());
            }
            if let Value::Object(meta) = meta {
                meta.insert("title".into(), Value::String(title.into()));
            }
        }
        self
    }

    /// Set a top-level key
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }
}

impl TryFrom<Value> for Metadata {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(Value::Object(map))
    }
}

impl From<Metadata> for Value {
    fn from(metadata: Metadata) -> Self {
        metadata.into_value()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the data field of an `aiip` chunk
pub fn encode_payload(metadata: &Metadata, options: &WriteOptions) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(metadata)?;
    let compressed = options.method.compress(&json, options.level)?;

    let mut data = Vec::with_capacity(1 + compressed.len());
    data.push(options.method.as_byte());
    data.extend_from_slice(&compressed);

    tracing::debug!(
        json_len = json.len(),
        chunk_len = data.len(),
        method = ?options.method,
        "Encoded aiip payload"
    );
    Ok(data)
}

/// Decode the data field of an `aiip` chunk
pub fn decode_payload(data: &[u8]) -> Result<Metadata> {
    let (&method_byte, compressed) = data
        .split_first()
        .ok_or_else(|| Error::MalformedPayload("empty aiip chunk".into()))?;

    let method = CompressionMethod::try_from(method_byte)?;
    let json = method.decompress(compressed)?;
    let text = std::str::from_utf8(&json)
        .map_err(|e| Error::MalformedPayload(format!("payload is not UTF-8: {}", e)))?;

    tracing::trace!(chunk_len = data.len(), json_len = json.len(), "Decoded aiip payload");
    Metadata::from_json(text)
}
