use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Request or response payload kept both as bytes and, when it parses, as
/// JSON.
///
/// On the wire a body is always a JSON value. Bytes that are not valid JSON
/// serialise as a string so line-oriented transports never drop them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    raw: Vec<u8>,
    structured: Option<Value>,
}

impl Body {
    /// Wraps raw bytes, parsing them as JSON when possible.
    #[must_use]
    pub fn from_bytes(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let structured = if raw.is_empty() {
            None
        } else {
            serde_json::from_slice(&raw).ok()
        };
        Self { raw, structured }
    }

    /// Wraps a JSON value.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        Self {
            raw: value.to_string().into_bytes(),
            structured: Some(value),
        }
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the parsed payload when it is valid JSON.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.structured.as_ref()
    }

    /// Returns the payload as lossy UTF-8 text.
    #[must_use]
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }

    /// Returns true when no bytes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the JSON value used on the wire.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        match &self.structured {
            Some(value) => value.clone(),
            None if self.raw.is_empty() => Value::Null,
            None => Value::String(self.to_text()),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(raw: Vec<u8>) -> Self {
        Self::from_bytes(raw)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.structured {
            Some(value) => value.serialize(serializer),
            None if self.raw.is_empty() => serializer.serialize_none(),
            None => serializer.serialize_str(&self.to_text()),
        }
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}
