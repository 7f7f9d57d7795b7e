//! Wire payload representation shared between the transport layer and the
//! dispatch core.
//!
//! The host orchestrator delivers each invocation as a bag of named, typed
//! payloads. [`WireValue`] is the wire-agnostic tagged representation of one
//! such payload: a closed union of the shapes the streaming protocol can
//! carry. Values are constructed by the transport layer and are immutable
//! thereafter; the discriminant always agrees with the stored payload because
//! the type is a plain Rust enum.
//!
//! The dispatch core never inspects protocol framing. Everything it needs
//! (name, type tag, raw content) is captured by [`NamedPayload`].

use serde::{Deserialize, Serialize};

/// Declared text encoding of a raw byte buffer payload.
///
/// The strict conversion tier uses the declared encoding to move losslessly
/// between byte buffers and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// UTF-8 encoded text.
    Utf8,
    /// ISO-8859-1 text; each byte maps to the identical code point.
    Latin1,
}

impl TextEncoding {
    /// Decodes a byte buffer into a string under this encoding.
    ///
    /// Returns `None` when the bytes are not valid in the declared encoding
    /// (only possible for UTF-8; Latin-1 is total).
    #[must_use]
    pub fn decode(&self, data: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => String::from_utf8(data.to_vec()).ok(),
            Self::Latin1 => Some(data.iter().map(|&byte| char::from(byte)).collect()),
        }
    }

    /// Encodes a string into bytes under this encoding.
    ///
    /// Returns `None` when the text contains characters the encoding cannot
    /// represent (code points above U+00FF for Latin-1).
    #[must_use]
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Utf8 => Some(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|ch| u8::try_from(u32::from(ch)).ok())
                .collect(),
        }
    }
}

/// A typed wire payload value.
///
/// Serialised with an internal `kind` tag so transport implementations and
/// test fixtures can express payloads as JSON. `Json` carries a structured
/// document as serialised text: the relaxed conversion tier, not the
/// transport, is responsible for parsing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireValue {
    /// Absence of a value. Distinct from an empty string or document.
    Null,
    /// Boolean scalar.
    Bool {
        /// The boolean value.
        value: bool,
    },
    /// Signed integer scalar.
    Int {
        /// The integer value.
        value: i64,
    },
    /// Double-precision floating point scalar.
    Double {
        /// The floating point value.
        value: f64,
    },
    /// String scalar.
    Str {
        /// The string value.
        value: String,
    },
    /// Raw byte buffer with its declared text encoding.
    Bytes {
        /// The buffer content.
        data: Vec<u8>,
        /// Encoding used when the buffer is read as text.
        encoding: TextEncoding,
    },
    /// Structured document notation, carried as serialised text.
    Json {
        /// The serialised document.
        text: String,
    },
    /// Homogeneous list of wire values.
    Collection {
        /// The list elements.
        items: Vec<WireValue>,
    },
}

impl WireValue {
    /// Convenience constructor for a string payload.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str {
            value: value.into(),
        }
    }

    /// Convenience constructor for a document payload.
    #[must_use]
    pub fn json(text: impl Into<String>) -> Self {
        Self::Json { text: text.into() }
    }

    /// Returns `true` when the value is the absence discriminant.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the discriminant name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool { .. } => "bool",
            Self::Int { .. } => "int",
            Self::Double { .. } => "double",
            Self::Str { .. } => "str",
            Self::Bytes { .. } => "bytes",
            Self::Json { .. } => "json",
            Self::Collection { .. } => "collection",
        }
    }
}

/// One named payload as delivered or produced over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedPayload {
    name: String,
    value: WireValue,
}

impl NamedPayload {
    /// Creates a named payload.
    #[must_use]
    pub fn new(name: impl Into<String>, value: WireValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Returns the binding name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the payload value.
    #[must_use]
    pub const fn value(&self) -> &WireValue {
        &self.value
    }

    /// Consumes the payload, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, WireValue) {
        (self.name, self.value)
    }
}
