//! Runtime values and target shape descriptors.
//!
//! A [`RuntimeValue`] is what a handler actually receives or produces: the
//! result of converting a wire payload toward a declared shape. A
//! [`ValueShape`] is the type descriptor a handler declares for each of its
//! bindings. Both are closed tagged unions dispatched by pattern matching in
//! the conversion engine; there is no open subclass hierarchy to extend.

use serde_json::Value as Document;

/// Target type descriptor declared by a handler binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    /// Boolean scalar.
    Bool,
    /// Signed 64-bit integer scalar.
    Int,
    /// Double-precision floating point scalar.
    Double,
    /// Text string.
    Text,
    /// Raw byte buffer.
    Bytes,
    /// Structured JSON-like document.
    Json,
    /// Named-variant target matched by exact variant name.
    Enumeration(Vec<String>),
    /// Homogeneous list of the element shape.
    List(Box<ValueShape>),
    /// Optional wrapper: absence is a representable value, not a failure.
    Optional(Box<ValueShape>),
}

impl ValueShape {
    /// Convenience constructor for a list shape.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Convenience constructor for an optional shape.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Convenience constructor for an enumeration shape.
    #[must_use]
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumeration(variants.into_iter().map(Into::into).collect())
    }

    /// Returns the inner shape when this is an optional wrapper.
    #[must_use]
    pub fn as_optional(&self) -> Option<&Self> {
        match self {
            Self::Optional(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the element shape when this is a list.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::List(element) => Some(element),
            _ => None,
        }
    }
}

/// A converted, handler-facing value.
///
/// `Optional(None)` is the explicit "present but empty" result produced when
/// an optional-shaped binding resolves against an absent payload. It is
/// deliberately distinct from no-match, which is expressed as `Option::None`
/// at the conversion-engine boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    /// Absence of a value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Floating point scalar.
    Double(f64),
    /// Text string.
    Text(String),
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Parsed structured document.
    Json(Document),
    /// Homogeneous list.
    List(Vec<RuntimeValue>),
    /// Explicit optional: `None` is present-but-empty.
    Optional(Option<Box<RuntimeValue>>),
}

impl RuntimeValue {
    /// Wraps a value in a present optional.
    #[must_use]
    pub fn some(value: Self) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    /// The present-but-empty optional.
    #[must_use]
    pub const fn none() -> Self {
        Self::Optional(None)
    }

    /// Returns the discriminant name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
            Self::List(_) => "list",
            Self::Optional(_) => "optional",
        }
    }

    /// Projects the value into structured document notation.
    ///
    /// This is the relaxed outbound encoding: every runtime value has a
    /// document projection, so the final rendering tier is total for
    /// everything except values the document model cannot express (a NaN
    /// double maps to document null).
    #[must_use]
    pub fn to_document(&self) -> Document {
        match self {
            Self::Null => Document::Null,
            Self::Bool(value) => Document::Bool(*value),
            Self::Int(value) => Document::from(*value),
            Self::Double(value) => {
                serde_json::Number::from_f64(*value).map_or(Document::Null, Document::Number)
            }
            Self::Text(value) => Document::String(value.clone()),
            Self::Bytes(data) => {
                Document::Array(data.iter().map(|&byte| Document::from(byte)).collect())
            }
            Self::Json(document) => document.clone(),
            Self::List(items) => Document::Array(items.iter().map(Self::to_document).collect()),
            Self::Optional(None) => Document::Null,
            Self::Optional(Some(inner)) => inner.to_document(),
        }
    }
}
