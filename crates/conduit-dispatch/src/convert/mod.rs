//! Graded type conversion between wire payloads and runtime values.
//!
//! Conversion is attempted through a fixed precedence ladder of
//! [`MatchingLevel`]s, strictest first, stopping at the first success. The
//! ladder ordering is the central behavioural contract of the dispatch core:
//! reordering tiers silently changes the outcome for any payload that could
//! match at more than one tier.
//!
//! Every function in this module is a pure function of its inputs. There is
//! no shared mutable state, no I/O, and no blocking, so unsynchronised
//! concurrent use is safe.

use std::borrow::Cow;

use conduit_wire_types::WireValue;
use serde_json::Value as Document;

use crate::value::{RuntimeValue, ValueShape};

/// Precedence tier for matching a payload against a target shape.
///
/// Ordered strictest to loosest. `NameMatch` is only ever satisfied by a
/// name-scoped lookup in the binding catalog; the three type tiers form the
/// shape ladder walked by [`convert_by_shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchingLevel {
    /// Lookup scoped to an exact declared binding name.
    NameMatch,
    /// The native wire shape already satisfies the target, untransformed.
    TypeAssignment,
    /// A well-defined, lossless, unambiguous conversion.
    TypeStrictConversion,
    /// Best-effort structural coercion through document notation.
    TypeRelaxedConversion,
}

impl MatchingLevel {
    /// The shape ladder, in the fixed order conversion attempts it.
    pub const SHAPE_LADDER: [Self; 3] = [
        Self::TypeAssignment,
        Self::TypeStrictConversion,
        Self::TypeRelaxedConversion,
    ];

    /// Returns the canonical tier name, for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NameMatch => "name-match",
            Self::TypeAssignment => "type-assignment",
            Self::TypeStrictConversion => "type-strict-conversion",
            Self::TypeRelaxedConversion => "type-relaxed-conversion",
        }
    }
}

/// Attempts to convert a wire value into the target shape at one tier.
///
/// Returns `None` when the tier cannot produce the target ("no match").
/// `NameMatch` always returns `None` here: name scoping is a catalog
/// concern, not a per-value conversion.
///
/// An `Optional` target is unwrapped before conversion and the result is
/// re-wrapped; an absent (`Null`) source against an `Optional` target yields
/// the present-but-empty optional rather than failure, at every tier.
#[must_use]
pub fn convert(value: &WireValue, target: &ValueShape, level: MatchingLevel) -> Option<RuntimeValue> {
    if let ValueShape::Optional(inner) = target {
        if value.is_null() {
            return Some(RuntimeValue::none());
        }
        return convert(value, inner, level).map(RuntimeValue::some);
    }
    match level {
        MatchingLevel::NameMatch => None,
        MatchingLevel::TypeAssignment => assign(value, target),
        MatchingLevel::TypeStrictConversion => convert_strict(value, target),
        MatchingLevel::TypeRelaxedConversion => convert_relaxed(value, target),
    }
}

/// Walks the shape ladder, returning the first successful conversion and the
/// tier that produced it.
#[must_use]
pub fn convert_by_shape(
    value: &WireValue,
    target: &ValueShape,
) -> Option<(RuntimeValue, MatchingLevel)> {
    MatchingLevel::SHAPE_LADDER
        .iter()
        .find_map(|&level| convert(value, target, level).map(|converted| (converted, level)))
}

/// Dedicated collection path: parses the raw content as a document list and
/// coerces each element into the element shape at the relaxed tier.
///
/// Collection payloads arrive at the boundary pre-serialised as a single
/// scalar document, so this path bypasses the assignment and strict tiers
/// entirely.
#[must_use]
pub fn convert_list(value: &WireValue, element: &ValueShape) -> Option<RuntimeValue> {
    let text = raw_document_text(value)?;
    let document: Document = serde_json::from_str(text.as_ref()).ok()?;
    let items = document.as_array()?;
    items
        .iter()
        .map(|item| coerce_document(item, element))
        .collect::<Option<Vec<_>>>()
        .map(RuntimeValue::List)
}

fn assign(value: &WireValue, target: &ValueShape) -> Option<RuntimeValue> {
    match (value, target) {
        (WireValue::Bool { value: b }, ValueShape::Bool) => Some(RuntimeValue::Bool(*b)),
        (WireValue::Int { value: i }, ValueShape::Int) => Some(RuntimeValue::Int(*i)),
        (WireValue::Double { value: d }, ValueShape::Double) => Some(RuntimeValue::Double(*d)),
        (WireValue::Str { value: s }, ValueShape::Text) => Some(RuntimeValue::Text(s.clone())),
        (WireValue::Bytes { data, .. }, ValueShape::Bytes) => {
            Some(RuntimeValue::Bytes(data.clone()))
        }
        (WireValue::Collection { items }, ValueShape::List(element)) => items
            .iter()
            .map(|item| convert(item, element, MatchingLevel::TypeAssignment))
            .collect::<Option<Vec<_>>>()
            .map(RuntimeValue::List),
        _ => None,
    }
}

fn convert_strict(value: &WireValue, target: &ValueShape) -> Option<RuntimeValue> {
    match (value, target) {
        (WireValue::Int { value: i }, ValueShape::Double) => {
            widen_exact(*i).map(RuntimeValue::Double)
        }
        (WireValue::Bytes { data, encoding }, ValueShape::Text) => {
            encoding.decode(data).map(RuntimeValue::Text)
        }
        (WireValue::Str { value: s }, ValueShape::Bytes) => {
            Some(RuntimeValue::Bytes(s.as_bytes().to_vec()))
        }
        (WireValue::Json { text }, ValueShape::Text) => Some(RuntimeValue::Text(text.clone())),
        (WireValue::Str { value: s }, ValueShape::Enumeration(variants)) => variants
            .iter()
            .any(|variant| variant == s)
            .then(|| RuntimeValue::Text(s.clone())),
        (WireValue::Collection { items }, ValueShape::List(element)) => items
            .iter()
            .map(|item| convert(item, element, MatchingLevel::TypeStrictConversion))
            .collect::<Option<Vec<_>>>()
            .map(RuntimeValue::List),
        _ => None,
    }
}

fn convert_relaxed(value: &WireValue, target: &ValueShape) -> Option<RuntimeValue> {
    let text = raw_document_text(value)?;
    // A parse failure here is "no match" for this tier, never an invocation
    // failure.
    let document: Document = serde_json::from_str(text.as_ref()).ok()?;
    coerce_document(&document, target)
}

/// Numeric widening is strict only when the widened value is mathematically
/// exact; magnitudes beyond 2^53 lose precision and fall through.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "the round trip through i128 verifies the widening was exact"
)]
fn widen_exact(value: i64) -> Option<f64> {
    let widened = value as f64;
    (widened as i128 == i128::from(value)).then_some(widened)
}

/// Returns the raw document text of a payload, when it has one.
fn raw_document_text(value: &WireValue) -> Option<Cow<'_, str>> {
    match value {
        WireValue::Json { text } => Some(Cow::Borrowed(text.as_str())),
        WireValue::Str { value: s } => Some(Cow::Borrowed(s.as_str())),
        WireValue::Bytes { data, encoding } => encoding.decode(data).map(Cow::Owned),
        _ => None,
    }
}

/// Structurally coerces a parsed document into the target shape.
///
/// Fields the target shape does not ask for are simply never read, which
/// gives the forward-compatibility guarantee that unknown fields are
/// ignored.
fn coerce_document(document: &Document, target: &ValueShape) -> Option<RuntimeValue> {
    match target {
        ValueShape::Bool => document.as_bool().map(RuntimeValue::Bool),
        ValueShape::Int => document.as_i64().map(RuntimeValue::Int),
        ValueShape::Double => document.as_f64().map(RuntimeValue::Double),
        ValueShape::Text => document
            .as_str()
            .map(|s| RuntimeValue::Text(s.to_owned())),
        ValueShape::Bytes => document
            .as_str()
            .map(|s| RuntimeValue::Bytes(s.as_bytes().to_vec())),
        ValueShape::Json => Some(RuntimeValue::Json(document.clone())),
        ValueShape::Enumeration(variants) => document
            .as_str()
            .filter(|s| variants.iter().any(|variant| variant == s))
            .map(|s| RuntimeValue::Text(s.to_owned())),
        ValueShape::List(element) => document.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| coerce_document(item, element))
                .collect::<Option<Vec<_>>>()
                .map(RuntimeValue::List)
        }),
        ValueShape::Optional(inner) => {
            if document.is_null() {
                Some(RuntimeValue::none())
            } else {
                coerce_document(document, inner).map(RuntimeValue::some)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound direction
// ---------------------------------------------------------------------------

/// Attempts to render a runtime value into a wire payload at one tier.
///
/// The ladder runs with source and target roles reversed: does the value
/// already have a direct wire shape, can it be strictly encoded, and
/// finally, serialise through the document projection. The relaxed tier is
/// total for every runtime value.
#[must_use]
pub fn render(value: &RuntimeValue, level: MatchingLevel) -> Option<WireValue> {
    match level {
        MatchingLevel::NameMatch => None,
        MatchingLevel::TypeAssignment => render_assign(value),
        MatchingLevel::TypeStrictConversion => render_strict(value),
        MatchingLevel::TypeRelaxedConversion => {
            Some(WireValue::json(value.to_document().to_string()))
        }
    }
}

/// Walks the outbound ladder, returning the first successful rendering.
#[must_use]
pub fn render_by_shape(value: &RuntimeValue) -> Option<WireValue> {
    MatchingLevel::SHAPE_LADDER
        .iter()
        .find_map(|&level| render(value, level))
}

/// The fixed sentinel for an absent or unrenderable output: the empty
/// document payload.
#[must_use]
pub fn empty_document() -> WireValue {
    WireValue::json("null")
}

fn render_assign(value: &RuntimeValue) -> Option<WireValue> {
    match value {
        RuntimeValue::Bool(b) => Some(WireValue::Bool { value: *b }),
        RuntimeValue::Int(i) => Some(WireValue::Int { value: *i }),
        RuntimeValue::Double(d) => Some(WireValue::Double { value: *d }),
        RuntimeValue::Text(s) => Some(WireValue::string(s.clone())),
        RuntimeValue::Bytes(data) => Some(WireValue::Bytes {
            data: data.clone(),
            encoding: conduit_wire_types::TextEncoding::Utf8,
        }),
        _ => None,
    }
}

fn render_strict(value: &RuntimeValue) -> Option<WireValue> {
    match value {
        RuntimeValue::Json(document) => Some(WireValue::json(document.to_string())),
        RuntimeValue::List(items) => items
            .iter()
            .map(render_by_shape)
            .collect::<Option<Vec<_>>>()
            .map(|rendered| WireValue::Collection { items: rendered }),
        RuntimeValue::Optional(Some(inner)) => render_by_shape(inner),
        RuntimeValue::Optional(None) => Some(empty_document()),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
