//! Per-invocation binding wrappers and the binding catalog.
//!
//! A [`DataSource`] wraps one named inbound payload for the lifetime of one
//! invocation and answers shape-directed resolution queries through the
//! conversion ladder. A [`DataTarget`] wraps one named outbound slot: it
//! starts empty, the handler (or the resolver, for the return slot) fills
//! it, and it is rendered to a wire payload exactly once after the call.
//!
//! The [`BindingCatalog`] trait is the seam the overload resolver consumes.
//! [`InvocationStore`] is the concrete per-invocation implementation: it
//! owns the invocation's sources, allocates output groups, and keeps
//! tentative targets invisible until the group that created them is
//! promoted. Stores are never shared across invocations, so no locking is
//! required; dropping the store drops every unpromoted group with it.

use conduit_wire_types::{NamedPayload, WireValue};
use tracing::warn;

use crate::convert::{self, MatchingLevel};
use crate::value::{RuntimeValue, ValueShape};

/// Tracing target for binding operations.
pub(crate) const BINDING_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::binding");

/// Reserved binding name for the return slot.
pub const RETURN_NAME: &str = "$return";

/// A conversion result tagged with the matching level that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    value: RuntimeValue,
    level: MatchingLevel,
}

impl BoundValue {
    /// Creates a bound value at the given level.
    #[must_use]
    pub const fn new(value: RuntimeValue, level: MatchingLevel) -> Self {
        Self { value, level }
    }

    /// Returns the converted value.
    #[must_use]
    pub const fn value(&self) -> &RuntimeValue {
        &self.value
    }

    /// Returns the level the value was resolved at.
    #[must_use]
    pub const fn level(&self) -> MatchingLevel {
        self.level
    }

    /// Consumes the binding, returning the converted value.
    #[must_use]
    pub fn into_value(self) -> RuntimeValue {
        self.value
    }
}

/// One named inbound payload, read-only for the invocation's lifetime.
#[derive(Debug, Clone)]
pub struct DataSource {
    name: Option<String>,
    value: WireValue,
}

impl DataSource {
    /// Creates a source carrying a binding name.
    #[must_use]
    pub fn named(name: impl Into<String>, value: WireValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }

    /// Creates an anonymous source, resolvable only by shape.
    #[must_use]
    pub const fn unnamed(value: WireValue) -> Self {
        Self { name: None, value }
    }

    /// Returns the binding name, when one was declared.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the wire payload.
    #[must_use]
    pub const fn value(&self) -> &WireValue {
        &self.value
    }

    /// Resolves this source against a target shape through the
    /// assignment → strict → relaxed ladder, first success wins.
    #[must_use]
    pub fn resolve_by_shape(&self, target: &ValueShape) -> Option<BoundValue> {
        convert::convert_by_shape(&self.value, target)
            .map(|(value, level)| BoundValue::new(value, level))
    }

    /// Resolves this source as a collection of the element shape.
    ///
    /// Collection payloads arrive pre-serialised as a single scalar
    /// document, so this always resolves through the relaxed document-list
    /// path regardless of the other tiers.
    #[must_use]
    pub fn resolve_as_list(&self, element: &ValueShape) -> Option<BoundValue> {
        convert::convert_list(&self.value, element)
            .map(|value| BoundValue::new(value, MatchingLevel::TypeRelaxedConversion))
    }
}

/// One named outbound slot, filled by the handler and rendered once.
#[derive(Debug, Clone)]
pub struct DataTarget {
    name: String,
    value: Option<RuntimeValue>,
}

impl DataTarget {
    /// Creates an empty target for the given binding name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Returns the binding name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the value the handler produced, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&RuntimeValue> {
        self.value.as_ref()
    }

    /// Stores the handler-produced value.
    pub fn set_value(&mut self, value: RuntimeValue) {
        self.value = Some(value);
    }

    /// Renders the target into its outbound wire payload.
    ///
    /// Never fails: an unset or absent value renders to the empty-document
    /// sentinel, and an unrenderable value degrades to the same sentinel
    /// with a warning rather than blocking response delivery.
    #[must_use]
    pub fn render(&self) -> WireValue {
        match &self.value {
            None | Some(RuntimeValue::Null) => convert::empty_document(),
            Some(value) => convert::render_by_shape(value).unwrap_or_else(|| {
                warn!(
                    target: BINDING_TARGET,
                    name = self.name.as_str(),
                    kind = value.kind(),
                    "output degraded to empty document"
                );
                convert::empty_document()
            }),
        }
    }
}

/// Identifier shared by all targets created during one resolution attempt.
///
/// Promotion and rollback operate on whole groups so a failed candidate's
/// tentative targets can never leak into the visible output set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputGroupId(u64);

/// The per-invocation binding lookup and output surface the resolver
/// consumes.
///
/// Implemented by [`InvocationStore`]; test code can substitute stub
/// implementations to observe resolver behaviour.
pub trait BindingCatalog {
    /// Allocates a fresh output group for one resolution attempt.
    fn allocate_group(&mut self) -> OutputGroupId;

    /// Looks up the source carrying the given binding name (exact,
    /// case-sensitive).
    fn source_by_name(&self, name: &str) -> Option<&DataSource>;

    /// Returns every source of the invocation, in arrival order.
    fn sources(&self) -> &[DataSource];

    /// Returns the target with the given name in the group, creating it on
    /// first use. This operation cannot fail.
    fn get_or_create_target(&mut self, group: OutputGroupId, name: &str) -> &mut DataTarget;

    /// Makes the group's targets externally visible, in creation order.
    fn promote(&mut self, group: OutputGroupId);

    /// Name-scoped resolution: only the name-match level may satisfy this.
    ///
    /// Converts the named source through the shape ladder and tags the
    /// result [`MatchingLevel::NameMatch`]. When no source carries the name
    /// and the target shape is optional, synthesises the present-but-empty
    /// optional: an absent name with a shape that permits absence is a
    /// value, not a miss.
    fn resolve_by_name(&self, name: &str, target: &ValueShape) -> Option<BoundValue> {
        self.source_by_name(name).map_or_else(
            || {
                matches!(target, ValueShape::Optional(_))
                    .then(|| BoundValue::new(RuntimeValue::none(), MatchingLevel::NameMatch))
            },
            |source| {
                source
                    .resolve_by_shape(target)
                    .map(|bound| BoundValue::new(bound.into_value(), MatchingLevel::NameMatch))
            },
        )
    }
}

/// Concrete per-invocation catalog.
///
/// Owns the invocation's sources and targets. Created when the invocation
/// begins, discarded when it ends; unpromoted groups are dropped with it.
#[derive(Debug, Default)]
pub struct InvocationStore {
    sources: Vec<DataSource>,
    next_group: u64,
    pending: Vec<(OutputGroupId, DataTarget)>,
    visible: Vec<DataTarget>,
}

impl InvocationStore {
    /// Creates a store from the invocation's inbound payloads.
    #[must_use]
    pub fn new(payloads: Vec<NamedPayload>) -> Self {
        let sources = payloads
            .into_iter()
            .map(|payload| {
                let (name, value) = payload.into_parts();
                DataSource::named(name, value)
            })
            .collect();
        Self::from_sources(sources)
    }

    /// Creates a store from pre-built sources.
    #[must_use]
    pub fn from_sources(sources: Vec<DataSource>) -> Self {
        Self {
            sources,
            next_group: 0,
            pending: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Returns the promoted targets, in creation order.
    #[must_use]
    pub fn visible_targets(&self) -> &[DataTarget] {
        &self.visible
    }

    /// Returns a promoted target by name, for the invoker to fill.
    pub fn visible_target_mut(&mut self, name: &str) -> Option<&mut DataTarget> {
        self.visible.iter_mut().find(|target| target.name() == name)
    }

    /// Renders every promoted target into an outbound payload, in creation
    /// order.
    #[must_use]
    pub fn render_outputs(&self) -> Vec<NamedPayload> {
        self.visible
            .iter()
            .map(|target| NamedPayload::new(target.name(), target.render()))
            .collect()
    }
}

impl BindingCatalog for InvocationStore {
    fn allocate_group(&mut self) -> OutputGroupId {
        let id = OutputGroupId(self.next_group);
        self.next_group += 1;
        id
    }

    fn source_by_name(&self, name: &str) -> Option<&DataSource> {
        self.sources.iter().find(|source| source.name() == Some(name))
    }

    fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    #[expect(
        clippy::indexing_slicing,
        reason = "the index was either found in or just pushed onto the vector"
    )]
    fn get_or_create_target(&mut self, group: OutputGroupId, name: &str) -> &mut DataTarget {
        let position = self
            .pending
            .iter()
            .position(|(id, target)| *id == group && target.name() == name);
        let index = position.unwrap_or_else(|| {
            self.pending.push((group, DataTarget::new(name)));
            self.pending.len() - 1
        });
        &mut self.pending[index].1
    }

    fn promote(&mut self, group: OutputGroupId) {
        let (promoted, retained): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(id, _)| *id == group);
        self.pending = retained;
        self.visible
            .extend(promoted.into_iter().map(|(_, target)| target));
    }
}
