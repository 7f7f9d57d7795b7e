//! Handler signatures, the candidate registry, and overload resolution.
//!
//! A handler registers a [`HandlerSignature`] (its ordered parameter
//! descriptors and return shape) together with a callable. For one
//! invocation, the [`OverloadResolver`] walks each candidate's declared
//! parameters against the invocation's [`BindingCatalog`], binding inputs
//! through the conversion ladder and reserving output targets, and produces
//! a [`CallPlan`] for the first candidate that fully binds. Partial plans
//! are never returned: a candidate either binds every parameter or
//! contributes nothing, and only the chosen candidate's output group is
//! ever promoted.
//!
//! Signatures are built once at registration time and shared across
//! concurrent invocations via `Arc`; the registry is read-only after
//! startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binding::{BindingCatalog, InvocationStore, OutputGroupId, RETURN_NAME};
use crate::error::{DispatchError, HandlerFault};
use crate::value::{RuntimeValue, ValueShape};

/// Tracing target for resolution and execution.
pub(crate) const BROKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::broker");

/// How a declared parameter binds to invocation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamBinding {
    /// Inbound value, bound by name when one is declared, else by shape.
    Input,
    /// Inbound collection, always bound by name through the list path.
    InputList,
    /// First-class output slot, materialised as a data target.
    Output,
}

/// One declared parameter of a handler signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: Option<String>,
    shape: ValueShape,
    binding: ParamBinding,
}

impl ParamDescriptor {
    /// An input parameter bound by declared name.
    #[must_use]
    pub fn named(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: Some(name.into()),
            shape,
            binding: ParamBinding::Input,
        }
    }

    /// An input parameter with no declared name, bound positionally by
    /// shape against the full source set.
    #[must_use]
    pub const fn positional(shape: ValueShape) -> Self {
        Self {
            name: None,
            shape,
            binding: ParamBinding::Input,
        }
    }

    /// A collection input parameter; collection parameters always require a
    /// declared name.
    #[must_use]
    pub fn list(name: impl Into<String>, element: ValueShape) -> Self {
        Self {
            name: Some(name.into()),
            shape: ValueShape::list(element),
            binding: ParamBinding::InputList,
        }
    }

    /// An output parameter with the declared binding name.
    #[must_use]
    pub fn output(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: Some(name.into()),
            shape,
            binding: ParamBinding::Output,
        }
    }

    /// Returns the declared binding name, when present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the declared shape.
    #[must_use]
    pub const fn shape(&self) -> &ValueShape {
        &self.shape
    }

    /// Returns how the parameter binds.
    #[must_use]
    pub const fn binding(&self) -> ParamBinding {
        self.binding
    }
}

/// Immutable description of one registered handler overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSignature {
    params: Vec<ParamDescriptor>,
    return_shape: Option<ValueShape>,
}

impl HandlerSignature {
    /// Creates a signature; `return_shape` of `None` declares a void
    /// handler.
    #[must_use]
    pub const fn new(params: Vec<ParamDescriptor>, return_shape: Option<ValueShape>) -> Self {
        Self {
            params,
            return_shape,
        }
    }

    /// Returns the declared parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Returns the declared return shape, `None` for void.
    #[must_use]
    pub const fn return_shape(&self) -> Option<&ValueShape> {
        self.return_shape.as_ref()
    }
}

/// The callable seam: user handler code boxed behind a shared closure.
pub type HandlerFn =
    dyn Fn(&mut HandlerCall) -> Result<Option<RuntimeValue>, HandlerFault> + Send + Sync;

/// A registered overload: one signature plus its callable.
#[derive(Clone)]
pub struct HandlerCandidate {
    signature: HandlerSignature,
    callable: Arc<HandlerFn>,
}

impl HandlerCandidate {
    /// Creates a candidate from a signature and a callable.
    pub fn new<F>(signature: HandlerSignature, callable: F) -> Self
    where
        F: Fn(&mut HandlerCall) -> Result<Option<RuntimeValue>, HandlerFault>
            + Send
            + Sync
            + 'static,
    {
        Self {
            signature,
            callable: Arc::new(callable),
        }
    }

    /// Returns the candidate's signature.
    #[must_use]
    pub const fn signature(&self) -> &HandlerSignature {
        &self.signature
    }
}

impl fmt::Debug for HandlerCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCandidate")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Registry mapping a stable handler id to its overload candidates.
///
/// Populated once at startup; shared read-only across concurrent
/// invocations via `Arc`.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<Arc<HandlerCandidate>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a candidate under the handler id. Registering the same id
    /// again appends an overload.
    pub fn register(&mut self, id: impl Into<String>, candidate: HandlerCandidate) {
        self.handlers
            .entry(id.into())
            .or_default()
            .push(Arc::new(candidate));
    }

    /// Returns the candidate list for a handler id.
    #[must_use]
    pub fn candidates(&self, id: &str) -> Option<&[Arc<HandlerCandidate>]> {
        self.handlers.get(id).map(Vec::as_slice)
    }

    /// Returns `true` when the handler id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Returns the number of registered handler ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// One bound argument of a call plan, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArgument {
    /// A resolved input value.
    Input(RuntimeValue),
    /// A reserved output slot, named by its binding.
    OutputSlot(String),
}

/// The resolver's product: one chosen candidate, fully bound.
///
/// Built once per invocation and consumed exactly once by [`execute`].
#[derive(Debug, Clone)]
pub struct CallPlan {
    candidate: Arc<HandlerCandidate>,
    arguments: Vec<BoundArgument>,
    group: OutputGroupId,
    has_return: bool,
}

impl CallPlan {
    /// Returns the chosen candidate.
    #[must_use]
    pub const fn candidate(&self) -> &Arc<HandlerCandidate> {
        &self.candidate
    }

    /// Returns the bound arguments, in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[BoundArgument] {
        &self.arguments
    }

    /// Returns the output group reserved for this plan.
    #[must_use]
    pub const fn group(&self) -> OutputGroupId {
        self.group
    }

    /// Returns `true` when a return slot was reserved.
    #[must_use]
    pub const fn has_return(&self) -> bool {
        self.has_return
    }
}

/// Picks one handler candidate for an invocation and binds its parameters.
#[derive(Debug, Clone)]
pub struct OverloadResolver {
    candidates: Vec<Arc<HandlerCandidate>>,
}

impl OverloadResolver {
    /// Creates a resolver over a candidate list.
    #[must_use]
    pub const fn new(candidates: Vec<Arc<HandlerCandidate>>) -> Self {
        Self { candidates }
    }

    /// Returns `true` when at least one candidate is registered.
    #[must_use]
    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Returns `true` when more than one candidate is registered.
    #[must_use]
    pub fn has_multiple_candidates(&self) -> bool {
        self.candidates.len() > 1
    }

    /// Resolves the invocation to a call plan.
    ///
    /// Candidates are tried in registration order; the first that fully
    /// binds wins and its output group is promoted atomically. A candidate
    /// that fails to bind any parameter contributes nothing: its tentative
    /// targets stay unpromoted and internal conversion failures are never
    /// propagated.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unresolvable`] when no candidate fully
    /// binds, or [`DispatchError::NoCandidates`] for an empty candidate
    /// list.
    pub fn resolve(&self, catalog: &mut dyn BindingCatalog) -> Result<CallPlan, DispatchError> {
        if self.candidates.is_empty() {
            return Err(DispatchError::NoCandidates);
        }
        if self.has_multiple_candidates() {
            warn!(
                target: BROKER_TARGET,
                count = self.candidates.len(),
                "multiple overload candidates registered; first full bind wins"
            );
        }
        for (index, candidate) in self.candidates.iter().enumerate() {
            if let Some(plan) = try_bind(candidate, catalog) {
                catalog.promote(plan.group());
                debug!(
                    target: BROKER_TARGET,
                    candidate = index,
                    arguments = plan.arguments().len(),
                    "candidate fully bound"
                );
                return Ok(plan);
            }
        }
        Err(DispatchError::Unresolvable {
            candidates: self.candidates.len(),
        })
    }
}

/// Attempts to bind every declared parameter of one candidate.
///
/// Any failure aborts the whole candidate: a parameter with no matching
/// payload, or malformed metadata such as an output or collection parameter
/// without a declared name.
fn try_bind(
    candidate: &Arc<HandlerCandidate>,
    catalog: &mut dyn BindingCatalog,
) -> Option<CallPlan> {
    let signature = candidate.signature();
    let group = catalog.allocate_group();
    let mut arguments = Vec::with_capacity(signature.params().len());
    for param in signature.params() {
        let argument = bind_param(param, catalog, group)?;
        arguments.push(argument);
    }
    let has_return = signature.return_shape().is_some();
    if has_return {
        catalog.get_or_create_target(group, RETURN_NAME);
    }
    Some(CallPlan {
        candidate: Arc::clone(candidate),
        arguments,
        group,
        has_return,
    })
}

fn bind_param(
    param: &ParamDescriptor,
    catalog: &mut dyn BindingCatalog,
    group: OutputGroupId,
) -> Option<BoundArgument> {
    match param.binding() {
        ParamBinding::Output => {
            let name = param.name()?;
            catalog.get_or_create_target(group, name);
            Some(BoundArgument::OutputSlot(name.to_owned()))
        }
        ParamBinding::InputList => {
            let name = param.name()?;
            let element = param.shape().element()?;
            let bound = catalog.source_by_name(name)?.resolve_as_list(element)?;
            Some(BoundArgument::Input(bound.into_value()))
        }
        ParamBinding::Input => {
            let bound = match param.name() {
                Some(name) => catalog.resolve_by_name(name, param.shape())?,
                None => catalog
                    .sources()
                    .iter()
                    .find_map(|source| source.resolve_by_shape(param.shape()))?,
            };
            Some(BoundArgument::Input(bound.into_value()))
        }
    }
}

/// The handler-facing view of one bound invocation.
///
/// Input arguments are addressed by declaration position (`None` at output
/// positions); declared output bindings are written through
/// [`set_output`](Self::set_output).
#[derive(Debug)]
pub struct HandlerCall {
    arguments: Vec<Option<RuntimeValue>>,
    output_names: Vec<String>,
    outputs: Vec<(String, RuntimeValue)>,
}

impl HandlerCall {
    fn from_plan(arguments: Vec<BoundArgument>) -> Self {
        let mut output_names = Vec::new();
        let positional = arguments
            .into_iter()
            .map(|argument| match argument {
                BoundArgument::Input(value) => Some(value),
                BoundArgument::OutputSlot(name) => {
                    output_names.push(name);
                    None
                }
            })
            .collect();
        Self {
            arguments: positional,
            output_names,
            outputs: Vec::new(),
        }
    }

    /// Returns the bound input at the declaration position, `None` for
    /// output positions or out-of-range indexes.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&RuntimeValue> {
        self.arguments.get(index).and_then(Option::as_ref)
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the declared output binding names.
    #[must_use]
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Records a value for a declared output binding.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] when the signature declares no output
    /// binding with that name.
    pub fn set_output(
        &mut self,
        name: impl Into<String>,
        value: RuntimeValue,
    ) -> Result<(), HandlerFault> {
        let owned = name.into();
        if !self.output_names.iter().any(|known| *known == owned) {
            return Err(HandlerFault::new(format!(
                "no declared output binding named '{owned}'"
            )));
        }
        self.outputs.push((owned, value));
        Ok(())
    }
}

/// Executes a resolved call plan against the invocation store.
///
/// Builds the handler-facing call, invokes the callable, writes the
/// handler's output values into the promoted targets, and fills the return
/// slot when the signature declares one.
///
/// # Errors
///
/// Returns [`DispatchError::HandlerFailed`] when the callable reports a
/// fault; binding state is left as promoted, with unfilled targets
/// rendering the empty-document sentinel.
pub fn execute(plan: CallPlan, store: &mut InvocationStore) -> Result<(), DispatchError> {
    let CallPlan {
        candidate,
        arguments,
        has_return,
        ..
    } = plan;
    let mut call = HandlerCall::from_plan(arguments);
    let returned = (candidate.callable)(&mut call)
        .map_err(|fault| DispatchError::HandlerFailed { fault })?;
    for (name, value) in call.outputs {
        if let Some(target) = store.visible_target_mut(&name) {
            target.set_value(value);
        }
    }
    if has_return {
        if let Some(value) = returned {
            if let Some(target) = store.visible_target_mut(RETURN_NAME) {
                target.set_value(value);
            }
        }
    }
    Ok(())
}
