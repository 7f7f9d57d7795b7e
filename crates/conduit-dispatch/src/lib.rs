//! In-process dispatch core bridging a host orchestrator to registered
//! handlers.
//!
//! The host delivers each invocation as a bag of named, typed payloads
//! ([`conduit_wire_types::NamedPayload`]). This crate selects which
//! registered handler the request targets, converts each payload into the
//! exact parameter values the handler declares, invokes it, and converts the
//! return value and declared outputs back into wire payloads.
//!
//! Two subsystems carry the interesting logic:
//!
//! - the **graded conversion engine** ([`convert`]): a ranked ladder of
//!   matching strategies (name match, type assignment, strict conversion,
//!   relaxed structural coercion) tried in fixed order, stopping at the
//!   first success;
//! - the **overload resolver** ([`broker`]): walks a candidate signature's
//!   declared parameters against the invocation's binding catalog, treating
//!   output bindings as first-class slots and collection bindings through a
//!   dedicated document-list path, and only ever promotes the outputs of the
//!   candidate that fully binds.
//!
//! The transport/streaming session, handler metadata discovery, and process
//! lifecycle are external collaborators; this crate performs no I/O and
//! never blocks.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use conduit_dispatch::broker::{HandlerCandidate, HandlerRegistry, HandlerSignature, ParamDescriptor};
//! use conduit_dispatch::dispatcher::Dispatcher;
//! use conduit_dispatch::value::ValueShape;
//! use conduit_wire_types::{NamedPayload, WireValue};
//!
//! let mut registry = HandlerRegistry::new();
//! let signature = HandlerSignature::new(
//!     vec![ParamDescriptor::named("message", ValueShape::Text)],
//!     Some(ValueShape::Text),
//! );
//! registry.register(
//!     "echo",
//!     HandlerCandidate::new(signature, |call| Ok(call.argument(0).cloned())),
//! );
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let outputs = dispatcher
//!     .dispatch(
//!         "echo",
//!         vec![NamedPayload::new("message", WireValue::string("hello"))],
//!     )
//!     .expect("dispatch succeeds");
//! assert_eq!(
//!     outputs,
//!     vec![NamedPayload::new("$return", WireValue::string("hello"))]
//! );
//! ```

pub mod binding;
pub mod broker;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::binding::{
    BindingCatalog, BoundValue, DataSource, DataTarget, InvocationStore, OutputGroupId,
    RETURN_NAME,
};
pub use self::broker::{
    BoundArgument, CallPlan, HandlerCall, HandlerCandidate, HandlerRegistry, HandlerSignature,
    OverloadResolver, ParamBinding, ParamDescriptor, execute,
};
pub use self::convert::MatchingLevel;
pub use self::dispatcher::Dispatcher;
pub use self::error::{DispatchError, HandlerFault};
pub use self::value::{RuntimeValue, ValueShape};
