//! End-to-end invocation surface: resolve, execute, assemble outputs.
//!
//! The [`Dispatcher`] is what the transport layer calls once it has framed
//! an invocation request off the wire: it looks up the targeted handler's
//! overload candidates, builds the invocation-scoped binding store from the
//! inbound payloads, resolves and executes a call plan, and renders every
//! promoted target, the return slot included, back into outbound payloads
//! in creation order.
//!
//! Each invocation owns its own store, so concurrent dispatch calls on a
//! shared `Dispatcher` need no locking; the registry behind it is read-only
//! after startup.

use std::sync::Arc;

use conduit_wire_types::NamedPayload;
use tracing::debug;

use crate::binding::InvocationStore;
use crate::broker::{HandlerRegistry, OverloadResolver, execute};
use crate::error::DispatchError;

/// Tracing target for invocation dispatch.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatcher");

/// Routes one invocation through resolution, execution, and outbound
/// assembly.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a finalised registry.
    #[must_use]
    pub const fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatches one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownHandler`] when the id is not
    /// registered, [`DispatchError::Unresolvable`] when no candidate fully
    /// binds (no handler executes, no outputs are produced), or
    /// [`DispatchError::HandlerFailed`] when the chosen handler reports a
    /// fault.
    pub fn dispatch(
        &self,
        handler_id: &str,
        payloads: Vec<NamedPayload>,
    ) -> Result<Vec<NamedPayload>, DispatchError> {
        let candidates = self
            .registry
            .candidates(handler_id)
            .ok_or_else(|| DispatchError::UnknownHandler {
                name: handler_id.to_owned(),
            })?;
        debug!(
            target: DISPATCH_TARGET,
            handler = handler_id,
            payloads = payloads.len(),
            candidates = candidates.len(),
            "dispatching invocation"
        );

        let resolver = OverloadResolver::new(candidates.to_vec());
        let mut store = InvocationStore::new(payloads);
        let plan = resolver.resolve(&mut store)?;
        execute(plan, &mut store)?;

        let outputs = store.render_outputs();
        debug!(
            target: DISPATCH_TARGET,
            handler = handler_id,
            outputs = outputs.len(),
            "invocation complete"
        );
        Ok(outputs)
    }
}
