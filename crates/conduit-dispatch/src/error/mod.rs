//! Domain errors surfaced by the dispatch core.
//!
//! "No match" during conversion and binding is control flow (`Option::None`),
//! never an error value; the only failures an invocation's caller can
//! observe are the variants below. All errors are `thiserror`-derived enums
//! with structured context.

use thiserror::Error;

/// Errors surfaced to the invocation's caller by resolution and execution.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The invocation targeted a handler id that is not registered.
    #[error("handler '{name}' is not registered")]
    UnknownHandler {
        /// Handler id that was looked up.
        name: String,
    },

    /// Resolution was attempted against an empty candidate list.
    #[error("no overload candidates registered")]
    NoCandidates,

    /// No candidate signature could bind all of its parameters. Nothing was
    /// executed and no outputs were promoted.
    #[error("no candidate could bind all parameters ({candidates} tried)")]
    Unresolvable {
        /// Number of candidate signatures that were tried.
        candidates: usize,
    },

    /// The chosen handler executed and returned a fault.
    #[error("handler execution failed: {fault}")]
    HandlerFailed {
        /// The fault reported by the handler.
        #[source]
        fault: HandlerFault,
    },
}

/// A fault reported by a handler callable.
///
/// Raised by user handler code, or by
/// [`HandlerCall::set_output`](crate::broker::HandlerCall::set_output) when
/// a handler writes to an output binding its signature never declared.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
}

impl HandlerFault {
    /// Creates a fault with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

#[cfg(test)]
mod tests;
