//! Listener bookkeeping shared by every component that touches the page.
//!
//! Each binding records which handler was attached to which element for which
//! event, under a [`ScopeToken`]. Releasing a scope removes exactly the
//! bindings that were added under it, so a session can never leak a listener
//! into the next one.

/// Submodule for the listener registry implementation.
pub mod registry;
/// Submodule for element ids, event kinds and binding keys.
pub mod types;

pub use registry::ListenerRegistry;
pub use types::{BindingKey, ElementHost, ElementId, EventKind, ListenerBinding, ScopeToken, Viewport};
