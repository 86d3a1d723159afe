//! Engine error taxonomy.
//!
//! Everything here is locally recovered: the worst observable effect of any
//! variant is a reset to root state plus a user-visible message. An unknown
//! key is not an error at all; it is the `Unknown` result variant.

use key_events::KeyEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An accepted key led to a sequence with no valid continuation.
    #[error("not a command: {}", key_events::keys_to_string(.keys))]
    BadCommand { keys: Vec<KeyEvent> },

    /// Mapping expansion exceeded the configured depth bound.
    #[error("mapping recursion limit exceeded (maxmapdepth = {max_depth})")]
    RecursionOverflow { max_depth: u32 },

    /// A write-class command was attempted against a non-writable target.
    /// The action registry is never invoked in this case.
    #[error("target is read-only")]
    ReadOnlyTarget,

    /// The action registry reported a failure executing a resolved command.
    #[error("action `{id}` failed")]
    Action {
        id: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
