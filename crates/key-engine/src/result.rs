//! Result protocol: the outcome of processing one key.
//!
//! A key is either "not ours" (`Unknown`, pass through to the host's
//! default handling) or it produced an [`Executable`]. With the synchronous
//! strategy the engine runs the steps itself before returning; with the
//! speculative strategy the `Executable` carries an isolated snapshot of
//! the state machine and commits nothing until invoked. Discarding it is
//! the entire cancellation mechanism.

use key_events::KeyEvent;
use tracing::warn;

use crate::error::EngineError;
use crate::host::EditorHost;
use crate::state::EngineState;

/// One deferred execution step, accumulated during determination and run in
/// order at commit time.
pub(crate) type ExecStep =
    Box<dyn FnOnce(&mut EngineState, &mut EditorHost<'_>) -> Result<(), EngineError> + Send>;

/// Outcome of a speculative determination.
pub enum KeyProcessResult {
    /// No consumer accepted the key; pass it to the host's default
    /// handling. Carries no steps and committed nothing.
    Unknown,
    Executable(Executable),
}

impl KeyProcessResult {
    pub fn is_unknown(&self) -> bool {
        matches!(self, KeyProcessResult::Unknown)
    }
}

/// Outcome of a synchronous `process_key` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyHandled {
    /// Pass the key to the host's default handling.
    Unknown,
    Handled {
        /// Typed keys orphaned by an aborted mapping match that the engine
        /// has no built-in for; the host should apply its default handling
        /// to them in order (e.g. insert them as text).
        passthrough: Vec<KeyEvent>,
    },
}

/// A determined-but-uncommitted key: snapshot of the state machine after
/// the key was (speculatively) consumed, plus the execution steps it
/// produced.
pub struct Executable {
    snapshot: EngineState,
    base_revision: u64,
    steps: Vec<ExecStep>,
    passthrough: Vec<KeyEvent>,
}

impl Executable {
    pub(crate) fn new(
        snapshot: EngineState,
        base_revision: u64,
        steps: Vec<ExecStep>,
        passthrough: Vec<KeyEvent>,
    ) -> Self {
        Self {
            snapshot,
            base_revision,
            steps,
            passthrough,
        }
    }

    /// Keys the host should handle itself once this result is committed.
    pub fn passthrough(&self) -> &[KeyEvent] {
        &self.passthrough
    }

    /// Commit: install the snapshot as the live state and run the steps.
    /// If the live state was altered since determination this logs a
    /// warning and proceeds best-effort with the snapshot.
    pub fn invoke(
        self,
        state: &mut EngineState,
        host: &mut EditorHost<'_>,
    ) -> Result<(), EngineError> {
        if state.revision != self.base_revision {
            warn!(
                target: "engine.exec",
                live = state.revision,
                determined_at = self.base_revision,
                "live state changed since determination, committing snapshot anyway"
            );
        }
        *state = self.snapshot;
        host.status.clear_error();
        run_steps(self.steps, state, host)
    }
}

/// Run accumulated steps in order. The first failure stops later steps and
/// is surfaced on the status line; the on-finish cleanup (expansion flag,
/// revision bump, status refresh) runs on every exit path.
pub(crate) fn run_steps(
    steps: Vec<ExecStep>,
    state: &mut EngineState,
    host: &mut EditorHost<'_>,
) -> Result<(), EngineError> {
    let mut failure = None;
    for step in steps {
        if let Err(error) = step(state, host) {
            tracing::debug!(target: "engine.exec", %error, "execution step failed");
            host.status.show_error(&error);
            failure = Some(error);
            break;
        }
    }
    // Cleanup runs even when a step failed.
    state.mapping.expanding = false;
    state.revision = state.revision.wrapping_add(1);
    host.status.update();
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
