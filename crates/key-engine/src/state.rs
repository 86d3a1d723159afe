//! Engine session state: the command builder, mapping match state, and the
//! persistent execution state (mode, return-to target, re-entrancy marker).
//!
//! The whole state derives `Clone` + `PartialEq` so the speculative builder
//! can snapshot it wholesale and tests can assert isolation byte for byte.
//! One `EngineState` is owned by one editing session; processing borrows it
//! mutably, which replaces the original design's mutex with a compile-time
//! exclusivity guarantee.

use crate::builder::{BuilderState, CommandBuilder};
use crate::command::{MappingMode, Mode};
use crate::mapping::MappingState;

/// State that persists across commands and is mutated only by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionState {
    pub mode: Mode,
    /// Mode to restore once a one-shot Normal-mode excursion completes.
    pub return_to: Option<Mode>,
    /// Command currently executing, for re-entrancy detection.
    pub executing: Option<&'static str>,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            return_to: None,
            executing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub builder: CommandBuilder,
    pub mapping: MappingState,
    pub execution: ExecutionState,
    /// Bumped after every committed key; lets a speculative result detect
    /// that the live state moved underneath it.
    pub(crate) revision: u64,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            builder: CommandBuilder::default(),
            mapping: MappingState::default(),
            execution: ExecutionState::default(),
            revision: 0,
        }
    }

    pub fn in_mode(mode: Mode) -> Self {
        let mut state = Self::new();
        state.execution.mode = mode;
        state
    }

    pub fn mode(&self) -> Mode {
        self.execution.mode
    }

    /// Mapping-mode classification for the current mode and builder.
    pub fn mapping_mode(&self) -> MappingMode {
        self.execution
            .mode
            .mapping_mode(self.builder.pending_operator.is_some())
    }

    /// Change mode. A mode change invalidates the trie cursor, so any
    /// partial command or mapping match is discarded.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.execution.mode != mode {
            self.execution.mode = mode;
            self.reset_to_root();
        }
    }

    /// Reset builder and mapping state to the root for the current mode.
    pub fn reset_to_root(&mut self) {
        self.builder.reset();
        self.mapping.reset();
    }

    pub(crate) fn is_at_root(&self) -> bool {
        self.builder == CommandBuilder::default() && !self.mapping.is_pending()
    }

    pub(crate) fn begin_key(&mut self) {
        // A key arriving after a completed or failed sequence starts fresh.
        if matches!(
            self.builder.state,
            BuilderState::Ready | BuilderState::BadCommand
        ) {
            self.reset_to_root();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mode_change_resets_partial_state() {
        let mut state = EngineState::new();
        state.builder.push_count_digit(4);
        state.set_mode(Mode::Insert);
        assert!(state.is_at_root());
        assert_eq!(state.mode(), Mode::Insert);
    }

    #[test]
    fn setting_same_mode_keeps_partial_state() {
        let mut state = EngineState::new();
        state.builder.push_count_digit(4);
        state.set_mode(Mode::Normal);
        assert_eq!(state.builder.count, Some(4));
    }

    #[test]
    fn reset_on_root_is_noop() {
        let mut state = EngineState::new();
        let before = state.clone();
        state.reset_to_root();
        assert_eq!(state, before);
    }
}
