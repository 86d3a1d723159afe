//! CommandBuilder: the incrementally filled representation of the command
//! currently being entered.
//!
//! State machine:
//! * `New` - no input yet for this command.
//! * `InProgress` - partial match: count and/or register captured, trie
//!   cursor at a branch node, or operator pending awaiting its motion.
//! * `Ready` - trie cursor reached a terminal with all arguments satisfied.
//! * `BadCommand` - terminal failure for this sequence; the next key starts
//!   fresh after a reset.
//!
//! Counts follow Vim's multiplicative rule: a prefix count before the
//! operator and a post-operator count multiply (`2d3w` deletes 6 words).
//! Both accumulate with saturating math clamped at 999_999.

use key_events::KeyEvent;

use crate::command::{ArgumentKind, CommandDescriptor};
use crate::trie::ROOT;

pub(crate) const COUNT_CAP: u32 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderState {
    #[default]
    New,
    InProgress,
    Ready,
    BadCommand,
}

/// Operator captured and awaiting its motion argument. The trigger keys are
/// kept so the doubled form (`dd`) can be recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperator {
    pub command: CommandDescriptor,
    pub(crate) keys: Vec<KeyEvent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuilder {
    pub state: BuilderState,
    /// Count typed before the operator (e.g. `12d`).
    pub count: Option<u32>,
    /// Count typed after the operator but before its motion (e.g. `d3w`).
    pub post_op_count: Option<u32>,
    pub register: Option<char>,
    pub(crate) awaiting_register: bool,
    pub pending_operator: Option<PendingOperator>,
    /// Trie cursor for the active mapping mode.
    pub(crate) cursor: usize,
    /// Keys consumed by the current trie walk.
    pub(crate) keys: Vec<KeyEvent>,
    /// Terminal reached but still awaiting a trailing argument.
    pub(crate) pending_terminal: Option<CommandDescriptor>,
    pub(crate) digraph_first: Option<char>,
}

impl CommandBuilder {
    /// Reset to the root state. Idempotent: resetting an already-root
    /// builder is a no-op.
    pub fn reset(&mut self) {
        *self = Self::default();
        debug_assert_eq!(self.cursor, ROOT);
    }

    pub(crate) fn note_progress(&mut self) {
        if self.state == BuilderState::New {
            self.state = BuilderState::InProgress;
        }
    }

    /// Accumulate one count digit, routed to the prefix or post-operator
    /// slot depending on whether an operator is pending.
    pub(crate) fn push_count_digit(&mut self, digit: u32) {
        let slot = if self.pending_operator.is_some() {
            &mut self.post_op_count
        } else {
            &mut self.count
        };
        let value = slot
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(digit)
            .min(COUNT_CAP);
        *slot = Some(value);
        self.note_progress();
    }

    /// Effective count: prefix and post-operator counts multiply, defaulting
    /// to one each.
    pub fn total_count(&self) -> u32 {
        self.count
            .unwrap_or(1)
            .saturating_mul(self.post_op_count.unwrap_or(1))
            .clamp(1, COUNT_CAP)
    }

    /// Argument kind the builder is currently waiting on, if any.
    pub(crate) fn awaiting(&self) -> Option<ArgumentKind> {
        self.pending_terminal
            .as_ref()
            .map(|d| d.argument)
            .filter(|k| *k != ArgumentKind::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandDescriptor;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_accumulates_and_clamps() {
        let mut b = CommandBuilder::default();
        b.push_count_digit(1);
        b.push_count_digit(2);
        assert_eq!(b.count, Some(12));
        assert_eq!(b.state, BuilderState::InProgress);
        for _ in 0..10 {
            b.push_count_digit(9);
        }
        assert_eq!(b.count, Some(COUNT_CAP));
    }

    #[test]
    fn counts_multiply_across_the_operator() {
        let mut b = CommandBuilder::default();
        b.push_count_digit(2);
        b.pending_operator = Some(PendingOperator {
            command: CommandDescriptor::operator("operator.delete"),
            keys: vec![key_events::KeyEvent::char('d')],
        });
        b.push_count_digit(3);
        assert_eq!(b.count, Some(2));
        assert_eq!(b.post_op_count, Some(3));
        assert_eq!(b.total_count(), 6);
    }

    #[test]
    fn total_count_defaults_to_one() {
        assert_eq!(CommandBuilder::default().total_count(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut b = CommandBuilder::default();
        b.push_count_digit(5);
        b.state = BuilderState::BadCommand;
        b.reset();
        let once = b.clone();
        b.reset();
        assert_eq!(b, once);
        assert_eq!(b, CommandBuilder::default());
    }
}
