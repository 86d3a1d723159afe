//! Consumer pipeline: each key is offered to a fixed-priority list of
//! independent consumers; the first to accept it stops the pipeline.
//!
//! Priority order (argument capture must outrank count accumulation so that
//! `f5` captures `5` as the find target, not a count):
//! 1. character-argument capture
//! 2. digraph entry
//! 3. register-name capture (the designator after `"`)
//! 4. escape housekeeping (cancel pending input)
//! 5. numeric count accumulation
//! 6. register-prefix shorthand (`"`)
//! 7. operator doubling (linewise `dd` / `yy` / `cc`)
//! 8. the command/mapping matcher
//!
//! Consumers mutate only the [`EngineState`] they are handed; host side
//! effects are expressed as [`Effect`]s the engine turns into deferred
//! execution steps. The count, register, and operator-double consumers
//! stand down while a mapping prefix is buffering so mapped sequences see
//! raw keys.

use std::collections::HashMap;

use key_events::{KeyCode, KeyEvent};
use tracing::trace;

use crate::builder::{BuilderState, PendingOperator};
use crate::command::{
    Argument, ArgumentKind, CommandDescriptor, CommandFlags, CommandKind, MappingMode,
    ResolvedCommand,
};
use crate::error::EngineError;
use crate::mapping::{MappingMatch, MappingTable};
use crate::state::EngineState;
use crate::trie::{KeyTrie, ROOT};

/// Borrowed engine tables handed to each consumer.
pub(crate) struct EngineCx<'a> {
    pub tries: &'a HashMap<MappingMode, KeyTrie>,
    pub mappings: &'a MappingTable,
}

/// Where a queued key came from. Only typed keys are macro-recorded;
/// replayed keys nobody accepts become pass-through for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyOrigin {
    Typed,
    Expanded,
    Replayed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct QueuedKey {
    pub key: KeyEvent,
    /// Mapping-expansion depth: 0 for the typed key, parent + 1 for keys an
    /// expansion produced.
    pub depth: u32,
    pub origin: KeyOrigin,
    /// Whether user mappings may apply to this key.
    pub allow_map: bool,
}

/// What a successful consumption asks the engine to do next.
pub(crate) enum Effect {
    /// State was mutated; nothing further.
    None,
    /// Builder reached `Ready`; execute this command at commit time.
    Ready(ResolvedCommand),
    /// A mapping matched exactly; feed its replacement keys back through.
    Expand { keys: Vec<KeyEvent>, recursive: bool },
    /// A buffered mapping prefix fell through; replay the buffered keys
    /// (mapping-disabled) ahead of the key that broke the match.
    Replay { prefix: Vec<KeyEvent>, last: KeyEvent },
    /// Forward a register selection to the host at commit time.
    SelectRegister(char),
    /// Undo a forwarded register selection: the sequence it belonged to was
    /// cancelled before any command consumed it.
    ResetRegister,
    /// Invalid continuation; surface the error and reset.
    Fail(EngineError),
}

pub(crate) trait KeyConsumer: Sync {
    fn name(&self) -> &'static str;
    fn consume(
        &self,
        cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect>;
}

pub(crate) static CONSUMERS: &[&dyn KeyConsumer] = &[
    &CharArgumentConsumer,
    &DigraphConsumer,
    &RegisterNameConsumer,
    &EscapeConsumer,
    &CountConsumer,
    &RegisterPrefixConsumer,
    &OperatorDoubleConsumer,
    &CommandMatcherConsumer,
];

fn is_plain(key: &KeyEvent, code: KeyCode) -> bool {
    key.code == code && key.mods.is_empty()
}

fn plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if key.mods.is_empty() => Some(c),
        _ => None,
    }
}

/// Cancel the pending command. If a register selection already reached the
/// host it has to be undone there too, or the store stays on the selected
/// register while the builder forgets it.
fn cancel(state: &mut EngineState) -> Effect {
    let selected = state.builder.register.is_some();
    state.reset_to_root();
    if selected {
        Effect::ResetRegister
    } else {
        Effect::None
    }
}

// -------------------------------------------------------------------------------------------------
// Argument capture
// -------------------------------------------------------------------------------------------------

/// Captures the literal character argument of a terminal such as `f` or
/// `r`. Esc cancels the whole pending command.
struct CharArgumentConsumer;

impl KeyConsumer for CharArgumentConsumer {
    fn name(&self) -> &'static str {
        "char_argument"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if state.builder.awaiting() != Some(ArgumentKind::Character) {
            return None;
        }
        if is_plain(&item.key, KeyCode::Esc) {
            return Some(cancel(state));
        }
        if let Some(c) = plain_char(&item.key) {
            let descriptor = state.builder.pending_terminal.take()?;
            return Some(finish(state, descriptor, Argument::Character(c)));
        }
        Some(Effect::Fail(bad_command(state, item.key)))
    }
}

/// Captures the two characters naming a digraph.
struct DigraphConsumer;

impl KeyConsumer for DigraphConsumer {
    fn name(&self) -> &'static str {
        "digraph"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if state.builder.awaiting() != Some(ArgumentKind::Digraph) {
            return None;
        }
        if is_plain(&item.key, KeyCode::Esc) {
            return Some(cancel(state));
        }
        let Some(c) = plain_char(&item.key) else {
            return Some(Effect::Fail(bad_command(state, item.key)));
        };
        match state.builder.digraph_first {
            None => {
                state.builder.digraph_first = Some(c);
                Some(Effect::None)
            }
            Some(first) => {
                state.builder.digraph_first = None;
                let descriptor = state.builder.pending_terminal.take()?;
                Some(finish(
                    state,
                    descriptor,
                    Argument::Digraph { first, second: c },
                ))
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Registers
// -------------------------------------------------------------------------------------------------

/// Captures the register designator following `"`.
struct RegisterNameConsumer;

impl KeyConsumer for RegisterNameConsumer {
    fn name(&self) -> &'static str {
        "register_name"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if !state.builder.awaiting_register {
            return None;
        }
        if is_plain(&item.key, KeyCode::Esc) {
            return Some(cancel(state));
        }
        state.builder.awaiting_register = false;
        match plain_char(&item.key) {
            Some(c) if c.is_ascii_alphanumeric() || c == '"' => {
                state.builder.register = Some(c);
                state.builder.note_progress();
                Some(Effect::SelectRegister(c))
            }
            _ => Some(Effect::Fail(bad_command(state, item.key))),
        }
    }
}

/// `"` in Normal/Visual mode begins register selection.
struct RegisterPrefixConsumer;

impl KeyConsumer for RegisterPrefixConsumer {
    fn name(&self) -> &'static str {
        "register_prefix"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if !matches!(
            state.mapping_mode(),
            MappingMode::Normal | MappingMode::Visual
        ) {
            return None;
        }
        if state.mapping.is_pending() || !state.builder.keys.is_empty() {
            return None;
        }
        if plain_char(&item.key) != Some('"') {
            return None;
        }
        // An earlier selection is kept until the new designator arrives, so
        // a cancelled re-selection can still undo it host-side.
        state.builder.awaiting_register = true;
        state.builder.note_progress();
        Some(Effect::None)
    }
}

// -------------------------------------------------------------------------------------------------
// Housekeeping and counts
// -------------------------------------------------------------------------------------------------

/// Esc with a partial command pending cancels it. A plain Esc with nothing
/// pending falls through to the matcher (it may be a real command, e.g.
/// leaving insert mode).
struct EscapeConsumer;

impl KeyConsumer for EscapeConsumer {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if !is_plain(&item.key, KeyCode::Esc) {
            return None;
        }
        // A buffered mapping prefix is the matcher's to abort (its keys
        // must replay, not vanish).
        if state.mapping.is_pending() {
            return None;
        }
        if state.builder.state == BuilderState::InProgress {
            return Some(cancel(state));
        }
        None
    }
}

/// Accumulates count digits in Normal/Visual/operator-pending modes. A
/// leading `0` is not a count (it is the line-start motion) and digits are
/// left to the matcher while a mapping prefix is buffering.
struct CountConsumer;

impl KeyConsumer for CountConsumer {
    fn name(&self) -> &'static str {
        "count"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if !matches!(
            state.mapping_mode(),
            MappingMode::Normal | MappingMode::Visual | MappingMode::OpPending
        ) {
            return None;
        }
        if state.mapping.is_pending() || !state.builder.keys.is_empty() {
            return None;
        }
        let digit = plain_char(&item.key).and_then(|c| c.to_digit(10))?;
        let slot_started = if state.builder.pending_operator.is_some() {
            state.builder.post_op_count.is_some()
        } else {
            state.builder.count.is_some()
        };
        if digit == 0 && !slot_started {
            return None;
        }
        state.builder.push_count_digit(digit);
        Some(Effect::None)
    }
}

/// Pressing a pending operator's own key applies it linewise (`dd`).
struct OperatorDoubleConsumer;

impl KeyConsumer for OperatorDoubleConsumer {
    fn name(&self) -> &'static str {
        "operator_double"
    }

    fn consume(
        &self,
        _cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        if state.mapping.is_pending() || !state.builder.keys.is_empty() {
            return None;
        }
        let doubled = state
            .builder
            .pending_operator
            .as_ref()
            .is_some_and(|op| op.keys.len() == 1 && op.keys[0] == item.key);
        if !doubled {
            return None;
        }
        let op = state.builder.pending_operator.take()?;
        let mut cmd = ResolvedCommand::from_descriptor(&op.command, Argument::None);
        cmd.count = state.builder.total_count();
        cmd.register = state.builder.register.take();
        cmd.flags |= CommandFlags::LINEWISE;
        state.builder.state = BuilderState::Ready;
        Some(Effect::Ready(cmd))
    }
}

// -------------------------------------------------------------------------------------------------
// The matcher
// -------------------------------------------------------------------------------------------------

/// The primary consumer: user mappings first (exact match expands, strict
/// prefix waits, a broken prefix replays), then the built-in key trie.
struct CommandMatcherConsumer;

impl KeyConsumer for CommandMatcherConsumer {
    fn name(&self) -> &'static str {
        "matcher"
    }

    fn consume(
        &self,
        cx: &EngineCx<'_>,
        state: &mut EngineState,
        item: &QueuedKey,
    ) -> Option<Effect> {
        let mode = state.mapping_mode();

        if item.allow_map {
            let mut pending = state.mapping.keys.clone();
            pending.push(item.key);
            match cx.mappings.lookup(mode, &pending) {
                MappingMatch::Exact(mapping) => {
                    trace!(
                        target: "engine.map",
                        from = %key_events::keys_to_string(&mapping.from),
                        to = %key_events::keys_to_string(&mapping.to),
                        "mapping matched"
                    );
                    state.mapping.keys.clear();
                    return Some(Effect::Expand {
                        keys: mapping.to.clone(),
                        recursive: mapping.recursive,
                    });
                }
                MappingMatch::Prefix => {
                    // Buffer without touching the builder; the mapping
                    // state alone tracks this kind of pendingness.
                    state.mapping.keys = pending;
                    return Some(Effect::None);
                }
                MappingMatch::None => {
                    if state.mapping.is_pending() {
                        let prefix = std::mem::take(&mut state.mapping.keys);
                        return Some(Effect::Replay {
                            prefix,
                            last: item.key,
                        });
                    }
                }
            }
        }

        let trie = cx.tries.get(&mode)?;
        match trie.step(state.builder.cursor, &item.key) {
            Some(node) => {
                state.builder.keys.push(item.key);
                trace!(target: "engine.pipeline", key = %item.key, node, "trie advance");
                match trie.terminal(node) {
                    Some(descriptor) => {
                        let descriptor = descriptor.clone();
                        state.builder.cursor = ROOT;
                        if descriptor.argument != ArgumentKind::None {
                            state.builder.pending_terminal = Some(descriptor);
                            state.builder.note_progress();
                            Some(Effect::None)
                        } else {
                            Some(finish(state, descriptor, Argument::None))
                        }
                    }
                    None => {
                        state.builder.cursor = node;
                        state.builder.note_progress();
                        Some(Effect::None)
                    }
                }
            }
            None => {
                // Mid-walk or operator-pending: an invalid continuation.
                // At the root with nothing pending the key is simply not
                // ours.
                if state.builder.cursor != ROOT || state.builder.pending_operator.is_some() {
                    Some(Effect::Fail(bad_command(state, item.key)))
                } else {
                    None
                }
            }
        }
    }
}

/// Complete a terminal: become the pending operator, compose with one, or
/// resolve standalone.
fn finish(state: &mut EngineState, descriptor: CommandDescriptor, argument: Argument) -> Effect {
    let trigger = std::mem::take(&mut state.builder.keys);

    if descriptor.kind == CommandKind::Operator && state.builder.pending_operator.is_none() {
        state.builder.pending_operator = Some(PendingOperator {
            command: descriptor,
            keys: trigger,
        });
        state.builder.cursor = ROOT;
        state.builder.note_progress();
        return Effect::None;
    }

    // Flagged commands resolve on their own even mid-operator (scrolling
    // during operator-pending, say); the executor preserves the operator
    // and the accumulated counts around them.
    if descriptor.flags.contains(CommandFlags::KEEP_OP_PENDING) {
        let cmd = ResolvedCommand::from_descriptor(&descriptor, argument);
        state.builder.state = BuilderState::Ready;
        return Effect::Ready(cmd);
    }

    if let Some(op) = state.builder.pending_operator.take() {
        if !descriptor.flags.contains(CommandFlags::MOTION) {
            // An operator's argument must be a motion.
            return Effect::Fail(EngineError::BadCommand { keys: trigger });
        }
        let motion = ResolvedCommand::from_descriptor(&descriptor, argument);
        let mut cmd =
            ResolvedCommand::from_descriptor(&op.command, Argument::Motion(Box::new(motion)));
        cmd.count = state.builder.total_count();
        cmd.register = state.builder.register.take();
        state.builder.state = BuilderState::Ready;
        return Effect::Ready(cmd);
    }

    let mut cmd = ResolvedCommand::from_descriptor(&descriptor, argument);
    cmd.count = state.builder.total_count();
    cmd.register = state.builder.register.take();
    state.builder.state = BuilderState::Ready;
    Effect::Ready(cmd)
}

fn bad_command(state: &EngineState, key: KeyEvent) -> EngineError {
    let mut keys = state.builder.keys.clone();
    keys.push(key);
    EngineError::BadCommand { keys }
}
