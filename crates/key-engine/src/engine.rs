//! The key engine: owns the per-mode command tries and the user mapping
//! table, and resolves keys into executable results.
//!
//! Two entry points share one determination core:
//! * [`KeyEngine::process_key`] - synchronous: determine and commit in one
//!   call against the live state.
//! * [`KeyEngine::determine`] - speculative: run the pipeline against a
//!   clone of the state and return an [`Executable`] the caller may invoke
//!   later or simply drop.
//!
//! Mapping expansion is a queue rather than recursion: each queued key
//! carries its expansion depth, and a key whose depth exceeds the
//! configured bound aborts the whole sequence with a recursion error. The
//! bound can never leak between keystrokes because the depth lives in the
//! queue, which is local to one determination.

use std::collections::{HashMap, VecDeque};

use key_events::{KeyEvent, parse_keys};
use tracing::{debug, trace, warn};

use crate::builder::BuilderState;
use crate::command::{CommandDescriptor, MappingMode};
use crate::consumers::{CONSUMERS, Effect, EngineCx, KeyOrigin, QueuedKey};
use crate::error::EngineError;
use crate::executor::execute_command;
use crate::host::EditorHost;
use crate::mapping::{Mapping, MappingTable};
use crate::result::{ExecStep, Executable, KeyHandled, KeyProcessResult};
use crate::state::EngineState;
use crate::trie::{KeyTrie, TrieError};

/// Tunables, typically sourced from the `[input]` config table.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Maximum mapping expansion depth before the sequence is aborted.
    pub max_map_depth: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { max_map_depth: 1000 }
    }
}

impl EngineOptions {
    pub fn from_config(config: &key_config::Config) -> Self {
        Self {
            max_map_depth: config.file.input.maxmapdepth,
        }
    }
}

pub struct KeyEngine {
    tries: HashMap<MappingMode, KeyTrie>,
    mappings: MappingTable,
    options: EngineOptions,
}

impl KeyEngine {
    /// An engine with no commands registered.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            tries: HashMap::new(),
            mappings: MappingTable::default(),
            options,
        }
    }

    /// An engine pre-populated with the built-in command table.
    pub fn with_defaults(options: EngineOptions) -> Self {
        let mut engine = Self::new(options);
        crate::builtin::install(&mut engine)
            .unwrap_or_else(|error| unreachable!("built-in table is conflict-free: {error}"));
        engine
    }

    /// Register `sequence` (in key notation, e.g. `"gg"` or `"<C-w>h"`) as
    /// the spelling of `command` in each of the given mapping modes.
    pub fn register_command(
        &mut self,
        modes: &[MappingMode],
        sequence: &str,
        command: CommandDescriptor,
    ) -> Result<(), TrieError> {
        let keys = parse_keys(sequence);
        for mode in modes {
            self.tries
                .entry(*mode)
                .or_insert_with(KeyTrie::new)
                .register(&keys, command.clone())?;
        }
        Ok(())
    }

    /// Add (or replace) a user mapping. `recursive` selects `map` versus
    /// `noremap` discipline for the produced keys.
    pub fn add_mapping(&mut self, mode: MappingMode, from: &str, to: &str, recursive: bool) {
        let from = parse_keys(from);
        if from.is_empty() {
            warn!(target: "engine.map", "ignoring mapping with empty source sequence");
            return;
        }
        let to = parse_keys(to);
        debug!(
            target: "engine.map",
            ?mode,
            from = %key_events::keys_to_string(&from),
            to = %key_events::keys_to_string(&to),
            recursive,
            "mapping added"
        );
        self.mappings.insert(mode, Mapping { from, to, recursive });
    }

    /// Remove a user mapping. Returns whether one existed.
    pub fn remove_mapping(&mut self, mode: MappingMode, from: &str) -> bool {
        self.mappings.remove(mode, &parse_keys(from))
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Synchronous strategy: determine and commit against the live state.
    /// Command failures are surfaced on the host status line; the key still
    /// counts as handled.
    pub fn process_key(
        &self,
        state: &mut EngineState,
        host: &mut EditorHost<'_>,
        key: KeyEvent,
    ) -> KeyHandled {
        match self.determine(state, key) {
            KeyProcessResult::Unknown => {
                // An unbound key aborts whatever was pending (a count with
                // no command, say) before the host takes it.
                if state.builder.register.is_some() {
                    host.registers.reset_to_default();
                }
                state.reset_to_root();
                KeyHandled::Unknown
            }
            KeyProcessResult::Executable(executable) => {
                let passthrough = executable.passthrough().to_vec();
                if let Err(error) = executable.invoke(state, host) {
                    debug!(target: "engine.exec", %error, "key handled with error");
                }
                KeyHandled::Handled { passthrough }
            }
        }
    }

    /// Speculative strategy: run the pipeline against a clone of `state`.
    /// `Unknown` means no consumer accepted the key and nothing was
    /// committed; otherwise the returned [`Executable`] carries the
    /// post-key snapshot and the deferred steps. Dropping it cancels the
    /// key entirely.
    pub fn determine(&self, state: &EngineState, key: KeyEvent) -> KeyProcessResult {
        let mut snapshot = state.clone();
        let base_revision = state.revision;
        let mut steps = Vec::new();
        let mut passthrough = Vec::new();
        if !self.determine_into(&mut snapshot, key, &mut steps, &mut passthrough) {
            return KeyProcessResult::Unknown;
        }
        KeyProcessResult::Executable(Executable::new(
            snapshot,
            base_revision,
            steps,
            passthrough,
        ))
    }

    /// The determination core: a work queue of keys fed through the
    /// consumer pipeline. Returns false when the typed key itself was
    /// declined by every consumer.
    fn determine_into(
        &self,
        state: &mut EngineState,
        key: KeyEvent,
        steps: &mut Vec<ExecStep>,
        passthrough: &mut Vec<KeyEvent>,
    ) -> bool {
        state.begin_key();
        let cx = EngineCx {
            tries: &self.tries,
            mappings: &self.mappings,
        };
        let mut queue: VecDeque<QueuedKey> = VecDeque::new();
        queue.push_back(QueuedKey {
            key,
            depth: 0,
            origin: KeyOrigin::Typed,
            allow_map: true,
        });
        let mut first = true;

        while let Some(item) = queue.pop_front() {
            if item.depth > self.options.max_map_depth {
                let error = EngineError::RecursionOverflow {
                    max_depth: self.options.max_map_depth,
                };
                fail(state, &mut queue, steps, error);
                break;
            }

            let mut accepted = None;
            for consumer in CONSUMERS {
                if let Some(effect) = consumer.consume(&cx, state, &item) {
                    trace!(
                        target: "engine.pipeline",
                        consumer = consumer.name(),
                        key = %item.key,
                        depth = item.depth,
                        "key consumed"
                    );
                    accepted = Some(effect);
                    break;
                }
            }

            let Some(effect) = accepted else {
                if first {
                    // The typed key matched nothing at all; the host's
                    // default handling takes it, state untouched.
                    return false;
                }
                // Only expanded or replayed keys can reach this point, and
                // those were recorded (or not) when first seen.
                passthrough.push(item.key);
                continue;
            };
            first = false;

            if item.origin == KeyOrigin::Typed {
                steps.push(record_step(item.key));
            }

            match effect {
                Effect::None => {}
                Effect::Ready(command) => {
                    steps.push(Box::new(move |state, host| {
                        execute_command(command, state, host)
                    }));
                }
                Effect::Expand { keys, recursive } => {
                    state.mapping.expanding = true;
                    let depth = item.depth + 1;
                    for key in keys.into_iter().rev() {
                        queue.push_front(QueuedKey {
                            key,
                            depth,
                            origin: KeyOrigin::Expanded,
                            allow_map: recursive,
                        });
                    }
                }
                Effect::Replay { prefix, last } => {
                    // The breaking key retries with mapping enabled; the
                    // buffered prefix replays ahead of it, mapping-disabled
                    // so it cannot re-match.
                    queue.push_front(QueuedKey {
                        key: last,
                        depth: item.depth,
                        origin: KeyOrigin::Replayed,
                        allow_map: true,
                    });
                    for key in prefix.into_iter().rev() {
                        queue.push_front(QueuedKey {
                            key,
                            depth: item.depth,
                            origin: KeyOrigin::Replayed,
                            allow_map: false,
                        });
                    }
                }
                Effect::SelectRegister(name) => {
                    steps.push(Box::new(move |_state, host| {
                        host.registers.select(name);
                        Ok(())
                    }));
                }
                Effect::ResetRegister => {
                    steps.push(reset_register_step());
                }
                Effect::Fail(error) => {
                    fail(state, &mut queue, steps, error);
                    break;
                }
            }
        }
        true
    }
}

/// Abort the sequence: drop queued keys, reset to root with the failure
/// observable until the next key, and defer the error to commit time so
/// the status line sees it.
fn fail(
    state: &mut EngineState,
    queue: &mut VecDeque<QueuedKey>,
    steps: &mut Vec<ExecStep>,
    error: EngineError,
) {
    debug!(target: "engine.pipeline", %error, "sequence aborted");
    queue.clear();
    // A register selected for the aborted sequence must not linger in the
    // host store.
    if state.builder.register.is_some() {
        steps.push(reset_register_step());
    }
    state.reset_to_root();
    state.builder.state = BuilderState::BadCommand;
    steps.push(Box::new(move |_state, _host| Err(error)));
}

fn reset_register_step() -> ExecStep {
    Box::new(|_state, host| {
        host.registers.reset_to_default();
        Ok(())
    })
}

fn record_step(key: KeyEvent) -> ExecStep {
    Box::new(move |_state, host| {
        host.registers.record_keystroke(&key);
        Ok(())
    })
}
