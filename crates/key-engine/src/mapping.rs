//! User-defined key remapping: mapping-mode-scoped substitutions from one
//! key sequence to another, plus the per-session match-in-progress state.

use std::collections::HashMap;

use key_events::KeyEvent;

use crate::command::MappingMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub from: Vec<KeyEvent>,
    pub to: Vec<KeyEvent>,
    /// When false (`noremap` discipline) the produced keys are not
    /// themselves subject to further mapping.
    pub recursive: bool,
}

#[derive(Debug, PartialEq)]
pub(crate) enum MappingMatch<'a> {
    /// The accumulated keys exactly spell a mapping.
    Exact(&'a Mapping),
    /// Strict prefix of at least one mapping; more input required.
    Prefix,
    None,
}

#[derive(Debug, Default)]
pub struct MappingTable {
    entries: HashMap<MappingMode, Vec<Mapping>>,
}

impl MappingTable {
    /// Insert a mapping, replacing any existing one with the same source
    /// sequence in the same mode.
    pub fn insert(&mut self, mode: MappingMode, mapping: Mapping) {
        let entries = self.entries.entry(mode).or_default();
        if let Some(existing) = entries.iter_mut().find(|m| m.from == mapping.from) {
            *existing = mapping;
        } else {
            entries.push(mapping);
        }
    }

    pub fn remove(&mut self, mode: MappingMode, from: &[KeyEvent]) -> bool {
        let Some(entries) = self.entries.get_mut(&mode) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|m| m.from != from);
        entries.len() != before
    }

    /// Match the accumulated keys against the mode's mappings. An exact
    /// match wins over being a prefix of a longer mapping; the engine runs
    /// no ambiguity timers.
    pub(crate) fn lookup(&self, mode: MappingMode, keys: &[KeyEvent]) -> MappingMatch<'_> {
        let Some(entries) = self.entries.get(&mode) else {
            return MappingMatch::None;
        };
        if let Some(mapping) = entries.iter().find(|m| m.from == keys) {
            return MappingMatch::Exact(mapping);
        }
        if entries
            .iter()
            .any(|m| m.from.len() > keys.len() && m.from.starts_with(keys))
        {
            return MappingMatch::Prefix;
        }
        MappingMatch::None
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|v| v.is_empty())
    }
}

/// In-progress mapped-sequence match: the buffered keys and whether mapping
/// expansion is currently active (used to suppress re-recording keys the
/// expansion produced).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingState {
    pub(crate) keys: Vec<KeyEvent>,
    pub(crate) expanding: bool,
}

impl MappingState {
    pub fn reset(&mut self) {
        self.keys.clear();
        self.expanding = false;
    }

    pub fn is_pending(&self) -> bool {
        !self.keys.is_empty()
    }
}
