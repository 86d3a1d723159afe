//! Shared test doubles: a recording action registry, register store, and
//! status line, plus a fixture that wires them to an engine.
#![allow(dead_code)]

use key_engine::{
    ActionCall, ActionRegistry, Argument, CommandFlags, EditorHost, EngineError, EngineOptions,
    EngineState, KeyEngine, KeyHandled, Mode, RegisterStore, StatusLine, TransactionKind,
};
use key_events::{KeyEvent, parse_keys};

/// One `execute` invocation as seen by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub id: String,
    pub count: u32,
    pub register: Option<char>,
    pub argument: Argument,
    pub flags: CommandFlags,
    pub mode: Mode,
}

pub struct Registry {
    pub calls: Vec<RecordedCall>,
    pub transactions: Vec<String>,
    pub writable: bool,
    /// Fail any call with this id, after recording it.
    pub fail_on: Option<&'static str>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            transactions: Vec::new(),
            writable: true,
            fail_on: None,
        }
    }
}

impl ActionRegistry for Registry {
    fn execute(&mut self, call: ActionCall<'_>) -> anyhow::Result<()> {
        self.calls.push(RecordedCall {
            id: call.id.to_string(),
            count: call.count,
            register: call.register,
            argument: call.argument.clone(),
            flags: call.flags,
            mode: call.mode,
        });
        if self.fail_on == Some(call.id) {
            anyhow::bail!("induced failure");
        }
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn begin_transaction(&mut self, kind: TransactionKind) {
        self.transactions.push(format!("begin {kind:?}"));
    }

    fn end_transaction(&mut self, kind: TransactionKind) {
        self.transactions.push(format!("end {kind:?}"));
    }
}

#[derive(Default)]
pub struct Registers {
    pub selected: Vec<char>,
    pub recorded: Vec<KeyEvent>,
    pub resets: usize,
}

impl RegisterStore for Registers {
    fn select(&mut self, name: char) {
        self.selected.push(name);
    }

    fn reset_to_default(&mut self) {
        self.resets += 1;
    }

    fn record_keystroke(&mut self, key: &KeyEvent) {
        self.recorded.push(*key);
    }
}

#[derive(Default)]
pub struct Status {
    pub errors: Vec<String>,
    pub cleared: usize,
    pub updates: usize,
}

impl StatusLine for Status {
    fn show_error(&mut self, error: &EngineError) {
        self.errors.push(error.to_string());
    }

    fn clear_error(&mut self) {
        self.cleared += 1;
    }

    fn update(&mut self) {
        self.updates += 1;
    }
}

pub struct Fixture {
    pub engine: KeyEngine,
    pub state: EngineState,
    pub registry: Registry,
    pub registers: Registers,
    pub status: Status,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            engine: KeyEngine::with_defaults(options),
            state: EngineState::new(),
            registry: Registry::default(),
            registers: Registers::default(),
            status: Status::default(),
        }
    }

    pub fn in_mode(mode: Mode) -> Self {
        let mut fixture = Self::new();
        fixture.state = EngineState::in_mode(mode);
        fixture
    }

    /// Feed a key-notation string synchronously, one key at a time.
    pub fn feed(&mut self, keys: &str) -> Vec<KeyHandled> {
        parse_keys(keys)
            .into_iter()
            .map(|key| {
                let mut host = EditorHost {
                    actions: &mut self.registry,
                    registers: &mut self.registers,
                    status: &mut self.status,
                };
                self.engine.process_key(&mut self.state, &mut host, key)
            })
            .collect()
    }

    /// Ids of executed actions, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.registry.calls.iter().map(|c| c.id.as_str()).collect()
    }
}
