//! External collaborator interfaces.
//!
//! The engine resolves keys into commands; everything a command actually
//! does lives behind these traits. Implementations must not call back into
//! key processing from inside `execute` (the executor logs a warning if
//! they do).

use key_events::KeyEvent;

use crate::command::{Argument, CommandFlags, Mode};
use crate::error::EngineError;

/// Undo/atomicity framing requested around an action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Read,
    Write,
}

/// One fully resolved invocation handed to the action registry.
#[derive(Debug)]
pub struct ActionCall<'a> {
    pub id: &'static str,
    pub argument: &'a Argument,
    pub count: u32,
    pub register: Option<char>,
    /// Execution flags of the resolved command (linewise, write-class, ...).
    pub flags: CommandFlags,
    pub operator_pending: bool,
    pub mode: Mode,
}

pub trait ActionRegistry {
    /// Perform the action. Failures are the action's own responsibility;
    /// the engine surfaces them and carries on.
    fn execute(&mut self, call: ActionCall<'_>) -> anyhow::Result<()>;

    /// Whether the current target accepts write-class commands.
    fn is_writable(&self) -> bool;

    fn begin_transaction(&mut self, kind: TransactionKind);
    fn end_transaction(&mut self, kind: TransactionKind);
}

pub trait RegisterStore {
    /// Select the register subsequent operations read/write.
    fn select(&mut self, name: char);
    /// Return to the default (unnamed) register.
    fn reset_to_default(&mut self);
    /// Append one typed key to the active macro recording, if any.
    fn record_keystroke(&mut self, key: &KeyEvent);
}

pub trait StatusLine {
    fn show_error(&mut self, error: &EngineError);
    fn clear_error(&mut self);
    /// Refresh any pending-command indicator after a key is committed.
    fn update(&mut self);
}

/// Bundle of collaborator borrows threaded through execution steps.
pub struct EditorHost<'a> {
    pub actions: &'a mut dyn ActionRegistry,
    pub registers: &'a mut dyn RegisterStore,
    pub status: &'a mut dyn StatusLine,
}
