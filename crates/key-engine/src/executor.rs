//! Command execution: the bridge from a resolved command to host side
//! effects.
//!
//! Ordering per invocation: writability gate, transaction begin, registry
//! dispatch, transaction end (unconditionally), then on success the mode
//! switch and one-shot mode restoration. Builder reset and register
//! restoration happen on every exit path.

use tracing::{debug, warn};

use crate::command::{Argument, CommandFlags, Mode, ModeSwitch, ResolvedCommand};
use crate::error::EngineError;
use crate::host::{ActionCall, EditorHost, TransactionKind};
use crate::state::EngineState;

/// Execute one resolved command against the host.
pub(crate) fn execute_command(
    command: ResolvedCommand,
    state: &mut EngineState,
    host: &mut EditorHost<'_>,
) -> Result<(), EngineError> {
    debug!(
        target: "engine.exec",
        id = command.id,
        count = command.count,
        register = ?command.register,
        "executing command"
    );
    let result = run_action(&command, state, host);
    finish_command(&command, result.is_ok(), state, host);
    result
}

fn run_action(
    command: &ResolvedCommand,
    state: &mut EngineState,
    host: &mut EditorHost<'_>,
) -> Result<(), EngineError> {
    // Write-class commands never reach the registry on a read-only target.
    if command.flags.contains(CommandFlags::WRITE) && !host.actions.is_writable() {
        return Err(EngineError::ReadOnlyTarget);
    }

    if let Some(active) = state.execution.executing {
        warn!(
            target: "engine.exec",
            active,
            requested = command.id,
            "command dispatched while another is executing"
        );
    }
    state.execution.executing = Some(command.id);

    let tx = transaction_kind(command.flags);
    if let Some(kind) = tx {
        host.actions.begin_transaction(kind);
    }
    let call = ActionCall {
        id: command.id,
        argument: &command.argument,
        count: command.count,
        register: command.register,
        flags: command.flags,
        operator_pending: matches!(command.argument, Argument::Motion(_)),
        mode: state.mode(),
    };
    let outcome = host.actions.execute(call).map_err(|source| EngineError::Action {
        id: command.id,
        source,
    });
    // The transaction closes even when the action failed.
    if let Some(kind) = tx {
        host.actions.end_transaction(kind);
    }
    state.execution.executing = None;
    outcome?;

    apply_mode_switch(command, state);
    Ok(())
}

fn apply_mode_switch(command: &ResolvedCommand, state: &mut EngineState) {
    match command.mode_switch {
        Some(ModeSwitch::Enter(mode)) => {
            // Explicitly entering a mode supersedes a pending excursion
            // return.
            state.execution.return_to = None;
            state.set_mode(mode);
        }
        Some(ModeSwitch::TemporaryNormal) => {
            state.execution.return_to = Some(state.mode());
            state.set_mode(Mode::Normal);
        }
        None => {
            // One command into a temporary-Normal excursion, go back.
            if !command.flags.contains(CommandFlags::EXPECT_MORE_INPUT)
                && let Some(back) = state.execution.return_to.take()
            {
                state.set_mode(back);
            }
        }
    }
}

fn finish_command(
    command: &ResolvedCommand,
    ok: bool,
    state: &mut EngineState,
    host: &mut EditorHost<'_>,
) {
    if command.register.is_some() {
        host.registers.reset_to_default();
    }
    if ok && command.flags.contains(CommandFlags::KEEP_OP_PENDING) {
        let pending = state.builder.pending_operator.take();
        let count = state.builder.count;
        let post_op_count = state.builder.post_op_count;
        let register = state.builder.register;
        state.reset_to_root();
        // The interrupted operator resumes with everything it had
        // accumulated so far.
        if pending.is_some() {
            state.builder.pending_operator = pending;
            state.builder.count = count;
            state.builder.post_op_count = post_op_count;
            state.builder.register = register;
            state.builder.note_progress();
        }
        return;
    }
    state.reset_to_root();
}

fn transaction_kind(flags: CommandFlags) -> Option<TransactionKind> {
    if flags.contains(CommandFlags::WRITE) {
        Some(TransactionKind::Write)
    } else if flags.contains(CommandFlags::READ) {
        Some(TransactionKind::Read)
    } else {
        None
    }
}
