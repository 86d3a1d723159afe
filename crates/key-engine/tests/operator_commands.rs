//! Operator, count, register, and argument resolution through the
//! synchronous entry point.

mod common;

use common::Fixture;
use key_engine::{Argument, CommandFlags, KeyHandled};
use pretty_assertions::assert_eq;

fn handled() -> KeyHandled {
    KeyHandled::Handled {
        passthrough: Vec::new(),
    }
}

#[test]
fn count_applies_to_operator_motion() {
    let mut f = Fixture::new();
    let results = f.feed("3dw");
    assert_eq!(results, vec![handled(), handled(), handled()]);

    assert_eq!(f.registry.calls.len(), 1);
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "operator.delete");
    assert_eq!(call.count, 3);
    match &call.argument {
        Argument::Motion(motion) => {
            assert_eq!(motion.id, "motion.word-next");
            assert_eq!(motion.count, 1);
        }
        other => panic!("expected motion argument, got {other:?}"),
    }
    assert_eq!(f.registry.transactions, vec!["begin Write", "end Write"]);
}

#[test]
fn counts_before_and_after_operator_multiply() {
    let mut f = Fixture::new();
    f.feed("2d3w");
    assert_eq!(f.registry.calls[0].count, 6);
}

#[test]
fn doubled_operator_is_linewise() {
    let mut f = Fixture::new();
    f.feed("dd");
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "operator.delete");
    assert_eq!(call.argument, Argument::None);
    assert!(call.flags.contains(CommandFlags::LINEWISE));
}

#[test]
fn register_prefix_selects_and_restores() {
    let mut f = Fixture::new();
    f.feed("\"ayw");
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "operator.yank");
    assert_eq!(call.register, Some('a'));
    assert_eq!(f.registers.selected, vec!['a']);
    assert_eq!(f.registers.resets, 1);
    assert_eq!(f.registry.transactions, vec!["begin Read", "end Read"]);
}

#[test]
fn find_char_captures_its_argument() {
    let mut f = Fixture::new();
    f.feed("fx");
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "motion.find-char");
    assert_eq!(call.argument, Argument::Character('x'));
    // Plain motion: no transaction framing.
    assert!(f.registry.transactions.is_empty());
}

#[test]
fn replace_char_captures_its_argument() {
    let mut f = Fixture::new();
    f.feed("rZ");
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "edit.replace-char");
    assert_eq!(call.argument, Argument::Character('Z'));
}

#[test]
fn invalid_operator_argument_is_an_error() {
    let mut f = Fixture::new();
    f.feed("dq");
    assert!(f.registry.calls.is_empty());
    assert_eq!(f.status.errors, vec!["not a command: q"]);

    // The failure is cleared by the next key.
    f.feed("x");
    assert_eq!(f.executed(), vec!["edit.delete-char"]);
}

#[test]
fn escape_cancels_a_pending_operator() {
    let mut f = Fixture::new();
    f.feed("3d<Esc>x");
    assert_eq!(f.executed(), vec!["edit.delete-char"]);
    // The cancelled count does not leak into the next command.
    assert_eq!(f.registry.calls[0].count, 1);
}

#[test]
fn leading_zero_is_a_motion_not_a_count() {
    let mut f = Fixture::new();
    f.feed("0");
    assert_eq!(f.executed(), vec!["motion.line-start"]);
}

#[test]
fn zero_extends_an_existing_count() {
    let mut f = Fixture::new();
    f.feed("10j");
    let call = &f.registry.calls[0];
    assert_eq!(call.id, "motion.line-down");
    assert_eq!(call.count, 10);
}

#[test]
fn unbound_key_is_unknown() {
    let mut f = Fixture::new();
    let results = f.feed("q");
    assert_eq!(results, vec![KeyHandled::Unknown]);
    assert!(f.registry.calls.is_empty());
    assert!(f.status.errors.is_empty());
}

#[test]
fn multi_key_command_waits_for_completion() {
    let mut f = Fixture::new();
    f.feed("g");
    assert!(f.registry.calls.is_empty());
    f.feed("g");
    assert_eq!(f.executed(), vec!["motion.file-start"]);
}
