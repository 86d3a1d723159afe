//! Built-in command table: the default trie contents installed by
//! [`KeyEngine::with_defaults`].
//!
//! Motions are shared by Normal, Visual, and operator-pending; everything
//! else is registered per mode. Hosts bind behavior to the ids; the table
//! only fixes spelling, classification, and flags.

use crate::command::{ArgumentKind, CommandDescriptor, CommandFlags, Mode, ModeSwitch};
use crate::command::MappingMode::{self, Insert, Normal, OpPending, Select, Visual};
use crate::engine::KeyEngine;
use crate::trie::TrieError;

const MOTION_MODES: &[MappingMode] = &[Normal, Visual, OpPending];

fn motions() -> Vec<(&'static str, CommandDescriptor)> {
    vec![
        ("h", CommandDescriptor::motion("motion.char-left")),
        ("j", CommandDescriptor::motion("motion.line-down")),
        ("k", CommandDescriptor::motion("motion.line-up")),
        ("l", CommandDescriptor::motion("motion.char-right")),
        ("w", CommandDescriptor::motion("motion.word-next")),
        ("b", CommandDescriptor::motion("motion.word-prev")),
        ("e", CommandDescriptor::motion("motion.word-end")),
        ("0", CommandDescriptor::motion("motion.line-start")),
        ("$", CommandDescriptor::motion("motion.line-end")),
        ("gg", CommandDescriptor::motion("motion.file-start")),
        ("G", CommandDescriptor::motion("motion.file-end")),
        (
            "f",
            CommandDescriptor::motion("motion.find-char").with_argument(ArgumentKind::Character),
        ),
        (
            "F",
            CommandDescriptor::motion("motion.find-char-back")
                .with_argument(ArgumentKind::Character),
        ),
    ]
}

fn normal() -> Vec<(&'static str, CommandDescriptor)> {
    vec![
        (
            "d",
            CommandDescriptor::operator("operator.delete").with_flags(CommandFlags::WRITE),
        ),
        (
            "y",
            CommandDescriptor::operator("operator.yank").with_flags(CommandFlags::READ),
        ),
        (
            "c",
            CommandDescriptor::operator("operator.change")
                .with_flags(CommandFlags::WRITE)
                .switches(ModeSwitch::Enter(Mode::Insert)),
        ),
        (
            "x",
            CommandDescriptor::action("edit.delete-char").with_flags(CommandFlags::WRITE),
        ),
        (
            "u",
            CommandDescriptor::action("edit.undo").with_flags(CommandFlags::WRITE),
        ),
        (
            "p",
            CommandDescriptor::action("edit.paste-after").with_flags(CommandFlags::WRITE),
        ),
        (
            "P",
            CommandDescriptor::action("edit.paste-before").with_flags(CommandFlags::WRITE),
        ),
        (
            "r",
            CommandDescriptor::action("edit.replace-char")
                .with_flags(CommandFlags::WRITE)
                .with_argument(ArgumentKind::Character),
        ),
        (
            "i",
            CommandDescriptor::action("mode.insert").switches(ModeSwitch::Enter(Mode::Insert)),
        ),
        (
            "a",
            CommandDescriptor::action("mode.insert-after")
                .switches(ModeSwitch::Enter(Mode::Insert)),
        ),
        (
            "v",
            CommandDescriptor::action("mode.visual-char")
                .switches(ModeSwitch::Enter(Mode::VisualChar)),
        ),
        (
            "V",
            CommandDescriptor::action("mode.visual-line")
                .switches(ModeSwitch::Enter(Mode::VisualLine)),
        ),
        (
            "R",
            CommandDescriptor::action("mode.replace").switches(ModeSwitch::Enter(Mode::Replace)),
        ),
    ]
}

fn visual() -> Vec<(&'static str, CommandDescriptor)> {
    vec![
        (
            "d",
            CommandDescriptor::action("visual.delete")
                .with_flags(CommandFlags::WRITE)
                .switches(ModeSwitch::Enter(Mode::Normal)),
        ),
        (
            "y",
            CommandDescriptor::action("visual.yank")
                .with_flags(CommandFlags::READ)
                .switches(ModeSwitch::Enter(Mode::Normal)),
        ),
        (
            "c",
            CommandDescriptor::action("visual.change")
                .with_flags(CommandFlags::WRITE)
                .switches(ModeSwitch::Enter(Mode::Insert)),
        ),
        (
            "<Esc>",
            CommandDescriptor::action("mode.normal").switches(ModeSwitch::Enter(Mode::Normal)),
        ),
    ]
}

fn insert() -> Vec<(&'static str, CommandDescriptor)> {
    vec![
        (
            "<Esc>",
            CommandDescriptor::action("mode.normal").switches(ModeSwitch::Enter(Mode::Normal)),
        ),
        (
            "<C-o>",
            CommandDescriptor::action("mode.temporary-normal")
                .switches(ModeSwitch::TemporaryNormal),
        ),
        (
            "<C-k>",
            CommandDescriptor::action("edit.insert-digraph")
                .with_flags(CommandFlags::WRITE)
                .with_argument(ArgumentKind::Digraph),
        ),
    ]
}

pub(crate) fn install(engine: &mut KeyEngine) -> Result<(), TrieError> {
    for (sequence, command) in motions() {
        engine.register_command(MOTION_MODES, sequence, command)?;
    }
    for (sequence, command) in normal() {
        engine.register_command(&[Normal], sequence, command)?;
    }
    for (sequence, command) in visual() {
        engine.register_command(&[Visual], sequence, command)?;
    }
    for (sequence, command) in insert() {
        engine.register_command(&[Insert], sequence, command)?;
    }
    engine.register_command(
        &[Select],
        "<Esc>",
        CommandDescriptor::action("mode.normal").switches(ModeSwitch::Enter(Mode::Normal)),
    )?;
    Ok(())
}
