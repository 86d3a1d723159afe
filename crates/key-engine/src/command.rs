//! Command vocabulary: modes, descriptors, flags, and the fully resolved
//! command handed to the executor.

use bitflags::bitflags;

/// Editing mode. Operator-pending is not a stored mode; it is derived from
/// the builder so the trie cursor can never disagree with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Insert,
    Replace,
    VisualChar,
    VisualLine,
    Select,
}

/// Mapping-mode classification: which trie and which user mappings apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingMode {
    Normal,
    Insert,
    Visual,
    Select,
    OpPending,
}

impl Mode {
    pub fn mapping_mode(self, operator_pending: bool) -> MappingMode {
        if operator_pending {
            return MappingMode::OpPending;
        }
        match self {
            Mode::Normal => MappingMode::Normal,
            Mode::Insert | Mode::Replace => MappingMode::Insert,
            Mode::VisualChar | Mode::VisualLine => MappingMode::Visual,
            Mode::Select => MappingMode::Select,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u16 {
        /// May serve as a pending operator's argument.
        const MOTION = 1;
        /// Requires a writable target; framed as a write transaction.
        const WRITE = 2;
        /// Framed as a read transaction.
        const READ = 4;
        /// Leaves the operator-pending marker active after execution.
        const KEEP_OP_PENDING = 8;
        /// Suppresses return-to-insert restoration (the command expects
        /// further input before the excursion is over).
        const EXPECT_MORE_INPUT = 16;
        /// Operator applied linewise (doubled key, e.g. `dd`).
        const LINEWISE = 32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Motion,
    Operator,
    Action,
}

/// Trailing input a command still needs after its trie terminal is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    None,
    /// One literal character, e.g. the target of `f`.
    Character,
    /// Two characters naming a digraph.
    Digraph,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Argument {
    #[default]
    None,
    Character(char),
    Digraph {
        first: char,
        second: char,
    },
    /// The motion an operator is applied over.
    Motion(Box<ResolvedCommand>),
}

/// Mode change requested by a command, applied by the executor after the
/// action registry returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    Enter(Mode),
    /// One-shot Normal-mode excursion: switch to Normal and remember the
    /// current mode as the return target.
    TemporaryNormal,
}

/// Static description of a command as registered in the key trie.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    pub id: &'static str,
    pub kind: CommandKind,
    pub flags: CommandFlags,
    pub argument: ArgumentKind,
    pub mode_switch: Option<ModeSwitch>,
}

impl CommandDescriptor {
    pub fn motion(id: &'static str) -> Self {
        Self {
            id,
            kind: CommandKind::Motion,
            flags: CommandFlags::MOTION,
            argument: ArgumentKind::None,
            mode_switch: None,
        }
    }

    pub fn operator(id: &'static str) -> Self {
        Self {
            id,
            kind: CommandKind::Operator,
            flags: CommandFlags::empty(),
            argument: ArgumentKind::None,
            mode_switch: None,
        }
    }

    pub fn action(id: &'static str) -> Self {
        Self {
            id,
            kind: CommandKind::Action,
            flags: CommandFlags::empty(),
            argument: ArgumentKind::None,
            mode_switch: None,
        }
    }

    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_argument(mut self, argument: ArgumentKind) -> Self {
        self.argument = argument;
        self
    }

    pub fn switches(mut self, switch: ModeSwitch) -> Self {
        self.mode_switch = Some(switch);
        self
    }
}

/// Fully determined command: action identity, argument, count, register,
/// and execution flags. Produced when the builder reaches `Ready`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub id: &'static str,
    pub argument: Argument,
    pub count: u32,
    pub register: Option<char>,
    pub flags: CommandFlags,
    pub mode_switch: Option<ModeSwitch>,
}

impl ResolvedCommand {
    pub(crate) fn from_descriptor(descriptor: &CommandDescriptor, argument: Argument) -> Self {
        Self {
            id: descriptor.id,
            argument,
            count: 1,
            register: None,
            flags: descriptor.flags,
            mode_switch: descriptor.mode_switch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_mode_derivation() {
        assert_eq!(Mode::Normal.mapping_mode(false), MappingMode::Normal);
        assert_eq!(Mode::Replace.mapping_mode(false), MappingMode::Insert);
        assert_eq!(Mode::VisualLine.mapping_mode(false), MappingMode::Visual);
        // A pending operator wins over the stored mode.
        assert_eq!(Mode::Normal.mapping_mode(true), MappingMode::OpPending);
    }

    #[test]
    fn descriptor_builders_compose() {
        let d = CommandDescriptor::operator("operator.delete")
            .with_flags(CommandFlags::WRITE)
            .with_argument(ArgumentKind::None);
        assert_eq!(d.kind, CommandKind::Operator);
        assert!(d.flags.contains(CommandFlags::WRITE));
        assert!(!d.flags.contains(CommandFlags::MOTION));
    }
}
