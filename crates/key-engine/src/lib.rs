//! Modal key-sequence resolution and execution.
//!
//! The engine turns a stream of [`key_events::KeyEvent`]s into editor
//! commands: per-mode prefix tries spell the built-in commands, a user
//! mapping table rewrites sequences ahead of them, and a consumer pipeline
//! accumulates counts, registers, and trailing arguments into a
//! [`ResolvedCommand`]. Execution goes through host traits
//! ([`ActionRegistry`], [`RegisterStore`], [`StatusLine`]); the engine
//! itself never touches a buffer.
//!
//! ```
//! use key_engine::{EngineOptions, EngineState, KeyEngine, MappingMode};
//!
//! let mut engine = KeyEngine::with_defaults(EngineOptions::default());
//! engine.add_mapping(MappingMode::Insert, "jj", "<Esc>", false);
//!
//! // Speculative strategy: determine without committing; dropping the
//! // result cancels the key.
//! let state = EngineState::new();
//! for key in key_events::parse_keys("3d") {
//!     assert!(!engine.determine(&state, key).is_unknown());
//! }
//! ```

mod builder;
mod builtin;
mod command;
mod consumers;
mod engine;
mod error;
mod executor;
mod host;
mod mapping;
mod result;
mod state;
mod trie;

pub use builder::{BuilderState, CommandBuilder, PendingOperator};
pub use command::{
    Argument, ArgumentKind, CommandDescriptor, CommandFlags, CommandKind, MappingMode, Mode,
    ModeSwitch, ResolvedCommand,
};
pub use engine::{EngineOptions, KeyEngine};
pub use error::EngineError;
pub use host::{
    ActionCall, ActionRegistry, EditorHost, RegisterStore, StatusLine, TransactionKind,
};
pub use mapping::{Mapping, MappingTable};
pub use result::{Executable, KeyHandled, KeyProcessResult};
pub use state::{EngineState, ExecutionState};
pub use trie::{KeyTrie, TrieError};
