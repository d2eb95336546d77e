//! # Editing Core
//!
//! Every change to a document goes through a [`Transaction`]: an ordered
//! list of primitive [`Step`]s, each producing the next intermediate tree.
//!
//! ```text
//!  EditorState ──tr()──▶ Transaction ──step()*──▶ apply() ──▶ EditorState'
//!        ▲                    │
//!        │            Command │ compile()
//!        └──── rejected ──────┘  (state untouched, doc pointer-equal)
//! ```
//!
//! ## Positions
//!
//! Positions count node boundaries and characters. Each step records a
//! [`StepMap`] so positions taken before the step (the selection, a drag
//! origin) can be carried across it with [`Mapping`].
//!
//! ## Commands
//!
//! Commands are plain data ([`Command`]) compiled against a state. A command
//! validates before it builds steps; any failure yields `None` and a `debug`
//! event naming the command and the reason.

pub mod commands;
pub mod selection;
pub mod state;
pub mod step;
pub mod transaction;

pub use commands::{Command, CommandError, compile};
pub use selection::Selection;
pub use state::EditorState;
pub use step::{MapResult, Mappable, Mapping, Step, StepError, StepMap};
pub use transaction::Transaction;
