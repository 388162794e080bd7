//! # ARMv7 register-bank visualizer
//!
//! An instructional model of a small slice of ARMv7: banked registers for
//! every processor mode, word-addressed memory, per-mode stacks and labels,
//! driven one text instruction at a time.
//!
//! ```
//! use armviz::{Session, Reg};
//!
//! let mut session = Session::default();
//! session.execute("MOV r1, #5").unwrap();
//! session.execute("ADD r2, r1, #3").unwrap();
//! assert_eq!(session.cpu().register(Reg::R(2)), Some(8));
//! ```

pub mod cpu;
pub mod session;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, EngineConfig, EngineError, Instruction, Mode, Reg};
pub use session::{Session, ScriptLoad, LineResult, BREAK_MARKER};
pub use session::log::{SessionLog, Snapshot};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
