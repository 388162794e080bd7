//! Terminal front end.
//!
//! Provides an interactive terminal view with:
//! - Registers grouped by mode
//! - Memory map and per-mode stacks
//! - Reference command list and reserved queue
//! - Instruction input with history recall

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
