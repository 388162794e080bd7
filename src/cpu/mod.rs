//! The simulated ARMv7 core.
//!
//! - banked register file: a shared `com` bank plus per-mode `sp`/`lr`/`spsr`
//! - sparse word memory
//! - per-mode shadow stacks
//! - label table
//! - text decoder and executor for MOV, ADD, LDR, PUSH and `.label`

pub mod mode;
pub mod registers;
pub mod memory;
pub mod stack;
pub mod labels;
pub mod decode;
pub mod execute;

pub use mode::{Mode, Reg};
pub use memory::Memory;
pub use registers::{Bank, RegisterBank};
pub use stack::{Stack, StackEntry};
pub use labels::LabelTable;
pub use decode::{decode, Instruction, CommandInfo, REFERENCE_COMMANDS};
pub use execute::{Cpu, EngineConfig, EngineError};
