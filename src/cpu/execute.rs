//! Execution engine.
//!
//! [`Cpu`] owns every piece of machine state and applies decoded
//! instructions to it. It keeps nothing between calls besides that state:
//! there is no program counter advancement, branching or condition check.

use crate::cpu::decode::{self, Instruction};
use crate::cpu::labels::LabelTable;
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::mode::{Mode, Reg};
use crate::cpu::registers::RegisterBank;
use crate::cpu::stack::Stack;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Engine options chosen at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound memory to this many words. `None` keeps it sparse and unbounded.
    pub memory_words: Option<u32>,
    /// Also write pushed values into memory at the stack address.
    pub mirror_stack: bool,
    /// Bank whose `sp` is used by `PUSH`.
    pub stack_mode: Mode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_words: None,
            mirror_stack: false,
            stack_mode: Mode::UserSystem,
        }
    }
}

/// The simulated CPU and everything it can touch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    /// Banked registers.
    pub regs: RegisterBank,
    /// Word memory.
    pub mem: Memory,
    /// Shadow stacks, one per mode.
    pub stack: Stack,
    /// Symbol table.
    pub labels: LabelTable,
    config: EngineConfig,
}

impl Cpu {
    /// Create a CPU with default configuration and zeroed state.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a CPU with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let mem = match config.memory_words {
            Some(words) => Memory::bounded(words),
            None => Memory::new(),
        };
        Self {
            regs: RegisterBank::new(),
            mem,
            stack: Stack::new(),
            labels: LabelTable::new(),
            config,
        }
    }

    /// Decode and execute one line of text.
    ///
    /// Returns the decoded instruction, or `None` for an empty line.
    /// Decode errors leave all state untouched.
    pub fn execute_line(&mut self, line: &str) -> Result<Option<Instruction>, EngineError> {
        let Some(instr) = decode::decode(line)? else {
            return Ok(None);
        };
        self.execute(&instr)?;
        Ok(Some(instr))
    }

    /// Execute a decoded instruction.
    ///
    /// `PUSH` applies registers one at a time. If a later register fails
    /// (only possible when a mirrored write leaves a bounded memory), the
    /// earlier pushes stay applied.
    pub fn execute(&mut self, instr: &Instruction) -> Result<(), EngineError> {
        match instr {
            Instruction::Mov { rd, imm } => {
                let mode = self.resolve_mode(*rd)?;
                self.regs.set(mode, *rd, *imm)?;
            }

            Instruction::Add { rd, rn, imm } => {
                let (mode, src) = match self.regs.resolve_pair(*rd, *rn) {
                    Some(mode) => (mode, self.read_in(mode, *rn)?),
                    // No bank holds both: resolve each name on its own.
                    None => {
                        let (_, src) = self.resolve(*rn)?;
                        (self.resolve_mode(*rd)?, src)
                    }
                };
                self.regs.set(mode, *rd, src.wrapping_add(*imm))?;
            }

            Instruction::LdrIndirect { rd, rn } => {
                let (_, addr) = self.resolve(*rn)?;
                let value = self.mem.read(addr)?;
                let mode = self.resolve_mode(*rd)?;
                self.regs.set(mode, *rd, value)?;
            }

            Instruction::LdrLabel { rd, label } => {
                let addr = self.labels.resolve(label)?;
                let mode = self.resolve_mode(*rd)?;
                self.regs.set(mode, *rd, addr)?;
            }

            Instruction::Push { regs } => {
                let stack_mode = self.config.stack_mode;
                for &reg in regs {
                    let (_, value) = self.resolve(reg)?;
                    let addr = self.stack.push(&mut self.regs, stack_mode, value)?;
                    if self.config.mirror_stack {
                        self.mem.write(addr, value)?;
                    }
                }
            }

            Instruction::BindLabel { name, address } => {
                self.labels.bind(name.clone(), *address);
            }
        }

        tracing::debug!(instruction = %instr, "executed");
        Ok(())
    }

    /// Value of `reg` in whichever mode wins name resolution.
    pub fn register(&self, reg: Reg) -> Option<u32> {
        self.regs.resolve(reg).map(|(_, v)| v)
    }

    fn resolve(&self, reg: Reg) -> Result<(Mode, u32), EngineError> {
        self.regs
            .resolve(reg)
            .ok_or_else(|| EngineError::RegisterNotFound(reg.to_string()))
    }

    fn resolve_mode(&self, reg: Reg) -> Result<Mode, EngineError> {
        self.regs
            .resolve_mode(reg)
            .ok_or_else(|| EngineError::RegisterNotFound(reg.to_string()))
    }

    fn read_in(&self, mode: Mode, reg: Reg) -> Result<u32, EngineError> {
        self.regs
            .get(mode, reg)
            .ok_or_else(|| EngineError::RegisterNotFound(format!("{} ({})", reg, mode)))
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors returned by [`Cpu::execute_line`] and the models it drives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("register not found: {0}")]
    RegisterNotFound(String),

    #[error("label not found: {0}")]
    LabelNotFound(String),

    #[error("memory address {0:#010x} out of range")]
    OutOfRange(u32),

    #[error("unsupported instruction: {0}")]
    UnsupportedInstruction(String),

    #[error("malformed operand in `{0}`: {1}")]
    MalformedOperand(String, String),
}

impl From<MemoryError> for EngineError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::AddressOutOfRange(addr) => EngineError::OutOfRange(addr),
        }
    }
}
