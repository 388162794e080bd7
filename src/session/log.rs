//! Session debug log.
//!
//! One JSON object per executed line, holding the line, its outcome and
//! snapshots of registers, memory and stacks taken before and after.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::cpu::{Cpu, EngineError, StackEntry};
use crate::cpu::memory::WORD_SIZE;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Registers of one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub mode: String,
    pub registers: Vec<(String, u32)>,
}

/// Entries of one non-empty stack, in push order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub mode: String,
    pub entries: Vec<StackEntry>,
}

/// Visible machine state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: Vec<BankSnapshot>,
    /// Written words keyed by byte address.
    pub memory: BTreeMap<u32, u32>,
    pub stack: Vec<StackSnapshot>,
}

impl Snapshot {
    pub fn capture(cpu: &Cpu) -> Self {
        let registers = cpu
            .regs
            .banks()
            .map(|bank| BankSnapshot {
                mode: bank.mode().to_string(),
                registers: bank.iter().map(|(r, v)| (r.to_string(), v)).collect(),
            })
            .collect();

        let memory = cpu
            .mem
            .iter()
            .map(|(index, value)| (index.wrapping_mul(WORD_SIZE), value))
            .collect();

        let stack = cpu
            .stack
            .active_modes()
            .map(|mode| StackSnapshot {
                mode: mode.to_string(),
                entries: cpu.stack.in_push_order(mode).to_vec(),
            })
            .collect();

        Self { registers, memory, stack }
    }
}

/// One line of the debug log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the session history, starting at 1.
    pub seq: usize,
    pub instruction: String,
    /// `None` when the line executed cleanly.
    pub error: Option<String>,
    pub before: Snapshot,
    pub after: Snapshot,
}

/// Writes [`LogEntry`] records as JSON lines.
pub struct SessionLog<W: Write> {
    writer: W,
}

impl SessionLog<BufWriter<File>> {
    /// Create (or truncate) a log file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SessionLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Append one record and flush.
    pub fn record(
        &mut self,
        seq: usize,
        instruction: &str,
        result: &Result<(), EngineError>,
        before: Snapshot,
        after: Snapshot,
    ) -> Result<(), LogError> {
        let entry = LogEntry {
            seq,
            instruction: instruction.to_string(),
            error: result.as_ref().err().map(|e| e.to_string()),
            before,
            after,
        };
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> std::fmt::Debug for SessionLog<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLog").finish_non_exhaustive()
    }
}

/// Errors that can occur while writing the debug log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
