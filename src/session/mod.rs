//! Interactive session: the CPU plus history, reserved queue and debug log.
//!
//! Front ends talk to a [`Session`] only. It records every attempted line
//! in the history before executing it, so a failed instruction still shows
//! up there.

pub mod queue;
pub mod script;
pub mod log;

use std::io::Write;
use crate::cpu::{Cpu, EngineConfig, EngineError, LabelTable, Memory, RegisterBank, Stack};
use self::log::{SessionLog, Snapshot};

pub use queue::SessionQueue;
pub use script::{load_script_file, parse_script, ScriptError, BREAK_MARKER};

/// Outcome of one line run from a script or the reserved queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    pub line: String,
    pub result: Result<(), EngineError>,
}

/// Summary of [`Session::load_script`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptLoad {
    /// Lines before the breakpoint, in execution order.
    pub results: Vec<LineResult>,
    /// Number of lines added to the reserved queue.
    pub queued: usize,
}

impl ScriptLoad {
    /// Number of lines that failed.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_err()).count()
    }

    /// One `line: error` message per failed line, in execution order.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| format!("{}: {}", r.line, e)))
            .collect()
    }
}

/// One simulator session.
pub struct Session {
    cpu: Cpu,
    queue: SessionQueue,
    log: Option<SessionLog<Box<dyn Write>>>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cpu: Cpu::with_config(config),
            queue: SessionQueue::new(),
            log: None,
        }
    }

    /// Write a before/after record for every executed line from now on.
    pub fn attach_log<W: Write + 'static>(&mut self, log: SessionLog<W>) {
        let writer: Box<dyn Write> = Box::new(log.into_inner());
        self.log = Some(SessionLog::new(writer));
    }

    /// Execute one line.
    ///
    /// The line is recorded in the history first, whatever the outcome.
    pub fn execute(&mut self, line: &str) -> Result<(), EngineError> {
        self.queue.record(line);
        let before = self.log.as_ref().map(|_| Snapshot::capture(&self.cpu));

        let result = self.cpu.execute_line(line).map(|_| ());
        if let Err(e) = &result {
            tracing::debug!(line, error = %e, "instruction failed");
        }

        if let (Some(log), Some(before)) = (self.log.as_mut(), before) {
            let after = Snapshot::capture(&self.cpu);
            let seq = self.queue.history().len();
            if let Err(e) = log.record(seq, line, &result, before, after) {
                tracing::warn!(error = %e, "debug log write failed; detaching log");
                self.log = None;
            }
        }

        result
    }

    /// Run the lines before `marker` now and queue the rest.
    ///
    /// A failing line is reported in the result and does not stop the batch.
    /// Queued lines go after anything already reserved.
    pub fn load_script<I, S>(&mut self, lines: I, marker: &str) -> ScriptLoad
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (immediate, deferred) = queue::split_at_marker(lines, marker);

        let results = immediate
            .into_iter()
            .map(|line| {
                let result = self.execute(&line);
                LineResult { line, result }
            })
            .collect();

        let queued = deferred.len();
        for line in deferred {
            self.queue.enqueue(line);
        }

        tracing::debug!(queued, "script loaded");
        ScriptLoad { results, queued }
    }

    /// Add one line to the back of the reserved queue.
    pub fn enqueue_reserved(&mut self, line: impl Into<String>) {
        self.queue.enqueue(line);
    }

    /// Take the next reserved line without running it.
    pub fn dequeue_reserved(&mut self) -> Option<String> {
        self.queue.pop_next_reserved()
    }

    /// Take the next reserved line and run it.
    pub fn step_reserved(&mut self) -> Option<LineResult> {
        let line = self.queue.pop_next_reserved()?;
        let result = self.execute(&line);
        Some(LineResult { line, result })
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.cpu.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.cpu.mem
    }

    pub fn stack(&self) -> &Stack {
        &self.cpu.stack
    }

    pub fn labels(&self) -> &LabelTable {
        &self.cpu.labels
    }

    pub fn history(&self) -> &[String] {
        self.queue.history()
    }

    pub fn reserved(&self) -> impl Iterator<Item = &str> {
        self.queue.reserved()
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cpu", &self.cpu)
            .field("history", &self.queue.history().len())
            .field("reserved", &self.queue.reserved_len())
            .field("logging", &self.log.is_some())
            .finish()
    }
}
