//! Per-mode shadow stacks.
//!
//! Pushed values are recorded here for visualization, separately from
//! [`Memory`](crate::cpu::Memory). Each stack is full-descending: the mode's
//! `sp` is decremented by one word first, and the entry is recorded at the
//! new pointer value.

use crate::cpu::execute::EngineError;
use crate::cpu::memory::WORD_SIZE;
use crate::cpu::mode::{Mode, Reg};
use crate::cpu::registers::RegisterBank;
use serde::{Serialize, Deserialize};

/// One pushed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    /// Stack pointer value after the decrement.
    pub address: u32,
    pub value: u32,
}

/// Push history for every mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Indexed by [`Mode::index`], oldest entry first.
    stacks: Vec<Vec<StackEntry>>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            stacks: vec![Vec::new(); Mode::ALL.len()],
        }
    }

    /// Push `value` onto `mode`'s stack, moving that mode's `sp` down a word.
    ///
    /// Returns the address the value was recorded at.
    pub fn push(
        &mut self,
        regs: &mut RegisterBank,
        mode: Mode,
        value: u32,
    ) -> Result<u32, EngineError> {
        let sp = regs
            .get(mode, Reg::Sp)
            .ok_or_else(|| EngineError::RegisterNotFound(format!("sp ({})", mode)))?;
        let address = sp.wrapping_sub(WORD_SIZE);
        regs.set(mode, Reg::Sp, address)?;
        self.stacks[mode.index()].push(StackEntry { address, value });
        tracing::trace!(%mode, address, value, "push");
        Ok(address)
    }

    /// Entries of one mode in push order.
    pub fn in_push_order(&self, mode: Mode) -> &[StackEntry] {
        &self.stacks[mode.index()]
    }

    /// Entries of one mode, newest first.
    pub fn entries(&self, mode: Mode) -> impl Iterator<Item = &StackEntry> {
        self.stacks[mode.index()].iter().rev()
    }

    /// Number of entries pushed in `mode`.
    pub fn depth(&self, mode: Mode) -> usize {
        self.stacks[mode.index()].len()
    }

    /// Modes that have at least one entry.
    pub fn active_modes(&self) -> impl Iterator<Item = Mode> + '_ {
        Mode::ALL.into_iter().filter(|&m| self.depth(m) > 0)
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_full_descending() {
        let mut regs = RegisterBank::new();
        let mut stack = Stack::new();
        regs.set(Mode::UserSystem, Reg::Sp, 0x1000).unwrap();

        assert_eq!(stack.push(&mut regs, Mode::UserSystem, 1).unwrap(), 0x0FFC);
        assert_eq!(stack.push(&mut regs, Mode::UserSystem, 2).unwrap(), 0x0FF8);

        assert_eq!(regs.get(Mode::UserSystem, Reg::Sp), Some(0x0FF8));
        assert_eq!(
            stack.in_push_order(Mode::UserSystem),
            &[
                StackEntry { address: 0x0FFC, value: 1 },
                StackEntry { address: 0x0FF8, value: 2 },
            ]
        );
        let newest: Vec<_> = stack.entries(Mode::UserSystem).map(|e| e.value).collect();
        assert_eq!(newest, vec![2, 1]);
    }

    #[test]
    fn test_modes_are_independent() {
        let mut regs = RegisterBank::new();
        let mut stack = Stack::new();
        regs.set(Mode::Irq, Reg::Sp, 0x800).unwrap();

        stack.push(&mut regs, Mode::Irq, 5).unwrap();

        assert_eq!(stack.depth(Mode::Irq), 1);
        assert_eq!(stack.depth(Mode::UserSystem), 0);
        assert_eq!(regs.get(Mode::UserSystem, Reg::Sp), Some(0));
        assert_eq!(stack.active_modes().collect::<Vec<_>>(), vec![Mode::Irq]);
    }

    #[test]
    fn test_push_wraps_below_zero() {
        let mut regs = RegisterBank::new();
        let mut stack = Stack::new();
        assert_eq!(stack.push(&mut regs, Mode::Supervisor, 0).unwrap(), 0xFFFF_FFFC);
    }

    #[test]
    fn test_push_needs_sp() {
        let mut regs = RegisterBank::new();
        let mut stack = Stack::new();
        let err = stack.push(&mut regs, Mode::Common, 1).unwrap_err();
        assert!(matches!(err, EngineError::RegisterNotFound(_)));
        assert_eq!(stack.depth(Mode::Common), 0);
    }
}
