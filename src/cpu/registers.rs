//! Banked register file.
//!
//! Every [`Mode`] owns a fixed list of named slots (see [`Mode::slots`]).
//! The same name can live in several banks at once, so a lookup is always
//! two-level: first the mode, then the register inside it.
//!
//! Looking a register up by name alone is a fallback with a fixed policy:
//! modes are scanned in [`Mode::ALL`] order and the first hit wins. Anything
//! that needs one particular bank (the stack pointer of the push mode, say)
//! must go through [`RegisterBank::get`] / [`RegisterBank::set`] instead.

use crate::cpu::execute::EngineError;
use crate::cpu::mode::{Mode, Reg};
use serde::{Serialize, Deserialize};

/// The registers owned by a single mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    mode: Mode,
    /// Parallel to `mode.slots()`.
    values: Vec<u32>,
}

impl Bank {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            values: vec![0; mode.slots().len()],
        }
    }

    /// The mode this bank belongs to.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn slot(&self, reg: Reg) -> Option<usize> {
        self.mode.slots().iter().position(|&r| r == reg)
    }

    /// Does this bank hold `reg`?
    pub fn contains(&self, reg: Reg) -> bool {
        self.slot(reg).is_some()
    }

    /// Read a register held by this bank.
    pub fn get(&self, reg: Reg) -> Option<u32> {
        self.slot(reg).map(|i| self.values[i])
    }

    /// Iterate `(register, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Reg, u32)> + '_ {
        self.mode.slots().iter().copied().zip(self.values.iter().copied())
    }
}

/// All register banks of the simulated CPU.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBank {
    /// Indexed by [`Mode::index`].
    banks: Vec<Bank>,
}

impl RegisterBank {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self {
            banks: Mode::ALL.iter().map(|&mode| Bank::new(mode)).collect(),
        }
    }

    /// The bank of one mode.
    pub fn bank(&self, mode: Mode) -> &Bank {
        &self.banks[mode.index()]
    }

    /// All banks in resolution order.
    pub fn banks(&self) -> impl Iterator<Item = &Bank> {
        self.banks.iter()
    }

    /// Read `reg` from a specific mode.
    pub fn get(&self, mode: Mode, reg: Reg) -> Option<u32> {
        self.bank(mode).get(reg)
    }

    /// Write `reg` in a specific mode.
    ///
    /// Fails with `RegisterNotFound` when that mode has no such slot.
    pub fn set(&mut self, mode: Mode, reg: Reg, value: u32) -> Result<(), EngineError> {
        let bank = &mut self.banks[mode.index()];
        let idx = bank
            .slot(reg)
            .ok_or_else(|| EngineError::RegisterNotFound(format!("{} ({})", reg, mode)))?;
        bank.values[idx] = value;
        Ok(())
    }

    /// Find the first mode, in resolution order, that holds `reg`.
    pub fn resolve_mode(&self, reg: Reg) -> Option<Mode> {
        self.banks.iter().find(|b| b.contains(reg)).map(|b| b.mode)
    }

    /// Resolve `reg` by name alone and return the winning mode with its value.
    pub fn resolve(&self, reg: Reg) -> Option<(Mode, u32)> {
        let mode = self.resolve_mode(reg)?;
        self.get(mode, reg).map(|v| (mode, v))
    }

    /// Pick one mode that holds both registers.
    ///
    /// `com` is preferred; otherwise the first mode in resolution order that
    /// holds both wins.
    pub fn resolve_pair(&self, a: Reg, b: Reg) -> Option<Mode> {
        self.banks
            .iter()
            .find(|bank| bank.contains(a) && bank.contains(b))
            .map(|bank| bank.mode)
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let regs = RegisterBank::new();
        for bank in regs.banks() {
            assert!(bank.iter().all(|(_, v)| v == 0));
        }
    }

    #[test]
    fn test_banked_sp_not_aliased() {
        let mut regs = RegisterBank::new();
        regs.set(Mode::Supervisor, Reg::Sp, 0x2000).unwrap();
        regs.set(Mode::Irq, Reg::Sp, 0x3000).unwrap();

        assert_eq!(regs.get(Mode::Supervisor, Reg::Sp), Some(0x2000));
        assert_eq!(regs.get(Mode::Irq, Reg::Sp), Some(0x3000));
        assert_eq!(regs.get(Mode::UserSystem, Reg::Sp), Some(0));
    }

    #[test]
    fn test_set_missing_slot_fails() {
        let mut regs = RegisterBank::new();
        let err = regs.set(Mode::Common, Reg::Sp, 1).unwrap_err();
        assert!(matches!(err, EngineError::RegisterNotFound(_)));
        assert_eq!(regs.get(Mode::Common, Reg::Sp), None);
    }

    #[test]
    fn test_resolve_order() {
        let regs = RegisterBank::new();
        // r8 lives in com and fiq; com comes first.
        assert_eq!(regs.resolve_mode(Reg::R(8)), Some(Mode::Common));
        // sp is not in com; usr/sys is the first bank holding it.
        assert_eq!(regs.resolve_mode(Reg::Sp), Some(Mode::UserSystem));
        assert_eq!(regs.resolve_mode(Reg::Pc), Some(Mode::Common));
    }

    #[test]
    fn test_resolve_pair() {
        let regs = RegisterBank::new();
        assert_eq!(regs.resolve_pair(Reg::R(0), Reg::R(1)), Some(Mode::Common));
        assert_eq!(regs.resolve_pair(Reg::Sp, Reg::Lr), Some(Mode::UserSystem));
        assert_eq!(regs.resolve_pair(Reg::R(9), Reg::Sp), Some(Mode::Fiq));
        assert_eq!(regs.resolve_pair(Reg::R(0), Reg::Sp), None);
    }
}
