//! Processor modes and register names.
//!
//! ARMv7 keeps one copy of `r0..r12`, `pc` and `cpsr` shared by every mode
//! ("com" here), while each privileged mode has its own `sp`, `lr` and
//! `spsr`. FIQ additionally banks `r8..r12`.
//!
//! | mode    | banked registers              |
//! |---------|-------------------------------|
//! | com     | r0-r12, pc, cpsr              |
//! | usr/sys | sp, lr, spsr                  |
//! | svc     | sp, lr, spsr                  |
//! | abt     | sp, lr, spsr                  |
//! | und     | sp, lr, spsr                  |
//! | irq     | sp, lr, spsr                  |
//! | mon     | sp, lr, spsr                  |
//! | fiq     | r8-r12, sp, lr, spsr          |

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// A register bank partition.
///
/// The declaration order is the name-resolution order: when a register is
/// looked up by name alone, the first mode in [`Mode::ALL`] that holds it wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Registers shared by every mode.
    Common,
    /// User and System modes share one bank.
    UserSystem,
    /// Supervisor (SWI handler).
    Supervisor,
    /// Data or prefetch abort.
    Abort,
    /// Undefined instruction.
    Undefined,
    /// Normal interrupt.
    Irq,
    /// Secure monitor.
    Monitor,
    /// Fast interrupt.
    Fiq,
}

impl Mode {
    /// Every mode, in resolution order.
    pub const ALL: [Mode; 8] = [
        Mode::Common,
        Mode::UserSystem,
        Mode::Supervisor,
        Mode::Abort,
        Mode::Undefined,
        Mode::Irq,
        Mode::Monitor,
        Mode::Fiq,
    ];

    /// Position in [`Mode::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used in listings (`com`, `usr/sys`, `svc`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Common => "com",
            Mode::UserSystem => "usr/sys",
            Mode::Supervisor => "svc",
            Mode::Abort => "abt",
            Mode::Undefined => "und",
            Mode::Irq => "irq",
            Mode::Monitor => "mon",
            Mode::Fiq => "fiq",
        }
    }

    /// The register slots owned by this mode, in display order.
    pub fn slots(self) -> &'static [Reg] {
        use Reg::*;
        match self {
            Mode::Common => &[
                R(0), R(1), R(2), R(3), R(4), R(5), R(6), R(7),
                R(8), R(9), R(10), R(11), R(12), Pc, Cpsr,
            ],
            Mode::Fiq => &[R(8), R(9), R(10), R(11), R(12), Sp, Lr, Spsr],
            _ => &[Sp, Lr, Spsr],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "com" | "common" => Ok(Mode::Common),
            "usr/sys" | "usr" | "sys" | "user" | "system" => Ok(Mode::UserSystem),
            "svc" | "supervisor" => Ok(Mode::Supervisor),
            "abt" | "abort" => Ok(Mode::Abort),
            "und" | "undefined" => Ok(Mode::Undefined),
            "irq" => Ok(Mode::Irq),
            "mon" | "monitor" => Ok(Mode::Monitor),
            "fiq" => Ok(Mode::Fiq),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// A register name, independent of which bank holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    /// General purpose `r0`..`r12`.
    R(u8),
    /// Stack pointer (`r13`).
    Sp,
    /// Link register (`r14`).
    Lr,
    /// Program counter (`r15`).
    Pc,
    /// Current program status register.
    Cpsr,
    /// Saved program status register.
    Spsr,
}

impl Reg {
    /// Parse a register name, case-insensitively.
    ///
    /// `r13`, `r14` and `r15` are accepted as aliases for `sp`, `lr`, `pc`.
    pub fn parse(name: &str) -> Option<Reg> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "sp" => return Some(Reg::Sp),
            "lr" => return Some(Reg::Lr),
            "pc" => return Some(Reg::Pc),
            "cpsr" => return Some(Reg::Cpsr),
            "spsr" => return Some(Reg::Spsr),
            _ => {}
        }
        let num: u8 = lower.strip_prefix('r')?.parse().ok()?;
        Reg::from_number(num)
    }

    /// Map a numeric register index to its name.
    pub fn from_number(num: u8) -> Option<Reg> {
        match num {
            0..=12 => Some(Reg::R(num)),
            13 => Some(Reg::Sp),
            14 => Some(Reg::Lr),
            15 => Some(Reg::Pc),
            _ => None,
        }
    }

    /// Numeric index, if the register has one.
    pub fn number(self) -> Option<u8> {
        match self {
            Reg::R(n) => Some(n),
            Reg::Sp => Some(13),
            Reg::Lr => Some(14),
            Reg::Pc => Some(15),
            Reg::Cpsr | Reg::Spsr => None,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::R(n) => write!(f, "r{}", n),
            Reg::Sp => f.write_str("sp"),
            Reg::Lr => f.write_str("lr"),
            Reg::Pc => f.write_str("pc"),
            Reg::Cpsr => f.write_str("cpsr"),
            Reg::Spsr => f.write_str("spsr"),
        }
    }
}
