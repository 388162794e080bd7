//! Instruction decoder.
//!
//! Turns one line of assembly text into an [`Instruction`]. All operand
//! validation happens here, so the executor only ever sees well-formed
//! instructions.
//!
//! ```text
//! MOV  r0, #0x10          ; move immediate
//! ADD  r2, r1, #3         ; add immediate
//! LDR  r0, [r1]           ; load word at address in r1
//! LDR  r0, =msg           ; load label address
//! PUSH {r0, r2-r4, lr}    ; push list, ranges inclusive
//! .label msg = 0x2000     ; bind a label (.extern is a synonym)
//! ```

use std::fmt;
use crate::cpu::execute::EngineError;
use crate::cpu::mode::Reg;
use serde::{Serialize, Deserialize};

/// A decoded instruction with validated operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// `rd := imm`
    Mov { rd: Reg, imm: u32 },

    /// `rd := rn + imm`
    Add { rd: Reg, rn: Reg, imm: u32 },

    /// `rd := mem[rn / 4]`
    LdrIndirect { rd: Reg, rn: Reg },

    /// `rd := address of label`
    LdrLabel { rd: Reg, label: String },

    /// Push each register in list order.
    Push { regs: Vec<Reg> },

    /// Bind a label to an address.
    BindLabel { name: String, address: u32 },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Mov { rd, imm } => write!(f, "MOV {}, #{:#x}", rd, imm),
            Instruction::Add { rd, rn, imm } => write!(f, "ADD {}, {}, #{:#x}", rd, rn, imm),
            Instruction::LdrIndirect { rd, rn } => write!(f, "LDR {}, [{}]", rd, rn),
            Instruction::LdrLabel { rd, label } => write!(f, "LDR {}, ={}", rd, label),
            Instruction::Push { regs } => {
                let list: Vec<String> = regs.iter().map(|r| r.to_string()).collect();
                write!(f, "PUSH {{{}}}", list.join(", "))
            }
            Instruction::BindLabel { name, address } => {
                write!(f, ".label {} = {:#010x}", name, address)
            }
        }
    }
}

/// An entry in the reference command list shown by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub mnemonic: &'static str,
    pub syntax: &'static str,
    /// False for mnemonics that are listed for reference only.
    pub supported: bool,
}

/// Mnemonics shown in the command list. Only the supported ones execute.
pub const REFERENCE_COMMANDS: &[CommandInfo] = &[
    CommandInfo { mnemonic: "MOV", syntax: "MOV rd, #imm", supported: true },
    CommandInfo { mnemonic: "ADD", syntax: "ADD rd, rn, #imm", supported: true },
    CommandInfo { mnemonic: "SUB", syntax: "SUB rd, rn, #imm", supported: false },
    CommandInfo { mnemonic: "LDR", syntax: "LDR rd, [rn] | LDR rd, =label", supported: true },
    CommandInfo { mnemonic: "STR", syntax: "STR rd, [rn]", supported: false },
    CommandInfo { mnemonic: "PUSH", syntax: "PUSH {r0, r2-r4}", supported: true },
    CommandInfo { mnemonic: ".label", syntax: ".label name = 0xADDR", supported: true },
    CommandInfo { mnemonic: "B", syntax: "B label", supported: false },
    CommandInfo { mnemonic: "BL", syntax: "BL label", supported: false },
    CommandInfo { mnemonic: "NOP", syntax: "NOP", supported: false },
];

/// Directive keywords that bind labels, matched case-insensitively.
const DIRECTIVES: [&str; 4] = [".label", ".extern", "label", "extern"];

/// Marker between a label name and its address in a directive.
const DIRECTIVE_MARKER: char = '=';

/// Decode one line.
///
/// Returns `Ok(None)` for a line with no tokens.
pub fn decode(line: &str) -> Result<Option<Instruction>, EngineError> {
    let tokens = tokenize(line)?;
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    if is_directive(first) {
        return decode_directive(line, &tokens[1..]).map(Some);
    }

    let opcode = first.to_ascii_uppercase();
    let instr = match opcode.as_str() {
        "MOV" => {
            expect_operands(line, &tokens, 2, "MOV rd, #imm")?;
            Instruction::Mov {
                rd: parse_reg(&tokens[1])?,
                imm: parse_immediate(line, &tokens[2])?,
            }
        }
        "ADD" => {
            expect_operands(line, &tokens, 3, "ADD rd, rn, #imm")?;
            Instruction::Add {
                rd: parse_reg(&tokens[1])?,
                rn: parse_reg(&tokens[2])?,
                imm: parse_immediate(line, &tokens[3])?,
            }
        }
        "LDR" => {
            expect_operands(line, &tokens, 2, "LDR rd, [rn] or LDR rd, =label")?;
            let rd = parse_reg(&tokens[1])?;
            let src = tokens[2].as_str();
            if let Some(label) = src.strip_prefix('=') {
                if label.is_empty() {
                    return Err(malformed(line, "empty label after '='"));
                }
                Instruction::LdrLabel { rd, label: label.to_string() }
            } else if let Some(inner) = src.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                if inner.contains(',') {
                    return Err(malformed(line, "offset addressing not supported"));
                }
                Instruction::LdrIndirect { rd, rn: parse_reg(inner)? }
            } else {
                return Err(malformed(line, "expected [rn] or =label"));
            }
        }
        "PUSH" => {
            expect_operands(line, &tokens, 1, "PUSH {reglist}")?;
            Instruction::Push { regs: parse_register_list(line, &tokens[1])? }
        }
        _ => return Err(EngineError::UnsupportedInstruction(line.to_string())),
    };

    Ok(Some(instr))
}

/// Split a line into tokens.
///
/// Whitespace and commas separate tokens. A `{...}` or `[...]` group stays
/// one token with its inner whitespace removed and its commas kept.
pub fn tokenize(line: &str) -> Result<Vec<String>, EngineError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                current.push(c);
                loop {
                    match chars.next() {
                        Some(g) if g == close => {
                            current.push(g);
                            break;
                        }
                        Some(g) if g.is_whitespace() => {}
                        Some(g) => current.push(g),
                        None => {
                            return Err(malformed(line, &format!("missing closing '{}'", close)));
                        }
                    }
                }
            }
            c if c.is_whitespace() || c == ',' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Parse an integer literal: optional sign, then `0x`, `0o`, `0b` or decimal.
///
/// Single underscores may separate digits (`1_000`, `0x_ff`). A nonzero
/// decimal literal must not start with `0`.
pub fn parse_literal(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex.strip_prefix('_').unwrap_or(hex))
    } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        (8, oct.strip_prefix('_').unwrap_or(oct))
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, bin.strip_prefix('_').unwrap_or(bin))
    } else {
        (10, digits)
    };

    if body.is_empty() || body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return None;
    }
    let body = body.replace('_', "");
    // from_str_radix would accept a second sign here.
    if body.starts_with(['+', '-']) {
        return None;
    }
    if radix == 10 && body.starts_with('0') && body.bytes().any(|b| b != b'0') {
        return None;
    }
    let magnitude = i64::from_str_radix(&body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn is_directive(token: &str) -> bool {
    DIRECTIVES.iter().any(|d| d.eq_ignore_ascii_case(token))
}

fn decode_directive(line: &str, operands: &[String]) -> Result<Instruction, EngineError> {
    let rest = operands.join(" ");
    let (name, address) = rest
        .split_once(DIRECTIVE_MARKER)
        .ok_or_else(|| malformed(line, "expected `name = 0xADDR`"))?;

    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(malformed(line, "label name must be a single word"));
    }

    let hex = address.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    let address = u32::from_str_radix(hex, 16)
        .map_err(|_| malformed(line, &format!("invalid hex address `{}`", address.trim())))?;

    Ok(Instruction::BindLabel { name: name.to_string(), address })
}

fn expect_operands(line: &str, tokens: &[String], count: usize, usage: &str) -> Result<(), EngineError> {
    if tokens.len() == count + 1 {
        Ok(())
    } else {
        Err(malformed(
            line,
            &format!("expected {} operand(s), found {}: {}", count, tokens.len() - 1, usage),
        ))
    }
}

fn parse_reg(name: &str) -> Result<Reg, EngineError> {
    Reg::parse(name).ok_or_else(|| EngineError::RegisterNotFound(name.to_ascii_lowercase()))
}

fn parse_immediate(line: &str, token: &str) -> Result<u32, EngineError> {
    let text = token.strip_prefix('#').unwrap_or(token);
    let value = parse_literal(text)
        .ok_or_else(|| malformed(line, &format!("invalid immediate `{}`", token)))?;

    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(malformed(line, &format!("immediate `{}` does not fit in 32 bits", token)));
    }
    // Negative values keep their two's complement bit pattern.
    Ok(value as u32)
}

fn parse_register_list(line: &str, token: &str) -> Result<Vec<Reg>, EngineError> {
    let inner = token
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| malformed(line, "register list must be enclosed in braces"))?;

    let mut regs = Vec::new();
    for item in inner.split(',').filter(|s| !s.is_empty()) {
        match item.split_once('-') {
            Some((start, end)) => {
                let start = parse_reg(start)?;
                let end = parse_reg(end)?;
                let (Some(lo), Some(hi)) = (start.number(), end.number()) else {
                    return Err(malformed(line, &format!("`{}` is not a numbered range", item)));
                };
                if lo > hi {
                    return Err(malformed(line, &format!("descending range `{}`", item)));
                }
                regs.extend((lo..=hi).filter_map(Reg::from_number));
            }
            None => regs.push(parse_reg(item)?),
        }
    }

    if regs.is_empty() {
        return Err(malformed(line, "empty register list"));
    }
    Ok(regs)
}

fn malformed(line: &str, detail: &str) -> EngineError {
    EngineError::MalformedOperand(line.trim().to_string(), detail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_commas() {
        assert_eq!(tokenize("  ADD r2, r1,#3 ").unwrap(), vec!["ADD", "r2", "r1", "#3"]);
    }

    #[test]
    fn test_tokenize_keeps_groups() {
        assert_eq!(
            tokenize("PUSH { r0, r1 - r3 }").unwrap(),
            vec!["PUSH", "{r0,r1-r3}"]
        );
        assert_eq!(tokenize("LDR r0, [ r1 ]").unwrap(), vec!["LDR", "r0", "[r1]"]);
        assert!(tokenize("PUSH {r0").is_err());
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(decode("").unwrap(), None);
        assert_eq!(decode("   ,  ").unwrap(), None);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("5"), Some(5));
        assert_eq!(parse_literal("0x10"), Some(16));
        assert_eq!(parse_literal("0X1f"), Some(31));
        assert_eq!(parse_literal("0b101"), Some(5));
        assert_eq!(parse_literal("0o17"), Some(15));
        assert_eq!(parse_literal("-1"), Some(-1));
        assert_eq!(parse_literal("-0x10"), Some(-16));
        assert_eq!(parse_literal("0x"), None);
        assert_eq!(parse_literal("--1"), None);
        assert_eq!(parse_literal("r1"), None);
    }

    #[test]
    fn test_parse_literal_separators_and_leading_zeros() {
        assert_eq!(parse_literal("1_000"), Some(1000));
        assert_eq!(parse_literal("0x_ff"), Some(255));
        assert_eq!(parse_literal("0b1010_1010"), Some(0xAA));
        assert_eq!(parse_literal("-1_0"), Some(-10));
        assert_eq!(parse_literal("0"), Some(0));
        assert_eq!(parse_literal("00"), Some(0));
        assert_eq!(parse_literal("010"), None);
        assert_eq!(parse_literal("_1"), None);
        assert_eq!(parse_literal("1_"), None);
        assert_eq!(parse_literal("1__0"), None);
        assert_eq!(parse_literal("0x__1"), None);
        assert!(matches!(decode("MOV r0, #010"), Err(EngineError::MalformedOperand(..))));
    }

    #[test]
    fn test_decode_mov() {
        assert_eq!(
            decode("mov r0, #0x10").unwrap(),
            Some(Instruction::Mov { rd: Reg::R(0), imm: 16 })
        );
        // The immediate marker is optional.
        assert_eq!(
            decode("MOV sp, 4096").unwrap(),
            Some(Instruction::Mov { rd: Reg::Sp, imm: 4096 })
        );
        assert_eq!(
            decode("MOV r1, #-1").unwrap(),
            Some(Instruction::Mov { rd: Reg::R(1), imm: u32::MAX })
        );
    }

    #[test]
    fn test_decode_mov_errors() {
        assert!(matches!(decode("MOV r0"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("MOV r0, r1"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("MOV r0, #0x100000000"), Err(EngineError::MalformedOperand(..))));
        assert_eq!(
            decode("MOV r99, #1"),
            Err(EngineError::RegisterNotFound("r99".into()))
        );
    }

    #[test]
    fn test_decode_ldr_forms() {
        assert_eq!(
            decode("LDR r0, [r1]").unwrap(),
            Some(Instruction::LdrIndirect { rd: Reg::R(0), rn: Reg::R(1) })
        );
        assert_eq!(
            decode("LDR r0, =msg").unwrap(),
            Some(Instruction::LdrLabel { rd: Reg::R(0), label: "msg".into() })
        );
        assert!(matches!(decode("LDR r0, r1"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("LDR r0, ="), Err(EngineError::MalformedOperand(..))));
    }

    #[test]
    fn test_decode_ldr_offset_is_malformed() {
        assert_eq!(
            decode("LDR r0, [r1, #4]"),
            Err(EngineError::MalformedOperand(
                "LDR r0, [r1, #4]".into(),
                "offset addressing not supported".into(),
            ))
        );
    }

    #[test]
    fn test_decode_push_ranges() {
        assert_eq!(
            decode("PUSH {r0-r2}").unwrap(),
            decode("PUSH {r0, r1, r2}").unwrap()
        );
        assert_eq!(
            decode("push {r4, r12-lr}").unwrap(),
            Some(Instruction::Push { regs: vec![Reg::R(4), Reg::R(12), Reg::Sp, Reg::Lr] })
        );
        assert!(matches!(decode("PUSH {r3-r1}"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("PUSH {}"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("PUSH r0"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode("PUSH {r0, foo}"), Err(EngineError::RegisterNotFound(_))));
    }

    #[test]
    fn test_decode_directive() {
        let expected = Some(Instruction::BindLabel { name: "msg".into(), address: 0x2000 });
        assert_eq!(decode(".label msg = 0x2000").unwrap(), expected);
        assert_eq!(decode(".EXTERN msg=2000").unwrap(), expected);
        assert_eq!(decode("label msg = 0X2000").unwrap(), expected);
        assert!(matches!(decode(".label msg 0x2000"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode(".label = 0x2000"), Err(EngineError::MalformedOperand(..))));
        assert!(matches!(decode(".label msg = zz"), Err(EngineError::MalformedOperand(..))));
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(
            decode("FOO r0, r1"),
            Err(EngineError::UnsupportedInstruction("FOO r0, r1".into()))
        );
        assert!(matches!(decode("B loop"), Err(EngineError::UnsupportedInstruction(_))));
    }

    #[test]
    fn test_unsupported_keeps_raw_line() {
        assert_eq!(
            decode("  foo r0 \t"),
            Err(EngineError::UnsupportedInstruction("  foo r0 \t".into()))
        );
    }

    #[test]
    fn test_display_roundtrip() {
        for line in ["MOV r0, #5", "ADD r2, r1, #3", "LDR r0, [sp]", "LDR r0, =msg", "PUSH {r0-r2, lr}", ".label msg = 0x2000"] {
            let instr = decode(line).unwrap().unwrap();
            let again = decode(&instr.to_string()).unwrap().unwrap();
            assert_eq!(instr, again, "{}", line);
        }
    }

    #[test]
    fn test_reference_commands_match_decoder() {
        for cmd in REFERENCE_COMMANDS.iter().filter(|c| !c.supported) {
            assert!(matches!(
                decode(cmd.syntax),
                Err(EngineError::UnsupportedInstruction(_))
            ));
        }
    }
}
