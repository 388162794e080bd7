//! Word-addressed memory.
//!
//! Storage is sparse: only words that have been written are kept and every
//! other word reads as zero. Keys are word indices; callers holding a byte
//! address (a register value) go through [`Memory::read`] / [`Memory::write`],
//! which divide by [`WORD_SIZE`].

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Bytes per word.
pub const WORD_SIZE: u32 = 4;

/// Convert a byte address to a word index.
#[inline]
pub const fn word_index(byte_addr: u32) -> u32 {
    byte_addr / WORD_SIZE
}

/// Sparse word memory, optionally bounded to a fixed number of words.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    words: BTreeMap<u32, u32>,
    limit: Option<u32>,
}

impl Memory {
    /// Create an unbounded, empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory that rejects word indices `>= words`.
    pub fn bounded(words: u32) -> Self {
        Self {
            words: BTreeMap::new(),
            limit: Some(words),
        }
    }

    /// Size limit in words, if any.
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    fn check(&self, byte_addr: u32) -> Result<u32, MemoryError> {
        let index = word_index(byte_addr);
        match self.limit {
            Some(limit) if index >= limit => Err(MemoryError::AddressOutOfRange(byte_addr)),
            _ => Ok(index),
        }
    }

    /// Read the word containing `byte_addr`. Unwritten words are zero.
    pub fn read(&self, byte_addr: u32) -> Result<u32, MemoryError> {
        let index = self.check(byte_addr)?;
        Ok(self.read_word(index))
    }

    /// Write the word containing `byte_addr`.
    pub fn write(&mut self, byte_addr: u32, value: u32) -> Result<(), MemoryError> {
        let index = self.check(byte_addr)?;
        self.words.insert(index, value);
        Ok(())
    }

    /// Read by word index, without bounds checking.
    #[inline]
    pub fn read_word(&self, index: u32) -> u32 {
        self.words.get(&index).copied().unwrap_or(0)
    }

    /// Written words as `(word index, value)`, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words.iter().map(|(&i, &v)| (i, v))
    }

    /// Number of words that have been written.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("written_words", &self.words.len())
            .field("limit", &self.limit)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Byte address falls outside a bounded memory.
    #[error("memory address {0:#010x} out of range")]
    AddressOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_reads_zero() {
        let mem = Memory::new();
        assert_eq!(mem.read(0x1000).unwrap(), 0);
        assert!(mem.is_empty());
    }

    #[test]
    fn test_byte_to_word_conversion() {
        let mut mem = Memory::new();
        mem.write(0x10, 42).unwrap();

        // Any byte inside the same word hits the same cell.
        assert_eq!(mem.read(0x10).unwrap(), 42);
        assert_eq!(mem.read(0x13).unwrap(), 42);
        assert_eq!(mem.read_word(4), 42);
        assert_eq!(mem.iter().collect::<Vec<_>>(), vec![(4, 42)]);
    }

    #[test]
    fn test_bounded() {
        let mut mem = Memory::bounded(64);
        assert!(mem.write(63 * 4, 1).is_ok());
        assert_eq!(
            mem.write(64 * 4, 1),
            Err(MemoryError::AddressOutOfRange(256))
        );
        assert_eq!(mem.read(0x400), Err(MemoryError::AddressOutOfRange(0x400)));
        assert_eq!(mem.len(), 1);
    }
}
