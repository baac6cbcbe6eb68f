use crate::error::{Error, Result};
use std::io::Read;

/// Symbol id: 0..=255 for byte values, 256 for the end-of-stream sentinel.
pub type Symbol = u16;

pub const SENTINEL: Symbol = 256;

/// Number of distinct symbols, including the sentinel.
pub const ALPHABET_SIZE: usize = 257;

/// Per-symbol occurrence counts produced by a single pass over the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET_SIZE],
}

impl FrequencyTable {
    pub fn new() -> Self {
        FrequencyTable {
            counts: [0; ALPHABET_SIZE],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = FrequencyTable::new();
        for &b in bytes {
            table.add(b);
        }
        table
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut table = FrequencyTable::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };
            for &b in &buf[..n] {
                table.add(b);
            }
        }
        Ok(table)
    }

    #[inline]
    pub fn add(&mut self, byte: u8) {
        self.counts[byte as usize] += 1;
    }

    pub fn add_count(&mut self, symbol: Symbol, n: u64) -> Result<()> {
        let slot = self
            .counts
            .get_mut(symbol as usize)
            .ok_or(Error::InvalidSymbol(symbol))?;
        *slot = slot.checked_add(n).ok_or(Error::WeightOverflow)?;
        Ok(())
    }

    pub fn count(&self, symbol: Symbol) -> u64 {
        self.counts.get(symbol as usize).copied().unwrap_or(0)
    }

    // Number of input bytes observed; the sentinel is not part of the input
    pub fn total(&self) -> u64 {
        self.counts[..SENTINEL as usize]
            .iter()
            .fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Byte symbols with a nonzero count, in ascending symbol order.
    pub fn occurring(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts[..SENTINEL as usize]
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(s, &c)| (s as Symbol, c))
    }

    pub fn distinct(&self) -> usize {
        self.occurring().count()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}
