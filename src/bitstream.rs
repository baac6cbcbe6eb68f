use bitvec::prelude::*;
use std::io::Write;

// Packs bits into bytes starting at the least significant bit of each byte.
pub struct BitWriter<W: Write> {
    w: W,
    output_bits: usize,
    output_byte: u8,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(w: W) -> Self {
        BitWriter {
            w,
            output_bits: 0,
            output_byte: 0,
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> std::io::Result<()> {
        if bit {
            self.output_byte |= 1 << self.output_bits;
        }
        self.output_bits += 1;
        self.bits_written += 1;
        if self.output_bits == 8 {
            self.w.write_all(&[self.output_byte])?;
            self.output_bits = 0;
            self.output_byte = 0;
        }
        Ok(())
    }

    // Writes the bits of a code in order, first bit first
    pub fn encode(&mut self, code: &BitSlice<u8, Msb0>) -> std::io::Result<()> {
        for bit in code.iter().by_vals() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    // Pads the last partial byte with zeros
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.output_bits > 0 {
            self.w.write_all(&[self.output_byte])?;
            self.output_bits = 0;
            self.output_byte = 0;
        }
        self.w.flush()
    }

    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.flush()?;
        Ok(self.w)
    }
}

// Reads bits in the order BitWriter wrote them.
pub struct BitReader<'a> {
    data: &'a [u8],
    data_p: usize,
    data_bit: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            data_p: 0,
            data_bit: 0,
        }
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.data_p)?;
        let bit = (byte >> self.data_bit) & 1 != 0;
        self.data_bit += 1;
        if self.data_bit == 8 {
            self.data_bit = 0;
            self.data_p += 1;
        }
        Some(bit)
    }

    pub fn bits_read(&self) -> u64 {
        self.data_p as u64 * 8 + self.data_bit as u64
    }
}
