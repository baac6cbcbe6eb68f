// Self-describing container for Huffman-coded bytes.
//
// Layout:
//   magic    "HUF\x01"
//   n        varint, number of (symbol, weight) entries
//   entries  n x (symbol varint, weight varint), byte symbols only
//   payload  codes of the input bytes followed by the sentinel code,
//            LSB-first, zero-padded to a byte boundary
//
// The header carries the frequency table; the reader rebuilds the same tree
// with TreeBuilder, which is deterministic for a given table.

use crate::bitstream::{BitReader, BitWriter};
use crate::builder::TreeBuilder;
use crate::code::CodeTable;
use crate::config::Cfg;
use crate::error::{Error, Result};
use crate::frequency::{FrequencyTable, Symbol, SENTINEL};
use crate::tree::HuffmanTree;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MAGIC: [u8; 4] = *b"HUF\x01";

// At most one entry per byte value
const MAX_ENTRIES: u64 = SENTINEL as u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    pub input_bytes: u64,
    pub header_bytes: u64,
    pub payload_bits: u64,
    pub output_bytes: u64,
}

impl PackStats {
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64
    }
}

pub struct Packer {
    cfg: Cfg,
}

impl Packer {
    pub fn new(cfg: Cfg) -> Self {
        Packer { cfg }
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Builds the code for `input` and writes header and payload to `w`.
    pub fn pack<W: Write>(&self, input: &[u8], w: W) -> Result<PackStats> {
        let freq = FrequencyTable::from_bytes(input);
        let tree = TreeBuilder::build(&freq)?;
        let table = CodeTable::generate(&tree)?;
        self.write_packed(input, &freq, &table, w)
    }

    /// Writes `input` using an already generated code table.
    pub fn write_packed<W: Write>(
        &self,
        input: &[u8],
        freq: &FrequencyTable,
        table: &CodeTable,
        w: W,
    ) -> Result<PackStats> {
        check_table(freq, table)?;

        let mut header = Vec::with_capacity(4 + 16 * freq.distinct());
        header.extend_from_slice(&MAGIC);
        encode_varint(freq.distinct() as u64, &mut header);
        for (symbol, count) in freq.occurring() {
            encode_varint(symbol as u64, &mut header);
            encode_varint(count, &mut header);
        }

        let mut counter = CountingWriter::new(w);
        counter.write_all(&header)?;

        let mut bits = BitWriter::new(&mut counter);
        for &b in input {
            let code = table
                .code(b as Symbol)
                .ok_or(Error::InvalidSymbol(b as Symbol))?;
            bits.encode(code)?;
        }
        let payload_bits = bits.bits_written();
        let eof = table.code(SENTINEL).ok_or(Error::InvalidSymbol(SENTINEL))?;
        bits.encode(eof)?;
        bits.flush()?;
        drop(bits);

        let stats = PackStats {
            input_bytes: input.len() as u64,
            header_bytes: header.len() as u64,
            payload_bits,
            output_bytes: counter.written,
        };
        log::log!(
            self.cfg.lvl,
            "[{}] packed {} bytes into {} ({} header, {} payload bits), ratio {:.3}",
            self.cfg.log_prefix,
            stats.input_bytes,
            stats.output_bytes,
            stats.header_bytes,
            stats.payload_bits,
            stats.ratio()
        );
        Ok(stats)
    }

    /// Packs the file at `input` into `output`, going through `<output>.tmp`.
    pub fn pack_file(&self, input: &Path, output: &Path) -> Result<PackStats> {
        let data = std::fs::read(input)?;
        self.write_file(output, |w| self.pack(&data, w))
    }

    /// Like [`Packer::write_packed`] but into a file, with the same
    /// `.tmp` + rename handling as [`Packer::pack_file`].
    pub fn write_packed_file(
        &self,
        input: &[u8],
        freq: &FrequencyTable,
        table: &CodeTable,
        output: &Path,
    ) -> Result<PackStats> {
        self.write_file(output, |w| self.write_packed(input, freq, table, w))
    }

    // `output` only appears once the whole container has been written and synced
    fn write_file<F>(&self, output: &Path, write: F) -> Result<PackStats>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<PackStats>,
    {
        let tmp_path = tmp_path(output);

        let result = (|| -> Result<PackStats> {
            let file = File::create(&tmp_path)?;
            let mut w = BufWriter::with_capacity(self.cfg.buffer_size, file);
            let stats = write(&mut w)?;
            w.flush()?;
            w.get_ref().sync_all()?;
            Ok(stats)
        })();

        match result {
            Ok(stats) => {
                std::fs::rename(&tmp_path, output)?;
                Ok(stats)
            }
            Err(e) => {
                log::debug!("[{}] dropping {:?}: {}", self.cfg.log_prefix, tmp_path, e);
                let _ = std::fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }
}

impl Default for Packer {
    fn default() -> Self {
        Packer::new(Cfg::default())
    }
}

// The header is written from `freq`, the payload from `table`. If they
// disagree the reader rebuilds a different tree and decodes garbage.
fn check_table(freq: &FrequencyTable, table: &CodeTable) -> Result<()> {
    for symbol in 0..SENTINEL {
        let count = freq.count(symbol);
        let weight = table.get(symbol).map(|e| e.weight);
        let ok = match weight {
            Some(w) => count != 0 && w == count,
            None => count == 0,
        };
        if !ok {
            return Err(Error::InvalidArgument(format!(
                "code table does not match frequencies at {}: weight {:?}, count {}",
                symbol, weight, count
            )));
        }
    }
    if table.sentinel().is_none() {
        return Err(Error::InvalidSymbol(SENTINEL));
    }
    Ok(())
}

fn tmp_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Parses the header, returning the frequency table and the payload offset.
pub fn read_header(data: &[u8]) -> Result<(FrequencyTable, usize)> {
    if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
        return Err(Error::InvalidFormat("bad magic".into()));
    }
    let mut pos = MAGIC.len();
    let (n, read) = decode_varint(&data[pos..])?;
    pos += read;
    if n > MAX_ENTRIES {
        return Err(Error::InvalidFormat(format!("{} header entries", n)));
    }

    let mut freq = FrequencyTable::new();
    for _ in 0..n {
        let (symbol, read) = decode_varint(&data[pos..])?;
        pos += read;
        let (weight, read) = decode_varint(&data[pos..])?;
        pos += read;
        if symbol >= SENTINEL as u64 {
            return Err(Error::InvalidFormat(format!("symbol {} in header", symbol)));
        }
        if weight == 0 || freq.count(symbol as Symbol) != 0 {
            return Err(Error::InvalidFormat(format!("bad entry for symbol {}", symbol)));
        }
        freq.add_count(symbol as Symbol, weight)?;
    }
    Ok((freq, pos))
}

/// Inverse of [`Packer::pack`].
pub fn unpack(data: &[u8]) -> Result<Vec<u8>> {
    let (freq, payload_start) = read_header(data)?;
    let tree = TreeBuilder::build(&freq)?;
    let out = decode_payload(&tree, &data[payload_start..], freq.total())?;
    tree.release();
    Ok(out)
}

pub fn unpack_file(input: &Path, output: &Path) -> Result<u64> {
    let data = std::fs::read(input)?;
    let out = unpack(&data)?;
    std::fs::write(output, &out)?;
    Ok(out.len() as u64)
}

fn decode_payload(tree: &HuffmanTree, payload: &[u8], expected: u64) -> Result<Vec<u8>> {
    let nodes = tree.nodes();
    // every byte costs at least one bit
    let mut out = Vec::with_capacity(expected.min(payload.len() as u64 * 8) as usize);
    let mut reader = BitReader::new(payload);

    loop {
        let mut node = tree.root();
        while !nodes.is_leaf(node) {
            let bit = reader
                .read_bit()
                .ok_or_else(|| Error::InvalidFormat("payload ends before EOF code".into()))?;
            let next = if bit { nodes.right(node) } else { nodes.left(node) };
            node = next.ok_or(Error::BrokenLink(node))?;
        }
        let symbol = nodes
            .get(node)
            .and_then(|n| n.symbol)
            .ok_or_else(|| Error::CorruptTree(format!("leaf {} without symbol", node.index())))?;
        if symbol == SENTINEL {
            break;
        }
        if out.len() as u64 >= expected {
            return Err(Error::InvalidFormat("payload longer than header counts".into()));
        }
        out.push(symbol as u8);
    }

    if out.len() as u64 != expected {
        return Err(Error::InvalidFormat(format!(
            "decoded {} bytes, header says {}",
            out.len(),
            expected
        )));
    }
    Ok(out)
}

// Counts bytes passed through to the inner writer.
struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        CountingWriter { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

// A u64 needs at most ten 7-bit groups, the last holding a single bit
const MAX_VARINT_LEN: usize = 10;

/// Reads a varint written by [`encode_varint`], returning it and its length.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        let group = (byte & 0x7f) as u64;
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(Error::InvalidFormat("varint overflows u64".into()));
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(Error::InvalidFormat("varint longer than 10 bytes".into()))
    } else {
        Err(Error::InvalidFormat("truncated varint".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        for value in [0, 0x7f, 0x80, 0x3fff, 0x4000, 1 << 35, u64::MAX - 1, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            // trailing bytes belong to the next field
            buf.push(0xaa);
            assert_eq!(decode_varint(&buf).unwrap(), (value, buf.len() - 1));
        }

        // 2^64 does not fit
        let mut too_big = vec![0x80; 9];
        too_big.push(0x02);
        assert!(matches!(decode_varint(&too_big), Err(Error::InvalidFormat(_))));

        // eleven bytes, continuation bit still set on the tenth
        let too_long = [0xff; 11];
        assert!(matches!(decode_varint(&too_long), Err(Error::InvalidFormat(_))));

        assert!(matches!(decode_varint(&[]), Err(Error::InvalidFormat(_))));
        assert!(matches!(decode_varint(&[0xff, 0x80]), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_header_layout() {
        let mut out = Vec::new();
        let stats = Packer::default().pack(b"aab", &mut out).unwrap();
        // magic, n=2, (97, 2), (98, 1)
        assert_eq!(&out[..9], &[b'H', b'U', b'F', 1, 2, 97, 2, 98, 1]);
        assert_eq!(stats.header_bytes, 9);
        // a=1, b=01, EOF=00 -> 1 1 01 00
        assert_eq!(stats.payload_bits, 4);
        assert_eq!(out.len(), 10);
        assert_eq!(out[9], 0b0000_1011);
        assert_eq!(stats.output_bytes, 10);
    }

    #[test]
    fn test_empty_input_has_empty_payload() {
        let mut out = Vec::new();
        let stats = Packer::default().pack(b"", &mut out).unwrap();
        assert_eq!(out, vec![b'H', b'U', b'F', 1, 0]);
        assert_eq!(stats.payload_bits, 0);
        assert_eq!(unpack(&out).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_unpack_roundtrip() {
        let input = b"the quick brown fox jumps over the lazy dog".repeat(7);
        let mut out = Vec::new();
        Packer::default().pack(&input, &mut out).unwrap();
        assert!(out.len() < input.len());
        assert_eq!(unpack(&out).unwrap(), input);
    }

    #[test]
    fn test_unpack_rejects_bad_input() {
        assert!(matches!(unpack(b"nope"), Err(Error::InvalidFormat(_))));

        let mut out = Vec::new();
        Packer::default().pack(b"abcabcabc", &mut out).unwrap();
        let truncated = &out[..out.len() - 1];
        assert!(matches!(unpack(truncated), Err(Error::InvalidFormat(_))));

        // duplicate symbol in header
        let bad = [b'H', b'U', b'F', 1, 2, 97, 1, 97, 1];
        assert!(matches!(unpack(&bad), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_write_packed_rejects_foreign_table() {
        let packer = Packer::default();
        let input = b"abracadabra";
        let freq = FrequencyTable::from_bytes(input);

        // same symbols, different weights
        let other = FrequencyTable::from_bytes(b"abracadabrrrrr");
        let tree = TreeBuilder::build(&other).unwrap();
        let table = CodeTable::generate(&tree).unwrap();
        let mut out = Vec::new();
        let err = packer.write_packed(input, &freq, &table, &mut out).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(out.is_empty());

        // superset of the input's symbols
        let other = FrequencyTable::from_bytes(b"abracadabraz");
        let tree = TreeBuilder::build(&other).unwrap();
        let table = CodeTable::generate(&tree).unwrap();
        assert!(matches!(
            packer.write_packed(input, &freq, &table, &mut Vec::new()),
            Err(Error::InvalidArgument(_))
        ));

        // the matching table still goes through and round-trips
        let tree = TreeBuilder::build(&freq).unwrap();
        let table = CodeTable::generate(&tree).unwrap();
        let mut out = Vec::new();
        packer.write_packed(input, &freq, &table, &mut out).unwrap();
        assert_eq!(unpack(&out).unwrap(), input);
    }
}
