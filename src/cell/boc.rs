//! 单根 bag-of-cells 编解码，用于持久化状态文件。

use std::collections::{HashMap, HashSet};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Buf, BufMut, BytesMut};

use super::{Cell, CellError, CellResult};

pub const BOC_MAGIC: u32 = 0xb5ee9c72;

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;
const SIZE_MASK: u8 = 0x07;

fn boc_err(message: impl Into<String>) -> CellError {
    CellError::Boc(message.into())
}

fn bytes_needed(value: usize) -> usize {
    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8).max(1)
}

/// 按逆后序（父节点在前）排列并按哈希去重。
fn topological_order(root: &Cell) -> Vec<Cell> {
    fn visit(cell: &Cell, seen: &mut HashSet<[u8; 32]>, out: &mut Vec<Cell>) {
        if !seen.insert(cell.repr_hash()) {
            return;
        }
        for child in cell.refs() {
            visit(child, seen, out);
        }
        out.push(cell.clone());
    }

    let mut out = Vec::new();
    visit(root, &mut HashSet::new(), &mut out);
    out.reverse();
    out
}

pub fn serialize(root: &Cell) -> Vec<u8> {
    let cells = topological_order(root);
    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(position, cell)| (cell.repr_hash(), position))
        .collect();

    let ref_size = bytes_needed(cells.len());
    let total_size: usize = cells
        .iter()
        .map(|cell| 2 + cell.bit_len().div_ceil(8) + cell.refs().len() * ref_size)
        .sum();
    let offset_size = bytes_needed(total_size);

    let mut buf = BytesMut::with_capacity(total_size + 16);
    buf.put_u32(BOC_MAGIC);
    buf.put_u8(ref_size as u8);
    buf.put_u8(offset_size as u8);
    buf.put_uint(cells.len() as u64, ref_size);
    buf.put_uint(1, ref_size);
    buf.put_uint(0, ref_size);
    buf.put_uint(total_size as u64, offset_size);
    buf.put_uint(0, ref_size);

    for cell in &cells {
        let (d1, d2) = cell.descriptors();
        buf.put_u8(d1);
        buf.put_u8(d2);
        buf.put_slice(&cell.padded_data());
        for child in cell.refs() {
            let position = index.get(&child.repr_hash()).copied().unwrap_or_default();
            buf.put_uint(position as u64, ref_size);
        }
    }
    buf.to_vec()
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn read_uint(buf: &mut &[u8], size: usize) -> CellResult<usize> {
    if size == 0 || size > 8 {
        return Err(boc_err(format!("unsupported field size {size}")));
    }
    if buf.remaining() < size {
        return Err(boc_err("unexpected end of data"));
    }
    Ok(buf.get_uint(size) as usize)
}

pub fn deserialize(input: &[u8]) -> CellResult<Cell> {
    let mut buf = input;
    if buf.remaining() < 6 {
        return Err(boc_err("too short"));
    }
    let magic = buf.get_u32();
    if magic != BOC_MAGIC {
        return Err(boc_err(format!("unknown magic {magic:#010x}")));
    }
    let flags = buf.get_u8();
    let ref_size = (flags & SIZE_MASK) as usize;
    let offset_size = buf.get_u8() as usize;
    let cell_count = read_uint(&mut buf, ref_size)?;
    let root_count = read_uint(&mut buf, ref_size)?;
    let _absent = read_uint(&mut buf, ref_size)?;
    let total_size = read_uint(&mut buf, offset_size)?;
    if root_count == 0 {
        return Err(boc_err("no roots"));
    }
    // 每个单元至少占两个描述字节
    if cell_count > total_size / 2 || cell_count > input.len() || root_count > cell_count {
        return Err(boc_err(format!(
            "header declares {cell_count} cells with {root_count} roots in {total_size} bytes"
        )));
    }
    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        roots.push(read_uint(&mut buf, ref_size)?);
    }
    if flags & FLAG_HAS_IDX != 0 {
        let skip = cell_count
            .checked_mul(offset_size)
            .ok_or_else(|| boc_err("index size overflow"))?;
        if buf.remaining() < skip {
            return Err(boc_err("truncated index"));
        }
        buf.advance(skip);
    }
    if buf.remaining() < total_size {
        return Err(boc_err("truncated cell data"));
    }
    let (mut cell_data, rest) = buf.split_at(total_size);
    buf = rest;

    if flags & FLAG_HAS_CRC != 0 {
        if buf.remaining() < 4 {
            return Err(boc_err("missing crc32c"));
        }
        let expected = buf.get_u32_le();
        let covered = &input[..input.len() - buf.remaining() - 4];
        if crc32c(covered) != expected {
            return Err(boc_err("crc32c mismatch"));
        }
    }

    let mut raw = Vec::with_capacity(cell_count);
    for position in 0..cell_count {
        if cell_data.remaining() < 2 {
            return Err(boc_err("truncated cell header"));
        }
        let d1 = cell_data.get_u8();
        let d2 = cell_data.get_u8();
        if d1 & 0x08 != 0 {
            return Err(boc_err("exotic cells are not supported"));
        }
        if d1 & 0x10 != 0 {
            return Err(boc_err("stored hashes are not supported"));
        }
        let ref_count = (d1 & 0x07) as usize;
        let byte_len = (d2 as usize).div_ceil(2);
        if cell_data.remaining() < byte_len {
            return Err(boc_err("truncated cell payload"));
        }
        let data = cell_data[..byte_len].to_vec();
        cell_data.advance(byte_len);
        let bit_len = if d2 % 2 == 1 {
            let last = data.last().copied().unwrap_or(0);
            if last == 0 {
                return Err(boc_err("missing completion tag"));
            }
            byte_len * 8 - (last.trailing_zeros() as usize + 1)
        } else {
            byte_len * 8
        };
        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let child = read_uint(&mut cell_data, ref_size)?;
            if child <= position || child >= cell_count {
                return Err(boc_err(format!("bad reference {child} from cell {position}")));
            }
            refs.push(child);
        }
        raw.push(RawCell {
            data,
            bit_len,
            refs,
        });
    }

    let mut built: Vec<Option<Cell>> = vec![None; cell_count];
    for position in (0..cell_count).rev() {
        let entry = &raw[position];
        let refs = entry
            .refs
            .iter()
            .map(|child| {
                built[*child]
                    .clone()
                    .ok_or_else(|| boc_err("reference to unbuilt cell"))
            })
            .collect::<CellResult<Vec<_>>>()?;
        built[position] = Some(Cell::from_raw(entry.data.clone(), entry.bit_len, refs)?);
    }

    built
        .get(roots[0])
        .cloned()
        .flatten()
        .ok_or_else(|| boc_err("root index out of range"))
}

pub fn to_base64(root: &Cell) -> String {
    STANDARD.encode(serialize(root))
}

pub fn from_base64(value: &str) -> CellResult<Cell> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|err| boc_err(err.to_string()))?;
    deserialize(&bytes)
}

fn crc32c(data: &[u8]) -> u32 {
    const POLY: u32 = 0x82f6_3b78;
    let mut crc = !0u32;
    for byte in data {
        crc ^= *byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;

    fn sample_tree() -> Cell {
        let mut shared = CellBuilder::new();
        shared.store_u32(0xdeadbeef).unwrap();
        let shared = shared.build();

        let mut odd = CellBuilder::new();
        odd.store_bits(&[true, false, true]).unwrap();
        odd.store_ref(shared.clone()).unwrap();
        let odd = odd.build();

        let mut root = CellBuilder::new();
        root.store_u8(7).unwrap();
        root.store_ref(odd).unwrap().store_ref(shared).unwrap();
        root.build()
    }

    #[test]
    fn crc32c_reference_vector() {
        assert_eq!(crc32c(b"123456789"), 0xe306_9283);
    }

    #[test]
    fn empty_cell_encoding_is_canonical() {
        let bytes = serialize(&Cell::empty());
        assert_eq!(
            bytes,
            vec![0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn shared_cells_are_deduplicated() {
        let root = sample_tree();
        let bytes = serialize(&root);
        // 三个不同 cell
        assert_eq!(bytes[6], 3);
        let decoded = deserialize(&bytes).unwrap();
        assert_eq!(decoded, root);
        assert_eq!(decoded.refs()[0].bit_len(), 3);
    }

    #[test]
    fn crc_trailer_is_checked() {
        let mut bytes = serialize(&sample_tree());
        bytes[4] |= FLAG_HAS_CRC;
        let crc = crc32c(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(deserialize(&bytes).unwrap(), sample_tree());

        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn base64_round_trip() {
        let root = sample_tree();
        assert_eq!(from_base64(&to_base64(&root)).unwrap(), root);
        assert!(from_base64("not base64!").is_err());
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = serialize(&Cell::empty());
        bytes[0] = 0;
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn rejects_cell_count_larger_than_payload() {
        let mut bytes = BOC_MAGIC.to_be_bytes().to_vec();
        // ref_size 4, offset_size 1
        bytes.extend_from_slice(&[0x04, 0x01]);
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(2);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]);
        let err = deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("4294967295 cells"), "{err}");
    }
}
