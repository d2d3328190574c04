//! `HashmapE n X` 字典：定长键，值内联在叶子 cell 的标签之后。

use super::{Cell, CellBuilder, CellError, CellResult, CellSlice};

/// 字典键的位表示。
pub trait DictKey: Sized {
    const BITS: usize;

    fn to_bits(&self) -> Vec<bool>;

    fn from_bits(bits: &[bool]) -> Self;
}

impl DictKey for u8 {
    const BITS: usize = 8;

    fn to_bits(&self) -> Vec<bool> {
        (0..8).rev().map(|shift| (self >> shift) & 1 == 1).collect()
    }

    fn from_bits(bits: &[bool]) -> Self {
        bits.iter().fold(0u8, |acc, bit| (acc << 1) | *bit as u8)
    }
}

impl DictKey for [u8; 32] {
    const BITS: usize = 256;

    fn to_bits(&self) -> Vec<bool> {
        self.iter().flat_map(|byte| byte.to_bits()).collect()
    }

    fn from_bits(bits: &[bool]) -> Self {
        let mut out = [0u8; 32];
        for (byte, chunk) in out.iter_mut().zip(bits.chunks(8)) {
            *byte = u8::from_bits(chunk);
        }
        out
    }
}

/// 构建字典根 cell，空字典返回 `None`。
pub fn build_dict<K: DictKey>(entries: Vec<(K, CellBuilder)>) -> CellResult<Option<Cell>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut keyed: Vec<(Vec<bool>, CellBuilder)> = entries
        .into_iter()
        .map(|(key, value)| (key.to_bits(), value))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    if keyed.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(CellError::Dictionary("duplicate key".to_string()));
    }
    build_node(&keyed, 0, K::BITS).map(Some)
}

/// 以 `Maybe ^root` 形式写入字典。
pub fn store_dict<K: DictKey>(
    builder: &mut CellBuilder,
    entries: Vec<(K, CellBuilder)>,
) -> CellResult<()> {
    let root = build_dict(entries)?;
    builder.store_maybe_ref(root)?;
    Ok(())
}

/// 读取 `Maybe ^root` 字典，按键升序返回值切片。
pub fn load_dict<K: DictKey>(slice: &mut CellSlice) -> CellResult<Vec<(K, CellSlice)>> {
    match slice.load_maybe_ref()? {
        Some(root) => parse_dict(&root),
        None => Ok(Vec::new()),
    }
}

pub fn parse_dict<K: DictKey>(root: &Cell) -> CellResult<Vec<(K, CellSlice)>> {
    let mut out = Vec::new();
    parse_node(root, Vec::new(), K::BITS, &mut out)?;
    Ok(out
        .into_iter()
        .map(|(bits, value)| (K::from_bits(&bits), value))
        .collect())
}

fn build_node(
    entries: &[(Vec<bool>, CellBuilder)],
    offset: usize,
    key_bits: usize,
) -> CellResult<Cell> {
    let remaining = key_bits - offset;
    let first = &entries[0].0;
    let label_len = if entries.len() == 1 {
        remaining
    } else {
        let last = &entries[entries.len() - 1].0;
        (offset..key_bits)
            .take_while(|&index| first[index] == last[index])
            .count()
    };

    let mut builder = CellBuilder::new();
    store_label(&mut builder, &first[offset..offset + label_len], remaining)?;
    if label_len == remaining {
        builder.store_builder(&entries[0].1)?;
    } else {
        let fork = offset + label_len;
        let pivot = entries.partition_point(|(key, _)| !key[fork]);
        let left = build_node(&entries[..pivot], fork + 1, key_bits)?;
        let right = build_node(&entries[pivot..], fork + 1, key_bits)?;
        builder.store_ref(left)?.store_ref(right)?;
    }
    Ok(builder.build())
}

fn parse_node(
    cell: &Cell,
    prefix: Vec<bool>,
    key_bits: usize,
    out: &mut Vec<(Vec<bool>, CellSlice)>,
) -> CellResult<()> {
    let mut slice = cell.parse();
    let remaining = key_bits - prefix.len();
    let label = load_label(&mut slice, remaining)?;
    let mut key = prefix;
    key.extend(label);
    if key.len() == key_bits {
        out.push((key, slice));
        return Ok(());
    }
    let left = slice.load_ref()?;
    let right = slice.load_ref()?;
    let mut left_key = key.clone();
    left_key.push(false);
    parse_node(&left, left_key, key_bits, out)?;
    key.push(true);
    parse_node(&right, key, key_bits, out)
}

/// 标签长度字段的位宽：`ceil(log2(m + 1))`。
fn len_bits(max: usize) -> usize {
    (usize::BITS - max.leading_zeros()) as usize
}

fn store_label(builder: &mut CellBuilder, label: &[bool], max: usize) -> CellResult<()> {
    let len = label.len();
    let width = len_bits(max);
    let short_cost = 2 * len + 2;
    let long_cost = 2 + width + len;
    let same_cost = 3 + width;
    let uniform = len > 0 && label.iter().all(|bit| *bit == label[0]);

    if uniform && same_cost < short_cost.min(long_cost) {
        builder
            .store_uint(0b11, 2)?
            .store_bit(label[0])?
            .store_uint(len as u128, width)?;
    } else if long_cost < short_cost {
        builder
            .store_uint(0b10, 2)?
            .store_uint(len as u128, width)?
            .store_bits(label)?;
    } else {
        builder.store_bit(false)?;
        builder.store_bits(&vec![true; len])?.store_bit(false)?;
        builder.store_bits(label)?;
    }
    Ok(())
}

fn load_label(slice: &mut CellSlice, max: usize) -> CellResult<Vec<bool>> {
    let label = if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
            if len > max {
                return Err(CellError::Dictionary("label longer than key".to_string()));
            }
        }
        slice.load_bits(len)?
    } else if !slice.load_bit()? {
        let len = slice.load_uint(len_bits(max))? as usize;
        if len > max {
            return Err(CellError::Dictionary("label longer than key".to_string()));
        }
        slice.load_bits(len)?
    } else {
        let bit = slice.load_bit()?;
        let len = slice.load_uint(len_bits(max))? as usize;
        if len > max {
            return Err(CellError::Dictionary("label longer than key".to_string()));
        }
        vec![bit; len]
    };
    Ok(label)
}
