//! 最小化的 cell 序列化底座。
//!
//! 提供位串构建/读取、引用管理以及标准表示哈希，线格式与链上保持逐位一致。

use std::fmt;
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};
use thiserror::Error;

mod address;
pub mod boc;
pub mod dict;

pub use address::{Address, AddressParseError};

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFS: usize = 4;
/// `VarUInteger 16` 最多 15 字节。
pub const MAX_COINS_BITS: usize = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("cell overflow: {bits} bits / {refs} refs")]
    Overflow { bits: usize, refs: usize },
    #[error("cell underflow: need {needed} bits, {available} left")]
    BitUnderflow { needed: usize, available: usize },
    #[error("cell underflow: no refs left")]
    RefUnderflow,
    #[error("integer width {0} is not supported")]
    IntegerWidth(usize),
    #[error("value {value} does not fit into {bits} bits")]
    ValueTooWide { value: u128, bits: usize },
    #[error("coins amount exceeds 120 bits")]
    CoinsOverflow,
    #[error("unsupported address tag {0:#04b}")]
    UnsupportedAddress(u8),
    #[error("address is addr_none")]
    MissingAddress,
    #[error("invalid dictionary: {0}")]
    Dictionary(String),
    #[error("invalid bag of cells: {0}")]
    Boc(String),
}

pub type CellResult<T> = Result<T, CellError>;

/// 不可变 cell，克隆只增加引用计数。
#[derive(Clone)]
pub struct Cell(Arc<CellInner>);

struct CellInner {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
    hash: OnceLock<[u8; 32]>,
    depth: OnceLock<u16>,
}

impl Cell {
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), 0, Vec::new())
    }

    fn from_parts(data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> Self {
        Cell(Arc::new(CellInner {
            data,
            bit_len,
            refs,
            hash: OnceLock::new(),
            depth: OnceLock::new(),
        }))
    }

    /// 由原始字节构造，多余的尾部位会被清零。
    pub fn from_raw(mut data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> CellResult<Self> {
        if bit_len > MAX_CELL_BITS || refs.len() > MAX_CELL_REFS {
            return Err(CellError::Overflow {
                bits: bit_len,
                refs: refs.len(),
            });
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(CellError::BitUnderflow {
                needed: bit_len,
                available: data.len() * 8,
            });
        }
        data.truncate(byte_len);
        let rem = bit_len % 8;
        if rem != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - rem);
            }
        }
        Ok(Self::from_parts(data, bit_len, refs))
    }

    pub fn bit_len(&self) -> usize {
        self.0.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    pub fn refs(&self) -> &[Cell] {
        &self.0.refs
    }

    pub fn parse(&self) -> CellSlice {
        CellSlice::new(self)
    }

    pub fn depth(&self) -> u16 {
        *self.0.depth.get_or_init(|| {
            self.0
                .refs
                .iter()
                .map(|child| child.depth() + 1)
                .max()
                .unwrap_or(0)
        })
    }

    /// 标准表示哈希（普通 cell，level 0）。
    pub fn repr_hash(&self) -> [u8; 32] {
        *self.0.hash.get_or_init(|| {
            let mut hasher = Sha256::new();
            let (d1, d2) = self.descriptors();
            hasher.update([d1, d2]);
            hasher.update(self.padded_data());
            for child in &self.0.refs {
                hasher.update(child.depth().to_be_bytes());
            }
            for child in &self.0.refs {
                hasher.update(child.repr_hash());
            }
            hasher.finalize().into()
        })
    }

    pub(crate) fn descriptors(&self) -> (u8, u8) {
        let d1 = self.0.refs.len() as u8;
        let d2 = (self.0.bit_len / 8 + self.0.bit_len.div_ceil(8)) as u8;
        (d1, d2)
    }

    /// 数据字节，不足整字节时追加完成标记位。
    pub(crate) fn padded_data(&self) -> Vec<u8> {
        let mut data = self.0.data.clone();
        let rem = self.0.bit_len % 8;
        if rem != 0 {
            if let Some(last) = data.last_mut() {
                *last |= 1 << (7 - rem);
            }
        }
        data
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.repr_hash() == other.repr_hash()
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell{{bits: {}, refs: {}, hash: {}}}",
            self.bit_len(),
            self.refs().len(),
            hex_string(&self.repr_hash())
        )
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn bit_at(data: &[u8], index: usize) -> bool {
    (data[index / 8] >> (7 - index % 8)) & 1 == 1
}

#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs_len(&self) -> usize {
        self.refs.len()
    }

    fn ensure_bits(&self, extra: usize) -> CellResult<()> {
        if self.bit_len + extra > MAX_CELL_BITS {
            return Err(CellError::Overflow {
                bits: self.bit_len + extra,
                refs: self.refs.len(),
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    fn push_uint(&mut self, value: u128, bits: usize) {
        for shift in (0..bits).rev() {
            self.push_bit((value >> shift) & 1 == 1);
        }
    }

    pub(crate) fn push_address(&mut self, address: &Address) {
        self.push_uint(0b10, 2);
        self.push_bit(false);
        self.push_uint(address.workchain() as u8 as u128, 8);
        for byte in address.hash_part() {
            self.push_uint(*byte as u128, 8);
        }
    }

    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    pub fn store_bits(&mut self, bits: &[bool]) -> CellResult<&mut Self> {
        self.ensure_bits(bits.len())?;
        for bit in bits {
            self.push_bit(*bit);
        }
        Ok(self)
    }

    pub fn store_uint(&mut self, value: u128, bits: usize) -> CellResult<&mut Self> {
        if bits > 128 {
            return Err(CellError::IntegerWidth(bits));
        }
        if bits < 128 && value >> bits != 0 {
            return Err(CellError::ValueTooWide { value, bits });
        }
        self.ensure_bits(bits)?;
        self.push_uint(value, bits);
        Ok(self)
    }

    pub fn store_u8(&mut self, value: u8) -> CellResult<&mut Self> {
        self.store_uint(value as u128, 8)
    }

    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint(value as u128, 32)
    }

    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint(value as u128, 64)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        self.ensure_bits(bytes.len() * 8)?;
        for byte in bytes {
            self.push_uint(*byte as u128, 8);
        }
        Ok(self)
    }

    /// `VarUInteger 16`：4 位字节长度 + 大端数值。
    pub fn store_coins(&mut self, amount: u128) -> CellResult<&mut Self> {
        if amount >> MAX_COINS_BITS != 0 {
            return Err(CellError::CoinsOverflow);
        }
        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        self.ensure_bits(4 + byte_len * 8)?;
        self.push_uint(byte_len as u128, 4);
        self.push_uint(amount, byte_len * 8);
        Ok(self)
    }

    /// `None` 写入 `addr_none$00`。
    pub fn store_address(&mut self, address: Option<&Address>) -> CellResult<&mut Self> {
        match address {
            None => self.store_uint(0, 2),
            Some(address) => {
                self.ensure_bits(Address::BIT_LEN)?;
                self.push_address(address);
                Ok(self)
            }
        }
    }

    pub fn store_ref(&mut self, cell: Cell) -> CellResult<&mut Self> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::Overflow {
                bits: self.bit_len,
                refs: self.refs.len() + 1,
            });
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn store_maybe_ref(&mut self, cell: Option<Cell>) -> CellResult<&mut Self> {
        match cell {
            Some(cell) => {
                if self.refs.len() >= MAX_CELL_REFS {
                    return Err(CellError::Overflow {
                        bits: self.bit_len + 1,
                        refs: self.refs.len() + 1,
                    });
                }
                self.store_bit(true)?;
                self.refs.push(cell);
                Ok(self)
            }
            None => self.store_bit(false),
        }
    }

    /// 追加另一个构建器的全部位与引用。
    pub fn store_builder(&mut self, other: &CellBuilder) -> CellResult<&mut Self> {
        self.ensure_bits(other.bit_len)?;
        if self.refs.len() + other.refs.len() > MAX_CELL_REFS {
            return Err(CellError::Overflow {
                bits: self.bit_len + other.bit_len,
                refs: self.refs.len() + other.refs.len(),
            });
        }
        for index in 0..other.bit_len {
            self.push_bit(bit_at(&other.data, index));
        }
        self.refs.extend(other.refs.iter().cloned());
        Ok(self)
    }

    /// 追加切片剩余的位与引用。
    pub fn store_slice(&mut self, slice: &CellSlice) -> CellResult<&mut Self> {
        let remaining = slice.remaining_bits();
        self.ensure_bits(remaining)?;
        let rest = slice.remaining_ref_cells();
        if self.refs.len() + rest.len() > MAX_CELL_REFS {
            return Err(CellError::Overflow {
                bits: self.bit_len + remaining,
                refs: self.refs.len() + rest.len(),
            });
        }
        let data = slice.cell.data();
        for index in slice.bit_pos..slice.cell.bit_len() {
            self.push_bit(bit_at(data, index));
        }
        self.refs.extend(rest.iter().cloned());
        Ok(self)
    }

    pub fn build(self) -> Cell {
        Cell::from_parts(self.data, self.bit_len, self.refs)
    }
}

/// 读取游标，持有 cell 的一份克隆。
#[derive(Debug, Clone)]
pub struct CellSlice {
    cell: Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl CellSlice {
    pub fn new(cell: &Cell) -> Self {
        Self {
            cell: cell.clone(),
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    fn remaining_ref_cells(&self) -> &[Cell] {
        &self.cell.refs()[self.ref_pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, needed: usize) -> CellResult<()> {
        let available = self.remaining_bits();
        if needed > available {
            return Err(CellError::BitUnderflow { needed, available });
        }
        Ok(())
    }

    pub fn load_bit(&mut self) -> CellResult<bool> {
        self.ensure_bits(1)?;
        let bit = bit_at(self.cell.data(), self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_bits(&mut self, count: usize) -> CellResult<Vec<bool>> {
        self.ensure_bits(count)?;
        let data = self.cell.data();
        let bits = (self.bit_pos..self.bit_pos + count)
            .map(|index| bit_at(data, index))
            .collect();
        self.bit_pos += count;
        Ok(bits)
    }

    pub fn load_uint(&mut self, bits: usize) -> CellResult<u128> {
        if bits > 128 {
            return Err(CellError::IntegerWidth(bits));
        }
        self.ensure_bits(bits)?;
        let data = self.cell.data();
        let mut value = 0u128;
        for index in self.bit_pos..self.bit_pos + bits {
            value = (value << 1) | bit_at(data, index) as u128;
        }
        self.bit_pos += bits;
        Ok(value)
    }

    pub fn load_u8(&mut self) -> CellResult<u8> {
        Ok(self.load_uint(8)? as u8)
    }

    pub fn load_u32(&mut self) -> CellResult<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    pub fn load_u64(&mut self) -> CellResult<u64> {
        Ok(self.load_uint(64)? as u64)
    }

    pub fn load_bytes32(&mut self) -> CellResult<[u8; 32]> {
        self.ensure_bits(256)?;
        let mut out = [0u8; 32];
        for byte in out.iter_mut() {
            *byte = self.load_u8()?;
        }
        Ok(out)
    }

    pub fn load_coins(&mut self) -> CellResult<u128> {
        let byte_len = self.load_uint(4)? as usize;
        self.load_uint(byte_len * 8)
    }

    /// 读取 `MsgAddressInt`，`addr_none` 返回 `None`。
    pub fn load_address(&mut self) -> CellResult<Option<Address>> {
        let tag = self.load_uint(2)? as u8;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(CellError::UnsupportedAddress(tag));
                }
                let workchain = self.load_u8()? as i8;
                let hash = self.load_bytes32()?;
                Ok(Some(Address::new(workchain, hash)))
            }
            other => Err(CellError::UnsupportedAddress(other)),
        }
    }

    pub fn load_required_address(&mut self) -> CellResult<Address> {
        self.load_address()?.ok_or(CellError::MissingAddress)
    }

    pub fn load_ref(&mut self) -> CellResult<Cell> {
        let cell = self
            .cell
            .refs()
            .get(self.ref_pos)
            .cloned()
            .ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(cell)
    }

    pub fn load_maybe_ref(&mut self) -> CellResult<Option<Cell>> {
        if self.load_bit()? {
            Ok(Some(self.load_ref()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_hash_matches_reference() {
        // sha256(0x00 0x00)
        assert_eq!(
            hex_string(&Cell::empty().repr_hash()),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn store_and_load_mixed_fields() {
        let mut builder = CellBuilder::new();
        builder
            .store_u32(0x3a8f7c12)
            .unwrap()
            .store_u64(7)
            .unwrap()
            .store_coins(1_000_000_000)
            .unwrap()
            .store_bit(true)
            .unwrap()
            .store_coins(0)
            .unwrap();
        let cell = builder.build();
        let mut slice = cell.parse();
        assert_eq!(slice.load_u32().unwrap(), 0x3a8f7c12);
        assert_eq!(slice.load_u64().unwrap(), 7);
        assert_eq!(slice.load_coins().unwrap(), 1_000_000_000);
        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_coins().unwrap(), 0);
        assert!(slice.is_empty());
    }

    #[test]
    fn coins_width_is_bounded() {
        let mut builder = CellBuilder::new();
        assert_eq!(
            builder.store_coins(1u128 << 120).unwrap_err(),
            CellError::CoinsOverflow
        );
        builder.store_coins((1u128 << 120) - 1).unwrap();
        assert_eq!(builder.bit_len(), 124);
    }

    #[test]
    fn coins_encoding_is_minimal() {
        let mut builder = CellBuilder::new();
        builder.store_coins(0).unwrap();
        assert_eq!(builder.bit_len(), 4);
        let mut builder = CellBuilder::new();
        builder.store_coins(256).unwrap();
        assert_eq!(builder.bit_len(), 4 + 16);
    }

    #[test]
    fn builder_rejects_overflow() {
        let mut builder = CellBuilder::new();
        for _ in 0..MAX_CELL_REFS {
            builder.store_ref(Cell::empty()).unwrap();
        }
        assert!(builder.store_ref(Cell::empty()).is_err());
        let mut builder = CellBuilder::new();
        builder.store_bits(&[true; MAX_CELL_BITS]).unwrap();
        assert!(builder.store_bit(false).is_err());
    }

    #[test]
    fn load_past_end_is_underflow() {
        let mut builder = CellBuilder::new();
        builder.store_u8(1).unwrap();
        let mut slice = builder.build().parse();
        assert!(matches!(
            slice.load_u32(),
            Err(CellError::BitUnderflow { needed: 32, available: 8 })
        ));
        assert_eq!(slice.load_ref().unwrap_err(), CellError::RefUnderflow);
    }

    #[test]
    fn depth_and_hash_follow_refs() {
        let mut leaf = CellBuilder::new();
        leaf.store_u8(0xab).unwrap();
        let leaf = leaf.build();
        let mut parent = CellBuilder::new();
        parent.store_ref(leaf.clone()).unwrap();
        let parent = parent.build();
        assert_eq!(leaf.depth(), 0);
        assert_eq!(parent.depth(), 1);
        assert_ne!(parent.repr_hash(), leaf.repr_hash());

        let mut again = CellBuilder::new();
        again.store_ref(leaf).unwrap();
        assert_eq!(again.build(), parent);
    }

    #[test]
    fn from_raw_clears_trailing_bits() {
        let cell = Cell::from_raw(vec![0xff], 3, Vec::new()).unwrap();
        assert_eq!(cell.data(), &[0xe0]);
        assert_eq!(cell.padded_data(), vec![0xf0]);
    }

    #[test]
    fn store_slice_copies_remaining_content() {
        let mut builder = CellBuilder::new();
        builder.store_u8(0x12).unwrap().store_u8(0x34).unwrap();
        builder.store_ref(Cell::empty()).unwrap();
        let mut slice = builder.build().parse();
        slice.load_u8().unwrap();
        let mut copy = CellBuilder::new();
        copy.store_slice(&slice).unwrap();
        let cell = copy.build();
        assert_eq!(cell.bit_len(), 8);
        assert_eq!(cell.data(), &[0x34]);
        assert_eq!(cell.refs().len(), 1);
    }
}
