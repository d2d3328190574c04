//! 等待账本：按用户记录尚未凑齐的多腿到账余额。

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::cell::dict::{load_dict, store_dict};
use crate::cell::{Address, CellBuilder, CellError, CellResult, CellSlice, hex_string};
use crate::constants::Coins;

/// 用户地址 cell 的表示哈希，作为定长字典键。
pub type UserKey = [u8; 32];

pub fn user_key(address: &Address) -> UserKey {
    address.to_cell().repr_hash()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("leg {index} out of range for {legs} baskets")]
    IndexOutOfRange { index: usize, legs: usize },
    #[error("leg balance overflow")]
    Overflow,
    #[error(transparent)]
    Cell(#[from] CellError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// 单个用户的稀疏腿余额。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WaitingEntry {
    balances: BTreeMap<u8, Coins>,
}

impl WaitingEntry {
    pub fn legs(&self) -> usize {
        self.balances.len()
    }

    pub fn balance(&self, index: u8) -> Option<Coins> {
        self.balances.get(&index).copied()
    }

    pub fn balances(&self) -> &BTreeMap<u8, Coins> {
        &self.balances
    }

    fn add(&mut self, index: u8, amount: Coins) -> LedgerResult<Coins> {
        let slot = self.balances.entry(index).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(*slot)
    }
}

/// 一次到账记录的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegRecord {
    /// 尚未凑齐，`held` 为已到账的腿数。
    Pending { held: usize, balance: Coins },
    /// 全部腿到齐，条目已从账本移除。
    Complete(WaitingEntry),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitingLedger {
    entries: BTreeMap<UserKey, WaitingEntry>,
}

impl WaitingLedger {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &UserKey) -> Option<&WaitingEntry> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &UserKey) -> Option<WaitingEntry> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserKey, &WaitingEntry)> {
        self.entries.iter()
    }

    /// 累加一条腿的到账金额；凑齐 `legs` 条时取出整个条目。
    pub fn record(
        &mut self,
        key: UserKey,
        index: usize,
        amount: Coins,
        legs: usize,
    ) -> LedgerResult<LegRecord> {
        if index >= legs || index > u8::MAX as usize {
            return Err(LedgerError::IndexOutOfRange { index, legs });
        }
        let entry = self.entries.entry(key).or_default();
        let balance = entry.add(index as u8, amount)?;
        if entry.legs() < legs {
            return Ok(LegRecord::Pending {
                held: entry.legs(),
                balance,
            });
        }
        let complete = self.entries.remove(&key).unwrap_or_default();
        Ok(LegRecord::Complete(complete))
    }

    /// 布局：`HashmapE 256 (HashmapE 8 ^[coins])`。
    pub fn store(&self, builder: &mut CellBuilder) -> CellResult<()> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (key, entry) in &self.entries {
            let mut legs = Vec::with_capacity(entry.legs());
            for (index, balance) in &entry.balances {
                let mut amount = CellBuilder::new();
                amount.store_coins(*balance)?;
                let mut value = CellBuilder::new();
                value.store_ref(amount.build())?;
                legs.push((*index, value));
            }
            let mut value = CellBuilder::new();
            store_dict(&mut value, legs)?;
            entries.push((*key, value));
        }
        store_dict(builder, entries)
    }

    pub fn load(slice: &mut CellSlice) -> CellResult<Self> {
        let mut entries = BTreeMap::new();
        for (key, mut value) in load_dict::<UserKey>(slice)? {
            let mut balances = BTreeMap::new();
            for (index, mut leg) in load_dict::<u8>(&mut value)? {
                let amount = leg.load_ref()?.parse().load_coins()?;
                balances.insert(index, amount);
            }
            entries.insert(key, WaitingEntry { balances });
        }
        Ok(Self { entries })
    }

    pub fn snapshot(&self) -> Vec<WaitingSnapshot> {
        self.entries
            .iter()
            .map(|(key, entry)| WaitingSnapshot {
                user_key: hex_string(key),
                balances: entry
                    .balances
                    .iter()
                    .map(|(index, balance)| (*index, balance.to_string()))
                    .collect(),
            })
            .collect()
    }
}

/// 只读输出用的账本条目。
#[derive(Debug, Clone, Serialize)]
pub struct WaitingSnapshot {
    pub user_key: String,
    pub balances: BTreeMap<u8, String>,
}
