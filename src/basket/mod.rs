//! 篮子注册表：有序的加权腿集合与统一的 DEX 入口。

pub mod codec;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{Address, CellError};
use crate::constants::{Coins, MAX_BASKETS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BasketError {
    #[error("basket set is empty")]
    Empty,
    #[error("too many baskets: {0}")]
    TooMany(usize),
    #[error("basket {index} has zero weight")]
    ZeroWeight { index: usize },
    #[error("basket {index} routes via {found}, vault uses {expected}")]
    MixedDex {
        index: usize,
        expected: DexKind,
        found: DexKind,
    },
    #[error("basket index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("basket {index} reuses the wallet of an earlier basket")]
    DuplicateWallet { index: usize },
    #[error("{0} baskets require a dex endpoint")]
    MissingEndpoint(DexKind),
    #[error("unknown dex tag {0}")]
    UnknownDexTag(u8),
    #[error("basket count {declared} does not match {actual} entries")]
    CountMismatch { declared: usize, actual: usize },
    #[error("basket keys must be 0..{len}, found {key}")]
    SparseKeys { key: u8, len: usize },
    #[error(transparent)]
    Cell(#[from] CellError),
}

pub type BasketResult<T> = Result<T, BasketError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DexKind {
    DeDust,
    StonFi,
}

impl DexKind {
    pub const fn tag(self) -> u8 {
        match self {
            DexKind::DeDust => 0,
            DexKind::StonFi => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DexKind::DeDust => "dedust",
            DexKind::StonFi => "stonfi",
        }
    }
}

impl fmt::Display for DexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DeDust：每个交易对直接寻址池子与 jetton vault。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeDustRoute {
    pub pool: Address,
    pub jetton_vault: Address,
}

/// StonFi：共享路由器 + 路由器侧本地钱包 + 基础资产代理钱包。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StonFiRoute {
    pub router: Address,
    pub proxy_base: Address,
    pub router_local_wallet: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dex", rename_all = "lowercase")]
pub enum DexRoute {
    DeDust(DeDustRoute),
    StonFi(StonFiRoute),
}

impl DexRoute {
    pub const fn kind(&self) -> DexKind {
        match self {
            DexRoute::DeDust(_) => DexKind::DeDust,
            DexRoute::StonFi(_) => DexKind::StonFi,
        }
    }
}

/// 单条腿的配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    /// 以 `INDEX_UNIT` 为 1 的定点权重。
    pub weight: Coins,
    /// 金库持有该目标资产的 jetton 钱包。
    pub wallet: Address,
    pub master: Address,
    pub route: DexRoute,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BasketRegistry {
    baskets: Vec<Basket>,
    dex_endpoint: Option<Address>,
}

impl BasketRegistry {
    /// 未配置的注册表，仅用于尚未启用的金库。
    pub fn unconfigured(dex_endpoint: Option<Address>) -> Self {
        Self {
            baskets: Vec::new(),
            dex_endpoint,
        }
    }

    pub fn new(baskets: Vec<Basket>, dex_endpoint: Option<Address>) -> BasketResult<Self> {
        Self::validate(&baskets, dex_endpoint.as_ref())?;
        Ok(Self {
            baskets,
            dex_endpoint,
        })
    }

    fn validate(baskets: &[Basket], dex_endpoint: Option<&Address>) -> BasketResult<()> {
        let first = baskets.first().ok_or(BasketError::Empty)?;
        if baskets.len() > MAX_BASKETS {
            return Err(BasketError::TooMany(baskets.len()));
        }
        let expected = first.route.kind();
        for (index, basket) in baskets.iter().enumerate() {
            if basket.weight == 0 {
                return Err(BasketError::ZeroWeight { index });
            }
            if baskets[..index].iter().any(|earlier| earlier.wallet == basket.wallet) {
                return Err(BasketError::DuplicateWallet { index });
            }
            let found = basket.route.kind();
            if found != expected {
                return Err(BasketError::MixedDex {
                    index,
                    expected,
                    found,
                });
            }
        }
        if expected == DexKind::DeDust && dex_endpoint.is_none() {
            return Err(BasketError::MissingEndpoint(expected));
        }
        Ok(())
    }

    /// 整体替换配置；校验失败时保持原状。
    pub fn configure(
        &mut self,
        baskets: Vec<Basket>,
        dex_endpoint: Option<Address>,
    ) -> BasketResult<()> {
        Self::validate(&baskets, dex_endpoint.as_ref())?;
        self.baskets = baskets;
        self.dex_endpoint = dex_endpoint;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.baskets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baskets.is_empty()
    }

    pub fn baskets(&self) -> &[Basket] {
        &self.baskets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Basket> {
        self.baskets.iter()
    }

    pub fn basket_at(&self, index: usize) -> BasketResult<&Basket> {
        self.baskets.get(index).ok_or(BasketError::IndexOutOfRange {
            index,
            len: self.baskets.len(),
        })
    }

    pub fn dex_endpoint(&self) -> Option<&Address> {
        self.dex_endpoint.as_ref()
    }

    pub fn dex_kind(&self) -> Option<DexKind> {
        self.baskets.first().map(|basket| basket.route.kind())
    }

    /// 按通知来源钱包定位腿。
    pub fn position_of_wallet(&self, wallet: &Address) -> Option<usize> {
        self.baskets
            .iter()
            .position(|basket| &basket.wallet == wallet)
    }

    pub fn total_weight(&self) -> Option<Coins> {
        self.baskets
            .iter()
            .try_fold(0 as Coins, |acc, basket| acc.checked_add(basket.weight))
    }
}
