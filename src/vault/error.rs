use thiserror::Error;

use crate::basket::BasketError;
use crate::cell::{Address, CellError};
use crate::constants::Coins;
use crate::dexes::DexError;
use crate::ledger::LedgerError;

/// 入站消息失败的分类，每一种对应链上可观察的退出码。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("sender is not the admin")]
    NotAdmin,
    #[error("burn notification is not authorized")]
    UnauthorizedBurn,
    #[error("discovery fee not matched: {actual} < {required}")]
    DiscoveryFeeNotMatched { required: Coins, actual: Coins },
    #[error("invalid deposit body: {0}")]
    InvalidDepositBody(String),
    #[error("deposit {sum} below minimum exchange amount {min}")]
    MinExchangeAmountNotMet { sum: Coins, min: Coins },
    #[error("attached value {actual} does not equal required {expected}")]
    InvalidTonAmount { expected: Coins, actual: Coins },
    #[error("not enough gas: {actual} < {required}")]
    NotEnoughGas { required: Coins, actual: Coins },
    #[error("notification from non-basket wallet {0}")]
    NonBasketToken(Address),
    #[error("invalid vault data: {0}")]
    InvalidVaultData(String),
    #[error("vault is stopped")]
    VaultStopped,
    #[error("basket index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("malformed message body: {0}")]
    MalformedBody(CellError),
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("unexpected: {0}")]
    Unexpected(String),
    #[error("unknown op {0:#010x}")]
    WrongOp(u32),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    pub const fn exit_code(&self) -> u32 {
        match self {
            VaultError::NotAdmin => 73,
            VaultError::UnauthorizedBurn => 74,
            VaultError::DiscoveryFeeNotMatched { .. } => 75,
            VaultError::InvalidDepositBody(_) => 400,
            VaultError::MinExchangeAmountNotMet { .. } => 401,
            VaultError::InvalidTonAmount { .. } => 402,
            VaultError::NotEnoughGas { .. } => 403,
            VaultError::NonBasketToken(_) => 404,
            VaultError::InvalidVaultData(_) => 405,
            VaultError::VaultStopped => 406,
            VaultError::IndexOutOfRange { .. } => 407,
            VaultError::MalformedBody(_) => 9,
            VaultError::ArithmeticOverflow => 4,
            VaultError::Unexpected(_) => 999,
            VaultError::WrongOp(_) => 0xffff,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            VaultError::NotAdmin => "not_admin",
            VaultError::UnauthorizedBurn => "unauthorized_burn",
            VaultError::DiscoveryFeeNotMatched { .. } => "discovery_fee_not_matched",
            VaultError::InvalidDepositBody(_) => "invalid_deposit_body",
            VaultError::MinExchangeAmountNotMet { .. } => "min_exchange_amount",
            VaultError::InvalidTonAmount { .. } => "invalid_ton_amount",
            VaultError::NotEnoughGas { .. } => "not_enough_gas",
            VaultError::NonBasketToken(_) => "non_basket_token",
            VaultError::InvalidVaultData(_) => "invalid_vault_data",
            VaultError::VaultStopped => "vault_stopped",
            VaultError::IndexOutOfRange { .. } => "index_out_of_range",
            VaultError::MalformedBody(_) => "malformed_body",
            VaultError::ArithmeticOverflow => "arithmetic_overflow",
            VaultError::Unexpected(_) => "unexpected",
            VaultError::WrongOp(_) => "wrong_op",
        }
    }

    pub fn invalid_data(err: impl std::fmt::Display) -> Self {
        VaultError::InvalidVaultData(err.to_string())
    }

    /// 构建出站正文失败属于内部错误，而不是入站格式问题。
    pub fn encode(err: CellError) -> Self {
        VaultError::Unexpected(format!("encode outbound: {err}"))
    }
}

impl From<CellError> for VaultError {
    fn from(err: CellError) -> Self {
        VaultError::MalformedBody(err)
    }
}

impl From<BasketError> for VaultError {
    fn from(err: BasketError) -> Self {
        match err {
            BasketError::IndexOutOfRange { index, len } => {
                VaultError::IndexOutOfRange { index, len }
            }
            other => VaultError::invalid_data(other),
        }
    }
}

impl From<LedgerError> for VaultError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::IndexOutOfRange { index, legs } => {
                VaultError::IndexOutOfRange { index, len: legs }
            }
            LedgerError::Overflow => VaultError::ArithmeticOverflow,
            LedgerError::Cell(err) => VaultError::encode(err),
        }
    }
}

impl From<DexError> for VaultError {
    fn from(err: DexError) -> Self {
        match err {
            DexError::MissingEndpoint(_) => VaultError::invalid_data(err),
            DexError::Cell(err) => VaultError::encode(err),
        }
    }
}
