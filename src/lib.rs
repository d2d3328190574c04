//! 链上指数基金金库：把一笔基础资产存入拆分为多条 DEX 兑换，
//! 全部成分到账后铸造指数代币，并支持按权重赎回。

pub mod basket;
pub mod cell;
pub mod config;
pub mod constants;
pub mod dexes;
pub mod gas;
pub mod jetton;
pub mod ledger;
pub mod message;
pub mod monitoring;
pub mod vault;
