use thiserror::Error;

use crate::basket::DexKind;
use crate::cell::{Address, Cell, CellError};
use crate::constants::Coins;
use crate::message::OutboundMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DexError {
    #[error("{0} route requires a dex endpoint")]
    MissingEndpoint(DexKind),
    #[error(transparent)]
    Cell(#[from] CellError),
}

pub type DexResult<T> = Result<T, DexError>;

/// 构建兑换消息时金库侧持有的上下文。
#[derive(Debug, Clone, Copy)]
pub struct SwapContext {
    pub vault: Address,
    pub endpoint: Option<Address>,
    pub query_id: u64,
    /// 兑换截止时间（unix 秒）。
    pub deadline: u32,
}

/// 存入方向：基础资产换目标资产。
#[derive(Debug, Clone)]
pub struct SwapIntent {
    pub amount: Coins,
    /// 随消息转发的总价值（兑换额 + 每腿 Gas）。
    pub forward_value: Coins,
    /// 兑换成功后随资产一起回到金库的回调元数据。
    pub callback: Cell,
}

/// 赎回方向：目标资产换回基础资产并交给赎回者。
#[derive(Debug, Clone, Copy)]
pub struct SwapBackIntent {
    /// 金库持有该腿资产的 jetton 钱包。
    pub wallet: Address,
    pub amount: Coins,
    pub recipient: Address,
}

/// 把通用兑换意图翻译成具体协议的线格式。
pub trait DexRouterAdapter: Send + Sync {
    /// 该协议专属的路由字段。
    type Route;

    fn kind(&self) -> DexKind;

    fn build_swap(
        &self,
        route: &Self::Route,
        ctx: &SwapContext,
        intent: &SwapIntent,
    ) -> DexResult<OutboundMessage>;

    fn build_swap_back(
        &self,
        route: &Self::Route,
        ctx: &SwapContext,
        intent: &SwapBackIntent,
    ) -> DexResult<OutboundMessage>;
}
