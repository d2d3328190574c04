pub mod dedust;
pub mod framework;
pub mod stonfi;

pub use dedust::DeDustAdapter;
pub use framework::{
    DexError, DexResult, DexRouterAdapter, SwapBackIntent, SwapContext, SwapIntent,
};
pub use stonfi::StonFiAdapter;

use crate::basket::DexRoute;
use crate::message::OutboundMessage;

/// 按路由变体分发到对应适配器。
pub fn build_swap(
    route: &DexRoute,
    ctx: &SwapContext,
    intent: &SwapIntent,
) -> DexResult<OutboundMessage> {
    match route {
        DexRoute::DeDust(route) => DeDustAdapter::shared().build_swap(route, ctx, intent),
        DexRoute::StonFi(route) => StonFiAdapter::shared().build_swap(route, ctx, intent),
    }
}

pub fn build_swap_back(
    route: &DexRoute,
    ctx: &SwapContext,
    intent: &SwapBackIntent,
) -> DexResult<OutboundMessage> {
    match route {
        DexRoute::DeDust(route) => DeDustAdapter::shared().build_swap_back(route, ctx, intent),
        DexRoute::StonFi(route) => StonFiAdapter::shared().build_swap_back(route, ctx, intent),
    }
}
