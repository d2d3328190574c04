use tracing::debug;

use crate::basket::{DexKind, StonFiRoute};
use crate::cell::{Address, Cell, CellBuilder, CellResult};
use crate::constants::{Coins, MINT_SEND_GAS, PER_LEG_GAS, SWAP_GAS, op};
use crate::dexes::framework::{
    DexResult, DexRouterAdapter, SwapBackIntent, SwapContext, SwapIntent,
};
use crate::jetton::transfer_body;
use crate::message::OutboundMessage;

#[derive(Default)]
pub struct StonFiAdapter;

impl StonFiAdapter {
    pub fn shared() -> &'static Self {
        &ADAPTER
    }
}

static ADAPTER: StonFiAdapter = StonFiAdapter;

/// 路由器的 `cross_swap_body`：不限最小输出、无推荐费。
pub fn cross_swap_body(
    receiver: &Address,
    forward_gas: Coins,
    custom_payload: Option<Cell>,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_coins(0)?
        .store_address(Some(receiver))?
        .store_coins(forward_gas)?
        .store_maybe_ref(custom_payload)?
        .store_coins(0)?
        .store_maybe_ref(None)?
        .store_uint(0, 16)?
        .store_address(None)?;
    Ok(builder.build())
}

impl DexRouterAdapter for StonFiAdapter {
    type Route = StonFiRoute;

    fn kind(&self) -> DexKind {
        DexKind::StonFi
    }

    /// 基础资产经代理钱包进入路由器，换出的资产记到路由器本地钱包名下。
    fn build_swap(
        &self,
        route: &Self::Route,
        ctx: &SwapContext,
        intent: &SwapIntent,
    ) -> DexResult<OutboundMessage> {
        let cross = cross_swap_body(&ctx.vault, MINT_SEND_GAS, Some(intent.callback.clone()))?;
        let mut body = CellBuilder::new();
        body.store_u32(op::STONFI_TON_SWAP)?
            .store_u64(ctx.query_id)?
            .store_coins(intent.amount)?
            .store_address(Some(&route.router_local_wallet))?
            .store_address(Some(&ctx.vault))?
            .store_address(Some(&ctx.vault))?
            .store_u64(ctx.deadline as u64)?
            .store_ref(cross)?;

        debug!(
            target: "dexes::stonfi",
            router = %route.router,
            proxy = %route.proxy_base,
            amount = %intent.amount,
            forward_value = %intent.forward_value,
            "构建 StonFi 原生资产兑换"
        );
        Ok(OutboundMessage::new(
            route.proxy_base,
            intent.forward_value,
            body.build(),
        ))
    }

    fn build_swap_back(
        &self,
        route: &Self::Route,
        ctx: &SwapContext,
        intent: &SwapBackIntent,
    ) -> DexResult<OutboundMessage> {
        let cross = cross_swap_body(&intent.recipient, 0, None)?;
        let mut payload = CellBuilder::new();
        payload
            .store_u32(op::STONFI_JETTON_SWAP)?
            .store_address(Some(&route.proxy_base))?
            .store_address(Some(&intent.recipient))?
            .store_address(Some(&intent.recipient))?
            .store_u64(ctx.deadline as u64)?
            .store_ref(cross)?;

        let body = transfer_body(
            ctx.query_id,
            intent.amount,
            &route.router,
            &intent.recipient,
            SWAP_GAS,
            Some(payload.build()),
        )?;

        debug!(
            target: "dexes::stonfi",
            router = %route.router,
            amount = %intent.amount,
            "构建 StonFi 赎回兑换"
        );
        Ok(OutboundMessage::new(intent.wallet, PER_LEG_GAS, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jetton::parse_transfer;

    fn addr(seed: u8) -> Address {
        Address::new(0, [seed; 32])
    }

    fn route() -> StonFiRoute {
        StonFiRoute {
            router: addr(30),
            proxy_base: addr(31),
            router_local_wallet: addr(32),
        }
    }

    fn ctx() -> SwapContext {
        SwapContext {
            vault: addr(1),
            endpoint: None,
            query_id: 9,
            deadline: 1_000,
        }
    }

    #[test]
    fn native_swap_goes_through_proxy() {
        let intent = SwapIntent {
            amount: 2_000_000_000,
            forward_value: 2_150_000_000,
            callback: addr(2).to_cell(),
        };
        let message = StonFiAdapter::shared()
            .build_swap(&route(), &ctx(), &intent)
            .unwrap();
        assert_eq!(message.destination, addr(31));
        assert_eq!(message.value, 2_150_000_000);

        let mut body = message.body.parse();
        assert_eq!(body.load_u32().unwrap(), op::STONFI_TON_SWAP);
        assert_eq!(body.load_u64().unwrap(), 9);
        assert_eq!(body.load_coins().unwrap(), 2_000_000_000);
        assert_eq!(body.load_required_address().unwrap(), addr(32));
        assert_eq!(body.load_required_address().unwrap(), addr(1));
        assert_eq!(body.load_required_address().unwrap(), addr(1));
        assert_eq!(body.load_u64().unwrap(), 1_000);

        let mut cross = body.load_ref().unwrap().parse();
        assert_eq!(cross.load_coins().unwrap(), 0);
        assert_eq!(cross.load_required_address().unwrap(), addr(1));
        assert_eq!(cross.load_coins().unwrap(), MINT_SEND_GAS);
        assert_eq!(cross.load_maybe_ref().unwrap(), Some(addr(2).to_cell()));
    }

    #[test]
    fn swap_back_routes_to_router() {
        let intent = SwapBackIntent {
            wallet: addr(40),
            amount: 700,
            recipient: addr(5),
        };
        let message = StonFiAdapter::shared()
            .build_swap_back(&route(), &ctx(), &intent)
            .unwrap();
        assert_eq!(message.destination, addr(40));
        let fields = parse_transfer(&message.body).unwrap().unwrap();
        assert_eq!(fields.destination, addr(30));
        assert_eq!(fields.forward_ton, SWAP_GAS);
        let mut payload = fields.forward_payload.unwrap().parse();
        assert_eq!(payload.load_u32().unwrap(), op::STONFI_JETTON_SWAP);
        assert_eq!(payload.load_required_address().unwrap(), addr(31));
    }
}
