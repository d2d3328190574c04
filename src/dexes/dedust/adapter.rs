use tracing::debug;

use crate::basket::{DeDustRoute, DexKind};
use crate::cell::{Address, Cell, CellBuilder, CellResult};
use crate::constants::{PER_LEG_GAS, SWAP_GAS, op};
use crate::dexes::framework::{
    DexError, DexResult, DexRouterAdapter, SwapBackIntent, SwapContext, SwapIntent,
};
use crate::jetton::transfer_body;
use crate::message::OutboundMessage;

#[derive(Default)]
pub struct DeDustAdapter;

impl DeDustAdapter {
    pub fn shared() -> &'static Self {
        &ADAPTER
    }
}

static ADAPTER: DeDustAdapter = DeDustAdapter;

/// `SwapParams`：截止时间、收款人、无推荐人、可选的成功/拒绝负载。
pub fn swap_params(
    deadline: u32,
    recipient: &Address,
    fulfill_payload: Option<Cell>,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_u32(deadline)?
        .store_address(Some(recipient))?
        .store_address(None)?
        .store_maybe_ref(fulfill_payload)?
        .store_maybe_ref(None)?;
    Ok(builder.build())
}

/// `SwapStep`：单池、exact-in、无最小输出、无下一跳。
fn store_swap_step(builder: &mut CellBuilder, pool: &Address) -> CellResult<()> {
    builder
        .store_address(Some(pool))?
        .store_uint(0, 1)?
        .store_coins(0)?
        .store_maybe_ref(None)?;
    Ok(())
}

impl DexRouterAdapter for DeDustAdapter {
    type Route = DeDustRoute;

    fn kind(&self) -> DexKind {
        DexKind::DeDust
    }

    fn build_swap(
        &self,
        route: &Self::Route,
        ctx: &SwapContext,
        intent: &SwapIntent,
    ) -> DexResult<OutboundMessage> {
        let native_vault = ctx.endpoint.ok_or(DexError::MissingEndpoint(self.kind()))?;
        let params = swap_params(ctx.deadline, &ctx.vault, Some(intent.callback.clone()))?;

        let mut body = CellBuilder::new();
        body.store_u32(op::DEDUST_TON_SWAP)?
            .store_u64(ctx.query_id)?
            .store_coins(intent.amount)?;
        store_swap_step(&mut body, &route.pool)?;
        body.store_ref(params)?;

        debug!(
            target: "dexes::dedust",
            pool = %route.pool,
            amount = %intent.amount,
            forward_value = %intent.forward_value,
            "构建 DeDust 原生资产兑换"
        );
        Ok(OutboundMessage::new(
            native_vault,
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
        let params = swap_params(ctx.deadline, &intent.recipient, None)?;
        let mut payload = CellBuilder::new();
        payload.store_u32(op::DEDUST_JETTON_SWAP)?;
        store_swap_step(&mut payload, &route.pool)?;
        payload.store_ref(params)?;

        let body = transfer_body(
            ctx.query_id,
            intent.amount,
            &route.jetton_vault,
            &intent.recipient,
            SWAP_GAS,
            Some(payload.build()),
        )?;

        debug!(
            target: "dexes::dedust",
            pool = %route.pool,
            jetton_vault = %route.jetton_vault,
            amount = %intent.amount,
            "构建 DeDust 赎回兑换"
        );
        Ok(OutboundMessage::new(intent.wallet, PER_LEG_GAS, body))
    }
}
