//! 存入编排：校验金额与附带价值，向每条腿发出一笔兑换。

use serde::Serialize;

use crate::basket::{BasketRegistry, DexKind};
use crate::cell::{Cell, CellBuilder, CellResult};
use crate::constants::{Coins, MIN_EXCHANGE_AMOUNT, PER_LEG_GAS, op};
use crate::dexes::{self, SwapIntent};
use crate::gas;
use crate::message::OutboundMessage;
use crate::monitoring::events;

use super::Env;
use super::error::{VaultError, VaultResult};
use super::message::Callback;
use super::state::VaultState;

/// 拆出每腿金额与（仅 StonFi）尾部的指定铸造量。
fn split_amounts(
    registry: &BasketRegistry,
    mut amounts: Vec<Coins>,
) -> VaultResult<(Vec<Coins>, Option<Coins>)> {
    let legs = registry.len();
    if amounts.len() == legs {
        return Ok((amounts, None));
    }
    if amounts.len() == legs + 1 {
        if registry.dex_kind() == Some(DexKind::StonFi) {
            let requested = amounts.pop();
            return Ok((amounts, requested));
        }
        return Err(VaultError::InvalidDepositBody(
            "requested mint is only accepted on stonfi vaults".to_string(),
        ));
    }
    Err(VaultError::InvalidDepositBody(format!(
        "expected {legs} amounts, got {}",
        amounts.len()
    )))
}

pub(crate) fn deposit(
    state: &mut VaultState,
    env: &Env<'_>,
    query_id: u64,
    amounts: Vec<Coins>,
) -> VaultResult<Vec<OutboundMessage>> {
    if state.stopped {
        return Err(VaultError::VaultStopped);
    }
    let registry = &state.registry;
    let legs = registry.len();
    let (amounts, requested_mint) = split_amounts(registry, amounts)?;
    if let Some(index) = amounts.iter().position(|amount| *amount == 0) {
        return Err(VaultError::InvalidDepositBody(format!(
            "leg {index} has zero amount"
        )));
    }

    let sum = amounts
        .iter()
        .try_fold(0 as Coins, |acc, amount| acc.checked_add(*amount))
        .ok_or(VaultError::ArithmeticOverflow)?;
    if sum < MIN_EXCHANGE_AMOUNT {
        return Err(VaultError::MinExchangeAmountNotMet {
            sum,
            min: MIN_EXCHANGE_AMOUNT,
        });
    }
    let expected = gas::total_required_value(sum, legs).ok_or(VaultError::ArithmeticOverflow)?;
    if env.ctx.value != expected {
        return Err(VaultError::InvalidTonAmount {
            expected,
            actual: env.ctx.value,
        });
    }

    let callback = Callback {
        depositor: env.ctx.sender,
        requested_mint,
    }
    .encode()
    .map_err(VaultError::encode)?;
    let swap_ctx = env.swap_context(query_id, registry.dex_endpoint().copied());

    let mut messages = Vec::with_capacity(legs);
    for (basket, amount) in registry.iter().zip(&amounts) {
        let forward_value = amount
            .checked_add(PER_LEG_GAS)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let intent = SwapIntent {
            amount: *amount,
            forward_value,
            callback: callback.clone(),
        };
        messages.push(dexes::build_swap(&basket.route, &swap_ctx, &intent)?);
    }

    let overhead = gas::base_overhead(legs).ok_or(VaultError::ArithmeticOverflow)?;
    state.accumulated_gas = state
        .accumulated_gas
        .checked_add(overhead)
        .ok_or(VaultError::ArithmeticOverflow)?;

    events::deposit_dispatched(&env.ctx.sender, legs, sum, overhead, requested_mint);
    Ok(messages)
}

/// 按权重拆分一笔基础资产的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositPlan {
    pub legs: Vec<Coins>,
    pub gas_budget: Coins,
    pub total_value: Coins,
}

/// 按归一化权重向下取整拆分，余数全部计入最后一条腿。
pub fn plan_deposit(total: Coins, registry: &BasketRegistry) -> VaultResult<DepositPlan> {
    let legs = registry.len();
    if legs == 0 {
        return Err(VaultError::VaultStopped);
    }
    let total_weight = registry
        .total_weight()
        .ok_or(VaultError::ArithmeticOverflow)?;

    let mut split = Vec::with_capacity(legs);
    let mut assigned: Coins = 0;
    for basket in &registry.baskets()[..legs - 1] {
        let share = total
            .checked_mul(basket.weight)
            .ok_or(VaultError::ArithmeticOverflow)?
            / total_weight;
        assigned += share;
        split.push(share);
    }
    split.push(total - assigned);

    let gas_budget = gas::deposit_gas_budget(legs).ok_or(VaultError::ArithmeticOverflow)?;
    let total_value = total
        .checked_add(gas_budget)
        .ok_or(VaultError::ArithmeticOverflow)?;
    Ok(DepositPlan {
        legs: split,
        gas_budget,
        total_value,
    })
}

pub fn deposit_body(
    query_id: u64,
    legs: &[Coins],
    requested_mint: Option<Coins>,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder.store_u32(op::DEPOSIT)?.store_u64(query_id)?;
    for amount in legs {
        builder.store_coins(*amount)?;
    }
    if let Some(requested) = requested_mint {
        builder.store_coins(requested)?;
    }
    Ok(builder.build())
}
