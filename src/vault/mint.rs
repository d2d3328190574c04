//! 铸造与赎回：按最弱腿确定铸造量、退还多余部分、按权重比例赎回。

use primitive_types::U256;

use crate::basket::BasketRegistry;
use crate::cell::Address;
use crate::constants::{Coins, INDEX_UNIT, MINT_SEND_GAS};
use crate::dexes::{self, SwapBackIntent};
use crate::gas;
use crate::jetton::{internal_transfer_body, transfer_body, wallet_address, wallet_state_init};
use crate::ledger::WaitingEntry;
use crate::message::OutboundMessage;
use crate::monitoring::events;

use super::Env;
use super::error::{VaultError, VaultResult};
use super::state::VaultState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutcome {
    pub minted: Coins,
    /// `(腿序号, 退还金额)`，只包含大于零的退款。
    pub refunds: Vec<(usize, Coins)>,
}

/// `floor(value * mul / div)`，乘积在 256 位中计算，只有商超出 `Coins` 才算溢出。
fn mul_div(value: Coins, mul: Coins, div: Coins) -> VaultResult<Coins> {
    if div == 0 {
        return Err(VaultError::Unexpected("zero divisor".to_string()));
    }
    let quotient = U256::from(value) * U256::from(mul) / U256::from(div);
    if quotient > U256::from(Coins::MAX) {
        return Err(VaultError::ArithmeticOverflow);
    }
    Ok(quotient.low_u128())
}

/// 铸造量 = `min_i(b_i * INDEX_UNIT / w_i)`，再与指定铸造量取小。
pub fn compute_mint(
    registry: &BasketRegistry,
    entry: &WaitingEntry,
    requested: Option<Coins>,
) -> VaultResult<MintOutcome> {
    let mut balances = Vec::with_capacity(registry.len());
    let mut minted: Option<Coins> = None;
    for (index, basket) in registry.iter().enumerate() {
        let balance = entry
            .balance(index as u8)
            .ok_or_else(|| VaultError::Unexpected(format!("leg {index} missing at completion")))?;
        let bound = mul_div(balance, INDEX_UNIT, basket.weight)?;
        minted = Some(minted.map_or(bound, |current| current.min(bound)));
        balances.push(balance);
    }
    let mut minted = minted.unwrap_or(0);
    if let Some(requested) = requested {
        minted = minted.min(requested);
    }

    let mut refunds = Vec::new();
    for (index, (basket, balance)) in registry.iter().zip(balances).enumerate() {
        let backing = mul_div(minted, basket.weight, INDEX_UNIT)?;
        let refund = balance
            .checked_sub(backing)
            .ok_or_else(|| VaultError::Unexpected(format!("leg {index} under-backed")))?;
        if refund > 0 {
            refunds.push((index, refund));
        }
    }
    Ok(MintOutcome { minted, refunds })
}

/// 每条腿按 `floor(burn * w_i / INDEX_UNIT)` 取出。
pub fn redemption_amounts(registry: &BasketRegistry, burn: Coins) -> VaultResult<Vec<Coins>> {
    registry
        .iter()
        .map(|basket| mul_div(burn, basket.weight, INDEX_UNIT))
        .collect()
}

fn direct_transfer(
    wallet: Address,
    query_id: u64,
    amount: Coins,
    recipient: &Address,
) -> VaultResult<OutboundMessage> {
    let body = transfer_body(query_id, amount, recipient, recipient, 0, None)
        .map_err(VaultError::encode)?;
    Ok(OutboundMessage::new(wallet, MINT_SEND_GAS, body))
}

/// 所有腿到齐：铸造、退款并累加供应。
pub(crate) fn complete(
    state: &mut VaultState,
    env: &Env<'_>,
    query_id: u64,
    depositor: &Address,
    entry: &WaitingEntry,
    requested: Option<Coins>,
) -> VaultResult<Vec<OutboundMessage>> {
    let outcome = compute_mint(&state.registry, entry, requested)?;
    let mut messages = Vec::with_capacity(outcome.refunds.len() + 1);

    if outcome.minted > 0 {
        let code = &state.header.wallet_code;
        let state_init =
            wallet_state_init(code, depositor, env.vault).map_err(VaultError::encode)?;
        let wallet = wallet_address(code, depositor, env.vault).map_err(VaultError::encode)?;
        let body = internal_transfer_body(query_id, outcome.minted, env.vault, depositor)
            .map_err(VaultError::encode)?;
        messages.push(OutboundMessage::new(wallet, MINT_SEND_GAS, body).with_state_init(state_init));
    }
    for (index, refund) in &outcome.refunds {
        let basket = state.registry.basket_at(*index)?;
        messages.push(direct_transfer(basket.wallet, query_id, *refund, depositor)?);
    }

    state.header.total_supply = state
        .header
        .total_supply
        .checked_add(outcome.minted)
        .ok_or(VaultError::ArithmeticOverflow)?;

    events::mint_completed(
        depositor,
        outcome.minted,
        outcome.refunds.len(),
        state.header.total_supply,
    );
    Ok(messages)
}

pub(crate) fn redeem(
    state: &mut VaultState,
    env: &Env<'_>,
    query_id: u64,
    amount: Coins,
    owner: &Address,
    in_kind: bool,
) -> VaultResult<Vec<OutboundMessage>> {
    let expected_wallet = wallet_address(&state.header.wallet_code, owner, env.vault)
        .map_err(VaultError::encode)?;
    if env.ctx.sender != expected_wallet || amount > state.header.total_supply {
        return Err(VaultError::UnauthorizedBurn);
    }
    let legs = state.registry.len();
    if legs == 0 {
        return Err(VaultError::VaultStopped);
    }
    let floor = gas::redeem_gas_floor(legs).ok_or(VaultError::ArithmeticOverflow)?;
    if env.ctx.value < floor {
        return Err(VaultError::NotEnoughGas {
            required: floor,
            actual: env.ctx.value,
        });
    }

    let withdrawals = redemption_amounts(&state.registry, amount)?;
    let swap_ctx = env.swap_context(query_id, state.registry.dex_endpoint().copied());
    let mut messages = Vec::with_capacity(legs);
    for (basket, withdrawal) in state.registry.iter().zip(&withdrawals) {
        if *withdrawal == 0 {
            continue;
        }
        let message = if in_kind {
            direct_transfer(basket.wallet, query_id, *withdrawal, owner)?
        } else {
            let intent = SwapBackIntent {
                wallet: basket.wallet,
                amount: *withdrawal,
                recipient: *owner,
            };
            dexes::build_swap_back(&basket.route, &swap_ctx, &intent)?
        };
        messages.push(message);
    }

    state.header.total_supply -= amount;
    events::redemption_dispatched(owner, amount, messages.len(), in_kind);
    Ok(messages)
}
