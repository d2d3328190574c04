//! 管理员操作与 jetton 钱包发现。

use crate::cell::{Address, Cell};
use crate::constants::{Coins, DISCOVERY_FEE, MINT_SEND_GAS, MODE_CARRY_ALL_BALANCE, MODE_CARRY_INBOUND};
use crate::jetton::{take_wallet_address_body, transfer_body, wallet_address};
use crate::ledger::user_key;
use crate::message::OutboundMessage;
use crate::monitoring::events;

use super::error::{VaultError, VaultResult};
use super::message::VaultConfigUpdate;
use super::state::VaultState;
use super::{Env, settle_gas};

fn ensure_admin(state: &VaultState, env: &Env<'_>) -> VaultResult<()> {
    if env.ctx.sender != state.header.admin {
        return Err(VaultError::NotAdmin);
    }
    Ok(())
}

pub(crate) fn change_admin(
    state: &mut VaultState,
    env: &Env<'_>,
    admin: Address,
) -> VaultResult<Vec<OutboundMessage>> {
    ensure_admin(state, env)?;
    state.header.admin = admin;
    events::admin_action("change_admin", &env.ctx.sender);
    Ok(Vec::new())
}

pub(crate) fn change_content(
    state: &mut VaultState,
    env: &Env<'_>,
    content: Cell,
) -> VaultResult<Vec<OutboundMessage>> {
    ensure_admin(state, env)?;
    state.header.content = content;
    events::admin_action("change_content", &env.ctx.sender);
    Ok(Vec::new())
}

/// 替换篮子配置；等待中的条目存在时不允许改变腿数。
pub(crate) fn change_vault_data(
    state: &mut VaultState,
    env: &Env<'_>,
    update: VaultConfigUpdate,
) -> VaultResult<Vec<OutboundMessage>> {
    ensure_admin(state, env)?;
    if update.baskets.len() != state.registry.len() && !state.waiting.is_empty() {
        return Err(VaultError::InvalidVaultData(format!(
            "cannot change basket count from {} to {} with {} waiting entries",
            state.registry.len(),
            update.baskets.len(),
            state.waiting.len()
        )));
    }
    state
        .registry
        .configure(update.baskets, update.dex_endpoint)
        .map_err(VaultError::invalid_data)?;
    // 配置生效即解除停用，正文暂停位为 1 时保持暂停
    state.stopped = update.stopped;
    events::vault_reconfigured(state.registry.len(), state.stopped);
    Ok(Vec::new())
}

pub(crate) fn send_admin_message(
    state: &mut VaultState,
    env: &Env<'_>,
    message: OutboundMessage,
) -> VaultResult<Vec<OutboundMessage>> {
    ensure_admin(state, env)?;
    if message.mode & MODE_CARRY_ALL_BALANCE != 0 {
        state.accumulated_gas = 0;
    }
    events::admin_action("send_admin_message", &env.ctx.sender);
    Ok(vec![message])
}

pub(crate) fn change_code_and_data(
    state: &VaultState,
    env: &Env<'_>,
    data: &Cell,
) -> VaultResult<VaultState> {
    ensure_admin(state, env)?;
    let replaced = VaultState::decode(data)?;
    events::admin_action("change_code_and_data", &env.ctx.sender);
    Ok(replaced)
}

/// 清除卡住的等待条目，把已到账的腿原样退还给用户。
pub(crate) fn clear_waiting(
    state: &mut VaultState,
    env: &Env<'_>,
    query_id: u64,
    user: Address,
) -> VaultResult<Vec<OutboundMessage>> {
    ensure_admin(state, env)?;
    let key = user_key(&user);
    let held = state.waiting.get(&key).map(|entry| entry.legs()).unwrap_or(0);
    let floor = MINT_SEND_GAS
        .checked_mul(held as Coins)
        .ok_or(VaultError::ArithmeticOverflow)?;
    if env.ctx.value < floor {
        return Err(VaultError::NotEnoughGas {
            required: floor,
            actual: env.ctx.value,
        });
    }

    let mut messages = Vec::with_capacity(held);
    if let Some(entry) = state.waiting.remove(&key) {
        for (index, balance) in entry.balances() {
            let basket = state.registry.basket_at(*index as usize)?;
            let body = transfer_body(query_id, *balance, &user, &user, 0, None)
                .map_err(VaultError::encode)?;
            messages.push(OutboundMessage::new(basket.wallet, MINT_SEND_GAS, body));
        }
    }
    settle_gas(state, env.ctx.value, &messages)?;
    events::waiting_cleared(&user, messages.len());
    Ok(messages)
}

pub(crate) fn provide_wallet_address(
    state: &VaultState,
    env: &Env<'_>,
    query_id: u64,
    owner: Address,
    include_owner: bool,
) -> VaultResult<Vec<OutboundMessage>> {
    if env.ctx.value < DISCOVERY_FEE {
        return Err(VaultError::DiscoveryFeeNotMatched {
            required: DISCOVERY_FEE,
            actual: env.ctx.value,
        });
    }
    let wallet = if owner.workchain() == 0 {
        Some(
            wallet_address(&state.header.wallet_code, &owner, env.vault)
                .map_err(VaultError::encode)?,
        )
    } else {
        None
    };
    let included = include_owner.then_some(&owner);
    let body = take_wallet_address_body(query_id, wallet.as_ref(), included)
        .map_err(VaultError::encode)?;
    Ok(vec![
        OutboundMessage::new(env.ctx.sender, 0, body).with_mode(MODE_CARRY_INBOUND),
    ])
}
