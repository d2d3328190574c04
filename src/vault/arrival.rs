//! 腿到账跟踪：校验来源与 Gas，累加等待账本，凑齐后触发铸造。

use crate::cell::{Address, CellError};
use crate::constants::Coins;
use crate::gas;
use crate::ledger::{LegRecord, user_key};
use crate::message::OutboundMessage;
use crate::monitoring::events;

use super::error::{VaultError, VaultResult};
use super::message::Callback;
use super::mint;
use super::state::VaultState;
use super::{Env, settle_gas};

pub(crate) fn transfer_notification(
    state: &mut VaultState,
    env: &Env<'_>,
    query_id: u64,
    amount: Coins,
    from: Option<Address>,
    callback: Option<Callback>,
) -> VaultResult<Vec<OutboundMessage>> {
    let legs = state.registry.len();
    let floor = gas::arrival_gas_floor(legs).ok_or(VaultError::ArithmeticOverflow)?;
    if env.ctx.value < floor {
        return Err(VaultError::NotEnoughGas {
            required: floor,
            actual: env.ctx.value,
        });
    }
    let index = state
        .registry
        .position_of_wallet(&env.ctx.sender)
        .ok_or(VaultError::NonBasketToken(env.ctx.sender))?;
    if amount == 0 {
        return Err(VaultError::InvalidDepositBody(format!(
            "empty transfer notification for basket {index}"
        )));
    }

    // 经中间方到账时以回调中的地址为准，否则视为用户直接转入
    let (depositor, requested) = match callback {
        Some(callback) => (callback.depositor, callback.requested_mint),
        None => (
            from.ok_or(VaultError::MalformedBody(CellError::MissingAddress))?,
            None,
        ),
    };

    let key = user_key(&depositor);
    match state.waiting.record(key, index, amount, legs)? {
        LegRecord::Pending { held, balance } => {
            state.accumulated_gas = state
                .accumulated_gas
                .checked_add(env.ctx.value)
                .ok_or(VaultError::ArithmeticOverflow)?;
            events::leg_recorded(&depositor, index, amount, balance, held, legs);
            Ok(Vec::new())
        }
        LegRecord::Complete(entry) => {
            events::leg_recorded(
                &depositor,
                index,
                amount,
                entry.balance(index as u8).unwrap_or(amount),
                legs,
                legs,
            );
            let messages = mint::complete(state, env, query_id, &depositor, &entry, requested)?;
            settle_gas(state, env.ctx.value, &messages)?;
            Ok(messages)
        }
    }
}
