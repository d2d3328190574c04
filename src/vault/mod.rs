//! 金库状态机：每条入站消息作为一个原子单元处理，失败时不留任何痕迹。

mod admin;
mod arrival;
mod deposit;
pub mod error;
pub mod message;
mod mint;
pub mod state;


pub use deposit::{DepositPlan, deposit_body, plan_deposit};
pub use error::{VaultError, VaultResult};
pub use message::{
    Callback, InboundMessage, MessageContext, VaultConfigUpdate, encode_internal_message,
    parse_internal_message,
};
pub use mint::{MintOutcome, compute_mint, redemption_amounts};
pub use state::{VaultData, VaultState};

use crate::basket::Basket;
use crate::cell::{Address, Cell};
use crate::constants::{Coins, DEFAULT_SWAP_DEADLINE_SECS};
use crate::dexes::SwapContext;
use crate::jetton::{JettonData, wallet_address};
use crate::ledger::{WaitingEntry, WaitingLedger, user_key};
use crate::message::OutboundMessage;
use crate::monitoring::events;

/// 单条消息处理期间共享的只读环境。
pub(crate) struct Env<'a> {
    pub vault: &'a Address,
    pub ctx: &'a MessageContext,
    pub swap_deadline_secs: u32,
}

impl Env<'_> {
    pub fn swap_context(&self, query_id: u64, endpoint: Option<Address>) -> SwapContext {
        SwapContext {
            vault: *self.vault,
            endpoint,
            query_id,
            deadline: self.ctx.now.saturating_add(self.swap_deadline_secs),
        }
    }
}

/// 出站消息的价值先由本次入站价值支付，不足部分取自累计 Gas。
pub(crate) fn settle_gas(
    state: &mut VaultState,
    received: Coins,
    messages: &[OutboundMessage],
) -> VaultResult<()> {
    let spent = messages
        .iter()
        .try_fold(0 as Coins, |acc, message| acc.checked_add(message.value))
        .ok_or(VaultError::ArithmeticOverflow)?;
    let available = state
        .accumulated_gas
        .checked_add(received)
        .ok_or(VaultError::ArithmeticOverflow)?;
    state.accumulated_gas = available
        .checked_sub(spent)
        .ok_or(VaultError::NotEnoughGas {
            required: spent,
            actual: available,
        })?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Vault {
    address: Address,
    code: Option<Cell>,
    state: VaultState,
    swap_deadline_secs: u32,
}

impl Vault {
    pub fn new(address: Address, state: VaultState) -> Self {
        Self {
            address,
            code: None,
            state,
            swap_deadline_secs: DEFAULT_SWAP_DEADLINE_SECS,
        }
    }

    pub fn with_swap_deadline(mut self, secs: u32) -> Self {
        self.swap_deadline_secs = secs;
        self
    }

    pub fn with_code(mut self, code: Cell) -> Self {
        self.code = Some(code);
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn code(&self) -> Option<&Cell> {
        self.code.as_ref()
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn into_state(self) -> VaultState {
        self.state
    }

    /// 处理一条入站消息。成功时提交状态并返回出站消息；失败时状态保持原样。
    pub fn handle(
        &mut self,
        ctx: &MessageContext,
        body: &Cell,
    ) -> VaultResult<Vec<OutboundMessage>> {
        let message = match InboundMessage::parse(body) {
            Ok(message) => message,
            Err(err) => {
                events::message_rejected(body.parse().load_u32().ok(), &ctx.sender, &err);
                return Err(err);
            }
        };
        let op = message.op();
        let mut next = self.state.clone();
        let mut next_code = None;
        let env = Env {
            vault: &self.address,
            ctx,
            swap_deadline_secs: self.swap_deadline_secs,
        };

        let result = match message {
            InboundMessage::TopUp => Ok(Vec::new()),
            InboundMessage::Excesses { .. } => next
                .accumulated_gas
                .checked_add(ctx.value)
                .map(|total| {
                    next.accumulated_gas = total;
                    Vec::new()
                })
                .ok_or(VaultError::ArithmeticOverflow),
            InboundMessage::Deposit { query_id, amounts } => {
                deposit::deposit(&mut next, &env, query_id, amounts)
            }
            InboundMessage::TransferNotification {
                query_id,
                amount,
                from,
                callback,
            } => arrival::transfer_notification(&mut next, &env, query_id, amount, from, callback),
            InboundMessage::BurnNotification {
                query_id,
                amount,
                owner,
                in_kind,
                ..
            } => mint::redeem(&mut next, &env, query_id, amount, &owner, in_kind).and_then(
                |messages| {
                    settle_gas(&mut next, ctx.value, &messages)?;
                    Ok(messages)
                },
            ),
            InboundMessage::ProvideWalletAddress {
                query_id,
                owner,
                include_owner,
            } => admin::provide_wallet_address(&next, &env, query_id, owner, include_owner),
            InboundMessage::ChangeAdmin { admin, .. } => {
                admin::change_admin(&mut next, &env, admin)
            }
            InboundMessage::ChangeContent { content, .. } => {
                admin::change_content(&mut next, &env, content)
            }
            InboundMessage::ChangeVaultData { update, .. } => {
                admin::change_vault_data(&mut next, &env, update)
            }
            InboundMessage::SendAdminMessage { message, .. } => {
                admin::send_admin_message(&mut next, &env, message)
            }
            InboundMessage::ChangeCodeAndData { code, data, .. } => {
                admin::change_code_and_data(&next, &env, &data).map(|replaced| {
                    next = replaced;
                    next_code = Some(code);
                    Vec::new()
                })
            }
            InboundMessage::ClearWaiting { query_id, user } => {
                admin::clear_waiting(&mut next, &env, query_id, user)
            }
        };

        match result {
            Ok(messages) => {
                self.state = next;
                if let Some(code) = next_code {
                    self.code = Some(code);
                }
                Ok(messages)
            }
            Err(err) => {
                events::message_rejected(op, &ctx.sender, &err);
                Err(err)
            }
        }
    }

    pub fn vault_data(&self) -> VaultData {
        self.state.vault_data()
    }

    pub fn jetton_data(&self) -> JettonData {
        self.state.jetton_data()
    }

    pub fn basket_at(&self, index: usize) -> VaultResult<&Basket> {
        Ok(self.state.registry.basket_at(index)?)
    }

    pub fn waitings(&self) -> &WaitingLedger {
        &self.state.waiting
    }

    pub fn waiting_for(&self, user: &Address) -> Option<&WaitingEntry> {
        self.state.waiting.get(&user_key(user))
    }

    pub fn accumulated_gas(&self) -> Coins {
        self.state.accumulated_gas
    }

    pub fn total_supply(&self) -> Coins {
        self.state.header.total_supply
    }

    /// 指定持有人的指数代币钱包地址。
    pub fn wallet_address(&self, owner: &Address) -> VaultResult<Address> {
        wallet_address(&self.state.header.wallet_code, owner, &self.address)
            .map_err(VaultError::encode)
    }
}
