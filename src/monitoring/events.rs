use tracing::{info, warn};

use crate::cell::Address;
use crate::constants::Coins;
use crate::vault::VaultError;

use super::metrics::prometheus_enabled;
use metrics::{counter, histogram};

pub fn deposit_dispatched(
    depositor: &Address,
    legs: usize,
    sum: Coins,
    overhead: Coins,
    requested_mint: Option<Coins>,
) {
    info!(
        target: "vault::deposit",
        event = "dispatched",
        depositor = %depositor,
        legs,
        sum = %sum,
        overhead = %overhead,
        requested_mint = ?requested_mint,
        "存入已拆分为兑换消息"
    );

    if prometheus_enabled() {
        counter!("index_vault_deposits_total").increment(1);
        counter!("index_vault_swaps_dispatched_total").increment(legs as u64);
    }
}

pub fn leg_recorded(
    depositor: &Address,
    index: usize,
    amount: Coins,
    balance: Coins,
    held: usize,
    legs: usize,
) {
    info!(
        target: "vault::arrival",
        event = "leg_recorded",
        depositor = %depositor,
        index,
        amount = %amount,
        balance = %balance,
        held,
        legs,
        "成分代币到账"
    );

    if prometheus_enabled() {
        counter!("index_vault_legs_arrived_total", "index" => index.to_string()).increment(1);
    }
}

pub fn mint_completed(depositor: &Address, minted: Coins, refunds: usize, total_supply: Coins) {
    info!(
        target: "vault::mint",
        event = "minted",
        depositor = %depositor,
        minted = %minted,
        refunds,
        total_supply = %total_supply,
        "所有腿已到齐，完成铸造"
    );

    if prometheus_enabled() {
        counter!("index_vault_mints_total").increment(1);
        counter!("index_vault_refunds_total").increment(refunds as u64);
        histogram!("index_vault_mint_amount").record(minted as f64);
    }
}

pub fn redemption_dispatched(owner: &Address, burned: Coins, messages: usize, in_kind: bool) {
    info!(
        target: "vault::redeem",
        event = "dispatched",
        owner = %owner,
        burned = %burned,
        messages,
        in_kind,
        "赎回已发出"
    );

    if prometheus_enabled() {
        let mode = if in_kind { "in_kind" } else { "swap_back" };
        counter!("index_vault_redemptions_total", "mode" => mode).increment(1);
        histogram!("index_vault_burn_amount").record(burned as f64);
    }
}

pub fn waiting_cleared(user: &Address, refunds: usize) {
    warn!(
        target: "vault::admin",
        event = "waiting_cleared",
        user = %user,
        refunds,
        "管理员清除了等待条目"
    );

    if prometheus_enabled() {
        counter!("index_vault_waiting_cleared_total").increment(1);
    }
}

pub fn admin_action(action: &'static str, admin: &Address) {
    info!(
        target: "vault::admin",
        event = "admin_action",
        action,
        admin = %admin,
        "管理员操作已执行"
    );

    if prometheus_enabled() {
        counter!("index_vault_admin_actions_total", "action" => action).increment(1);
    }
}

pub fn vault_reconfigured(basket_count: usize, stopped: bool) {
    info!(
        target: "vault::admin",
        event = "reconfigured",
        basket_count,
        stopped,
        "篮子配置已更新"
    );

    if prometheus_enabled() {
        counter!("index_vault_reconfigurations_total").increment(1);
    }
}

pub fn message_rejected(op: Option<u32>, sender: &Address, err: &VaultError) {
    let op_label = op.map_or_else(|| "none".to_string(), |code| format!("{code:#010x}"));
    warn!(
        target: "vault::reject",
        event = "rejected",
        op = %op_label,
        sender = %sender,
        exit_code = err.exit_code(),
        error = %err,
        "入站消息被拒绝，状态未改变"
    );

    if prometheus_enabled() {
        counter!("index_vault_rejections_total", "reason" => err.label()).increment(1);
    }
}
