use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use tracing::info;

use index_vault::basket::{BasketRegistry, DexKind};
use index_vault::cell::{Address, Cell, hex_string};
use index_vault::config::IndexVaultConfig;
use index_vault::constants::Coins;
use index_vault::jetton::{JettonData, offchain_content};
use index_vault::ledger::{WaitingSnapshot, user_key};
use index_vault::message::{OutboundMessage, OutboundSummary};
use index_vault::vault::{MessageContext, Vault, VaultData, VaultState, deposit_body, plan_deposit};

use crate::cli::args::{ApplyCmd, Cli, Command, InitCmd, InspectCmd, PlanDepositCmd, UserKeyCmd};
use crate::cli::boc_file::{read_cell, write_cell};

pub fn run(cli: Cli, config: IndexVaultConfig) -> Result<()> {
    if let Some(listen) = config.monitoring.prometheus_listen.as_deref() {
        index_vault::monitoring::try_init_prometheus(listen)?;
    }

    match cli.command {
        Command::Init(cmd) => init(&cmd, &config),
        Command::Inspect(cmd) => inspect(&cmd, &config),
        Command::Apply(cmd) => apply(&cmd, &config),
        Command::PlanDeposit(cmd) => plan(&cmd, &config),
        Command::UserKey(cmd) => print_user_key(&cmd),
    }
}

fn registry_from(config: &IndexVaultConfig) -> Result<BasketRegistry> {
    let endpoint = config.resolved_endpoint();
    let baskets = config.resolved_baskets()?;
    if baskets.is_empty() {
        return Ok(BasketRegistry::unconfigured(Some(endpoint)));
    }
    BasketRegistry::new(baskets, Some(endpoint)).context("篮子配置无效")
}

fn vault_address(config: &IndexVaultConfig) -> Result<Address> {
    config
        .vault
        .address
        .ok_or_else(|| anyhow!("配置缺少 vault.address"))
}

fn load_state(path: &std::path::Path) -> Result<VaultState> {
    let cell = read_cell(path)?;
    VaultState::decode(&cell).with_context(|| format!("{} 不是合法的金库状态", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init(cmd: &InitCmd, config: &IndexVaultConfig) -> Result<()> {
    let admin = config
        .vault
        .admin
        .ok_or_else(|| anyhow!("配置缺少 vault.admin"))?;
    let wallet_code = read_cell(&cmd.wallet_code)?;
    let content = offchain_content(&config.vault.content_uri).context("无法编码元数据 URI")?;
    let registry = registry_from(config)?;
    let baskets = registry.len();

    let state = VaultState::new(admin, content, wallet_code, registry);
    let cell = state.encode().context("无法编码初始状态")?;
    write_cell(cmd.output.as_deref(), &cell, cmd.force)?;

    info!(
        target: "cli::init",
        admin = %admin,
        baskets,
        dex = %config.vault.dex,
        "初始状态已生成，金库在首次 change_vault_data 前保持停用"
    );
    Ok(())
}

#[derive(Serialize)]
struct InspectReport {
    vault: VaultData,
    jetton: JettonData,
    waiting: Vec<WaitingSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_wallet: Option<Address>,
}

fn inspect(cmd: &InspectCmd, config: &IndexVaultConfig) -> Result<()> {
    let state = load_state(&cmd.state)?;
    let owner_wallet = match cmd.owner.as_deref() {
        Some(owner) => {
            let owner: Address = owner.parse().context("持有人地址无效")?;
            let vault = Vault::new(vault_address(config)?, state.clone());
            Some(vault.wallet_address(&owner)?)
        }
        None => None,
    };
    print_json(&InspectReport {
        vault: state.vault_data(),
        jetton: state.jetton_data(),
        waiting: state.waiting.snapshot(),
        owner_wallet,
    })
}

#[derive(Serialize)]
struct ApplyReport {
    messages: Vec<OutboundSummary>,
    total_supply: String,
    accumulated_gas: String,
    waiting_entries: usize,
}

fn unix_now() -> Result<u32> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("系统时间早于 unix 纪元")?
        .as_secs();
    u32::try_from(secs).context("系统时间超出 u32 范围")
}

fn apply(cmd: &ApplyCmd, config: &IndexVaultConfig) -> Result<()> {
    let state = load_state(&cmd.state)?;
    let body = match &cmd.body {
        Some(path) => read_cell(path)?,
        None => Cell::empty(),
    };
    let ctx = MessageContext {
        sender: cmd.sender.parse().context("发送方地址无效")?,
        value: cmd.value,
        now: match cmd.now {
            Some(now) => now,
            None => unix_now()?,
        },
    };

    let mut vault =
        Vault::new(vault_address(config)?, state).with_swap_deadline(config.vault.swap_deadline_secs);
    let messages = match vault.handle(&ctx, &body) {
        Ok(messages) => messages,
        Err(err) => bail!("消息被拒绝（退出码 {}）: {err}", err.exit_code()),
    };

    if cmd.write {
        let cell = vault.state().encode().context("无法编码新状态")?;
        write_cell(Some(&cmd.state), &cell, true)?;
    }
    print_json(&ApplyReport {
        messages: messages.iter().map(OutboundMessage::summary).collect(),
        total_supply: vault.total_supply().to_string(),
        accumulated_gas: vault.accumulated_gas().to_string(),
        waiting_entries: vault.waitings().len(),
    })
}

#[derive(Serialize)]
struct PlanReport {
    dex: Option<DexKind>,
    legs: Vec<String>,
    gas_budget: String,
    total_value: String,
    body: String,
}

fn coins(value: Coins) -> String {
    value.to_string()
}

fn plan(cmd: &PlanDepositCmd, config: &IndexVaultConfig) -> Result<()> {
    let registry = registry_from(config)?;
    if cmd.requested_mint.is_some() && registry.dex_kind() != Some(DexKind::StonFi) {
        bail!("只有 StonFi 金库接受指定铸造量");
    }
    let plan = plan_deposit(cmd.total, &registry)?;
    let body = deposit_body(cmd.query_id, &plan.legs, cmd.requested_mint)
        .context("无法编码存入正文")?;
    print_json(&PlanReport {
        dex: registry.dex_kind(),
        legs: plan.legs.iter().copied().map(coins).collect(),
        gas_budget: coins(plan.gas_budget),
        total_value: coins(plan.total_value),
        body: index_vault::cell::boc::to_base64(&body),
    })
}

fn print_user_key(cmd: &UserKeyCmd) -> Result<()> {
    let address: Address = cmd.address.parse().context("地址无效")?;
    println!("{}", hex_string(&user_key(&address)));
    Ok(())
}
