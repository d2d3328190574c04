//! 协议固定常量：金额单位、Gas 参数与 32 位操作码。

/// 链上金额（nanoton / jetton 最小单位）。
pub type Coins = u128;

/// 指数代币的定点单位，权重以此为 1。
pub const INDEX_UNIT: Coins = 1_000_000_000;

/// 每条腿交给 DEX 的兑换 Gas。
pub const SWAP_GAS: Coins = 100_000_000;
/// 每条腿回调及铸造转发所需 Gas。
pub const MINT_SEND_GAS: Coins = 50_000_000;
pub const PER_LEG_GAS: Coins = SWAP_GAS + MINT_SEND_GAS;

/// 线性执行成本模型 `n * K1 + K2`。
pub const BASE_OVERHEAD_PER_LEG: Coins = 3_200_000;
pub const BASE_OVERHEAD_FIXED: Coins = 1_400_000;

pub const MIN_EXCHANGE_AMOUNT: Coins = 100_000_000;
pub const DISCOVERY_FEE: Coins = 5_000_000;
pub const REDEEM_OVERHEAD: Coins = 10_000_000;

pub const MAX_BASKETS: usize = 255;
pub const DEFAULT_SWAP_DEADLINE_SECS: u32 = 300;

/// 发送模式：携带入站余额 / 携带全部余额。
pub const MODE_CARRY_INBOUND: u8 = 64;
pub const MODE_CARRY_ALL_BALANCE: u8 = 128;
pub const MODE_PAY_FEES_SEPARATELY: u8 = 1;

pub mod op {
    pub const TRANSFER: u32 = 0x0f8a_7ea5;
    pub const TRANSFER_NOTIFICATION: u32 = 0x7362_d09c;
    pub const INTERNAL_TRANSFER: u32 = 0x178d_4519;
    pub const EXCESSES: u32 = 0xd532_76db;
    pub const BURN_NOTIFICATION: u32 = 0x7bdd_97de;
    pub const PROVIDE_WALLET_ADDRESS: u32 = 0x2c76_b973;
    pub const TAKE_WALLET_ADDRESS: u32 = 0xd173_5400;
    pub const CHANGE_ADMIN: u32 = 0x3f9a_72c4;
    pub const CHANGE_CONTENT: u32 = 0x1d5e_8b3f;

    pub const DEPOSIT: u32 = 0x3a8f_7c12;
    pub const CHANGE_VAULT_DATA: u32 = 0xf1b3_2984;
    pub const SEND_ADMIN_MESSAGE: u32 = 0x78d5_e3af;
    pub const CHANGE_CODE_AND_DATA: u32 = 0xc4a0_912f;
    pub const CLEAR_WAITING: u32 = 0x5c3a_9e71;

    pub const DEDUST_TON_SWAP: u32 = 0xea06_185d;
    pub const DEDUST_JETTON_SWAP: u32 = 0xe3a0_d482;
    pub const STONFI_TON_SWAP: u32 = 0xea06_185e;
    pub const STONFI_JETTON_SWAP: u32 = 0xe3a0_d483;
}
