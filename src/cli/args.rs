use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "index-vault", version, about = "链上指数金库运维工具")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 index-vault.toml 或 config/index-vault.toml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 根据配置生成初始持久化状态（base64 BoC）
    Init(InitCmd),
    /// 以 JSON 打印状态文件中的金库、篮子与等待账本
    Inspect(InspectCmd),
    /// 把一条入站消息应用到状态文件并打印出站消息
    Apply(ApplyCmd),
    /// 按权重拆分一笔存入，给出需附带的价值与正文
    #[command(name = "plan-deposit")]
    PlanDeposit(PlanDepositCmd),
    /// 打印地址在等待账本中的 256 位键
    #[command(name = "user-key")]
    UserKey(UserKeyCmd),
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "FILE", help = "jetton 钱包代码（BoC，base64 或二进制）")]
    pub wallet_code: PathBuf,
    #[arg(long, value_name = "FILE", help = "输出文件（默认打印到标准输出）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InspectCmd {
    #[arg(value_name = "STATE", help = "状态文件（BoC，base64 或二进制）")]
    pub state: PathBuf,
    #[arg(long, help = "额外打印该持有人的指数代币钱包地址")]
    pub owner: Option<String>,
}

#[derive(Args, Debug)]
pub struct ApplyCmd {
    #[arg(value_name = "STATE", help = "状态文件（BoC，base64 或二进制）")]
    pub state: PathBuf,
    #[arg(long, value_name = "FILE", help = "入站消息正文（BoC）；缺省为空正文")]
    pub body: Option<PathBuf>,
    #[arg(long, help = "发送方地址")]
    pub sender: String,
    #[arg(long, help = "附带价值（nanoton）")]
    pub value: u128,
    #[arg(long, help = "区块时间（unix 秒），默认取当前时间")]
    pub now: Option<u32>,
    #[arg(long, help = "成功后把新状态写回文件")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct PlanDepositCmd {
    #[arg(help = "基础资产总额（nanoton）")]
    pub total: u128,
    #[arg(long, default_value_t = 0u64, help = "查询 ID")]
    pub query_id: u64,
    #[arg(long, help = "指定铸造量（仅 StonFi 金库）")]
    pub requested_mint: Option<u128>,
}

#[derive(Args, Debug)]
pub struct UserKeyCmd {
    #[arg(help = "raw（0:<hex>）或 user-friendly 地址")]
    pub address: String,
}
