use serde::Serialize;

use crate::cell::{Address, Cell, hex_string};
use crate::constants::{Coins, MODE_PAY_FEES_SEPARATELY};

/// 金库处理一条入站消息后产生的出站内部消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: Address,
    pub value: Coins,
    pub body: Cell,
    pub state_init: Option<Cell>,
    pub mode: u8,
}

impl OutboundMessage {
    pub fn new(destination: Address, value: Coins, body: Cell) -> Self {
        Self {
            destination,
            value,
            body,
            state_init: None,
            mode: MODE_PAY_FEES_SEPARATELY,
        }
    }

    pub fn with_state_init(mut self, state_init: Cell) -> Self {
        self.state_init = Some(state_init);
        self
    }

    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    /// 正文前 32 位操作码，空正文返回 `None`。
    pub fn op(&self) -> Option<u32> {
        self.body.parse().load_u32().ok()
    }

    pub fn summary(&self) -> OutboundSummary {
        OutboundSummary {
            destination: self.destination,
            value: self.value.to_string(),
            op: self.op().map(|op| format!("{op:#010x}")),
            body_hash: hex_string(&self.body.repr_hash()),
            mode: self.mode,
            with_state_init: self.state_init.is_some(),
        }
    }
}

/// 供 CLI 以 JSON 输出的出站消息摘要。
#[derive(Debug, Clone, Serialize)]
pub struct OutboundSummary {
    pub destination: Address,
    pub value: String,
    pub op: Option<String>,
    pub body_hash: String,
    pub mode: u8,
    pub with_state_init: bool,
}
