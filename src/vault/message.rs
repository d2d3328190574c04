//! 入站消息正文解析。

use crate::basket::Basket;
use crate::basket::codec::load_baskets;
use crate::cell::{Address, Cell, CellBuilder, CellResult, CellSlice};
use crate::constants::{Coins, op};
use crate::message::OutboundMessage;

use super::error::{VaultError, VaultResult};

/// 宿主账本交给金库的消息信封。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageContext {
    pub sender: Address,
    pub value: Coins,
    /// 当前区块时间（unix 秒）。
    pub now: u32,
}

/// 随兑换往返的回调元数据：`depositor:address requested_mint:(Maybe coins)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callback {
    pub depositor: Address,
    pub requested_mint: Option<Coins>,
}

impl Callback {
    pub fn encode(&self) -> CellResult<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_address(Some(&self.depositor))?;
        match self.requested_mint {
            Some(amount) => {
                builder.store_bit(true)?.store_coins(amount)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        Ok(builder.build())
    }

    /// 只有地址、没有覆盖标记位的回调也接受。
    pub fn decode(cell: &Cell) -> CellResult<Self> {
        let mut slice = cell.parse();
        let depositor = slice.load_required_address()?;
        let requested_mint = if slice.remaining_bits() > 0 && slice.load_bit()? {
            Some(slice.load_coins()?)
        } else {
            None
        };
        Ok(Self {
            depositor,
            requested_mint,
        })
    }
}

/// `change_vault_data` 携带的新配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfigUpdate {
    pub stopped: bool,
    pub dex_endpoint: Option<Address>,
    pub baskets: Vec<Basket>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// 没有正文的纯转账。
    TopUp,
    Excesses {
        query_id: u64,
    },
    Deposit {
        query_id: u64,
        amounts: Vec<Coins>,
    },
    TransferNotification {
        query_id: u64,
        amount: Coins,
        from: Option<Address>,
        callback: Option<Callback>,
    },
    BurnNotification {
        query_id: u64,
        amount: Coins,
        owner: Address,
        response: Option<Address>,
        in_kind: bool,
    },
    ProvideWalletAddress {
        query_id: u64,
        owner: Address,
        include_owner: bool,
    },
    ChangeAdmin {
        query_id: u64,
        admin: Address,
    },
    ChangeContent {
        query_id: u64,
        content: Cell,
    },
    ChangeVaultData {
        query_id: u64,
        update: VaultConfigUpdate,
    },
    SendAdminMessage {
        query_id: u64,
        message: OutboundMessage,
    },
    ChangeCodeAndData {
        query_id: u64,
        code: Cell,
        data: Cell,
    },
    ClearWaiting {
        query_id: u64,
        user: Address,
    },
}

impl InboundMessage {
    pub fn op(&self) -> Option<u32> {
        let code = match self {
            InboundMessage::TopUp => return None,
            InboundMessage::Excesses { .. } => op::EXCESSES,
            InboundMessage::Deposit { .. } => op::DEPOSIT,
            InboundMessage::TransferNotification { .. } => op::TRANSFER_NOTIFICATION,
            InboundMessage::BurnNotification { .. } => op::BURN_NOTIFICATION,
            InboundMessage::ProvideWalletAddress { .. } => op::PROVIDE_WALLET_ADDRESS,
            InboundMessage::ChangeAdmin { .. } => op::CHANGE_ADMIN,
            InboundMessage::ChangeContent { .. } => op::CHANGE_CONTENT,
            InboundMessage::ChangeVaultData { .. } => op::CHANGE_VAULT_DATA,
            InboundMessage::SendAdminMessage { .. } => op::SEND_ADMIN_MESSAGE,
            InboundMessage::ChangeCodeAndData { .. } => op::CHANGE_CODE_AND_DATA,
            InboundMessage::ClearWaiting { .. } => op::CLEAR_WAITING,
        };
        Some(code)
    }

    pub fn parse(body: &Cell) -> VaultResult<Self> {
        let mut slice = body.parse();
        if slice.remaining_bits() < 32 {
            return Ok(InboundMessage::TopUp);
        }
        let code = slice.load_u32()?;
        let query_id = slice.load_u64()?;
        let message = match code {
            op::EXCESSES => InboundMessage::Excesses { query_id },
            op::DEPOSIT => InboundMessage::Deposit {
                query_id,
                amounts: parse_amounts(&mut slice)?,
            },
            op::TRANSFER_NOTIFICATION => {
                let amount = slice.load_coins()?;
                let from = slice.load_address()?;
                let callback = match slice.load_maybe_ref()? {
                    Some(cell) => Some(Callback::decode(&cell)?),
                    None => None,
                };
                InboundMessage::TransferNotification {
                    query_id,
                    amount,
                    from,
                    callback,
                }
            }
            op::BURN_NOTIFICATION => {
                let amount = slice.load_coins()?;
                let owner = slice.load_required_address()?;
                let response = slice.load_address()?;
                let in_kind = if slice.remaining_bits() > 0 {
                    match slice.load_maybe_ref()? {
                        Some(options) => options.parse().load_bit()?,
                        None => false,
                    }
                } else {
                    false
                };
                InboundMessage::BurnNotification {
                    query_id,
                    amount,
                    owner,
                    response,
                    in_kind,
                }
            }
            op::PROVIDE_WALLET_ADDRESS => InboundMessage::ProvideWalletAddress {
                query_id,
                owner: slice.load_required_address()?,
                include_owner: slice.load_bit()?,
            },
            op::CHANGE_ADMIN => InboundMessage::ChangeAdmin {
                query_id,
                admin: slice.load_required_address()?,
            },
            op::CHANGE_CONTENT => InboundMessage::ChangeContent {
                query_id,
                content: slice.load_ref()?,
            },
            op::CHANGE_VAULT_DATA => InboundMessage::ChangeVaultData {
                query_id,
                update: parse_config_update(&mut slice)?,
            },
            op::SEND_ADMIN_MESSAGE => {
                let raw = slice.load_ref()?;
                let mode = slice.load_u8()?;
                InboundMessage::SendAdminMessage {
                    query_id,
                    message: parse_internal_message(&raw)?.with_mode(mode),
                }
            }
            op::CHANGE_CODE_AND_DATA => InboundMessage::ChangeCodeAndData {
                query_id,
                code: slice.load_ref()?,
                data: slice.load_ref()?,
            },
            op::CLEAR_WAITING => InboundMessage::ClearWaiting {
                query_id,
                user: slice.load_required_address()?,
            },
            other => return Err(VaultError::WrongOp(other)),
        };
        Ok(message)
    }
}

/// 读取正文剩余部分中的全部金额；残缺的尾部视为格式错误。
fn parse_amounts(slice: &mut CellSlice) -> VaultResult<Vec<Coins>> {
    let mut amounts = Vec::new();
    while slice.remaining_bits() > 0 {
        let amount = slice
            .load_coins()
            .map_err(|err| VaultError::InvalidDepositBody(err.to_string()))?;
        amounts.push(amount);
    }
    Ok(amounts)
}

fn parse_config_update(slice: &mut CellSlice) -> VaultResult<VaultConfigUpdate> {
    let stopped = slice.load_bit().map_err(VaultError::invalid_data)?;
    let count = slice.load_u8().map_err(VaultError::invalid_data)? as usize;
    let dex_endpoint = slice.load_address().map_err(VaultError::invalid_data)?;
    let baskets = load_baskets(slice, count).map_err(VaultError::invalid_data)?;
    Ok(VaultConfigUpdate {
        stopped,
        dex_endpoint,
        baskets,
    })
}

/// 解析完整的内部消息 cell（`int_msg_info` 头 + 可选 init + 正文）。
pub fn parse_internal_message(raw: &Cell) -> VaultResult<OutboundMessage> {
    let mut slice = raw.parse();
    if slice.load_bit()? {
        return Err(VaultError::Unexpected(
            "admin message must be internal".to_string(),
        ));
    }
    // ihr_disabled / bounce / bounced
    slice.load_uint(3)?;
    let _src = slice.load_address()?;
    let destination = slice.load_required_address()?;
    let value = slice.load_coins()?;
    let _extra_currencies = slice.load_maybe_ref()?;
    let _ihr_fee = slice.load_coins()?;
    let _fwd_fee = slice.load_coins()?;
    let _created_lt = slice.load_u64()?;
    let _created_at = slice.load_u32()?;
    let state_init = if slice.load_bit()? {
        if !slice.load_bit()? {
            return Err(VaultError::Unexpected(
                "inline state init is not supported".to_string(),
            ));
        }
        Some(slice.load_ref()?)
    } else {
        None
    };
    let body = if slice.load_bit()? {
        slice.load_ref()?
    } else {
        let mut inline = CellBuilder::new();
        inline.store_slice(&slice)?;
        inline.build()
    };
    let mut message = OutboundMessage::new(destination, value, body);
    message.state_init = state_init;
    Ok(message)
}

/// 与 [`parse_internal_message`] 对应的编码，供管理工具构造消息。
pub fn encode_internal_message(message: &OutboundMessage) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_uint(0b011000, 6)?
        .store_address(Some(&message.destination))?
        .store_coins(message.value)?
        .store_uint(0, 1 + 4 + 4 + 64 + 32)?;
    match &message.state_init {
        Some(state_init) => {
            builder.store_uint(0b11, 2)?.store_ref(state_init.clone())?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }
    builder.store_bit(true)?.store_ref(message.body.clone())?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address::new(0, [seed; 32])
    }

    fn header(code: u32) -> CellBuilder {
        let mut builder = CellBuilder::new();
        builder.store_u32(code).unwrap().store_u64(0).unwrap();
        builder
    }

    #[test]
    fn callback_accepts_address_only_payload() {
        let callback = Callback::decode(&addr(4).to_cell()).unwrap();
        assert_eq!(callback.depositor, addr(4));
        assert_eq!(callback.requested_mint, None);

        let full = Callback {
            depositor: addr(4),
            requested_mint: Some(77),
        };
        assert_eq!(Callback::decode(&full.encode().unwrap()).unwrap(), full);
    }

    #[test]
    fn deposit_amounts_are_read_to_the_end() {
        let mut body = header(op::DEPOSIT);
        for amount in [1u128, 2, 3] {
            body.store_coins(amount).unwrap();
        }
        let parsed = InboundMessage::parse(&body.build()).unwrap();
        assert_eq!(
            parsed,
            InboundMessage::Deposit {
                query_id: 0,
                amounts: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn truncated_deposit_amount_is_invalid_body() {
        let mut body = header(op::DEPOSIT);
        body.store_coins(5).unwrap().store_uint(0b11, 2).unwrap();
        let err = InboundMessage::parse(&body.build()).unwrap_err();
        assert_eq!(err.exit_code(), 400);
    }

    #[test]
    fn notification_with_metadata() {
        let callback = Callback {
            depositor: addr(8),
            requested_mint: None,
        };
        let mut body = header(op::TRANSFER_NOTIFICATION);
        body.store_coins(10)
            .unwrap()
            .store_address(Some(&addr(2)))
            .unwrap()
            .store_maybe_ref(Some(callback.encode().unwrap()))
            .unwrap();
        let parsed = InboundMessage::parse(&body.build()).unwrap();
        assert_eq!(
            parsed,
            InboundMessage::TransferNotification {
                query_id: 0,
                amount: 10,
                from: Some(addr(2)),
                callback: Some(callback),
            }
        );
    }

    #[test]
    fn unknown_op_and_empty_body() {
        let err = InboundMessage::parse(&header(0x1234_5678).build()).unwrap_err();
        assert_eq!(err, VaultError::WrongOp(0x1234_5678));
        assert_eq!(
            InboundMessage::parse(&Cell::empty()).unwrap(),
            InboundMessage::TopUp
        );
    }

    #[test]
    fn truncated_notification_is_malformed() {
        let mut body = header(op::TRANSFER_NOTIFICATION);
        body.store_coins(10).unwrap();
        let err = InboundMessage::parse(&body.build()).unwrap_err();
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn internal_message_round_trip() {
        let mut payload = CellBuilder::new();
        payload.store_u32(0).unwrap();
        let message = OutboundMessage::new(addr(3), 50_000_000, payload.build());
        let raw = encode_internal_message(&message).unwrap();
        assert_eq!(parse_internal_message(&raw).unwrap(), message);
    }

    #[test]
    fn sweep_message_with_inline_body() {
        // 6 位头 0x18 + 目标 + 金额 + 107 个零位，正文内联
        let mut raw = CellBuilder::new();
        raw.store_uint(0x18, 6)
            .unwrap()
            .store_address(Some(&addr(6)))
            .unwrap()
            .store_coins(50_000_000)
            .unwrap()
            .store_uint(0, 107)
            .unwrap();
        let message = parse_internal_message(&raw.build()).unwrap();
        assert_eq!(message.destination, addr(6));
        assert_eq!(message.value, 50_000_000);
        assert_eq!(message.body, Cell::empty());
    }
}
