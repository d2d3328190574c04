//! 指数代币的 jetton minter 面：头部数据、钱包地址推导与标准消息正文。

use serde::Serialize;

use crate::cell::{Address, Cell, CellBuilder, CellResult, CellSlice, MAX_CELL_BITS};
use crate::constants::{Coins, op};

/// 持久化状态中的 jetton 头部。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonHeader {
    pub total_supply: Coins,
    pub admin: Address,
    pub content: Cell,
    pub wallet_code: Cell,
}

impl JettonHeader {
    pub fn encode(&self) -> CellResult<Cell> {
        let mut builder = CellBuilder::new();
        builder
            .store_coins(self.total_supply)?
            .store_address(Some(&self.admin))?
            .store_ref(self.content.clone())?
            .store_ref(self.wallet_code.clone())?;
        Ok(builder.build())
    }

    pub fn decode(cell: &Cell) -> CellResult<Self> {
        let mut slice = cell.parse();
        Ok(Self {
            total_supply: slice.load_coins()?,
            admin: slice.load_required_address()?,
            content: slice.load_ref()?,
            wallet_code: slice.load_ref()?,
        })
    }
}

/// `get_jetton_data` 的只读视图。
#[derive(Debug, Clone, Serialize)]
pub struct JettonData {
    pub total_supply: Coins,
    pub mintable: bool,
    pub admin: Address,
    pub content_hash: String,
    pub wallet_code_hash: String,
}

/// 钱包数据：`balance:Coins owner master ^wallet_code`。
fn wallet_data(wallet_code: &Cell, owner: &Address, master: &Address) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_coins(0)?
        .store_address(Some(owner))?
        .store_address(Some(master))?
        .store_ref(wallet_code.clone())?;
    Ok(builder.build())
}

/// `StateInit`：无 split_depth、无 special、带 code 与 data、无 library。
pub fn wallet_state_init(wallet_code: &Cell, owner: &Address, master: &Address) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_uint(0b00110, 5)?
        .store_ref(wallet_code.clone())?
        .store_ref(wallet_data(wallet_code, owner, master)?)?;
    Ok(builder.build())
}

pub fn wallet_address(wallet_code: &Cell, owner: &Address, master: &Address) -> CellResult<Address> {
    let state_init = wallet_state_init(wallet_code, owner, master)?;
    Ok(Address::new(0, state_init.repr_hash()))
}

pub fn transfer_body(
    query_id: u64,
    amount: Coins,
    destination: &Address,
    response: &Address,
    forward_ton: Coins,
    forward_payload: Option<Cell>,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_u32(op::TRANSFER)?
        .store_u64(query_id)?
        .store_coins(amount)?
        .store_address(Some(destination))?
        .store_address(Some(response))?
        .store_bit(false)?
        .store_coins(forward_ton)?;
    // Either Cell ^Cell：负载总是放进引用
    builder.store_maybe_ref(forward_payload)?;
    Ok(builder.build())
}

pub fn internal_transfer_body(
    query_id: u64,
    amount: Coins,
    from: &Address,
    response: &Address,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .store_u32(op::INTERNAL_TRANSFER)?
        .store_u64(query_id)?
        .store_coins(amount)?
        .store_address(Some(from))?
        .store_address(Some(response))?
        .store_coins(0)?
        .store_bit(false)?;
    Ok(builder.build())
}

pub fn take_wallet_address_body(
    query_id: u64,
    wallet: Option<&Address>,
    owner: Option<&Address>,
) -> CellResult<Cell> {
    let owner_cell = owner.map(Address::to_cell);
    let mut builder = CellBuilder::new();
    builder
        .store_u32(op::TAKE_WALLET_ADDRESS)?
        .store_u64(query_id)?
        .store_address(wallet)?
        .store_maybe_ref(owner_cell)?;
    Ok(builder.build())
}

/// 链下元数据内容：前缀 `0x01` 后接 snake 编码的 URI。
pub fn offchain_content(uri: &str) -> CellResult<Cell> {
    let mut data = Vec::with_capacity(uri.len() + 1);
    data.push(0x01);
    data.extend_from_slice(uri.as_bytes());

    let mut tail: Option<Cell> = None;
    for chunk in data.chunks(MAX_CELL_BITS / 8).rev() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(chunk)?;
        if let Some(next) = tail.take() {
            builder.store_ref(next)?;
        }
        tail = Some(builder.build());
    }
    Ok(tail.unwrap_or_else(Cell::empty))
}

/// 解析 `transfer` 正文，供测试与 CLI 检查出站消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFields {
    pub query_id: u64,
    pub amount: Coins,
    pub destination: Address,
    pub response: Address,
    pub forward_ton: Coins,
    pub forward_payload: Option<Cell>,
}

pub fn parse_transfer(body: &Cell) -> CellResult<Option<TransferFields>> {
    let mut slice: CellSlice = body.parse();
    if slice.load_u32()? != op::TRANSFER {
        return Ok(None);
    }
    let query_id = slice.load_u64()?;
    let amount = slice.load_coins()?;
    let destination = slice.load_required_address()?;
    let response = slice.load_required_address()?;
    let _custom_payload = slice.load_maybe_ref()?;
    let forward_ton = slice.load_coins()?;
    let forward_payload = slice.load_maybe_ref()?;
    Ok(Some(TransferFields {
        query_id,
        amount,
        destination,
        response,
        forward_ton,
        forward_payload,
    }))
}
