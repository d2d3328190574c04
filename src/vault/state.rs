use serde::Serialize;

use crate::basket::codec::{load_baskets, store_baskets};
use crate::basket::{Basket, BasketRegistry, DexKind};
use crate::cell::{Address, Cell, CellBuilder, CellResult, hex_string};
use crate::constants::Coins;
use crate::jetton::{JettonData, JettonHeader};
use crate::ledger::WaitingLedger;

use super::error::{VaultError, VaultResult};

/// 金库的全部持久化状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    pub header: JettonHeader,
    /// 首次配置前为真；也作为管理员暂停开关。
    pub stopped: bool,
    pub registry: BasketRegistry,
    pub waiting: WaitingLedger,
    pub accumulated_gas: Coins,
}

impl VaultState {
    /// 部署时的初始状态：未启用、零供应。
    pub fn new(admin: Address, content: Cell, wallet_code: Cell, registry: BasketRegistry) -> Self {
        Self {
            header: JettonHeader {
                total_supply: 0,
                admin,
                content,
                wallet_code,
            },
            stopped: true,
            registry,
            waiting: WaitingLedger::default(),
            accumulated_gas: 0,
        }
    }

    pub fn total_supply(&self) -> Coins {
        self.header.total_supply
    }

    pub fn encode(&self) -> CellResult<Cell> {
        let mut builder = CellBuilder::new();
        builder
            .store_ref(self.header.encode()?)?
            .store_bit(self.stopped)?
            .store_u8(self.registry.len() as u8)?
            .store_address(self.registry.dex_endpoint())?;
        store_baskets(&mut builder, self.registry.baskets())?;
        self.waiting.store(&mut builder)?;
        builder.store_coins(self.accumulated_gas)?;
        Ok(builder.build())
    }

    pub fn decode(cell: &Cell) -> VaultResult<Self> {
        let mut slice = cell.parse();
        let header = slice
            .load_ref()
            .and_then(|header| JettonHeader::decode(&header))
            .map_err(VaultError::invalid_data)?;
        let stopped = slice.load_bit().map_err(VaultError::invalid_data)?;
        let count = slice.load_u8().map_err(VaultError::invalid_data)? as usize;
        let dex_endpoint = slice.load_address().map_err(VaultError::invalid_data)?;
        let baskets = load_baskets(&mut slice, count).map_err(VaultError::invalid_data)?;
        let registry = if baskets.is_empty() {
            BasketRegistry::unconfigured(dex_endpoint)
        } else {
            BasketRegistry::new(baskets, dex_endpoint).map_err(VaultError::invalid_data)?
        };
        let waiting = WaitingLedger::load(&mut slice).map_err(VaultError::invalid_data)?;
        let legs = registry.len();
        for (key, entry) in waiting.iter() {
            if let Some(index) = entry.balances().keys().find(|index| **index as usize >= legs) {
                return Err(VaultError::InvalidVaultData(format!(
                    "waiting entry {} holds leg {index} of {legs}",
                    hex_string(key)
                )));
            }
        }
        let accumulated_gas = slice.load_coins().map_err(VaultError::invalid_data)?;
        Ok(Self {
            header,
            stopped,
            registry,
            waiting,
            accumulated_gas,
        })
    }

    pub fn vault_data(&self) -> VaultData {
        VaultData {
            stopped: self.stopped,
            basket_count: self.registry.len(),
            dex_kind: self.registry.dex_kind(),
            dex_endpoint: self.registry.dex_endpoint().copied(),
            baskets: self.registry.baskets().to_vec(),
            waiting_entries: self.waiting.len(),
            accumulated_gas: self.accumulated_gas.to_string(),
        }
    }

    pub fn jetton_data(&self) -> JettonData {
        JettonData {
            total_supply: self.header.total_supply,
            mintable: true,
            admin: self.header.admin,
            content_hash: hex_string(&self.header.content.repr_hash()),
            wallet_code_hash: hex_string(&self.header.wallet_code.repr_hash()),
        }
    }
}

/// `get_vault_data` 的只读视图。
#[derive(Debug, Clone, Serialize)]
pub struct VaultData {
    pub stopped: bool,
    pub basket_count: usize,
    pub dex_kind: Option<DexKind>,
    pub dex_endpoint: Option<Address>,
    pub baskets: Vec<Basket>,
    pub waiting_entries: usize,
    pub accumulated_gas: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::fixtures::{address, dedust_basket, endpoint};
    use crate::ledger::user_key;

    fn sample_state() -> VaultState {
        let registry = BasketRegistry::new(
            vec![dedust_basket(1, 1_000_000_000), dedust_basket(2, 500_000_000)],
            endpoint(),
        )
        .unwrap();
        let mut state = VaultState::new(address(90), Cell::empty(), address(91).to_cell(), registry);
        state
            .waiting
            .record(user_key(&address(5)), 1, 123, 2)
            .unwrap();
        state.accumulated_gas = 42;
        state.header.total_supply = 7;
        state
    }

    #[test]
    fn persisted_state_round_trips() {
        let state = sample_state();
        let cell = state.encode().unwrap();
        assert_eq!(cell.refs().len(), 3);
        assert_eq!(VaultState::decode(&cell).unwrap(), state);
    }

    #[test]
    fn unconfigured_state_decodes() {
        let state = VaultState::new(
            address(90),
            Cell::empty(),
            Cell::empty(),
            BasketRegistry::unconfigured(endpoint()),
        );
        let decoded = VaultState::decode(&state.encode().unwrap()).unwrap();
        assert!(decoded.stopped);
        assert!(decoded.registry.is_empty());
    }

    #[test]
    fn garbage_is_invalid_vault_data() {
        let err = VaultState::decode(&Cell::empty()).unwrap_err();
        assert_eq!(err.exit_code(), 405);
    }

    #[test]
    fn waiting_leg_beyond_basket_count_is_invalid() {
        let mut state = sample_state();
        state
            .waiting
            .record(user_key(&address(6)), 4, 55, 5)
            .unwrap();
        let err = VaultState::decode(&state.encode().unwrap()).unwrap_err();
        assert_eq!(err.exit_code(), 405);
        assert!(err.to_string().contains("leg 4 of 2"), "{err}");
    }

    #[test]
    fn views_expose_counts() {
        let state = sample_state();
        let data = state.vault_data();
        assert_eq!(data.basket_count, 2);
        assert_eq!(data.waiting_entries, 1);
        assert_eq!(data.dex_kind, Some(DexKind::DeDust));
        assert_eq!(state.jetton_data().total_supply, 7);
    }
}
