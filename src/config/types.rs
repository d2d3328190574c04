use serde::Deserialize;

use crate::basket::{Basket, DeDustRoute, DexKind, DexRoute, StonFiRoute};
use crate::cell::Address;
use crate::constants::{Coins, DEFAULT_SWAP_DEADLINE_SECS};

use super::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexVaultConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub baskets: Vec<BasketConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: super::default_logging_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    #[default]
    Mainnet,
    Testnet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub name: NetworkName,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringConfig {
    /// 例如 `0.0.0.0:9464`；为空时不安装导出器。
    #[serde(default)]
    pub prometheus_listen: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub admin: Option<Address>,
    #[serde(default = "super::default_dex")]
    pub dex: DexKind,
    /// 缺省时按网络取公开的入口地址。
    #[serde(default)]
    pub dex_endpoint: Option<Address>,
    #[serde(default)]
    pub content_uri: String,
    #[serde(default = "super::default_swap_deadline_secs")]
    pub swap_deadline_secs: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: None,
            admin: None,
            dex: super::default_dex(),
            dex_endpoint: None,
            content_uri: String::new(),
            swap_deadline_secs: DEFAULT_SWAP_DEADLINE_SECS,
        }
    }
}

/// 单条腿的配置；按 `vault.dex` 选取需要的路由字段。
#[derive(Debug, Clone, Deserialize)]
pub struct BasketConfig {
    pub weight: Coins,
    pub wallet: Address,
    pub master: Address,
    #[serde(default)]
    pub pool: Option<Address>,
    #[serde(default)]
    pub jetton_vault: Option<Address>,
    #[serde(default)]
    pub router: Option<Address>,
    #[serde(default)]
    pub proxy_base: Option<Address>,
    #[serde(default)]
    pub router_local_wallet: Option<Address>,
}

fn required(value: Option<Address>, index: usize, field: &str) -> Result<Address, ConfigError> {
    value.ok_or_else(|| ConfigError::Invalid(format!("baskets[{index}] is missing `{field}`")))
}

impl BasketConfig {
    pub fn resolve(
        &self,
        index: usize,
        dex: DexKind,
        network: NetworkName,
    ) -> Result<Basket, ConfigError> {
        let route = match dex {
            DexKind::DeDust => DexRoute::DeDust(DeDustRoute {
                pool: required(self.pool, index, "pool")?,
                jetton_vault: required(self.jetton_vault, index, "jetton_vault")?,
            }),
            DexKind::StonFi => DexRoute::StonFi(StonFiRoute {
                router: self
                    .router
                    .unwrap_or_else(|| super::well_known::stonfi_router(network)),
                proxy_base: self
                    .proxy_base
                    .unwrap_or_else(|| super::well_known::stonfi_proxy_ton(network)),
                router_local_wallet: required(
                    self.router_local_wallet,
                    index,
                    "router_local_wallet",
                )?,
            }),
        };
        Ok(Basket {
            weight: self.weight,
            wallet: self.wallet,
            master: self.master,
            route,
        })
    }
}

impl IndexVaultConfig {
    pub fn resolved_baskets(&self) -> Result<Vec<Basket>, ConfigError> {
        self.baskets
            .iter()
            .enumerate()
            .map(|(index, basket)| basket.resolve(index, self.vault.dex, self.network.name))
            .collect()
    }

    pub fn resolved_endpoint(&self) -> Address {
        self.vault.dex_endpoint.unwrap_or_else(|| match self.vault.dex {
            DexKind::DeDust => super::well_known::dedust_native_vault(self.network.name),
            DexKind::StonFi => super::well_known::stonfi_router(self.network.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: IndexVaultConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.network.name, NetworkName::Mainnet);
        assert_eq!(config.vault.dex, DexKind::DeDust);
        assert_eq!(config.vault.swap_deadline_secs, 300);
        assert!(config.baskets.is_empty());
    }

    #[test]
    fn stonfi_baskets_fill_router_defaults() {
        let raw = r#"
            [network]
            name = "testnet"

            [vault]
            dex = "stonfi"

            [[baskets]]
            weight = 1000000000
            wallet = "0:0101010101010101010101010101010101010101010101010101010101010101"
            master = "0:0202020202020202020202020202020202020202020202020202020202020202"
            router_local_wallet = "0:0303030303030303030303030303030303030303030303030303030303030303"
        "#;
        let config: IndexVaultConfig = toml::from_str(raw).unwrap();
        let baskets = config.resolved_baskets().unwrap();
        match baskets[0].route {
            DexRoute::StonFi(route) => {
                assert_eq!(route.router, crate::config::well_known::stonfi_router(NetworkName::Testnet));
                assert_eq!(route.router_local_wallet, Address::new(0, [3; 32]));
            }
            other => panic!("unexpected route {other:?}"),
        }
        assert_eq!(
            config.resolved_endpoint(),
            crate::config::well_known::stonfi_router(NetworkName::Testnet)
        );
    }

    #[test]
    fn dedust_basket_without_pool_is_invalid() {
        let raw = r#"
            [[baskets]]
            weight = 1
            wallet = "0:0101010101010101010101010101010101010101010101010101010101010101"
            master = "0:0202020202020202020202020202020202020202020202020202020202020202"
        "#;
        let config: IndexVaultConfig = toml::from_str(raw).unwrap();
        let err = config.resolved_baskets().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("pool")));
    }
}
