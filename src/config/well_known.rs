//! 公开 DEX 合约的默认地址（raw 形式）。

use crate::cell::Address;

use super::NetworkName;

const DEDUST_NATIVE_VAULT: [u8; 32] =
    hash("dae153a74d894bbc32748198cd626e4f5df4a69ad2fa56ce80fc2644b5708d20");
const STONFI_ROUTER_MAINNET: [u8; 32] =
    hash("5f0564fb5f604783db57031ce1cf668a88d4d4d6da6de4db222b4b920d6fd800");
const STONFI_ROUTER_TESTNET: [u8; 32] =
    hash("779dcc815138d9500e449c5291e7f12738c23d575b5310000f6a253bd607384e");
const STONFI_PROXY_TON_MAINNET: [u8; 32] =
    hash("f9dcf6c2f02ac78c783007c104e904416d7e4ac0dbd71efa9958210a030787dc");
const STONFI_PROXY_TON_TESTNET: [u8; 32] =
    hash("8cdc1d7640ad5ee326527fc1ad0514f468b30dc84b0173f0e155f451b4e11f7c");

const fn nibble(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => panic!("invalid hex digit"),
    }
}

const fn hash(hex: &str) -> [u8; 32] {
    let bytes = hex.as_bytes();
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = (nibble(bytes[2 * i]) << 4) | nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

/// DeDust 的原生资产 vault 在两个网络上是同一个地址。
pub fn dedust_native_vault(_network: NetworkName) -> Address {
    Address::new(0, DEDUST_NATIVE_VAULT)
}

pub fn stonfi_router(network: NetworkName) -> Address {
    match network {
        NetworkName::Mainnet => Address::new(0, STONFI_ROUTER_MAINNET),
        NetworkName::Testnet => Address::new(0, STONFI_ROUTER_TESTNET),
    }
}

pub fn stonfi_proxy_ton(network: NetworkName) -> Address {
    match network {
        NetworkName::Mainnet => Address::new(0, STONFI_PROXY_TON_MAINNET),
        NetworkName::Testnet => Address::new(0, STONFI_PROXY_TON_TESTNET),
    }
}
