use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cell, CellBuilder, hex_string};

const FRIENDLY_LEN: usize = 36;
const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("invalid workchain: {0}")]
    Workchain(String),
    #[error("invalid account hash: {0}")]
    Hash(String),
    #[error("invalid friendly address: {0}")]
    Friendly(String),
    #[error("friendly address checksum mismatch")]
    Checksum,
}

/// `addr_std` 内部地址（不支持 anycast）。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    /// `10` + anycast 位 + 8 位工作链 + 256 位哈希。
    pub const BIT_LEN: usize = 267;

    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash_part(&self) -> &[u8; 32] {
        &self.hash
    }

    /// 只包含该地址的 cell。
    pub fn to_cell(&self) -> Cell {
        let mut builder = CellBuilder::new();
        builder.push_address(self);
        builder.build()
    }

    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex_string(&self.hash))
    }

    pub fn to_friendly(&self, bounceable: bool, testnet: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if testnet {
            tag |= TAG_TESTNET;
        }
        let mut bytes = Vec::with_capacity(FRIENDLY_LEN);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let crc = crc16_xmodem(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        URL_SAFE.encode(bytes)
    }

    fn parse_raw(value: &str) -> Result<Self, AddressParseError> {
        let (workchain, hash) = value
            .split_once(':')
            .ok_or_else(|| AddressParseError::Workchain(value.to_string()))?;
        let workchain: i8 = workchain
            .parse()
            .map_err(|_| AddressParseError::Workchain(workchain.to_string()))?;
        if hash.len() != 64 || !hash.is_ascii() {
            return Err(AddressParseError::Hash(hash.to_string()));
        }
        let mut out = [0u8; 32];
        for (index, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hash[index * 2..index * 2 + 2], 16)
                .map_err(|_| AddressParseError::Hash(hash.to_string()))?;
        }
        Ok(Self::new(workchain, out))
    }

    fn parse_friendly(value: &str) -> Result<Self, AddressParseError> {
        let bytes = URL_SAFE
            .decode(value)
            .or_else(|_| STANDARD.decode(value))
            .map_err(|err| AddressParseError::Friendly(err.to_string()))?;
        if bytes.len() != FRIENDLY_LEN {
            return Err(AddressParseError::Friendly(format!(
                "expected {FRIENDLY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let tag = bytes[0] & !TAG_TESTNET;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(AddressParseError::Friendly(format!("unknown tag {:#04x}", bytes[0])));
        }
        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16_xmodem(&bytes[..34]) != expected {
            return Err(AddressParseError::Checksum);
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Self::new(bytes[1] as i8, hash))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.contains(':') {
            Self::parse_raw(value)
        } else {
            Self::parse_friendly(value)
        }
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_raw()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_raw())
    }
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";

    #[test]
    fn crc16_reference_vector() {
        assert_eq!(crc16_xmodem(b"123456789"), 0x31c3);
    }

    #[test]
    fn raw_form_round_trips() {
        let address: Address = RAW.parse().unwrap();
        assert_eq!(address.workchain(), 0);
        assert_eq!(address.to_string(), RAW);
    }

    #[test]
    fn friendly_form_matches_raw() {
        let address: Address = RAW.parse().unwrap();
        let friendly = address.to_friendly(true, false);
        assert_eq!(friendly.len(), 48);
        assert!(friendly.starts_with("EQ"));
        assert_eq!(friendly.parse::<Address>().unwrap(), address);

        let standard = friendly.replace('-', "+").replace('_', "/");
        assert_eq!(standard.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn friendly_checksum_is_verified() {
        let address: Address = RAW.parse().unwrap();
        let mut friendly = address.to_friendly(false, true);
        let last = friendly.pop().unwrap();
        friendly.push(if last == 'A' { 'B' } else { 'A' });
        assert!(friendly.parse::<Address>().is_err());
    }

    #[test]
    fn masterchain_workchain_is_signed() {
        let address: Address = RAW.replacen("0:", "-1:", 1).parse().unwrap();
        assert_eq!(address.workchain(), -1);
        let cell = address.to_cell();
        assert_eq!(cell.bit_len(), Address::BIT_LEN);
        let parsed = cell.parse().load_required_address().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn rejects_malformed_raw() {
        assert!("0:abc".parse::<Address>().is_err());
        assert!("x:".parse::<Address>().is_err());
    }
}
