use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A ledger wallet address.
///
/// Addresses are compared case-insensitively everywhere in the protocol, so
/// the raw string is normalized to lowercase at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WalletAddress {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for WalletAddress {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logical host name in the corridor directory, e.g. `"no:fxp1"`.
///
/// Host names are routing labels, not URLs: the hub resolves them to base
/// URLs through its host directory, and providers use the instance segment
/// (after the colon) as a path prefix when addressing a peer directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct HostName(String);

impl HostName {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instance segment of the host name (the part after the first
    /// colon), used as the path prefix for direct provider-to-provider
    /// delivery. Falls back to the whole name for colon-free hosts.
    pub fn instance(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }
}

impl From<String> for HostName {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for HostName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reachable protocol participant: wallet plus host directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "walletAddress")]
    pub wallet: WalletAddress,
    pub host: HostName,
}

impl Endpoint {
    pub fn new(wallet: impl Into<WalletAddress>, host: impl Into<HostName>) -> Self {
        Self {
            wallet: wallet.into(),
            host: host.into(),
        }
    }
}

/// A payment party identified by wallet address only (sender / recipient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "walletAddress")]
    pub wallet: WalletAddress,
}

impl Party {
    pub fn new(wallet: impl Into<WalletAddress>) -> Self {
        Self {
            wallet: wallet.into(),
        }
    }
}

/// ISO 4217 currencies supported by the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    NOK,
    SEK,
    ILS,
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NOK => "NOK",
            Self::SEK => "SEK",
            Self::ILS => "ILS",
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }

    /// Decimal precision used when quoting amounts in this currency.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::NOK | Self::SEK | Self::ILS | Self::EUR | Self::USD | Self::GBP => 2,
        }
    }

    /// Parse from an ISO 4217 code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "NOK" => Some(Self::NOK),
            "SEK" => Some(Self::SEK),
            "ILS" => Some(Self::ILS),
            "EUR" => Some(Self::EUR),
            "USD" => Some(Self::USD),
            "GBP" => Some(Self::GBP),
            _ => None,
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code).ok_or(CoreError::InvalidCurrency(code))
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A decimal monetary amount as carried on the wire.
///
/// Ledger locks hold integer token units; `to_minor_units` performs the
/// conversion at a given decimal precision with round-half-away rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl Amount {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Convert to integer minor units at the given decimal precision.
    pub fn to_minor_units(&self, decimals: u32) -> Result<u128, CoreError> {
        if !self.0.is_finite() {
            return Err(CoreError::InvalidAmount(format!(
                "amount is not finite: {}",
                self.0
            )));
        }
        if self.0 < 0.0 {
            return Err(CoreError::InvalidAmount(format!(
                "amount is negative: {}",
                self.0
            )));
        }
        let scaled = (self.0 * 10f64.powi(decimals as i32)).round();
        if scaled > u128::MAX as f64 {
            return Err(CoreError::InvalidAmount(format!(
                "amount out of range: {}",
                self.0
            )));
        }
        Ok(scaled as u128)
    }

    /// Reconstruct a decimal amount from integer minor units.
    pub fn from_minor_units(units: u128, decimals: u32) -> Self {
        Self(units as f64 / 10f64.powi(decimals as i32))
    }

    /// Round to the given precision using banker's rounding (half to even),
    /// the convention for quoted FX amounts.
    pub fn round_bankers(&self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let scaled = (self.0 * scale).abs();
        let floor = scaled.floor();
        let fraction = scaled - floor;
        let rounded = if (fraction - 0.5).abs() < 1e-9 {
            if (floor as u64) % 2 == 0 {
                floor
            } else {
                floor + 1.0
            }
        } else {
            scaled.round()
        };
        let signed = if self.0 < 0.0 { -rounded } else { rounded };
        Self(signed / scale)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The token contract settled through the ledger's lock contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct TokenId(String);

impl TokenId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TokenId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for TokenId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a lock on the ledger (the contract id of one HTLC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockId(pub [u8; 32]);

impl LockId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for LockId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| CoreError::InvalidHex(format!("lock id {s}: {e}")))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHex(format!("lock id {s}: expected 32 bytes")))?;
        Ok(Self(array))
    }
}

impl Serialize for LockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
