//! Domain-specific identifier types.

use crate::{Hash, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Ledger network a key or address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    /// Public main network.
    MainNet,
    /// Public test network.
    TestNet,
    /// Private network.
    Mijin,
    /// Private test network.
    MijinTest,
}

impl Default for NetworkType {
    fn default() -> Self {
        NetworkType::MijinTest
    }
}

impl NetworkType {
    /// Network identifier byte prepended to addresses.
    pub fn id_byte(self) -> u8 {
        match self {
            NetworkType::MainNet => 0x68,
            NetworkType::TestNet => 0x98,
            NetworkType::Mijin => 0x60,
            NetworkType::MijinTest => 0x90,
        }
    }

    /// Leading character of a rendered address on this network.
    pub fn address_prefix(self) -> char {
        match self {
            NetworkType::MainNet => 'N',
            NetworkType::TestNet => 'T',
            NetworkType::Mijin => 'M',
            NetworkType::MijinTest => 'S',
        }
    }

    /// Resolve a network from an address prefix character.
    pub fn from_address_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'N' => Some(NetworkType::MainNet),
            'T' => Some(NetworkType::TestNet),
            'M' => Some(NetworkType::Mijin),
            'S' => Some(NetworkType::MijinTest),
            _ => None,
        }
    }

    /// Canonical upper-case name (`MAIN_NET`, `MIJIN_TEST`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkType::MainNet => "MAIN_NET",
            NetworkType::TestNet => "TEST_NET",
            NetworkType::Mijin => "MIJIN",
            NetworkType::MijinTest => "MIJIN_TEST",
        }
    }
}

impl FromStr for NetworkType {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MAIN_NET" => Ok(NetworkType::MainNet),
            "TEST_NET" => Ok(NetworkType::TestNet),
            "MIJIN" => Ok(NetworkType::Mijin),
            "MIJIN_TEST" => Ok(NetworkType::MijinTest),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a network name is not one of the four known networks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown network type {0:?} (expected MAIN_NET, TEST_NET, MIJIN or MIJIN_TEST)")]
pub struct UnknownNetwork(pub String);

/// Account address (network byte + 20-byte key digest).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    network: NetworkType,
    digest: [u8; 20],
}

impl Address {
    /// Length of the rendered form: prefix character + 40 hex digits.
    pub const RENDERED_LEN: usize = 41;

    /// Derive the address of a public key on a network.
    pub fn from_public_key(public_key: &PublicKey, network: NetworkType) -> Self {
        let hash = Hash::from_parts(&[&[network.id_byte()], public_key.as_bytes()]);
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&hash.as_bytes()[..20]);
        Self { network, digest }
    }

    /// Network this address belongs to.
    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Raw digest bytes.
    pub fn digest(&self) -> &[u8; 20] {
        &self.digest
    }

    /// Rendered form without separators.
    pub fn plain(&self) -> String {
        format!(
            "{}{}",
            self.network.address_prefix(),
            hex::encode_upper(self.digest)
        )
    }

    /// Parse a rendered address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.len() != Self::RENDERED_LEN {
            return Err(AddressError::InvalidLength(input.len()));
        }
        let mut chars = input.chars();
        let prefix = chars.next().ok_or(AddressError::InvalidLength(0))?;
        let network =
            NetworkType::from_address_prefix(prefix).ok_or(AddressError::UnknownPrefix(prefix))?;
        let mut digest = [0u8; 20];
        hex::decode_to_slice(chars.as_str(), &mut digest).map_err(|_| AddressError::InvalidHex)?;
        Ok(Self { network, digest })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.plain())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain())
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.plain()
    }
}

/// Errors parsing a rendered address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid address length {0}, expected 41 characters")]
    InvalidLength(usize),

    #[error("Unknown address network prefix {0:?}")]
    UnknownPrefix(char),

    #[error("Invalid address hex digest")]
    InvalidHex,
}

/// Asset (mosaic) identifier derived from issuer + nonce. High bit always clear.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Derive the id an issuer obtains for a given nonce.
    pub fn from_nonce(nonce: AssetNonce, owner: &PublicKey) -> Self {
        let hash = Hash::from_parts(&[&nonce.0.to_le_bytes(), owner.as_bytes()]);
        AssetId(hash.as_u64() & !(1u64 << 63))
    }

    /// Parse a 16-digit hex rendering.
    pub fn from_hex(input: &str) -> Option<Self> {
        if input.len() != 16 {
            return None;
        }
        u64::from_str_radix(input, 16).ok().map(AssetId)
    }

    /// 16-digit uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.to_hex())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Nonce an issuer picks to derive a fresh asset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetNonce(pub u32);

impl AssetNonce {
    /// Draw a random nonce.
    pub fn random() -> Self {
        AssetNonce(rand::random())
    }
}

/// Namespace identifier derived from the full dotted path. High bit always set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(pub u64);

impl NamespaceId {
    /// Derive the id of `name` registered under `parent` (or as a root).
    pub fn derive(parent: Option<NamespaceId>, name: &str) -> Self {
        let parent_bytes = parent.map(|p| p.0).unwrap_or(0).to_le_bytes();
        let hash = Hash::from_parts(&[&parent_bytes, name.as_bytes()]);
        NamespaceId(hash.as_u64() | (1u64 << 63))
    }
}

impl fmt::Debug for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceId({:016X})", self.0)
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Genesis block height.
    pub const GENESIS: Self = BlockHeight(1);

    /// Get the next block height.
    pub fn next(self) -> Self {
        BlockHeight(self.0 + 1)
    }

    /// Height reached after `duration` blocks.
    pub fn after(self, duration: BlockDuration) -> Self {
        BlockHeight(self.0.saturating_add(duration.0))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// A span measured in blocks (rental and lock durations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockDuration(pub u64);

impl fmt::Display for BlockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks", self.0)
    }
}

/// Transaction deadline, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deadline(pub u64);

impl Deadline {
    /// Default validity window of a freshly created transaction.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(2 * 60 * 60);

    /// Deadline `window` from now (wall clock).
    pub fn after(window: Duration) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Deadline((now + window).as_millis() as u64)
    }

    /// Deadline using [`Deadline::DEFAULT_WINDOW`].
    pub fn create() -> Self {
        Self::after(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_network_type_parse_roundtrip() {
        for network in [
            NetworkType::MainNet,
            NetworkType::TestNet,
            NetworkType::Mijin,
            NetworkType::MijinTest,
        ] {
            assert_eq!(network.as_str().parse::<NetworkType>().unwrap(), network);
        }
        assert!("LOCAL".parse::<NetworkType>().is_err());
    }

    #[test]
    fn test_address_render_and_parse() {
        let key = KeyPair::from_seed(&[7u8; 32]);
        let address = Address::from_public_key(&key.public_key(), NetworkType::MijinTest);

        let rendered = address.plain();
        assert_eq!(rendered.len(), Address::RENDERED_LEN);
        assert!(rendered.starts_with('S'));
        assert_eq!(Address::parse(&rendered).unwrap(), address);
        assert_eq!(
            Address::parse(&rendered.to_lowercase()).unwrap(),
            address,
            "prefix and digest are case-insensitive"
        );
    }

    #[test]
    fn test_address_depends_on_network() {
        let key = KeyPair::from_seed(&[7u8; 32]);
        let test = Address::from_public_key(&key.public_key(), NetworkType::MijinTest);
        let main = Address::from_public_key(&key.public_key(), NetworkType::MainNet);
        assert_ne!(test.digest(), main.digest());
    }

    #[test]
    fn test_asset_id_high_bit_clear_and_namespace_high_bit_set() {
        let key = KeyPair::from_seed(&[1u8; 32]);
        for nonce in 0..32u32 {
            let id = AssetId::from_nonce(AssetNonce(nonce), &key.public_key());
            assert_eq!(id.0 >> 63, 0);
        }
        let root = NamespaceId::derive(None, "acme");
        let child = NamespaceId::derive(Some(root), "names");
        assert_eq!(root.0 >> 63, 1);
        assert_eq!(child.0 >> 63, 1);
        assert_ne!(root, child);
    }

    #[test]
    fn test_asset_id_hex() {
        let id = AssetId(0x0123_4567_89AB_CDEF);
        assert_eq!(id.to_hex(), "0123456789ABCDEF");
        assert_eq!(AssetId::from_hex("0123456789abcdef"), Some(id));
        assert_eq!(AssetId::from_hex("123"), None);
    }
}
