//! Domain operations that make up transactions and aggregate bundles.

use crate::{
    Address, AssetAmount, AssetDefinition, AssetId, AssetNonce, BlockDuration, Hash,
    NamespacePath, Recipient,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Register a namespace. Roots carry a rental duration; sub-namespaces
    /// inherit the lifetime of their root and reference their parent through
    /// the path.
    RegisterNamespace {
        path: NamespacePath,
        duration: Option<BlockDuration>,
    },

    /// Define a new asset type owned by the operation signer.
    DefineAsset {
        nonce: AssetNonce,
        asset_id: AssetId,
        definition: AssetDefinition,
    },

    /// Change an asset's circulating supply.
    ChangeSupply {
        asset_id: AssetId,
        direction: SupplyDirection,
        delta: crate::Amount,
    },

    /// Point a namespace at an asset id.
    LinkAssetAlias { path: NamespacePath, asset_id: AssetId },

    /// Point a namespace at an address.
    LinkAddressAlias { path: NamespacePath, address: Address },

    /// Move assets (possibly none) with an optional note.
    Transfer {
        recipient: Recipient,
        assets: Vec<AssetAmount>,
        message: Message,
    },

    /// Lock collateral that authorises announcing the bonded aggregate whose
    /// hash is `lock_hash`.
    HashLock {
        collateral: AssetAmount,
        duration: BlockDuration,
        lock_hash: Hash,
    },
}

impl Operation {
    /// Discriminant, for ordering assertions and logs.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::RegisterNamespace { .. } => OperationKind::RegisterNamespace,
            Operation::DefineAsset { .. } => OperationKind::DefineAsset,
            Operation::ChangeSupply { .. } => OperationKind::ChangeSupply,
            Operation::LinkAssetAlias { .. } => OperationKind::LinkAssetAlias,
            Operation::LinkAddressAlias { .. } => OperationKind::LinkAddressAlias,
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::HashLock { .. } => OperationKind::HashLock,
        }
    }
}

/// Operation discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    RegisterNamespace,
    DefineAsset,
    ChangeSupply,
    LinkAssetAlias,
    LinkAddressAlias,
    Transfer,
    HashLock,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::RegisterNamespace => "register_namespace",
            OperationKind::DefineAsset => "define_asset",
            OperationKind::ChangeSupply => "change_supply",
            OperationKind::LinkAssetAlias => "link_asset_alias",
            OperationKind::LinkAddressAlias => "link_address_alias",
            OperationKind::Transfer => "transfer",
            OperationKind::HashLock => "hash_lock",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyDirection {
    Increase,
    Decrease,
}

/// Note attached to a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Message {
    #[default]
    Empty,
    Plain(String),
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        Message::Plain(text.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Message::Empty => "",
            Message::Plain(text) => text,
        }
    }
}
