//! Ledger state and transaction application.
//!
//! State lives in persistent `im` maps so a transaction can be applied to a
//! cheap clone and only committed when every operation succeeded.

use bizledger_core::{AccountInfo, AliasTarget, AssetBalance, NamespaceInfo};
use bizledger_types::{
    Address, Amount, AssetAmount, AssetDefinition, AssetId, AssetRef, BlockDuration, BlockHeight,
    BundleKind, Hash, NamespacePath, Operation, PublicAccount, PublicKey, Recipient,
    SignedTransaction, SupplyDirection, TransactionBody,
};
use im::{HashMap, HashSet, OrdMap};
use serde::{Deserialize, Serialize};

/// Why the ledger refused to apply a transaction.
///
/// The display strings are the status codes reported on
/// [`LedgerEvent::StatusError`](bizledger_core::LedgerEvent::StatusError).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Failure_Core_Insufficient_Balance")]
    InsufficientBalance,
    #[error("Failure_Aggregate_Missing_Cosignatures")]
    MissingCosignatures,
    #[error("Failure_Namespace_Already_Exists")]
    NamespaceExists,
    #[error("Failure_Namespace_Parent_Unknown")]
    ParentUnknown,
    #[error("Failure_Namespace_Owner_Conflict")]
    NamespaceOwnerConflict,
    #[error("Failure_Namespace_Invalid_Duration")]
    InvalidDuration,
    #[error("Failure_Namespace_Unknown")]
    NamespaceUnknown,
    #[error("Failure_Namespace_Alias_Already_Linked")]
    AliasAlreadyLinked,
    #[error("Failure_Namespace_Alias_Unresolved")]
    AliasUnresolved,
    #[error("Failure_Mosaic_Invalid_Id")]
    InvalidAssetId,
    #[error("Failure_Mosaic_Invalid_Divisibility")]
    InvalidDivisibility,
    #[error("Failure_Mosaic_Already_Exists")]
    AssetExists,
    #[error("Failure_Mosaic_Unknown")]
    AssetUnknown,
    #[error("Failure_Mosaic_Owner_Conflict")]
    AssetOwnerConflict,
    #[error("Failure_Mosaic_Supply_Immutable")]
    SupplyImmutable,
    #[error("Failure_Mosaic_Supply_Overflow")]
    SupplyOverflow,
    #[error("Failure_Mosaic_Non_Transferable")]
    NonTransferable,
    #[error("Failure_LockHash_Invalid_Mosaic_Id")]
    InvalidCollateral,
    #[error("Failure_LockHash_Hash_Already_Exists")]
    LockExists,
}

/// A defined asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub owner: Address,
    pub definition: AssetDefinition,
    pub supply: Amount,
    pub height: BlockHeight,
}

/// Collateral locked for a bonded aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashLockRecord {
    pub owner: Address,
    pub amount: Amount,
    pub expires_at: BlockHeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AccountRecord {
    public_key: Option<PublicKey>,
    height: BlockHeight,
}

/// Complete ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    pub height: BlockHeight,
    pub currency: AssetId,
    namespaces: OrdMap<NamespacePath, NamespaceInfo>,
    assets: HashMap<AssetId, AssetRecord>,
    balances: HashMap<Address, OrdMap<AssetId, Amount>>,
    accounts: HashMap<Address, AccountRecord>,
    locks: HashMap<Hash, HashLockRecord>,
    confirmed: HashSet<Hash>,
}

impl LedgerState {
    /// Genesis: the currency asset, owned by nemesis and aliased to
    /// `currency_path`, with the whole supply on the nemesis account.
    pub fn genesis(
        nemesis: &PublicAccount,
        currency_path: &NamespacePath,
        currency_divisibility: u8,
        nemesis_balance: Amount,
    ) -> Self {
        let currency = AssetId::from_nonce(bizledger_types::AssetNonce(0), &nemesis.public_key);
        let mut state = Self {
            height: BlockHeight::GENESIS,
            currency,
            namespaces: OrdMap::new(),
            assets: HashMap::new(),
            balances: HashMap::new(),
            accounts: HashMap::new(),
            locks: HashMap::new(),
            confirmed: HashSet::new(),
        };

        for prefix in currency_path.prefixes() {
            let alias = (prefix == *currency_path).then_some(AliasTarget::Asset(currency));
            state.namespaces.insert(
                prefix.clone(),
                NamespaceInfo {
                    id: prefix.id(),
                    path: prefix,
                    owner: nemesis.address,
                    alias,
                    expires_at: BlockHeight(u64::MAX),
                },
            );
        }
        state.assets.insert(
            currency,
            AssetRecord {
                owner: nemesis.address,
                definition: AssetDefinition::new(currency_divisibility, true, true)
                    .with_duration(BlockDuration(0)),
                supply: nemesis_balance,
                height: BlockHeight::GENESIS,
            },
        );
        state.touch(nemesis.address, Some(nemesis.public_key));
        state.credit(nemesis.address, currency, nemesis_balance);
        state
    }

    pub fn namespace(&self, path: &NamespacePath) -> Option<&NamespaceInfo> {
        self.namespaces.get(path)
    }

    pub fn asset(&self, asset_id: AssetId) -> Option<&AssetRecord> {
        self.assets.get(&asset_id)
    }

    pub fn lock(&self, lock_hash: &Hash) -> Option<&HashLockRecord> {
        self.locks.get(lock_hash)
    }

    pub fn is_confirmed(&self, hash: &Hash) -> bool {
        self.confirmed.contains(hash)
    }

    pub fn balance(&self, address: &Address, asset_id: AssetId) -> Amount {
        self.balances
            .get(address)
            .and_then(|b| b.get(&asset_id))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn account_info(&self, address: &Address) -> Option<AccountInfo> {
        let record = self.accounts.get(address)?;
        let balances = self
            .balances
            .get(address)
            .map(|b| {
                b.iter()
                    .filter(|(_, amount)| amount.get() > 0)
                    .map(|(asset_id, amount)| AssetBalance {
                        asset_id: *asset_id,
                        amount: *amount,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(AccountInfo {
            address: *address,
            public_key: record.public_key,
            height: record.height,
            balances,
        })
    }

    /// Add funds outside of any transaction (test faucets).
    pub fn credit(&mut self, address: Address, asset_id: AssetId, amount: Amount) {
        self.touch(address, None);
        let mut balances = self.balances.get(&address).cloned().unwrap_or_default();
        let current = balances.get(&asset_id).copied().unwrap_or(Amount::ZERO);
        balances.insert(asset_id, Amount(current.get().saturating_add(amount.get())));
        self.balances.insert(address, balances);
    }

    fn debit(&mut self, address: Address, asset_id: AssetId, amount: Amount) -> Result<(), Rejection> {
        let mut balances = self.balances.get(&address).cloned().unwrap_or_default();
        let current = balances.get(&asset_id).copied().unwrap_or(Amount::ZERO);
        let remaining = current
            .get()
            .checked_sub(amount.get())
            .ok_or(Rejection::InsufficientBalance)?;
        balances.insert(asset_id, Amount(remaining));
        self.balances.insert(address, balances);
        Ok(())
    }

    fn touch(&mut self, address: Address, public_key: Option<PublicKey>) {
        let height = self.height;
        let record = self.accounts.entry(address).or_insert(AccountRecord {
            public_key: None,
            height,
        });
        if record.public_key.is_none() {
            record.public_key = public_key;
        }
    }

    pub fn resolve_asset(&self, asset: &AssetRef) -> Result<AssetId, Rejection> {
        let asset_id = match asset {
            AssetRef::Id(id) => *id,
            AssetRef::Alias(path) => match self.namespaces.get(path) {
                Some(NamespaceInfo {
                    alias: Some(AliasTarget::Asset(id)),
                    ..
                }) => *id,
                Some(_) => return Err(Rejection::AliasUnresolved),
                None => return Err(Rejection::NamespaceUnknown),
            },
        };
        if self.assets.contains_key(&asset_id) {
            Ok(asset_id)
        } else {
            Err(Rejection::AssetUnknown)
        }
    }

    pub fn resolve_recipient(&self, recipient: &Recipient) -> Result<Address, Rejection> {
        match recipient {
            Recipient::Address(address) => Ok(*address),
            Recipient::Alias(path) => match self.namespaces.get(path) {
                Some(NamespaceInfo {
                    alias: Some(AliasTarget::Address(address)),
                    ..
                }) => Ok(*address),
                Some(_) => Err(Rejection::AliasUnresolved),
                None => Err(Rejection::NamespaceUnknown),
            },
        }
    }

    /// Apply a transaction to this state.
    ///
    /// On error the state may be partially modified; callers apply to a clone
    /// and discard it. Returns every address the transaction touched.
    pub fn apply(&mut self, transaction: &SignedTransaction) -> Result<Vec<Address>, Rejection> {
        let tx = &transaction.transaction;
        let mut touched = vec![tx.signer.address];
        self.touch(tx.signer.address, Some(tx.signer.public_key));

        match &tx.body {
            TransactionBody::Single(operation) => {
                self.apply_operation(&tx.signer, operation, &mut touched)?;
            }
            TransactionBody::Aggregate(bundle) => {
                if !transaction.is_fully_signed() {
                    return Err(Rejection::MissingCosignatures);
                }
                for inner in &bundle.operations {
                    self.touch(inner.signer.address, Some(inner.signer.public_key));
                    push_unique(&mut touched, inner.signer.address);
                    self.apply_operation(&inner.signer, &inner.operation, &mut touched)?;
                }
                if bundle.kind == BundleKind::Bonded {
                    if let Some(lock) = self.locks.remove(&transaction.hash) {
                        self.credit(lock.owner, self.currency, lock.amount);
                    }
                }
            }
        }

        self.confirmed.insert(transaction.hash);
        Ok(touched)
    }

    fn apply_operation(
        &mut self,
        signer: &PublicAccount,
        operation: &Operation,
        touched: &mut Vec<Address>,
    ) -> Result<(), Rejection> {
        let owner = signer.address;
        match operation {
            Operation::RegisterNamespace { path, duration } => {
                self.register_namespace(owner, path, *duration)
            }

            Operation::DefineAsset {
                nonce,
                asset_id,
                definition,
            } => {
                if AssetId::from_nonce(*nonce, &signer.public_key) != *asset_id {
                    return Err(Rejection::InvalidAssetId);
                }
                if definition.validate().is_err() {
                    return Err(Rejection::InvalidDivisibility);
                }
                if self.assets.contains_key(asset_id) {
                    return Err(Rejection::AssetExists);
                }
                self.assets.insert(
                    *asset_id,
                    AssetRecord {
                        owner,
                        definition: *definition,
                        supply: Amount::ZERO,
                        height: self.height,
                    },
                );
                Ok(())
            }

            Operation::ChangeSupply {
                asset_id,
                direction,
                delta,
            } => {
                let mut record = self
                    .assets
                    .get(asset_id)
                    .cloned()
                    .ok_or(Rejection::AssetUnknown)?;
                if record.owner != owner {
                    return Err(Rejection::AssetOwnerConflict);
                }
                // Immutable supply may only change while the owner holds all of it.
                if !record.definition.supply_mutable
                    && self.balance(&owner, *asset_id) != record.supply
                {
                    return Err(Rejection::SupplyImmutable);
                }
                match direction {
                    SupplyDirection::Increase => {
                        record.supply = record
                            .supply
                            .get()
                            .checked_add(delta.get())
                            .map(Amount)
                            .ok_or(Rejection::SupplyOverflow)?;
                        self.credit(owner, *asset_id, *delta);
                    }
                    SupplyDirection::Decrease => {
                        self.debit(owner, *asset_id, *delta)?;
                        record.supply = Amount(record.supply.get() - delta.get());
                    }
                }
                self.assets.insert(*asset_id, record);
                Ok(())
            }

            Operation::LinkAssetAlias { path, asset_id } => {
                let record = self.assets.get(asset_id).ok_or(Rejection::AssetUnknown)?;
                if record.owner != owner {
                    return Err(Rejection::AssetOwnerConflict);
                }
                self.link_alias(owner, path, AliasTarget::Asset(*asset_id))
            }

            Operation::LinkAddressAlias { path, address } => {
                self.link_alias(owner, path, AliasTarget::Address(*address))
            }

            Operation::Transfer {
                recipient, assets, ..
            } => {
                let to = self.resolve_recipient(recipient)?;
                self.touch(to, None);
                push_unique(touched, to);
                for AssetAmount { asset, amount } in assets {
                    let asset_id = self.resolve_asset(asset)?;
                    let record = self.assets.get(&asset_id).ok_or(Rejection::AssetUnknown)?;
                    if !record.definition.transferable && owner != record.owner && to != record.owner
                    {
                        return Err(Rejection::NonTransferable);
                    }
                    self.debit(owner, asset_id, *amount)?;
                    self.credit(to, asset_id, *amount);
                }
                Ok(())
            }

            Operation::HashLock {
                collateral,
                duration,
                lock_hash,
            } => {
                if self.resolve_asset(&collateral.asset)? != self.currency {
                    return Err(Rejection::InvalidCollateral);
                }
                if self.locks.contains_key(lock_hash) {
                    return Err(Rejection::LockExists);
                }
                self.debit(owner, self.currency, collateral.amount)?;
                self.locks.insert(
                    *lock_hash,
                    HashLockRecord {
                        owner,
                        amount: collateral.amount,
                        expires_at: self.height.after(*duration),
                    },
                );
                Ok(())
            }
        }
    }

    fn register_namespace(
        &mut self,
        owner: Address,
        path: &NamespacePath,
        duration: Option<BlockDuration>,
    ) -> Result<(), Rejection> {
        match path.parent() {
            None => {
                let duration = duration
                    .filter(|d| d.0 > 0)
                    .ok_or(Rejection::InvalidDuration)?;
                let expires_at = match self.namespaces.get(path) {
                    Some(existing) if existing.owner != owner => {
                        return Err(Rejection::NamespaceOwnerConflict)
                    }
                    // Renewal extends the current rental.
                    Some(existing) => existing.expires_at.after(duration),
                    None => self.height.after(duration),
                };
                let alias = self.namespaces.get(path).and_then(|n| n.alias);
                self.namespaces.insert(
                    path.clone(),
                    NamespaceInfo {
                        path: path.clone(),
                        id: path.id(),
                        owner,
                        alias,
                        expires_at,
                    },
                );
                Ok(())
            }
            Some(parent) => {
                let parent = self
                    .namespaces
                    .get(&parent)
                    .ok_or(Rejection::ParentUnknown)?;
                if parent.owner != owner {
                    return Err(Rejection::NamespaceOwnerConflict);
                }
                if self.namespaces.contains_key(path) {
                    return Err(Rejection::NamespaceExists);
                }
                let expires_at = parent.expires_at;
                self.namespaces.insert(
                    path.clone(),
                    NamespaceInfo {
                        path: path.clone(),
                        id: path.id(),
                        owner,
                        alias: None,
                        expires_at,
                    },
                );
                Ok(())
            }
        }
    }

    fn link_alias(
        &mut self,
        owner: Address,
        path: &NamespacePath,
        target: AliasTarget,
    ) -> Result<(), Rejection> {
        let mut info = self
            .namespaces
            .get(path)
            .cloned()
            .ok_or(Rejection::NamespaceUnknown)?;
        if info.owner != owner {
            return Err(Rejection::NamespaceOwnerConflict);
        }
        if info.alias.is_some() {
            return Err(Rejection::AliasAlreadyLinked);
        }
        info.alias = Some(target);
        self.namespaces.insert(path.clone(), info);
        Ok(())
    }

    /// Drop locks whose duration elapsed. Their collateral is forfeited.
    pub fn expire_locks(&mut self) -> Vec<Hash> {
        let height = self.height;
        let expired: Vec<Hash> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.expires_at < height)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &expired {
            self.locks.remove(hash);
        }
        expired
    }
}

fn push_unique(addresses: &mut Vec<Address>, address: Address) {
    if !addresses.contains(&address) {
        addresses.push(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizledger_types::{
        AggregateBundle, AssetNonce, Deadline, KeyPair, Message, NetworkType, Transaction,
    };

    const NETWORK: NetworkType = NetworkType::MijinTest;

    fn account(seed: u8) -> (KeyPair, PublicAccount) {
        let kp = KeyPair::from_seed(&[seed; 32]);
        let account = kp.public_account(NETWORK);
        (kp, account)
    }

    fn genesis(nemesis: &PublicAccount) -> LedgerState {
        LedgerState::genesis(
            nemesis,
            &NamespacePath::parse("cat.currency").unwrap(),
            6,
            Amount(1_000_000),
        )
    }

    fn single(kp: &KeyPair, signer: PublicAccount, operation: Operation) -> SignedTransaction {
        Transaction::single(NETWORK, Deadline(1), signer, operation)
            .sign(kp)
            .unwrap()
    }

    fn currency_transfer(to: Address, amount: u64) -> Operation {
        Operation::Transfer {
            recipient: Recipient::Address(to),
            assets: vec![AssetAmount::new(
                AssetRef::parse("cat.currency").unwrap(),
                Amount(amount),
            )],
            message: Message::Empty,
        }
    }

    #[test]
    fn test_genesis_currency_alias() {
        let (_, nemesis) = account(1);
        let state = genesis(&nemesis);
        let currency = state
            .resolve_asset(&AssetRef::parse("cat.currency").unwrap())
            .unwrap();
        assert_eq!(currency, state.currency);
        assert_eq!(state.balance(&nemesis.address, currency), Amount(1_000_000));
    }

    #[test]
    fn test_transfer_moves_balance_and_checks_funds() {
        let (kp, nemesis) = account(1);
        let (_, bob) = account(2);
        let mut state = genesis(&nemesis);

        let touched = state
            .apply(&single(&kp, nemesis, currency_transfer(bob.address, 400)))
            .unwrap();
        assert_eq!(touched, vec![nemesis.address, bob.address]);
        assert_eq!(state.balance(&bob.address, state.currency), Amount(400));

        let mut copy = state.clone();
        assert_eq!(
            copy.apply(&single(&kp, nemesis, currency_transfer(bob.address, 10_000_000))),
            Err(Rejection::InsufficientBalance)
        );
    }

    #[test]
    fn test_sub_namespace_requires_parent_owner() {
        let (kp, alice) = account(2);
        let (kp_bob, bob) = account(3);
        let (_, nemesis) = account(1);
        let mut state = genesis(&nemesis);

        let register = |path: &str, duration: Option<BlockDuration>| Operation::RegisterNamespace {
            path: NamespacePath::parse(path).unwrap(),
            duration,
        };

        assert_eq!(
            state.apply(&single(&kp, alice, register("acme.names", None))),
            Err(Rejection::ParentUnknown)
        );
        state
            .apply(&single(&kp, alice, register("acme", Some(BlockDuration(10)))))
            .unwrap();
        assert_eq!(
            state.apply(&single(&kp_bob, bob, register("acme.names", None))),
            Err(Rejection::NamespaceOwnerConflict)
        );
        state
            .apply(&single(&kp, alice, register("acme.names", None)))
            .unwrap();
        assert_eq!(
            state.namespace(&NamespacePath::parse("acme.names").unwrap()).unwrap().expires_at,
            BlockHeight(11)
        );
    }

    #[test]
    fn test_complete_aggregate_requires_all_cosigners() {
        let (nemesis_kp, nemesis) = account(1);
        let (owner_kp, owner) = account(2);
        let mut state = genesis(&nemesis);

        let mut bundle = AggregateBundle::new(BundleKind::Complete, nemesis);
        bundle.push(nemesis, currency_transfer(owner.address, 10));
        bundle.push(
            owner,
            Operation::RegisterNamespace {
                path: NamespacePath::parse("acme").unwrap(),
                duration: Some(BlockDuration(100)),
            },
        );
        let tx = Transaction::aggregate(NETWORK, Deadline(1), bundle);

        let unsigned = tx.clone().sign(&nemesis_kp).unwrap();
        assert_eq!(
            state.clone().apply(&unsigned),
            Err(Rejection::MissingCosignatures)
        );

        let signed = tx.sign_with_cosigners(&nemesis_kp, &[&owner_kp]).unwrap();
        state.apply(&signed).unwrap();
        assert!(state.is_confirmed(&signed.hash));
        assert_eq!(
            state.namespace(&NamespacePath::parse("acme").unwrap()).unwrap().owner,
            owner.address
        );
    }

    #[test]
    fn test_badge_cannot_be_passed_on() {
        let (kp, owner) = account(2);
        let (alice_kp, alice) = account(3);
        let (_, bob) = account(4);
        let (_, nemesis) = account(1);
        let mut state = genesis(&nemesis);
        let nonce = AssetNonce(9);
        let asset_id = AssetId::from_nonce(nonce, &owner.public_key);

        for operation in [
            Operation::DefineAsset {
                nonce,
                asset_id,
                definition: AssetDefinition::badge(),
            },
            Operation::ChangeSupply {
                asset_id,
                direction: SupplyDirection::Increase,
                delta: Amount(1),
            },
        ] {
            state.apply(&single(&kp, owner, operation)).unwrap();
        }

        let badge = |to: Address| Operation::Transfer {
            recipient: Recipient::Address(to),
            assets: vec![AssetAmount::new(AssetRef::Id(asset_id), Amount(1))],
            message: Message::Empty,
        };
        state.apply(&single(&kp, owner, badge(alice.address))).unwrap();
        assert_eq!(
            state.clone().apply(&single(&alice_kp, alice, badge(bob.address))),
            Err(Rejection::NonTransferable)
        );
        assert_eq!(
            state.apply(&single(
                &kp,
                owner,
                Operation::ChangeSupply {
                    asset_id,
                    direction: SupplyDirection::Increase,
                    delta: Amount(1),
                }
            )),
            Err(Rejection::SupplyImmutable)
        );
    }

    #[test]
    fn test_hash_lock_takes_collateral_and_bonded_releases_it() {
        let (kp, nemesis) = account(1);
        let mut state = genesis(&nemesis);
        let lock_hash = Hash::from_bytes(b"aggregate");

        state
            .apply(&single(
                &kp,
                nemesis,
                Operation::HashLock {
                    collateral: AssetAmount::new(AssetRef::parse("cat.currency").unwrap(), Amount(100)),
                    duration: BlockDuration(5),
                    lock_hash,
                },
            ))
            .unwrap();
        assert_eq!(state.balance(&nemesis.address, state.currency), Amount(999_900));
        assert_eq!(state.lock(&lock_hash).unwrap().amount, Amount(100));

        state.height = BlockHeight(7);
        assert_eq!(state.expire_locks(), vec![lock_hash]);
        assert!(state.lock(&lock_hash).is_none());
    }
}
