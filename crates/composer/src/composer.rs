//! Bundle composition for provisioning and escrow.

use crate::ComposerConfig;
use bizledger_planner::{NamespacePlanner, PlannerError, PlanningSession};
use bizledger_types::{
    AggregateBundle, Amount, AssetAmount, AssetDefinition, AssetError, AssetId, AssetNonce,
    AssetRef, BlockDuration, BundleKind, Identity, Message, NamespaceError, NamespacePath,
    Operation, PublicAccount, Recipient, SignedTransaction, SupplyDirection, Transaction,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix of the note a requester sends along with a pull request.
pub const PULL_REQUEST_PREFIX: &str = "pullRequest:";

/// Composition failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComposerError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Scope funding of {units} units overflows at divisibility {divisibility}")]
    FundingOverflow { units: u64, divisibility: u8 },

    #[error("A pull request needs two different identities, got {0} twice")]
    SelfRequest(String),
}

/// Everything needed to create a new asset.
#[derive(Debug, Clone)]
pub struct AssetCreation {
    /// Namespace the asset is aliased to, e.g. `acme.widgets`.
    pub name: String,
    pub definition: AssetDefinition,
    pub initial_supply: Amount,
    /// Receives the whole initial supply when set.
    pub recipient: Option<Recipient>,
    pub nonce: AssetNonce,
}

/// Body of the note attached to a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestNote {
    pub asset: String,
    pub amount: u64,
}

impl PullRequestNote {
    /// `pullRequest:{"asset":..,"amount":..}`
    pub fn to_message(&self) -> Message {
        let body = serde_json::to_string(self).expect("note serialization should never fail");
        Message::plain(format!("{}{}", PULL_REQUEST_PREFIX, body))
    }

    /// Parse a note previously produced by [`PullRequestNote::to_message`].
    pub fn from_message(message: &Message) -> Option<Self> {
        let body = message.as_str().strip_prefix(PULL_REQUEST_PREFIX)?;
        serde_json::from_str(body).ok()
    }
}

/// Builds aggregate bundles from provisioning intents.
pub struct TransactionComposer {
    planner: NamespacePlanner,
    config: ComposerConfig,
}

impl TransactionComposer {
    pub fn new(planner: NamespacePlanner, config: ComposerConfig) -> Self {
        Self { planner, config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn planner(&self) -> &NamespacePlanner {
        &self.planner
    }

    /// Register every missing segment of `path`, issued by `owner`.
    pub async fn compose_namespace_registration(
        &self,
        session: &mut PlanningSession,
        owner: &PublicAccount,
        path: &str,
    ) -> Result<AggregateBundle, ComposerError> {
        let mut bundle = AggregateBundle::new(BundleKind::Complete, *owner);
        self.push_registrations(&mut bundle, session, owner, &NamespacePath::parse(path)?)
            .await?;
        Ok(bundle)
    }

    /// Namespaces, definition, supply, alias and optional transfer of a new asset.
    pub async fn compose_asset_creation(
        &self,
        session: &mut PlanningSession,
        owner: &PublicAccount,
        creation: AssetCreation,
    ) -> Result<AggregateBundle, ComposerError> {
        creation.definition.validate()?;
        let path = NamespacePath::parse(&creation.name)?;
        let asset_id = AssetId::from_nonce(creation.nonce, &owner.public_key);

        let mut bundle = AggregateBundle::new(BundleKind::Complete, *owner);
        self.push_registrations(&mut bundle, session, owner, &path)
            .await?;
        bundle.push(
            *owner,
            Operation::DefineAsset {
                nonce: creation.nonce,
                asset_id,
                definition: creation.definition,
            },
        );
        bundle.push(
            *owner,
            Operation::ChangeSupply {
                asset_id,
                direction: SupplyDirection::Increase,
                delta: creation.initial_supply,
            },
        );
        bundle.push(
            *owner,
            Operation::LinkAssetAlias {
                path: path.clone(),
                asset_id,
            },
        );
        if let Some(recipient) = creation.recipient {
            bundle.push(
                *owner,
                Operation::Transfer {
                    recipient,
                    assets: vec![AssetAmount::new(AssetRef::Id(asset_id), creation.initial_supply)],
                    message: Message::Empty,
                },
            );
        }

        debug!(
            asset = %path,
            asset_id = %asset_id,
            operations = bundle.len(),
            "Composed asset creation"
        );
        Ok(bundle)
    }

    /// Bundle that makes `identity` known on the ledger.
    ///
    /// A local-only identity without funding needs no bundle at all and gets
    /// an empty one.
    pub async fn compose_identity_provisioning(
        &self,
        session: &mut PlanningSession,
        owner: &PublicAccount,
        identity: &Identity,
        funding: Option<AssetAmount>,
        local_only: bool,
        nonce: AssetNonce,
    ) -> Result<AggregateBundle, ComposerError> {
        let mut bundle = AggregateBundle::new(BundleKind::Complete, *owner);
        let address = identity.address();

        if local_only {
            if let Some(funding) = funding {
                bundle.push(*owner, funding_transfer(address.into(), funding));
            }
            debug!(
                identity = %identity.slug(),
                operations = bundle.len(),
                "Composed local identity provisioning"
            );
            return Ok(bundle);
        }

        let address_alias = identity.address_alias()?;
        let asset_alias = identity.asset_alias()?;
        let asset_id = AssetId::from_nonce(nonce, &owner.public_key);

        self.push_registrations(&mut bundle, session, owner, &address_alias)
            .await?;
        self.push_registrations(&mut bundle, session, owner, &asset_alias)
            .await?;
        bundle.push(
            *owner,
            Operation::DefineAsset {
                nonce,
                asset_id,
                definition: AssetDefinition::badge(),
            },
        );
        bundle.push(
            *owner,
            Operation::ChangeSupply {
                asset_id,
                direction: SupplyDirection::Increase,
                delta: Amount(1),
            },
        );
        bundle.push(
            *owner,
            Operation::LinkAssetAlias {
                path: asset_alias,
                asset_id,
            },
        );
        bundle.push(
            *owner,
            Operation::LinkAddressAlias {
                path: address_alias,
                address,
            },
        );
        bundle.push(
            *owner,
            Operation::Transfer {
                recipient: address.into(),
                assets: vec![AssetAmount::new(AssetRef::Id(asset_id), Amount(1))],
                message: Message::Empty,
            },
        );
        if let Some(funding) = funding {
            bundle.push(*owner, funding_transfer(address.into(), funding));
        }

        debug!(
            identity = %identity.slug(),
            badge = %asset_id,
            operations = bundle.len(),
            "Composed identity provisioning"
        );
        Ok(bundle)
    }

    /// Fund a scope owner from nemesis and register the scope's namespaces.
    ///
    /// Issued by nemesis. The namespaces belong to the scope owner, who is
    /// therefore a required cosigner.
    pub async fn compose_scope_provisioning(
        &self,
        session: &mut PlanningSession,
        nemesis: &PublicAccount,
        scope_owner: &Identity,
    ) -> Result<AggregateBundle, ComposerError> {
        let funding = self
            .config
            .scope_funding()
            .ok_or(ComposerError::FundingOverflow {
                units: self.config.scope_funding_units,
                divisibility: self.config.currency_divisibility,
            })?;
        let owner = scope_owner.public_account();
        let identities = NamespacePath::from_segments([
            scope_owner.scope.as_str(),
            bizledger_types::IDENTITIES_SEGMENT,
        ])?;
        let names =
            NamespacePath::from_segments([scope_owner.scope.as_str(), bizledger_types::NAMES_SEGMENT])?;

        let mut bundle = AggregateBundle::new(BundleKind::Complete, *nemesis);
        bundle.push(
            *nemesis,
            funding_transfer(
                owner.address.into(),
                AssetAmount::new(self.config.currency_ref(), funding),
            ),
        );
        self.push_registrations(&mut bundle, session, &owner, &identities)
            .await?;
        self.push_registrations(&mut bundle, session, &owner, &names)
            .await?;
        bundle.require_cosigner(owner);

        debug!(
            scope = %scope_owner.scope,
            owner = %owner.address,
            operations = bundle.len(),
            "Composed scope provisioning"
        );
        Ok(bundle)
    }

    /// Bonded bundle asking `recipient` to send `amount` of `asset` to `requester`.
    ///
    /// The first operation is a note from the requester describing the
    /// request. The second is the transfer itself, which only takes effect
    /// once the recipient cosigns.
    pub fn compose_pull_request(
        &self,
        requester: &PublicAccount,
        recipient: &PublicAccount,
        asset: &AssetRef,
        amount: Amount,
    ) -> Result<AggregateBundle, ComposerError> {
        if requester.public_key == recipient.public_key {
            return Err(ComposerError::SelfRequest(requester.address.plain()));
        }

        let note = PullRequestNote {
            asset: asset.to_string(),
            amount: amount.get(),
        };
        let mut bundle = AggregateBundle::new(BundleKind::Bonded, *requester);
        bundle.push(
            *requester,
            Operation::Transfer {
                recipient: recipient.address.into(),
                assets: Vec::new(),
                message: note.to_message(),
            },
        );
        bundle.push(
            *recipient,
            Operation::Transfer {
                recipient: requester.address.into(),
                assets: vec![AssetAmount::new(asset.clone(), amount)],
                message: Message::Empty,
            },
        );
        Ok(bundle)
    }

    /// Hash lock authorising `signed_aggregate`, signed by the aggregate's issuer.
    ///
    /// Inherits the aggregate's network and deadline.
    pub fn compose_hash_lock(
        &self,
        collateral: Amount,
        duration: BlockDuration,
        signed_aggregate: &SignedTransaction,
    ) -> Transaction {
        let aggregate = &signed_aggregate.transaction;
        Transaction::single(
            aggregate.network,
            aggregate.deadline,
            aggregate.signer,
            Operation::HashLock {
                collateral: AssetAmount::new(self.config.currency_ref(), collateral),
                duration,
                lock_hash: signed_aggregate.hash,
            },
        )
    }

    async fn push_registrations(
        &self,
        bundle: &mut AggregateBundle,
        session: &mut PlanningSession,
        owner: &PublicAccount,
        path: &NamespacePath,
    ) -> Result<(), ComposerError> {
        let registrations = self.planner.plan_path(session, path).await?;
        bundle.extend(*owner, registrations.into_iter().map(|r| r.operation));
        Ok(())
    }
}

fn funding_transfer(recipient: Recipient, funding: AssetAmount) -> Operation {
    Operation::Transfer {
        recipient,
        assets: vec![funding],
        message: Message::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizledger_planner::PlannerConfig;
    use bizledger_simulation::SimulatedLedger;
    use bizledger_test_helpers::{identity, nemesis, simulated_ledger};
    use bizledger_types::{Deadline, OperationKind};
    use std::sync::Arc;

    fn composer(ledger: &Arc<SimulatedLedger>) -> TransactionComposer {
        let planner = NamespacePlanner::new(ledger.clone(), PlannerConfig::default());
        TransactionComposer::new(planner, ComposerConfig::default())
    }

    fn widgets(recipient: Option<Recipient>) -> AssetCreation {
        AssetCreation {
            name: "acme.widgets".into(),
            definition: AssetDefinition::new(2, false, true),
            initial_supply: Amount(1000),
            recipient,
            nonce: AssetNonce(7),
        }
    }

    #[tokio::test]
    async fn test_asset_creation_has_five_operations_in_order() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();

        let bundle = composer
            .compose_asset_creation(&mut PlanningSession::new(), &owner, widgets(None))
            .await
            .unwrap();

        assert_eq!(
            bundle.kinds(),
            vec![
                OperationKind::RegisterNamespace,
                OperationKind::RegisterNamespace,
                OperationKind::DefineAsset,
                OperationKind::ChangeSupply,
                OperationKind::LinkAssetAlias,
            ]
        );
        assert_eq!(bundle.kind, BundleKind::Complete);
        assert!(bundle.cosigners.is_empty());
    }

    #[tokio::test]
    async fn test_asset_creation_with_recipient_ends_with_transfer() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        let bob = identity("acme", "bob", 2);

        let bundle = composer
            .compose_asset_creation(
                &mut PlanningSession::new(),
                &owner,
                widgets(Some(bob.address().into())),
            )
            .await
            .unwrap();

        assert_eq!(bundle.len(), 6);
        assert_eq!(bundle.kinds().last(), Some(&OperationKind::Transfer));
    }

    #[tokio::test]
    async fn test_invalid_divisibility_rejected_before_lookups() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        let mut session = PlanningSession::new();

        let mut creation = widgets(None);
        creation.definition.divisibility = 7;
        let result = composer
            .compose_asset_creation(&mut session, &owner, creation)
            .await;

        assert!(matches!(
            result,
            Err(ComposerError::Asset(AssetError::InvalidAssetDefinition {
                divisibility: 7
            }))
        ));
        assert!(session.is_empty());
        assert_eq!(ledger.namespace_lookups(), 0);
    }

    #[tokio::test]
    async fn test_every_valid_divisibility_accepted() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        for divisibility in 0..=6 {
            let mut creation = widgets(None);
            creation.definition.divisibility = divisibility;
            assert!(composer
                .compose_asset_creation(&mut PlanningSession::new(), &owner, creation)
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_on_chain_identity_order() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        let alice = identity("acme", "alice", 2);

        let bundle = composer
            .compose_identity_provisioning(
                &mut PlanningSession::new(),
                &owner,
                &alice,
                None,
                false,
                AssetNonce(1),
            )
            .await
            .unwrap();

        use OperationKind::*;
        assert_eq!(
            bundle.kinds(),
            vec![
                RegisterNamespace, // acme
                RegisterNamespace, // acme.identities
                RegisterNamespace, // acme.identities.alice
                RegisterNamespace, // acme.names
                RegisterNamespace, // acme.names.alice
                DefineAsset,
                ChangeSupply,
                LinkAssetAlias,
                LinkAddressAlias,
                Transfer,
            ]
        );
        match &bundle.operations[5].operation {
            Operation::DefineAsset { definition, .. } => {
                assert_eq!(*definition, AssetDefinition::badge())
            }
            other => panic!("expected asset definition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_identity_after_scope_in_same_session() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner_identity = identity("acme", "owner", 1);
        let owner = owner_identity.public_account();
        let alice = identity("acme", "alice", 2);
        let mut session = PlanningSession::new();

        let scope = composer
            .compose_scope_provisioning(&mut session, &nemesis().public_account(), &owner_identity)
            .await
            .unwrap();
        assert_eq!(scope.len(), 4);

        let funding = AssetAmount::parse("10 cat.currency").unwrap();
        let bundle = composer
            .compose_identity_provisioning(
                &mut session,
                &owner,
                &alice,
                Some(funding),
                false,
                AssetNonce(1),
            )
            .await
            .unwrap();

        assert_eq!(bundle.len(), 2 + 5 + 1);
        assert_eq!(bundle.kinds().last(), Some(&OperationKind::Transfer));
    }

    #[tokio::test]
    async fn test_local_identity_bundles() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        let alice = identity("acme", "alice", 2);

        let empty = composer
            .compose_identity_provisioning(
                &mut PlanningSession::new(),
                &owner,
                &alice,
                None,
                true,
                AssetNonce(1),
            )
            .await
            .unwrap();
        assert!(empty.is_empty());

        let funded = composer
            .compose_identity_provisioning(
                &mut PlanningSession::new(),
                &owner,
                &alice,
                Some(AssetAmount::parse("5 cat.currency").unwrap()),
                true,
                AssetNonce(1),
            )
            .await
            .unwrap();
        assert_eq!(funded.kinds(), vec![OperationKind::Transfer]);
        assert_eq!(funded.issuer, owner);
        assert!(funded.cosigners.is_empty());
        assert_eq!(ledger.namespace_lookups(), 0);
    }

    #[tokio::test]
    async fn test_scope_provisioning_needs_owner_cosignature() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let nemesis = nemesis().public_account();
        let owner = identity("acme", "owner", 1);

        let bundle = composer
            .compose_scope_provisioning(&mut PlanningSession::new(), &nemesis, &owner)
            .await
            .unwrap();

        assert_eq!(bundle.issuer, nemesis);
        assert_eq!(bundle.cosigners, vec![owner.public_account()]);
        match &bundle.operations[0].operation {
            Operation::Transfer { assets, .. } => {
                assert_eq!(assets[0].amount, Amount(50_000_000_000_000));
            }
            other => panic!("expected funding transfer, got {:?}", other),
        }
        let registered: Vec<String> = bundle.operations[1..]
            .iter()
            .map(|inner| match &inner.operation {
                Operation::RegisterNamespace { path, .. } => path.to_string(),
                other => panic!("expected registration, got {:?}", other),
            })
            .collect();
        assert_eq!(registered, vec!["acme", "acme.identities", "acme.names"]);
    }

    #[tokio::test]
    async fn test_composition_is_deterministic() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let owner = identity("acme", "owner", 1).public_account();
        let alice = identity("acme", "alice", 2);

        let first = composer
            .compose_identity_provisioning(
                &mut PlanningSession::new(),
                &owner,
                &alice,
                None,
                false,
                AssetNonce(3),
            )
            .await
            .unwrap();
        let second = composer
            .compose_identity_provisioning(
                &mut PlanningSession::new(),
                &owner,
                &alice,
                None,
                false,
                AssetNonce(3),
            )
            .await
            .unwrap();
        assert_eq!(first.kinds(), second.kinds());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pull_request_and_hash_lock() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let requester_identity = identity("acme", "alice", 2);
        let requester = requester_identity.public_account();
        let recipient = identity("acme", "bob", 3).public_account();
        let asset = AssetRef::parse("acme.cat").unwrap();

        let bundle = composer
            .compose_pull_request(&requester, &recipient, &asset, Amount(100))
            .unwrap();
        assert_eq!(bundle.kind, BundleKind::Bonded);
        assert_eq!(bundle.cosigners, vec![recipient]);
        match &bundle.operations[0].operation {
            Operation::Transfer { message, assets, .. } => {
                assert!(assets.is_empty());
                assert_eq!(
                    message.as_str(),
                    r#"pullRequest:{"asset":"acme.cat","amount":100}"#
                );
                assert_eq!(
                    PullRequestNote::from_message(message),
                    Some(PullRequestNote {
                        asset: "acme.cat".into(),
                        amount: 100
                    })
                );
            }
            other => panic!("expected note, got {:?}", other),
        }
        assert_eq!(bundle.operations[1].signer, recipient);

        let signed = Transaction::aggregate(composer.config().network, Deadline(10), bundle)
            .sign(&requester_identity.keypair)
            .unwrap();
        let lock = composer.compose_hash_lock(Amount(10_000_000), BlockDuration(100), &signed);
        assert_eq!(lock.signer, requester);
        assert_eq!(lock.deadline, Deadline(10));
        match lock.body {
            bizledger_types::TransactionBody::Single(Operation::HashLock { lock_hash, .. }) => {
                assert_eq!(lock_hash, signed.hash)
            }
            other => panic!("expected hash lock, got {:?}", other),
        }
    }

    #[test]
    fn test_pull_request_to_self_rejected() {
        let ledger = simulated_ledger(&nemesis());
        let composer = composer(&ledger);
        let alice = identity("acme", "alice", 2).public_account();
        let asset = AssetRef::parse("acme.cat").unwrap();
        assert!(matches!(
            composer.compose_pull_request(&alice, &alice, &asset, Amount(1)),
            Err(ComposerError::SelfRequest(_))
        ));
    }
}
