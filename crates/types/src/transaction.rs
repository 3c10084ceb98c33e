//! Transactions, aggregate bundles and cosignatures.
//!
//! An [`AggregateBundle`] is an ordered list of inner operations applied
//! atomically. A `Complete` bundle carries every required signature when it is
//! announced; a `Bonded` bundle is announced with only the issuer's signature
//! and becomes effective once every required cosigner has added a
//! [`CosignatureSigned`].

use crate::signing::{cosignature_message, transaction_message, DOMAIN_TRANSACTION};
use crate::{Deadline, Hash, KeyPair, NetworkType, Operation, OperationKind, PublicAccount, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// An operation together with the account that authorises it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerOperation {
    pub signer: PublicAccount,
    pub operation: Operation,
}

/// Whether an aggregate is announced fully signed or bonded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BundleKind {
    Complete,
    Bonded,
}

/// Ordered operations applied all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateBundle {
    pub kind: BundleKind,
    pub issuer: PublicAccount,
    /// Accounts other than the issuer whose signatures are required.
    pub cosigners: Vec<PublicAccount>,
    pub operations: Vec<InnerOperation>,
}

impl AggregateBundle {
    pub fn new(kind: BundleKind, issuer: PublicAccount) -> Self {
        Self {
            kind,
            issuer,
            cosigners: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Append an operation signed by `signer`.
    ///
    /// A signer other than the issuer becomes a required cosigner.
    pub fn push(&mut self, signer: PublicAccount, operation: Operation) {
        self.require_cosigner(signer);
        self.operations.push(InnerOperation { signer, operation });
    }

    /// Append several operations signed by the same account.
    pub fn extend<I>(&mut self, signer: PublicAccount, operations: I)
    where
        I: IntoIterator<Item = Operation>,
    {
        for operation in operations {
            self.push(signer, operation);
        }
    }

    /// Record `account` as a required cosigner (no-op for the issuer).
    pub fn require_cosigner(&mut self, account: PublicAccount) {
        if account != self.issuer && !self.cosigners.contains(&account) {
            self.cosigners.push(account);
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operation kinds in bundle order.
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.operations
            .iter()
            .map(|inner| inner.operation.kind())
            .collect()
    }
}

/// What a transaction carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionBody {
    Aggregate(AggregateBundle),
    Single(Operation),
}

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub network: NetworkType,
    pub deadline: Deadline,
    pub signer: PublicAccount,
    pub body: TransactionBody,
}

impl Transaction {
    /// Wrap an aggregate bundle, signed by its issuer.
    pub fn aggregate(network: NetworkType, deadline: Deadline, bundle: AggregateBundle) -> Self {
        Self {
            network,
            deadline,
            signer: bundle.issuer,
            body: TransactionBody::Aggregate(bundle),
        }
    }

    /// Wrap a standalone operation.
    pub fn single(
        network: NetworkType,
        deadline: Deadline,
        signer: PublicAccount,
        operation: Operation,
    ) -> Self {
        Self {
            network,
            deadline,
            signer,
            body: TransactionBody::Single(operation),
        }
    }

    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        let bytes = serde_json::to_vec(self).expect("transaction serialization should never fail");
        Hash::from_parts(&[DOMAIN_TRANSACTION, &bytes])
    }

    pub fn bundle(&self) -> Option<&AggregateBundle> {
        match &self.body {
            TransactionBody::Aggregate(bundle) => Some(bundle),
            TransactionBody::Single(_) => None,
        }
    }

    pub fn is_bonded(&self) -> bool {
        matches!(self.bundle(), Some(b) if b.kind == BundleKind::Bonded)
    }

    /// Sign as the issuer only.
    pub fn sign(self, keypair: &KeyPair) -> Result<SignedTransaction, TransactionError> {
        self.sign_with_cosigners(keypair, &[])
    }

    /// Sign as the issuer and attach cosignatures from `cosigners`.
    pub fn sign_with_cosigners(
        self,
        keypair: &KeyPair,
        cosigners: &[&KeyPair],
    ) -> Result<SignedTransaction, TransactionError> {
        if keypair.public_key() != self.signer.public_key {
            return Err(TransactionError::WrongSigner {
                expected: self.signer.public_key,
                actual: keypair.public_key(),
            });
        }

        let hash = self.hash();
        let signature = keypair.sign(&transaction_message(&hash));
        let cosignatures = cosigners
            .iter()
            .map(|cosigner| Cosignature {
                signer: cosigner.public_key(),
                signature: cosigner.sign(&cosignature_message(&hash)),
            })
            .collect();

        Ok(SignedTransaction {
            transaction: self,
            hash,
            signature,
            cosignatures,
        })
    }
}

/// A signature over an aggregate by a party other than the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// A signed transaction ready for announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub hash: Hash,
    pub signature: Signature,
    pub cosignatures: Vec<Cosignature>,
}

impl SignedTransaction {
    pub fn signer(&self) -> &PublicAccount {
        &self.transaction.signer
    }

    /// Whether `public_key` signed as issuer or cosigner.
    pub fn is_signed_by(&self, public_key: &PublicKey) -> bool {
        self.transaction.signer.public_key == *public_key
            || self.cosignatures.iter().any(|c| c.signer == *public_key)
    }

    /// Required cosigners that have not signed yet.
    pub fn missing_cosigners(&self) -> Vec<PublicAccount> {
        self.transaction
            .bundle()
            .map(|bundle| {
                bundle
                    .cosigners
                    .iter()
                    .filter(|account| !self.is_signed_by(&account.public_key))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether every required signature is present.
    pub fn is_fully_signed(&self) -> bool {
        self.missing_cosigners().is_empty()
    }

    /// Check the hash and every signature.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let expected = self.transaction.hash();
        if expected != self.hash {
            return Err(TransactionError::HashMismatch {
                expected,
                actual: self.hash,
            });
        }
        let signer = self.transaction.signer.public_key;
        if !signer.verify(&transaction_message(&self.hash), &self.signature) {
            return Err(TransactionError::InvalidSignature(signer));
        }
        for cosignature in &self.cosignatures {
            if !cosignature
                .signer
                .verify(&cosignature_message(&self.hash), &cosignature.signature)
            {
                return Err(TransactionError::InvalidSignature(cosignature.signer));
            }
        }
        Ok(())
    }

    /// Attach a detached cosignature after checking it.
    pub fn add_cosignature(&mut self, cosignature: &CosignatureSigned) -> Result<(), TransactionError> {
        if cosignature.parent_hash != self.hash {
            return Err(TransactionError::ParentMismatch {
                expected: self.hash,
                actual: cosignature.parent_hash,
            });
        }
        cosignature.verify()?;
        if !self.is_signed_by(&cosignature.signer) {
            self.cosignatures.push(Cosignature {
                signer: cosignature.signer,
                signature: cosignature.signature,
            });
        }
        Ok(())
    }
}

/// A cosignature announced separately from its bonded aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosignatureSigned {
    pub parent_hash: Hash,
    pub signer: PublicKey,
    pub signature: Signature,
}

impl CosignatureSigned {
    /// Cosign `parent` with `keypair`.
    pub fn create(parent: &SignedTransaction, keypair: &KeyPair) -> Self {
        Self {
            parent_hash: parent.hash,
            signer: keypair.public_key(),
            signature: keypair.sign(&cosignature_message(&parent.hash)),
        }
    }

    pub fn verify(&self) -> Result<(), TransactionError> {
        if self
            .signer
            .verify(&cosignature_message(&self.parent_hash), &self.signature)
        {
            Ok(())
        } else {
            Err(TransactionError::InvalidSignature(self.signer))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("Transaction must be signed by {expected}, got key {actual}")]
    WrongSigner { expected: PublicKey, actual: PublicKey },

    #[error("Transaction hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("Invalid signature from {0}")]
    InvalidSignature(PublicKey),

    #[error("Cosignature targets {actual}, expected {expected}")]
    ParentMismatch { expected: Hash, actual: Hash },
}
