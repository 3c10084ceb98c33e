//! Composer configuration.

use bizledger_types::{Amount, AssetRef, NamespacePath, NetworkType};

/// Configuration for bundle composition.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Network every composed transaction targets.
    pub network: NetworkType,

    /// Alias of the network currency used for funding and collateral.
    pub currency: NamespacePath,

    /// Decimal places of the network currency.
    pub currency_divisibility: u8,

    /// Whole currency units sent from nemesis to a new scope owner.
    pub scope_funding_units: u64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::MijinTest,
            currency: NamespacePath::from_segments(["cat", "currency"])
                .expect("cat.currency is a valid namespace"),
            currency_divisibility: 6,
            scope_funding_units: 50_000_000,
        }
    }
}

impl ComposerConfig {
    /// Use the given network.
    pub fn with_network(mut self, network: NetworkType) -> Self {
        self.network = network;
        self
    }

    /// Use the given currency alias and divisibility.
    pub fn with_currency(mut self, currency: NamespacePath, divisibility: u8) -> Self {
        self.currency = currency;
        self.currency_divisibility = divisibility;
        self
    }

    /// Use the given scope funding, in whole currency units.
    pub fn with_scope_funding_units(mut self, units: u64) -> Self {
        self.scope_funding_units = units;
        self
    }

    /// The network currency as an asset reference.
    pub fn currency_ref(&self) -> AssetRef {
        AssetRef::Alias(self.currency.clone())
    }

    /// Scope funding in absolute units, `None` on overflow.
    pub fn scope_funding(&self) -> Option<Amount> {
        Amount::from_relative(self.scope_funding_units, self.currency_divisibility)
    }
}
