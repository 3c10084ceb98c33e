//! Simulated ledger configuration.

use bizledger_types::{Amount, NamespacePath, NetworkType};

/// Configuration for a [`SimulatedLedger`](crate::SimulatedLedger).
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Network accepted transactions must target.
    pub network: NetworkType,

    /// Alias of the currency asset created at genesis.
    pub currency: NamespacePath,

    /// Decimal places of the currency.
    pub currency_divisibility: u8,

    /// Currency balance of the nemesis account at genesis.
    pub nemesis_balance: Amount,

    /// Produce a block right after every accepted announcement.
    ///
    /// When disabled, blocks are only produced by
    /// [`SimulatedLedger::produce_block`](crate::SimulatedLedger::produce_block)
    /// or a spawned block producer.
    pub auto_confirm: bool,

    /// Capacity of each subscription channel.
    pub event_buffer: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::MijinTest,
            currency: NamespacePath::from_segments(["cat", "currency"])
                .expect("cat.currency is a valid namespace"),
            currency_divisibility: 6,
            nemesis_balance: Amount(8_999_999_998_000_000),
            auto_confirm: true,
            event_buffer: 1024,
        }
    }
}

impl SimulationConfig {
    /// Use the given network.
    pub fn with_network(mut self, network: NetworkType) -> Self {
        self.network = network;
        self
    }

    /// Enable or disable automatic block production.
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    /// Use the given currency alias and divisibility.
    pub fn with_currency(mut self, currency: NamespacePath, divisibility: u8) -> Self {
        self.currency = currency;
        self.currency_divisibility = divisibility;
        self
    }
}
