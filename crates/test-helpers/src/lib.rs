//! Deterministic fixtures shared by the workspace's tests.
//!
//! Keys come from fixed seeds so hashes and addresses are stable across runs.

use bizledger_simulation::{SimulatedLedger, SimulationConfig};
use bizledger_types::{
    Amount, Identity, KeyPair, NetworkType, Scope, NEMESIS_NAME, NEMESIS_SCOPE, OWNER_NAME,
};
use std::sync::Arc;

/// Network every fixture uses.
pub const NETWORK: NetworkType = NetworkType::MijinTest;

/// Node URL stored on fixture identities.
pub const NODE_URL: &str = "http://localhost:3000";

const NEMESIS_SEED: u8 = 0x4E;

/// Identity `scope.name` with a key derived from `seed`.
pub fn identity(scope: &str, name: &str, seed: u8) -> Identity {
    Identity::new(
        KeyPair::from_seed(&[seed; 32]),
        NETWORK,
        NODE_URL,
        scope,
        name,
    )
}

/// The genesis account holding the network currency.
pub fn nemesis() -> Identity {
    identity(NEMESIS_SCOPE, NEMESIS_NAME, NEMESIS_SEED)
}

/// Scope with an owner (seed `base`) and members seeded `base + 1..`.
pub fn scope(name: &str, members: &[&str], base: u8) -> Scope {
    let mut identities = vec![identity(name, OWNER_NAME, base)];
    identities.extend(
        members
            .iter()
            .zip(base.wrapping_add(1)..)
            .map(|(member, seed)| identity(name, member, seed)),
    );
    Scope {
        name: name.to_string(),
        identities,
    }
}

/// Auto-confirming ledger at genesis, owned by `nemesis`.
pub fn simulated_ledger(nemesis: &Identity) -> Arc<SimulatedLedger> {
    simulated_ledger_with(SimulationConfig::default(), nemesis)
}

/// Ledger at genesis with a custom configuration.
pub fn simulated_ledger_with(config: SimulationConfig, nemesis: &Identity) -> Arc<SimulatedLedger> {
    let config = config.with_network(nemesis.network);
    Arc::new(SimulatedLedger::new(config, &nemesis.public_account()))
}

/// Credit `units` whole currency units to `identity`.
pub fn fund(ledger: &SimulatedLedger, identity: &Identity, units: u64) {
    let amount = Amount::from_relative(units, ledger.config().currency_divisibility)
        .unwrap_or(Amount(u64::MAX));
    ledger.credit(identity.address(), amount);
}
