//! `bizledger` configuration file.
//!
//! ```toml
//! [network]
//! type = "MIJIN_TEST"
//! url = "http://localhost:3000"
//! currency = "cat.currency"
//! divisibility = 6
//!
//! [store]
//! path = "/home/me/.bizledger/identities.json"
//!
//! [escrow]
//! collateral = 10000000
//! lock_duration = 100
//! confirmation_timeout_secs = 120
//! poll_interval_secs = 2
//!
//! [planner]
//! lookup_policy = "fail_open"
//! root_duration = 1000000
//!
//! [monitor]
//! enabled = true
//! ```
//!
//! Every section and field is optional.

use anyhow::Context as _;
use bizledger_client::ClientConfig;
use bizledger_composer::ComposerConfig;
use bizledger_escrow::EscrowConfig;
use bizledger_planner::{LookupPolicy, PlannerConfig};
use bizledger_simulation::SimulationConfig;
use bizledger_types::{Amount, BlockDuration, NamespacePath, NetworkType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const IDENTITY_FILE: &str = "identities.json";
const LEDGER_SNAPSHOT_FILE: &str = "simulated-ledger.json";

/// Directory holding the default config, identity file and ledger snapshot.
pub fn default_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".bizledger")
}

/// `~/.bizledger/config.toml`
pub fn default_config_path() -> PathBuf {
    default_dir().join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub network: NetworkSection,
    pub store: StoreSection,
    pub escrow: EscrowSection,
    pub planner: PlannerSection,
    pub monitor: MonitorSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    /// Node REST endpoint, also recorded on every created identity.
    pub url: String,
    pub currency: String,
    pub divisibility: u8,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            network_type: NetworkType::MijinTest,
            url: "http://localhost:3000".to_string(),
            currency: "cat.currency".to_string(),
            divisibility: 6,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    /// Identity file. Defaults to `~/.bizledger/identities.json`.
    pub path: Option<PathBuf>,
    /// Snapshot used by `--simulate`. Defaults to
    /// `~/.bizledger/simulated-ledger.json`.
    pub ledger_snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscrowSection {
    /// Hash lock collateral in absolute currency units.
    pub collateral: u64,
    /// Blocks the hash lock stays valid.
    pub lock_duration: u64,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for EscrowSection {
    fn default() -> Self {
        let defaults = EscrowConfig::default();
        Self {
            collateral: defaults.collateral.get(),
            lock_duration: defaults.lock_duration.0,
            confirmation_timeout_secs: defaults.confirmation_timeout.as_secs(),
            poll_interval_secs: defaults.pending_poll_interval.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerSection {
    pub lookup_policy: LookupPolicy,
    /// Rental duration, in blocks, of new root namespaces.
    pub root_duration: u64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        let defaults = PlannerConfig::default();
        Self {
            lookup_policy: defaults.lookup_policy,
            root_duration: defaults.root_duration.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    pub enabled: bool,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CliConfig {
    /// Load `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading config {}", path.display()));
            }
        };
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.currency()?;
        Ok(config)
    }

    pub fn identity_store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| default_dir().join(IDENTITY_FILE))
    }

    pub fn ledger_snapshot_path(&self) -> PathBuf {
        self.store
            .ledger_snapshot
            .clone()
            .unwrap_or_else(|| default_dir().join(LEDGER_SNAPSHOT_FILE))
    }

    pub fn currency(&self) -> anyhow::Result<NamespacePath> {
        NamespacePath::parse(&self.network.currency)
            .with_context(|| format!("invalid currency alias {:?}", self.network.currency))
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::default()
            .with_lookup_policy(self.planner.lookup_policy)
            .with_root_duration(BlockDuration(self.planner.root_duration))
    }

    pub fn composer_config(&self) -> anyhow::Result<ComposerConfig> {
        Ok(ComposerConfig::default()
            .with_network(self.network.network_type)
            .with_currency(self.currency()?, self.network.divisibility))
    }

    pub fn escrow_config(&self) -> EscrowConfig {
        EscrowConfig::default()
            .with_collateral(Amount(self.escrow.collateral))
            .with_lock_duration(BlockDuration(self.escrow.lock_duration))
            .with_confirmation_timeout(Duration::from_secs(self.escrow.confirmation_timeout_secs))
            .with_pending_poll_interval(Duration::from_secs(self.escrow.poll_interval_secs))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.network.url.clone())
    }

    pub fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        Ok(SimulationConfig::default()
            .with_network(self.network.network_type)
            .with_currency(self.currency()?, self.network.divisibility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config.network.network_type, NetworkType::MijinTest);
        assert_eq!(config.network.url, "http://localhost:3000");
        assert!(config.monitor.enabled);

        let escrow = config.escrow_config();
        assert_eq!(escrow.collateral, Amount(10_000_000));
        assert_eq!(escrow.lock_duration, BlockDuration(100));
        assert_eq!(escrow.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.planner_config().lookup_policy, LookupPolicy::FailOpen);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = CliConfig::parse(
            r#"
            [network]
            type = "TEST_NET"
            url = "http://node:3000"
            currency = "acme.coin"
            divisibility = 2

            [store]
            path = "/tmp/ids.json"

            [escrow]
            collateral = 5
            confirmation_timeout_secs = 30

            [planner]
            lookup_policy = "fail_closed"

            [monitor]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.network.network_type, NetworkType::TestNet);
        assert_eq!(config.identity_store_path(), PathBuf::from("/tmp/ids.json"));
        assert!(!config.monitor.enabled);

        let composer = config.composer_config().unwrap();
        assert_eq!(composer.currency, NamespacePath::parse("acme.coin").unwrap());
        assert_eq!(composer.currency_divisibility, 2);

        let escrow = config.escrow_config();
        assert_eq!(escrow.collateral, Amount(5));
        assert_eq!(escrow.lock_duration, BlockDuration(100));
        assert_eq!(escrow.confirmation_timeout, Duration::from_secs(30));
        assert_eq!(config.planner_config().lookup_policy, LookupPolicy::FailClosed);
    }

    #[test]
    fn test_unknown_field_and_bad_currency_rejected() {
        assert!(CliConfig::parse("[network]\nnode = \"x\"").is_err());
        assert!(CliConfig::parse("[network]\ncurrency = \"a.b.c.d\"").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.network.currency, "cat.currency");
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[escrow]\nlock_duration = 7\n").unwrap();
        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.escrow_config().lock_duration, BlockDuration(7));
    }
}
