//! Everything a command needs: configuration, identity store and ledger.

use crate::config::CliConfig;
use anyhow::{anyhow, bail, Context as _};
use bizledger_client::HttpGateway;
use bizledger_composer::TransactionComposer;
use bizledger_core::{LedgerEvent, LedgerGateway};
use bizledger_escrow::EscrowConfig;
use bizledger_monitor::Monitors;
use bizledger_planner::NamespacePlanner;
use bizledger_simulation::SimulatedLedger;
use bizledger_store::{IdentityFilter, IdentityStore, JsonIdentityStore, ANY_SCOPE};
use bizledger_types::{
    Address, BlockHeight, Identity, KeyPair, SignedTransaction, DEFAULT_NAME, NEMESIS_NAME,
    NEMESIS_SCOPE,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// A simulated ledger and where its snapshot is persisted.
struct Simulation {
    ledger: Arc<SimulatedLedger>,
    snapshot: Option<PathBuf>,
}

pub struct Context {
    pub config: CliConfig,
    pub store: Arc<dyn IdentityStore>,
    pub gateway: Arc<dyn LedgerGateway>,
    simulation: Option<Simulation>,
}

impl Context {
    pub fn new(
        config: CliConfig,
        store: Arc<dyn IdentityStore>,
        gateway: Arc<dyn LedgerGateway>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            simulation: None,
        }
    }

    /// Context over an in-process ledger, saved to `snapshot` by [`Context::finish`].
    pub fn simulated(
        config: CliConfig,
        store: Arc<dyn IdentityStore>,
        ledger: Arc<SimulatedLedger>,
        snapshot: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            store,
            gateway: ledger.clone(),
            simulation: Some(Simulation { ledger, snapshot }),
        }
    }

    /// Open the identity file and connect to the configured node, or to a
    /// persisted simulated ledger when `simulate` is set.
    pub fn open(config: CliConfig, simulate: bool) -> anyhow::Result<Self> {
        let store: Arc<dyn IdentityStore> =
            Arc::new(JsonIdentityStore::new(config.identity_store_path()));

        if simulate {
            let nemesis = simulated_nemesis(store.as_ref(), &config)?;
            let snapshot = config.ledger_snapshot_path();
            let ledger = SimulatedLedger::load_or_genesis(
                &snapshot,
                config.simulation_config()?,
                &nemesis.public_account(),
            )
            .with_context(|| format!("opening simulated ledger {}", snapshot.display()))?;
            info!(snapshot = %snapshot.display(), "Using simulated ledger");
            return Ok(Self::simulated(config, store, Arc::new(ledger), Some(snapshot)));
        }

        let gateway = HttpGateway::new(config.client_config()).context("creating HTTP gateway")?;
        Ok(Self::new(config, store, Arc::new(gateway)))
    }

    /// Persist the simulated ledger, if any.
    pub fn finish(&self) -> anyhow::Result<()> {
        if let Some(Simulation {
            ledger,
            snapshot: Some(path),
        }) = &self.simulation
        {
            ledger
                .save(path)
                .with_context(|| format!("saving simulated ledger {}", path.display()))?;
            debug!(path = %path.display(), height = ledger.height().0, "Saved simulated ledger");
        }
        Ok(())
    }

    pub fn composer(&self) -> anyhow::Result<TransactionComposer> {
        let planner = NamespacePlanner::new(self.gateway.clone(), self.config.planner_config());
        Ok(TransactionComposer::new(planner, self.config.composer_config()?))
    }

    pub fn escrow_config(&self) -> EscrowConfig {
        self.config.escrow_config()
    }

    pub fn identity(&self, scope: &str, name: &str) -> anyhow::Result<Identity> {
        self.store
            .find(scope, name)
            .with_context(|| format!("loading identity {}.{}", scope, name))
    }

    pub fn nemesis(&self) -> anyhow::Result<Identity> {
        self.identity(NEMESIS_SCOPE, NEMESIS_NAME)
            .context("no nemesis identity, run `bizledger network import` first")
    }

    /// Resolve `scope.name`, or a bare name that is unique across scopes.
    pub fn resolve_identity(&self, reference: &str) -> anyhow::Result<Identity> {
        if let Some((scope, name)) = reference.split_once('.') {
            return self.identity(scope, name);
        }
        let mut matches: Vec<Identity> = self
            .store
            .list(&IdentityFilter::new(Some(ANY_SCOPE), None))?
            .into_iter()
            .filter(|identity| identity.name == reference)
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 if reference == DEFAULT_NAME => Err(anyhow!(
                "no default identity, create one with `bizledger identity create`"
            )),
            0 => Err(anyhow!("no identity found with name {:?}", reference)),
            n => Err(anyhow!(
                "{} identities are named {:?}, use scope.name to pick one",
                n,
                reference
            )),
        }
    }

    /// The owner of `scope`.
    pub fn scope_owner(&self, scope: &str) -> anyhow::Result<Identity> {
        self.identity(scope, bizledger_types::OWNER_NAME)
            .with_context(|| format!("scope {} has no owner, run `bizledger scope create`", scope))
    }

    /// Start block and address monitors unless disabled in the config.
    pub async fn monitors(&self, addresses: &[Address]) -> anyhow::Result<Monitors> {
        if !self.config.monitor.enabled {
            return Ok(Monitors::disabled());
        }
        Monitors::start(self.gateway.clone(), addresses)
            .await
            .context("starting monitors")
    }

    /// Announce `signed` and wait until it is included in a block.
    ///
    /// Fails on a status error for the transaction or when no confirmation
    /// arrives within the escrow confirmation timeout.
    pub async fn submit(&self, signed: &SignedTransaction) -> anyhow::Result<BlockHeight> {
        let hash = signed.hash;
        let mut subscription = self
            .gateway
            .subscribe(&signed.signer().address)
            .await
            .context("subscribing to signer events")?;
        self.gateway
            .announce(signed)
            .await
            .with_context(|| format!("announcing transaction {}", hash))?;
        info!(hash = %hash, "Transaction announced");

        let timeout = self.escrow_config().confirmation_timeout;
        let outcome = tokio::time::timeout(timeout, async {
            while let Some(event) = subscription.recv().await {
                match event {
                    LedgerEvent::Confirmed { hash: h, height } if h == hash => return Ok(height),
                    LedgerEvent::StatusError { hash: h, status } if h == hash => {
                        bail!("transaction {} failed: {}", hash, status)
                    }
                    _ => {}
                }
            }
            bail!("event stream closed before transaction {} confirmed", hash)
        })
        .await;
        subscription.close();

        match outcome {
            Ok(result) => result,
            Err(_) => bail!("transaction {} not confirmed within {:?}", hash, timeout),
        }
    }
}

/// The stored nemesis, or a fresh one for a brand-new simulated ledger.
fn simulated_nemesis(store: &dyn IdentityStore, config: &CliConfig) -> anyhow::Result<Identity> {
    if store.contains(NEMESIS_SCOPE, NEMESIS_NAME)? {
        return Ok(store.find(NEMESIS_SCOPE, NEMESIS_NAME)?);
    }
    let nemesis = store.save(
        KeyPair::generate(),
        config.network.network_type,
        &config.network.url,
        NEMESIS_SCOPE,
        NEMESIS_NAME,
    )?;
    info!(address = %nemesis.address(), "Created nemesis identity for simulated ledger");
    Ok(nemesis)
}
