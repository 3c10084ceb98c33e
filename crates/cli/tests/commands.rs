//! Command flows over a simulated ledger and an in-memory identity store.

use bizledger_cli::commands::{asset, identity, namespace, network, pull_request, scope};
use bizledger_cli::{CliConfig, Context};
use bizledger_core::AliasTarget;
use bizledger_simulation::{SimulatedLedger, SubmissionKind};
use bizledger_store::{IdentityStore, MemoryIdentityStore};
use bizledger_test_helpers::{nemesis, simulated_ledger};
use clap::Parser;
use bizledger_types::{Amount, Identity, NamespacePath, NEMESIS_NAME, NEMESIS_SCOPE};
use std::sync::Arc;
use tracing_test::traced_test;

fn context() -> (Context, Arc<SimulatedLedger>) {
    let nemesis = nemesis();
    let ledger = simulated_ledger(&nemesis);
    let store = Arc::new(MemoryIdentityStore::with_identities([nemesis]));
    let ctx = Context::simulated(CliConfig::default(), store, ledger.clone(), None);
    (ctx, ledger)
}

fn path(input: &str) -> NamespacePath {
    NamespacePath::parse(input).unwrap()
}

fn asset_balance(ledger: &SimulatedLedger, holder: &Identity, asset: &str) -> Amount {
    match ledger.namespace(&path(asset)).and_then(|info| info.alias) {
        Some(AliasTarget::Asset(id)) => ledger.balance(&holder.address(), id),
        other => panic!("{} is not an asset alias: {:?}", asset, other),
    }
}

async fn create_scope(ctx: &Context, name: &str) -> Identity {
    scope::create(
        ctx,
        &scope::ScopeArgs {
            scope: name.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn create_identity(ctx: &Context, scope: &str, name: &str, assets: Option<&str>) -> Identity {
    identity::create(
        ctx,
        &identity::CreateArgs {
            name: name.to_string(),
            scope: scope.to_string(),
            network: None,
            url: None,
            local: false,
            assets: assets.map(str::to_string),
        },
    )
    .await
    .unwrap()
}

#[traced_test]
#[tokio::test]
async fn test_scope_identity_asset_and_pull_request() {
    let (ctx, ledger) = context();

    let owner = create_scope(&ctx, "acme").await;
    assert!(ledger.namespace(&path("acme.identities")).is_some());
    assert!(ledger.namespace(&path("acme.names")).is_some());
    assert_eq!(
        ledger.balance(&owner.address(), ledger.currency_id()),
        Amount(50_000_000_000_000)
    );

    let alice = create_identity(&ctx, "acme", "alice", Some("100000000 cat.currency")).await;
    assert_eq!(
        ledger
            .namespace(&path("acme.identities.alice"))
            .and_then(|info| info.alias),
        Some(AliasTarget::Address(alice.address()))
    );
    assert_eq!(asset_balance(&ledger, &alice, "acme.names.alice"), Amount(1));

    asset::create(
        &ctx,
        &asset::CreateArgs {
            identity: "acme.owner".to_string(),
            name: "acme.cat".to_string(),
            divisibility: 0,
            supply_mutable: false,
            transferable: true,
            initial_supply: Amount(1000),
            recipient: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(asset_balance(&ledger, &owner, "acme.cat"), Amount(1000));

    let aggregate_hash = pull_request::create(
        &ctx,
        &pull_request::CreateArgs {
            identity: "alice".to_string(),
            recipient: "owner".to_string(),
            asset: "acme.cat".to_string(),
            amount: Amount(100),
            timeout: None,
        },
    )
    .await
    .unwrap();

    assert!(ledger.is_confirmed(&aggregate_hash));
    assert_eq!(asset_balance(&ledger, &alice, "acme.cat"), Amount(100));
    assert_eq!(asset_balance(&ledger, &owner, "acme.cat"), Amount(900));
    assert!(logs_contain("Escrow completed"));
}

#[derive(Parser)]
struct AssetCreateCli {
    #[command(flatten)]
    args: asset::CreateArgs,
}

#[derive(Parser)]
struct PullRequestCreateCli {
    #[command(flatten)]
    args: pull_request::CreateArgs,
}

#[tokio::test]
async fn test_amount_flags_accept_hex_and_word_encodings() {
    let (ctx, ledger) = context();
    let owner = create_scope(&ctx, "acme").await;
    let alice = create_identity(&ctx, "acme", "alice", Some("100000000 cat.currency")).await;

    let asset_args = AssetCreateCli::try_parse_from([
        "create",
        "--identity",
        "acme.owner",
        "--name",
        "acme.cat",
        "--initial-supply",
        "[1000, 0]",
    ])
    .unwrap()
    .args;
    assert_eq!(asset_args.initial_supply, Amount(1000));
    asset::create(&ctx, &asset_args).await.unwrap();

    let request_args = PullRequestCreateCli::try_parse_from([
        "create",
        "--identity",
        "acme.alice",
        "--asset",
        "acme.cat",
        "--amount",
        "0x64",
    ])
    .unwrap()
    .args;
    assert_eq!(request_args.amount, Amount(100));
    pull_request::create(&ctx, &request_args).await.unwrap();

    assert_eq!(asset_balance(&ledger, &alice, "acme.cat"), Amount(100));
    assert_eq!(asset_balance(&ledger, &owner, "acme.cat"), Amount(900));
}

#[test]
fn test_ambiguous_amount_flag_is_rejected() {
    for amount in ["1e6", "12ab", "[1000]"] {
        assert!(
            PullRequestCreateCli::try_parse_from([
                "create", "--asset", "acme.cat", "--amount", amount,
            ])
            .is_err(),
            "{amount:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_local_identity_without_assets_stays_off_ledger() {
    let (ctx, ledger) = context();

    let carol = identity::create(
        &ctx,
        &identity::CreateArgs {
            name: "car ol!".to_string(),
            scope: "acme".to_string(),
            network: None,
            url: Some("http://node:3000".to_string()),
            local: true,
            assets: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(carol.slug(), "acme.carol");
    assert_eq!(carol.url, "http://node:3000");
    assert!(ctx.store.contains("acme", "carol").unwrap());
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn test_identity_requires_scope_owner() {
    let (ctx, _ledger) = context();

    let error = identity::create(
        &ctx,
        &identity::CreateArgs {
            name: "alice".to_string(),
            scope: "nowhere".to_string(),
            network: None,
            url: None,
            local: false,
            assets: None,
        },
    )
    .await
    .unwrap_err();

    assert!(format!("{:#}", error).contains("scope nowhere has no owner"));
    assert!(!ctx.store.contains("nowhere", "alice").unwrap());
}

#[tokio::test]
async fn test_rejected_provisioning_leaves_no_identity_behind() {
    let (ctx, ledger) = context();
    create_scope(&ctx, "acme").await;

    let args = identity::CreateArgs {
        name: "alice".to_string(),
        scope: "acme".to_string(),
        network: None,
        url: None,
        local: false,
        assets: None,
    };
    ledger.reject_next(SubmissionKind::Transaction, "Failure_Core_Insufficient_Balance");
    assert!(identity::create(&ctx, &args).await.is_err());
    assert!(!ctx.store.contains("acme", "alice").unwrap());

    let alice = identity::create(&ctx, &args).await.unwrap();
    assert_eq!(alice.slug(), "acme.alice");
}

#[tokio::test]
async fn test_namespace_create_skips_existing_segments() {
    let (ctx, _ledger) = context();
    create_scope(&ctx, "acme").await;
    create_identity(&ctx, "acme", "alice", Some("1000000 cat.currency")).await;

    let args = namespace::CreateArgs {
        identity: "acme.alice".to_string(),
        name: "alicecorp.widgets".to_string(),
    };
    assert_eq!(namespace::create(&ctx, &args).await.unwrap(), 2);
    assert_eq!(namespace::create(&ctx, &args).await.unwrap(), 0);
}

#[tokio::test]
async fn test_namespace_create_fails_for_unknown_account() {
    let (ctx, ledger) = context();
    identity::create(
        &ctx,
        &identity::CreateArgs {
            name: "ghost".to_string(),
            scope: "acme".to_string(),
            network: None,
            url: None,
            local: true,
            assets: None,
        },
    )
    .await
    .unwrap();

    let error = namespace::create(
        &ctx,
        &namespace::CreateArgs {
            identity: "ghost".to_string(),
            name: "ghostcorp".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert!(format!("{:#}", error).contains("is not known to the ledger"));
    assert!(ledger.submissions().is_empty());
}

#[tokio::test]
async fn test_list_resolve_and_remove() {
    let (ctx, _ledger) = context();
    for (scope, name) in [("acme", "alice"), ("acme", "bob"), ("globex", "alice")] {
        identity::create(
            &ctx,
            &identity::CreateArgs {
                name: name.to_string(),
                scope: scope.to_string(),
                network: None,
                url: None,
                local: true,
                assets: None,
            },
        )
        .await
        .unwrap();
    }

    let all = identity::list(
        &ctx,
        &identity::ListArgs {
            scope: "*".to_string(),
            name: None,
        },
    )
    .unwrap();
    assert_eq!(all.len(), 4);

    let acme = identity::list(
        &ctx,
        &identity::ListArgs {
            scope: "acme".to_string(),
            name: None,
        },
    )
    .unwrap();
    assert_eq!(acme.len(), 2);

    assert_eq!(ctx.resolve_identity("bob").unwrap().slug(), "acme.bob");
    assert!(ctx.resolve_identity("alice").is_err());
    assert_eq!(
        ctx.resolve_identity("globex.alice").unwrap().slug(),
        "globex.alice"
    );

    let removed = identity::remove(
        &ctx,
        &identity::RemoveArgs {
            scope: "acme".to_string(),
            name: "bob".to_string(),
        },
    )
    .unwrap();
    assert_eq!(removed.slug(), "acme.bob");
    assert!(ctx.resolve_identity("bob").is_err());
}

#[tokio::test]
async fn test_network_import_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join(network::ADDRESSES_FILE);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(
        &file,
        format!(
            "nemesis_addresses:\n  - private: {}\n    public: ignored\n",
            "4E".repeat(32)
        ),
    )
    .unwrap();

    let ledger = simulated_ledger(&nemesis());
    let store = Arc::new(MemoryIdentityStore::new());
    let ctx = Context::simulated(CliConfig::default(), store, ledger, None);
    let args = network::ImportArgs {
        path: dir.path().to_path_buf(),
        network: None,
        url: None,
    };

    let imported = network::import(&ctx, &args).unwrap();
    assert_eq!(imported.slug(), format!("{}.{}", NEMESIS_SCOPE, NEMESIS_NAME));
    assert_eq!(imported.keypair.private_key_hex().to_uppercase(), "4E".repeat(32));

    std::fs::remove_file(&file).unwrap();
    let again = network::import(&ctx, &args).unwrap();
    assert_eq!(again.address(), imported.address());
}

#[tokio::test]
async fn test_network_import_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _ledger) = {
        let ledger = simulated_ledger(&nemesis());
        let store = Arc::new(MemoryIdentityStore::new());
        (
            Context::simulated(CliConfig::default(), store, ledger.clone(), None),
            ledger,
        )
    };

    let error = network::import(
        &ctx,
        &network::ImportArgs {
            path: dir.path().to_path_buf(),
            network: None,
            url: None,
        },
    )
    .unwrap_err();
    assert!(format!("{:#}", error).contains("reading bootstrap addresses"));
}
