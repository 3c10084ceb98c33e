//! [`LedgerGateway`] over a node's JSON REST API.

use crate::types::{
    AccountEventsResponse, AnnounceRequest, AnnounceResponse, ChainHeightResponse,
    CosignatureRequest, ErrorResponse,
};
use crate::ClientConfig;
use async_trait::async_trait;
use bizledger_core::{
    AccountInfo, Ack, BlockInfo, BlockSubscription, EventStream, GatewayError, LedgerGateway,
    NamespaceInfo, Subscription,
};
use bizledger_types::{
    Address, BlockHeight, CosignatureSigned, NamespacePath, PublicAccount, SignedTransaction,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// HTTP client for a ledger node.
///
/// Subscriptions are backed by polling tasks. Each task stops when its
/// [`EventStream`] is closed or dropped.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: ClientConfig,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {}", e)))?;
        info!(url = %config.url, "HTTP gateway ready");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.config.url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        decode(response, what).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(response, what).await
    }

    async fn announce_to(
        &self,
        path: &str,
        transaction: &SignedTransaction,
    ) -> Result<Ack, GatewayError> {
        let response: AnnounceResponse = self
            .put(path, &AnnounceRequest { transaction }, "transaction")
            .await?;
        if response.hash != transaction.hash {
            warn!(
                expected = %transaction.hash,
                actual = %response.hash,
                "Node acknowledged a different hash"
            );
        }
        debug!(hash = %transaction.hash, path, message = ?response.message, "Announced");
        Ok(Ack {
            hash: transaction.hash,
        })
    }

    pub async fn chain_height(&self) -> Result<BlockHeight, GatewayError> {
        let response: ChainHeightResponse = self.get("/chain/height", "chain height").await?;
        Ok(response.height)
    }

    pub async fn block(&self, height: BlockHeight) -> Result<BlockInfo, GatewayError> {
        self.get(&format!("/blocks/{}", height.0), "block").await
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid {} response: {}", what, e)));
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, what, &body))
}

fn transport(error: reqwest::Error) -> GatewayError {
    GatewayError::Transport(error.to_string())
}

/// Map a non-success status onto a gateway error.
fn status_error(status: StatusCode, what: &str, body: &str) -> GatewayError {
    let detail = ErrorResponse::describe(body);
    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound(format!("{} {}", what, detail)),
        s if s.is_client_error() => GatewayError::Rejected(detail),
        s => GatewayError::Transport(format!("{} from node: {}", s, detail)),
    }
}

#[async_trait]
impl LedgerGateway for HttpGateway {
    async fn announce(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError> {
        self.announce_to("/transactions", transaction).await
    }

    async fn announce_bonded(&self, transaction: &SignedTransaction) -> Result<Ack, GatewayError> {
        self.announce_to("/transactions/partial", transaction).await
    }

    async fn announce_cosignature(
        &self,
        cosignature: &CosignatureSigned,
    ) -> Result<Ack, GatewayError> {
        let _: AnnounceResponse = self
            .put(
                "/transactions/cosignature",
                &CosignatureRequest { cosignature },
                "cosignature",
            )
            .await?;
        Ok(Ack {
            hash: cosignature.parent_hash,
        })
    }

    async fn get_namespace(&self, path: &NamespacePath) -> Result<NamespaceInfo, GatewayError> {
        self.get(&format!("/namespaces/{}", path), "namespace").await
    }

    async fn get_account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError> {
        self.get(&format!("/accounts/{}", address.plain()), "account")
            .await
    }

    async fn subscribe(&self, address: &Address) -> Result<Subscription, GatewayError> {
        let path = format!("/accounts/{}/events", address.plain());
        // Start from the current cursor so only new events are delivered.
        let initial: AccountEventsResponse = self.get(&path, "account events").await?;

        let (sender, receiver) = mpsc::channel(self.config.event_buffer);
        let cancel = CancellationToken::new();
        let gateway = self.clone();
        let token = cancel.clone();
        let address = *address;
        tokio::spawn(async move {
            let mut cursor = initial.next;
            let mut ticker = tokio::time::interval(gateway.config.poll_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let page: AccountEventsResponse = match gateway
                    .get(&format!("{}?from={}", path, cursor), "account events")
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(address = %address, error = %e, "Event poll failed");
                        continue;
                    }
                };
                cursor = page.next;
                for event in page.events {
                    if sender.send(event).await.is_err() {
                        return;
                    }
                }
            }
            debug!(address = %address, "Event polling stopped");
        });

        Ok(EventStream::with_guard(receiver, cancel.drop_guard()))
    }

    async fn subscribe_blocks(&self) -> Result<BlockSubscription, GatewayError> {
        let start = self.chain_height().await?;

        let (sender, receiver) = mpsc::channel(self.config.event_buffer);
        let cancel = CancellationToken::new();
        let gateway = self.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut last = start;
            let mut ticker = tokio::time::interval(gateway.config.poll_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let height = match gateway.chain_height().await {
                    Ok(height) => height,
                    Err(e) => {
                        warn!(error = %e, "Chain height poll failed");
                        continue;
                    }
                };
                while last < height {
                    let next = last.next();
                    match gateway.block(next).await {
                        Ok(block) => {
                            if sender.send(block).await.is_err() {
                                return;
                            }
                            last = next;
                        }
                        Err(e) => {
                            warn!(height = next.0, error = %e, "Block fetch failed");
                            break;
                        }
                    }
                }
            }
        });

        Ok(EventStream::with_guard(receiver, cancel.drop_guard()))
    }

    async fn pending_bonded_aggregates(
        &self,
        account: &PublicAccount,
    ) -> Result<Vec<SignedTransaction>, GatewayError> {
        self.get(
            &format!("/accounts/{}/transactions/partial", account.public_key),
            "partial transactions",
        )
        .await
    }
}
