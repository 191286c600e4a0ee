//! HTTP client for a local key-holding wallet bridge.

use std::time::Duration;

use megavote_types::{Address, ChainId, ChainParams};
use serde::Deserialize;

use crate::error::ProviderError;
use crate::event::WalletEvent;
use crate::provider::WalletProvider;
use crate::rpc::RpcContract;

/// EIP-1193: the user rejected the request.
const CODE_USER_REJECTED: i64 = 4001;

/// EIP-3085/EIP-3326: the wallet has no entry for the requested chain.
const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Wallet access over HTTP, in the manner of a locally running signer
/// daemon: it holds the keys, prompts the user out-of-band, signs, and
/// forwards transactions.
///
/// A connection-refused failure is reported as
/// [`ProviderError::Unavailable`]: no bridge listening means no wallet.
#[derive(Clone)]
pub struct HttpWalletBridge {
    http: reqwest::Client,
    wallet_url: String,
}

impl HttpWalletBridge {
    /// Create a bridge client targeting the given base URL
    /// (e.g. `http://127.0.0.1:1248`).
    ///
    /// The request timeout is generous: account, signing, and switch
    /// requests wait on a human approving a prompt in the wallet.
    pub fn new(wallet_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            wallet_url: wallet_url.into(),
        })
    }

    /// The configured bridge URL.
    pub fn wallet_url(&self) -> &str {
        &self.wallet_url
    }

    /// Send one action request and return the `result` field.
    ///
    /// Wallet errors arrive as `{"error": {"code": ..., "message": ...}}`;
    /// the user-rejection code is mapped here, everything else is handed to
    /// the caller for context-specific mapping.
    async fn wallet_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ProviderError::Transport("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        let response = self
            .http
            .post(&self.wallet_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Unavailable
                } else {
                    ProviderError::Transport(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "wallet returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error") {
            let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown wallet error")
                .to_string();
            return Err(match code {
                CODE_USER_REJECTED => ProviderError::Rejected,
                _ => ProviderError::Rpc { code, message },
            });
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }

    async fn account_list(&self, action: &str) -> Result<Vec<Address>, ProviderError> {
        let result = self.wallet_call(action, serde_json::json!({})).await?;
        let resp: AccountsResult = serde_json::from_value(result)
            .map_err(|e| ProviderError::Decode(format!("invalid {action} response: {e}")))?;
        Ok(resp.accounts)
    }
}

impl WalletProvider for HttpWalletBridge {
    type Contract = RpcContract;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.account_list("request_accounts").await
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.account_list("accounts").await
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let result = self.wallet_call("chain_id", serde_json::json!({})).await?;
        let resp: ChainIdResult = serde_json::from_value(result)
            .map_err(|e| ProviderError::Decode(format!("invalid chain_id response: {e}")))?;
        Ok(ChainId(resp.chain_id))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        let result = self
            .wallet_call(
                "switch_chain",
                serde_json::json!({ "chain_id": chain_id.as_hex() }),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ProviderError::Rpc { code, .. }) if code == CODE_UNRECOGNIZED_CHAIN => {
                Err(ProviderError::UnknownChain(chain_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn add_chain(&self, params: &ChainParams) -> Result<(), ProviderError> {
        self.wallet_call(
            "add_chain",
            serde_json::json!({
                "chain_id": params.chain_id.as_hex(),
                "chain_name": params.chain_name,
                "native_currency": {
                    "name": params.currency.name,
                    "symbol": params.currency.symbol,
                    "decimals": params.currency.decimals,
                },
                "rpc_urls": [params.rpc_url],
                "block_explorer_urls": [params.explorer_url],
            }),
        )
        .await?;
        Ok(())
    }

    async fn next_event(&self) -> Option<WalletEvent> {
        // Long-poll: the bridge holds the request until it has an event or
        // its own poll window lapses (an empty result).
        loop {
            match self.wallet_call("next_event", serde_json::json!({})).await {
                Ok(result) => {
                    let resp: EventResult = match serde_json::from_value(result) {
                        Ok(resp) => resp,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping undecodable wallet event");
                            continue;
                        }
                    };
                    if let Some(event) = resp.event {
                        return Some(event);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "wallet event stream ended");
                    return None;
                }
            }
        }
    }

    fn bind_contract(&self, contract: &Address) -> RpcContract {
        // Shares this bridge's HTTP client on purpose: signer-backed writes
        // also wait on the user approving the transaction in the wallet.
        RpcContract::from_parts(self.http.clone(), &self.wallet_url, contract.clone())
    }
}

/// Account list response shape.
#[derive(Debug, Deserialize)]
struct AccountsResult {
    accounts: Vec<Address>,
}

/// Chain id response shape.
#[derive(Debug, Deserialize)]
struct ChainIdResult {
    chain_id: u64,
}

/// Long-poll response shape; `event` is absent on poll-window lapse.
#[derive(Debug, Deserialize)]
struct EventResult {
    #[serde(default)]
    event: Option<WalletEvent>,
}
