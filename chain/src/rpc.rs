//! HTTP contract client speaking action-based JSON requests.

use std::time::Duration;

use megavote_types::{Address, TxHash};
use serde::Deserialize;

use crate::contract::{ProposalContract, ProposalRecord};
use crate::error::ContractError;

/// How many times to poll for a submitted transaction before giving up.
const CONFIRM_ATTEMPTS: u32 = 60;

/// Delay between confirmation polls.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP client for the voting contract, bound to one endpoint and one
/// deployment address.
///
/// The same type serves both roles the design needs: bound to the wallet
/// bridge it is a signer-backed read/write handle; bound to a public RPC
/// endpoint it is the read-only fallback. Callers gate writes on an active
/// connection, and a read-only endpoint rejects them anyway.
#[derive(Clone)]
pub struct RpcContract {
    http: reqwest::Client,
    base_url: String,
    contract: Address,
}

impl RpcContract {
    /// Create a client targeting `base_url` for the contract at `contract`.
    pub fn new(base_url: impl Into<String>, contract: Address) -> Result<Self, ContractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ContractError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::from_parts(http, base_url, contract))
    }

    /// Build from an existing HTTP client (shared with a wallet bridge).
    pub fn from_parts(
        http: reqwest::Client,
        base_url: impl Into<String>,
        contract: Address,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            contract,
        }
    }

    /// The configured endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The contract deployment this handle is bound to.
    pub fn contract_address(&self) -> &Address {
        &self.contract
    }

    /// Send one action request and return the `result` field.
    async fn rpc_call(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError> {
        let mut body = params;
        let fields = body
            .as_object_mut()
            .ok_or_else(|| ContractError::Rpc("params must be a JSON object".into()))?;
        fields.insert("action".to_string(), serde_json::json!(action));
        fields.insert(
            "contract".to_string(),
            serde_json::json!(self.contract.as_str()),
        );

        let response = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ContractError::Rpc(format!(
                "endpoint returned HTTP {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ContractError::Decode(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            return Err(ContractError::Rpc(err.to_string()));
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }

    /// Submit a write action, then poll until the transaction confirms.
    async fn submit_and_wait(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<TxHash, ContractError> {
        let result = self.rpc_call(action, params).await?;
        let submitted: SubmitResult = serde_json::from_value(result)
            .map_err(|e| ContractError::Decode(format!("invalid {action} response: {e}")))?;
        let hash = TxHash::parse(submitted.hash)
            .map_err(|e| ContractError::Decode(e.to_string()))?;

        tracing::debug!(%hash, action, "transaction submitted, awaiting confirmation");
        self.wait_for_confirmation(&hash).await?;
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: &TxHash) -> Result<(), ContractError> {
        for _ in 0..CONFIRM_ATTEMPTS {
            let result = self
                .rpc_call(
                    "transaction_status",
                    serde_json::json!({ "hash": hash.as_str() }),
                )
                .await?;
            let status: StatusResult = serde_json::from_value(result).map_err(|e| {
                ContractError::Decode(format!("invalid transaction_status response: {e}"))
            })?;

            match status.status.as_str() {
                "confirmed" => return Ok(()),
                "reverted" => {
                    return Err(ContractError::Reverted {
                        reason: status
                            .reason
                            .unwrap_or_else(|| "execution reverted".to_string()),
                    })
                }
                _ => tokio::time::sleep(CONFIRM_POLL_INTERVAL).await,
            }
        }
        Err(ContractError::ConfirmationTimeout(hash.to_string()))
    }
}

impl ProposalContract for RpcContract {
    async fn proposal_count(&self) -> Result<u64, ContractError> {
        let result = self
            .rpc_call("proposal_count", serde_json::json!({}))
            .await?;
        let resp: CountResult = serde_json::from_value(result)
            .map_err(|e| ContractError::Decode(format!("invalid proposal_count response: {e}")))?;
        Ok(resp.count)
    }

    async fn proposal(&self, index: u64) -> Result<ProposalRecord, ContractError> {
        let result = self
            .rpc_call("get_proposal", serde_json::json!({ "index": index }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| ContractError::Decode(format!("invalid proposal record: {e}")))
    }

    async fn create_proposal(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TxHash, ContractError> {
        self.submit_and_wait(
            "create_proposal",
            serde_json::json!({ "title": title, "description": description }),
        )
        .await
    }

    async fn vote(&self, index: u64, support: bool) -> Result<TxHash, ContractError> {
        self.submit_and_wait(
            "vote",
            serde_json::json!({ "index": index, "support": support }),
        )
        .await
    }
}

/// Count response shape.
#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

/// Response to a write submission.
#[derive(Debug, Deserialize)]
struct SubmitResult {
    hash: String,
}

/// Response from the `transaction_status` poll.
#[derive(Debug, Deserialize)]
struct StatusResult {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}
