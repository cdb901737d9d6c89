//! JSON-RPC transport to the ledger gateway.
//!
//! Reads go through `ledger_read`, writes through `ledger_submit` (the
//! gateway forwards them to the connected wallet for signing) and inclusion
//! is awaited with `ledger_awaitInclusion`.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::{
    CollectionKind, InclusionOutcome, LedgerCall, ReadSurface, RecordKind, SubmissionRef,
    WriteSurface,
};
use crate::models::EntityId;
use async_trait::async_trait;
use leptos::logging::{log, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Serialize, Debug)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for LedgerError {
    fn from(err: RpcErrorObject) -> Self {
        // Revert reasons arrive either as a bare string or as `{ "reason": ... }`
        let reason = match err.data {
            Some(Value::String(reason)) => Some(reason),
            Some(Value::Object(map)) => map
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        LedgerError::Rejected {
            code: Some(err.code),
            message: err.message,
            reason,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum InclusionStatus {
    Included,
    Reverted,
}

#[derive(Deserialize, Debug)]
struct InclusionReply {
    status: InclusionStatus,
    #[serde(default)]
    reason: Option<String>,
}

pub struct RpcLedger {
    config: LedgerConfig,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_secs(config.request_timeout_secs));
        let http = builder.build()?;
        Ok(Self {
            config,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        match self.call_raw(method, params).await? {
            Some(result) => Ok(serde_json::from_value(result)?),
            None => Err(LedgerError::Decode(format!("{} returned no result", method))),
        }
    }

    async fn call_raw(&self, method: &str, params: Value) -> Result<Option<Value>, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("[RPC] {} failed with HTTP {}: {}", method, status, body);
            return Err(LedgerError::Transport(format!("HTTP {} - {}", status, body)));
        }

        let reply: RpcResponse = response.json().await?;
        decode_reply(reply)
    }

    async fn read(&self, function: &str, args: Vec<Value>) -> Result<Option<Value>, LedgerError> {
        self.call_raw(
            "ledger_read",
            json!({
                "contract": self.config.contract_address,
                "function": function,
                "args": args,
            }),
        )
        .await
    }
}

fn decode_reply(reply: RpcResponse) -> Result<Option<Value>, LedgerError> {
    if let Some(err) = reply.error {
        return Err(err.into());
    }
    Ok(reply.result.filter(|value| !value.is_null()))
}

fn enumerate_call(collection: &CollectionKind) -> (&'static str, Vec<Value>) {
    match collection {
        CollectionKind::Listings => ("getAllProjects", Vec::new()),
        CollectionKind::Reviews { listing } => ("getProjectReviews", vec![json!(listing.as_str())]),
    }
}

fn detail_function(record: RecordKind) -> &'static str {
    match record {
        RecordKind::Listing => "getProject",
        RecordKind::Review => "reviews",
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ReadSurface for RpcLedger {
    async fn enumerate(&self, collection: &CollectionKind) -> Result<Vec<EntityId>, LedgerError> {
        let (function, args) = enumerate_call(collection);
        match self.read(function, args).await? {
            Some(ids) => Ok(serde_json::from_value(ids)?),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_detail(
        &self,
        record: RecordKind,
        id: &EntityId,
    ) -> Result<Option<Value>, LedgerError> {
        self.read(detail_function(record), vec![json!(id.as_str())]).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WriteSurface for RpcLedger {
    async fn submit(&self, call: &LedgerCall) -> Result<SubmissionRef, LedgerError> {
        let mut params = json!({
            "contract": self.config.contract_address,
            "function": call.function,
            "args": call.args,
        });
        if let Some(value) = call.value {
            // Wei amounts exceed JSON's safe integer range
            params["value"] = Value::String(value.to_string());
        }
        if let Some(chain_id) = self.config.chain_id {
            params["chainId"] = json!(chain_id);
        }

        let reference: String = self.call("ledger_submit", params).await?;
        log!("[RPC] {} accepted as {}", call.function, reference);
        Ok(SubmissionRef(reference))
    }

    async fn await_inclusion(
        &self,
        reference: &SubmissionRef,
    ) -> Result<InclusionOutcome, LedgerError> {
        let reply: InclusionReply = self
            .call("ledger_awaitInclusion", json!({ "reference": reference.0 }))
            .await?;
        Ok(match reply.status {
            InclusionStatus::Included => InclusionOutcome::Included,
            InclusionStatus::Reverted => InclusionOutcome::Reverted {
                detail: reply.reason,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(value: Value) -> RpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_error_object_with_reason_object() {
        let err = decode_reply(reply(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted", "data": { "reason": "Already reviewed" } }
        })))
        .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Rejected {
                code: Some(3),
                message: "execution reverted".into(),
                reason: Some("Already reviewed".into()),
            }
        );
    }

    #[test]
    fn test_error_object_with_string_data() {
        let err = decode_reply(reply(json!({
            "error": { "code": 4001, "message": "User rejected the request.", "data": "denied" }
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected { code: Some(4001), reason: Some(ref r), .. } if r == "denied"
        ));
    }

    #[test]
    fn test_null_result_is_absent() {
        assert_eq!(decode_reply(reply(json!({ "result": null }))).unwrap(), None);
        assert_eq!(
            decode_reply(reply(json!({ "result": ["1", 2] }))).unwrap(),
            Some(json!(["1", 2]))
        );
    }

    #[test]
    fn test_call_mapping() {
        assert_eq!(enumerate_call(&CollectionKind::Listings), ("getAllProjects", vec![]));
        let (function, args) = enumerate_call(&CollectionKind::Reviews {
            listing: EntityId::new("4"),
        });
        assert_eq!(function, "getProjectReviews");
        assert_eq!(args, vec![json!("4")]);
        assert_eq!(detail_function(RecordKind::Review), "reviews");
    }

    #[test]
    fn test_inclusion_reply() {
        let reply: InclusionReply =
            serde_json::from_value(json!({ "status": "reverted", "reason": "Already voted" })).unwrap();
        assert!(matches!(reply.status, InclusionStatus::Reverted));
        assert_eq!(reply.reason.as_deref(), Some("Already voted"));
    }
}
