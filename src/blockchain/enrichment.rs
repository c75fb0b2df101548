// src/blockchain/enrichment.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::blockchain::models::{TransactionError, TransactionPayload};

/// Looks up extra details for a prepared transaction before it is shown.
#[async_trait]
pub trait TransactionEnricher: Send + Sync {
    async fn enrich(&self, payload: TransactionPayload) -> Result<TransactionPayload, TransactionError>;
}

/// Enricher backed by a local HTTP endpoint that decodes `txBytes`.
#[derive(Clone)]
pub struct EnrichmentClient {
    client: Client,
    url: String,
}

impl EnrichmentClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl TransactionEnricher for EnrichmentClient {
    async fn enrich(&self, mut payload: TransactionPayload) -> Result<TransactionPayload, TransactionError> {
        let body = json!({ "txBytes": payload.tx_bytes.as_str() });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransactionError::Enrichment(e.to_string()))?;

        let status = resp.status();
        debug!(status = %status, url = %self.url, "Enrichment response status");
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TransactionError::Enrichment(format!("{} - {}", status, text)));
        }

        let details: Value = resp
            .json()
            .await
            .map_err(|e| TransactionError::Enrichment(e.to_string()))?;
        let Value::Object(details) = details else {
            return Err(TransactionError::Enrichment(
                "expected a JSON object".to_string(),
            ));
        };

        info!(fields = details.len(), "Merged enrichment into transaction payload");
        payload.merge(details);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};

    #[tokio::test]
    async fn test_enrichment_merges_response() {
        let m = mock("POST", "/enrich/ok")
            .match_body(Matcher::Json(json!({"txBytes": "AQID"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"transactionType":"CRYPTOTRANSFER","fee":"0.05 HBAR"}"#)
            .create();

        let client = EnrichmentClient::new(format!("{}/enrich/ok", mockito::server_url()));
        let payload = client.enrich(TransactionPayload::new("AQID")).await.unwrap();

        m.assert();
        assert_eq!(payload.transaction_type(), Some("CRYPTOTRANSFER"));
        assert_eq!(payload.fields["fee"], json!("0.05 HBAR"));
        assert_eq!(payload.tx_bytes.as_str(), "AQID");
    }

    #[tokio::test]
    async fn test_enrichment_rejects_non_object_and_errors() {
        let _array = mock("POST", "/enrich/array")
            .with_status(200)
            .with_body("[1,2,3]")
            .create();
        let client = EnrichmentClient::new(format!("{}/enrich/array", mockito::server_url()));
        assert!(client.enrich(TransactionPayload::new("AQID")).await.is_err());

        let _failing = mock("POST", "/enrich/fail")
            .with_status(500)
            .with_body("boom")
            .create();
        let client = EnrichmentClient::new(format!("{}/enrich/fail", mockito::server_url()));
        let err = client.enrich(TransactionPayload::new("AQID")).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
