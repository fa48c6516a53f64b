use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::{
    constants::{SCORE_SORT_DESC, SCORE_SORT_PARAM},
    error::{AppError, Result},
    models::NewScoreRecord,
};

/// The external high-score table.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// All score records, highest score first, exactly as the store returns them.
    async fn list_scores(&self) -> Result<Value>;

    async fn create_score(&self, record: &NewScoreRecord) -> Result<Value>;
}

#[derive(Clone, Debug)]
pub struct RecordStoreClient {
    records_url: String,
    api_key: String,
    client: Client,
}

impl RecordStoreClient {
    pub fn new(records_url: String, api_key: String, client: Client) -> Self {
        Self {
            records_url,
            api_key,
            client,
        }
    }

    fn list_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.records_url.trim())
            .map_err(|e| AppError::Internal(format!("Invalid record store URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair(SCORE_SORT_PARAM, SCORE_SORT_DESC);
        Ok(url)
    }

    async fn read_json(&self, op: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Record store {} failed: status={} body={}", op, status, body);
            return Err(AppError::ExternalAPI(format!(
                "Record store {} returned {}",
                op, status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Record store {} parse failed: {}", op, e)))
    }
}

#[async_trait]
impl ScoreStore for RecordStoreClient {
    async fn list_scores(&self) -> Result<Value> {
        let response = self
            .client
            .get(self.list_url()?)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalAPI(format!("Record store list request failed: {}", e))
            })?;

        self.read_json("list", response).await
    }

    async fn create_score(&self, record: &NewScoreRecord) -> Result<Value> {
        let response = self
            .client
            .post(self.records_url.trim())
            .bearer_auth(&self.api_key)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalAPI(format!("Record store create request failed: {}", e))
            })?;

        self.read_json("create", response).await
    }
}
