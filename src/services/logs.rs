//! `/api/v1/logs`

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Log, Severity};

#[derive(Clone)]
pub struct LogService {
    client: ApiClient,
}

/// Query filters; unset fields are left out of the query string
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
}

impl LogService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &LogFilter) -> ApiResult<Vec<Log>> {
        self.client.get_query("/logs", filter).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Log> {
        self.client.get(&format!("/logs/{}", id)).await
    }

    pub async fn mark_handled(&self, id: i64) -> ApiResult<()> {
        self.client.put_empty(&format!("/logs/{}/handled", id)).await
    }
}
