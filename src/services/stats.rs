//! `/api/v1/statistics`

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::DashboardStats;

#[derive(Clone)]
pub struct StatsService {
    client: ApiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<i64>,
}

impl StatsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Tenant-wide counters, or those of a single project
    pub async fn dashboard(&self, project_id: Option<i64>) -> ApiResult<DashboardStats> {
        self.client
            .get_query("/statistics/dashboard", &StatsQuery { project_id })
            .await
    }
}
