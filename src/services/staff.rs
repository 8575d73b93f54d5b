//! `/api/v1/employees`

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{NewStaffMember, StaffMember};

#[derive(Clone)]
pub struct StaffService {
    client: ApiClient,
}

impl StaffService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<StaffMember>> {
        self.client.get("/employees").await
    }

    pub async fn get(&self, id: i64) -> ApiResult<StaffMember> {
        self.client.get(&format!("/employees/{}", id)).await
    }

    pub async fn create(&self, member: &NewStaffMember) -> ApiResult<StaffMember> {
        self.client.post_json("/employees", member).await
    }

    pub async fn update(&self, id: i64, member: &NewStaffMember) -> ApiResult<StaffMember> {
        self.client
            .put_json(&format!("/employees/{}", id), member)
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/employees/{}", id)).await
    }
}
