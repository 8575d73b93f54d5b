//! `/api/v1/users`

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::User;

#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> ApiResult<User> {
        self.client.get(&format!("/users/{}", id)).await
    }

    /// Profile behind the current token
    pub async fn me(&self) -> ApiResult<User> {
        self.client.get("/users/me").await
    }

    /// Users matching a name or email fragment, used for @mention lookup
    pub async fn search(&self, query: &str) -> ApiResult<Vec<User>> {
        self.client
            .get_query("/users/search", &SearchQuery { q: query })
            .await
    }
}
