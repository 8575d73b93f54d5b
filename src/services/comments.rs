//! `/api/v1/comments`

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Comment, NewComment};
use crate::threads::{Thread, build_thread};

#[derive(Clone)]
pub struct CommentService {
    client: ApiClient,
}

#[derive(Serialize)]
struct ContentUpdate<'a> {
    content: &'a str,
}

impl CommentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn for_ticket(&self, ticket_id: i64) -> ApiResult<Vec<Comment>> {
        self.client
            .get(&format!("/comments/ticket/{}", ticket_id))
            .await
    }

    /// Comments of a ticket rebuilt into a reply tree
    pub async fn thread(&self, ticket_id: i64) -> ApiResult<Thread> {
        Ok(build_thread(self.for_ticket(ticket_id).await?))
    }

    pub async fn create(&self, comment: &NewComment) -> ApiResult<Comment> {
        self.client.post_json("/comments", comment).await
    }

    pub async fn update(&self, id: i64, content: &str) -> ApiResult<Comment> {
        self.client
            .put_json(&format!("/comments/{}", id), &ContentUpdate { content })
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/comments/{}", id)).await
    }
}
