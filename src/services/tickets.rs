//! `/api/v1/tickets`

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::fanout;
use crate::kanban::TicketStatusUpdater;
use crate::models::{NewTicket, StatusUpdate, Ticket};

#[derive(Clone)]
pub struct TicketService {
    client: ApiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectQuery {
    project_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Assignment {
    user_id: i64,
}

impl TicketService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Ticket>> {
        self.client.get("/tickets").await
    }

    pub async fn for_project(&self, project_id: i64) -> ApiResult<Vec<Ticket>> {
        self.client
            .get_query("/tickets", &ProjectQuery { project_id })
            .await
    }

    /// Tickets of several projects, e.g. every microservice of a package
    pub async fn for_projects(
        &self,
        project_ids: &[i64],
        concurrency: usize,
    ) -> ApiResult<Vec<Ticket>> {
        let per_project = fanout::try_bounded(project_ids.iter().copied(), concurrency, |id| {
            self.for_project(id)
        })
        .await?;
        Ok(per_project.into_iter().flatten().collect())
    }

    pub async fn get(&self, id: i64) -> ApiResult<Ticket> {
        self.client.get(&format!("/tickets/{}", id)).await
    }

    pub async fn create(&self, ticket: &NewTicket) -> ApiResult<Ticket> {
        self.client.post_json("/tickets", ticket).await
    }

    pub async fn update(&self, ticket: &Ticket) -> ApiResult<Ticket> {
        self.client
            .put_json(&format!("/tickets/{}", ticket.id), ticket)
            .await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> ApiResult<Ticket> {
        let body = StatusUpdate {
            status: status.to_string(),
        };
        self.client
            .put_json(&format!("/tickets/{}/status", id), &body)
            .await
    }

    pub async fn assign(&self, id: i64, user_id: i64) -> ApiResult<Ticket> {
        self.client
            .put_json(&format!("/tickets/{}/assign", id), &Assignment { user_id })
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/tickets/{}", id)).await
    }
}

impl TicketStatusUpdater for TicketService {
    async fn update_status(&self, ticket_id: i64, status: &str) -> ApiResult<Ticket> {
        TicketService::update_status(self, ticket_id, status).await
    }
}
