//! `/api/v1/solutions`

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fanout;
use crate::models::{Complexity, NewSolution, Solution, SolutionStatus};

#[derive(Clone)]
pub struct SolutionService {
    client: ApiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRequest {
    ticket_id: i64,
}

#[derive(Serialize)]
struct SolutionStatusUpdate {
    status: SolutionStatus,
}

/// AI-assisted draft suggested by the backend for a ticket
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub complexity: Complexity,
}

impl Recommendation {
    /// Turn the suggestion into a draft the user can edit and submit
    pub fn into_draft(self, ticket_id: i64, author_user_id: Option<i64>) -> NewSolution {
        NewSolution {
            ticket_id,
            title: self.title,
            content: self.content,
            complexity: self.complexity,
            status: SolutionStatus::Draft,
            author_user_id,
        }
    }
}

impl SolutionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The solution of a ticket; `None` when the ticket has none yet
    pub async fn for_ticket(&self, ticket_id: i64) -> ApiResult<Option<Solution>> {
        match self
            .client
            .get(&format!("/solutions/ticket/{}", ticket_id))
            .await
        {
            Ok(solution) => Ok(Some(solution)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Solutions for many tickets, paired with their ticket id
    pub async fn for_tickets(
        &self,
        ticket_ids: &[i64],
        concurrency: usize,
    ) -> ApiResult<Vec<(i64, Option<Solution>)>> {
        fanout::try_bounded(ticket_ids.iter().copied(), concurrency, |id| async move {
            let solution = self.for_ticket(id).await?;
            Ok::<_, ApiError>((id, solution))
        })
        .await
    }

    pub async fn create(&self, solution: &NewSolution) -> ApiResult<Solution> {
        self.client.post_json("/solutions", solution).await
    }

    pub async fn update(&self, id: i64, solution: &NewSolution) -> ApiResult<Solution> {
        self.client
            .put_json(&format!("/solutions/{}", id), solution)
            .await
    }

    pub async fn update_status(&self, id: i64, status: SolutionStatus) -> ApiResult<Solution> {
        self.client
            .put_json(
                &format!("/solutions/{}/status", id),
                &SolutionStatusUpdate { status },
            )
            .await
    }

    pub async fn recommend(&self, ticket_id: i64) -> ApiResult<Recommendation> {
        self.client
            .post_json("/solutions/recommendations", &RecommendationRequest { ticket_id })
            .await
    }
}
