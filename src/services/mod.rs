//! Typed wrappers around the REST resources
//!
//! Each service holds a clone of the shared [`ApiClient`].

mod auth;
mod comments;
mod logs;
mod projects;
mod solutions;
mod staff;
mod stats;
mod tickets;
mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use logs::{LogFilter, LogService};
pub use projects::{ProjectService, project_form_fields};
pub use solutions::{Recommendation, SolutionService};
pub use staff::StaffService;
pub use stats::StatsService;
pub use tickets::TicketService;
pub use users::UserService;

use crate::client::ApiClient;

impl ApiClient {
    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.clone())
    }

    pub fn tickets(&self) -> TicketService {
        TicketService::new(self.clone())
    }

    pub fn logs(&self) -> LogService {
        LogService::new(self.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.clone())
    }

    pub fn solutions(&self) -> SolutionService {
        SolutionService::new(self.clone())
    }

    pub fn staff(&self) -> StaffService {
        StaffService::new(self.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.clone())
    }

    pub fn stats(&self) -> StatsService {
        StatsService::new(self.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.clone())
    }
}
