//! issuedesk - client core for a multi-tenant issue tracker
//!
//! Typed REST services, the local session store and the client-side rules
//! (status transitions, Kanban boards, comment threads, project tags and the
//! add-project wizard) shared by the CLI.

pub mod client;
pub mod config;
pub mod error;
pub mod fanout;
pub mod kanban;
pub mod models;
pub mod notifications;
pub mod policy;
pub mod services;
pub mod store;
pub mod tags;
pub mod threads;
pub mod wizard;

pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use store::{Session, SessionStore};
