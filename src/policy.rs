//! Role rules: ticket status transitions and navigation visibility
//!
//! This is a client-side mirror only. The backend is the authority and may
//! still reject a transition the table allows.

use std::fmt::Debug;

use crate::models::{BoardStatus, IssueStatus, Role};

/// A ticket status vocabulary with its own transition table
pub trait Workflow: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every status in column order; the first one is the intake ("To Do") column
    const ALL: &'static [Self];

    /// Wire representation
    fn as_str(&self) -> &'static str;

    /// Column title
    fn label(&self) -> &'static str;

    /// Statuses a role may move a ticket into. Admins bypass this table.
    fn allowed_targets(role: Role) -> &'static [Self];

    fn initial() -> Self {
        Self::ALL[0]
    }

    /// Lenient parse: `TO_DO`, `to do` and `To-Do` all match
    fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        Self::ALL.iter().copied().find(|s| s.as_str() == normalized)
    }
}

impl Workflow for IssueStatus {
    const ALL: &'static [Self] = &[
        IssueStatus::ToDo,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::MergedToTest,
        IssueStatus::Done,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::ToDo => "TO_DO",
            IssueStatus::InProgress => "IN_PROGRESS",
            IssueStatus::Resolved => "RESOLVED",
            IssueStatus::MergedToTest => "MERGED_TO_TEST",
            IssueStatus::Done => "DONE",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            IssueStatus::ToDo => "To Do",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
            IssueStatus::MergedToTest => "Merged to Test",
            IssueStatus::Done => "Done",
        }
    }

    fn allowed_targets(role: Role) -> &'static [Self] {
        match role {
            Role::Manager => &[IssueStatus::ToDo, IssueStatus::MergedToTest, IssueStatus::Done],
            Role::Developer => &[IssueStatus::InProgress, IssueStatus::Resolved],
            Role::Tester => &[IssueStatus::Done],
            Role::Admin => Self::ALL,
            Role::Partner | Role::Unknown => &[],
        }
    }
}

impl Workflow for BoardStatus {
    const ALL: &'static [Self] = &[
        BoardStatus::Pending,
        BoardStatus::Resolved,
        BoardStatus::Verified,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            BoardStatus::Pending => "PENDING",
            BoardStatus::Resolved => "RESOLVED",
            BoardStatus::Verified => "VERIFIED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BoardStatus::Pending => "To Do",
            BoardStatus::Resolved => "Resolved",
            BoardStatus::Verified => "Verified",
        }
    }

    fn allowed_targets(role: Role) -> &'static [Self] {
        match role {
            Role::Manager => &[BoardStatus::Pending],
            Role::Developer => &[BoardStatus::Resolved],
            Role::Tester => &[BoardStatus::Verified],
            Role::Admin => Self::ALL,
            Role::Partner | Role::Unknown => &[],
        }
    }
}

/// Whether `role` may move a ticket from `current` to `new`
///
/// Moving onto the same status is never a transition.
pub fn can_transition<S: Workflow>(role: Role, current: S, new: S) -> bool {
    if current == new {
        return false;
    }
    S::allowed_targets(role).contains(&new)
}

/// Top-level navigation entries of the dashboard shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    Dashboard,
    Projects,
    Issues,
    Kanban,
    Logs,
    Staff,
    Statistics,
}

impl MenuSection {
    pub const ALL: [MenuSection; 7] = [
        MenuSection::Dashboard,
        MenuSection::Projects,
        MenuSection::Issues,
        MenuSection::Kanban,
        MenuSection::Logs,
        MenuSection::Staff,
        MenuSection::Statistics,
    ];

    pub fn visible_to(&self, role: Role) -> bool {
        use MenuSection::*;
        match (self, role) {
            (_, Role::Unknown) => false,
            (Dashboard | Projects | Issues | Kanban, _) => true,
            (Logs, Role::Admin | Role::Manager | Role::Developer) => true,
            (Staff, Role::Admin) => true,
            (Statistics, Role::Admin | Role::Partner | Role::Manager) => true,
            _ => false,
        }
    }
}

/// Sections shown in the sidebar for a role, in menu order
pub fn visible_sections(role: Role) -> Vec<MenuSection> {
    MenuSection::ALL
        .into_iter()
        .filter(|s| s.visible_to(role))
        .collect()
}
