//! Kanban boards: column distribution and drag-and-drop moves

use std::future::Future;

use tracing::{info, warn};

use crate::error::ApiResult;
use crate::models::{Role, Ticket};
use crate::policy::{Workflow, can_transition};
use crate::store::Session;

/// Who is looking at the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub role: Role,
}

impl From<&Session> for Viewer {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id(),
            role: session.role(),
        }
    }
}

impl Viewer {
    /// Role filter applied to the intake column only
    fn sees_in_intake(&self, ticket: &Ticket) -> bool {
        match self.role {
            Role::Manager => ticket.is_unassigned(),
            Role::Developer => ticket.assigned_to_user_id == Some(self.user_id),
            _ => true,
        }
    }
}

/// Persists a status change; implemented by the ticket service
pub trait TicketStatusUpdater {
    fn update_status(
        &self,
        ticket_id: i64,
        status: &str,
    ) -> impl Future<Output = ApiResult<Ticket>> + Send;
}

#[derive(Debug, Clone)]
pub struct Column<S> {
    pub status: S,
    pub tickets: Vec<Ticket>,
}

/// A drop of the item at `previous_index` in `from` onto `current_index` in `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropEvent<S> {
    pub from: S,
    pub to: S,
    pub previous_index: usize,
    pub current_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome<S> {
    /// Same column; order changed locally only
    Reordered,
    /// Status changed and persisted
    Moved { ticket_id: i64, status: S },
    /// The role may not make this transition; nothing moved
    Rejected { ticket_id: i64, reason: String },
    /// Indices did not point at a ticket
    Ignored,
}

/// Tickets grouped into one column per workflow status
#[derive(Debug, Clone)]
pub struct Board<S: Workflow> {
    pub columns: Vec<Column<S>>,
    /// Intake tickets the viewer's role filter keeps off the board
    pub hidden: Vec<Ticket>,
}

impl<S: Workflow> Default for Board<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Workflow> Board<S> {
    pub fn new() -> Self {
        Self {
            columns: S::ALL
                .iter()
                .map(|&status| Column {
                    status,
                    tickets: Vec::new(),
                })
                .collect(),
            hidden: Vec::new(),
        }
    }

    /// Build a board from a ticket list
    pub fn from_tickets(tickets: &[Ticket], viewer: &Viewer) -> Self {
        let mut board = Self::new();
        board.distribute(tickets, viewer);
        board
    }

    /// Refill every column in place
    ///
    /// Tickets with a status outside this workflow land in the intake column
    /// and go through the same role filter. Re-run after every reload.
    pub fn distribute(&mut self, tickets: &[Ticket], viewer: &Viewer) {
        for column in &mut self.columns {
            column.tickets.clear();
        }
        self.hidden.clear();

        let intake = S::initial();
        for ticket in tickets {
            let status = ticket
                .status_as::<S>()
                .filter(|s| self.index_of(*s).is_some())
                .unwrap_or(intake);

            if status == intake && !viewer.sees_in_intake(ticket) {
                self.hidden.push(ticket.clone());
                continue;
            }
            if let Some(idx) = self.index_of(status) {
                self.columns[idx].tickets.push(ticket.clone());
            }
        }
    }

    pub fn column(&self, status: S) -> Option<&Column<S>> {
        self.columns.iter().find(|c| c.status == status)
    }

    fn index_of(&self, status: S) -> Option<usize> {
        self.columns.iter().position(|c| c.status == status)
    }

    /// Column and position of a ticket on the board
    pub fn locate(&self, ticket_id: i64) -> Option<(S, usize)> {
        self.columns.iter().find_map(|c| {
            c.tickets
                .iter()
                .position(|t| t.id == ticket_id)
                .map(|pos| (c.status, pos))
        })
    }

    /// Every ticket on the board, hidden ones included
    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.columns
            .iter()
            .flat_map(|c| c.tickets.iter())
            .chain(self.hidden.iter())
    }

    /// Apply a drag-and-drop
    ///
    /// Cross-column drops are gated by role, applied optimistically and then
    /// persisted. A failed update puts the ticket back where it was.
    pub async fn drop_ticket<U: TicketStatusUpdater>(
        &mut self,
        event: DropEvent<S>,
        viewer: &Viewer,
        updater: &U,
    ) -> ApiResult<DropOutcome<S>> {
        let (Some(from), Some(to)) = (self.index_of(event.from), self.index_of(event.to)) else {
            return Ok(DropOutcome::Ignored);
        };
        if event.previous_index >= self.columns[from].tickets.len() {
            return Ok(DropOutcome::Ignored);
        }

        if from == to {
            let tickets = &mut self.columns[from].tickets;
            let ticket = tickets.remove(event.previous_index);
            let at = event.current_index.min(tickets.len());
            tickets.insert(at, ticket);
            return Ok(DropOutcome::Reordered);
        }

        let ticket_id = self.columns[from].tickets[event.previous_index].id;
        if !can_transition(viewer.role, event.from, event.to) {
            let reason = format!(
                "{} cannot move tickets from {} to {}",
                viewer.role,
                event.from.label(),
                event.to.label()
            );
            warn!(ticket_id, role = %viewer.role, from = ?event.from, to = ?event.to, "Transition rejected");
            return Ok(DropOutcome::Rejected { ticket_id, reason });
        }

        let mut ticket = self.columns[from].tickets.remove(event.previous_index);
        let previous_status = std::mem::replace(&mut ticket.status, event.to.as_str().to_string());
        let at = event.current_index.min(self.columns[to].tickets.len());
        self.columns[to].tickets.insert(at, ticket);

        match updater.update_status(ticket_id, event.to.as_str()).await {
            Ok(updated) => {
                info!(ticket_id, status = event.to.as_str(), "Ticket moved");
                let column = &mut self.columns[to];
                if let Some(pos) = column.tickets.iter().position(|t| t.id == ticket_id) {
                    if event.to == S::initial() && !viewer.sees_in_intake(&updated) {
                        column.tickets.remove(pos);
                        self.hidden.push(updated);
                    } else {
                        column.tickets[pos] = updated;
                    }
                }
                Ok(DropOutcome::Moved {
                    ticket_id,
                    status: event.to,
                })
            }
            Err(err) => {
                warn!(ticket_id, error = %err, "Status update failed, reverting move");
                let column = &mut self.columns[to];
                if let Some(pos) = column.tickets.iter().position(|t| t.id == ticket_id) {
                    let mut ticket = column.tickets.remove(pos);
                    ticket.status = previous_status;
                    let back = event.previous_index.min(self.columns[from].tickets.len());
                    self.columns[from].tickets.insert(back, ticket);
                }
                Err(err)
            }
        }
    }
}
