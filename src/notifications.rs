//! Real-time notification feed over WebSocket

use futures::StreamExt;
use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Live subscription to the notification channel of one user
///
/// There is no reconnect: once the socket closes the status stays
/// `Disconnected` and `next` returns `None`. Dropping the feed closes the
/// socket.
pub struct NotificationFeed {
    status: watch::Receiver<ConnectionStatus>,
    incoming: mpsc::Receiver<Notification>,
    task: JoinHandle<()>,
}

impl NotificationFeed {
    /// Open the feed keyed by the user's email
    pub fn connect(endpoint: &str, email: &str, token: Option<&str>) -> ApiResult<Self> {
        let mut url = Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidRequest(format!("bad notification url: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("email", email);
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }

        let (status_tx, status) = watch::channel(ConnectionStatus::Connecting);
        let (tx, incoming) = mpsc::channel(64);
        let task = tokio::spawn(run(url.to_string(), status_tx, tx));

        Ok(Self {
            status,
            incoming,
            task,
        })
    }

    /// Watch handle for connection status changes
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub async fn next(&mut self) -> Option<Notification> {
        self.incoming.recv().await
    }

    pub fn close(self) {}
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    url: String,
    status: watch::Sender<ConnectionStatus>,
    tx: mpsc::Sender<Notification>,
) {
    let mut socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            warn!(error = %e, "Notification socket failed to connect");
            status.send_replace(ConnectionStatus::Disconnected);
            return;
        }
    };
    info!("Notification socket connected");
    status.send_replace(ConnectionStatus::Connected);

    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Notification>(&text) {
                Ok(notification) => {
                    if tx.send(notification).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring malformed notification"),
            },
            Ok(Message::Close(_)) => break,
            Ok(other) => debug!(kind = ?other, "Ignoring non-text frame"),
            Err(e) => {
                warn!(error = %e, "Notification socket error");
                break;
            }
        }
    }

    info!("Notification socket closed");
    status.send_replace(ConnectionStatus::Disconnected);
}

/// Received notifications with read tracking
#[derive(Debug, Default)]
pub struct Inbox {
    items: Vec<Notification>,
}

impl Inbox {
    /// Newest first
    pub fn push(&mut self, notification: Notification) {
        self.items.insert(0, notification);
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.read = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(message: &str) -> Notification {
        Notification {
            id: None,
            message: message.to_string(),
            kind: None,
            ticket_id: None,
            project_id: None,
            read: false,
            created_at: None,
        }
    }

    #[test]
    fn inbox_counts_unread_newest_first() {
        let mut inbox = Inbox::default();
        inbox.push(note("first"));
        inbox.push(note("second"));
        assert_eq!(inbox.items()[0].message, "second");
        assert_eq!(inbox.unread_count(), 2);
        inbox.mark_all_read();
        assert_eq!(inbox.unread_count(), 0);
    }

    #[tokio::test]
    async fn bad_url_is_rejected() {
        assert!(matches!(
            NotificationFeed::connect("not a url", "a@b.c", None),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_reports_disconnected() {
        let feed = NotificationFeed::connect("ws://127.0.0.1:9/ws", "a@b.c", None).unwrap();
        let mut status = feed.status();
        let final_status = status
            .wait_for(|s| *s == ConnectionStatus::Disconnected)
            .await
            .map(|s| *s)
            .unwrap();
        assert_eq!(final_status, ConnectionStatus::Disconnected);
    }
}
