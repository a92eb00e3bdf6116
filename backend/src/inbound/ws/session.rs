//! Per-connection WebSocket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge while the listing
//! subscription runs in its own task and hands snapshots over a channel.
//! The public contract pings every 5s and considers a connection idle after
//! 10s without client traffic. Tests shorten these intervals.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::{Error, Listing, ListingId, ListingScope, ListingSubscription};
use crate::inbound::http::pages::IndexQuery;
use crate::inbound::ws::messages::{ClientMessage, FeedView, ServerMessage, filter_for};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Snapshots waiting to be sent; a slow client holds back the subscription.
const SNAPSHOT_BUFFER: usize = 4;

type Snapshot = Result<Vec<Listing>, Error>;

pub(super) async fn handle_ws_session(
    view: FeedView,
    subscription: ListingSubscription,
    session: Session,
    stream: MessageStream,
) {
    let item = match subscription.scope() {
        ListingScope::Single(id) => Some(*id),
        _ => None,
    };
    let (sender, snapshots) = mpsc::channel(SNAPSHOT_BUFFER);
    let feed = FeedTask(actix_web::rt::spawn(pump_snapshots(subscription, sender)));
    WsSession::new(view, item, feed)
        .run(session, stream, snapshots)
        .await;
}

async fn pump_snapshots(mut subscription: ListingSubscription, sender: mpsc::Sender<Snapshot>) {
    loop {
        let snapshot = subscription.next().await;
        let failed = snapshot.is_err();
        if sender.send(snapshot).await.is_err() || failed {
            debug!(scope = ?subscription.scope(), "listing feed stopped");
            return;
        }
    }
}

/// Subscription task, aborted when the connection ends.
struct FeedTask(JoinHandle<()>);

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    FeedUnavailable,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    view: FeedView,
    /// Listing followed by the item view.
    item: Option<ListingId>,
    /// Filter inputs last accepted on the index view.
    query: IndexQuery,
    /// Last unfiltered snapshot, kept so filter changes need no new query.
    latest: Option<Vec<Listing>>,
    _feed: FeedTask,
}

impl WsSession {
    fn new(view: FeedView, item: Option<ListingId>, feed: FeedTask) -> Self {
        Self {
            view,
            item,
            query: IndexQuery::default(),
            latest: None,
            _feed: feed,
        }
    }

    async fn run(
        mut self,
        mut session: Session,
        mut stream: MessageStream,
        mut snapshots: mpsc::Receiver<Snapshot>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                snapshot = snapshots.recv() => {
                    self.handle_snapshot(&mut session, snapshot).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_snapshot(
        &mut self,
        session: &mut Session,
        snapshot: Option<Snapshot>,
    ) -> Result<(), SessionError> {
        match snapshot {
            Some(Ok(listings)) => {
                self.latest = Some(listings);
                self.push_view(session).await
            }
            Some(Err(error)) => {
                warn!(error = %error, "listing feed failed");
                self.send_json(session, &ServerMessage::error(&error))
                    .await
                    .map_err(SessionError::Network)?;
                Err(SessionError::FeedUnavailable)
            }
            None => Err(SessionError::FeedUnavailable),
        }
    }

    /// Render the last snapshot for this view and send it.
    async fn push_view(&self, session: &mut Session) -> Result<(), SessionError> {
        let Some(listings) = self.latest.as_deref() else {
            return Ok(());
        };
        let message = match self.view {
            FeedView::Index => match filter_for(&self.query, listings) {
                Ok(filter) => ServerMessage::filtered(listings, &filter),
                Err(error) => ServerMessage::error(&error),
            },
            FeedView::Item => match (listings.is_empty(), self.item) {
                (true, Some(id)) => ServerMessage::NotFound { id },
                _ => ServerMessage::snapshot(self.view, listings.to_vec()),
            },
            FeedView::Dashboard | FeedView::Admin => {
                ServerMessage::snapshot(self.view, listings.to_vec())
            }
        };
        self.send_json(session, &message)
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let ClientMessage::Filter(query) = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        if self.view != FeedView::Index {
            let error = Error::invalid_request("filters only apply to the index view");
            return self
                .send_json(session, &ServerMessage::error(&error))
                .await
                .map_err(SessionError::Network);
        }
        // Validate against the current snapshot so a bad category keeps the old filter.
        if let Err(error) = filter_for(&query, self.latest.as_deref().unwrap_or_default()) {
            return self
                .send_json(session, &ServerMessage::error(&error))
                .await
                .map_err(SessionError::Network);
        }
        self.query = query;
        self.push_view(session).await
    }

    async fn send_json<T: serde::Serialize>(
        &self,
        session: &mut Session,
        payload: &T,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "Failed to serialize WebSocket payload");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::FeedUnavailable => {
                warn!(view = ?self.view, "listing feed ended; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::FeedUnavailable => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Again,
                description: Some("listing feed unavailable".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
