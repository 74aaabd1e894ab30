use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::command::Command;
use super::identity::{choose_user_id, random_color};
use super::shutdown::ShutdownStatus;
use super::transport::{ClientSink, ConnHandle, TransportError};
use crate::models::{ClientFrame, Envelope, LeaveReason, Session, SessionState};
use crate::utils::ip::mask_ip;
use crate::AppState;

const PASSWORD_PROMPT: &str = "=== Terminal Chat - Login ===\nPlease enter the access password:";
const PASSWORD_EMPTY: &str = "❌ The password cannot be empty! Please try again:";
const PASSWORD_WRONG: &str = "❌ Wrong password! Please enter the access password:";
const PASSWORD_OK: &str = "✅ Password accepted! On to choosing your user ID...";
const SETID_PROMPT: &str = "=== Terminal Chat - User ID ===\nEnter a custom ID (leave empty for a random one):";
const CLOSE_INVALID: &str = "[notice] Please enter a valid number of minutes";
const CLOSE_UNSCHEDULED: &str = "[notice] No server shutdown is scheduled";

/// Drives one connection from the password prompt to disconnect.
pub struct SessionEngine {
    app: Arc<AppState>,
    handle: ConnHandle,
    raw_ip: String,
    masked_ip: String,
    region: String,
}

impl SessionEngine {
    /// Prepare an engine for a freshly accepted connection from `raw_ip`.
    pub async fn connect(app: Arc<AppState>, raw_ip: String, sink: Arc<dyn ClientSink>) -> Self {
        let region = app.geo.lookup(&raw_ip).await;
        let masked_ip = mask_ip(&raw_ip);
        let handle = ConnHandle::new(sink);
        info!("Connection {} from {} ({})", handle.id(), raw_ip, region);
        Self {
            app,
            handle,
            raw_ip,
            masked_ip,
            region,
        }
    }

    /// Run the session to completion. `frames` yields raw text frames.
    pub async fn run<S>(self, mut frames: S)
    where
        S: Stream<Item = Result<String, TransportError>> + Unpin,
    {
        let mut state = match self.reply(Envelope::password(PASSWORD_PROMPT)).await {
            Ok(()) => SessionState::AwaitingPassword,
            Err(_) => SessionState::Closed,
        };
        let mut session: Option<Session> = None;

        loop {
            state = match state {
                SessionState::AwaitingPassword => self.await_password(&mut frames).await,
                SessionState::AwaitingIdentity => match self.await_identity(&mut frames).await {
                    Some(joined) => {
                        session = Some(joined);
                        SessionState::Active
                    }
                    None => SessionState::Closed,
                },
                SessionState::Active => match session.as_mut() {
                    Some(active) => self.step(active, &mut frames).await,
                    None => SessionState::Closed,
                },
                SessionState::Closed => break,
            };
        }

        self.handle.close().await;
        debug!("Connection {} closed", self.handle.id());
    }

    async fn await_password<S>(&self, frames: &mut S) -> SessionState
    where
        S: Stream<Item = Result<String, TransportError>> + Unpin,
    {
        let frame = match next_frame(frames).await {
            Ok(frame) => frame,
            Err(e) => {
                info!("[password] {} disconnected: {}", self.raw_ip, e);
                return SessionState::Closed;
            }
        };

        let attempt = frame.content.trim().to_lowercase();
        let secret = self.app.config.chat_password.trim().to_lowercase();
        let (reply, next) = if attempt.is_empty() {
            (Envelope::password(PASSWORD_EMPTY), SessionState::AwaitingPassword)
        } else if attempt == secret {
            (Envelope::password(PASSWORD_OK), SessionState::AwaitingIdentity)
        } else {
            debug!("[password] wrong password from {}", self.raw_ip);
            (Envelope::password(PASSWORD_WRONG), SessionState::AwaitingPassword)
        };

        if self.reply(reply).await.is_err() {
            return SessionState::Closed;
        }
        if next == SessionState::AwaitingIdentity && self.reply(Envelope::set_id(SETID_PROMPT)).await.is_err() {
            return SessionState::Closed;
        }
        next
    }

    /// Read the identity frame, register and announce. `None` means closed.
    async fn await_identity<S>(&self, frames: &mut S) -> Option<Session>
    where
        S: Stream<Item = Result<String, TransportError>> + Unpin,
    {
        let frame = match next_frame(frames).await {
            Ok(frame) => frame,
            Err(e) => {
                info!("[identity] {} disconnected: {}", self.raw_ip, e);
                return None;
            }
        };

        let session = Session {
            user_id: choose_user_id(&frame.content),
            raw_ip: self.raw_ip.clone(),
            masked_ip: self.masked_ip.clone(),
            region: self.region.clone(),
            color: random_color(),
        };

        let registry = &self.app.registry;
        let online = registry.register(self.handle.clone(), session.clone()).await;
        if let Err(e) = self.reply(Envelope::welcome(&session, online)).await {
            warn!("Failed to send welcome to {}: {}", session.user_id, e);
            registry.unregister(self.handle.id()).await;
            return None;
        }

        self.app.hub.publish(Envelope::join(&session)).await;
        info!(
            target: "audit",
            "[join] {} | {} | {} ({}), online: {}",
            self.raw_ip, session.region, session.user_id, self.handle.id(), online
        );
        Some(session)
    }

    /// Handle one frame of an active session.
    async fn step<S>(&self, session: &mut Session, frames: &mut S) -> SessionState
    where
        S: Stream<Item = Result<String, TransportError>> + Unpin,
    {
        let frame = match next_frame(frames).await {
            Ok(frame) => frame,
            Err(e) => {
                debug!("{} read failed: {}", self.handle.id(), e);
                self.depart(session, LeaveReason::Abnormal).await;
                return SessionState::Closed;
            }
        };

        match Command::parse(&frame.content) {
            Command::Exit => {
                self.depart(session, LeaveReason::Voluntary).await;
                SessionState::Closed
            }
            Command::Online => {
                let snapshot = self.app.registry.snapshot().await;
                let table = Envelope::online(snapshot.iter().map(|(_, s)| s));
                self.reply_or_depart(session, table).await
            }
            Command::Help => self.reply_or_depart(session, Envelope::help()).await,
            Command::Color => {
                let color = random_color();
                session.color = color.clone();
                self.app.registry.update(self.handle.id(), |s| s.color = color).await;
                self.reply_or_depart(session, Envelope::color()).await
            }
            Command::CloseStatus => {
                let text = match self.app.scheduler.status().await {
                    ShutdownStatus::Unscheduled => CLOSE_UNSCHEDULED.to_string(),
                    ShutdownStatus::Pending { remaining_minutes } => {
                        format!("[notice] The server will shut down in {} minutes", remaining_minutes)
                    }
                };
                self.reply_or_depart(session, Envelope::system(text)).await
            }
            Command::CloseIn(minutes) => {
                info!(target: "audit", "{} ({}) scheduled shutdown in {} minutes", session.user_id, self.raw_ip, minutes);
                self.app.scheduler.schedule(minutes).await;
                SessionState::Active
            }
            Command::CloseInvalid => self.reply_or_depart(session, Envelope::system(CLOSE_INVALID)).await,
            Command::Chat(text) => {
                debug!("[chat] {}: {}", session.user_id, text);
                self.app.hub.publish(Envelope::chat(session, text)).await;
                SessionState::Active
            }
            Command::Blank => SessionState::Active,
        }
    }

    async fn reply(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.handle.send(&envelope).await
    }

    async fn reply_or_depart(&self, session: &Session, envelope: Envelope) -> SessionState {
        match self.reply(envelope).await {
            Ok(()) => SessionState::Active,
            Err(e) => {
                debug!("{} write failed: {}", self.handle.id(), e);
                self.depart(session, LeaveReason::Abnormal).await;
                SessionState::Closed
            }
        }
    }

    async fn depart(&self, session: &Session, reason: LeaveReason) {
        self.app.registry.unregister(self.handle.id()).await;
        let online = self.app.registry.count().await;
        self.app.hub.publish(Envelope::leave(session, reason)).await;
        info!(
            target: "audit",
            "[leave:{:?}] {} | {} | {} ({}), online: {}",
            reason, self.raw_ip, session.region, session.user_id, self.handle.id(), online
        );
    }
}

async fn next_frame<S>(frames: &mut S) -> Result<ClientFrame, TransportError>
where
    S: Stream<Item = Result<String, TransportError>> + Unpin,
{
    match frames.next().await {
        Some(Ok(text)) => Ok(serde_json::from_str(&text)?),
        Some(Err(e)) => Err(e),
        None => Err(TransportError::Closed),
    }
}
