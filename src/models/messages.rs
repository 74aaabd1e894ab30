use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::models::Session;

/// Kind tag carried in the `type` field of every outbound envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Password,
    SetId,
    Welcome,
    Join,
    Leave,
    Online,
    Help,
    Color,
    System,
    Chat,
}

/// Why a session left the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    Voluntary,
    Abnormal,
}

/// One server-to-client message.
///
/// Fields are private; an envelope can only be built through the per-kind
/// constructors below and is never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: MessageKind,
    content: String,
    user_id: String,
    ip: String,
    region: String,
    time: String,
    color: String,
}

/// Inbound frame. Clients send `{"type": "...", "content": "..."}` but only
/// the content is meaningful.
#[derive(Deserialize, Debug, Default)]
pub struct ClientFrame {
    #[serde(default)]
    pub content: String,
}

pub const HELP_TEXT: &str = "=== Terminal Chat - Commands ===\n\
/online        - list online users (IP | region | user ID)\n\
/help          - show this help\n\
/exit, /quit   - leave the chat room\n\
/color         - pick a new random color for your messages\n\
/close [mins]  - show or set the server shutdown time\n\
anything else  - send a message to everyone online";

fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl Envelope {
    fn private(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            user_id: String::new(),
            ip: String::new(),
            region: String::new(),
            time: now(),
            color: String::new(),
        }
    }

    fn from_session(kind: MessageKind, content: String, session: &Session) -> Self {
        Self {
            kind,
            content,
            user_id: session.user_id.clone(),
            ip: session.masked_ip.clone(),
            region: session.region.clone(),
            time: now(),
            color: session.color.clone(),
        }
    }

    pub fn password(content: impl Into<String>) -> Self {
        Self::private(MessageKind::Password, content)
    }

    pub fn set_id(content: impl Into<String>) -> Self {
        Self::private(MessageKind::SetId, content)
    }

    pub fn welcome(session: &Session, online: usize) -> Self {
        Self::private(
            MessageKind::Welcome,
            format!(
                "=== Terminal Chat v2.0 ===\nLogged in! Online now: {}\nYou are: {} | {} | {}\nType /help for the command list",
                online, session.masked_ip, session.region, session.user_id
            ),
        )
    }

    pub fn join(session: &Session) -> Self {
        let content = format!(
            "[system] {} | {} | {} joined the chat room",
            session.masked_ip, session.region, session.user_id
        );
        Self::from_session(MessageKind::Join, content, session)
    }

    pub fn leave(session: &Session, reason: LeaveReason) -> Self {
        let how = match reason {
            LeaveReason::Voluntary => "left the chat room",
            LeaveReason::Abnormal => "left the chat room unexpectedly",
        };
        let content = format!(
            "[system] {} | {} | {} {}",
            session.masked_ip, session.region, session.user_id, how
        );
        Self::from_session(MessageKind::Leave, content, session)
    }

    /// Online table, one row per session in registration order.
    pub fn online<'a>(sessions: impl ExactSizeIterator<Item = &'a Session>) -> Self {
        let mut table = format!(
            "=== Online users ({}) ===\nIP address      | Region                       | User ID\n----------------|------------------------------|------------------------\n",
            sessions.len()
        );
        for s in sessions {
            table.push_str(&format!("{:<15} | {:<28} | {}\n", s.masked_ip, s.region, s.user_id));
        }
        Self::private(MessageKind::Online, table)
    }

    pub fn help() -> Self {
        Self::private(MessageKind::Help, HELP_TEXT)
    }

    pub fn color() -> Self {
        Self::private(MessageKind::Color, "Your color has changed!")
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::private(MessageKind::System, content)
    }

    pub fn chat(session: &Session, content: impl Into<String>) -> Self {
        Self::from_session(MessageKind::Chat, content.into(), session)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn color_code(&self) -> &str {
        &self.color
    }
}
