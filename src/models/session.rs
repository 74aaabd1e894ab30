/// Identity of an authenticated connection, as held in the registry.
///
/// The registry pairs it with the connection's handle. Its `SessionState`
/// lives in the engine loop; a registered session is always `Active`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub raw_ip: String,
    pub masked_ip: String,
    pub region: String,
    pub color: String,
}

/// Lifecycle of one connection's session engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPassword,
    AwaitingIdentity,
    Active,
    Closed,
}
