/// Session lifecycle notifications published by the token store.
///
/// Navigation (e.g. returning to a login screen) is the subscriber's job;
/// the gateway only reports what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A token was stored (first login or rotation)
    SignedIn,
    /// The token was cleared locally (logout)
    SignedOut,
    /// The backend rejected the token and the session was torn down
    Rejected { status: u16, path: String },
}

impl SessionEvent {
    /// True when the session ended without the user asking for it
    pub fn is_rejection(&self) -> bool {
        matches!(self, SessionEvent::Rejected { .. })
    }
}
