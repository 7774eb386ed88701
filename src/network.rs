//! Network URL constants and per-service base URLs.

/// Default auth service base URL.
pub const DEFAULT_AUTH_URL: &str = "https://auth.giveaway.local";

/// Default giveaway service base URL.
pub const DEFAULT_API_URL: &str = "https://api.giveaway.local";

/// Default participant service base URL.
pub const DEFAULT_PARTICIPANT_URL: &str = "https://participants.giveaway.local";

/// Default live-updates WebSocket base URL. The giveaway id is appended per channel.
pub const DEFAULT_WS_URL: &str = "wss://ws.giveaway.local/ws/giveaways";

/// Base URLs of the backend microservices, fixed at client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    pub auth: String,
    pub giveaway: String,
    pub participant: String,
}

impl ServiceUrls {
    /// Normalize all URLs (no trailing slash).
    pub fn normalized(self) -> Self {
        Self {
            auth: trim(&self.auth),
            giveaway: trim(&self.giveaway),
            participant: trim(&self.participant),
        }
    }
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            auth: DEFAULT_AUTH_URL.to_string(),
            giveaway: DEFAULT_API_URL.to_string(),
            participant: DEFAULT_PARTICIPANT_URL.to_string(),
        }
    }
}

fn trim(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
