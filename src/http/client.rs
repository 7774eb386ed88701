//! Low-level HTTP client: `GiveawayHttp`.
//!
//! One method per backend endpoint, spread across the auth, giveaway and
//! participant services. Returns wire types; conversion to domain types
//! happens in the sub-clients.

use crate::auth::{LoginRequest, LoginResponse, MeResponse, SessionStore};
use crate::domain::giveaway::wire::{
    ActiveGiveawayResponse, CreateGiveawayRequest, FinishMessagesRequest, FinishResponse,
    GiveawayResponse,
};
use crate::domain::participant::wire::{ParticipantCountResponse, ParticipantsResponse};
use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::network::ServiceUrls;
use crate::shared::{AccountId, GiveawayId};

use async_lock::RwLock;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Low-level HTTP client for the giveaway backend.
pub struct GiveawayHttp {
    urls: ServiceUrls,
    client: Client,
    /// Bearer token. NEVER exposed publicly.
    auth_token: Arc<RwLock<Option<String>>>,
}

impl GiveawayHttp {
    pub fn new(urls: ServiceUrls) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            urls: urls.normalized(),
            client,
            auth_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    pub(crate) async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    pub(crate) async fn clear_auth_token(&self) {
        *self.auth_token.write().await = None;
    }

    pub(crate) async fn has_auth_token(&self) -> bool {
        self.auth_token.read().await.is_some()
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, HttpError> {
        let url = format!("{}/api/v1/auth/login", self.urls.auth);
        self.post(&url, request, RetryPolicy::None).await
    }

    pub async fn me(&self) -> Result<MeResponse, HttpError> {
        let url = format!("{}/api/v1/auth/me", self.urls.auth);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn logout(&self) -> Result<serde_json::Value, HttpError> {
        let url = format!("{}/api/v1/auth/logout", self.urls.auth);
        self.post(&url, &serde_json::json!({}), RetryPolicy::None)
            .await
    }

    // ── Giveaways ────────────────────────────────────────────────────────

    /// The account's active giveaway. A 404 means there is none.
    pub async fn get_active_giveaway(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<GiveawayResponse>, HttpError> {
        let url = format!(
            "{}/api/v1/giveaways/active?account_id={}",
            self.urls.giveaway,
            urlencoding::encode(account_id.as_str())
        );
        match self
            .get::<ActiveGiveawayResponse>(&url, RetryPolicy::Idempotent)
            .await
        {
            Ok(resp) => Ok(resp.giveaway),
            Err(HttpError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_giveaway(&self, giveaway_id: &GiveawayId) -> Result<GiveawayResponse, HttpError> {
        let url = format!(
            "{}/api/v1/giveaways/{}",
            self.urls.giveaway,
            urlencoding::encode(giveaway_id.as_str())
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn create_giveaway(
        &self,
        request: &CreateGiveawayRequest,
    ) -> Result<GiveawayResponse, HttpError> {
        let url = format!("{}/api/v1/giveaways", self.urls.giveaway);
        self.post(&url, request, RetryPolicy::None).await
    }

    pub async fn put_finish_messages(
        &self,
        giveaway_id: &GiveawayId,
        request: &FinishMessagesRequest,
    ) -> Result<serde_json::Value, HttpError> {
        let url = format!(
            "{}/api/v1/giveaways/{}/messages",
            self.urls.giveaway,
            urlencoding::encode(giveaway_id.as_str())
        );
        self.put(&url, request, RetryPolicy::None).await
    }

    pub async fn finish_giveaway(&self, giveaway_id: &GiveawayId) -> Result<FinishResponse, HttpError> {
        let url = format!(
            "{}/api/v1/giveaways/{}/finish",
            self.urls.giveaway,
            urlencoding::encode(giveaway_id.as_str())
        );
        self.post(&url, &serde_json::json!({}), RetryPolicy::None)
            .await
    }

    // ── Participants ─────────────────────────────────────────────────────

    pub async fn get_participants(
        &self,
        giveaway_id: &GiveawayId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ParticipantsResponse, HttpError> {
        let mut url = format!(
            "{}/api/v1/participants?giveaway_id={}",
            self.urls.participant,
            urlencoding::encode(giveaway_id.as_str())
        );
        if let Some(p) = page {
            url = format!("{}&page={}", url, p);
        }
        if let Some(l) = limit {
            url = format!("{}&limit={}", url, l);
        }
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn get_participant_count(
        &self,
        giveaway_id: &GiveawayId,
    ) -> Result<ParticipantCountResponse, HttpError> {
        let url = format!(
            "{}/api/v1/participants/count?giveaway_id={}",
            self.urls.participant,
            urlencoding::encode(giveaway_id.as_str())
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), retry)
            .await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::PUT, url, Some(body), retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(&method, url, body).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => config.is_retryable_status(*status),
                        HttpError::RateLimited { retry_after_ms } => {
                            if let Some(ms) = retry_after_ms {
                                futures_timer::Delay::new(Duration::from_millis(*ms)).await;
                            }
                            config.is_retryable_status(429)
                        }
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => re.is_connect() || re.is_timeout() || re.is_request(),
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);

        if let Some(token) = self.auth_token.read().await.as_ref() {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let retry_after_ms = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        Err(classify_status(status_code, body_text, retry_after_ms))
    }
}

fn classify_status(status: u16, body: String, retry_after_ms: Option<u64>) -> HttpError {
    match status {
        401 => HttpError::Unauthorized,
        404 => HttpError::NotFound(body),
        408 => HttpError::Timeout,
        429 => HttpError::RateLimited { retry_after_ms },
        400..=499 => HttpError::BadRequest(body),
        _ => HttpError::ServerError { status, body },
    }
}

impl Clone for GiveawayHttp {
    fn clone(&self) -> Self {
        Self {
            urls: self.urls.clone(),
            client: self.client.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

impl SessionStore for GiveawayHttp {
    fn bearer_token(&self) -> BoxFuture<'_, Option<String>> {
        async move { self.auth_token.read().await.clone() }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(401, String::new(), None), HttpError::Unauthorized));
        assert!(matches!(
            classify_status(404, "missing".into(), None),
            HttpError::NotFound(body) if body == "missing"
        ));
        assert!(matches!(
            classify_status(429, String::new(), Some(2000)),
            HttpError::RateLimited { retry_after_ms: Some(2000) }
        ));
        assert!(matches!(classify_status(422, "bad".into(), None), HttpError::BadRequest(_)));
        assert!(matches!(
            classify_status(503, String::new(), None),
            HttpError::ServerError { status: 503, .. }
        ));
    }

    #[test]
    fn test_new_normalizes_urls() {
        let http = GiveawayHttp::new(ServiceUrls {
            auth: "https://auth.test/".into(),
            giveaway: "https://api.test//".into(),
            participant: "https://p.test".into(),
        })
        .unwrap();
        assert_eq!(http.urls().auth, "https://auth.test");
        assert_eq!(http.urls().giveaway, "https://api.test");
    }

    #[tokio::test]
    async fn test_session_store_reflects_token() {
        let http = GiveawayHttp::new(ServiceUrls::default()).unwrap();
        assert!(http.bearer_token().await.is_none());

        http.set_auth_token(Some("tok".into())).await;
        assert!(http.has_auth_token().await);
        assert_eq!(http.bearer_token().await.as_deref(), Some("tok"));

        http.clear_auth_token().await;
        assert!(http.bearer_token().await.is_none());
    }
}
