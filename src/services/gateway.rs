use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, GatewayErrorCode};
use crate::models::stats::{LeaderboardEntry, SchoolStats};
use crate::models::user::User;

/// The spreadsheet gateway only accepts text/plain bodies; anything else
/// triggers a CORS preflight it cannot answer.
const GATEWAY_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Fragments of the backend script's own source that leak into the
/// response body when the spreadsheet is not provisioned.
const MISCONFIGURATION_MARKERS: [&str; 2] = ["getDataRange", "Users"];

/// Tagged request envelope. The remote dispatches on the `action` field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action")]
pub enum Envelope {
    #[serde(rename = "LOGIN", rename_all = "camelCase")]
    Login { school_id: String },
    #[serde(rename = "REGISTER", rename_all = "camelCase")]
    Register { name: String, school_id: String },
    #[serde(rename = "LOG_ACTIVITY", rename_all = "camelCase")]
    LogActivity {
        user_id: String,
        category: String,
        label: String,
        points: i64,
        file_base64: Option<String>,
        mime_type: String,
        /// Stringified JSON, "{}" when there is no structured payload.
        ai_data: String,
    },
    #[serde(rename = "GET_LEADERBOARD")]
    GetLeaderboard,
    #[serde(rename = "GET_ADMIN_STATS")]
    GetAdminStats,
}

impl Envelope {
    fn action(&self) -> &'static str {
        match self {
            Envelope::Login { .. } => "LOGIN",
            Envelope::Register { .. } => "REGISTER",
            Envelope::LogActivity { .. } => "LOG_ACTIVITY",
            Envelope::GetLeaderboard => "GET_LEADERBOARD",
            Envelope::GetAdminStats => "GET_ADMIN_STATS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub endpoint: Option<String>,
    pub http_timeout: Duration,
    pub breaker_cooldown: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            http_timeout: Duration::from_secs(15),
            breaker_cooldown: Duration::from_secs(60),
        }
    }
}

impl GatewayOptions {
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("SAVERAKS_GATEWAY_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed,
    Open { tripped_at: Instant },
}

/// HTTP client for the remote activity gateway. Transport failures trip
/// a time-boxed breaker; while it is open, calls fail fast and callers
/// run their local fallbacks. The breaker re-closes on its own after
/// the cooldown, so one outage never disables the remote for the rest
/// of the session.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: Option<String>,
    breaker_cooldown: Duration,
    breaker: Arc<RwLock<BreakerState>>,
}

impl GatewayClient {
    pub fn new(options: GatewayOptions) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.http_timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|err| AppError::other(format!("failed to build gateway HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: options.endpoint,
            breaker_cooldown: options.breaker_cooldown,
            breaker: Arc::new(RwLock::new(BreakerState::Closed)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn login(&self, school_id: &str) -> AppResult<User> {
        let body = self
            .call(&Envelope::Login {
                school_id: school_id.to_string(),
            })
            .await?;
        Self::extract_user(body)
    }

    pub async fn register(&self, name: &str, school_id: &str) -> AppResult<User> {
        let body = self
            .call(&Envelope::Register {
                name: name.to_string(),
                school_id: school_id.to_string(),
            })
            .await?;
        Self::extract_user(body)
    }

    /// Returns the authoritative running total after the remote recorded
    /// the activity, or None when the remote answered without one.
    pub async fn log_activity(&self, envelope: &Envelope) -> AppResult<Option<i64>> {
        let body = self.call(envelope).await?;
        Ok(body.get("newTotalPoints").and_then(JsonValue::as_i64))
    }

    pub async fn leaderboard(&self) -> AppResult<Vec<LeaderboardEntry>> {
        let body = self.call(&Envelope::GetLeaderboard).await?;
        let leaders = body
            .get("leaders")
            .cloned()
            .ok_or_else(|| {
                AppError::gateway(
                    GatewayErrorCode::MalformedResponse,
                    "leaderboard response missing leaders array",
                )
            })?;
        Ok(serde_json::from_value(leaders)?)
    }

    pub async fn school_stats(&self) -> AppResult<SchoolStats> {
        let body = self.call(&Envelope::GetAdminStats).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn call(&self, envelope: &Envelope) -> AppResult<JsonValue> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            AppError::gateway(
                GatewayErrorCode::MissingEndpoint,
                "gateway endpoint is not configured",
            )
        })?;

        self.check_breaker()?;

        debug!(
            target: "app::gateway",
            action = envelope.action(),
            "dispatching gateway call"
        );

        let body = serde_json::to_string(envelope)?;
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, GATEWAY_CONTENT_TYPE)
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                self.trip_breaker();
                let code = if err.is_timeout() {
                    GatewayErrorCode::Timeout
                } else {
                    GatewayErrorCode::Network
                };
                return Err(AppError::gateway(code, format!("gateway request failed: {err}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.trip_breaker();
            return Err(AppError::gateway(
                GatewayErrorCode::RemoteError,
                format!("gateway returned status {}", status.as_u16()),
            ));
        }

        let text = response.text().await.map_err(|err| {
            self.trip_breaker();
            AppError::gateway(
                GatewayErrorCode::Network,
                format!("failed to read gateway response: {err}"),
            )
        })?;

        // The backend script emits these instead of JSON when its data
        // sheet is missing.
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "undefined" {
            self.trip_breaker();
            return Err(AppError::gateway(
                GatewayErrorCode::EmptyResponse,
                "gateway returned an empty body",
            ));
        }

        let parsed: JsonValue = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(err) => {
                if MISCONFIGURATION_MARKERS
                    .iter()
                    .all(|marker| trimmed.contains(marker))
                {
                    self.trip_breaker();
                    return Err(AppError::gateway(
                        GatewayErrorCode::Misconfigured,
                        "gateway backend is not provisioned",
                    ));
                }
                return Err(AppError::gateway(
                    GatewayErrorCode::MalformedResponse,
                    format!("gateway returned invalid JSON: {err}"),
                ));
            }
        };

        if parsed.get("status").and_then(JsonValue::as_str) == Some("error") {
            let message = parsed
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or("remote reported an error");
            return Err(AppError::gateway(GatewayErrorCode::RemoteError, message));
        }

        self.reset_breaker();
        Ok(parsed)
    }

    fn check_breaker(&self) -> AppResult<()> {
        let mut guard = self.breaker.write().expect("breaker lock poisoned");
        match *guard {
            BreakerState::Closed => Ok(()),
            BreakerState::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.breaker_cooldown {
                    *guard = BreakerState::Closed;
                    debug!(target: "app::gateway", "breaker cooldown elapsed, retrying remote");
                    Ok(())
                } else {
                    Err(AppError::gateway(
                        GatewayErrorCode::BreakerOpen,
                        "gateway breaker is open, using local fallback",
                    ))
                }
            }
        }
    }

    fn trip_breaker(&self) {
        let mut guard = self.breaker.write().expect("breaker lock poisoned");
        if matches!(*guard, BreakerState::Closed) {
            warn!(
                target: "app::gateway",
                cooldown_secs = self.breaker_cooldown.as_secs(),
                "gateway unreachable, opening breaker"
            );
        }
        *guard = BreakerState::Open {
            tripped_at: Instant::now(),
        };
    }

    fn reset_breaker(&self) {
        let mut guard = self.breaker.write().expect("breaker lock poisoned");
        *guard = BreakerState::Closed;
    }

    fn extract_user(body: JsonValue) -> AppResult<User> {
        let user = body.get("user").cloned().ok_or_else(|| {
            AppError::gateway(
                GatewayErrorCode::MalformedResponse,
                "auth response missing user record",
            )
        })?;
        if user.is_null() {
            return Err(AppError::gateway(
                GatewayErrorCode::MalformedResponse,
                "auth response carried a null user",
            ));
        }
        let user: User = serde_json::from_value(user)?;
        Ok(user.with_derived())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_screaming_action_tags() {
        let envelope = Envelope::Login {
            school_id: "SM-2024-889".into(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["action"], "LOGIN");
        assert_eq!(json["schoolId"], "SM-2024-889");
    }

    #[test]
    fn log_activity_envelope_uses_camel_case_fields() {
        let envelope = Envelope::LogActivity {
            user_id: "u1".into(),
            category: "commute".into(),
            label: "Travel by bicycle".into(),
            points: 15,
            file_base64: None,
            mime_type: "image/jpeg".into(),
            ai_data: "{}".into(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["action"], "LOG_ACTIVITY");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["mimeType"], "image/jpeg");
        assert!(json["fileBase64"].is_null());
    }
}
