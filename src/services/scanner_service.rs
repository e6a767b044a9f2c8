use std::sync::{Arc, RwLock};
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::repositories::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::scan::{BillReading, ScanResult};
use crate::services::prompts::{
    bill_prompt, bill_response_schema, bill_validation_schema, environment_response_schema,
    environment_system_instruction, environment_validation_schema,
};
use crate::services::scan_cache::ScanCache;
use crate::utils::crypto::CryptoVault;
use crate::utils::hash::content_hash;
use crate::utils::redact::redact_sensitive_data;

const KEY_GEMINI_API: &str = "gemini_api_key";

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?\n?|```").expect("fence pattern is valid"));

static ENVIRONMENT_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&environment_validation_schema()).expect("environment schema is valid")
});

static BILL_SCHEMA: Lazy<JSONSchema> =
    Lazy::new(|| JSONSchema::compile(&bill_validation_schema()).expect("bill schema is valid"));

#[derive(Clone, Copy)]
enum ScanOperation {
    Environment,
    Bill,
}

impl ScanOperation {
    fn as_str(self) -> &'static str {
        match self {
            ScanOperation::Environment => "environment",
            ScanOperation::Bill => "bill",
        }
    }

    fn validation_schema(self) -> &'static JSONSchema {
        match self {
            ScanOperation::Environment => &ENVIRONMENT_SCHEMA,
            ScanOperation::Bill => &BILL_SCHEMA,
        }
    }
}

#[derive(Debug, Clone)]
struct ScannerConfig {
    api_key: Option<String>,
    api_base_url: String,
    model: String,
    http_timeout: StdDuration,
    cache_ttl: Duration,
}

impl ScannerConfig {
    fn from_env() -> Self {
        let api_key = std::env::var("SAVERAKS_GEMINI_API_KEY").ok();
        let api_base_url = std::env::var("SAVERAKS_GEMINI_BASE_URL")
            .ok()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());
        let model = std::env::var("SAVERAKS_GEMINI_MODEL")
            .ok()
            .unwrap_or_else(|| "gemini-3-flash-preview".to_string());

        Self {
            api_key,
            api_base_url,
            model,
            http_timeout: StdDuration::from_secs(30),
            cache_ttl: Duration::days(7),
        }
    }

    fn load(db_pool: &DbPool) -> AppResult<Self> {
        let mut config = Self::from_env();

        if config.api_key.is_none() {
            let vault = CryptoVault::from_database_path(db_pool.path())?;
            let stored =
                db_pool.with_connection(|conn| SettingsRepository::get(conn, KEY_GEMINI_API))?;

            if let Some(ciphertext) = stored {
                match vault.decrypt(&ciphertext) {
                    Ok(bytes) => match String::from_utf8(bytes) {
                        Ok(value) if !value.trim().is_empty() => {
                            config.api_key = Some(value);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(target: "app::scan", error = %err, "stored API key is not UTF-8");
                        }
                    },
                    Err(err) => {
                        warn!(target: "app::scan", error = %err, "failed to decrypt stored API key");
                    }
                }
            }
        }

        if let Some(value) = config.api_key.take() {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.api_key = Some(trimmed.to_string());
            }
        }

        Ok(config)
    }

    fn build_provider(&self) -> AppResult<Option<Arc<GeminiProvider>>> {
        match &self.api_key {
            Some(api_key) => {
                let provider = GeminiProvider::try_new(self, api_key.clone())?;
                Ok(Some(Arc::new(provider)))
            }
            None => Ok(None),
        }
    }
}

/// Vision scanner for the eco-action flows: classifies campus photos
/// into waste / grease trap / hazard, and reads electricity bills.
/// Responses are schema-validated and cached by image fingerprint.
#[derive(Clone)]
pub struct ScannerService {
    cache: ScanCache,
    provider: Arc<RwLock<Option<Arc<GeminiProvider>>>>,
    db_pool: DbPool,
}

impl ScannerService {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let config = ScannerConfig::load(&db_pool)?;
        let cache = ScanCache::new(db_pool.clone(), config.cache_ttl);
        let provider = config.build_provider()?;

        Ok(Self {
            cache,
            provider: Arc::new(RwLock::new(provider)),
            db_pool,
        })
    }

    pub fn has_api_key(&self) -> bool {
        let guard = self.provider.read().expect("provider lock poisoned");
        guard.is_some()
    }

    /// Stores the API key encrypted and swaps in a fresh provider.
    pub fn set_api_key(&self, api_key: &str) -> AppResult<()> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("API key must not be empty"));
        }

        let vault = CryptoVault::from_database_path(self.db_pool.path())?;
        let ciphertext = vault.encrypt(trimmed.as_bytes())?;
        self.db_pool
            .with_connection(|conn| SettingsRepository::upsert(conn, KEY_GEMINI_API, &ciphertext))?;

        let config = ScannerConfig::load(&self.db_pool)?;
        let provider = config.build_provider()?;
        let mut guard = self.provider.write().expect("provider lock poisoned");
        *guard = provider;
        Ok(())
    }

    pub fn clear_api_key(&self) -> AppResult<()> {
        self.db_pool
            .with_connection(|conn| SettingsRepository::delete(conn, KEY_GEMINI_API))?;
        let config = ScannerConfig::load(&self.db_pool)?;
        let provider = config.build_provider()?;
        let mut guard = self.provider.write().expect("provider lock poisoned");
        *guard = provider;
        Ok(())
    }

    pub async fn analyze_environment(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> AppResult<ScanResult> {
        let value = self
            .invoke_cached(ScanOperation::Environment, image_base64, mime_type)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn read_bill(&self, image_base64: &str, mime_type: &str) -> AppResult<BillReading> {
        let value = self
            .invoke_cached(ScanOperation::Bill, image_base64, mime_type)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn invoke_cached(
        &self,
        operation: ScanOperation,
        image_base64: &str,
        mime_type: &str,
    ) -> AppResult<JsonValue> {
        if image_base64.trim().is_empty() {
            return Err(AppError::validation("image payload must not be empty"));
        }

        let fingerprint = content_hash(image_base64.as_bytes());
        if let Some(cached) = self.cache.get(operation.as_str(), &fingerprint)? {
            return Ok(cached);
        }

        let provider = self.current_provider()?;
        let value = provider.invoke(operation, image_base64, mime_type).await?;
        self.cache.put(operation.as_str(), &fingerprint, &value)?;
        Ok(value)
    }

    fn current_provider(&self) -> AppResult<Arc<GeminiProvider>> {
        let guard = self.provider.read().expect("provider lock poisoned");
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::ai(AiErrorCode::MissingApiKey, "no scanner API key configured"))
    }
}

struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    fn try_new(config: &ScannerConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build scanner HTTP client: {err}")))?;

        let base_url = config.api_base_url.trim_end_matches('/');
        let endpoint = format!("{}/v1beta/models/{}:generateContent", base_url, config.model);

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    async fn invoke(
        &self,
        operation: ScanOperation,
        image_base64: &str,
        mime_type: &str,
    ) -> AppResult<JsonValue> {
        let correlation_id = Uuid::new_v4().to_string();
        let request_body = Self::build_request_body(operation, image_base64, mime_type);
        let sanitized = redact_sensitive_data(&request_body)
            .unwrap_or_else(|_| JsonValue::String("<redacted>".to_string()));

        let backoff_schedule = [
            StdDuration::from_secs(0),
            StdDuration::from_secs(1),
            StdDuration::from_secs(2),
            StdDuration::from_secs(4),
        ];

        let mut last_error: Option<AppError> = None;

        for (attempt, delay) in backoff_schedule.iter().enumerate() {
            if *delay > StdDuration::from_secs(0) {
                sleep(*delay).await;
            }

            debug!(
                target: "app::scan",
                operation = operation.as_str(),
                attempt = attempt + 1,
                correlation_id = %correlation_id,
                payload = %sanitized,
                "invoking scanner model"
            );

            let start = Instant::now();
            let response = self
                .client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let latency_ms = start.elapsed().as_millis();
                        debug!(
                            target: "app::scan",
                            correlation_id = %correlation_id,
                            latency_ms,
                            "scanner model responded"
                        );

                        let body: JsonValue = resp.json().await.map_err(|err| {
                            AppError::ai_with_correlation(
                                AiErrorCode::InvalidResponse,
                                format!("failed to decode scanner response: {err}"),
                                Some(correlation_id.as_str()),
                            )
                        })?;

                        return Self::extract_payload(operation, &body, &correlation_id);
                    }

                    let (error, retryable) = Self::map_http_error(status, correlation_id.as_str());
                    warn!(
                        target: "app::scan",
                        correlation_id = %correlation_id,
                        status = status.as_u16(),
                        retryable,
                        "scanner model returned non-success status"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(err) => {
                    let (error, retryable) = Self::error_from_reqwest(err, correlation_id.as_str());
                    warn!(
                        target: "app::scan",
                        correlation_id = %correlation_id,
                        retryable,
                        "scanner request failed"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::ai_with_correlation(
                AiErrorCode::Unavailable,
                "scanner request failed",
                Some(correlation_id.as_str()),
            )
        }))
    }

    fn build_request_body(
        operation: ScanOperation,
        image_base64: &str,
        mime_type: &str,
    ) -> JsonValue {
        let inline_data = json!({
            "inlineData": { "mimeType": mime_type, "data": image_base64 }
        });

        match operation {
            ScanOperation::Environment => json!({
                "contents": [{ "parts": [inline_data] }],
                "systemInstruction": {
                    "parts": [{ "text": environment_system_instruction() }]
                },
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": environment_response_schema()
                }
            }),
            ScanOperation::Bill => json!({
                "contents": [{ "parts": [inline_data, { "text": bill_prompt() }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": bill_response_schema()
                }
            }),
        }
    }

    fn extract_payload(
        operation: ScanOperation,
        body: &JsonValue,
        correlation_id: &str,
    ) -> AppResult<JsonValue> {
        let text = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::ai_with_correlation(
                    AiErrorCode::InvalidResponse,
                    "scanner response carried no text part",
                    Some(correlation_id),
                )
            })?;

        let value = Self::parse_model_text(text, correlation_id)?;
        Self::validate_payload(operation, &value, correlation_id)?;
        Ok(value)
    }

    /// Strips markdown fences the model sometimes wraps around the JSON.
    fn parse_model_text(text: &str, correlation_id: &str) -> AppResult<JsonValue> {
        let cleaned = FENCE_RE.replace_all(text, "");
        let trimmed = cleaned.trim();
        if trimmed.is_empty() || trimmed == "undefined" {
            return Err(AppError::ai_with_correlation(
                AiErrorCode::InvalidResponse,
                "scanner returned an empty payload",
                Some(correlation_id),
            ));
        }

        serde_json::from_str(trimmed).map_err(|err| {
            AppError::ai_with_correlation(
                AiErrorCode::InvalidResponse,
                format!("scanner payload is not JSON: {err}"),
                Some(correlation_id),
            )
        })
    }

    fn validate_payload(
        operation: ScanOperation,
        value: &JsonValue,
        correlation_id: &str,
    ) -> AppResult<()> {
        let schema = operation.validation_schema();
        if let Err(errors) = schema.validate(value) {
            let details: Vec<String> = errors.map(|error| error.to_string()).collect();
            return Err(AppError::ai_with_correlation(
                AiErrorCode::InvalidResponse,
                format!("scanner payload failed validation: {}", details.join("; ")),
                Some(correlation_id),
            ));
        }
        Ok(())
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> (AppError, bool) {
        match status {
            StatusCode::UNAUTHORIZED => (
                AppError::ai_with_correlation(
                    AiErrorCode::MissingApiKey,
                    "scanner API key is invalid or unauthorized",
                    Some(correlation_id),
                ),
                false,
            ),
            StatusCode::FORBIDDEN => (
                AppError::ai_with_correlation(
                    AiErrorCode::Forbidden,
                    "scanner API access is forbidden",
                    Some(correlation_id),
                ),
                false,
            ),
            StatusCode::TOO_MANY_REQUESTS => (
                AppError::ai_with_correlation(
                    AiErrorCode::RateLimited,
                    "scanner API rate limit exceeded",
                    Some(correlation_id),
                ),
                true,
            ),
            status if status.is_server_error() => (
                AppError::ai_with_correlation(
                    AiErrorCode::Unavailable,
                    format!("scanner API unavailable (status {})", status.as_u16()),
                    Some(correlation_id),
                ),
                true,
            ),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => (
                AppError::ai_with_correlation(
                    AiErrorCode::InvalidRequest,
                    format!("scanner request rejected (status {})", status.as_u16()),
                    Some(correlation_id),
                ),
                false,
            ),
            status => (
                AppError::ai_with_correlation(
                    AiErrorCode::Unknown,
                    format!("scanner API returned status {}", status.as_u16()),
                    Some(correlation_id),
                ),
                false,
            ),
        }
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> (AppError, bool) {
        if err.is_timeout() {
            (
                AppError::ai_with_correlation(
                    AiErrorCode::HttpTimeout,
                    "scanner request timed out",
                    Some(correlation_id),
                ),
                true,
            )
        } else if err.is_connect() {
            (
                AppError::ai_with_correlation(
                    AiErrorCode::Unavailable,
                    "scanner connection failed",
                    Some(correlation_id),
                ),
                true,
            )
        } else if let Some(status) = err.status() {
            Self::map_http_error(status, correlation_id)
        } else {
            (
                AppError::ai_with_correlation(
                    AiErrorCode::Unknown,
                    format!("scanner request failed: {err}"),
                    Some(correlation_id),
                ),
                false,
            )
        }
    }
}

pub mod testing {
    use super::*;

    /// Exposes scanner error mapping to integration tests without
    /// widening the public API.
    pub fn map_http_error(status: StatusCode) -> (AppError, bool) {
        GeminiProvider::map_http_error(status, "test-correlation-id")
    }

    /// Builds a full scanner backed by a mock HTTP server, so cache and
    /// validation paths are exercised end to end.
    pub fn service_with(
        db_pool: DbPool,
        base_url: &str,
        timeout: StdDuration,
    ) -> AppResult<ScannerService> {
        let config = ScannerConfig {
            api_key: Some("test-key".to_string()),
            api_base_url: base_url.trim_end_matches('/').to_string(),
            model: "gemini-3-flash-preview".to_string(),
            http_timeout: timeout,
            cache_ttl: Duration::minutes(5),
        };
        let cache = ScanCache::new(db_pool.clone(), config.cache_ttl);
        let provider = config.build_provider()?;

        Ok(ScannerService {
            cache,
            provider: Arc::new(RwLock::new(provider)),
            db_pool,
        })
    }
}
