use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ProviderErrorCode};
use crate::models::claim::ApiSnapshot;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1/dashboard";
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub http_timeout: StdDuration,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("CLAIMBOARD_API_BASE_URL")
            .ok()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("CLAIMBOARD_API_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            base_url,
            token,
            http_timeout: StdDuration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }

    pub fn build_provider(&self) -> AppResult<Option<ClaimsProvider>> {
        match &self.token {
            Some(token) => {
                let provider = ClaimsProvider::try_new(self, token.clone())?;
                Ok(Some(provider))
            }
            None => Ok(None),
        }
    }
}

/// The one outbound call the dashboard depends on. A trait seam so the
/// orchestrator can run against stubs in tests.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_snapshot(&self) -> AppResult<ApiSnapshot>;
}

pub struct ClaimsProvider {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ClaimsProvider {
    pub fn try_new(config: &ProviderConfig, token: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("初始化数据源 HTTP 客户端失败: {err}")))?;

        let endpoint = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn from_env() -> AppResult<Self> {
        ProviderConfig::from_env().build_provider()?.ok_or_else(|| {
            AppError::provider(ProviderErrorCode::MissingToken, "数据源访问令牌未配置")
        })
    }

    async fn fetch_snapshot_inner(&self) -> AppResult<ApiSnapshot> {
        let correlation_id = Uuid::new_v4().to_string();
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
                target: "app::provider",
                attempt = attempt + 1,
                correlation_id = %correlation_id,
                endpoint = %self.endpoint,
                "fetching claims snapshot"
            );

            let start = Instant::now();
            let response = self
                .client
                .get(&self.endpoint)
                .header(AUTHORIZATION, format!("Token {}", self.token))
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let latency_ms = start.elapsed().as_millis();

                        let snapshot: ApiSnapshot = resp.json().await.map_err(|err| {
                            AppError::provider_with_details(
                                ProviderErrorCode::InvalidResponse,
                                "解析数据源响应失败",
                                Some(correlation_id.as_str()),
                                Some(json!({ "reason": err.to_string() })),
                            )
                        })?;

                        debug!(
                            target: "app::provider",
                            correlation_id = %correlation_id,
                            latency_ms,
                            claims = snapshot.claims.len(),
                            categories = snapshot.categories.len(),
                            users = snapshot.users.len(),
                            departments = snapshot.departments.len(),
                            "claims snapshot decoded"
                        );

                        return Ok(snapshot);
                    }

                    let (error, retryable) = Self::map_http_error(status, correlation_id.as_str());
                    warn!(
                        target: "app::provider",
                        correlation_id = %correlation_id,
                        status = status.as_u16(),
                        retryable,
                        "claims provider returned non-success status"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                    continue;
                }
                Err(err) => {
                    let (error, retryable) =
                        Self::error_from_reqwest(err, correlation_id.as_str());
                    warn!(
                        target: "app::provider",
                        correlation_id = %correlation_id,
                        retryable,
                        "claims provider request error"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::provider(ProviderErrorCode::Unknown, "数据源请求失败")))
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> (AppError, bool) {
        match status {
            StatusCode::UNAUTHORIZED => (
                AppError::provider_with_details(
                    ProviderErrorCode::Unauthorized,
                    "数据源访问令牌无效或未授权",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            StatusCode::FORBIDDEN => (
                AppError::provider_with_details(
                    ProviderErrorCode::Forbidden,
                    "数据源拒绝访问",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            StatusCode::NOT_FOUND => (
                AppError::provider_with_details(
                    ProviderErrorCode::InvalidRequest,
                    "数据源接口地址无效",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            StatusCode::TOO_MANY_REQUESTS => (
                AppError::provider_with_details(
                    ProviderErrorCode::RateLimited,
                    "数据源请求过于频繁，请稍后重试",
                    Some(correlation_id),
                    None,
                ),
                true,
            ),
            StatusCode::BAD_REQUEST => (
                AppError::provider_with_details(
                    ProviderErrorCode::InvalidRequest,
                    "数据源请求格式无效",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            status if status.is_server_error() => (
                AppError::provider_with_details(
                    ProviderErrorCode::Unavailable,
                    format!("数据源服务暂时不可用 (状态码 {})", status.as_u16()),
                    Some(correlation_id),
                    None,
                ),
                true,
            ),
            status => (
                AppError::provider_with_details(
                    ProviderErrorCode::Unknown,
                    format!("数据源返回意外状态码 {}", status.as_u16()),
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
        }
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> (AppError, bool) {
        if err.is_timeout() {
            return (
                AppError::provider_with_details(
                    ProviderErrorCode::HttpTimeout,
                    "数据源请求超时",
                    Some(correlation_id),
                    None,
                ),
                true,
            );
        }

        if err.is_connect() {
            return (
                AppError::provider_with_details(
                    ProviderErrorCode::Unavailable,
                    "无法连接数据源",
                    Some(correlation_id),
                    None,
                ),
                true,
            );
        }

        (
            AppError::provider_with_details(
                ProviderErrorCode::Unknown,
                format!("数据源请求失败: {err}"),
                Some(correlation_id),
                None,
            ),
            false,
        )
    }
}

#[async_trait]
impl SnapshotProvider for ClaimsProvider {
    async fn fetch_snapshot(&self) -> AppResult<ApiSnapshot> {
        self.fetch_snapshot_inner().await
    }
}

pub mod testing {
    use super::*;

    /// Expose the status mapping for integration tests without widening
    /// the public API surface.
    pub fn map_http_error(status: StatusCode) -> (AppError, bool) {
        ClaimsProvider::map_http_error(status, "test-correlation-id")
    }

    pub async fn fetch_snapshot_via_http(
        base_url: &str,
        timeout: StdDuration,
    ) -> AppResult<ApiSnapshot> {
        let config = ProviderConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Some("test-token".to_string()),
            http_timeout: timeout,
        };
        let provider = ClaimsProvider::try_new(&config, "test-token".to_string())?;
        provider.fetch_snapshot().await
    }
}
