use crate::analysis::normalize;
use crate::commands::settings::ComparisonSettings;
use crate::models::version::Version;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("API Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

/// Query parameters; pairs with an empty value are not sent.
pub type Query<'a> = [(&'a str, String)];

/// Client for the analytics backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(ApiError::InvalidUrl(base.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("uxlens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base: base.to_string(),
        })
    }

    pub fn from_settings(settings: &ComparisonSettings) -> Result<Self, ApiError> {
        Self::new(&settings.api_base_url, settings.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn endpoint_url(&self, endpoint: &str, query: &Query<'_>) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base, endpoint);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let pairs: Vec<(&str, &str)> = query
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint, query)?;
        log::debug!("{method} {url}");

        let mut builder = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            log::error!("Request to {} failed: {}", url, e);
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                log::warn!("API 404 for {url}");
            } else {
                log::error!("API error {} for {url}: {body}", status.as_u16());
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn get(&self, endpoint: &str, query: &Query<'_>) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, query, None).await
    }

    pub async fn get_versions(&self) -> Result<Vec<Version>, ApiError> {
        let data = self.get("/versions/", &[]).await?;
        Ok(normalize::versions(&data))
    }

    pub async fn get_dashboard(&self) -> Result<Value, ApiError> {
        self.get("/dashboard/", &[]).await
    }

    /// Without both ids the server picks its own default pair.
    pub async fn get_compare(&self, v1: Option<i64>, v2: Option<i64>) -> Result<Value, ApiError> {
        let query = [
            ("v1", v1.map(|id| id.to_string()).unwrap_or_default()),
            ("v2", v2.map(|id| id.to_string()).unwrap_or_default()),
        ];
        self.get("/compare/", &query).await
    }

    pub async fn get_issues(&self, params: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/issues/", params).await
    }

    pub async fn get_daily_stats(&self, version: i64) -> Result<Vec<Value>, ApiError> {
        let data = self.get("/daily-stats/", &[("version", version.to_string())]).await?;
        Ok(normalize::list_payload(&data, &["series"]).to_vec())
    }

    pub async fn get_cohorts(&self, version: i64) -> Result<Vec<Value>, ApiError> {
        let data = self.get("/cohorts/", &[("version", version.to_string())]).await?;
        Ok(normalize::list_payload(&data, &["results"]).to_vec())
    }

    pub async fn get_pages(&self, params: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/pages/", params).await
    }

    pub async fn get_paths(&self, params: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/paths/", params).await
    }

    pub async fn get_issue_history(&self, params: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/issue-history/", params).await
    }

    pub async fn get_funnels(&self, version: i64) -> Result<Vec<Value>, ApiError> {
        let data = self.get("/funnels/", &[("version", version.to_string())]).await?;
        Ok(normalize::list_payload(&data, &["results"]).to_vec())
    }

    pub async fn get_funnel_detail(&self, funnel_id: i64) -> Result<Value, ApiError> {
        let data = self.get(&format!("/funnels/{funnel_id}/"), &[]).await?;
        Ok(normalize::unwrap_envelope(&data, "funnel").clone())
    }

    /// `None` while the server has not computed the per-cohort breakdown yet.
    pub async fn get_funnel_by_cohorts(&self, funnel_id: i64) -> Result<Option<Value>, ApiError> {
        match self.get(&format!("/funnels/{funnel_id}/by-cohorts/"), &[]).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create_funnel(&self, funnel: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, "/funnels/", &[], Some(funnel)).await
    }

    pub async fn get_goals(&self) -> Result<Vec<Value>, ApiError> {
        let data = match self.get("/goals/", &[]).await {
            Ok(data) => data,
            Err(err) => {
                log::warn!("/goals/ failed, trying /api/goals/: {}", err);
                self.get("/api/goals/", &[]).await?
            }
        };
        Ok(normalize::list_payload(&data, &["goals", "results"]).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000/api/", Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn builds_endpoint_urls_with_non_empty_query_pairs() {
        let api = client();
        assert_eq!(api.base_url(), "http://localhost:8000/api");

        let url = api
            .endpoint_url("/compare/", &[("v1", "3".to_string()), ("v2", String::new())])
            .expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/compare/?v1=3");

        let bare = api.endpoint_url("/versions/", &[]).expect("url");
        assert_eq!(bare.as_str(), "http://localhost:8000/api/versions/");
    }

    #[test]
    fn rejects_non_http_base_urls() {
        let err = ApiClient::new("file:///tmp/api", Duration::from_secs(5)).expect_err("invalid");
        assert!(matches!(err, ApiError::InvalidUrl(_)));
        assert!(ApiClient::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn status_errors_render_like_the_dashboard_expects() {
        let err = ApiError::Status {
            status: 404,
            body: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "API Error 404: Not found");
        assert!(err.is_not_found());
        assert!(!ApiError::Transport("refused".to_string()).is_not_found());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(2)).expect("client");
        let err = api.get_versions().await.expect_err("no server");
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
