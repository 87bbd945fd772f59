use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::collections::EndpointDescriptor;
use crate::project::{BackendError, EndpointPatch, Project, ProjectBackend};
use crate::storage::Config;
use crate::testing::{TestCase, clamp_generate_count};

/// Every backend response wraps its payload in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// [`ProjectBackend`] over the REST API.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: Url,
}

impl RestBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let base_url = Url::parse(config.api_url.trim())
            .map_err(|e| BackendError::InvalidUrl(format!("`{}`: {e}", config.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(format!("`{}` cannot be a base URL", config.api_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| BackendError::InvalidHeader(format!("bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, BackendError> {
        debug!("{method} {url}");
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{method} {url} -> {} in {}ms", status.as_u16(), started.elapsed().as_millis());

        decode(status.as_u16(), &text)
    }
}

/// Turns a raw response into its payload, or the backend's error.
fn decode<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, BackendError> {
    if !(200..300).contains(&status) {
        let message = error_message(text);
        warn!("backend error {status}: {message}");
        return Err(BackendError::Status { status, message });
    }
    let envelope: Envelope<T> = serde_json::from_str(text)?;
    Ok(envelope.data)
}

/// Prefers the backend's `message`/`error` field over the raw body.
fn error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| text.trim().to_string())
}

#[async_trait]
impl ProjectBackend for RestBackend {
    async fn get_project(&self, project_id: &str) -> Result<Project, BackendError> {
        let url = self.url(&["projects", project_id]);
        self.call(Method::GET, url, None).await
    }

    async fn update_endpoint(
        &self,
        project_id: &str,
        endpoint_id: &str,
        patch: &EndpointPatch,
    ) -> Result<EndpointDescriptor, BackendError> {
        let url = self.url(&["projects", project_id, "endpoints", endpoint_id]);
        self.call(Method::PUT, url, Some(serde_json::to_value(patch)?)).await
    }

    async fn generate_test_cases(&self, project_id: &str, count: u32) -> Result<Vec<TestCase>, BackendError> {
        let url = self.url(&["projects", project_id, "ai", "generate-test-cases"]);
        let body = json!({ "count": clamp_generate_count(count) });
        self.call(Method::POST, url, Some(body)).await
    }

    async fn delete_test_case(&self, project_id: &str, case_id: &str) -> Result<(), BackendError> {
        let url = self.url(&["projects", project_id, "test-cases", case_id]);
        self.call::<serde_json::Value>(Method::DELETE, url, None)
            .await
            .map(|_| ())
            .or_else(ignore_empty_body)
    }

    async fn delete_endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<(), BackendError> {
        let url = self.url(&["projects", project_id, "endpoints", endpoint_id]);
        self.call::<serde_json::Value>(Method::DELETE, url, None)
            .await
            .map(|_| ())
            .or_else(ignore_empty_body)
    }
}

/// Deletes may answer 2xx without an envelope; only status errors count.
fn ignore_empty_body(err: BackendError) -> Result<(), BackendError> {
    match err {
        BackendError::Parse(_) => Ok(()),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(api_url: &str) -> RestBackend {
        RestBackend::new(&Config {
            api_url: api_url.into(),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn builds_urls_under_base_path() {
        let rest = backend("http://localhost:5000/api");
        assert_eq!(
            rest.url(&["projects", "p1", "endpoints", "e1"]).as_str(),
            "http://localhost:5000/api/projects/p1/endpoints/e1"
        );

        let rest = backend("http://localhost:5000/api/");
        assert_eq!(rest.url(&["projects", "p1"]).as_str(), "http://localhost:5000/api/projects/p1");
    }

    #[test]
    fn encodes_ids_as_single_segments() {
        let rest = backend("https://host/api");
        assert_eq!(
            rest.url(&["projects", "a/b c"]).as_str(),
            "https://host/api/projects/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = RestBackend::new(&Config {
            api_url: "not a url".into(),
            ..Config::default()
        });
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));

        let result = RestBackend::new(&Config {
            api_url: "mailto:someone@example.com".into(),
            ..Config::default()
        });
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn decodes_envelope() {
        let cases: Vec<TestCase> = decode(
            201,
            r#"{"data":[{"id":"t1","name":"n","endpointId":"e1","status":"pending","createdAt":"2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, "t1");
    }

    #[test]
    fn status_errors_carry_backend_message() {
        let err = decode::<serde_json::Value>(404, r#"{"success":false,"message":"Project not found"}"#).unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Project not found");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = decode::<serde_json::Value>(502, " Bad Gateway \n").unwrap_err();
        assert_eq!(err.to_string(), "Backend returned 502: Bad Gateway");
    }

    #[test]
    fn malformed_success_body_is_parse_error() {
        let err = decode::<Project>(200, "<html>").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
        assert!(ignore_empty_body(err).is_ok());
        assert!(ignore_empty_body(BackendError::Status { status: 500, message: String::new() }).is_err());
    }
}
