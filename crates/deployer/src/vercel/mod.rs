// Vercel deployments API client (v13)

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use sitedrop_core::{CreateDeployment, ProviderConfig, ProviderResponse};
use std::time::Duration;

use crate::{HostingProvider, ProviderError};

/// Vercel API client
///
/// Tokens are supplied per call since each request may carry its own.
#[derive(Debug, Clone)]
pub struct VercelClient {
    client: reqwest::Client,
    base: Url,
    domain: String,
    create_timeout: Duration,
    poll_timeout: Duration,
}

impl VercelClient {
    /// Create new Vercel API client
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base = Url::parse(config.api_base.trim())
            .map_err(|e| ProviderError::InvalidBaseUrl(format!("{}: {}", config.api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(ProviderError::InvalidBaseUrl(config.api_base.clone()));
        }

        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base,
            domain: config.domain.clone(),
            create_timeout: config.create_timeout(),
            poll_timeout: config.poll_timeout(),
        })
    }

    /// Build an endpoint URL under the API base, escaping each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl HostingProvider for VercelClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn create_deployment(
        &self,
        token: &str,
        payload: &CreateDeployment,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = self.endpoint(&["v13", "deployments"]);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .timeout(self.create_timeout)
            .json(payload)
            .send()
            .await?;

        read_response(response).await
    }

    async fn get_deployment(&self, token: &str, id: &str) -> Result<ProviderResponse, ProviderError> {
        let url = self.endpoint(&["v13", "deployments", id]);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.poll_timeout)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Turn a provider response into JSON, or an error carrying its body
async fn read_response(response: reqwest::Response) -> Result<ProviderResponse, ProviderError> {
    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        let body = serde_json::from_str(&response_text).unwrap_or(Value::String(response_text));
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&response_text)
        .map(ProviderResponse::new)
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// What the fake API saw
    #[derive(Debug, Clone)]
    struct Seen {
        method: &'static str,
        path: String,
        authorization: Option<String>,
        body: Option<Value>,
    }

    #[derive(Clone)]
    struct FakeApi {
        seen: Arc<Mutex<Vec<Seen>>>,
        create_status: StatusCode,
        create_body: String,
    }

    fn authorization(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn create(
        State(api): State<FakeApi>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        api.seen.lock().unwrap().push(Seen {
            method: "POST",
            path: "/v13/deployments".to_string(),
            authorization: authorization(&headers),
            body: Some(body),
        });
        (api.create_status, api.create_body.clone())
    }

    async fn status(
        State(api): State<FakeApi>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Json<Value> {
        api.seen.lock().unwrap().push(Seen {
            method: "GET",
            path: format!("/v13/deployments/{}", id),
            authorization: authorization(&headers),
            body: None,
        });
        Json(json!({ "id": id, "url": format!("{}.vercel.app", id) }))
    }

    /// Serve a fake Vercel API on an ephemeral port and return its base URL
    async fn spawn_fake(api: FakeApi) -> String {
        let app = Router::new()
            .route("/v13/deployments", post(create))
            .route("/v13/deployments/{id}", get(status))
            .with_state(api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn fake(create_status: StatusCode, create_body: &str) -> FakeApi {
        FakeApi {
            seen: Arc::new(Mutex::new(Vec::new())),
            create_status,
            create_body: create_body.to_string(),
        }
    }

    fn client_for(base: &str) -> VercelClient {
        let config = ProviderConfig {
            api_base: base.to_string(),
            ..ProviderConfig::default()
        };
        VercelClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn create_sends_bearer_token_and_payload() {
        let api = fake(StatusCode::OK, r#"{"id":"dpl_1","url":"site-abc.vercel.app"}"#);
        let seen = Arc::clone(&api.seen);
        let client = client_for(&spawn_fake(api).await);

        let payload = CreateDeployment::single_page("site", "<h1>hello</h1>");
        let response = client.create_deployment("tok-123", &payload).await.unwrap();

        assert_eq!(response.url(), Some("site-abc.vercel.app"));
        assert_eq!(response.id().as_deref(), Some("dpl_1"));

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer tok-123"));
        assert_eq!(
            seen[0].body,
            Some(json!({
                "name": "site",
                "files": [{ "file": "index.html", "data": "<h1>hello</h1>", "encoding": "utf-8" }]
            }))
        );
    }

    #[tokio::test]
    async fn create_error_carries_json_body() {
        let api = fake(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":"forbidden","message":"Not authorized"}}"#,
        );
        let client = client_for(&spawn_fake(api).await);

        let payload = CreateDeployment::single_page("site", "x");
        let err = client.create_deployment("bad", &payload).await.unwrap_err();

        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body["error"]["code"], "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_error_with_text_body() {
        let api = fake(StatusCode::BAD_GATEWAY, "upstream exploded");
        let client = client_for(&spawn_fake(api).await);

        let payload = CreateDeployment::single_page("site", "x");
        let err = client.create_deployment("tok", &payload).await.unwrap_err();

        assert_eq!(err.details(), json!("upstream exploded"));
    }

    #[tokio::test]
    async fn create_success_with_non_json_body() {
        let api = fake(StatusCode::OK, "<html>not json</html>");
        let client = client_for(&spawn_fake(api).await);

        let payload = CreateDeployment::single_page("site", "x");
        let err = client.create_deployment("tok", &payload).await.unwrap_err();

        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn get_deployment_hits_status_endpoint() {
        let api = fake(StatusCode::OK, "{}");
        let seen = Arc::clone(&api.seen);
        let client = client_for(&spawn_fake(api).await);

        let response = client.get_deployment("tok", "dpl_42").await.unwrap();
        assert_eq!(response.url(), Some("dpl_42.vercel.app"));

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].path, "/v13/deployments/dpl_42");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn unreachable_provider_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let payload = CreateDeployment::single_page("site", "x");
        let err = client.create_deployment("tok", &payload).await.unwrap_err();

        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn endpoint_joins_segments_and_escapes_ids() {
        let client = client_for("https://api.vercel.com/");
        assert_eq!(
            client.endpoint(&["v13", "deployments"]).as_str(),
            "https://api.vercel.com/v13/deployments"
        );
        assert_eq!(
            client.endpoint(&["v13", "deployments", "a/b?c"]).as_str(),
            "https://api.vercel.com/v13/deployments/a%2Fb%3Fc"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let config = ProviderConfig {
            api_base: "mailto:ops@example.com".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            VercelClient::new(&config),
            Err(ProviderError::InvalidBaseUrl(_))
        ));

        let config = ProviderConfig {
            api_base: "not a url".to_string(),
            ..ProviderConfig::default()
        };
        assert!(VercelClient::new(&config).is_err());
    }
}
