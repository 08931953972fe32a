// Validate an upload, submit it to the hosting provider, and wait for a URL

use sitedrop_core::{
    CreateDeployment, DeployRequest, DeploymentResult, ProviderConfig, RelayConfig, UploadForm,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DeployError, DeployResult};
use crate::HostingProvider;

/// Bounded, fixed-interval status polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

impl From<&ProviderConfig> for PollPolicy {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            attempts: config.poll_attempts,
            interval: config.poll_interval(),
        }
    }
}

/// Relays single-page deployments to a hosting provider.
///
/// Holds no per-request state; one instance is shared by all requests.
pub struct Relay {
    provider: Arc<dyn HostingProvider>,
    default_token: Option<String>,
    poll: PollPolicy,
}

impl Relay {
    pub fn new(provider: Arc<dyn HostingProvider>, config: &RelayConfig) -> Self {
        Self {
            provider,
            default_token: config.default_token().map(str::to_string),
            poll: PollPolicy::from(&config.provider),
        }
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Check an upload's fields. The first failure wins, in the order
    /// credential, file, site name.
    pub fn validate(&self, form: UploadForm) -> DeployResult<DeployRequest> {
        let token = form
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.default_token.as_deref())
            .ok_or(DeployError::MissingCredential)?
            .to_string();

        let file = form
            .file
            .filter(|f| !f.is_empty())
            .ok_or(DeployError::MissingFile)?;

        let site_name = form
            .site_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DeployError::MissingField("siteName"))?
            .to_string();

        Ok(DeployRequest {
            site_name,
            file,
            token,
        })
    }

    /// Validate and deploy in one step
    pub async fn handle(&self, form: UploadForm) -> DeployResult<DeploymentResult> {
        let request = self.validate(form)?;
        self.deploy(&request).await
    }

    /// Submit a validated request and resolve the site URL.
    ///
    /// Falls back to `https://{site}.{domain}` when neither the creation
    /// response nor polling yields a URL.
    pub async fn deploy(&self, request: &DeployRequest) -> DeployResult<DeploymentResult> {
        let content = request.content();

        let payload = CreateDeployment::single_page(&request.site_name, &content);

        info!(
            site_name = %request.site_name,
            bytes = request.file.len(),
            "submitting deployment"
        );

        let deployment = self
            .provider
            .create_deployment(&request.token, &payload)
            .await
            .map_err(DeployError::ProviderSubmissionFailed)?;

        let mut url = deployment.resolve_url().map(str::to_string);

        if url.is_none()
            && let Some(id) = deployment.id()
        {
            url = self.poll_for_url(&request.token, &id).await?;
        }

        let url = match url {
            Some(url) => url,
            None => {
                let fallback = self.fallback_url(&request.site_name);
                warn!(
                    site_name = %request.site_name,
                    url = %fallback,
                    "no deployment URL reported, using fallback"
                );
                fallback
            }
        };

        info!(site_name = %request.site_name, url = %url, "deployment submitted");

        Ok(DeploymentResult::deployed(url, deployment.into_inner()))
    }

    /// Poll the status endpoint until it reports a URL or attempts run out.
    ///
    /// Exhaustion is `Ok(None)`; any failed poll aborts.
    async fn poll_for_url(&self, token: &str, id: &str) -> DeployResult<Option<String>> {
        for attempt in 1..=self.poll.attempts {
            tokio::time::sleep(self.poll.interval).await;

            let status = self.provider.get_deployment(token, id).await.map_err(|source| {
                DeployError::ProviderPollFailed {
                    id: id.to_string(),
                    source,
                }
            })?;

            if let Some(url) = status.url() {
                debug!(deployment_id = %id, attempt, "deployment reported a URL");
                return Ok(Some(url.to_string()));
            }

            debug!(deployment_id = %id, attempt, "deployment has no URL yet");
        }

        Ok(None)
    }

    fn fallback_url(&self, site_name: &str) -> String {
        format!("https://{}.{}", site_name, self.provider.domain())
    }
}
