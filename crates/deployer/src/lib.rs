// Hosting provider clients and the deploy relay (Vercel today)

pub mod error;
pub mod mock;
pub mod relay;
pub mod vercel;

use async_trait::async_trait;
use sitedrop_core::{CreateDeployment, ProviderResponse};

pub use error::{DeployError, DeployResult, ProviderError};
pub use relay::{PollPolicy, Relay};
pub use vercel::VercelClient;

/// A hosting API that accepts inline-file deployments
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Domain that sites are published under, used for fallback URLs
    fn domain(&self) -> &str;

    /// Submit a new deployment
    async fn create_deployment(
        &self,
        token: &str,
        payload: &CreateDeployment,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Fetch the current state of a deployment
    async fn get_deployment(&self, token: &str, id: &str) -> Result<ProviderResponse, ProviderError>;
}
