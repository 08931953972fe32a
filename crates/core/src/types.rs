use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Name the uploaded page is published under
pub const INDEX_FILE: &str = "index.html";

/// Encoding declared for inline file data
pub const FILE_ENCODING: &str = "utf-8";

/// Raw fields of an inbound upload, before validation
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub site_name: Option<String>,
    pub token: Option<String>,
}

/// A validated deploy request: site name and token are trimmed and non-empty
#[derive(Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub site_name: String,
    pub file: Vec<u8>,
    pub token: String,
}

impl DeployRequest {
    /// Decode the uploaded file as UTF-8 text, replacing invalid sequences
    /// with U+FFFD
    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.file)
    }
}

// Keeps bearer tokens out of log output
impl fmt::Debug for DeployRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployRequest")
            .field("site_name", &self.site_name)
            .field("file_len", &self.file.len())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Body of a deployment creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeployment {
    pub name: String,
    pub files: Vec<DeploymentFile>,
}

/// A single inline file in a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentFile {
    pub file: String,
    pub data: String,
    pub encoding: String,
}

impl CreateDeployment {
    /// Payload publishing `html` as the site's only page
    pub fn single_page(name: &str, html: &str) -> Self {
        Self {
            name: name.to_string(),
            files: vec![DeploymentFile {
                file: INDEX_FILE.to_string(),
                data: html.to_string(),
                encoding: FILE_ENCODING.to_string(),
            }],
        }
    }
}

/// Typed view over a provider's deployment JSON.
///
/// Field presence varies between the creation and status endpoints, so every
/// accessor is optional. Empty strings are treated as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderResponse(Value);

impl ProviderResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Top-level `url` field
    pub fn url(&self) -> Option<&str> {
        non_empty_str(self.0.get("url"))
    }

    /// Deployment URL in order of precedence: `url`, then `deployment.url`
    pub fn resolve_url(&self) -> Option<&str> {
        self.url().or_else(|| {
            non_empty_str(self.0.get("deployment").and_then(|d| d.get("url")))
        })
    }

    /// Deployment id, accepting string or numeric ids
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Outcome of one deploy request, serialized as the response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub raw: Value,
    #[serde(rename = "details", skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,
}

impl DeploymentResult {
    pub fn deployed(url: String, raw: Value) -> Self {
        Self {
            success: true,
            url: Some(url),
            raw,
            error_details: None,
        }
    }

    pub fn failed(details: Value) -> Self {
        Self {
            success: false,
            url: None,
            raw: Value::Null,
            error_details: Some(details),
        }
    }
}
