// Async HTTP client for the Tailscale control-plane API (v2).
//
// Base path: /api/v2/
// Auth: HTTP basic, API token as username, empty password

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::Error;
use crate::models::{Device, DeviceList, ErrorResponse};
use crate::transport::TransportConfig;

/// Public Tailscale control plane.
pub const DEFAULT_API_URL: &str = "https://api.tailscale.com";

/// Tailnet alias resolving to the token owner's default tailnet.
pub const DEFAULT_TAILNET: &str = "-";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Tailscale device API.
///
/// Holds the token for the lifetime of the client and sends it as basic
/// auth on every request. Cheap to share behind an `Arc`; every call is an
/// independent request with no client-side caching.
pub struct TailscaleClient {
    http: reqwest::Client,
    base_url: Url,
    tailnet: String,
    token: SecretString,
}

impl TailscaleClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API token and transport config.
    pub fn from_token(
        base_url: &str,
        tailnet: impl Into<String>,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, tailnet, token, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        tailnet: impl Into<String>,
        token: SecretString,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(Self {
            http,
            base_url,
            tailnet: tailnet.into(),
            token,
        })
    }

    /// The control-plane base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The tailnet this client queries.
    pub fn tailnet(&self) -> &str {
        &self.tailnet
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base}/api/v2/tailnet/{tailnet}/devices?fields=all`
    ///
    /// Routes are only included in the `all` field set. The tailnet is
    /// pushed as a single percent-encoded segment.
    fn devices_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "v2", "tailnet", self.tailnet.as_str(), "devices"]);
        url.query_pairs_mut().append_pair("fields", "all");
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every device in the tailnet, in the order the API returns them.
    pub async fn devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.devices_url()?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .basic_auth(self.token.expose_secret(), Some(""))
            .send()
            .await?;

        let list: DeviceList = self.handle_response(resp).await?;
        trace!(count = list.devices.len(), "decoded device list");
        Ok(list.devices)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(ErrorResponse {
                message: Some(message),
            }) => message,
            _ if raw.trim().is_empty() => status.to_string(),
            _ => raw.trim().to_owned(),
        };

        if matches!(
            status,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) {
            Error::Unauthorized {
                status: status.as_u16(),
                message,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}
