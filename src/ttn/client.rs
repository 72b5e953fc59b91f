//! Minimal TTN v3 REST client
//!
//! Every call carries `Authorization: Bearer <api key>` and
//! `Accept: application/json`. Responses are logged at debug level; any
//! non-success status becomes [`ApiError::Status`] carrying the body.
//!
//! Reference: <https://www.thethingsindustries.com/docs/api/reference/http/>

use super::error::{ApiError, Operation};
use super::types::{
    ApplicationList, ApplicationSummary, CreateApplicationRequest, EndDeviceRequest,
    SetLinkRequest,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

/// TTN component that stores one slice of an end device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    NetworkServer,
    ApplicationServer,
    JoinServer,
}

impl Component {
    fn path_prefix(self) -> &'static str {
        match self {
            Component::NetworkServer => "ns",
            Component::ApplicationServer => "as",
            Component::JoinServer => "js",
        }
    }

    fn operation(self) -> Operation {
        match self {
            Component::NetworkServer => Operation::ConfigureNetworkServer,
            Component::ApplicationServer => Operation::ConfigureApplicationServer,
            Component::JoinServer => Operation::ConfigureJoinServer,
        }
    }
}

pub struct TtnClient {
    http: Client,
    base_url: String,
}

impl TtnClient {
    /// Create a client for the cluster at `base_url` (e.g.
    /// `https://eu1.cloud.thethings.network`).
    pub fn new(base_url: impl Into<String>, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("TTN client created for {}", base_url);

        Ok(Self { http, base_url })
    }

    /// List every application visible to the API key
    pub async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, ApiError> {
        let operation = Operation::ListApplications;
        let url = format!("{}/api/v3/applications", self.base_url);

        let body = self.execute(operation, self.http.get(&url)).await?;
        let list: ApplicationList = serde_json::from_str(&body)
            .map_err(|source| ApiError::Decode { operation, source })?;

        debug!("Got {} applications", list.applications.len());
        Ok(list.applications)
    }

    /// Create an application owned by the user or organization `owner`
    pub async fn create_application(
        &self,
        owner: &str,
        request: &CreateApplicationRequest,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/v3/users/{}/applications", self.base_url, owner);
        self.execute(Operation::CreateApplication, self.http.post(&url).json(request))
            .await?;
        Ok(())
    }

    /// Update the application server link (default payload formatters)
    pub async fn set_link(&self, app_id: &str, request: &SetLinkRequest) -> Result<(), ApiError> {
        let url = format!("{}/api/v3/as/applications/{}/link", self.base_url, app_id);
        self.execute(Operation::SetFormatter, self.http.put(&url).json(request))
            .await?;
        Ok(())
    }

    /// Create an end device in the identity server registry
    pub async fn create_end_device(
        &self,
        app_id: &str,
        request: &EndDeviceRequest,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/v3/applications/{}/devices", self.base_url, app_id);
        self.execute(Operation::RegisterDevice, self.http.post(&url).json(request))
            .await?;
        Ok(())
    }

    /// Set the slice of an end device stored by `component`
    pub async fn set_end_device(
        &self,
        component: Component,
        app_id: &str,
        device_id: &str,
        request: &EndDeviceRequest,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/api/v3/{}/applications/{}/devices/{}",
            self.base_url,
            component.path_prefix(),
            app_id,
            device_id
        );
        self.execute(component.operation(), self.http.put(&url).json(request))
            .await?;
        Ok(())
    }

    /// Send a request and return the body of a success response
    async fn execute(&self, operation: Operation, request: RequestBuilder) -> Result<String, ApiError> {
        let resp = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        debug!("{}: got status code {}, content: {}", operation, status, body);

        if !status.is_success() {
            return Err(ApiError::Status {
                operation,
                status,
                body,
            });
        }

        Ok(body)
    }
}
