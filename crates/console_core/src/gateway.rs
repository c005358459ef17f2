//! Remote access to the ship API (`/api/...`): one request, one response, no retries.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::SubmarineId,
    error::ServerErrorBody,
    protocol::{
        KillRequest, LaunchParams, MeasurementsResponse, NavigateRequest, PictureResponse,
        PilotRequest, RadarResponse, ScanResponse, WorldState,
    },
};
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

#[async_trait]
pub trait ShipApi: Send + Sync {
    async fn get_state(&self) -> GatewayResult<WorldState>;
    async fn launch(&self, params: &LaunchParams) -> GatewayResult<()>;
    async fn navigate(&self, request: NavigateRequest) -> GatewayResult<()>;
    async fn scan(&self) -> GatewayResult<ScanResponse>;
    async fn radar(&self) -> GatewayResult<RadarResponse>;
    async fn start_submarine(&self) -> GatewayResult<()>;
    async fn kill_submarine(&self, id: &SubmarineId) -> GatewayResult<()>;
    async fn pilot(&self, request: &PilotRequest) -> GatewayResult<()>;
    async fn fetch_picture(&self, id: Option<&SubmarineId>) -> GatewayResult<PictureResponse>;
    async fn measurements(&self, id: Option<&SubmarineId>)
        -> GatewayResult<MeasurementsResponse>;
    async fn reset(&self) -> GatewayResult<()>;
}

pub struct HttpGateway {
    http: Client,
    api_base: String,
}

impl HttpGateway {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        id: Option<&SubmarineId>,
    ) -> GatewayResult<T> {
        let mut request = self.http.get(format!("{}{path}", self.api_base));
        if let Some(id) = id {
            request = request.query(&[("id", id.as_str())]);
        }
        let res = ensure_success(request.send().await?).await?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<Response> {
        let mut request = self.http.post(format!("{}{path}", self.api_base));
        if let Some(body) = body {
            request = request.json(body);
        }
        ensure_success(request.send().await?).await
    }

    /// Commands are acknowledged by status alone; the body may be empty or not JSON.
    async fn post_command<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<()> {
        let res = self.post(path, body).await?;
        let _ = res.bytes().await;
        Ok(())
    }

    async fn post_for<T: DeserializeOwned + Default>(&self, path: &str) -> GatewayResult<T> {
        let res = self.post::<()>(path, None).await?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            debug!(path, "tolerating unparseable command response: {err}");
            T::default()
        }))
    }
}

async fn ensure_success(res: Response) -> GatewayResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServerErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ShipApi for HttpGateway {
    async fn get_state(&self) -> GatewayResult<WorldState> {
        self.get_json("/state", None).await
    }

    async fn launch(&self, params: &LaunchParams) -> GatewayResult<()> {
        self.post_command("/launch", Some(params)).await
    }

    async fn navigate(&self, request: NavigateRequest) -> GatewayResult<()> {
        self.post_command("/navigate", Some(&request)).await
    }

    async fn scan(&self) -> GatewayResult<ScanResponse> {
        self.post_for("/scan").await
    }

    async fn radar(&self) -> GatewayResult<RadarResponse> {
        self.post_for("/radar").await
    }

    async fn start_submarine(&self) -> GatewayResult<()> {
        self.post_command::<()>("/submarine/start", None).await
    }

    async fn kill_submarine(&self, id: &SubmarineId) -> GatewayResult<()> {
        self.post_command("/submarine/kill", Some(&KillRequest { id: id.clone() }))
            .await
    }

    async fn pilot(&self, request: &PilotRequest) -> GatewayResult<()> {
        self.post_command("/submarine/pilot", Some(request)).await
    }

    async fn fetch_picture(&self, id: Option<&SubmarineId>) -> GatewayResult<PictureResponse> {
        self.get_json("/submarine/picture", id).await
    }

    async fn measurements(
        &self,
        id: Option<&SubmarineId>,
    ) -> GatewayResult<MeasurementsResponse> {
        self.get_json("/submarine/measurements", id).await
    }

    async fn reset(&self) -> GatewayResult<()> {
        self.post_command::<()>("/reset", None).await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
