//! HTTP client for the Friction Finder backend

use super::error::ApiError;
use super::types::{
    DashboardMetrics, DemoSeedSummary, PainPointDetail, PainPointFilter, PainPointListItem,
};
use crate::auth::Credential;
use crate::intake::{AnalysisRequest, Verdict};
use crate::report::ReportOptions;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

const PASSWORD_HEADER: &str = "x-app-password";

/// Interviews generated per demo seed
const DEMO_INTERVIEW_COUNT: u32 = 24;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server path
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(builder: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
        match credential {
            Some(c) => builder.header(PASSWORD_HEADER, c.expose()),
            None => builder,
        }
    }

    /// Send and reject any non-success status
    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    /// Decode a JSON body; `None` for 204
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ApiError> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::decode(format!("Unexpected response: {e}")))
    }

    async fn get_json<T: DeserializeOwned + Default>(
        &self,
        builder: RequestBuilder,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let response = Self::send(Self::authorized(builder, credential)).await?;
        Ok(Self::decode(response).await?.unwrap_or_default())
    }

    /// `POST /chatbot/coo`: one analyzer call
    pub async fn coo_chat(
        &self,
        request: &AnalysisRequest,
        credential: Option<&Credential>,
    ) -> Result<Verdict, ApiError> {
        let builder = self.client.post(self.url("/chatbot/coo")).json(request);
        let response = Self::send(Self::authorized(builder, credential)).await?;
        Self::decode(response)
            .await?
            .ok_or_else(|| ApiError::decode("Empty analyzer response"))
    }

    pub async fn dashboard(
        &self,
        credential: Option<&Credential>,
    ) -> Result<DashboardMetrics, ApiError> {
        self.get_json(self.client.get(self.url("/dashboard")), credential)
            .await
    }

    /// Probe a password against a gated read-only endpoint
    pub async fn verify_credential(&self, credential: &Credential) -> Result<(), ApiError> {
        Self::send(Self::authorized(
            self.client.get(self.url("/dashboard")),
            Some(credential),
        ))
        .await
        .map(|_| ())
    }

    pub async fn list_pain_points(
        &self,
        filter: &PainPointFilter,
        credential: Option<&Credential>,
    ) -> Result<Vec<PainPointListItem>, ApiError> {
        let builder = self
            .client
            .get(self.url("/pain-points"))
            .query(&filter.query_pairs());
        self.get_json(builder, credential).await
    }

    pub async fn pain_point(
        &self,
        id: i64,
        credential: Option<&Credential>,
    ) -> Result<PainPointDetail, ApiError> {
        let builder = self.client.get(self.url(&format!("/pain-points/{id}")));
        let response = Self::send(Self::authorized(builder, credential)).await?;
        Self::decode(response)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Pain point {id} not found")))
    }

    /// `POST /demo/seed`: generate demo interviews, optionally wiping existing data first
    pub async fn seed_demo(
        &self,
        reset: bool,
        credential: Option<&Credential>,
    ) -> Result<DemoSeedSummary, ApiError> {
        let builder = self.client.post(self.url("/demo/seed")).query(&[
            ("interview_count", DEMO_INTERVIEW_COUNT.to_string()),
            ("reset", reset.to_string()),
        ]);
        self.get_json(builder, credential).await
    }

    pub async fn report_html(
        &self,
        options: &ReportOptions,
        credential: Option<&Credential>,
    ) -> Result<String, ApiError> {
        let builder = self.client.get(self.url(&options.html_path()));
        let response = Self::send(Self::authorized(builder, credential)).await?;
        Ok(response.text().await?)
    }

    pub async fn report_pdf(
        &self,
        options: &ReportOptions,
        credential: Option<&Credential>,
    ) -> Result<Vec<u8>, ApiError> {
        let builder = self.client.get(self.url(&options.pdf_path()));
        let response = Self::send(Self::authorized(builder, credential)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
