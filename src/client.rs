//! HTTP client for the tracker REST API

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const API_PREFIX: &str = "/api/v1";

/// Shared REST client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidRequest(format!("bad token: {}", e)))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> ApiResult<Response> {
        let request_id = Uuid::new_v4();
        let response = builder
            .header("X-Request-Id", request_id.to_string())
            .send()
            .await
            .inspect_err(|e| {
                debug!(method = %method, path, request_id = %request_id, error = %e, "API call failed")
            })?;
        let status = response.status();
        debug!(method = %method, path, request_id = %request_id, status = status.as_u16(), "API call");

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.request(Method::GET, path)?;
        let response = self.send(Method::GET, path, builder).await?;
        Self::json(response).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path)?.query(query);
        let response = self.send(Method::GET, path, builder).await?;
        Self::json(response).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path)?.json(body);
        let response = self.send(Method::POST, path, builder).await?;
        Self::json(response).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PUT, path)?.json(body);
        let response = self.send(Method::PUT, path, builder).await?;
        Self::json(response).await
    }

    /// POST without a body whose response is ignored
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::POST, path)?;
        self.send(Method::POST, path, builder).await?;
        Ok(())
    }

    /// PUT without a body whose response is ignored
    pub async fn put_empty(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::PUT, path)?;
        self.send(Method::PUT, path, builder).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, path)?;
        self.send(Method::DELETE, path, builder).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        let builder = self.request(Method::POST, path)?.multipart(form);
        let response = self.send(Method::POST, path, builder).await?;
        Self::json(response).await
    }

    pub async fn put_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        let builder = self.request(Method::PUT, path)?.multipart(form);
        let response = self.send(Method::PUT, path, builder).await?;
        Self::json(response).await
    }
}
