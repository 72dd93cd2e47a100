use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracker_core::{JobRecord, PropertyKind};
use url::Url;

use crate::{ApiError, ApiSettings, FailureKind};

const JOBS_PATH: [&str; 3] = ["api", "v1", "ceps"];

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// Source of the full job list used by the polling loop.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ApiError>;
}

/// Opens the server-sent progress stream of one job.
#[async_trait::async_trait]
pub trait ProgressSource: Send + Sync {
    async fn subscribe(&self, code: &str) -> Result<ByteStream, ApiError>;
}

/// Operator commands that change the job list on the backend.
#[async_trait::async_trait]
pub trait JobCommands: Send + Sync {
    async fn register(&self, code: &str, kind: PropertyKind) -> Result<JobRecord, ApiError>;
    async fn retry(&self, id: u64) -> Result<JobRecord, ApiError>;
    async fn remove(&self, id: u64) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    cep: &'a str,
    tipo: PropertyKind,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    base_url: Url,
    token: Option<String>,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be a base url"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        // No total timeout: a live stream stays open for the whole job.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base_url,
            token: settings.token.filter(|token| !token.is_empty()),
            client,
            stream_client,
        })
    }

    fn endpoint(&self, extra: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "cannot be a base url"))?
            .pop_if_empty()
            .extend(JOBS_PATH)
            .extend(extra);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await
    }
}

#[async_trait::async_trait]
impl JobSource for ReqwestApi {
    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ApiError> {
        let url = self.endpoint(&[])?;
        let response = self.send(self.client.get(url)).await?;
        decode_json(response).await
    }
}

#[async_trait::async_trait]
impl ProgressSource for ReqwestApi {
    async fn subscribe(&self, code: &str) -> Result<ByteStream, ApiError> {
        let url = self.endpoint(&[code, "progresso"])?;
        let response = self
            .send(self.stream_client.get(url).header(ACCEPT, "text/event-stream"))
            .await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error));
        Ok(Box::pin(stream))
    }
}

#[async_trait::async_trait]
impl JobCommands for ReqwestApi {
    async fn register(&self, code: &str, kind: PropertyKind) -> Result<JobRecord, ApiError> {
        let url = self.endpoint(&[])?;
        let body = serde_json::to_vec(&RegisterBody { cep: code, tipo: kind })
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.send(request).await?;
        decode_json(response).await
    }

    async fn retry(&self, id: u64) -> Result<JobRecord, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&[&id, "retry"])?;
        let response = self.send(self.client.post(url)).await?;
        decode_json(response).await
    }

    async fn remove(&self, id: u64) -> Result<(), ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&[&id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::CONFLICT {
        return Err(ApiError::new(FailureKind::Conflict, status.to_string()));
    }

    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(ErrorBody { detail }) => Err(ApiError::new(
            FailureKind::Rejected {
                detail: detail.clone(),
            },
            format!("{status}: {detail}"),
        )),
        Err(_) => Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        )),
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
