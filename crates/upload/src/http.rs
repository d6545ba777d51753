//! HTTP implementation of [`MediaTransport`] over `reqwest`.
//!
//! The caller supplies an already-authenticated `reqwest::Client`; this
//! module only shapes requests and decodes responses.

use mediasend_protocol::messages::{FormFields, append_fields, finalize_fields, status_query};
use mediasend_protocol::{
    Command, FinalizeResponse, InitRequest, InitResponse, MediaId, StatusResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::multipart::encode_append;
use crate::transport::{MediaTransport, TransportFuture};

/// Upload endpoint client.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    upload_url: String,
}

impl HttpTransport {
    /// Creates a transport for the endpoint described by `config`.
    pub fn new(http: reqwest::Client, config: &UploadConfig) -> Self {
        Self::with_url(http, config.upload_url())
    }

    /// Creates a transport for an explicit endpoint URL.
    pub fn with_url(http: reqwest::Client, upload_url: impl Into<String>) -> Self {
        Self {
            http,
            upload_url: upload_url.into(),
        }
    }

    /// POSTs a url-encoded form and decodes a 2xx JSON body.
    async fn post_form<T: DeserializeOwned>(
        &self,
        command: Command,
        fields: FormFields,
    ) -> Result<T, UploadError> {
        let resp = self
            .http
            .post(&self.upload_url)
            .form(&fields)
            .send()
            .await
            .map_err(|source| UploadError::Transport { command, source })?;
        decode(command, resp).await
    }
}

/// Stands in for a non-2xx body that could not be read.
const UNREADABLE_BODY: &str = "<unreadable body>";

/// Checks the status of `resp` and decodes its body.
async fn decode<T: DeserializeOwned>(
    command: Command,
    resp: reqwest::Response,
) -> Result<T, UploadError> {
    let status = resp.status();
    if !status.is_success() {
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%command, error = %e, "error body could not be read");
                UNREADABLE_BODY.to_string()
            }
        };
        return Err(UploadError::Protocol {
            command,
            status: status.as_u16(),
            body,
        });
    }

    let body = resp
        .bytes()
        .await
        .map_err(|source| UploadError::Transport { command, source })?;
    debug!(%command, status = status.as_u16(), bytes = body.len(), "response received");
    serde_json::from_slice(&body).map_err(|source| UploadError::Decode { command, source })
}

impl MediaTransport for HttpTransport {
    fn init(&self, request: InitRequest) -> TransportFuture<'_, InitResponse> {
        Box::pin(async move { self.post_form(Command::Init, request.form_fields()).await })
    }

    fn append(
        &self,
        media_id: MediaId,
        segment_index: u32,
        chunk: Vec<u8>,
    ) -> TransportFuture<'_, u16> {
        Box::pin(async move {
            let req = encode_append(
                &self.http,
                &self.upload_url,
                append_fields(media_id, segment_index),
                chunk,
            )?;
            let resp = self
                .http
                .execute(req)
                .await
                .map_err(|source| UploadError::Transport {
                    command: Command::Append,
                    source,
                })?;
            Ok(resp.status().as_u16())
        })
    }

    fn finalize(&self, media_id: MediaId) -> TransportFuture<'_, FinalizeResponse> {
        Box::pin(async move {
            self.post_form(Command::Finalize, finalize_fields(media_id))
                .await
        })
    }

    fn status(&self, media_id: MediaId) -> TransportFuture<'_, StatusResponse> {
        Box::pin(async move {
            let command = Command::Status;
            let resp = self
                .http
                .get(&self.upload_url)
                .query(&status_query(media_id))
                .send()
                .await
                .map_err(|source| UploadError::Transport { command, source })?;
            decode(command, resp).await
        })
    }
}
