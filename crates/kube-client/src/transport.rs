use std::time::Duration;

use reqwest::{Client, Method, StatusCode, header};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::{
    context::Context,
    error::{ClientError, TransportError},
};

/// Status and fully read body of one exchange.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Issues raw HTTP exchanges against the base URL. Status codes are left to
/// the caller.
#[derive(Debug)]
pub(crate) struct Transport {
    client: Client,
    base: Url,
    timeout: Option<Duration>,
}

impl Transport {
    pub(crate) fn new(client: Client, base: Url, timeout: Option<Duration>) -> Self {
        Self {
            client,
            base,
            timeout,
        }
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    ///
    /// `.` and `..` cannot be expressed as a single path segment and are
    /// rejected instead of being resolved against the base.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ClientError::UnsupportedUrl(format!(
                "path segment {segment:?} cannot be addressed"
            )));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::UnsupportedUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request and reads the response body to completion, racing
    /// both against `ctx`.
    pub(crate) async fn send<B>(
        &self,
        ctx: &Context,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<RawResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        if let Some(err) = ctx.err() {
            return Err(TransportError::from(err).into());
        }

        let url = self.endpoint(segments)?;
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(ClientError::Encode)?;
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        debug!("{} {}", method, url);
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                body: body.to_vec(),
            })
        };

        tokio::select! {
            result = exchange => {
                let response = result?;
                debug!("{} {} -> {}", method, url, response.status);
                Ok(response)
            }
            err = ctx.done() => {
                debug!("{} {} aborted: {:?}", method, url, err);
                Err(TransportError::from(err).into())
            }
        }
    }
}
