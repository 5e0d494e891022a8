// Copyright (C) 2024 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! reqwest based transport.
//!
//! Upload progress is reported while the body stream is consumed, one
//! event per chunk. Multipart forms are encoded by reqwest, which also
//! escapes field names and file names. Download progress is reported per received chunk.
//! Aborting is done through a [`CancellationToken`] raced against the
//! whole exchange.

mod client;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use tokio_util::sync::CancellationToken;

use super::{
    CommonError, CommonHandle, HttpRequest, MultipartForm, RawResponse, RequestBody, TransferSink,
    Transport,
};
use crate::config::ClientConfig;
use crate::message::error::{
    TransportError, BODY_ERROR_CODE, CONNECT_ERROR_CODE, DECODE_ERROR_CODE, OTHERS_ERROR_CODE,
    REDIRECT_ERROR_CODE, REQUEST_ERROR_CODE, TIMEOUT_ERROR_CODE,
};
use crate::message::{HttpMethod, Progress};

const UPLOAD_CHUNK: usize = 16 * 1024;

impl CommonError for reqwest::Error {
    fn code(&self) -> i32 {
        if self.is_timeout() {
            TIMEOUT_ERROR_CODE
        } else if self.is_connect() {
            CONNECT_ERROR_CODE
        } else if let Some(status) = self.status() {
            status.as_u16() as i32
        } else if self.is_redirect() {
            REDIRECT_ERROR_CODE
        } else if self.is_decode() {
            DECODE_ERROR_CODE
        } else if self.is_body() {
            BODY_ERROR_CODE
        } else if self.is_request() || self.is_builder() {
            REQUEST_ERROR_CODE
        } else {
            OTHERS_ERROR_CODE
        }
    }

    fn msg(&self) -> String {
        self.to_string()
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Transport backed by a reqwest [`Client`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// A transport with its own client built from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: client::build_client(config)?,
        })
    }

    /// A transport using the process wide client.
    pub fn shared() -> Self {
        Self {
            client: client::client().clone(),
        }
    }
}

impl Transport for HttpTransport {
    fn perform(&self, request: HttpRequest, sink: Arc<dyn TransferSink>) -> Arc<dyn CommonHandle> {
        let token = CancellationToken::new();
        let handle = Arc::new(CancelHandle::new(token.clone()));
        let client = self.client.clone();
        crate::runtime::spawn(async move {
            debug!("{} {}", request.method, request.url);
            tokio::select! {
                biased;
                _ = token.cancelled() => sink.cancelled(),
                result = exchange(&client, request, sink.clone()) => sink.complete(result),
            }
        });
        handle
    }
}

async fn exchange(
    client: &Client,
    request: HttpRequest,
    sink: Arc<dyn TransferSink>,
) -> Result<RawResponse, TransportError> {
    let mut builder = client.request(request.method.into(), request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    match request.body {
        Some(RequestBody::Bytes(body)) => {
            builder = builder
                .header(CONTENT_LENGTH, body.len())
                .body(upload_body(body, sink.clone()));
        }
        Some(RequestBody::Multipart(form)) => {
            builder = builder.multipart(multipart_form(form, sink.clone())?);
        }
        None => {}
    }

    let response = builder.send().await.map_err(|e| TransportError::from(&e))?;
    let status = response.status().as_u16();
    let expected = response.content_length();
    let mut stream = std::pin::pin!(response.bytes_stream());
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::from(&e))?;
        body.extend_from_slice(&chunk);
        sink.download_progress(Progress {
            bytes: chunk.len() as u64,
            total: body.len() as u64,
            expected,
        });
    }
    Ok(RawResponse { status, body })
}

// Upload progress of a multipart body counts the file part only.
fn multipart_form(form: MultipartForm, sink: Arc<dyn TransferSink>) -> Result<Form, TransportError> {
    let mut out = Form::new();
    for (name, value) in form.fields {
        out = out.text(name, value);
    }
    if let Some(file) = form.file {
        let length = file.content.len() as u64;
        let part = Part::stream_with_length(upload_body(file.content, sink), length)
            .file_name(file.filename)
            .mime_str(&file.mime)
            .map_err(|e| TransportError::from(&e))?;
        out = out.part(file.field, part);
    }
    Ok(out)
}

fn upload_body(body: Vec<u8>, sink: Arc<dyn TransferSink>) -> Body {
    if body.is_empty() {
        return Body::from(body);
    }
    let expected = body.len() as u64;
    let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
    let mut total = 0;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        total += chunk.len() as u64;
        sink.upload_progress(Progress {
            bytes: chunk.len() as u64,
            total,
            expected: Some(expected),
        });
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}

/// Aborts an exchange started by [`HttpTransport`].
pub struct CancelHandle {
    token: CancellationToken,
    cancelled: AtomicBool,
}

impl CancelHandle {
    fn new(token: CancellationToken) -> Self {
        Self {
            token,
            cancelled: AtomicBool::new(false),
        }
    }
}

impl CommonHandle for CancelHandle {
    fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }
}
