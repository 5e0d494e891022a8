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

//! The network transport a message hands its request to.
//!
//! A [`Transport`] receives a fully built [`HttpRequest`] and a
//! [`TransferSink`], starts the exchange in the background and returns a
//! [`CommonHandle`] that can abort it. Whatever happens, the transport
//! reports back exactly once, with either [`TransferSink::complete`] or
//! [`TransferSink::cancelled`].

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::message::error::TransportError;
use crate::message::{HttpMethod, Progress};

cfg_reqwest! {
    mod http;
    pub use http::HttpTransport;
}

cfg_not_reqwest! {
    mod unsupported;
    pub use unsupported::UnsupportedTransport;
}

/// The process wide transport used when none is configured.
pub(crate) fn default_transport() -> Arc<dyn Transport> {
    #[cfg(feature = "reqwest")]
    let transport = Arc::new(HttpTransport::shared());
    #[cfg(not(feature = "reqwest"))]
    let transport = Arc::new(UnsupportedTransport);
    transport
}

/// Common interface for errors raised by transport backends.
pub(crate) trait CommonError {
    fn code(&self) -> i32;

    fn msg(&self) -> String;
}

/// Control over an exchange started by [`Transport::perform`].
#[cfg_attr(test, mockall::automock)]
pub trait CommonHandle: Send + Sync {
    /// Requests an abort. Returns `false` if an abort was already requested.
    fn cancel(&self) -> bool;
}

/// A request ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Overrides the transport's own request timeout.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What a POST or PUT carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// Sent as is, described by the request's `Content-Type` header.
    Bytes(Vec<u8>),
    /// Sent as `multipart/form-data`. The transport encodes the parts and
    /// picks the boundary.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// The raw payload of a [`RequestBody::Bytes`] body.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Bytes(bytes) => Some(bytes),
            RequestBody::Multipart(_) => None,
        }
    }
}

/// Text fields followed by an optional file part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

/// A file read into memory for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub mime: String,
    pub content: Vec<u8>,
}

/// Status and body of a response, whatever the status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Receives the progress and the outcome of one exchange.
#[cfg_attr(test, mockall::automock)]
pub trait TransferSink: Send + Sync {
    fn upload_progress(&self, progress: Progress);

    fn download_progress(&self, progress: Progress);

    /// The exchange ended, with a response of any status or with an error.
    fn complete(&self, result: Result<RawResponse, TransportError>);

    /// The exchange was aborted through its handle.
    fn cancelled(&self);
}

/// Performs HTTP exchanges.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Starts `request` without blocking. The transport must eventually call
    /// exactly one of `sink.complete` and `sink.cancelled`.
    fn perform(&self, request: HttpRequest, sink: Arc<dyn TransferSink>) -> Arc<dyn CommonHandle>;
}
