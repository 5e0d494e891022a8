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

//! Errors delivered through a message's response callback.

use thiserror::Error;

use crate::transport::CommonError;

/// Transport codes that are not HTTP statuses.
pub const CONNECT_ERROR_CODE: i32 = 1001;
pub const TIMEOUT_ERROR_CODE: i32 = 1002;
pub const REQUEST_ERROR_CODE: i32 = 1003;
pub const REDIRECT_ERROR_CODE: i32 = 1004;
pub const BODY_ERROR_CODE: i32 = 1005;
pub const DECODE_ERROR_CODE: i32 = 1006;
pub const ABORTED_ERROR_CODE: i32 = 1007;
pub const OTHERS_ERROR_CODE: i32 = 1099;

const STATUS_ERROR_CODES: std::ops::RangeInclusive<i32> = 100..=599;
const REQUEST_ERROR_CODES: &[i32] = &[REQUEST_ERROR_CODE, REDIRECT_ERROR_CODE];
const BODY_ERROR_CODES: &[i32] = &[BODY_ERROR_CODE, DECODE_ERROR_CODE];

/// Category codes returned by [`MessageError::code`].
pub const INVALID_ARGUMENT_CODE: i32 = 1;
pub const INTERNET_UNAVAILABLE_CODE: i32 = 2;
pub const TRANSPORT_CODE: i32 = 3;
pub const PARSE_CODE: i32 = 4;

/// Everything that can go wrong with a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Missing or invalid base url, url or parameters. Raised before any
    /// network activity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The reachability check failed when the message started.
    #[error("internet connection unavailable")]
    InternetUnavailable,
    /// The transport failed or the server answered with an error status.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl MessageError {
    pub fn code(&self) -> i32 {
        match self {
            MessageError::InvalidArgument(_) => INVALID_ARGUMENT_CODE,
            MessageError::InternetUnavailable => INTERNET_UNAVAILABLE_CODE,
            MessageError::Transport(_) => TRANSPORT_CODE,
            MessageError::Parse(_) => PARSE_CODE,
        }
    }

    /// A sentence suitable for showing to a user.
    pub fn localized_description(&self) -> String {
        match self {
            MessageError::InvalidArgument(description) => description.clone(),
            MessageError::InternetUnavailable => {
                "The Internet connection appears to be offline.".to_string()
            }
            MessageError::Transport(e) => match e.kind() {
                TransportErrorKind::Connect => "Could not connect to the server.".to_string(),
                TransportErrorKind::Timeout => "The request timed out.".to_string(),
                TransportErrorKind::Status => {
                    format!("The server responded with status {}.", e.code())
                }
                _ => e.message().to_string(),
            },
            MessageError::Parse(_) => "The server response could not be read.".to_string(),
        }
    }
}

/// Failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    code: Option<i32>,
    message: String,
    kind: TransportErrorKind,
}

/// Categorizes the type of transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS, TCP or TLS failure before a request was sent.
    Connect,
    Timeout,
    /// The server answered with a 4xx or 5xx status.
    Status,
    /// Reading the response body failed.
    Body,
    /// Building or sending the request failed.
    Request,
    Others,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind,
        }
    }

    /// An error status answered by the server. The start of the body is kept
    /// as the message.
    pub fn status(status: u16, body: &[u8]) -> Self {
        const MAX_MESSAGE: usize = 256;
        let text = String::from_utf8_lossy(&body[..body.len().min(MAX_MESSAGE)]);
        let message = if text.trim().is_empty() {
            format!("HTTP status {}", status)
        } else {
            format!("HTTP status {}: {}", status, text.trim())
        };
        Self::new(TransportErrorKind::Status, Some(status as i32), message)
    }

    /// The transport dropped the request without being asked to.
    pub fn aborted() -> Self {
        Self::new(
            TransportErrorKind::Others,
            Some(ABORTED_ERROR_CODE),
            "request aborted",
        )
    }

    pub fn code(&self) -> i32 {
        self.code.unwrap_or(0)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl<'a, E> From<&'a E> for TransportError
where
    E: CommonError,
{
    fn from(err: &'a E) -> Self {
        let code = err.code();
        let kind = match code {
            code if STATUS_ERROR_CODES.contains(&code) => TransportErrorKind::Status,
            CONNECT_ERROR_CODE => TransportErrorKind::Connect,
            TIMEOUT_ERROR_CODE => TransportErrorKind::Timeout,
            code if REQUEST_ERROR_CODES.contains(&code) => TransportErrorKind::Request,
            code if BODY_ERROR_CODES.contains(&code) => TransportErrorKind::Body,
            _ => TransportErrorKind::Others,
        };
        TransportError {
            code: Some(code),
            message: err.msg(),
            kind,
        }
    }
}
