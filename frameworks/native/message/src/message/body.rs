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

//! Encoding of parameters and files into requests.
//!
//! GET and DELETE carry their parameters in the query string. POST and PUT
//! carry them in the body: url-encoded form by default, JSON on request,
//! and `multipart/form-data` whenever a file is attached. Multipart bodies
//! stay structured until the transport encodes them.

use std::path::Path;

use mime::Mime;
use url::form_urlencoded;
use url::Url;

use super::error::MessageError;
use super::{BodyEncoding, HttpMethod, MessageConfig};
use crate::transport::{FilePart, HttpRequest, MultipartForm, RequestBody};

const CONTENT_TYPE: &str = "Content-Type";

/// Percent-encodes every character that is not unreserved in RFC 3986.
///
/// ```rust
/// use request_message::message::body::url_encode;
///
/// assert_eq!(url_encode("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
/// assert_eq!(url_encode("v1.0_x-y~z"), "v1.0_x-y~z");
/// ```
pub fn url_encode(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// Guesses the content type of a file from its extension.
pub fn mime_for_path(path: &Path) -> Mime {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "txt" | "text" | "log" => mime::TEXT_PLAIN,
        "html" | "htm" => mime::TEXT_HTML,
        "css" => mime::TEXT_CSS,
        "csv" => mime::TEXT_CSV,
        "xml" => mime::TEXT_XML,
        "js" => mime::APPLICATION_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "mp4" | "m4v" => "video/mp4".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "mov" => "video/quicktime".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "mp3" => "audio/mpeg".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "zip" => "application/zip".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Builds the request a message sends to `url`.
pub(crate) fn build_request(config: &MessageConfig, mut url: Url) -> Result<HttpRequest, MessageError> {
    let mut headers = config.headers.clone();
    let body = match config.method {
        HttpMethod::Get | HttpMethod::Delete => {
            if let Some(file) = &config.file {
                return Err(MessageError::InvalidArgument(format!(
                    "{} cannot upload {}",
                    config.method,
                    file.path.display()
                )));
            }
            if !config.parameters.is_empty() {
                url.query_pairs_mut().extend_pairs(config.parameters.iter());
            }
            None
        }
        HttpMethod::Post | HttpMethod::Put => {
            if config.file.is_some() {
                // The transport owns the multipart content type and its boundary.
                headers.retain(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE));
                Some(RequestBody::Multipart(multipart_form(config)?))
            } else {
                let (content_type, body) = match config.encoding {
                    BodyEncoding::Form => form_body(config),
                    BodyEncoding::Json => json_body(config)?,
                };
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
                    headers.push((CONTENT_TYPE.to_string(), content_type));
                }
                Some(RequestBody::Bytes(body))
            }
        }
    };
    Ok(HttpRequest {
        method: config.method,
        url,
        headers,
        body,
        timeout: config.timeout,
    })
}

fn form_body(config: &MessageConfig) -> (String, Vec<u8>) {
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(config.parameters.iter())
        .finish();
    (
        mime::APPLICATION_WWW_FORM_URLENCODED.to_string(),
        body.into_bytes(),
    )
}

fn json_body(config: &MessageConfig) -> Result<(String, Vec<u8>), MessageError> {
    let body = serde_json::to_vec(&config.parameters)
        .map_err(|e| MessageError::InvalidArgument(e.to_string()))?;
    Ok((mime::APPLICATION_JSON.to_string(), body))
}

fn multipart_form(config: &MessageConfig) -> Result<MultipartForm, MessageError> {
    let fields = config
        .parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let file = match &config.file {
        Some(file) => {
            let content = std::fs::read(&file.path).map_err(|e| {
                MessageError::InvalidArgument(format!("cannot read {}: {}", file.path.display(), e))
            })?;
            let filename = file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.field.clone());
            Some(FilePart {
                field: file.field.clone(),
                filename,
                mime: mime_for_path(&file.path).to_string(),
                content,
            })
        }
        None => None,
    };
    Ok(MultipartForm { fields, file })
}
