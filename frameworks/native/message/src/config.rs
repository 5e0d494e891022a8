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

//! Defaults and client configuration.

use std::time::Duration;

/// Messages a center runs at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Multipart field name of an uploaded file unless configured otherwise.
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Timeout for establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for a whole request, from sending to the last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Settings of the HTTP client used by the default transport.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    /// Per request timeout. Individual messages may override it.
    pub request_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: Some(concat!("request_message/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}
