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

//! reqwest client construction.

use std::sync::LazyLock;

use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::ClientConfig;
use crate::message::error::TransportError;

/// Builds a client from `config`.
pub(crate) fn build_client(config: &ClientConfig) -> Result<Client, TransportError> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .redirect(Policy::limited(config.max_redirects));
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    builder.build().map_err(|e| TransportError::from(&e))
}

/// The client shared by every default transport.
pub(crate) fn client() -> &'static Client {
    static CLIENT: LazyLock<Client> = LazyLock::new(|| {
        build_client(&ClientConfig::default()).unwrap_or_else(|e| {
            error!("build default client failed, fall back to defaults: {}", e);
            Client::new()
        })
    });
    &CLIENT
}
