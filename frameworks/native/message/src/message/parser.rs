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

//! Conversion of response bodies into values.

use serde_json::Value;

use super::error::MessageError;
use crate::transport::RawResponse;

/// Turns a successful response into the value handed to the response
/// callback.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, response: &RawResponse) -> Result<Value, MessageError>;
}

/// Parses the body as JSON. An empty or all-whitespace body yields
/// [`Value::Null`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonParser;

impl ResponseParser for JsonParser {
    fn parse(&self, response: &RawResponse) -> Result<Value, MessageError> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| MessageError::Parse(e.to_string()))
    }
}

/// Hands the body over as a UTF-8 string.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextParser;

impl ResponseParser for TextParser {
    fn parse(&self, response: &RawResponse) -> Result<Value, MessageError> {
        String::from_utf8(response.body.clone())
            .map(Value::String)
            .map_err(|e| MessageError::Parse(e.to_string()))
    }
}
