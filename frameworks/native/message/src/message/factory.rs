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

//! Message factories.
//!
//! Every factory validates its target, builds a [`Message`], submits it and
//! returns it without waiting. When the target is unusable the callback
//! receives [`MessageError::InvalidArgument`] before the factory returns,
//! nothing is submitted and `None` is returned.
//!
//! The free functions work on [`MessageService::get_instance`].
//!
//! ```rust,no_run
//! use request_message::{get_message_with_parameters, register_base_url, Parameters};
//!
//! register_base_url("https://api.example.com/").unwrap();
//!
//! let mut parameters = Parameters::new();
//! parameters.insert("q".to_string(), "x".to_string());
//! let message = get_message_with_parameters(parameters, "search", |result| {
//!     println!("{:?}", result);
//! });
//! assert!(message.is_some());
//! ```

use std::sync::Arc;

use request_utils::observe::network::NetRegisterError;
use serde_json::Value;

use super::error::MessageError;
use super::{FileUpload, HttpMethod, Message, MessageConfigBuilder, Parameters, Target};
use crate::service::MessageService;

impl MessageService {
    /// POST to the registered base url itself.
    pub fn message_with_parameters<F>(&self, parameters: Parameters, callback: F) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        self.post_message_with_parameters(parameters, "", callback)
    }

    pub fn post_message_with_parameters<F>(
        &self,
        parameters: Parameters,
        action: &str,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = self.action_target(action);
        self.dispatch(HttpMethod::Post, target, parameters, None, callback)
    }

    pub fn post_message_with_url<F>(&self, parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = MessageService::url_target(url);
        self.dispatch(HttpMethod::Post, target, parameters, None, callback)
    }

    pub fn get_message_with_parameters<F>(
        &self,
        parameters: Parameters,
        action: &str,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = self.action_target(action);
        self.dispatch(HttpMethod::Get, target, parameters, None, callback)
    }

    /// GET a complete url. Any query it carries is sent as is.
    pub fn get_message_with_url<F>(&self, url: &str, callback: F) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = MessageService::url_target(url);
        self.dispatch(HttpMethod::Get, target, Parameters::new(), None, callback)
    }

    pub fn put_message_with_parameters<F>(
        &self,
        parameters: Parameters,
        action: &str,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = self.action_target(action);
        self.dispatch(HttpMethod::Put, target, parameters, None, callback)
    }

    pub fn put_message_with_url<F>(&self, parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = MessageService::url_target(url);
        self.dispatch(HttpMethod::Put, target, parameters, None, callback)
    }

    pub fn delete_message_with_parameters<F>(
        &self,
        parameters: Parameters,
        action: &str,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = self.action_target(action);
        self.dispatch(HttpMethod::Delete, target, parameters, None, callback)
    }

    pub fn delete_message_with_url<F>(&self, parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = MessageService::url_target(url);
        self.dispatch(HttpMethod::Delete, target, parameters, None, callback)
    }

    /// POST `file` as `multipart/form-data` together with `parameters`.
    pub fn upload_message_with_parameters<F>(
        &self,
        parameters: Parameters,
        action: &str,
        file: FileUpload,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = self.action_target(action);
        self.dispatch(HttpMethod::Post, target, parameters, Some(file), callback)
    }

    fn dispatch<F>(
        &self,
        method: HttpMethod,
        target: Result<Target, MessageError>,
        parameters: Parameters,
        file: Option<FileUpload>,
        callback: F,
    ) -> Option<Arc<Message>>
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        let target = match target {
            Ok(target) => target,
            Err(e) => {
                error!("{} message rejected: {}", method, e);
                callback(Err(e));
                return None;
            }
        };
        let mut builder = MessageConfigBuilder::new(target);
        builder
            .method(method)
            .parameters(parameters)
            .on_response(callback);
        if let Some(file) = file {
            builder.file(file);
        }
        let message = Message::new(builder.build(), self.context().clone());
        message.send();
        Some(message)
    }
}

pub fn register_base_url(base_url: &str) -> Result<(), MessageError> {
    MessageService::get_instance().register_base_url(base_url)
}

pub fn start_network_notifiers() -> Result<(), NetRegisterError> {
    MessageService::get_instance().start_network_notifiers()
}

pub fn is_internet_available() -> bool {
    MessageService::get_instance().is_internet_available()
}

pub fn message_with_parameters<F>(parameters: Parameters, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().message_with_parameters(parameters, callback)
}

pub fn post_message_with_parameters<F>(parameters: Parameters, action: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().post_message_with_parameters(parameters, action, callback)
}

pub fn post_message_with_url<F>(parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().post_message_with_url(parameters, url, callback)
}

pub fn get_message_with_parameters<F>(parameters: Parameters, action: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().get_message_with_parameters(parameters, action, callback)
}

pub fn get_message_with_url<F>(url: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().get_message_with_url(url, callback)
}

pub fn put_message_with_parameters<F>(parameters: Parameters, action: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().put_message_with_parameters(parameters, action, callback)
}

pub fn put_message_with_url<F>(parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().put_message_with_url(parameters, url, callback)
}

pub fn delete_message_with_parameters<F>(parameters: Parameters, action: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().delete_message_with_parameters(parameters, action, callback)
}

pub fn delete_message_with_url<F>(parameters: Parameters, url: &str, callback: F) -> Option<Arc<Message>>
where
    F: FnOnce(Result<Value, MessageError>) + Send + 'static,
{
    MessageService::get_instance().delete_message_with_url(parameters, url, callback)
}
