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

//! Asynchronous HTTP message dispatch.
//!
//! A [`Message`] is one HTTP request wrapped in the [`AsyncTask`] state
//! machine. Messages are submitted to a [`MessageCenter`], which runs at most
//! `max_concurrency` of them at a time and queues the rest in submission
//! order. Every message delivers its outcome exactly once through its
//! response callback, unless it is cancelled first.
//!
//! [`MessageService`] is the convenience layer on top: it keeps a registered
//! base url, builds messages through the `*_message_with_*` factories and
//! publishes network availability notifications.

#![allow(unknown_lints, missing_docs, clippy::new_without_default)]

#[macro_use]
extern crate log;

#[macro_use]
mod macros;

mod config;
mod runtime;

pub mod center;
pub mod message;
pub mod observe;
pub mod operation;
pub mod reachability;
pub mod service;
pub mod transport;

pub use center::{CenterConfig, MessageCenter};
pub use config::{
    ClientConfig, DEFAULT_FILE_FIELD, DEFAULT_MAX_CONCURRENCY, CONNECT_TIMEOUT, REQUEST_TIMEOUT,
};
pub use message::error::{MessageError, TransportError, TransportErrorKind};
pub use message::factory::{
    delete_message_with_parameters, delete_message_with_url, get_message_with_parameters,
    get_message_with_url, is_internet_available, message_with_parameters,
    post_message_with_parameters, post_message_with_url, put_message_with_parameters,
    put_message_with_url, register_base_url, start_network_notifiers,
};
pub use message::{
    BodyEncoding, FileUpload, HttpMethod, Message, MessageConfig, MessageConfigBuilder,
    MessageContext, Parameters, Progress, Target,
};
pub use observe::NetworkNotification;
pub use operation::{AsyncTask, OperationCore, State};
pub use reachability::{AlwaysReachable, Reachability};
pub use request_utils::task_id::TaskId;
pub use service::{MessageService, MessageServiceBuilder};
