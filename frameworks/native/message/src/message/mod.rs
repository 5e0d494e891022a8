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

//! HTTP requests as dispatchable tasks.

pub mod body;
pub mod error;
pub mod factory;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use self::error::{MessageError, TransportError};
use self::parser::{JsonParser, ResponseParser};
use crate::center::MessageCenter;
use crate::config::DEFAULT_FILE_FIELD;
use crate::operation::{Abort, AsyncTask, OperationCore, State};
use crate::reachability::{AlwaysReachable, Reachability};
use crate::transport::{default_transport, CommonHandle, RawResponse, TransferSink, Transport};

/// Request parameters, ordered by key.
pub type Parameters = BTreeMap<String, String>;

/// Receives the outcome of a message. Called at most once.
pub type ResponseCallback = Box<dyn FnOnce(Result<Value, MessageError>) + Send>;

/// Receives transfer progress. May be called any number of times.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a message is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// `action` resolved against `base`. A leading `/` in `action` is
    /// ignored so that the path of `base` is kept.
    Action { base: Url, action: String },
    /// A complete url.
    Url(Url),
}

impl Target {
    pub fn resolve(&self) -> Result<Url, MessageError> {
        match self {
            Target::Action { base, action } => base
                .join(action.trim_start_matches('/'))
                .map_err(|e| MessageError::InvalidArgument(format!("invalid action {}: {}", action, e))),
            Target::Url(url) => Ok(url.clone()),
        }
    }
}

/// A file sent as one part of a `multipart/form-data` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub path: PathBuf,
    pub field: String,
}

impl FileUpload {
    /// Uploads `path` under the default field name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            field: DEFAULT_FILE_FIELD.to_string(),
        }
    }
}

/// How POST and PUT parameters are encoded when no file is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    #[default]
    Form,
    Json,
}

/// Transfer counters, forwarded exactly as the transport reports them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Bytes moved by this step.
    pub bytes: u64,
    /// Bytes moved so far.
    pub total: u64,
    /// Bytes expected overall, when known.
    pub expected: Option<u64>,
}

/// Everything a [`Message`] is built from.
pub struct MessageConfig {
    pub(crate) method: HttpMethod,
    pub(crate) target: Target,
    pub(crate) parameters: Parameters,
    pub(crate) file: Option<FileUpload>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) encoding: BodyEncoding,
    pub(crate) timeout: Option<Duration>,
    pub(crate) parser: Arc<dyn ResponseParser>,
    on_response: Mutex<Option<ResponseCallback>>,
    on_upload_progress: Option<ProgressCallback>,
    on_download_progress: Option<ProgressCallback>,
}

/// Builder of [`MessageConfig`].
///
/// ```rust
/// use request_message::{HttpMethod, MessageConfigBuilder, Target};
/// use url::Url;
///
/// let target = Target::Url(Url::parse("https://api.example.com/items").unwrap());
/// let mut builder = MessageConfigBuilder::new(target);
/// builder
///     .method(HttpMethod::Put)
///     .parameter("name", "box")
///     .header("X-Trace", "1")
///     .on_response(|result| println!("{:?}", result));
/// let config = builder.build();
/// ```
pub struct MessageConfigBuilder {
    config: MessageConfig,
}

impl MessageConfigBuilder {
    pub fn new(target: Target) -> Self {
        Self {
            config: MessageConfig {
                method: HttpMethod::default(),
                target,
                parameters: Parameters::new(),
                file: None,
                headers: Vec::new(),
                encoding: BodyEncoding::default(),
                timeout: None,
                parser: Arc::new(JsonParser),
                on_response: Mutex::new(None),
                on_upload_progress: None,
                on_download_progress: None,
            },
        }
    }

    pub fn method(&mut self, method: HttpMethod) -> &mut Self {
        self.config.method = method;
        self
    }

    pub fn parameters(&mut self, parameters: Parameters) -> &mut Self {
        self.config.parameters = parameters;
        self
    }

    pub fn parameter(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.config.parameters.insert(key.into(), value.into());
        self
    }

    pub fn file(&mut self, file: FileUpload) -> &mut Self {
        self.config.file = Some(file);
        self
    }

    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    pub fn encoding(&mut self, encoding: BodyEncoding) -> &mut Self {
        self.config.encoding = encoding;
        self
    }

    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn parser(&mut self, parser: impl ResponseParser + 'static) -> &mut Self {
        self.config.parser = Arc::new(parser);
        self
    }

    pub fn on_response<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(Result<Value, MessageError>) + Send + 'static,
    {
        self.config.on_response = Mutex::new(Some(Box::new(f)));
        self
    }

    pub fn on_upload_progress<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.config.on_upload_progress = Some(Arc::new(f));
        self
    }

    pub fn on_download_progress<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.config.on_download_progress = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> MessageConfig {
        self.config
    }
}

/// The collaborators a message works with.
#[derive(Clone)]
pub struct MessageContext {
    pub center: MessageCenter,
    pub transport: Arc<dyn Transport>,
    pub reachability: Arc<dyn Reachability>,
}

impl MessageContext {
    pub fn new(
        center: MessageCenter,
        transport: Arc<dyn Transport>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            center,
            transport,
            reachability,
        }
    }
}

impl Default for MessageContext {
    /// The default center, the default transport and no reachability check.
    fn default() -> Self {
        Self::new(
            MessageCenter::get_instance().clone(),
            default_transport(),
            Arc::new(AlwaysReachable),
        )
    }
}

/// One HTTP request as an [`AsyncTask`].
///
/// The response callback receives the parsed body of a successful response
/// or the error that ended the message. It fires at most once, and never
/// after the message was cancelled. Once delivery has begun the message can
/// no longer be cancelled.
pub struct Message {
    core: OperationCore,
    config: MessageConfig,
    context: MessageContext,
    handle: Mutex<Option<Arc<dyn CommonHandle>>>,
    // Written under the `on_response` lock only.
    delivered: AtomicBool,
}

impl Message {
    pub fn new(config: MessageConfig, context: MessageContext) -> Arc<Self> {
        Arc::new(Self {
            core: OperationCore::new(),
            config,
            context,
            handle: Mutex::new(None),
            delivered: AtomicBool::new(false),
        })
    }

    /// Submits to the center of the message's context.
    pub fn send(self: &Arc<Self>) -> bool {
        self.send_to(&self.context.center)
    }

    /// Submits to another center.
    pub fn send_to(self: &Arc<Self>, center: &MessageCenter) -> bool {
        center.submit(self.clone())
    }

    pub fn method(&self) -> HttpMethod {
        self.config.method
    }

    pub fn target(&self) -> &Target {
        &self.config.target
    }

    /// The resolved url, without the query parameters added on sending.
    pub fn url(&self) -> Result<Url, MessageError> {
        self.config.target.resolve()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.config.parameters
    }

    pub fn file(&self) -> Option<&FileUpload> {
        self.config.file.as_ref()
    }

    /// Single exit of every exchange. Turns the transport result into the
    /// callback value, delivers it and finishes the message.
    pub fn received_response(&self, result: Result<RawResponse, TransportError>) {
        let result = match result {
            Ok(raw) if raw.status >= 400 => {
                Err(MessageError::from(TransportError::status(raw.status, &raw.body)))
            }
            Ok(raw) => self.config.parser.parse(&raw),
            Err(e) => Err(MessageError::from(e)),
        };
        match &result {
            Ok(_) => info!("{} succeeded", self.task_id().brief()),
            Err(e) => error!("{} failed: {}", self.task_id().brief(), e),
        }
        self.deliver(result);
        self.finish();
    }

    fn fail(&self, error: MessageError) {
        error!("{} failed: {}", self.task_id().brief(), error);
        self.deliver(Err(error));
        self.finish();
    }

    fn deliver(&self, result: Result<Value, MessageError>) {
        let callback = {
            let mut on_response = self
                .config
                .on_response
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if self.state() != State::Executing || self.delivered.load(Ordering::Relaxed) {
                None
            } else {
                self.delivered.store(true, Ordering::Relaxed);
                on_response.take()
            }
        };
        if let Some(callback) = callback {
            callback(result);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.state() == State::Cancelled
    }
}

impl AsyncTask for Message {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn on_start(self: Arc<Self>) {
        if !self.context.reachability.is_reachable() {
            self.fail(MessageError::InternetUnavailable);
            return;
        }
        let request = match self
            .config
            .target
            .resolve()
            .and_then(|url| body::build_request(&self.config, url))
        {
            Ok(request) => request,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        if self.is_cancelled() {
            self.finish();
            return;
        }
        info!(
            "{} send {} {}",
            self.task_id().brief(),
            request.method,
            request.url
        );
        let sink = Arc::new(MessageSink {
            message: self.clone(),
        });
        let handle = self.context.transport.perform(request, sink);
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        // A cancel that arrived before the handle was stored could not abort it.
        if self.is_cancelled() {
            let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(handle) = handle {
                handle.cancel();
            }
        }
    }

    /// Cancels unless delivery of the response has already begun. The
    /// state change and the delivery claim share the `on_response` lock, so
    /// exactly one of them wins.
    fn cancel(&self) -> bool {
        let (abort, callback) = {
            let mut on_response = self
                .config
                .on_response
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if self.delivered.load(Ordering::Relaxed) {
                debug!("{} already delivering, not cancelled", self.task_id().brief());
                return false;
            }
            let abort = self.core.abort();
            let callback = match abort {
                Abort::Rejected => None,
                _ => on_response.take(),
            };
            (abort, callback)
        };
        drop(callback);
        match abort {
            Abort::FromPending => {
                info!("{} cancelled before start", self.task_id().brief());
                true
            }
            Abort::FromExecuting => {
                info!("{} cancelled while executing", self.task_id().brief());
                self.on_cancel();
                true
            }
            Abort::Rejected => false,
        }
    }

    fn on_cancel(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("task_id", self.task_id())
            .field("state", &self.state())
            .field("method", &self.config.method)
            .field("target", &self.config.target)
            .finish()
    }
}

struct MessageSink {
    message: Arc<Message>,
}

impl TransferSink for MessageSink {
    fn upload_progress(&self, progress: Progress) {
        if self.message.is_cancelled() {
            return;
        }
        if let Some(callback) = &self.message.config.on_upload_progress {
            callback(progress);
        }
    }

    fn download_progress(&self, progress: Progress) {
        if self.message.is_cancelled() {
            return;
        }
        if let Some(callback) = &self.message.config.on_download_progress {
            callback(progress);
        }
    }

    fn complete(&self, result: Result<RawResponse, TransportError>) {
        self.message.received_response(result);
    }

    fn cancelled(&self) {
        if self.message.is_cancelled() {
            debug!("{} transport aborted", self.message.task_id().brief());
            self.message.finish();
        } else {
            self.message.received_response(Err(TransportError::aborted()));
        }
    }
}
