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

//! Default instances and the registered base url.

use std::sync::{Arc, OnceLock, RwLock};

use request_utils::observe::network::{
    NetRegisterError, NetRegistrar, NetUnregisterError, NetworkMonitor, ProbeConfig,
};
use tokio::sync::broadcast;
use url::Url;

use crate::center::MessageCenter;
use crate::message::error::MessageError;
use crate::message::{MessageContext, Target};
use crate::observe::{NetNotifier, NetworkNotification};
use crate::reachability::Reachability;
use crate::transport::{default_transport, Transport};

const NOTIFICATION_CAPACITY: usize = 16;

/// Ties a base url, a center, a transport and network observation together.
///
/// Most programs use the process wide [`MessageService::get_instance`]
/// through the free functions of [`factory`](crate::message::factory).
/// Independent services are built with [`MessageService::builder`].
pub struct MessageService {
    base_url: RwLock<Option<Url>>,
    context: MessageContext,
    monitor: NetworkMonitor,
    registrar: NetRegistrar,
    probe: ProbeConfig,
    notifications: broadcast::Sender<NetworkNotification>,
}

impl MessageService {
    pub fn builder() -> MessageServiceBuilder {
        MessageServiceBuilder::new()
    }

    pub fn get_instance() -> &'static Self {
        static MESSAGE_SERVICE: OnceLock<MessageService> = OnceLock::new();
        MESSAGE_SERVICE.get_or_init(|| MessageService::builder().build())
    }

    /// Sets the url that actions are resolved against.
    ///
    /// Only absolute http and https urls are accepted. A missing trailing
    /// `/` is added so that actions extend the path instead of replacing its
    /// last segment. Query and fragment are dropped.
    pub fn register_base_url(&self, base_url: &str) -> Result<(), MessageError> {
        let mut url = parse_http_url(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);
        info!("base url registered: {}", url);
        *self.base_url.write().unwrap_or_else(|e| e.into_inner()) = Some(url);
        Ok(())
    }

    pub fn base_url(&self) -> Option<Url> {
        self.base_url
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// `action` relative to the registered base url.
    pub fn action_target(&self, action: &str) -> Result<Target, MessageError> {
        let base = self
            .base_url()
            .ok_or_else(|| MessageError::InvalidArgument("no base url registered".to_string()))?;
        Ok(Target::Action {
            base,
            action: action.to_string(),
        })
    }

    /// A complete http or https url.
    pub fn url_target(url: &str) -> Result<Target, MessageError> {
        parse_http_url(url).map(Target::Url)
    }

    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    pub fn center(&self) -> &MessageCenter {
        &self.context.center
    }

    /// Starts probing the network. Subscribers then receive a
    /// [`NetworkNotification`] on every availability change, starting with
    /// the result of the first probe.
    pub fn start_network_notifiers(&self) -> Result<(), NetRegisterError> {
        self.registrar.register(self.probe.clone())
    }

    pub fn stop_network_notifiers(&self) -> Result<(), NetUnregisterError> {
        self.registrar.unregister()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NetworkNotification> {
        self.notifications.subscribe()
    }

    /// Last known availability. `true` until a probe has failed.
    pub fn is_internet_available(&self) -> bool {
        self.monitor.is_available()
    }
}

fn parse_http_url(input: &str) -> Result<Url, MessageError> {
    let url = Url::parse(input)
        .map_err(|e| MessageError::InvalidArgument(format!("invalid url {}: {}", input, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(MessageError::InvalidArgument(format!(
            "unsupported scheme {} in {}",
            scheme, input
        ))),
    }
}

/// Builder of [`MessageService`].
///
/// Unset parts default to the shared center, the shared HTTP transport and
/// the service's own network monitor as reachability check.
pub struct MessageServiceBuilder {
    center: Option<MessageCenter>,
    transport: Option<Arc<dyn Transport>>,
    reachability: Option<Arc<dyn Reachability>>,
    probe: ProbeConfig,
    base_url: Option<String>,
}

impl MessageServiceBuilder {
    pub fn new() -> Self {
        Self {
            center: None,
            transport: None,
            reachability: None,
            probe: ProbeConfig::default(),
            base_url: None,
        }
    }

    pub fn center(&mut self, center: MessageCenter) -> &mut Self {
        self.center = Some(center);
        self
    }

    pub fn transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.transport = Some(transport);
        self
    }

    pub fn reachability(&mut self, reachability: Arc<dyn Reachability>) -> &mut Self {
        self.reachability = Some(reachability);
        self
    }

    pub fn probe(&mut self, probe: ProbeConfig) -> &mut Self {
        self.probe = probe;
        self
    }

    /// Registered on [`build`](Self::build). An invalid url is logged and
    /// left unregistered.
    pub fn base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> MessageService {
        let monitor = NetworkMonitor::new();
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let registrar = NetRegistrar::new();
        registrar.add_observer(monitor.clone());
        registrar.add_observer(NetNotifier::new(notifications.clone()));

        let reachability = self
            .reachability
            .unwrap_or_else(|| Arc::new(monitor.clone()));
        let context = MessageContext::new(
            self.center
                .unwrap_or_else(|| MessageCenter::get_instance().clone()),
            self.transport.unwrap_or_else(default_transport),
            reachability,
        );
        let service = MessageService {
            base_url: RwLock::new(None),
            context,
            monitor,
            registrar,
            probe: self.probe,
            notifications,
        };
        if let Some(base_url) = self.base_url {
            if let Err(e) = service.register_base_url(&base_url) {
                error!("base url not registered: {}", e);
            }
        }
        service
    }
}
