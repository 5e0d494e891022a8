// Copyright (C) 2025 Huawei Device Co., Ltd.
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

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, info};

use super::Observer;

cfg_not_test! {
    const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);
}

cfg_test! {
    const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(50);
}

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_PROBE_ADDRESS: &str = "8.8.8.8:53";

/// Last known reachability of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkState {
    /// No probe has completed yet.
    Unknown,
    /// The probe address accepted a connection.
    Online,
    /// The probe address could not be reached.
    Offline,
}

/// Where and how often the background probe checks reachability.
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// `host:port` the probe connects to. Resolved again on every probe.
    pub address: String,
    /// Pause between two probes.
    pub interval: Duration,
    /// Connect timeout of a single probe.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_PROBE_ADDRESS.to_string(),
            interval: DEFAULT_PROBE_INTERVAL,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    /// Creates a config probing `address` with the default interval and timeout.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Runs a single probe. Any address that accepts a TCP connection
    /// within the timeout counts as reachable; resolution failure does not.
    pub fn probe(&self) -> bool {
        let addrs: Vec<SocketAddr> = match self.address.to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                debug!("probe address {} not resolved: {}", self.address, e);
                return false;
            }
        };
        addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok())
    }
}

/// Observer that records the latest reachability state.
///
/// Cloning is cheap and every clone shares the same state, so one clone can
/// be registered with a [`NetRegistrar`](super::NetRegistrar) while others
/// answer queries.
#[derive(Clone)]
pub struct NetworkMonitor {
    state: Arc<RwLock<NetworkState>>,
}

impl NetworkMonitor {
    /// Creates a monitor in the [`NetworkState::Unknown`] state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(NetworkState::Unknown)),
        }
    }

    /// Returns the latest known state.
    pub fn state(&self) -> NetworkState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `true` unless the last probe failed.
    ///
    /// An unknown state counts as reachable so that requests are not
    /// rejected before the first probe completes.
    pub fn is_available(&self) -> bool {
        self.state() != NetworkState::Offline
    }

    pub(crate) fn notify_online(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state != NetworkState::Online {
            info!("network is online");
            *state = NetworkState::Online;
            true
        } else {
            false
        }
    }

    pub(crate) fn notify_offline(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state != NetworkState::Offline {
            info!("network is offline");
            *state = NetworkState::Offline;
            true
        } else {
            false
        }
    }
}

impl Observer for NetworkMonitor {
    fn net_available(&self) {
        self.notify_online();
    }

    fn net_lost(&self) {
        self.notify_offline();
    }
}
