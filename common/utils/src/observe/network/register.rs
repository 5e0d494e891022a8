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

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, info};

use super::wrapper::NetObserverWrapper;
use super::{Observer, ProbeConfig};

struct ProbeHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Owns network observers and the probe thread that drives them.
pub struct NetRegistrar {
    observer: Arc<Mutex<Vec<Box<dyn Observer>>>>,
    probe: Mutex<Option<ProbeHandle>>,
}

impl NetRegistrar {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(Mutex::new(Vec::new())),
            probe: Mutex::new(None),
        }
    }

    /// Adds an observer. Observers added after registration are notified
    /// from the next transition on.
    pub fn add_observer(&self, observer: impl Observer + 'static) {
        self.observer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(observer));
    }

    /// Starts probing with `config`.
    ///
    /// The first probe result is always reported; later probes report only
    /// when reachability changes.
    pub fn register(&self, config: ProbeConfig) -> Result<(), NetRegisterError> {
        let mut probe = self.probe.lock().unwrap_or_else(|e| e.into_inner());
        if probe.is_some() {
            return Err(NetRegisterError::AlreadyRegistered);
        }
        let wrapper = NetObserverWrapper::new(self.observer.clone());
        let (stop, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("net_probe".to_string())
            .spawn(move || {
                let mut last = None;
                loop {
                    let reachable = config.probe();
                    if last != Some(reachable) {
                        last = Some(reachable);
                        if reachable {
                            wrapper.net_available();
                        } else {
                            wrapper.net_lost();
                        }
                    }
                    match rx.recv_timeout(config.interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
            })
            .map_err(|e| {
                error!("spawn network probe failed: {}", e);
                NetRegisterError::RegisterFailed(e.raw_os_error().unwrap_or(-1))
            })?;
        info!("network probe registered");
        *probe = Some(ProbeHandle { stop, thread });
        Ok(())
    }

    /// Stops the probe thread and waits for it to exit.
    pub fn unregister(&self) -> Result<(), NetUnregisterError> {
        let handle = self
            .probe
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(NetUnregisterError::NotRegistered)?;
        let _ = handle.stop.send(());
        if handle.thread.join().is_err() {
            return Err(NetUnregisterError::UnregisterFailed);
        }
        info!("network probe unregistered");
        Ok(())
    }

    /// Returns `true` while the probe thread is running.
    pub fn is_registered(&self) -> bool {
        self.probe
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Drop for NetRegistrar {
    fn drop(&mut self) {
        let _ = self.unregister();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NetRegisterError {
    AlreadyRegistered,
    RegisterFailed(i32),
}

#[derive(Debug, PartialEq, Eq)]
pub enum NetUnregisterError {
    NotRegistered,
    UnregisterFailed,
}
