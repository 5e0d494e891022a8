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

//! Network availability notifications.

use request_utils::observe::network::Observer;
use tokio::sync::broadcast;

/// Posted whenever the probe sees the internet come or go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkNotification {
    InternetDidBecomeAvailable,
    InternetDidBecomeUnavailable,
}

impl NetworkNotification {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkNotification::InternetDidBecomeAvailable => {
                "InternetDidBecomeAvailableNotification"
            }
            NetworkNotification::InternetDidBecomeUnavailable => {
                "InternetDidBecomeUnavailableNotification"
            }
        }
    }
}

/// Republishes network transitions to subscribers.
pub(crate) struct NetNotifier {
    tx: broadcast::Sender<NetworkNotification>,
}

impl NetNotifier {
    pub(crate) fn new(tx: broadcast::Sender<NetworkNotification>) -> Self {
        Self { tx }
    }

    fn post(&self, notification: NetworkNotification) {
        info!("post {}", notification.name());
        // No subscriber is not an error.
        let _ = self.tx.send(notification);
    }
}

impl Observer for NetNotifier {
    fn net_available(&self) {
        self.post(NetworkNotification::InternetDidBecomeAvailable);
    }

    fn net_lost(&self) {
        self.post(NetworkNotification::InternetDidBecomeUnavailable);
    }
}
