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

use std::sync::{Arc, Mutex};

use super::Observer;

/// Fans a single reachability transition out to every registered observer.
#[derive(Clone)]
pub(crate) struct NetObserverWrapper {
    inner: Arc<Mutex<Vec<Box<dyn Observer>>>>,
}

impl NetObserverWrapper {
    pub(crate) fn new(inner: Arc<Mutex<Vec<Box<dyn Observer>>>>) -> Self {
        Self { inner }
    }

    pub(crate) fn net_available(&self) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for observer in inner.iter() {
            observer.net_available();
        }
    }

    pub(crate) fn net_lost(&self) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for observer in inner.iter() {
            observer.net_lost();
        }
    }
}
