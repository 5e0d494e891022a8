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

//! Reachability checks done before a message touches the network.

use request_utils::observe::network::NetworkMonitor;

/// Tells whether the internet is currently reachable.
#[cfg_attr(test, mockall::automock)]
pub trait Reachability: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Never blocks a message.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReachable;

impl Reachability for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

impl Reachability for NetworkMonitor {
    fn is_reachable(&self) -> bool {
        self.is_available()
    }
}
