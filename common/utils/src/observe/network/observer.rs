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

/// Receives network reachability transitions.
///
/// Both methods default to doing nothing so observers only implement the
/// transitions they care about. They are called from the probe thread and
/// must not block for long.
#[allow(unused)]
pub trait Observer: Send + Sync {
    /// The network became reachable.
    fn net_available(&self) {}

    /// The network stopped being reachable.
    fn net_lost(&self) {}
}
