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

//! Conditional compilation utility macros.
//!
//! Macros that include items only in, or only outside of, test builds. Used to
//! swap timing constants for shorter ones under test.

/// Keeps the wrapped items only in `cfg(test)` builds.
///
/// ```rust
/// use std::time::Duration;
/// use request_utils::{cfg_not_test, cfg_test};
///
/// cfg_test! {
///     const RETRY: Duration = Duration::from_millis(10);
/// }
/// cfg_not_test! {
///     const RETRY: Duration = Duration::from_secs(10);
/// }
///
/// assert_eq!(RETRY, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! cfg_test {
    ($($item:item)*) => {
        $(
            #[cfg(test)]
            $item
        )*
    }
}

/// Keeps the wrapped items only outside of `cfg(test)` builds.
#[macro_export]
macro_rules! cfg_not_test {
    ($($item:item)*) => {
        $(
            #[cfg(not(test))]
            $item
        )*
    }
}
