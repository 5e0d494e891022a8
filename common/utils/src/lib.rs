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

//! Common utilities for request operations.
//!
//! This crate provides the plumbing shared by the request message crates:
//! task identifiers, a fast pseudorandom generator, network reachability
//! observation and helpers used by unit tests.

#![warn(missing_docs)]
#![allow(clippy::crate_in_macro_def)]
#![allow(missing_docs, clippy::new_without_default)]

/// Internal macros module.
#[macro_use]
mod macros;

/// Fast pseudorandom number generation utilities.
pub mod fastrand;

/// Observation utilities for system events.
pub mod observe;

/// Task ID generation and management utilities.
pub mod task_id;

pub use log::{debug, error, info, warn};
