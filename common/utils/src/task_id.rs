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

//! Task identifiers.
//!
//! Every dispatched task gets a fresh [`TaskId`] when it is created. Two ids
//! compare equal only when one is a clone of the other.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fastrand::fast_random;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A unique identifier for a task instance.
///
/// # Examples
///
/// ```rust
/// use request_utils::task_id::TaskId;
///
/// let a = TaskId::generate();
/// let b = TaskId::generate();
/// assert_ne!(a, b);
///
/// // The brief form is the first quarter of the full id.
/// assert_eq!(a.brief().len() * 4, a.to_string().len());
/// ```
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct TaskId {
    hash: String,
}

impl TaskId {
    /// Wraps an existing identifier string.
    pub fn new(hash: String) -> Self {
        Self { hash }
    }

    /// Generates a new identifier distinct from every other one generated
    /// by this process.
    ///
    /// The random half keeps the brief form readable in logs, the sequence
    /// half keeps the id unique even if the generator repeats.
    pub fn generate() -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self {
            hash: format!("{:016x}{:016x}", fast_random(), seq),
        }
    }

    /// Returns the first quarter of the id, used in log lines.
    pub fn brief(&self) -> &str {
        let len = self.hash.len();
        &self.hash.as_str()[..len / 4]
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}
