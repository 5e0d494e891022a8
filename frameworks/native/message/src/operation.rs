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

//! Cancelable units of asynchronous work.
//!
//! [`OperationCore`] holds the state of one task and performs every state
//! transition with a single compare-and-swap, so `start`, `finish` and
//! `cancel` may race from different threads. [`AsyncTask`] puts the
//! lifecycle on top of it:
//!
//! ```text
//! Pending ──start──> Executing ──finish──> Finished
//!    │                   │
//!    └──────cancel───────┴──────────────> Cancelled
//! ```
//!
//! Finished and Cancelled are terminal. A task never reaches Finished
//! unless its own [`AsyncTask::on_start`] work calls [`AsyncTask::finish`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use request_utils::task_id::TaskId;

pub(crate) const PENDING: usize = 0;
pub(crate) const EXECUTING: usize = 1;
pub(crate) const FINISHED: usize = 2;
pub(crate) const CANCELLED: usize = 3;

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Pending,
    Executing,
    Finished,
    Cancelled,
}

impl State {
    fn from_raw(raw: usize) -> Self {
        match raw {
            PENDING => State::Pending,
            EXECUTING => State::Executing,
            FINISHED => State::Finished,
            _ => State::Cancelled,
        }
    }

    /// Returns `true` for Finished and Cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Finished | State::Cancelled)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Pending => "pending",
            State::Executing => "executing",
            State::Finished => "finished",
            State::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Whoever holds a concurrency slot for a task and wants it back.
pub(crate) trait SlotOwner: Send + Sync {
    fn task_finish(&self, task_id: &TaskId);
}

/// Outcome of [`OperationCore::abort`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Abort {
    /// The task had not started; its slot is already released.
    FromPending,
    /// The task was running and must still call `finish`.
    FromExecuting,
    /// The task was already terminal.
    Rejected,
}

/// Shared state machine embedded in every task.
pub struct OperationCore {
    task_id: TaskId,
    state: AtomicUsize,
    released: AtomicBool,
    owner: Mutex<Option<Weak<dyn SlotOwner>>>,
}

impl OperationCore {
    /// Creates a Pending core with a freshly generated [`TaskId`].
    pub fn new() -> Self {
        Self {
            task_id: TaskId::generate(),
            state: AtomicUsize::new(PENDING),
            released: AtomicBool::new(false),
            owner: Mutex::new(None),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn state(&self) -> State {
        State::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Hands the slot of this task to `owner`. Refused once any owner was
    /// attached or the slot was already released, so a task belongs to the
    /// first center that admitted it.
    pub(crate) fn attach(&self, owner: Weak<dyn SlotOwner>) -> bool {
        let mut current = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        if current.is_some() || self.released.load(Ordering::Acquire) {
            return false;
        }
        *current = Some(owner);
        true
    }

    /// Undoes a successful [`attach`](Self::attach) by the caller.
    pub(crate) fn detach(&self) {
        self.owner.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// Pending -> Executing.
    pub(crate) fn begin(&self) -> bool {
        self.state
            .compare_exchange(PENDING, EXECUTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Executing -> Finished, releasing the slot. A task cancelled while
    /// executing only releases its slot here. Returns `true` only for the
    /// call that moved the task to Finished.
    pub(crate) fn complete(&self) -> bool {
        match self
            .state
            .compare_exchange(EXECUTING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.release();
                true
            }
            Err(CANCELLED) => {
                self.release();
                false
            }
            Err(_) => false,
        }
    }

    /// Pending | Executing -> Cancelled.
    pub(crate) fn abort(&self) -> Abort {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current != PENDING && current != EXECUTING {
                return Abort::Rejected;
            }
            match self.state.compare_exchange_weak(
                current,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(PENDING) => {
                    self.release();
                    return Abort::FromPending;
                }
                Ok(_) => return Abort::FromExecuting,
                Err(actual) => current = actual,
            }
        }
    }

    // Runs at most once per task, whichever terminal path gets here first.
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let owner = self.owner.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(owner) = owner.and_then(|owner| owner.upgrade()) {
            owner.task_finish(&self.task_id);
        }
    }
}

impl fmt::Debug for OperationCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationCore")
            .field("task_id", &self.task_id)
            .field("state", &self.state())
            .finish()
    }
}

/// A cancelable unit of work with an explicit start and finish.
///
/// Implementors provide [`core`](AsyncTask::core) and
/// [`on_start`](AsyncTask::on_start); everything else is provided.
///
/// # Contract
///
/// `on_start` runs at most once, after the task became Executing. It must
/// eventually call [`finish`](AsyncTask::finish), on every path, including
/// after a cancellation. A task that never calls `finish` stays Executing
/// forever and keeps its concurrency slot.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use request_message::{AsyncTask, OperationCore, State};
///
/// struct Noop(OperationCore);
///
/// impl AsyncTask for Noop {
///     fn core(&self) -> &OperationCore {
///         &self.0
///     }
///
///     fn on_start(self: Arc<Self>) {
///         self.finish();
///     }
/// }
///
/// let task = Arc::new(Noop(OperationCore::new()));
/// assert!(task.clone().start());
/// assert_eq!(task.state(), State::Finished);
/// assert!(!task.cancel());
/// ```
pub trait AsyncTask: Send + Sync + 'static {
    fn core(&self) -> &OperationCore;

    /// Performs the work. Must eventually call `finish`.
    fn on_start(self: Arc<Self>);

    /// Called once when an Executing task is cancelled, after the state
    /// changed. Use it to abort in-flight work.
    fn on_cancel(&self) {}

    fn task_id(&self) -> &TaskId {
        self.core().task_id()
    }

    fn state(&self) -> State {
        self.core().state()
    }

    fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Moves a Pending task to Executing and runs `on_start`. Returns
    /// `false` without doing anything for any other state.
    fn start(self: Arc<Self>) -> bool {
        if !self.core().begin() {
            debug!("{} not started, state {}", self.task_id().brief(), self.state());
            return false;
        }
        debug!("{} start", self.task_id().brief());
        self.on_start();
        true
    }

    /// Marks the work done and frees the concurrency slot. No-op on a
    /// Pending or Finished task.
    fn finish(&self) -> bool {
        let finished = self.core().complete();
        if finished {
            debug!("{} finish", self.task_id().brief());
        }
        finished
    }

    /// Cancels a Pending or Executing task. Returns `false` on a terminal
    /// task.
    ///
    /// Returns immediately. An Executing task is told through `on_cancel`
    /// and keeps its slot until its own work reaches `finish`.
    fn cancel(&self) -> bool {
        match self.core().abort() {
            Abort::FromPending => {
                info!("{} cancelled before start", self.task_id().brief());
                true
            }
            Abort::FromExecuting => {
                info!("{} cancelled while executing", self.task_id().brief());
                self.on_cancel();
                true
            }
            Abort::Rejected => false,
        }
    }
}
