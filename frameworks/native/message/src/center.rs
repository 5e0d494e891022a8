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

//! Bounded concurrent dispatch of tasks.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use request_utils::task_id::TaskId;
use tokio::runtime::Handle;

use crate::config::DEFAULT_MAX_CONCURRENCY;
use crate::operation::{AsyncTask, SlotOwner, State};
use crate::runtime::default_handle;

/// Settings of a [`MessageCenter`].
#[derive(Clone, Debug)]
pub struct CenterConfig {
    /// Upper bound of tasks executing at once. Zero is treated as one.
    pub max_concurrency: usize,
    /// Runtime the tasks are started on. `None` selects a shared runtime
    /// owned by this crate.
    pub handle: Option<Handle>,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            handle: None,
        }
    }
}

/// Admits tasks, runs at most `max_concurrency` of them and queues the rest.
///
/// Waiting tasks are admitted in submission order whenever a slot frees. A
/// slot frees when an admitted task finishes, or when it is cancelled
/// before it started. Cloning yields another handle to the same center.
#[derive(Clone)]
pub struct MessageCenter {
    inner: Arc<CenterInner>,
}

struct CenterInner {
    handle: Handle,
    queue: Mutex<Queue>,
}

struct Queue {
    max_concurrency: usize,
    running: HashMap<TaskId, Arc<dyn AsyncTask>>,
    waiting: VecDeque<Arc<dyn AsyncTask>>,
}

impl MessageCenter {
    pub fn new(config: CenterConfig) -> Self {
        Self {
            inner: Arc::new(CenterInner {
                handle: config.handle.unwrap_or_else(default_handle),
                queue: Mutex::new(Queue {
                    max_concurrency: config.max_concurrency.max(1),
                    running: HashMap::new(),
                    waiting: VecDeque::new(),
                }),
            }),
        }
    }

    /// The process wide default center.
    pub fn get_instance() -> &'static Self {
        static MESSAGE_CENTER: OnceLock<MessageCenter> = OnceLock::new();
        MESSAGE_CENTER.get_or_init(|| MessageCenter::new(CenterConfig::default()))
    }

    /// Admits a Pending task. It starts right away when a slot is free and
    /// waits otherwise. Returns `false` for a task that is not Pending, is
    /// already tracked by this center or was admitted by another center.
    pub fn submit(&self, task: Arc<dyn AsyncTask>) -> bool {
        let task_id = task.task_id().clone();
        let mut queue = self.inner.lock();
        if queue.contains(&task_id) {
            warn!("{} already submitted", task_id.brief());
            return false;
        }
        if task.state() != State::Pending {
            warn!("{} not submitted, state {}", task_id.brief(), task.state());
            return false;
        }
        let owner: Weak<dyn SlotOwner> = Arc::downgrade(&self.inner) as Weak<dyn SlotOwner>;
        if !task.core().attach(owner) {
            warn!("{} not submitted, owned by another center", task_id.brief());
            return false;
        }
        // Started or cancelled by someone else in the meantime.
        if task.state() != State::Pending {
            task.core().detach();
            warn!("{} not submitted, state {}", task_id.brief(), task.state());
            return false;
        }
        if queue.running.len() < queue.max_concurrency {
            queue.running.insert(task_id.clone(), task.clone());
            drop(queue);
            info!("{} submitted and admitted", task_id.brief());
            self.inner.spawn_start(task);
        } else {
            queue.waiting.push_back(task);
            info!(
                "{} submitted and waiting, {} ahead",
                task_id.brief(),
                queue.waiting.len() - 1
            );
        }
        true
    }

    /// Cancels the tracked task with `task_id`. A waiting task leaves the
    /// queue without ever starting; a running one is told to abort and
    /// keeps its slot until it finishes. Returns `false` if the task is
    /// unknown or already terminal.
    pub fn cancel(&self, task_id: &TaskId) -> bool {
        let task = {
            let queue = self.inner.lock();
            queue.running.get(task_id).cloned().or_else(|| {
                queue
                    .waiting
                    .iter()
                    .find(|task| task.task_id() == task_id)
                    .cloned()
            })
        };
        match task {
            Some(task) => task.cancel(),
            None => false,
        }
    }

    /// Cancels every tracked task, waiting ones first.
    pub fn cancel_all(&self) {
        let (waiting, running): (Vec<_>, Vec<_>) = {
            let queue = self.inner.lock();
            (
                queue.waiting.iter().cloned().collect(),
                queue.running.values().cloned().collect(),
            )
        };
        info!(
            "cancel all, {} waiting, {} running",
            waiting.len(),
            running.len()
        );
        for task in waiting.into_iter().chain(running) {
            task.cancel();
        }
    }

    /// Changes the concurrency bound. Raising it admits waiting tasks at
    /// once; lowering it lets running tasks complete.
    pub fn set_max_concurrency(&self, max_concurrency: usize) {
        let admitted = {
            let mut queue = self.inner.lock();
            queue.max_concurrency = max_concurrency.max(1);
            info!("max concurrency set to {}", queue.max_concurrency);
            queue.admit()
        };
        for task in admitted {
            self.inner.spawn_start(task);
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.lock().max_concurrency
    }

    /// Tasks holding a slot: executing, or admitted and about to start.
    pub fn running_count(&self) -> usize {
        self.inner.lock().running.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.inner.lock().contains(task_id)
    }
}

impl CenterInner {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_start(&self, task: Arc<dyn AsyncTask>) {
        self.handle.spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| task.clone().start()));
            if result.is_err() {
                error!("{} panicked while starting", task.task_id().brief());
                // A panicking task may never reach finish on its own.
                if !task.finish() {
                    task.cancel();
                }
            }
        });
    }
}

impl SlotOwner for CenterInner {
    fn task_finish(&self, task_id: &TaskId) {
        let admitted = {
            let mut queue = self.lock();
            if queue.running.remove(task_id).is_some() {
                debug!("{} released its slot", task_id.brief());
            } else {
                queue.waiting.retain(|task| task.task_id() != task_id);
            }
            queue.admit()
        };
        for task in admitted {
            self.spawn_start(task);
        }
    }
}

impl Queue {
    fn contains(&self, task_id: &TaskId) -> bool {
        self.running.contains_key(task_id)
            || self.waiting.iter().any(|task| task.task_id() == task_id)
    }

    // Moves waiting tasks into free slots, oldest first.
    fn admit(&mut self) -> Vec<Arc<dyn AsyncTask>> {
        let mut admitted = Vec::new();
        while self.running.len() < self.max_concurrency {
            let Some(task) = self.waiting.pop_front() else {
                break;
            };
            if task.state() != State::Pending {
                continue;
            }
            info!("{} admitted", task.task_id().brief());
            self.running.insert(task.task_id().clone(), task.clone());
            admitted.push(task);
        }
        admitted
    }
}
