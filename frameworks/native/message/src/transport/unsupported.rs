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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{CommonHandle, HttpRequest, TransferSink, Transport};
use crate::message::error::{TransportError, TransportErrorKind};

/// Fails every request. Used when no HTTP backend is compiled in and the
/// caller did not supply a transport.
pub struct UnsupportedTransport;

struct Done(AtomicBool);

impl CommonHandle for Done {
    fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

impl Transport for UnsupportedTransport {
    fn perform(&self, request: HttpRequest, sink: Arc<dyn TransferSink>) -> Arc<dyn CommonHandle> {
        error!("no transport available for {}", request.url);
        sink.complete(Err(TransportError::new(
            TransportErrorKind::Others,
            None,
            "no transport available",
        )));
        Arc::new(Done(AtomicBool::new(true)))
    }
}
