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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::json;

use super::*;
use crate::center::CenterConfig;
use crate::message::error::TransportErrorKind;
use crate::reachability::MockReachability;
use crate::transport::{HttpRequest, MockTransport};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct CountingHandle {
    cancelled: AtomicUsize,
}

impl CommonHandle for CountingHandle {
    fn cancel(&self) -> bool {
        self.cancelled.fetch_add(1, Ordering::SeqCst) == 0
    }
}

/// Hands every request and its sink to the test.
struct FakeTransport {
    requests: Mutex<Sender<(HttpRequest, Arc<dyn TransferSink>)>>,
    handle: Arc<CountingHandle>,
}

impl Transport for FakeTransport {
    fn perform(&self, request: HttpRequest, sink: Arc<dyn TransferSink>) -> Arc<dyn CommonHandle> {
        let _ = self.requests.lock().unwrap().send((request, sink));
        self.handle.clone()
    }
}

struct Fixture {
    context: MessageContext,
    handle: Arc<CountingHandle>,
    requests: Receiver<(HttpRequest, Arc<dyn TransferSink>)>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_reachability(true)
    }

    fn with_reachability(reachable: bool) -> Self {
        request_utils::test::log::init();
        let (tx, requests) = mpsc::channel();
        let handle = Arc::new(CountingHandle::default());
        let transport = Arc::new(FakeTransport {
            requests: Mutex::new(tx),
            handle: handle.clone(),
        });
        let mut reachability = MockReachability::new();
        reachability
            .expect_is_reachable()
            .returning(move || reachable);
        let center = MessageCenter::new(CenterConfig::default());
        Self {
            context: MessageContext::new(center, transport, Arc::new(reachability)),
            handle,
            requests,
        }
    }

    fn next_request(&self) -> (HttpRequest, Arc<dyn TransferSink>) {
        self.requests.recv_timeout(WAIT).unwrap()
    }
}

fn builder(method: HttpMethod, base: &str, action: &str) -> MessageConfigBuilder {
    let mut builder = MessageConfigBuilder::new(Target::Action {
        base: Url::parse(base).unwrap(),
        action: action.to_string(),
    });
    builder.method(method);
    builder
}

fn with_channel(builder: &mut MessageConfigBuilder) -> Receiver<Result<Value, MessageError>> {
    let (tx, rx) = mpsc::channel();
    builder.on_response(move |result| {
        let _ = tx.send(result);
    });
    rx
}

fn wait_until(f: impl Fn() -> bool) {
    for _ in 0..500 {
        if f() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached");
}

// @tc.name: ut_message_unreachable
// @tc.desc: Verify an unreachable network fails without touching the
//           transport
// @tc.precon: NA
// @tc.step: 1. Build a message with a reachability check that fails and a
//              transport that must not be called
//           2. Send it
// @tc.expect: InternetUnavailable is delivered once and the message Finished
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_unreachable() {
    request_utils::test::log::init();
    let mut transport = MockTransport::new();
    transport.expect_perform().never();
    let mut reachability = MockReachability::new();
    reachability.expect_is_reachable().times(1).return_const(false);
    let context = MessageContext::new(
        MessageCenter::new(CenterConfig::default()),
        Arc::new(transport),
        Arc::new(reachability),
    );

    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "search");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), context);
    assert!(message.send());

    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        Err(MessageError::InternetUnavailable)
    );
    wait_until(|| message.state() == State::Finished);
    assert!(rx.try_recv().is_err());
}

// @tc.name: ut_message_get_round_trip
// @tc.desc: Verify a GET targets base + action + query and delivers the
//           parsed body once
// @tc.precon: NA
// @tc.step: 1. Send GET q=x to action "search" under https://api.example.com/
//           2. Complete with a JSON body
//           3. Report a second outcome
// @tc.expect: Exact url, one callback with the JSON value, Finished, the
//             second outcome ignored
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_get_round_trip() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "search");
    builder.parameter("q", "x");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();

    let (request, sink) = fixture.next_request();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url.as_str(), "https://api.example.com/search?q=x");
    assert_eq!(message.state(), State::Executing);

    sink.complete(Ok(RawResponse::new(200, r#"{"ok":true,"items":[1,2]}"#)));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        Ok(json!({ "ok": true, "items": [1, 2] }))
    );
    assert_eq!(message.state(), State::Finished);
    assert_eq!(fixture.context.center.running_count(), 0);

    sink.complete(Ok(RawResponse::new(200, "{}")));
    sink.cancelled();
    assert!(rx.try_recv().is_err());
    assert_eq!(message.state(), State::Finished);
}

// @tc.name: ut_message_leading_slash_action
// @tc.desc: Verify an action with a leading slash keeps the base path
// @tc.precon: NA
// @tc.step: 1. Send POST to action "/login" under https://api.example.com/v1/
// @tc.expect: The request goes to https://api.example.com/v1/login
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 2
#[test]
fn ut_message_leading_slash_action() {
    let fixture = Fixture::new();
    let builder = builder(HttpMethod::Post, "https://api.example.com/v1/", "/login");
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (request, sink) = fixture.next_request();
    assert_eq!(request.url.as_str(), "https://api.example.com/v1/login");
    sink.complete(Ok(RawResponse::new(204, "")));
    wait_until(|| message.state() == State::Finished);
}

// @tc.name: ut_message_error_status
// @tc.desc: Verify an error status becomes a transport error
// @tc.precon: NA
// @tc.step: 1. Complete a message with status 404
// @tc.expect: Transport error of kind Status and code 404
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_error_status() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Delete, "https://api.example.com/", "items/7");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();
    sink.complete(Ok(RawResponse::new(404, "not here")));

    match rx.recv_timeout(WAIT).unwrap() {
        Err(MessageError::Transport(e)) => {
            assert_eq!(e.kind(), TransportErrorKind::Status);
            assert_eq!(e.code(), 404);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(message.state(), State::Finished);
}

// @tc.name: ut_message_parse_error
// @tc.desc: Verify a malformed body becomes a parse error
// @tc.precon: NA
// @tc.step: 1. Complete a message with status 200 and a broken JSON body
// @tc.expect: Parse error delivered, message Finished
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_parse_error() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Post, "https://api.example.com/", "items");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();
    sink.complete(Ok(RawResponse::new(200, "{not json")));
    assert!(matches!(
        rx.recv_timeout(WAIT).unwrap(),
        Err(MessageError::Parse(_))
    ));
    assert_eq!(message.state(), State::Finished);
}

// @tc.name: ut_message_text_parser
// @tc.desc: Verify a custom parser replaces JSON parsing
// @tc.precon: NA
// @tc.step: 1. Send a message with the text parser
//           2. Complete with a plain text body
// @tc.expect: The body is delivered as a JSON string
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 2
#[test]
fn ut_message_text_parser() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "motd");
    builder.parser(parser::TextParser);
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();
    sink.complete(Ok(RawResponse::new(200, "hello")));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(json!("hello")));
}

// @tc.name: ut_message_transport_failure
// @tc.desc: Verify transport failures are delivered as they are
// @tc.precon: NA
// @tc.step: 1. Complete one message with a connect error
//           2. Report another as aborted without a cancel
// @tc.expect: The connect error, then the aborted error
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_transport_failure() {
    let fixture = Fixture::new();
    let connect = TransportError::new(TransportErrorKind::Connect, Some(1001), "refused");

    let mut first = builder(HttpMethod::Get, "https://api.example.com/", "a");
    let first_rx = with_channel(&mut first);
    Message::new(first.build(), fixture.context.clone()).send();
    let (_, sink) = fixture.next_request();
    sink.complete(Err(connect.clone()));
    assert_eq!(
        first_rx.recv_timeout(WAIT).unwrap(),
        Err(MessageError::Transport(connect))
    );

    let mut second = builder(HttpMethod::Get, "https://api.example.com/", "b");
    let second_rx = with_channel(&mut second);
    let message = Message::new(second.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();
    sink.cancelled();
    assert_eq!(
        second_rx.recv_timeout(WAIT).unwrap(),
        Err(MessageError::Transport(TransportError::aborted()))
    );
    assert_eq!(message.state(), State::Finished);
}

// @tc.name: ut_message_cancel_executing
// @tc.desc: Verify cancelling an in-flight message aborts the transport and
//           suppresses the callback
// @tc.precon: NA
// @tc.step: 1. Send a message and wait for the transport call
//           2. Cancel it
//           3. Report the abort, then a late completion
// @tc.expect: Handle cancelled once, no callback, state Cancelled, slot
//             freed once the transport reported back
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_cancel_executing() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "slow");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();

    assert!(message.cancel());
    assert_eq!(message.state(), State::Cancelled);
    wait_until(|| fixture.handle.cancelled.load(Ordering::SeqCst) > 0);
    assert_eq!(fixture.context.center.running_count(), 1);

    sink.cancelled();
    assert_eq!(fixture.context.center.running_count(), 0);
    sink.complete(Ok(RawResponse::new(200, "{}")));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(message.state(), State::Cancelled);
    assert_eq!(fixture.handle.cancelled.load(Ordering::SeqCst), 1);
}

// @tc.name: ut_message_cancel_during_delivery
// @tc.desc: Verify a cancel arriving while the response is being delivered
//           loses to the delivery
// @tc.precon: NA
// @tc.step: 1. Send a message whose callback blocks once entered
//           2. Complete the exchange from another thread
//           3. Cancel through the message and through the center while the
//              callback is blocked, then release the callback
// @tc.expect: Both cancels return false, the transport handle is untouched,
//             the result is delivered once and the message ends Finished
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_cancel_during_delivery() {
    let fixture = Fixture::new();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (result_tx, result_rx) = mpsc::channel();
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "item");
    builder.on_response(move |result| {
        let _ = entered_tx.send(());
        let _ = release_rx.recv_timeout(WAIT);
        let _ = result_tx.send(result);
    });
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();

    let completer = thread::spawn(move || sink.complete(Ok(RawResponse::new(200, "{}"))));
    entered_rx.recv_timeout(WAIT).unwrap();
    assert!(!message.cancel());
    assert!(!fixture.context.center.cancel(message.task_id()));
    assert_eq!(message.state(), State::Executing);

    release_tx.send(()).unwrap();
    completer.join().unwrap();
    assert_eq!(result_rx.recv_timeout(WAIT).unwrap().unwrap(), json!({}));
    assert_eq!(message.state(), State::Finished);
    assert!(!message.cancel());
    assert_eq!(fixture.handle.cancelled.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.context.center.running_count(), 0);
}

// @tc.name: ut_message_cancel_before_send
// @tc.desc: Verify a message cancelled before sending never runs
// @tc.precon: NA
// @tc.step: 1. Cancel a new message
//           2. Send it
// @tc.expect: Send is rejected, the transport is never called, no callback
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 2
#[test]
fn ut_message_cancel_before_send() {
    let fixture = Fixture::new();
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "never");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    assert!(message.cancel());
    assert!(!message.send());
    assert!(fixture
        .requests
        .recv_timeout(Duration::from_millis(100))
        .is_err());
    assert!(rx.try_recv().is_err());
}

// @tc.name: ut_message_progress
// @tc.desc: Verify progress is forwarded verbatim until cancellation
// @tc.precon: NA
// @tc.step: 1. Send a message with upload and download progress callbacks
//           2. Report progress, cancel, report more progress
// @tc.expect: Only the progress before the cancel arrives, unchanged
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_progress() {
    let fixture = Fixture::new();
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let downloads = Arc::new(Mutex::new(Vec::new()));
    let mut builder = builder(HttpMethod::Put, "https://api.example.com/", "blob");
    {
        let uploads = uploads.clone();
        let downloads = downloads.clone();
        builder
            .parameter("k", "v")
            .on_upload_progress(move |p| uploads.lock().unwrap().push(p))
            .on_download_progress(move |p| downloads.lock().unwrap().push(p));
    }
    let message = Message::new(builder.build(), fixture.context.clone());
    message.send();
    let (_, sink) = fixture.next_request();

    let up = Progress {
        bytes: 3,
        total: 3,
        expected: Some(3),
    };
    let down = Progress {
        bytes: 10,
        total: 10,
        expected: None,
    };
    sink.upload_progress(up);
    sink.download_progress(down);
    message.cancel();
    sink.upload_progress(up);
    sink.download_progress(down);
    sink.cancelled();

    assert_eq!(*uploads.lock().unwrap(), vec![up]);
    assert_eq!(*downloads.lock().unwrap(), vec![down]);
}

// @tc.name: ut_message_send_to
// @tc.desc: Verify send_to submits to another center
// @tc.precon: NA
// @tc.step: 1. Build a message whose context has its own center
//           2. Send it to a second center
// @tc.expect: The second center tracks it, the first does not
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 3
#[test]
fn ut_message_send_to() {
    let fixture = Fixture::new();
    let other = MessageCenter::new(CenterConfig::default());
    let message = Message::new(
        builder(HttpMethod::Get, "https://api.example.com/", "x").build(),
        fixture.context.clone(),
    );
    assert!(message.send_to(&other));
    assert!(other.contains(message.task_id()));
    assert!(!fixture.context.center.contains(message.task_id()));
    let (_, sink) = fixture.next_request();
    sink.complete(Ok(RawResponse::new(200, "")));
    wait_until(|| !other.contains(message.task_id()));
}

// @tc.name: ut_message_send_to_second_center
// @tc.desc: Verify a sent message cannot be sent again to another center
// @tc.precon: NA
// @tc.step: 1. Send a message to its own center
//           2. Send it to a second center while it is in flight
//           3. Complete the exchange
// @tc.expect: The second send is rejected and neither center keeps a slot
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 2
#[test]
fn ut_message_send_to_second_center() {
    let fixture = Fixture::new();
    let other = MessageCenter::new(CenterConfig::default());
    let mut builder = builder(HttpMethod::Get, "https://api.example.com/", "x");
    let rx = with_channel(&mut builder);
    let message = Message::new(builder.build(), fixture.context.clone());
    assert!(message.send());
    let (_, sink) = fixture.next_request();
    assert!(!message.send_to(&other));
    assert!(!other.contains(message.task_id()));

    sink.complete(Ok(RawResponse::new(200, "{}")));
    assert!(rx.recv_timeout(WAIT).unwrap().is_ok());
    assert_eq!(fixture.context.center.running_count(), 0);
    assert_eq!(other.running_count(), 0);
}
