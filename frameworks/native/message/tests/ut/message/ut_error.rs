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

use super::*;

struct FakeError(i32);

impl CommonError for FakeError {
    fn code(&self) -> i32 {
        self.0
    }

    fn msg(&self) -> String {
        format!("fake {}", self.0)
    }
}

// @tc.name: ut_transport_error_kind_mapping
// @tc.desc: Verify transport codes map to their kinds
// @tc.precon: NA
// @tc.step: 1. Convert fake backend errors with several codes
// @tc.expect: Each code lands in the expected kind and keeps its message
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_transport_error_kind_mapping() {
    let cases = [
        (CONNECT_ERROR_CODE, TransportErrorKind::Connect),
        (TIMEOUT_ERROR_CODE, TransportErrorKind::Timeout),
        (REQUEST_ERROR_CODE, TransportErrorKind::Request),
        (REDIRECT_ERROR_CODE, TransportErrorKind::Request),
        (BODY_ERROR_CODE, TransportErrorKind::Body),
        (DECODE_ERROR_CODE, TransportErrorKind::Body),
        (404, TransportErrorKind::Status),
        (503, TransportErrorKind::Status),
        (OTHERS_ERROR_CODE, TransportErrorKind::Others),
        (-1, TransportErrorKind::Others),
    ];
    for (code, kind) in cases {
        let err = TransportError::from(&FakeError(code));
        assert_eq!(err.kind(), kind, "code {}", code);
        assert_eq!(err.code(), code);
        assert_eq!(err.message(), format!("fake {}", code));
    }
}

// @tc.name: ut_transport_error_status
// @tc.desc: Verify error statuses keep the start of the body
// @tc.precon: NA
// @tc.step: 1. Build status errors with an empty, a short and a long body
// @tc.expect: Kind Status, code is the status, message cut to 256 bytes
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_transport_error_status() {
    let empty = TransportError::status(404, b"  ");
    assert_eq!(empty.kind(), TransportErrorKind::Status);
    assert_eq!(empty.code(), 404);
    assert_eq!(empty.message(), "HTTP status 404");

    let short = TransportError::status(500, b"boom\n");
    assert_eq!(short.message(), "HTTP status 500: boom");

    let long = TransportError::status(502, &[b'x'; 1000]);
    assert_eq!(long.message().len(), "HTTP status 502: ".len() + 256);
}

// @tc.name: ut_message_error_codes
// @tc.desc: Verify every error category has its own code
// @tc.precon: NA
// @tc.step: 1. Build one error of each variant
// @tc.expect: code() returns the matching category constant
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_message_error_codes() {
    assert_eq!(
        MessageError::InvalidArgument("x".into()).code(),
        INVALID_ARGUMENT_CODE
    );
    assert_eq!(
        MessageError::InternetUnavailable.code(),
        INTERNET_UNAVAILABLE_CODE
    );
    assert_eq!(
        MessageError::from(TransportError::aborted()).code(),
        TRANSPORT_CODE
    );
    assert_eq!(MessageError::Parse("x".into()).code(), PARSE_CODE);
}

// @tc.name: ut_message_error_localized_description
// @tc.desc: Verify user facing descriptions
// @tc.precon: NA
// @tc.step: 1. Describe errors of every variant and transport kind
// @tc.expect: The documented sentences are returned
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 2
#[test]
fn ut_message_error_localized_description() {
    assert_eq!(
        MessageError::InvalidArgument("no base url registered".into()).localized_description(),
        "no base url registered"
    );
    assert_eq!(
        MessageError::InternetUnavailable.localized_description(),
        "The Internet connection appears to be offline."
    );
    let connect = MessageError::from(TransportError::from(&FakeError(CONNECT_ERROR_CODE)));
    assert_eq!(
        connect.localized_description(),
        "Could not connect to the server."
    );
    let timeout = MessageError::from(TransportError::from(&FakeError(TIMEOUT_ERROR_CODE)));
    assert_eq!(timeout.localized_description(), "The request timed out.");
    let status = MessageError::from(TransportError::status(403, b""));
    assert_eq!(
        status.localized_description(),
        "The server responded with status 403."
    );
    let aborted = MessageError::from(TransportError::aborted());
    assert_eq!(aborted.localized_description(), "request aborted");
    assert_eq!(
        MessageError::Parse("eof".into()).localized_description(),
        "The server response could not be read."
    );
}

// @tc.name: ut_message_error_display
// @tc.desc: Verify Display output names the category
// @tc.precon: NA
// @tc.step: 1. Format errors of several variants
// @tc.expect: Messages carry the category prefix and inner text
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 3
#[test]
fn ut_message_error_display() {
    assert_eq!(
        MessageError::InvalidArgument("bad".into()).to_string(),
        "invalid argument: bad"
    );
    assert_eq!(
        MessageError::from(TransportError::status(404, b"")).to_string(),
        "transport error: HTTP status 404"
    );
    assert_eq!(
        MessageError::InternetUnavailable.to_string(),
        "internet connection unavailable"
    );
}
