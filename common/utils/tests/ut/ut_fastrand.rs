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

use std::thread;

use super::*;

// @tc.name: ut_fast_random_consecutive_different
// @tc.desc: Verify consecutive calls produce different values
// @tc.precon: NA
// @tc.step: 1. Call fast_random() twice
//           2. Compare the two results
// @tc.expect: Two different u64 values are returned
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 1
#[test]
fn ut_fast_random_consecutive_different() {
    let first = fast_random();
    let second = fast_random();
    assert_ne!(first, second);
}

// @tc.name: ut_fast_random_thread_isolation
// @tc.desc: Verify each thread seeds its own generator
// @tc.precon: NA
// @tc.step: 1. Spawn two threads
//           2. Each thread calls fast_random() once
// @tc.expect: Different values from each thread
// @tc.type: FUNC
// @tc.require: NA
// @tc.level: Level 3
#[test]
fn ut_fast_random_thread_isolation() {
    let first = thread::spawn(fast_random).join().unwrap();
    let second = thread::spawn(fast_random).join().unwrap();
    assert_ne!(first, second);
}
