/*
 * Copyright 2019 The Regents of the University of California
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//! Calendar formatting of the transfer timestamp for text records
//!
//! Uses `libc::gmtime_r` rather than a calendar crate, matching the
//! teacher's reliance on `libc` for everything time-related
//! (`steps/writer.rs` uses `clock_gettime` the same way).

use std::time::SystemTime;

/// Splits `t` into `("YYYY-MM-DD", "HH:MM:SS.uuuuuu")` in UTC
pub fn format_utc(t: SystemTime) -> (String, String) {
    let since_epoch = t
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs() as libc::time_t;
    let micros = since_epoch.subsec_micros();

    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    unsafe {
        libc::gmtime_r(&secs, &mut tm);
    }

    let date = format!(
        "{:04}-{:02}-{:02}",
        tm.tm_year + 1900,
        tm.tm_mon + 1,
        tm.tm_mday
    );
    let time = format!(
        "{:02}:{:02}:{:02}.{:06}",
        tm.tm_hour, tm.tm_min, tm.tm_sec, micros
    );
    (date, time)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn epoch_formats_to_1970() {
        let (date, time) = format_utc(std::time::UNIX_EPOCH);
        assert_eq!(date, "1970-01-01");
        assert_eq!(time, "00:00:00.000000");
    }

    #[test]
    fn microseconds_are_preserved() {
        let t = std::time::UNIX_EPOCH + Duration::from_micros(1_500_000);
        let (_, time) = format_utc(t);
        assert_eq!(time, "00:00:01.500000");
    }
}
