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

//! Errors returned by the control API

use std::fmt;
use std::io;

/// An error from a control-API operation
///
/// These correspond to the negative error codes in the peripheral library's
/// reserved band, without colliding with its own codes.
#[derive(Debug)]
pub enum SweepError {
    /// One or more frequency ranges were outside `0..=7250` MHz, or had a
    /// maximum less than its minimum
    InvalidRange,
    /// `set_range` was called with more than one range while the output mode
    /// is IFFT
    IncompatibleMode,
    /// `set_range` was called with more ranges than the documented limit
    InvalidRangeCount,
    /// A control-API call was made out of order (for example, `set_range`
    /// before `set_output`)
    NotReady,
    /// The requested FFT size was outside the supported `4..=8180` range
    InvalidFftSize,
    /// `set_write_mutex` was called a second time
    InvalidParam,
    /// A sink write failed
    Io(io::Error),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::InvalidRange => write!(f, "invalid frequency range"),
            SweepError::IncompatibleMode => {
                write!(f, "range configuration incompatible with output mode")
            }
            SweepError::InvalidRangeCount => write!(f, "too many frequency ranges"),
            SweepError::NotReady => write!(f, "control API called out of order"),
            SweepError::InvalidFftSize => write!(f, "requested FFT size out of range"),
            SweepError::InvalidParam => write!(f, "write mutex already installed"),
            SweepError::Io(e) => write!(f, "sink write error: {}", e),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SweepError {
    fn from(e: io::Error) -> Self {
        SweepError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_does_not_panic() {
        let errors = [
            SweepError::InvalidRange,
            SweepError::IncompatibleMode,
            SweepError::InvalidRangeCount,
            SweepError::NotReady,
            SweepError::InvalidFftSize,
            SweepError::InvalidParam,
        ];
        for error in &errors {
            assert!(!format!("{}", error).is_empty());
        }
    }
}
