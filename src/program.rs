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

//! The sweep program: a validated list of frequency ranges

use crate::error::{Result, SweepError};
use crate::sink::OutputMode;

/// Upper bound on the number of ranges in a program, per `spec.md` §3
pub const MAX_RANGES: usize = 10;

/// Highest tunable frequency, in MHz
pub const FREQ_MAX_MHZ: u16 = 7250;

/// One `[min_mhz, max_mhz)`-derived tuning range, after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Lower bound, in MHz, as given by the caller
    pub min_mhz: u16,
    /// Upper bound, in MHz, rounded up so that `(max - min)` is a multiple of
    /// `tune_step_mhz`
    pub max_mhz: u16,
    /// Number of tuning steps in this range
    pub step_count: u32,
}

/// A validated sweep program: an ordered list of ranges plus the tuning step
/// width used to derive each range's step count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepProgram {
    ranges: Vec<Range>,
    tune_step_mhz: u16,
}

impl SweepProgram {
    /// Validates and installs a list of `(min_mhz, max_mhz)` pairs
    ///
    /// A pair count of zero installs the default `[0, 7250]`.
    ///
    /// # Errors
    ///
    /// - [`SweepError::InvalidRangeCount`] if `pairs.len() > MAX_RANGES`
    /// - [`SweepError::IncompatibleMode`] if `mode` is IFFT and more than one
    ///   pair is given
    /// - [`SweepError::InvalidRange`] if any pair has `min > max` or either
    ///   bound exceeds [`FREQ_MAX_MHZ`]
    pub fn configure(
        pairs: &[(u16, u16)],
        tune_step_mhz: u16,
        mode: OutputMode,
    ) -> Result<SweepProgram> {
        if pairs.len() > MAX_RANGES {
            return Err(SweepError::InvalidRangeCount);
        }
        if mode == OutputMode::IfftStream && pairs.len() > 1 {
            return Err(SweepError::IncompatibleMode);
        }

        let pairs: &[(u16, u16)] = if pairs.is_empty() {
            &[(0, FREQ_MAX_MHZ)]
        } else {
            pairs
        };

        let mut ranges = Vec::with_capacity(pairs.len());
        for &(min_mhz, max_mhz) in pairs {
            if min_mhz > max_mhz || max_mhz > FREQ_MAX_MHZ {
                return Err(SweepError::InvalidRange);
            }
            ranges.push(round_range(min_mhz, max_mhz, tune_step_mhz));
        }

        Ok(SweepProgram {
            ranges,
            tune_step_mhz,
        })
    }

    /// Returns the configured ranges
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Returns the tuning step width, in MHz
    pub fn tune_step_mhz(&self) -> u16 {
        self.tune_step_mhz
    }

    /// Returns the total number of tuning steps across all ranges
    pub fn total_step_count(&self) -> u32 {
        self.ranges.iter().map(|r| r.step_count).sum()
    }

    /// Returns the low edge of the first range, in Hz — the frequency at
    /// which the pipeline recognizes the start of a new sweep
    pub fn first_range_low_hz(&self) -> u64 {
        u64::from(self.ranges[0].min_mhz) * 1_000_000
    }
}

/// Rounds `max_mhz` up so that `(max - min)` is a multiple of `step`, and
/// derives the step count
///
/// `step_count = 1 + floor((max - min - 1) / step)`, per `spec.md` §3.
fn round_range(min_mhz: u16, max_mhz: u16, step_mhz: u16) -> Range {
    let span = max_mhz.saturating_sub(min_mhz).max(1);
    let step = step_mhz.max(1);
    let step_count = 1 + (u32::from(span) - 1) / u32::from(step);
    let rounded_span = step_count * u32::from(step);
    let rounded_max = min_mhz + rounded_span as u16;
    Range {
        min_mhz,
        max_mhz: rounded_max,
        step_count,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_pairs_installs_default() {
        let program = SweepProgram::configure(&[], 20, OutputMode::TextRecord).unwrap();
        assert_eq!(program.ranges().len(), 1);
        assert_eq!(program.ranges()[0].min_mhz, 0);
        assert_eq!(program.ranges()[0].max_mhz, FREQ_MAX_MHZ);
    }

    #[test]
    fn too_many_ranges_rejected() {
        let pairs = vec![(0u16, 10u16); MAX_RANGES + 1];
        let err = SweepProgram::configure(&pairs, 10, OutputMode::TextRecord).unwrap_err();
        assert!(matches!(err, SweepError::InvalidRangeCount));
    }

    #[test]
    fn ifft_mode_requires_single_range() {
        let pairs = [(2400, 2420), (2440, 2460)];
        let err = SweepProgram::configure(&pairs, 20, OutputMode::IfftStream).unwrap_err();
        assert!(matches!(err, SweepError::IncompatibleMode));
    }

    #[test]
    fn inverted_range_rejected() {
        let err = SweepProgram::configure(&[(100, 50)], 20, OutputMode::TextRecord).unwrap_err();
        assert!(matches!(err, SweepError::InvalidRange));
    }

    #[test]
    fn out_of_bounds_range_rejected() {
        let err =
            SweepProgram::configure(&[(0, FREQ_MAX_MHZ + 1)], 20, OutputMode::TextRecord)
                .unwrap_err();
        assert!(matches!(err, SweepError::InvalidRange));
    }

    #[test]
    fn step_count_matches_property_2() {
        // property test from spec.md S8.2: for configured [a, b], (b' - a) % step == 0
        // and step_count = (b' - a) / step, step_count >= 1
        for &(a, b, step) in &[(2400u16, 2500u16, 1u16), (0, 7250, 20), (100, 100, 5)] {
            let program = SweepProgram::configure(&[(a, b)], step, OutputMode::TextRecord).unwrap();
            let range = program.ranges()[0];
            assert_eq!((range.max_mhz - a) % step, 0);
            assert_eq!(u32::from((range.max_mhz - a) / step), range.step_count);
            assert!(range.step_count >= 1);
        }
    }

    #[test]
    fn s1_minimal_sweep_program() {
        // S1: range 2400..2500 MHz, 1 MHz step -> 100 steps, first low = 2.4 GHz
        let program =
            SweepProgram::configure(&[(2400, 2500)], 1, OutputMode::TextRecord).unwrap();
        assert_eq!(program.ranges()[0].step_count, 100);
        assert_eq!(program.first_range_low_hz(), 2_400_000_000);
    }
}
