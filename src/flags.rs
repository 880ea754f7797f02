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

//! Sweep state flags
//!
//! STOPPED/RUNNING and ONESHOT/FINITE are pairwise exclusive, so they are not
//! part of the bitset below; they are modeled as [`LifecycleState`] and
//! [`Finiteness`] instead. The remaining independent boolean flags live in
//! [`Flags`].

use bitflags::bitflags;

bitflags! {
    /// Independent boolean flags of the sweep state
    #[derive(Default)]
    pub struct Flags: u32 {
        /// The pipeline has been told to shut down at the next block boundary
        const EXITING = 1 << 0;
        /// `init` has been called
        const INITIALIZED = 1 << 1;
        /// `close` has been called; the FFT context has been freed
        const RELEASED = 1 << 2;
        /// The pipeline has seen the first-range-start block of the current sweep
        const SWEEP_STARTED = 1 << 3;
        /// `set_output` has been called
        const OUTPUT_SET = 1 << 4;
        /// Restamp the wall clock once per sweep instead of once per transfer
        const NORMALIZED_TIMESTAMP = 1 << 5;
        /// Skip windowing, FFT, and all FFT-derived output
        const BYPASS_FFT = 1 << 6;
    }
}

/// Whether the sweep is currently running
///
/// Exactly one of these holds once the state has been initialized (invariant i
/// of the sweep state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Running,
}

/// How many sweeps to run before setting EXITING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finiteness {
    /// Run until `stop()` is called
    Continuous,
    /// Run exactly `n` sweeps
    Finite(u64),
    /// Run exactly one sweep (equivalent to `Finite(1)`, kept distinct because
    /// `spec.md` requires ONESHOT to always imply `max_sweeps == 1`)
    OneShot,
}

impl Finiteness {
    /// Returns the number of sweeps this finiteness allows, or `None` if
    /// continuous
    pub fn max_sweeps(&self) -> Option<u64> {
        match self {
            Finiteness::Continuous => None,
            Finiteness::Finite(n) => Some(*n),
            Finiteness::OneShot => Some(1),
        }
    }

    /// Returns true if `completed` sweeps are enough to stop
    pub fn is_satisfied_by(&self, completed: u64) -> bool {
        match self.max_sweeps() {
            Some(max) => completed >= max,
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn oneshot_max_sweeps_is_one() {
        assert_eq!(Finiteness::OneShot.max_sweeps(), Some(1));
    }

    #[test]
    fn continuous_never_satisfied() {
        assert!(!Finiteness::Continuous.is_satisfied_by(1_000_000));
    }

    #[test]
    fn finite_satisfied_at_exact_count() {
        let f = Finiteness::Finite(3);
        assert!(!f.is_satisfied_by(2));
        assert!(f.is_satisfied_by(3));
        assert!(f.is_satisfied_by(4));
    }

    #[test]
    fn flags_roundtrip() {
        let mut flags = Flags::empty();
        assert!(!flags.contains(Flags::SWEEP_STARTED));
        flags.insert(Flags::SWEEP_STARTED);
        assert!(flags.contains(Flags::SWEEP_STARTED));
        flags.remove(Flags::SWEEP_STARTED);
        assert!(!flags.contains(Flags::SWEEP_STARTED));
    }
}
