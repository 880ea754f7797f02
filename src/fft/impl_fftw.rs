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

//! The `fftw` transform backend, enabled by the `fftw` feature
//!
//! `fftw`'s plans execute in place over their own aligned buffers, so each
//! side here keeps a scratch `AlignedVec` and copies in/out of it; the
//! scratch copy is the price of presenting the same `&mut [Complex32]`
//! surface the `rustfft` backend uses.

use fftw::array::AlignedVec;
use fftw::plan::{C2CPlan, C2CPlan32};
use fftw::types::{Flag, Sign};
use num_complex::Complex32;

pub struct FftwForward {
    plan: C2CPlan32,
    scratch_in: AlignedVec<Complex32>,
    scratch_out: AlignedVec<Complex32>,
}

impl FftwForward {
    pub fn new(n: usize) -> Self {
        let plan = C2CPlan32::aligned(&[n], Sign::Forward, Flag::ESTIMATE)
            .expect("failed to build FFTW forward plan");
        FftwForward {
            plan,
            scratch_in: AlignedVec::new(n),
            scratch_out: AlignedVec::new(n),
        }
    }

    pub fn process(&mut self, buf: &mut [Complex32]) {
        self.scratch_in.as_slice_mut().copy_from_slice(buf);
        self.plan
            .c2c(&mut self.scratch_in, &mut self.scratch_out)
            .expect("FFTW forward execution failed");
        buf.copy_from_slice(self.scratch_out.as_slice());
    }
}

pub struct FftwInverse {
    plan: C2CPlan32,
    scratch_in: AlignedVec<Complex32>,
    scratch_out: AlignedVec<Complex32>,
}

impl FftwInverse {
    pub fn new(n: usize) -> Self {
        let plan = C2CPlan32::aligned(&[n], Sign::Backward, Flag::ESTIMATE)
            .expect("failed to build FFTW inverse plan");
        FftwInverse {
            plan,
            scratch_in: AlignedVec::new(n),
            scratch_out: AlignedVec::new(n),
        }
    }

    pub fn process(&mut self, buf: &mut [Complex32]) {
        self.scratch_in.as_slice_mut().copy_from_slice(buf);
        self.plan
            .c2c(&mut self.scratch_in, &mut self.scratch_out)
            .expect("FFTW inverse execution failed");
        buf.copy_from_slice(self.scratch_out.as_slice());
    }
}
