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

//! The default transform backend, built on `rustfft`

use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

pub struct RustFftForward {
    plan: Arc<dyn Fft<f32>>,
}

impl RustFftForward {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        RustFftForward {
            plan: planner.plan_fft_forward(n),
        }
    }

    pub fn process(&mut self, buf: &mut [Complex32]) {
        self.plan.process(buf);
    }
}

pub struct RustFftInverse {
    plan: Arc<dyn Fft<f32>>,
}

impl RustFftInverse {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        RustFftInverse {
            plan: planner.plan_fft_inverse(n),
        }
    }

    pub fn process(&mut self, buf: &mut [Complex32]) {
        self.plan.process(buf);
    }
}
