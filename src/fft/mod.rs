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

//! The FFT context: transform plan, window, scratch buffers, and the IFFT
//! assembly buffer
//!
//! Sized once per configuration (`build`); rebuilding in place is not
//! supported (see `spec.md` §9's open question about `set_sample_rate`).
//!
//! The actual transform is one of two backends, selected at compile time by
//! the `fftw` feature: `rustfft` by default, or the system FFTW library.
//! Both expose the same `new(n)` / `process(&mut [Complex32])` shape, so the
//! rest of this module does not care which one is active.

#[cfg(feature = "fftw")]
mod impl_fftw;
#[cfg(not(feature = "fftw"))]
mod impl_rustfft;

#[cfg(feature = "fftw")]
use self::impl_fftw::{FftwForward as ForwardImpl, FftwInverse as InverseImpl};
#[cfg(not(feature = "fftw"))]
use self::impl_rustfft::{RustFftForward as ForwardImpl, RustFftInverse as InverseImpl};

use num_complex::Complex32;

use crate::error::{Result, SweepError};
use crate::window::HannWindow;

/// Smallest FFT size this context will build
const MIN_N: usize = 4;
/// Largest FFT size this context will build
const MAX_N: usize = 8180;
/// Seed size used when no bin width is requested
const MIN_CONTEXT_SEED_N: usize = 20;

/// Strategy hint passed through to the FFT primitive
///
/// The `rustfft` backend has no notion of FFTW-style plan refinement and
/// treats every variant the same; the `fftw` backend maps these to its own
/// planning flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStrategy {
    Estimate,
    Measure,
    Patient,
    Exhaustive,
}

/// Owns the transform plan, window, scratch buffers, and (for IFFT sinks)
/// the inverse-assembly buffer
pub struct FftContext {
    /// FFT size
    n: usize,
    /// Frequency resolution, Hz
    bin_width_hz: f64,
    /// Hann window, length `n`
    window: Vec<f32>,
    /// Forward-transform input/output buffer (in place)
    forward_buf: Vec<Complex32>,
    /// Forward transform plan
    forward_plan: ForwardImpl,
    /// Power spectrum, length `n`, valid after `transform_forward`
    power: Vec<f32>,
    /// Inverse-assembly buffer, length `n * step_count`, only for IFFT sinks
    ifft_buf: Option<Vec<Complex32>>,
    /// Inverse transform plan, only for IFFT sinks
    inverse_plan: Option<InverseImpl>,
}

impl FftContext {
    /// Builds a new FFT context
    ///
    /// `requested_bin_width_hz`: if `None`, a minimum context is built (N
    /// seeded at 20). `step_count` is only used when `build_ifft` is true, to
    /// size the inverse-assembly buffer as `n * step_count`.
    pub fn build(
        sample_rate_hz: f64,
        requested_bin_width_hz: Option<f64>,
        step_count: u32,
        build_ifft: bool,
        _strategy: PlanStrategy,
    ) -> Result<FftContext> {
        let n = derive_n(sample_rate_hz, requested_bin_width_hz)?;
        let bin_width_hz = sample_rate_hz / n as f64;

        let window: Vec<f32> = HannWindow::new(n).collect();
        let forward_buf = vec![Complex32::new(0.0, 0.0); n];
        let forward_plan = ForwardImpl::new(n);

        let (ifft_buf, inverse_plan) = if build_ifft {
            let m = n * step_count as usize;
            (
                Some(vec![Complex32::new(0.0, 0.0); m]),
                Some(InverseImpl::new(m)),
            )
        } else {
            (None, None)
        };

        let mut context = FftContext {
            n,
            bin_width_hz,
            window,
            forward_buf,
            forward_plan,
            power: vec![0.0; n],
            ifft_buf,
            inverse_plan,
        };

        // Warm-up run so the first real block does not pay plan-choice latency.
        context.transform_forward();

        Ok(context)
    }

    /// The FFT size
    pub fn n(&self) -> usize {
        self.n
    }

    /// Frequency resolution, in Hz
    pub fn bin_width_hz(&self) -> f64 {
        self.bin_width_hz
    }

    /// Windows `n` complex samples built from interleaved signed 8-bit IQ
    /// pairs into the forward buffer
    ///
    /// `in[i].re = samples[2i] * w[i] / 128`, `in[i].im = samples[2i+1] * w[i] / 128`
    pub fn window_samples(&mut self, iq: &[i8]) {
        debug_assert!(iq.len() >= 2 * self.n);
        for i in 0..self.n {
            let re = f32::from(iq[2 * i]) * self.window[i] / 128.0;
            let im = f32::from(iq[2 * i + 1]) * self.window[i] / 128.0;
            self.forward_buf[i] = Complex32::new(re, im);
        }
    }

    /// Executes the forward plan in place over the windowed samples
    pub fn transform_forward(&mut self) {
        self.forward_plan.process(&mut self.forward_buf);
    }

    /// Returns the forward-transform output (valid after `transform_forward`)
    pub fn forward_output(&self) -> &[Complex32] {
        &self.forward_buf
    }

    /// Computes the power spectrum from the forward-transform output
    ///
    /// `pwr[i] = 10 * log10(|out[i]/N|^2)`, computed as
    /// `log2(magsq) * 10/log2(10)` per `spec.md` §4.E.j
    pub fn compute_power(&mut self) {
        let scale = 1.0 / self.n as f32;
        const LOG2_TO_LOG10: f32 = std::f32::consts::LOG10_2; // 10 / log2(10) == 10 * log10(2)
        for (dest, bin) in self.power.iter_mut().zip(self.forward_buf.iter()) {
            let re = bin.re * scale;
            let im = bin.im * scale;
            let magsq = re * re + im * im;
            *dest = magsq.log2() * (10.0 * LOG2_TO_LOG10);
        }
    }

    /// The power spectrum computed by the last `compute_power` call
    pub fn power(&self) -> &[f32] {
        &self.power
    }

    /// Copies `src` (length `n/4`) into the IFFT assembly buffer starting at
    /// `index`, wrapping modulo the buffer length
    pub fn ifft_copy_in(&mut self, index: usize, src: &[Complex32]) {
        let buf = self
            .ifft_buf
            .as_mut()
            .expect("ifft_copy_in called without an IFFT-sized context");
        let m = buf.len();
        for (i, value) in src.iter().enumerate() {
            buf[(index + i) % m] = *value;
        }
    }

    /// Runs the inverse transform over the assembly buffer, normalizes by
    /// `1 / (n * step_count)`, and returns the result
    pub fn ifft_flush(&mut self) -> Vec<Complex32> {
        let buf = self
            .ifft_buf
            .as_mut()
            .expect("ifft_flush called without an IFFT-sized context");
        let plan = self
            .inverse_plan
            .as_mut()
            .expect("ifft_flush called without an IFFT-sized context");
        plan.process(buf);
        let scale = 1.0 / buf.len() as f32;
        let out: Vec<Complex32> = buf.iter().map(|c| c * scale).collect();
        for value in buf.iter_mut() {
            *value = Complex32::new(0.0, 0.0);
        }
        out
    }

    /// Length of the IFFT assembly buffer (`n * step_count`), if built
    pub fn ifft_len(&self) -> Option<usize> {
        self.ifft_buf.as_ref().map(|b| b.len())
    }
}

/// Derives the FFT size from the sample rate and requested bin width
///
/// `N = sample_rate / requested_bin_width`, then incremented until
/// `(N + 4) % 8 == 0` so that N is an odd multiple of four.
fn derive_n(sample_rate_hz: f64, requested_bin_width_hz: Option<f64>) -> Result<usize> {
    let n = match requested_bin_width_hz {
        Some(bin_width_hz) if bin_width_hz > 0.0 => (sample_rate_hz / bin_width_hz).ceil() as i64,
        _ => MIN_CONTEXT_SEED_N as i64,
    };

    if n < MIN_N as i64 || n > MAX_N as i64 {
        return Err(SweepError::InvalidFftSize);
    }

    let mut n = n as usize;
    while (n + 4) % 8 != 0 {
        n += 1;
    }

    if n > MAX_N {
        return Err(SweepError::InvalidFftSize);
    }

    Ok(n)
}
