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

//! The control API: init/configure/start/stop/close, with the ordering
//! rules from `spec.md` §4.F enforced as preconditions on each call

use crate::error::{Result, SweepError};
use crate::fft::{FftContext, PlanStrategy};
use crate::flags::{Finiteness, Flags, LifecycleState};
use crate::mutex::{NoOpMutex, WriteMutex};
use crate::peripheral::{Peripheral, TuneProgram};
use crate::pipeline;
use crate::program::SweepProgram;
use crate::sink::{OutputMode, Sink};
use crate::state::{FftReadyCallback, RawSampleCallback, SweepState};

/// Owns the sweep state and the peripheral it drives
///
/// `start()` hands the peripheral a no-op transfer callback: the peripheral
/// contract here is scaffolding only (see `src/peripheral.rs`), so the
/// actual wiring from a real driver's worker thread into [`Control::on_transfer`]
/// is left to that driver's integration code.
pub struct Control<P: Peripheral> {
    state: SweepState,
    peripheral: P,
    mutex_installed: bool,
}

impl<P: Peripheral> Control<P> {
    /// `init(device, sample_rate, step)`
    pub fn init(sample_rate_hz: f64, tune_step_mhz: u16, peripheral: P) -> Result<Control<P>> {
        let mut state = SweepState::new(sample_rate_hz);
        let default_program = SweepProgram::configure(&[], tune_step_mhz, OutputMode::CallbackOnly)?;
        state.set_program(default_program);
        state.flags_mut().insert(Flags::INITIALIZED);

        Ok(Control {
            state,
            peripheral,
            mutex_installed: false,
        })
    }

    /// `set_output(mode, type, arg)`
    pub fn set_output(&mut self, mode: OutputMode, sink: Box<dyn Sink>) -> Result<()> {
        self.require(Flags::INITIALIZED)?;
        self.state.set_output(mode, sink);
        self.state.flags_mut().insert(Flags::OUTPUT_SET);
        Ok(())
    }

    /// `set_range(list, count)`
    pub fn set_range(&mut self, pairs: &[(u16, u16)]) -> Result<()> {
        self.require(Flags::OUTPUT_SET)?;
        let tune_step_mhz = self
            .state
            .program()
            .map(SweepProgram::tune_step_mhz)
            .unwrap_or(1);
        let mode = self.state.output_mode().unwrap_or(OutputMode::CallbackOnly);
        let program = SweepProgram::configure(pairs, tune_step_mhz, mode)?;
        self.state.set_program(program);
        Ok(())
    }

    /// `setup_fft(strategy, requested_bin_hz)`
    pub fn setup_fft(
        &mut self,
        strategy: PlanStrategy,
        requested_bin_width_hz: Option<f64>,
    ) -> Result<()> {
        let program = self.state.program().ok_or(SweepError::NotReady)?;
        let step_count = program.total_step_count();
        let build_ifft = self.state.output_mode() == Some(OutputMode::IfftStream);
        let fft = FftContext::build(
            self.state.sample_rate_hz(),
            requested_bin_width_hz,
            step_count,
            build_ifft,
            strategy,
        )?;
        self.state.set_fft(fft);
        Ok(())
    }

    /// `set_fft_rx_callback`
    pub fn set_fft_ready_callback(&mut self, callback: Option<FftReadyCallback>) -> Result<()> {
        self.require(Flags::INITIALIZED)?;
        self.state.set_fft_ready_callback_locked(callback);
        Ok(())
    }

    /// `set_raw_sample_rx_callback(bypass?)`
    pub fn set_raw_sample_callback(
        &mut self,
        callback: Option<RawSampleCallback>,
        bypass: bool,
    ) -> Result<()> {
        self.require(Flags::INITIALIZED)?;
        self.state.set_raw_sample_callback_locked(callback, bypass);
        Ok(())
    }

    /// Sets the number of USB blocks gathered into each raw-sample transfer
    pub fn set_blocks_per_transfer(&mut self, count: usize) -> Result<()> {
        self.require(Flags::INITIALIZED)?;
        self.state.set_blocks_per_transfer(count);
        Ok(())
    }

    /// Sets whether the wall clock is restamped once per sweep (`true`) or
    /// once per transfer (`false`, the default)
    pub fn set_normalized_timestamp(&mut self, normalized: bool) -> Result<()> {
        self.require(Flags::INITIALIZED)?;
        if normalized {
            self.state.flags_mut().insert(Flags::NORMALIZED_TIMESTAMP);
        } else {
            self.state.flags_mut().remove(Flags::NORMALIZED_TIMESTAMP);
        }
        Ok(())
    }

    /// `set_write_mutex(opaque, lock_fn, unlock_fn)`: first-setter-wins
    pub fn set_write_mutex(&mut self, mutex: Box<dyn WriteMutex>) -> Result<()> {
        if self.mutex_installed {
            return Err(SweepError::InvalidParam);
        }
        self.state.set_write_mutex(mutex);
        self.mutex_installed = true;
        Ok(())
    }

    /// `start(max_sweeps)`
    pub fn start(&mut self, finiteness: Finiteness) -> Result<()> {
        if self.state.fft().is_none() {
            return Err(SweepError::NotReady);
        }
        if self.state.lifecycle() == LifecycleState::Running {
            self.stop()?;
        }

        self.state.reset_counters();
        self.state.flags_mut().remove(Flags::EXITING);
        self.state.flags_mut().remove(Flags::SWEEP_STARTED);
        self.state.set_finiteness(finiteness);

        let program = self
            .state
            .program()
            .expect("checked above")
            .clone();
        let tune_program = TuneProgram {
            tune_step_hz: u64::from(program.tune_step_mhz()) * 1_000_000,
            ranges: program,
            blocks_per_transfer: self.state.blocks_per_transfer(),
            offset_hz: 0,
        };

        self.peripheral.init_sweep(&tune_program)?;
        if let Err(e) = self.peripheral.start_rx(Box::new(|_transfer| 0)) {
            self.state.set_lifecycle(LifecycleState::Stopped);
            return Err(e.into());
        }
        self.state.set_lifecycle(LifecycleState::Running);
        Ok(())
    }

    /// `stop()`
    pub fn stop(&mut self) -> Result<()> {
        if self.state.lifecycle() != LifecycleState::Running {
            return Err(SweepError::NotReady);
        }
        self.state.set_exiting_locked();
        self.state.set_lifecycle(LifecycleState::Stopped);
        self.state.reset_counters();
        Ok(())
    }

    /// `close()`
    pub fn close(&mut self) -> Result<()> {
        if self.state.lifecycle() == LifecycleState::Running {
            let _ = self.stop();
        }
        let _ = self.peripheral.close();
        self.state.clear_fft();
        self.state.clear_raw_sample_callback_locked();
        self.state.clear_fft_ready_callback_locked();
        self.state.set_write_mutex(Box::new(NoOpMutex));
        self.mutex_installed = false;
        self.state.flags_mut().insert(Flags::RELEASED);
        Ok(())
    }

    /// Feeds one transfer through the receive pipeline
    ///
    /// A real peripheral driver calls this from its own transfer callback.
    pub fn on_transfer(&mut self, transfer: &[u8]) -> i32 {
        pipeline::receive_transfer(&mut self.state, transfer)
    }

    pub fn state(&self) -> &SweepState {
        &self.state
    }

    fn require(&self, flag: Flags) -> Result<()> {
        if self.state.flags().contains(flag) {
            Ok(())
        } else {
            Err(SweepError::NotReady)
        }
    }
}
