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

//! The peripheral library contract, as a Rust trait
//!
//! `spec.md` §6 treats the USB driver / peripheral control library as an
//! external collaborator, described there only as four free functions
//! (`init_sweep`, `start_rx_sweep`, `is_streaming`, `close`). This module
//! gives that contract a named seam in idiomatic Rust: a trait the real
//! driver crate implements, with no behavior of its own defined here.

use crate::program::SweepProgram;

/// A tuning plan handed to the peripheral, plus transfer framing parameters
#[derive(Debug, Clone)]
pub struct TuneProgram {
    pub ranges: SweepProgram,
    pub blocks_per_transfer: usize,
    pub tune_step_hz: u64,
    pub offset_hz: u64,
}

/// The USB driver / peripheral control library this engine drives
///
/// Implementations of this trait are out of scope for this crate (see
/// `spec.md` §1); this is only the seam a real driver plugs into.
pub trait Peripheral: Send {
    /// Programs the device with a tuning plan
    fn init_sweep(&mut self, program: &TuneProgram) -> std::io::Result<()>;

    /// Starts asynchronous receive, invoking `on_transfer` for each transfer
    ///
    /// Returns once streaming has started; `on_transfer` continues to be
    /// invoked until the device is stopped.
    fn start_rx(
        &mut self,
        on_transfer: Box<dyn FnMut(&[u8]) -> i32 + Send>,
    ) -> std::io::Result<()>;

    /// Returns true if the device is currently streaming
    fn is_streaming(&self) -> bool;

    /// Stops streaming and releases device resources
    fn close(&mut self) -> std::io::Result<()>;
}

/// A `Peripheral` that does nothing
///
/// Useful for dry runs and for driving the receive pipeline directly from
/// tests, bypassing any real USB transport.
#[derive(Debug, Default)]
pub struct NullPeripheral {
    streaming: bool,
}

impl Peripheral for NullPeripheral {
    fn init_sweep(&mut self, _program: &TuneProgram) -> std::io::Result<()> {
        Ok(())
    }

    fn start_rx(
        &mut self,
        _on_transfer: Box<dyn FnMut(&[u8]) -> i32 + Send>,
    ) -> std::io::Result<()> {
        self.streaming = true;
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.streaming = false;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_peripheral_reports_streaming_after_start() {
        let mut peripheral = NullPeripheral::default();
        assert!(!peripheral.is_streaming());
        peripheral.start_rx(Box::new(|_| 0)).unwrap();
        assert!(peripheral.is_streaming());
        peripheral.close().unwrap();
        assert!(!peripheral.is_streaming());
    }
}
