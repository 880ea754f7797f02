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

//!
//! A continuous wideband spectrum sweep engine for commodity SDR peripherals.
//!
//! This crate owns the sweep state machine and the signal-processing
//! pipeline that sits between a USB receive callback and pluggable sinks:
//! block demultiplexing, per-block frequency recovery, windowed forward FFT,
//! two-slice power-spectrum extraction, optional wideband IFFT reassembly,
//! and sweep-boundary detection. It never opens a device, parses arguments,
//! or emits diagnostic output; see the `sweepcore-config` crate and the
//! `sweepcore-cli` binary for that layer.
//!

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2018_idioms
)]
#![warn(clippy::all)]

extern crate byteorder;
extern crate libc;
extern crate num_complex;
extern crate rustfft;

pub mod block;
pub mod control;
pub mod error;
pub mod fft;
pub mod flags;
pub mod mutex;
pub mod peripheral;
pub mod pipeline;
pub mod program;
pub mod sink;
pub mod state;
pub mod timestamp;
pub mod window;

pub use crate::control::Control;
pub use crate::error::{Result, SweepError};
pub use crate::fft::{FftContext, PlanStrategy};
pub use crate::flags::{Finiteness, Flags, LifecycleState};
pub use crate::peripheral::{NullPeripheral, Peripheral, TuneProgram};
pub use crate::program::{Range, SweepProgram};
pub use crate::sink::{BinaryRecord, FileSink, NopSink, OutputMode, Sink, TextRecord};
pub use crate::state::SweepState;
