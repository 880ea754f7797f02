/*
 * Copyright 2020 The Regents of the University of California
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

extern crate clap;
extern crate log;
extern crate serde;
extern crate toml;

mod cli;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::cli::config_from_command_line;

/// A configuration file for the sweep engine
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// Source settings: sample rate, tuning, and ranges (required)
    pub source: Source,
    /// Application user interface settings (optional)
    #[serde(default)]
    pub ui: UserInterface,
    /// Where sweep output goes (required)
    pub output: OutputConfig,
    /// FFT sizing request (optional)
    #[serde(default)]
    pub fft: FftConfig,
    /// How many sweeps to run (optional)
    #[serde(default)]
    pub limit: SweepLimit,
}

/// Settings that determine the sweep program handed to the peripheral
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Source {
    /// Sample rate of the peripheral, in Hz
    pub sample_rate_hz: f64,
    /// Width of one tuning step, in MHz
    pub tune_step_mhz: u16,
    /// Frequency ranges to sweep; empty means the full tunable range
    #[serde(default)]
    pub ranges: Vec<RangePair>,
    /// USB blocks gathered into each raw-sample callback
    #[serde(default = "default_blocks_per_transfer")]
    pub blocks_per_transfer: usize,
    /// Restamp the wall clock once per sweep instead of once per transfer
    #[serde(default)]
    pub normalized_timestamp: bool,
}

fn default_blocks_per_transfer() -> usize {
    16
}

/// One `[min_mhz, max_mhz)` range, before validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct RangePair {
    pub min_mhz: u16,
    pub max_mhz: u16,
}

/// Where sweep output goes and in what shape
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "mode")]
#[serde(rename_all = "snake_case")]
pub enum OutputConfig {
    /// Two CSV lines per tuning step
    TextRecord { destination: Destination },
    /// Two length-prefixed binary records per tuning step
    BinaryRecord { destination: Destination },
    /// Reconstructed wideband samples, written at each sweep boundary
    IfftStream { destination: Destination },
    /// Nothing written; only callbacks fire
    CallbackOnly,
}

/// A sink destination
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Stdout,
    File { path: PathBuf },
}

/// FFT sizing request
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct FftConfig {
    /// Desired frequency resolution, in Hz; `None` seeds a minimum-size context
    pub requested_bin_width_hz: Option<f64>,
    /// Planning effort hint passed through to the transform backend
    #[serde(default)]
    pub strategy: PlanStrategyConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategyConfig {
    Estimate,
    Measure,
    Patient,
    Exhaustive,
}

impl Default for PlanStrategyConfig {
    fn default() -> Self {
        PlanStrategyConfig::Estimate
    }
}

/// How many sweeps to run before stopping
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum SweepLimit {
    /// Run until stopped externally (by a signal, for example)
    Continuous,
    /// Run exactly one sweep
    OneShot,
    /// Run exactly this many sweeps
    Count { sweeps: u64 },
}

impl Default for SweepLimit {
    fn default() -> Self {
        SweepLimit::Continuous
    }
}

/// User interface options
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct UserInterface {
    /// Minimum log level to print
    #[serde(default = "log_level_warn")]
    pub log_level: LevelFilter,
}

impl Default for UserInterface {
    fn default() -> Self {
        UserInterface {
            log_level: log_level_warn(),
        }
    }
}

fn log_level_warn() -> LevelFilter {
    LevelFilter::Warn
}
