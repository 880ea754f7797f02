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

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};

use sweepcore::{Control, Finiteness, NullPeripheral, OutputMode, PlanStrategy, Sink};
use sweepcore_config::{Config, Destination, OutputConfig, PlanStrategyConfig, SweepLimit};

use sweepcore::{FileSink, NopSink};

/// Builds a fully configured, not-yet-started `Control` from a parsed config
///
/// The peripheral is always a [`NullPeripheral`]: this binary has no real USB
/// driver to hand it, so it exists to exercise the wiring (and to drive
/// `Control::on_transfer` from a test harness or a `--dry-run` caller).
pub fn control_from_config(config: &Config) -> Result<Control<NullPeripheral>, Box<dyn Error>> {
    let mut control = Control::init(
        config.source.sample_rate_hz,
        config.source.tune_step_mhz,
        NullPeripheral::default(),
    )?;

    let (mode, sink) = output_from_config(&config.output)?;
    control.set_output(mode, sink)?;

    let pairs: Vec<(u16, u16)> = config
        .source
        .ranges
        .iter()
        .map(|r| (r.min_mhz, r.max_mhz))
        .collect();
    control.set_range(&pairs)?;

    control.set_blocks_per_transfer(config.source.blocks_per_transfer)?;
    control.set_normalized_timestamp(config.source.normalized_timestamp)?;

    control.setup_fft(
        strategy_from_config(&config.fft.strategy),
        config.fft.requested_bin_width_hz,
    )?;

    Ok(control)
}

/// Starts the sweep described by a config's `limit` section
pub fn start_from_config(
    control: &mut Control<NullPeripheral>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let finiteness = match &config.limit {
        SweepLimit::Continuous => Finiteness::Continuous,
        SweepLimit::OneShot => Finiteness::OneShot,
        SweepLimit::Count { sweeps } => Finiteness::Finite(*sweeps),
    };
    control.start(finiteness)?;
    Ok(())
}

fn output_from_config(
    output: &OutputConfig,
) -> Result<(OutputMode, Box<dyn Sink>), Box<dyn Error>> {
    Ok(match output {
        OutputConfig::TextRecord { destination } => {
            (OutputMode::TextRecord, sink_from_destination(destination)?)
        }
        OutputConfig::BinaryRecord { destination } => (
            OutputMode::BinaryRecord,
            sink_from_destination(destination)?,
        ),
        OutputConfig::IfftStream { destination } => {
            (OutputMode::IfftStream, sink_from_destination(destination)?)
        }
        OutputConfig::CallbackOnly => (OutputMode::CallbackOnly, Box::new(NopSink)),
    })
}

fn sink_from_destination(destination: &Destination) -> Result<Box<dyn Sink>, Box<dyn Error>> {
    Ok(match destination {
        Destination::Stdout => Box::new(FileSink::new(io::stdout())),
        Destination::File { path } => Box::new(FileSink::new(BufWriter::new(File::create(path)?))),
    })
}

fn strategy_from_config(strategy: &PlanStrategyConfig) -> PlanStrategy {
    match strategy {
        PlanStrategyConfig::Estimate => PlanStrategy::Estimate,
        PlanStrategyConfig::Measure => PlanStrategy::Measure,
        PlanStrategyConfig::Patient => PlanStrategy::Patient,
        PlanStrategyConfig::Exhaustive => PlanStrategy::Exhaustive,
    }
}
