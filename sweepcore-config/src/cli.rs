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

//!
//! Configuration from command-line arguments
//!

use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::str::FromStr;

use clap::{crate_authors, crate_name, crate_version, App, Arg, ArgMatches};

use crate::{Destination, OutputConfig, RangePair, Source, SweepLimit, UserInterface};
use crate::{Config, FftConfig};

const ABOUT: &str = "This program sweeps a tunable SDR peripheral across one or more frequency \
ranges, computes a power spectrum or reconstructed wideband signal at each tuning step, and \
writes the result to a file or standard output. Command-line arguments can be used to set up \
basic sweeps over a single range with a file (or standard output) destination. For anything \
more elaborate, a configuration file must be used.";

/// Reads command-line options and either reads a configuration from a file or builds a
/// configuration from the command-line options
///
/// This function returns an error if the configuration file could not be read or could not be
/// parsed. It causes the process to exit if a command-line argument is invalid, or if `--help`
/// or `--version` is passed.
pub fn config_from_command_line() -> Result<Config, Box<dyn Error>> {
    let matches = build_app().get_matches();

    if let Some(config_path) = matches.value_of_os("config_file") {
        read_config_file(config_path)
    } else {
        Ok(config_from_matches(&matches))
    }
}

/// Creates and returns an App with command-line arguments
fn build_app() -> App<'static, 'static> {
    App::new(crate_name!())
        .version(crate_version!())
        .about(ABOUT)
        .author(crate_authors!())
        .arg(
            Arg::with_name("config_file")
                .long("config-file")
                .short("c")
                .takes_value(true)
                .value_name("path")
                .help(
                    "The path to a configuration file to read. \
                    This can be used to specify additional options. \
                    If this option is used, no other command-line arguments are permitted.",
                )
                .conflicts_with_all(&[
                    "sample_rate",
                    "tune_step",
                    "range_min",
                    "range_max",
                    "destination",
                    "output_mode",
                    "bin_width",
                    "log_level",
                ]),
        )
        .arg(
            Arg::with_name("sample_rate")
                .long("sample-rate")
                .takes_value(true)
                .default_value("20000000")
                .validator(validate::<f64>)
                .value_name("hertz")
                .help("The peripheral's sample rate"),
        )
        .arg(
            Arg::with_name("tune_step")
                .long("tune-step")
                .takes_value(true)
                .default_value("20")
                .validator(validate::<u16>)
                .value_name("mhz")
                .help("The width of one tuning step"),
        )
        .arg(
            Arg::with_name("range_min")
                .long("range-min")
                .takes_value(true)
                .default_value("0")
                .validator(validate::<u16>)
                .value_name("mhz")
                .help("The low edge of the range to sweep"),
        )
        .arg(
            Arg::with_name("range_max")
                .long("range-max")
                .takes_value(true)
                .default_value("7250")
                .validator(validate::<u16>)
                .value_name("mhz")
                .help("The high edge of the range to sweep"),
        )
        .arg(
            Arg::with_name("destination")
                .long("destination")
                .takes_value(true)
                .value_name("path")
                .help(
                    "A file to write sweep output to. If no file is specified, output is \
                         written to standard output.",
                ),
        )
        .arg(
            Arg::with_name("output_mode")
                .long("output-mode")
                .takes_value(true)
                .default_value("text")
                .possible_values(&["text", "binary", "ifft", "callback"])
                .help("The shape of the records written to the destination"),
        )
        .arg(
            Arg::with_name("bin_width")
                .long("bin-width")
                .takes_value(true)
                .validator(validate::<f64>)
                .value_name("hertz")
                .help("The desired frequency resolution (none = a minimum-size FFT)"),
        )
        .arg(
            Arg::with_name("log_level")
                .long("log-level")
                .takes_value(true)
                .default_value("WARN")
                .possible_values(&["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
                .help("The level of logging to enable"),
        )
}

/// Reads a configuration file at the provided path, parses it, and returns it
fn read_config_file(path: &OsStr) -> Result<Config, Box<dyn Error>> {
    let file_bytes = fs::read(path)?;
    let config = toml::from_slice(&file_bytes)?;
    Ok(config)
}

/// Creates a configuration from the command-line arguments
fn config_from_matches(matches: &ArgMatches<'_>) -> Config {
    Config {
        source: source_from_matches(matches),
        ui: ui_from_matches(matches),
        output: output_from_matches(matches),
        fft: fft_from_matches(matches),
        limit: SweepLimit::Continuous,
    }
}

fn source_from_matches(matches: &ArgMatches<'_>) -> Source {
    Source {
        sample_rate_hz: matches.value_of("sample_rate").unwrap().parse().unwrap(),
        tune_step_mhz: matches.value_of("tune_step").unwrap().parse().unwrap(),
        ranges: vec![RangePair {
            min_mhz: matches.value_of("range_min").unwrap().parse().unwrap(),
            max_mhz: matches.value_of("range_max").unwrap().parse().unwrap(),
        }],
        blocks_per_transfer: crate::default_blocks_per_transfer(),
        normalized_timestamp: false,
    }
}

fn ui_from_matches(matches: &ArgMatches<'_>) -> UserInterface {
    UserInterface {
        // This can't panic because the argument is required and has restricted values.
        log_level: matches.value_of("log_level").unwrap().parse().unwrap(),
    }
}

fn output_from_matches(matches: &ArgMatches<'_>) -> OutputConfig {
    let destination = match matches.value_of_os("destination") {
        Some(path) => Destination::File { path: path.into() },
        None => Destination::Stdout,
    };
    match matches.value_of("output_mode").unwrap() {
        "text" => OutputConfig::TextRecord { destination },
        "binary" => OutputConfig::BinaryRecord { destination },
        "ifft" => OutputConfig::IfftStream { destination },
        "callback" => OutputConfig::CallbackOnly,
        other => unreachable!("Invalid output mode \"{}\"", other),
    }
}

fn fft_from_matches(matches: &ArgMatches<'_>) -> FftConfig {
    FftConfig {
        requested_bin_width_hz: matches
            .value_of("bin_width")
            .map(|s| s.parse().unwrap()),
        strategy: Default::default(),
    }
}

/// Validates that a string can be parsed into a value of type T
// As required by clap, this function accepts a String.
#[allow(clippy::needless_pass_by_value)]
fn validate<T>(s: String) -> Result<(), String>
where
    T: FromStr,
    T::Err: ToString,
{
    s.parse::<T>().map(|_| ()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PlanStrategyConfig;
    use log::LevelFilter;

    #[test]
    fn no_args() -> Result<(), Box<dyn Error>> {
        let app = build_app();
        let matches = app.get_matches_from_safe(vec!["sweepcore-cli"])?;
        let config = config_from_matches(&matches);

        assert_eq!(config.source.sample_rate_hz, 20_000_000.0);
        assert_eq!(config.source.tune_step_mhz, 20);
        assert_eq!(
            config.source.ranges,
            vec![RangePair {
                min_mhz: 0,
                max_mhz: 7250
            }]
        );
        assert_eq!(config.ui.log_level, LevelFilter::Warn);
        assert!(matches!(
            config.output,
            OutputConfig::TextRecord {
                destination: Destination::Stdout
            }
        ));
        assert_eq!(config.fft.requested_bin_width_hz, None);
        assert_eq!(config.fft.strategy, PlanStrategyConfig::Estimate);

        Ok(())
    }

    #[test]
    fn some_args() -> Result<(), Box<dyn Error>> {
        let app = build_app();
        let matches = app.get_matches_from_safe(vec![
            "sweepcore-cli",
            "--output-mode",
            "binary",
            "--range-min",
            "2400",
            "--range-max",
            "2500",
        ])?;
        let config = config_from_matches(&matches);

        assert_eq!(
            config.source.ranges,
            vec![RangePair {
                min_mhz: 2400,
                max_mhz: 2500
            }]
        );
        assert!(matches!(
            config.output,
            OutputConfig::BinaryRecord {
                destination: Destination::Stdout
            }
        ));

        Ok(())
    }

    #[test]
    fn all_args() -> Result<(), Box<dyn Error>> {
        let app = build_app();
        let matches = app.get_matches_from_safe(vec![
            "sweepcore-cli",
            "--sample-rate",
            "100000000",
            "--tune-step",
            "1",
            "--range-min",
            "2400",
            "--range-max",
            "2500",
            "--destination",
            "/tmp/out.bin",
            "--output-mode",
            "binary",
            "--bin-width",
            "1000000",
            "--log-level",
            "DEBUG",
        ])?;
        let config = config_from_matches(&matches);

        assert_eq!(config.source.sample_rate_hz, 100_000_000.0);
        assert_eq!(config.source.tune_step_mhz, 1);
        assert_eq!(config.ui.log_level, LevelFilter::Debug);
        assert_eq!(config.fft.requested_bin_width_hz, Some(1_000_000.0));
        assert!(matches!(
            config.output,
            OutputConfig::BinaryRecord {
                destination: Destination::File { .. }
            }
        ));

        Ok(())
    }
}
