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
//! This binary drives a continuous wideband spectrum sweep from a config
//! file or basic command-line arguments.
//!

#![warn(
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
    missing_docs,
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
// Keep extern crates, like in 2015
#![allow(unused_extern_crates)]

extern crate log;
extern crate signal_hook;
extern crate simplelog;
extern crate sweepcore;
extern crate sweepcore_config;

use signal_hook::{flag::register, SIGHUP, SIGINT};
use simplelog::{Config as LogConfig, SimpleLogger, TermLogger, TerminalMode};

mod setup;

use std::error::Error;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use self::setup::{control_from_config, start_from_config};

fn run() -> Result<(), Box<dyn Error>> {
    let config = sweepcore_config::config_from_command_line()?;

    let log_status =
        TermLogger::init(config.ui.log_level, LogConfig::default(), TerminalMode::Stderr)
            .or_else(|_| SimpleLogger::init(config.ui.log_level, LogConfig::default()));
    if let Err(e) = log_status {
        eprintln!("Failed to set up simpler logger: {}", e);
    }

    // Notes about signals on Linux:
    // SIGINT or SIGHUP sets the stop flag to true, but does not interrupt any
    // transfer callback that is in progress.
    let stop_flag = Arc::new(AtomicBool::new(false));
    register(SIGINT, Arc::clone(&stop_flag))?;
    register(SIGHUP, Arc::clone(&stop_flag))?;

    let mut control = control_from_config(&config)?;
    start_from_config(&mut control, &config)?;

    log::info!("sweep started");

    // The peripheral here is a NullPeripheral: it never calls
    // Control::on_transfer on its own, so the only thing left for this demo
    // binary to do is wait for a stop signal.
    while !stop_flag.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    log::info!("stop signal received");
    control.stop()?;
    control.close()?;

    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{}", e);
            process::exit(-1);
        }
    }
}
