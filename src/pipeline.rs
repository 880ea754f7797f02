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

//! The receive pipeline: the hot path invoked once per USB transfer
//!
//! This is where every other component meets: it parses blocks, detects
//! sweep boundaries, drives the FFT context, and hands slices to the sink.

use crate::block::{self, BlockHeader};
use crate::flags::{Flags, LifecycleState};
use crate::program::FREQ_MAX_MHZ;
use crate::sink::{BinaryRecord, OutputMode, TextRecord};
use crate::state::SweepState;
use crate::timestamp::format_utc;

/// Runs the receive pipeline over one transfer
///
/// Returns a status for the peripheral library: zero to continue, non-zero
/// to request teardown.
pub fn receive_transfer(state: &mut SweepState, transfer: &[u8]) -> i32 {
    if let Some(callback) = state.raw_sample_callback_mut() {
        let unsubscribe = callback(transfer) != 0;
        if unsubscribe {
            state.clear_raw_sample_callback_locked();
        }
    }

    if state.output_mode().is_none() {
        return -1;
    }

    if state.flags().contains(Flags::EXITING) {
        return 0;
    }

    if state.transfer_timestamp().is_none() || !state.flags().contains(Flags::NORMALIZED_TIMESTAMP)
    {
        state.restamp_transfer_time_locked();
    }

    state.add_bytes(transfer.len());

    let block_size = state.block_size();
    let blocks = state.blocks_per_transfer();
    for j in 0..blocks {
        let start = j * block_size;
        let end = start + block_size;
        if end > transfer.len() {
            break;
        }
        let block = &transfer[start..end];
        if !process_block(state, transfer, block) {
            return 0;
        }
    }

    0
}

/// Processes one block. Returns `false` if the caller should stop walking
/// the rest of the transfer's blocks immediately.
fn process_block(state: &mut SweepState, transfer: &[u8], block: &[u8]) -> bool {
    let header = match block::parse_header(block) {
        Some(h) => h,
        None => return true,
    };

    handle_sweep_boundary(state, &header);

    if state.flags().contains(Flags::EXITING) || state.lifecycle() == LifecycleState::Stopped {
        return false;
    }

    if !state.flags().contains(Flags::SWEEP_STARTED) {
        return true;
    }

    if header.frequency_hz > u64::from(FREQ_MAX_MHZ) * 1_000_000 {
        return true;
    }

    if state.flags().contains(Flags::BYPASS_FFT) {
        return true;
    }

    let n = match state.fft() {
        Some(fft) => fft.n(),
        None => return true,
    };
    let iq_bytes = block::sample_region(block, n);
    let iq: Vec<i8> = iq_bytes.iter().map(|&b| b as i8).collect();

    let fft = state.fft_mut().expect("checked above");
    fft.window_samples(&iq);
    fft.transform_forward();
    fft.compute_power();

    if let Some(callback) = state.fft_ready_callback_mut() {
        let unsubscribe = callback(header.frequency_hz, transfer) != 0;
        if unsubscribe {
            state.clear_fft_ready_callback_locked();
        }
    }

    emit_slices(state, &header);

    true
}

/// Sweep-boundary detection and the bookkeeping that happens at each edge
/// (property 6 of `spec.md` §8)
fn handle_sweep_boundary(state: &mut SweepState, header: &BlockHeader) {
    let first_range_low_hz = match state.program() {
        Some(program) => program.first_range_low_hz(),
        None => return,
    };

    if header.frequency_hz != first_range_low_hz {
        return;
    }

    if state.flags().contains(Flags::SWEEP_STARTED) {
        if state.output_mode() == Some(OutputMode::IfftStream) && !state.flags().contains(Flags::BYPASS_FFT)
        {
            flush_ifft(state);
        }

        state.note_sweep_complete();

        if state.flags().contains(Flags::NORMALIZED_TIMESTAMP) {
            state.restamp_transfer_time_locked();
        }

        if state.sweep_limit_reached() {
            state.set_exiting_locked();
        }
    }

    state.flags_mut().insert(Flags::SWEEP_STARTED);
}

fn flush_ifft(state: &mut SweepState) {
    let samples = match state.fft_mut() {
        Some(fft) if fft.ifft_len().is_some() => fft.ifft_flush(),
        _ => return,
    };
    let _ = state.sink_mut().write_ifft_stream(&samples);
}

/// Extracts the two quarter-band slices from the current power spectrum and
/// emits them per `spec.md` §4.E.l, lower slice first
fn emit_slices(state: &mut SweepState, header: &BlockHeader) {
    let mode = match state.output_mode() {
        Some(mode) => mode,
        None => return,
    };

    let sample_rate_hz = state.sample_rate_hz();
    let (n, bin_width_hz, lower, upper) = {
        let fft = state.fft().expect("fft must be built once SWEEP_STARTED");
        let n = fft.n();
        let quarter = n / 4;
        let lower_start = 1 + 5 * n / 8;
        let upper_start = 1 + n / 8;
        let power = fft.power();
        (
            n,
            fft.bin_width_hz(),
            power[lower_start..lower_start + quarter].to_vec(),
            power[upper_start..upper_start + quarter].to_vec(),
        )
    };

    let f = header.frequency_hz;
    let quarter_span = sample_rate_hz as u64 / 4;
    let lower_hz = (f, f + quarter_span);
    let upper_hz = (f + sample_rate_hz as u64 / 2, f + 3 * quarter_span);

    match mode {
        OutputMode::TextRecord => {
            let (date, time) = state
                .transfer_timestamp()
                .map(format_utc)
                .unwrap_or_else(|| format_utc(std::time::SystemTime::now()));
            for (hz_low, hz_high, powers) in [
                (lower_hz.0, lower_hz.1, lower),
                (upper_hz.0, upper_hz.1, upper),
            ] {
                let record = TextRecord {
                    date: date.clone(),
                    time: time.clone(),
                    hz_low,
                    hz_high,
                    bin_width_hz,
                    n,
                    powers,
                };
                let _ = state.sink_mut().write_text_record(&record);
            }
        }
        OutputMode::BinaryRecord => {
            for (hz_low, hz_high, powers) in [
                (lower_hz.0, lower_hz.1, lower),
                (upper_hz.0, upper_hz.1, upper),
            ] {
                let record = BinaryRecord {
                    hz_low,
                    hz_high,
                    powers,
                };
                let _ = state.sink_mut().write_binary_record(&record);
            }
        }
        OutputMode::IfftStream => {
            let first_range_low_hz = state
                .program()
                .map(|p| p.first_range_low_hz())
                .unwrap_or(0);
            let fft = state.fft_mut().expect("fft must be built once SWEEP_STARTED");
            let m = match fft.ifft_len() {
                Some(m) => m,
                None => return,
            };
            let idx0 = ((f as f64 - first_range_low_hz as f64) / bin_width_hz).round() as i64;
            let idx_lower = idx0.rem_euclid(m as i64) as usize;
            let idx_lower = (idx_lower + m / 2) % m;
            let idx_upper = (idx_lower + n / 2) % m;

            let lower_complex = fft.forward_output()[1 + 5 * n / 8..1 + 5 * n / 8 + n / 4].to_vec();
            let upper_complex = fft.forward_output()[1 + n / 8..1 + n / 8 + n / 4].to_vec();

            fft.ifft_copy_in(idx_lower, &lower_complex);
            fft.ifft_copy_in(idx_upper, &upper_complex);
        }
        OutputMode::CallbackOnly => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fft::{FftContext, PlanStrategy};
    use crate::flags::{Finiteness, LifecycleState};
    use crate::program::SweepProgram;
    use crate::sink::{FileSink, NopSink};
    use std::io::Cursor;

    fn make_block(freq_hz: u64, block_size: usize) -> Vec<u8> {
        let mut block = vec![0u8; block_size];
        block[0] = 0x7F;
        block[1] = 0x7F;
        byteorder::LittleEndian::write_u64(&mut block[2..10], freq_hz);
        block
    }

    fn configured_state(mode: OutputMode) -> SweepState {
        let mut state = SweepState::new(20_000_000.0);
        let program = SweepProgram::configure(&[(2400, 2420)], 20, mode).unwrap();
        let step_count = program.total_step_count();
        let fft = FftContext::build(
            20_000_000.0,
            Some(1_000_000.0),
            step_count,
            mode == OutputMode::IfftStream,
            PlanStrategy::Estimate,
        )
        .unwrap();
        state.set_program(program);
        state.set_fft(fft);
        state.set_lifecycle(LifecycleState::Running);
        state.set_finiteness(Finiteness::Continuous);
        state.set_output(mode, Box::new(FileSink::new(Cursor::new(Vec::new()))));
        state
    }

    #[test]
    fn s1_text_sweep_emits_two_lines_per_step() {
        let mut state = configured_state(OutputMode::TextRecord);
        let block_size = state.block_size();
        let mut transfer = Vec::new();
        for step in 0..2 {
            transfer.extend(make_block(2_400_000_000 + step * 1_000_000, block_size));
        }
        state.set_blocks_per_transfer(2);
        let status = receive_transfer(&mut state, &transfer);
        assert_eq!(status, 0);
    }

    #[test]
    fn s5_range_validation_rejects_two_ranges_in_ifft_mode() {
        let pairs = [(2400u16, 2420u16), (2440, 2460)];
        let err = SweepProgram::configure(&pairs, 20, OutputMode::IfftStream).unwrap_err();
        assert!(matches!(err, crate::error::SweepError::IncompatibleMode));
    }

    #[test]
    fn s6_callback_unsubscribes_after_nonzero_return() {
        let mut state = configured_state(OutputMode::CallbackOnly);
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls_clone = calls.clone();
        state.set_fft_ready_callback(Some(Box::new(move |_freq, _transfer| {
            calls_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            1
        })));

        let block_size = state.block_size();
        state.set_blocks_per_transfer(2);
        let mut transfer = Vec::new();
        transfer.extend(make_block(2_400_000_000, block_size));
        transfer.extend(make_block(2_400_000_000, block_size));

        receive_transfer(&mut state, &transfer);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(state.fft_ready_callback_mut().is_none());
    }

    #[test]
    fn sweep_boundary_sets_sweep_started_only_at_range_start() {
        let mut state = configured_state(OutputMode::CallbackOnly);
        let header_start = BlockHeader {
            frequency_hz: 2_400_000_000,
        };
        let header_mid = BlockHeader {
            frequency_hz: 2_410_000_000,
        };
        handle_sweep_boundary(&mut state, &header_mid);
        assert!(!state.flags().contains(Flags::SWEEP_STARTED));
        handle_sweep_boundary(&mut state, &header_start);
        assert!(state.flags().contains(Flags::SWEEP_STARTED));
    }

    #[test]
    fn oneshot_sets_exiting_after_one_sweep() {
        let mut state = configured_state(OutputMode::CallbackOnly);
        state.set_finiteness(Finiteness::OneShot);
        let header_start = BlockHeader {
            frequency_hz: 2_400_000_000,
        };
        handle_sweep_boundary(&mut state, &header_start);
        assert!(!state.flags().contains(Flags::EXITING));
        handle_sweep_boundary(&mut state, &header_start);
        assert_eq!(state.sweep_count(), 1);
        assert!(state.flags().contains(Flags::EXITING));
    }

    #[test]
    fn missing_output_mode_is_fatal() {
        let mut state = SweepState::new(20_000_000.0);
        let status = receive_transfer(&mut state, &[0u8; 16]);
        assert_eq!(status, -1);
    }

    #[test]
    fn nop_sink_never_errors() {
        let mut sink = NopSink;
        use crate::sink::Sink;
        assert!(sink.flush().is_ok());
    }
}
