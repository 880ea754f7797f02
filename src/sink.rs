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

//! The sink contract: where sweep output goes
//!
//! A sink is a pure consumer. It never blocks the pipeline beyond the cost
//! of the write, and it never calls back into the sweep state.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use num_complex::Complex32;

use crate::error::Result;

/// The four output modes from `spec.md` §4.C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Two CSV lines per tuning step
    TextRecord,
    /// Two length-prefixed binary records per tuning step
    BinaryRecord,
    /// `2*N*step_count` floats per sweep, written at the sweep boundary
    IfftStream,
    /// Nothing written; only callbacks fire
    CallbackOnly,
}

/// A consumer of sweep output
///
/// Modeled on the teacher's `WriteOutput` trait: one method per record shape
/// the pipeline can emit, plus a shared `flush`.
pub trait Sink: Send {
    /// Writes one CSV line for a tuning step's slice
    ///
    /// Format: `YYYY-MM-DD, HH:MM:SS.uuuuuu, hz_low, hz_high, bin_width, N, p0, p1, ...`
    fn write_text_record(&mut self, record: &TextRecord) -> Result<()>;

    /// Writes one length-prefixed binary record for a tuning step's slice
    fn write_binary_record(&mut self, record: &BinaryRecord) -> Result<()>;

    /// Writes the `2*N*step_count` interleaved real/imaginary floats
    /// reconstructed at a sweep boundary
    fn write_ifft_stream(&mut self, samples: &[Complex32]) -> Result<()>;

    /// Flushes any buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One CSV-line record
#[derive(Debug, Clone)]
pub struct TextRecord {
    pub date: String,
    pub time: String,
    pub hz_low: u64,
    pub hz_high: u64,
    pub bin_width_hz: f64,
    pub n: usize,
    pub powers: Vec<f32>,
}

/// One binary record
#[derive(Debug, Clone)]
pub struct BinaryRecord {
    pub hz_low: u64,
    pub hz_high: u64,
    pub powers: Vec<f32>,
}

impl BinaryRecord {
    /// `record_length = 2*sizeof(u64) + (N/4)*sizeof(float)`, per `spec.md` §6
    pub fn record_length(&self) -> u32 {
        (2 * std::mem::size_of::<u64>() + self.powers.len() * std::mem::size_of::<f32>()) as u32
    }
}

/// A sink that writes to anything implementing `std::io::Write`
///
/// Modeled on the teacher's `StdioOutput<W>`.
pub struct FileSink<W> {
    inner: W,
}

impl<W> FileSink<W> {
    pub fn new(inner: W) -> Self {
        FileSink { inner }
    }
}

impl<W: Write + Send> Sink for FileSink<W> {
    fn write_text_record(&mut self, record: &TextRecord) -> Result<()> {
        write!(
            self.inner,
            "{}, {}, {}, {}, {:.2}, {}",
            record.date, record.time, record.hz_low, record.hz_high, record.bin_width_hz, record.n
        )?;
        for power in &record.powers {
            write!(self.inner, ", {:.2}", power)?;
        }
        writeln!(self.inner)?;
        Ok(())
    }

    fn write_binary_record(&mut self, record: &BinaryRecord) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(record.record_length())?;
        self.inner.write_u64::<LittleEndian>(record.hz_low)?;
        self.inner.write_u64::<LittleEndian>(record.hz_high)?;
        for power in &record.powers {
            self.inner.write_f32::<LittleEndian>(*power)?;
        }
        Ok(())
    }

    fn write_ifft_stream(&mut self, samples: &[Complex32]) -> Result<()> {
        for sample in samples {
            self.inner.write_f32::<LittleEndian>(sample.re)?;
            self.inner.write_f32::<LittleEndian>(sample.im)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// A sink that writes nothing: used for `OutputMode::CallbackOnly` and for
/// testing with only a callback as the consumer
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSink;

impl Sink for NopSink {
    fn write_text_record(&mut self, _record: &TextRecord) -> Result<()> {
        Ok(())
    }
    fn write_binary_record(&mut self, _record: &BinaryRecord) -> Result<()> {
        Ok(())
    }
    fn write_ifft_stream(&mut self, _samples: &[Complex32]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::Cursor;

    #[test]
    fn binary_record_length_matches_s3() {
        // S3: N = 20, N/4 = 5 -> record_length = 16 + 4*5 = 36
        let record = BinaryRecord {
            hz_low: 2_400_000_000,
            hz_high: 2_405_000_000,
            powers: vec![0.0; 5],
        };
        assert_eq!(record.record_length(), 36);
    }

    #[test]
    fn binary_record_round_trips() {
        let record = BinaryRecord {
            hz_low: 2_400_000_000,
            hz_high: 2_405_000_000,
            powers: vec![1.5, -2.5, 3.25, 0.0, -100.0],
        };
        let mut sink = FileSink::new(Cursor::new(Vec::new()));
        sink.write_binary_record(&record).unwrap();

        let mut cursor = sink.inner;
        cursor.set_position(0);
        let len = cursor.read_u32::<LittleEndian>().unwrap();
        assert_eq!(len, record.record_length());
        let hz_low = cursor.read_u64::<LittleEndian>().unwrap();
        let hz_high = cursor.read_u64::<LittleEndian>().unwrap();
        assert_eq!(hz_low, record.hz_low);
        assert_eq!(hz_high, record.hz_high);
        assert_eq!(hz_high - hz_low, 5_000_000);
        let mut powers = Vec::new();
        for _ in 0..record.powers.len() {
            powers.push(cursor.read_f32::<LittleEndian>().unwrap());
        }
        assert_eq!(powers, record.powers);
    }

    #[test]
    fn text_record_has_two_decimal_places() {
        let record = TextRecord {
            date: "2026-07-27".to_string(),
            time: "00:00:00.000000".to_string(),
            hz_low: 2_400_000_000,
            hz_high: 2_405_000_000,
            bin_width_hz: 1_000_000.0,
            n: 20,
            powers: vec![f32::NEG_INFINITY; 5],
        };
        let mut buf = Vec::new();
        {
            let mut sink = FileSink::new(&mut buf);
            sink.write_text_record(&record).unwrap();
        }
        let line = String::from_utf8(buf).unwrap();
        assert!(line.contains("1000000.00"));
        assert!(line.starts_with("2026-07-27, 00:00:00.000000, 2400000000, 2405000000"));
    }
}
