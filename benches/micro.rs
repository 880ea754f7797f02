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

extern crate criterion;
extern crate sweepcore;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use sweepcore::{FftContext, PlanStrategy};

const SAMPLE_RATE_HZ: f64 = 100_000_000.0;

fn benchmark_fft_build(c: &mut Criterion) {
    let bin_widths = [1_000_000.0_f64, 100_000.0, 12_207.03125];

    let mut group = c.benchmark_group("FftContext::build");
    for bin_width in bin_widths.iter() {
        group.bench_with_input(
            format!("bin width {} Hz", bin_width),
            bin_width,
            |b, &bin_width| {
                b.iter(|| {
                    FftContext::build(
                        SAMPLE_RATE_HZ,
                        Some(bin_width),
                        1,
                        false,
                        PlanStrategy::Estimate,
                    )
                    .unwrap()
                })
            },
        );
    }
}

fn benchmark_per_block_cost(c: &mut Criterion) {
    let bin_widths = [1_000_000.0_f64, 100_000.0, 12_207.03125];

    let mut group = c.benchmark_group("per-block window+transform+power");
    for bin_width in bin_widths.iter() {
        group.bench_with_input(
            format!("bin width {} Hz", bin_width),
            bin_width,
            |b, &bin_width| {
                let mut context =
                    FftContext::build(SAMPLE_RATE_HZ, Some(bin_width), 1, false, PlanStrategy::Estimate)
                        .unwrap();
                let iq = vec![0i8; 2 * context.n()];
                b.iter_batched(
                    || iq.clone(),
                    |iq| {
                        context.window_samples(&iq);
                        context.transform_forward();
                        context.compute_power();
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
}

criterion_group!(benches, benchmark_fft_build, benchmark_per_block_cost);
criterion_main!(benches);
