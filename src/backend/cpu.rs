//! Native multi-scalar multiplication engine.
//!
//! Two Pippenger variants cover the width spectrum: sequences whose elements
//! fit a machine word are bucketed over their actual bit-width without ever
//! materializing field scalars, and everything else runs a generic windowed
//! Pippenger over 256-bit scalar encodings. Small inputs fall through to the
//! straight multiscalar multiplication, which beats bucketing below a few
//! dozen terms.
//!
//! Work is parallelized across the sequences of a batch and across the bit
//! windows of a single large multiplication; all parallelism joins before
//! the engine returns.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{Identity, VartimeMultiscalarMul};
use rayon::prelude::*;

use super::{GeneratorSource, MsmEngine};
use crate::generators;
use crate::sequence::Sequence;

const LOG_TARGET: &str = "multicommit::backend::cpu";

/// Below this many terms, bucketing costs more than it saves.
const NAIVE_MSM_CUTOFF: usize = 32;

#[derive(Clone, Copy, Debug, Default)]
pub struct CpuEngine;

impl CpuEngine {
    pub fn new() -> Self {
        CpuEngine
    }
}

impl MsmEngine for CpuEngine {
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(num_sequences = sequences.len()))]
    fn commit_batch(
        &self,
        commitments: &mut [CompressedRistretto],
        sequences: &[Sequence<'_>],
        generators: GeneratorSource<'_>,
    ) {
        let longest = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        // Generators are fetched once for the whole batch; every sequence
        // shares the same prefix of the vector.
        let fetched;
        let shared: &[RistrettoPoint] = match generators {
            GeneratorSource::Slice(points) => points,
            GeneratorSource::Offset(offset) => {
                fetched = generators::generator_range(offset, longest);
                &fetched
            }
        };
        commitments
            .par_iter_mut()
            .zip(sequences.par_iter())
            .for_each(|(out, sequence)| *out = commit_sequence(sequence, shared).compress());
    }

    fn msm_single(&self, scalars: &[Scalar], points: &[RistrettoPoint]) -> RistrettoPoint {
        msm_scalars(scalars, points)
    }
}

fn commit_sequence(sequence: &Sequence<'_>, generators: &[RistrettoPoint]) -> RistrettoPoint {
    let n = sequence.len();
    if n == 0 {
        return RistrettoPoint::identity();
    }
    let bases = &generators[..n];
    match sequence.as_u64_words() {
        Some(words) => {
            let words: Vec<u64> = words.collect();
            msm_words(&words, bases, 8 * sequence.element_nbytes())
        }
        None => {
            let scalars: Vec<Scalar> = sequence.scalars().collect();
            msm_scalars(&scalars, bases)
        }
    }
}

/// Window width as a function of the number of terms.
fn window_size(n: usize) -> usize {
    match n {
        0..=32 => 3,
        33..=128 => 5,
        129..=512 => 7,
        513..=2048 => 11,
        2049..=8192 => 13,
        _ => 15,
    }
}

/// `Σ scalars[i] · points[i]` over full-width scalars.
pub(crate) fn msm_scalars(scalars: &[Scalar], points: &[RistrettoPoint]) -> RistrettoPoint {
    assert_eq!(
        scalars.len(),
        points.len(),
        "scalar and point slices must have equal length"
    );
    let n = scalars.len();
    if n == 0 {
        return RistrettoPoint::identity();
    }
    if n <= NAIVE_MSM_CUTOFF {
        return RistrettoPoint::vartime_multiscalar_mul(scalars, points);
    }
    let bytes: Vec<[u8; 32]> = scalars.iter().map(Scalar::to_bytes).collect();
    let w = window_size(n);
    let num_windows = (256 + w - 1) / w;
    let window_sums: Vec<RistrettoPoint> = (0..num_windows)
        .into_par_iter()
        .map(|window| {
            let mut buckets = vec![RistrettoPoint::identity(); (1usize << w) - 1];
            for (scalar, point) in bytes.iter().zip(points) {
                let value = scalar_window(scalar, window, w);
                if value != 0 {
                    buckets[value - 1] += point;
                }
            }
            sum_buckets(&buckets)
        })
        .collect();
    combine_windows(&window_sums, w)
}

/// `Σ values[i] · points[i]` where every value is at most `value_bits` wide.
pub(crate) fn msm_words(
    values: &[u64],
    points: &[RistrettoPoint],
    value_bits: usize,
) -> RistrettoPoint {
    assert_eq!(
        values.len(),
        points.len(),
        "value and point slices must have equal length"
    );
    let n = values.len();
    if n == 0 {
        return RistrettoPoint::identity();
    }
    if n <= NAIVE_MSM_CUTOFF {
        let scalars: Vec<Scalar> = values.iter().copied().map(Scalar::from).collect();
        return RistrettoPoint::vartime_multiscalar_mul(&scalars, points);
    }
    let w = window_size(n).min(value_bits);
    let num_windows = (value_bits + w - 1) / w;
    let mask = (1u64 << w) - 1;
    let window_sums: Vec<RistrettoPoint> = (0..num_windows)
        .into_par_iter()
        .map(|window| {
            let mut buckets = vec![RistrettoPoint::identity(); (1usize << w) - 1];
            for (value, point) in values.iter().zip(points) {
                let value = ((value >> (window * w)) & mask) as usize;
                if value != 0 {
                    buckets[value - 1] += point;
                }
            }
            sum_buckets(&buckets)
        })
        .collect();
    combine_windows(&window_sums, w)
}

/// Extracts the `window`-th `w`-bit digit of a little-endian 256-bit scalar.
fn scalar_window(bytes_le: &[u8; 32], window: usize, w: usize) -> usize {
    let start = window * w;
    let mut value = 0usize;
    for bit in 0..w {
        let index = start + bit;
        let byte = index >> 3;
        if byte >= 32 {
            break;
        }
        value |= (((bytes_le[byte] >> (index & 7)) & 1) as usize) << bit;
    }
    value
}

/// Summation by parts: Σ_j (j+1) · buckets[j] via a running suffix sum.
fn sum_buckets(buckets: &[RistrettoPoint]) -> RistrettoPoint {
    let mut running = RistrettoPoint::identity();
    let mut sum = RistrettoPoint::identity();
    for bucket in buckets.iter().rev() {
        running += bucket;
        sum += running;
    }
    sum
}

/// Folds per-window sums from the most significant window down, doubling
/// `w` times between windows.
fn combine_windows(window_sums: &[RistrettoPoint], w: usize) -> RistrettoPoint {
    let mut acc = RistrettoPoint::identity();
    for sum in window_sums.iter().rev() {
        for _ in 0..w {
            acc = acc + acc;
        }
        acc += sum;
    }
    acc
}
