//! Batched Pedersen commitment entry points.
//!
//! Each sequence in a batch commits against the same generator vector:
//! either the canonical stream starting at a caller-chosen offset, or an
//! explicit vector covering the longest sequence. Outputs are written in
//! sequence order as canonical compressed encodings; an empty sequence
//! commits to the identity and an empty batch is a successful no-op.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::Identity;

use crate::backend::{self, GeneratorSource, MsmEngine};
use crate::sequence::Sequence;

const LOG_TARGET: &str = "multicommit::commitment";

/// Commits every sequence against `G[offset_generators..]` from the
/// canonical generator stream.
#[tracing::instrument(target = LOG_TARGET, skip_all, fields(num_sequences = data.len(), offset_generators))]
pub fn compute_commitments(
    commitments: &mut [CompressedRistretto],
    data: &[Sequence<'_>],
    offset_generators: u64,
) {
    assert_eq!(
        commitments.len(),
        data.len(),
        "one output commitment is required per sequence"
    );
    if data.is_empty() {
        return;
    }
    backend::initialized_engine().commit_batch(
        commitments,
        data,
        GeneratorSource::Offset(offset_generators),
    );
}

/// Commits every sequence against a caller-supplied generator vector.
#[tracing::instrument(target = LOG_TARGET, skip_all, fields(num_sequences = data.len(), num_generators = generators.len()))]
pub fn compute_commitments_with_generators(
    commitments: &mut [CompressedRistretto],
    data: &[Sequence<'_>],
    generators: &[RistrettoPoint],
) {
    assert_eq!(
        commitments.len(),
        data.len(),
        "one output commitment is required per sequence"
    );
    let longest = data.iter().map(Sequence::len).max().unwrap_or(0);
    assert!(
        longest <= generators.len(),
        "generators has a length smaller than the longest sequence in the input data"
    );
    if data.is_empty() {
        return;
    }
    backend::initialized_engine().commit_batch(commitments, data, GeneratorSource::Slice(generators));
}

/// Homomorphically folds one more sequence into an existing commitment:
/// the stored value becomes `commitment + commit(data)`.
///
/// The stored commitment is trusted caller state; a non-canonical encoding
/// is misuse and panics.
pub fn update_commitment(
    commitment: &mut CompressedRistretto,
    offset_generators: u64,
    data: Sequence<'_>,
) {
    let mut partial = [CompressedRistretto::identity()];
    compute_commitments(&mut partial, &[data], offset_generators);

    let current = match commitment.decompress() {
        Some(point) => point,
        None => panic!("invalid ristretto point decompression in update_commitment"),
    };
    let partial = match partial[0].decompress() {
        Some(point) => point,
        None => panic!("invalid ristretto point decompression in update_commitment"),
    };
    *commitment = (current + partial).compress();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;
    use crate::test_utils;
    use curve25519_dalek::scalar::Scalar;

    fn generator_window(offset: u64, count: usize) -> Vec<RistrettoPoint> {
        let mut window = vec![RistrettoPoint::identity(); count];
        generators::get_generators(&mut window, offset);
        window
    }

    #[test]
    fn a_one_commits_to_the_first_generator() {
        test_utils::init_cpu_backend_for_tests();
        let data = [1u8];
        let mut commitments = [CompressedRistretto::identity()];
        compute_commitments(&mut commitments, &[Sequence::unsigned(&data, 1)], 0);
        assert_eq!(commitments[0], generators::generator(0).compress());
    }

    #[test]
    fn all_zero_data_commits_to_the_identity_encoding() {
        test_utils::init_cpu_backend_for_tests();
        let data = [0u8, 0, 0];
        let mut commitments = [CompressedRistretto::identity()];
        compute_commitments(&mut commitments, &[Sequence::unsigned(&data, 1)], 0);
        assert_eq!(commitments[0].to_bytes(), [0u8; 32]);
    }

    #[test]
    fn a_two_commits_to_the_doubled_generator() {
        test_utils::init_cpu_backend_for_tests();
        let data = [2u8];
        let mut commitments = [CompressedRistretto::identity()];
        compute_commitments(&mut commitments, &[Sequence::unsigned(&data, 1)], 0);
        let g0 = generators::generator(0);
        assert_eq!(commitments[0], (g0 + g0).compress());
    }

    #[test]
    fn empty_sequences_and_empty_batches_are_harmless() {
        test_utils::init_cpu_backend_for_tests();
        compute_commitments(&mut [], &[], 0);

        let mut commitments = [CompressedRistretto::identity(); 1];
        compute_commitments(&mut commitments, &[Sequence::unsigned(&[], 4)], 0);
        assert_eq!(commitments[0].to_bytes(), [0u8; 32]);
    }

    #[test]
    fn matches_a_naive_recomputation_across_widths() {
        test_utils::init_cpu_backend_for_tests();
        let bytes1: Vec<u8> = vec![2, 3, 1, 5, 4, 7, 6, 8, 9, 10];
        let words2: Vec<u8> = [500u16, 0, 65535, 1, 42]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let signed4: Vec<u8> = [-5i32, 4, -3, 2, -1, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let wide: Vec<u8> = (0..96).collect();

        let sequences = [
            Sequence::unsigned(&bytes1, 1),
            Sequence::unsigned(&words2, 2),
            Sequence::signed(&signed4, 4),
            Sequence::unsigned(&wide, 32),
        ];
        let offset = 3u64;
        let mut commitments = [CompressedRistretto::identity(); 4];
        compute_commitments(&mut commitments, &sequences, offset);

        let window = generator_window(offset, 10);
        for (commitment, sequence) in commitments.iter().zip(&sequences) {
            let expected: RistrettoPoint = sequence
                .scalars()
                .zip(&window)
                .map(|(scalar, generator)| generator * scalar)
                .sum();
            assert_eq!(*commitment, expected.compress());
        }
    }

    #[test]
    fn explicit_generators_agree_with_the_stream_window() {
        test_utils::init_cpu_backend_for_tests();
        let data: Vec<u8> = (1..=8).collect();
        let sequences = [Sequence::unsigned(&data, 1)];
        let offset = 11u64;

        let mut from_offset = [CompressedRistretto::identity()];
        compute_commitments(&mut from_offset, &sequences, offset);

        let window = generator_window(offset, 8);
        let mut from_slice = [CompressedRistretto::identity()];
        compute_commitments_with_generators(&mut from_slice, &sequences, &window);

        assert_eq!(from_offset, from_slice);
    }

    #[test]
    fn commitments_are_linear_in_the_data() {
        test_utils::init_cpu_backend_for_tests();
        let left = [10u8, 20, 30, 40];
        let right = [5u8, 6, 7, 8];
        let summed: Vec<u8> = left.iter().zip(&right).map(|(l, r)| l + r).collect();

        let mut commitments = [CompressedRistretto::identity(); 3];
        compute_commitments(
            &mut commitments,
            &[
                Sequence::unsigned(&left, 1),
                Sequence::unsigned(&right, 1),
                Sequence::unsigned(&summed, 1),
            ],
            0,
        );

        let lhs = commitments[0].decompress().unwrap() + commitments[1].decompress().unwrap();
        assert_eq!(lhs.compress(), commitments[2]);
    }

    #[test]
    fn signed_non_negative_data_matches_unsigned_data() {
        test_utils::init_cpu_backend_for_tests();
        let values: Vec<i16> = vec![0, 1, 300, i16::MAX];
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut commitments = [CompressedRistretto::identity(); 2];
        compute_commitments(
            &mut commitments,
            &[Sequence::signed(&data, 2), Sequence::unsigned(&data, 2)],
            0,
        );
        assert_eq!(commitments[0], commitments[1]);
    }

    #[test]
    fn update_commitment_folds_homomorphically() {
        test_utils::init_cpu_backend_for_tests();
        let first = [1u8, 2, 3];
        let second = [10u8, 20, 30];
        let combined = [11u8, 22, 33];

        let mut running = [CompressedRistretto::identity()];
        compute_commitments(&mut running, &[Sequence::unsigned(&first, 1)], 0);
        update_commitment(&mut running[0], 0, Sequence::unsigned(&second, 1));

        let mut expected = [CompressedRistretto::identity()];
        compute_commitments(&mut expected, &[Sequence::unsigned(&combined, 1)], 0);
        assert_eq!(running[0], expected[0]);
    }

    #[test]
    #[should_panic(expected = "generators has a length smaller")]
    fn short_generator_vectors_are_rejected() {
        test_utils::init_cpu_backend_for_tests();
        let data = [1u8, 2, 3, 4];
        let window = generator_window(0, 2);
        let mut commitments = [CompressedRistretto::identity()];
        compute_commitments_with_generators(
            &mut commitments,
            &[Sequence::unsigned(&data, 1)],
            &window,
        );
    }
}
