//! Inner-product argument over the canonical generator stream.
//!
//! A proof convinces a verifier holding a commitment `A = ⟨a, G⟩` and a
//! claimed product `z = ⟨a, b⟩` that the prover knows `a`, using
//! `⌈log₂ n⌉` rounds of halving. Prover and verifier drive an identical
//! transcript: per round the cross-term points are absorbed under the
//! labels `"L"` and `"R"` and a folding challenge is drawn under `"x"`.
//!
//! # Protocol
//!
//! With `np = 2^⌈log₂ n⌉`, the prover pads `a` and `b` with zeros to length
//! `np`, fetches `G[0..np]` from the generator stream at the caller's
//! offset, and uses the next generator `Q = G[np]` as the inner-product
//! base. Each round halves the vectors:
//!
//! - `L = ⟨a_lo, G_hi⟩ + ⟨a_lo, b_hi⟩·Q`
//! - `R = ⟨a_hi, G_lo⟩ + ⟨a_hi, b_lo⟩·Q`
//! - `u = challenge`, then
//!   `a ← u·a_lo + u⁻¹·a_hi`, `b ← u⁻¹·b_lo + u·b_hi`,
//!   `G ← u⁻¹·G_lo + u·G_hi`.
//!
//! Rounds are emitted most-significant first: `l_vector[0]` is the round
//! that split the full vector. After the last round a single scalar `a*`
//! remains.
//!
//! Both `b` and `G` collapse against the same coefficient vector
//! `s_i = Π_j u_j^{±1}` (positive exponent when bit `j` of `i` is set), so
//! the verifier recomputes the challenges from the proof, collapses
//! `b' = ⟨s, b⟩`, and accepts iff
//!
//! ```text
//! a*·⟨s, G⟩ + (a*·b' − z)·Q − A − Σ_j (u_j²·L_j + u_j⁻²·R_j) = 0
//! ```
//!
//! evaluated as one multi-scalar multiplication.

mod error;

pub use error::ProofError;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use merlin::Transcript;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backend::{self, MsmEngine};
use crate::generators;
use crate::transcript::TranscriptProtocol;

const LOG_TARGET: &str = "multicommit::inner_product";

/// A logarithmic-size proof of knowledge of the vector behind a Pedersen
/// commitment and its inner product with a public vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InnerProductProof {
    /// Left cross-term per round, most significant round first.
    pub l_vector: Vec<CompressedRistretto>,
    /// Right cross-term per round, most significant round first.
    pub r_vector: Vec<CompressedRistretto>,
    /// The single scalar remaining after every fold.
    pub a_final: Scalar,
}

fn inner_product(a: &[Scalar], b: &[Scalar]) -> Scalar {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl InnerProductProof {
    /// Proves knowledge of `a` with `⟨a, G⟩` committed against the
    /// generator stream at `offset_generators`.
    ///
    /// The inputs are trusted: empty or mismatched vectors are caller
    /// misuse and panic. The only runtime failure is the negligible event
    /// of a zero folding challenge.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(n = a.len(), offset_generators))]
    pub fn create(
        transcript: &mut Transcript,
        offset_generators: u64,
        a: &[Scalar],
        b: &[Scalar],
    ) -> Result<InnerProductProof, ProofError> {
        let n = a.len();
        assert!(n > 0, "inner-product proving requires a non-empty vector");
        assert_eq!(a.len(), b.len(), "input vectors must have equal length");

        let np = n.next_power_of_two();
        let rounds = np.trailing_zeros() as usize;
        let mut g_vec = generators::generator_range(offset_generators, np + 1);
        let q = g_vec[np];
        g_vec.truncate(np);

        let mut a_vec = a.to_vec();
        let mut b_vec = b.to_vec();
        a_vec.resize(np, Scalar::ZERO);
        b_vec.resize(np, Scalar::ZERO);

        transcript.innerproduct_domain_sep(n as u64);

        let engine = backend::initialized_engine();
        let mut l_vector = Vec::with_capacity(rounds);
        let mut r_vector = Vec::with_capacity(rounds);

        for _ in 0..rounds {
            let half = a_vec.len() / 2;
            let (a_lo, a_hi) = a_vec.split_at(half);
            let (b_lo, b_hi) = b_vec.split_at(half);
            let (g_lo, g_hi) = g_vec.split_at(half);

            let c_l = inner_product(a_lo, b_hi);
            let c_r = inner_product(a_hi, b_lo);

            let mut l_scalars = a_lo.to_vec();
            l_scalars.push(c_l);
            let mut l_points = g_hi.to_vec();
            l_points.push(q);
            let l = engine.msm_single(&l_scalars, &l_points).compress();

            let mut r_scalars = a_hi.to_vec();
            r_scalars.push(c_r);
            let mut r_points = g_lo.to_vec();
            r_points.push(q);
            let r = engine.msm_single(&r_scalars, &r_points).compress();

            transcript.append_point(b"L", &l);
            transcript.append_point(b"R", &r);
            l_vector.push(l);
            r_vector.push(r);

            let u = transcript.challenge_scalar(b"x");
            if u == Scalar::ZERO {
                return Err(ProofError::ZeroChallenge);
            }
            let u_inv = u.invert();

            let folded_a: Vec<Scalar> = a_lo
                .iter()
                .zip(a_hi)
                .map(|(lo, hi)| u * lo + u_inv * hi)
                .collect();
            let folded_b: Vec<Scalar> = b_lo
                .iter()
                .zip(b_hi)
                .map(|(lo, hi)| u_inv * lo + u * hi)
                .collect();
            let folded_g: Vec<RistrettoPoint> = g_lo
                .par_iter()
                .zip(g_hi.par_iter())
                .map(|(lo, hi)| lo * u_inv + hi * u)
                .collect();

            a_vec = folded_a;
            b_vec = folded_b;
            g_vec = folded_g;
        }

        Ok(InnerProductProof {
            l_vector,
            r_vector,
            a_final: a_vec[0],
        })
    }

    /// Verifies the proof against a commitment `a_commit = ⟨a, G⟩` and a
    /// claimed inner product `⟨a, b⟩ = product`.
    ///
    /// The proof and the commitment are untrusted: any malformed encoding
    /// rejects rather than panicking. `n = 0` is caller misuse and panics.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(n, offset_generators))]
    pub fn verify(
        &self,
        transcript: &mut Transcript,
        n: u64,
        offset_generators: u64,
        b: &[Scalar],
        product: &Scalar,
        a_commit: &CompressedRistretto,
    ) -> Result<(), ProofError> {
        assert!(n > 0, "inner-product verification requires a non-empty vector");
        let n = usize::try_from(n).expect("vector length exceeds addressable memory");
        assert_eq!(b.len(), n, "public vector length must match n");

        let np = n.next_power_of_two();
        let rounds = np.trailing_zeros() as usize;
        if self.l_vector.len() != rounds || self.r_vector.len() != rounds {
            return Err(ProofError::FormatError);
        }

        transcript.innerproduct_domain_sep(n as u64);

        let mut challenges = Vec::with_capacity(rounds);
        let mut l_points = Vec::with_capacity(rounds);
        let mut r_points = Vec::with_capacity(rounds);
        for (l, r) in self.l_vector.iter().zip(&self.r_vector) {
            l_points.push(transcript.validate_and_append_point(b"L", l)?);
            r_points.push(transcript.validate_and_append_point(b"R", r)?);
            let u = transcript.challenge_scalar(b"x");
            if u == Scalar::ZERO {
                return Err(ProofError::ZeroChallenge);
            }
            challenges.push(u);
        }

        let mut challenges_inv = challenges.clone();
        let all_inv = Scalar::batch_invert(&mut challenges_inv);

        // s[i] = Π_j u_j^{±1}, positive exponent when bit j of i is set.
        // challenges[0] belongs to the most significant bit, `rounds - 1`.
        let mut s = Vec::with_capacity(np);
        s.push(all_inv);
        for i in 1..np {
            let bit = usize::BITS as usize - 1 - i.leading_zeros() as usize;
            let u = challenges[rounds - 1 - bit];
            s.push(s[i - (1 << bit)] * (u * u));
        }

        // b is implicitly zero-padded to np, so only its first n entries
        // contribute to the collapsed value.
        let b_prime: Scalar = b.iter().zip(&s).map(|(b_i, s_i)| b_i * s_i).sum();

        let a_point = a_commit.decompress().ok_or(ProofError::FormatError)?;
        let gens = generators::generator_range(offset_generators, np + 1);
        let q = gens[np];

        // One combined multi-scalar multiplication for the whole equation.
        let mut scalars = Vec::with_capacity(np + 2 + 2 * rounds);
        let mut points = Vec::with_capacity(np + 2 + 2 * rounds);
        for (s_i, g_i) in s.iter().zip(&gens[..np]) {
            scalars.push(self.a_final * s_i);
            points.push(*g_i);
        }
        scalars.push(self.a_final * b_prime - product);
        points.push(q);
        scalars.push(-Scalar::ONE);
        points.push(a_point);
        for (u, l) in challenges.iter().zip(&l_points) {
            scalars.push(-(u * u));
            points.push(*l);
        }
        for (u_inv, r) in challenges_inv.iter().zip(&r_points) {
            scalars.push(-(u_inv * u_inv));
            points.push(*r);
        }

        let check = backend::initialized_engine().msm_single(&scalars, &points);
        if check.is_identity() {
            Ok(())
        } else {
            Err(ProofError::VerificationError)
        }
    }
}
