//! Labeled transcript operations over the STROBE-128 construction.
//!
//! Prover and verifier must absorb the same `(label, bytes)` pairs in the
//! same order to derive the same challenges; the label strings used here are
//! part of the wire contract.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

use crate::inner_product::ProofError;

pub trait TranscriptProtocol {
    /// Domain separator binding the inner-product protocol and the vector
    /// length into the transcript.
    fn innerproduct_domain_sep(&mut self, n: u64);

    /// Absorbs a compressed point under `label`.
    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto);

    /// Absorbs an untrusted compressed point under `label`, returning the
    /// decoded point or an error for a non-canonical encoding.
    fn validate_and_append_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> Result<RistrettoPoint, ProofError>;

    /// Absorbs a scalar under `label`.
    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar);

    /// Derives a challenge scalar under `label` from 64 bytes of transcript
    /// PRF output, wide-reduced modulo the group order.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn innerproduct_domain_sep(&mut self, n: u64) {
        self.append_message(b"dom-sep", b"ipp v1");
        self.append_u64(b"n", n);
    }

    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.append_message(label, point.as_bytes());
    }

    fn validate_and_append_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> Result<RistrettoPoint, ProofError> {
        let decoded = point.decompress().ok_or(ProofError::FormatError)?;
        self.append_message(label, point.as_bytes());
        Ok(decoded)
    }

    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.append_message(label, scalar.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }
}
