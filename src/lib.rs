//! Batched Pedersen commitments and inner-product arguments over the
//! Ristretto255 prime-order group.
//!
//! The process selects a multi-scalar-multiplication backend once via
//! [`init`]; commitments and inner-product proofs then dispatch through it.
//! Generators come from a fixed deterministic stream, so callers never
//! exchange generator material, only 32-byte canonical encodings.

pub mod backend;
pub mod commitment;
pub mod config;
pub mod ffi;
pub mod generators;
pub mod inner_product;
pub mod one_commit;
pub mod sequence;
pub mod transcript;

#[cfg(test)]
pub mod test_utils;

pub use backend::{active_backend, init, GeneratorSource, InitError, MsmEngine};
pub use commitment::{
    compute_commitments, compute_commitments_with_generators, update_commitment,
};
pub use config::{BackendKind, InitConfig};
pub use generators::get_generators;
pub use inner_product::{InnerProductProof, ProofError};
pub use one_commit::get_one_commit;
pub use sequence::Sequence;
pub use transcript::TranscriptProtocol;
