//! C-compatible entry points.
//!
//! Points and scalars cross this boundary as 32-byte canonical encodings;
//! the transcript is an opaque handle created and destroyed through the
//! functions below. Misuse of a trusted input (null required pointers,
//! out-of-range widths, an uninitialized backend, `n = 0` for the
//! inner-product calls) aborts the process; recoverable conditions return a
//! non-zero code, and verification failures return `0` without aborting.

use core::ffi::c_int;
use std::process;
use std::slice;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use merlin::Transcript;

use crate::backend::{self, InitError};
use crate::commitment;
use crate::config::{BackendKind, InitConfig};
use crate::generators;
use crate::inner_product::InnerProductProof;
use crate::one_commit;
use crate::sequence::{Sequence, MAX_ELEMENT_NBYTES};

const LOG_TARGET: &str = "multicommit::ffi";

pub const MC_SUCCESS: c_int = 0;
pub const MC_ERROR_INVALID_BACKEND: c_int = 1;
pub const MC_ERROR_ALREADY_INITIALIZED: c_int = 2;
pub const MC_ERROR_BACKEND_UNAVAILABLE: c_int = 3;
pub const MC_ERROR_NULL_POINTER: c_int = 4;

/// Initialization configuration. `backend` is `1` for CPU, `2` for GPU.
#[repr(C)]
pub struct McConfig {
    pub backend: c_int,
    pub num_precomputed_generators: u64,
}

/// One variable-width integer sequence.
#[repr(C)]
pub struct McSequenceDescriptor {
    /// Element width in bytes; a power of two in `[1, 32]`.
    pub element_nbytes: u8,
    /// Non-zero when elements are two's-complement signed.
    pub is_signed: c_int,
    /// Number of elements.
    pub n: u64,
    /// `n * element_nbytes` contiguous little-endian bytes; may be null
    /// when `n` is zero.
    pub data: *const u8,
}

/// A canonical 32-byte compressed Ristretto255 point.
#[repr(C)]
pub struct McCompressedRistretto {
    pub bytes: [u8; 32],
}

/// A canonical 32-byte little-endian scalar.
#[repr(C)]
pub struct McScalar {
    pub bytes: [u8; 32],
}

/// Opaque transcript handle; 203 bytes of STROBE-128 state behind the
/// pointer, mutated in place by the proving and verification calls.
pub struct McTranscript(Transcript);

fn fatal(message: &str) -> ! {
    tracing::error!(target: LOG_TARGET, "{message}");
    process::abort();
}

/// # Safety
/// `config` must be null or point to a valid `McConfig`.
#[no_mangle]
pub unsafe extern "C" fn mc_init(config: *const McConfig) -> c_int {
    if config.is_null() {
        return MC_ERROR_NULL_POINTER;
    }
    let config = &*config;
    let backend_kind = match BackendKind::try_from(config.backend) {
        Ok(kind) => kind,
        Err(_) => return MC_ERROR_INVALID_BACKEND,
    };
    match backend::init(InitConfig {
        backend: backend_kind,
        num_precomputed_generators: config.num_precomputed_generators,
    }) {
        Ok(()) => MC_SUCCESS,
        Err(InitError::AlreadyInitialized) => MC_ERROR_ALREADY_INITIALIZED,
        Err(InitError::BackendUnavailable(_)) => MC_ERROR_BACKEND_UNAVAILABLE,
    }
}

/// # Safety
/// `descriptor` must describe `n * element_nbytes` readable bytes when
/// `n > 0`.
unsafe fn descriptor_to_sequence<'a>(descriptor: &'a McSequenceDescriptor) -> Sequence<'a> {
    let width = descriptor.element_nbytes as usize;
    if width == 0 || width > MAX_ELEMENT_NBYTES {
        fatal("sequence element width out of range");
    }
    let count = match usize::try_from(descriptor.n) {
        Ok(count) => count,
        Err(_) => fatal("sequence length exceeds addressable memory"),
    };
    if count > 0 && descriptor.data.is_null() {
        fatal("sequence data pointer is null");
    }
    let data: &'a [u8] = if count == 0 {
        &[]
    } else {
        slice::from_raw_parts(descriptor.data, count * width)
    };
    Sequence::new(data, width, descriptor.is_signed != 0)
}

/// # Safety
/// `commitments` must point to `num_sequences` writable entries and
/// `descriptors` to `num_sequences` valid descriptors.
#[no_mangle]
pub unsafe extern "C" fn mc_compute_pedersen_commitments(
    commitments: *mut McCompressedRistretto,
    num_sequences: u32,
    descriptors: *const McSequenceDescriptor,
    offset_generators: u64,
) {
    if num_sequences == 0 {
        return;
    }
    if commitments.is_null() || descriptors.is_null() {
        fatal("commitment output or descriptor pointer is null");
    }
    let descriptors = slice::from_raw_parts(descriptors, num_sequences as usize);
    let mut sequences = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        sequences.push(descriptor_to_sequence(descriptor));
    }
    let mut buffer = vec![CompressedRistretto::identity(); sequences.len()];
    commitment::compute_commitments(&mut buffer, &sequences, offset_generators);
    let out = slice::from_raw_parts_mut(commitments, sequences.len());
    for (dst, src) in out.iter_mut().zip(&buffer) {
        dst.bytes = src.to_bytes();
    }
}

/// # Safety
/// As `mc_compute_pedersen_commitments`; `generators` must additionally
/// point to at least as many canonical encodings as the longest sequence.
#[no_mangle]
pub unsafe extern "C" fn mc_compute_pedersen_commitments_with_generators(
    commitments: *mut McCompressedRistretto,
    num_sequences: u32,
    descriptors: *const McSequenceDescriptor,
    generators: *const McCompressedRistretto,
) {
    if num_sequences == 0 {
        return;
    }
    if commitments.is_null() || descriptors.is_null() {
        fatal("commitment output or descriptor pointer is null");
    }
    let descriptors = slice::from_raw_parts(descriptors, num_sequences as usize);
    let mut sequences = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        sequences.push(descriptor_to_sequence(descriptor));
    }
    let longest = sequences.iter().map(Sequence::len).max().unwrap_or(0);
    if longest > 0 && generators.is_null() {
        fatal("generator pointer is null");
    }
    let generator_points: Vec<RistrettoPoint> = if longest == 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(generators, longest)
            .iter()
            .map(|encoded| match CompressedRistretto(encoded.bytes).decompress() {
                Some(point) => point,
                None => fatal("non-canonical generator encoding"),
            })
            .collect()
    };
    let mut buffer = vec![CompressedRistretto::identity(); sequences.len()];
    commitment::compute_commitments_with_generators(&mut buffer, &sequences, &generator_points);
    let out = slice::from_raw_parts_mut(commitments, sequences.len());
    for (dst, src) in out.iter_mut().zip(&buffer) {
        dst.bytes = src.to_bytes();
    }
}

/// # Safety
/// `generators` must point to `num_generators` writable entries when
/// `num_generators > 0`.
#[no_mangle]
pub unsafe extern "C" fn mc_get_generators(
    generators: *mut McCompressedRistretto,
    offset_generators: u64,
    num_generators: u64,
) -> c_int {
    if num_generators == 0 {
        return MC_SUCCESS;
    }
    if generators.is_null() {
        return MC_ERROR_NULL_POINTER;
    }
    let count = match usize::try_from(num_generators) {
        Ok(count) => count,
        Err(_) => fatal("generator count exceeds addressable memory"),
    };
    let mut points = vec![RistrettoPoint::identity(); count];
    generators::get_generators(&mut points, offset_generators);
    let out = slice::from_raw_parts_mut(generators, count);
    for (dst, src) in out.iter_mut().zip(&points) {
        dst.bytes = src.compress().to_bytes();
    }
    MC_SUCCESS
}

/// # Safety
/// `out` must be null or point to a writable entry.
#[no_mangle]
pub unsafe extern "C" fn mc_get_one_commit(out: *mut McCompressedRistretto, n: u64) -> c_int {
    if out.is_null() {
        return MC_ERROR_NULL_POINTER;
    }
    (*out).bytes = one_commit::get_one_commit(n).compress().to_bytes();
    MC_SUCCESS
}

/// # Safety
/// `l_out` and `r_out` must each hold `⌈log₂ n⌉` writable entries,
/// `a_final_out` one entry, and `a` and `b` must each point to `n` scalars.
/// `transcript` must come from `mc_transcript_new`.
#[no_mangle]
pub unsafe extern "C" fn mc_prove_inner_product(
    l_out: *mut McCompressedRistretto,
    r_out: *mut McCompressedRistretto,
    a_final_out: *mut McScalar,
    transcript: *mut McTranscript,
    n: u64,
    offset_generators: u64,
    a: *const McScalar,
    b: *const McScalar,
) {
    if n == 0 {
        fatal("inner-product proving requires a non-empty vector");
    }
    if transcript.is_null() || a.is_null() || b.is_null() || a_final_out.is_null() {
        fatal("inner-product proving received a null pointer");
    }
    let count = match usize::try_from(n) {
        Ok(count) => count,
        Err(_) => fatal("vector length exceeds addressable memory"),
    };
    let rounds = count.next_power_of_two().trailing_zeros() as usize;
    if rounds > 0 && (l_out.is_null() || r_out.is_null()) {
        fatal("inner-product proving received a null round-output pointer");
    }

    // Prover inputs are trusted; reduce rather than reject.
    let a: Vec<Scalar> = slice::from_raw_parts(a, count)
        .iter()
        .map(|raw| Scalar::from_bytes_mod_order(raw.bytes))
        .collect();
    let b: Vec<Scalar> = slice::from_raw_parts(b, count)
        .iter()
        .map(|raw| Scalar::from_bytes_mod_order(raw.bytes))
        .collect();

    let transcript = &mut (*transcript).0;
    let proof = match InnerProductProof::create(transcript, offset_generators, &a, &b) {
        Ok(proof) => proof,
        Err(error) => fatal(&format!("inner-product proving failed: {error}")),
    };

    if rounds > 0 {
        let l_out = slice::from_raw_parts_mut(l_out, rounds);
        let r_out = slice::from_raw_parts_mut(r_out, rounds);
        for (dst, src) in l_out.iter_mut().zip(&proof.l_vector) {
            dst.bytes = src.to_bytes();
        }
        for (dst, src) in r_out.iter_mut().zip(&proof.r_vector) {
            dst.bytes = src.to_bytes();
        }
    }
    (*a_final_out).bytes = proof.a_final.to_bytes();
}

/// Returns `1` when the proof verifies and `0` otherwise. Malformed
/// untrusted inputs (non-canonical points or scalars in the proof, `b`,
/// `product`, or the commitment) reject rather than abort.
///
/// # Safety
/// `b` must point to `n` scalars, `l` and `r` to `⌈log₂ n⌉` points each,
/// and `transcript` must come from `mc_transcript_new`.
#[no_mangle]
pub unsafe extern "C" fn mc_verify_inner_product(
    transcript: *mut McTranscript,
    n: u64,
    offset_generators: u64,
    b: *const McScalar,
    product: *const McScalar,
    a_commit: *const McCompressedRistretto,
    l: *const McCompressedRistretto,
    r: *const McCompressedRistretto,
    a_final: *const McScalar,
) -> c_int {
    if n == 0 {
        fatal("inner-product verification requires a non-empty vector");
    }
    if transcript.is_null()
        || b.is_null()
        || product.is_null()
        || a_commit.is_null()
        || a_final.is_null()
    {
        fatal("inner-product verification received a null pointer");
    }
    let count = match usize::try_from(n) {
        Ok(count) => count,
        Err(_) => fatal("vector length exceeds addressable memory"),
    };
    let rounds = count.next_power_of_two().trailing_zeros() as usize;
    if rounds > 0 && (l.is_null() || r.is_null()) {
        fatal("inner-product verification received a null round pointer");
    }

    let canonical_scalar = |raw: &McScalar| -> Option<Scalar> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(raw.bytes))
    };

    let b: Option<Vec<Scalar>> = slice::from_raw_parts(b, count)
        .iter()
        .map(canonical_scalar)
        .collect();
    let (b, product, a_final) = match (
        b,
        canonical_scalar(&*product),
        canonical_scalar(&*a_final),
    ) {
        (Some(b), Some(product), Some(a_final)) => (b, product, a_final),
        _ => return 0,
    };

    let l_slice: &[McCompressedRistretto] = if rounds > 0 {
        slice::from_raw_parts(l, rounds)
    } else {
        &[]
    };
    let r_slice: &[McCompressedRistretto] = if rounds > 0 {
        slice::from_raw_parts(r, rounds)
    } else {
        &[]
    };
    let proof = InnerProductProof {
        l_vector: l_slice
            .iter()
            .map(|encoded| CompressedRistretto(encoded.bytes))
            .collect(),
        r_vector: r_slice
            .iter()
            .map(|encoded| CompressedRistretto(encoded.bytes))
            .collect(),
        a_final,
    };

    let transcript = &mut (*transcript).0;
    let a_commit = CompressedRistretto((*a_commit).bytes);
    match proof.verify(transcript, n, offset_generators, &b, &product, &a_commit) {
        Ok(()) => 1,
        Err(_) => 0,
    }
}

/// Creates a transcript whose state is seeded by `label`.
///
/// # Safety
/// `label` must point to `label_len` readable bytes; the returned handle
/// must be released with `mc_transcript_free`.
#[no_mangle]
pub unsafe extern "C" fn mc_transcript_new(
    label: *const u8,
    label_len: usize,
) -> *mut McTranscript {
    if label.is_null() && label_len > 0 {
        return std::ptr::null_mut();
    }
    let label_bytes: &[u8] = if label_len == 0 {
        &[]
    } else {
        slice::from_raw_parts(label, label_len)
    };
    // merlin requires a 'static label; transcripts are long-lived and
    // labels few, so the copy is leaked.
    let label_static: &'static [u8] = Box::leak(label_bytes.to_vec().into_boxed_slice());
    Box::into_raw(Box::new(McTranscript(Transcript::new(label_static))))
}

/// # Safety
/// `transcript` must be null or a handle from `mc_transcript_new` that has
/// not been freed.
#[no_mangle]
pub unsafe extern "C" fn mc_transcript_free(transcript: *mut McTranscript) {
    if !transcript.is_null() {
        drop(Box::from_raw(transcript));
    }
}
