//! GPU multi-scalar multiplication engine.
//!
//! The device kernels live in the vendor `blitzar-sys` library; this module
//! only bridges descriptors and points across the FFI boundary. Generators
//! are always supplied from this crate's oracle rather than derived on the
//! device, so the GPU engine produces the same compressed outputs as the
//! CPU engine for identical inputs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;

use super::{GeneratorSource, MsmEngine};
use crate::generators;
use crate::sequence::Sequence;

const LOG_TARGET: &str = "multicommit::backend::gpu";

static INIT: Once = Once::new();
static DEVICE_READY: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug)]
pub struct GpuEngine;

impl GpuEngine {
    /// Brings up the device library once per process.
    pub fn new() -> anyhow::Result<Self> {
        INIT.call_once(|| {
            let config = blitzar_sys::sxt_config {
                backend: blitzar_sys::SXT_GPU_BACKEND as i32,
                num_precomputed_generators: 0,
            };
            let ret = unsafe { blitzar_sys::sxt_init(&config) };
            if ret == 0 {
                DEVICE_READY.store(true, Ordering::Release);
                tracing::info!(target: LOG_TARGET, "GPU device initialized");
            } else {
                tracing::warn!(target: LOG_TARGET, ret, "failed to initialize GPU device");
            }
        });
        if DEVICE_READY.load(Ordering::Acquire) {
            Ok(GpuEngine)
        } else {
            Err(anyhow::anyhow!("GPU device not available"))
        }
    }
}

fn to_sys_descriptors(sequences: &[Sequence<'_>]) -> Vec<blitzar_sys::sxt_sequence_descriptor> {
    sequences
        .iter()
        .map(|sequence| blitzar_sys::sxt_sequence_descriptor {
            element_nbytes: sequence.element_nbytes() as u8,
            n: sequence.len() as u64,
            data: if sequence.is_empty() {
                std::ptr::null()
            } else {
                sequence.raw_data().as_ptr()
            },
            is_signed: sequence.is_signed() as i32,
        })
        .collect()
}

impl MsmEngine for GpuEngine {
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(num_sequences = sequences.len()))]
    fn commit_batch(
        &self,
        commitments: &mut [CompressedRistretto],
        sequences: &[Sequence<'_>],
        generators: GeneratorSource<'_>,
    ) {
        let longest = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        let fetched;
        let shared: &[RistrettoPoint] = match generators {
            GeneratorSource::Slice(points) => points,
            GeneratorSource::Offset(offset) => {
                fetched = generators::generator_range(offset, longest);
                &fetched
            }
        };
        let descriptors = to_sys_descriptors(sequences);
        let ret = unsafe {
            blitzar_sys::sxt_compute_pedersen_commitments_with_generators(
                commitments.as_mut_ptr() as *mut blitzar_sys::sxt_compressed_ristretto,
                descriptors.len() as u32,
                descriptors.as_ptr(),
                shared.as_ptr() as *const blitzar_sys::sxt_ristretto,
            )
        };
        if ret != 0 {
            panic!("error during commitment computation on the GPU device");
        }
    }

    fn msm_single(&self, scalars: &[Scalar], points: &[RistrettoPoint]) -> RistrettoPoint {
        let data: Vec<u8> = scalars.iter().flat_map(Scalar::to_bytes).collect();
        let sequence = Sequence::unsigned(&data, 32);
        let mut out = [CompressedRistretto::identity()];
        self.commit_batch(&mut out, &[sequence], GeneratorSource::Slice(points));
        out[0]
            .decompress()
            .expect("device returned a non-canonical point encoding")
    }
}
