//! Backend selection and the multi-scalar-multiplication capability set.
//!
//! The process picks an engine exactly once via [`init`]; every commitment
//! and inner-product entry point afterwards dispatches through the selected
//! engine. Re-initialization is an error and the selection never hot-swaps.

pub mod cpu;

#[cfg(feature = "gpu")]
pub mod gpu;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::config::{BackendKind, InitConfig};
use crate::generators;
use crate::sequence::Sequence;

const LOG_TARGET: &str = "multicommit::backend";

/// Where an engine sources the generator vector for a batch.
#[derive(Clone, Copy, Debug)]
pub enum GeneratorSource<'a> {
    /// The canonical stream starting at this offset.
    Offset(u64),
    /// A caller-supplied vector, at least as long as the longest sequence.
    Slice(&'a [RistrettoPoint]),
}

/// Capability set every backend provides.
///
/// Both implementations must produce bit-identical compressed outputs for
/// identical inputs: the result of each operation is a group element, and
/// only its canonical encoding ever leaves the engine.
pub trait MsmEngine: Send + Sync {
    /// Computes one Pedersen commitment per sequence against a shared
    /// generator vector, writing compressed points in sequence order.
    fn commit_batch(
        &self,
        commitments: &mut [CompressedRistretto],
        sequences: &[Sequence<'_>],
        generators: GeneratorSource<'_>,
    );

    /// A single multi-scalar multiplication `Σ scalars[i] · points[i]`.
    fn msm_single(&self, scalars: &[Scalar], points: &[RistrettoPoint]) -> RistrettoPoint;
}

/// Errors surfaced by [`init`]. All are recoverable; the caller may retry
/// with a different configuration (except after a prior success, which is
/// permanent for the process lifetime).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InitError {
    #[error("backend already initialized")]
    AlreadyInitialized,
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

struct BackendState {
    engine: Box<dyn MsmEngine>,
    config: InitConfig,
}

static STATE: OnceCell<BackendState> = OnceCell::new();

/// Selects the process-wide backend and derives the precomputed generator
/// table. Succeeds at most once.
pub fn init(config: InitConfig) -> Result<(), InitError> {
    if STATE.get().is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    let engine: Box<dyn MsmEngine> = match config.backend {
        BackendKind::Cpu => Box::new(cpu::CpuEngine::new()),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Box::new(
            gpu::GpuEngine::new()
                .map_err(|error| InitError::BackendUnavailable(error.to_string()))?,
        ),
        #[cfg(not(feature = "gpu"))]
        BackendKind::Gpu => {
            return Err(InitError::BackendUnavailable(
                "this build does not include the `gpu` feature".into(),
            ))
        }
    };
    generators::precompute(config.num_precomputed_generators);
    STATE
        .set(BackendState { engine, config })
        .map_err(|_| InitError::AlreadyInitialized)?;
    tracing::info!(
        target: LOG_TARGET,
        backend = ?config.backend,
        precomputed = config.num_precomputed_generators,
        "backend initialized"
    );
    Ok(())
}

/// The backend selected by the successful [`init`], if any.
pub fn active_backend() -> Option<BackendKind> {
    STATE.get().map(|state| state.config.backend)
}

/// The engine selected at init. Calling any commitment or inner-product
/// entry point before a successful init is caller misuse and panics.
pub(crate) fn initialized_engine() -> &'static dyn MsmEngine {
    &*STATE
        .get()
        .expect("backend is not initialized: call multicommit::init first")
        .engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn second_initialization_is_rejected() {
        test_utils::init_cpu_backend_for_tests();
        assert_eq!(
            init(InitConfig::default()),
            Err(InitError::AlreadyInitialized)
        );
        assert_eq!(active_backend(), Some(BackendKind::Cpu));
    }
}
