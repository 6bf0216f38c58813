//! Shared helpers for unit tests.

use crate::backend::{self, InitError};
use crate::config::{BackendKind, InitConfig};

/// Size of the precomputed generator table used by tests.
pub const TEST_PRECOMPUTED_GENERATORS: u64 = 16;

/// Initializes the process-wide CPU backend, tolerating earlier callers.
///
/// The backend singleton is one-shot per process, so every test that touches
/// a commitment or inner-product entry point funnels through here.
pub fn init_cpu_backend_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    match backend::init(InitConfig {
        backend: BackendKind::Cpu,
        num_precomputed_generators: TEST_PRECOMPUTED_GENERATORS,
    }) {
        Ok(()) | Err(InitError::AlreadyInitialized) => {}
        Err(error) => panic!("failed to initialize the test backend: {error}"),
    }
}
