use serde::{Deserialize, Serialize};

/// Which multi-scalar-multiplication engine the process runs on.
///
/// The discriminants are part of the C ABI: `1` selects the CPU engine and
/// `2` the GPU engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i32)]
pub enum BackendKind {
    Cpu = 1,
    Gpu = 2,
}

impl TryFrom<i32> for BackendKind {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(BackendKind::Cpu),
            2 => Ok(BackendKind::Gpu),
            other => Err(other),
        }
    }
}

/// One-shot initialization configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InitConfig {
    /// Engine every commitment and inner-product call dispatches to.
    pub backend: BackendKind,
    /// How many generators to derive into the immutable table at init time.
    /// Generators beyond this prefix are computed on demand.
    pub num_precomputed_generators: u64,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Cpu,
            num_precomputed_generators: 0,
        }
    }
}
