use thiserror::Error;

/// Represents an error in proof creation, verification, or parsing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ProofError {
    /// The proof failed to verify.
    #[error("proof verification failed")]
    VerificationError,
    /// The proof or one of its points could not be parsed.
    #[error("proof data could not be parsed")]
    FormatError,
    /// The transcript produced a zero challenge, which has no inverse.
    #[error("transcript produced a zero challenge")]
    ZeroChallenge,
}
