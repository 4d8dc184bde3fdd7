//! Pipeline error types.

use thiserror::Error;

use crate::crypto::EnvelopeError;
use crate::stego::StegoError;

use super::event::Reply;

/// Errors that can end an encode or decode pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Sealing or opening the envelope failed.
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Embedding or extracting the payload failed.
    #[error("Steganography error: {0}")]
    Stego(#[from] StegoError),

    /// Background task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The single reply shown to the user for this failure.
    ///
    /// Wrong passwords, corrupted images and images without a payload all
    /// collapse into [`Reply::NoSecretFound`].
    pub fn reply(&self) -> Reply {
        match self {
            PipelineError::Envelope(EnvelopeError::Expired) => Reply::Expired,
            PipelineError::Envelope(EnvelopeError::DecryptionFailed)
            | PipelineError::Stego(StegoError::Malformed)
            | PipelineError::Stego(StegoError::ImageLoad(_)) => Reply::NoSecretFound,
            _ => Reply::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_mapping() {
        assert_eq!(PipelineError::from(EnvelopeError::Expired).reply(), Reply::Expired);
        assert_eq!(
            PipelineError::from(EnvelopeError::DecryptionFailed).reply(),
            Reply::NoSecretFound
        );
        assert_eq!(PipelineError::from(StegoError::Malformed).reply(), Reply::NoSecretFound);
        assert_eq!(
            PipelineError::from(StegoError::CapacityExceeded { needed: 9, capacity: 1 }).reply(),
            Reply::Failed
        );
        assert_eq!(PipelineError::Internal("boom".into()).reply(), Reply::Failed);
    }
}
