//! Error types for the assembly engine.

use thiserror::Error;

use crate::board::{FrameKey, PieceKey};

/// Errors that can occur while manipulating pieces and assemblies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// Piece key does not refer to a live piece.
    #[error("piece not found: {0:?}")]
    UnknownPiece(PieceKey),

    /// Frame key does not refer to a live frame.
    #[error("frame not found: {0:?}")]
    UnknownFrame(FrameKey),

    /// Attach point index out of range for the piece.
    #[error("piece {piece:?} has no attach point {index}")]
    UnknownAttachPoint {
        /// Owning piece.
        piece: PieceKey,
        /// Requested attach point index.
        index: usize,
    },

    /// A proximity hit could not be resolved to a registered attach point.
    #[error("collider hit on {piece:?} point {index} has no registered attach point")]
    UnresolvedCollider {
        /// Piece reported by the proximity provider.
        piece: PieceKey,
        /// Attach point index reported by the proximity provider.
        index: usize,
    },

    /// Symmetry order must be at least one.
    #[error("invalid symmetry order: {0}")]
    InvalidSymmetryOrder(u32),

    /// Re-parenting would make a piece its own transform ancestor.
    #[error("re-parenting {0:?} would create a transform cycle")]
    TransformCycle(PieceKey),

    /// A required collision layer is missing or the layer table is too large.
    #[error("invalid collision layers: {0}")]
    InvalidLayers(String),

    /// Invalid board settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssemblyError>;
