//! Attach points: directional sockets on a piece.

use tessera_math::Pose2;

use crate::board::PieceKey;

/// Address of one attach point: owning piece plus index into its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachPointRef {
    /// Owning piece.
    pub piece: PieceKey,
    /// Index into the piece's attach points.
    pub index: usize,
}

impl AttachPointRef {
    /// Create a new reference.
    pub fn new(piece: PieceKey, index: usize) -> Self {
        Self { piece, index }
    }
}

/// One potential connection site on a piece.
///
/// The local pose places the socket relative to its piece; the socket
/// faces along the pose's local +Y axis. Only `enabled` and the occupant
/// change at runtime, and both go through [`Board`](crate::Board) so the
/// pairing stays symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachPoint {
    local: Pose2,
    enabled: bool,
    occupant: Option<AttachPointRef>,
}

impl AttachPoint {
    /// An enabled, unoccupied attach point at `local`.
    pub fn new(local: Pose2) -> Self {
        Self {
            local,
            enabled: true,
            occupant: None,
        }
    }

    /// Same point, initially disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Pose relative to the owning piece.
    pub fn local_pose(&self) -> &Pose2 {
        &self.local
    }

    /// Whether the detector may consider this point.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The partner attach point, if docked.
    pub fn occupant(&self) -> Option<AttachPointRef> {
        self.occupant
    }

    /// The piece docked here, if any.
    pub fn occupant_piece(&self) -> Option<PieceKey> {
        self.occupant.map(|o| o.piece)
    }

    /// Whether another piece is docked here.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Enabled and free.
    pub fn is_available(&self) -> bool {
        self.enabled && self.occupant.is_none()
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<AttachPointRef>) {
        self.occupant = occupant;
    }
}
