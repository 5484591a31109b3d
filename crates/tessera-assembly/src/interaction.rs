//! Interactive rotation and dragging.
//!
//! A gesture is begun on a piece, previewed any number of times while the
//! pointer moves, then either ended or cancelled. Previews only move
//! transforms; attachments are re-evaluated once, when a gesture ends.
//! Every gesture first promotes its piece to transform root so the whole
//! assembly follows it rigidly.

use tessera_math::{nearest_multiple, rotated_in_place, snap_to_step, translated, Pose2, Tolerance, Vec2};

use crate::board::{Board, PieceKey};
use crate::detect::Attachment;
use crate::error::Result;
use crate::proximity::ProximityQuery;

/// A rotation in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationGesture {
    piece: PieceKey,
    start: Pose2,
    angle: f64,
}

impl RotationGesture {
    /// The piece being rotated.
    pub fn piece(&self) -> PieceKey {
        self.piece
    }

    /// World pose of the piece when the gesture began.
    pub fn start(&self) -> &Pose2 {
        &self.start
    }

    /// Accumulated rotation in degrees, counter-clockwise.
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// How a rotation gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RotationOutcome {
    /// The angle snapped to a symmetry step and was applied.
    Committed {
        /// The applied rotation in degrees.
        angle: f64,
        /// Dockings formed afterwards.
        attachments: Vec<Attachment>,
    },
    /// The angle was too far from any symmetry step. The piece was put at
    /// the nearest step without re-evaluating attachments.
    Reverted {
        /// The applied rotation in degrees.
        angle: f64,
    },
}

/// A drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    piece: PieceKey,
    start: Pose2,
    offset: Vec2,
}

impl DragGesture {
    /// The piece being dragged.
    pub fn piece(&self) -> PieceKey {
        self.piece
    }

    /// World pose of the piece when the gesture began.
    pub fn start(&self) -> &Pose2 {
        &self.start
    }

    /// Accumulated world-space offset.
    pub fn offset(&self) -> &Vec2 {
        &self.offset
    }
}

impl Board {
    /// Start rotating `key`'s assembly about `key`'s own origin.
    pub fn begin_rotate(&mut self, key: PieceKey) -> Result<RotationGesture> {
        self.transform_to_root(key)?;
        Ok(RotationGesture {
            piece: key,
            start: self.world_pose(key)?,
            angle: 0.0,
        })
    }

    /// Add `delta_degrees` to a rotation and show it.
    pub fn preview_rotate(&mut self, gesture: &mut RotationGesture, delta_degrees: f64) -> Result<()> {
        gesture.angle += delta_degrees;
        self.set_world_pose(gesture.piece, rotated_in_place(&gesture.start, gesture.angle))
    }

    /// Finish a rotation.
    ///
    /// If the accumulated angle is within the snap tolerance of a multiple
    /// of the piece's symmetry angle, that multiple is applied and the
    /// detector runs over the assembly. Otherwise the piece reverts to the
    /// nearest multiple and the detector does not run.
    pub fn end_rotate(
        &mut self,
        gesture: RotationGesture,
        proximity: &dyn ProximityQuery,
    ) -> Result<RotationOutcome> {
        let step = self.piece(gesture.piece)?.rotation_symmetry_angle();
        let tolerance = self.settings().rotation.snap_tolerance;
        let Some(angle) = snap_to_step(gesture.angle, step, tolerance) else {
            let angle = nearest_multiple(gesture.angle, step);
            tracing::debug!(piece = ?gesture.piece, requested = gesture.angle, angle, "rotation reverted");
            self.set_world_pose(gesture.piece, rotated_in_place(&gesture.start, angle))?;
            return Ok(RotationOutcome::Reverted { angle });
        };

        let end = rotated_in_place(&gesture.start, angle);
        self.set_world_pose(gesture.piece, end)?;
        let attachments = self.settle(gesture.piece, &gesture.start, &end, proximity)?;
        tracing::debug!(piece = ?gesture.piece, angle, docked = attachments.len(), "rotation committed");
        Ok(RotationOutcome::Committed { angle, attachments })
    }

    /// Abandon a rotation, restoring the start pose.
    pub fn cancel_rotate(&mut self, gesture: RotationGesture) -> Result<()> {
        self.set_world_pose(gesture.piece, gesture.start)
    }

    /// Start dragging `key`'s assembly.
    pub fn begin_drag(&mut self, key: PieceKey) -> Result<DragGesture> {
        self.transform_to_root(key)?;
        Ok(DragGesture {
            piece: key,
            start: self.world_pose(key)?,
            offset: Vec2::zeros(),
        })
    }

    /// Add `delta` to a drag and show it.
    pub fn preview_drag(&mut self, gesture: &mut DragGesture, delta: Vec2) -> Result<()> {
        gesture.offset += delta;
        self.set_world_pose(gesture.piece, translated(&gesture.start, &gesture.offset))
    }

    /// Finish a drag and run the detector over the moved assembly. A drag
    /// that ends where it began changes nothing.
    pub fn end_drag(
        &mut self,
        gesture: DragGesture,
        proximity: &dyn ProximityQuery,
    ) -> Result<Vec<Attachment>> {
        let end = translated(&gesture.start, &gesture.offset);
        self.set_world_pose(gesture.piece, end)?;
        self.settle(gesture.piece, &gesture.start, &end, proximity)
    }

    /// Abandon a drag, restoring the start pose.
    pub fn cancel_drag(&mut self, gesture: DragGesture) -> Result<()> {
        self.set_world_pose(gesture.piece, gesture.start)
    }

    /// Run the detector after a gesture, unless the piece ended where it
    /// started.
    fn settle(
        &mut self,
        key: PieceKey,
        start: &Pose2,
        end: &Pose2,
        proximity: &dyn ProximityQuery,
    ) -> Result<Vec<Attachment>> {
        if Tolerance::DEFAULT.poses_equal(start, end) {
            return Ok(Vec::new());
        }
        self.on_assembly_moved(key, proximity)
    }

    /// Move `key`'s assembly by `delta` and run the detector over it.
    pub fn move_piece(
        &mut self,
        key: PieceKey,
        delta: Vec2,
        proximity: &dyn ProximityQuery,
    ) -> Result<Vec<Attachment>> {
        self.transform_to_root(key)?;
        let moved = translated(&self.world_pose(key)?, &delta);
        self.set_world_pose(key, moved)?;
        self.on_assembly_moved(key, proximity)
    }
}
