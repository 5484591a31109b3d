//! Attachment detection: find nearby compatible sockets and dock them.

use tessera_math::{origin, translated, up, Tolerance};

use crate::attach::AttachPointRef;
use crate::board::{Board, PieceKey};
use crate::error::{AssemblyError, Result};
use crate::proximity::ProximityQuery;

/// A docking that was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// Point on the piece that was evaluated.
    pub source: AttachPointRef,
    /// Point it docked with.
    pub target: AttachPointRef,
    /// Whether two separate assemblies were merged. `false` when the pair
    /// already shared an identity and only occupancy was recorded.
    pub merged: bool,
}

/// Why a candidate pair was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Both points belong to the same piece.
    SamePiece,
    /// One of the pieces has attaching switched off.
    AttachingDisabled,
    /// A point is disabled.
    PointDisabled,
    /// A point is already occupied.
    PointOccupied,
    /// The sockets do not face each other closely enough.
    NotOpposed,
}

impl Board {
    /// Run the detector on `key` after its world transform changed.
    ///
    /// Each enabled, free attach point queries `proximity` for attach point
    /// colliders within the configured radius and docks with the first
    /// compatible one. Returns the dockings recorded.
    pub fn on_transform_changed(
        &mut self,
        key: PieceKey,
        proximity: &dyn ProximityQuery,
    ) -> Result<Vec<Attachment>> {
        self.ensure_identity(key)?;
        let mut formed = Vec::new();
        if !self.piece(key)?.can_attach() {
            return Ok(formed);
        }

        let filter = self.layers().attach_point_filter();
        let radius = self.settings().detector.search_radius;
        let max_hits = self.settings().detector.max_candidates;
        let count = self.piece(key)?.attach_points().len();

        for index in 0..count {
            let source = AttachPointRef::new(key, index);
            if !self.attach_point(source)?.is_available() {
                continue;
            }
            let center = origin(&self.attach_point_world_pose(source)?);
            let hits = proximity.overlap_attach_points(self, &center, radius, filter, max_hits);

            for hit in hits {
                if hit.piece == key {
                    continue;
                }
                match self.attach(source, hit) {
                    Ok(Some(attachment)) => {
                        formed.push(attachment);
                        break;
                    }
                    Ok(None) => {}
                    Err(err @ AssemblyError::UnresolvedCollider { .. }) => {
                        tracing::error!(source = ?source, %err, "abandoning attachment attempt");
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(formed)
    }

    /// Run the detector on every piece of `key`'s assembly.
    ///
    /// Used after the whole assembly moved (a drag or a rotation of its
    /// root). Members are collected before any docking happens.
    pub fn on_assembly_moved(
        &mut self,
        key: PieceKey,
        proximity: &dyn ProximityQuery,
    ) -> Result<Vec<Attachment>> {
        let members = self.assembly_members(key)?;
        let mut formed = Vec::new();
        for member in members {
            formed.extend(self.on_transform_changed(member, proximity)?);
        }
        Ok(formed)
    }

    /// Check whether `source` may dock with `target`.
    pub fn compatibility(&self, source: AttachPointRef, target: AttachPointRef) -> Result<Option<Rejection>> {
        let src_piece = self.piece(source.piece)?;
        let src_point = self.attach_point(source)?;
        let tgt_piece = self.pieces.get(target.piece).ok_or(AssemblyError::UnresolvedCollider {
            piece: target.piece,
            index: target.index,
        })?;
        let tgt_point = tgt_piece
            .attach_point(target.index)
            .ok_or(AssemblyError::UnresolvedCollider {
                piece: target.piece,
                index: target.index,
            })?;

        if source.piece == target.piece {
            return Ok(Some(Rejection::SamePiece));
        }
        if !src_piece.can_attach() || !tgt_piece.can_attach() {
            return Ok(Some(Rejection::AttachingDisabled));
        }
        if !src_point.is_enabled() || !tgt_point.is_enabled() {
            return Ok(Some(Rejection::PointDisabled));
        }
        if src_point.is_occupied() || tgt_point.is_occupied() {
            return Ok(Some(Rejection::PointOccupied));
        }

        let src_up = up(&self.attach_point_world_pose(source)?);
        let tgt_up = up(&self.attach_point_world_pose(target)?);
        if src_up.dot(&tgt_up) >= self.settings().detector.opposition_threshold {
            return Ok(Some(Rejection::NotOpposed));
        }
        Ok(None)
    }

    /// Dock `source` with `target` if they are compatible.
    ///
    /// Records occupancy on both sides. When the two pieces belong to
    /// different assemblies, the target's whole assembly is first moved so
    /// the sockets coincide, then merged under the source's root. Pieces
    /// already sharing an identity only record occupancy.
    pub fn attach(&mut self, source: AttachPointRef, target: AttachPointRef) -> Result<Option<Attachment>> {
        if let Some(reason) = self.compatibility(source, target)? {
            tracing::trace!(?source, ?target, ?reason, "candidate rejected");
            return Ok(None);
        }

        let source_root = self.find_root(source.piece)?;
        let target_root = self.find_root(target.piece)?;
        let source_id = self.ensure_identity(source_root)?;
        let target_id = self.ensure_identity(target_root)?;
        let source_at = origin(&self.attach_point_world_pose(source)?);
        let target_at = origin(&self.attach_point_world_pose(target)?);

        self.attach_point_mut(source)?.set_occupant(Some(target));
        self.attach_point_mut(target)?.set_occupant(Some(source));

        let merged = source_id != target_id;
        if merged {
            if !Tolerance::DEFAULT.points_equal(&source_at, &target_at) {
                let delta = source_at - target_at;
                let moved = translated(&self.world_pose(target_root)?, &delta);
                self.set_world_pose(target_root, moved)?;
            }
            self.set_as_child(source_root, target_root)?;
            self.update_parenting(source_root)?;
        }
        tracing::debug!(?source, ?target, merged, "attached");
        Ok(Some(Attachment {
            source,
            target,
            merged,
        }))
    }
}
