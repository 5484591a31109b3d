//! Detachment: breaking attach edges and splitting assemblies.

use crate::attach::AttachPointRef;
use crate::board::{Board, PieceKey};
use crate::error::Result;

impl Board {
    /// Break the edge at `point`.
    ///
    /// Clears both halves of the pairing, then re-derives the tree and
    /// identity of each former partner from its remaining edges. Each side
    /// gets a fresh identity: two pieces still connected through another
    /// path end up sharing the second one, a true split leaves two
    /// distinct assemblies.
    ///
    /// Returns `false` (and logs a warning) if the point was already free.
    pub fn un_attach(&mut self, point: AttachPointRef) -> Result<bool> {
        let Some(partner) = self.attach_point(point)?.occupant() else {
            tracing::warn!(?point, "un_attach on a free attach point");
            return Ok(false);
        };

        self.attach_point_mut(point)?.set_occupant(None);
        let partner_alive = self.contains(partner.piece);
        if partner_alive {
            match self.attach_point_mut(partner) {
                Ok(other) if other.occupant() == Some(point) => other.set_occupant(None),
                Ok(other) => {
                    tracing::warn!(?point, ?partner, occupant = ?other.occupant(), "partner did not point back");
                }
                Err(err) => {
                    tracing::warn!(?point, ?partner, %err, "partner attach point missing");
                }
            }
        }

        self.reparent_component(point.piece, true)?;
        if partner_alive {
            self.reparent_component(partner.piece, true)?;
        }
        tracing::debug!(?point, ?partner, "detached");
        Ok(true)
    }

    /// Break every edge between `piece` and `other`.
    ///
    /// Returns how many edges were broken.
    pub fn un_attach_piece(&mut self, piece: PieceKey, other: PieceKey) -> Result<usize> {
        let points: Vec<AttachPointRef> = self
            .piece(piece)?
            .attach_points()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.occupant_piece() == Some(other))
            .map(|(index, _)| AttachPointRef::new(piece, index))
            .collect();
        let mut broken = 0;
        for point in points {
            if self.un_attach(point)? {
                broken += 1;
            }
        }
        Ok(broken)
    }

    /// Switch an attach point on or off. Switching off an occupied point
    /// detaches it.
    pub fn set_attach_point_enabled(&mut self, point: AttachPointRef, enabled: bool) -> Result<()> {
        let occupied = self.attach_point(point)?.is_occupied();
        self.attach_point_mut(point)?.set_enabled(enabled);
        if !enabled && occupied {
            self.un_attach(point)?;
        }
        Ok(())
    }
}
