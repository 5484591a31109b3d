//! The board: piece arena, frames, and the spatial transform tree.

use slotmap::{new_key_type, SlotMap};
use tessera_math::Pose2;

use crate::attach::AttachPointRef;
use crate::config::BoardSettings;
use crate::error::{AssemblyError, Result};
use crate::identity::{AssemblyId, IdAllocator};
use crate::layers::CollisionLayers;
use crate::piece::{Parent, Piece};

new_key_type! {
    /// Handle to a piece on a board. Stale handles resolve to nothing.
    pub struct PieceKey;

    /// Handle to a frame on a board.
    pub struct FrameKey;
}

/// A non-piece transform ancestor (a scene group, a tray, a camera rig).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Display name.
    pub name: String,
    /// World pose.
    pub pose: Pose2,
}

/// Render-facing state of one attach point.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachPointView {
    /// Which point this is.
    pub point: AttachPointRef,
    /// World pose of the socket.
    pub world: Pose2,
    /// Whether the detector considers it.
    pub enabled: bool,
    /// Partner point, if docked.
    pub occupant: Option<AttachPointRef>,
    /// Identity of the owning piece's assembly.
    pub assembly: AssemblyId,
}

/// A set of pieces and the engine state that relates them.
///
/// All mutation goes through `&mut Board`, so one caller at a time
/// changes occupancy, identities and parentage; a traversal never sees a
/// half-applied edit. Hosts that share a board across threads wrap it in
/// a single lock.
#[derive(Debug)]
pub struct Board {
    pub(crate) pieces: SlotMap<PieceKey, Piece>,
    frames: SlotMap<FrameKey, Frame>,
    ids: IdAllocator,
    layers: CollisionLayers,
    settings: BoardSettings,
}

impl Board {
    /// Create an empty board.
    pub fn new(settings: BoardSettings) -> Result<Self> {
        settings.validate()?;
        let layers = CollisionLayers::new(settings.layers.clone())?;
        Ok(Self {
            pieces: SlotMap::with_key(),
            frames: SlotMap::with_key(),
            ids: IdAllocator::new(),
            layers,
            settings,
        })
    }

    /// Board configuration.
    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Collision layer table.
    pub fn layers(&self) -> &CollisionLayers {
        &self.layers
    }

    /// Add a piece. Its authored pose becomes its world pose.
    pub fn insert_piece(&mut self, mut piece: Piece) -> PieceKey {
        piece.parent = None;
        piece.children.clear();
        self.pieces.insert(piece)
    }

    /// Add a frame at a world pose.
    pub fn insert_frame(&mut self, name: impl Into<String>, pose: Pose2) -> FrameKey {
        self.frames.insert(Frame {
            name: name.into(),
            pose,
        })
    }

    /// Look up a frame.
    pub fn frame(&self, key: FrameKey) -> Result<&Frame> {
        self.frames.get(key).ok_or(AssemblyError::UnknownFrame(key))
    }

    /// Move a frame. Pieces under it move with it.
    pub fn set_frame_pose(&mut self, key: FrameKey, pose: Pose2) -> Result<()> {
        let frame = self
            .frames
            .get_mut(key)
            .ok_or(AssemblyError::UnknownFrame(key))?;
        frame.pose = pose;
        Ok(())
    }

    /// Put the assembly containing `piece` under `frame` (or at top level),
    /// keeping every world pose.
    pub fn set_frame(&mut self, piece: PieceKey, frame: Option<FrameKey>) -> Result<()> {
        if let Some(f) = frame {
            self.frame(f)?;
        }
        let root = self.find_root(piece)?;
        self.reparent(root, frame.map(Parent::Frame))
    }

    /// Look up a piece.
    pub fn piece(&self, key: PieceKey) -> Result<&Piece> {
        self.pieces.get(key).ok_or(AssemblyError::UnknownPiece(key))
    }

    pub(crate) fn piece_mut(&mut self, key: PieceKey) -> Result<&mut Piece> {
        self.pieces
            .get_mut(key)
            .ok_or(AssemblyError::UnknownPiece(key))
    }

    /// Look up a piece, `None` if it is gone.
    pub fn get(&self, key: PieceKey) -> Option<&Piece> {
        self.pieces.get(key)
    }

    /// Whether `key` refers to a live piece.
    pub fn contains(&self, key: PieceKey) -> bool {
        self.pieces.contains_key(key)
    }

    /// Number of pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Whether the board holds no pieces.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Iterate over all pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (PieceKey, &Piece)> {
        self.pieces.iter()
    }

    /// Allow or forbid new attachments involving `piece`. Existing
    /// attachments are kept.
    pub fn set_can_attach(&mut self, piece: PieceKey, can_attach: bool) -> Result<()> {
        self.piece_mut(piece)?.set_can_attach(can_attach);
        Ok(())
    }

    /// World pose of a piece.
    pub fn world_pose(&self, key: PieceKey) -> Result<Pose2> {
        let piece = self.piece(key)?;
        Ok(self.parent_world(piece.parent)? * piece.local)
    }

    /// World pose of an attach point.
    pub fn attach_point_world_pose(&self, point: AttachPointRef) -> Result<Pose2> {
        let local = *self.attach_point(point)?.local_pose();
        Ok(self.world_pose(point.piece)? * local)
    }

    /// Set a piece's world pose. Its transform children follow.
    pub fn set_world_pose(&mut self, key: PieceKey, world: Pose2) -> Result<()> {
        let parent_world = self.parent_world(self.piece(key)?.parent)?;
        self.piece_mut(key)?.local = parent_world.inverse() * world;
        Ok(())
    }

    /// Render-facing snapshot of every attach point on the board.
    pub fn attach_point_views(&self) -> Vec<AttachPointView> {
        let mut views = Vec::new();
        for (key, piece) in &self.pieces {
            let Ok(world) = self.world_pose(key) else {
                continue;
            };
            for (index, point) in piece.attach_points().iter().enumerate() {
                views.push(AttachPointView {
                    point: AttachPointRef::new(key, index),
                    world: world * point.local_pose(),
                    enabled: point.is_enabled(),
                    occupant: point.occupant(),
                    assembly: piece.assembly(),
                });
            }
        }
        views
    }

    /// Remove a piece, detaching every occupied point first. Its remaining
    /// transform children move to its parent.
    pub fn remove_piece(&mut self, key: PieceKey) -> Result<Piece> {
        let occupied: Vec<usize> = self
            .piece(key)?
            .attach_points()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_occupied())
            .map(|(i, _)| i)
            .collect();
        for index in occupied {
            self.un_attach(AttachPointRef::new(key, index))?;
        }

        let parent = self.piece(key)?.parent;
        let children = self.piece(key)?.children.clone();
        for child in children {
            self.reparent(child, parent)?;
        }
        if let Some(Parent::Piece(p)) = parent {
            if let Some(p) = self.pieces.get_mut(p) {
                p.children.retain(|c| *c != key);
            }
        }
        tracing::debug!(piece = ?key, "removed piece");
        self.pieces.remove(key).ok_or(AssemblyError::UnknownPiece(key))
    }

    pub(crate) fn attach_point(&self, point: AttachPointRef) -> Result<&crate::attach::AttachPoint> {
        self.piece(point.piece)?
            .attach_point(point.index)
            .ok_or(AssemblyError::UnknownAttachPoint {
                piece: point.piece,
                index: point.index,
            })
    }

    pub(crate) fn attach_point_mut(
        &mut self,
        point: AttachPointRef,
    ) -> Result<&mut crate::attach::AttachPoint> {
        self.piece_mut(point.piece)?
            .attach_point_mut(point.index)
            .ok_or(AssemblyError::UnknownAttachPoint {
                piece: point.piece,
                index: point.index,
            })
    }

    /// World pose of a transform parent (identity for none).
    pub(crate) fn parent_world(&self, parent: Option<Parent>) -> Result<Pose2> {
        match parent {
            None => Ok(Pose2::identity()),
            Some(Parent::Frame(f)) => Ok(self.frame(f)?.pose),
            Some(Parent::Piece(p)) => self.world_pose(p),
        }
    }

    /// Move `key` under `new_parent`, keeping its world pose.
    pub(crate) fn reparent(&mut self, key: PieceKey, new_parent: Option<Parent>) -> Result<()> {
        if let Some(Parent::Piece(mut ancestor)) = new_parent {
            loop {
                if ancestor == key {
                    return Err(AssemblyError::TransformCycle(key));
                }
                match self.piece(ancestor)?.parent_piece() {
                    Some(next) => ancestor = next,
                    None => break,
                }
            }
        }

        let world = self.world_pose(key)?;
        let parent_world = self.parent_world(new_parent)?;
        let old_parent = self.piece(key)?.parent;
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(Parent::Piece(old)) = old_parent {
            if let Some(old) = self.pieces.get_mut(old) {
                old.children.retain(|c| *c != key);
            }
        }
        if let Some(Parent::Piece(new)) = new_parent {
            self.piece_mut(new)?.children.push(key);
        }
        let piece = self.piece_mut(key)?;
        piece.parent = new_parent;
        piece.local = parent_world.inverse() * world;
        Ok(())
    }

    pub(crate) fn allocate_id(&mut self) -> AssemblyId {
        self.ids.allocate()
    }

    pub(crate) fn set_assembly(&mut self, key: PieceKey, id: AssemblyId) -> Result<()> {
        self.piece_mut(key)?.set_assembly(id);
        Ok(())
    }

    /// Live pieces docked to `key`, deduplicated, in attach point order.
    pub(crate) fn neighbors(&self, key: PieceKey) -> Result<Vec<PieceKey>> {
        let mut out = Vec::new();
        for other in self.piece(key)?.occupant_pieces() {
            if self.pieces.contains_key(other) && !out.contains(&other) {
                out.push(other);
            }
        }
        Ok(out)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            pieces: SlotMap::with_key(),
            frames: SlotMap::with_key(),
            ids: IdAllocator::new(),
            layers: CollisionLayers::default(),
            settings: BoardSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessera_math::{heading_degrees, origin, pose, Point2};

    #[test]
    fn test_insert_and_lookup() {
        let mut board = Board::default();
        let a = board.insert_piece(Piece::new(4).unwrap().at(pose(1.0, 2.0, 0.0)));
        assert_eq!(board.len(), 1);
        assert!(board.contains(a));
        assert_relative_eq!(
            origin(&board.world_pose(a).unwrap()),
            Point2::new(1.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_reparent_preserves_world_pose() {
        let mut board = Board::default();
        let a = board.insert_piece(Piece::new(4).unwrap().at(pose(1.0, 0.0, 90.0)));
        let b = board.insert_piece(Piece::new(4).unwrap().at(pose(3.0, 4.0, 30.0)));
        let before = board.world_pose(b).unwrap();

        board.reparent(b, Some(Parent::Piece(a))).unwrap();
        assert_eq!(board.piece(b).unwrap().parent_piece(), Some(a));
        assert_eq!(board.piece(a).unwrap().children(), &[b]);
        assert_relative_eq!(board.world_pose(b).unwrap(), before, epsilon = 1e-9);

        // children follow their parent
        board.set_world_pose(a, pose(1.0, 1.0, 90.0)).unwrap();
        assert_relative_eq!(
            origin(&board.world_pose(b).unwrap()),
            Point2::new(3.0, 5.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(heading_degrees(&board.world_pose(b).unwrap()), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reparent_rejects_cycle() {
        let mut board = Board::default();
        let a = board.insert_piece(Piece::new(4).unwrap());
        let b = board.insert_piece(Piece::new(4).unwrap());
        board.reparent(b, Some(Parent::Piece(a))).unwrap();
        assert_eq!(
            board.reparent(a, Some(Parent::Piece(b))),
            Err(AssemblyError::TransformCycle(a))
        );
        assert_eq!(
            board.reparent(a, Some(Parent::Piece(a))),
            Err(AssemblyError::TransformCycle(a))
        );
    }

    #[test]
    fn test_frame_parent() {
        let mut board = Board::default();
        let tray = board.insert_frame("tray", pose(10.0, 0.0, 0.0));
        let a = board.insert_piece(Piece::new(4).unwrap().at(pose(11.0, 0.0, 0.0)));
        board.set_frame(a, Some(tray)).unwrap();
        assert_eq!(board.piece(a).unwrap().parent(), Some(Parent::Frame(tray)));
        assert_relative_eq!(
            origin(board.piece(a).unwrap().local_pose()),
            Point2::new(1.0, 0.0),
            epsilon = 1e-12
        );

        board.set_frame_pose(tray, pose(20.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(
            origin(&board.world_pose(a).unwrap()),
            Point2::new(21.0, 0.0),
            epsilon = 1e-12
        );
        assert_eq!(board.frame(tray).unwrap().name, "tray");
    }

    #[test]
    fn test_attach_point_world_pose() {
        let mut board = Board::default();
        let a = board.insert_piece(
            Piece::new(4)
                .unwrap()
                .with_attach_point(pose(0.0, 0.5, 0.0))
                .at(pose(2.0, 0.0, 180.0)),
        );
        let world = board.attach_point_world_pose(AttachPointRef::new(a, 0)).unwrap();
        assert_relative_eq!(origin(&world), Point2::new(2.0, -0.5), epsilon = 1e-12);
        assert!(matches!(
            board.attach_point_world_pose(AttachPointRef::new(a, 3)),
            Err(AssemblyError::UnknownAttachPoint { index: 3, .. })
        ));
    }

    #[test]
    fn test_stale_key_is_unknown() {
        let mut board = Board::default();
        let a = board.insert_piece(Piece::new(4).unwrap());
        board.remove_piece(a).unwrap();
        assert!(!board.contains(a));
        assert_eq!(board.world_pose(a), Err(AssemblyError::UnknownPiece(a)));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = BoardSettings::default();
        settings.detector.max_candidates = 0;
        assert!(Board::new(settings).is_err());
    }
}
