//! Pieces: the nodes of the assembly graph.

use tessera_math::{Point2, Pose2};

use crate::attach::AttachPoint;
use crate::board::{FrameKey, PieceKey};
use crate::error::{AssemblyError, Result};
use crate::identity::AssemblyId;

/// Default circumradius of a piece body, in world units.
pub const DEFAULT_PIECE_RADIUS: f64 = 0.5;

/// Transform parent of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    /// Another piece.
    Piece(PieceKey),
    /// A non-piece transform ancestor.
    Frame(FrameKey),
}

impl Parent {
    /// The parent piece, if the parent is a piece.
    pub fn piece(self) -> Option<PieceKey> {
        match self {
            Parent::Piece(key) => Some(key),
            Parent::Frame(_) => None,
        }
    }
}

/// A puzzle piece.
///
/// Pieces are authored with [`Piece::new`] and the `with_*` builders, then
/// handed to a [`Board`](crate::Board). Once on a board, the transform
/// tree, identity and occupancy are managed exclusively by board
/// operations.
#[derive(Debug, Clone)]
pub struct Piece {
    name: Option<String>,
    symmetry_order: u32,
    radius: f64,
    attach_points: Vec<AttachPoint>,
    assembly: AssemblyId,
    can_attach: bool,
    pub(crate) local: Pose2,
    pub(crate) parent: Option<Parent>,
    pub(crate) children: Vec<PieceKey>,
}

impl Piece {
    /// A piece with `symmetry_order`-fold rotational symmetry, no attach
    /// points, unassigned identity, at the world origin.
    pub fn new(symmetry_order: u32) -> Result<Self> {
        if symmetry_order == 0 {
            return Err(AssemblyError::InvalidSymmetryOrder(symmetry_order));
        }
        Ok(Self {
            name: None,
            symmetry_order,
            radius: DEFAULT_PIECE_RADIUS,
            attach_points: Vec::new(),
            assembly: AssemblyId::UNASSIGNED,
            can_attach: true,
            local: Pose2::identity(),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Set a display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the body circumradius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Add an attach point at a pose local to the piece.
    pub fn with_attach_point(mut self, local: Pose2) -> Self {
        self.attach_points.push(AttachPoint::new(local));
        self
    }

    /// Add a pre-built attach point.
    pub fn with_point(mut self, point: AttachPoint) -> Self {
        self.attach_points.push(point);
        self
    }

    /// Place the piece at a world pose.
    pub fn at(mut self, pose: Pose2) -> Self {
        self.local = pose;
        self
    }

    /// Set whether the piece takes part in new attachments.
    pub fn with_can_attach(mut self, can_attach: bool) -> Self {
        self.can_attach = can_attach;
        self
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rotational symmetry order (number of body vertices).
    pub fn symmetry_order(&self) -> u32 {
        self.symmetry_order
    }

    /// Snap angle for interactive rotation, in degrees.
    pub fn rotation_symmetry_angle(&self) -> f64 {
        360.0 / self.symmetry_order as f64
    }

    /// Body circumradius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The piece's attach points, in authoring order.
    pub fn attach_points(&self) -> &[AttachPoint] {
        &self.attach_points
    }

    /// One attach point.
    pub fn attach_point(&self, index: usize) -> Option<&AttachPoint> {
        self.attach_points.get(index)
    }

    /// Current assembly identity.
    pub fn assembly(&self) -> AssemblyId {
        self.assembly
    }

    /// Whether the piece takes part in new attachments.
    pub fn can_attach(&self) -> bool {
        self.can_attach
    }

    /// Pose relative to the transform parent (world pose for a root
    /// without a frame).
    pub fn local_pose(&self) -> &Pose2 {
        &self.local
    }

    /// Transform parent.
    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }

    /// Parent piece, ignoring frames.
    pub fn parent_piece(&self) -> Option<PieceKey> {
        self.parent.and_then(Parent::piece)
    }

    /// Direct transform children.
    pub fn children(&self) -> &[PieceKey] {
        &self.children
    }

    /// Body outline in local coordinates: a regular polygon with one vertex
    /// per symmetry step, first vertex on +Y.
    pub fn outline(&self) -> Vec<Point2> {
        let step = self.rotation_symmetry_angle().to_radians();
        (0..self.symmetry_order)
            .map(|i| {
                let angle = std::f64::consts::FRAC_PI_2 + step * i as f64;
                Point2::new(self.radius * angle.cos(), self.radius * angle.sin())
            })
            .collect()
    }

    pub(crate) fn attach_point_mut(&mut self, index: usize) -> Option<&mut AttachPoint> {
        self.attach_points.get_mut(index)
    }

    pub(crate) fn set_assembly(&mut self, id: AssemblyId) {
        self.assembly = id;
    }

    pub(crate) fn set_can_attach(&mut self, can_attach: bool) {
        self.can_attach = can_attach;
    }

    /// Partner pieces across occupied attach points, with repeats.
    pub(crate) fn occupant_pieces(&self) -> impl Iterator<Item = PieceKey> + '_ {
        self.attach_points.iter().filter_map(AttachPoint::occupant_piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessera_math::pose;

    #[test]
    fn test_rotation_symmetry_angle() {
        assert_relative_eq!(Piece::new(4).unwrap().rotation_symmetry_angle(), 90.0);
        assert_relative_eq!(Piece::new(6).unwrap().rotation_symmetry_angle(), 60.0);
        assert_relative_eq!(Piece::new(1).unwrap().rotation_symmetry_angle(), 360.0);
    }

    #[test]
    fn test_zero_symmetry_rejected() {
        assert_eq!(
            Piece::new(0).unwrap_err(),
            AssemblyError::InvalidSymmetryOrder(0)
        );
    }

    #[test]
    fn test_builder() {
        let piece = Piece::new(3)
            .unwrap()
            .named("triangle")
            .with_radius(2.0)
            .with_attach_point(pose(0.0, 1.0, 0.0))
            .with_point(AttachPoint::new(pose(1.0, 0.0, -90.0)).disabled())
            .at(pose(4.0, 0.0, 0.0))
            .with_can_attach(false);

        assert_eq!(piece.name(), Some("triangle"));
        assert_eq!(piece.attach_points().len(), 2);
        assert!(!piece.attach_points()[1].is_enabled());
        assert!(!piece.can_attach());
        assert!(!piece.assembly().is_assigned());
        assert!(piece.parent().is_none());
    }

    #[test]
    fn test_outline_is_regular() {
        let piece = Piece::new(4).unwrap().with_radius(1.0);
        let outline = piece.outline();
        assert_eq!(outline.len(), 4);
        assert_relative_eq!(outline[0], Point2::new(0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(outline[1], Point2::new(-1.0, 0.0), epsilon = 1e-12);
        for p in &outline {
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }
}
