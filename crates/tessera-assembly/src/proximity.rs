//! Proximity queries: the engine's boundary with collision detection.
//!
//! The detector never inspects geometry itself. It asks a
//! [`ProximityQuery`] for attach point colliders near a socket, and the
//! presentation layer asks it which piece lies under the pointer. Hosts
//! that already run a physics engine implement the trait on top of it;
//! [`BoardScan`] answers directly from board state.

use nalgebra::Isometry2;
use parry2d_f64::query::{self, PointQuery};
use parry2d_f64::shape::{Ball, ConvexPolygon, Shape};
use tessera_math::{origin, Point2};

use crate::attach::AttachPointRef;
use crate::board::{Board, PieceKey};
use crate::layers::LayerFilter;

/// Source of collision queries for a board.
pub trait ProximityQuery {
    /// Attach point colliders overlapping a disc of `radius` at `center`,
    /// restricted to `filter`, nearest first, at most `max_hits`.
    ///
    /// Hits may include the querying piece's own points; the detector
    /// skips those.
    fn overlap_attach_points(
        &self,
        board: &Board,
        center: &Point2,
        radius: f64,
        filter: LayerFilter,
        max_hits: usize,
    ) -> Vec<AttachPointRef>;

    /// Piece bodies containing `point`, restricted to `filter`, nearest
    /// origin first.
    fn pick_pieces(&self, board: &Board, point: &Point2, filter: LayerFilter) -> Vec<PieceKey>;
}

/// Brute-force queries over the board's own pieces.
///
/// Attach points are balls of the configured collider radius; piece
/// bodies are regular polygons (discs below three vertices). Disabled
/// attach points have no collider.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardScan;

impl ProximityQuery for BoardScan {
    fn overlap_attach_points(
        &self,
        board: &Board,
        center: &Point2,
        radius: f64,
        filter: LayerFilter,
        max_hits: usize,
    ) -> Vec<AttachPointRef> {
        if max_hits == 0 || !filter.contains(board.layers().attach_point_layer()) {
            return Vec::new();
        }
        let probe = Ball::new(radius);
        let probe_at = Isometry2::translation(center.x, center.y);
        let collider = Ball::new(board.settings().detector.collider_radius);

        let mut hits: Vec<(f64, AttachPointRef)> = Vec::new();
        for view in board.attach_point_views() {
            if !view.enabled {
                continue;
            }
            let at = origin(&view.world);
            let collider_at = Isometry2::translation(at.x, at.y);
            match query::intersection_test(&probe_at, &probe, &collider_at, &collider) {
                Ok(true) => hits.push(((at - center).norm(), view.point)),
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(point = ?view.point, ?err, "unsupported collider pair");
                }
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.truncate(max_hits);
        hits.into_iter().map(|(_, point)| point).collect()
    }

    fn pick_pieces(&self, board: &Board, point: &Point2, filter: LayerFilter) -> Vec<PieceKey> {
        if !filter.contains(board.layers().piece_layer()) {
            return Vec::new();
        }
        let mut hits: Vec<(f64, PieceKey)> = Vec::new();
        for (key, piece) in board.pieces() {
            let Ok(world) = board.world_pose(key) else {
                continue;
            };
            let polygon = if piece.symmetry_order() >= 3 {
                ConvexPolygon::from_convex_hull(&piece.outline())
            } else {
                None
            };
            let body: Box<dyn Shape> = match polygon {
                Some(polygon) => Box::new(polygon),
                None => Box::new(Ball::new(piece.radius())),
            };
            if body.contains_point(&world, point) {
                hits.push(((origin(&world) - point).norm(), key));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, key)| key).collect()
    }
}

impl Board {
    /// The piece under `point`, if any.
    pub fn pick(&self, point: &Point2, proximity: &dyn ProximityQuery) -> Option<PieceKey> {
        proximity
            .pick_pieces(self, point, self.layers().piece_filter())
            .into_iter()
            .next()
    }
}
