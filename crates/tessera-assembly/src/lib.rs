#![warn(missing_docs)]

//! Piece attachment and assembly-graph engine.
//!
//! Pieces carry directional attach points. When a piece moves, the
//! detector looks for facing sockets on other pieces nearby, docks them,
//! and merges the two assemblies: one transform root governs the combined
//! structure and every member shares the root's identity. Detaching
//! reverses this, splitting an assembly or leaving it whole when another
//! path still connects the two sides.
//!
//! # Features
//!
//! - Slot-map piece arena with generational keys and non-piece frames
//! - Transform-tree re-rooting that never moves a piece
//! - Cycle-safe breadth-first identity propagation
//! - Pluggable proximity queries with a built-in `parry2d` scan
//! - Rotation and drag gestures gated on symmetry steps
//! - Editor actions and a structural audit
//!
//! # Example
//!
//! ```ignore
//! use tessera_assembly::{Board, BoardScan, Piece};
//! use tessera_math::pose;
//!
//! let mut board = Board::default();
//! let a = board.insert_piece(Piece::new(4)?.with_attach_point(pose(0.0, 0.5, 0.0)));
//! let b = board.insert_piece(
//!     Piece::new(4)?
//!         .with_attach_point(pose(0.0, 0.5, 0.0))
//!         .at(pose(0.0, 1.03, 180.0)),
//! );
//!
//! let docked = board.on_transform_changed(a, &BoardScan)?;
//! assert_eq!(docked.len(), 1);
//! assert_eq!(board.piece(a)?.assembly(), board.piece(b)?.assembly());
//! ```

mod attach;
mod audit;
mod board;
mod config;
mod detach;
mod detect;
mod editor;
mod error;
mod graph;
mod identity;
mod interaction;
mod layers;
mod piece;
mod proximity;

pub use attach::{AttachPoint, AttachPointRef};
pub use audit::AuditIssue;
pub use board::{AttachPointView, Board, Frame, FrameKey, PieceKey};
pub use config::{BoardSettings, DetectorSettings, RotationSettings};
pub use detect::{Attachment, Rejection};
pub use editor::EditorAction;
pub use error::{AssemblyError, Result};
pub use identity::{AssemblyId, IdAllocator};
pub use interaction::{DragGesture, RotationGesture, RotationOutcome};
pub use layers::{CollisionLayers, Layer, LayerFilter, ATTACH_POINT_LAYER, MAX_LAYERS, PIECE_LAYER};
pub use piece::{Parent, Piece, DEFAULT_PIECE_RADIUS};
pub use proximity::{BoardScan, ProximityQuery};
