//! Consistency checks over a whole board.
//!
//! [`Board::audit`] walks every attach edge and every assembly and reports
//! anything that breaks the engine's structural rules: half-recorded
//! pairings, assemblies with zero or several transform roots, and members
//! whose identity differs from their root's.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::attach::AttachPointRef;
use crate::board::{Board, PieceKey};
use crate::identity::AssemblyId;

/// One broken rule found by [`Board::audit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditIssue {
    /// An occupant refers to a piece or attach point that no longer exists.
    DanglingOccupant {
        /// The occupied point.
        point: AttachPointRef,
        /// Where it claims to be docked.
        partner: AttachPointRef,
    },
    /// `point` is docked to `partner`, but `partner` does not point back.
    AsymmetricOccupancy {
        /// The occupied point.
        point: AttachPointRef,
        /// Where it claims to be docked.
        partner: AttachPointRef,
    },
    /// An assembly member hangs under a different transform root than the
    /// rest of its assembly.
    SplitRoot {
        /// The member.
        piece: PieceKey,
        /// Its transform root.
        root: PieceKey,
        /// The root shared by the rest of the assembly.
        expected: PieceKey,
    },
    /// An assembly's transform root is not itself part of the assembly.
    ForeignRoot {
        /// A member of the assembly.
        piece: PieceKey,
        /// The root above it.
        root: PieceKey,
    },
    /// A member's identity differs from its root's.
    IdentityMismatch {
        /// The member.
        piece: PieceKey,
        /// The root's identity.
        expected: AssemblyId,
        /// The member's identity.
        found: AssemblyId,
    },
    /// Two separate assemblies carry the same identity.
    SharedIdentity {
        /// The identity.
        id: AssemblyId,
        /// Root of the first assembly.
        first: PieceKey,
        /// Root of the second.
        second: PieceKey,
    },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingOccupant { point, partner } => {
                write!(f, "{point:?} is docked to missing {partner:?}")
            }
            Self::AsymmetricOccupancy { point, partner } => {
                write!(f, "{point:?} is docked to {partner:?}, which does not point back")
            }
            Self::SplitRoot { piece, root, expected } => {
                write!(f, "{piece:?} is rooted at {root:?}, its assembly at {expected:?}")
            }
            Self::ForeignRoot { piece, root } => {
                write!(f, "{piece:?} is rooted at {root:?} outside its assembly")
            }
            Self::IdentityMismatch {
                piece,
                expected,
                found,
            } => write!(f, "{piece:?} carries {found}, its root {expected}"),
            Self::SharedIdentity { id, first, second } => {
                write!(f, "assemblies rooted at {first:?} and {second:?} share {id}")
            }
        }
    }
}

impl Board {
    /// Check the board's structural rules. An empty result means the board
    /// is consistent.
    pub fn audit(&self) -> Vec<AuditIssue> {
        let mut issues = Vec::new();

        for (key, piece) in self.pieces() {
            for (index, point) in piece.attach_points().iter().enumerate() {
                let Some(partner) = point.occupant() else {
                    continue;
                };
                let here = AttachPointRef::new(key, index);
                match self.attach_point(partner) {
                    Err(_) => issues.push(AuditIssue::DanglingOccupant {
                        point: here,
                        partner,
                    }),
                    Ok(other) if other.occupant() != Some(here) => {
                        issues.push(AuditIssue::AsymmetricOccupancy {
                            point: here,
                            partner,
                        })
                    }
                    Ok(_) => {}
                }
            }
        }

        let mut seen: HashSet<PieceKey> = HashSet::new();
        let mut owners: HashMap<AssemblyId, PieceKey> = HashMap::new();
        for (key, _) in self.pieces() {
            if seen.contains(&key) {
                continue;
            }
            let (Ok(members), Ok(root)) = (self.assembly_members(key), self.find_root(key)) else {
                continue;
            };
            seen.extend(members.iter().copied());

            if !members.contains(&root) {
                issues.push(AuditIssue::ForeignRoot { piece: key, root });
            }
            for &member in &members {
                if let Ok(found) = self.find_root(member) {
                    if found != root {
                        issues.push(AuditIssue::SplitRoot {
                            piece: member,
                            root: found,
                            expected: root,
                        });
                    }
                }
            }

            let Some(expected) = self.get(root).map(|p| p.assembly()) else {
                continue;
            };
            for &member in &members {
                let Some(found) = self.get(member).map(|p| p.assembly()) else {
                    continue;
                };
                if found != expected {
                    issues.push(AuditIssue::IdentityMismatch {
                        piece: member,
                        expected,
                        found,
                    });
                }
            }
            if expected.is_assigned() {
                match owners.get(&expected) {
                    Some(&first) if first != root => issues.push(AuditIssue::SharedIdentity {
                        id: expected,
                        first,
                        second: root,
                    }),
                    Some(_) => {}
                    None => {
                        owners.insert(expected, root);
                    }
                }
            }
        }

        for issue in &issues {
            tracing::debug!(%issue, "audit");
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Parent, Piece};
    use crate::proximity::BoardScan;
    use tessera_math::{pose, Vec2};

    fn column(board: &mut Board, n: usize) -> Vec<PieceKey> {
        let keys: Vec<PieceKey> = (0..n)
            .map(|i| {
                board.insert_piece(
                    Piece::new(4)
                        .unwrap()
                        .with_attach_point(pose(0.0, 0.5, 0.0))
                        .with_attach_point(pose(0.0, -0.5, 180.0))
                        .at(pose(0.0, i as f64 * 1.01, 0.0)),
                )
            })
            .collect();
        for &key in &keys {
            board.on_transform_changed(key, &BoardScan).unwrap();
        }
        keys
    }

    #[test]
    fn test_clean_board_has_no_issues() {
        let mut board = Board::default();
        assert!(board.audit().is_empty());
        column(&mut board, 4);
        assert!(board.audit().is_empty());
    }

    #[test]
    fn test_reports_asymmetric_occupancy() {
        let mut board = Board::default();
        let keys = column(&mut board, 2);
        board
            .attach_point_mut(AttachPointRef::new(keys[1], 1))
            .unwrap()
            .set_occupant(None);
        let issues = board.audit();
        assert!(issues.contains(&AuditIssue::AsymmetricOccupancy {
            point: AttachPointRef::new(keys[0], 0),
            partner: AttachPointRef::new(keys[1], 1),
        }));
    }

    #[test]
    fn test_reports_dangling_occupant() {
        let mut board = Board::default();
        let keys = column(&mut board, 1);
        let missing = AttachPointRef::new(keys[0], 9);
        board
            .attach_point_mut(AttachPointRef::new(keys[0], 0))
            .unwrap()
            .set_occupant(Some(missing));
        assert_eq!(
            board.audit(),
            vec![AuditIssue::DanglingOccupant {
                point: AttachPointRef::new(keys[0], 0),
                partner: missing,
            }]
        );
    }

    #[test]
    fn test_reports_identity_mismatch() {
        let mut board = Board::default();
        let keys = column(&mut board, 2);
        let root = board.find_root(keys[0]).unwrap();
        let member = if root == keys[0] { keys[1] } else { keys[0] };
        let stray = board.allocate_id();
        board.set_assembly(member, stray).unwrap();
        let expected = board.piece(root).unwrap().assembly();
        assert!(board.audit().contains(&AuditIssue::IdentityMismatch {
            piece: member,
            expected,
            found: stray,
        }));
    }

    #[test]
    fn test_reports_split_root() {
        let mut board = Board::default();
        let keys = column(&mut board, 2);
        let root = board.find_root(keys[0]).unwrap();
        let member = if root == keys[0] { keys[1] } else { keys[0] };
        board.reparent(member, None).unwrap();
        let issues = board.audit();
        assert!(issues
            .iter()
            .any(|i| matches!(i, AuditIssue::SplitRoot { .. })));
    }

    #[test]
    fn test_reports_foreign_root_and_shared_identity() {
        let mut board = Board::default();
        let a = board.insert_piece(Piece::new(4).unwrap());
        let b = board.insert_piece(Piece::new(4).unwrap().at(pose(3.0, 0.0, 0.0)));
        board.ensure_identity(a).unwrap();
        // b is not docked to a, so hanging under it is wrong
        board.reparent(b, Some(Parent::Piece(a))).unwrap();
        let issues = board.audit();
        assert!(issues.contains(&AuditIssue::ForeignRoot { piece: b, root: a }));

        board.reparent(b, None).unwrap();
        let id = board.piece(a).unwrap().assembly();
        board.set_assembly(b, id).unwrap();
        assert!(board.audit().contains(&AuditIssue::SharedIdentity {
            id,
            first: a,
            second: b,
        }));
    }

    #[test]
    fn test_properties_hold_through_edit_sequence() {
        let mut board = Board::default();
        let keys = column(&mut board, 4);
        assert!(board.audit().is_empty());

        board.transform_to_root(keys[2]).unwrap();
        assert!(board.audit().is_empty());

        board.un_attach(AttachPointRef::new(keys[1], 0)).unwrap();
        assert!(board.audit().is_empty());
        assert_eq!(board.piece(keys[0]).unwrap().assembly(), board.piece(keys[1]).unwrap().assembly());
        assert_eq!(board.piece(keys[2]).unwrap().assembly(), board.piece(keys[3]).unwrap().assembly());
        assert_ne!(board.piece(keys[1]).unwrap().assembly(), board.piece(keys[2]).unwrap().assembly());

        // drag the lower pair back into range and let the detector rejoin it
        let formed = board.move_piece(keys[0], Vec2::new(0.0, 0.01), &BoardScan).unwrap();
        assert_eq!(formed.len(), 1);
        assert!(board.audit().is_empty());
        let id = board.piece(keys[0]).unwrap().assembly();
        for &k in &keys {
            assert_eq!(board.piece(k).unwrap().assembly(), id);
        }

        board.update_to_new_id(board.find_root(keys[3]).unwrap()).unwrap();
        assert!(board.audit().is_empty());
        board.remove_piece(keys[1]).unwrap();
        assert!(board.audit().is_empty());
    }
}
