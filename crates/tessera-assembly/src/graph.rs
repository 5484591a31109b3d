//! Assembly graph management: roots, re-rooting and identity propagation.
//!
//! Two relations live over the same pieces. The transform tree
//! (`parent`/`children`) decides whose pose governs whom; the attach graph
//! (occupied attach points) decides which pieces form one assembly. The
//! operations here keep them aligned: one transform root per assembly,
//! every other member beneath it, all sharing the root's identity.

use std::collections::{HashSet, VecDeque};

use crate::board::{Board, PieceKey};
use crate::error::Result;
use crate::identity::AssemblyId;
use crate::piece::Parent;

impl Board {
    /// Walk parent links up to the first piece without a piece parent.
    pub fn find_root(&self, key: PieceKey) -> Result<PieceKey> {
        let mut current = key;
        while let Some(parent) = self.piece(current)?.parent_piece() {
            current = parent;
        }
        Ok(current)
    }

    /// Make `key` the transform root of its tree without moving anything.
    ///
    /// `key` takes the old root's place under its parent, the old root
    /// becomes a child of `key`, and the old root's other children move
    /// under `key` too.
    pub fn transform_to_root(&mut self, key: PieceKey) -> Result<()> {
        let root = self.find_root(key)?;
        if root == key {
            return Ok(());
        }
        let root_parent = self.piece(root)?.parent;

        self.reparent(key, root_parent)?;
        self.reparent(root, Some(Parent::Piece(key)))?;
        let others: Vec<PieceKey> = self
            .piece(root)?
            .children()
            .iter()
            .copied()
            .collect();
        for child in others {
            self.reparent(child, Some(Parent::Piece(key)))?;
        }
        tracing::debug!(piece = ?key, old_root = ?root, "promoted to transform root");
        Ok(())
    }

    /// Detach `key` from a piece parent and give it a fresh identity.
    ///
    /// The piece moves to its tree's non-piece ancestor (the grandparent in
    /// a flat assembly), keeping its world pose. Returns `false` when `key`
    /// has no piece parent, in which case nothing changes.
    pub fn un_root(&mut self, key: PieceKey) -> Result<bool> {
        if self.piece(key)?.parent_piece().is_none() {
            return Ok(false);
        }
        let root = self.find_root(key)?;
        let above = self.piece(root)?.parent;
        self.reparent(key, above)?;
        let id = self.allocate_id();
        self.set_assembly(key, id)?;
        tracing::debug!(piece = ?key, %id, "un-rooted");
        Ok(true)
    }

    /// Put `key` and its former piece children under `new_root`, adopting
    /// the new root's identity.
    ///
    /// Only `key` and its direct children are relabelled; the rest of the
    /// assembly is fixed up by [`update_parenting`](Self::update_parenting).
    pub fn set_as_child(&mut self, new_root: PieceKey, key: PieceKey) -> Result<()> {
        let id = self.ensure_identity(new_root)?;
        let former_children: Vec<PieceKey> = self.piece(key)?.children().to_vec();

        self.reparent(key, Some(Parent::Piece(new_root)))?;
        self.set_assembly(key, id)?;
        for child in former_children {
            self.reparent(child, Some(Parent::Piece(new_root)))?;
            self.set_assembly(child, id)?;
        }
        Ok(())
    }

    /// Re-derive the assembly around `key` from its attach edges.
    ///
    /// Un-roots `key`, then walks the attach graph breadth-first from its
    /// docked neighbours, moving every reachable piece directly under `key`
    /// and overwriting its identity with `key`'s.
    pub fn update_parenting(&mut self, key: PieceKey) -> Result<()> {
        self.reparent_component(key, false)
    }

    /// Give `key` and its transform descendants a fresh identity.
    pub fn update_to_new_id(&mut self, key: PieceKey) -> Result<AssemblyId> {
        self.piece(key)?;
        let id = self.allocate_id();
        let mut stack = vec![key];
        while let Some(next) = stack.pop() {
            self.set_assembly(next, id)?;
            stack.extend(self.piece(next)?.children().iter().copied());
        }
        Ok(id)
    }

    /// Identity of `key`'s assembly, allocating one on first use.
    ///
    /// The identity is read from the transform root; an unassigned root
    /// gets a fresh identity that is spread over its whole assembly.
    pub fn ensure_identity(&mut self, key: PieceKey) -> Result<AssemblyId> {
        let root = self.find_root(key)?;
        let current = self.piece(root)?.assembly();
        if current.is_assigned() {
            return Ok(current);
        }
        let id = self.allocate_id();
        for member in self.assembly_members(root)? {
            self.set_assembly(member, id)?;
        }
        let mut stack = vec![root];
        while let Some(next) = stack.pop() {
            self.set_assembly(next, id)?;
            stack.extend(self.piece(next)?.children().iter().copied());
        }
        tracing::debug!(piece = ?key, %id, "assigned assembly identity");
        Ok(id)
    }

    /// Every piece reachable from `key` over occupied attach points,
    /// `key` first, in breadth-first order.
    pub fn assembly_members(&self, key: PieceKey) -> Result<Vec<PieceKey>> {
        let mut visited = HashSet::from([key]);
        let mut queue = VecDeque::from([key]);
        let mut members = Vec::new();
        while let Some(next) = queue.pop_front() {
            members.push(next);
            for neighbor in self.neighbors(next)? {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        Ok(members)
    }

    /// Shared body of `update_parenting`; `fresh` forces a new identity on
    /// `key` even when it was already a root.
    pub(crate) fn reparent_component(&mut self, key: PieceKey, fresh: bool) -> Result<()> {
        let detached = self.un_root(key)?;
        if fresh && !detached {
            let id = self.allocate_id();
            self.set_assembly(key, id)?;
        }
        let id = match self.piece(key)?.assembly() {
            id if id.is_assigned() => id,
            _ => {
                let id = self.allocate_id();
                self.set_assembly(key, id)?;
                id
            }
        };

        let mut visited = HashSet::from([key]);
        let mut queue = VecDeque::new();
        for neighbor in self.neighbors(key)? {
            visited.insert(neighbor);
            queue.push_back(neighbor);
        }
        while let Some(next) = queue.pop_front() {
            self.reparent(next, Some(Parent::Piece(key)))?;
            self.set_assembly(next, id)?;
            for neighbor in self.neighbors(next)? {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        tracing::debug!(piece = ?key, %id, members = visited.len(), "updated parenting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attach::AttachPointRef;
    use crate::piece::Piece;
    use approx::assert_relative_eq;
    use tessera_math::pose;

    fn square(board: &mut Board, x: f64, y: f64) -> PieceKey {
        board.insert_piece(
            Piece::new(4)
                .unwrap()
                .with_attach_point(pose(0.0, 0.5, 0.0))
                .with_attach_point(pose(0.0, -0.5, 180.0))
                .at(pose(x, y, 0.0)),
        )
    }

    /// Dock `a`'s top socket to `b`'s bottom socket without the detector.
    fn link(board: &mut Board, a: PieceKey, b: PieceKey) {
        board
            .attach(AttachPointRef::new(a, 0), AttachPointRef::new(b, 1))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_find_root_walks_up() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        let c = square(&mut board, 0.0, 2.0);
        board.reparent(b, Some(Parent::Piece(a))).unwrap();
        board.reparent(c, Some(Parent::Piece(b))).unwrap();
        assert_eq!(board.find_root(c).unwrap(), a);
        assert_eq!(board.find_root(a).unwrap(), a);
    }

    #[test]
    fn test_find_root_stops_at_frame() {
        let mut board = Board::default();
        let tray = board.insert_frame("tray", pose(0.0, 0.0, 0.0));
        let a = square(&mut board, 0.0, 0.0);
        board.set_frame(a, Some(tray)).unwrap();
        assert_eq!(board.find_root(a).unwrap(), a);
    }

    #[test]
    fn test_transform_to_root_swaps_and_preserves_world() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        let c = square(&mut board, 0.0, 2.0);
        link(&mut board, a, b);
        link(&mut board, b, c);
        board.set_world_pose(a, pose(0.0, 0.0, 90.0)).unwrap();

        let before: Vec<_> = [a, b, c]
            .iter()
            .map(|k| board.world_pose(*k).unwrap())
            .collect();
        let id = board.piece(a).unwrap().assembly();

        board.transform_to_root(c).unwrap();
        assert_eq!(board.find_root(a).unwrap(), c);
        assert_eq!(board.find_root(b).unwrap(), c);
        assert!(board.piece(c).unwrap().parent().is_none());
        for (k, pose) in [a, b, c].iter().zip(&before) {
            assert_relative_eq!(board.world_pose(*k).unwrap(), *pose, epsilon = 1e-9);
            assert_eq!(board.piece(*k).unwrap().assembly(), id);
        }
        assert!(board.audit().is_empty());
    }

    #[test]
    fn test_transform_to_root_deep_tree() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 1.0, 0.0);
        let c = square(&mut board, 2.0, 0.0);
        board.reparent(b, Some(Parent::Piece(a))).unwrap();
        board.reparent(c, Some(Parent::Piece(b))).unwrap();

        board.transform_to_root(c).unwrap();
        assert!(board.piece(c).unwrap().parent().is_none());
        assert_eq!(board.piece(a).unwrap().parent_piece(), Some(c));
        assert_eq!(board.piece(b).unwrap().parent_piece(), Some(c));
        assert_relative_eq!(board.world_pose(b).unwrap(), pose(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_to_root_keeps_frame() {
        let mut board = Board::default();
        let tray = board.insert_frame("tray", pose(5.0, 0.0, 0.0));
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        link(&mut board, a, b);
        board.set_frame(a, Some(tray)).unwrap();
        let root = board.find_root(a).unwrap();
        let other = if root == a { b } else { a };

        board.transform_to_root(other).unwrap();
        assert_eq!(board.piece(other).unwrap().parent(), Some(Parent::Frame(tray)));
        assert_eq!(board.piece(root).unwrap().parent_piece(), Some(other));
    }

    #[test]
    fn test_un_root_assigns_fresh_identity() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        link(&mut board, a, b);
        let id = board.piece(a).unwrap().assembly();
        let child = if board.find_root(a).unwrap() == a { b } else { a };
        let world = board.world_pose(child).unwrap();

        assert!(board.un_root(child).unwrap());
        assert!(board.piece(child).unwrap().parent().is_none());
        assert_ne!(board.piece(child).unwrap().assembly(), id);
        assert_relative_eq!(board.world_pose(child).unwrap(), world, epsilon = 1e-12);

        // already a root
        let again = board.piece(child).unwrap().assembly();
        assert!(!board.un_root(child).unwrap());
        assert_eq!(board.piece(child).unwrap().assembly(), again);
    }

    #[test]
    fn test_set_as_child_moves_former_children() {
        let mut board = Board::default();
        let r = square(&mut board, 0.0, 0.0);
        let p = square(&mut board, 3.0, 0.0);
        let q = square(&mut board, 4.0, 0.0);
        board.reparent(q, Some(Parent::Piece(p))).unwrap();
        let id = board.ensure_identity(r).unwrap();

        board.set_as_child(r, p).unwrap();
        assert_eq!(board.piece(p).unwrap().parent_piece(), Some(r));
        assert_eq!(board.piece(q).unwrap().parent_piece(), Some(r));
        assert_eq!(board.piece(p).unwrap().assembly(), id);
        assert_eq!(board.piece(q).unwrap().assembly(), id);
        assert_relative_eq!(board.world_pose(q).unwrap(), pose(4.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_update_parenting_flattens_and_handles_cycles() {
        let mut board = Board::default();
        // four squares docked in a ring: top/bottom sockets plus a second
        // pair of side sockets closing the loop
        let pieces: Vec<PieceKey> = (0..4)
            .map(|i| {
                board.insert_piece(
                    Piece::new(4)
                        .unwrap()
                        .with_attach_point(pose(0.0, 0.5, 0.0))
                        .with_attach_point(pose(0.0, -0.5, 180.0))
                        .at(pose(0.0, i as f64, 0.0)),
                )
            })
            .collect();
        for pair in pieces.windows(2) {
            link(&mut board, pair[0], pair[1]);
        }
        // close the loop 3 -> 0 by hand
        board
            .attach_point_mut(AttachPointRef::new(pieces[3], 0))
            .unwrap()
            .set_occupant(Some(AttachPointRef::new(pieces[0], 1)));
        board
            .attach_point_mut(AttachPointRef::new(pieces[0], 1))
            .unwrap()
            .set_occupant(Some(AttachPointRef::new(pieces[3], 0)));

        board.transform_to_root(pieces[2]).unwrap();
        board.update_parenting(pieces[2]).unwrap();
        let id = board.piece(pieces[2]).unwrap().assembly();
        for &k in &pieces {
            assert_eq!(board.piece(k).unwrap().assembly(), id);
            if k != pieces[2] {
                assert_eq!(board.piece(k).unwrap().parent_piece(), Some(pieces[2]));
            }
        }
        assert!(board.audit().is_empty());
    }

    #[test]
    fn test_ensure_identity_is_lazy_and_stable() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        assert!(!board.piece(a).unwrap().assembly().is_assigned());
        let first = board.ensure_identity(a).unwrap();
        assert!(first.is_assigned());
        assert_eq!(board.ensure_identity(a).unwrap(), first);
    }

    #[test]
    fn test_update_to_new_id_covers_descendants() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        link(&mut board, a, b);
        let root = board.find_root(a).unwrap();
        let old = board.piece(root).unwrap().assembly();
        let new = board.update_to_new_id(root).unwrap();
        assert_ne!(old, new);
        assert_eq!(board.piece(a).unwrap().assembly(), new);
        assert_eq!(board.piece(b).unwrap().assembly(), new);
    }

    #[test]
    fn test_assembly_members_bfs() {
        let mut board = Board::default();
        let a = square(&mut board, 0.0, 0.0);
        let b = square(&mut board, 0.0, 1.0);
        let c = square(&mut board, 0.0, 2.0);
        let lone = square(&mut board, 9.0, 9.0);
        link(&mut board, a, b);
        link(&mut board, b, c);
        assert_eq!(board.assembly_members(a).unwrap(), vec![a, b, c]);
        assert_eq!(board.assembly_members(lone).unwrap(), vec![lone]);
    }
}
