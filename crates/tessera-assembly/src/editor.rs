//! Authoring actions an editor applies to selected pieces.

use serde::{Deserialize, Serialize};

use crate::attach::AttachPointRef;
use crate::board::{Board, PieceKey};
use crate::error::{AssemblyError, Result};

/// One operator action on a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorAction {
    /// Make the piece its assembly's transform root.
    PromoteToRoot,
    /// Lift the piece out of its parent's tree with a fresh identity.
    UnRoot,
    /// Give the piece and its transform descendants a fresh identity.
    ForceNewIdentity,
    /// Toggle one attach point. Disabling an occupied point detaches it.
    SetAttachPointEnabled {
        /// Attach point index on the piece.
        index: usize,
        /// New state.
        enabled: bool,
    },
}

impl Board {
    /// Apply `action` to `key`.
    pub fn apply_editor_action(&mut self, key: PieceKey, action: EditorAction) -> Result<()> {
        self.check_editor_action(key, action)?;
        match action {
            EditorAction::PromoteToRoot => self.transform_to_root(key),
            EditorAction::UnRoot => self.un_root(key).map(|_| ()),
            EditorAction::ForceNewIdentity => self.update_to_new_id(key).map(|_| ()),
            EditorAction::SetAttachPointEnabled { index, enabled } => {
                self.set_attach_point_enabled(AttachPointRef::new(key, index), enabled)
            }
        }
    }

    /// Apply `action` to every piece in `selection`, in order.
    ///
    /// The whole selection is checked first; if any key or index is bad
    /// nothing is applied.
    pub fn apply_to_selection(&mut self, selection: &[PieceKey], action: EditorAction) -> Result<()> {
        for &key in selection {
            self.check_editor_action(key, action)?;
        }
        for &key in selection {
            self.apply_editor_action(key, action)?;
        }
        tracing::debug!(?action, pieces = selection.len(), "applied editor action");
        Ok(())
    }

    fn check_editor_action(&self, key: PieceKey, action: EditorAction) -> Result<()> {
        let piece = self.piece(key)?;
        if let EditorAction::SetAttachPointEnabled { index, .. } = action {
            if piece.attach_point(index).is_none() {
                return Err(AssemblyError::UnknownAttachPoint { piece: key, index });
            }
        }
        Ok(())
    }
}
