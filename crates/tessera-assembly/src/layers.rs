//! Named collision layers and the filters built from them.

use crate::error::{AssemblyError, Result};

/// Layer holding piece bodies, used by pointer picking.
pub const PIECE_LAYER: &str = "Piece";

/// Layer holding attach point colliders, used by the detector.
pub const ATTACH_POINT_LAYER: &str = "AttachPoint";

/// Maximum number of layers a filter mask can address.
pub const MAX_LAYERS: usize = 32;

/// Index of a collision layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layer(pub u8);

/// Bit mask selecting a set of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerFilter {
    /// One bit per layer index.
    pub mask: u32,
}

impl LayerFilter {
    /// A filter selecting only `layer`.
    pub fn only(layer: Layer) -> Self {
        Self {
            mask: bit(layer),
        }
    }

    /// A filter selecting every layer.
    pub fn all() -> Self {
        Self { mask: u32::MAX }
    }

    /// Add a layer to the filter.
    pub fn with(self, layer: Layer) -> Self {
        Self {
            mask: self.mask | bit(layer),
        }
    }

    /// Whether `layer` passes the filter.
    pub fn contains(&self, layer: Layer) -> bool {
        self.mask & bit(layer) != 0
    }
}

/// Mask bit for `layer`; zero past the last addressable layer.
fn bit(layer: Layer) -> u32 {
    1u32.checked_shl(u32::from(layer.0)).unwrap_or(0)
}

/// Table of named layers owned by a board.
///
/// Resolves the piece and attach point layers once at construction and
/// keeps the matching filters.
#[derive(Debug, Clone)]
pub struct CollisionLayers {
    names: Vec<String>,
    piece: Layer,
    attach_point: Layer,
}

impl CollisionLayers {
    /// Build a layer table. Must name both [`PIECE_LAYER`] and
    /// [`ATTACH_POINT_LAYER`] and hold at most [`MAX_LAYERS`] entries.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.len() > MAX_LAYERS {
            return Err(AssemblyError::InvalidLayers(format!(
                "{} layers, at most {} supported",
                names.len(),
                MAX_LAYERS
            )));
        }
        let find = |wanted: &str| {
            names
                .iter()
                .position(|n| n == wanted)
                .map(|i| Layer(i as u8))
                .ok_or_else(|| AssemblyError::InvalidLayers(format!("missing layer {wanted:?}")))
        };
        let piece = find(PIECE_LAYER)?;
        let attach_point = find(ATTACH_POINT_LAYER)?;
        Ok(Self {
            names,
            piece,
            attach_point,
        })
    }

    /// Layer index by name.
    pub fn layer(&self, name: &str) -> Option<Layer> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| Layer(i as u8))
    }

    /// Layer name by index.
    pub fn name(&self, layer: Layer) -> Option<&str> {
        self.names.get(layer.0 as usize).map(String::as_str)
    }

    /// The piece body layer.
    pub fn piece_layer(&self) -> Layer {
        self.piece
    }

    /// The attach point layer.
    pub fn attach_point_layer(&self) -> Layer {
        self.attach_point
    }

    /// Filter restricted to attach point colliders.
    pub fn attach_point_filter(&self) -> LayerFilter {
        LayerFilter::only(self.attach_point)
    }

    /// Filter restricted to piece bodies.
    pub fn piece_filter(&self) -> LayerFilter {
        LayerFilter::only(self.piece)
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self {
            names: vec![
                "Default".to_string(),
                PIECE_LAYER.to_string(),
                ATTACH_POINT_LAYER.to_string(),
            ],
            piece: Layer(1),
            attach_point: Layer(2),
        }
    }
}
