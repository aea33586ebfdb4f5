use thiserror::Error;

use crate::catalog::{AssetKind, AssetRef};

/// Errors surfaced at the boundaries of the composer.
///
/// Operations on the layer model itself never fail: unknown layer ids and
/// out-of-range scales degrade to no-ops or clamps. Besides exhausted layer
/// counters, only things coming in from outside (asset references, colors,
/// config, snapshots, encoding) can error.
#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Unknown asset: {0}")]
    UnknownAsset(AssetRef),

    #[error("Asset {asset} is a {actual:?} asset, expected {expected:?}")]
    WrongAssetKind {
        asset: AssetRef,
        expected: AssetKind,
        actual: AssetKind,
    },

    #[error("Invalid color {input:?}: {reason}")]
    InvalidColor { input: String, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No more layer ids available")]
    LayersExhausted,

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Pixel ratio must be positive and finite, got {0}")]
    InvalidPixelRatio(f32),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ComposerError>;
