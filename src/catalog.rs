use std::collections::HashMap;
use std::fmt;

use egui::Vec2;
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ComposerError, Result};

/// Opaque handle to a sprite the catalog can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AssetRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Which slot of the face an asset can go into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Eyes,
    Mouth,
    Background,
    Accessory,
}

/// A catalog entry. The pixel size is known up front so layers can be placed
/// and hit-tested before the pixels finish loading.
#[derive(Clone)]
struct AssetSlot {
    kind: AssetKind,
    size: [u32; 2],
    image: Option<RgbaImage>,
}

// Keep the pixel buffer out of debug output
impl fmt::Debug for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetSlot")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("resident", &self.image.is_some())
            .finish()
    }
}

/// The set of sprites a session may reference.
///
/// Loading is somebody else's job: the catalog only stores what it is handed,
/// either as decoded pixels, as encoded bytes, or as a placeholder with a known
/// size whose pixels arrive later via [`AssetCatalog::mark_loaded`].
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    slots: HashMap<AssetRef, AssetSlot>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resident sprite, replacing any previous entry with the same name.
    pub fn insert(&mut self, asset: impl Into<AssetRef>, kind: AssetKind, image: RgbaImage) {
        let asset = asset.into();
        debug!("Registering {:?} asset {} ({}x{})", kind, asset, image.width(), image.height());
        self.slots.insert(
            asset,
            AssetSlot {
                kind,
                size: [image.width(), image.height()],
                image: Some(image),
            },
        );
    }

    /// Decodes PNG/JPEG/... bytes and registers the result.
    pub fn insert_encoded(
        &mut self,
        asset: impl Into<AssetRef>,
        kind: AssetKind,
        bytes: &[u8],
    ) -> Result<()> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        self.insert(asset, kind, image);
        Ok(())
    }

    /// Registers an asset whose pixels are still loading.
    pub fn insert_pending(&mut self, asset: impl Into<AssetRef>, kind: AssetKind, size: [u32; 2]) {
        self.slots.insert(
            asset.into(),
            AssetSlot {
                kind,
                size,
                image: None,
            },
        );
    }

    /// Supplies the pixels for a previously pending asset.
    pub fn mark_loaded(&mut self, asset: &AssetRef, image: RgbaImage) -> Result<()> {
        let slot = self
            .slots
            .get_mut(asset)
            .ok_or_else(|| ComposerError::UnknownAsset(asset.clone()))?;
        info!("Asset {} is now resident", asset);
        slot.size = [image.width(), image.height()];
        slot.image = Some(image);
        Ok(())
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.slots.contains_key(asset)
    }

    pub fn kind(&self, asset: &AssetRef) -> Option<AssetKind> {
        self.slots.get(asset).map(|slot| slot.kind)
    }

    /// Intrinsic size in pixels, available even while the pixels are pending.
    pub fn size(&self, asset: &AssetRef) -> Option<Vec2> {
        self.slots
            .get(asset)
            .map(|slot| Vec2::new(slot.size[0] as f32, slot.size[1] as f32))
    }

    /// Pixels for an asset, or `None` if unknown or not yet loaded.
    pub fn image(&self, asset: &AssetRef) -> Option<&RgbaImage> {
        self.slots.get(asset).and_then(|slot| slot.image.as_ref())
    }

    pub fn is_resident(&self, asset: &AssetRef) -> bool {
        self.image(asset).is_some()
    }

    /// Checks that `asset` exists and is of the `expected` kind.
    pub fn require(&self, asset: &AssetRef, expected: AssetKind) -> Result<()> {
        match self.kind(asset) {
            None => Err(ComposerError::UnknownAsset(asset.clone())),
            Some(actual) if actual != expected => Err(ComposerError::WrongAssetKind {
                asset: asset.clone(),
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    /// All assets of one kind, sorted by name for stable UI listing.
    pub fn assets_of_kind(&self, kind: AssetKind) -> Vec<&AssetRef> {
        let mut assets: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.kind == kind)
            .map(|(asset, _)| asset)
            .collect();
        assets.sort();
        assets
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_pending_asset_has_size_but_no_pixels() {
        let mut catalog = AssetCatalog::new();
        let hat = AssetRef::new("accessories/hat");
        catalog.insert_pending(hat.clone(), AssetKind::Accessory, [40, 20]);

        assert!(catalog.contains(&hat));
        assert!(!catalog.is_resident(&hat));
        assert_eq!(catalog.size(&hat), Some(Vec2::new(40.0, 20.0)));

        catalog
            .mark_loaded(&hat, RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255])))
            .unwrap();
        assert!(catalog.is_resident(&hat));
    }

    #[test]
    fn test_require_checks_kind() {
        let mut catalog = AssetCatalog::new();
        catalog.insert("eyes/000", AssetKind::Eyes, RgbaImage::new(4, 4));

        assert!(catalog.require(&"eyes/000".into(), AssetKind::Eyes).is_ok());
        assert!(matches!(
            catalog.require(&"eyes/000".into(), AssetKind::Mouth),
            Err(ComposerError::WrongAssetKind { .. })
        ));
        assert!(matches!(
            catalog.require(&"eyes/999".into(), AssetKind::Eyes),
            Err(ComposerError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_insert_encoded_png() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let mut catalog = AssetCatalog::new();
        catalog
            .insert_encoded("backgrounds/stripes", AssetKind::Background, &bytes)
            .unwrap();
        assert_eq!(
            catalog.image(&"backgrounds/stripes".into()),
            Some(&source)
        );

        assert!(matches!(
            catalog.insert_encoded("broken", AssetKind::Background, b"not an image"),
            Err(ComposerError::Image(_))
        ));
        assert!(!catalog.contains(&"broken".into()));
    }

    #[test]
    fn test_assets_of_kind_sorted() {
        let mut catalog = AssetCatalog::new();
        catalog.insert_pending("accessories/b", AssetKind::Accessory, [1, 1]);
        catalog.insert_pending("accessories/a", AssetKind::Accessory, [1, 1]);
        catalog.insert_pending("mouths/000", AssetKind::Mouth, [1, 1]);

        let names: Vec<&str> = catalog
            .assets_of_kind(AssetKind::Accessory)
            .into_iter()
            .map(AssetRef::as_str)
            .collect();
        assert_eq!(names, ["accessories/a", "accessories/b"]);
    }
}
