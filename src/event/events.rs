use serde::{Deserialize, Serialize};

use crate::catalog::AssetRef;

/// Intents the accessory controls send to the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccessoryCommand {
    /// Place a new instance of an accessory sprite on top of the stack
    Add { asset: AssetRef },
    /// Remove the currently selected layer, if any
    DeleteSelected,
}

impl AccessoryCommand {
    pub fn add(asset: impl Into<AssetRef>) -> Self {
        Self::Add {
            asset: asset.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::DeleteSelected => "deleteSelected",
        }
    }
}
