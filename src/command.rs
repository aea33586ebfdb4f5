use crate::layer::{LayerId, TransformDelta};
use crate::store::LayerStore;

/// Edits the interaction controller asks the session to apply to the store.
///
/// Tools never mutate the store themselves; they look at it and hand back a
/// command, which keeps gesture logic testable against a read-only store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Change the selection; `raise` also brings the layer to the top.
    Select {
        layer_id: Option<LayerId>,
        raise: bool,
    },
    /// Merge a partial transform into a layer
    UpdateTransform {
        layer_id: LayerId,
        delta: TransformDelta,
    },
    RemoveLayer { layer_id: LayerId },
}

impl Command {
    /// Applies the command. Returns `true` if the store changed.
    ///
    /// Commands that target a layer which no longer exists do nothing.
    pub fn execute(&self, store: &mut LayerStore) -> bool {
        match self {
            Command::Select { layer_id, raise } => {
                let before = store.selected();
                store.select(*layer_id);
                let raised = match (raise, store.selected()) {
                    (true, Some(id)) => {
                        let top = store.list().last().map(|layer| layer.id());
                        top != Some(id) && store.reorder_to_top(id)
                    }
                    _ => false,
                };
                raised || before != store.selected()
            }
            Command::UpdateTransform { layer_id, delta } => store.update(*layer_id, *delta),
            Command::RemoveLayer { layer_id } => store.remove(*layer_id),
        }
    }
}
