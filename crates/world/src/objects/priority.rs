use crate::tiledata::TileCatalog;

use super::{GameObject, MultiState, ObjectKind};

/// Draw-order key within a tile cell. Distinct from the object's world Z.
pub type PriorityZ = i16;

/// Tie-break applied when an inserted object meets peers of equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTag {
    Unordered,
    /// Inserted before every equal-priority peer.
    Land,
    /// Inserted before equal-priority peers that are not land.
    Multi,
    MultiPreview,
}

impl SortTag {
    /// Whether an object carrying this tag must be placed before `node`.
    pub(crate) fn stops_at(self, priority_z: PriorityZ, node: &GameObject) -> bool {
        let node_priority = node.priority_z();
        node_priority > priority_z
            || node_priority == priority_z
                && (self == SortTag::Land || self == SortTag::Multi && !node.is_land())
    }
}

pub fn compute_priority(object: &GameObject, catalog: &dyn TileCatalog) -> (PriorityZ, SortTag) {
    let z = PriorityZ::from(object.z);
    match &object.kind {
        ObjectKind::Land {
            is_stretched,
            average_z,
            ..
        } => {
            let base = if *is_stretched {
                PriorityZ::from(*average_z) - 1
            } else {
                z - 1
            };
            (base - 1, SortTag::Land)
        }
        ObjectKind::Mobile => (z + 1, SortTag::Unordered),
        ObjectKind::Item {
            is_corpse: true, ..
        } => (z + 1, SortTag::Unordered),
        ObjectKind::Item { multi_graphic, .. } => {
            let graphic = multi_graphic.unwrap_or(object.graphic);
            (z + static_adjustment(catalog, graphic), SortTag::Unordered)
        }
        ObjectKind::Effect => (z + 2, SortTag::Unordered),
        ObjectKind::Multi { state } => {
            if state.intersects(MultiState::GENERIC_INTERNAL) {
                (z - 1, SortTag::Multi)
            } else if state.intersects(MultiState::PREVIEW) {
                (
                    z + 1 + static_adjustment(catalog, object.graphic),
                    SortTag::MultiPreview,
                )
            } else {
                (
                    z + static_adjustment(catalog, object.graphic),
                    SortTag::Multi,
                )
            }
        }
        ObjectKind::Static { .. } => (
            z + static_adjustment(catalog, object.graphic),
            SortTag::Unordered,
        ),
    }
}

fn static_adjustment(catalog: &dyn TileCatalog, graphic: u16) -> PriorityZ {
    let Some(data) = catalog.static_tile(graphic) else {
        return 0;
    };
    let mut adjustment = 0;
    if data.is_background {
        adjustment -= 1;
    }
    if data.height != 0 {
        adjustment += 1;
    }
    if data.is_multi_movable {
        adjustment += 1;
    }
    adjustment
}
