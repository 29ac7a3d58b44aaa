mod priority;

use std::ops::BitOr;

pub use priority::{compute_priority, PriorityZ, SortTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Custom-house placement flags carried by multi components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MultiState(pub u32);

impl MultiState {
    pub const NONE: Self = Self(0);
    pub const GENERIC_INTERNAL: Self = Self(0x0001);
    pub const INTERNAL: Self = Self(0x0002);
    pub const TRANSPARENT: Self = Self(0x0004);
    pub const IGNORE_IN_RENDER: Self = Self(0x0008);
    pub const VALIDATED_PLACE: Self = Self(0x0010);
    pub const INCORRECT_PLACE: Self = Self(0x0020);
    pub const FLOOR: Self = Self(0x0040);
    pub const STAIR: Self = Self(0x0080);
    pub const ROOF: Self = Self(0x0100);
    pub const FIXTURE: Self = Self(0x0200);
    pub const PREVIEW: Self = Self(0x0400);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for MultiState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Land {
        is_stretched: bool,
        average_z: i8,
        min_z: i8,
    },
    Static {
        /// Transient animation playing on the fixture; dropped when the
        /// owning chunk is checked for eviction.
        animated_effect: Option<ObjectId>,
    },
    Item {
        is_corpse: bool,
        multi_graphic: Option<u16>,
    },
    Mobile,
    Multi {
        state: MultiState,
    },
    Effect,
}

/// Location of an object inside a chunk: block number plus cell offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCell {
    pub block: usize,
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TileLinks {
    pub(crate) prev: Option<ObjectId>,
    pub(crate) next: Option<ObjectId>,
    pub(crate) cell: Option<TileCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameObject {
    pub x: u16,
    pub y: u16,
    pub z: i8,
    pub graphic: u16,
    pub hue: u16,
    pub kind: ObjectKind,
    priority_z: PriorityZ,
    pub(crate) links: TileLinks,
}

impl GameObject {
    pub fn new(kind: ObjectKind, graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self {
            x,
            y,
            z,
            graphic,
            hue: 0,
            kind,
            priority_z: PriorityZ::from(z),
            links: TileLinks::default(),
        }
    }

    pub fn land(graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(
            ObjectKind::Land {
                is_stretched: false,
                average_z: z,
                min_z: z,
            },
            graphic,
            x,
            y,
            z,
        )
    }

    pub fn static_fixture(graphic: u16, hue: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(
            ObjectKind::Static {
                animated_effect: None,
            },
            graphic,
            x,
            y,
            z,
        )
        .with_hue(hue)
    }

    pub fn item(graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(
            ObjectKind::Item {
                is_corpse: false,
                multi_graphic: None,
            },
            graphic,
            x,
            y,
            z,
        )
    }

    pub fn corpse(graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(
            ObjectKind::Item {
                is_corpse: true,
                multi_graphic: None,
            },
            graphic,
            x,
            y,
            z,
        )
    }

    pub fn mobile(graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(ObjectKind::Mobile, graphic, x, y, z)
    }

    pub fn multi(graphic: u16, state: MultiState, x: u16, y: u16, z: i8) -> Self {
        Self::new(ObjectKind::Multi { state }, graphic, x, y, z)
    }

    pub fn effect(graphic: u16, x: u16, y: u16, z: i8) -> Self {
        Self::new(ObjectKind::Effect, graphic, x, y, z)
    }

    pub fn with_hue(mut self, hue: u16) -> Self {
        self.hue = hue;
        self
    }

    pub fn priority_z(&self) -> PriorityZ {
        self.priority_z
    }

    pub(crate) fn set_priority_z(&mut self, priority_z: PriorityZ) {
        self.priority_z = priority_z;
    }

    pub fn tile_prev(&self) -> Option<ObjectId> {
        self.links.prev
    }

    pub fn tile_next(&self) -> Option<ObjectId> {
        self.links.next
    }

    pub fn cell(&self) -> Option<TileCell> {
        self.links.cell
    }

    pub fn is_land(&self) -> bool {
        matches!(self.kind, ObjectKind::Land { .. })
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, ObjectKind::Static { .. })
    }
}

/// Result of unlinking an object from its tile list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Detached {
    pub(crate) cell: TileCell,
    pub(crate) next: Option<ObjectId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<GameObject>,
}

/// Generational slab owning every live object of a facet.
#[derive(Debug, Default)]
pub struct ObjectArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: GameObject) -> ObjectId {
        self.live = self.live.saturating_add(1);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    /// Frees the slot. Callers unlink the object from its tile first.
    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    /// Unlinks `id` from its neighbours and clears its link fields. The
    /// owning chunk is responsible for moving its cell head to `next`.
    pub(crate) fn detach(&mut self, id: ObjectId) -> Option<Detached> {
        let links = self.get(id)?.links;
        let cell = links.cell?;

        if let Some(prev) = links.prev.and_then(|prev| self.get_mut(prev)) {
            prev.links.next = links.next;
        }
        if let Some(next) = links.next.and_then(|next| self.get_mut(next)) {
            next.links.prev = links.prev;
        }
        if let Some(object) = self.get_mut(id) {
            object.links = TileLinks::default();
        }

        Some(Detached {
            cell,
            next: links.next,
        })
    }
}
