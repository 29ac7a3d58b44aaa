use crate::objects::{compute_priority, GameObject, ObjectArena, ObjectId, ObjectKind, TileCell};
use crate::terrain::{TerrainSource, BLOCK_SIZE, CELLS_PER_BLOCK};
use crate::tiledata::TileCatalog;

use super::stretch::land_shape;
use super::used_blocks::{QueueHandle, UsedBlocks};

/// An 8x8 block of tile cells. Each cell anchors an ordered list of objects,
/// ascending by priority; the tail is drawn last and is front-most.
#[derive(Debug)]
pub struct Chunk {
    x: u32,
    y: u32,
    block: usize,
    cells: [Option<ObjectId>; CELLS_PER_BLOCK],
    last_access_time: u64,
    is_destroyed: bool,
    node: Option<QueueHandle>,
}

impl Chunk {
    pub(crate) fn create(x: u32, y: u32, block: usize, now: u64, load_grace_ms: u64) -> Self {
        Self {
            x,
            y,
            block,
            cells: [None; CELLS_PER_BLOCK],
            last_access_time: now.saturating_add(load_grace_ms),
            is_destroyed: false,
            node: None,
        }
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn block(&self) -> usize {
        self.block
    }

    pub fn last_access_time(&self) -> u64 {
        self.last_access_time
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    pub(crate) fn touch(&mut self, now: u64) {
        self.last_access_time = self.last_access_time.max(now);
    }

    pub(crate) fn node(&self) -> Option<QueueHandle> {
        self.node
    }

    pub(crate) fn take_node(&mut self) -> Option<QueueHandle> {
        self.node.take()
    }

    pub(crate) fn set_node(&mut self, node: QueueHandle) {
        self.node = Some(node);
    }

    /// Builds land and statics objects for this block. A block the terrain
    /// source has no data for loads empty. Returns the number of objects
    /// created.
    pub(crate) fn load(
        &mut self,
        terrain: &dyn TerrainSource,
        catalog: &dyn TileCatalog,
        objects: &mut ObjectArena,
        map_index: usize,
    ) -> usize {
        self.is_destroyed = false;

        let index = terrain.resolve(map_index, self.x, self.y);
        let Some(cells) = index
            .land
            .and_then(|address| terrain.read_land_cells(address))
        else {
            return 0;
        };

        let origin_x = self.x as usize * BLOCK_SIZE;
        let origin_y = self.y as usize * BLOCK_SIZE;
        let mut created = 0;

        for cell_y in 0..BLOCK_SIZE {
            for cell_x in 0..BLOCK_SIZE {
                let cell = cells[(cell_y << 3) + cell_x];
                let graphic = cell.graphic();
                let tile_x = origin_x + cell_x;
                let tile_y = origin_y + cell_y;

                let shape = land_shape(
                    terrain,
                    catalog,
                    map_index,
                    graphic,
                    tile_x as i32,
                    tile_y as i32,
                    cell.z,
                );
                let mut land = GameObject::land(graphic, tile_x as u16, tile_y as u16, cell.z);
                land.kind = ObjectKind::Land {
                    is_stretched: shape.is_stretched,
                    average_z: shape.average_z,
                    min_z: shape.min_z,
                };

                let id = objects.insert(land);
                self.add_game_object(objects, catalog, id, cell_x, cell_y);
                created += 1;
            }
        }

        if let Some(address) = index.statics {
            for record in terrain.read_statics(address, index.statics_count) {
                if record.is_placeholder() || record.cell_index() >= CELLS_PER_BLOCK {
                    continue;
                }
                let cell_x = record.x as usize;
                let cell_y = record.y as usize;
                let fixture = GameObject::static_fixture(
                    record.color,
                    record.hue,
                    (origin_x + cell_x) as u16,
                    (origin_y + cell_y) as u16,
                    record.z,
                );
                let id = objects.insert(fixture);
                self.add_game_object(objects, catalog, id, cell_x, cell_y);
                created += 1;
            }
        }

        created
    }

    /// Walks back from the cell anchor to the first object of the list.
    pub fn head_object(&self, objects: &ObjectArena, x: usize, y: usize) -> Option<ObjectId> {
        let mut current = self.cells[cell_index(x, y)]?;
        while let Some(prev) = objects.get(current).and_then(GameObject::tile_prev) {
            current = prev;
        }
        Some(current)
    }

    /// Inserts `id` into cell (x, y), keeping the list ascending by priority.
    /// Land goes before every equal-priority peer and non-preview multis
    /// before equal-priority non-land peers; everything else after its
    /// equal-priority peers.
    pub(crate) fn add_game_object(
        &mut self,
        objects: &mut ObjectArena,
        catalog: &dyn TileCatalog,
        id: ObjectId,
        x: usize,
        y: usize,
    ) -> bool {
        self.unlink(objects, id);

        let Some(object) = objects.get_mut(id) else {
            return false;
        };
        let (priority_z, tag) = compute_priority(object, catalog);
        object.set_priority_z(priority_z);

        let index = cell_index(x, y);
        let cell = TileCell {
            block: self.block,
            x: x as u8,
            y: y as u8,
        };

        let Some(head) = self.head_object(objects, x, y) else {
            if let Some(object) = objects.get_mut(id) {
                object.links.prev = None;
                object.links.next = None;
                object.links.cell = Some(cell);
            }
            self.cells[index] = Some(id);
            return true;
        };

        let mut found = None;
        let mut cursor = Some(head);
        while let Some(node_id) = cursor {
            let Some(node) = objects.get(node_id) else {
                break;
            };
            if tag.stops_at(priority_z, node) {
                break;
            }
            found = Some(node_id);
            cursor = node.tile_next();
        }

        match found {
            Some(prev_id) => {
                let next = objects.get(prev_id).and_then(GameObject::tile_next);
                if let Some(object) = objects.get_mut(id) {
                    object.links.prev = Some(prev_id);
                    object.links.next = next;
                    object.links.cell = Some(cell);
                }
                if let Some(prev) = objects.get_mut(prev_id) {
                    prev.links.next = Some(id);
                }
                if let Some(next) = next.and_then(|next| objects.get_mut(next)) {
                    next.links.prev = Some(id);
                }
            }
            None => {
                if let Some(object) = objects.get_mut(id) {
                    object.links.prev = None;
                    object.links.next = Some(head);
                    object.links.cell = Some(cell);
                }
                if let Some(head) = objects.get_mut(head) {
                    head.links.prev = Some(id);
                }
                self.cells[index] = Some(id);
            }
        }

        true
    }

    /// Unlinks `id` from cell (x, y). Returns false when it is not a member.
    pub(crate) fn remove_game_object(
        &mut self,
        objects: &mut ObjectArena,
        id: ObjectId,
        x: usize,
        y: usize,
    ) -> bool {
        let expected = TileCell {
            block: self.block,
            x: x as u8,
            y: y as u8,
        };
        if objects.get(id).and_then(GameObject::cell) != Some(expected) {
            return false;
        }
        self.unlink(objects, id);
        true
    }

    fn unlink(&mut self, objects: &mut ObjectArena, id: ObjectId) {
        let Some(detached) = objects.detach(id) else {
            return;
        };
        if detached.cell.block != self.block {
            return;
        }
        let index = cell_index(detached.cell.x as usize, detached.cell.y as usize);
        if self.cells[index] == Some(id) {
            self.cells[index] = detached.next;
        }
    }

    /// Releases every cell and marks the chunk destroyed. Members are freed
    /// from the arena except `player`, which is only unlinked.
    pub(crate) fn destroy(
        &mut self,
        objects: &mut ObjectArena,
        used_blocks: &mut UsedBlocks,
        player: Option<ObjectId>,
    ) {
        for index in 0..CELLS_PER_BLOCK {
            let Some(head) = self.head_object(objects, index % BLOCK_SIZE, index / BLOCK_SIZE)
            else {
                continue;
            };

            let mut cursor = Some(head);
            while let Some(id) = cursor {
                cursor = objects.get(id).and_then(GameObject::tile_next);
                if Some(id) == player {
                    if let Some(object) = objects.get_mut(id) {
                        object.links = Default::default();
                    }
                } else {
                    objects.remove(id);
                }
            }
            self.cells[index] = None;
        }

        if let Some(node) = self.node.take() {
            used_blocks.remove(node);
        }
        self.is_destroyed = true;
    }

    /// Same release as [`Chunk::destroy`]; used when the block is rebuilt in
    /// place rather than evicted.
    pub(crate) fn clear(
        &mut self,
        objects: &mut ObjectArena,
        used_blocks: &mut UsedBlocks,
        player: Option<ObjectId>,
    ) {
        self.destroy(objects, used_blocks, player);
    }

    /// True when every member of every cell is land or a static fixture.
    /// Static fixtures scanned on the way drop their transient animation.
    pub(crate) fn has_no_external_data(&self, objects: &mut ObjectArena) -> bool {
        for x in 0..BLOCK_SIZE {
            for y in 0..BLOCK_SIZE {
                let mut cursor = self.head_object(objects, x, y);
                while let Some(id) = cursor {
                    let Some(object) = objects.get_mut(id) else {
                        break;
                    };
                    match &mut object.kind {
                        ObjectKind::Land { .. } => {}
                        ObjectKind::Static { animated_effect } => *animated_effect = None,
                        _ => return false,
                    }
                    cursor = object.tile_next();
                }
            }
        }
        true
    }

    pub fn objects_at<'a>(&self, objects: &'a ObjectArena, x: usize, y: usize) -> TileObjects<'a> {
        TileObjects {
            objects,
            cursor: self.head_object(objects, x, y),
        }
    }

    pub fn object_count(&self, objects: &ObjectArena) -> usize {
        (0..CELLS_PER_BLOCK)
            .map(|index| {
                self.objects_at(objects, index % BLOCK_SIZE, index / BLOCK_SIZE)
                    .count()
            })
            .sum()
    }
}

/// Iterates one cell from head (back-most) to tail (front-most).
pub struct TileObjects<'a> {
    objects: &'a ObjectArena,
    cursor: Option<ObjectId>,
}

impl<'a> Iterator for TileObjects<'a> {
    type Item = (ObjectId, &'a GameObject);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let object = self.objects.get(id)?;
        self.cursor = object.tile_next();
        Some((id, object))
    }
}

pub(crate) fn cell_index(x: usize, y: usize) -> usize {
    (y << 3) + x
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::objects::{MultiState, SortTag};
    use crate::terrain::{MemoryTerrain, StaticRecord};
    use crate::tiledata::{LandTileData, StaticTileData, TileDataCatalog};

    fn catalog() -> TileDataCatalog {
        let mut catalog = TileDataCatalog::new();
        catalog.insert_land(
            3,
            LandTileData {
                name: "grass".to_string(),
                texture_id: 3,
            },
        );
        catalog.insert_static(
            0x0010,
            StaticTileData {
                name: "pebbles".to_string(),
                ..StaticTileData::default()
            },
        );
        catalog.insert_static(
            0x0011,
            StaticTileData {
                name: "wall".to_string(),
                height: 20,
                ..StaticTileData::default()
            },
        );
        catalog
    }

    fn flat_terrain(z: i8) -> MemoryTerrain {
        let mut terrain = MemoryTerrain::new();
        let facet = terrain.add_facet(1, 1);
        terrain.fill_land(facet, 3, z);
        terrain
    }

    fn loaded_chunk(
        terrain: &MemoryTerrain,
        catalog: &TileDataCatalog,
        objects: &mut ObjectArena,
    ) -> Chunk {
        let mut chunk = Chunk::create(0, 0, 0, 0, 3_000);
        chunk.load(terrain, catalog, objects, 0);
        chunk
    }

    #[test]
    fn creation_applies_load_grace() {
        let chunk = Chunk::create(2, 3, 11, 500, 3_000);
        assert_eq!(chunk.last_access_time(), 3_500);
        assert_eq!((chunk.x(), chunk.y(), chunk.block()), (2, 3, 11));
        assert!(!chunk.is_destroyed());
    }

    #[test]
    fn load_places_land_before_statics() {
        let mut terrain = flat_terrain(0);
        terrain.add_static(0, 2, 2, 0x0010, 5, 2);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let chunk = loaded_chunk(&terrain, &catalog, &mut objects);

        let cell = chunk.objects_at(&objects, 2, 2).collect::<Vec<_>>();
        assert_eq!(cell.len(), 2);
        assert!(cell[0].1.is_land());
        assert_eq!(cell[0].1.priority_z(), -2);
        assert!(cell[1].1.is_static());
        assert_eq!(cell[1].1.priority_z(), 2);
        assert_eq!(cell[1].1.hue, 5);
        assert_eq!(chunk.object_count(&objects), 65);
    }

    #[test]
    fn load_skips_placeholder_and_out_of_block_statics() {
        let mut terrain = flat_terrain(0);
        terrain.push_static_record(
            0,
            0,
            0,
            StaticRecord {
                color: 0xFFFF,
                hue: 0,
                x: 1,
                y: 1,
                z: 0,
            },
        );
        terrain.push_static_record(
            0,
            0,
            0,
            StaticRecord {
                color: 0x0010,
                hue: 0,
                x: 9,
                y: 9,
                z: 0,
            },
        );
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let chunk = loaded_chunk(&terrain, &catalog, &mut objects);
        assert_eq!(chunk.object_count(&objects), 64);
    }

    #[test]
    fn load_of_hole_yields_empty_chunk() {
        let mut terrain = MemoryTerrain::new();
        terrain.add_facet(1, 1);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let chunk = loaded_chunk(&terrain, &catalog, &mut objects);
        assert_eq!(chunk.object_count(&objects), 0);
        assert!(chunk.head_object(&objects, 0, 0).is_none());
    }

    #[test]
    fn mobile_lands_after_lower_land() {
        let terrain = flat_terrain(9);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = loaded_chunk(&terrain, &catalog, &mut objects);

        let mobile = objects.insert(GameObject::mobile(0x190, 4, 4, 10));
        assert!(chunk.add_game_object(&mut objects, &catalog, mobile, 4, 4));

        let cell = chunk.objects_at(&objects, 4, 4).collect::<Vec<_>>();
        assert_eq!(cell.len(), 2);
        assert!(cell[0].1.is_land());
        assert_eq!(cell[0].1.priority_z(), 7);
        assert_eq!(cell[1].0, mobile);
        assert_eq!(cell[1].1.priority_z(), 11);
    }

    #[test]
    fn land_stays_below_every_peer_at_equal_z() {
        let terrain = flat_terrain(5);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = loaded_chunk(&terrain, &catalog, &mut objects);

        let background = objects.insert(GameObject::multi(
            0x0010,
            MultiState::GENERIC_INTERNAL,
            1,
            1,
            5,
        ));
        let item = objects.insert(GameObject::item(0x0010, 1, 1, 5));
        chunk.add_game_object(&mut objects, &catalog, background, 1, 1);
        chunk.add_game_object(&mut objects, &catalog, item, 1, 1);

        let cell = chunk.objects_at(&objects, 1, 1).collect::<Vec<_>>();
        let land = cell[0].1;
        assert!(land.is_land());
        for (_, peer) in &cell[1..] {
            assert!(land.priority_z() < peer.priority_z());
        }
    }

    #[test]
    fn land_inserted_before_equal_priority_peers() {
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = Chunk::create(0, 0, 0, 0, 0);

        let item = objects.insert(GameObject::item(0x0010, 0, 0, 4));
        let land = objects.insert(GameObject::land(3, 0, 0, 6));
        chunk.add_game_object(&mut objects, &catalog, item, 0, 0);
        chunk.add_game_object(&mut objects, &catalog, land, 0, 0);

        let order = chunk
            .objects_at(&objects, 0, 0)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![land, item]);
    }

    #[test]
    fn plain_multi_goes_before_equal_items_but_after_equal_land() {
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = Chunk::create(0, 0, 0, 0, 0);

        let land = objects.insert(GameObject::land(3, 0, 0, 6));
        let item = objects.insert(GameObject::item(0x0010, 0, 0, 4));
        let multi = objects.insert(GameObject::multi(0x0010, MultiState::FLOOR, 0, 0, 4));
        let preview = objects.insert(GameObject::multi(0x0010, MultiState::PREVIEW, 0, 0, 3));
        for id in [land, item, multi, preview] {
            chunk.add_game_object(&mut objects, &catalog, id, 0, 0);
        }

        let order = chunk
            .objects_at(&objects, 0, 0)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![land, multi, item, preview]);
    }

    #[test]
    fn unordered_peers_keep_insertion_order() {
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = Chunk::create(0, 0, 0, 0, 0);

        let first = objects.insert(GameObject::item(0x0010, 0, 0, 4));
        let second = objects.insert(GameObject::item(0x0010, 0, 0, 4));
        chunk.add_game_object(&mut objects, &catalog, first, 0, 0);
        chunk.add_game_object(&mut objects, &catalog, second, 0, 0);

        let order = chunk
            .objects_at(&objects, 0, 0)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn re_adding_an_object_moves_it_instead_of_duplicating() {
        let terrain = flat_terrain(0);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = loaded_chunk(&terrain, &catalog, &mut objects);

        let mobile = objects.insert(GameObject::mobile(0x190, 3, 3, 0));
        chunk.add_game_object(&mut objects, &catalog, mobile, 3, 3);
        chunk.add_game_object(&mut objects, &catalog, mobile, 3, 3);
        assert_eq!(chunk.objects_at(&objects, 3, 3).count(), 2);

        if let Some(object) = objects.get_mut(mobile) {
            object.x = 4;
        }
        chunk.add_game_object(&mut objects, &catalog, mobile, 4, 3);
        assert_eq!(chunk.objects_at(&objects, 3, 3).count(), 1);
        assert_eq!(chunk.objects_at(&objects, 4, 3).count(), 2);
    }

    #[test]
    fn removing_the_head_moves_the_anchor() {
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = Chunk::create(0, 0, 0, 0, 0);

        let low = objects.insert(GameObject::item(0x0010, 0, 0, 1));
        let high = objects.insert(GameObject::item(0x0010, 0, 0, 9));
        chunk.add_game_object(&mut objects, &catalog, high, 5, 5);
        chunk.add_game_object(&mut objects, &catalog, low, 5, 5);
        assert_eq!(chunk.head_object(&objects, 5, 5), Some(low));

        assert!(chunk.remove_game_object(&mut objects, low, 5, 5));
        assert_eq!(chunk.head_object(&objects, 5, 5), Some(high));
        let removed = objects.get(low).expect("still allocated");
        assert!(removed.cell().is_none());
        assert!(removed.tile_next().is_none());

        assert!(!chunk.remove_game_object(&mut objects, low, 5, 5));
        assert!(!chunk.remove_game_object(&mut objects, high, 4, 5));
    }

    #[test]
    fn destroy_frees_members_but_keeps_the_player() {
        let terrain = flat_terrain(0);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut queue = UsedBlocks::default();
        let mut chunk = loaded_chunk(&terrain, &catalog, &mut objects);
        chunk.set_node(queue.push_back(chunk.block()));

        let player = objects.insert(GameObject::mobile(0x190, 1, 1, 0));
        let npc = objects.insert(GameObject::mobile(0x191, 1, 1, 0));
        chunk.add_game_object(&mut objects, &catalog, player, 1, 1);
        chunk.add_game_object(&mut objects, &catalog, npc, 1, 1);

        chunk.destroy(&mut objects, &mut queue, Some(player));

        assert!(chunk.is_destroyed());
        assert!(chunk.node().is_none());
        assert_eq!(queue.len(), 0);
        assert_eq!(objects.len(), 1);
        assert!(!objects.contains(npc));
        let player = objects.get(player).expect("player survives");
        assert!(player.cell().is_none());
        assert!((0..BLOCK_SIZE).all(|x| chunk.head_object(&objects, x, 0).is_none()));
    }

    #[test]
    fn external_data_check_clears_static_animation() {
        let mut terrain = flat_terrain(0);
        terrain.add_static(0, 6, 6, 0x0011, 0, 0);
        let catalog = catalog();
        let mut objects = ObjectArena::new();
        let mut chunk = loaded_chunk(&terrain, &catalog, &mut objects);

        let (fixture, _) = chunk
            .objects_at(&objects, 6, 6)
            .find(|(_, object)| object.is_static())
            .expect("fixture");
        let effect = objects.insert(GameObject::effect(0x36B0, 6, 6, 0));
        if let Some(object) = objects.get_mut(fixture) {
            object.kind = ObjectKind::Static {
                animated_effect: Some(effect),
            };
        }

        assert!(chunk.has_no_external_data(&mut objects));
        assert_eq!(
            objects.get(fixture).map(|object| object.kind.clone()),
            Some(ObjectKind::Static {
                animated_effect: None
            })
        );

        let item = objects.insert(GameObject::item(0x0010, 0, 7, 0));
        chunk.add_game_object(&mut objects, &catalog, item, 0, 7);
        assert!(!chunk.has_no_external_data(&mut objects));
    }

    #[test]
    fn random_insertion_order_always_yields_sorted_cells() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(0x5EED);

        for _ in 0..500 {
            let mut objects = ObjectArena::new();
            let mut chunk = Chunk::create(0, 0, 0, 0, 0);
            let mut ids = Vec::new();

            for _ in 0..rng.gen_range(1..20) {
                let z = rng.gen_range(-5..=5);
                let object = match rng.gen_range(0..11) {
                    0 => GameObject::land(3, 0, 0, z),
                    1 => {
                        let mut land = GameObject::land(3, 0, 0, z);
                        land.kind = ObjectKind::Land {
                            is_stretched: true,
                            average_z: rng.gen_range(-5..=5),
                            min_z: z - 1,
                        };
                        land
                    }
                    2 => GameObject::static_fixture(0x0011, 0, 0, 0, z),
                    3 => GameObject::item(0x0010, 0, 0, z),
                    4 => GameObject::corpse(0x2006, 0, 0, z),
                    5 => GameObject::new(
                        ObjectKind::Item {
                            is_corpse: false,
                            multi_graphic: Some(0x0011),
                        },
                        0x4000,
                        0,
                        0,
                        z,
                    ),
                    6 => GameObject::mobile(0x190, 0, 0, z),
                    7 => GameObject::multi(0x0010, MultiState::FLOOR, 0, 0, z),
                    8 => GameObject::multi(0x0011, MultiState::GENERIC_INTERNAL, 0, 0, z),
                    9 => GameObject::multi(0x0010, MultiState::PREVIEW, 0, 0, z),
                    _ => GameObject::effect(0x36B0, 0, 0, z),
                };
                ids.push(objects.insert(object));
            }
            ids.shuffle(&mut rng);

            for id in &ids {
                chunk.add_game_object(&mut objects, &catalog, *id, 0, 0);
                let keys = chunk
                    .objects_at(&objects, 0, 0)
                    .map(|(_, object)| {
                        let rank = match compute_priority(object, &catalog).1 {
                            SortTag::Land => 0,
                            SortTag::Multi => 1,
                            SortTag::MultiPreview | SortTag::Unordered => 2,
                        };
                        (object.priority_z(), rank)
                    })
                    .collect::<Vec<_>>();
                assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]), "{keys:?}");
            }
            assert_eq!(chunk.objects_at(&objects, 0, 0).count(), ids.len());
        }
    }
}
