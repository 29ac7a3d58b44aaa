mod chunk;
mod stretch;
mod used_blocks;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use chunk::{Chunk, TileObjects};
pub use used_blocks::QueueHandle;

use crate::config::CacheConfig;
use crate::metrics::CacheCounters;
use crate::objects::{GameObject, ObjectArena, ObjectId, ObjectKind};
use crate::terrain::{tile_z, TerrainSource, BLOCK_SIZE};
use crate::tiledata::TileCatalog;

use used_blocks::UsedBlocks;

/// Height window, in Z units, within which a roof counts as near.
const ROOF_SEARCH_RANGE: i16 = 6;
const ROOF_VISITED_SIDE: i32 = 64;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("terrain source has no facet {map_index} (resolved to {resolved})")]
    UnknownFacet { map_index: usize, resolved: usize },
}

/// Live chunk cache of one facet. Chunks load lazily from the terrain
/// source, stay resident while touched and are evicted by
/// [`Map::clear_unused_blocks`] once idle and free of dynamic objects.
pub struct Map {
    index: usize,
    terrain_index: usize,
    width_blocks: u32,
    height_blocks: u32,
    chunks: Vec<Option<Chunk>>,
    used_blocks: UsedBlocks,
    objects: ObjectArena,
    terrain: Arc<dyn TerrainSource>,
    catalog: Arc<dyn TileCatalog>,
    config: CacheConfig,
    ticks: u64,
    player: Option<ObjectId>,
    roof_visited: Vec<bool>,
    counters: CacheCounters,
}

impl Map {
    pub fn new(
        index: usize,
        terrain: Arc<dyn TerrainSource>,
        catalog: Arc<dyn TileCatalog>,
        config: CacheConfig,
    ) -> Result<Self, MapError> {
        let terrain_index = terrain.sanitize_map_index(index);
        let (width_blocks, height_blocks) = terrain
            .block_dimensions(terrain_index)
            .ok_or(MapError::UnknownFacet {
                map_index: index,
                resolved: terrain_index,
            })?;
        if terrain_index != index {
            warn!(
                map = index,
                fallback = terrain_index,
                "facet has no terrain of its own; using fallback"
            );
        }

        let blocks_count = width_blocks as usize * height_blocks as usize;
        let mut chunks = Vec::with_capacity(blocks_count);
        chunks.resize_with(blocks_count, || None);

        info!(map = index, width_blocks, height_blocks, "map_created");

        Ok(Self {
            index,
            terrain_index,
            width_blocks,
            height_blocks,
            chunks,
            used_blocks: UsedBlocks::default(),
            objects: ObjectArena::new(),
            terrain,
            catalog,
            config,
            ticks: 0,
            player: None,
            roof_visited: vec![false; (ROOF_VISITED_SIDE * ROOF_VISITED_SIDE) as usize],
            counters: CacheCounters::default(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn blocks_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn block_dimensions(&self) -> (u32, u32) {
        (self.width_blocks, self.height_blocks)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the clock used for touches and eviction, in milliseconds.
    pub fn set_ticks(&mut self, now_ms: u64) {
        self.ticks = now_ms;
    }

    pub fn player(&self) -> Option<ObjectId> {
        self.player
    }

    /// Marks the locally controlled entity; chunk teardown never frees it.
    pub fn set_player(&mut self, player: Option<ObjectId>) {
        self.player = player;
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    pub fn objects(&self) -> &ObjectArena {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutable access for state changes. Position or height changes take
    /// effect in the tile order on the next [`Map::add_game_object`].
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Allocates an object without placing it on a tile.
    pub fn insert_object(&mut self, object: GameObject) -> ObjectId {
        self.objects.insert(object)
    }

    /// Resident chunk at `block`, without touching it.
    pub fn chunk(&self, block: usize) -> Option<&Chunk> {
        self.chunks
            .get(block)?
            .as_ref()
            .filter(|chunk| !chunk.is_destroyed())
    }

    pub fn get_chunk(&mut self, x: i32, y: i32, load: bool) -> Option<&Chunk> {
        let block = self.resolve_tile(x, y, load)?;
        self.chunks[block].as_ref()
    }

    pub fn get_chunk_by_block(&mut self, block_x: u32, block_y: u32, load: bool) -> Option<&Chunk> {
        let block = self.resolve_block(block_x, block_y, load)?;
        self.chunks[block].as_ref()
    }

    /// First (back-most) object of the cell at (x, y).
    pub fn get_tile(&mut self, x: i32, y: i32, load: bool) -> Option<ObjectId> {
        let block = self.resolve_tile(x, y, load)?;
        let chunk = self.chunks[block].as_ref()?;
        chunk.head_object(&self.objects, cell_offset(x), cell_offset(y))
    }

    /// Walks the cell at (x, y) from back to front, loading its chunk.
    pub fn tile_objects(&mut self, x: i32, y: i32) -> Option<TileObjects<'_>> {
        let block = self.resolve_tile(x, y, true)?;
        let chunk = self.chunks[block].as_ref()?;
        Some(chunk.objects_at(&self.objects, cell_offset(x), cell_offset(y)))
    }

    /// Raw land height at (x, y). Reads the terrain source directly, so the
    /// chunk cache is neither populated nor touched.
    pub fn get_tile_z(&self, x: i32, y: i32) -> i8 {
        tile_z(self.terrain.as_ref(), self.terrain_index, x, y)
    }

    /// Returns `(ground_z, static_z)`: the land height of the cell and the
    /// highest Z among its other members. Both are 0 when the tile is
    /// outside the facet.
    pub fn get_map_z(&mut self, x: i32, y: i32) -> (i8, i8) {
        let mut ground_z = 0;
        let mut static_z = 0;

        let Some(objects) = self.tile_objects(x, y) else {
            return (ground_z, static_z);
        };
        for (_, object) in objects {
            if object.is_land() {
                ground_z = object.z;
            } else if static_z < object.z {
                static_z = object.z;
            }
        }

        (ground_z, static_z)
    }

    /// Lowest roof height reachable from (x, y) by stepping across adjacent
    /// roof tiles that are each within range of the previous one. Returns
    /// `default_z` when no roof lies within range of `z` at (x, y).
    pub fn calculate_near_z(&mut self, default_z: i8, x: i32, y: i32, z: i8) -> i8 {
        self.roof_visited.fill(false);
        self.near_roof_z(default_z, x, y, z)
    }

    fn near_roof_z(&mut self, mut default_z: i8, x: i32, y: i32, z: i8) -> i8 {
        // Visited cells wrap every 64 tiles on both axes.
        let visited = ((x & 0x3F) + ((y & 0x3F) << 6)) as usize;
        if self.roof_visited[visited] {
            return default_z;
        }
        self.roof_visited[visited] = true;

        let Some(block) = self.resolve_tile(x, y, false) else {
            return default_z;
        };
        let Some(chunk) = self.chunks[block].as_ref() else {
            return default_z;
        };

        let catalog = self.catalog.as_ref();
        let roof = chunk
            .objects_at(&self.objects, cell_offset(x), cell_offset(y))
            .map(|(_, object)| object)
            .find(|object| {
                matches!(
                    object.kind,
                    ObjectKind::Static { .. } | ObjectKind::Multi { .. }
                ) && catalog
                    .static_tile(object.graphic)
                    .is_some_and(|data| data.is_roof)
                    && (i16::from(z) - i16::from(object.z)).abs() <= ROOF_SEARCH_RANGE
            });
        let Some(roof_z) = roof.map(|object| object.z) else {
            return default_z;
        };

        default_z = default_z.min(roof_z);
        default_z = self.near_roof_z(default_z, x - 1, y, roof_z);
        default_z = self.near_roof_z(default_z, x + 1, y, roof_z);
        default_z = self.near_roof_z(default_z, x, y - 1, roof_z);
        self.near_roof_z(default_z, x, y + 1, roof_z)
    }

    /// Places `id` on tile (x, y), loading the chunk when needed. The
    /// object's position is updated and any previous cell membership is
    /// dropped first.
    pub fn add_game_object(&mut self, id: ObjectId, x: i32, y: i32) -> bool {
        let Some(current) = self.objects.get(id) else {
            return false;
        };
        let previous = current.cell();

        let Some(block) = self.resolve_tile(x, y, true) else {
            return false;
        };

        if let Some(cell) = previous.filter(|cell| cell.block != block) {
            if let Some(owner) = self.chunks.get_mut(cell.block).and_then(Option::as_mut) {
                owner.remove_game_object(&mut self.objects, id, cell.x.into(), cell.y.into());
            }
        }

        if let Some(object) = self.objects.get_mut(id) {
            object.x = x as u16;
            object.y = y as u16;
        }

        let Some(chunk) = self.chunks[block].as_mut() else {
            return false;
        };
        chunk.add_game_object(
            &mut self.objects,
            self.catalog.as_ref(),
            id,
            cell_offset(x),
            cell_offset(y),
        )
    }

    /// Unlinks `id` from its tile. The object stays allocated.
    pub fn remove_game_object(&mut self, id: ObjectId) -> bool {
        let Some(cell) = self.objects.get(id).and_then(GameObject::cell) else {
            return false;
        };
        let Some(chunk) = self.chunks.get_mut(cell.block).and_then(Option::as_mut) else {
            return false;
        };
        chunk.remove_game_object(&mut self.objects, id, cell.x.into(), cell.y.into())
    }

    /// Unlinks and frees `id`.
    pub fn destroy_object(&mut self, id: ObjectId) -> Option<GameObject> {
        self.remove_game_object(id);
        if self.player == Some(id) {
            self.player = None;
        }
        self.objects.remove(id)
    }

    /// Tears down the resident chunk at (x, y) but keeps it in its slot; the
    /// next lookup rebuilds it from the terrain source.
    pub fn clear_chunk(&mut self, x: i32, y: i32) -> bool {
        let Some(block) = self.tile_block(x, y) else {
            return false;
        };
        let Some(chunk) = self.chunks[block]
            .as_mut()
            .filter(|chunk| !chunk.is_destroyed())
        else {
            return false;
        };
        chunk.clear(&mut self.objects, &mut self.used_blocks, self.player);
        debug!(map = self.index, block, "chunk_cleared");
        true
    }

    /// Resident chunks in registration order.
    pub fn used_chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.used_blocks
            .iter()
            .filter_map(|block| self.chunks.get(block)?.as_ref())
    }

    pub fn resident_chunks(&self) -> usize {
        self.used_blocks.len()
    }

    /// Evicts chunks idle for longer than the configured TTL that hold only
    /// land and statics, scanning in registration order and stopping at the
    /// per-sweep cap. Returns the number of chunks evicted.
    pub fn clear_unused_blocks(&mut self) -> usize {
        let Some(threshold) = self.ticks.checked_sub(self.config.chunk_ttl_ms) else {
            return 0;
        };
        let cap = self.config.eviction_cap();
        let mut evicted = 0;

        let mut cursor = self.used_blocks.front();
        while let Some(handle) = cursor {
            cursor = self.used_blocks.next(handle);
            let Some(block) = self.used_blocks.block(handle) else {
                continue;
            };

            let idle = match self.chunks.get(block).and_then(Option::as_ref) {
                Some(chunk) => {
                    chunk.last_access_time() < threshold
                        && chunk.has_no_external_data(&mut self.objects)
                }
                None => false,
            };
            if !idle {
                continue;
            }

            if let Some(mut chunk) = self.chunks[block].take() {
                chunk.destroy(&mut self.objects, &mut self.used_blocks, self.player);
            }
            self.counters.evictions += 1;
            evicted += 1;
            if evicted >= cap {
                break;
            }
        }

        if evicted > 0 {
            debug!(
                map = self.index,
                evicted,
                resident = self.used_blocks.len(),
                "unused_chunks_cleared"
            );
        }
        evicted
    }

    /// Destroys every chunk and empties the eviction queue.
    pub fn destroy(&mut self) {
        let blocks = self.used_blocks.iter().collect::<Vec<_>>();
        for block in &blocks {
            if let Some(mut chunk) = self.chunks.get_mut(*block).and_then(Option::take) {
                chunk.destroy(&mut self.objects, &mut self.used_blocks, self.player);
            }
        }
        for slot in &mut self.chunks {
            if slot.as_ref().is_some_and(Chunk::is_destroyed) {
                *slot = None;
            }
        }
        self.used_blocks.clear();

        info!(map = self.index, chunks = blocks.len(), "map_destroyed");
    }

    fn resolve_tile(&mut self, x: i32, y: i32, load: bool) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        self.resolve_block((x >> 3) as u32, (y >> 3) as u32, load)
    }

    /// Block number of the tile at (x, y), without touching its chunk.
    fn tile_block(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        self.block_index((x >> 3) as u32, (y >> 3) as u32)
    }

    fn block_index(&self, block_x: u32, block_y: u32) -> Option<usize> {
        if block_x >= self.width_blocks || block_y >= self.height_blocks {
            return None;
        }
        Some(block_x as usize * self.height_blocks as usize + block_y as usize)
    }

    /// Finds, creates or rebuilds the chunk at a block and touches it.
    fn resolve_block(&mut self, block_x: u32, block_y: u32, load: bool) -> Option<usize> {
        let block = self.block_index(block_x, block_y)?;

        match self.chunks[block].as_mut() {
            None => {
                if !load {
                    return None;
                }
                let chunk = self.build_chunk(block_x, block_y, block);
                self.chunks[block] = Some(chunk);
                self.counters.loads += 1;
            }
            Some(chunk) if chunk.is_destroyed() => {
                if let Some(node) = chunk.take_node() {
                    self.used_blocks.remove(node);
                }
                let rebuilt = self.build_chunk(block_x, block_y, block);
                self.chunks[block] = Some(rebuilt);
                self.counters.reloads += 1;
            }
            Some(_) => {}
        }

        let ticks = self.ticks;
        if let Some(chunk) = self.chunks[block].as_mut() {
            chunk.touch(ticks);
        }
        Some(block)
    }

    fn build_chunk(&mut self, block_x: u32, block_y: u32, block: usize) -> Chunk {
        let mut chunk = Chunk::create(
            block_x,
            block_y,
            block,
            self.ticks,
            self.config.load_grace_ms,
        );
        let created = chunk.load(
            self.terrain.as_ref(),
            self.catalog.as_ref(),
            &mut self.objects,
            self.terrain_index,
        );
        chunk.set_node(self.used_blocks.push_back(block));
        debug!(
            map = self.index,
            block_x,
            block_y,
            objects = created,
            "chunk_loaded"
        );
        chunk
    }
}

fn cell_offset(coordinate: i32) -> usize {
    (coordinate as usize) % BLOCK_SIZE
}
