mod memory;

pub use memory::MemoryTerrain;

/// Tiles along one edge of a block.
pub const BLOCK_SIZE: usize = 8;
pub const CELLS_PER_BLOCK: usize = BLOCK_SIZE * BLOCK_SIZE;
/// Height reported for negative coordinates and blocks without land data.
pub const INVALID_TILE_Z: i8 = -125;

const LAND_TILE_ID_MASK: u16 = 0x3FFF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LandCell {
    pub tile_id: u16,
    pub z: i8,
}

impl LandCell {
    pub fn new(tile_id: u16, z: i8) -> Self {
        Self { tile_id, z }
    }

    pub fn graphic(self) -> u16 {
        self.tile_id & LAND_TILE_ID_MASK
    }
}

/// One statics record. `x`/`y` are offsets inside the block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticRecord {
    pub color: u16,
    pub hue: u16,
    pub x: u8,
    pub y: u8,
    pub z: i8,
}

impl StaticRecord {
    /// Records with a zero or 0xFFFF graphic are placeholders.
    pub fn is_placeholder(&self) -> bool {
        self.color == 0 || self.color == 0xFFFF
    }

    pub fn cell_index(&self) -> usize {
        ((self.y as usize) << 3) + self.x as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LandAddress(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticsAddress(pub u32);

/// Where a block's land cells and statics live in the backing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndex {
    pub land: Option<LandAddress>,
    pub statics: Option<StaticsAddress>,
    pub statics_count: u32,
}

impl BlockIndex {
    pub const INVALID: Self = Self {
        land: None,
        statics: None,
        statics_count: 0,
    };

    pub fn is_valid(&self) -> bool {
        self.land.is_some()
    }
}

/// Read-only provider of raw terrain blocks for one or more facets.
pub trait TerrainSource {
    /// Block grid size of a facet as (blocks along x, blocks along y).
    fn block_dimensions(&self, map_index: usize) -> Option<(u32, u32)>;

    /// Maps a facet index without its own dataset onto the one it borrows.
    fn sanitize_map_index(&self, map_index: usize) -> usize {
        map_index
    }

    fn resolve(&self, map_index: usize, block_x: u32, block_y: u32) -> BlockIndex;

    fn read_land_cells(&self, address: LandAddress) -> Option<&[LandCell; CELLS_PER_BLOCK]>;

    fn read_statics(&self, address: StaticsAddress, count: u32) -> &[StaticRecord];
}

/// Raw land height at a tile, read straight from the terrain source.
pub fn tile_z(source: &dyn TerrainSource, map_index: usize, x: i32, y: i32) -> i8 {
    if x < 0 || y < 0 {
        return INVALID_TILE_Z;
    }

    let map_index = source.sanitize_map_index(map_index);
    let index = source.resolve(map_index, (x >> 3) as u32, (y >> 3) as u32);
    let Some(cells) = index
        .land
        .and_then(|address| source.read_land_cells(address))
    else {
        return INVALID_TILE_Z;
    };

    cells[(((y & 7) << 3) + (x & 7)) as usize].z
}
