use super::{
    BlockIndex, LandAddress, LandCell, StaticRecord, StaticsAddress, TerrainSource, BLOCK_SIZE,
    CELLS_PER_BLOCK,
};

#[derive(Debug, Clone)]
struct MemoryFacet {
    width_blocks: u32,
    height_blocks: u32,
    index: Vec<BlockIndex>,
}

impl MemoryFacet {
    fn block_of(&self, block_x: u32, block_y: u32) -> Option<usize> {
        if block_x >= self.width_blocks || block_y >= self.height_blocks {
            return None;
        }
        Some(block_x as usize * self.height_blocks as usize + block_y as usize)
    }
}

/// Terrain dataset held entirely in memory. Facets without an entry fall
/// back to facet 0.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerrain {
    facets: Vec<MemoryFacet>,
    land_blocks: Vec<[LandCell; CELLS_PER_BLOCK]>,
    statics_blocks: Vec<Vec<StaticRecord>>,
}

impl MemoryTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Adds a facet with no land data (every block is a hole) and returns
    /// its index.
    pub fn add_facet(&mut self, width_blocks: u32, height_blocks: u32) -> usize {
        let blocks = width_blocks as usize * height_blocks as usize;
        self.facets.push(MemoryFacet {
            width_blocks,
            height_blocks,
            index: vec![BlockIndex::INVALID; blocks],
        });
        self.facets.len() - 1
    }

    pub fn set_land_block(
        &mut self,
        map_index: usize,
        block_x: u32,
        block_y: u32,
        cells: [LandCell; CELLS_PER_BLOCK],
    ) -> bool {
        let Some(block) = self.block_of(map_index, block_x, block_y) else {
            return false;
        };
        let entry = &mut self.facets[map_index].index[block];
        match entry.land {
            Some(address) => self.land_blocks[address.0 as usize] = cells,
            None => {
                entry.land = Some(LandAddress(self.land_blocks.len() as u32));
                self.land_blocks.push(cells);
            }
        }
        true
    }

    pub fn fill_land(&mut self, map_index: usize, tile_id: u16, z: i8) {
        let Some(facet) = self.facets.get(map_index) else {
            return;
        };
        let (width, height) = (facet.width_blocks, facet.height_blocks);
        for block_x in 0..width {
            for block_y in 0..height {
                self.set_land_block(
                    map_index,
                    block_x,
                    block_y,
                    [LandCell::new(tile_id, z); CELLS_PER_BLOCK],
                );
            }
        }
    }

    /// Overwrites one land cell in tile coordinates. The block must already
    /// hold land data.
    pub fn set_land_cell(&mut self, map_index: usize, x: u32, y: u32, cell: LandCell) -> bool {
        let Some(address) = self.land_address(map_index, x, y) else {
            return false;
        };
        let offset = cell_offset(x, y);
        self.land_blocks[address.0 as usize][offset] = cell;
        true
    }

    pub fn land_cell(&self, map_index: usize, x: u32, y: u32) -> Option<LandCell> {
        let address = self.land_address(map_index, x, y)?;
        Some(self.land_blocks[address.0 as usize][cell_offset(x, y)])
    }

    /// Appends a statics record at tile coordinates.
    pub fn add_static(
        &mut self,
        map_index: usize,
        x: u32,
        y: u32,
        graphic: u16,
        hue: u16,
        z: i8,
    ) -> bool {
        let record = StaticRecord {
            color: graphic,
            hue,
            x: (x % BLOCK_SIZE as u32) as u8,
            y: (y % BLOCK_SIZE as u32) as u8,
            z,
        };
        self.push_static_record(
            map_index,
            x / BLOCK_SIZE as u32,
            y / BLOCK_SIZE as u32,
            record,
        )
    }

    /// Appends a raw record to a block, without validating its offsets.
    pub fn push_static_record(
        &mut self,
        map_index: usize,
        block_x: u32,
        block_y: u32,
        record: StaticRecord,
    ) -> bool {
        let Some(block) = self.block_of(map_index, block_x, block_y) else {
            return false;
        };
        let entry = &mut self.facets[map_index].index[block];
        match entry.statics {
            Some(address) => self.statics_blocks[address.0 as usize].push(record),
            None => {
                entry.statics = Some(StaticsAddress(self.statics_blocks.len() as u32));
                self.statics_blocks.push(vec![record]);
            }
        }
        entry.statics_count = entry.statics_count.saturating_add(1);
        true
    }

    /// Turns a block into a hole with neither land nor statics.
    pub fn clear_block(&mut self, map_index: usize, block_x: u32, block_y: u32) -> bool {
        let Some(block) = self.block_of(map_index, block_x, block_y) else {
            return false;
        };
        self.facets[map_index].index[block] = BlockIndex::INVALID;
        true
    }

    fn block_of(&self, map_index: usize, block_x: u32, block_y: u32) -> Option<usize> {
        self.facets.get(map_index)?.block_of(block_x, block_y)
    }

    fn land_address(&self, map_index: usize, x: u32, y: u32) -> Option<LandAddress> {
        let block = self.block_of(
            map_index,
            x / BLOCK_SIZE as u32,
            y / BLOCK_SIZE as u32,
        )?;
        self.facets[map_index].index[block].land
    }
}

fn cell_offset(x: u32, y: u32) -> usize {
    ((y as usize % BLOCK_SIZE) << 3) + x as usize % BLOCK_SIZE
}

impl TerrainSource for MemoryTerrain {
    fn block_dimensions(&self, map_index: usize) -> Option<(u32, u32)> {
        self.facets
            .get(map_index)
            .map(|facet| (facet.width_blocks, facet.height_blocks))
    }

    fn sanitize_map_index(&self, map_index: usize) -> usize {
        if map_index < self.facets.len() {
            map_index
        } else {
            0
        }
    }

    fn resolve(&self, map_index: usize, block_x: u32, block_y: u32) -> BlockIndex {
        self.facets
            .get(map_index)
            .and_then(|facet| {
                facet
                    .block_of(block_x, block_y)
                    .map(|block| facet.index[block])
            })
            .unwrap_or(BlockIndex::INVALID)
    }

    fn read_land_cells(&self, address: LandAddress) -> Option<&[LandCell; CELLS_PER_BLOCK]> {
        self.land_blocks.get(address.0 as usize)
    }

    fn read_statics(&self, address: StaticsAddress, count: u32) -> &[StaticRecord] {
        self.statics_blocks
            .get(address.0 as usize)
            .map(|records| &records[..records.len().min(count as usize)])
            .unwrap_or(&[])
    }
}
