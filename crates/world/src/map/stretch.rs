use crate::terrain::{tile_z, TerrainSource, INVALID_TILE_Z};
use crate::tiledata::TileCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LandShape {
    pub(crate) is_stretched: bool,
    pub(crate) average_z: i8,
    pub(crate) min_z: i8,
}

impl LandShape {
    fn flat(z: i8) -> Self {
        Self {
            is_stretched: false,
            average_z: z,
            min_z: z,
        }
    }
}

/// Decides whether the land tile at (x, y) is drawn stretched and, if so,
/// the heights used for sorting. Reads neighbour heights from the raw terrain
/// so building one chunk never loads another.
pub(crate) fn land_shape(
    terrain: &dyn TerrainSource,
    catalog: &dyn TileCatalog,
    map_index: usize,
    graphic: u16,
    x: i32,
    y: i32,
    z: i8,
) -> LandShape {
    let has_texture = catalog
        .land_tile(graphic)
        .is_some_and(|land| land.texture_id != 0);
    if !has_texture || !has_uneven_neighbourhood(terrain, map_index, x, y, z) {
        return LandShape::flat(z);
    }

    let z_top = tile_z(terrain, map_index, x, y + 1);
    let z_right = tile_z(terrain, map_index, x + 1, y + 1);
    let z_bottom = tile_z(terrain, map_index, x + 1, y);

    let average_z = if (i16::from(z) - i16::from(z_right)).abs()
        <= (i16::from(z_bottom) - i16::from(z_top)).abs()
    {
        (i16::from(z) + i16::from(z_right)) >> 1
    } else {
        (i16::from(z_bottom) + i16::from(z_top)) >> 1
    };
    let min_z = z.min(z_top).min(z_right).min(z_bottom);

    LandShape {
        is_stretched: true,
        average_z: average_z as i8,
        min_z,
    }
}

fn has_uneven_neighbourhood(
    terrain: &dyn TerrainSource,
    map_index: usize,
    x: i32,
    y: i32,
    z: i8,
) -> bool {
    (-2..=2).any(|dx| {
        (-2..=2).any(|dy| {
            let neighbour = tile_z(terrain, map_index, x + dx, y + dy);
            neighbour != z && neighbour != INVALID_TILE_Z
        })
    })
}
