use serde::Deserialize;
use thiserror::Error;
use world::{CacheConfig, LandCell, MemoryTerrain, BLOCK_SIZE};

/// JSON description of the synthetic world the simulation runs on.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TerrainDescription {
    #[serde(default)]
    pub(crate) cache: CacheConfig,
    pub(crate) facets: Vec<FacetDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FacetDescription {
    pub(crate) width_blocks: u32,
    pub(crate) height_blocks: u32,
    pub(crate) land_tile: u16,
    #[serde(default)]
    pub(crate) base_z: i8,
    #[serde(default)]
    pub(crate) hills: Vec<HillDescription>,
    #[serde(default)]
    pub(crate) statics: Vec<StaticDescription>,
    /// Blocks left without land data, as `[block_x, block_y]`.
    #[serde(default)]
    pub(crate) holes: Vec<[u32; 2]>,
}

/// A cone of raised land centred on a tile.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HillDescription {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) radius: u32,
    pub(crate) height: i8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StaticDescription {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) graphic: u16,
    #[serde(default)]
    pub(crate) hue: u16,
    #[serde(default)]
    pub(crate) z: i8,
}

#[derive(Debug, Error)]
pub(crate) enum TerrainDescriptionError {
    #[error("parse terrain description at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("terrain description validation failed at {path}: {message}")]
    Validation { path: String, message: String },
}

impl TerrainDescription {
    pub(crate) fn parse(raw: &str) -> Result<Self, TerrainDescriptionError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let description =
            serde_path_to_error::deserialize::<_, Self>(&mut deserializer).map_err(|error| {
                let path = error.path().to_string();
                TerrainDescriptionError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    source: error.into_inner(),
                }
            })?;
        description.validate()?;
        Ok(description)
    }

    fn validate(&self) -> Result<(), TerrainDescriptionError> {
        if self.facets.is_empty() {
            return Err(validation_err("facets", "at least one facet is required"));
        }

        for (index, facet) in self.facets.iter().enumerate() {
            let base = format!("facets[{index}]");
            if facet.width_blocks == 0 || facet.height_blocks == 0 {
                return Err(validation_err(
                    &base,
                    format!(
                        "block grid must be non-empty, got {}x{}",
                        facet.width_blocks, facet.height_blocks
                    ),
                ));
            }

            let (width_tiles, height_tiles) = facet.tile_dimensions();
            for (hill_index, hill) in facet.hills.iter().enumerate() {
                if hill.x >= width_tiles || hill.y >= height_tiles {
                    return Err(validation_err(
                        &format!("{base}.hills[{hill_index}]"),
                        format!("centre ({}, {}) lies outside the facet", hill.x, hill.y),
                    ));
                }
            }
            for (static_index, fixture) in facet.statics.iter().enumerate() {
                let path = format!("{base}.statics[{static_index}]");
                if fixture.x >= width_tiles || fixture.y >= height_tiles {
                    return Err(validation_err(
                        &path,
                        format!("tile ({}, {}) lies outside the facet", fixture.x, fixture.y),
                    ));
                }
                if fixture.graphic == 0 || fixture.graphic == 0xFFFF {
                    return Err(validation_err(
                        &format!("{path}.graphic"),
                        format!("{:#06x} is reserved", fixture.graphic),
                    ));
                }
            }
            for (hole_index, [block_x, block_y]) in facet.holes.iter().enumerate() {
                if *block_x >= facet.width_blocks || *block_y >= facet.height_blocks {
                    return Err(validation_err(
                        &format!("{base}.holes[{hole_index}]"),
                        format!("block ({block_x}, {block_y}) lies outside the facet"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Builds the in-memory terrain; facet indices follow description order.
    pub(crate) fn build_terrain(&self) -> MemoryTerrain {
        let mut terrain = MemoryTerrain::new();
        for facet in &self.facets {
            let index = terrain.add_facet(facet.width_blocks, facet.height_blocks);
            terrain.fill_land(index, facet.land_tile, facet.base_z);

            let (width_tiles, height_tiles) = facet.tile_dimensions();
            for hill in &facet.hills {
                raise_hill(&mut terrain, index, facet, hill, width_tiles, height_tiles);
            }
            for fixture in &facet.statics {
                terrain.add_static(
                    index,
                    fixture.x,
                    fixture.y,
                    fixture.graphic,
                    fixture.hue,
                    fixture.z,
                );
            }
            for [block_x, block_y] in &facet.holes {
                terrain.clear_block(index, *block_x, *block_y);
            }
        }
        terrain
    }
}

impl FacetDescription {
    pub(crate) fn tile_dimensions(&self) -> (u32, u32) {
        (
            self.width_blocks.saturating_mul(BLOCK_SIZE as u32),
            self.height_blocks.saturating_mul(BLOCK_SIZE as u32),
        )
    }
}

fn raise_hill(
    terrain: &mut MemoryTerrain,
    index: usize,
    facet: &FacetDescription,
    hill: &HillDescription,
    width_tiles: u32,
    height_tiles: u32,
) {
    let radius = hill.radius.max(1);
    let min_x = hill.x.saturating_sub(radius);
    let min_y = hill.y.saturating_sub(radius);
    let max_x = hill.x.saturating_add(radius).min(width_tiles - 1);
    let max_y = hill.y.saturating_add(radius).min(height_tiles - 1);

    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let distance = x.abs_diff(hill.x).max(y.abs_diff(hill.y));
            if distance > radius {
                continue;
            }
            let rise = i32::from(hill.height) * (radius - distance) as i32 / radius as i32;
            let z = (i32::from(facet.base_z) + rise).clamp(i32::from(i8::MIN), i32::from(i8::MAX));
            terrain.set_land_cell(index, x, y, LandCell::new(facet.land_tile, z as i8));
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> TerrainDescriptionError {
    TerrainDescriptionError::Validation {
        path: path.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use world::{tile_z, TerrainSource, INVALID_TILE_Z};

    use super::*;

    const SAMPLE: &str = r#"{
        "cache": { "chunk_ttl_ms": 1500 },
        "facets": [
            {
                "width_blocks": 4,
                "height_blocks": 4,
                "land_tile": 3,
                "base_z": 0,
                "hills": [ { "x": 10, "y": 10, "radius": 4, "height": 20 } ],
                "statics": [ { "x": 2, "y": 3, "graphic": 4096, "hue": 5, "z": 1 } ],
                "holes": [ [3, 3] ]
            }
        ]
    }"#;

    #[test]
    fn sample_description_builds_terrain() {
        let description = TerrainDescription::parse(SAMPLE).expect("description");
        assert_eq!(description.cache.chunk_ttl_ms, 1500);
        assert_eq!(description.cache.load_grace_ms, 3_000);

        let terrain = description.build_terrain();
        assert_eq!(terrain.facet_count(), 1);
        assert_eq!(terrain.block_dimensions(0), Some((4, 4)));
        assert_eq!(tile_z(&terrain, 0, 10, 10), 20);
        assert_eq!(tile_z(&terrain, 0, 12, 10), 10);
        assert_eq!(tile_z(&terrain, 0, 0, 0), 0);
        assert_eq!(tile_z(&terrain, 0, 25, 25), INVALID_TILE_Z);

        let index = terrain.resolve(0, 0, 0);
        let statics = terrain.read_statics(index.statics.expect("statics"), index.statics_count);
        assert_eq!((statics[0].x, statics[0].y, statics[0].hue), (2, 3, 5));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{ "facets": [
            { "width_blocks": "wide", "height_blocks": 1, "land_tile": 3 }
        ] }"#;
        let error = TerrainDescription::parse(raw).expect_err("invalid width");
        match error {
            TerrainDescriptionError::Parse { path, .. } => {
                assert_eq!(path, "facets[0].width_blocks");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "facets": [], "weather": "rain" }"#;
        assert!(matches!(
            TerrainDescription::parse(raw),
            Err(TerrainDescriptionError::Parse { .. })
        ));
    }

    #[test]
    fn validation_rejects_out_of_range_statics() {
        let raw = r#"{ "facets": [ { "width_blocks": 1, "height_blocks": 1, "land_tile": 3,
            "statics": [ { "x": 8, "y": 0, "graphic": 16 } ] } ] }"#;
        let error = TerrainDescription::parse(raw).expect_err("outside");
        assert!(error.to_string().contains("facets[0].statics[0]"));
    }

    #[test]
    fn validation_rejects_reserved_graphics_and_empty_facets() {
        let raw = r#"{ "facets": [ { "width_blocks": 1, "height_blocks": 1, "land_tile": 3,
            "statics": [ { "x": 1, "y": 1, "graphic": 65535 } ] } ] }"#;
        let error = TerrainDescription::parse(raw).expect_err("reserved");
        assert!(error.to_string().contains("statics[0].graphic"));

        let error = TerrainDescription::parse(r#"{ "facets": [] }"#).expect_err("empty");
        assert!(matches!(error, TerrainDescriptionError::Validation { .. }));
    }
}
