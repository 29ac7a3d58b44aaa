use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use world::{
    load_tile_catalog, resolve_app_paths, Map, MapError, StartupError, TerrainSource,
    TileCatalog, TileCatalogError,
};

use super::loop_runner::SimConfig;
use super::terrain_description::{TerrainDescription, TerrainDescriptionError};

pub(crate) const SIM_TICKS_ENV_VAR: &str = "TILEWORLD_SIM_TICKS";
pub(crate) const CHUNK_TTL_ENV_VAR: &str = "TILEWORLD_CHUNK_TTL_MS";

pub(crate) struct AppWiring {
    pub(crate) maps: Vec<Map>,
    pub(crate) sim: SimConfig,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load tile catalog: {0}")]
    TileCatalog(#[from] TileCatalogError),
    #[error("failed to read terrain description {path}: {source}")]
    ReadTerrain {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    TerrainDescription(#[from] TerrainDescriptionError),
    #[error("failed to create map: {0}")]
    Map(#[from] MapError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Tileworld Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "asset_root_resolved");

    let catalog = load_tile_catalog(&paths.tiledata_path)?;
    info!(
        land = catalog.land_count(),
        statics = catalog.static_count(),
        "tile_catalog_loaded"
    );

    let raw = fs::read_to_string(&paths.terrain_path).map_err(|source| {
        BootstrapError::ReadTerrain {
            path: paths.terrain_path.clone(),
            source,
        }
    })?;
    let description = TerrainDescription::parse(&raw)?;

    let mut cache = description.cache;
    cache.chunk_ttl_ms = resolve_u64_override(
        CHUNK_TTL_ENV_VAR,
        env::var(CHUNK_TTL_ENV_VAR),
        cache.chunk_ttl_ms,
    );
    let defaults = SimConfig::default();
    let sim = SimConfig {
        ticks: resolve_u64_override(SIM_TICKS_ENV_VAR, env::var(SIM_TICKS_ENV_VAR), defaults.ticks),
        ..defaults
    };

    let terrain = description.build_terrain();
    let facets = terrain.facet_count();
    let terrain: Arc<dyn TerrainSource> = Arc::new(terrain);
    let catalog: Arc<dyn TileCatalog> = Arc::new(catalog);
    let maps = (0..facets)
        .map(|index| Map::new(index, Arc::clone(&terrain), Arc::clone(&catalog), cache))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        facets = maps.len(),
        chunk_ttl_ms = cache.chunk_ttl_ms,
        load_grace_ms = cache.load_grace_ms,
        max_evictions_per_sweep = cache.max_evictions_per_sweep,
        ticks = sim.ticks,
        "world_ready"
    );

    Ok(AppWiring { maps, sim })
}

/// Applies an environment override, keeping `fallback` when the variable is
/// absent or unusable.
fn resolve_u64_override(
    env_var: &'static str,
    value: Result<String, env::VarError>,
    fallback: u64,
) -> u64 {
    match value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    env_var,
                    value = value.as_str(),
                    "invalid env var value; falling back to default"
                );
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(
                env_var,
                error = %err,
                "unable to read env var; falling back to default"
            );
            fallback
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_parses_present_values() {
        assert_eq!(
            resolve_u64_override(SIM_TICKS_ENV_VAR, Ok(" 250 ".to_string()), 10),
            250
        );
    }

    #[test]
    fn override_falls_back_when_absent_or_invalid() {
        assert_eq!(
            resolve_u64_override(SIM_TICKS_ENV_VAR, Err(env::VarError::NotPresent), 10),
            10
        );
        assert_eq!(
            resolve_u64_override(CHUNK_TTL_ENV_VAR, Ok("soon".to_string()), 3_000),
            3_000
        );
    }
}
