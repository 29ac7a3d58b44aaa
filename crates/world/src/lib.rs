use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod config;
pub mod map;
pub mod metrics;
pub mod objects;
pub mod terrain;
pub mod tiledata;

pub use config::CacheConfig;
pub use map::{Chunk, Map, MapError, TileObjects};
pub use metrics::{CacheCounters, CacheMetricsSnapshot, MetricsAccumulator, MetricsHandle};
pub use objects::{
    compute_priority, GameObject, MultiState, ObjectArena, ObjectId, ObjectKind, PriorityZ,
    SortTag, TileCell,
};
pub use terrain::{
    tile_z, BlockIndex, LandAddress, LandCell, MemoryTerrain, StaticRecord, StaticsAddress,
    TerrainSource, BLOCK_SIZE, CELLS_PER_BLOCK, INVALID_TILE_Z,
};
pub use tiledata::{
    load_tile_catalog, parse_tile_catalog, LandTileData, SourceLocation, StaticTileData,
    TileCatalog, TileCatalogError, TileCatalogErrorCode, TileDataCatalog,
};

pub const ROOT_ENV_VAR: &str = "TILEWORLD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub tiledata_path: PathBuf,
    pub terrain_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("required asset file is missing: {path}")]
    MissingAsset { path: PathBuf },
    #[error(
        "TILEWORLD_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\tileworld\"\n\
Bash/zsh: export {env_var}=\"/path/to/tileworld\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_under(root)
}

fn app_paths_under(root: PathBuf) -> Result<AppPaths, StartupError> {
    let assets_dir = root.join("assets");
    let tiledata_path = assets_dir.join("tiledata.xml");
    let terrain_path = assets_dir.join("terrain.json");

    for path in [&tiledata_path, &terrain_path] {
        if !path.is_file() {
            return Err(StartupError::MissingAsset { path: path.clone() });
        }
    }

    Ok(AppPaths {
        root,
        assets_dir,
        tiledata_path,
        terrain_path,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_assets_layout() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!is_repo_marker(temp.path()));

        fs::create_dir(temp.path().join("assets")).expect("assets");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_require_both_asset_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        let assets = temp.path().join("assets");
        fs::create_dir(&assets).expect("assets");
        fs::write(assets.join("tiledata.xml"), "<TileData/>").expect("write");

        let error = app_paths_under(temp.path().to_path_buf()).expect_err("missing terrain");
        assert!(matches!(
            error,
            StartupError::MissingAsset { ref path } if path.ends_with("terrain.json")
        ));

        fs::write(assets.join("terrain.json"), "{}").expect("write");
        let paths = app_paths_under(temp.path().to_path_buf()).expect("paths");
        assert_eq!(paths.tiledata_path, assets.join("tiledata.xml"));
    }
}
