use std::process::ExitCode;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use world::{
    GameObject, Map, MetricsAccumulator, MetricsHandle, ObjectId, ObjectKind, BLOCK_SIZE,
};

use super::bootstrap::AppWiring;

const PLAYER_GRAPHIC: u16 = 0x0190;
const DROPPED_ITEM_GRAPHIC: u16 = 0x0EED;
const SPARKLE_EFFECT_GRAPHIC: u16 = 0x373A;
/// Patrol keeps this many tiles away from the facet edge.
const PATROL_MARGIN: i32 = 4;
const ITEM_DROP_EVERY_TICKS: u64 = 20;
const ITEM_LIFETIME_TICKS: u64 = 30;
const EFFECT_EVERY_TICKS: u64 = 15;
const EFFECT_LIFETIME_TICKS: u64 = 5;
const LOOKAHEAD_STEPS: u64 = 4;
const STEEP_STEP_Z: i16 = 10;
const NO_ROOF_Z: i8 = i8::MAX;
/// Roofs are searched around head height rather than at the feet.
const ROOF_PROBE_HEIGHT: i8 = 16;

#[derive(Debug, Clone)]
pub(crate) struct SimConfig {
    pub(crate) ticks: u64,
    pub(crate) tick_ms: u64,
    pub(crate) metrics_interval: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 1_200,
            tick_ms: 100,
            metrics_interval: Duration::from_secs(1),
        }
    }
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { maps, sim } = app;
    let mut facets = maps
        .into_iter()
        .map(|map| FacetSim::new(map, &sim))
        .collect::<Vec<_>>();

    for tick in 1..=sim.ticks {
        let now_ms = tick.saturating_mul(sim.tick_ms);
        for facet in &mut facets {
            facet.step(tick, now_ms);
        }
    }

    for facet in &mut facets {
        facet.shutdown();
    }

    ExitCode::SUCCESS
}

#[derive(Debug, Clone, Copy)]
struct Transient {
    id: ObjectId,
    expires_at_tick: u64,
}

/// Drives one facet: a player patrolling the map edge, short-lived items and
/// effects, and the per-tick eviction sweep.
struct FacetSim {
    map: Map,
    player: ObjectId,
    width_tiles: i32,
    height_tiles: i32,
    transients: Vec<Transient>,
    under_roof: bool,
    accumulator: MetricsAccumulator,
    metrics: MetricsHandle,
}

impl FacetSim {
    fn new(mut map: Map, sim: &SimConfig) -> Self {
        let (width_blocks, height_blocks) = map.block_dimensions();
        let width_tiles = (width_blocks as usize * BLOCK_SIZE) as i32;
        let height_tiles = (height_blocks as usize * BLOCK_SIZE) as i32;

        let (x, y) = patrol_position(0, width_tiles, height_tiles);
        let player = map.insert_object(GameObject::mobile(PLAYER_GRAPHIC, 0, 0, 0));
        map.set_player(Some(player));
        let accumulator = MetricsAccumulator::new(sim.metrics_interval, map.ticks());
        debug!(
            map = map.index(),
            chunk_ttl = ?map.config().chunk_ttl(),
            load_grace = ?map.config().load_grace(),
            "facet_started"
        );

        let mut facet = Self {
            map,
            player,
            width_tiles,
            height_tiles,
            transients: Vec::new(),
            under_roof: false,
            accumulator,
            metrics: MetricsHandle::default(),
        };
        facet.place_player(x, y);
        facet
    }

    fn step(&mut self, tick: u64, now_ms: u64) {
        self.map.set_ticks(now_ms);

        let (x, y) = patrol_position(tick, self.width_tiles, self.height_tiles);
        self.place_player(x, y);
        self.look_ahead(tick, x, y);
        self.track_roof(x, y);

        if tick % ITEM_DROP_EVERY_TICKS == 0 {
            self.drop_item(tick, x, y);
        }
        if tick % EFFECT_EVERY_TICKS == 0 {
            self.spawn_effect(tick, x, y);
        }
        self.expire_transients(tick);

        let started = Instant::now();
        let evicted = self.map.clear_unused_blocks();
        self.accumulator.record_sweep(started.elapsed());
        if evicted > 0 {
            debug!(map = self.map.index(), tick, evicted, "sweep_evicted");
        }

        if let Some(snapshot) = self.accumulator.maybe_snapshot(
            now_ms,
            self.map.counters(),
            self.map.resident_chunks(),
        ) {
            self.metrics.publish(snapshot);
            info!(
                map = self.map.index(),
                resident_chunks = snapshot.resident_chunks,
                loads_per_second = snapshot.loads_per_second,
                evictions_per_second = snapshot.evictions_per_second,
                sweep_time_ms = snapshot.sweep_time_ms,
                "cache_metrics"
            );
        }
    }

    fn place_player(&mut self, x: i32, y: i32) {
        let (ground_z, _) = self.map.get_map_z(x, y);
        if let Some(player) = self.map.object_mut(self.player) {
            player.z = ground_z;
        }
        self.map.add_game_object(self.player, x, y);
    }

    /// Height check on the route ahead; reads raw terrain so the cache is
    /// not populated by the probe.
    fn look_ahead(&self, tick: u64, x: i32, y: i32) {
        let (ahead_x, ahead_y) =
            patrol_position(tick + LOOKAHEAD_STEPS, self.width_tiles, self.height_tiles);
        let here = self.map.get_tile_z(x, y);
        let ahead = self.map.get_tile_z(ahead_x, ahead_y);
        if (i16::from(ahead) - i16::from(here)).abs() > STEEP_STEP_Z {
            debug!(
                map = self.map.index(),
                x = ahead_x,
                y = ahead_y,
                here,
                ahead,
                "steep_terrain_ahead"
            );
        }
    }

    fn track_roof(&mut self, x: i32, y: i32) {
        let z = self
            .map
            .object(self.player)
            .map(|player| player.z.saturating_add(ROOF_PROBE_HEIGHT))
            .unwrap_or(ROOF_PROBE_HEIGHT);
        let roof_z = self.map.calculate_near_z(NO_ROOF_Z, x, y, z);
        let under_roof = roof_z != NO_ROOF_Z;
        if under_roof != self.under_roof {
            self.under_roof = under_roof;
            debug!(map = self.map.index(), x, y, roof_z, under_roof, "roof_changed");
        }
    }

    fn drop_item(&mut self, tick: u64, x: i32, y: i32) {
        let z = self
            .map
            .object(self.player)
            .map(|player| player.z)
            .unwrap_or_default();
        let item = self
            .map
            .insert_object(GameObject::item(DROPPED_ITEM_GRAPHIC, 0, 0, z));
        if self.map.add_game_object(item, x, y) {
            self.transients.push(Transient {
                id: item,
                expires_at_tick: tick + ITEM_LIFETIME_TICKS,
            });
        } else {
            self.map.destroy_object(item);
        }
    }

    /// Plays a short effect on the first static fixture at the player's
    /// tile, if there is one.
    fn spawn_effect(&mut self, tick: u64, x: i32, y: i32) {
        let Some((fixture, z)) = self.map.tile_objects(x, y).and_then(|mut objects| {
            objects
                .find(|(_, object)| object.is_static())
                .map(|(id, object)| (id, object.z))
        }) else {
            return;
        };

        let effect = self
            .map
            .insert_object(GameObject::effect(SPARKLE_EFFECT_GRAPHIC, 0, 0, z));
        if !self.map.add_game_object(effect, x, y) {
            self.map.destroy_object(effect);
            return;
        }
        if let Some(ObjectKind::Static { animated_effect }) = self
            .map
            .object_mut(fixture)
            .map(|object| &mut object.kind)
        {
            *animated_effect = Some(effect);
        }
        self.transients.push(Transient {
            id: effect,
            expires_at_tick: tick + EFFECT_LIFETIME_TICKS,
        });
    }

    fn expire_transients(&mut self, tick: u64) {
        let map = &mut self.map;
        self.transients.retain(|transient| {
            if transient.expires_at_tick > tick {
                return true;
            }
            map.destroy_object(transient.id);
            false
        });
    }

    fn shutdown(&mut self) {
        for transient in self.transients.drain(..) {
            self.map.destroy_object(transient.id);
        }
        self.map.destroy();

        let counters = self.map.counters();
        let snapshot = self.metrics.snapshot();
        info!(
            map = self.map.index(),
            loads = counters.loads,
            reloads = counters.reloads,
            evictions = counters.evictions,
            last_resident_chunks = snapshot.resident_chunks,
            live_objects = self.map.objects().len(),
            "facet_shutdown"
        );
    }
}

/// Tile visited at `step` on a clockwise loop around the facet, inset by
/// the patrol margin. Facets too small for a loop pin the player to the
/// centre.
fn patrol_position(step: u64, width_tiles: i32, height_tiles: i32) -> (i32, i32) {
    let left = PATROL_MARGIN;
    let top = PATROL_MARGIN;
    let right = width_tiles - 1 - PATROL_MARGIN;
    let bottom = height_tiles - 1 - PATROL_MARGIN;
    if right <= left || bottom <= top {
        return (width_tiles / 2, height_tiles / 2);
    }

    let span_x = (right - left) as u64;
    let span_y = (bottom - top) as u64;
    let perimeter = 2 * (span_x + span_y);
    let offset = step % perimeter;

    if offset < span_x {
        (left + offset as i32, top)
    } else if offset < span_x + span_y {
        (right, top + (offset - span_x) as i32)
    } else if offset < 2 * span_x + span_y {
        (right - (offset - span_x - span_y) as i32, bottom)
    } else {
        (left, bottom - (offset - 2 * span_x - span_y) as i32)
    }
}
