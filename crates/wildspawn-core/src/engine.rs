//! The spawn engine: one object owning every shared structure.
//!
//! [`SpawnEngine`] holds the player roster and queues, the live-spawn
//! arena, the recycle pool, the staging list and the deletion queue, and
//! exposes the three periodic sweeps as plain synchronous methods:
//!
//! - [`SpawnEngine::dispatch_tick`] -- place one queued candidate per player
//!   in the current batch, then replenish that player's queue.
//! - [`SpawnEngine::distance_sweep`] -- recompute the `too_far` flag of every
//!   live spawn. Classification only.
//! - [`SpawnEngine::cleanup_sweep`] -- retire invalid and too-far spawns into
//!   the pool or the deletion queue, then drain the deletion queue.
//!
//! Nothing here locks. The scheduler owns the engine on a single task, so
//! every sweep and every login/logout is serialized by construction. An
//! entity is in at most one of live spawns, recycle pool, staging list and
//! deletion queue at any time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use wildspawn_types::{EntityId, MapId, PlayerId, Point3D};

use crate::aggro::{AggroContext, AggroPolicy, DefaultAggroPolicy};
use crate::clock::{GameClock, SystemClock, TimeBuckets};
use crate::config::{EngineConfig, SpawnSettings, WorldConfig};
use crate::dice::{Dice, RngDice};
use crate::error::EngineError;
use crate::generator::{GenerationSkip, SpawnPointGenerator};
use crate::live::{LiveSpawns, SweepAction};
use crate::metrics::{EngineGauges, MetricsSnapshot, SpawnMetrics, bump};
use crate::recycle::RecyclePool;
use crate::registry::{CreatureBlueprint, CreatureRole, TypeCache, TypeRegistry};
use crate::resolver::{ResolveContext, RuleResolver};
use crate::roster::{Player, PlayerRoster, SpawnCandidate};
use crate::rules::SpawnRuleStore;
use crate::world::{EntityState, WorldHost};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Outcome of one dispatch tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Players visited in this batch.
    pub players_visited: usize,
    /// Creatures placed into the world.
    pub placed: usize,
    /// Candidates added to queues.
    pub queued: usize,
    /// The batch completed a full pass over the roster.
    pub pass_completed: bool,
    /// Report of the supplementary cleanup, if the backlog triggered one.
    pub backlog_cleanup: Option<CleanupReport>,
}

/// Outcome of one distance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistanceReport {
    /// Live spawns examined.
    pub checked: usize,
    /// Live spawns now flagged too far.
    pub too_far: usize,
    /// Of those, entries whose entity is gone or deleted.
    pub invalid: usize,
    /// Valid players the sweep measured against.
    pub valid_players: usize,
}

/// Outcome of one cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    /// Entries dropped because the entity was gone or deleted.
    pub invalid_removed: usize,
    /// Entities moved into the recycle pool.
    pub recycled: usize,
    /// Entities moved into the deletion queue.
    pub queued_for_deletion: usize,
    /// Entities permanently deleted.
    pub deleted: usize,
    /// Staged entities drained.
    pub staged_drained: usize,
    /// Pooled entities deleted by a forced cleanup.
    pub pool_cleared: usize,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

impl CleanupReport {
    /// Whether the sweep moved anything.
    pub const fn is_idle(&self) -> bool {
        self.invalid_removed == 0
            && self.recycled == 0
            && self.queued_for_deletion == 0
            && self.deleted == 0
            && self.staged_drained == 0
            && self.pool_cleared == 0
    }
}

/// Where a materialized creature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeSource {
    /// Reused from the staging list.
    Staged,
    /// Reused from the recycle pool.
    Pool,
    /// Newly built by the host.
    Created,
}

/// An entity removed from the world whose placement failed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StagedEntity {
    entity: EntityId,
    type_name: String,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Proximity spawn engine over a world host `H`.
pub struct SpawnEngine<H> {
    host: H,
    rules: Arc<SpawnRuleStore>,
    world: WorldConfig,
    settings: SpawnSettings,
    registry: TypeRegistry,
    types: TypeCache,
    resolver: RuleResolver,
    dice: Box<dyn Dice>,
    clock: Arc<dyn GameClock>,
    buckets: TimeBuckets,
    aggro: Box<dyn AggroPolicy>,
    roster: PlayerRoster,
    live: LiveSpawns,
    pool: RecyclePool,
    staging: Vec<StagedEntity>,
    deletion: Vec<EntityId>,
    metrics: SpawnMetrics,
}

impl<H> core::fmt::Debug for SpawnEngine<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpawnEngine")
            .field("players", &self.roster.len())
            .field("live", &self.live.len())
            .field("pooled", &self.pool.len())
            .field("staged", &self.staging.len())
            .field("rules", &self.rules.rule_count())
            .finish_non_exhaustive()
    }
}

impl<H: WorldHost> SpawnEngine<H> {
    /// Build an engine from validated configuration.
    ///
    /// Uses a seeded [`RngDice`], the [`SystemClock`] and the
    /// [`DefaultAggroPolicy`]; swap them with the `with_*` methods.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation.
    pub fn new(
        config: &EngineConfig,
        host: H,
        registry: TypeRegistry,
        rules: SpawnRuleStore,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let buckets = TimeBuckets::new(&config.time.bucket_start_hours)?;

        let engine = Self {
            host,
            rules: Arc::new(rules),
            world: config.world.clone(),
            settings: config.spawn.clone(),
            registry,
            types: TypeCache::new(),
            resolver: RuleResolver::new(config.world.placeholder_type.clone()),
            dice: Box::new(RngDice::seeded(config.world.seed)),
            clock: Arc::new(SystemClock),
            buckets,
            aggro: Box::new(DefaultAggroPolicy),
            roster: PlayerRoster::new(),
            live: LiveSpawns::new(),
            pool: RecyclePool::new(config.recycle),
            staging: Vec::new(),
            deletion: Vec::new(),
            metrics: SpawnMetrics::new(),
        };
        engine.warn_unresolvable_names();

        info!(
            rules = engine.rules.rule_count(),
            types = engine.registry.len(),
            max_mobs = engine.settings.max_mobs,
            max_range = engine.settings.max_range,
            "spawn engine ready"
        );
        Ok(engine)
    }

    /// Replace the dice.
    #[must_use]
    pub fn with_dice(mut self, dice: Box<dyn Dice>) -> Self {
        self.dice = dice;
        self
    }

    /// Replace the game clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn GameClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the aggro policy.
    #[must_use]
    pub fn with_aggro(mut self, aggro: Box<dyn AggroPolicy>) -> Self {
        self.aggro = aggro;
        self
    }

    // -----------------------------------------------------------------------
    // Roster events
    // -----------------------------------------------------------------------

    /// Start tracking `player`. Returns false if it was already tracked.
    pub fn login(&mut self, player: Player) -> bool {
        let id = player.id;
        let added = self.roster.login(player);
        debug!(player = %id, added, "player login");
        added
    }

    /// Stop tracking `id` and discard its queue. Returns the number of
    /// candidates dropped, or `None` if the player was unknown.
    pub fn logout(&mut self, id: PlayerId) -> Option<usize> {
        let dropped = self.roster.logout(id);
        if let Some(dropped) = dropped {
            debug!(player = %id, dropped, "player logout");
        }
        dropped
    }

    /// Update a tracked player's position. Moving to [`MapId::INTERNAL`]
    /// parks the player without logging out.
    pub fn move_player(&mut self, id: PlayerId, map: MapId, location: Point3D) -> bool {
        self.roster.move_player(id, map, location)
    }

    // -----------------------------------------------------------------------
    // Reconfiguration
    // -----------------------------------------------------------------------

    /// Replace the whole rule table. Queued candidates naming types that no
    /// longer resolve fall back softly at dispatch time.
    pub fn reload_rules(&mut self, rules: SpawnRuleStore) {
        self.rules = Arc::new(rules);
        self.warn_unresolvable_names();
        info!(rules = self.rules.rule_count(), "spawn rules reloaded");
    }

    /// Replace the spawn settings. Takes effect on the next sweep.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] and keeps the old settings if the new
    /// ones fail validation.
    pub fn update_settings(&mut self, settings: SpawnSettings) -> Result<(), EngineError> {
        settings.validate()?;
        self.settings = settings;
        info!(
            max_mobs = self.settings.max_mobs,
            min_range = self.settings.min_range,
            max_range = self.settings.max_range,
            difficulty = self.settings.difficulty,
            "spawn settings updated"
        );
        Ok(())
    }

    fn warn_unresolvable_names(&self) {
        for name in self.rules.referenced_names() {
            if let Err(e) = self.registry.resolve(&name) {
                warn!(name, error = %e, "spawn rule names a type that cannot be built");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run one dispatch tick over the next batch of players.
    ///
    /// For each valid player: place the first queued candidate still in
    /// range (when the queue is above `min_queued`), then generate one new
    /// candidate. When the batch wraps the roster and the retirement
    /// backlog exceeds `max_mobs` times the player count, a cleanup sweep
    /// runs immediately.
    ///
    /// # Errors
    ///
    /// Per-player failures are logged and skipped; this currently always
    /// returns `Ok`.
    pub fn dispatch_tick(&mut self) -> Result<DispatchReport, EngineError> {
        bump(&mut self.metrics.counters_mut().dispatch_ticks, 1);
        let batch = self.roster.next_batch(self.settings.dispatch_batch);
        let mut report = DispatchReport {
            pass_completed: batch.pass_completed,
            ..DispatchReport::default()
        };

        for id in batch.players {
            let Some(player) = self.roster.get(id).map(|t| t.player.clone()) else {
                continue;
            };
            if !player.is_valid() {
                continue;
            }
            report.players_visited = report.players_visited.saturating_add(1);

            match self.dispatch_for(&player) {
                Ok(Some(_)) => report.placed = report.placed.saturating_add(1),
                Ok(None) => {}
                Err(e) => {
                    bump(&mut self.metrics.counters_mut().sweep_errors, 1);
                    warn!(player = %player.id, error = %e, "dispatch failed for player");
                }
            }
            if self.replenish(&player) {
                report.queued = report.queued.saturating_add(1);
            }
        }

        if batch.pass_completed {
            report.backlog_cleanup = self.backlog_check();
        }
        Ok(report)
    }

    /// Entities waiting to be retired: too-far live spawns, staged entities,
    /// and the deletion queue.
    pub fn retirement_backlog(&self) -> usize {
        self.live
            .too_far_count()
            .saturating_add(self.staging.len())
            .saturating_add(self.deletion.len())
    }

    fn backlog_check(&mut self) -> Option<CleanupReport> {
        let backlog = self.retirement_backlog();
        let max_mobs = usize::try_from(self.settings.max_mobs).unwrap_or(usize::MAX);
        let threshold = max_mobs.saturating_mul(self.roster.len());
        if backlog <= threshold {
            return None;
        }
        bump(&mut self.metrics.counters_mut().backlog_cleanups, 1);
        info!(backlog, threshold, "retirement backlog over threshold, cleaning up now");
        Some(self.cleanup_sweep())
    }

    fn dispatch_for(&mut self, player: &Player) -> Result<Option<EntityId>, EngineError> {
        let min_queued = self.settings.min_queued;
        let range = self.settings.despawn_range();
        let Some(tracked) = self.roster.get_mut(player.id) else {
            return Ok(None);
        };
        if tracked.queue.len() <= min_queued {
            return Ok(None);
        }
        let (candidate, discarded) =
            tracked
                .queue
                .take_first_in_range(player.map, player.location, range);
        bump(&mut self.metrics.counters_mut().candidates_discarded, discarded);

        match candidate {
            Some(candidate) => self.spawn_candidate(player, &candidate),
            None => Ok(None),
        }
    }

    /// Materialize and place one candidate for `player`.
    fn spawn_candidate(
        &mut self,
        player: &Player,
        candidate: &SpawnCandidate,
    ) -> Result<Option<EntityId>, EngineError> {
        let handle = self
            .types
            .handle(&self.registry, &candidate.name, &self.world.fallback_type)?;
        if handle.substituted {
            bump(&mut self.metrics.counters_mut().type_fallbacks, 1);
        }
        if !self.role_enabled(handle.blueprint.role) {
            bump(&mut self.metrics.counters_mut().candidates_dropped_role, 1);
            debug!(name = %candidate.name, role = ?handle.blueprint.role, "role disabled, dropping candidate");
            return Ok(None);
        }

        let (entity, source, substitute) = self.materialize(&handle.blueprint)?;
        let blueprint = substitute.as_ref().unwrap_or(&handle.blueprint);
        let (map, location) = (candidate.map, candidate.location);

        self.host.before_spawn(entity, map, location);
        if let Err(e) = self.host.move_to_world(entity, map, location) {
            bump(&mut self.metrics.counters_mut().placement_failures, 1);
            warn!(%entity, %map, %location, error = %e, "placement failed, staging entity");
            self.staging.push(StagedEntity {
                entity,
                type_name: blueprint.type_name.clone(),
            });
            return Ok(None);
        }
        self.host.set_invulnerable(entity, false);
        self.host.placement_effect(map, location);
        self.host.after_spawn(entity);
        self.live.push(entity, &blueprint.type_name);

        let map_rules = self.host.map_rules(map);
        let engage = self.aggro.should_engage(&AggroContext {
            player,
            blueprint,
            map_rules,
        });
        if engage {
            self.host.set_combatant(entity, player.id);
        }

        debug!(
            %entity,
            type_name = %blueprint.type_name,
            %map,
            %location,
            source = ?source,
            engage,
            "spawn placed"
        );
        Ok(Some(entity))
    }

    const fn role_enabled(&self, role: CreatureRole) -> bool {
        match role {
            CreatureRole::Creature => true,
            CreatureRole::Vendor => self.settings.features.vendor_spawn,
            CreatureRole::Rift => self.settings.features.rift_spawn,
        }
    }

    /// Produce an out-of-world creature for `blueprint`: staging list first,
    /// then the recycle pool, then a fresh build.
    ///
    /// The third element is the fallback blueprint when the host could not
    /// build `blueprint` and the filler type stands in for it.
    fn materialize(
        &mut self,
        blueprint: &CreatureBlueprint,
    ) -> Result<(EntityId, MaterializeSource, Option<CreatureBlueprint>), EngineError> {
        let (entity, source, substitute) =
            if let Some(entity) = self.take_staged(&blueprint.type_name) {
                bump(&mut self.metrics.counters_mut().spawns_reused_staged, 1);
                (entity, MaterializeSource::Staged, None)
            } else if let Some(entity) = self.take_pooled(&blueprint.type_name) {
                bump(&mut self.metrics.counters_mut().spawns_reused_pool, 1);
                (entity, MaterializeSource::Pool, None)
            } else {
                let (entity, substitute) = self.create_or_fallback(blueprint)?;
                bump(&mut self.metrics.counters_mut().spawns_created, 1);
                (entity, MaterializeSource::Created, substitute)
            };

        let difficulty = self.settings.difficulty;
        if (difficulty - 1.0).abs() > f64::EPSILON {
            self.host.apply_difficulty(entity, difficulty);
        }
        Ok((entity, source, substitute))
    }

    /// Build `blueprint`, or the world's fallback type if the host refuses.
    /// Fails only when the fallback cannot be built either.
    fn create_or_fallback(
        &mut self,
        blueprint: &CreatureBlueprint,
    ) -> Result<(EntityId, Option<CreatureBlueprint>), EngineError> {
        let error = match self.host.create_creature(blueprint) {
            Ok(entity) => return Ok((entity, None)),
            Err(e) => e,
        };
        let fallback = self.registry.resolve(&self.world.fallback_type)?;
        if fallback.type_name == blueprint.type_name {
            return Err(error.into());
        }

        warn!(
            type_name = %blueprint.type_name,
            fallback = %fallback.type_name,
            error = %error,
            "creature construction failed, substituting fallback"
        );
        bump(&mut self.metrics.counters_mut().type_fallbacks, 1);
        let entity = self.host.create_creature(&fallback)?;
        Ok((entity, Some(fallback)))
    }

    fn take_staged(&mut self, type_name: &str) -> Option<EntityId> {
        while let Some(idx) = self.staging.iter().position(|s| s.type_name == type_name) {
            let staged = self.staging.swap_remove(idx);
            if is_valid(&self.host, staged.entity) {
                return Some(staged.entity);
            }
            warn!(entity = %staged.entity, type_name, "discarding invalid staged entity");
            bump(&mut self.metrics.counters_mut().invalid_removed, 1);
        }
        None
    }

    fn take_pooled(&mut self, type_name: &str) -> Option<EntityId> {
        let before = self.pool.invalid_discarded();
        let entity = self.pool.try_get(&self.host, type_name);
        let discarded = self.pool.invalid_discarded().saturating_sub(before);
        let counters = self.metrics.counters_mut();
        counters.invalid_removed = counters.invalid_removed.saturating_add(discarded);
        entity
    }

    /// Generate one candidate for `player` if its queue has room. Returns
    /// true if a candidate was queued.
    fn replenish(&mut self, player: &Player) -> bool {
        let queued = self.roster.get(player.id).map_or(0, |t| t.queue.len());
        if queued >= self.settings.max_queued {
            return false;
        }

        let generator = SpawnPointGenerator::new(&self.settings);
        let point = match generator.generate(
            &self.host,
            self.dice.as_mut(),
            player.map,
            player.location,
        ) {
            Ok(point) => point,
            Err(GenerationSkip::PopulationCap) => {
                bump(&mut self.metrics.counters_mut().generation_skipped_cap, 1);
                return false;
            }
            Err(GenerationSkip::RetriesExhausted) => {
                bump(&mut self.metrics.counters_mut().generation_exhausted, 1);
                return false;
            }
        };

        let region = self.host.region_at(point.map, point.location);
        let tile = self.host.tile_name(point.map, point.location);
        let ctx = ResolveContext {
            map: point.map,
            location: point.location,
            region: region.as_deref(),
            tile: &tile,
            is_water: point.is_water,
            weather: self.host.weather_at(point.map, point.location),
            time: self.buckets.current(self.clock.as_ref()),
            staff_debug: player.staff && self.settings.features.debug,
        };
        let Some(resolution) =
            self.resolver
                .resolve(&self.rules, &self.settings.chances, &ctx, self.dice.as_mut())
        else {
            return false;
        };

        match self.roster.get_mut(player.id) {
            Some(tracked) => {
                tracked.queue.push(SpawnCandidate {
                    name: resolution.name,
                    map: point.map,
                    location: point.location,
                });
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Distance monitor
    // -----------------------------------------------------------------------

    /// Recompute `too_far` for every live spawn.
    ///
    /// A spawn is too far when its entity is gone or deleted, or when no
    /// valid player on its map is within `max_range * 1.5`. With no valid
    /// players everything is too far.
    pub fn distance_sweep(&mut self) -> DistanceReport {
        let anchors: Vec<(MapId, Point3D)> = self
            .roster
            .valid_players()
            .map(|p| (p.map, p.location))
            .collect();
        let range = self.settings.despawn_range();
        let mut report = DistanceReport {
            valid_players: anchors.len(),
            ..DistanceReport::default()
        };

        for spawn in self.live.iter_mut() {
            report.checked = report.checked.saturating_add(1);
            spawn.too_far = match self.host.entity_state(spawn.entity) {
                Some(state) if state.is_valid() => !anchors
                    .iter()
                    .any(|(map, at)| *map == state.map && at.in_range(&state.location, range)),
                _ => {
                    report.invalid = report.invalid.saturating_add(1);
                    true
                }
            };
            if spawn.too_far {
                report.too_far = report.too_far.saturating_add(1);
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Cleanup
    // -----------------------------------------------------------------------

    /// Retire invalid and too-far spawns and drain the deletion queue.
    ///
    /// Walks live spawns in reverse. Invalid entries are dropped. Too-far
    /// entries go to the recycle pool when alive and out of combat and the
    /// pool accepts them; otherwise to the deletion queue. Staged entities
    /// take the same route. The deletion queue is empty on return.
    pub fn cleanup_sweep(&mut self) -> CleanupReport {
        let started = Instant::now();
        let mut report = CleanupReport::default();

        let host = &mut self.host;
        let pool = &mut self.pool;
        let deletion = &mut self.deletion;
        self.live.sweep_rev(|spawn| {
            let Some(state) = host
                .entity_state(spawn.entity)
                .filter(EntityState::is_valid)
            else {
                warn!(entity = %spawn.entity, type_name = %spawn.type_name, "removing invalid live spawn");
                report.invalid_removed = report.invalid_removed.saturating_add(1);
                return SweepAction::Remove;
            };
            if !spawn.too_far {
                return SweepAction::Keep;
            }
            if state.is_recyclable() && pool.try_add(&mut *host, spawn.entity, &spawn.type_name).is_ok() {
                report.recycled = report.recycled.saturating_add(1);
            } else {
                deletion.push(spawn.entity);
                report.queued_for_deletion = report.queued_for_deletion.saturating_add(1);
            }
            SweepAction::Remove
        });

        for staged in std::mem::take(&mut self.staging) {
            report.staged_drained = report.staged_drained.saturating_add(1);
            let Some(state) = self
                .host
                .entity_state(staged.entity)
                .filter(EntityState::is_valid)
            else {
                warn!(entity = %staged.entity, type_name = %staged.type_name, "removing invalid staged entity");
                report.invalid_removed = report.invalid_removed.saturating_add(1);
                continue;
            };
            if state.is_recyclable()
                && self
                    .pool
                    .try_add(&mut self.host, staged.entity, &staged.type_name)
                    .is_ok()
            {
                report.recycled = report.recycled.saturating_add(1);
            } else {
                self.deletion.push(staged.entity);
                report.queued_for_deletion = report.queued_for_deletion.saturating_add(1);
            }
        }

        report.deleted = self.drain_deletions();
        report.elapsed = started.elapsed();
        self.record_cleanup(&report);

        if report.is_idle() {
            debug!(elapsed_ms = report.elapsed.as_millis(), "cleanup sweep idle");
        } else {
            info!(
                invalid_removed = report.invalid_removed,
                recycled = report.recycled,
                deleted = report.deleted,
                staged = report.staged_drained,
                live = self.live.len(),
                pooled = self.pool.len(),
                elapsed_ms = report.elapsed.as_millis(),
                "cleanup sweep"
            );
        }
        report
    }

    /// Tear everything down: delete every live, staged and pooled entity,
    /// empty all player queues. A second call finds nothing to do.
    pub fn forced_cleanup(&mut self) -> CleanupReport {
        let started = Instant::now();
        let mut report = CleanupReport::default();

        for spawn in self.live.drain_all() {
            if is_valid(&self.host, spawn.entity) {
                self.deletion.push(spawn.entity);
                report.queued_for_deletion = report.queued_for_deletion.saturating_add(1);
            } else {
                report.invalid_removed = report.invalid_removed.saturating_add(1);
            }
        }
        for staged in std::mem::take(&mut self.staging) {
            report.staged_drained = report.staged_drained.saturating_add(1);
            if is_valid(&self.host, staged.entity) {
                self.deletion.push(staged.entity);
                report.queued_for_deletion = report.queued_for_deletion.saturating_add(1);
            } else {
                report.invalid_removed = report.invalid_removed.saturating_add(1);
            }
        }
        report.deleted = self.drain_deletions();
        report.pool_cleared = self.pool.clear_all(&mut self.host);
        bump(&mut self.metrics.counters_mut().deletions, report.pool_cleared);
        self.roster.clear_queues();

        report.elapsed = started.elapsed();
        self.record_cleanup(&report);
        info!(
            deleted = report.deleted,
            pool_cleared = report.pool_cleared,
            invalid_removed = report.invalid_removed,
            elapsed_ms = report.elapsed.as_millis(),
            "forced cleanup complete"
        );
        report
    }

    fn drain_deletions(&mut self) -> usize {
        let mut deleted: usize = 0;
        for entity in self.deletion.drain(..) {
            self.host.delete(entity);
            deleted = deleted.saturating_add(1);
        }
        deleted
    }

    fn record_cleanup(&mut self, report: &CleanupReport) {
        let counters = self.metrics.counters_mut();
        bump(&mut counters.invalid_removed, report.invalid_removed);
        bump(&mut counters.recycled, report.recycled);
        bump(&mut counters.cleanup_additions, report.queued_for_deletion);
        bump(&mut counters.deletions, report.deleted);
        self.metrics.record_cleanup(report.elapsed);
    }

    /// Count a sweep that exceeded its period.
    pub fn record_overrun(&mut self) {
        bump(&mut self.metrics.counters_mut().sweep_overruns, 1);
    }

    /// Count a sweep that returned an error.
    pub fn record_sweep_error(&mut self) {
        bump(&mut self.metrics.counters_mut().sweep_errors, 1);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Counters, cleanup timings and current structure sizes.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(EngineGauges {
            players: self.roster.len(),
            queued: self.roster.queued_total(),
            live: self.live.len(),
            too_far: self.live.too_far_count(),
            pooled: self.pool.len(),
            staged: self.staging.len(),
        })
    }

    /// The world host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The world host, mutably.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current spawn settings.
    pub const fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// Current rule table.
    pub fn rules(&self) -> Arc<SpawnRuleStore> {
        Arc::clone(&self.rules)
    }

    /// Tracked players and queues.
    pub const fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    /// Tracked players and queues, mutably.
    pub const fn roster_mut(&mut self) -> &mut PlayerRoster {
        &mut self.roster
    }

    /// Live spawns.
    pub const fn live(&self) -> &LiveSpawns {
        &self.live
    }

    /// The recycle pool.
    pub const fn pool(&self) -> &RecyclePool {
        &self.pool
    }

    /// Entities in the staging list.
    pub fn staged(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.staging.iter().map(|s| s.entity)
    }

    /// Entities waiting in the deletion queue.
    pub fn pending_deletions(&self) -> &[EntityId] {
        &self.deletion
    }

    /// Register an entity already in the world as a live spawn of
    /// `type_name`. Returns false if it was already tracked.
    pub fn adopt(&mut self, entity: EntityId, type_name: &str) -> bool {
        if self.pool.contains(entity) || self.staging.iter().any(|s| s.entity == entity) {
            return false;
        }
        self.live.push(entity, type_name)
    }
}

fn is_valid<H: WorldHost>(host: &H, entity: EntityId) -> bool {
    host.entity_state(entity).is_some_and(|s| s.is_valid())
}
