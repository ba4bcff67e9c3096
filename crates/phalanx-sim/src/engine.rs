//! Simulation engine: the core of the battle.
//!
//! `SimulationEngine` owns the hecs ECS world, processes player commands,
//! runs all systems, and produces `BattleSnapshot`s. Completely headless,
//! enabling deterministic testing.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use glam::DVec3;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use phalanx_agent::profiles::{AgentProfile, UnitProfile};
use phalanx_core::commands::PlayerCommand;
use phalanx_core::constants::{MAX_TIME_SCALE, UNITS_PER_TEAM};
use phalanx_core::enums::{CommandKind, GamePhase};
use phalanx_core::events::SimEvent;
use phalanx_core::state::BattleSnapshot;
use phalanx_core::types::{Rgb, SimTime, Team, TeamId};

use crate::components::UnitController;
use crate::error::SimError;
use crate::selection;
use crate::spatial::SpatialIndex;
use crate::systems;
use crate::systems::snapshot::SnapshotContext;
use crate::systems::soldier::{Strike, UnitReport};
use crate::unit::{self, entity_from_id, entity_id};
use crate::world_setup::{self, UnitSpawn};

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Initial time scale (1.0 = normal).
    pub time_scale: f64,
    /// The single soldier profile.
    pub agent: AgentProfile,
    /// Roster size and formation layout of every unit.
    pub unit: UnitProfile,
    /// Placement budget per team.
    pub units_per_team: u32,
    pub teams: Vec<Team>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_scale: 1.0,
            agent: AgentProfile::default(),
            unit: UnitProfile::default(),
            units_per_team: UNITS_PER_TEAM,
            teams: vec![
                Team::new(1, "Blue", Rgb(40, 90, 220)),
                Team::new(2, "Red", Rgb(210, 45, 45)),
            ],
        }
    }
}

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    world: World,
    time: SimTime,
    phase: GamePhase,
    time_scale: f64,
    config: SimConfig,
    remaining: BTreeMap<TeamId, u32>,
    next_serial: u64,
    selected: Option<Entity>,
    command_queue: VecDeque<PlayerCommand>,
    events: Vec<SimEvent>,

    // --- Per-tick buffers ---
    index: SpatialIndex,
    reports: HashMap<Entity, UnitReport>,
    strikes: Vec<Strike>,
    shrunk: HashSet<Entity>,
    despawn_buffer: Vec<Entity>,
}

impl SimulationEngine {
    /// Create a new simulation engine with the given config.
    pub fn new(config: SimConfig) -> Self {
        let remaining = placement_budget(&config);
        Self {
            world: World::new(),
            time: SimTime::default(),
            phase: GamePhase::default(),
            time_scale: config.time_scale.clamp(0.0, MAX_TIME_SCALE),
            remaining,
            next_serial: 0,
            selected: None,
            command_queue: VecDeque::new(),
            events: Vec::new(),
            index: SpatialIndex::default(),
            reports: HashMap::new(),
            strikes: Vec::new(),
            shrunk: HashSet::new(),
            despawn_buffer: Vec::new(),
            config,
        }
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    /// A zero time scale holds the world still, like a pause.
    pub fn tick(&mut self) -> BattleSnapshot {
        self.process_commands();

        if self.is_playing() && self.time_scale > 0.0 {
            self.run_systems();
            self.time.advance();
        }

        self.snapshot()
    }

    /// Snapshot of the current state. Drains pending events.
    pub fn snapshot(&mut self) -> BattleSnapshot {
        let events = std::mem::take(&mut self.events);
        let ctx = SnapshotContext {
            time: self.time,
            phase: self.phase,
            time_scale: self.time_scale,
            teams: &self.config.teams,
            remaining: &self.remaining,
            selected: self.selected,
        };
        systems::snapshot::build_snapshot(&self.world, &ctx, events)
    }

    /// Place a unit of `team` fighting `enemy_team` around `position`.
    /// Only allowed during deployment, within the team's placement budget.
    pub fn spawn_unit(
        &mut self,
        team: TeamId,
        enemy_team: TeamId,
        position: DVec3,
        color: Rgb,
    ) -> Result<Entity, SimError> {
        if self.phase != GamePhase::Deployment {
            return Err(SimError::NotDeploying);
        }
        for id in [team, enemy_team] {
            if !self.config.teams.iter().any(|t| t.id == id) {
                return Err(SimError::UnknownTeam(id));
            }
        }
        let spawn = UnitSpawn {
            team,
            enemy_team,
            position,
            color,
        };
        world_setup::validate(&spawn, &self.config.unit)?;
        let remaining = self.remaining.entry(team).or_insert(0);
        if *remaining == 0 {
            return Err(SimError::NoUnitsRemaining(team));
        }

        let unit = world_setup::spawn_unit(
            &mut self.world,
            &spawn,
            &self.config.unit,
            &self.config.agent,
            self.config.seed,
            &mut self.next_serial,
        )?;
        *remaining -= 1;

        debug!(unit = entity_id(unit), ?team, ?position, "unit spawned");
        self.events.push(SimEvent::UnitSpawned {
            unit: entity_id(unit),
            team,
        });
        Ok(unit)
    }

    /// Place a unit in its team's color.
    pub fn spawn_team_unit(
        &mut self,
        team: TeamId,
        enemy_team: TeamId,
        position: DVec3,
    ) -> Result<Entity, SimError> {
        let color = self
            .team(team)
            .map(|t| t.color)
            .ok_or(SimError::UnknownTeam(team))?;
        self.spawn_unit(team, enemy_team, position, color)
    }

    /// Place a static obstacle.
    pub fn spawn_obstacle(&mut self, position: DVec3) -> Entity {
        world_setup::spawn_obstacle(&mut self.world, position)
    }

    /// Order a unit directly, bypassing the command queue. Returns false if
    /// the unit does not exist.
    pub fn give_command(
        &mut self,
        unit: Entity,
        kind: CommandKind,
        position: DVec3,
        enemy: Option<Entity>,
    ) -> bool {
        unit::give_command(&mut self.world, unit, kind, position, enemy, &mut self.events)
    }

    /// Whether the simulation advances on `tick`.
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Active
    }

    /// Units `team` may still place.
    pub fn remaining_units_to_place(&self, team: TeamId) -> u32 {
        self.remaining.get(&team).copied().unwrap_or(0)
    }

    /// Unit whose bounds contain `point`, if any.
    pub fn pick_unit(&self, point: DVec3) -> Option<Entity> {
        selection::pick_unit(&self.world, point)
    }

    /// Get the current game phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Get the current time scale.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn selected_unit(&self) -> Option<Entity> {
        self.selected
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.config.teams.iter().find(|t| t.id == id)
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for tests that need to stage damage.
    #[cfg(test)]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Live units of a team, in id order.
    pub fn units_of(&self, team: TeamId) -> Vec<Entity> {
        let mut units: Vec<Entity> = self
            .world
            .query::<&UnitController>()
            .iter()
            .filter(|(_, c)| c.team == team)
            .map(|(entity, _)| entity)
            .collect();
        units.sort_by_key(|e| entity_id(*e));
        units
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Order {
                unit,
                kind,
                position,
                enemy,
            } => {
                let enemy = enemy.and_then(entity_from_id);
                let accepted = entity_from_id(unit)
                    .is_some_and(|u| self.give_command(u, kind, position, enemy));
                if !accepted {
                    warn!(unit, ?kind, "order for a unit that no longer exists");
                }
            }
            PlayerCommand::HoverUnit { unit, hovered } => {
                if let Some(unit) = entity_from_id(unit) {
                    selection::toggle_selector(&mut self.world, unit, hovered, self.selected);
                }
            }
            PlayerCommand::SelectUnit { unit } => {
                let selected = entity_from_id(unit)
                    .is_some_and(|u| selection::on_select(&mut self.world, &mut self.selected, u));
                if !selected {
                    warn!(unit, "selection of a unit that no longer exists");
                }
            }
            PlayerCommand::ClearSelection => {
                selection::clear(&mut self.world, &mut self.selected);
            }
            PlayerCommand::Fight => {
                if self.phase == GamePhase::Deployment {
                    self.set_phase(GamePhase::Active);
                }
            }
            PlayerCommand::Pause => {
                if self.phase == GamePhase::Active {
                    self.set_phase(GamePhase::Paused);
                }
            }
            PlayerCommand::Resume => {
                if self.phase == GamePhase::Paused {
                    self.set_phase(GamePhase::Active);
                }
            }
            PlayerCommand::Reset => self.reset(),
            PlayerCommand::SetTimeScale { scale } => {
                self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
            }
        }
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        info!(?from, ?to, "phase changed");
        self.events.push(SimEvent::PhaseChanged { from, to });
    }

    /// Clear the battlefield and return to deployment with full budgets.
    fn reset(&mut self) {
        self.world.clear();
        self.time = SimTime::default();
        self.remaining = placement_budget(&self.config);
        self.next_serial = 0;
        self.selected = None;
        self.reports.clear();
        self.strikes.clear();
        self.shrunk.clear();
        self.set_phase(GamePhase::Deployment);
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        // 1. Spatial index from committed positions
        self.index.rebuild(&self.world);
        // 2. Soldier FSM (evaluate all, then commit own state and unit counters)
        systems::soldier::run(
            &mut self.world,
            &self.index,
            &self.config.agent,
            &mut self.reports,
            &mut self.strikes,
        );
        // 3. Buffered melee damage
        systems::combat::run(&mut self.world, &mut self.strikes);
        // 4. Death cascade
        let destroyed = systems::cleanup::run(
            &mut self.world,
            &mut self.despawn_buffer,
            &mut self.shrunk,
            &mut self.events,
        );
        if self.selected.is_some_and(|s| destroyed.contains(&s)) {
            self.selected = None;
        }
        for unit in destroyed {
            self.reports.remove(&unit);
        }
        // 5. Movement integration
        systems::movement::run(&mut self.world);
        // 6. Unit aggregation (after every soldier has committed)
        systems::aggregate::run(&mut self.world, &mut self.reports, &self.shrunk, &mut self.events);
        self.reports.clear();
        self.shrunk.clear();
    }
}

fn placement_budget(config: &SimConfig) -> BTreeMap<TeamId, u32> {
    config
        .teams
        .iter()
        .map(|t| (t.id, config.units_per_team))
        .collect()
}
