//! Battle scenarios.
//!
//! A scenario is a JSON document naming the teams, the obstacles, the units
//! to place and a list of timed orders. Units are referred to by label; the
//! labels are resolved to engine unit ids when the battle is built.
//!
//! Order ticks count runner steps from the start of the run, including the
//! steps spent in deployment before `fight_at_tick`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use glam::DVec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use phalanx_agent::profiles::{AgentProfile, UnitProfile};
use phalanx_core::commands::PlayerCommand;
use phalanx_core::enums::CommandKind;
use phalanx_core::types::{Team, TeamId};
use phalanx_sim::unit::entity_id;
use phalanx_sim::{SimConfig, SimError, SimulationEngine};

/// The bundled two-on-two skirmish, used when no scenario file is given.
pub const SKIRMISH: &str = include_str!("../../../scenarios/skirmish.json");

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unit label '{0}' is used twice")]
    DuplicateLabel(String),

    #[error("no unit is labelled '{0}'")]
    UnknownLabel(String),

    #[error("unit '{0}' has no enemy team to fight")]
    NoEnemyTeam(String),

    #[error("cannot place unit '{label}': {source}")]
    Placement {
        label: String,
        #[source]
        source: SimError,
    },
}

/// A unit to place before the battle starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPlacement {
    pub label: String,
    pub team: TeamId,
    /// Defaults to the first other team of the scenario.
    #[serde(default)]
    pub enemy_team: Option<TeamId>,
    /// Formation center.
    pub position: DVec3,
}

/// An order issued at a given runner step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedOrder {
    pub tick: u64,
    pub unit: String,
    pub kind: CommandKind,
    pub position: DVec3,
    /// Label of the enemy unit, for attack orders.
    #[serde(default)]
    pub enemy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub time_scale: f64,
    /// Runner steps to execute.
    pub ticks: u64,
    /// Step at which deployment ends and the battle starts.
    pub fight_at_tick: u64,
    /// Placement budget per team; the engine default when absent.
    pub units_per_team: Option<u32>,
    pub agent: AgentProfile,
    pub unit: UnitProfile,
    pub teams: Vec<Team>,
    pub obstacles: Vec<DVec3>,
    pub units: Vec<UnitPlacement>,
    pub orders: Vec<TimedOrder>,
}

impl Default for Scenario {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            name: "skirmish".into(),
            seed: config.seed,
            time_scale: config.time_scale,
            ticks: 3000,
            fight_at_tick: 0,
            units_per_team: None,
            agent: config.agent,
            unit: config.unit,
            teams: config.teams,
            obstacles: Vec::new(),
            units: Vec::new(),
            orders: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn skirmish() -> Result<Self, ScenarioError> {
        Self::from_json(SKIRMISH)
    }

    /// Engine configuration for this scenario.
    pub fn config(&self) -> SimConfig {
        let defaults = SimConfig::default();
        SimConfig {
            seed: self.seed,
            time_scale: self.time_scale,
            agent: self.agent.clone(),
            unit: self.unit.clone(),
            units_per_team: self.units_per_team.unwrap_or(defaults.units_per_team),
            teams: self.teams.clone(),
        }
    }

    /// Create the engine, place obstacles and units, and resolve the orders.
    pub fn build(&self) -> Result<Battle, ScenarioError> {
        let mut engine = SimulationEngine::new(self.config());
        for &obstacle in &self.obstacles {
            engine.spawn_obstacle(obstacle);
        }

        let mut labels = BTreeMap::new();
        for placement in &self.units {
            if labels.contains_key(&placement.label) {
                return Err(ScenarioError::DuplicateLabel(placement.label.clone()));
            }
            let enemy_team = match placement.enemy_team {
                Some(team) => team,
                None => self
                    .teams
                    .iter()
                    .map(|t| t.id)
                    .find(|id| *id != placement.team)
                    .ok_or_else(|| ScenarioError::NoEnemyTeam(placement.label.clone()))?,
            };
            let unit = engine
                .spawn_team_unit(placement.team, enemy_team, placement.position)
                .map_err(|source| ScenarioError::Placement {
                    label: placement.label.clone(),
                    source,
                })?;
            debug!(label = %placement.label, unit = entity_id(unit), "unit placed");
            labels.insert(placement.label.clone(), unit);
        }

        let mut plan = OrderPlan::default();
        plan.push(self.fight_at_tick, PlayerCommand::Fight);
        for order in &self.orders {
            let unit = resolve(&labels, &order.unit)?;
            let enemy = order
                .enemy
                .as_deref()
                .map(|label| resolve(&labels, label))
                .transpose()?;
            plan.push(
                order.tick,
                PlayerCommand::Order {
                    unit: entity_id(unit),
                    kind: order.kind,
                    position: order.position,
                    enemy: enemy.map(entity_id),
                },
            );
        }

        info!(
            scenario = %self.name,
            units = labels.len(),
            obstacles = self.obstacles.len(),
            orders = self.orders.len(),
            "scenario built"
        );
        Ok(Battle {
            engine,
            labels,
            plan,
        })
    }
}

fn resolve(labels: &BTreeMap<String, Entity>, label: &str) -> Result<Entity, ScenarioError> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
}

/// Commands keyed by the runner step they are due at. Commands due at the
/// same step keep their scenario order.
#[derive(Debug, Default)]
pub struct OrderPlan {
    due: BTreeMap<u64, Vec<PlayerCommand>>,
}

impl OrderPlan {
    pub fn push(&mut self, tick: u64, command: PlayerCommand) {
        self.due.entry(tick).or_default().push(command);
    }

    /// Remove and return everything due at `tick`.
    pub fn take_due(&mut self, tick: u64) -> Vec<PlayerCommand> {
        self.due.remove(&tick).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.due.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}

/// A built scenario, ready to run.
pub struct Battle {
    pub engine: SimulationEngine,
    /// Scenario label of every placed unit.
    pub labels: BTreeMap<String, Entity>,
    pub plan: OrderPlan,
}

impl Battle {
    /// Label of a unit by engine id.
    pub fn label_of(&self, unit: u64) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, entity)| entity_id(**entity) == unit)
            .map(|(label, _)| label.as_str())
    }

    /// Teams with at least one placed unit.
    pub fn deployed_teams(&self) -> HashSet<TeamId> {
        self.labels
            .values()
            .filter_map(|unit| {
                self.engine
                    .world()
                    .get::<&phalanx_sim::components::UnitController>(*unit)
                    .ok()
                    .map(|c| c.team)
            })
            .collect()
    }
}
