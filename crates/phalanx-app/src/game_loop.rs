//! Game loop: runs the simulation engine at 50Hz and summarizes the battle.
//!
//! Timed scenario orders are queued before the tick they are due at, so the
//! engine processes them at the tick boundary like any player command. With
//! real-time pacing the loop sleeps between ticks, adjusted for time scale.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use phalanx_core::constants::TICK_RATE;
use phalanx_core::enums::{GamePhase, UnitState};
use phalanx_core::events::SimEvent;
use phalanx_core::state::BattleSnapshot;
use phalanx_core::types::{SimTime, TeamId};
use phalanx_sim::unit::entity_id;

use crate::scenario::Battle;

/// Nominal duration of one tick at 1x speed.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on runner steps.
    pub ticks: u64,
    /// Sleep between ticks instead of running as fast as possible.
    pub realtime: bool,
    /// Stop as soon as at most one team is left standing.
    pub stop_when_decided: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ticks: 3000,
            realtime: false,
            stop_when_decided: true,
        }
    }
}

/// Wall-clock length of a tick at `time_scale`.
pub fn effective_tick_duration(time_scale: f64) -> Duration {
    if time_scale > 0.001 {
        TICK_DURATION.div_f64(time_scale)
    } else {
        TICK_DURATION
    }
}

/// Sleeps until the next tick is due.
pub struct Pacer {
    next_tick_time: Instant,
}

impl Pacer {
    pub fn new() -> Self {
        Self {
            next_tick_time: Instant::now(),
        }
    }

    pub fn wait(&mut self, time_scale: f64) {
        let tick = effective_tick_duration(time_scale);
        self.next_tick_time += tick;
        let now = Instant::now();
        if self.next_tick_time > now {
            std::thread::sleep(self.next_tick_time - now);
        } else if now - self.next_tick_time > tick * 2 {
            // Too far behind: reset rather than spiral trying to catch up.
            self.next_tick_time = now;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Losses per team, accumulated from snapshot events.
#[derive(Debug, Default)]
struct Tally {
    unit_team: HashMap<u64, TeamId>,
    soldiers_lost: BTreeMap<TeamId, u32>,
    units_lost: BTreeMap<TeamId, u32>,
}

impl Tally {
    fn record(&mut self, snapshot: &BattleSnapshot) {
        for unit in &snapshot.units {
            self.unit_team.insert(unit.id, unit.team);
        }
        for event in &snapshot.events {
            match *event {
                SimEvent::UnitSpawned { unit, team } => {
                    self.unit_team.insert(unit, team);
                }
                SimEvent::SoldierKilled { unit, .. } => {
                    if let Some(team) = self.unit_team.get(&unit) {
                        *self.soldiers_lost.entry(*team).or_insert(0) += 1;
                    }
                }
                SimEvent::UnitDestroyed { team, .. } => {
                    *self.units_lost.entry(team).or_insert(0) += 1;
                }
                _ => {}
            }
        }
    }

    fn any_unit_lost(&self) -> bool {
        self.units_lost.values().any(|n| *n > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    pub units_alive: usize,
    pub soldiers_alive: usize,
    pub units_lost: u32,
    pub soldiers_lost: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub label: String,
    pub id: u64,
    pub team: Option<TeamId>,
    /// `None` once the unit has been destroyed.
    pub state: Option<UnitState>,
    pub soldiers_alive: usize,
}

/// How a run ended.
#[derive(Debug, Clone, Serialize)]
pub struct BattleSummary {
    pub steps: u64,
    pub time: SimTime,
    pub phase: GamePhase,
    /// At most one team is left standing after at least one unit fell.
    pub decided: bool,
    pub winner: Option<String>,
    pub teams: Vec<TeamSummary>,
    pub units: Vec<UnitSummary>,
}

impl BattleSummary {
    pub fn team(&self, name: &str) -> Option<&TeamSummary> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn unit(&self, label: &str) -> Option<&UnitSummary> {
        self.units.iter().find(|u| u.label == label)
    }
}

/// Alternate form (`{:#}`) also lists every placed unit.
impl fmt::Display for BattleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} steps, {:.2} s simulated, phase {:?}",
            self.steps, self.time.elapsed_secs, self.phase
        )?;
        match (&self.winner, self.decided) {
            (Some(winner), _) => writeln!(f, "winner: {winner}")?,
            (None, true) => writeln!(f, "no side left standing")?,
            (None, false) => writeln!(f, "undecided")?,
        }
        for team in &self.teams {
            writeln!(
                f,
                "  {:<8} units {:>2} alive / {:>2} lost, soldiers {:>3} alive / {:>3} lost",
                team.name, team.units_alive, team.units_lost, team.soldiers_alive, team.soldiers_lost
            )?;
        }
        if f.alternate() {
            for unit in &self.units {
                let state = unit
                    .state
                    .map_or_else(|| "destroyed".to_string(), |s| format!("{s:?}"));
                writeln!(
                    f,
                    "  {:<12} #{:<6} {:<10} {:>3} soldiers",
                    unit.label, unit.id, state, unit.soldiers_alive
                )?;
            }
        }
        Ok(())
    }
}

/// Run the battle for up to `options.ticks` steps.
pub fn run(battle: &mut Battle, options: &RunOptions) -> BattleSummary {
    let mut tally = Tally::default();
    let mut pacer = options.realtime.then(Pacer::new);
    let mut last = None;
    let mut steps = 0;

    for step in 0..options.ticks {
        // 1. Orders due at this step
        let due = battle.plan.take_due(step);
        battle.engine.queue_commands(due);

        // 2. Advance one tick (engine handles deployment and pause)
        let snapshot = battle.engine.tick();
        steps = step + 1;
        tally.record(&snapshot);

        if options.stop_when_decided && is_decided(&snapshot, &tally) {
            info!(step, tick = snapshot.time.tick, "battle decided");
            last = Some(snapshot);
            break;
        }

        // 3. Sleep until the next tick
        if let Some(pacer) = pacer.as_mut() {
            pacer.wait(snapshot.time_scale);
        }
        last = Some(snapshot);
    }

    let snapshot = match last {
        Some(snapshot) => snapshot,
        None => battle.engine.snapshot(),
    };
    let summary = summarize(battle, &snapshot, steps, &tally);
    info!(
        steps = summary.steps,
        decided = summary.decided,
        winner = summary.winner.as_deref().unwrap_or("none"),
        "run finished"
    );
    summary
}

fn standing_teams(snapshot: &BattleSnapshot) -> usize {
    snapshot.teams.iter().filter(|t| t.units_alive > 0).count()
}

fn is_decided(snapshot: &BattleSnapshot, tally: &Tally) -> bool {
    snapshot.phase != GamePhase::Deployment && tally.any_unit_lost() && standing_teams(snapshot) <= 1
}

fn summarize(battle: &Battle, snapshot: &BattleSnapshot, steps: u64, tally: &Tally) -> BattleSummary {
    let decided = is_decided(snapshot, tally);
    let winner = if decided {
        snapshot
            .teams
            .iter()
            .find(|t| t.units_alive > 0)
            .map(|t| t.name.clone())
    } else {
        None
    };

    let teams = snapshot
        .teams
        .iter()
        .map(|team| TeamSummary {
            id: team.id,
            name: team.name.clone(),
            units_alive: team.units_alive,
            soldiers_alive: snapshot
                .units
                .iter()
                .filter(|u| u.team == team.id)
                .map(|u| u.soldiers_alive)
                .sum(),
            units_lost: tally.units_lost.get(&team.id).copied().unwrap_or(0),
            soldiers_lost: tally.soldiers_lost.get(&team.id).copied().unwrap_or(0),
        })
        .collect();

    let units = battle
        .labels
        .iter()
        .map(|(label, entity)| {
            let id = entity_id(*entity);
            let view = snapshot.units.iter().find(|u| u.id == id);
            UnitSummary {
                label: label.clone(),
                id,
                team: tally.unit_team.get(&id).copied(),
                state: view.map(|u| u.state),
                soldiers_alive: view.map_or(0, |u| u.soldiers_alive),
            }
        })
        .collect();

    BattleSummary {
        steps,
        time: snapshot.time,
        phase: snapshot.phase,
        decided,
        winner,
        teams,
        units,
    }
}
