//! YAML-described runs of the script host: who is placed where, which
//! outside inputs arrive when, and how long to simulate.

use crate::scripting::controller::Trigger;
use crate::scripts;
use crate::world::actor::{ActorKind, ActorRef, Effect, Entry};
use crate::world::host::ScriptHost;
use crate::world::position::Position;
use crate::world::sim::EffectRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const BUILTIN: &[(&str, &str)] = &[
    ("caribou-trap", include_str!("../scenarios/caribou_trap.yaml")),
    ("last-rites", include_str!("../scenarios/last_rites.yaml")),
    ("hidden-cultist", include_str!("../scenarios/hidden_cultist.yaml")),
    ("cannoneers", include_str!("../scenarios/cannoneers.yaml")),
    ("beryl-sorcerer", include_str!("../scenarios/beryl_sorcerer.yaml")),
];

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("read {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown scenario '{0}' (try `tundra list`)")]
    UnknownScenario(String),
    #[error("unknown creature or object '{0}'")]
    UnknownEntry(String),
    #[error("spawn label '{0}' used twice")]
    DuplicateLabel(String),
    #[error("trigger {index} targets '{name}', which is neither a spawn label nor a known entry")]
    UnknownActor { index: usize, name: String },
}

/// Creature entry given either by number or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryRef {
    Id(u32),
    Name(String),
}

impl EntryRef {
    pub fn resolve(&self) -> Result<Entry, ScenarioError> {
        match self {
            EntryRef::Id(id) => Ok(Entry(*id)),
            EntryRef::Name(name) => {
                scripts::entry_named(name).ok_or_else(|| ScenarioError::UnknownEntry(name.clone()))
            }
        }
    }
}

fn default_kind() -> ActorKind {
    ActorKind::Creature
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    /// Name triggers use to address this actor.
    pub label: String,
    pub entry: EntryRef,
    #[serde(default = "default_kind")]
    pub kind: ActorKind,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAction {
    SpellHit { caster: String, spell: u32 },
    GossipSelect { player: String, action: u32 },
    Action(i32),
    SetTarget(String),
    WaypointReached(u32),
    /// Set the target's health in percent.
    Health(u8),
    Kill {
        #[serde(default)]
        killer: Option<String>,
    },
    Reset,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub at_ms: u64,
    pub target: String,
    /// Written as `reset` for unit actions and `{ kill: { killer: player } }`
    /// for the rest.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub action: TriggerAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tick_ms: Option<u64>,
    pub duration_s: u64,
    #[serde(default)]
    pub seed: u64,
    pub spawns: Vec<SpawnSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

/// Knobs the command line may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub tick: Duration,
    pub duration: Duration,
    pub seed: u64,
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source)
    }

    pub fn builtin(name: &str) -> Result<Self, ScenarioError> {
        let (_, source) = BUILTIN
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .ok_or_else(|| ScenarioError::UnknownScenario(name.to_string()))?;
        Self::from_yaml(source)
    }

    pub fn default_options(&self) -> RunOptions {
        RunOptions {
            tick: Duration::from_millis(self.tick_ms.unwrap_or(100).max(1)),
            duration: Duration::from_secs(self.duration_s),
            seed: self.seed,
        }
    }

    /// Every entry parses and every trigger names a spawn label or an entry.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut labels = HashMap::new();
        for spawn in &self.spawns {
            spawn.entry.resolve()?;
            if labels.insert(spawn.label.as_str(), ()).is_some() {
                return Err(ScenarioError::DuplicateLabel(spawn.label.clone()));
            }
        }
        for (index, trigger) in self.triggers.iter().enumerate() {
            for name in trigger.actor_names() {
                if !labels.contains_key(name) && scripts::entry_named(name).is_none() {
                    return Err(ScenarioError::UnknownActor {
                        index,
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn run(&self, options: RunOptions) -> Result<Outcome, ScenarioError> {
        info!(scenario = %self.name, ?options, "scenario start");
        let mut host = ScriptHost::new(scripts::registry(), options.seed);
        let mut labels = HashMap::new();
        for spawn in &self.spawns {
            let entry = spawn.entry.resolve()?;
            let actor = host.spawn_with(spawn.kind, entry, spawn.at);
            labels.insert(spawn.label.clone(), actor);
        }

        let mut pending: Vec<(usize, &TriggerSpec)> = self.triggers.iter().enumerate().collect();
        pending.sort_by_key(|(index, trigger)| (trigger.at_ms, *index));
        let mut pending = pending.into_iter().peekable();

        let tick = if options.tick.is_zero() {
            Duration::from_millis(1)
        } else {
            options.tick
        };
        loop {
            while let Some((index, trigger)) =
                pending.next_if(|(_, trigger)| Duration::from_millis(trigger.at_ms) <= host.elapsed())
            {
                fire(&mut host, &labels, index, trigger)?;
            }
            if host.elapsed() >= options.duration {
                break;
            }
            let remaining = options.duration - host.elapsed();
            host.step(tick.min(remaining));
        }
        let skipped = pending.count();
        if skipped > 0 {
            warn!(scenario = %self.name, skipped, "triggers scheduled past the end were not fired");
        }

        let outcome = Outcome {
            name: self.name.clone(),
            elapsed: host.elapsed(),
            ticks: host.ticks(),
            actors_left: host.world().len(),
            labels: labels.into_iter().map(|(label, actor)| (actor, label)).collect(),
            effects: host.world().effects().to_vec(),
        };
        info!(
            scenario = %self.name,
            effects = outcome.effects.len(),
            actors_left = outcome.actors_left,
            "scenario finished"
        );
        Ok(outcome)
    }
}

impl TriggerSpec {
    fn actor_names(&self) -> Vec<&str> {
        let mut names = vec![self.target.as_str()];
        match &self.action {
            TriggerAction::SpellHit { caster, .. } => names.push(caster),
            TriggerAction::GossipSelect { player, .. } => names.push(player),
            TriggerAction::SetTarget(player) => names.push(player),
            TriggerAction::Kill { killer: Some(killer) } => names.push(killer),
            _ => {}
        }
        names
    }
}

/// A label wins over an entry name; entry names pick the oldest living match.
fn lookup(host: &ScriptHost, labels: &HashMap<String, ActorRef>, name: &str) -> Option<ActorRef> {
    if let Some(actor) = labels.get(name) {
        return host.world().actor(*actor).map(|_| *actor);
    }
    let entry = scripts::entry_named(name)?;
    host.world()
        .find(entry)
        .into_iter()
        .find(|actor| host.world().actor(*actor).is_some_and(|state| state.alive))
}

fn fire(
    host: &mut ScriptHost,
    labels: &HashMap<String, ActorRef>,
    index: usize,
    trigger: &TriggerSpec,
) -> Result<(), ScenarioError> {
    let names = trigger.actor_names();
    let mut actors = Vec::with_capacity(names.len());
    for name in &names {
        match lookup(host, labels, name) {
            Some(actor) => actors.push(actor),
            None => {
                warn!(index, name, "trigger actor not present, skipped");
                return Ok(());
            }
        }
    }
    let target = actors[0];
    info!(index, at = ?host.elapsed(), %target, action = ?trigger.action, "trigger");
    match &trigger.action {
        TriggerAction::SpellHit { spell, .. } => {
            host.trigger(
                target,
                Trigger::SpellHit {
                    caster: actors[1],
                    spell: *spell,
                },
            );
        }
        TriggerAction::GossipSelect { action, .. } => {
            host.trigger(
                target,
                Trigger::GossipSelect {
                    player: actors[1],
                    action: *action,
                },
            );
        }
        TriggerAction::Action(param) => {
            host.trigger(target, Trigger::Action(*param));
        }
        TriggerAction::SetTarget(_) => {
            host.trigger(target, Trigger::SetTarget(actors[1]));
        }
        TriggerAction::WaypointReached(point) => {
            host.trigger(target, Trigger::WaypointReached(*point));
        }
        TriggerAction::Health(pct) => host.world_mut().set_health(target, *pct),
        TriggerAction::Kill { .. } => host.kill(target, actors.get(1).copied()),
        TriggerAction::Reset => host.reset(target),
        TriggerAction::Destroy => host.destroy(target),
    }
    Ok(())
}

/// What a finished run left behind.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub name: String,
    pub elapsed: Duration,
    pub ticks: u64,
    pub actors_left: usize,
    pub effects: Vec<EffectRecord>,
    labels: HashMap<ActorRef, String>,
}

impl Outcome {
    pub fn effects_of(&self, actor: ActorRef) -> impl Iterator<Item = &Effect> + '_ {
        self.effects
            .iter()
            .filter(move |record| record.actor == actor)
            .map(|record| &record.effect)
    }

    pub fn labelled(&self, label: &str) -> Option<ActorRef> {
        self.labels
            .iter()
            .find(|(_, candidate)| candidate.as_str() == label)
            .map(|(actor, _)| *actor)
    }

    fn describe(&self, actor: ActorRef) -> String {
        if let Some(label) = self.labels.get(&actor) {
            return format!("{label}{actor}");
        }
        match self.effects.iter().find(|record| record.actor == actor) {
            Some(record) => format!("{}{actor}", scripts::entry_name(record.entry)),
            None => actor.to_string(),
        }
    }

    /// One line per effect, then totals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "tundra: scenario {}", self.name);
        for record in &self.effects {
            let _ = writeln!(
                out,
                "[{:>8.3}s] {:<28} {}",
                record.at.as_secs_f64(),
                self.describe(record.actor),
                self.describe_effect(&record.effect)
            );
        }
        let _ = writeln!(
            out,
            "- elapsed: {:.3}s over {} ticks",
            self.elapsed.as_secs_f64(),
            self.ticks
        );
        let _ = writeln!(out, "- effects: {}", self.effects.len());
        let _ = writeln!(out, "- actors left: {}", self.actors_left);
        out
    }

    fn describe_effect(&self, effect: &Effect) -> String {
        match effect {
            Effect::Talk { text, target: Some(target) } => {
                format!("says line {text} to {}", self.describe(*target))
            }
            Effect::Talk { text, target: None } => format!("says line {text}"),
            Effect::Cast { spell, target } => format!("casts {spell} on {}", self.describe(*target)),
            Effect::Attack(target) => format!("attacks {}", self.describe(*target)),
            Effect::KillCredit { player, entry } => format!(
                "credits {} with {}",
                self.describe(*player),
                scripts::entry_name(*entry)
            ),
            Effect::Use(user) => format!("used by {}", self.describe(*user)),
            Effect::Morph(entry) => format!("becomes {}", scripts::entry_name(*entry)),
            other => format!("{other:?}"),
        }
    }
}
