use crate::scripting::world::ScriptWorld;
use crate::world::actor::{
    ActorKind, ActorRef, ActorView, Effect, Emote, Entry, Faction, Lifetime, StandState,
};
use crate::world::position::Position;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

pub const WALK_SPEED: f32 = 2.5;
pub const RUN_SPEED: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Movement {
    point: u32,
    destination: Position,
}

/// One actor as the reference world tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimActor {
    pub kind: ActorKind,
    pub entry: Entry,
    pub position: Position,
    pub summoner: Option<ActorRef>,
    pub stand_state: StandState,
    pub emote_state: Emote,
    pub faction: Faction,
    pub attackable: bool,
    pub quest_giver: bool,
    pub walking: bool,
    pub alive: bool,
    pub health_pct: u8,
    pub in_combat: bool,
    pub victim: Option<ActorRef>,
    lifetime: Lifetime,
    spawned_at: Duration,
    died_at: Option<Duration>,
    movement: Option<Movement>,
}

impl SimActor {
    fn new(kind: ActorKind, entry: Entry, position: Position) -> Self {
        Self {
            kind,
            entry,
            position,
            summoner: None,
            stand_state: StandState::Stand,
            emote_state: Emote::None,
            faction: Faction::Friendly,
            attackable: true,
            quest_giver: false,
            walking: false,
            alive: true,
            health_pct: 100,
            in_combat: false,
            victim: None,
            lifetime: Lifetime::Manual,
            spawned_at: Duration::ZERO,
            died_at: None,
            movement: None,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    fn expired(&self, now: Duration) -> bool {
        match self.lifetime {
            Lifetime::Manual => false,
            Lifetime::Timed(limit) => now >= self.spawned_at.saturating_add(limit),
            Lifetime::DeadDespawn(delay) | Lifetime::CorpseTimed(delay) => self
                .died_at
                .is_some_and(|died| now >= died.saturating_add(delay)),
        }
    }

    fn view(&self, actor: ActorRef) -> ActorView {
        ActorView {
            actor,
            kind: self.kind,
            entry: self.entry,
            position: self.position,
            summoner: self.summoner,
            stand_state: self.stand_state,
            emote_state: self.emote_state,
            alive: self.alive,
            health_pct: self.health_pct,
            in_combat: self.in_combat,
            victim: self.victim,
        }
    }
}

/// An effect as it landed in the world log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRecord {
    pub at: Duration,
    pub actor: ActorRef,
    /// Entry the actor had when the effect landed.
    pub entry: Entry,
    pub effect: Effect,
}

/// In-memory world: straight-line movement, lifetime despawns and an effect log.
#[derive(Debug, Default)]
pub struct SimWorld {
    now: Duration,
    next_id: u64,
    actors: BTreeMap<ActorRef, SimActor>,
    effects: Vec<EffectRecord>,
    spawned: Vec<ActorRef>,
    arrivals: Vec<(ActorRef, u32)>,
    deaths: Vec<(ActorRef, Option<ActorRef>)>,
    removed: Vec<ActorRef>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actor(&self, actor: ActorRef) -> Option<&SimActor> {
        self.actors.get(&actor)
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorRef, &SimActor)> + '_ {
        self.actors.iter().map(|(actor, state)| (*actor, state))
    }

    /// Every live actor with `entry`, oldest first.
    pub fn find(&self, entry: Entry) -> Vec<ActorRef> {
        self.actors
            .iter()
            .filter(|(_, state)| state.entry == entry)
            .map(|(actor, _)| *actor)
            .collect()
    }

    pub fn effects(&self) -> &[EffectRecord] {
        &self.effects
    }

    pub fn effects_of(&self, actor: ActorRef) -> Vec<Effect> {
        self.effects
            .iter()
            .filter(|record| record.actor == actor)
            .map(|record| record.effect)
            .collect()
    }

    /// Place an actor that nobody summoned (players, static spawns).
    pub fn place(&mut self, kind: ActorKind, entry: Entry, position: Position) -> ActorRef {
        let actor = self.allocate();
        let mut state = SimActor::new(kind, entry, position);
        state.spawned_at = self.now;
        self.actors.insert(actor, state);
        self.spawned.push(actor);
        debug!(%actor, entry = entry.0, ?kind, "actor placed");
        actor
    }

    /// Set health as a percentage; living actors keep at least one percent.
    pub fn set_health(&mut self, actor: ActorRef, pct: u8) {
        if let Some(state) = self.actors.get_mut(&actor).filter(|state| state.alive) {
            state.health_pct = pct.clamp(1, 100);
        }
    }

    pub fn kill_by(&mut self, actor: ActorRef, killer: Option<ActorRef>) {
        let now = self.now;
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        if !state.alive {
            return;
        }
        state.alive = false;
        state.health_pct = 0;
        state.in_combat = false;
        state.victim = None;
        state.movement = None;
        state.died_at = Some(now);
        self.deaths.push((actor, killer));
        debug!(%actor, ?killer, "actor died");
    }

    /// Advance the clock, move actors and expire lifetimes.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now = self.now.saturating_add(elapsed);
        let seconds = elapsed.as_secs_f32();
        for (actor, state) in self.actors.iter_mut() {
            let Some(movement) = state.movement else {
                continue;
            };
            let speed = if state.walking { WALK_SPEED } else { RUN_SPEED };
            state.position = state.position.step_towards(movement.destination, speed * seconds);
            if state.position.distance_to(movement.destination) <= f32::EPSILON {
                state.movement = None;
                self.arrivals.push((*actor, movement.point));
                trace!(%actor, point = movement.point, "arrived");
            }
        }
        let expired: Vec<ActorRef> = self
            .actors
            .iter()
            .filter(|(_, state)| state.expired(self.now))
            .map(|(actor, _)| *actor)
            .collect();
        for actor in expired {
            debug!(%actor, "lifetime expired");
            self.destroy(actor);
        }
    }

    pub fn drain_spawned(&mut self) -> Vec<ActorRef> {
        std::mem::take(&mut self.spawned)
    }

    pub fn drain_arrivals(&mut self) -> Vec<(ActorRef, u32)> {
        std::mem::take(&mut self.arrivals)
    }

    pub fn drain_deaths(&mut self) -> Vec<(ActorRef, Option<ActorRef>)> {
        std::mem::take(&mut self.deaths)
    }

    pub fn drain_removed(&mut self) -> Vec<ActorRef> {
        std::mem::take(&mut self.removed)
    }

    fn allocate(&mut self) -> ActorRef {
        self.next_id += 1;
        ActorRef(self.next_id)
    }

    fn apply(&mut self, actor: ActorRef, effect: Effect) {
        match effect {
            Effect::Stand(stand) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.stand_state = stand;
                }
            }
            Effect::EmoteState(emote) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.emote_state = emote;
                }
            }
            Effect::Morph(entry) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.entry = entry;
                }
            }
            Effect::Faction(faction) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.faction = faction;
                }
            }
            Effect::Attackable(attackable) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.attackable = attackable;
                }
            }
            Effect::QuestGiver(enabled) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.quest_giver = enabled;
                }
            }
            Effect::Walk(walking) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.walking = walking;
                }
            }
            Effect::Face(orientation) => {
                if let Some(state) = self.actors.get_mut(&actor) {
                    state.position.orientation = orientation;
                }
            }
            Effect::Attack(target) => {
                self.set_in_combat(actor, true);
                self.set_in_combat(target, true);
                if let Some(state) = self.actors.get_mut(&actor).filter(|state| state.in_combat) {
                    state.victim = Some(target);
                }
                // The attacked side fights back unless it already has someone.
                if let Some(state) = self.actors.get_mut(&target).filter(|state| state.in_combat) {
                    state.victim.get_or_insert(actor);
                }
            }
            _ => {}
        }
    }
}

impl ScriptWorld for SimWorld {
    fn resolve(&self, actor: ActorRef) -> Option<ActorView> {
        self.actors.get(&actor).map(|state| state.view(actor))
    }

    fn spawn(
        &mut self,
        entry: Entry,
        position: Position,
        lifetime: Lifetime,
        summoner: Option<ActorRef>,
    ) -> Option<ActorRef> {
        if let Some(summoner) = summoner {
            if !self.actors.contains_key(&summoner) {
                return None;
            }
        }
        let actor = self.place(ActorKind::Creature, entry, position);
        if let Some(state) = self.actors.get_mut(&actor) {
            state.summoner = summoner;
            state.lifetime = lifetime;
        }
        Some(actor)
    }

    fn move_to(&mut self, actor: ActorRef, point: u32, destination: Position) {
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        if !state.alive {
            return;
        }
        state.movement = Some(Movement { point, destination });
    }

    fn perform(&mut self, actor: ActorRef, effect: Effect) {
        let Some(state) = self.actors.get(&actor) else {
            trace!(%actor, ?effect, "effect on missing actor dropped");
            return;
        };
        self.effects.push(EffectRecord {
            at: self.now,
            actor,
            entry: state.entry,
            effect,
        });
        self.apply(actor, effect);
    }

    fn destroy(&mut self, actor: ActorRef) {
        if self.actors.remove(&actor).is_some() {
            self.removed.push(actor);
            debug!(%actor, "actor removed");
        }
    }

    fn kill(&mut self, actor: ActorRef) {
        self.kill_by(actor, None);
    }

    fn set_in_combat(&mut self, actor: ActorRef, in_combat: bool) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.in_combat = in_combat && state.alive;
            if !state.in_combat {
                state.victim = None;
            }
        }
    }

    fn nearest(&self, from: ActorRef, entry: Entry, range: f32) -> Option<ActorView> {
        let origin = self.actors.get(&from)?.position;
        self.actors
            .iter()
            .filter(|(actor, state)| **actor != from && state.entry == entry && state.alive)
            .map(|(actor, state)| (origin.distance_to(state.position), *actor, state))
            .filter(|(distance, _, _)| *distance <= range)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, actor, state)| state.view(actor))
    }
}
