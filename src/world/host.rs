use crate::scripting::controller::{Controller, ScriptEnv, Trigger};
use crate::scripting::flags::FlagBoard;
use crate::scripting::phase::Phase;
use crate::scripting::registry::ScriptRegistry;
use crate::scripting::world::ScriptWorld;
use crate::world::actor::{ActorKind, ActorRef, Entry, Lifetime};
use crate::world::position::Position;
use crate::world::sim::SimWorld;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Simulation loop: owns the world, the flag board and every controller.
///
/// One `step` advances the world and every controller clock, hands out
/// movement and death notifications, ticks each live controller in actor
/// order, attaches scripts to anything spawned meanwhile and finally runs
/// destruction callbacks for actors that left the world. Controllers attached
/// during a step start their clocks at that step.
pub struct ScriptHost {
    world: SimWorld,
    flags: FlagBoard,
    rng: StdRng,
    registry: ScriptRegistry,
    controllers: BTreeMap<ActorRef, Box<dyn Controller>>,
    elapsed: Duration,
    ticks: u64,
}

impl ScriptHost {
    pub fn new(registry: ScriptRegistry, seed: u64) -> Self {
        Self {
            world: SimWorld::new(),
            flags: FlagBoard::new(),
            rng: StdRng::seed_from_u64(seed),
            registry,
            controllers: BTreeMap::new(),
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn flags(&self) -> &FlagBoard {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FlagBoard {
        &mut self.flags
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn controller(&self, actor: ActorRef) -> Option<&dyn Controller> {
        self.controllers.get(&actor).map(|controller| controller.as_ref())
    }

    pub fn phase_of(&self, actor: ActorRef) -> Option<Phase> {
        self.controller(actor).map(|controller| controller.phase())
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Spawn an unsummoned creature and attach its script, if one is registered.
    pub fn spawn(&mut self, entry: Entry, position: Position) -> ActorRef {
        let actor = self.world.place(ActorKind::Creature, entry, position);
        self.attach_spawned();
        actor
    }

    pub fn spawn_with(&mut self, kind: ActorKind, entry: Entry, position: Position) -> ActorRef {
        let actor = self.world.place(kind, entry, position);
        self.attach_spawned();
        actor
    }

    pub fn spawn_summoned(
        &mut self,
        entry: Entry,
        position: Position,
        lifetime: Lifetime,
        summoner: ActorRef,
    ) -> Option<ActorRef> {
        let actor = self.world.spawn(entry, position, lifetime, Some(summoner))?;
        self.attach_spawned();
        Some(actor)
    }

    /// Attach an explicit controller, replacing any existing one.
    pub fn attach(&mut self, mut controller: Box<dyn Controller>) {
        let actor = controller.actor();
        debug!(%actor, script = controller.name(), "controller attached");
        let mut env = ScriptEnv {
            world: &mut self.world,
            flags: &mut self.flags,
            rng: &mut self.rng,
        };
        controller.spawned(&mut env);
        self.controllers.insert(actor, controller);
    }

    pub fn trigger(&mut self, actor: ActorRef, trigger: Trigger) -> bool {
        let Some(controller) = self.controllers.get_mut(&actor) else {
            debug!(%actor, ?trigger, "trigger for unscripted actor ignored");
            return false;
        };
        let mut env = ScriptEnv {
            world: &mut self.world,
            flags: &mut self.flags,
            rng: &mut self.rng,
        };
        controller.trigger(trigger, &mut env);
        self.settle();
        true
    }

    /// AI reset: clear the actor's queue and phase, then let the script reinitialise.
    pub fn reset(&mut self, actor: ActorRef) {
        let Some(controller) = self.controllers.get_mut(&actor) else {
            return;
        };
        let mut env = ScriptEnv {
            world: &mut self.world,
            flags: &mut self.flags,
            rng: &mut self.rng,
        };
        controller.reset(&mut env);
        self.world.set_in_combat(actor, false);
        self.settle();
    }

    pub fn kill(&mut self, actor: ActorRef, killer: Option<ActorRef>) {
        self.world.kill_by(actor, killer);
        self.deliver_deaths();
        self.settle();
    }

    pub fn destroy(&mut self, actor: ActorRef) {
        self.world.destroy(actor);
        self.settle();
    }

    /// Advance everything by one frame of `elapsed`.
    pub fn step(&mut self, elapsed: Duration) {
        self.elapsed = self.elapsed.saturating_add(elapsed);
        self.ticks += 1;
        self.world.advance(elapsed);
        for controller in self.controllers.values_mut() {
            controller.advance(elapsed);
        }
        self.settle();
        self.deliver_arrivals();

        let actors: Vec<ActorRef> = self.controllers.keys().copied().collect();
        for actor in actors {
            if self.world.resolve(actor).is_none() {
                continue;
            }
            let Some(controller) = self.controllers.get_mut(&actor) else {
                continue;
            };
            let mut env = ScriptEnv {
                world: &mut self.world,
                flags: &mut self.flags,
                rng: &mut self.rng,
            };
            controller.tick(&mut env);
        }
        self.deliver_deaths();
        self.settle();
    }

    /// Step in fixed increments until `duration` has passed.
    pub fn run_for(&mut self, duration: Duration, tick: Duration) {
        let tick = if tick.is_zero() {
            Duration::from_millis(1)
        } else {
            tick
        };
        let end = self.elapsed.saturating_add(duration);
        while self.elapsed < end {
            let remaining = end - self.elapsed;
            self.step(tick.min(remaining));
        }
        info!(
            elapsed = ?self.elapsed,
            ticks = self.ticks,
            actors = self.world.len(),
            controllers = self.controllers.len(),
            "run finished"
        );
    }

    fn deliver_arrivals(&mut self) {
        for (actor, point) in self.world.drain_arrivals() {
            let Some(controller) = self.controllers.get_mut(&actor) else {
                continue;
            };
            let mut env = ScriptEnv {
                world: &mut self.world,
                flags: &mut self.flags,
                rng: &mut self.rng,
            };
            controller.movement_complete(point, &mut env);
        }
        self.settle();
    }

    fn deliver_deaths(&mut self) {
        loop {
            let deaths = self.world.drain_deaths();
            if deaths.is_empty() {
                break;
            }
            for (actor, killer) in deaths {
                let Some(controller) = self.controllers.get_mut(&actor) else {
                    continue;
                };
                let mut env = ScriptEnv {
                    world: &mut self.world,
                    flags: &mut self.flags,
                    rng: &mut self.rng,
                };
                controller.died(killer, &mut env);
            }
        }
    }

    /// Attach new spawns and retire removed actors until nothing changes.
    fn settle(&mut self) {
        loop {
            self.attach_spawned();
            let removed = self.world.drain_removed();
            if removed.is_empty() {
                break;
            }
            for actor in removed {
                self.flags.clear_actor(actor);
                let Some(mut controller) = self.controllers.remove(&actor) else {
                    continue;
                };
                let mut env = ScriptEnv {
                    world: &mut self.world,
                    flags: &mut self.flags,
                    rng: &mut self.rng,
                };
                controller.destroyed(&mut env);
            }
        }
    }

    /// Spawn hooks may summon more actors; keep going until none are new.
    fn attach_spawned(&mut self) {
        loop {
            let spawned = self.world.drain_spawned();
            if spawned.is_empty() {
                break;
            }
            for actor in spawned {
                let Some(view) = self.world.resolve(actor) else {
                    continue;
                };
                match self.registry.build(view.entry, actor) {
                    Some(Ok(controller)) => self.attach(controller),
                    Some(Err(err)) => {
                        error!(%actor, entry = view.entry.0, %err, "script table rejected");
                    }
                    None => {}
                }
            }
        }
    }
}
