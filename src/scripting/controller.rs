use crate::scripting::events::EventQueue;
use crate::scripting::flags::{Flag, FlagBoard};
use crate::scripting::peers::Peers;
use crate::scripting::phase::{self, Phase, PhaseTable, PhaseTableError, PhaseTimer};
use crate::scripting::world::ScriptWorld;
use crate::world::actor::{ActorRef, ActorView, Effect, Entry, Lifetime};
use crate::world::position::Position;
use rand::RngCore;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on events dispatched by one controller in a single tick.
/// Anything past it stays queued for the next tick.
const MAX_EVENTS_PER_TICK: usize = 1024;

/// Outside inputs a host forwards to a script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    SpellHit { caster: ActorRef, spell: u32 },
    GossipSelect { player: ActorRef, action: u32 },
    Action(i32),
    SetTarget(ActorRef),
    WaypointReached(u32),
}

/// Shared state a host lends to a controller for one callback.
pub struct ScriptEnv<'a> {
    pub world: &'a mut dyn ScriptWorld,
    pub flags: &'a mut FlagBoard,
    pub rng: &'a mut dyn RngCore,
}

/// Behavior of one creature or game object type.
///
/// Every hook receives a [`ScriptContext`] scoped to the owning actor. Hooks
/// run to completion; waiting is expressed by scheduling an event, entering a
/// phase, or polling a flag on a later tick.
pub trait ActorScript: Sized + 'static {
    type Event: Copy + Eq + Debug;
    type Action: Clone + Debug;
    type Role: Copy + Eq + Hash + Debug;

    const NAME: &'static str;

    fn phase_table() -> Result<PhaseTable<Self::Action>, PhaseTableError> {
        Ok(PhaseTable::empty())
    }

    /// Runs once, right after the host attached the controller.
    fn on_spawn(&mut self, _ctx: &mut ScriptContext<'_, Self>) {}

    fn on_event(&mut self, _event: Self::Event, _ctx: &mut ScriptContext<'_, Self>) {}

    fn on_phase(&mut self, _action: Self::Action, _ctx: &mut ScriptContext<'_, Self>) {}

    /// Runs every tick after events are drained and before the phase timer.
    fn on_tick(&mut self, _ctx: &mut ScriptContext<'_, Self>) {}

    fn on_movement_complete(&mut self, _point: u32, _ctx: &mut ScriptContext<'_, Self>) {}

    fn on_trigger(&mut self, _trigger: Trigger, _ctx: &mut ScriptContext<'_, Self>) {}

    fn on_death(&mut self, _killer: Option<ActorRef>, _ctx: &mut ScriptContext<'_, Self>) {}

    /// Called after the queue and phase were cleared by an AI reset.
    fn on_reset(&mut self, _ctx: &mut ScriptContext<'_, Self>) {}

    /// Last callback before the actor leaves the world. Dependents spawned by
    /// this script must be torn down here; nothing cascades on its own.
    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_, Self>) {}
}

/// View of the world from inside one script callback.
pub struct ScriptContext<'a, S: ActorScript> {
    me: ActorRef,
    events: &'a mut EventQueue<S::Event>,
    phase: &'a mut PhaseTimer,
    peers: &'a mut Peers<S::Role>,
    world: &'a mut dyn ScriptWorld,
    flags: &'a mut FlagBoard,
    rng: &'a mut dyn RngCore,
}

impl<'a, S: ActorScript> ScriptContext<'a, S> {
    pub fn me(&self) -> ActorRef {
        self.me
    }

    /// Own snapshot; `None` once the actor has left the world.
    pub fn view(&self) -> Option<ActorView> {
        self.world.resolve(self.me)
    }

    pub fn resolve(&self, actor: ActorRef) -> Option<ActorView> {
        self.world.resolve(actor)
    }

    pub fn world(&mut self) -> &mut dyn ScriptWorld {
        &mut *self.world
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    pub fn schedule(&mut self, event: S::Event, delay: Duration) {
        self.events.schedule(event, delay);
    }

    pub fn schedule_range(&mut self, event: S::Event, min: Duration, max: Duration) {
        self.events.schedule_range(event, min, max, &mut *self.rng);
    }

    pub fn cancel(&mut self, event: S::Event) -> usize {
        self.events.cancel(event)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn start_phase(&mut self, phase: Phase, delay: Duration) {
        debug!(actor = %self.me, phase, ?delay, "phase started");
        self.phase.start(phase, delay);
    }

    pub fn stop_phase(&mut self) {
        self.phase.stop();
    }

    pub fn peer(&self, role: S::Role) -> Option<ActorView> {
        self.peers.resolve(role, &*self.world)
    }

    pub fn peer_ref(&self, role: S::Role) -> Option<ActorRef> {
        self.peers.get(role)
    }

    pub fn set_peer(&mut self, role: S::Role, actor: ActorRef) {
        self.peers.set(role, actor);
    }

    pub fn take_peer(&mut self, role: S::Role) -> Option<ActorRef> {
        self.peers.take(role)
    }

    /// The actor that spawned this one, if it is still around.
    pub fn summoner(&self) -> Option<ActorView> {
        let summoner = self.view()?.summoner?;
        self.world.resolve(summoner)
    }

    /// The live actor this one is fighting.
    pub fn victim(&self) -> Option<ActorView> {
        let victim = self.view()?.victim?;
        self.world.resolve(victim).filter(|view| view.alive)
    }

    /// Raise a completion flag owned by `owner`.
    pub fn signal(&mut self, owner: ActorRef, flag: Flag) {
        debug!(from = %self.me, to = %owner, %flag, "signal");
        self.flags.raise(owner, flag);
    }

    /// Raise a flag on the summoner; skipped when there is none.
    pub fn signal_summoner(&mut self, flag: Flag) -> bool {
        match self.summoner() {
            Some(summoner) => {
                self.signal(summoner.actor, flag);
                true
            }
            None => {
                debug!(actor = %self.me, %flag, "no summoner to signal");
                false
            }
        }
    }

    /// Consume own flags, only if every one of them is raised.
    pub fn take_flags(&mut self, flags: &[Flag]) -> bool {
        self.flags.take_all(self.me, flags)
    }

    pub fn is_raised(&self, flag: Flag) -> bool {
        self.flags.is_raised(self.me, flag)
    }

    pub fn perform(&mut self, effect: Effect) {
        self.world.perform(self.me, effect);
    }

    pub fn perform_on(&mut self, actor: ActorRef, effect: Effect) {
        self.world.perform(actor, effect);
    }

    /// Spawn a dependent with this actor as its summoner.
    pub fn spawn(&mut self, entry: Entry, position: Position, lifetime: Lifetime) -> Option<ActorRef> {
        let spawned = self.world.spawn(entry, position, lifetime, Some(self.me));
        if spawned.is_none() {
            debug!(actor = %self.me, entry = entry.0, "spawn refused");
        }
        spawned
    }

    pub fn move_to(&mut self, actor: ActorRef, point: u32, destination: Position) {
        self.world.move_to(actor, point, destination);
    }

    pub fn destroy(&mut self, actor: ActorRef) {
        self.world.destroy(actor);
    }

    /// Destroy the peer in `role` if it is still present and forget it.
    pub fn destroy_peer(&mut self, role: S::Role) {
        if let Some(actor) = self.peers.take(role) {
            if self.world.resolve(actor).is_some() {
                self.world.destroy(actor);
            }
        }
    }

    pub fn kill(&mut self, actor: ActorRef) {
        self.world.kill(actor);
    }

    pub fn nearest(&self, entry: Entry, range: f32) -> Option<ActorView> {
        self.world.nearest(self.me, entry, range)
    }
}

/// Object-safe face of an [`ActorController`], as stored by a host.
pub trait Controller {
    fn actor(&self) -> ActorRef;
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn pending_events(&self) -> usize;
    fn spawned(&mut self, env: &mut ScriptEnv<'_>);
    /// Move the event and phase clocks. Hosts call this for every controller
    /// before any callback of the frame runs.
    fn advance(&mut self, elapsed: Duration);
    fn tick(&mut self, env: &mut ScriptEnv<'_>);
    fn movement_complete(&mut self, point: u32, env: &mut ScriptEnv<'_>);
    fn trigger(&mut self, trigger: Trigger, env: &mut ScriptEnv<'_>);
    fn died(&mut self, killer: Option<ActorRef>, env: &mut ScriptEnv<'_>);
    fn reset(&mut self, env: &mut ScriptEnv<'_>);
    fn destroyed(&mut self, env: &mut ScriptEnv<'_>);
}

/// One live scripted actor: its event queue, phase timer, peers and script.
pub struct ActorController<S: ActorScript> {
    actor: ActorRef,
    events: EventQueue<S::Event>,
    phase: PhaseTimer,
    table: PhaseTable<S::Action>,
    peers: Peers<S::Role>,
    script: S,
}

impl<S: ActorScript> ActorController<S> {
    pub fn new(actor: ActorRef, script: S) -> Result<Self, PhaseTableError> {
        Ok(Self {
            actor,
            events: EventQueue::new(),
            phase: PhaseTimer::new(),
            table: S::phase_table()?,
            peers: Peers::default(),
            script,
        })
    }

    pub fn script(&self) -> &S {
        &self.script
    }

    pub fn peers(&self) -> &Peers<S::Role> {
        &self.peers
    }

    pub fn events(&self) -> &EventQueue<S::Event> {
        &self.events
    }

    fn with_context<F>(&mut self, env: &mut ScriptEnv<'_>, f: F)
    where
        F: FnOnce(&mut S, &mut ScriptContext<'_, S>),
    {
        let ActorController {
            actor,
            events,
            phase,
            peers,
            script,
            ..
        } = self;
        let mut ctx = ScriptContext {
            me: *actor,
            events,
            phase,
            peers,
            world: &mut *env.world,
            flags: &mut *env.flags,
            rng: &mut *env.rng,
        };
        f(script, &mut ctx);
    }
}

impl<S: ActorScript> Controller for ActorController<S> {
    fn actor(&self) -> ActorRef {
        self.actor
    }

    fn name(&self) -> &'static str {
        S::NAME
    }

    fn phase(&self) -> Phase {
        self.phase.phase()
    }

    fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn spawned(&mut self, env: &mut ScriptEnv<'_>) {
        self.with_context(env, |script, ctx| script.on_spawn(ctx));
    }

    fn advance(&mut self, elapsed: Duration) {
        self.events.update(elapsed);
        self.phase.advance(elapsed);
    }

    fn tick(&mut self, env: &mut ScriptEnv<'_>) {
        let ActorController {
            actor,
            events,
            phase,
            table,
            peers,
            script,
        } = self;
        let table = &*table;
        let mut ctx = ScriptContext {
            me: *actor,
            events,
            phase,
            peers,
            world: &mut *env.world,
            flags: &mut *env.flags,
            rng: &mut *env.rng,
        };

        let mut dispatched = 0usize;
        while let Some(event) = ctx.events.pop_ready() {
            debug!(actor = %ctx.me, script = S::NAME, ?event, "event");
            script.on_event(event, &mut ctx);
            dispatched += 1;
            if dispatched >= MAX_EVENTS_PER_TICK {
                warn!(actor = %ctx.me, script = S::NAME, "event chain did not settle within one tick");
                break;
            }
        }

        script.on_tick(&mut ctx);

        ctx.phase.begin_tick(table, &mut *ctx.flags, ctx.me);
        let mut fired = 0usize;
        while let Some(action) = ctx.phase.next_due(table) {
            script.on_phase(action, &mut ctx);
            fired += 1;
            if fired >= phase::step_limit() {
                warn!(actor = %ctx.me, script = S::NAME, "phase chain did not settle within one tick");
                break;
            }
        }
    }

    fn movement_complete(&mut self, point: u32, env: &mut ScriptEnv<'_>) {
        self.with_context(env, |script, ctx| script.on_movement_complete(point, ctx));
    }

    fn trigger(&mut self, trigger: Trigger, env: &mut ScriptEnv<'_>) {
        debug!(actor = %self.actor, script = S::NAME, ?trigger, "trigger");
        self.with_context(env, |script, ctx| script.on_trigger(trigger, ctx));
    }

    fn died(&mut self, killer: Option<ActorRef>, env: &mut ScriptEnv<'_>) {
        self.with_context(env, |script, ctx| script.on_death(killer, ctx));
    }

    fn reset(&mut self, env: &mut ScriptEnv<'_>) {
        debug!(actor = %self.actor, script = S::NAME, "reset");
        self.events.clear();
        self.phase.stop();
        env.flags.clear_actor(self.actor);
        self.with_context(env, |script, ctx| script.on_reset(ctx));
    }

    fn destroyed(&mut self, env: &mut ScriptEnv<'_>) {
        debug!(actor = %self.actor, script = S::NAME, "destroyed");
        self.with_context(env, |script, ctx| script.on_destroy(ctx));
        self.events.clear();
        self.phase.stop();
        env.flags.clear_actor(self.actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::phase::IDLE;
    use crate::world::actor::ActorKind;
    use crate::world::sim::SimWorld;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TICK: Duration = Duration::from_millis(100);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cue {
        Kick,
        A,
        B,
        C,
        Late,
        Spin,
    }

    #[derive(Debug, Default)]
    struct Chain {
        spins: usize,
    }

    impl ActorScript for Chain {
        type Event = Cue;
        type Action = &'static str;
        type Role = ();

        const NAME: &'static str = "chain";

        fn phase_table() -> Result<PhaseTable<&'static str>, PhaseTableError> {
            PhaseTable::builder()
                .step(1, "phase", IDLE, Duration::ZERO)
                .step(2, "late_phase", IDLE, Duration::ZERO)
                .build()
        }

        fn on_event(&mut self, event: Cue, ctx: &mut ScriptContext<'_, Self>) {
            match event {
                Cue::Kick => {
                    ctx.perform(Effect::Custom("kick"));
                    ctx.schedule(Cue::Late, TICK);
                    ctx.start_phase(2, TICK);
                }
                Cue::A => {
                    ctx.perform(Effect::Custom("a"));
                    ctx.schedule(Cue::B, Duration::ZERO);
                }
                Cue::B => {
                    ctx.perform(Effect::Custom("b"));
                    ctx.schedule(Cue::C, Duration::ZERO);
                }
                Cue::C => {
                    ctx.perform(Effect::Custom("c"));
                    ctx.start_phase(1, Duration::ZERO);
                }
                Cue::Late => ctx.perform(Effect::Custom("late")),
                Cue::Spin => {
                    self.spins += 1;
                    ctx.schedule(Cue::Spin, Duration::ZERO);
                }
            }
        }

        fn on_phase(&mut self, action: &'static str, ctx: &mut ScriptContext<'_, Self>) {
            ctx.perform(Effect::Custom(action));
        }
    }

    struct Bench {
        world: SimWorld,
        flags: FlagBoard,
        rng: StdRng,
        controller: ActorController<Chain>,
    }

    impl Bench {
        fn new() -> Self {
            let mut world = SimWorld::new();
            let actor = world.place(ActorKind::Creature, Entry(1), Position::default());
            Self {
                world,
                flags: FlagBoard::new(),
                rng: StdRng::seed_from_u64(5),
                controller: ActorController::new(actor, Chain::default()).expect("table"),
            }
        }

        fn step(&mut self) {
            self.world.advance(TICK);
            self.controller.advance(TICK);
            let mut env = ScriptEnv {
                world: &mut self.world,
                flags: &mut self.flags,
                rng: &mut self.rng,
            };
            self.controller.tick(&mut env);
        }

        fn log(&self) -> Vec<(Duration, Effect)> {
            self.world
                .effects()
                .iter()
                .map(|record| (record.at, record.effect))
                .collect()
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn zero_delay_chain_runs_before_the_phase_in_one_tick() {
        let mut bench = Bench::new();
        bench.controller.events.schedule(Cue::A, Duration::from_secs(1));
        for _ in 0..10 {
            bench.step();
        }
        assert_eq!(
            bench.log(),
            vec![
                (ms(1_000), Effect::Custom("a")),
                (ms(1_000), Effect::Custom("b")),
                (ms(1_000), Effect::Custom("c")),
                (ms(1_000), Effect::Custom("phase")),
            ]
        );
        assert_eq!(bench.controller.phase(), IDLE);
        assert_eq!(bench.controller.pending_events(), 0);
    }

    #[test]
    fn work_started_from_an_event_waits_its_full_delay() {
        let mut bench = Bench::new();
        bench.controller.events.schedule(Cue::Kick, Duration::from_secs(1));
        for _ in 0..10 {
            bench.step();
        }
        assert_eq!(bench.controller.phase(), 2);
        assert_eq!(bench.controller.pending_events(), 1);

        bench.step();
        bench.step();
        assert_eq!(
            bench.log(),
            vec![
                (ms(1_000), Effect::Custom("kick")),
                (ms(1_100), Effect::Custom("late")),
                (ms(1_100), Effect::Custom("late_phase")),
            ]
        );
    }

    #[test]
    fn events_past_the_cap_carry_into_the_next_tick() {
        let mut bench = Bench::new();
        bench.controller.events.schedule(Cue::Spin, Duration::ZERO);

        bench.step();
        assert_eq!(bench.controller.script().spins, MAX_EVENTS_PER_TICK);
        assert_eq!(bench.controller.pending_events(), 1);

        bench.step();
        assert_eq!(bench.controller.script().spins, 2 * MAX_EVENTS_PER_TICK);
        assert_eq!(bench.controller.pending_events(), 1);
    }
}
