use crate::scripting::controller::{ActorScript, ScriptContext};
use crate::world::actor::{Effect, Emote, Entry};
use std::time::Duration;

pub const NPC_VALIANCE_KEEP_CANNONEER: Entry = Entry(25306);
pub const GO_VALIANCE_KEEP_CANNON_1: Entry = Entry(187560);
pub const GO_VALIANCE_KEEP_CANNON_2: Entry = Entry(188692);

const CANNON_RANGE: f32 = 10.0;
const RELOAD_MIN: Duration = Duration::from_secs(13);
const RELOAD_MAX: Duration = Duration::from_secs(18);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Fire,
}

/// Kneels by the nearest cannon and fires it every 13 to 18 seconds.
#[derive(Debug, Default)]
pub struct Cannoneer;

impl ActorScript for Cannoneer {
    type Event = Event;
    type Action = ();
    type Role = ();

    const NAME: &'static str = "valiance_keep_cannoneer";

    fn on_spawn(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.schedule_range(Event::Fire, RELOAD_MIN, RELOAD_MAX);
    }

    fn on_event(&mut self, _event: Event, ctx: &mut ScriptContext<'_, Self>) {
        ctx.perform(Effect::Emote(Emote::Kneel));
        let cannon = ctx
            .nearest(GO_VALIANCE_KEEP_CANNON_1, CANNON_RANGE)
            .or_else(|| ctx.nearest(GO_VALIANCE_KEEP_CANNON_2, CANNON_RANGE));
        if let Some(cannon) = cannon {
            let me = ctx.me();
            ctx.perform_on(cannon.actor, Effect::Use(me));
        }
        ctx.schedule_range(Event::Fire, RELOAD_MIN, RELOAD_MAX);
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.schedule_range(Event::Fire, RELOAD_MIN, RELOAD_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::registry::ScriptRegistry;
    use crate::world::actor::{ActorKind, ActorRef};
    use crate::world::host::ScriptHost;
    use crate::world::position::Position;

    const TICK: Duration = Duration::from_millis(250);

    fn shots(host: &ScriptHost, cannon: ActorRef) -> Vec<Duration> {
        host.world()
            .effects()
            .iter()
            .filter(|record| record.actor == cannon && matches!(record.effect, Effect::Use(_)))
            .map(|record| record.at)
            .collect()
    }

    #[test]
    fn fires_on_a_jittered_cadence() {
        let mut registry = ScriptRegistry::new();
        registry.register::<Cannoneer>(NPC_VALIANCE_KEEP_CANNONEER);
        let mut host = ScriptHost::new(registry, 42);
        let cannon = host.spawn_with(
            ActorKind::GameObject,
            GO_VALIANCE_KEEP_CANNON_2,
            Position::new(2300.0, 5200.0, 10.0, 0.0),
        );
        host.spawn(NPC_VALIANCE_KEEP_CANNONEER, Position::new(2303.0, 5200.0, 10.0, 0.0));

        host.run_for(Duration::from_secs(120), TICK);
        let shots = shots(&host, cannon);
        assert!(shots.len() >= 6, "only {} shots", shots.len());
        assert!(shots[0] >= RELOAD_MIN && shots[0] <= RELOAD_MAX + TICK);
        for pair in shots.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= RELOAD_MIN - TICK && gap <= RELOAD_MAX + TICK, "gap {gap:?}");
        }
    }

    #[test]
    fn out_of_range_cannon_is_left_alone() {
        let mut registry = ScriptRegistry::new();
        registry.register::<Cannoneer>(NPC_VALIANCE_KEEP_CANNONEER);
        let mut host = ScriptHost::new(registry, 1);
        let cannon = host.spawn_with(
            ActorKind::GameObject,
            GO_VALIANCE_KEEP_CANNON_1,
            Position::new(2330.0, 5200.0, 10.0, 0.0),
        );
        let cannoneer = host.spawn(NPC_VALIANCE_KEEP_CANNONEER, Position::new(2300.0, 5200.0, 10.0, 0.0));

        host.run_for(Duration::from_secs(40), TICK);
        assert!(shots(&host, cannon).is_empty());
        assert!(host
            .world()
            .effects_of(cannoneer)
            .contains(&Effect::Emote(Emote::Kneel)));
    }
}
