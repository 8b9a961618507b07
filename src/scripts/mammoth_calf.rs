use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::world::actor::{ActorView, Effect, Entry};
use rand::Rng;
use std::f32::consts::TAU;
use std::time::Duration;

pub const NPC_TRAPPED_MAMMOTH_CALF: Entry = Entry(25850);

pub const MAMMOTH_TRAPS: [Entry; 22] = [
    Entry(188022),
    Entry(188024),
    Entry(188025),
    Entry(188026),
    Entry(188027),
    Entry(188028),
    Entry(188029),
    Entry(188030),
    Entry(188031),
    Entry(188032),
    Entry(188033),
    Entry(188034),
    Entry(188035),
    Entry(188036),
    Entry(188037),
    Entry(188038),
    Entry(188039),
    Entry(188040),
    Entry(188041),
    Entry(188042),
    Entry(188043),
    Entry(188044),
];

/// Action a trap sends once a player frees the calf.
pub const ACTION_FREED: i32 = 1;

const TRAP_RANGE: f32 = 11.0;
const WANDER_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Wander,
}

/// A calf caught in a trap. Once freed it trots off a few yards and vanishes.
#[derive(Debug, Default)]
pub struct TrappedMammothCalf {
    freed: bool,
}

impl TrappedMammothCalf {
    fn nearest_trap(ctx: &ScriptContext<'_, Self>) -> Option<ActorView> {
        MAMMOTH_TRAPS
            .iter()
            .find_map(|trap| ctx.nearest(*trap, TRAP_RANGE))
    }
}

impl ActorScript for TrappedMammothCalf {
    type Event = Event;
    type Action = ();
    type Role = ();

    const NAME: &'static str = "trapped_mammoth_calf";

    fn on_spawn(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        self.on_reset(ctx);
    }

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        if trigger != Trigger::Action(ACTION_FREED) || self.freed {
            return;
        }
        self.freed = true;
        ctx.schedule(Event::Wander, Duration::from_millis(1500));
    }

    fn on_event(&mut self, _event: Event, ctx: &mut ScriptContext<'_, Self>) {
        let Some(me) = ctx.view() else {
            return;
        };
        let angle = ctx.rng().gen_range(0.0..TAU);
        let distance = ctx.rng().gen_range(0.0..=WANDER_RADIUS);
        let mut destination = me.position;
        destination.x += distance * angle.cos();
        destination.y += distance * angle.sin();
        let actor = me.actor;
        ctx.move_to(actor, 0, destination);
    }

    fn on_movement_complete(&mut self, _point: u32, ctx: &mut ScriptContext<'_, Self>) {
        if let Some(trap) = Self::nearest_trap(ctx) {
            ctx.perform_on(trap.actor, Effect::Custom("trap_deactivated"));
        }
        let me = ctx.me();
        ctx.kill(me);
        ctx.destroy(me);
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        self.freed = false;
        if let Some(trap) = Self::nearest_trap(ctx) {
            ctx.perform_on(trap.actor, Effect::Activate);
        }
    }
}
