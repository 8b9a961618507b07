use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::world::actor::{Effect, Entry};
use std::time::Duration;

pub const NPC_BLOODMAGE_LAURITH: Entry = Entry(25381);
pub const SPELL_BLOODSPORE_RUINATION: u32 = 45997;
const SAY_BLOODMAGE_LAURITH: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Talk,
    ResetOrientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
}

/// Turns to whoever used Bloodspore Ruination nearby, taunts them, then
/// turns back to his spawn facing.
#[derive(Debug, Default)]
pub struct BloodmageLaurith {
    home_orientation: f32,
}

impl ActorScript for BloodmageLaurith {
    type Event = Event;
    type Action = ();
    type Role = Role;

    const NAME: &'static str = "bloodmage_laurith";

    fn on_spawn(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        if let Some(me) = ctx.view() {
            self.home_orientation = me.position.orientation;
        }
    }

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        let Trigger::SetTarget(player) = trigger else {
            return;
        };
        if ctx.peer_ref(Role::Player).is_some() {
            return;
        }
        ctx.set_peer(Role::Player, player);
        if let (Some(me), Some(target)) = (ctx.view(), ctx.resolve(player)) {
            ctx.perform(Effect::Face(me.position.angle_to(target.position)));
        }
        ctx.schedule(Event::Talk, Duration::from_secs(1));
    }

    fn on_event(&mut self, event: Event, ctx: &mut ScriptContext<'_, Self>) {
        match event {
            Event::Talk => {
                if let Some(player) = ctx.take_peer(Role::Player) {
                    if ctx.resolve(player).is_some() {
                        ctx.perform(Effect::Talk {
                            text: SAY_BLOODMAGE_LAURITH,
                            target: Some(player),
                        });
                    }
                }
                ctx.schedule(Event::ResetOrientation, Duration::from_secs(5));
            }
            Event::ResetOrientation => ctx.perform(Effect::Face(self.home_orientation)),
        }
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.take_peer(Role::Player);
    }
}
