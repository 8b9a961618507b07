use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::scripting::world::ScriptWorld;
use crate::world::actor::{ActorRef, Effect, Entry};
use crate::world::position::Position;
use tracing::debug;

pub const NPC_BERYL_SORCERER: Entry = Entry(25316);
pub const NPC_CAPTURED_BERYL_SORCERER: Entry = Entry(25474);
pub const NPC_LIBRARIAN_DONATHAN: Entry = Entry(25262);

pub const SPELL_ARCANE_CHAINS: u32 = 45611;
pub const SPELL_COSMETIC_ENSLAVE_CHAINS_SELF: u32 = 45631;

/// Chains only hold once the sorcerer is at or below this much health.
const CAPTURE_HEALTH_PCT: u8 = 50;
const INTERACTION_DISTANCE: f32 = 5.0;
const FOLLOW_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Captor,
}

/// A sorcerer that can be chained once weakened, follows its captor and
/// vanishes when delivered to Librarian Donathan.
#[derive(Debug, Default)]
pub struct BerylSorcerer {
    enslaved: bool,
    heading: Option<Position>,
}

impl BerylSorcerer {
    pub fn is_enslaved(&self) -> bool {
        self.enslaved
    }

    fn follow(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        let (Some(me), Some(captor)) = (ctx.view(), ctx.peer(Role::Captor)) else {
            return;
        };
        if me.position.distance_to(captor.position) <= FOLLOW_DISTANCE
            || self.heading == Some(captor.position)
        {
            return;
        }
        self.heading = Some(captor.position);
        ctx.move_to(me.actor, 0, captor.position);
    }
}

impl ActorScript for BerylSorcerer {
    type Event = ();
    type Action = ();
    type Role = Role;

    const NAME: &'static str = "beryl_sorcerer";

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        let Trigger::SpellHit { caster, spell } = trigger else {
            return;
        };
        if spell != SPELL_ARCANE_CHAINS || self.enslaved {
            return;
        }
        if !ctx.resolve(caster).is_some_and(|view| view.is_player()) {
            return;
        }
        if !ctx.view().is_some_and(|me| me.health_pct <= CAPTURE_HEALTH_PCT) {
            debug!(sorcerer = %ctx.me(), "chains shrugged off");
            return;
        }

        let me = ctx.me();
        ctx.world().set_in_combat(me, false);
        ctx.perform(Effect::Custom("react_passive"));
        ctx.set_peer(Role::Captor, caster);
        ctx.perform(Effect::Morph(NPC_CAPTURED_BERYL_SORCERER));
        ctx.perform(Effect::Cast {
            spell: SPELL_COSMETIC_ENSLAVE_CHAINS_SELF,
            target: me,
        });
        ctx.perform_on(
            caster,
            Effect::KillCredit {
                player: caster,
                entry: NPC_CAPTURED_BERYL_SORCERER,
            },
        );
        self.enslaved = true;
    }

    fn on_tick(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        if !self.enslaved {
            return;
        }
        if ctx.nearest(NPC_LIBRARIAN_DONATHAN, INTERACTION_DISTANCE).is_some() {
            let me = ctx.me();
            ctx.take_peer(Role::Captor);
            ctx.perform(Effect::Custom("follow_complete"));
            ctx.kill(me);
            ctx.destroy(me);
            return;
        }
        self.follow(ctx);
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        self.enslaved = false;
        self.heading = None;
        ctx.take_peer(Role::Captor);
        ctx.perform(Effect::Custom("react_aggressive"));
    }
}

/// The spell hit a sorcerer receives when `caster` throws Arcane Chains.
pub fn arcane_chains(caster: ActorRef) -> Trigger {
    Trigger::SpellHit {
        caster,
        spell: SPELL_ARCANE_CHAINS,
    }
}
