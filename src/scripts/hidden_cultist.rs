use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::scripting::phase::{PhaseTable, PhaseTableError, IDLE};
use crate::world::actor::{ActorRef, Effect, Emote, Entry, Faction};
use std::time::Duration;

pub const NPC_TOM_HEGGER: Entry = Entry(25827);
pub const NPC_SALTY_JOHN_THORPE: Entry = Entry(25248);
pub const NPC_GUARD_MITCHELLS: Entry = Entry(25828);

pub const SPELL_SHROUD_OF_THE_DEATH_CULTIST: u32 = 46077;
pub const QUEST_THE_HUNT_IS_ON: u32 = 11794;
pub const GOSSIP_ACTION_ACCUSE: u32 = 1001;

pub const SAY_HIDDEN_CULTIST_1: u8 = 0;
pub const SAY_HIDDEN_CULTIST_2: u8 = 1;
pub const SAY_HIDDEN_CULTIST_3: u8 = 2;
pub const SAY_HIDDEN_CULTIST_4: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Confess,
    Threaten,
    Strike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Accuser,
}

/// A townsperson who turns out to be a cultist once a player sees through him.
///
/// Tom Hegger and Guard Mitchells attack after one line; Salty John Thorpe
/// gets a second line and a short pause first.
#[derive(Debug, Default)]
pub struct HiddenCultist {
    /// Looping emote the disguise had before the accusation.
    disguise_emote: Emote,
}

impl HiddenCultist {
    fn attack_accuser(ctx: &mut ScriptContext<'_, Self>) {
        ctx.perform(Effect::Faction(Faction::Monster));
        if let Some(player) = ctx.peer(Role::Accuser).filter(|view| view.alive) {
            ctx.perform(Effect::Attack(player.actor));
        }
    }

    fn face_accuser(ctx: &mut ScriptContext<'_, Self>) {
        let (Some(me), Some(player)) = (ctx.view(), ctx.peer(Role::Accuser)) else {
            return;
        };
        ctx.perform(Effect::Face(me.position.angle_to(player.position)));
    }

    fn entry(ctx: &ScriptContext<'_, Self>) -> Option<Entry> {
        ctx.view().map(|me| me.entry)
    }
}

impl ActorScript for HiddenCultist {
    type Event = ();
    type Action = Step;
    type Role = Role;

    const NAME: &'static str = "hidden_cultist";

    fn phase_table() -> Result<PhaseTable<Step>, PhaseTableError> {
        PhaseTable::builder()
            .step(1, Step::Confess, 2, Duration::from_secs(5))
            .step(2, Step::Threaten, 3, Duration::from_secs(3))
            .step(3, Step::Strike, IDLE, Duration::ZERO)
            .build()
    }

    fn on_spawn(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        let me = ctx.me();
        ctx.perform(Effect::Cast {
            spell: SPELL_SHROUD_OF_THE_DEATH_CULTIST,
            target: me,
        });
    }

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        let Trigger::GossipSelect { player, action } = trigger else {
            return;
        };
        if action != GOSSIP_ACTION_ACCUSE || ctx.phase() != IDLE {
            return;
        }
        ctx.set_peer(Role::Accuser, player);
        if let Some(me) = ctx.view() {
            self.disguise_emote = me.emote_state;
        }
        ctx.perform(Effect::Custom("stop_moving"));
        ctx.perform(Effect::QuestGiver(false));
        ctx.perform(Effect::EmoteState(Emote::None));
        Self::face_accuser(ctx);
        ctx.start_phase(1, Duration::from_secs(3));
    }

    fn on_phase(&mut self, step: Step, ctx: &mut ScriptContext<'_, Self>) {
        let Some(entry) = Self::entry(ctx) else {
            return;
        };
        match step {
            Step::Confess => {
                let (text, target) = match entry {
                    NPC_SALTY_JOHN_THORPE => (SAY_HIDDEN_CULTIST_1, None),
                    NPC_GUARD_MITCHELLS => (SAY_HIDDEN_CULTIST_2, None),
                    NPC_TOM_HEGGER => match ctx.peer_ref(Role::Accuser) {
                        Some(player) => (SAY_HIDDEN_CULTIST_3, Some(player)),
                        None => return,
                    },
                    _ => return,
                };
                ctx.perform(Effect::Talk { text, target });
            }
            Step::Threaten => {
                if entry == NPC_SALTY_JOHN_THORPE {
                    ctx.perform(Effect::Talk {
                        text: SAY_HIDDEN_CULTIST_4,
                        target: None,
                    });
                    Self::face_accuser(ctx);
                } else {
                    Self::attack_accuser(ctx);
                    ctx.stop_phase();
                }
            }
            Step::Strike => Self::attack_accuser(ctx),
        }
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.take_peer(Role::Accuser);
        ctx.perform(Effect::EmoteState(self.disguise_emote));
        ctx.perform(Effect::QuestGiver(true));
        let me = ctx.me();
        ctx.perform(Effect::Cast {
            spell: SPELL_SHROUD_OF_THE_DEATH_CULTIST,
            target: me,
        });
        ctx.perform(Effect::Faction(Faction::Friendly));
    }
}

/// Gossip choice a player picks to accuse a cultist.
pub fn accuse(player: ActorRef) -> Trigger {
    Trigger::GossipSelect {
        player,
        action: GOSSIP_ACTION_ACCUSE,
    }
}
