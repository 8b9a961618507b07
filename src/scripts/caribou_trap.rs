use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::world::actor::{ActorRef, Effect, Emote, Entry, Lifetime};
use std::time::Duration;
use tracing::debug;

/// Every trap object placed around the Nesingwary camp.
pub const CARIBOU_TRAPS: [Entry; 15] = [
    Entry(187982),
    Entry(187995),
    Entry(187996),
    Entry(187997),
    Entry(187998),
    Entry(187999),
    Entry(188000),
    Entry(188001),
    Entry(188002),
    Entry(188003),
    Entry(188004),
    Entry(188005),
    Entry(188006),
    Entry(188007),
    Entry(188008),
];

pub const GO_HIGH_QUALITY_FUR: Entry = Entry(187983);
pub const NPC_NESINGWARY_TRAPPER: Entry = Entry(25835);

pub const SPELL_PLACE_FAKE_FUR: u32 = 46085;
pub const SPELL_TRAPPED: u32 = 46104;

const SAY_NESINGWARY_1: u8 = 0;

const FUR_LIFETIME: Duration = Duration::from_secs(20);
const TRAPPER_CORPSE: Duration = Duration::from_secs(6);
const TRAPPER_SPAWN_DISTANCE: f32 = 21.0;
const TRAPPER_WALK_DISTANCE: f32 = 20.0;
/// The sprung trap stays out of play this long before it can be used again.
pub const TRAP_RESPAWN: Duration = Duration::from_secs(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    FurSpawn,
    SpawnTrapper,
    TrapperMove,
    TrapperText,
    TrapperLoot,
    FurDespawn,
    TrapperDie,
    DespawnAll,
    Respawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Fur,
    Trapper,
    Player,
}

/// A trap that lures a trapper to a planted fur, then springs on him.
///
/// Once sprung the trap despawns and takes no furs until it respawns.
#[derive(Debug, Default)]
pub struct CaribouTrap {
    armed: bool,
    despawned: bool,
}

impl CaribouTrap {
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_despawned(&self) -> bool {
        self.despawned
    }
}

impl ActorScript for CaribouTrap {
    type Event = Event;
    type Action = ();
    type Role = Role;

    const NAME: &'static str = "caribou_trap";

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        let Trigger::SpellHit { caster, spell } = trigger else {
            return;
        };
        if self.armed || self.despawned || spell != SPELL_PLACE_FAKE_FUR {
            return;
        }
        if !ctx.resolve(caster).is_some_and(|view| view.is_player()) {
            return;
        }
        self.armed = true;
        ctx.set_peer(Role::Player, caster);
        ctx.schedule(Event::FurSpawn, Duration::from_secs(1));
    }

    fn on_event(&mut self, event: Event, ctx: &mut ScriptContext<'_, Self>) {
        let Some(me) = ctx.view() else {
            return;
        };
        match event {
            Event::FurSpawn => {
                if let Some(fur) = ctx.spawn(GO_HIGH_QUALITY_FUR, me.position, Lifetime::Timed(FUR_LIFETIME)) {
                    ctx.set_peer(Role::Fur, fur);
                }
                ctx.schedule(Event::SpawnTrapper, Duration::from_secs(1));
            }
            Event::SpawnTrapper => {
                let at = me.position.offset_forward(TRAPPER_SPAWN_DISTANCE);
                if let Some(trapper) = ctx.spawn(NPC_NESINGWARY_TRAPPER, at, Lifetime::DeadDespawn(TRAPPER_CORPSE)) {
                    ctx.perform_on(trapper, Effect::Face(at.angle_to(me.position)));
                    ctx.set_peer(Role::Trapper, trapper);
                }
                ctx.schedule(Event::TrapperMove, Duration::from_secs(1));
            }
            Event::TrapperMove => {
                if let Some(trapper) = ctx.peer(Role::Trapper) {
                    let destination = trapper.position.offset_forward(TRAPPER_WALK_DISTANCE);
                    ctx.move_to(trapper.actor, 0, destination);
                }
                ctx.schedule(Event::TrapperText, Duration::from_secs(5));
            }
            Event::TrapperText => {
                if let Some(trapper) = ctx.peer(Role::Trapper).filter(|view| view.alive) {
                    let player = ctx.peer_ref(Role::Player);
                    ctx.perform_on(
                        trapper.actor,
                        Effect::Talk {
                            text: SAY_NESINGWARY_1,
                            target: player,
                        },
                    );
                }
                ctx.schedule(Event::TrapperLoot, Duration::from_secs(2));
            }
            Event::TrapperLoot => {
                if let Some(trapper) = ctx.peer(Role::Trapper).filter(|view| view.alive) {
                    ctx.perform_on(trapper.actor, Effect::Emote(Emote::Loot));
                }
                ctx.schedule(Event::FurDespawn, Duration::from_secs(1));
            }
            Event::FurDespawn => {
                ctx.destroy_peer(Role::Fur);
                ctx.schedule(Event::TrapperDie, Duration::from_secs(1));
            }
            Event::TrapperDie => {
                ctx.perform(Effect::Activate);
                if let Some(trapper) = ctx.peer(Role::Trapper).filter(|view| view.alive) {
                    if let Some(player) = ctx.peer(Role::Player) {
                        ctx.perform_on(
                            player.actor,
                            Effect::KillCredit {
                                player: player.actor,
                                entry: trapper.entry,
                            },
                        );
                    }
                    ctx.perform_on(
                        trapper.actor,
                        Effect::Cast {
                            spell: SPELL_TRAPPED,
                            target: trapper.actor,
                        },
                    );
                    ctx.kill(trapper.actor);
                } else {
                    debug!(trap = %ctx.me(), "trapper gone before the trap sprung");
                }
                ctx.schedule(Event::DespawnAll, Duration::from_secs(1));
            }
            Event::DespawnAll => {
                ctx.destroy_peer(Role::Fur);
                ctx.destroy_peer(Role::Trapper);
                ctx.take_peer(Role::Player);
                ctx.perform(Effect::Custom("despawned"));
                self.armed = false;
                self.despawned = true;
                ctx.schedule(Event::Respawn, TRAP_RESPAWN);
            }
            Event::Respawn => {
                self.despawned = false;
                ctx.perform(Effect::Custom("respawned"));
            }
        }
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        self.armed = false;
        self.despawned = false;
        ctx.take_peer(Role::Player);
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.destroy_peer(Role::Fur);
        ctx.destroy_peer(Role::Trapper);
    }
}

/// The spell hit a trap receives when `caster` plants a fur on it.
pub fn place_fur(caster: ActorRef) -> Trigger {
    Trigger::SpellHit {
        caster,
        spell: SPELL_PLACE_FAKE_FUR,
    }
}
