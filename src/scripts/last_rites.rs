//! "Last Rites": Thassarian escorts the player to Valanar's ritual.
//!
//! Thassarian summons the Lich King's image and Counselor Talbot, waits for
//! both to walk into place, runs the dialogue, then summons Arlos and Leryssa
//! and waits again before the confrontation. Every summoned peer reports back
//! by raising one of Thassarian's flags; nobody reaches into another script.

use crate::scripting::controller::{ActorScript, ScriptContext, Trigger};
use crate::scripting::flags::Flag;
use crate::scripting::phase::{PhaseTable, PhaseTableError, IDLE};
use crate::world::actor::{ActorRef, Effect, Entry, Faction, Lifetime, StandState};
use crate::world::position::Position;
use std::time::Duration;
use tracing::debug;

pub const QUEST_LAST_RITES: u32 = 12019;
pub const GOSSIP_ACTION_START: u32 = 1001;

pub const NPC_THASSARIAN: Entry = Entry(26170);
pub const NPC_IMAGE_LICH_KING: Entry = Entry(26203);
pub const NPC_COUNSELOR_TALBOT: Entry = Entry(25301);
pub const NPC_PRINCE_VALANAR: Entry = Entry(28189);
pub const NPC_GENERAL_ARLOS: Entry = Entry(25250);
pub const NPC_LERYSSA: Entry = Entry(25251);

pub const SPELL_STUN: u32 = 46957;
pub const SPELL_SHADOW_BOLT: u32 = 15537;
pub const SPELL_DEFLECTION: u32 = 51009;
pub const SPELL_SOUL_BLAST: u32 = 50992;

pub const ARTHAS_IN_POSITION: Flag = Flag("arthas_in_position");
pub const TALBOT_IN_POSITION: Flag = Flag("talbot_in_position");
pub const ARLOS_IN_POSITION: Flag = Flag("arlos_in_position");
pub const LERYSSA_IN_POSITION: Flag = Flag("leryssa_in_position");
pub const REUNION_OVER: Flag = Flag("reunion_over");
pub const FIND_CAPTIVES: Flag = Flag("find_captives");

const FIRST_WITNESSES: &[Flag] = &[ARTHAS_IN_POSITION, TALBOT_IN_POSITION];
const CAPTIVES: &[Flag] = &[ARLOS_IN_POSITION, LERYSSA_IN_POSITION];

/// Dialogue line ids, per speaker.
pub mod say {
    pub const THASSARIAN_1: u8 = 0;
    pub const THASSARIAN_2: u8 = 1;
    pub const THASSARIAN_3: u8 = 2;
    pub const THASSARIAN_4: u8 = 3;
    pub const THASSARIAN_5: u8 = 4;
    pub const THASSARIAN_6: u8 = 5;
    pub const THASSARIAN_7: u8 = 6;
    pub const TALBOT_1: u8 = 0;
    pub const TALBOT_2: u8 = 1;
    pub const TALBOT_3: u8 = 2;
    pub const TALBOT_4: u8 = 3;
    pub const LICH_1: u8 = 0;
    pub const LICH_2: u8 = 1;
    pub const LICH_3: u8 = 2;
    pub const ARLOS_1: u8 = 0;
    pub const ARLOS_2: u8 = 1;
    pub const LERYSSA_1: u8 = 0;
    pub const LERYSSA_2: u8 = 1;
    pub const LERYSSA_3: u8 = 2;
    pub const LERYSSA_4: u8 = 3;
}

pub const WAYPOINT_RITUAL: u32 = 3;
pub const WAYPOINT_CONFRONTATION: u32 = 4;

pub const RITUAL_POINT: Position = Position::new(3721.9, 3566.9, 477.44, 0.0);
pub const CONFRONTATION_POINT: Position = Position::new(3729.2, 3568.0, 477.44, 0.0);

const ARTHAS_SPAWN: Position = Position::new(3730.313, 3518.689, 473.324, 1.562);
const ARTHAS_MARK: Position = Position::new(3737.375, 3564.841, 477.433, 0.0);
const TALBOT_SPAWN: Position = Position::new(3747.23, 3614.936, 473.321, 4.462);
const TALBOT_MARK: Position = Position::new(3738.001, 3568.882, 477.433, 0.0);
const ARLOS_SPAWN: Position = Position::new(3745.527, 3615.655, 473.322, 4.448);
const ARLOS_MARK: Position = Position::new(3735.57, 3572.42, 477.441, 0.0);
const LERYSSA_SPAWN: Position = Position::new(3749.655, 3614.96, 473.323, 4.525);
const LERYSSA_MARK: Position = Position::new(3741.97, 3571.44, 477.441, 0.0);
pub const LERYSSA_REUNION: Position = Position::new(3722.115, 3564.202, 477.441, 0.0);

const SUMMON_LIFETIME: Lifetime = Lifetime::CorpseTimed(Duration::from_secs(120));
const SEARCH_RANGE: f32 = 50.0;

const fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Arthas,
    Talbot,
    Arlos,
    Leryssa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    TalbotKneels,
    TalbotUnmasked,
    TalbotFirstWords,
    LichKingAnswers,
    TalbotSecondWords,
    SummonCaptives,
    Challenge,
    LichKingDeparts,
    ThassarianAccuses,
    TalbotThirdWords,
    LichKingLastWords,
    TalbotLastWords,
    ArthasVanishes,
    TalbotStrikes,
    Engage,
    OfferQuest,
    Dismiss,
}

/// Escort leader. Phases 1 through 6 run the ritual, 7 through 15 the
/// confrontation and 16 to 17 the aftermath.
#[derive(Debug, Default)]
pub struct Thassarian {
    escorting: bool,
}

impl Thassarian {
    pub fn is_escorting(&self) -> bool {
        self.escorting
    }

    fn waypoint_reached(&mut self, waypoint: u32, ctx: &mut ScriptContext<'_, Self>) {
        if ctx.peer(Role::Player).is_none() {
            debug!(actor = %ctx.me(), waypoint, "escort player gone");
            return;
        }
        match waypoint {
            WAYPOINT_RITUAL => {
                ctx.perform(Effect::Custom("escort_paused"));
                if let Some(arthas) = ctx.spawn(NPC_IMAGE_LICH_KING, ARTHAS_SPAWN, SUMMON_LIFETIME) {
                    ctx.set_peer(Role::Arthas, arthas);
                    ctx.perform_on(arthas, Effect::Attackable(false));
                    ctx.perform_on(arthas, Effect::Walk(true));
                    ctx.move_to(arthas, 0, ARTHAS_MARK);
                }
                if let Some(talbot) = ctx.spawn(NPC_COUNSELOR_TALBOT, TALBOT_SPAWN, SUMMON_LIFETIME) {
                    ctx.set_peer(Role::Talbot, talbot);
                    ctx.perform_on(talbot, Effect::Walk(true));
                    ctx.move_to(talbot, 0, TALBOT_MARK);
                }
                ctx.perform(Effect::Walk(false));
                ctx.start_phase(1, Duration::ZERO);
            }
            WAYPOINT_CONFRONTATION => {
                ctx.perform(Effect::Custom("escort_paused"));
                ctx.start_phase(7, Duration::ZERO);
            }
            _ => {}
        }
    }

    fn talk(ctx: &mut ScriptContext<'_, Self>, role: Role, text: u8) {
        match ctx.peer(role).filter(|view| view.alive) {
            Some(peer) => ctx.perform_on(peer.actor, Effect::Talk { text, target: None }),
            None => debug!(actor = %ctx.me(), ?role, text, "speaker missing, line skipped"),
        }
    }

    fn dismiss_everyone(ctx: &mut ScriptContext<'_, Self>) {
        for role in [Role::Arthas, Role::Talbot, Role::Arlos, Role::Leryssa] {
            ctx.destroy_peer(role);
        }
    }
}

impl ActorScript for Thassarian {
    type Event = ();
    type Action = Step;
    type Role = Role;

    const NAME: &'static str = "thassarian";

    fn phase_table() -> Result<PhaseTable<Step>, PhaseTableError> {
        PhaseTable::builder()
            .gated(1, FIRST_WITNESSES, Step::TalbotKneels, 2, secs(3))
            .step(2, Step::TalbotUnmasked, 3, secs(5))
            .step(3, Step::TalbotFirstWords, 4, secs(5))
            .step(4, Step::LichKingAnswers, 5, secs(5))
            .step(5, Step::TalbotSecondWords, 6, secs(5))
            .step(6, Step::SummonCaptives, IDLE, Duration::ZERO)
            .step(7, Step::Challenge, 8, secs(5))
            .step(8, Step::LichKingDeparts, 9, secs(5))
            .step(9, Step::ThassarianAccuses, 10, secs(5))
            .step(10, Step::TalbotThirdWords, 11, secs(5))
            .step(11, Step::LichKingLastWords, 12, secs(5))
            .step(12, Step::TalbotLastWords, 13, secs(2))
            .step(13, Step::ArthasVanishes, 14, Duration::ZERO)
            .step(14, Step::TalbotStrikes, 15, Duration::from_millis(1500))
            .step(15, Step::Engage, IDLE, Duration::ZERO)
            .step(16, Step::OfferQuest, 17, secs(20))
            .step(17, Step::Dismiss, IDLE, Duration::ZERO)
            .build()
    }

    fn on_trigger(&mut self, trigger: Trigger, ctx: &mut ScriptContext<'_, Self>) {
        match trigger {
            Trigger::GossipSelect { player, action } if action == GOSSIP_ACTION_START => {
                if self.escorting {
                    return;
                }
                self.escorting = true;
                ctx.set_peer(Role::Player, player);
                ctx.perform(Effect::Walk(true));
                ctx.perform(Effect::Custom("escort_started"));
                let me = ctx.me();
                ctx.move_to(me, WAYPOINT_RITUAL, RITUAL_POINT);
            }
            Trigger::WaypointReached(waypoint) => self.waypoint_reached(waypoint, ctx),
            _ => {}
        }
    }

    fn on_movement_complete(&mut self, point: u32, ctx: &mut ScriptContext<'_, Self>) {
        if self.escorting {
            self.waypoint_reached(point, ctx);
        }
    }

    fn on_tick(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        if ctx.take_flags(CAPTIVES) {
            ctx.perform(Effect::Talk {
                text: say::THASSARIAN_1,
                target: None,
            });
            ctx.perform(Effect::Custom("escort_resumed"));
            let me = ctx.me();
            ctx.move_to(me, WAYPOINT_CONFRONTATION, CONFRONTATION_POINT);
        }
        if ctx.take_flags(&[REUNION_OVER]) {
            ctx.start_phase(16, Duration::ZERO);
        }
    }

    fn on_phase(&mut self, step: Step, ctx: &mut ScriptContext<'_, Self>) {
        match step {
            Step::TalbotKneels => {
                if let Some(talbot) = ctx.peer_ref(Role::Talbot) {
                    ctx.perform_on(talbot, Effect::Stand(StandState::Kneel));
                }
            }
            Step::TalbotUnmasked => {
                if let Some(talbot) = ctx.peer(Role::Talbot) {
                    ctx.perform_on(talbot.actor, Effect::Morph(NPC_PRINCE_VALANAR));
                    ctx.perform_on(talbot.actor, Effect::Faction(Faction::Monster));
                    ctx.perform_on(talbot.actor, Effect::Attackable(false));
                }
            }
            Step::TalbotFirstWords => Self::talk(ctx, Role::Talbot, say::TALBOT_1),
            Step::LichKingAnswers => Self::talk(ctx, Role::Arthas, say::LICH_1),
            Step::TalbotSecondWords => Self::talk(ctx, Role::Talbot, say::TALBOT_2),
            Step::SummonCaptives => {
                if let Some(arlos) = ctx.spawn(NPC_GENERAL_ARLOS, ARLOS_SPAWN, SUMMON_LIFETIME) {
                    ctx.set_peer(Role::Arlos, arlos);
                    ctx.perform_on(arlos, Effect::Walk(true));
                    ctx.move_to(arlos, 0, ARLOS_MARK);
                }
                if let Some(leryssa) = ctx.spawn(NPC_LERYSSA, LERYSSA_SPAWN, SUMMON_LIFETIME) {
                    ctx.set_peer(Role::Leryssa, leryssa);
                    ctx.perform_on(leryssa, Effect::Walk(false));
                    ctx.perform_on(leryssa, Effect::Attackable(false));
                    ctx.move_to(leryssa, 0, LERYSSA_MARK);
                }
            }
            Step::Challenge => ctx.perform(Effect::Talk {
                text: say::THASSARIAN_2,
                target: None,
            }),
            Step::LichKingDeparts => {
                let (Some(arthas), Some(talbot)) = (ctx.peer(Role::Arthas), ctx.peer(Role::Talbot)) else {
                    return;
                };
                if let Some(me) = ctx.view() {
                    ctx.perform_on(arthas.actor, Effect::Face(arthas.position.angle_to(me.position)));
                }
                ctx.perform_on(talbot.actor, Effect::Stand(StandState::Stand));
                ctx.perform_on(
                    arthas.actor,
                    Effect::Talk {
                        text: say::LICH_2,
                        target: None,
                    },
                );
            }
            Step::ThassarianAccuses => ctx.perform(Effect::Talk {
                text: say::THASSARIAN_3,
                target: None,
            }),
            Step::TalbotThirdWords => Self::talk(ctx, Role::Talbot, say::TALBOT_3),
            Step::LichKingLastWords => Self::talk(ctx, Role::Arthas, say::LICH_3),
            Step::TalbotLastWords => Self::talk(ctx, Role::Talbot, say::TALBOT_4),
            Step::ArthasVanishes => ctx.destroy_peer(Role::Arthas),
            Step::TalbotStrikes => {
                ctx.perform(Effect::Attackable(true));
                if let Some(talbot) = ctx.peer(Role::Talbot).filter(|view| view.alive) {
                    let me = ctx.me();
                    ctx.perform_on(talbot.actor, Effect::Attackable(true));
                    ctx.perform_on(
                        talbot.actor,
                        Effect::Cast {
                            spell: SPELL_SHADOW_BOLT,
                            target: me,
                        },
                    );
                }
            }
            Step::Engage => {
                if let Some(talbot) = ctx.peer(Role::Talbot).filter(|view| view.alive) {
                    ctx.perform(Effect::Attack(talbot.actor));
                }
            }
            Step::OfferQuest => ctx.perform(Effect::QuestGiver(true)),
            Step::Dismiss => {
                ctx.destroy_peer(Role::Leryssa);
                ctx.destroy_peer(Role::Arlos);
                ctx.destroy_peer(Role::Talbot);
                ctx.perform(Effect::Stand(StandState::Stand));
                ctx.perform(Effect::Custom("escort_resumed"));
                self.escorting = false;
            }
        }
    }

    fn on_death(&mut self, _killer: Option<ActorRef>, ctx: &mut ScriptContext<'_, Self>) {
        Self::dismiss_everyone(ctx);
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.perform(Effect::Faction(Faction::Friendly));
        ctx.perform(Effect::Stand(StandState::Stand));
        Self::dismiss_everyone(ctx);
        ctx.take_peer(Role::Player);
        self.escorting = false;
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        Self::dismiss_everyone(ctx);
    }
}

/// Image of the Lich King: walks to its mark and reports in.
#[derive(Debug, Default)]
pub struct ImageOfLichKing;

impl ActorScript for ImageOfLichKing {
    type Event = ();
    type Action = ();
    type Role = ();

    const NAME: &'static str = "image_lich_king";

    fn on_movement_complete(&mut self, _point: u32, ctx: &mut ScriptContext<'_, Self>) {
        ctx.signal_summoner(ARTHAS_IN_POSITION);
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.perform(Effect::Faction(Faction::Friendly));
    }
}

/// General Arlos: stunned in place once he arrives.
#[derive(Debug, Default)]
pub struct GeneralArlos;

impl ActorScript for GeneralArlos {
    type Event = ();
    type Action = ();
    type Role = ();

    const NAME: &'static str = "general_arlos";

    fn on_movement_complete(&mut self, _point: u32, ctx: &mut ScriptContext<'_, Self>) {
        let me = ctx.me();
        ctx.perform(Effect::Cast {
            spell: SPELL_STUN,
            target: me,
        });
        ctx.signal_summoner(ARLOS_IN_POSITION);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalbotEvent {
    ShadowBolt,
    Deflection,
    SoulBlast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Captive {
    Leryssa,
    Arlos,
}

/// Counselor Talbot, later unmasked as Prince Valanar.
#[derive(Debug, Default)]
pub struct CounselorTalbot {
    engaged: bool,
}

impl CounselorTalbot {
    fn engage(ctx: &mut ScriptContext<'_, Self>) {
        ctx.schedule_range(TalbotEvent::ShadowBolt, secs(5), secs(12));
        ctx.schedule_range(TalbotEvent::Deflection, secs(20), secs(25));
        ctx.schedule_range(TalbotEvent::SoulBlast, secs(12), secs(18));
    }
}

impl ActorScript for CounselorTalbot {
    type Event = TalbotEvent;
    type Action = ();
    type Role = Captive;

    const NAME: &'static str = "counselor_talbot";

    fn on_movement_complete(&mut self, _point: u32, ctx: &mut ScriptContext<'_, Self>) {
        ctx.signal_summoner(TALBOT_IN_POSITION);
    }

    fn on_tick(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        if ctx.take_flags(&[FIND_CAPTIVES]) {
            if let Some(leryssa) = ctx.nearest(NPC_LERYSSA, SEARCH_RANGE) {
                ctx.set_peer(Captive::Leryssa, leryssa.actor);
            }
            if let Some(arlos) = ctx.nearest(NPC_GENERAL_ARLOS, SEARCH_RANGE) {
                ctx.set_peer(Captive::Arlos, arlos.actor);
            }
        }

        let in_combat = ctx.view().is_some_and(|me| me.in_combat);
        if in_combat && !self.engaged {
            self.engaged = true;
            Self::engage(ctx);
        } else if !in_combat && self.engaged {
            self.engaged = false;
            ctx.clear_events();
        }
    }

    fn on_event(&mut self, event: TalbotEvent, ctx: &mut ScriptContext<'_, Self>) {
        let (spell, min, max) = match event {
            TalbotEvent::ShadowBolt => (SPELL_SHADOW_BOLT, secs(5), secs(12)),
            TalbotEvent::Deflection => (SPELL_DEFLECTION, secs(20), secs(25)),
            TalbotEvent::SoulBlast => (SPELL_SOUL_BLAST, secs(12), secs(18)),
        };
        if let Some(victim) = ctx.victim() {
            ctx.perform(Effect::Cast {
                spell,
                target: victim.actor,
            });
        }
        ctx.schedule_range(event, min, max);
    }

    fn on_death(&mut self, killer: Option<ActorRef>, ctx: &mut ScriptContext<'_, Self>) {
        let (Some(leryssa), Some(arlos)) = (ctx.peer(Captive::Leryssa), ctx.peer(Captive::Arlos)) else {
            debug!(actor = %ctx.me(), "captives unknown, nobody freed");
            return;
        };
        for text in [say::ARLOS_1, say::ARLOS_2] {
            ctx.perform_on(arlos.actor, Effect::Talk { text, target: None });
        }
        ctx.perform_on(
            leryssa.actor,
            Effect::Talk {
                text: say::LERYSSA_1,
                target: None,
            },
        );
        ctx.kill(arlos.actor);
        ctx.perform_on(leryssa.actor, Effect::RemoveAura(SPELL_STUN));
        ctx.perform_on(leryssa.actor, Effect::Walk(false));
        ctx.move_to(leryssa.actor, 0, LERYSSA_REUNION);

        if let Some(player) = killer.and_then(|killer| ctx.resolve(killer)).filter(|view| view.is_player()) {
            ctx.perform_on(
                player.actor,
                Effect::KillCredit {
                    player: player.actor,
                    entry: NPC_PRINCE_VALANAR,
                },
            );
        }
    }

    fn on_reset(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        self.engaged = false;
        ctx.take_peer(Captive::Leryssa);
        ctx.take_peer(Captive::Arlos);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Thassarian(u8),
    Leryssa(u8),
    ThassarianFarewell,
}

/// Leryssa: stunned beside Valanar, then reunited with her brother.
#[derive(Debug, Default)]
pub struct Leryssa {
    arrived: bool,
}

impl ActorScript for Leryssa {
    type Event = ();
    type Action = Line;
    type Role = ();

    const NAME: &'static str = "leryssa";

    fn phase_table() -> Result<PhaseTable<Line>, PhaseTableError> {
        PhaseTable::builder()
            .step(1, Line::Thassarian(say::THASSARIAN_4), 2, secs(5))
            .step(2, Line::Leryssa(say::LERYSSA_2), 3, secs(5))
            .step(3, Line::Thassarian(say::THASSARIAN_5), 4, secs(5))
            .step(4, Line::Leryssa(say::LERYSSA_3), 5, secs(5))
            .step(5, Line::Thassarian(say::THASSARIAN_6), 6, secs(5))
            .step(6, Line::Leryssa(say::LERYSSA_4), 7, secs(5))
            .step(7, Line::ThassarianFarewell, IDLE, Duration::ZERO)
            .build()
    }

    fn on_spawn(&mut self, ctx: &mut ScriptContext<'_, Self>) {
        ctx.perform(Effect::Stand(StandState::Stand));
    }

    fn on_movement_complete(&mut self, _point: u32, ctx: &mut ScriptContext<'_, Self>) {
        if !self.arrived {
            self.arrived = true;
            if let Some(valanar) = ctx.nearest(NPC_PRINCE_VALANAR, SEARCH_RANGE) {
                ctx.signal(valanar.actor, FIND_CAPTIVES);
            }
            let me = ctx.me();
            ctx.perform(Effect::Cast {
                spell: SPELL_STUN,
                target: me,
            });
            ctx.signal_summoner(LERYSSA_IN_POSITION);
        } else {
            ctx.perform(Effect::Stand(StandState::Sit));
            if let Some(brother) = ctx.summoner() {
                ctx.perform_on(brother.actor, Effect::Stand(StandState::Sit));
            }
            ctx.start_phase(1, Duration::from_millis(1500));
        }
    }

    fn on_phase(&mut self, line: Line, ctx: &mut ScriptContext<'_, Self>) {
        match line {
            Line::Leryssa(text) => ctx.perform(Effect::Talk { text, target: None }),
            Line::Thassarian(text) => {
                if let Some(brother) = ctx.summoner() {
                    ctx.perform_on(brother.actor, Effect::Talk { text, target: None });
                }
            }
            Line::ThassarianFarewell => {
                if let Some(brother) = ctx.summoner() {
                    ctx.perform_on(
                        brother.actor,
                        Effect::Talk {
                            text: say::THASSARIAN_7,
                            target: None,
                        },
                    );
                    ctx.signal(brother.actor, REUNION_OVER);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::registry::ScriptRegistry;
    use crate::scripting::world::ScriptWorld;
    use crate::world::actor::ActorKind;
    use crate::world::host::ScriptHost;

    const TICK: Duration = Duration::from_millis(100);

    fn registry() -> ScriptRegistry {
        let mut registry = ScriptRegistry::new();
        registry
            .register::<Thassarian>(NPC_THASSARIAN)
            .register::<ImageOfLichKing>(NPC_IMAGE_LICH_KING)
            .register::<CounselorTalbot>(NPC_COUNSELOR_TALBOT)
            .register::<GeneralArlos>(NPC_GENERAL_ARLOS)
            .register::<Leryssa>(NPC_LERYSSA);
        registry
    }

    fn start() -> (ScriptHost, ActorRef, ActorRef) {
        let mut host = ScriptHost::new(registry(), 11);
        let thassarian = host.spawn(NPC_THASSARIAN, Position::new(3716.0, 3562.0, 477.44, 0.0));
        let player = host.spawn_with(
            ActorKind::Player,
            Entry(0),
            Position::new(3714.0, 3561.0, 477.44, 0.0),
        );
        host.trigger(
            thassarian,
            Trigger::GossipSelect {
                player,
                action: GOSSIP_ACTION_START,
            },
        );
        (host, thassarian, player)
    }

    fn said(host: &ScriptHost, actor: ActorRef, text: u8) -> bool {
        host.world()
            .effects_of(actor)
            .contains(&Effect::Talk { text, target: None })
    }

    #[test]
    fn phase_tables_are_valid() {
        assert_eq!(Thassarian::phase_table().map(|table| table.len()), Ok(17));
        assert_eq!(Leryssa::phase_table().map(|table| table.len()), Ok(7));
    }

    #[test]
    fn ritual_waits_for_both_witnesses() {
        let (mut host, thassarian, _) = start();
        host.run_for(secs(10), TICK);
        assert_eq!(host.phase_of(thassarian), Some(1));
        let talbot = host.world().find(NPC_COUNSELOR_TALBOT)[0];
        assert!(!host
            .world()
            .effects_of(talbot)
            .contains(&Effect::Stand(StandState::Kneel)));

        // Both summons need well under 25 seconds at walking pace.
        host.run_for(secs(20), TICK);
        assert!(host
            .world()
            .effects_of(talbot)
            .contains(&Effect::Stand(StandState::Kneel)));
        assert_eq!(host.world().actor(talbot).map(|state| state.entry), Some(NPC_PRINCE_VALANAR));
    }

    #[test]
    fn missing_lich_king_skips_his_lines() {
        let (mut host, thassarian, _) = start();
        host.run_for(secs(4), TICK);
        let arthas = host.world().find(NPC_IMAGE_LICH_KING)[0];
        host.destroy(arthas);
        host.flags_mut().raise(thassarian, ARTHAS_IN_POSITION);

        host.run_for(secs(60), TICK);
        let talbot = host.world().find(NPC_PRINCE_VALANAR)[0];
        assert!(said(&host, talbot, say::TALBOT_2));
        assert_eq!(host.world().find(NPC_GENERAL_ARLOS).len(), 1);
    }

    #[test]
    fn full_choreography_reaches_the_reunion() {
        let (mut host, thassarian, player) = start();
        host.run_for(secs(95), TICK);

        let talbot = host.world().find(NPC_PRINCE_VALANAR)[0];
        assert!(said(&host, thassarian, say::THASSARIAN_1));
        assert!(said(&host, thassarian, say::THASSARIAN_3));
        assert!(host.world().find(NPC_IMAGE_LICH_KING).is_empty());
        assert!(host.world().actor(talbot).is_some_and(|state| state.in_combat));

        host.kill(talbot, Some(player));
        assert!(host.world().effects_of(player).contains(&Effect::KillCredit {
            player,
            entry: NPC_PRINCE_VALANAR,
        }));
        let arlos = host.world().find(NPC_GENERAL_ARLOS)[0];
        assert!(host.world().actor(arlos).is_some_and(|state| !state.alive));

        host.run_for(secs(45), TICK);
        assert!(said(&host, thassarian, say::THASSARIAN_7));
        assert!(host.world().actor(thassarian).is_some_and(|state| state.quest_giver));

        host.run_for(secs(25), TICK);
        assert_eq!(host.phase_of(thassarian), Some(IDLE));
        assert!(host.world().find(NPC_LERYSSA).is_empty());
        assert!(host.world().find(NPC_GENERAL_ARLOS).is_empty());
    }

    #[test]
    fn talbot_casts_at_whoever_he_is_fighting() {
        let mut host = ScriptHost::new(registry(), 11);
        let talbot = host.spawn(NPC_COUNSELOR_TALBOT, Position::new(3730.0, 3560.0, 477.44, 0.0));
        let player = host.spawn_with(
            ActorKind::Player,
            Entry(0),
            Position::new(3725.0, 3560.0, 477.44, 0.0),
        );
        host.world_mut().perform(player, Effect::Attack(talbot));
        host.run_for(secs(13), TICK);

        assert!(host.world().effects_of(talbot).contains(&Effect::Cast {
            spell: SPELL_SHADOW_BOLT,
            target: player,
        }));
    }

    #[test]
    fn death_removes_every_summon() {
        let (mut host, thassarian, _) = start();
        host.run_for(secs(5), TICK);
        assert_eq!(host.world().find(NPC_IMAGE_LICH_KING).len(), 1);
        host.kill(thassarian, None);
        assert!(host.world().find(NPC_IMAGE_LICH_KING).is_empty());
        assert!(host.world().find(NPC_COUNSELOR_TALBOT).is_empty());
    }

    #[test]
    fn reset_stops_the_sequence() {
        let (mut host, thassarian, _) = start();
        host.run_for(secs(5), TICK);
        host.reset(thassarian);
        assert_eq!(host.phase_of(thassarian), Some(IDLE));
        assert!(host.world().find(NPC_COUNSELOR_TALBOT).is_empty());
        host.run_for(secs(30), TICK);
        assert_eq!(host.phase_of(thassarian), Some(IDLE));
    }
}
