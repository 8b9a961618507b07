use crate::world::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Durable handle to an actor. Carries no ownership and is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorRef(pub u64);

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Template id of a creature or game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entry(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    Creature,
    GameObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandState {
    #[default]
    Stand,
    Sit,
    Kneel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Friendly,
    Monster,
}

/// How long a spawned actor is allowed to stay in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    #[default]
    Manual,
    /// Removed after the duration whether alive or not.
    Timed(Duration),
    /// Removed the given time after dying.
    DeadDespawn(Duration),
    /// Corpse removed the given time after dying.
    CorpseTimed(Duration),
}

/// Snapshot of a live actor returned by world lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorView {
    pub actor: ActorRef,
    pub kind: ActorKind,
    pub entry: Entry,
    pub position: Position,
    pub summoner: Option<ActorRef>,
    pub stand_state: StandState,
    pub emote_state: Emote,
    pub alive: bool,
    /// Remaining health in percent.
    pub health_pct: u8,
    pub in_combat: bool,
    /// Who the actor is fighting, while in combat.
    pub victim: Option<ActorRef>,
}

impl ActorView {
    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emote {
    Kneel,
    Loot,
    Talk,
    #[default]
    None,
}

/// Simulation-visible side effect issued by a script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Talk { text: u8, target: Option<ActorRef> },
    /// One-shot animation.
    Emote(Emote),
    /// Animation the actor keeps looping until told otherwise.
    EmoteState(Emote),
    Cast { spell: u32, target: ActorRef },
    RemoveAura(u32),
    Stand(StandState),
    Morph(Entry),
    Faction(Faction),
    Attackable(bool),
    Attack(ActorRef),
    KillCredit { player: ActorRef, entry: Entry },
    QuestGiver(bool),
    Face(f32),
    Walk(bool),
    Use(ActorRef),
    Activate,
    Custom(&'static str),
}
