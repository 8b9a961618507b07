use crate::world::actor::ActorRef;
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// Name of a completion flag owned by one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flag(pub &'static str);

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Completion flags for every actor in one host.
///
/// A flag is a plain boolean keyed by (owner, name). Raising an already
/// raised flag is a no-op, so a signal is observed at most once no matter
/// how often a peer repeats it before the owner's next tick.
#[derive(Debug, Default)]
pub struct FlagBoard {
    raised: HashSet<(ActorRef, Flag)>,
}

impl FlagBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, owner: ActorRef, flag: Flag) {
        if self.raised.insert((owner, flag)) {
            trace!(%owner, %flag, "flag raised");
        }
    }

    pub fn is_raised(&self, owner: ActorRef, flag: Flag) -> bool {
        self.raised.contains(&(owner, flag))
    }

    pub fn all_raised(&self, owner: ActorRef, flags: &[Flag]) -> bool {
        flags.iter().all(|flag| self.is_raised(owner, *flag))
    }

    /// Consume one flag; true if it was raised.
    pub fn take(&mut self, owner: ActorRef, flag: Flag) -> bool {
        self.raised.remove(&(owner, flag))
    }

    /// Consume every flag in `flags` only if all of them are raised.
    pub fn take_all(&mut self, owner: ActorRef, flags: &[Flag]) -> bool {
        if !self.all_raised(owner, flags) {
            return false;
        }
        for flag in flags {
            self.raised.remove(&(owner, *flag));
        }
        true
    }

    /// Forget every flag owned by `owner`.
    pub fn clear_actor(&mut self, owner: ActorRef) {
        self.raised.retain(|(actor, _)| *actor != owner);
    }

    pub fn len(&self) -> usize {
        self.raised.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raised.is_empty()
    }
}
