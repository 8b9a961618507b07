use crate::world::actor::{ActorRef, ActorView, Effect, Entry, Lifetime};
use crate::world::position::Position;

/// The parts of the game world a script may touch.
///
/// Everything here is fire-and-forget from the script's point of view:
/// results become visible on later lookups, in issue order, and a lookup
/// for an actor that has left the world returns `None`.
pub trait ScriptWorld {
    fn resolve(&self, actor: ActorRef) -> Option<ActorView>;

    fn spawn(
        &mut self,
        entry: Entry,
        position: Position,
        lifetime: Lifetime,
        summoner: Option<ActorRef>,
    ) -> Option<ActorRef>;

    /// Start moving `actor`; arrival is reported back with `point`.
    fn move_to(&mut self, actor: ActorRef, point: u32, destination: Position);

    fn perform(&mut self, actor: ActorRef, effect: Effect);

    /// Remove from the world immediately.
    fn destroy(&mut self, actor: ActorRef);

    /// Mark dead; the corpse lingers according to its lifetime.
    fn kill(&mut self, actor: ActorRef);

    fn set_in_combat(&mut self, actor: ActorRef, in_combat: bool);

    /// Closest living actor with `entry` within `range` yards of `from`.
    fn nearest(&self, from: ActorRef, entry: Entry, range: f32) -> Option<ActorView>;
}
