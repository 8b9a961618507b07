use crate::scripting::world::ScriptWorld;
use crate::world::actor::{ActorRef, ActorView};
use std::collections::HashMap;
use std::hash::Hash;

/// Weak references to the actors a controller summoned or depends on.
///
/// Only durable handles are stored. Every lookup goes back through the
/// world, so a peer that despawned simply resolves to `None`.
#[derive(Debug, Clone)]
pub struct Peers<R> {
    refs: HashMap<R, ActorRef>,
}

impl<R> Default for Peers<R> {
    fn default() -> Self {
        Peers {
            refs: HashMap::new(),
        }
    }
}

impl<R: Copy + Eq + Hash> Peers<R> {
    pub fn set(&mut self, role: R, actor: ActorRef) {
        self.refs.insert(role, actor);
    }

    pub fn get(&self, role: R) -> Option<ActorRef> {
        self.refs.get(&role).copied()
    }

    pub fn take(&mut self, role: R) -> Option<ActorRef> {
        self.refs.remove(&role)
    }

    pub fn clear(&mut self) {
        self.refs.clear();
    }

    pub fn resolve(&self, role: R, world: &dyn ScriptWorld) -> Option<ActorView> {
        world.resolve(self.get(role)?)
    }

    /// Every stored handle, in no particular order.
    pub fn actors(&self) -> impl Iterator<Item = (R, ActorRef)> + '_ {
        self.refs.iter().map(|(role, actor)| (*role, *actor))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
