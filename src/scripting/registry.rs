use crate::scripting::controller::{ActorController, ActorScript, Controller};
use crate::scripting::phase::PhaseTableError;
use crate::world::actor::{ActorRef, Entry};
use std::collections::HashMap;

pub type ScriptFactory = fn(ActorRef) -> Result<Box<dyn Controller>, PhaseTableError>;

/// Build a boxed controller for a default-constructed script.
pub fn factory<S: ActorScript + Default>(actor: ActorRef) -> Result<Box<dyn Controller>, PhaseTableError> {
    Ok(Box::new(ActorController::new(actor, S::default())?))
}

/// Which script drives which creature entry.
#[derive(Default)]
pub struct ScriptRegistry {
    factories: HashMap<Entry, (&'static str, ScriptFactory)>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: ActorScript + Default>(&mut self, entry: Entry) -> &mut Self {
        self.factories.insert(entry, (S::NAME, factory::<S>));
        self
    }

    pub fn script_name(&self, entry: Entry) -> Option<&'static str> {
        self.factories.get(&entry).map(|(name, _)| *name)
    }

    pub fn build(
        &self,
        entry: Entry,
        actor: ActorRef,
    ) -> Option<Result<Box<dyn Controller>, PhaseTableError>> {
        let (_, factory) = self.factories.get(&entry)?;
        Some(factory(actor))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
