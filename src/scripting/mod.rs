//! Per-actor script runtime: event queues, phase timers, flags and the
//! controller that wires them to an [`ActorScript`](controller::ActorScript).

pub mod controller;
pub mod events;
pub mod flags;
pub mod peers;
pub mod phase;
pub mod registry;
pub mod world;
