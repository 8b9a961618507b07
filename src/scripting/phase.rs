use crate::scripting::flags::{Flag, FlagBoard};
use crate::world::actor::ActorRef;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, warn};

/// Phase index. Zero is idle and is never present in a table.
pub type Phase = u32;

pub const IDLE: Phase = 0;

/// Upper bound on steps fired by one timer in a single tick.
const MAX_STEPS_PER_TICK: usize = 64;

/// One row of a phase table: what to do when `phase` expires, where to go next
/// and how long the next phase waits.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStep<A> {
    pub action: A,
    pub next: Phase,
    pub delay: Duration,
    /// Flags that must all be raised before this step may fire. While any is
    /// missing the phase holds and its timer does not run.
    pub gate: Option<&'static [Flag]>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseTableError {
    #[error("phase 0 is reserved for idle")]
    IdleDefined,
    #[error("phase {0} defined twice")]
    Duplicate(Phase),
    #[error("phase {from} continues to undefined phase {to}")]
    Dangling { from: Phase, to: Phase },
    #[error("phase {0} never returns to idle")]
    NoRouteToIdle(Phase),
    #[error("phase {0} has an empty gate")]
    EmptyGate(Phase),
}

/// Hand-authored transition table for one script type.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTable<A> {
    steps: BTreeMap<Phase, PhaseStep<A>>,
}

impl<A> Default for PhaseTable<A> {
    fn default() -> Self {
        PhaseTable {
            steps: BTreeMap::new(),
        }
    }
}

impl<A> PhaseTable<A> {
    /// Table with no phases; scripts that only use events start from this.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> PhaseTableBuilder<A> {
        PhaseTableBuilder {
            steps: Vec::new(),
        }
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseStep<A>> {
        self.steps.get(&phase)
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.steps.contains_key(&phase)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Phases in index order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.steps.keys().copied()
    }

    fn validate(&self) -> Result<(), PhaseTableError> {
        for (phase, step) in &self.steps {
            if step.next != IDLE && !self.steps.contains_key(&step.next) {
                return Err(PhaseTableError::Dangling {
                    from: *phase,
                    to: step.next,
                });
            }
            if step.gate.is_some_and(|flags| flags.is_empty()) {
                return Err(PhaseTableError::EmptyGate(*phase));
            }
        }
        for phase in self.steps.keys() {
            let mut current = *phase;
            let mut hops = 0;
            while current != IDLE {
                if hops > self.steps.len() {
                    return Err(PhaseTableError::NoRouteToIdle(*phase));
                }
                current = self.steps[&current].next;
                hops += 1;
            }
        }
        Ok(())
    }
}

pub struct PhaseTableBuilder<A> {
    steps: Vec<(Phase, PhaseStep<A>)>,
}

impl<A> PhaseTableBuilder<A> {
    /// Timed step: when `phase` expires run `action`, then wait `delay` in `next`.
    pub fn step(mut self, phase: Phase, action: A, next: Phase, delay: Duration) -> Self {
        self.steps.push((
            phase,
            PhaseStep {
                action,
                next,
                delay,
                gate: None,
            },
        ));
        self
    }

    /// Step that fires as soon as every flag in `gate` has been raised for the owner.
    pub fn gated(
        mut self,
        phase: Phase,
        gate: &'static [Flag],
        action: A,
        next: Phase,
        delay: Duration,
    ) -> Self {
        self.steps.push((
            phase,
            PhaseStep {
                action,
                next,
                delay,
                gate: Some(gate),
            },
        ));
        self
    }

    pub fn build(self) -> Result<PhaseTable<A>, PhaseTableError> {
        let mut table = PhaseTable::default();
        for (phase, step) in self.steps {
            if phase == IDLE {
                return Err(PhaseTableError::IdleDefined);
            }
            if table.steps.insert(phase, step).is_some() {
                return Err(PhaseTableError::Duplicate(phase));
            }
        }
        table.validate()?;
        Ok(table)
    }
}

/// Countdown walking a [`PhaseTable`].
///
/// The timer keeps its own clock next to an absolute deadline. A step fires
/// once the clock reaches the deadline, and the following deadline is set
/// from the old one so an overshoot carries into the next step. A phase
/// started in the middle of a tick counts from the clock as it stands, the
/// same way an event scheduled from a callback does.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    phase: Phase,
    now: Duration,
    due: Duration,
    gate_open: bool,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == IDLE
    }

    /// Time left before the current phase fires.
    pub fn remaining(&self) -> Duration {
        self.due.saturating_sub(self.now)
    }

    /// Enter `phase`, firing `delay` from now (or once its gate opens).
    pub fn start(&mut self, phase: Phase, delay: Duration) {
        self.phase = phase;
        self.due = self.now.saturating_add(delay);
        self.gate_open = false;
    }

    pub fn stop(&mut self) {
        self.start(IDLE, Duration::ZERO);
    }

    /// Move the clock; nothing fires until [`next_due`](Self::next_due).
    pub fn advance(&mut self, elapsed: Duration) {
        self.now = self.now.saturating_add(elapsed);
    }

    /// First half of a tick: evaluate the gate of the current phase.
    pub fn begin_tick<A: Debug>(
        &mut self,
        table: &PhaseTable<A>,
        flags: &mut FlagBoard,
        owner: ActorRef,
    ) {
        if self.phase == IDLE {
            return;
        }
        let Some(step) = table.get(self.phase) else {
            warn!(%owner, phase = self.phase, "phase missing from table, returning to idle");
            self.stop();
            return;
        };
        if let Some(gate) = step.gate {
            if !self.gate_open && flags.take_all(owner, gate) {
                debug!(%owner, phase = self.phase, "phase gate opened");
                self.gate_open = true;
                self.due = self.now;
            }
        }
    }

    /// Second half of a tick: the next step that is due, already transitioned.
    ///
    /// The caller runs the returned action; an action that calls `start`
    /// itself overrides the table's `next`.
    pub fn next_due<A: Clone + Debug>(&mut self, table: &PhaseTable<A>) -> Option<A> {
        if self.phase == IDLE || self.due > self.now {
            return None;
        }
        let step = table.get(self.phase)?;
        if step.gate.is_some() && !self.gate_open {
            return None;
        }
        debug!(from = self.phase, to = step.next, action = ?step.action, "phase step");
        self.phase = step.next;
        self.due = self.due.saturating_add(step.delay);
        self.gate_open = false;
        Some(step.action.clone())
    }
}

/// Drive one tick of `timer` without a script, collecting fired actions.
pub fn run_tick<A: Clone + Debug>(
    timer: &mut PhaseTimer,
    elapsed: Duration,
    table: &PhaseTable<A>,
    flags: &mut FlagBoard,
    owner: ActorRef,
) -> Vec<A> {
    timer.advance(elapsed);
    timer.begin_tick(table, flags, owner);
    let mut fired = Vec::new();
    while let Some(action) = timer.next_due(table) {
        fired.push(action);
        if fired.len() >= MAX_STEPS_PER_TICK {
            warn!(%owner, phase = timer.phase(), "phase chain did not settle within one tick");
            break;
        }
    }
    fired
}

pub(crate) fn step_limit() -> usize {
    MAX_STEPS_PER_TICK
}
