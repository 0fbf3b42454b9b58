//! [`Description`]: the ordered set of behaviors driving one simulation.

use crate::action::Action;
use crate::emitter::{Emitter, EmitterInfo, EmitterInfoBuilder};
use crate::event::{Event, EventBinding};
use crate::force::Force;

/// The forces, event/action bindings, and emitters of one simulation.
///
/// Order matters: forces are summed in order, events are filtered in
/// order (ties between equal time factors go to the earlier event), and
/// emitters run in order once per step.
///
/// # Examples
///
/// ```
/// use plume_behavior::Description;
///
/// let description = Description::new();
/// assert!(description.is_empty());
/// ```
#[derive(Default)]
pub struct Description {
    forces: Vec<Box<dyn Force>>,
    events: Vec<EventBinding>,
    emitters: Vec<Box<dyn Emitter>>,
}

impl Description {
    /// An empty description: particles keep moving at constant velocity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a force.
    pub fn add_force(mut self, force: impl Force) -> Self {
        self.forces.push(Box::new(force));
        self
    }

    /// Append an event and the action run on the rows it triggers.
    pub fn add_event(mut self, event: impl Event, action: impl Action) -> Self {
        self.events.push(EventBinding::new(event, action));
        self
    }

    /// Append an emitter.
    pub fn add_emitter(mut self, emitter: impl Emitter) -> Self {
        self.emitters.push(Box::new(emitter));
        self
    }

    /// Registered forces in order.
    pub fn forces(&self) -> &[Box<dyn Force>] {
        &self.forces
    }

    /// Registered event bindings in order.
    pub fn events(&self) -> &[EventBinding] {
        &self.events
    }

    /// Registered emitters in order.
    pub fn emitters(&self) -> &[Box<dyn Emitter>] {
        &self.emitters
    }

    /// Query every emitter's declarations, in emitter order.
    pub fn emitter_infos(&self) -> Vec<EmitterInfo> {
        self.emitters
            .iter()
            .map(|emitter| {
                let mut builder = EmitterInfoBuilder::new();
                emitter.info(&mut builder);
                builder.build()
            })
            .collect()
    }

    /// Whether no behavior of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty() && self.events.is_empty() && self.emitters.is_empty()
    }
}

impl std::fmt::Debug for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let forces: Vec<&str> = self.forces.iter().map(|b| b.name()).collect();
        let events: Vec<(&str, &str)> = self
            .events
            .iter()
            .map(|b| (b.event().name(), b.action().name()))
            .collect();
        let emitters: Vec<&str> = self.emitters.iter().map(|b| b.name()).collect();
        f.debug_struct("Description")
            .field("forces", &forces)
            .field("events", &events)
            .field("emitters", &emitters)
            .finish()
    }
}
