//! Topic-based event bus implementation.

use std::collections::HashMap;

use accord_core::{EffectEvent, Tick};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{EffectUpdate, NoticeEvent, ProposalEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Effect attach, expiry, cancellation and interruption
    Effect,
    /// Proposals raised and resolved
    Proposal,
    /// Messages for actors
    Notice,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Effect, Topic::Proposal, Topic::Notice];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Effect(EffectUpdate),
    Proposal(ProposalEvent),
    Notice(NoticeEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Effect(_) => Topic::Effect,
            Event::Proposal(_) => Topic::Proposal,
            Event::Notice(_) => Topic::Notice,
        }
    }

    /// Routes a scheduler journal entry to the topic it belongs on.
    pub fn from_effect(event: EffectEvent, clock: Tick) -> Self {
        match event {
            EffectEvent::ProposalResolved {
                effect,
                proposer,
                target,
                state,
            } => Event::Proposal(ProposalEvent::Resolved {
                effect,
                proposer,
                target,
                state,
                clock,
            }),
            event => Event::Effect(EffectUpdate { event, clock }),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front, one per topic.
#[derive(Clone)]
pub struct EventBus {
    effect: broadcast::Sender<Event>,
    proposal: broadcast::Sender<Event>,
    notice: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            effect: broadcast::channel(capacity).0,
            proposal: broadcast::channel(capacity).0,
            notice: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Effect => &self.effect,
            Topic::Proposal => &self.proposal,
            Topic::Notice => &self.notice,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{EffectId, EffectKind, EntityId, ProposalState};

    #[test]
    fn proposal_resolution_goes_to_proposal_topic() {
        let event = Event::from_effect(
            EffectEvent::ProposalResolved {
                effect: EffectId(3),
                proposer: EntityId(1),
                target: EntityId(2),
                state: ProposalState::Accepted,
            },
            Tick(7),
        );
        assert_eq!(event.topic(), Topic::Proposal);

        let expired = Event::from_effect(
            EffectEvent::Expired {
                effect: EffectId(4),
                owner: EntityId(1),
                kind: EffectKind::Marker,
            },
            Tick(7),
        );
        assert_eq!(expired.topic(), Topic::Effect);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut notices = bus.subscribe(Topic::Notice);
        let mut effects = bus.subscribe(Topic::Effect);

        bus.publish(Event::Notice(NoticeEvent {
            recipient: EntityId(1),
            text: "hello".into(),
            clock: Tick(0),
        }));

        let received = notices.recv().await.unwrap();
        assert!(matches!(received, Event::Notice(ref n) if n.text == "hello"));
        assert!(effects.try_recv().is_err());
    }

    #[test]
    fn events_serialize_to_json() {
        let event = Event::Notice(NoticeEvent {
            recipient: EntityId(1),
            text: "hi".into(),
            clock: Tick(2),
        });
        let json = event.to_json().unwrap();
        assert!(json.contains("\"Notice\""));
        assert!(json.contains("hi"));
    }
}
