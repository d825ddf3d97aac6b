//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving the realm or streaming events from specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use accord_core::{
    Decision, EffectId, EntityId, InterruptFlags, ProposalHandler, ProposalOutcome,
    ProposalRequest, ProposalSummary, Realm, Tick, WorldState,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Raise a proposal; `handler` fires once the target answers or it lapses.
    pub async fn propose(
        &self,
        request: ProposalRequest,
        handler: impl ProposalHandler + 'static,
    ) -> Result<EffectId> {
        let handler: Box<dyn ProposalHandler> = Box::new(handler);
        let id = self
            .request(|reply| Command::Propose {
                request,
                handler,
                reply,
            })
            .await??;
        Ok(id)
    }

    /// Answer a pending proposal on behalf of `target`.
    ///
    /// `selector` is free text matched against proposal keywords; an empty
    /// selector picks the only pending proposal.
    pub async fn resolve(
        &self,
        target: EntityId,
        selector: &str,
        decision: Decision,
        message: Option<&str>,
    ) -> Result<ProposalOutcome> {
        let selector = selector.to_string();
        let message = message.map(str::to_string);
        let outcome = self
            .request(|reply| Command::Resolve {
                target,
                selector,
                decision,
                message,
                reply,
            })
            .await??;
        Ok(outcome)
    }

    pub async fn revoke(&self, effect: EffectId) -> Result<bool> {
        self.request(|reply| Command::Revoke { effect, reply }).await
    }

    /// Advance the clock by `ticks`, returning how many effects expired.
    pub async fn advance(&self, ticks: u64) -> Result<usize> {
        self.request(|reply| Command::Advance {
            ticks,
            reply: Some(reply),
        })
        .await
    }

    pub async fn pending(&self, target: EntityId) -> Result<Vec<ProposalSummary>> {
        self.request(|reply| Command::Pending { target, reply }).await
    }

    pub async fn interrupt(&self, entity: EntityId, flags: InterruptFlags) -> Result<usize> {
        self.request(|reply| Command::Interrupt {
            entity,
            flags,
            reply,
        })
        .await
    }

    /// Move an actor (or take it out of the world with `None`).
    pub async fn move_actor(&self, actor: EntityId, to: Option<EntityId>) -> Result<usize> {
        let interrupted = self
            .request(|reply| Command::MoveActor { actor, to, reply })
            .await??;
        Ok(interrupted)
    }

    pub async fn destroy(&self, entity: EntityId) -> Result<bool> {
        self.request(|reply| Command::Destroy { entity, reply }).await
    }

    /// Query the current world (read-only snapshot)
    pub async fn inspect(&self) -> Result<WorldState> {
        self.request(|reply| Command::Inspect { reply }).await
    }

    pub async fn now(&self) -> Result<Tick> {
        self.with_realm(|realm| realm.now()).await
    }

    /// Run `f` against the realm inside the simulation worker.
    ///
    /// The closure is one update step: events and notices it causes are
    /// published once it returns.
    pub async fn with_realm<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Realm) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.request(|reply| Command::WithRealm {
            job: Box::new(move |realm| {
                if reply.send(f(realm)).is_err() {
                    tracing::debug!("WithRealm reply channel closed (caller dropped)");
                }
            }),
        })
        .await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Effect` - Effect attach, expiry, cancellation, interruption
    /// - `Topic::Proposal` - Proposals raised and resolved
    /// - `Topic::Notice` - Messages written to actors by callbacks
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
