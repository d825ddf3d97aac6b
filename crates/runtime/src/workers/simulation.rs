//! Simulation worker that owns the authoritative [`Realm`].
//!
//! Receives commands from [`crate::RuntimeHandle`] and the clock, applies them
//! to the realm one at a time, and publishes what changed to the EventBus.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use accord_core::{
    Decision, EffectId, EntityId, InterruptFlags, ProposalError, ProposalHandler,
    ProposalOutcome, ProposalRequest, ProposalSummary, Realm, WorldError, WorldState,
};

use crate::events::{Event, EventBus, NoticeEvent, ProposalEvent};

/// Work the simulation worker runs against the realm, in its own update step.
pub type RealmJob = Box<dyn FnOnce(&mut Realm) + Send>;

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Raise a proposal on its target.
    Propose {
        request: ProposalRequest,
        handler: Box<dyn ProposalHandler>,
        reply: oneshot::Sender<Result<EffectId, ProposalError>>,
    },
    /// Accept or decline a pending proposal.
    Resolve {
        target: EntityId,
        selector: String,
        decision: Decision,
        message: Option<String>,
        reply: oneshot::Sender<Result<ProposalOutcome, ProposalError>>,
    },
    /// Withdraw a proposal.
    Revoke {
        effect: EffectId,
        reply: oneshot::Sender<bool>,
    },
    /// Move time forward. The clock sends these without a reply.
    Advance {
        ticks: u64,
        reply: Option<oneshot::Sender<usize>>,
    },
    /// List the proposals waiting on an actor.
    Pending {
        target: EntityId,
        reply: oneshot::Sender<Vec<ProposalSummary>>,
    },
    Interrupt {
        entity: EntityId,
        flags: InterruptFlags,
        reply: oneshot::Sender<usize>,
    },
    MoveActor {
        actor: EntityId,
        to: Option<EntityId>,
        reply: oneshot::Sender<Result<usize, WorldError>>,
    },
    Destroy {
        entity: EntityId,
        reply: oneshot::Sender<bool>,
    },
    /// Snapshot of the current world (read-only).
    Inspect { reply: oneshot::Sender<WorldState> },
    /// Arbitrary access to the realm; the job carries its own reply.
    WithRealm { job: RealmJob },
}

/// Background task that processes simulation commands.
pub struct SimulationWorker {
    realm: Realm,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SimulationWorker {
    pub fn new(realm: Realm, command_rx: mpsc::Receiver<Command>, event_bus: EventBus) -> Self {
        info!(
            actors = realm.world().actors().count(),
            clock = %realm.now(),
            "SimulationWorker initialized"
        );

        Self {
            realm,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop. Ends once every command sender is gone.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
            self.publish_pending();
        }
        debug!(clock = %self.realm.now(), "SimulationWorker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Propose {
                request,
                handler,
                reply,
            } => {
                let target = request.target;
                let result = self.realm.propose(request, handler);
                if let Ok(id) = &result
                    && let Some(summary) = self
                        .realm
                        .pending(target)
                        .into_iter()
                        .find(|s| s.effect == *id)
                {
                    self.event_bus
                        .publish(Event::Proposal(ProposalEvent::Raised(summary)));
                }
                if reply.send(result).is_err() {
                    debug!("Propose reply channel closed (caller dropped)");
                }
            }
            Command::Resolve {
                target,
                selector,
                decision,
                message,
                reply,
            } => {
                let result =
                    self.realm
                        .resolve(target, &selector, decision, message.as_deref());
                if reply.send(result).is_err() {
                    debug!("Resolve reply channel closed (caller dropped)");
                }
            }
            Command::Revoke { effect, reply } => {
                let revoked = self.realm.revoke(effect);
                if reply.send(revoked).is_err() {
                    debug!("Revoke reply channel closed (caller dropped)");
                }
            }
            Command::Advance { ticks, reply } => {
                let fired = self.realm.advance(ticks);
                if let Some(reply) = reply
                    && reply.send(fired).is_err()
                {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            Command::Pending { target, reply } => {
                if reply.send(self.realm.pending(target)).is_err() {
                    debug!("Pending reply channel closed (caller dropped)");
                }
            }
            Command::Interrupt {
                entity,
                flags,
                reply,
            } => {
                let interrupted = self.realm.interrupt(entity, flags);
                if reply.send(interrupted).is_err() {
                    debug!("Interrupt reply channel closed (caller dropped)");
                }
            }
            Command::MoveActor { actor, to, reply } => {
                let result = self.realm.move_actor(actor, to);
                if reply.send(result).is_err() {
                    debug!("MoveActor reply channel closed (caller dropped)");
                }
            }
            Command::Destroy { entity, reply } => {
                let destroyed = self.realm.destroy_entity(entity);
                if reply.send(destroyed).is_err() {
                    debug!("Destroy reply channel closed (caller dropped)");
                }
            }
            Command::Inspect { reply } => {
                if reply.send(self.realm.world().clone()).is_err() {
                    debug!("Inspect reply channel closed (caller dropped)");
                }
            }
            Command::WithRealm { job } => job(&mut self.realm),
        }
    }

    /// Publishes the journal and notices accumulated by the last update step.
    fn publish_pending(&mut self) {
        let clock = self.realm.now();
        for event in self.realm.drain_events() {
            self.event_bus.publish(Event::from_effect(event, clock));
        }
        for notice in self.realm.drain_notices() {
            self.event_bus
                .publish(Event::Notice(NoticeEvent::new(notice, clock)));
        }
    }
}
