//! Composition root of the core: one world, one scheduler, one proposal engine.

use tracing::info;

use crate::config::CoreConfig;
use crate::effect::{
    EffectCaps, EffectContext, EffectEvent, EffectId, EffectPayload, EffectScheduler,
    InterruptFlags, SchedulerError,
};
use crate::proposal::{
    Decision, ProposalEngine, ProposalError, ProposalHandler, ProposalOutcome, ProposalRequest,
    ProposalSummary,
};
use crate::state::{EntityId, Notice, Tick, WorldError, WorldState};

/// A self-contained simulation.
///
/// The realm owns the only [`EffectScheduler`] its world uses and passes it
/// explicitly to every component that needs it. All mutation of one realm is
/// expected to happen from a single thread of control, one update at a time.
#[derive(Debug, Default)]
pub struct Realm {
    world: WorldState,
    scheduler: EffectScheduler,
    proposals: ProposalEngine,
}

impl Realm {
    pub fn new(config: CoreConfig) -> Self {
        Self::with_world(WorldState::new(), config)
    }

    pub fn with_world(world: WorldState, config: CoreConfig) -> Self {
        Self {
            world,
            scheduler: EffectScheduler::new(),
            proposals: ProposalEngine::new(config),
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    pub fn proposals(&self) -> &ProposalEngine {
        &self.proposals
    }

    pub fn config(&self) -> &CoreConfig {
        self.proposals.config()
    }

    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    /// Borrows world and scheduler together, as effect callbacks see them.
    pub fn context(&mut self) -> EffectContext<'_> {
        let now = self.scheduler.now();
        EffectContext {
            world: &mut self.world,
            scheduler: &mut self.scheduler,
            now,
        }
    }

    // ========================================================================
    // Proposals
    // ========================================================================

    pub fn propose(
        &mut self,
        request: ProposalRequest,
        handler: Box<dyn ProposalHandler>,
    ) -> Result<EffectId, ProposalError> {
        if !self.world.contains(request.target) {
            return Err(SchedulerError::UnknownOwner(request.target).into());
        }
        if !request.proposer.is_system() && !self.world.contains(request.proposer) {
            return Err(ProposalError::invalid(format!(
                "proposer {} does not exist",
                request.proposer
            )));
        }
        self.proposals.propose(&mut self.scheduler, request, handler)
    }

    pub fn resolve(
        &mut self,
        target: EntityId,
        selector: &str,
        decision: Decision,
        message: Option<&str>,
    ) -> Result<ProposalOutcome, ProposalError> {
        let now = self.scheduler.now();
        let Realm {
            world,
            scheduler,
            proposals,
        } = self;
        let mut ctx = EffectContext {
            world,
            scheduler,
            now,
        };
        proposals.resolve(&mut ctx, target, selector, decision, message)
    }

    pub fn revoke(&mut self, id: EffectId) -> bool {
        self.proposals
            .revoke(&mut self.scheduler, id, &mut self.world)
    }

    pub fn pending(&self, target: EntityId) -> Vec<ProposalSummary> {
        self.proposals.pending(&self.scheduler, target)
    }

    // ========================================================================
    // Effects and time
    // ========================================================================

    /// Attaches an effect to an entity that exists in the world.
    pub fn attach(
        &mut self,
        owner: EntityId,
        payload: impl Into<EffectPayload>,
        duration: Option<u64>,
    ) -> Result<EffectId, SchedulerError> {
        if !self.world.contains(owner) && !self.scheduler.is_retired(owner) {
            return Err(SchedulerError::UnknownOwner(owner));
        }
        self.scheduler.attach(owner, payload, duration)
    }

    pub fn cancel(&mut self, id: EffectId) -> bool {
        self.scheduler.cancel(id, &mut self.world)
    }

    /// Moves time forward by `ticks`, firing due expiries.
    pub fn advance(&mut self, ticks: u64) -> usize {
        let target = self.scheduler.now() + ticks;
        self.advance_to(target)
    }

    pub fn advance_to(&mut self, tick: Tick) -> usize {
        self.scheduler.advance_to(tick, &mut self.world)
    }

    /// Returns true if the actor is in the middle of a timed action.
    pub fn is_busy(&self, actor: EntityId) -> bool {
        self.scheduler.has_caps(actor, EffectCaps::OCCUPIES_ACTOR)
    }

    // ========================================================================
    // World events
    // ========================================================================

    pub fn interrupt(&mut self, entity: EntityId, flags: InterruptFlags) -> usize {
        self.scheduler.interrupt(entity, flags, &mut self.world)
    }

    /// Moves an actor and interrupts whatever its movement disturbs.
    pub fn move_actor(
        &mut self,
        actor: EntityId,
        to: Option<EntityId>,
    ) -> Result<usize, WorldError> {
        let from = self
            .world
            .actor(actor)
            .ok_or(WorldError::UnknownEntity(actor))?
            .location;
        if from == to {
            return Ok(0);
        }
        self.world.move_actor(actor, to)?;
        Ok(self.interrupt(actor, InterruptFlags::MOVEMENT))
    }

    /// Two entities come to blows.
    pub fn start_combat(&mut self, attacker: EntityId, defender: EntityId) -> usize {
        self.interrupt(attacker, InterruptFlags::COMBAT)
            + self.interrupt(defender, InterruptFlags::COMBAT)
    }

    /// Removes an entity and everything hanging off it.
    ///
    /// Actions involving the entity are interrupted with
    /// [`InterruptFlags::DEATH`], its own proposals are revoked, effects it
    /// owns are cancelled with their hooks, and its id is retired.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.world.contains(entity) {
            return false;
        }

        let interrupted = self.interrupt(entity, InterruptFlags::DEATH);
        let revoked = self
            .proposals
            .revoke_by_proposer(&mut self.scheduler, entity, &mut self.world);
        let owned: Vec<EffectId> = self
            .scheduler
            .effects_of(entity)
            .iter()
            .map(|e| e.id)
            .collect();
        let cancelled = owned
            .into_iter()
            .filter(|id| self.scheduler.cancel(*id, &mut self.world))
            .count();
        self.scheduler.purge_owner(entity);
        self.world.destroy(entity);

        info!(%entity, interrupted, revoked, cancelled, "entity destroyed");
        true
    }

    // ========================================================================
    // Outboxes
    // ========================================================================

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.world.drain_notices()
    }

    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        self.scheduler.drain_events()
    }
}
