//! Effect scheduler: storage, expiry queue and callback dispatch.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::effect::{
    Effect, EffectCaps, EffectContext, EffectEvent, EffectId, EffectKind, EffectPayload,
    HandlerError, InterruptFlags, InterruptReason, SchedulerError,
};
use crate::proposal::ProposalState;
use crate::state::{EntityId, Tick, WorldState};

/// Owns every live effect in a realm.
///
/// Effects are indexed by owner so that "does X have an effect of kind Y" is
/// a map lookup plus a scan of X's (short) list. Expiries sit in a min-heap
/// keyed by deadline then handle, so effects due on the same tick fire in
/// attach order. Removal never touches the heap: a popped entry whose effect
/// is gone is skipped.
///
/// An effect is removed before any of its callbacks runs. Whichever of
/// cancel, expiry or resolution removes it first is the only one to fire.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    now: Tick,
    next_id: u64,
    effects: BTreeMap<EntityId, Vec<Effect>>,
    index: HashMap<EffectId, EntityId>,
    queue: BinaryHeap<Reverse<(Tick, EffectId)>>,
    retired: HashSet<EntityId>,
    journal: Vec<EffectEvent>,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time; the deadline being fired while inside a callback.
    pub fn now(&self) -> Tick {
        self.now
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Attaches an effect to `owner`, expiring after `duration` ticks if given.
    pub fn attach(
        &mut self,
        owner: EntityId,
        payload: impl Into<EffectPayload>,
        duration: Option<u64>,
    ) -> Result<EffectId, SchedulerError> {
        if self.retired.contains(&owner) {
            return Err(SchedulerError::OwnerRetired(owner));
        }

        let payload = payload.into();
        let id = EffectId(self.next_id);
        self.next_id += 1;
        let expires_at = duration.map(|d| self.now + d);
        let kind = payload.kind();

        debug!(%id, %owner, %kind, ?expires_at, what = payload.describe(), "effect attached");

        if let Some(deadline) = expires_at {
            self.queue.push(Reverse((deadline, id)));
        }
        self.index.insert(id, owner);
        self.effects.entry(owner).or_default().push(Effect {
            id,
            owner,
            attached_at: self.now,
            expires_at,
            payload,
        });
        self.journal.push(EffectEvent::Attached {
            effect: id,
            owner,
            kind,
            expires_at,
        });
        Ok(id)
    }

    /// Removes an effect without firing anything.
    pub fn take(&mut self, id: EffectId) -> Option<Effect> {
        let owner = self.index.remove(&id)?;
        let effects = self.effects.get_mut(&owner)?;
        let position = effects.iter().position(|e| e.id == id)?;
        let effect = effects.remove(position);
        if effects.is_empty() {
            self.effects.remove(&owner);
        }
        Some(effect)
    }

    /// Cancels an effect and fires its cancellation hook.
    ///
    /// Returns false, and does nothing, if the effect already expired or was
    /// removed.
    pub fn cancel(&mut self, id: EffectId, world: &mut WorldState) -> bool {
        let Some(effect) = self.take(id) else {
            debug!(%id, "cancel ignored, effect no longer live");
            return false;
        };
        debug!(%id, owner = %effect.owner, kind = %effect.kind(), "effect cancelled");
        self.journal.push(EffectEvent::Cancelled {
            effect: id,
            owner: effect.owner,
            kind: effect.kind(),
        });
        self.fire_cancelled(effect, world, InterruptReason::Cancelled);
        true
    }

    /// Fires every expiry due at or before `now`, in deadline order.
    ///
    /// Returns the number of expiry callbacks dispatched.
    pub fn advance_to(&mut self, now: Tick, world: &mut WorldState) -> usize {
        let mut fired = 0;
        while let Some(&Reverse((deadline, id))) = self.queue.peek() {
            if deadline > now {
                break;
            }
            self.queue.pop();
            let Some(effect) = self.take(id) else {
                continue;
            };
            self.now = self.now.max(deadline);

            if !world.contains(effect.owner) {
                warn!(%id, owner = %effect.owner, "owner no longer exists, expiry skipped");
                self.journal.push(EffectEvent::Purged {
                    effect: id,
                    owner: effect.owner,
                    kind: effect.kind(),
                });
                continue;
            }

            self.journal.push(EffectEvent::Expired {
                effect: id,
                owner: effect.owner,
                kind: effect.kind(),
            });
            self.fire_expired(effect, world);
            fired += 1;
        }
        self.now = self.now.max(now);
        fired
    }

    /// Interrupts in-progress actions involving `entity` whose triggers
    /// intersect `flags`.
    pub fn interrupt(
        &mut self,
        entity: EntityId,
        flags: InterruptFlags,
        world: &mut WorldState,
    ) -> usize {
        let hit: Vec<EffectId> = self
            .effects
            .values()
            .flatten()
            .filter(|e| {
                matches!(
                    &e.payload,
                    EffectPayload::InProgress(action)
                        if (e.owner == entity || action.info.involves(entity))
                            && action.info.interrupt_on.intersects(flags)
                )
            })
            .map(|e| e.id)
            .collect();

        let mut interrupted = 0;
        for id in hit {
            // An earlier handler may already have cancelled this one.
            let Some(effect) = self.take(id) else {
                continue;
            };
            info!(%id, %entity, ?flags, what = effect.payload.describe(), "action interrupted");
            self.journal.push(EffectEvent::Interrupted {
                effect: id,
                owner: effect.owner,
                flags,
            });
            self.fire_cancelled(effect, world, InterruptReason::Interrupted(flags));
            interrupted += 1;
        }
        interrupted
    }

    /// Removes every effect owned by `entity` without firing callbacks and
    /// refuses new ones from then on.
    pub fn purge_owner(&mut self, entity: EntityId) -> Vec<Effect> {
        self.retired.insert(entity);
        let effects = self.effects.remove(&entity).unwrap_or_default();
        for effect in &effects {
            self.index.remove(&effect.id);
            self.journal.push(EffectEvent::Purged {
                effect: effect.id,
                owner: entity,
                kind: effect.kind(),
            });
        }
        if !effects.is_empty() {
            debug!(%entity, count = effects.len(), "effects purged");
        }
        effects
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        let owner = self.index.get(&id)?;
        self.effects.get(owner)?.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn effects_of(&self, entity: EntityId) -> &[Effect] {
        self.effects
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Live effects of `kind` owned by `entity`, in attach order.
    pub fn query(&self, entity: EntityId, kind: EffectKind) -> impl Iterator<Item = &Effect> {
        self.effects_of(entity)
            .iter()
            .filter(move |e| e.kind() == kind)
    }

    pub fn has(&self, entity: EntityId, kind: EffectKind) -> bool {
        self.query(entity, kind).next().is_some()
    }

    /// Live effects of `entity` declaring every capability in `caps`.
    pub fn query_caps(&self, entity: EntityId, caps: EffectCaps) -> impl Iterator<Item = &Effect> {
        self.effects_of(entity)
            .iter()
            .filter(move |e| e.caps().contains(caps))
    }

    pub fn has_caps(&self, entity: EntityId, caps: EffectCaps) -> bool {
        self.query_caps(entity, caps).next().is_some()
    }

    /// Every live effect, grouped by owner.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_retired(&self, entity: EntityId) -> bool {
        self.retired.contains(&entity)
    }

    // ========================================================================
    // Journal
    // ========================================================================

    pub(crate) fn record(&mut self, event: EffectEvent) {
        self.journal.push(event);
    }

    /// Takes every journal entry recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.journal)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn fire_expired(&mut self, effect: Effect, world: &mut WorldState) {
        let Effect {
            id, owner, payload, ..
        } = effect;
        let now = self.now;
        let mut ctx = EffectContext {
            world,
            scheduler: self,
            now,
        };
        let result = match payload {
            EffectPayload::Proposal(proposal) => {
                info!(%id, proposer = %proposal.info.proposer, target = %owner, "proposal expired");
                ctx.scheduler.record(EffectEvent::ProposalResolved {
                    effect: id,
                    proposer: proposal.info.proposer,
                    target: owner,
                    state: ProposalState::Expired,
                });
                proposal.handler.on_expire(&mut ctx, &proposal.info)
            }
            EffectPayload::InProgress(action) => {
                info!(%id, actor = %action.info.actor, what = %action.info.description, "action complete");
                action.handler.on_complete(&mut ctx, &action.info)
            }
            EffectPayload::Marker(marker) => {
                debug!(%id, %owner, label = %marker.label, "marker expired");
                Ok(())
            }
        };
        report(id, owner, "expiry", result);
    }

    fn fire_cancelled(&mut self, effect: Effect, world: &mut WorldState, reason: InterruptReason) {
        let Effect {
            id, owner, payload, ..
        } = effect;
        let now = self.now;
        let mut ctx = EffectContext {
            world,
            scheduler: self,
            now,
        };
        let result = match payload {
            EffectPayload::Proposal(proposal) => {
                info!(%id, proposer = %proposal.info.proposer, target = %owner, "proposal revoked");
                ctx.scheduler.record(EffectEvent::ProposalResolved {
                    effect: id,
                    proposer: proposal.info.proposer,
                    target: owner,
                    state: ProposalState::Revoked,
                });
                proposal.handler.on_revoke(&mut ctx, &proposal.info)
            }
            EffectPayload::InProgress(action) => {
                action
                    .handler
                    .on_interrupted(&mut ctx, &action.info, reason)
            }
            EffectPayload::Marker(_) => Ok(()),
        };
        report(id, owner, "cancellation", result);
    }
}

fn report(id: EffectId, owner: EntityId, hook: &'static str, result: Result<(), HandlerError>) {
    if let Err(e) = result {
        error!(%id, %owner, hook, error = %e, "effect callback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{ActionInProgress, Marker, ProgressHandler, ProgressInfo};
    use crate::state::Body;

    struct Recorder(&'static str);

    impl ProgressHandler for Recorder {
        fn on_complete(
            self: Box<Self>,
            ctx: &mut EffectContext<'_>,
            action: &ProgressInfo,
        ) -> Result<(), HandlerError> {
            ctx.notify(action.actor, format!("{} complete", self.0));
            Ok(())
        }

        fn on_interrupted(
            self: Box<Self>,
            ctx: &mut EffectContext<'_>,
            action: &ProgressInfo,
            reason: InterruptReason,
        ) -> Result<(), HandlerError> {
            ctx.notify(action.actor, format!("{} stopped: {reason:?}", self.0));
            Ok(())
        }
    }

    struct Failing;

    impl ProgressHandler for Failing {
        fn on_complete(
            self: Box<Self>,
            _ctx: &mut EffectContext<'_>,
            _action: &ProgressInfo,
        ) -> Result<(), HandlerError> {
            Err(HandlerError::new("boom"))
        }

        fn on_interrupted(
            self: Box<Self>,
            _ctx: &mut EffectContext<'_>,
            _action: &ProgressInfo,
            _reason: InterruptReason,
        ) -> Result<(), HandlerError> {
            Err(HandlerError::new("boom"))
        }
    }

    fn create_world() -> (WorldState, EntityId, EntityId) {
        let mut world = WorldState::new();
        let room = world.spawn_location("room");
        let artist = world.spawn_actor("artist", Body::humanoid(), Some(room));
        let client = world.spawn_actor("client", Body::humanoid(), Some(room));
        (world, artist, client)
    }

    fn action(actor: EntityId, label: &'static str) -> ActionInProgress {
        ActionInProgress::new(ProgressInfo::new(actor, label), Recorder(label))
    }

    fn texts(world: &mut WorldState) -> Vec<String> {
        world.drain_notices().into_iter().map(|n| n.text).collect()
    }

    #[test]
    fn query_reflects_cancel_immediately() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        let id = scheduler
            .attach(artist, Marker::new("fresh tattoo"), Some(10))
            .unwrap();

        assert!(scheduler.has(artist, EffectKind::Marker));
        assert!(scheduler.has_caps(artist, EffectCaps::COSMETIC));
        assert!(scheduler.cancel(id, &mut world));
        assert!(!scheduler.has(artist, EffectKind::Marker));
        assert!(!scheduler.cancel(id, &mut world));
        assert_eq!(scheduler.advance_to(Tick(20), &mut world), 0);
    }

    #[test]
    fn expiries_fire_in_deadline_then_attach_order() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        scheduler.attach(artist, action(artist, "late"), Some(5)).unwrap();
        scheduler.attach(artist, action(artist, "first"), Some(3)).unwrap();
        scheduler.attach(artist, action(artist, "second"), Some(3)).unwrap();

        assert_eq!(scheduler.advance_to(Tick(4), &mut world), 2);
        assert_eq!(texts(&mut world), vec!["first complete", "second complete"]);
        assert_eq!(scheduler.advance_to(Tick(5), &mut world), 1);
        assert_eq!(texts(&mut world), vec!["late complete"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancel_after_expiry_is_noop() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        let id = scheduler.attach(artist, action(artist, "stitch"), Some(1)).unwrap();

        scheduler.advance_to(Tick(1), &mut world);
        assert!(!scheduler.cancel(id, &mut world));
        assert_eq!(texts(&mut world), vec!["stitch complete"]);
    }

    #[test]
    fn failing_callback_does_not_stop_other_expiries() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        scheduler
            .attach(
                artist,
                ActionInProgress::new(ProgressInfo::new(artist, "bad"), Failing),
                Some(1),
            )
            .unwrap();
        scheduler.attach(artist, action(artist, "good"), Some(1)).unwrap();

        assert_eq!(scheduler.advance_to(Tick(1), &mut world), 2);
        assert_eq!(texts(&mut world), vec!["good complete"]);
    }

    #[test]
    fn attach_to_retired_owner_is_rejected() {
        let (_, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        scheduler.attach(artist, Marker::new("ink stain"), None).unwrap();

        let purged = scheduler.purge_owner(artist);
        assert_eq!(purged.len(), 1);
        assert_eq!(
            scheduler.attach(artist, Marker::new("again"), None),
            Err(SchedulerError::OwnerRetired(artist))
        );
    }

    #[test]
    fn expiry_for_missing_owner_is_skipped() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        scheduler.attach(artist, action(artist, "stitch"), Some(2)).unwrap();
        world.destroy(artist);

        assert_eq!(scheduler.advance_to(Tick(2), &mut world), 0);
        assert!(world.notices().is_empty());
    }

    #[test]
    fn interrupt_matches_participants_and_flags() {
        let (mut world, artist, client) = create_world();
        let mut scheduler = EffectScheduler::new();
        let info = ProgressInfo::new(artist, "tattoo")
            .with_participant(client)
            .interrupt_on(InterruptFlags::MOVEMENT | InterruptFlags::COMBAT);
        scheduler
            .attach(artist, ActionInProgress::new(info, Recorder("tattoo")), Some(30))
            .unwrap();

        assert_eq!(scheduler.interrupt(client, InterruptFlags::POSITION, &mut world), 0);
        assert_eq!(scheduler.interrupt(client, InterruptFlags::MOVEMENT, &mut world), 1);
        assert!(!scheduler.has_caps(artist, EffectCaps::OCCUPIES_ACTOR));

        let notices = texts(&mut world);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("tattoo stopped"));
    }

    #[test]
    fn journal_records_lifecycle() {
        let (mut world, artist, _) = create_world();
        let mut scheduler = EffectScheduler::new();
        let id = scheduler.attach(artist, Marker::new("glow"), Some(1)).unwrap();
        scheduler.advance_to(Tick(1), &mut world);

        let events = scheduler.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EffectEvent::Attached { effect, .. } if effect == id));
        assert!(matches!(events[1], EffectEvent::Expired { effect, .. } if effect == id));
        assert!(scheduler.drain_events().is_empty());
    }
}
