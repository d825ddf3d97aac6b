//! Per-attempt plan state: check, execute, finalize.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::body::{BodyError, BodyInventory, Consumed, ItemOrigin};
use crate::plan::planner::{PhasePlan, Reservation, Step, plan_phase};
use crate::plan::{Feasibility, PlanError, PlanTemplate};
use crate::state::EntityId;

/// Lifecycle of a plan instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PlanState {
    Created,
    Checked,
    Executed,
    Finalized,
}

/// Concrete items chosen for a plan's actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    named: BTreeMap<String, EntityId>,
    items: Vec<EntityId>,
}

impl Resolution {
    fn record(&mut self, name: Option<&str>, item: EntityId) {
        if let Some(name) = name {
            self.named.insert(name.to_string(), item);
        }
        self.items.push(item);
    }

    /// Item resolved for the action with logical name `name`.
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.named.get(name).copied()
    }

    /// Every resolved item, in acquisition order.
    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
enum LedgerEntry {
    Acquired { item: EntityId, origin: ItemOrigin },
    Consumed(Consumed),
}

/// Resources an executed plan handed over to its caller.
///
/// Dropping this value leaves the items where they are, in the actor's limbs.
#[derive(Debug)]
#[must_use = "retained resources stay in hand until released"]
pub struct RetainedResources {
    actor: EntityId,
    items: Vec<(EntityId, ItemOrigin)>,
}

impl RetainedResources {
    fn empty(actor: EntityId) -> Self {
        Self {
            actor,
            items: Vec::new(),
        }
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.items.iter().map(|(item, _)| *item)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns every item to where the plan found it.
    ///
    /// Items that left the actor's hands, or the world, in the meantime are
    /// skipped. An item whose origin is gone ends up in the actor's
    /// inventory and is reported as [`BodyError::OriginUnavailable`].
    pub fn release<W: BodyInventory + ?Sized>(self, world: &mut W) -> Result<(), BodyError> {
        release_all(world, self.actor, self.items)
    }
}

fn release_all<W: BodyInventory + ?Sized>(
    world: &mut W,
    actor: EntityId,
    items: Vec<(EntityId, ItemOrigin)>,
) -> Result<(), BodyError> {
    let held = world.held_items(actor);
    let items = items
        .into_iter()
        .filter(|(item, _)| {
            let still_held = held.iter().any(|h| h.item == *item);
            if !still_held {
                debug!(%actor, %item, "item no longer in hand, nothing to release");
            }
            still_held
        })
        .collect();
    return_items(world, actor, items)
}

/// Puts items back at their origins, newest first.
///
/// Items going back into limbs are stowed before any of them is regrasped,
/// since a regripped item may sit in limbs another one came from.
fn return_items<W: BodyInventory + ?Sized>(
    world: &mut W,
    actor: EntityId,
    items: Vec<(EntityId, ItemOrigin)>,
) -> Result<(), BodyError> {
    let stowed = ItemOrigin::Carried;
    let mut first_error = None;
    let mut regrasp = Vec::new();
    for (item, origin) in items.into_iter().rev() {
        let to_limbs = matches!(origin, ItemOrigin::Held { .. });
        let target = if to_limbs { &stowed } else { &origin };
        if let Err(e) = world.release(actor, item, target) {
            warn!(%actor, %item, error = %e, "failed to release item");
            first_error.get_or_insert(e);
            continue;
        }
        if to_limbs {
            regrasp.push((item, origin));
        }
    }
    for (item, origin) in regrasp {
        if let Err(e) = world.release(actor, item, &origin) {
            warn!(%actor, %item, error = %e, "failed to regrasp item");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// One attempt at carrying out a [`PlanTemplate`] for one actor.
///
/// Instances are cheap and meant to be thrown away: build a fresh one for
/// every check. An executed instance holds world resources until
/// [`PlanInstance::finalize`] is called; dropping it earlier leaks them.
#[derive(Debug)]
pub struct PlanInstance {
    template: Arc<PlanTemplate>,
    actor: EntityId,
    state: PlanState,
    feasibility: Option<Feasibility>,
    resolution: Resolution,
    ledger: Vec<LedgerEntry>,
}

impl PlanInstance {
    pub fn new(template: Arc<PlanTemplate>, actor: EntityId) -> Self {
        Self {
            template,
            actor,
            state: PlanState::Created,
            feasibility: None,
            resolution: Resolution::default(),
            ledger: Vec::new(),
        }
    }

    pub fn template(&self) -> &Arc<PlanTemplate> {
        &self.template
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    /// Result of the last check, if any.
    pub fn feasibility(&self) -> Option<Feasibility> {
        self.feasibility
    }

    /// Tentative after a check, authoritative after execution.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Checks whether the actor could execute the plan right now.
    ///
    /// Reads the world only. Limbs and items claimed by one action are not
    /// offered to later actions, so nothing is counted twice.
    pub fn check_feasibility<W: BodyInventory + ?Sized>(&mut self, world: &W) -> Feasibility {
        if matches!(self.state, PlanState::Executed | PlanState::Finalized) {
            warn!(
                template = %self.template.name,
                state = %self.state,
                "feasibility check on a plan past execution"
            );
            return self.feasibility.unwrap_or(Feasibility::Feasible);
        }

        let mut reservation = Reservation::default();
        let mut resolution = Resolution::default();
        let mut result = Feasibility::Feasible;
        for phase in &self.template.phases {
            let PhasePlan { steps, verdict } =
                plan_phase(world, self.actor, phase, &mut reservation);
            result = result.worst(verdict);
            for planned in steps {
                resolution.record(planned.name.as_deref(), planned.step.item());
            }
        }

        debug!(
            template = %self.template.name,
            actor = %self.actor,
            %result,
            "plan feasibility checked"
        );
        self.feasibility = Some(result);
        self.resolution = resolution;
        self.state = PlanState::Checked;
        result
    }

    /// Acquires every resource the plan needs, phase by phase.
    ///
    /// Each phase is re-resolved against the live world. If any phase cannot
    /// be satisfied, everything acquired by this call is put back and the
    /// instance returns to [`PlanState::Created`].
    ///
    /// # Errors
    ///
    /// [`PlanError::NotChecked`] if the last check was missing or not
    /// feasible. This is a programmer error.
    pub fn execute<W: BodyInventory + ?Sized>(
        &mut self,
        world: &mut W,
    ) -> Result<&Resolution, PlanError> {
        match self.state {
            PlanState::Executed | PlanState::Finalized => {
                error!(template = %self.template.name, "plan executed twice");
                return Err(PlanError::AlreadyExecuted {
                    template: self.template.name.clone(),
                });
            }
            PlanState::Checked if self.feasibility == Some(Feasibility::Feasible) => {}
            _ => {
                error!(
                    template = %self.template.name,
                    actor = %self.actor,
                    feasibility = ?self.feasibility,
                    "plan executed without a feasible check"
                );
                return Err(PlanError::NotChecked {
                    template: self.template.name.clone(),
                    actor: self.actor,
                });
            }
        }

        let template = Arc::clone(&self.template);
        let mut reservation = Reservation::default();
        let mut resolution = Resolution::default();
        for phase in &template.phases {
            let plan = plan_phase(&*world, self.actor, phase, &mut reservation);
            if !plan.verdict.is_feasible() {
                debug!(template = %template.name, verdict = %plan.verdict, "phase no longer feasible");
                self.abort(world);
                return Err(PlanError::NoLongerFeasible(plan.verdict));
            }
            if let Err(e) = self.apply(world, plan, &mut resolution) {
                warn!(template = %template.name, error = %e, "phase acquisition failed");
                self.abort(world);
                return Err(e.into());
            }
        }

        info!(
            template = %template.name,
            actor = %self.actor,
            items = resolution.items().len(),
            "plan executed"
        );
        self.resolution = resolution;
        self.state = PlanState::Executed;
        Ok(&self.resolution)
    }

    /// Executes and wraps the instance in a guard that restores on drop.
    pub fn execute_guarded<W: BodyInventory + ?Sized>(
        mut self,
        world: &mut W,
    ) -> Result<PlanGuard<'_, W>, PlanError> {
        self.execute(world)?;
        Ok(PlanGuard {
            actor: self.actor,
            instance: Some(self),
            world,
        })
    }

    /// Ends the plan.
    ///
    /// With `restore`, acquired items go back where they came from and `None`
    /// is returned. Without it, they stay in hand and are handed to the caller.
    /// Consumed materials are never given back. Calling this again does
    /// nothing.
    pub fn finalize<W: BodyInventory + ?Sized>(
        &mut self,
        world: &mut W,
        restore: bool,
    ) -> Option<RetainedResources> {
        match self.state {
            PlanState::Finalized => {
                debug!(template = %self.template.name, "plan already finalized");
                None
            }
            PlanState::Executed => {
                self.state = PlanState::Finalized;
                let acquired: Vec<(EntityId, ItemOrigin)> = self
                    .ledger
                    .drain(..)
                    .filter_map(|entry| match entry {
                        LedgerEntry::Acquired { item, origin } => Some((item, origin)),
                        LedgerEntry::Consumed(_) => None,
                    })
                    .collect();
                if restore {
                    if let Err(e) = release_all(world, self.actor, acquired) {
                        error!(
                            template = %self.template.name,
                            actor = %self.actor,
                            error = %e,
                            "plan resources not fully restored"
                        );
                    }
                    None
                } else {
                    Some(RetainedResources {
                        actor: self.actor,
                        items: acquired,
                    })
                }
            }
            PlanState::Created | PlanState::Checked => {
                self.state = PlanState::Finalized;
                None
            }
        }
    }

    fn apply<W: BodyInventory + ?Sized>(
        &mut self,
        world: &mut W,
        plan: PhasePlan,
        resolution: &mut Resolution,
    ) -> Result<(), BodyError> {
        // Every regripped item lets go before anything is grasped: the planner
        // may hand one item's limbs to another item of the same phase.
        for planned in &plan.steps {
            if let Step::Acquire {
                item, regrip: true, ..
            } = planned.step
            {
                let held = world
                    .held_items(self.actor)
                    .into_iter()
                    .find(|h| h.item == item)
                    .ok_or(BodyError::NotReachable {
                        actor: self.actor,
                        item,
                    })?;
                world.release(self.actor, item, &ItemOrigin::Carried)?;
                self.ledger.push(LedgerEntry::Acquired {
                    item,
                    origin: ItemOrigin::Held {
                        limbs: held.limbs,
                        grip: held.grip,
                    },
                });
            }
        }

        for planned in plan.steps {
            let resolved = planned.step.item();
            match planned.step {
                Step::AlreadyHeld { .. } => {}
                Step::Acquire {
                    item,
                    limbs,
                    grip,
                    regrip,
                } => {
                    let origin = world.acquire(self.actor, item, &limbs, grip)?;
                    if !regrip {
                        self.ledger.push(LedgerEntry::Acquired { item, origin });
                    }
                }
                Step::Consume { item, quantity } => {
                    let consumed = world.consume(self.actor, item, quantity)?;
                    self.ledger.push(LedgerEntry::Consumed(consumed));
                }
            }
            resolution.record(planned.name.as_deref(), resolved);
        }
        Ok(())
    }

    /// Undoes every ledger entry: items go back first, then consumptions,
    /// newest first.
    fn abort<W: BodyInventory + ?Sized>(&mut self, world: &mut W) {
        let mut acquired = Vec::new();
        let mut consumed = Vec::new();
        for entry in self.ledger.drain(..) {
            match entry {
                LedgerEntry::Acquired { item, origin } => acquired.push((item, origin)),
                LedgerEntry::Consumed(c) => consumed.push(c),
            }
        }
        if let Err(e) = return_items(world, self.actor, acquired) {
            error!(actor = %self.actor, error = %e, "rollback could not return every item");
        }
        for c in consumed.iter().rev() {
            if let Err(e) = world.restore_consumed(self.actor, c) {
                error!(actor = %self.actor, item = %c.before.id, error = %e, "rollback step failed");
            }
        }
        self.state = PlanState::Created;
        self.feasibility = None;
        self.resolution = Resolution::default();
    }
}

impl Drop for PlanInstance {
    fn drop(&mut self) {
        if self.state == PlanState::Executed {
            warn!(
                template = %self.template.name,
                actor = %self.actor,
                held = self.ledger.len(),
                "plan instance dropped without finalize, resources stay held"
            );
        }
    }
}

/// Scope guard over an executed plan.
///
/// Dropping the guard finalizes with restore. Call [`PlanGuard::retain`] to
/// keep the resources instead.
pub struct PlanGuard<'w, W: BodyInventory + ?Sized> {
    actor: EntityId,
    instance: Option<PlanInstance>,
    world: &'w mut W,
}

impl<'w, W: BodyInventory + ?Sized> PlanGuard<'w, W> {
    pub fn resolution(&self) -> Option<&Resolution> {
        self.instance.as_ref().map(|i| i.resolution())
    }

    pub fn world(&mut self) -> &mut W {
        self.world
    }

    /// Keeps the acquired resources in hand and disarms the guard.
    pub fn retain(mut self) -> RetainedResources {
        self.instance
            .take()
            .and_then(|mut instance| instance.finalize(self.world, false))
            .unwrap_or_else(|| RetainedResources::empty(self.actor))
    }
}

impl<W: BodyInventory + ?Sized> Drop for PlanGuard<'_, W> {
    fn drop(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.finalize(self.world, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ErrorSeverity};
    use crate::plan::{ItemSelector, PlanAction};
    use crate::state::{Body, Grip, ItemState, LimbId, Placement, StrengthClass, WorldState};

    struct Parlour {
        world: WorldState,
        artist: EntityId,
        needle: EntityId,
        ink: EntityId,
    }

    fn create_parlour() -> Parlour {
        let mut world = WorldState::new();
        let room = world.spawn_location("parlour");
        let artist = world.spawn_actor("artist", Body::humanoid(), Some(room));
        let needle = world.spawn_item(|id| ItemState::new(id, "needle").with_tag("needle"));
        let ink = world.spawn_item(|id| {
            ItemState::new(id, "black ink")
                .with_tag("ink")
                .with_quantity(3)
        });
        world.give(artist, needle).unwrap();
        world.drop_at(room, ink).unwrap();
        Parlour {
            world,
            artist,
            needle,
            ink,
        }
    }

    fn tattoo_template() -> Arc<PlanTemplate> {
        PlanTemplate::builder("tattoo")
            .phase(vec![
                PlanAction::wield(ItemSelector::tag("needle")).named("needle"),
            ])
            .phase(vec![
                PlanAction::hold(ItemSelector::tag("ink")).named("ink"),
            ])
            .build()
    }

    #[test]
    fn check_does_not_touch_the_world() {
        let p = create_parlour();
        let before = p.world.clone();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);

        assert_eq!(plan.check_feasibility(&p.world), Feasibility::Feasible);
        assert_eq!(plan.resolution().get("needle"), Some(p.needle));
        assert_eq!(plan.resolution().get("ink"), Some(p.ink));
        assert_eq!(p.world, before);
    }

    #[test]
    fn execute_without_check_is_internal_error() {
        let mut p = create_parlour();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);

        let err = plan.execute(&mut p.world).unwrap_err();
        assert!(matches!(err, PlanError::NotChecked { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Internal);
    }

    #[test]
    fn execute_then_restore_returns_items() {
        let mut p = create_parlour();
        let before = p.world.clone();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);
        plan.check_feasibility(&p.world);

        plan.execute(&mut p.world).unwrap();
        assert_eq!(p.world.placement(p.needle), Some(Placement::Held(p.artist)));
        assert_eq!(p.world.placement(p.ink), Some(Placement::Held(p.artist)));

        assert!(plan.finalize(&mut p.world, true).is_none());
        assert_eq!(p.world, before);
    }

    #[test]
    fn finalize_twice_changes_nothing() {
        let mut p = create_parlour();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);
        plan.check_feasibility(&p.world);
        plan.execute(&mut p.world).unwrap();

        let retained = plan.finalize(&mut p.world, false).unwrap();
        let after_first = p.world.clone();
        assert!(plan.finalize(&mut p.world, true).is_none());
        assert_eq!(p.world, after_first);
        assert_eq!(plan.state(), PlanState::Finalized);

        retained.release(&mut p.world).unwrap();
        assert_eq!(p.world.placement(p.needle), Some(Placement::Carried(p.artist)));
    }

    #[test]
    fn failed_phase_rolls_back_earlier_phases() {
        let mut p = create_parlour();
        let before = p.world.clone();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);
        plan.check_feasibility(&p.world);

        // The ink disappears between check and execution.
        p.world.destroy(p.ink);
        let snapshot = p.world.clone();

        let err = plan.execute(&mut p.world).unwrap_err();
        assert_eq!(
            err.feasibility(),
            Some(Feasibility::MissingResources)
        );
        assert_eq!(p.world, snapshot);
        assert_ne!(p.world, before);
        assert_eq!(plan.state(), PlanState::Created);
    }

    #[test]
    fn consumption_is_kept_on_restore() {
        let mut p = create_parlour();
        let template = PlanTemplate::builder("touch-up")
            .phase(vec![PlanAction::consume(ItemSelector::tag("ink"), 2)])
            .build();
        let mut plan = PlanInstance::new(template, p.artist);
        assert_eq!(plan.check_feasibility(&p.world), Feasibility::Feasible);

        plan.execute(&mut p.world).unwrap();
        plan.finalize(&mut p.world, true);

        assert_eq!(p.world.item_state(p.ink).map(|i| i.quantity), Some(1));
    }

    #[test]
    fn regrip_turns_held_item_into_wielded() {
        let mut p = create_parlour();
        let held_in = p
            .world
            .acquire(p.artist, p.needle, &[LimbId(0)], Grip::Held)
            .unwrap();
        assert_eq!(held_in, ItemOrigin::Carried);

        let template = PlanTemplate::builder("stitch")
            .phase(vec![PlanAction::wield(ItemSelector::tag("needle"))])
            .build();
        let mut plan = PlanInstance::new(template, p.artist);
        assert_eq!(plan.check_feasibility(&p.world), Feasibility::Feasible);
        plan.execute(&mut p.world).unwrap();

        let held = p.world.held_items(p.artist);
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].grip, Grip::Wielded);

        plan.finalize(&mut p.world, true);
        let held = p.world.held_items(p.artist);
        assert_eq!(held[0].grip, Grip::Held);
    }

    #[test]
    fn crossed_regrips_execute_on_unchanged_world() {
        let mut world = WorldState::new();
        let room = world.spawn_location("parlour");
        let body = Body::builder()
            .hand("right hand", StrengthClass::Mighty)
            .hand("left hand", StrengthClass::Average)
            .build();
        let artist = world.spawn_actor("artist", body, Some(room));
        let needle = world.spawn_item(|id| ItemState::new(id, "needle").with_tag("needle"));
        let maul = world.spawn_item(|id| {
            ItemState::new(id, "maul")
                .with_tag("maul")
                .with_min_strength(StrengthClass::Strong)
        });
        world.give(artist, needle).unwrap();
        world.give(artist, maul).unwrap();
        world.acquire(artist, needle, &[LimbId(0)], Grip::Held).unwrap();
        world.acquire(artist, maul, &[LimbId(1)], Grip::Held).unwrap();
        let before = world.clone();

        let template = PlanTemplate::builder("hammer and stitch")
            .phase(vec![
                PlanAction::wield(ItemSelector::tag("needle")),
                PlanAction::wield(ItemSelector::tag("maul")),
            ])
            .build();
        let mut plan = PlanInstance::new(template, artist);
        assert_eq!(plan.check_feasibility(&world), Feasibility::Feasible);
        plan.execute(&mut world).unwrap();

        let held = world.held_items(artist);
        let maul_held = held.iter().find(|h| h.item == maul).unwrap();
        let needle_held = held.iter().find(|h| h.item == needle).unwrap();
        assert_eq!(maul_held.limbs, vec![LimbId(0)]);
        assert_eq!(maul_held.grip, Grip::Wielded);
        assert_eq!(needle_held.limbs, vec![LimbId(1)]);

        assert!(plan.finalize(&mut world, true).is_none());
        assert_eq!(world, before);
    }

    #[test]
    fn rollback_regrasps_crossed_items() {
        let mut world = WorldState::new();
        let room = world.spawn_location("parlour");
        let body = Body::builder()
            .hand("right hand", StrengthClass::Mighty)
            .hand("left hand", StrengthClass::Average)
            .build();
        let artist = world.spawn_actor("artist", body, Some(room));
        let needle = world.spawn_item(|id| ItemState::new(id, "needle").with_tag("needle"));
        let maul = world.spawn_item(|id| {
            ItemState::new(id, "maul")
                .with_tag("maul")
                .with_min_strength(StrengthClass::Strong)
        });
        let ink = world.spawn_item(|id| ItemState::new(id, "ink").with_tag("ink"));
        world.give(artist, needle).unwrap();
        world.give(artist, maul).unwrap();
        world.drop_at(room, ink).unwrap();
        world.acquire(artist, needle, &[LimbId(0)], Grip::Held).unwrap();
        world.acquire(artist, maul, &[LimbId(1)], Grip::Held).unwrap();

        let template = PlanTemplate::builder("hammer then ink")
            .phase(vec![
                PlanAction::wield(ItemSelector::tag("needle")),
                PlanAction::wield(ItemSelector::tag("maul")),
            ])
            .phase(vec![PlanAction::consume(ItemSelector::tag("ink"), 1)])
            .build();
        let mut plan = PlanInstance::new(template, artist);
        assert_eq!(plan.check_feasibility(&world), Feasibility::Feasible);

        world.destroy(ink);
        let snapshot = world.clone();
        assert!(plan.execute(&mut world).is_err());
        assert_eq!(world, snapshot);
    }

    #[test]
    fn guard_restores_on_drop_and_retain_keeps() {
        let mut p = create_parlour();
        let mut plan = PlanInstance::new(tattoo_template(), p.artist);
        plan.check_feasibility(&p.world);
        {
            let guard = plan.execute_guarded(&mut p.world).unwrap();
            assert_eq!(guard.resolution().map(|r| r.items().len()), Some(2));
        }
        assert_eq!(p.world.placement(p.needle), Some(Placement::Carried(p.artist)));

        let mut plan = PlanInstance::new(tattoo_template(), p.artist);
        plan.check_feasibility(&p.world);
        let retained = plan.execute_guarded(&mut p.world).unwrap().retain();
        assert_eq!(retained.items().count(), 2);
        assert_eq!(p.world.placement(p.needle), Some(Placement::Held(p.artist)));
    }

    #[test]
    fn heavy_tool_needs_strong_hands() {
        let mut p = create_parlour();
        let anvil = p.world.spawn_item(|id| {
            ItemState::new(id, "anvil")
                .with_tag("anvil")
                .with_min_strength(StrengthClass::Mighty)
        });
        p.world.give(p.artist, anvil).unwrap();
        let template = PlanTemplate::builder("smith")
            .phase(vec![PlanAction::wield(ItemSelector::Item(anvil))])
            .build();

        let mut plan = PlanInstance::new(template, p.artist);
        assert_eq!(
            plan.check_feasibility(&p.world),
            Feasibility::InsufficientWielders
        );
        let err = plan.execute(&mut p.world).unwrap_err();
        assert_eq!(err.error_code(), "PLAN_NOT_CHECKED");
    }
}
