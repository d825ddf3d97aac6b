//! Phase planner shared by feasibility checks and execution.
//!
//! Resolution order per action: items already in hand, then carried items,
//! then items on the ground. Limb assignment serves wield demands first,
//! strongest requirement first, each taking the weakest sufficient limbs;
//! hold demands then take what is left, preferring limbs that cannot wield.
//! Eligibility sets for wielding are nested by strength, so this greedy order
//! never misses a valid assignment.

use crate::body::BodyInventory;
use crate::plan::{Feasibility, PlanActionKind, PlanPhase};
use crate::state::{EntityId, Grip, Limb, LimbCaps, LimbId, StrengthClass};

/// Items and limbs spoken for by earlier actions of the same plan.
#[derive(Debug, Default)]
pub(crate) struct Reservation {
    claimed: Vec<EntityId>,
    busy: Vec<LimbId>,
    /// Limbs an earlier regrip let go of without reusing.
    freed: Vec<LimbId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    AlreadyHeld {
        item: EntityId,
    },
    Acquire {
        item: EntityId,
        limbs: Vec<LimbId>,
        grip: Grip,
        /// The item is already in hand and only changes limbs or grip.
        regrip: bool,
    },
    Consume {
        item: EntityId,
        quantity: u32,
    },
}

impl Step {
    pub(crate) fn item(&self) -> EntityId {
        match self {
            Step::AlreadyHeld { item } | Step::Acquire { item, .. } | Step::Consume { item, .. } => {
                *item
            }
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PlannedStep {
    pub name: Option<String>,
    pub step: Step,
}

#[derive(Debug)]
pub(crate) struct PhasePlan {
    /// Steps in action order; complete only when the verdict is feasible.
    pub steps: Vec<PlannedStep>,
    pub verdict: Feasibility,
}

struct Demand {
    action: usize,
    item: EntityId,
    hands: usize,
    grip: Grip,
    min_strength: StrengthClass,
    regrip: bool,
}

fn limb_of(limbs: &[Limb], id: LimbId) -> Option<&Limb> {
    limbs.iter().find(|l| l.id == id)
}

/// Plans one phase against the current world, updating `reservation`.
pub(crate) fn plan_phase<W: BodyInventory + ?Sized>(
    world: &W,
    actor: EntityId,
    phase: &PlanPhase,
    reservation: &mut Reservation,
) -> PhasePlan {
    let limbs = world.limbs(actor);
    let held = world.held_items(actor);
    let mut verdict = Feasibility::Feasible;
    let mut steps: Vec<Option<Step>> = vec![None; phase.actions.len()];
    let mut demands: Vec<Demand> = Vec::new();

    let mut pool: Vec<LimbId> = limbs
        .iter()
        .filter(|l| l.is_free_manipulator() && !reservation.busy.contains(&l.id))
        .map(|l| l.id)
        .collect();
    for id in &reservation.freed {
        if !pool.contains(id) && !reservation.busy.contains(id) {
            pool.push(*id);
        }
    }

    for (index, action) in phase.actions.iter().enumerate() {
        let selector = &action.selector;
        let matches = |id: &EntityId| {
            !reservation.claimed.contains(id)
                && world.item(*id).is_some_and(|item| selector.matches(item))
        };

        match action.kind {
            PlanActionKind::Consume { quantity } => {
                let candidate = held
                    .iter()
                    .map(|h| h.item)
                    .chain(world.reachable_items(actor, selector))
                    .filter(|id| matches(id))
                    .find(|id| world.item(*id).is_some_and(|item| item.quantity >= quantity));
                match candidate {
                    Some(item) => {
                        reservation.claimed.push(item);
                        steps[index] = Some(Step::Consume { item, quantity });
                    }
                    None => verdict = verdict.worst(Feasibility::MissingResources),
                }
            }
            PlanActionKind::Hold | PlanActionKind::Wield => {
                let wield = action.kind == PlanActionKind::Wield;
                let grip = if wield { Grip::Wielded } else { Grip::Held };

                if let Some(in_hand) = held.iter().find(|h| matches(&h.item)) {
                    let Some(item) = world.item(in_hand.item) else {
                        continue;
                    };
                    reservation.claimed.push(in_hand.item);
                    let hands = usize::from(item.hands_required);
                    let adequate = !wield
                        || (in_hand.grip == Grip::Wielded
                            && in_hand.limbs.len() >= hands
                            && in_hand.limbs.iter().all(|id| {
                                limb_of(&limbs, *id).is_some_and(|l| l.can_wield(item.min_strength))
                            }));
                    if adequate {
                        steps[index] = Some(Step::AlreadyHeld { item: in_hand.item });
                    } else {
                        for id in &in_hand.limbs {
                            if !pool.contains(id) {
                                pool.push(*id);
                            }
                        }
                        demands.push(Demand {
                            action: index,
                            item: in_hand.item,
                            hands,
                            grip,
                            min_strength: item.min_strength,
                            regrip: true,
                        });
                    }
                    continue;
                }

                let found = world
                    .reachable_items(actor, selector)
                    .into_iter()
                    .find(|id| matches(id));
                match found.and_then(|id| world.item(id)) {
                    Some(item) => {
                        reservation.claimed.push(item.id);
                        demands.push(Demand {
                            action: index,
                            item: item.id,
                            hands: usize::from(item.hands_required),
                            grip,
                            min_strength: item.min_strength,
                            regrip: false,
                        });
                    }
                    None => verdict = verdict.worst(Feasibility::MissingResources),
                }
            }
        }
    }

    let needed: usize = demands.iter().map(|d| d.hands).sum();
    if needed > pool.len() {
        verdict = verdict.worst(Feasibility::InsufficientManipulators);
    } else {
        let mut available = pool.clone();
        let strength = |id: &LimbId| limb_of(&limbs, *id).map(|l| l.strength);

        let mut wields: Vec<&Demand> = demands
            .iter()
            .filter(|d| d.grip == Grip::Wielded)
            .collect();
        wields.sort_by(|a, b| b.min_strength.cmp(&a.min_strength));
        for demand in wields {
            let mut candidates: Vec<LimbId> = available
                .iter()
                .copied()
                .filter(|id| {
                    limb_of(&limbs, *id).is_some_and(|l| l.can_wield(demand.min_strength))
                })
                .collect();
            if candidates.len() < demand.hands {
                verdict = verdict.worst(Feasibility::InsufficientWielders);
                continue;
            }
            candidates.sort_by_key(strength);
            candidates.truncate(demand.hands);
            available.retain(|id| !candidates.contains(id));
            steps[demand.action] = Some(acquire_step(demand, candidates));
        }

        available.sort_by_key(|id| {
            let limb = limb_of(&limbs, *id);
            (
                limb.is_some_and(|l| l.caps.contains(LimbCaps::WIELD)),
                limb.map(|l| l.strength),
            )
        });
        for demand in demands.iter().filter(|d| d.grip == Grip::Held) {
            if available.len() < demand.hands {
                verdict = verdict.worst(Feasibility::InsufficientManipulators);
                continue;
            }
            let assigned: Vec<LimbId> = available.drain(..demand.hands).collect();
            steps[demand.action] = Some(acquire_step(demand, assigned));
        }

        for step in steps.iter().flatten() {
            if let Step::Acquire { limbs, .. } = step {
                reservation.busy.extend(limbs.iter().copied());
            }
        }
        for id in available {
            let naturally_free = limb_of(&limbs, id).is_some_and(|l| l.is_free_manipulator());
            if !naturally_free && !reservation.freed.contains(&id) {
                reservation.freed.push(id);
            }
        }
    }

    let steps = phase
        .actions
        .iter()
        .zip(steps)
        .filter_map(|(action, step)| {
            step.map(|step| PlannedStep {
                name: action.name.clone(),
                step,
            })
        })
        .collect();

    PhasePlan { steps, verdict }
}

fn acquire_step(demand: &Demand, limbs: Vec<LimbId>) -> Step {
    Step::Acquire {
        item: demand.item,
        limbs,
        grip: demand.grip,
        regrip: demand.regrip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ItemSelector, PlanAction};
    use crate::state::{Body, ItemState, WorldState};

    fn setup(body: Body) -> (WorldState, EntityId) {
        let mut world = WorldState::new();
        let parlour = world.spawn_location("parlour");
        let artist = world.spawn_actor("artist", body, Some(parlour));
        (world, artist)
    }

    fn carry(world: &mut WorldState, actor: EntityId, item: ItemState) -> EntityId {
        let id = world.spawn_item(|_| item);
        world.give(actor, id).unwrap();
        id
    }

    #[test]
    fn wield_prefers_weakest_sufficient_limb() {
        let body = Body::builder()
            .hand("right hand", StrengthClass::Mighty)
            .hand("left hand", StrengthClass::Average)
            .build();
        let (mut world, artist) = setup(body);
        carry(
            &mut world,
            artist,
            ItemState::new(EntityId(0), "needle").with_tag("needle"),
        );
        carry(
            &mut world,
            artist,
            ItemState::new(EntityId(0), "maul")
                .with_tag("maul")
                .with_min_strength(StrengthClass::Strong),
        );

        let phase = PlanPhase::new(vec![
            PlanAction::wield(ItemSelector::tag("needle")),
            PlanAction::wield(ItemSelector::tag("maul")),
        ]);
        let plan = plan_phase(&world, artist, &phase, &mut Reservation::default());

        assert_eq!(plan.verdict, Feasibility::Feasible);
        let limbs: Vec<_> = plan
            .steps
            .iter()
            .map(|s| match &s.step {
                Step::Acquire { limbs, .. } => limbs.clone(),
                other => panic!("unexpected step {other:?}"),
            })
            .collect();
        assert_eq!(limbs, vec![vec![LimbId(1)], vec![LimbId(0)]]);
    }

    #[test]
    fn hold_prefers_limbs_that_cannot_wield() {
        let body = Body::builder()
            .hand("hand", StrengthClass::Average)
            .grasper("tail", StrengthClass::Weak)
            .build();
        let (mut world, artist) = setup(body);
        carry(
            &mut world,
            artist,
            ItemState::new(EntityId(0), "lamp").with_tag("lamp"),
        );

        let phase = PlanPhase::new(vec![PlanAction::hold(ItemSelector::tag("lamp"))]);
        let plan = plan_phase(&world, artist, &phase, &mut Reservation::default());

        assert_eq!(plan.verdict, Feasibility::Feasible);
        assert!(matches!(
            &plan.steps[0].step,
            Step::Acquire { limbs, grip: Grip::Held, .. } if limbs == &vec![LimbId(1)]
        ));
    }

    #[test]
    fn weak_limbs_report_insufficient_wielders() {
        let body = Body::builder()
            .hand("hand", StrengthClass::Weak)
            .build();
        let (mut world, artist) = setup(body);
        carry(
            &mut world,
            artist,
            ItemState::new(EntityId(0), "maul")
                .with_tag("maul")
                .with_min_strength(StrengthClass::Strong),
        );

        let phase = PlanPhase::new(vec![PlanAction::wield(ItemSelector::tag("maul"))]);
        let plan = plan_phase(&world, artist, &phase, &mut Reservation::default());

        assert_eq!(plan.verdict, Feasibility::InsufficientWielders);
    }

    #[test]
    fn missing_item_reports_missing_resources() {
        let (world, artist) = setup(Body::humanoid());
        let phase = PlanPhase::new(vec![PlanAction::hold(ItemSelector::tag("ink"))]);
        let plan = plan_phase(&world, artist, &phase, &mut Reservation::default());

        assert_eq!(plan.verdict, Feasibility::MissingResources);
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn reservation_carries_busy_limbs_across_phases() {
        let (mut world, artist) = setup(Body::humanoid());
        carry(&mut world, artist, ItemState::new(EntityId(0), "a").with_tag("tool"));
        carry(&mut world, artist, ItemState::new(EntityId(0), "b").with_tag("tool"));
        carry(&mut world, artist, ItemState::new(EntityId(0), "c").with_tag("tool"));

        let phase = PlanPhase::new(vec![PlanAction::hold(ItemSelector::tag("tool"))]);
        let mut reservation = Reservation::default();

        let first = plan_phase(&world, artist, &phase, &mut reservation);
        let second = plan_phase(&world, artist, &phase, &mut reservation);
        let third = plan_phase(&world, artist, &phase, &mut reservation);

        assert_eq!(first.verdict, Feasibility::Feasible);
        assert_eq!(second.verdict, Feasibility::Feasible);
        assert_ne!(first.steps[0].step.item(), second.steps[0].step.item());
        assert_eq!(third.verdict, Feasibility::InsufficientManipulators);
    }
}
