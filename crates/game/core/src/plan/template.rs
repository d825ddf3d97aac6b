//! Immutable plan templates: ordered phases of resource requirements.

use std::fmt;
use std::sync::Arc;

use crate::state::{EntityId, ItemState};

/// Code-only item filter.
#[derive(Clone)]
pub struct ItemPredicate(Arc<dyn Fn(&ItemState) -> bool + Send + Sync>);

impl ItemPredicate {
    pub fn new(f: impl Fn(&ItemState) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ItemPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemPredicate(..)")
    }
}

/// Chooses which item satisfies a plan action.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemSelector {
    /// One specific item.
    Item(EntityId),
    /// Any item carrying this tag.
    Tag(String),
    /// Any item the predicate accepts.
    #[cfg_attr(feature = "serde", serde(skip))]
    Predicate(ItemPredicate),
}

impl ItemSelector {
    pub fn tag(tag: &str) -> Self {
        Self::Tag(tag.to_ascii_lowercase())
    }

    pub fn predicate(f: impl Fn(&ItemState) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(ItemPredicate::new(f))
    }

    pub fn matches(&self, item: &ItemState) -> bool {
        match self {
            ItemSelector::Item(id) => item.id == *id,
            ItemSelector::Tag(tag) => item.has_tag(tag),
            ItemSelector::Predicate(p) => (p.0)(item),
        }
    }
}

impl fmt::Display for ItemSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemSelector::Item(id) => write!(f, "item {id}"),
            ItemSelector::Tag(tag) => write!(f, "tag '{tag}'"),
            ItemSelector::Predicate(_) => f.write_str("predicate"),
        }
    }
}

/// Body capability an action demands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PlanActionKind {
    /// In hand, any manipulating limbs.
    Hold,
    /// In hand, gripped by limbs strong enough for the item.
    Wield,
    /// Drawn from a stack within reach; occupies no limb.
    Consume { quantity: u32 },
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanAction {
    pub selector: ItemSelector,
    pub kind: PlanActionKind,
    /// Key under which the resolved item is reported.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl PlanAction {
    pub fn hold(selector: ItemSelector) -> Self {
        Self {
            selector,
            kind: PlanActionKind::Hold,
            name: None,
        }
    }

    pub fn wield(selector: ItemSelector) -> Self {
        Self {
            selector,
            kind: PlanActionKind::Wield,
            name: None,
        }
    }

    pub fn consume(selector: ItemSelector, quantity: u32) -> Self {
        Self {
            selector,
            kind: PlanActionKind::Consume { quantity },
            name: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Actions acquired together; either all succeed or none stay acquired.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanPhase {
    pub actions: Vec<PlanAction>,
}

impl PlanPhase {
    pub fn new(actions: Vec<PlanAction>) -> Self {
        Self { actions }
    }
}

/// A reusable recipe of resource requirements.
///
/// Templates are immutable once built and shared between instances through an
/// `Arc`; all per-attempt state lives in [`crate::plan::PlanInstance`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanTemplate {
    pub name: String,
    pub phases: Vec<PlanPhase>,
}

impl PlanTemplate {
    pub fn builder(name: &str) -> PlanTemplateBuilder {
        PlanTemplateBuilder {
            template: PlanTemplate {
                name: name.to_string(),
                phases: Vec::new(),
            },
        }
    }

    /// Every action, in phase order.
    pub fn actions(&self) -> impl Iterator<Item = &PlanAction> {
        self.phases.iter().flat_map(|p| p.actions.iter())
    }
}

pub struct PlanTemplateBuilder {
    template: PlanTemplate,
}

impl PlanTemplateBuilder {
    pub fn phase(mut self, actions: Vec<PlanAction>) -> Self {
        self.template.phases.push(PlanPhase::new(actions));
        self
    }

    pub fn build(self) -> Arc<PlanTemplate> {
        Arc::new(self.template)
    }
}
