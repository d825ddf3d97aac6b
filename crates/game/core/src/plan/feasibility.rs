/// Outcome of a feasibility check.
///
/// Variants are ordered by reporting priority: when several shortfalls apply,
/// the greatest one is reported, so combining results is just `max`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Feasibility {
    #[default]
    Feasible,
    MissingResources,
    InsufficientWielders,
    InsufficientManipulators,
}

impl Feasibility {
    pub fn is_feasible(self) -> bool {
        self == Feasibility::Feasible
    }

    /// Combines two results, keeping the higher-priority shortfall.
    pub fn worst(self, other: Feasibility) -> Feasibility {
        self.max(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manipulators_outrank_everything() {
        assert_eq!(
            Feasibility::MissingResources.worst(Feasibility::InsufficientManipulators),
            Feasibility::InsufficientManipulators
        );
        assert_eq!(
            Feasibility::InsufficientWielders.worst(Feasibility::MissingResources),
            Feasibility::InsufficientWielders
        );
        assert_eq!(
            Feasibility::Feasible.worst(Feasibility::Feasible),
            Feasibility::Feasible
        );
    }
}
