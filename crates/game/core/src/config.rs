/// Core configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Deadline applied to proposals raised without an explicit duration.
    pub default_proposal_ticks: u64,
    /// Upper bound on simultaneously pending proposals per consenting actor.
    pub max_proposals_per_target: usize,
}

impl CoreConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of limbs tracked per body.
    pub const MAX_LIMBS: usize = 8;
    /// Maximum number of disambiguation keywords per proposal.
    pub const MAX_PROPOSAL_KEYWORDS: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PROPOSAL_TICKS: u64 = 120;
    pub const DEFAULT_MAX_PROPOSALS_PER_TARGET: usize = 8;

    pub fn new() -> Self {
        Self {
            default_proposal_ticks: Self::DEFAULT_PROPOSAL_TICKS,
            max_proposals_per_target: Self::DEFAULT_MAX_PROPOSALS_PER_TARGET,
        }
    }

    pub fn with_proposal_ticks(mut self, ticks: u64) -> Self {
        self.default_proposal_ticks = ticks;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
