//! The aggregate consensus state carried between blocks.

use helix_types::{ChainProperties, ScheduleParams};

use crate::finality::ValidationLedger;
use crate::registry::ProducerRegistry;
use crate::schedule::ProducerSchedule;
use crate::version::HardforkState;
use crate::violation::ViolationLedger;
use crate::vote::VoteLedger;

/// Everything the evaluators read and write. The node persists this as one
/// unit so a replay from any block reproduces it exactly.
#[derive(Clone, Debug, Default)]
pub struct ConsensusState {
    pub registry: ProducerRegistry,
    pub votes: VoteLedger,
    pub schedule: ProducerSchedule,
    pub validations: ValidationLedger,
    pub violations: ViolationLedger,
    pub hardfork: HardforkState,
    /// Component-wise median of the scheduled producers' proposed
    /// properties, refreshed on every schedule rebuild.
    pub median_props: ChainProperties,
}

impl ConsensusState {
    pub fn new(params: ScheduleParams) -> Self {
        Self {
            schedule: ProducerSchedule::new(params),
            ..Self::default()
        }
    }
}
