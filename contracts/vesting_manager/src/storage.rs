use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VestingStrategy {
    /// Releases continuously in proportion to elapsed time
    Linear = 0,
    /// Releases in equal steps at epoch boundaries only
    LinearEpoch = 1,
}

impl VestingStrategy {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(VestingStrategy::Linear),
            1 => Some(VestingStrategy::LinearEpoch),
            _ => None,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VestingSchedule {
    /// Schedule id inside the manager arena
    pub id: u64,
    /// Contract or account that created and funds the schedule
    pub creator: Address,
    /// Receiver of every release
    pub beneficiary: Address,
    /// Token held in custody for this schedule
    pub token: Address,
    pub strategy: VestingStrategy,
    /// Unix timestamp the curve starts from
    pub start: u64,
    /// Seconds from start until everything is vested
    pub duration: u64,
    /// Seconds from start before anything is releasable
    pub cliff_duration: u64,
    /// Epoch length (epoch strategy only, zero otherwise)
    pub epoch_duration: u64,
    /// Number of epochs (epoch strategy only, zero otherwise)
    pub epoch_count: u32,
    /// Tokens placed under this schedule
    pub total_amount: i128,
    /// Tokens already paid to the beneficiary
    pub released_amount: i128,
    /// Last epoch index paid out (epoch strategy)
    pub last_released_epoch: u32,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    ScheduleCounter,
    Schedule(u64),
    BeneficiarySchedules(Address),
    Accounted(Address), // token -> tokens owed to live schedules
}
