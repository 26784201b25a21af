use soroban_sdk::{contracttype, Address};

use crate::storage::VestingStrategy;

#[contracttype]
#[derive(Clone, Debug)]
pub struct ScheduleCreatedEvent {
    pub schedule_id: u64,
    pub creator: Address,
    pub beneficiary: Address,
    pub token: Address,
    pub strategy: VestingStrategy,
    pub start: u64,
    pub duration: u64,
    pub cliff_duration: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ScheduleFundedEvent {
    pub schedule_id: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct TokensReleasedEvent {
    pub schedule_id: u64,
    pub beneficiary: Address,
    pub amount: i128,
    pub released_total: i128,
}
