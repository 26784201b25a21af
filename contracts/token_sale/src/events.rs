use soroban_sdk::{contracttype, Address, BytesN};

#[contracttype]
#[derive(Clone, Debug)]
pub struct SaleInitializedEvent {
    pub project: Address,
    pub bid_token: Address,
    pub start_time: u64,
    pub refund_period: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CapitalInvestedEvent {
    pub investor: Address,
    pub amount: i128,
    pub invested_total: i128,
    pub sealed: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SaleEndedEvent {
    pub ended_by: Address,
    pub ended_at: u64,
    pub refund_end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CapitalRaisedPublishedEvent {
    pub capital_raised: i128,
    pub accepted_root: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PublishLockedEvent {
    pub locked_at: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PrivateKeyPublishedEvent {
    pub public_key: BytesN<96>,
    pub private_key: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SaleResultsPublishedEvent {
    pub claim_root: BytesN<32>,
    pub tokens_allocated: i128,
    pub ask_token: Address,
    pub vesting_start_time: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct TokensSuppliedEvent {
    pub project: Address,
    pub amount: i128,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct AllocationClaimedEvent {
    pub investor: Address,
    pub amount: i128,
    pub released_now: i128,
    pub vesting_schedule: Option<u64>,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ExcessWithdrawnEvent {
    pub investor: Address,
    pub accepted_amount: i128,
    pub excess: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RefundIssuedEvent {
    pub investor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CapitalWithdrawnEvent {
    pub project: Address,
    pub amount: i128,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SaleCanceledEvent {
    pub canceled_at: u64,
    pub tokens_returned: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CanceledWithdrawalEvent {
    pub investor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BidKeyRotatedEvent {
    pub previous: BytesN<96>,
    pub public_key: BytesN<96>,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct EmergencyWithdrawalEvent {
    pub admin: Address,
    pub receiver: Address,
    pub token: Address,
    pub amount: i128,
}
