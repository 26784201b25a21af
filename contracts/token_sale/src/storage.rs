use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, Symbol};

use crate::error::Error;

// Constants
pub const BASIS_POINTS: i128 = 10_000; // 100% = 10,000 basis points
pub const MAX_FEE_BPS: u32 = 2_000; // 20%
pub const MIN_REFUND_PERIOD: u64 = 5 * 60; // 5 minutes
pub const MAX_REFUND_PERIOD: u64 = 14 * 24 * 60 * 60; // 14 days
pub const MAX_BID_TOKEN_DECIMALS: u32 = 18;

// Address registry keys, same symbols the registry contract exports
pub const ADMIN_KEY: Symbol = symbol_short!("admin");
pub const FEE_RECEIVER_KEY: Symbol = symbol_short!("fee_recv");
pub const VESTING_MANAGER_KEY: Symbol = symbol_short!("vest_mgr");

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FixedPriceTerms {
    /// Seconds after start during which prefund investors may invest
    pub prefund_period: u64,
    /// Closed gap between prefund and the public sale
    pub prefund_allocation_period: u64,
    /// Length of the public sale window
    pub sale_period: u64,
    /// Ask-token smallest units per whole bid token
    pub token_price: i128,
    /// Decimals of the bid (capital) token
    pub bid_token_decimals: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuctionTerms {
    /// Length of the bid collection window
    pub sale_period: u64,
    /// Uncompressed BLS12-381 G1 point bids are encrypted to
    pub public_key: BytesN<96>,
}

/// Variant-specific policy of a sale
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SaleVariant {
    /// Fixed token price, prefund window then public window
    FixedPrice(FixedPriceTerms),
    /// Open-ended raise, closed by `end_sale`
    PreLiquid,
    /// Sealed-bid auction with commit/reveal encryption
    SealedBidAuction(AuctionTerms),
}

/// How claimed allocations reach the investor
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VestingPolicy {
    /// Whole allocation transferred at claim
    Immediate,
    /// TGE share at claim, the rest through the vesting manager
    Vested(VestingTerms),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VestingTerms {
    /// 0 = linear, 1 = linear with epochs
    pub strategy: u32,
    pub duration: u64,
    pub cliff_duration: u64,
    pub epoch_duration: u64,
    pub epoch_count: u32,
    /// Share of each claim released at claim time, in basis points
    pub tge_rate_bps: u32,
}

/// Sale configuration, immutable after initialization
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleConfig {
    pub variant: SaleVariant,
    /// Receives raised capital, supplies ask tokens
    pub project: Address,
    /// Address registry holding admin / fee receiver / vesting manager
    pub registry: Address,
    /// Token capital is raised in
    pub bid_token: Address,
    /// Unix timestamp investing opens
    pub start_time: u64,
    /// Seconds after the sale ends during which investors may refund
    pub refund_period: u64,
    /// Protocol fee on raised capital
    pub fee_bps: u32,
    /// Protocol fee on supplied ask tokens
    pub token_fee_bps: u32,
    /// Uncompressed secp256k1 key signing eligibility proofs
    pub signer: BytesN<65>,
    /// Release policy for claimed allocations
    pub vesting: VestingPolicy,
}

/// Role addresses fetched from the registry
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Roles {
    pub admin: Address,
    pub fee_receiver: Address,
    pub vesting_manager: Address,
}

/// Mutable sale state
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleStatus {
    /// Set when `end_sale` is called
    pub ended_at: Option<u64>,
    /// Refund deadline, set together with ended_at
    pub refund_end_time: Option<u64>,
    pub is_canceled: bool,
    /// Auction: result publication started, cancellation locked
    pub cancel_locked: bool,
    pub capital_raised_published: bool,
    pub results_published: bool,
    pub capital_withdrawn: bool,
    pub tokens_supplied: bool,
    /// Capital in custody from investments (net of refunds)
    pub total_capital_invested: i128,
    /// Audited capital raised
    pub total_capital_raised: i128,
    /// Ask tokens allocated across all investors
    pub total_tokens_allocated: i128,
    /// Ask tokens paid out through claims, vested portions included
    pub total_tokens_claimed: i128,
    /// Capital paid out of custody by the project or excess withdrawals
    pub total_capital_withdrawn: i128,
    pub accepted_capital_root: Option<BytesN<32>>,
    pub claim_root: Option<BytesN<32>>,
    pub ask_token: Option<Address>,
    pub vesting_start_time: u64,
    /// Number of sealed bids recorded (auction)
    pub sealed_bid_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SealedBid {
    /// Bid amount XOR the key derived from the shared point and salt
    pub encrypted_amount: u128,
    /// sha256 of the investor address
    pub salt: BytesN<32>,
    /// Investor's ephemeral G1 point r·G
    pub ephemeral_key: BytesN<96>,
}

/// Sealed bid held by a position
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoredBid {
    Empty,
    Sealed(SealedBid),
}

/// Auction-only arguments of `publish_sale_results`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuctionSettlement {
    pub capital_raised: i128,
    pub accepted_root: BytesN<32>,
    /// Scalar matching the sale public key, 32 bytes big-endian
    pub private_key: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    /// Cumulative capital invested, net of refunds
    pub invested: i128,
    /// Capital returned through accepted-capital proofs
    pub excess_withdrawn: i128,
    pub refunded: bool,
    pub claimed: bool,
    pub excess_claimed: bool,
    pub canceled_withdrawn: bool,
    pub sealed_bid: StoredBid,
    pub vesting_schedule: Option<u64>,
}

impl Position {
    pub fn empty() -> Self {
        Position {
            invested: 0,
            excess_withdrawn: 0,
            refunded: false,
            claimed: false,
            excess_claimed: false,
            canceled_withdrawn: false,
            sealed_bid: StoredBid::Empty,
            vesting_schedule: None,
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SalePhase {
    /// Start time not reached
    Pending = 0,
    /// Fixed price prefund window
    Prefund = 1,
    /// Fixed price gap between prefund and public sale
    PrefundAllocation = 2,
    /// Accepting investments
    Active = 3,
    /// No more investments, results pending
    Ended = 4,
    /// Auction result publication in progress
    CancelLocked = 5,
    /// Results published
    ResultsPublished = 6,
    /// Raised capital withdrawn
    Finalized = 7,
    Canceled = 8,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Initialized,
    Config,
    Roles,
    Status,
    Paused,
    Position(Address),
    BidPublicKey,
    BidPrivateKey,
    InvalidatedKey(BytesN<96>),
}

pub fn get_config(env: &Env) -> Result<SaleConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn set_config(env: &Env, config: &SaleConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_roles(env: &Env) -> Result<Roles, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Roles)
        .ok_or(Error::NotInitialized)
}

pub fn set_roles(env: &Env, roles: &Roles) {
    env.storage().instance().set(&DataKey::Roles, roles);
}

pub fn get_status(env: &Env) -> Result<SaleStatus, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Status)
        .ok_or(Error::NotInitialized)
}

pub fn set_status(env: &Env, status: &SaleStatus) {
    env.storage().instance().set(&DataKey::Status, status);
}

pub fn get_position(env: &Env, investor: &Address) -> Position {
    env.storage()
        .persistent()
        .get(&DataKey::Position(investor.clone()))
        .unwrap_or(Position::empty())
}

pub fn set_position(env: &Env, investor: &Address, position: &Position) {
    env.storage()
        .persistent()
        .set(&DataKey::Position(investor.clone()), position);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
}
