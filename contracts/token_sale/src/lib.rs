#![no_std]

mod eligibility;
mod error;
mod events;
mod merkle;
mod phase;
mod pricing;
mod sealed_bid;
mod storage;
mod variant;

pub use error::Error;
use events::*;
use phase::{current_phase, ended_at, is_refund_period_over, refund_end};
use pricing::{calculate_allocation, calculate_fee, split_tge};
use storage::{
    get_config, get_position, get_roles, get_status, is_paused, set_config, set_paused,
    set_position, set_roles, set_status, DataKey, ADMIN_KEY, FEE_RECEIVER_KEY, MAX_FEE_BPS,
    MAX_REFUND_PERIOD, MIN_REFUND_PERIOD, VESTING_MANAGER_KEY,
};
pub use storage::{
    AuctionSettlement, AuctionTerms, FixedPriceTerms, Position, Roles, SaleConfig, SalePhase,
    SaleStatus, SaleVariant, SealedBid, StoredBid, VestingPolicy, VestingTerms,
};
use variant::Window;

#[cfg(any(test, feature = "testutils"))]
pub use eligibility::eligibility_digest;
#[cfg(any(test, feature = "testutils"))]
pub use merkle::{hash_pair, leaf_hash};
#[cfg(any(test, feature = "testutils"))]
pub use sealed_bid::{bid_salt, derive_public_key, encrypt_bid};

use soroban_sdk::{
    contract, contractimpl, log, token, vec, Address, BytesN, Env, IntoVal, Symbol, Vec,
};

#[contract]
pub struct TokenSale;

#[contractimpl]
impl TokenSale {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the sale
    ///
    /// Role addresses are read from `config.registry` and cached.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidStartTime`: start_time is in the past
    /// - `InvalidRefundPeriod`: Refund period outside protocol bounds
    /// - `InvalidFee`: A fee exceeds MAX_FEE_BPS
    /// - `InvalidConfig`: Variant terms unusable
    /// - `InvalidVestingConfig`: Vesting terms rejected
    /// - `InvalidBidPublicKey`: Auction public key rejected
    pub fn initialize(env: Env, config: SaleConfig) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        config.project.require_auth();

        if config.start_time < env.ledger().timestamp() {
            return Err(Error::InvalidStartTime);
        }
        if config.refund_period < MIN_REFUND_PERIOD || config.refund_period > MAX_REFUND_PERIOD {
            return Err(Error::InvalidRefundPeriod);
        }
        if config.fee_bps > MAX_FEE_BPS || config.token_fee_bps > MAX_FEE_BPS {
            return Err(Error::InvalidFee);
        }
        if !config.variant.validate(config.start_time) {
            return Err(Error::InvalidConfig);
        }
        if let VestingPolicy::Vested(terms) = &config.vesting {
            if !terms.is_valid() {
                return Err(Error::InvalidVestingConfig);
            }
        }
        if let SaleVariant::SealedBidAuction(terms) = &config.variant {
            sealed_bid::validate_public_key(&env, &terms.public_key)?;
            env.storage()
                .instance()
                .set(&DataKey::BidPublicKey, &terms.public_key);
        }

        let roles = Self::fetch_roles(&env, &config.registry);

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Paused, &false);
        set_config(&env, &config);
        set_roles(&env, &roles);
        set_status(
            &env,
            &SaleStatus {
                ended_at: None,
                refund_end_time: None,
                is_canceled: false,
                cancel_locked: false,
                capital_raised_published: false,
                results_published: false,
                capital_withdrawn: false,
                tokens_supplied: false,
                total_capital_invested: 0,
                total_capital_raised: 0,
                total_tokens_allocated: 0,
                total_tokens_claimed: 0,
                total_capital_withdrawn: 0,
                accepted_capital_root: None,
                claim_root: None,
                ask_token: None,
                vesting_start_time: 0,
                sealed_bid_count: 0,
            },
        );

        log!(&env, "sale initialized", config.project, config.start_time);

        env.events().publish(
            (Symbol::new(&env, "sale_initialized"), config.project.clone()),
            SaleInitializedEvent {
                project: config.project,
                bid_token: config.bid_token,
                start_time: config.start_time,
                refund_period: config.refund_period,
            },
        );

        Ok(())
    }

    /// Re-read admin, fee receiver and vesting manager from the registry
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn sync_registry(env: Env) -> Result<Roles, Error> {
        let config = get_config(&env)?;
        let roles = Self::fetch_roles(&env, &config.registry);
        set_roles(&env, &roles);
        Ok(roles)
    }

    /// Pause investing
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn pause(env: Env) -> Result<(), Error> {
        Self::require_admin(&env)?;
        set_paused(&env, true);
        Ok(())
    }

    /// Unpause investing
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn unpause(env: Env) -> Result<(), Error> {
        Self::require_admin(&env)?;
        set_paused(&env, false);
        Ok(())
    }

    /// Move tokens out of custody (emergency)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: amount must be positive
    pub fn emergency_withdraw(
        env: Env,
        receiver: Address,
        asset: Address,
        amount: i128,
    ) -> Result<(), Error> {
        let admin = Self::require_admin(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &receiver,
            &amount,
        );

        log!(&env, "emergency withdrawal", receiver, amount);

        env.events().publish(
            (Symbol::new(&env, "emergency_withdrawal"), asset.clone()),
            EmergencyWithdrawalEvent {
                admin,
                receiver,
                token: asset,
                amount,
            },
        );

        Ok(())
    }

    // ============================================
    // FLOW 1: INVEST
    // ============================================

    /// Deposit capital into the sale
    ///
    /// `signature` is the eligibility signer's secp256k1 signature over
    /// (investor, amount, sale). Auction sales require a sealed bid; other
    /// variants reject one.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: amount must be positive
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `SaleNotStarted`: Before start time
    /// - `PrefundAllocationPeriodNotEnded`: Between prefund and sale window
    /// - `SaleHasEnded`: Investment window closed
    /// - `InvalidSignature`: Eligibility proof rejected
    /// - `PrivateKeyAlreadyPublished`: Bids already revealed (auction)
    /// - `InvalidSealedBid`: Bid missing (auction) or unexpected
    /// - `InvalidBidPublicKey`: Ephemeral key rejected (auction)
    /// - `InvalidSalt`: Salt not bound to investor (auction)
    pub fn invest(
        env: Env,
        investor: Address,
        amount: i128,
        signature: BytesN<64>,
        recovery_id: u32,
        encrypted_bid: Option<SealedBid>,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        investor.require_auth();

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;
        let now = env.ledger().timestamp();

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if ended_at(&config, &status, now).is_some() {
            return Err(Error::SaleHasEnded);
        }
        match config.variant.window(config.start_time, now) {
            Window::NotStarted => return Err(Error::SaleNotStarted),
            Window::PrefundAllocation => return Err(Error::PrefundAllocationPeriodNotEnded),
            Window::Closed => return Err(Error::SaleHasEnded),
            Window::Prefund | Window::Open => {}
        }

        eligibility::verify_eligibility(
            &env,
            &config.signer,
            &investor,
            amount,
            &signature,
            recovery_id,
        )?;

        let mut position = get_position(&env, &investor);

        let sealed = config.variant.is_auction();
        if sealed {
            if env.storage().instance().has(&DataKey::BidPrivateKey) {
                return Err(Error::PrivateKeyAlreadyPublished);
            }
            let bid = encrypted_bid.ok_or(Error::InvalidSealedBid)?;
            sealed_bid::check_point(&env, &bid.ephemeral_key)?;
            if bid.salt != sealed_bid::bid_salt(&env, &investor) {
                return Err(Error::InvalidSalt);
            }
            position.sealed_bid = StoredBid::Sealed(bid);
            status.sealed_bid_count = status.sealed_bid_count.saturating_add(1);
        } else if encrypted_bid.is_some() {
            return Err(Error::InvalidSealedBid);
        }

        token::Client::new(&env, &config.bid_token).transfer(
            &investor,
            &env.current_contract_address(),
            &amount,
        );

        position.invested = position
            .invested
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        position.refunded = false;
        status.total_capital_invested = status
            .total_capital_invested
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;

        set_position(&env, &investor, &position);
        set_status(&env, &status);

        env.events().publish(
            (Symbol::new(&env, "capital_invested"), investor.clone()),
            CapitalInvestedEvent {
                investor,
                amount,
                invested_total: position.invested,
                sealed,
            },
        );

        Ok(())
    }

    /// Close the sale to new investment and start the refund window
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is neither admin nor project
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `SaleNotStarted`: Before start time
    /// - `SaleHasEnded`: Sale already ended
    pub fn end_sale(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();

        let config = get_config(&env)?;
        let roles = get_roles(&env)?;
        if caller != roles.admin && caller != config.project {
            return Err(Error::Unauthorized);
        }

        let mut status = get_status(&env)?;
        let now = env.ledger().timestamp();

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if now < config.start_time {
            return Err(Error::SaleNotStarted);
        }
        if ended_at(&config, &status, now).is_some() {
            return Err(Error::SaleHasEnded);
        }

        let refund_end_time = now
            .checked_add(config.refund_period)
            .ok_or(Error::ArithmeticOverflow)?;
        status.ended_at = Some(now);
        status.refund_end_time = Some(refund_end_time);
        set_status(&env, &status);

        log!(&env, "sale ended", now, refund_end_time);

        env.events().publish(
            (Symbol::new(&env, "sale_ended"), caller.clone()),
            SaleEndedEvent {
                ended_by: caller,
                ended_at: now,
                refund_end_time,
            },
        );

        Ok(())
    }

    // ============================================
    // FLOW 2: RESULTS
    // ============================================

    /// Publish the audited capital raise and the accepted-capital root
    ///
    /// # Errors
    /// - `InvalidSaleVariant`: Auction publishes capital with its results
    /// - `CapitalRaisedAlreadyPublished`: Already published
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `SaleHasNotEnded`: Sale still active
    /// - `InvalidAmount`: Negative or above total invested
    pub fn publish_capital_raised(
        env: Env,
        capital_raised: i128,
        accepted_root: BytesN<32>,
    ) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if config.variant.is_auction() {
            return Err(Error::InvalidSaleVariant);
        }
        if status.capital_raised_published {
            return Err(Error::CapitalRaisedAlreadyPublished);
        }
        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if ended_at(&config, &status, env.ledger().timestamp()).is_none() {
            return Err(Error::SaleHasNotEnded);
        }

        Self::record_capital_raised(&env, &mut status, capital_raised, accepted_root)?;
        set_status(&env, &status);

        Ok(())
    }

    /// Lock cancellation before the auction reveal (auction only)
    ///
    /// # Errors
    /// - `InvalidSaleVariant`: Not an auction
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `SaleHasNotEnded`: Bid window still open
    /// - `PrivateKeyAlreadyPublished`: Reveal already happened
    /// - `SaleCancelLocked`: Already locked
    pub fn initialize_publish_sale_results(env: Env) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;
        let now = env.ledger().timestamp();

        if !config.variant.is_auction() {
            return Err(Error::InvalidSaleVariant);
        }
        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if ended_at(&config, &status, now).is_none() {
            return Err(Error::SaleHasNotEnded);
        }
        if env.storage().instance().has(&DataKey::BidPrivateKey) {
            return Err(Error::PrivateKeyAlreadyPublished);
        }
        if status.cancel_locked {
            return Err(Error::SaleCancelLocked);
        }

        status.cancel_locked = true;
        set_status(&env, &status);

        env.events().publish(
            (Symbol::new(&env, "publish_locked"),),
            PublishLockedEvent { locked_at: now },
        );

        Ok(())
    }

    /// Publish the claim root and token allocation (one-shot)
    ///
    /// Auction sales pass `auction` to publish their capital raise, the
    /// accepted root and the bid private key in the same call.
    ///
    /// # Errors
    /// - `ResultsAlreadyPublished`: Already published
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `SaleHasNotEnded`: Sale still active
    /// - `InvalidAmount`: tokens_allocated must be positive
    /// - `InvalidAskToken`: ask_token is the capital token
    /// - `CapitalNotRaised`: Capital raise not published (non-auction)
    /// - `InvalidTokenAmount`: Allocation above what the raise buys (fixed price)
    /// - `InvalidSaleVariant`: Settlement missing (auction) or unexpected
    /// - `PrivateKeyNotPublished`: Cancellation not locked (auction)
    /// - `InvalidBidPrivateKey`: Key does not match the bid public key
    pub fn publish_sale_results(
        env: Env,
        claim_root: BytesN<32>,
        tokens_allocated: i128,
        ask_token: Address,
        vesting_start_time: u64,
        auction: Option<AuctionSettlement>,
    ) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if status.results_published {
            return Err(Error::ResultsAlreadyPublished);
        }
        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if ended_at(&config, &status, env.ledger().timestamp()).is_none() {
            return Err(Error::SaleHasNotEnded);
        }
        if tokens_allocated <= 0 {
            return Err(Error::InvalidAmount);
        }
        if ask_token == config.bid_token {
            return Err(Error::InvalidAskToken);
        }

        match (&config.variant, auction) {
            (SaleVariant::SealedBidAuction(_), Some(settlement)) => {
                if !status.cancel_locked {
                    return Err(Error::PrivateKeyNotPublished);
                }
                let public_key: BytesN<96> = env
                    .storage()
                    .instance()
                    .get(&DataKey::BidPublicKey)
                    .ok_or(Error::NotInitialized)?;
                sealed_bid::verify_private_key(&env, &settlement.private_key, &public_key)?;

                Self::record_capital_raised(
                    &env,
                    &mut status,
                    settlement.capital_raised,
                    settlement.accepted_root,
                )?;

                env.storage()
                    .instance()
                    .set(&DataKey::BidPrivateKey, &settlement.private_key);

                env.events().publish(
                    (Symbol::new(&env, "private_key_published"),),
                    PrivateKeyPublishedEvent {
                        public_key,
                        private_key: settlement.private_key,
                    },
                );
            }
            (SaleVariant::SealedBidAuction(_), None) => return Err(Error::InvalidSaleVariant),
            (_, Some(_)) => return Err(Error::InvalidSaleVariant),
            (variant, None) => {
                if !status.capital_raised_published {
                    return Err(Error::CapitalNotRaised);
                }
                if let SaleVariant::FixedPrice(terms) = variant {
                    let max_allocation = calculate_allocation(
                        status.total_capital_raised,
                        terms.token_price,
                        terms.bid_token_decimals,
                    )
                    .ok_or(Error::ArithmeticOverflow)?;
                    if tokens_allocated > max_allocation {
                        return Err(Error::InvalidTokenAmount);
                    }
                }
            }
        }

        status.results_published = true;
        status.claim_root = Some(claim_root.clone());
        status.total_tokens_allocated = tokens_allocated;
        status.ask_token = Some(ask_token.clone());
        status.vesting_start_time = vesting_start_time;
        set_status(&env, &status);

        log!(&env, "sale results published", tokens_allocated);

        env.events().publish(
            (Symbol::new(&env, "sale_results_published"),),
            SaleResultsPublishedEvent {
                claim_root,
                tokens_allocated,
                ask_token,
                vesting_start_time,
            },
        );

        Ok(())
    }

    /// Deposit the allocated ask tokens, plus the token fee
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `ResultsNotPublished`: Results not published
    /// - `TokensAlreadySupplied`: Already supplied
    /// - `InvalidTokenAmount`: amount differs from the published allocation
    pub fn supply_tokens(env: Env, amount: i128) -> Result<(), Error> {
        let config = get_config(&env)?;
        config.project.require_auth();

        let mut status = get_status(&env)?;
        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if !status.results_published {
            return Err(Error::ResultsNotPublished);
        }
        if status.tokens_supplied {
            return Err(Error::TokensAlreadySupplied);
        }
        if amount != status.total_tokens_allocated {
            return Err(Error::InvalidTokenAmount);
        }

        let ask_token = status.ask_token.clone().ok_or(Error::ResultsNotPublished)?;
        let fee = calculate_fee(amount, config.token_fee_bps).ok_or(Error::ArithmeticOverflow)?;
        let roles = get_roles(&env)?;

        let client = token::Client::new(&env, &ask_token);
        client.transfer(&config.project, &env.current_contract_address(), &amount);
        if fee > 0 {
            client.transfer(&config.project, &roles.fee_receiver, &fee);
        }

        status.tokens_supplied = true;
        set_status(&env, &status);

        env.events().publish(
            (Symbol::new(&env, "tokens_supplied"), config.project.clone()),
            TokensSuppliedEvent {
                project: config.project,
                amount,
                fee,
            },
        );

        Ok(())
    }

    // ============================================
    // FLOW 3: SETTLEMENT
    // ============================================

    /// Claim an allocation proven against the claim root
    ///
    /// The TGE share is transferred at once; the rest is placed in a
    /// vesting schedule owned by the investor.
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `ResultsNotPublished`: Results not published
    /// - `TokensNotSupplied`: Project has not supplied tokens
    /// - `RefundPeriodIsNotOver`: Refund window still open
    /// - `AlreadyClaimed`: Allocation already claimed
    /// - `AlreadyRefunded`: Position was refunded
    /// - `InvalidAmount`: amount must be positive
    /// - `InvalidClaimProof`: Proof does not match the claim root
    pub fn claim_token_allocation(
        env: Env,
        investor: Address,
        amount: i128,
        proof: Vec<BytesN<32>>,
    ) -> Result<(), Error> {
        investor.require_auth();

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if !status.results_published {
            return Err(Error::ResultsNotPublished);
        }
        if !status.tokens_supplied {
            return Err(Error::TokensNotSupplied);
        }
        if !is_refund_period_over(&config, &status, env.ledger().timestamp()) {
            return Err(Error::RefundPeriodIsNotOver);
        }

        let mut position = get_position(&env, &investor);
        if position.claimed {
            return Err(Error::AlreadyClaimed);
        }
        if position.refunded {
            return Err(Error::AlreadyRefunded);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let claim_root = status.claim_root.clone().ok_or(Error::ResultsNotPublished)?;
        let leaf = merkle::leaf_hash(&env, &investor, amount);
        if !merkle::verify(&env, &claim_root, leaf, &proof) {
            return Err(Error::InvalidClaimProof);
        }

        let ask_token = status.ask_token.clone().ok_or(Error::ResultsNotPublished)?;
        let client = token::Client::new(&env, &ask_token);
        let sale = env.current_contract_address();

        let (released_now, vesting_schedule) = match &config.vesting {
            VestingPolicy::Immediate => {
                client.transfer(&sale, &investor, &amount);
                (amount, None)
            }
            VestingPolicy::Vested(terms) => {
                let (immediate, vested) =
                    split_tge(amount, terms.tge_rate_bps).ok_or(Error::ArithmeticOverflow)?;
                if immediate > 0 {
                    client.transfer(&sale, &investor, &immediate);
                }
                let schedule_id = if vested > 0 {
                    Some(Self::issue_vesting(
                        &env,
                        terms,
                        &investor,
                        &ask_token,
                        status.vesting_start_time,
                        vested,
                    )?)
                } else {
                    None
                };
                (immediate, schedule_id)
            }
        };

        position.claimed = true;
        position.vesting_schedule = vesting_schedule;
        status.total_tokens_claimed = status
            .total_tokens_claimed
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        set_position(&env, &investor, &position);
        set_status(&env, &status);

        env.events().publish(
            (Symbol::new(&env, "allocation_claimed"), investor.clone()),
            AllocationClaimedEvent {
                investor,
                amount,
                released_now,
                vesting_schedule,
            },
        );

        Ok(())
    }

    /// Return the part of an investment the raise did not accept
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `CapitalNotRaised`: Capital raise not published
    /// - `AlreadyWithdrawn`: Excess already returned
    /// - `InvalidAmount`: Negative accepted amount
    /// - `InvalidAcceptedCapitalProof`: Proof does not match the accepted root
    /// - `NoExcessCapital`: Accepted amount covers the whole investment
    pub fn withdraw_excess_invested_capital(
        env: Env,
        investor: Address,
        accepted_amount: i128,
        proof: Vec<BytesN<32>>,
    ) -> Result<i128, Error> {
        investor.require_auth();

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if !status.capital_raised_published {
            return Err(Error::CapitalNotRaised);
        }

        let mut position = get_position(&env, &investor);
        if position.excess_claimed {
            return Err(Error::AlreadyWithdrawn);
        }
        if accepted_amount < 0 {
            return Err(Error::InvalidAmount);
        }

        let accepted_root = status
            .accepted_capital_root
            .clone()
            .ok_or(Error::CapitalNotRaised)?;
        let leaf = merkle::leaf_hash(&env, &investor, accepted_amount);
        if !merkle::verify(&env, &accepted_root, leaf, &proof) {
            return Err(Error::InvalidAcceptedCapitalProof);
        }

        let excess = position
            .invested
            .checked_sub(accepted_amount)
            .ok_or(Error::ArithmeticOverflow)?;
        if excess <= 0 {
            return Err(Error::NoExcessCapital);
        }

        position.excess_withdrawn = excess;
        position.excess_claimed = true;
        status.total_capital_withdrawn = status
            .total_capital_withdrawn
            .checked_add(excess)
            .ok_or(Error::ArithmeticOverflow)?;
        set_position(&env, &investor, &position);
        set_status(&env, &status);

        token::Client::new(&env, &config.bid_token).transfer(
            &env.current_contract_address(),
            &investor,
            &excess,
        );

        env.events().publish(
            (Symbol::new(&env, "excess_withdrawn"), investor.clone()),
            ExcessWithdrawnEvent {
                investor,
                accepted_amount,
                excess,
            },
        );

        Ok(excess)
    }

    /// Return an investor's capital before the refund window closes
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Sale was canceled, use the canceled withdrawal
    /// - `RefundPeriodIsOver`: Refund window closed
    /// - `CapitalRaisedAlreadyPublished`: Raise audited, capital is committed
    /// - `AlreadyRefunded`: Position already refunded
    /// - `NoCapitalInvested`: Nothing to refund
    pub fn refund(env: Env, investor: Address) -> Result<i128, Error> {
        investor.require_auth();

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if is_refund_period_over(&config, &status, env.ledger().timestamp()) {
            return Err(Error::RefundPeriodIsOver);
        }
        if status.capital_raised_published {
            return Err(Error::CapitalRaisedAlreadyPublished);
        }

        let mut position = get_position(&env, &investor);
        if position.refunded {
            return Err(Error::AlreadyRefunded);
        }
        if position.invested == 0 {
            return Err(Error::NoCapitalInvested);
        }

        let amount = position
            .invested
            .checked_sub(position.excess_withdrawn)
            .ok_or(Error::ArithmeticOverflow)?;

        // Excess already paid out leaves custody through the refund as well
        status.total_capital_invested = status
            .total_capital_invested
            .checked_sub(position.invested)
            .ok_or(Error::ArithmeticOverflow)?;
        status.total_capital_withdrawn = status
            .total_capital_withdrawn
            .checked_sub(position.excess_withdrawn)
            .ok_or(Error::ArithmeticOverflow)?;

        position.invested = 0;
        position.excess_withdrawn = 0;
        position.refunded = true;
        position.sealed_bid = StoredBid::Empty;
        set_position(&env, &investor, &position);
        set_status(&env, &status);

        if amount > 0 {
            token::Client::new(&env, &config.bid_token).transfer(
                &env.current_contract_address(),
                &investor,
                &amount,
            );
        }

        env.events().publish(
            (Symbol::new(&env, "refund_issued"), investor.clone()),
            RefundIssuedEvent { investor, amount },
        );

        Ok(amount)
    }

    /// Pay the audited capital raise to the project, fee to the fee receiver
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Sale was canceled
    /// - `CapitalNotRaised`: Capital raise not published
    /// - `RefundPeriodIsNotOver`: Refund window still open
    /// - `AlreadyWithdrawn`: Already withdrawn
    /// - `InsufficientCapital`: Custody holds less than the audited raise
    pub fn withdraw_raised_capital(env: Env) -> Result<i128, Error> {
        let config = get_config(&env)?;
        config.project.require_auth();

        let mut status = get_status(&env)?;

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if !status.capital_raised_published {
            return Err(Error::CapitalNotRaised);
        }
        if !is_refund_period_over(&config, &status, env.ledger().timestamp()) {
            return Err(Error::RefundPeriodIsNotOver);
        }
        if status.capital_withdrawn {
            return Err(Error::AlreadyWithdrawn);
        }

        let custody = status
            .total_capital_invested
            .checked_sub(status.total_capital_withdrawn)
            .ok_or(Error::ArithmeticOverflow)?;
        if status.total_capital_raised > custody {
            return Err(Error::InsufficientCapital);
        }

        let raised = status.total_capital_raised;
        let fee = calculate_fee(raised, config.fee_bps).ok_or(Error::ArithmeticOverflow)?;
        let net = raised.checked_sub(fee).ok_or(Error::ArithmeticOverflow)?;
        let roles = get_roles(&env)?;

        status.capital_withdrawn = true;
        status.total_capital_withdrawn = status
            .total_capital_withdrawn
            .checked_add(raised)
            .ok_or(Error::ArithmeticOverflow)?;
        set_status(&env, &status);

        let client = token::Client::new(&env, &config.bid_token);
        let sale = env.current_contract_address();
        if net > 0 {
            client.transfer(&sale, &config.project, &net);
        }
        if fee > 0 {
            client.transfer(&sale, &roles.fee_receiver, &fee);
        }

        log!(&env, "raised capital withdrawn", net, fee);

        env.events().publish(
            (Symbol::new(&env, "capital_withdrawn"), config.project.clone()),
            CapitalWithdrawnEvent {
                project: config.project,
                amount: net,
                fee,
            },
        );

        Ok(net)
    }

    // ============================================
    // FLOW 4: CANCELLATION
    // ============================================

    /// Cancel the sale and return the supplied ask tokens to the project
    ///
    /// # Errors
    /// - `SaleIsCanceled`: Already canceled
    /// - `SaleCancelLocked`: Auction reveal in progress
    /// - `CapitalAlreadyWithdrawn`: Sale is final
    /// - `AllocationsAlreadyClaimed`: Investors hold claimed tokens
    pub fn cancel_sale(env: Env) -> Result<(), Error> {
        let config = get_config(&env)?;
        config.project.require_auth();

        let mut status = get_status(&env)?;

        if status.is_canceled {
            return Err(Error::SaleIsCanceled);
        }
        if status.cancel_locked {
            return Err(Error::SaleCancelLocked);
        }
        if status.capital_withdrawn {
            return Err(Error::CapitalAlreadyWithdrawn);
        }
        if status.total_tokens_claimed > 0 {
            return Err(Error::AllocationsAlreadyClaimed);
        }

        let mut tokens_returned = 0;
        if status.tokens_supplied {
            let ask_token = status.ask_token.clone().ok_or(Error::ResultsNotPublished)?;
            tokens_returned = status
                .total_tokens_allocated
                .checked_sub(status.total_tokens_claimed)
                .ok_or(Error::ArithmeticOverflow)?;
            if tokens_returned > 0 {
                token::Client::new(&env, &ask_token).transfer(
                    &env.current_contract_address(),
                    &config.project,
                    &tokens_returned,
                );
            }
        }

        let now = env.ledger().timestamp();
        status.is_canceled = true;
        status.total_capital_withdrawn = 0;
        set_status(&env, &status);

        log!(&env, "sale canceled", now);

        env.events().publish(
            (Symbol::new(&env, "sale_canceled"), config.project),
            SaleCanceledEvent {
                canceled_at: now,
                tokens_returned,
            },
        );

        Ok(())
    }

    /// Return an investor's capital after cancellation
    ///
    /// # Errors
    /// - `SaleIsNotCanceled`: Sale was not canceled
    /// - `AlreadyClaimed`: Position already received its allocation
    /// - `NoCapitalInvested`: Nothing left to return
    pub fn withdraw_capital_if_canceled(env: Env, investor: Address) -> Result<i128, Error> {
        investor.require_auth();

        let config = get_config(&env)?;
        let mut status = get_status(&env)?;

        if !status.is_canceled {
            return Err(Error::SaleIsNotCanceled);
        }

        let mut position = get_position(&env, &investor);
        if position.claimed {
            return Err(Error::AlreadyClaimed);
        }
        let amount = position
            .invested
            .checked_sub(position.excess_withdrawn)
            .ok_or(Error::ArithmeticOverflow)?;
        if amount <= 0 {
            return Err(Error::NoCapitalInvested);
        }

        status.total_capital_invested = status
            .total_capital_invested
            .checked_sub(position.invested)
            .ok_or(Error::ArithmeticOverflow)?;
        position.invested = 0;
        position.excess_withdrawn = 0;
        position.canceled_withdrawn = true;
        set_position(&env, &investor, &position);
        set_status(&env, &status);

        token::Client::new(&env, &config.bid_token).transfer(
            &env.current_contract_address(),
            &investor,
            &amount,
        );

        env.events().publish(
            (Symbol::new(&env, "canceled_withdrawal"), investor.clone()),
            CanceledWithdrawalEvent { investor, amount },
        );

        Ok(amount)
    }

    // ============================================
    // SEALED BIDS
    // ============================================

    /// Replace the auction public key before any bid is sealed to it
    ///
    /// The previous key is invalidated permanently.
    ///
    /// # Errors
    /// - `InvalidSaleVariant`: Not an auction
    /// - `PrivateKeyAlreadyPublished`: Reveal already happened
    /// - `BidsAlreadySealed`: Bids exist under the current key
    /// - `InvalidBidPublicKey`: New key rejected
    pub fn rotate_bid_public_key(env: Env, public_key: BytesN<96>) -> Result<(), Error> {
        Self::require_admin(&env)?;

        let config = get_config(&env)?;
        let status = get_status(&env)?;

        if !config.variant.is_auction() {
            return Err(Error::InvalidSaleVariant);
        }
        if env.storage().instance().has(&DataKey::BidPrivateKey) {
            return Err(Error::PrivateKeyAlreadyPublished);
        }
        if status.sealed_bid_count > 0 {
            return Err(Error::BidsAlreadySealed);
        }

        let previous: BytesN<96> = env
            .storage()
            .instance()
            .get(&DataKey::BidPublicKey)
            .ok_or(Error::NotInitialized)?;
        sealed_bid::invalidate_public_key(&env, &previous);
        sealed_bid::validate_public_key(&env, &public_key)?;

        env.storage()
            .instance()
            .set(&DataKey::BidPublicKey, &public_key);

        env.events().publish(
            (Symbol::new(&env, "bid_key_rotated"),),
            BidKeyRotatedEvent {
                previous,
                public_key,
            },
        );

        Ok(())
    }

    /// Decrypt a sealed bid with the published private key
    ///
    /// # Errors
    /// - `PrivateKeyNotPublished`: Reveal has not happened
    /// - `InvalidBidPublicKey`: Ephemeral key rejected
    pub fn decrypt_sealed_bid(
        env: Env,
        encrypted_amount: u128,
        salt: BytesN<32>,
        ephemeral_key: BytesN<96>,
    ) -> Result<u128, Error> {
        let private_key: BytesN<32> = env
            .storage()
            .instance()
            .get(&DataKey::BidPrivateKey)
            .ok_or(Error::PrivateKeyNotPublished)?;
        sealed_bid::check_point(&env, &ephemeral_key)?;
        Ok(sealed_bid::decrypt(
            &env,
            &private_key,
            encrypted_amount,
            &salt,
            &ephemeral_key,
        ))
    }

    /// Decrypt the bid stored in an investor's position
    ///
    /// # Errors
    /// - `PrivateKeyNotPublished`: Reveal has not happened
    /// - `InvalidSealedBid`: Position holds no sealed bid
    pub fn decrypt_investor_bid(env: Env, investor: Address) -> Result<u128, Error> {
        let StoredBid::Sealed(bid) = get_position(&env, &investor).sealed_bid else {
            return Err(Error::InvalidSealedBid);
        };
        Self::decrypt_sealed_bid(env, bid.encrypted_amount, bid.salt, bid.ephemeral_key)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_config(env: Env) -> Result<SaleConfig, Error> {
        get_config(&env)
    }

    pub fn get_status(env: Env) -> Result<SaleStatus, Error> {
        get_status(&env)
    }

    pub fn get_roles(env: Env) -> Result<Roles, Error> {
        get_roles(&env)
    }

    pub fn get_position(env: Env, investor: Address) -> Position {
        get_position(&env, &investor)
    }

    pub fn is_paused(env: Env) -> bool {
        is_paused(&env)
    }

    /// Current phase of the sale
    pub fn phase(env: Env) -> Result<SalePhase, Error> {
        let config = get_config(&env)?;
        let status = get_status(&env)?;
        Ok(current_phase(&config, &status, env.ledger().timestamp()))
    }

    /// Refund deadline, None while the sale is running
    pub fn refund_end_time(env: Env) -> Result<Option<u64>, Error> {
        let config = get_config(&env)?;
        let status = get_status(&env)?;
        Ok(refund_end(&config, &status, env.ledger().timestamp()))
    }

    /// Ask tokens `capital` buys at the fixed price
    ///
    /// # Errors
    /// - `InvalidSaleVariant`: Not a fixed-price sale
    pub fn token_allocation_for(env: Env, capital: i128) -> Result<i128, Error> {
        match get_config(&env)?.variant {
            SaleVariant::FixedPrice(terms) => {
                calculate_allocation(capital, terms.token_price, terms.bid_token_decimals)
                    .ok_or(Error::ArithmeticOverflow)
            }
            _ => Err(Error::InvalidSaleVariant),
        }
    }

    /// Active auction public key
    ///
    /// # Errors
    /// - `InvalidSaleVariant`: Not an auction
    pub fn bid_public_key(env: Env) -> Result<BytesN<96>, Error> {
        env.storage()
            .instance()
            .get(&DataKey::BidPublicKey)
            .ok_or(Error::InvalidSaleVariant)
    }

    pub fn bid_private_key(env: Env) -> Option<BytesN<32>> {
        env.storage().instance().get(&DataKey::BidPrivateKey)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        if is_paused(env) {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn require_admin(env: &Env) -> Result<Address, Error> {
        let roles = get_roles(env)?;
        roles.admin.require_auth();
        Ok(roles.admin)
    }

    fn fetch_roles(env: &Env, registry: &Address) -> Roles {
        let lookup = |key: Symbol| -> Address {
            env.invoke_contract(
                registry,
                &Symbol::new(env, "get_address"),
                vec![env, key.into_val(env)],
            )
        };
        Roles {
            admin: lookup(ADMIN_KEY),
            fee_receiver: lookup(FEE_RECEIVER_KEY),
            vesting_manager: lookup(VESTING_MANAGER_KEY),
        }
    }

    fn record_capital_raised(
        env: &Env,
        status: &mut SaleStatus,
        capital_raised: i128,
        accepted_root: BytesN<32>,
    ) -> Result<(), Error> {
        if capital_raised < 0 || capital_raised > status.total_capital_invested {
            return Err(Error::InvalidAmount);
        }

        status.capital_raised_published = true;
        status.total_capital_raised = capital_raised;
        status.accepted_capital_root = Some(accepted_root.clone());

        env.events().publish(
            (Symbol::new(env, "capital_raised_published"),),
            CapitalRaisedPublishedEvent {
                capital_raised,
                accepted_root,
            },
        );

        Ok(())
    }

    /// Create and fund a schedule for `amount` in the vesting manager
    fn issue_vesting(
        env: &Env,
        terms: &VestingTerms,
        beneficiary: &Address,
        ask_token: &Address,
        start: u64,
        amount: i128,
    ) -> Result<u64, Error> {
        let roles = get_roles(env)?;
        let sale = env.current_contract_address();

        let schedule_id: u64 = env.invoke_contract(
            &roles.vesting_manager,
            &Symbol::new(env, "create_schedule"),
            vec![
                env,
                sale.to_val(),
                beneficiary.to_val(),
                ask_token.to_val(),
                terms.strategy.into_val(env),
                start.into_val(env),
                terms.duration.into_val(env),
                terms.cliff_duration.into_val(env),
                terms.epoch_duration.into_val(env),
                terms.epoch_count.into_val(env),
            ],
        );

        token::Client::new(env, ask_token).transfer(&sale, &roles.vesting_manager, &amount);

        env.invoke_contract::<()>(
            &roles.vesting_manager,
            &Symbol::new(env, "fund_schedule"),
            vec![env, schedule_id.into_val(env), amount.into_val(env)],
        );

        Ok(schedule_id)
    }
}
