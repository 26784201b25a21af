#![no_std]

mod error;
mod events;
mod schedule;
mod storage;

pub use error::Error;
use events::*;
use schedule::{elapsed_epochs, releasable_amount, validate_params};
pub use storage::{VestingSchedule, VestingStrategy};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, log, token, Address, Env, Symbol, Vec};

#[contract]
pub struct VestingManager;

#[contractimpl]
impl VestingManager {
    // ============================================
    // SCHEDULE CREATION
    // ============================================

    /// Create a vesting schedule for `beneficiary`
    ///
    /// The schedule starts unfunded; the creator moves tokens to this
    /// contract and then calls `fund_schedule`.
    ///
    /// # Errors
    /// - `InvalidVestingConfig`: Unknown strategy, cliff > duration, or
    ///   epochs that do not evenly divide the duration
    pub fn create_schedule(
        env: Env,
        creator: Address,
        beneficiary: Address,
        token: Address,
        strategy: u32,
        start: u64,
        duration: u64,
        cliff_duration: u64,
        epoch_duration: u64,
        epoch_count: u32,
    ) -> Result<u64, Error> {
        creator.require_auth();

        let strategy = VestingStrategy::from_u32(strategy).ok_or(Error::InvalidVestingConfig)?;
        if !validate_params(strategy, duration, cliff_duration, epoch_duration, epoch_count) {
            return Err(Error::InvalidVestingConfig);
        }
        start
            .checked_add(duration)
            .ok_or(Error::InvalidVestingConfig)?;

        let schedule_id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::ScheduleCounter)
            .unwrap_or(0)
            + 1;

        let schedule = VestingSchedule {
            id: schedule_id,
            creator: creator.clone(),
            beneficiary: beneficiary.clone(),
            token: token.clone(),
            strategy,
            start,
            duration,
            cliff_duration,
            epoch_duration,
            epoch_count,
            total_amount: 0,
            released_amount: 0,
            last_released_epoch: 0,
        };

        env.storage()
            .persistent()
            .set(&DataKey::Schedule(schedule_id), &schedule);
        env.storage()
            .instance()
            .set(&DataKey::ScheduleCounter, &schedule_id);

        let owned_key = DataKey::BeneficiarySchedules(beneficiary.clone());
        let mut owned: Vec<u64> = env
            .storage()
            .persistent()
            .get(&owned_key)
            .unwrap_or(Vec::new(&env));
        owned.push_back(schedule_id);
        env.storage().persistent().set(&owned_key, &owned);

        log!(&env, "vesting schedule created", schedule_id, beneficiary);

        env.events().publish(
            (Symbol::new(&env, "schedule_created"), schedule_id),
            ScheduleCreatedEvent {
                schedule_id,
                creator,
                beneficiary,
                token,
                strategy,
                start,
                duration,
                cliff_duration,
            },
        );

        Ok(schedule_id)
    }

    /// Place `amount` tokens under a schedule
    ///
    /// The tokens must already sit in this contract's balance and must not
    /// be owed to any other schedule.
    ///
    /// # Errors
    /// - `ScheduleNotFound`: Unknown schedule id
    /// - `ScheduleAlreadyFunded`: Schedule already holds tokens
    /// - `InvalidAmount`: amount must be positive
    /// - `InsufficientDeposit`: Unaccounted balance is below amount
    pub fn fund_schedule(env: Env, schedule_id: u64, amount: i128) -> Result<(), Error> {
        let mut schedule = Self::load(&env, schedule_id)?;
        schedule.creator.require_auth();

        if schedule.total_amount > 0 {
            return Err(Error::ScheduleAlreadyFunded);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let accounted_key = DataKey::Accounted(schedule.token.clone());
        let accounted: i128 = env.storage().instance().get(&accounted_key).unwrap_or(0);

        let balance = token::Client::new(&env, &schedule.token)
            .balance(&env.current_contract_address());
        let unaccounted = balance
            .checked_sub(accounted)
            .ok_or(Error::ArithmeticOverflow)?;
        if unaccounted < amount {
            return Err(Error::InsufficientDeposit);
        }

        let new_accounted = accounted
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&accounted_key, &new_accounted);

        schedule.total_amount = amount;
        env.storage()
            .persistent()
            .set(&DataKey::Schedule(schedule_id), &schedule);

        env.events().publish(
            (Symbol::new(&env, "schedule_funded"), schedule_id),
            ScheduleFundedEvent {
                schedule_id,
                amount,
            },
        );

        Ok(())
    }

    // ============================================
    // RELEASE
    // ============================================

    /// Pay everything vested so far to the beneficiary
    ///
    /// Anyone may trigger a release; tokens always go to the beneficiary.
    /// Returns the amount paid (zero when nothing new has vested).
    ///
    /// # Errors
    /// - `ScheduleNotFound`: Unknown schedule id
    /// - `ScheduleNotFunded`: Schedule holds no tokens yet
    /// - `CliffNotEnded`: Current time is before start + cliff
    pub fn release(env: Env, schedule_id: u64) -> Result<i128, Error> {
        let mut schedule = Self::load(&env, schedule_id)?;

        if schedule.total_amount == 0 {
            return Err(Error::ScheduleNotFunded);
        }

        let now = env.ledger().timestamp();
        let cliff_end = schedule
            .start
            .checked_add(schedule.cliff_duration)
            .ok_or(Error::ArithmeticOverflow)?;
        if now < cliff_end {
            return Err(Error::CliffNotEnded);
        }

        let amount = releasable_amount(&schedule, now).ok_or(Error::ArithmeticOverflow)?;
        if amount == 0 {
            return Ok(0);
        }

        if schedule.strategy == VestingStrategy::LinearEpoch {
            schedule.last_released_epoch = elapsed_epochs(&schedule, now);
        }
        schedule.released_amount = schedule
            .released_amount
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;

        env.storage()
            .persistent()
            .set(&DataKey::Schedule(schedule_id), &schedule);

        let accounted_key = DataKey::Accounted(schedule.token.clone());
        let accounted: i128 = env.storage().instance().get(&accounted_key).unwrap_or(0);
        env.storage()
            .instance()
            .set(&accounted_key, &accounted.saturating_sub(amount));

        token::Client::new(&env, &schedule.token).transfer(
            &env.current_contract_address(),
            &schedule.beneficiary,
            &amount,
        );

        env.events().publish(
            (
                Symbol::new(&env, "tokens_released"),
                schedule_id,
                schedule.beneficiary.clone(),
            ),
            TokensReleasedEvent {
                schedule_id,
                beneficiary: schedule.beneficiary,
                amount,
                released_total: schedule.released_amount,
            },
        );

        Ok(amount)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_schedule(env: Env, schedule_id: u64) -> Result<VestingSchedule, Error> {
        Self::load(&env, schedule_id)
    }

    /// Amount vested at `timestamp`, including what was already released
    pub fn vested_amount(env: Env, schedule_id: u64, timestamp: u64) -> Result<i128, Error> {
        let schedule = Self::load(&env, schedule_id)?;
        crate::schedule::vested_amount(&schedule, timestamp).ok_or(Error::ArithmeticOverflow)
    }

    /// Amount a release would pay right now
    pub fn releasable(env: Env, schedule_id: u64) -> Result<i128, Error> {
        let schedule = Self::load(&env, schedule_id)?;
        releasable_amount(&schedule, env.ledger().timestamp()).ok_or(Error::ArithmeticOverflow)
    }

    pub fn schedules_of(env: Env, beneficiary: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::BeneficiarySchedules(beneficiary))
            .unwrap_or(Vec::new(&env))
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn load(env: &Env, schedule_id: u64) -> Result<VestingSchedule, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Schedule(schedule_id))
            .ok_or(Error::ScheduleNotFound)
    }
}

#[cfg(test)]
mod test;
