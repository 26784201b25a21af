#![cfg(test)]

use super::*;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Env,
};

struct TestContext<'a> {
    env: Env,
    manager: VestingManagerClient<'a>,
    manager_id: Address,
    token: token::Client<'a>,
    creator: Address,
    beneficiary: Address,
}

fn setup_test<'a>() -> TestContext<'a> {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000);

    let manager_id = env.register(VestingManager, ());
    let manager = VestingManagerClient::new(&env, &manager_id);

    let token_admin = Address::generate(&env);
    let token_id = env
        .register_stellar_asset_contract_v2(token_admin)
        .address();
    let creator = Address::generate(&env);
    let beneficiary = Address::generate(&env);
    token::StellarAssetClient::new(&env, &token_id).mint(&creator, &1_000_000);

    TestContext {
        token: token::Client::new(&env, &token_id),
        env,
        manager,
        manager_id,
        creator,
        beneficiary,
    }
}

fn create_and_fund(ctx: &TestContext, strategy: u32, cliff: u64, amount: i128) -> u64 {
    let (epoch_duration, epoch_count) = if strategy == 1 { (100, 4) } else { (0, 0) };
    let id = ctx.manager.create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &strategy,
        &1_000,
        &400,
        &cliff,
        &epoch_duration,
        &epoch_count,
    );
    ctx.token.transfer(&ctx.creator, &ctx.manager_id, &amount);
    ctx.manager.fund_schedule(&id, &amount);
    id
}

#[test]
fn test_create_schedule_assigns_sequential_ids() {
    let ctx = setup_test();

    let first = create_and_fund(&ctx, 0, 0, 1_000);
    let second = create_and_fund(&ctx, 1, 0, 1_000);
    assert_eq!(first, 1);
    assert_eq!(second, 2);

    let owned = ctx.manager.schedules_of(&ctx.beneficiary);
    assert_eq!(owned.len(), 2);
    assert_eq!(owned.get(1), Some(2));

    let schedule = ctx.manager.get_schedule(&second);
    assert_eq!(schedule.strategy, VestingStrategy::LinearEpoch);
    assert_eq!(schedule.total_amount, 1_000);
}

#[test]
fn test_create_schedule_rejects_bad_config() {
    let ctx = setup_test();

    // Unknown strategy selector
    let result = ctx.manager.try_create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &7u32,
        &1_000,
        &400,
        &0,
        &0,
        &0u32,
    );
    assert_eq!(result, Err(Ok(Error::InvalidVestingConfig)));

    // Cliff longer than duration
    let result = ctx.manager.try_create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &0u32,
        &1_000,
        &400,
        &500,
        &0,
        &0u32,
    );
    assert_eq!(result, Err(Ok(Error::InvalidVestingConfig)));

    // Epochs do not divide the duration
    let result = ctx.manager.try_create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &1u32,
        &1_000,
        &400,
        &0,
        &130,
        &3u32,
    );
    assert_eq!(result, Err(Ok(Error::InvalidVestingConfig)));
}

#[test]
fn test_fund_requires_deposit() {
    let ctx = setup_test();

    let id = ctx.manager.create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &0u32,
        &1_000,
        &400,
        &0,
        &0,
        &0u32,
    );

    let result = ctx.manager.try_fund_schedule(&id, &500);
    assert_eq!(result, Err(Ok(Error::InsufficientDeposit)));

    ctx.token.transfer(&ctx.creator, &ctx.manager_id, &500);
    ctx.manager.fund_schedule(&id, &500);

    let result = ctx.manager.try_fund_schedule(&id, &500);
    assert_eq!(result, Err(Ok(Error::ScheduleAlreadyFunded)));
}

#[test]
fn test_deposit_cannot_back_two_schedules() {
    let ctx = setup_test();

    let first = create_and_fund(&ctx, 0, 0, 1_000);
    let second = ctx.manager.create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &0u32,
        &1_000,
        &400,
        &0,
        &0,
        &0u32,
    );
    assert_ne!(first, second);

    // The 1,000 tokens already held are owed to the first schedule
    let result = ctx.manager.try_fund_schedule(&second, &1_000);
    assert_eq!(result, Err(Ok(Error::InsufficientDeposit)));
}

#[test]
fn test_release_before_cliff_fails() {
    let ctx = setup_test();
    let id = create_and_fund(&ctx, 0, 200, 1_000);

    ctx.env.ledger().set_timestamp(1_199);
    let result = ctx.manager.try_release(&id);
    assert_eq!(result, Err(Ok(Error::CliffNotEnded)));

    ctx.env.ledger().set_timestamp(1_200);
    assert_eq!(ctx.manager.release(&id), 500);
    assert_eq!(ctx.token.balance(&ctx.beneficiary), 500);
}

#[test]
fn test_linear_release_over_time() {
    let ctx = setup_test();
    let id = create_and_fund(&ctx, 0, 0, 1_000);

    ctx.env.ledger().set_timestamp(1_100);
    assert_eq!(ctx.manager.releasable(&id), 250);
    assert_eq!(ctx.manager.release(&id), 250);

    // Nothing new in the same second
    assert_eq!(ctx.manager.release(&id), 0);

    ctx.env.ledger().set_timestamp(2_000);
    assert_eq!(ctx.manager.release(&id), 750);

    assert_eq!(ctx.token.balance(&ctx.beneficiary), 1_000);
    assert_eq!(ctx.token.balance(&ctx.manager_id), 0);

    let schedule = ctx.manager.get_schedule(&id);
    assert_eq!(schedule.released_amount, schedule.total_amount);
}

#[test]
fn test_epoch_release_only_at_boundaries() {
    let ctx = setup_test();
    let id = create_and_fund(&ctx, 1, 0, 1_000);

    ctx.env.ledger().set_timestamp(1_099);
    assert_eq!(ctx.manager.release(&id), 0);

    ctx.env.ledger().set_timestamp(1_100);
    assert_eq!(ctx.manager.release(&id), 250);

    ctx.env.ledger().set_timestamp(1_199);
    assert_eq!(ctx.manager.release(&id), 0);

    ctx.env.ledger().set_timestamp(1_350);
    assert_eq!(ctx.manager.release(&id), 500);

    let schedule = ctx.manager.get_schedule(&id);
    assert_eq!(schedule.last_released_epoch, 3);
    assert_eq!(schedule.released_amount, 750);

    assert_eq!(ctx.manager.vested_amount(&id, &1_400), 1_000);
}

#[test]
fn test_release_unfunded_schedule() {
    let ctx = setup_test();
    let id = ctx.manager.create_schedule(
        &ctx.creator,
        &ctx.beneficiary,
        &ctx.token.address,
        &0u32,
        &1_000,
        &400,
        &0,
        &0,
        &0u32,
    );

    let result = ctx.manager.try_release(&id);
    assert_eq!(result, Err(Ok(Error::ScheduleNotFunded)));

    let result = ctx.manager.try_release(&99);
    assert_eq!(result, Err(Ok(Error::ScheduleNotFound)));
}
