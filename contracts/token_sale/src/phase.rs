use crate::storage::{SaleConfig, SalePhase, SaleStatus};
use crate::variant::Window;

/// Time the sale ended, explicitly through `end_sale` or at the natural
/// end of a timed variant
pub fn ended_at(config: &SaleConfig, status: &SaleStatus, now: u64) -> Option<u64> {
    if status.ended_at.is_some() {
        return status.ended_at;
    }
    match config.variant.natural_end(config.start_time) {
        Some(end) if now >= end => Some(end),
        _ => None,
    }
}

/// Refund deadline, None while the sale is still running
pub fn refund_end(config: &SaleConfig, status: &SaleStatus, now: u64) -> Option<u64> {
    if status.refund_end_time.is_some() {
        return status.refund_end_time;
    }
    ended_at(config, status, now).map(|end| end.saturating_add(config.refund_period))
}

pub fn is_refund_period_over(config: &SaleConfig, status: &SaleStatus, now: u64) -> bool {
    match refund_end(config, status, now) {
        Some(end) => now >= end,
        None => false,
    }
}

/// Conceptual phase of the sale at `now`
pub fn current_phase(config: &SaleConfig, status: &SaleStatus, now: u64) -> SalePhase {
    if status.is_canceled {
        return SalePhase::Canceled;
    }
    if status.capital_withdrawn {
        return SalePhase::Finalized;
    }
    if status.results_published {
        return SalePhase::ResultsPublished;
    }
    if status.cancel_locked {
        return SalePhase::CancelLocked;
    }
    if ended_at(config, status, now).is_some() {
        return SalePhase::Ended;
    }

    match config.variant.window(config.start_time, now) {
        Window::NotStarted => SalePhase::Pending,
        Window::Prefund => SalePhase::Prefund,
        Window::PrefundAllocation => SalePhase::PrefundAllocation,
        Window::Open => SalePhase::Active,
        Window::Closed => SalePhase::Ended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FixedPriceTerms, SaleVariant, VestingPolicy};
    use soroban_sdk::{testutils::Address as _, Address, BytesN, Env};

    fn config(env: &Env, variant: SaleVariant) -> SaleConfig {
        SaleConfig {
            variant,
            project: Address::generate(env),
            registry: Address::generate(env),
            bid_token: Address::generate(env),
            start_time: 1_000,
            refund_period: 600,
            fee_bps: 0,
            token_fee_bps: 0,
            signer: BytesN::from_array(env, &[0u8; 65]),
            vesting: VestingPolicy::Immediate,
        }
    }

    fn fresh_status() -> SaleStatus {
        SaleStatus {
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
        }
    }

    #[test]
    fn test_manual_end_sets_refund_deadline() {
        let env = Env::default();
        let config = config(&env, SaleVariant::PreLiquid);
        let mut status = fresh_status();

        assert_eq!(ended_at(&config, &status, 5_000), None);
        assert_eq!(refund_end(&config, &status, 5_000), None);
        assert!(!is_refund_period_over(&config, &status, 5_000));

        status.ended_at = Some(1_100);
        status.refund_end_time = Some(1_700);
        assert!(!is_refund_period_over(&config, &status, 1_699));
        assert!(is_refund_period_over(&config, &status, 1_700));
    }

    #[test]
    fn test_timed_variant_ends_naturally() {
        let env = Env::default();
        let config = config(
            &env,
            SaleVariant::FixedPrice(FixedPriceTerms {
                prefund_period: 0,
                prefund_allocation_period: 0,
                sale_period: 100,
                token_price: 1,
                bid_token_decimals: 0,
            }),
        );
        let status = fresh_status();

        assert_eq!(ended_at(&config, &status, 1_099), None);
        assert_eq!(ended_at(&config, &status, 1_500), Some(1_100));
        assert_eq!(refund_end(&config, &status, 1_500), Some(1_700));
        assert_eq!(current_phase(&config, &status, 1_500), SalePhase::Ended);
    }

    #[test]
    fn test_phase_flags_take_precedence() {
        let env = Env::default();
        let config = config(&env, SaleVariant::PreLiquid);
        let mut status = fresh_status();

        assert_eq!(current_phase(&config, &status, 999), SalePhase::Pending);
        assert_eq!(current_phase(&config, &status, 1_000), SalePhase::Active);

        status.ended_at = Some(1_010);
        assert_eq!(current_phase(&config, &status, 1_020), SalePhase::Ended);

        status.results_published = true;
        assert_eq!(
            current_phase(&config, &status, 1_020),
            SalePhase::ResultsPublished
        );

        status.capital_withdrawn = true;
        assert_eq!(current_phase(&config, &status, 1_020), SalePhase::Finalized);

        status.is_canceled = true;
        assert_eq!(current_phase(&config, &status, 1_020), SalePhase::Canceled);
    }
}
