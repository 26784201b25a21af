use crate::storage::{SaleVariant, VestingTerms, BASIS_POINTS, MAX_BID_TOKEN_DECIMALS};

/// Where a timestamp falls in a variant's investment window
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Window {
    NotStarted,
    /// Fixed price only: early window for prefund investors
    Prefund,
    /// Fixed price only: closed gap before the public window
    PrefundAllocation,
    Open,
    Closed,
}

impl SaleVariant {
    /// Check variant terms are usable
    pub fn validate(&self, start_time: u64) -> bool {
        match self {
            SaleVariant::FixedPrice(terms) => {
                terms.token_price > 0
                    && terms.sale_period > 0
                    && terms.bid_token_decimals <= MAX_BID_TOKEN_DECIMALS
                    && start_time
                        .checked_add(terms.prefund_period)
                        .and_then(|t| t.checked_add(terms.prefund_allocation_period))
                        .and_then(|t| t.checked_add(terms.sale_period))
                        .is_some()
            }
            SaleVariant::PreLiquid => true,
            SaleVariant::SealedBidAuction(terms) => {
                terms.sale_period > 0 && start_time.checked_add(terms.sale_period).is_some()
            }
        }
    }

    /// Time investing closes on its own, None for manually ended variants
    pub fn natural_end(&self, start_time: u64) -> Option<u64> {
        match self {
            SaleVariant::FixedPrice(terms) => Some(
                start_time
                    .saturating_add(terms.prefund_period)
                    .saturating_add(terms.prefund_allocation_period)
                    .saturating_add(terms.sale_period),
            ),
            SaleVariant::PreLiquid => None,
            SaleVariant::SealedBidAuction(terms) => {
                Some(start_time.saturating_add(terms.sale_period))
            }
        }
    }

    pub fn window(&self, start_time: u64, now: u64) -> Window {
        if now < start_time {
            return Window::NotStarted;
        }

        if let SaleVariant::FixedPrice(terms) = self {
            let prefund_end = start_time.saturating_add(terms.prefund_period);
            if now < prefund_end {
                return Window::Prefund;
            }
            if now < prefund_end.saturating_add(terms.prefund_allocation_period) {
                return Window::PrefundAllocation;
            }
        }

        match self.natural_end(start_time) {
            Some(end) if now >= end => Window::Closed,
            _ => Window::Open,
        }
    }

    pub fn is_auction(&self) -> bool {
        matches!(self, SaleVariant::SealedBidAuction(_))
    }
}

impl VestingTerms {
    /// Same rules the vesting manager applies on schedule creation
    pub fn is_valid(&self) -> bool {
        if self.duration == 0 || self.cliff_duration > self.duration {
            return false;
        }
        if self.tge_rate_bps as i128 > BASIS_POINTS {
            return false;
        }
        match self.strategy {
            0 => self.epoch_duration == 0 && self.epoch_count == 0,
            1 => {
                self.epoch_duration > 0
                    && self.epoch_count > 0
                    && self.epoch_duration.checked_mul(self.epoch_count as u64)
                        == Some(self.duration)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AuctionTerms, FixedPriceTerms};
    use soroban_sdk::{BytesN, Env};

    fn fixed_price() -> SaleVariant {
        SaleVariant::FixedPrice(FixedPriceTerms {
            prefund_period: 100,
            prefund_allocation_period: 50,
            sale_period: 200,
            token_price: 2_000,
            bid_token_decimals: 7,
        })
    }

    #[test]
    fn test_fixed_price_windows() {
        let variant = fixed_price();

        assert_eq!(variant.window(1_000, 999), Window::NotStarted);
        assert_eq!(variant.window(1_000, 1_000), Window::Prefund);
        assert_eq!(variant.window(1_000, 1_099), Window::Prefund);
        assert_eq!(variant.window(1_000, 1_100), Window::PrefundAllocation);
        assert_eq!(variant.window(1_000, 1_149), Window::PrefundAllocation);
        assert_eq!(variant.window(1_000, 1_150), Window::Open);
        assert_eq!(variant.window(1_000, 1_349), Window::Open);
        assert_eq!(variant.window(1_000, 1_350), Window::Closed);
        assert_eq!(variant.natural_end(1_000), Some(1_350));
    }

    #[test]
    fn test_pre_liquid_never_closes() {
        let variant = SaleVariant::PreLiquid;
        assert_eq!(variant.window(10, 5), Window::NotStarted);
        assert_eq!(variant.window(10, u64::MAX), Window::Open);
        assert_eq!(variant.natural_end(10), None);
    }

    #[test]
    fn test_auction_window() {
        let env = Env::default();
        let variant = SaleVariant::SealedBidAuction(AuctionTerms {
            sale_period: 500,
            public_key: BytesN::from_array(&env, &[0u8; 96]),
        });
        assert_eq!(variant.window(100, 599), Window::Open);
        assert_eq!(variant.window(100, 600), Window::Closed);
        assert!(variant.is_auction());
    }

    #[test]
    fn test_validate_rejects_bad_terms() {
        assert!(fixed_price().validate(1_000));

        let zero_price = SaleVariant::FixedPrice(FixedPriceTerms {
            prefund_period: 0,
            prefund_allocation_period: 0,
            sale_period: 100,
            token_price: 0,
            bid_token_decimals: 7,
        });
        assert!(!zero_price.validate(1_000));

        let too_many_decimals = SaleVariant::FixedPrice(FixedPriceTerms {
            prefund_period: 0,
            prefund_allocation_period: 0,
            sale_period: 100,
            token_price: 1,
            bid_token_decimals: 19,
        });
        assert!(!too_many_decimals.validate(1_000));

        // Window end would overflow
        assert!(!fixed_price().validate(u64::MAX - 10));
    }

    #[test]
    fn test_vesting_terms_validation() {
        let mut terms = VestingTerms {
            strategy: 1,
            duration: 400,
            cliff_duration: 0,
            epoch_duration: 100,
            epoch_count: 4,
            tge_rate_bps: 2_500,
        };
        assert!(terms.is_valid());

        terms.epoch_count = 3;
        assert!(!terms.is_valid());

        terms.strategy = 0;
        assert!(!terms.is_valid());

        terms.epoch_duration = 0;
        terms.epoch_count = 0;
        assert!(terms.is_valid());

        terms.cliff_duration = 401;
        assert!(!terms.is_valid());

        terms.cliff_duration = 0;
        terms.tge_rate_bps = 10_001;
        assert!(!terms.is_valid());

        terms.tge_rate_bps = 0;
        terms.strategy = 2;
        assert!(!terms.is_valid());
    }
}
