use crate::storage::BASIS_POINTS;

/// Protocol fee on `amount`
///
/// Formula: fee = amount × fee_bps / 10,000 (truncating)
pub fn calculate_fee(amount: i128, fee_bps: u32) -> Option<i128> {
    amount
        .checked_mul(fee_bps as i128)?
        .checked_div(BASIS_POINTS)
}

/// Ask tokens bought by `capital` at a fixed price
///
/// Formula: allocation = capital × token_price / 10^bid_token_decimals
///
/// Example:
/// - capital: 50 units of a 7-decimal token (500,000,000)
/// - token_price: 2,000 ask-token units per whole bid token
/// - allocation: 500,000,000 × 2,000 / 10^7 = 100,000
pub fn calculate_allocation(capital: i128, token_price: i128, bid_token_decimals: u32) -> Option<i128> {
    let scale = 10i128.checked_pow(bid_token_decimals)?;
    capital.checked_mul(token_price)?.checked_div(scale)
}

/// Split a claimed amount into (released at claim, vested)
pub fn split_tge(amount: i128, tge_rate_bps: u32) -> Option<(i128, i128)> {
    let immediate = calculate_fee(amount, tge_rate_bps)?;
    let vested = amount.checked_sub(immediate)?;
    Some((immediate, vested))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_truncates() {
        assert_eq!(calculate_fee(5_000, 250), Some(125));
        assert_eq!(calculate_fee(999, 100), Some(9));
        assert_eq!(calculate_fee(5_000, 0), Some(0));
    }

    #[test]
    fn test_fee_overflow() {
        assert_eq!(calculate_fee(i128::MAX, 2), None);
    }

    #[test]
    fn test_allocation() {
        assert_eq!(calculate_allocation(500_000_000, 2_000, 7), Some(100_000));
        // 0.00000019 bid tokens buys 0.00038 -> truncated
        assert_eq!(calculate_allocation(19, 2_000, 7), Some(0));
        assert_eq!(calculate_allocation(1_000, 3, 0), Some(3_000));
    }

    #[test]
    fn test_allocation_overflow() {
        assert_eq!(calculate_allocation(i128::MAX, 2, 0), None);
        assert_eq!(calculate_allocation(1, 1, 40), None);
    }

    #[test]
    fn test_split_tge() {
        assert_eq!(split_tge(1_000, 2_500), Some((250, 750)));
        assert_eq!(split_tge(1_000, 0), Some((0, 1_000)));
        assert_eq!(split_tge(1_000, 10_000), Some((1_000, 0)));
    }
}
