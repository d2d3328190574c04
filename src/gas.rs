//! 转发价值预算：每条腿的 Gas 与每次操作的固定开销。

use crate::constants::{
    BASE_OVERHEAD_FIXED, BASE_OVERHEAD_PER_LEG, Coins, MINT_SEND_GAS, PER_LEG_GAS,
    REDEEM_OVERHEAD,
};

pub const fn per_leg_gas() -> Coins {
    PER_LEG_GAS
}

/// `n * K1 + K2`。
pub fn base_overhead(legs: usize) -> Option<Coins> {
    (legs as Coins)
        .checked_mul(BASE_OVERHEAD_PER_LEG)?
        .checked_add(BASE_OVERHEAD_FIXED)
}

/// 存入金额之外需要附带的全部 Gas。
pub fn deposit_gas_budget(legs: usize) -> Option<Coins> {
    PER_LEG_GAS
        .checked_mul(legs as Coins)?
        .checked_add(base_overhead(legs)?)
}

pub fn total_required_value(deposit: Coins, legs: usize) -> Option<Coins> {
    deposit.checked_add(deposit_gas_budget(legs)?)
}

/// 腿到达时按最坏情况（完成铸造 + 全部退款）预留。
pub fn arrival_gas_floor(legs: usize) -> Option<Coins> {
    MINT_SEND_GAS.checked_mul(legs as Coins)
}

pub fn redeem_gas_floor(legs: usize) -> Option<Coins> {
    PER_LEG_GAS
        .checked_mul(legs as Coins)?
        .checked_add(REDEEM_OVERHEAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_is_linear_in_legs() {
        assert_eq!(base_overhead(0), Some(1_400_000));
        assert_eq!(base_overhead(3), Some(3 * 3_200_000 + 1_400_000));
    }

    #[test]
    fn three_leg_deposit_budget() {
        let budget = deposit_gas_budget(3).unwrap();
        assert_eq!(budget, 450_000_000 + 11_000_000);
        assert_eq!(
            total_required_value(3_500_000_000, 3),
            Some(3_500_000_000 + budget)
        );
    }

    #[test]
    fn redeem_floor_exceeds_per_leg_gas() {
        assert!(redeem_gas_floor(2).unwrap() > per_leg_gas() * 2);
        assert_eq!(arrival_gas_floor(4), Some(200_000_000));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(total_required_value(Coins::MAX, 1), None);
    }
}
