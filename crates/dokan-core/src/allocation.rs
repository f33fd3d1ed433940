//! # Proportional Allocation
//!
//! Splits one transaction-level amount (discount or tendered cash) across
//! checkout lines in proportion to a weight per line.
//!
//! ## Algorithm
//! ```text
//! total = 1000, weights = [300, 300, 300]
//!
//!   share_i = floor(total × w_i / Σw)     (i128, no overflow)
//!           = [333, 333, 333]             Σ = 999
//!
//!   remainder = total − Σ share = 1
//!   → added to the LAST line whose weight is non-zero
//!           = [333, 333, 334]             Σ = 1000 ✓
//! ```
//!
//! Zero-weight lines always get zero. When every weight is zero the whole
//! result is zero and the caller decides what that means.

use crate::money::Money;

/// Distributes `total` over `weights`; the result sums to `total` exactly
/// whenever at least one weight is positive.
///
/// Negative weights are treated as zero.
///
/// ## Example
/// ```rust
/// use dokan_core::allocation::allocate;
/// use dokan_core::Money;
///
/// let shares = allocate(
///     Money::from_minor(30),
///     &[Money::from_minor(100), Money::from_minor(200)],
/// );
/// assert_eq!(shares, vec![Money::from_minor(10), Money::from_minor(20)]);
/// ```
pub fn allocate(total: Money, weights: &[Money]) -> Vec<Money> {
    let weight_sum: i128 = weights.iter().map(|w| w.minor().max(0) as i128).sum();

    if weight_sum == 0 {
        return vec![Money::zero(); weights.len()];
    }

    let total_minor = total.minor() as i128;
    let mut shares: Vec<Money> = weights
        .iter()
        .map(|w| {
            let w = w.minor().max(0) as i128;
            Money::from_minor((total_minor * w).div_euclid(weight_sum) as i64)
        })
        .collect();

    let allocated: Money = shares.iter().sum();
    let remainder = total - allocated;

    if !remainder.is_zero() {
        if let Some(last) = weights.iter().rposition(|w| w.is_positive()) {
            shares[last] += remainder;
        }
    }

    shares
}
