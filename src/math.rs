//! Integer share math for the airdrop pool.
use soroban_sdk::{Env, I256};

/// Proportional share of `pool` for `part` out of `total`, rounded toward zero:
/// `floor(pool * part / total)`.
///
/// The product is formed in 256 bits, so any `i128` inputs are exact. Returns 0 when
/// `part`, `total` or `pool` is not positive, so an empty sale never divides by zero.
/// Callers pass `part <= total`, which keeps the quotient within `[0, pool]`.
///
/// Because every share is truncated, the shares of any partition of `total` sum to
/// at most `pool`; the remainder is below the number of parts.
pub fn proportional_share(env: &Env, pool: i128, part: i128, total: i128) -> i128 {
    if part <= 0 || total <= 0 || pool <= 0 {
        return 0;
    }
    let share = I256::from_i128(env, pool)
        .mul(&I256::from_i128(env, part))
        .div(&I256::from_i128(env, total));
    low_i128(&share)
}

/// Low 128 bits of a non-negative `I256` known to fit in `i128`.
fn low_i128(value: &I256) -> i128 {
    let mut buf = [0u8; 16];
    value.to_be_bytes().slice(16..32).copy_into_slice(&mut buf);
    i128::from_be_bytes(buf)
}
