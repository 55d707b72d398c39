//! Token amount formatting
//!
//! Amounts are integers with 18 implied decimals.

/// Implied decimals of every token amount
pub const DECIMALS: usize = 18;

/// Decimals shown when the amount has to be truncated
const SHOWN_DECIMALS: usize = 8;

/// Render an 18-decimal amount for humans
///
/// Exact values are printed with all significant decimals. Values with more
/// than eight significant decimals are truncated to eight and prefixed with
/// `~`.
#[must_use]
pub fn humanize_amount(n: u128) -> String {
    let mut digits = n.to_string();
    let zeros = digits.bytes().rev().take_while(|&b| b == b'0').count();

    if digits.len() <= DECIMALS {
        digits = format!("{digits:0>width$}", width = DECIMALS + 1);
    }

    if zeros >= DECIMALS {
        return digits[..digits.len() - DECIMALS].to_string();
    }

    let cutoff_from = DECIMALS - SHOWN_DECIMALS;
    let (circa, cutoff) = if zeros >= cutoff_from {
        ("", zeros)
    } else {
        ("~", cutoff_from)
    };
    let point = digits.len() - DECIMALS;
    format!(
        "{circa}{}.{}",
        &digits[..point],
        &digits[point..digits.len() - cutoff]
    )
}
