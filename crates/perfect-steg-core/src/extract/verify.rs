//! Plausibility checks every candidate has to pass.

use super::ExtractOptions;

/// Rejects empty data and data that is mostly zero bytes, padding or wiped memory
/// rather than a file.
pub fn accept(data: &[u8], opts: &ExtractOptions) -> bool {
    if data.is_empty() {
        return false;
    }

    zero_ratio(data) <= opts.max_zero_ratio
}

pub fn zero_ratio(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let zeros = data.iter().filter(|b| **b == 0).count();
    zeros as f64 / data.len() as f64
}
