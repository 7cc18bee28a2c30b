//! Exponential smoothing shared by MACD and the factor engine.
//!
//! k = 2/(n+1), seeded with the first value of the series, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k).

/// Exponentially smoothed copy of `values`, seeded by `values[0]`.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { v * k + ema * (1.0 - k) };
        out.push(ema);
    }
    out
}
