//! Numeric helpers shared by the indicators.

/// Simple average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Smoothing factor for an EMA of the given span.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// One recursive EMA step.
pub fn ema_from_previous(value: f64, previous: f64, period: usize) -> f64 {
    let alpha = ema_alpha(period);
    alpha * value + (1.0 - alpha) * previous
}

/// Full EMA series, seeded from the first value. Output has the same length as the input.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    out.push(first);
    let mut previous = first;
    for &value in iter {
        previous = ema_from_previous(value, previous, period);
        out.push(previous);
    }
    out
}

/// Latest EMA value, seeded from the first value.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    ema_series(values, period).last().copied()
}
