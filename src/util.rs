/// Arithmetic mean of a series of millisecond samples.
pub fn mean(samples: &[u64]) -> Option<f64> {
    match samples.len() {
        0 => None,
        count => Some(samples.iter().map(|&ms| ms as f64).sum::<f64>() / count as f64),
    }
}

/// Population standard deviation of millisecond samples.
pub fn std_dev(samples: &[u64]) -> Option<f64> {
    let avg = mean(samples)?;
    let variance = samples
        .iter()
        .map(|&ms| {
            let diff = avg - ms as f64;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;

    Some(variance.sqrt())
}

/// Mean rounded half-up to whole milliseconds, 0 for an empty series.
pub fn rounded_mean(samples: &[u64]) -> u64 {
    mean(samples).map_or(0, |avg| avg.round() as u64)
}
