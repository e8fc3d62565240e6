use crate::gaps::Gap;
use crate::models::NativeSeries;
use chrono::Timelike;
use std::collections::HashMap;

/// Linear interpolation between the present values bounding the gap.
pub fn interpolate(values: &mut [Option<f32>], gap: &Gap) {
    interpolate_run(values, gap.start, gap.end());
}

/// Fill a long gap with the average day of the surrounding window.
///
/// The window spans `window_steps` cells before the gap start and after the
/// gap end. Cells whose time of day has no present sample in the window are
/// interpolated afterwards.
pub fn fill_average_day(series: &mut NativeSeries, gap: &Gap, window_steps: usize) {
    let lo = gap.start.saturating_sub(window_steps);
    let hi = (gap.end() + window_steps).min(series.len());

    let mut profile: HashMap<(u32, u32), (f64, usize)> = HashMap::new();
    for i in lo..hi {
        if let Some(value) = series.values[i] {
            let entry = profile.entry(time_of_day(series, i)).or_insert((0.0, 0));
            entry.0 += value as f64;
            entry.1 += 1;
        }
    }

    for i in gap.start..gap.end() {
        if let Some((sum, count)) = profile.get(&time_of_day(series, i)) {
            series.values[i] = Some((sum / *count as f64) as f32);
        }
    }

    // leftovers are bounded by filled or original values
    let mut i = gap.start;
    while i < gap.end() {
        if series.values[i].is_none() {
            let start = i;
            while i < gap.end() && series.values[i].is_none() {
                i += 1;
            }
            interpolate_run(&mut series.values, start, i);
        } else {
            i += 1;
        }
    }
}

pub fn fill_zero(values: &mut [Option<f32>], gap: &Gap) {
    for value in &mut values[gap.start..gap.end()] {
        if value.is_none() {
            *value = Some(0.0);
        }
    }
}

/// Interpolate `values[start..end]` from `values[start - 1]` and `values[end]`.
fn interpolate_run(values: &mut [Option<f32>], start: usize, end: usize) {
    if start == 0 || end >= values.len() {
        return;
    }
    let (left, right) = match (values[start - 1], values[end]) {
        (Some(left), Some(right)) => (left as f64, right as f64),
        _ => return,
    };

    let span = (end - start + 1) as f64;
    for i in start..end {
        let weight = (i - start + 1) as f64 / span;
        values[i] = Some((left + (right - left) * weight) as f32);
    }
}

fn time_of_day(series: &NativeSeries, position: usize) -> (u32, u32) {
    let ts = series.timestamp(position);
    (ts.hour(), ts.minute())
}
