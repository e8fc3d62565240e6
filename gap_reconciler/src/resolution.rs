use chrono::{Duration, NaiveDateTime};

/// Native sampling interval of a series: the smallest positive spacing
/// between consecutive present timestamps.
///
/// Mixed-resolution columns resolve to their finest interval. Returns `None`
/// when fewer than two timestamps are given.
pub fn detect_interval(timestamps: &[NaiveDateTime]) -> Option<Duration> {
    timestamps
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|delta| *delta > Duration::zero())
        .min()
}
