/// Cumulative point totals needed to reach each level. Index + 1 is the
/// level; past the last entry the level is pinned at the table length.
pub const LEVEL_THRESHOLDS: [i64; 8] = [0, 500, 1_500, 3_000, 5_000, 8_000, 12_000, 20_000];

pub fn level_for_points(points: i64) -> u32 {
    let mut level = 1;
    for (index, threshold) in LEVEL_THRESHOLDS.iter().enumerate() {
        if points >= *threshold {
            level = index as u32 + 1;
        } else {
            break;
        }
    }
    level
}

/// Fraction of the way from the current level to the next, in [0, 1].
/// 1.0 once the top of the table is reached.
pub fn level_progress(points: i64) -> f64 {
    let level = level_for_points(points) as usize;
    if level >= LEVEL_THRESHOLDS.len() {
        return 1.0;
    }
    let floor = LEVEL_THRESHOLDS[level - 1];
    let ceiling = LEVEL_THRESHOLDS[level];
    let span = (ceiling - floor) as f64;
    ((points - floor) as f64 / span).clamp(0.0, 1.0)
}
