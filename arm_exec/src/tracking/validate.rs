//! Track continuity checks

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{TrackHistory, TrackSample, TrackingError, TrackingParams};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check that the history describes a physically plausible motion.
///
/// Every adjacent pair of samples must be no further apart in time than `max_time_gap_s` and no
/// further apart in space than `max_step_m`. All time gaps are checked before any distance. Empty
/// and single sample histories are always valid.
pub fn verify_track(history: &TrackHistory, params: &TrackingParams) -> Result<(), TrackingError> {
    let samples: Vec<&TrackSample> = history.iter().collect();

    for (i, pair) in samples.windows(2).enumerate() {
        let gap_s = (pair[0].timestamp_s - pair[1].timestamp_s).abs();

        if gap_s > params.max_time_gap_s {
            return Err(TrackingError::TimeGap {
                first: i,
                second: i + 1,
                gap_s,
            });
        }
    }

    for (i, pair) in samples.windows(2).enumerate() {
        let dist_m = nalgebra::distance(&pair[0].location, &pair[1].location);

        if dist_m > params.max_step_m {
            return Err(TrackingError::StepTooLarge {
                first: i,
                second: i + 1,
                dist_m,
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
