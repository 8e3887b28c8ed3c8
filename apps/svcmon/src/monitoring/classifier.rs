use super::types::{ProbeOutcome, Verdict};

/// Turn a raw outcome into a verdict. Only latency strictly above the
/// threshold counts as slow.
pub fn classify(outcome: &ProbeOutcome, threshold_ms: f64) -> Verdict {
    if !outcome.succeeded {
        Verdict::Down
    } else if outcome.elapsed_ms > threshold_ms {
        Verdict::Slow
    } else {
        Verdict::Up
    }
}
