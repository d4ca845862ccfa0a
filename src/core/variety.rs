use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Score gap under which two candidates count as near-tied
pub const NEAR_TIE_THRESHOLD: f64 = 2.0;

/// Width of the wall-clock window within which rankings are reproducible
const DEFAULT_WINDOW_SECS: i64 = 50;

/// Source of the coarse epoch that seeds score variety
///
/// Rankings must be reproducible within a short window (the same request
/// twice in a row orders the same) while drifting over real time so repeat
/// visitors are not always shown the identical top products. Production
/// reads the wall clock; tests inject a fixed bucket.
pub trait VarietySource: Send + Sync {
    fn bucket(&self) -> u64;
}

/// Buckets the wall clock into fixed windows
#[derive(Debug, Clone, Copy)]
pub struct ClockVariety {
    window_secs: i64,
}

impl ClockVariety {
    pub fn new() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }

    pub fn with_window(window_secs: i64) -> Self {
        Self {
            window_secs: window_secs.max(1),
        }
    }
}

impl Default for ClockVariety {
    fn default() -> Self {
        Self::new()
    }
}

impl VarietySource for ClockVariety {
    fn bucket(&self) -> u64 {
        let now = chrono::Utc::now().timestamp().max(0);
        (now / self.window_secs) as u64
    }
}

/// Fixed bucket for tests and simulated time
#[derive(Debug, Clone, Copy)]
pub struct FixedVariety(pub u64);

impl VarietySource for FixedVariety {
    fn bucket(&self) -> u64 {
        self.0
    }
}

/// Bounded per-candidate score offset, stable within a bucket
///
/// A slow sine wave of amplitude 2 plus a seeded draw in [0, 3). The
/// magnitude stays small next to the spread between clearly better and
/// clearly worse candidates, so it only reshuffles peers.
#[inline]
pub fn perturbation(bucket: u64, product_id: u64) -> f64 {
    let phase = bucket.wrapping_add(product_id) as f64;
    let wave = (phase * 0.7).sin() * 2.0;
    let mut rng = StdRng::seed_from_u64(mix(bucket, product_id));
    wave + rng.gen_range(0.0..3.0)
}

/// Tie-break draw for a near-tied adjacent pair, in [-1.5, 1.5)
///
/// Pure in (bucket, pair ids): a fixed bucket reproduces the same ordering,
/// distant buckets may resolve the pair differently.
#[inline]
pub fn tie_break(bucket: u64, left_id: u64, right_id: u64) -> f64 {
    let pair = left_id.rotate_left(17) ^ right_id.rotate_left(31);
    let mut rng = StdRng::seed_from_u64(mix(bucket, pair));
    rng.gen_range(-1.5..1.5)
}

#[inline]
fn mix(a: u64, b: u64) -> u64 {
    a.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ b.wrapping_mul(0xd1b5_4a32_d192_ed03)
}
