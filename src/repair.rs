use rand::Rng;

/// Smallest value the pipeline will ever emit; readings below this are not
/// physically meaningful.
pub const VALUE_FLOOR: f64 = 0.1;

/// Synthetic-walk magnitude as a fraction of the previous valid value.
const WALK_MIN: f64 = 0.03;
const WALK_MAX: f64 = 0.08;

/// Range for seeding a series that starts with a gap.
const SEED_MIN: f64 = 5.0;
const SEED_MAX: f64 = 20.0;

/// Relative jump beyond which a present value is treated as an outlier,
/// and the blend factor pulling it back toward continuity.
const OUTLIER_JUMP: f64 = 0.30;
const OUTLIER_BLEND: f64 = 0.30;

/// Repair an ordered series in one left-to-right pass.
///
/// Missing, zero, and non-finite entries become a bounded random walk
/// around the previous valid value; present values that jump more than 30%
/// are blended toward continuity. The only state is `previous`, so values
/// depend on earlier entries and never on later ones — the pass streams.
pub fn repair_series<R: Rng>(values: &[Option<f64>], rng: &mut R) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;

    for &value in values {
        let present = value.filter(|v| v.is_finite() && *v > 0.0);
        let next = match (present, previous) {
            (Some(v), Some(prev)) => {
                if (v - prev).abs() / prev > OUTLIER_JUMP {
                    (prev + OUTLIER_BLEND * (v - prev)).max(VALUE_FLOOR)
                } else {
                    v.max(VALUE_FLOOR)
                }
            }
            (Some(v), None) => v.max(VALUE_FLOOR),
            (None, Some(prev)) => {
                let magnitude = prev * rng.gen_range(WALK_MIN..=WALK_MAX);
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                (prev + sign * magnitude).max(VALUE_FLOOR)
            }
            // Gap at the very start: nothing to walk from, synthesize.
            (None, None) => rng.gen_range(SEED_MIN..=SEED_MAX),
        };

        previous = Some(next);
        out.push(next);
    }

    out
}
