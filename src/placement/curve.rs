use serde::{Deserialize, Serialize};

/// A key of a cubic Hermite curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    pub tangent: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32, tangent: f32) -> Self {
        Self {
            time,
            value,
            tangent,
        }
    }
}

const ROBOT_KEYS: [CurveKey; 3] = [
    CurveKey::new(0.0, 0.0, 2.8878),
    CurveKey::new(0.5, 1.0, 0.0),
    CurveKey::new(1.0, 0.0, -2.8878),
];

const ORGANIC_KEYS: [CurveKey; 3] = [
    CurveKey::new(0.0, 0.0, 5.0),
    CurveKey::new(0.2, 1.0, 0.0),
    CurveKey::new(1.0, 0.0, -1.25),
];

/// Foot height over the course of a step, as a fraction of the step height.
///
/// Sampled with the step progress in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum StepCurve {
    /// Symmetric arc peaking mid-step.
    #[default]
    Robot,
    /// Quick lift, long settle.
    Organic,
    /// Keys must be sorted by time.
    Custom { keys: Vec<CurveKey> },
}

impl StepCurve {
    pub fn keys(&self) -> &[CurveKey] {
        match self {
            StepCurve::Robot => &ROBOT_KEYS[..],
            StepCurve::Organic => &ORGANIC_KEYS[..],
            StepCurve::Custom { keys } => keys.as_slice(),
        }
    }

    pub fn sample(&self, t: f32) -> f32 {
        let keys = self.keys();
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return 0.0;
        };
        if !t.is_finite() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        let index = keys.partition_point(|k| k.time <= t).clamp(1, keys.len() - 1);
        hermite(&keys[index - 1], &keys[index], t)
    }
}

fn hermite(k0: &CurveKey, k1: &CurveKey, t: f32) -> f32 {
    let h = k1.time - k0.time;
    if h <= f32::EPSILON {
        return k1.value;
    }
    let s = (t - k0.time) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * h * k0.tangent + h01 * k1.value + h11 * h * k1.tangent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_curves_start_and_end_on_the_ground() {
        for curve in [StepCurve::Robot, StepCurve::Organic] {
            assert!(curve.sample(0.0).abs() < 1e-6);
            assert!(curve.sample(1.0).abs() < 1e-6);
        }
        assert!((StepCurve::Robot.sample(0.5) - 1.0).abs() < 1e-6);
        assert!((StepCurve::Organic.sample(0.2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn organic_lifts_earlier_than_robot() {
        assert!(StepCurve::Organic.sample(0.1) > StepCurve::Robot.sample(0.1));
    }

    #[test]
    fn custom_curve_clamps_outside_keys() {
        let curve = StepCurve::Custom {
            keys: vec![CurveKey::new(0.2, 0.5, 0.0), CurveKey::new(0.8, 0.1, 0.0)],
        };
        assert_eq!(curve.sample(0.0), 0.5);
        assert_eq!(curve.sample(1.0), 0.1);
        assert!((curve.sample(0.5) - 0.3).abs() < 1e-5);

        let empty = StepCurve::Custom { keys: Vec::new() };
        assert_eq!(empty.sample(0.4), 0.0);
    }
}
