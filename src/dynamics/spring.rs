use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Frequency (Hz), damping ratio and initial response of a second-order system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    pub frequency: f32,
    pub damping: f32,
    pub response: f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        SpringPreset::Smooth.params()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpringPreset {
    Snappy,
    Smooth,
    Bouncy,
    Sluggish,
}

impl SpringPreset {
    pub fn params(self) -> SpringParams {
        let (frequency, damping, response) = match self {
            SpringPreset::Snappy => (4.0, 0.5, 2.0),
            SpringPreset::Smooth => (2.0, 1.0, 0.0),
            SpringPreset::Bouncy => (3.0, 0.3, 1.0),
            SpringPreset::Sluggish => (1.0, 1.5, 0.0),
        };
        SpringParams {
            frequency,
            damping,
            response,
        }
    }
}

/// Second-order follower for a scalar signal, used to ease the body height.
#[derive(Debug, Clone)]
pub struct SecondOrderDynamics {
    y: f32,
    yd: f32,
    xp: f32,
    k1: f32,
    k2: f32,
    k3: f32,
}

impl SecondOrderDynamics {
    pub fn new(params: SpringParams, initial: f32) -> Self {
        let (k1, k2, k3) = Self::compute_constants(params);
        Self {
            y: initial,
            yd: 0.0,
            xp: initial,
            k1,
            k2,
            k3,
        }
    }

    fn compute_constants(params: SpringParams) -> (f32, f32, f32) {
        let f = params.frequency.max(0.001);
        let w = 2.0 * PI * f;
        let k1 = params.damping / (PI * f);
        let k2 = 1.0 / (w * w);
        let k3 = params.response * params.damping / w;
        (k1, k2, k3)
    }

    pub fn reset(&mut self, value: f32) {
        self.y = value;
        self.yd = 0.0;
        self.xp = value;
    }

    pub fn update(&mut self, x: f32, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 || !x.is_finite() {
            return self.y;
        }

        let xd = (x - self.xp) / dt;
        self.xp = x;

        // keeps the integration stable for large steps
        let k2_stable = self
            .k2
            .max(dt * dt / 2.0 + dt * self.k1 / 2.0)
            .max(dt * self.k1);

        self.y += self.yd * dt;
        self.yd += dt * (x + self.k3 * xd - self.y - self.k1 * self.yd) / k2_stable;

        self.y
    }

    pub fn current(&self) -> f32 {
        self.y
    }
}
