//! Backdrop stars scattered over the inside of the sky sphere

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::spherical_to_cartesian;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Position inside the sphere group
    pub local: Vec3,
    /// Pixel size, 0..2
    pub size: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Starfield {
    stars: Vec<Star>,
}

impl Starfield {
    /// Scatter `count` stars uniformly over an equirectangular sky, like a
    /// random-dot texture wrapped on the sphere
    pub fn generate(count: usize, radius: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let stars = (0..count)
            .map(|_| {
                let theta = rng.gen_range(0.0..360.0);
                let phi = rng.gen_range(0.0..180.0);
                Star {
                    local: spherical_to_cartesian(theta, phi, radius),
                    size: rng.gen_range(0.0..2.0),
                }
            })
            .collect();
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }
}
