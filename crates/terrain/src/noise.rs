//! Seeded gradient-noise primitive for terrain generation.
//!
//! Wraps a permutation-table Perlin field behind `[0, 1]` sampling and
//! amplitude-normalized octave summation. All output is a pure function of
//! (seed, x, z): identical inputs produce bit-identical values across runs
//! and platforms.

use ::noise::{NoiseFn, Perlin};

/// Frequency multiplier between successive octaves.
const LACUNARITY: f64 = 2.0;

/// Seeded 2D gradient-noise field.
///
/// Immutable after construction; sampling never mutates internal state, so a
/// field is safe to share across threads without locking.
#[derive(Debug, Clone)]
pub struct NoiseField {
    perlin: Perlin,
    seed: u32,
}

impl NoiseField {
    /// Create a field from an integer seed.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// Create an independent field derived from `seed` by a fixed salt.
    ///
    /// Used to decorrelate the height, biome-selector, region-size, and
    /// amplitude-variation fields while keeping everything reproducible from
    /// one world seed.
    pub fn with_salt(seed: u32, salt: u32) -> Self {
        Self::new(seed.wrapping_add(salt))
    }

    /// Seed this field was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sample the raw field, returning a value in `[-1, 1]`.
    pub fn sample_2d_signed(&self, x: f64, z: f64) -> f64 {
        self.perlin.get([x, z]).clamp(-1.0, 1.0)
    }

    /// Sample the field, returning a value in `[0, 1]`.
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        (self.sample_2d_signed(x, z) + 1.0) * 0.5
    }

    /// Multi-octave sample, returning a value in `[0, 1]`.
    ///
    /// Sums `octaves` layers at doubling frequency with geometrically
    /// decaying amplitude (ratio `persistence`), normalized by the amplitude
    /// sum so the result stays in the base range regardless of octave count.
    ///
    /// Out-of-range arguments are clamped (`octaves` to at least 1,
    /// `persistence` into the open unit interval); validated configurations
    /// reject them earlier, at construction time.
    pub fn octave_sample_2d(&self, x: f64, z: f64, octaves: u32, persistence: f64) -> f64 {
        let octaves = octaves.max(1);
        let persistence = persistence.clamp(f64::EPSILON, 1.0 - f64::EPSILON);

        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            value += self.perlin.get([x * frequency, z * frequency]) * amplitude;
            max_value += amplitude;

            amplitude *= persistence;
            frequency *= LACUNARITY;
        }

        // Normalize from [-max, max] to [0, 1].
        ((value / max_value) + 1.0) * 0.5
    }
}

/// Linear remap of `t` in `[0, 1]` into `[min, max]`.
pub fn remap_unit(t: f64, min: f64, max: f64) -> f64 {
    min + t.clamp(0.0, 1.0) * (max - min)
}

/// Hermite smoothstep `t²(3 − 2t)`, clamped to the unit interval.
///
/// The required easing for biome transitions; linear interpolation leaves
/// visible seams at band boundaries.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_determinism() {
        let field1 = NoiseField::new(12345);
        let field2 = NoiseField::new(12345);

        for x in 0..10 {
            for z in 0..10 {
                let p = (x as f64 * 0.37, z as f64 * 0.53);
                assert_eq!(
                    field1.sample_2d(p.0, p.1),
                    field2.sample_2d(p.0, p.1),
                    "Noise not deterministic at {:?}",
                    p
                );
            }
        }
    }

    #[test]
    fn test_sample_range() {
        let field = NoiseField::new(7);

        for x in 0..100 {
            for z in 0..100 {
                let val = field.sample_2d(x as f64 * 0.13, z as f64 * 0.17);
                assert!(
                    (0.0..=1.0).contains(&val),
                    "Value {} out of range at ({}, {})",
                    val,
                    x,
                    z
                );
            }
        }
    }

    #[test]
    fn test_octave_sample_range() {
        let field = NoiseField::new(99);

        for octaves in 1..=6 {
            for x in 0..50 {
                let val = field.octave_sample_2d(x as f64 * 0.21, 3.5, octaves, 0.5);
                assert!(
                    (0.0..=1.0).contains(&val),
                    "Octave value {} out of range (octaves={})",
                    val,
                    octaves
                );
            }
        }
    }

    #[test]
    fn test_octave_clamping() {
        let field = NoiseField::new(4);

        // octaves=0 behaves as a single octave, persistence is irrelevant then
        let single = field.octave_sample_2d(1.3, 2.7, 1, 0.5);
        let clamped = field.octave_sample_2d(1.3, 2.7, 0, 0.5);
        assert_eq!(single, clamped);
    }

    #[test]
    fn test_different_salts_decorrelate() {
        let a = NoiseField::with_salt(42, 1000);
        let b = NoiseField::with_salt(42, 2000);

        let mut any_different = false;
        for x in 0..20 {
            for z in 0..20 {
                let va = a.sample_2d(x as f64 * 0.5, z as f64 * 0.5);
                let vb = b.sample_2d(x as f64 * 0.5, z as f64 * 0.5);
                if (va - vb).abs() > 1e-3 {
                    any_different = true;
                    break;
                }
            }
        }
        assert!(any_different, "Salted fields should differ");
    }

    #[test]
    fn test_continuity() {
        // Gradient noise has bounded slope; small steps must produce small
        // value changes (guards against lattice-snapping bugs).
        let field = NoiseField::new(12345);
        let delta = 0.01;

        for i in 0..500 {
            let x = i as f64 * 0.31 - 80.0;
            let z = i as f64 * 0.47 - 120.0;
            let here = field.sample_2d(x, z);
            let there = field.sample_2d(x + delta, z);
            assert!(
                (here - there).abs() < 0.05,
                "Discontinuity at ({}, {}): {} vs {}",
                x,
                z,
                here,
                there
            );
        }
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn test_remap_unit() {
        assert_eq!(remap_unit(0.0, 2.0, 6.0), 2.0);
        assert_eq!(remap_unit(1.0, 2.0, 6.0), 6.0);
        assert_eq!(remap_unit(0.5, 2.0, 6.0), 4.0);
        // Out-of-range input clamps rather than extrapolating
        assert_eq!(remap_unit(1.5, 2.0, 6.0), 6.0);
    }
}
