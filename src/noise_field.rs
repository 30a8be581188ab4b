//! Deterministic Perlin-noise fields normalized to [0, 1].
//!
//! Wraps the `noise` crate's gradient noise with fractal octave summation
//! and the region-selection helpers generators carve placement areas from:
//! thresholds for scatter, bands for rivers, buckets for terrain depth.

use noise::{NoiseFn, Perlin};

use crate::grid::Grid;
use crate::seeds::derive_seed_offset;

/// A `width x height` field of noise values in [0, 1].
///
/// Equal construction arguments always reproduce the same field bit for bit.
#[derive(Clone)]
pub struct NoiseField {
    grid: Grid<f32>,
}

impl NoiseField {
    /// Classic gradient noise sampled at `(x / scale, y / scale)`.
    ///
    /// `octaves` fractal layers are summed with frequency doubling and
    /// amplitude halving, then the field is min/max normalized to [0, 1].
    pub fn perlin(width: u32, height: u32, seed: u64, scale: f64, octaves: u32) -> Self {
        let noise = Perlin::new(seed as u32);
        let mut grid = Grid::new_with(width, height, 0.0f32);

        for y in 0..height {
            for x in 0..width {
                let value = fbm(&noise, x as f64 / scale, y as f64 / scale, octaves);
                grid.set(x, y, value as f32);
            }
        }

        let mut field = Self { grid };
        field.normalize();
        field
    }

    /// Pointwise mean of two Perlin fields at distinct scales, renormalized.
    pub fn double_perlin(width: u32, height: u32, seed: u64, scale1: f64, scale2: f64) -> Self {
        Self::double_perlin_weighted(width, height, seed, scale1, scale2, 0.5, 0.5)
    }

    /// Weighted blend of a coarse and a fine Perlin field.
    ///
    /// The coarse layer gives the overall shape, the fine layer the detail;
    /// the fine field branches the seed so the two layers stay independent.
    pub fn double_perlin_weighted(
        width: u32,
        height: u32,
        seed: u64,
        coarse_scale: f64,
        fine_scale: f64,
        coarse_weight: f32,
        fine_weight: f32,
    ) -> Self {
        let coarse = Self::perlin(width, height, seed, coarse_scale, 2);
        let fine = Self::perlin(width, height, derive_seed_offset(seed, 1), fine_scale, 4);

        let mut grid = Grid::new_with(width, height, 0.0f32);
        for y in 0..height {
            for x in 0..width {
                let blended = coarse.get(x, y) * coarse_weight + fine.get(x, y) * fine_weight;
                grid.set(x, y, blended);
            }
        }

        let mut field = Self { grid };
        field.normalize();
        field
    }

    pub fn width(&self) -> u32 {
        self.grid.width
    }

    pub fn height(&self) -> u32 {
        self.grid.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        *self.grid.get(x, y)
    }

    /// Coordinates of all cells at or above a threshold, row-major.
    pub fn cells_above(&self, threshold: f32) -> Vec<(i32, i32)> {
        self.grid
            .iter()
            .filter(|(_, _, &v)| v >= threshold)
            .map(|(x, y, _)| (x as i32, y as i32))
            .collect()
    }

    /// Coordinates of all cells inside `[lo, hi]`, row-major.
    ///
    /// Band selection is what turns a smooth field into a winding river:
    /// the band traces a level set of the noise.
    pub fn cells_in_band(&self, lo: f32, hi: f32) -> Vec<(i32, i32)> {
        self.grid
            .iter()
            .filter(|(_, _, &v)| v >= lo && v <= hi)
            .map(|(x, y, _)| (x as i32, y as i32))
            .collect()
    }

    /// Quantize the field into `depth` coordinate buckets.
    ///
    /// Bucket `i` holds the cells whose value falls in `[i/depth, (i+1)/depth)`;
    /// the top bucket also takes value 1.0. Every cell lands in exactly one
    /// bucket, so the buckets partition the map into terrain strata.
    pub fn buckets(&self, depth: usize) -> Vec<Vec<(i32, i32)>> {
        let mut buckets = vec![Vec::new(); depth];
        for (x, y, &v) in self.grid.iter() {
            let idx = ((v * depth as f32) as usize).min(depth - 1);
            buckets[idx].push((x as i32, y as i32));
        }
        buckets
    }

    /// Blend the field toward `base` around the map center, then renormalize.
    ///
    /// A Gaussian of width `sigma` (in cells) weighs the center: weight 1
    /// there, decaying outward. Generators use this to keep a buildable
    /// clearing in the middle of otherwise noisy terrain.
    pub fn center_falloff(&mut self, sigma: f32, base: f32) {
        let center_x = self.grid.width as f32 / 2.0;
        let center_y = self.grid.height as f32 / 2.0;

        for (x, y, v) in self.grid.iter_mut() {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let d = (dx * dx + dy * dy).sqrt();
            let weight = (-(d / sigma) * (d / sigma)).exp();
            *v = weight * base + (1.0 - weight) * *v;
        }

        self.normalize();
    }

    /// Rescale values to span [0, 1]. A flat field settles at 0.5.
    fn normalize(&mut self) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for (_, _, &v) in self.grid.iter() {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        let range = max - min;
        if range <= f32::EPSILON {
            self.grid.fill(0.5);
            return;
        }
        for (_, _, v) in self.grid.iter_mut() {
            *v = (*v - min) / range;
        }
    }
}

/// Fractional Brownian motion: summed octaves with persistence 0.5 and
/// lacunarity 2.0, rescaled by the accumulated amplitude.
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves.max(1) {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    total / max_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perlin_deterministic() {
        let a = NoiseField::perlin(32, 16, 99, 8.0, 3);
        let b = NoiseField::perlin(32, 16, 99, 8.0, 3);
        for y in 0..16 {
            for x in 0..32 {
                assert_eq!(a.get(x, y).to_bits(), b.get(x, y).to_bits());
            }
        }
    }

    #[test]
    fn test_values_normalized() {
        let field = NoiseField::double_perlin(24, 24, 7, 10.0, 3.0);
        let mut saw_low = false;
        let mut saw_high = false;
        for y in 0..24 {
            for x in 0..24 {
                let v = field.get(x, y);
                assert!((0.0..=1.0).contains(&v));
                if v < 0.25 {
                    saw_low = true;
                }
                if v > 0.75 {
                    saw_high = true;
                }
            }
        }
        // Min/max normalization pins the extremes to 0 and 1.
        assert!(saw_low && saw_high);
    }

    #[test]
    fn test_band_is_subset_of_above() {
        let field = NoiseField::perlin(20, 20, 5, 6.0, 2);
        let band = field.cells_in_band(0.4, 0.6);
        let above = field.cells_above(0.4);
        for cell in &band {
            assert!(above.contains(cell));
        }
    }

    #[test]
    fn test_buckets_partition_all_cells() {
        let field = NoiseField::perlin(16, 12, 3, 5.0, 2);
        let buckets = field.buckets(4);
        let total: usize = buckets.iter().map(|b| b.len()).sum();
        assert_eq!(total, 16 * 12);
    }

    #[test]
    fn test_center_falloff_keeps_range() {
        let mut field = NoiseField::perlin(30, 30, 13, 8.0, 2);
        field.center_falloff(10.0, 0.0);
        for y in 0..30 {
            for x in 0..30 {
                assert!((0.0..=1.0).contains(&field.get(x, y)));
            }
        }
    }
}
