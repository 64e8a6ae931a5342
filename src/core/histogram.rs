// Intensity histograms for 8-bit single-channel images.

use image::GrayImage;

use crate::error::{DedupError, Result};

pub const HISTOGRAM_SIZE: usize = 256;

/// Raw occurrence counts, indexed by intensity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; HISTOGRAM_SIZE],
}

impl Histogram {
    /// Tally every pixel of `image` exactly once.
    pub fn from_image(image: &GrayImage) -> Self {
        let mut bins = [0u64; HISTOGRAM_SIZE];
        for pixel in image.as_raw() {
            bins[*pixel as usize] += 1;
        }
        Self { bins }
    }

    pub fn from_bins(bins: [u64; HISTOGRAM_SIZE]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u64; HISTOGRAM_SIZE] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn max_bin(&self) -> u64 {
        self.bins.iter().copied().max().unwrap_or(0)
    }

    /// Divide every bin by the largest one.
    ///
    /// Fails with `InvalidInput` when every bin is zero, which only happens
    /// for a zero-pixel image.
    pub fn normalize(&self) -> Result<NormalizedHistogram> {
        let max = self.max_bin();
        if max == 0 {
            return Err(DedupError::InvalidInput(
                "histogram has no counts (zero-pixel image)".to_string(),
            ));
        }

        let max = max as f64;
        let mut bins = [0f64; HISTOGRAM_SIZE];
        for (out, count) in bins.iter_mut().zip(self.bins.iter()) {
            *out = *count as f64 / max;
        }
        Ok(NormalizedHistogram { bins })
    }
}

/// Histogram rescaled so the tallest bin is exactly 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHistogram {
    bins: [f64; HISTOGRAM_SIZE],
}

impl NormalizedHistogram {
    /// Bypasses the max-bin invariant so degenerate inputs can be exercised.
    #[cfg(test)]
    pub(crate) fn from_raw(bins: [f64; HISTOGRAM_SIZE]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[f64; HISTOGRAM_SIZE] {
        &self.bins
    }

    pub fn sum(&self) -> f64 {
        self.bins.iter().sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.bins.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Extract and normalize in one step.
pub fn normalized_histogram(image: &GrayImage) -> Result<NormalizedHistogram> {
    Histogram::from_image(image).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn gradient(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    #[test]
    fn test_bin_sum_matches_pixel_count() {
        for (w, h) in [(1, 1), (17, 5), (64, 64), (300, 2)] {
            let img = gradient(w, h);
            let hist = Histogram::from_image(&img);
            assert_eq!(hist.total(), (w * h) as u64);
        }
    }

    #[test]
    fn test_counts_land_in_intensity_bins() {
        let img = ImageBuffer::from_fn(4, 1, |x, _| Luma([if x < 3 { 10 } else { 200 }]));
        let hist = Histogram::from_image(&img);

        assert_eq!(hist.bins()[10], 3);
        assert_eq!(hist.bins()[200], 1);
        assert_eq!(hist.max_bin(), 3);
    }

    #[test]
    fn test_normalized_bins_in_unit_range() {
        let hist = Histogram::from_image(&gradient(50, 40));
        let normalized = hist.normalize().unwrap();

        assert!(normalized.bins().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(normalized.bins().iter().any(|v| *v == 1.0));
    }

    #[test]
    fn test_normalization_preserves_bin_order() {
        let mut bins = [0u64; HISTOGRAM_SIZE];
        bins[0] = 2;
        bins[5] = 8;
        bins[255] = 4;
        let normalized = Histogram::from_bins(bins).normalize().unwrap();

        assert_eq!(normalized.bins()[0], 0.25);
        assert_eq!(normalized.bins()[5], 1.0);
        assert_eq!(normalized.bins()[255], 0.5);
        assert_eq!(normalized.bins()[1], 0.0);
    }

    #[test]
    fn test_empty_histogram_is_invalid_input() {
        let empty = Histogram::from_bins([0; HISTOGRAM_SIZE]);
        assert!(matches!(empty.normalize(), Err(DedupError::InvalidInput(_))));

        let zero_pixels = GrayImage::new(0, 0);
        assert!(matches!(
            normalized_histogram(&zero_pixels),
            Err(DedupError::InvalidInput(_))
        ));
    }
}
