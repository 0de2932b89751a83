use crate::types::{NormalizedImage, PixelFrame};

/// Output value for frames without any intensity variance
pub const MID_GRAY: u8 = 128;

/// Intensity window derived from a frame's observed range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub center: i64,
    pub width: i64,
}

impl Window {
    /// Computes the window spanning `min..=max`
    pub fn from_range(min: u16, max: u16) -> Self {
        let (min, max) = (min as i64, max as i64);
        Self {
            center: (max + min) / 2,
            width: max - min,
        }
    }

    /// Scans a frame for its intensity range
    ///
    /// Returns `None` for a frame without samples.
    pub fn from_frame(frame: &PixelFrame) -> Option<Self> {
        if frame.samples().is_empty() {
            return None;
        }
        let (min, max) = frame
            .samples()
            .iter()
            .fold((u16::MAX, 0u16), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        Some(Self::from_range(min, max))
    }

    /// Maps one intensity into the 8-bit display range
    ///
    /// Uses floor division, so the lower edge of the window lands on 0 and the
    /// upper edge on 255. A zero-width window maps everything to [`MID_GRAY`].
    pub fn apply(&self, intensity: u16) -> u8 {
        if self.width == 0 {
            return MID_GRAY;
        }
        let scaled = ((intensity as i64 - self.center) * 255).div_euclid(self.width) + 128;
        scaled.clamp(0, 255) as u8
    }
}

/// Stretches a frame's contrast onto 8 bits
pub fn normalize(frame: &PixelFrame) -> NormalizedImage {
    let pixels = match Window::from_frame(frame) {
        Some(window) => frame.samples().iter().map(|&s| window.apply(s)).collect(),
        None => Vec::new(),
    };
    NormalizedImage::new(frame.columns(), frame.rows(), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: u32, rows: u32, samples: Vec<u16>) -> PixelFrame {
        PixelFrame::new(columns, rows, samples).unwrap()
    }

    #[test]
    fn test_flat_frame_is_mid_gray() {
        for k in [0u16, 1, 1000, u16::MAX] {
            let image = normalize(&frame(3, 2, vec![k; 6]));
            assert_eq!(image.pixels(), &[MID_GRAY; 6]);
        }
    }

    #[test]
    fn test_full_range_endpoints() {
        let image = normalize(&frame(3, 1, vec![0, 32767, 65535]));
        assert_eq!(image.pixels(), &[0, 128, 255]);
    }

    #[test]
    fn test_window_of_full_range() {
        let window = Window::from_range(0, 65535);
        assert_eq!(window.center, 32767);
        assert_eq!(window.width, 65535);
    }

    #[test]
    fn test_narrow_range_endpoints() {
        let image = normalize(&frame(2, 2, vec![1000, 1100, 1050, 1200]));
        assert_eq!(image.get(0, 0), Some(0));
        assert_eq!(image.get(1, 1), Some(255));
        // (1050 - 1100) * 255 / 200 = -63.75, floored to -64
        assert_eq!(image.get(0, 1), Some(64));
        assert_eq!(image.get(1, 0), Some(128));
    }

    #[test]
    fn test_small_odd_width_is_clamped() {
        // center 1, width 3: 0 -> -85 + 128, 3 -> 170 + 128 clamped
        let image = normalize(&frame(2, 1, vec![0, 3]));
        assert_eq!(image.pixels(), &[43, 255]);
    }

    #[test]
    fn test_high_range_does_not_overflow() {
        let image = normalize(&frame(2, 1, vec![60000, 65535]));
        assert_eq!(image.pixels(), &[0, 255]);
    }

    #[test]
    fn test_dimensions_preserved_and_deterministic() {
        let source = frame(4, 3, (0..12).map(|i| i * 500).collect());
        let a = normalize(&source);
        let b = normalize(&source);
        assert_eq!(a, b);
        assert_eq!(a.columns(), 4);
        assert_eq!(a.rows(), 3);
        assert_eq!(a.pixels().len(), 12);
    }

    #[test]
    fn test_empty_frame() {
        let image = normalize(&frame(0, 0, Vec::new()));
        assert!(image.pixels().is_empty());
    }
}
