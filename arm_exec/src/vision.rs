//! # Vision
//!
//! Finds the target in a single camera frame. The target is a red object, it is segmented with an
//! HSV threshold and located from the image moments of the resulting mask.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::cam::Detection;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Locates the target in a frame of type `F`.
pub trait Vision<F> {
    fn locate(&self, frame: &F) -> Result<Detection, VisionError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Thresholds of the colour segmentation.
///
/// Hue is on the 0-180 scale, saturation and value on 0-255. Red wraps around zero so a pixel
/// matches if its hue is below `hue_low_max` or above `hue_high_min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    pub hue_low_max: f64,
    pub hue_high_min: f64,
    pub sat_min: f64,
    pub val_min: f64,

    /// Fewer matching pixels than this means the target is not in view.
    pub min_pixels: usize,
}

/// Colour threshold based vision.
#[derive(Debug, Clone, Default)]
pub struct ColourVision {
    params: VisionParams,
}

/// Accumulated raw moments of a pixel mask.
#[derive(Debug, Default)]
struct Moments {
    n: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VisionError {
    #[error("Target not found in frame ({found} matching pixels, need {required})")]
    NotFound { found: usize, required: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VisionParams {
    fn default() -> Self {
        Self {
            hue_low_max: 10.0,
            hue_high_min: 170.0,
            sat_min: 120.0,
            val_min: 70.0,
            min_pixels: 50,
        }
    }
}

impl ColourVision {
    pub fn new(params: VisionParams) -> Self {
        Self { params }
    }

    fn is_target(&self, px: &Rgb<u8>) -> bool {
        let (h, s, v) = rgb_to_hsv(px);
        let p = &self.params;

        (h < p.hue_low_max || h > p.hue_high_min) && s >= p.sat_min && v >= p.val_min
    }
}

impl Vision<RgbImage> for ColourVision {
    fn locate(&self, frame: &RgbImage) -> Result<Detection, VisionError> {
        let mut m = Moments::default();

        for (x, y, px) in frame.enumerate_pixels() {
            if self.is_target(px) {
                m.add(x as f64, y as f64);
            }
        }

        let found = m.n as usize;
        if found == 0 || found < self.params.min_pixels {
            return Err(VisionError::NotFound {
                found,
                required: self.params.min_pixels,
            });
        }

        Ok(m.detection())
    }
}

impl Moments {
    fn add(&mut self, x: f64, y: f64) {
        self.n += 1.0;
        self.sx += x;
        self.sy += y;
        self.sxx += x * x;
        self.syy += y * y;
        self.sxy += x * y;
    }

    /// Centroid and principal axis orientation.
    fn detection(&self) -> Detection {
        let cx = self.sx / self.n;
        let cy = self.sy / self.n;

        let mu20 = self.sxx / self.n - cx * cx;
        let mu02 = self.syy / self.n - cy * cy;
        let mu11 = self.sxy / self.n - cx * cy;

        Detection {
            centre_px: [cx, cy],
            orientation_deg: (0.5 * (2.0 * mu11).atan2(mu20 - mu02)).to_degrees(),
        }
    }
}

/// Convert a pixel into hue (0-180), saturation (0-255) and value (0-255).
fn rgb_to_hsv(px: &Rgb<u8>) -> (f64, f64, f64) {
    let r = px[0] as f64 / 255.0;
    let g = px[1] as f64 / 255.0;
    let b = px[2] as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let sat = if max == 0.0 { 0.0 } else { delta / max };

    (hue_deg / 2.0, sat * 255.0, max * 255.0)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const RED: Rgb<u8> = Rgb([220, 20, 30]);

    fn frame_with_rect(x0: u32, y0: u32, w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(64, 48, Rgb([10, 60, 10]));
        for x in x0..x0 + w {
            for y in y0..y0 + h {
                img.put_pixel(x, y, RED);
            }
        }
        img
    }

    #[test]
    fn test_hsv() {
        let (h, s, v) = rgb_to_hsv(&Rgb([255, 0, 0]));
        assert_eq!((h, s, v), (0.0, 255.0, 255.0));

        let (h, _, _) = rgb_to_hsv(&Rgb([0, 0, 255]));
        assert_eq!(h, 120.0);

        // Magenta-ish reds wrap to the top of the hue range
        let (h, _, _) = rgb_to_hsv(&Rgb([255, 0, 40]));
        assert!(h > 170.0);
    }

    #[test]
    fn test_locate_horizontal_bar() {
        let vision = ColourVision::default();
        let det = vision.locate(&frame_with_rect(10, 20, 20, 4)).unwrap();

        assert!((det.centre_px[0] - 19.5).abs() < 1e-9);
        assert!((det.centre_px[1] - 21.5).abs() < 1e-9);
        assert!(det.orientation_deg.abs() < 1e-6);
    }

    #[test]
    fn test_locate_vertical_bar() {
        let vision = ColourVision::default();
        let det = vision.locate(&frame_with_rect(30, 5, 4, 30)).unwrap();

        assert!((det.centre_px[0] - 31.5).abs() < 1e-9);
        assert!((det.orientation_deg.abs() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_not_found() {
        let vision = ColourVision::default();

        assert_eq!(
            vision.locate(&frame_with_rect(0, 0, 0, 0)),
            Err(VisionError::NotFound {
                found: 0,
                required: 50
            })
        );

        // Too small to be the target
        assert!(vision.locate(&frame_with_rect(0, 0, 3, 3)).is_err());
    }
}
