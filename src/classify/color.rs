//! Color vs greyscale scorer.
//!
//! An image is greyscale when either test passes:
//!
//! - **saturation**: on a ≤256 px thumbnail, ignoring near-black and
//!   near-white pixels, at least `sat_px_fraction` of pixels have
//!   `S < sat_low` and the 90th-percentile `S` is at most `sat_p90_max`
//! - **colorfulness**: the Hasler–Süsstrunk metric is at most
//!   `colorfulness` and the mean CIE Lab chroma is at most `mean_chroma`
//!
//! Anything that cannot be decoded is treated as color.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::RgbImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Thresholds, Verdict, display_name};
use crate::store::{COLOR_DIR, GREYSCALE_DIR};

const THUMBNAIL_EDGE: u32 = 256;
const V_MIN: u8 = 20;
const V_MAX: u8 = 245;

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Carries meaningful color.
    Color,
    /// Greyscale or nearly so.
    Greyscale,
}

/// Where color and greyscale images end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Color to `color_images/`, grey to `greyscale_images/`.
    #[default]
    Both,
    /// Color stays put, grey to `greyscale_images/`.
    KeepColorInPlace,
    /// Grey stays put, color to `color_images/`.
    KeepGreyInPlace,
}

impl ColorMode {
    /// Parses a mode name or its one-letter shortcut (`b`, `c`, `g`).
    ///
    /// Unrecognized input falls back to [`ColorMode::Both`].
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "b" | "both" => Self::Both,
            "c" | "keep-color" | "keep-color-in-place" | "keep-colour-in-place" => {
                Self::KeepColorInPlace
            }
            "g" | "keep-grey" | "keep-gray" | "keep-grey-in-place" | "keep-gray-in-place" => {
                Self::KeepGreyInPlace
            }
            other => {
                warn!(mode = other, "unknown color mode, sorting both ways");
                Self::Both
            }
        }
    }

    /// Destination folder name for `tone`, or `None` to leave it in place.
    #[must_use]
    pub fn destination(self, tone: Tone) -> Option<&'static str> {
        match (self, tone) {
            (Self::Both | Self::KeepColorInPlace, Tone::Greyscale) => Some(GREYSCALE_DIR),
            (Self::Both | Self::KeepGreyInPlace, Tone::Color) => Some(COLOR_DIR),
            (Self::KeepColorInPlace, Tone::Color) | (Self::KeepGreyInPlace, Tone::Greyscale) => {
                None
            }
        }
    }
}

impl FromStr for ColorMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Both => "both",
            Self::KeepColorInPlace => "keep-color-in-place",
            Self::KeepGreyInPlace => "keep-grey-in-place",
        };
        f.write_str(name)
    }
}

/// Raw measurements behind a [`Tone`] decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStats {
    /// Fraction of mid-tone pixels with low saturation.
    pub frac_low: f64,
    /// 90th-percentile saturation of mid-tone pixels.
    pub p90: f64,
    /// Hasler–Süsstrunk colorfulness.
    pub colorfulness: f64,
    /// Mean CIE Lab chroma.
    pub mean_chroma: f64,
}

impl ColorStats {
    /// Measures an RGB image as-is (no resizing).
    #[must_use]
    pub fn measure(rgb: &RgbImage, sat_low: f64) -> Self {
        let (frac_low, p90) = saturation_stats(rgb, sat_low);
        Self {
            frac_low,
            p90,
            colorfulness: colorfulness(rgb),
            mean_chroma: mean_lab_chroma(rgb),
        }
    }

    /// Applies both greyscale tests.
    #[must_use]
    pub fn tone(&self, thresholds: &Thresholds) -> Tone {
        let by_saturation =
            self.frac_low >= thresholds.sat_px_fraction && self.p90 <= thresholds.sat_p90_max;
        let by_colorfulness = self.colorfulness <= thresholds.colorfulness
            && self.mean_chroma <= thresholds.mean_chroma;
        if by_saturation || by_colorfulness {
            Tone::Greyscale
        } else {
            Tone::Color
        }
    }
}

/// Decodes `path`, downsizes it and measures it. `None` if undecodable.
#[must_use]
pub fn analyze_color(path: &Path, thresholds: &Thresholds) -> Option<ColorStats> {
    let img = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "undecodable, treating as color");
            return None;
        }
    };
    let img = if img.width().max(img.height()) > THUMBNAIL_EDGE {
        img.resize(THUMBNAIL_EDGE, THUMBNAIL_EDGE, FilterType::Triangle)
    } else {
        img
    };
    Some(ColorStats::measure(&img.to_rgb8(), thresholds.sat_low))
}

/// Classifies one file; undecodable files are [`Tone::Color`].
#[must_use]
pub fn classify_tone(path: &Path, thresholds: &Thresholds) -> Tone {
    analyze_color(path, thresholds).map_or(Tone::Color, |stats| stats.tone(thresholds))
}

/// Produces move/keep verdicts for `files` according to `mode`.
#[must_use]
pub fn route_by_color(
    files: &[PathBuf],
    target: &Path,
    mode: ColorMode,
    thresholds: &Thresholds,
) -> Vec<Verdict> {
    files
        .iter()
        .map(|path| {
            let tone = classify_tone(path, thresholds);
            let reason = match tone {
                Tone::Color => "color",
                Tone::Greyscale => "greyscale",
            };
            debug!(file = %display_name(path), reason, "classified tone");
            match mode.destination(tone) {
                Some(dir) => Verdict::move_to(path, target.join(dir), reason),
                None => Verdict::keep(path, reason),
            }
        })
        .collect()
}

/// HSV saturation over mid-tone pixels: (fraction below `sat_low`, p90).
fn saturation_stats(rgb: &RgbImage, sat_low: f64) -> (f64, f64) {
    let mut all = Vec::with_capacity(pixel_count(rgb));
    let mut mid = Vec::with_capacity(pixel_count(rgb));
    for px in rgb.pixels() {
        let [r, g, b] = px.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let s = if max == 0 {
            0.0
        } else {
            f64::from(max - min) / f64::from(max)
        };
        all.push(s);
        if (V_MIN..=V_MAX).contains(&max) {
            mid.push(s);
        }
    }
    let mut values = if mid.is_empty() { all } else { mid };
    if values.is_empty() {
        return (1.0, 0.0);
    }

    values.sort_by(f64::total_cmp);
    let low = values.iter().filter(|&&s| s < sat_low).count();
    (ratio(low, values.len()), percentile(&values, 90.0))
}

/// Linear-interpolated percentile over sorted values.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            #[allow(clippy::cast_precision_loss)]
            let rank = pct / 100.0 * (n - 1) as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            #[allow(clippy::cast_precision_loss)]
            let frac = rank - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Hasler–Süsstrunk colorfulness.
fn colorfulness(rgb: &RgbImage) -> f64 {
    let n = pixel_count(rgb);
    if n == 0 {
        return 0.0;
    }
    let (mut sum_rg, mut sum_yb, mut sq_rg, mut sq_yb) = (0.0, 0.0, 0.0, 0.0);
    for px in rgb.pixels() {
        let [r, g, b] = px.0.map(f64::from);
        let rg = r - g;
        let yb = 0.5 * (r + g) - b;
        sum_rg += rg;
        sum_yb += yb;
        sq_rg += rg * rg;
        sq_yb += yb * yb;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    let (mean_rg, mean_yb) = (sum_rg / n, sum_yb / n);
    let var_rg = (sq_rg / n - mean_rg * mean_rg).max(0.0);
    let var_yb = (sq_yb / n - mean_yb * mean_yb).max(0.0);
    (var_rg + var_yb).sqrt() + 0.3 * mean_rg.hypot(mean_yb)
}

/// Mean chroma `sqrt(a² + b²)` in CIE Lab (D65).
#[allow(clippy::cast_precision_loss)]
fn mean_lab_chroma(rgb: &RgbImage) -> f64 {
    let n = pixel_count(rgb);
    if n == 0 {
        return 0.0;
    }
    let total: f64 = rgb
        .pixels()
        .map(|px| {
            let (_, a, b) = srgb_to_lab(px.0);
            a.hypot(b)
        })
        .sum();
    total / n as f64
}

fn pixel_count(rgb: &RgbImage) -> usize {
    let (w, h) = rgb.dimensions();
    usize::try_from(u64::from(w) * u64::from(h)).unwrap_or(usize::MAX)
}

fn srgb_to_lab([r, g, b]: [u8; 3]) -> (f64, f64, f64) {
    fn linear(c: u8) -> f64 {
        let c = f64::from(c) / 255.0;
        if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    fn f(t: f64) -> f64 {
        const DELTA: f64 = 6.0 / 29.0;
        if t > DELTA * DELTA * DELTA {
            t.cbrt()
        } else {
            t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
        }
    }

    let (r, g, b) = (linear(r), linear(g), linear(b));
    let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / 0.950_47;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = (0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / 1.088_83;

    let (fx, fy, fz) = (f(x), f(y), f(z));
    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole.max(1) as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::VerdictKind;
    use image::Rgb;
    use tempfile::TempDir;

    fn save(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_pure_grey_is_greyscale() {
        let tmp = TempDir::new().unwrap();
        let path = save(tmp.path(), "grey.png", &RgbImage::from_pixel(200, 200, Rgb([128, 128, 128])));
        let stats = analyze_color(&path, &Thresholds::default()).unwrap();
        assert!((stats.frac_low - 1.0).abs() < f64::EPSILON);
        assert!(stats.mean_chroma < 1.0, "chroma {}", stats.mean_chroma);
        assert_eq!(classify_tone(&path, &Thresholds::default()), Tone::Greyscale);
    }

    #[test]
    fn test_saturated_red_is_color() {
        let tmp = TempDir::new().unwrap();
        let path = save(tmp.path(), "red.png", &RgbImage::from_pixel(200, 200, Rgb([220, 20, 20])));
        let stats = analyze_color(&path, &Thresholds::default()).unwrap();
        assert!(stats.colorfulness > 18.0);
        assert_eq!(classify_tone(&path, &Thresholds::default()), Tone::Color);
    }

    #[test]
    fn test_all_black_falls_back_to_every_pixel() {
        let stats = ColorStats::measure(&RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])), 0.22);
        assert!((stats.frac_low - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.tone(&Thresholds::default()), Tone::Greyscale);
    }

    #[test]
    fn test_undecodable_is_color() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert_eq!(classify_tone(&path, &Thresholds::default()), Tone::Color);
    }

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let values = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        assert!((percentile(&values, 90.0) - 0.9).abs() < 1e-9);
        assert!((percentile(&[0.0, 1.0], 90.0) - 0.9).abs() < 1e-9);
        assert!((percentile(&[0.4], 90.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_color_mode_parsing_and_fallback() {
        assert_eq!("c".parse::<ColorMode>().unwrap(), ColorMode::KeepColorInPlace);
        assert_eq!(ColorMode::parse_lenient("keep-grey-in-place"), ColorMode::KeepGreyInPlace);
        assert_eq!(ColorMode::parse_lenient("B"), ColorMode::Both);
        assert_eq!(ColorMode::parse_lenient("sideways"), ColorMode::Both);
        assert_eq!(ColorMode::KeepGreyInPlace.to_string(), "keep-grey-in-place");
    }

    #[test]
    fn test_route_by_color_modes() {
        let tmp = TempDir::new().unwrap();
        let grey = save(tmp.path(), "image_1.png", &RgbImage::from_pixel(50, 50, Rgb([90, 90, 90])));
        let red = save(tmp.path(), "image_2.png", &RgbImage::from_pixel(50, 50, Rgb([250, 0, 0])));
        let files = vec![grey, red];
        let th = Thresholds::default();

        let both = route_by_color(&files, tmp.path(), ColorMode::Both, &th);
        assert_eq!(both[0].kind, VerdictKind::Move(tmp.path().join(GREYSCALE_DIR)));
        assert_eq!(both[1].kind, VerdictKind::Move(tmp.path().join(COLOR_DIR)));

        let keep_color = route_by_color(&files, tmp.path(), ColorMode::KeepColorInPlace, &th);
        assert_eq!(keep_color[1].kind, VerdictKind::Keep);

        let keep_grey = route_by_color(&files, tmp.path(), ColorMode::KeepGreyInPlace, &th);
        assert_eq!(keep_grey[0].kind, VerdictKind::Keep);
        assert_eq!(keep_grey[1].kind, VerdictKind::Move(tmp.path().join(COLOR_DIR)));
    }
}
