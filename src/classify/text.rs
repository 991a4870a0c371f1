//! Text, QR and screenshot detection.
//!
//! Three independent signals; any one of them is enough to delete:
//!
//! 1. a QR grid is found ([`QrDetector`])
//! 2. the text-likeness score reaches the threshold
//! 3. an OCR engine reads enough alphanumerics ([`OcrEngine`])
//!
//! The score mixes small connected components, edge density and white
//! background on a ≤900 px greyscale copy:
//! `0.45 * small_ratio + 0.35 * edge_density + 0.20 * white_ratio`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::open;
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Signal, Thresholds, Verdict, display_name};

const ANALYSIS_EDGE: u32 = 900;
/// Sigma OpenCV derives for a 3×3 Gaussian kernel.
const PRE_CANNY_SIGMA: f32 = 0.8;
const CANNY_LOW: f32 = 80.0;
const CANNY_HIGH: f32 = 160.0;
/// Sigma of a 25 px Gaussian block: `0.3 * ((25 - 1) / 2 - 1) + 0.8`.
const ADAPTIVE_SIGMA: f32 = 4.1;
const ADAPTIVE_C: i16 = 10;
const SMALL_MIN_FRACTION: f64 = 0.0002;
const SMALL_MAX_FRACTION: f64 = 0.02;
const WHITE_LEVEL: u8 = 240;

/// Detects QR codes in a greyscale image.
pub trait QrDetector: Send + Sync {
    /// `Present(true)` when a grid is found, `Absent` if detection cannot run.
    fn detect(&self, image: &GrayImage) -> Signal<bool>;
}

/// Counts alphanumeric characters recognized in an image file.
pub trait OcrEngine: Send + Sync {
    /// `Absent` if the engine is unavailable or fails on this file.
    fn count_alphanumerics(&self, path: &Path) -> Signal<usize>;
}

/// QR grid locator backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDetector;

impl QrDetector for RqrrDetector {
    fn detect(&self, image: &GrayImage) -> Signal<bool> {
        let (w, h) = image.dimensions();
        let (Ok(width), Ok(height)) = (usize::try_from(w), usize::try_from(h)) else {
            return Signal::Absent;
        };
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            // x < width and y < height, both originally u32.
            #[allow(clippy::cast_possible_truncation)]
            image.get_pixel(x as u32, y as u32)[0]
        });
        Signal::Present(!prepared.detect_grids().is_empty())
    }
}

/// Detector used when QR detection is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoQr;

impl QrDetector for NoQr {
    fn detect(&self, _image: &GrayImage) -> Signal<bool> {
        Signal::Absent
    }
}

/// OCR through a `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    /// Looks for `tesseract` on `PATH`.
    #[must_use]
    pub fn probe() -> Option<Self> {
        match which::which("tesseract") {
            Ok(binary) => {
                info!(binary = %binary.display(), "OCR available");
                Some(Self { binary })
            }
            Err(e) => {
                debug!(error = %e, "tesseract not found, OCR disabled");
                None
            }
        }
    }

    /// Uses an explicit executable.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn count_alphanumerics(&self, path: &Path) -> Signal<usize> {
        let output = match Command::new(&self.binary).arg(path).arg("stdout").output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(path = %path.display(), status = %output.status, "OCR failed");
                return Signal::Absent;
            }
            Err(e) => {
                warn!(binary = %self.binary.display(), error = %e, "could not run OCR");
                return Signal::Absent;
            }
        };
        let text = String::from_utf8_lossy(&output.stdout);
        Signal::Present(text.chars().filter(|c| c.is_alphanumeric()).count())
    }
}

/// Engine used when OCR is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn count_alphanumerics(&self, _path: &Path) -> Signal<usize> {
        Signal::Absent
    }
}

/// All signals gathered for one file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextAssessment {
    /// QR grid found.
    pub qr: Signal<bool>,
    /// Text-likeness score in `[0, 1]`.
    pub score: Signal<f64>,
    /// OCR alphanumeric count.
    pub ocr_letters: Signal<usize>,
}

impl TextAssessment {
    /// Reason to delete, if any signal fires.
    #[must_use]
    pub fn deletion_reason(&self, thresholds: &Thresholds) -> Option<String> {
        if self.qr == Signal::Present(true) {
            return Some("qr code".to_string());
        }
        let by_score = matches!(self.score, Signal::Present(s) if s >= thresholds.text_score);
        let by_ocr =
            matches!(self.ocr_letters, Signal::Present(n) if n >= thresholds.ocr_letters_min);
        if !(by_score || by_ocr) {
            return None;
        }

        let mut why = match self.score {
            Signal::Present(s) => format!("text-like score={s:.2}"),
            Signal::Absent => "text-like".to_string(),
        };
        if let Signal::Present(n) = self.ocr_letters {
            why.push_str(&format!(", ocr={n}"));
        }
        Some(why)
    }
}

/// Text/QR scorer with pluggable optional capabilities.
pub struct TextClassifier {
    qr: Box<dyn QrDetector>,
    ocr: Box<dyn OcrEngine>,
    thresholds: Thresholds,
}

impl std::fmt::Debug for TextClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextClassifier")
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl TextClassifier {
    /// Builds a classifier from explicit strategies.
    #[must_use]
    pub fn new(qr: Box<dyn QrDetector>, ocr: Box<dyn OcrEngine>, thresholds: Thresholds) -> Self {
        Self {
            qr,
            ocr,
            thresholds,
        }
    }

    /// `rqrr` for QR plus `tesseract` when it is installed.
    #[must_use]
    pub fn probe(thresholds: Thresholds) -> Self {
        let ocr: Box<dyn OcrEngine> = match TesseractOcr::probe() {
            Some(engine) => Box::new(engine),
            None => Box::new(NoOcr),
        };
        Self::new(Box::new(RqrrDetector), ocr, thresholds)
    }

    /// Gathers every signal for `path`.
    #[must_use]
    pub fn assess(&self, path: &Path) -> TextAssessment {
        let (qr, score) = match image::open(path) {
            Ok(img) => {
                let gray = img.to_luma8();
                let qr = self.qr.detect(&gray);
                (qr, Signal::Present(textlike_score(&img)))
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "undecodable, no pixel signals");
                (Signal::Absent, Signal::Absent)
            }
        };
        // OCR is skipped once a QR code already decides.
        let ocr_letters = if qr == Signal::Present(true) {
            Signal::Absent
        } else {
            self.ocr.count_alphanumerics(path)
        };
        TextAssessment {
            qr,
            score,
            ocr_letters,
        }
    }

    /// Delete verdict for text-like files, keep otherwise.
    #[must_use]
    pub fn judge(&self, path: &Path) -> Verdict {
        let assessment = self.assess(path);
        match assessment.deletion_reason(&self.thresholds) {
            Some(reason) => Verdict::delete(path, reason),
            None => {
                debug!(file = %display_name(path), ?assessment, "not text-like");
                Verdict::keep(path, "not text-like")
            }
        }
    }

    /// Runs [`judge`](Self::judge) over `files`.
    #[must_use]
    pub fn score_all(&self, files: &[PathBuf]) -> Vec<Verdict> {
        files.iter().map(|path| self.judge(path)).collect()
    }
}

/// Text-likeness score of a decoded image, clamped to `[0, 1]`.
#[must_use]
pub fn textlike_score(img: &DynamicImage) -> f64 {
    let img = if img.width().max(img.height()) > ANALYSIS_EDGE {
        img.resize(ANALYSIS_EDGE, ANALYSIS_EDGE, FilterType::Triangle)
    } else {
        img.clone()
    };
    let gray = img.to_luma8();
    let area = pixel_area(&gray);
    if area == 0 {
        return 0.0;
    }

    let edges = canny(&gaussian_blur_f32(&gray, PRE_CANNY_SIGMA), CANNY_LOW, CANNY_HIGH);
    let edge_density = ratio(edges.pixels().filter(|p| p[0] > 0).count(), area);

    let opened = open(&adaptive_threshold_inv(&gray), Norm::LInf, 1);
    let small_ratio = small_component_ratio(&opened, area);

    let white_ratio = ratio(gray.pixels().filter(|p| p[0] >= WHITE_LEVEL).count(), area);

    (0.45 * small_ratio + 0.35 * edge_density + 0.20 * white_ratio).clamp(0.0, 1.0)
}

/// Inverted adaptive threshold: foreground where the pixel is at least
/// `ADAPTIVE_C` darker than its Gaussian-weighted neighbourhood.
fn adaptive_threshold_inv(gray: &GrayImage) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, ADAPTIVE_SIGMA);
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in gray.enumerate_pixels() {
        let threshold = i16::from(local_mean.get_pixel(x, y)[0]) - ADAPTIVE_C;
        let value = if i16::from(px[0]) <= threshold { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

/// Share of 8-connected foreground components whose area lies strictly
/// between 0.02% and 2% of the image.
fn small_component_ratio(binary: &GrayImage, area: usize) -> f64 {
    let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));
    let mut sizes: Vec<usize> = Vec::new();
    for px in labels.pixels() {
        let label = px[0] as usize;
        if label == 0 {
            continue;
        }
        if sizes.len() < label {
            sizes.resize(label, 0);
        }
        sizes[label - 1] += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let area = area as f64;
    let (lo, hi) = (area * SMALL_MIN_FRACTION, area * SMALL_MAX_FRACTION);
    #[allow(clippy::cast_precision_loss)]
    let small = sizes
        .iter()
        .filter(|&&s| (s as f64) > lo && (s as f64) < hi)
        .count();
    ratio(small, sizes.len())
}

fn pixel_area(gray: &GrayImage) -> usize {
    let (w, h) = gray.dimensions();
    usize::try_from(u64::from(w) * u64::from(h)).unwrap_or(usize::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole.max(1) as f64
}
