//! Local procedural cover generation.
//!
//! Covers are drawn from a closed set of styles. Every style layers a
//! gradient background, random rectangles and ellipses, and per-pixel
//! noise, so the low-order bits of the result are already busy before any
//! data is embedded.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::{CoverError, CoverProvider};

/// Visual style of a procedural cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverStyle {
    /// Overlapping rectangles.
    Blocks,
    /// Overlapping ellipses.
    Bubbles,
    /// Horizontal sine bands with a sprinkling of shapes.
    Waves,
    /// Mixed shapes under heavy grain.
    Static,
}

impl CoverStyle {
    /// Every available style.
    pub const ALL: [CoverStyle; 4] = [
        CoverStyle::Blocks,
        CoverStyle::Bubbles,
        CoverStyle::Waves,
        CoverStyle::Static,
    ];

    /// Picks a style uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    fn shape_count(self) -> usize {
        match self {
            CoverStyle::Blocks | CoverStyle::Bubbles => 100,
            CoverStyle::Waves => 40,
            CoverStyle::Static => 60,
        }
    }

    fn noise_amplitude(self) -> i16 {
        match self {
            CoverStyle::Static => 14,
            _ => 6,
        }
    }
}

/// Infallible local cover generator.
#[derive(Debug, Clone, Default)]
pub struct ProceduralCover {
    seed: Option<[u8; 32]>,
}

impl ProceduralCover {
    /// Creates a generator seeded from OS entropy on every call.
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Creates a generator that draws the same image for the same size.
    ///
    /// Meant for tests and reproducible demos only.
    pub fn seeded(seed: [u8; 32]) -> Self {
        Self { seed: Some(seed) }
    }

    /// Draws a cover of the given size with a random style.
    pub fn generate(&self, width: u32, height: u32) -> RgbImage {
        let mut rng = match self.seed {
            Some(seed) => ChaCha20Rng::from_seed(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let style = CoverStyle::random(&mut rng);
        generate_cover(&mut rng, width, height, style)
    }
}

#[async_trait]
impl CoverProvider for ProceduralCover {
    async fn cover(&self, width: u32, height: u32) -> Result<RgbImage, CoverError> {
        Ok(self.generate(width, height))
    }

    fn name(&self) -> &'static str {
        "procedural"
    }
}

/// Draws a cover of the given size and style.
pub fn generate_cover<R: Rng>(rng: &mut R, width: u32, height: u32, style: CoverStyle) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }

    paint_gradient(rng, &mut img);

    if style == CoverStyle::Waves {
        paint_waves(rng, &mut img);
    }

    for _ in 0..style.shape_count() {
        let x1 = rng.gen_range(0..width);
        let y1 = rng.gen_range(0..height);
        let x2 = x1.saturating_add(rng.gen_range(10..=100));
        let y2 = y1.saturating_add(rng.gen_range(10..=100));
        let color = bright_color(rng);

        let ellipse = match style {
            CoverStyle::Blocks => false,
            CoverStyle::Bubbles => true,
            CoverStyle::Waves | CoverStyle::Static => rng.gen_bool(0.5),
        };

        if ellipse {
            fill_ellipse(&mut img, (x1, y1, x2, y2), color);
        } else {
            fill_rect(&mut img, (x1, y1, x2, y2), color);
        }
    }

    add_noise(rng, &mut img, style.noise_amplitude());
    img
}

fn dark_color<R: Rng>(rng: &mut R) -> [u8; 3] {
    [rng.gen_range(0..=50), rng.gen_range(0..=50), rng.gen_range(0..=50)]
}

fn bright_color<R: Rng>(rng: &mut R) -> Rgb<u8> {
    Rgb([rng.gen_range(50..=255), rng.gen_range(50..=255), rng.gen_range(50..=255)])
}

fn paint_gradient<R: Rng>(rng: &mut R, img: &mut RgbImage) {
    let from = dark_color(rng);
    let to = dark_color(rng);
    let span = (img.width() + img.height()).saturating_sub(2).max(1) as f32;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let t = (x + y) as f32 / span;
        for c in 0..3 {
            let v = f32::from(from[c]) + (f32::from(to[c]) - f32::from(from[c])) * t;
            pixel.0[c] = v.round() as u8;
        }
    }
}

fn paint_waves<R: Rng>(rng: &mut R, img: &mut RgbImage) {
    let bands = rng.gen_range(3..=8);
    let height = img.height() as f32;

    for _ in 0..bands {
        let color = bright_color(rng);
        let base = rng.gen_range(0.0..height);
        let amplitude = rng.gen_range(5.0..40.0_f32);
        let period = rng.gen_range(40.0..200.0_f32);
        let thickness = rng.gen_range(4.0..20.0_f32);

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let centre = base + amplitude * (x as f32 * std::f32::consts::TAU / period).sin();
            if (y as f32 - centre).abs() <= thickness {
                *pixel = color;
            }
        }
    }
}

/// Clips an inclusive box to the image bounds.
fn clip(img: &RgbImage, (x1, y1, x2, y2): (u32, u32, u32, u32)) -> (u32, u32, u32, u32) {
    let max_x = img.width().saturating_sub(1);
    let max_y = img.height().saturating_sub(1);
    (x1.min(max_x), y1.min(max_y), x2.min(max_x), y2.min(max_y))
}

fn fill_rect(img: &mut RgbImage, bounds: (u32, u32, u32, u32), color: Rgb<u8>) {
    let (x1, y1, x2, y2) = clip(img, bounds);
    for y in y1..=y2 {
        for x in x1..=x2 {
            img.put_pixel(x, y, color);
        }
    }
}

fn fill_ellipse(img: &mut RgbImage, bounds: (u32, u32, u32, u32), color: Rgb<u8>) {
    let (bx1, by1, bx2, by2) = bounds;
    let cx = (bx1 as f32 + bx2 as f32) / 2.0;
    let cy = (by1 as f32 + by2 as f32) / 2.0;
    let rx = ((bx2 - bx1) as f32 / 2.0).max(0.5);
    let ry = ((by2 - by1) as f32 / 2.0).max(0.5);

    let (x1, y1, x2, y2) = clip(img, bounds);
    for y in y1..=y2 {
        for x in x1..=x2 {
            let dx = (x as f32 - cx) / rx;
            let dy = (y as f32 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

fn add_noise<R: Rng>(rng: &mut R, img: &mut RgbImage, amplitude: i16) {
    for value in img.iter_mut() {
        let delta = rng.gen_range(-amplitude..=amplitude);
        *value = (i16::from(*value) + delta).clamp(0, 255) as u8;
    }
}
