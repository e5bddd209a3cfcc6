//! Image normalization into a fixed bounding box

mod error;

use std::io::Cursor;

use image::{
    imageops::{self, FilterType},
    DynamicImage, ImageFormat, ImageReader, Limits, Rgba, RgbaImage,
};
use tracing::debug;

pub use error::{NormalizeError, NormalizeResult};

/// Width of the normalized canvas in pixels
pub const TARGET_WIDTH: u32 = 1080;
/// Height of the normalized canvas in pixels
pub const TARGET_HEIGHT: u32 = 1920;

/// Largest accepted side of a decoded image
const MAX_DECODE_DIMENSION: u32 = 16_384;
/// Upper bound on decoder allocations (512 MiB)
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Opaque black, used for the letterbox padding
const PADDING: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A re-encoded image that fits the bounding box
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: ImageFormat,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Width of the scaled source inside the canvas
    pub content_width: u32,
    /// Height of the scaled source inside the canvas
    pub content_height: u32,
}

impl NormalizedImage {
    /// MIME type matching `format`
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Resizes uploads to fit a bounding box using contain-and-pad semantics
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    width: u32,
    height: u32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(TARGET_WIDTH, TARGET_HEIGHT)
    }
}

impl ImageNormalizer {
    /// Creates a normalizer for a `width` x `height` box
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Decodes `raw`, scales it uniformly to fit the box, centers it on a padded
    /// canvas of exactly the box size and re-encodes it
    ///
    /// `content_type` is only consulted when the format cannot be sniffed from
    /// the bytes themselves.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::Decode` if the bytes are not a readable image
    /// Returns `NormalizeError::Encode` if the result cannot be encoded
    pub fn normalize(&self, raw: &[u8], content_type: &str) -> NormalizeResult<NormalizedImage> {
        let (source, input_format) = decode(raw, content_type)?;

        let (content_width, content_height) =
            contain_dimensions(source.width(), source.height(), self.width, self.height);

        debug!(
            "Normalizing {}x{} {:?} to {}x{} inside {}x{}",
            source.width(),
            source.height(),
            input_format,
            content_width,
            content_height,
            self.width,
            self.height
        );

        let scaled = source
            .resize_exact(content_width, content_height, FilterType::Lanczos3)
            .into_rgba8();

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, PADDING);
        let x = i64::from((self.width - content_width) / 2);
        let y = i64::from((self.height - content_height) / 2);
        imageops::overlay(&mut canvas, &scaled, x, y);

        let format = output_format(input_format);
        let bytes = encode(canvas, format)?;

        Ok(NormalizedImage {
            bytes,
            format,
            width: self.width,
            height: self.height,
            content_width,
            content_height,
        })
    }
}

/// Largest size with the source aspect ratio that fits inside the box
///
/// Scales up as well as down. Each side is at least one pixel and never
/// exceeds the box.
#[must_use]
pub fn contain_dimensions(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    let src_w = f64::from(src_w.max(1));
    let src_h = f64::from(src_h.max(1));
    let scale = (f64::from(box_w) / src_w).min(f64::from(box_h) / src_h);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = |side: f64, bound: u32| ((side * scale).round() as u32).clamp(1, bound.max(1));

    (scaled(src_w, box_w), scaled(src_h, box_h))
}

fn decoder_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

fn decode(raw: &[u8], content_type: &str) -> NormalizeResult<(DynamicImage, ImageFormat)> {
    let mut reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| NormalizeError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        if let Some(hint) = ImageFormat::from_mime_type(content_type) {
            reader.set_format(hint);
        }
    }

    let format = reader
        .format()
        .ok_or_else(|| NormalizeError::Decode("unrecognized image format".to_string()))?;

    reader.limits(decoder_limits());

    let image = reader
        .decode()
        .map_err(|e| NormalizeError::Decode(e.to_string()))?;

    Ok((image, format))
}

/// Keeps the input encoding when it can be written, otherwise falls back to PNG
const fn output_format(input: ImageFormat) -> ImageFormat {
    match input {
        ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::WebP
        | ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::Tiff => input,
        _ => ImageFormat::Png,
    }
}

fn encode(canvas: RgbaImage, format: ImageFormat) -> NormalizeResult<Vec<u8>> {
    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).into_rgb8()),
        _ => DynamicImage::ImageRgba8(canvas),
    };

    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format)
        .map_err(|e| NormalizeError::Encode(format!("{format:?}: {e}")))?;

    Ok(buf.into_inner())
}
