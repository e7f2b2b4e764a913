use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrowseError, Result};
use crate::files::{classify, ContentKind};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Content pane size assumed before the window has reported one.
pub const DEFAULT_VIEWPORT: (u32, u32) = (800, 600);
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (800, 600);
const DEFAULT_GRAY: [u8; 3] = [128, 128, 128];

// ---------------------------------------------------------------------------
// Rendered content
// ---------------------------------------------------------------------------

pub struct DecodedImage {
    pub rgba_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
}

impl DecodedImage {
    fn from_dynamic(img: DynamicImage, file_size: u64, format_name: String) -> Self {
        let (width, height) = img.dimensions();
        Self {
            rgba_bytes: img.to_rgba8().into_raw(),
            width,
            height,
            file_size,
            format_name,
        }
    }

    fn solid_gray(width: u32, height: u32) -> Self {
        let img = RgbImage::from_pixel(width, height, Rgb(DEFAULT_GRAY));
        Self::from_dynamic(DynamicImage::ImageRgb8(img), 0, "DEFAULT".to_string())
    }
}

pub enum Rendered {
    Image(DecodedImage),
    Text(String),
    /// Not displayable here; hand the path to the platform opener.
    OpenExternally(PathBuf),
}

/// A render result plus the failure that forced a fallback, if any.
pub struct RenderOutcome {
    pub content: Rendered,
    pub failure: Option<BrowseError>,
}

// ---------------------------------------------------------------------------
// Default image
// ---------------------------------------------------------------------------

/// Write the solid gray fallback image if nothing exists at `path` yet.
/// Returns true when a new file was written.
pub fn ensure_default_image(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let fail = |message: String| BrowseError::DefaultImage {
        path: path.to_path_buf(),
        message,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    let (w, h) = DEFAULT_IMAGE_SIZE;
    RgbImage::from_pixel(w, h, Rgb(DEFAULT_GRAY))
        .save(path)
        .map_err(|e| fail(e.to_string()))?;
    log::info!("Created default image at {}", path.display());
    Ok(true)
}

/// Load the fallback image scaled to the viewport. Never fails: if the file is
/// unusable an in-memory gray bitmap is produced instead.
pub fn load_default_image(path: &Path, viewport: Option<(u32, u32)>) -> DecodedImage {
    match decode_image(path, viewport) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("{}; using built-in default", e);
            let (vw, vh) = effective_viewport(viewport);
            let (dw, dh) = DEFAULT_IMAGE_SIZE;
            let (w, h) = fit_within(dw, dh, vw, vh);
            DecodedImage::solid_gray(w, h)
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn effective_viewport(viewport: Option<(u32, u32)>) -> (u32, u32) {
    match viewport {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => DEFAULT_VIEWPORT,
    }
}

/// Largest size with the same aspect ratio as `w`x`h` that fits the box.
/// Never scales up.
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max_w);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max_h);
    (nw, nh)
}

pub fn decode_image(path: &Path, viewport: Option<(u32, u32)>) -> Result<DecodedImage> {
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let img = image::open(path).map_err(|e| BrowseError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let format_name = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_uppercase();

    let (vw, vh) = effective_viewport(viewport);
    let (w, h) = img.dimensions();
    let (nw, nh) = fit_within(w, h, vw, vh);
    let img = if (nw, nh) != (w, h) {
        img.resize_exact(nw, nh, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    Ok(DecodedImage::from_dynamic(img, file_size, format_name))
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| BrowseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_lossy(&bytes))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Produce displayable content for `path`. Failures are substituted with the
/// default image or an error text and returned alongside; logging them is
/// left to the caller.
pub fn render(path: &Path, viewport: Option<(u32, u32)>, default_image: &Path) -> RenderOutcome {
    match classify(path) {
        ContentKind::Image => match decode_image(path, viewport) {
            Ok(img) => RenderOutcome {
                content: Rendered::Image(img),
                failure: None,
            },
            Err(e) => RenderOutcome {
                content: Rendered::Image(load_default_image(default_image, viewport)),
                failure: Some(e),
            },
        },
        ContentKind::Text => match read_text(path) {
            Ok(text) => RenderOutcome {
                content: Rendered::Text(text),
                failure: None,
            },
            Err(e) => RenderOutcome {
                content: Rendered::Text(e.to_string()),
                failure: Some(e),
            },
        },
        ContentKind::Other => RenderOutcome {
            content: Rendered::OpenExternally(path.to_path_buf()),
            failure: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbaImage::from_pixel(w, h, image::Rgba([10, 200, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn fit_within_scales_down_preserving_aspect() {
        assert_eq!(fit_within(1600, 1200, 800, 600), (800, 600));
        assert_eq!(fit_within(2000, 500, 800, 600), (800, 200));
        assert_eq!(fit_within(300, 1200, 800, 600), (150, 600));
    }

    #[test]
    fn fit_within_never_scales_up() {
        assert_eq!(fit_within(100, 50, 800, 600), (100, 50));
    }

    #[test]
    fn large_image_is_shrunk_to_viewport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_png(&path, 400, 200);

        let img = decode_image(&path, Some((100, 100))).unwrap();
        assert_eq!((img.width, img.height), (100, 50));
        assert_eq!(img.rgba_bytes.len(), 100 * 50 * 4);
        assert_eq!(img.format_name, "PNG");
    }

    #[test]
    fn unknown_viewport_uses_default_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 1600, 400);

        let img = decode_image(&path, None).unwrap();
        assert_eq!((img.width, img.height), (800, 200));
        let img = decode_image(&path, Some((0, 0))).unwrap();
        assert_eq!((img.width, img.height), (800, 200));
    }

    #[test]
    fn default_image_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img").join("default.png");

        assert!(ensure_default_image(&path).unwrap());
        assert!(!ensure_default_image(&path).unwrap());

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), DEFAULT_IMAGE_SIZE);
        assert_eq!(img.get_pixel(10, 10).0, DEFAULT_GRAY);
    }

    #[test]
    fn corrupt_image_falls_back_to_default_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("default.png");
        ensure_default_image(&default).unwrap();
        let broken = dir.path().join("broken.png");
        fs::write(&broken, b"definitely not a png").unwrap();

        let outcome = render(&broken, Some((400, 300)), &default);
        assert!(matches!(outcome.failure, Some(BrowseError::Decode { .. })));
        match outcome.content {
            Rendered::Image(img) => {
                assert_eq!((img.width, img.height), (400, 300));
                assert_eq!(&img.rgba_bytes[..4], &[128, 128, 128, 255]);
            }
            _ => panic!("expected the default image"),
        }
    }

    #[test]
    fn missing_default_image_still_yields_gray_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let img = load_default_image(&dir.path().join("absent.png"), None);
        assert_eq!((img.width, img.height), DEFAULT_IMAGE_SIZE);
        assert_eq!(&img.rgba_bytes[..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn text_is_shown_verbatim_minus_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello \xff\xfeworld\nline two").unwrap();

        let outcome = render(&path, None, &dir.path().join("d.png"));
        assert!(outcome.failure.is_none());
        match outcome.content {
            Rendered::Text(t) => assert_eq!(t, "hello world\nline two"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn unreadable_text_shows_error_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.log");

        let outcome = render(&path, None, &dir.path().join("d.png"));
        assert!(matches!(outcome.failure, Some(BrowseError::Read { .. })));
        match outcome.content {
            Rendered::Text(t) => assert!(t.contains("gone.log")),
            _ => panic!("expected error text"),
        }
    }

    #[test]
    fn unknown_extension_requests_external_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.exe");
        fs::write(&path, b"MZ").unwrap();

        let outcome = render(&path, None, &dir.path().join("d.png"));
        assert!(outcome.failure.is_none());
        assert!(matches!(outcome.content, Rendered::OpenExternally(p) if p == path));
    }
}
