//! Loading, decoding and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ColorImage, OwnedImage, PixelLayout};
use crate::util::{SlideError, SlideResult};
use std::path::{Path, PathBuf};

fn io_error(err: image::ImageError) -> SlideError {
    SlideError::ImageIo {
        reason: err.to_string(),
    }
}

/// Converts a decoded image into the requested layout.
///
/// `Rgba8` keeps transparency; `Rgb8` and `Bgr8` drop it.
pub fn color_from_dynamic(img: &image::DynamicImage, layout: PixelLayout) -> SlideResult<ColorImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = match layout {
        PixelLayout::Rgba8 => img.to_rgba8().into_raw(),
        PixelLayout::Rgb8 => img.to_rgb8().into_raw(),
        PixelLayout::Bgr8 => {
            let mut data = img.to_rgb8().into_raw();
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            data
        }
    };
    ColorImage::new(data, width, height, layout)
}

/// Decodes encoded image bytes (PNG, JPEG) into the requested layout.
pub fn decode_color(bytes: &[u8], layout: PixelLayout) -> SlideResult<ColorImage> {
    let img = image::load_from_memory(bytes).map_err(|err| SlideError::DecodeFailure {
        reason: err.to_string(),
    })?;
    color_from_dynamic(&img, layout)
}

/// Loads an image from disk into the requested layout.
pub fn load_color<P: AsRef<Path>>(path: P, layout: PixelLayout) -> SlideResult<ColorImage> {
    let img = image::open(path).map_err(io_error)?;
    color_from_dynamic(&img, layout)
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray<P: AsRef<Path>>(path: P) -> SlideResult<OwnedImage> {
    let img = image::open(path).map_err(io_error)?;
    let gray = img.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    OwnedImage::new(gray.into_raw(), width, height)
}

/// Stores encoded image bytes unchanged as `dir/{stem}.{ext}`.
///
/// The extension is taken from the sniffed format (`png`, `jpg`, ...) and
/// falls back to `img` for unrecognized bytes. Returns the written path.
pub fn stash_encoded(dir: &Path, stem: &str, bytes: &[u8]) -> SlideResult<PathBuf> {
    let ext = image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("img");
    let path = dir.join(format!("{stem}.{ext}"));
    std::fs::write(&path, bytes).map_err(|err| SlideError::ImageIo {
        reason: format!("{}: {err}", path.display()),
    })?;
    Ok(path)
}

/// Writes a single-channel image (grayscale or mask).
pub fn save_gray<P: AsRef<Path>>(path: P, img: &OwnedImage) -> SlideResult<()> {
    let buf = image::GrayImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.data().to_vec(),
    )
    .ok_or(SlideError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    buf.save(path).map_err(io_error)
}

/// Writes a color image, converting BGR to RGB on the way out.
pub fn save_color<P: AsRef<Path>>(path: P, img: &ColorImage) -> SlideResult<()> {
    let (width, height) = (img.width() as u32, img.height() as u32);
    let dims = SlideError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    };
    match img.layout() {
        PixelLayout::Rgba8 => image::RgbaImage::from_raw(width, height, img.data().to_vec())
            .ok_or(dims)?
            .save(path)
            .map_err(io_error),
        PixelLayout::Rgb8 => image::RgbImage::from_raw(width, height, img.data().to_vec())
            .ok_or(dims)?
            .save(path)
            .map_err(io_error),
        PixelLayout::Bgr8 => {
            let mut data = img.data().to_vec();
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            image::RgbImage::from_raw(width, height, data)
                .ok_or(dims)?
                .save(path)
                .map_err(io_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{color_from_dynamic, decode_color, stash_encoded};
    use crate::image::PixelLayout;
    use crate::util::SlideError;

    #[test]
    fn bgr_conversion_swaps_red_and_blue() {
        let rgb = image::RgbImage::from_raw(1, 1, vec![10, 20, 30]).unwrap();
        let dynamic = image::DynamicImage::ImageRgb8(rgb);
        let bgr = color_from_dynamic(&dynamic, PixelLayout::Bgr8).unwrap();
        assert_eq!(bgr.data(), &[30, 20, 10]);
        let rgba = color_from_dynamic(&dynamic, PixelLayout::Rgba8).unwrap();
        assert_eq!(rgba.data(), &[10, 20, 30, 255]);
    }

    #[test]
    fn stash_names_files_by_sniffed_format() {
        let dir = std::env::temp_dir().join(format!("slidematch-stash-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let png = png.into_inner();
        let path = stash_encoded(&dir, "shumei-bg", &png).unwrap();
        assert_eq!(path, dir.join("shumei-bg.png"));
        assert_eq!(std::fs::read(&path).unwrap(), png);

        let path = stash_encoded(&dir, "shumei-piece", b"not an image").unwrap();
        assert_eq!(path, dir.join("shumei-piece.img"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stash_into_missing_dir_is_an_io_error() {
        let dir = std::env::temp_dir().join(format!("slidematch-absent-{}", std::process::id()));
        let err = stash_encoded(&dir, "bg", b"bytes").unwrap_err();
        assert!(matches!(err, SlideError::ImageIo { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_decode_failure() {
        let err = decode_color(b"not an image", PixelLayout::Rgba8).unwrap_err();
        assert!(matches!(err, SlideError::DecodeFailure { .. }));
    }
}
