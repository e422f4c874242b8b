//! Normalizes downloaded captcha images into matchable forms.
//!
//! The piece is cropped to its opaque content and converted to grayscale to
//! serve as the template; the background is binarized and denoised so the
//! gap silhouette stands out.

use crate::geometry::BoundingBox;
use crate::image::{ColorImage, OwnedImage, PixelLayout, MASK_ON};
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{SlideError, SlideResult};

mod morphology;
mod region;
mod threshold;

pub use morphology::{dilate_3x3, erode_3x3, open_3x3};
pub use region::{find_regions, largest_region, Region};
pub use threshold::{otsu_threshold, threshold_binary_inv};

/// Matchable forms of one background/piece pair.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    /// Binarized, denoised background (values in {0, 255}).
    pub background: OwnedImage,
    /// Grayscale template cut from the piece's opaque content.
    pub template: Template,
    /// Cropped piece in its original layout.
    pub piece: ColorImage,
    /// Where the crop was taken inside the original piece image.
    pub piece_bbox: BoundingBox,
}

/// Builds a binary mask of the pixels whose alpha is non-zero.
pub fn opaque_mask(image: &ColorImage) -> SlideResult<OwnedImage> {
    let alpha = image.alpha()?;
    let data = alpha
        .data()
        .iter()
        .map(|&a| if a == 0 { 0 } else { MASK_ON })
        .collect();
    OwnedImage::new(data, alpha.width(), alpha.height())
}

/// Returns the bounding box of the largest opaque region of an RGBA image.
pub fn content_bbox(image: &ColorImage) -> SlideResult<BoundingBox> {
    let mask = opaque_mask(image)?;
    let regions = find_regions(&mask);
    trace_event!("piece_regions", count = regions.len());
    largest_region(&regions)
        .map(|r| r.bbox)
        .ok_or(SlideError::NoForegroundRegionFound)
}

/// Crops an RGBA image to the bounding box of its largest opaque region.
///
/// Fails with [`SlideError::NoForegroundRegionFound`] for fully transparent
/// input and [`SlideError::ChannelMismatch`] for images without alpha.
pub fn crop_to_content(image: &ColorImage) -> SlideResult<ColorImage> {
    let bbox = content_bbox(image)?;
    image.crop(bbox)
}

/// Grayscale, inverse Otsu threshold, then a 3x3 opening.
pub fn binarize_background(image: &ColorImage) -> OwnedImage {
    let gray = image.to_gray();
    let t = otsu_threshold(gray.view());
    trace_event!("otsu_threshold", threshold = t);
    open_3x3(&threshold_binary_inv(gray.view(), t))
}

/// Runs both preprocessing steps on a background/piece pair.
pub fn preprocess(background: &ColorImage, piece: &ColorImage) -> SlideResult<Preprocessed> {
    let _span = trace_span!(
        "preprocess",
        bg_width = background.width(),
        bg_height = background.height()
    )
    .entered();

    if piece.layout() != PixelLayout::Rgba8 {
        return Err(SlideError::ChannelMismatch {
            expected: 4,
            got: piece.channels(),
        });
    }
    let piece_bbox = content_bbox(piece)?;
    let cropped = piece.crop(piece_bbox)?;
    let template = Template::from(cropped.to_gray());
    let background = binarize_background(background);
    trace_event!(
        "piece_cropped",
        x = piece_bbox.x(),
        y = piece_bbox.y(),
        width = piece_bbox.width(),
        height = piece_bbox.height()
    );

    Ok(Preprocessed {
        background,
        template,
        piece: cropped,
        piece_bbox,
    })
}

#[cfg(test)]
mod tests {
    use super::{binarize_background, crop_to_content, preprocess};
    use crate::image::{ColorImage, PixelLayout};
    use crate::util::SlideError;

    fn canvas_with_rect(x0: usize, y0: usize, w: usize, h: usize) -> ColorImage {
        let mut img = ColorImage::filled(40, 30, PixelLayout::Rgba8, &[0, 0, 0, 0]).unwrap();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, &[200, 100, 50, 255]);
            }
        }
        img
    }

    #[test]
    fn crop_returns_exact_rectangle() {
        let img = canvas_with_rect(7, 5, 12, 9);
        let cropped = crop_to_content(&img).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (12, 9));
        assert!(cropped.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn crop_prefers_largest_region() {
        let mut img = canvas_with_rect(20, 10, 10, 10);
        img.put_pixel(1, 1, &[1, 1, 1, 255]);
        let cropped = crop_to_content(&img).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
    }

    #[test]
    fn transparent_canvas_has_no_foreground() {
        let img = ColorImage::filled(8, 8, PixelLayout::Rgba8, &[9, 9, 9, 0]).unwrap();
        assert_eq!(
            crop_to_content(&img).unwrap_err(),
            SlideError::NoForegroundRegionFound
        );
    }

    #[test]
    fn preprocess_rejects_opaque_piece() {
        let bg = ColorImage::filled(8, 8, PixelLayout::Bgr8, &[0, 0, 0]).unwrap();
        let err = preprocess(&bg, &bg).unwrap_err();
        assert_eq!(
            err,
            SlideError::ChannelMismatch {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn binarized_background_marks_dark_gap() {
        let mut bg = ColorImage::filled(30, 20, PixelLayout::Bgr8, &[220, 220, 220]).unwrap();
        for y in 5..15 {
            for x in 10..20 {
                bg.put_rgb(x, y, [30, 30, 30]);
            }
        }
        bg.put_rgb(0, 0, [30, 30, 30]);
        let mask = binarize_background(&bg);
        assert!(mask.is_binary());
        assert_eq!(mask.get(15, 10), Some(255));
        assert_eq!(mask.get(25, 10), Some(0));
        assert_eq!(mask.get(0, 0), Some(0), "speckle must not survive opening");
    }
}
