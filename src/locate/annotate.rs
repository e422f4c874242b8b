//! Debug overlay marking a detected gap on the background.

use crate::image::ColorImage;
use crate::locate::MatchResult;

/// Rectangle color (RGB).
pub const MARK_COLOR: [u8; 3] = [255, 0, 0];
/// Rectangle line thickness in pixels.
pub const MARK_THICKNESS: usize = 2;

/// File name of the overlay for the primary (binarized) pass.
#[cfg(feature = "image-io")]
pub const ANNOTATED_FILE: &str = "gap-marked.png";
/// File name of the overlay for the raw cross-check pass.
#[cfg(feature = "image-io")]
pub const ANNOTATED_RAW_FILE: &str = "gap-marked-raw.png";

/// Draws an axis-aligned rectangle outline, clipped to the image.
pub fn draw_rect(
    img: &mut ColorImage,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    color: [u8; 3],
    thickness: usize,
) {
    if width == 0 || height == 0 {
        return;
    }
    let x1 = x + width - 1;
    let y1 = y + height - 1;
    for py in y..=y1 {
        for px in x..=x1 {
            let on_edge = px < x + thickness
                || px + thickness > x1
                || py < y + thickness
                || py + thickness > y1;
            if on_edge {
                img.put_rgb(px, py, color);
            }
        }
    }
}

/// Returns a copy of `background` with the template footprint at `result`
/// outlined.
pub fn annotate(background: &ColorImage, result: &MatchResult, template_size: (usize, usize)) -> ColorImage {
    let mut marked = background.clone();
    draw_rect(
        &mut marked,
        result.location.x.max(0) as usize,
        result.location.y.max(0) as usize,
        template_size.0,
        template_size.1,
        MARK_COLOR,
        MARK_THICKNESS,
    );
    marked
}

/// Writes the overlay to `dir/file_name`.
#[cfg(feature = "image-io")]
pub fn save_annotated(
    dir: &std::path::Path,
    file_name: &str,
    background: &ColorImage,
    result: &MatchResult,
    template_size: (usize, usize),
) -> crate::util::SlideResult<std::path::PathBuf> {
    let path = dir.join(file_name);
    crate::image::io::save_color(&path, &annotate(background, result, template_size))?;
    Ok(path)
}
