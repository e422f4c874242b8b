use slidematch::preprocess::{binarize_background, crop_to_content, preprocess};
use slidematch::{BoundingBox, ColorImage, PixelLayout, SlideError};

fn transparent(width: usize, height: usize) -> ColorImage {
    ColorImage::filled(width, height, PixelLayout::Rgba8, &[0, 0, 0, 0]).unwrap()
}

fn textured(width: usize, height: usize) -> ColorImage {
    let mut img = ColorImage::filled(width, height, PixelLayout::Bgr8, &[0, 0, 0]).unwrap();
    for y in 0..height {
        for x in 0..width {
            let v = 150 + ((x * 5 + y * 11) % 90) as u8;
            img.put_rgb(x, y, [v, v, v]);
        }
    }
    img
}

#[test]
fn crop_keeps_largest_opaque_region() {
    let mut piece = transparent(20, 10);
    for y in 2..6 {
        for x in 5..12 {
            piece.put_pixel(x, y, &[90, 120, 150, 255]);
        }
    }
    piece.put_pixel(18, 9, &[1, 1, 1, 255]);

    let cropped = crop_to_content(&piece).unwrap();
    assert_eq!((cropped.width(), cropped.height()), (7, 4));
    assert_eq!(cropped.layout(), PixelLayout::Rgba8);
    assert_eq!(cropped.pixel(0, 0), Some(&[90u8, 120, 150, 255][..]));
    assert_eq!(cropped.pixel(6, 3), Some(&[90u8, 120, 150, 255][..]));
}

#[test]
fn crop_spans_irregular_shape() {
    let mut piece = transparent(16, 16);
    for (x, y) in [(3, 4), (4, 5), (5, 6), (6, 6), (7, 5), (8, 9)] {
        piece.put_pixel(x, y, &[10, 10, 10, 200]);
    }
    let prepared = preprocess(&textured(40, 20), &piece).unwrap();
    // (8, 9) is not 8-connected to the rest.
    assert_eq!(prepared.piece_bbox, BoundingBox::new(3, 4, 5, 3).unwrap());
    assert_eq!(prepared.template.width(), 5);
    assert_eq!(prepared.template.height(), 3);
}

#[test]
fn fully_transparent_piece_is_rejected() {
    assert_eq!(
        crop_to_content(&transparent(8, 8)).unwrap_err(),
        SlideError::NoForegroundRegionFound
    );
}

#[test]
fn opaque_layout_piece_is_rejected() {
    let piece = ColorImage::filled(8, 8, PixelLayout::Rgb8, &[1, 2, 3]).unwrap();
    assert_eq!(
        preprocess(&textured(20, 20), &piece).unwrap_err(),
        SlideError::ChannelMismatch {
            expected: 4,
            got: 3
        }
    );
}

#[test]
fn binarization_marks_dark_gap_and_drops_specks() {
    let mut bg = textured(48, 32);
    for y in 10..18 {
        for x in 20..28 {
            bg.put_rgb(x, y, [40, 40, 40]);
        }
    }
    bg.put_rgb(5, 5, [30, 30, 30]);

    let mask = binarize_background(&bg);
    assert!(mask.is_binary());
    for y in 0..32 {
        for x in 0..48 {
            let inside = (20..28).contains(&x) && (10..18).contains(&y);
            let expected = if inside { 255 } else { 0 };
            assert_eq!(mask.get(x, y), Some(expected), "pixel ({x}, {y})");
        }
    }
}
