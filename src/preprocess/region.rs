//! Connected foreground regions of a binary mask.

use crate::geometry::{BoundingBox, Point};
use crate::image::OwnedImage;

/// One 8-connected foreground region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Smallest box containing every pixel of the region.
    pub bbox: BoundingBox,
    /// Number of foreground pixels.
    pub area: usize,
    /// First pixel met in raster order; identifies the region.
    pub seed: Point,
}

/// Finds all 8-connected regions of non-zero pixels.
///
/// Regions are returned in raster order of their first pixel, which is the
/// order a border-following contour finder discovers outer boundaries.
pub fn find_regions(mask: &OwnedImage) -> Vec<Region> {
    let width = mask.width();
    let height = mask.height();
    let data = mask.data();
    let mut visited = vec![false; data.len()];
    let mut stack = Vec::new();
    let mut regions = Vec::new();

    for start in 0..data.len() {
        if data[start] == 0 || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);

        let (sx, sy) = (start % width, start / width);
        let (mut x0, mut y0, mut x1, mut y1) = (sx, sy, sx, sy);
        let mut area = 0usize;

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            area += 1;
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);

            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let n = ny * width + nx;
                    if data[n] != 0 && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        regions.push(Region {
            bbox: BoundingBox::from_corners(x0, y0, x1, y1),
            area,
            seed: Point::new(sx as i32, sy as i32),
        });
    }

    regions
}

/// Picks the region with the largest area; ties keep the earliest region.
pub fn largest_region(regions: &[Region]) -> Option<Region> {
    regions
        .iter()
        .copied()
        .reduce(|best, r| if r.area > best.area { r } else { best })
}

#[cfg(test)]
mod tests {
    use super::{find_regions, largest_region};
    use crate::geometry::Point;
    use crate::image::OwnedImage;

    fn mask_from(rows: &[&str]) -> OwnedImage {
        let width = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        OwnedImage::new(data, width, rows.len()).unwrap()
    }

    #[test]
    fn diagonal_pixels_join_one_region() {
        let mask = mask_from(&["#...", ".#..", "..#.", "...."]);
        let regions = find_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
        assert_eq!(regions[0].bbox.width(), 3);
        assert_eq!(regions[0].bbox.height(), 3);
    }

    #[test]
    fn regions_are_reported_in_raster_order() {
        let mask = mask_from(&[
            "...##", //
            "#..##", //
            "#....", //
            "#....", //
        ]);
        let regions = find_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].seed, Point::new(3, 0));
        assert_eq!(regions[1].seed, Point::new(0, 1));
        assert_eq!(largest_region(&regions).unwrap().seed, Point::new(3, 0));
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = OwnedImage::filled(5, 5, 0).unwrap();
        assert!(find_regions(&mask).is_empty());
        assert!(largest_region(&[]).is_none());
    }
}
