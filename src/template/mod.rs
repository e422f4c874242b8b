//! Template storage and per-metric precomputation.

use crate::image::{ImageView, OwnedImage};
use crate::util::SlideResult;

mod plan;

pub use plan::{SqDiffPlan, ZnccPlan};

/// Owned grayscale template (the cropped puzzle piece).
#[derive(Clone, Debug)]
pub struct Template {
    img: OwnedImage,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> SlideResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img })
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }
}

impl From<OwnedImage> for Template {
    fn from(img: OwnedImage) -> Self {
        Self { img }
    }
}
