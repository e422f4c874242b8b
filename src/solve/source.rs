//! Image source that downloads the challenge referenced by the page.

use crate::driver::{with_retries, Automation, CaptchaImages, Downloader, ImageSource, WaitOptions};
use crate::image::io::{decode_color, stash_encoded};
use crate::image::PixelLayout;
use crate::trace::{trace_event, trace_warn};
use crate::util::{SlideError, SlideResult};
use crate::vendor::CaptchaVendor;
use std::path::PathBuf;

/// Reads the `src` attribute of the vendor's image elements and downloads
/// both images.
///
/// With a work directory the raw bytes are also stored there as
/// `{vendor}-bg.{ext}` and `{vendor}-piece.{ext}`.
pub struct DownloadingSource<D> {
    downloader: D,
    work_dir: Option<PathBuf>,
}

impl<D: Downloader> DownloadingSource<D> {
    pub fn new(downloader: D) -> Self {
        Self {
            downloader,
            work_dir: None,
        }
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    fn image_bytes(
        &mut self,
        automation: &mut dyn Automation,
        selector: &str,
        wait: &WaitOptions,
    ) -> SlideResult<Vec<u8>> {
        let src = with_retries("attribute", wait, || automation.attribute(selector, "src", wait))?
            .filter(|src| !src.is_empty())
            .ok_or_else(|| SlideError::Automation {
                reason: format!("element {selector} has no src attribute"),
            })?;
        self.downloader.download(&src)
    }

    fn store(&self, stem: String, bytes: &[u8]) {
        let Some(dir) = self.work_dir.as_ref() else {
            return;
        };
        if let Err(err) = stash_encoded(dir, &stem, bytes) {
            trace_warn!("work_file_failed", stem = stem, error = err);
        }
    }
}

impl<D: Downloader> ImageSource for DownloadingSource<D> {
    fn fetch(
        &mut self,
        automation: &mut dyn Automation,
        vendor: &dyn CaptchaVendor,
        wait: &WaitOptions,
        attempt: usize,
    ) -> SlideResult<CaptchaImages> {
        let bg_bytes = self.image_bytes(automation, vendor.background_selector(), wait)?;
        let piece_bytes = self.image_bytes(automation, vendor.piece_selector(), wait)?;
        self.store(format!("{}-bg", vendor.name()), &bg_bytes);
        self.store(format!("{}-piece", vendor.name()), &piece_bytes);
        trace_event!(
            "images_fetched",
            attempt = attempt,
            bg_bytes = bg_bytes.len(),
            piece_bytes = piece_bytes.len()
        );

        Ok(CaptchaImages {
            background: decode_color(&bg_bytes, PixelLayout::Bgr8)?,
            piece: decode_color(&piece_bytes, PixelLayout::Rgba8)?,
        })
    }
}
