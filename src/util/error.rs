//! Error types for slidematch.

use thiserror::Error;

/// Result alias for slidematch operations.
pub type SlideResult<T> = std::result::Result<T, SlideError>;

/// Errors that can occur while solving a slider captcha.
///
/// Variants up to `TrajectoryTooLong` are local to a single attempt; the
/// attempt loop logs them and moves on. See [`SlideError::is_fatal`] for the
/// variants that end a whole session.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SlideError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Region of interest does not fit inside the image.
    #[error(
        "roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Image has the wrong pixel layout for the operation.
    #[error("expected {expected}-channel image, got {got} channels")]
    ChannelMismatch { expected: usize, got: usize },
    /// Fetching an image over the network failed.
    #[error("download of {url} failed: {reason}")]
    DownloadFailure { url: String, reason: String },
    /// Image bytes could not be decoded.
    #[error("decode failed: {reason}")]
    DecodeFailure { reason: String },
    /// Reading or writing an image file failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
    /// The piece image has no opaque pixel at all.
    #[error("no foreground region found in piece image")]
    NoForegroundRegionFound,
    /// The template cannot be placed anywhere inside the search image.
    #[error(
        "no valid match window for {tpl_width}x{tpl_height} template in {img_width}x{img_height} image"
    )]
    NoValidMatchWindow {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Template statistics make the metric undefined.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// Trajectory integration did not terminate within the step budget.
    #[error("trajectory exceeded {max_steps} steps")]
    TrajectoryTooLong { max_steps: usize },
    /// A collaborator call timed out after its retries.
    #[error("automation timed out during {action} after {attempts} tries")]
    AutomationTimeout { action: String, attempts: u32 },
    /// A collaborator call failed for a reason other than a timeout.
    #[error("automation failed: {reason}")]
    Automation { reason: String },
    /// The automation session reported that it is disconnected.
    #[error("automation session is closed")]
    SessionClosed,
    /// No vendor is registered under the requested name.
    #[error("unknown captcha vendor: {0}")]
    UnknownVendor(String),
    /// Configuration values are inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

impl SlideError {
    /// Returns true when the error invalidates the whole session rather than
    /// a single attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SlideError::SessionClosed | SlideError::UnknownVendor(_) | SlideError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::SlideError;

    #[test]
    fn only_session_errors_are_fatal() {
        assert!(SlideError::SessionClosed.is_fatal());
        assert!(SlideError::UnknownVendor("acme".into()).is_fatal());
        assert!(SlideError::InvalidConfig("max_attempts").is_fatal());
        assert!(!SlideError::NoForegroundRegionFound.is_fatal());
        assert!(!SlideError::DownloadFailure {
            url: "http://example.invalid/bg.png".into(),
            reason: "refused".into(),
        }
        .is_fatal());
        assert!(!SlideError::AutomationTimeout {
            action: "bounding_box".into(),
            attempts: 3,
        }
        .is_fatal());
    }
}
