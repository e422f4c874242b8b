//! Captcha vendor profiles and their registry.
//!
//! A vendor only describes where things live on the page and how the
//! displayed images are scaled. The algorithms are shared and composed by
//! the solver; a vendor never overrides them.

use crate::util::{SlideError, SlideResult};
use std::collections::BTreeMap;

/// Page geometry of one slider-captcha vendor.
pub trait CaptchaVendor: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;
    /// Selector of the background image element (its `src` is downloaded).
    fn background_selector(&self) -> &str;
    /// Selector of the piece image element.
    fn piece_selector(&self) -> &str;
    /// Selector of the element the pointer grabs to drag the piece.
    fn handle_selector(&self) -> &str {
        self.piece_selector()
    }
    /// Selector (CSS or XPath) that becomes visible once the captcha is passed.
    fn success_selector(&self) -> &str;
    /// Displayed size divided by the natural image size.
    fn scale_factor(&self) -> f64;
}

/// Shumei slider captcha, rendered at half its image resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShumeiVendor;

impl CaptchaVendor for ShumeiVendor {
    fn name(&self) -> &str {
        "shumei"
    }

    fn background_selector(&self) -> &str {
        ".shumei_captcha_loaded_img_bg"
    }

    fn piece_selector(&self) -> &str {
        ".shumei_captcha_loaded_img_fg"
    }

    /// The "验证成功" (verified) banner, matched by its text.
    fn success_selector(&self) -> &str {
        r#"//*[text()="验证成功"]"#
    }

    fn scale_factor(&self) -> f64 {
        0.5
    }
}

/// Name-keyed set of vendor profiles.
#[derive(Default)]
pub struct VendorRegistry {
    vendors: BTreeMap<String, Box<dyn CaptchaVendor>>,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in vendor.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ShumeiVendor));
        registry
    }

    /// Adds or replaces a vendor under its own name.
    pub fn register(&mut self, vendor: Box<dyn CaptchaVendor>) {
        self.vendors.insert(vendor.name().to_string(), vendor);
    }

    pub fn get(&self, name: &str) -> SlideResult<&dyn CaptchaVendor> {
        self.vendors
            .get(name)
            .map(|v| v.as_ref())
            .ok_or_else(|| SlideError::UnknownVendor(name.to_string()))
    }

    /// Removes and returns a vendor, for handing ownership to a solve loop.
    pub fn take(&mut self, name: &str) -> SlideResult<Box<dyn CaptchaVendor>> {
        self.vendors
            .remove(name)
            .ok_or_else(|| SlideError::UnknownVendor(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vendors.keys().map(String::as_str)
    }
}
