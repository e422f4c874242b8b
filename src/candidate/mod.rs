//! Candidate selection and pruning utilities.
//!
//! Includes Top-K collection and spatial non-maximum suppression, both
//! ranking through the metric's own notion of "best".

pub(crate) mod nms;
pub(crate) mod topk;
