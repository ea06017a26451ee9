//! # FixFit Core
//!
//! Protocol types and the HTTP client for the remote squat-analysis service.
//! This crate knows nothing about cameras or sessions; it turns an encoded
//! frame into an [`AnalysisResult`] or a typed [`AnalysisError`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;

// Re-export main types
pub use analysis::{
    AnalysisRequest, AnalysisResult, ErrorDetails, Feedback, JointAngles, ProcessingInfo,
    SquatPhase,
};
pub use client::{AnalysisService, HttpAnalysisClient, ANALYZE_PATH, HEALTH_PATH, RESET_PATH};
pub use config::{ClientConfig, API_URL_ENV, DEFAULT_API_URL};
pub use error::{AnalysisError, CoreResult, ErrorKind};
