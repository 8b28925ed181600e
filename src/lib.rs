//! Convergent - analysis pipeline for a between-subjects AI-assistance experiment
//!
//! This library screens participants on an attention check, tests
//! randomization balance, aggregates per-trial outcomes at the subject level,
//! fits a covariate-adjusted ANOVA (verbal fluency entered before condition)
//! and compares conditions pairwise with Tukey's HSD.
//!
//! ```no_run
//! use convergent::{config::AnalysisConfig, dataset::RawTables, pipeline};
//! use std::path::Path;
//!
//! let raw = RawTables::from_paths(
//!     Path::new("participants.csv"),
//!     Path::new("responses.csv"),
//!     Path::new("fluency.csv"),
//! )?;
//! let report = pipeline::analyze(&raw, &AnalysisConfig::default())?;
//! println!("{}", convergent::report::render_text(&report));
//! # Ok::<(), convergent::error::AnalysisError>(())
//! ```

pub mod aggregate;
pub mod anonymize;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod derived;
pub mod error;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod quality;
pub mod randomization;
pub mod report;
pub mod simulate;

pub use error::{AnalysisError, Result};
