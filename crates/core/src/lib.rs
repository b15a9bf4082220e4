//! Core library for figdoc
//!
//! This crate implements the **Functional Core** of the figdoc service,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`figdoc_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: PDF composition from a list of layout blocks
//! - **`figdoc`**: HTTP server, Figma client, rasterization and orchestration (the Imperative Shell)
//!
//! Every function here takes plain data and returns plain data. Time and
//! randomness are passed in, so a given input always yields the same output.
//!
//! # Module Organization
//!
//! - [`figma`]: Link parsing and Figma file payload transformation
//! - [`project`]: The [`project::ProjectData`] model and uploaded report merging
//! - [`architecture`]: Architecture facts and complexity heuristics
//! - [`diagram`]: Deterministic layered layout and SVG rendering of the facts
//! - [`report`]: Report outline, request identifiers and output file names
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use figdoc_core::figma::{parse_project, FigmaFile};
//! use figdoc_core::diagram::project_svg;
//!
//! let file: FigmaFile = serde_json::from_str(payload)?;
//! let project = parse_project(file, link, "abc123");
//! let svg = project_svg(&project);
//! ```

pub mod architecture;
pub mod diagram;
pub mod figma;
pub mod project;
pub mod report;
