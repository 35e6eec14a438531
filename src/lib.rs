// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. export::ExportError)
    clippy::module_name_repetitions
)]

//! # mermaid-export
//!
//! Export rendered diagram previews to self-contained image files.
//!
//! Given a preview container holding a rendered diagram, mermaid-export:
//! - Locates the SVG inside the renderer's `svg-container` wrapper
//! - Sizes it from its content bounding box (with padding), falling back
//!   to declared dimensions
//! - Inlines remote images so the file has no external references
//! - Writes SVG directly, or rasterizes to PNG at 2× on a white background,
//!   falling back to SVG when the image cannot be decoded
//!
//! ## Architecture
//!
//! The pipeline works on immutable element trees and reaches the outside
//! world only through capability traits, so every decision can be tested
//! with doubles:
//! - **Tree**: [`svg::Element`], parsed from and serialized to markup
//! - **Pipeline**: [`export::Exporter`] and its pure helpers
//! - **Capabilities**: [`platform`] traits with native implementations
//!
//! ## Modules
//!
//! - [`export`]: Export pipeline, state, and errors
//! - [`platform`]: Bounds, fetch, raster, and download capabilities
//! - [`svg`]: Element trees
//! - [`geometry`]: Sizes, boxes, and `viewBox` values
//! - [`dataurl`]: `data:` URL encoding
//! - [`config`]: Saved default flags
//! - [`perf`]: Stage timing

pub mod config;
pub mod dataurl;
pub mod export;
pub mod geometry;
pub mod perf;
pub mod platform;
pub mod svg;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::export::{ExportFormat, ExportOptions, ExportState, Exporter};
    pub use crate::platform::{FileDownloader, HttpFetcher, ResvgRasterizer, UsvgBounds};
    pub use crate::svg::{Element, parse_document};
}
