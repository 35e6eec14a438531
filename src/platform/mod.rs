//! Capabilities the export pipeline depends on, with native implementations.
//!
//! Each browser facility the pipeline needs is a trait so the decision logic
//! can be driven by test doubles:
//! - [`BoundsProbe`]: content bounding box of a graphic ([`UsvgBounds`])
//! - [`ImageFetcher`]: remote image download ([`HttpFetcher`])
//! - [`Rasterizer`]: SVG to PNG on an offscreen surface ([`ResvgRasterizer`])
//! - [`Downloader`]: object URLs and the download trigger ([`FileDownloader`])

mod bounds;
mod download;
mod fetch;
mod raster;

pub use bounds::{BoundsProbe, UsvgBounds};
pub use download::{Blob, DownloadError, Downloader, FileDownloader};
pub use fetch::{FetchError, FetchedImage, HttpFetcher, ImageFetcher};
pub use raster::{RasterError, Rasterizer, ResvgRasterizer};

use std::sync::Arc;

use resvg::usvg::fontdb;

/// Load the system font database once so probing and rasterizing share it.
pub fn system_fonts() -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}
