//! The export pipeline.
//!
//! [`Exporter::export_image`] turns a rendered preview into a downloaded
//! file:
//!
//! ```text
//! Idle → Validating → Normalizing → Serializing (svg) ─┐
//!                                 → Rasterizing (png) ─┴→ Downloading → Idle
//! ```
//!
//! Any failure ends the call with the message recorded in [`ExportState`].
//! A PNG whose SVG source cannot be decoded is downloaded as the SVG
//! artifact instead, with a `.svg` extension.

mod error;
mod inline;
mod normalize;
mod state;

pub use error::{ExportError, GENERIC_FAILURE};
pub use inline::{InlineSummary, inline_remote_images};
pub use normalize::{Dimensions, NormalizedDocument, normalize, resolve_dimensions};
pub use state::ExportState;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::dataurl;
use crate::geometry::Size;
use crate::perf;
use crate::platform::{Blob, BoundsProbe, Downloader, ImageFetcher, RasterError, Rasterizer};
use crate::svg::{Element, serialize_document};

/// Class carried by the wrapper element the renderer puts around its SVG.
pub const CONTAINER_CLASS: &str = "svg-container";

/// File name used when the caller gives none.
pub const DEFAULT_FILENAME: &str = "mermaid-chart";

/// Blob type of the serialized vector artifact.
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml;charset=utf-8";

/// Output file format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Tunables of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Space added around the content box on every side, in user units.
    pub padding: f64,
    /// Pixel density of raster output relative to the computed size.
    pub scale: f64,
    /// Size used when neither a content box nor a declared size exists.
    pub fallback_size: Size,
    pub default_filename: String,
    /// Class marking the element that wraps the rendered SVG.
    pub container_class: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            padding: 30.0,
            scale: 2.0,
            fallback_size: Size::new(800.0, 600.0),
            default_filename: DEFAULT_FILENAME.to_string(),
            container_class: CONTAINER_CLASS.to_string(),
        }
    }
}

/// One export call's inputs.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub container: Option<&'a Element>,
    pub format: ExportFormat,
    pub filename: &'a str,
}

impl<'a> ExportRequest<'a> {
    /// Build a request, substituting `default_filename` for a missing or
    /// blank name.
    pub fn new(
        container: Option<&'a Element>,
        format: ExportFormat,
        filename: Option<&'a str>,
        default_filename: &'a str,
    ) -> Self {
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(default_filename);
        Self {
            container,
            format,
            filename,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Validating,
    Normalizing,
    Serializing,
    Rasterizing,
    Downloading,
}

/// Find the rendered SVG inside a preview container: the first descendant
/// carrying `marker_class`, then the first `svg` element inside it.
///
/// # Errors
///
/// [`ExportError::ContentMissing`] without a wrapper and
/// [`ExportError::SvgMissing`] without an `svg` inside it.
pub fn locate_svg<'a>(container: &'a Element, marker_class: &str) -> Result<&'a Element, ExportError> {
    let wrapper = container
        .find_descendant(|el| el.has_class(marker_class))
        .ok_or(ExportError::ContentMissing)?;
    wrapper
        .find_descendant(|el| el.local_name() == "svg")
        .ok_or(ExportError::SvgMissing)
}

/// Wrap a standalone SVG in a synthetic preview container.
pub fn preview_container(svg: Element, marker_class: &str) -> Element {
    Element::new("div").with_child(
        Element::new("div")
            .with_attribute("class", marker_class)
            .with_child(svg),
    )
}

/// Releases an object URL when dropped.
struct ObjectUrl<'a> {
    downloader: &'a dyn Downloader,
    url: String,
}

impl<'a> ObjectUrl<'a> {
    fn create(downloader: &'a dyn Downloader, blob: Blob) -> Self {
        let url = downloader.create_object_url(blob);
        Self { downloader, url }
    }

    fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.downloader.revoke_object_url(&self.url);
    }
}

/// Exports rendered diagrams through injected capabilities.
pub struct Exporter {
    bounds: Arc<dyn BoundsProbe>,
    fetcher: Arc<dyn ImageFetcher>,
    rasterizer: Arc<dyn Rasterizer>,
    downloader: Arc<dyn Downloader>,
    options: ExportOptions,
    state: Arc<ExportState>,
}

impl Exporter {
    pub fn new(
        bounds: Arc<dyn BoundsProbe>,
        fetcher: Arc<dyn ImageFetcher>,
        rasterizer: Arc<dyn Rasterizer>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            bounds,
            fetcher,
            rasterizer,
            downloader,
            options: ExportOptions::default(),
            state: Arc::new(ExportState::new()),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing state handle, e.g. one a UI already observes.
    #[must_use]
    pub fn with_state(mut self, state: Arc<ExportState>) -> Self {
        self.state = state;
        self
    }

    /// Handle to the busy flag and last error.
    pub fn state(&self) -> Arc<ExportState> {
        Arc::clone(&self.state)
    }

    /// Export the diagram rendered inside `container` as `format`, downloaded
    /// as `<filename>.<ext>`.
    ///
    /// Nothing is returned and nothing propagates: the outcome is observable
    /// through [`Exporter::state`] only.
    pub fn export_image(
        &self,
        container: Option<&Element>,
        format: ExportFormat,
        filename: Option<&str>,
    ) {
        let request = ExportRequest::new(container, format, filename, &self.options.default_filename);
        let _busy = self.state.begin();
        let _scope = perf::scope("export.total");

        if let Err(err) = self.run(&request) {
            let message = err.user_message();
            error!(%message, format = %request.format, filename = request.filename, "export failed");
            self.state.fail(message);
        }
    }

    fn run(&self, request: &ExportRequest<'_>) -> Result<(), ExportError> {
        debug!(stage = ?Stage::Validating, format = %request.format);
        let container = request.container.ok_or(ExportError::PreviewMissing)?;
        let svg = locate_svg(container, &self.options.container_class)?;

        debug!(stage = ?Stage::Normalizing);
        let mut document = {
            let _scope = perf::scope("export.normalize");
            let bounds = self.bounds.content_bounds(svg);
            debug!(?bounds, "content bounds");
            normalize(svg, bounds, &self.options)
        };
        {
            let _scope = perf::scope("export.inline_images");
            inline_remote_images(&mut document, self.fetcher.as_ref());
        }

        let svg_data = serialize_document(document.root());
        let size = document.size();
        drop(document);
        let object_url = ObjectUrl::create(
            self.downloader.as_ref(),
            Blob::new(svg_data.as_bytes(), SVG_MEDIA_TYPE),
        );

        let (href, resolved) = match request.format {
            ExportFormat::Svg => {
                debug!(stage = ?Stage::Serializing);
                (object_url.as_str().to_string(), ExportFormat::Svg)
            }
            ExportFormat::Png => {
                debug!(stage = ?Stage::Rasterizing);
                let _scope = perf::scope("export.rasterize");
                self.rasterize_or_fallback(&svg_data, size, &object_url)?
            }
        };

        debug!(stage = ?Stage::Downloading, format = %resolved);
        let filename = format!("{}.{}", request.filename, resolved.extension());
        self.downloader.trigger(&filename, &href)?;
        Ok(())
    }

    /// Rasterize the serialized SVG. A decode failure yields the vector
    /// artifact instead; other raster failures are errors.
    fn rasterize_or_fallback(
        &self,
        svg_data: &str,
        size: Size,
        object_url: &ObjectUrl<'_>,
    ) -> Result<(String, ExportFormat), ExportError> {
        // Embedded rather than an object URL so the image loads without
        // cross-origin restrictions.
        let source = dataurl::encode(SVG_MEDIA_TYPE, svg_data.as_bytes());
        match self.rasterizer.rasterize(&source, size, self.options.scale) {
            Ok(png) => Ok((png, ExportFormat::Png)),
            Err(RasterError::Decode(reason)) => {
                warn!(%reason, "PNG export failed, falling back to SVG");
                Ok((object_url.as_str().to_string(), ExportFormat::Svg))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(inner: Element) -> Element {
        Element::new("main").with_child(inner)
    }

    #[test]
    fn test_locate_svg_finds_nested_graphic() {
        let container = preview(
            Element::new("div").with_child(
                Element::new("div")
                    .with_attribute("class", "svg-container zoomed")
                    .with_child(Element::new("p"))
                    .with_child(Element::new("svg").with_attribute("id", "chart")),
            ),
        );
        let svg = locate_svg(&container, CONTAINER_CLASS).unwrap();
        assert_eq!(svg.attribute("id"), Some("chart"));
    }

    #[test]
    fn test_locate_svg_ignores_container_own_class() {
        let container = Element::new("div")
            .with_attribute("class", CONTAINER_CLASS)
            .with_child(Element::new("svg"));
        assert!(matches!(
            locate_svg(&container, CONTAINER_CLASS),
            Err(ExportError::ContentMissing)
        ));
    }

    #[test]
    fn test_locate_svg_requires_graphic_inside_wrapper() {
        let container = preview(Element::new("div").with_attribute("class", CONTAINER_CLASS))
            .with_child(Element::new("svg"));
        assert!(matches!(
            locate_svg(&container, CONTAINER_CLASS),
            Err(ExportError::SvgMissing)
        ));
    }

    #[test]
    fn test_preview_container_round_trips_through_locate() {
        let container = preview_container(Element::new("svg").with_attribute("id", "x"), "wrap");
        assert_eq!(locate_svg(&container, "wrap").unwrap().attribute("id"), Some("x"));
    }

    #[test]
    fn test_request_defaults_blank_filename() {
        let request = ExportRequest::new(None, ExportFormat::Svg, Some("  "), DEFAULT_FILENAME);
        assert_eq!(request.filename, "mermaid-chart");
        let request = ExportRequest::new(None, ExportFormat::Svg, None, DEFAULT_FILENAME);
        assert_eq!(request.filename, "mermaid-chart");
        let request = ExportRequest::new(None, ExportFormat::Svg, Some("flow"), DEFAULT_FILENAME);
        assert_eq!(request.filename, "flow");
    }

    #[test]
    fn test_format_parse_and_extension() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("svg".parse::<ExportFormat>().unwrap().extension(), "svg");
        assert!("jpg".parse::<ExportFormat>().is_err());
    }
}
