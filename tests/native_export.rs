//! End-to-end exports through the native backends.

use std::sync::Arc;

use resvg::usvg::fontdb;
use url::Url;

use mermaid_export::export::{ExportFormat, Exporter};
use mermaid_export::platform::{
    FetchError, FetchedImage, FileDownloader, ImageFetcher, ResvgRasterizer, UsvgBounds,
};
use mermaid_export::svg::parse_document;

const PREVIEW: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
  <body>
    <div id="preview">
      <div class="svg-container">
        <svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="100%" style="max-width: 300px;">
          <rect x="10" y="20" width="100" height="50" fill="#336699"/>
          <image xlink:href="https://example.invalid/logo.png" x="10" y="20" width="4" height="4"/>
        </svg>
      </div>
    </div>
  </body>
</html>"##;

/// Offline stand-in for the network.
struct Offline;

impl ImageFetcher for Offline {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        Err(FetchError::Request {
            url: url.to_string(),
            detail: "offline".to_string(),
        })
    }
}

fn exporter(out_dir: &std::path::Path) -> (Exporter, Arc<FileDownloader>) {
    let fonts = Arc::new(fontdb::Database::new());
    let downloader = Arc::new(FileDownloader::new(out_dir));
    let exporter = Exporter::new(
        Arc::new(UsvgBounds::new(Arc::clone(&fonts))),
        Arc::new(Offline),
        Arc::new(ResvgRasterizer::new(fonts)),
        downloader.clone(),
    );
    (exporter, downloader)
}

#[test]
fn test_png_export_writes_double_density_png() {
    let dir = tempfile::tempdir().unwrap();
    let (exporter, downloader) = exporter(dir.path());
    let preview = parse_document(PREVIEW).unwrap();

    exporter.export_image(Some(&preview), ExportFormat::Png, Some("chart"));
    assert_eq!(exporter.state().export_error(), None);

    let path = dir.path().join("chart.png");
    assert_eq!(downloader.saved(), vec![path.clone()]);
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));

    // The unreachable image draws nothing, so only the rect is measured:
    // 100x50 plus 30 padding on each side, doubled.
    let png = image::load_from_memory(&bytes).unwrap();
    assert_eq!((png.width(), png.height()), (320, 220));
    assert_eq!(downloader.live_object_urls(), 0);
}

#[test]
fn test_svg_export_writes_normalized_document() {
    let dir = tempfile::tempdir().unwrap();
    let (exporter, downloader) = exporter(dir.path());
    let preview = parse_document(PREVIEW).unwrap();

    exporter.export_image(Some(&preview), ExportFormat::Svg, None);
    assert_eq!(exporter.state().export_error(), None);

    let path = dir.path().join("mermaid-chart.svg");
    assert_eq!(downloader.saved(), vec![path.clone()]);
    let svg = parse_document(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(svg.attribute("width"), Some("160"));
    assert_eq!(svg.attribute("height"), Some("110"));
    assert_eq!(svg.attribute("viewBox"), Some("-40 -50 160 110"));
    let image = svg.find_descendant(|el| el.local_name() == "image").unwrap();
    assert_eq!(
        image.attribute("xlink:href"),
        Some("https://example.invalid/logo.png")
    );
    assert_eq!(downloader.live_object_urls(), 0);
}
