//! Content bounding boxes.

use std::sync::Arc;

use resvg::usvg;
use resvg::usvg::fontdb;

use crate::geometry::BBox;
use crate::svg::{self, Element};

/// Computes the content bounding box of a graphic, in its own user units.
pub trait BoundsProbe: Send + Sync {
    /// Returns `None` when no box can be computed.
    fn content_bounds(&self, svg: &Element) -> Option<BBox>;
}

/// Bounding boxes measured by building a `usvg` tree of the graphic.
///
/// The root sizing attributes are stripped before measuring so no `viewBox`
/// transform applies and the box comes out in the graphic's user space.
#[derive(Debug, Clone)]
pub struct UsvgBounds {
    fontdb: Arc<fontdb::Database>,
}

impl UsvgBounds {
    pub const fn new(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl BoundsProbe for UsvgBounds {
    fn content_bounds(&self, svg: &Element) -> Option<BBox> {
        let mut probe = svg.clone();
        probe.remove_attribute("viewBox");
        probe.remove_attribute("width");
        probe.remove_attribute("height");
        probe.set_attribute("xmlns", svg::SVG_NAMESPACE);
        if probe.uses_prefix("xlink") && !probe.has_attribute("xmlns:xlink") {
            probe.set_attribute("xmlns:xlink", svg::XLINK_NAMESPACE);
        }
        probe.for_each_element_mut(&mut cover_foreign_object);

        let markup = svg::serialize(&probe);
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = match usvg::Tree::from_str(&markup, &options) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!(%err, "could not measure SVG bounding box");
                return None;
            }
        };

        let root = tree.root();
        if root.children().is_empty() {
            return None;
        }
        let rect = root.abs_bounding_box();
        let bbox = BBox::new(
            f64::from(rect.x()),
            f64::from(rect.y()),
            f64::from(rect.width()),
            f64::from(rect.height()),
        );
        bbox.is_drawable().then_some(bbox)
    }
}

/// usvg skips `foreignObject`, which holds the HTML labels of most
/// diagrams. Swap it for an invisible rect over the same region so the
/// labels still count toward the box.
fn cover_foreign_object(element: &mut Element) {
    if element.local_name() != "foreignObject" {
        return;
    }
    let name = match element.name().split_once(':') {
        Some((prefix, _)) => format!("{prefix}:rect"),
        None => "rect".to_string(),
    };
    let mut cover = Element::new(name).with_attribute("fill-opacity", "0");
    for attribute in ["x", "y", "width", "height", "transform"] {
        if let Some(value) = element.attribute(attribute) {
            cover.set_attribute(attribute, value);
        }
    }
    *element = cover;
}
