//! Detached, self-describing copies of a rendered graphic.
//!
//! Renderers often emit SVGs whose declared size does not match the drawn
//! content, or no size at all. Normalization produces a new tree with an
//! explicit namespace, explicit `width`/`height`, and a `viewBox` fitted to
//! the content when its bounding box is known.

use crate::geometry::{BBox, Size, ViewBox, format_number, parse_length};
use crate::svg::{self, Element};

use super::ExportOptions;

/// A normalized copy of the graphic, owned by one export call.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    root: Element,
    size: Size,
}

impl NormalizedDocument {
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// The width and height written onto the root.
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The root's `viewBox`, if it has a parseable one.
    pub fn view_box(&self) -> Option<ViewBox> {
        self.root.attribute("viewBox")?.parse().ok()
    }

    pub(crate) const fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }
}

/// Output size, plus a replacement `viewBox` when one was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub size: Size,
    pub view_box: Option<ViewBox>,
}

/// Work out the exported size of `source`.
///
/// A drawable content box wins: it is padded on every side and the
/// `viewBox` origin is shifted so the padded box frames the content.
/// Otherwise each of width and height comes from the declared attribute,
/// then the declared `viewBox`, then the configured fallback, and the
/// source `viewBox` is left alone.
pub fn resolve_dimensions(
    source: &Element,
    bounds: Option<BBox>,
    options: &ExportOptions,
) -> Dimensions {
    if let Some(bbox) = bounds.filter(BBox::is_drawable) {
        let padding = options.padding;
        let width = 2.0f64.mul_add(padding, bbox.width);
        let height = 2.0f64.mul_add(padding, bbox.height);
        return Dimensions {
            size: Size::new(width, height),
            view_box: Some(ViewBox::new(
                -bbox.x - padding,
                -bbox.y - padding,
                width,
                height,
            )),
        };
    }

    let declared_view_box = source
        .attribute("viewBox")
        .and_then(|value| value.parse::<ViewBox>().ok())
        .filter(|vb| vb.width > 0.0 && vb.height > 0.0);
    let width = source
        .attribute("width")
        .and_then(parse_length)
        .or_else(|| declared_view_box.map(|vb| vb.width))
        .unwrap_or(options.fallback_size.width);
    let height = source
        .attribute("height")
        .and_then(parse_length)
        .or_else(|| declared_view_box.map(|vb| vb.height))
        .unwrap_or(options.fallback_size.height);

    Dimensions {
        size: Size::new(width, height),
        view_box: None,
    }
}

/// Produce the normalized copy of `source`. `source` itself is untouched.
pub fn normalize(
    source: &Element,
    bounds: Option<BBox>,
    options: &ExportOptions,
) -> NormalizedDocument {
    let dimensions = resolve_dimensions(source, bounds, options);
    let mut root = source.clone();

    root.set_attribute("xmlns", svg::SVG_NAMESPACE);
    if root.uses_prefix("xlink") && !root.has_attribute("xmlns:xlink") {
        root.set_attribute("xmlns:xlink", svg::XLINK_NAMESPACE);
    }

    if let Some(view_box) = dimensions.view_box {
        root.set_attribute("viewBox", view_box.to_string());
    }
    root.set_attribute("width", format_number(dimensions.size.width));
    root.set_attribute("height", format_number(dimensions.size.height));

    NormalizedDocument {
        root,
        size: dimensions.size,
    }
}
