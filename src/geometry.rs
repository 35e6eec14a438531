//! Sizes, bounding boxes, and `viewBox` values.

use std::fmt;
use std::str::FromStr;

/// The tightest rectangle enclosing drawn content, in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box is usable for sizing only with finite coordinates and a
    /// positive width and height.
    pub fn is_drawable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Output width and height in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An SVG `viewBox`: `min-x min-y width height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub const fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            format_number(self.min_x),
            format_number(self.min_y),
            format_number(self.width),
            format_number(self.height)
        )
    }
}

/// A `viewBox` attribute value that is not four numbers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid viewBox: {0:?}")]
pub struct ViewBoxParseError(pub String);

impl FromStr for ViewBox {
    type Err = ViewBoxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numbers = s
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ViewBoxParseError(s.to_string()))?;
        match numbers.as_slice() {
            &[min_x, min_y, width, height] => Ok(Self::new(min_x, min_y, width, height)),
            _ => Err(ViewBoxParseError(s.to_string())),
        }
    }
}

/// Parse an SVG length attribute that denotes an absolute size in user
/// units: a plain number, optionally suffixed with `px`.
///
/// Relative lengths (`100%`, `2em`) and other units return `None` because
/// they do not fix the exported size on their own.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim_end();
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

/// Format a number the way attribute values are usually written: integral
/// values without a fractional part, and never `-0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_is_drawable_requires_positive_extent() {
        assert!(BBox::new(0.0, 0.0, 1.0, 1.0).is_drawable());
        assert!(!BBox::new(0.0, 0.0, 0.0, 1.0).is_drawable());
        assert!(!BBox::new(0.0, 0.0, 1.0, -1.0).is_drawable());
        assert!(!BBox::new(f64::NAN, 0.0, 1.0, 1.0).is_drawable());
        assert!(!BBox::new(0.0, 0.0, f64::INFINITY, 1.0).is_drawable());
    }

    #[test]
    fn test_view_box_display_formats_integers_plainly() {
        let vb = ViewBox::new(-40.0, -50.0, 160.0, 110.0);
        assert_eq!(vb.to_string(), "-40 -50 160 110");
    }

    #[test]
    fn test_view_box_display_keeps_fractions() {
        let vb = ViewBox::new(-0.5, 0.0, 12.25, 3.0);
        assert_eq!(vb.to_string(), "-0.5 0 12.25 3");
    }

    #[test]
    fn test_view_box_parses_commas_and_whitespace() {
        let vb: ViewBox = "0, -8  100.5\t60".parse().unwrap();
        assert_eq!(vb, ViewBox::new(0.0, -8.0, 100.5, 60.0));
    }

    #[test]
    fn test_view_box_rejects_wrong_arity() {
        assert!("0 0 10".parse::<ViewBox>().is_err());
        assert!("0 0 10 x".parse::<ViewBox>().is_err());
    }

    #[test]
    fn test_parse_length_accepts_user_units() {
        assert_eq!(parse_length("120"), Some(120.0));
        assert_eq!(parse_length(" 64.5px "), Some(64.5));
    }

    #[test]
    fn test_parse_length_rejects_relative_units() {
        assert_eq!(parse_length("100%"), None);
        assert_eq!(parse_length("2em"), None);
        assert_eq!(parse_length(""), None);
        assert_eq!(parse_length("0"), None);
    }

    #[test]
    fn test_format_number_never_emits_negative_zero() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(800.0), "800");
    }
}
