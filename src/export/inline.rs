//! Inlining of remote `<image>` references as `data:` URLs.
//!
//! An exported file must not depend on remote resources, so every image
//! pointing at an absolute `http(s)` URL is fetched and embedded. A failed
//! fetch is not an export failure: the reference is left as it was.

use url::Url;

use crate::dataurl;
use crate::platform::ImageFetcher;

use super::NormalizedDocument;

const HREF_ATTRIBUTES: [&str; 2] = ["href", "xlink:href"];

/// Outcome counts of one inlining pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineSummary {
    pub inlined: usize,
    pub failed: usize,
}

/// Replace remote image references in `document` with embedded data.
pub fn inline_remote_images(
    document: &mut NormalizedDocument,
    fetcher: &dyn ImageFetcher,
) -> InlineSummary {
    let mut summary = InlineSummary::default();

    document.root_mut().for_each_element_mut(&mut |element| {
        if element.local_name() != "image" {
            return;
        }
        // `href` and `xlink:href` often carry the same URL; fetch it once.
        let mut fetched: Vec<(Url, Option<String>)> = Vec::new();
        for attribute in HREF_ATTRIBUTES {
            let Some(url) = element.attribute(attribute).and_then(remote_url) else {
                continue;
            };
            let data_url = if let Some((_, cached)) = fetched.iter().find(|(seen, _)| *seen == url) {
                cached.clone()
            } else {
                let data_url = match fetcher.fetch(&url) {
                    Ok(image) => {
                        let media_type = image
                            .content_type
                            .as_deref()
                            .unwrap_or(dataurl::DEFAULT_MEDIA_TYPE);
                        summary.inlined += 1;
                        Some(dataurl::encode(media_type, &image.bytes))
                    }
                    Err(err) => {
                        tracing::warn!(%url, %err, "could not inline image, keeping remote reference");
                        summary.failed += 1;
                        None
                    }
                };
                fetched.push((url, data_url.clone()));
                data_url
            };
            if let Some(data_url) = data_url {
                element.set_attribute(attribute, data_url);
            }
        }
    });

    tracing::debug!(
        inlined = summary.inlined,
        failed = summary.failed,
        "remote images processed"
    );
    summary
}

/// `href` as a URL when it is an absolute `http` or `https` reference.
fn remote_url(href: &str) -> Option<Url> {
    Url::parse(href.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
