//! Blog post composition.
//!
//! Builds block-editor markup (`<!-- wp:... -->` comments around HTML) for
//! imported assets.

use std::fmt;
use std::str::FromStr;

use chat2blog_beeper::media::extension_for_mime;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::import::{AssetId, ImportedAsset, sanitize_file_name};

/// Extension used when the MIME type is unknown.
const FALLBACK_EXTENSION: &str = "jpg";

/// How imported media is laid out in a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFormat {
    /// One gallery with every image, then one block per video.
    #[default]
    Gallery,
    /// One block per asset, in order.
    Images,
}

impl FromStr for PostFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gallery" => Ok(Self::Gallery),
            "images" => Ok(Self::Images),
            other => Err(Error::InvalidRequest(format!("Unknown post format: {other}"))),
        }
    }
}

impl fmt::Display for PostFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gallery => "gallery",
            Self::Images => "images",
        })
    }
}

/// An imported asset placed in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAsset {
    /// Asset identifier.
    pub id: AssetId,
    /// Public URL of the file.
    pub url: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// Alternative text for images.
    pub alt: String,
}

impl From<&ImportedAsset> for PostAsset {
    fn from(asset: &ImportedAsset) -> Self {
        Self {
            id: asset.asset_id,
            url: asset.url.clone(),
            mime_type: asset.mime_type.clone(),
            alt: String::new(),
        }
    }
}

impl PostAsset {
    fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// File name for media without one: `media.<ext>`.
#[must_use]
pub fn default_file_name(mime_type: Option<&str>) -> String {
    format!("media.{}", extension_or_fallback(mime_type))
}

/// File name for asset `index` (0-based) of `total` imported for a post.
///
/// `Trip to Rome` with two JPEGs gives `Trip-to-Rome-1.jpg` and
/// `Trip-to-Rome-2.jpg`; a single asset gets no suffix.
#[must_use]
pub fn asset_file_name(title: &str, index: usize, total: usize, mime_type: Option<&str>) -> String {
    let base = sanitize_file_name(title);
    let ext = extension_or_fallback(mime_type);
    if total > 1 {
        format!("{base}-{}.{ext}", index + 1)
    } else {
        format!("{base}.{ext}")
    }
}

fn extension_or_fallback(mime_type: Option<&str>) -> &'static str {
    mime_type
        .and_then(extension_for_mime)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Paragraph block with escaped text.
#[must_use]
pub fn paragraph_block(text: &str) -> String {
    format!(
        "<!-- wp:paragraph -->\n<p>{}</p>\n<!-- /wp:paragraph -->",
        escape(text)
    )
}

/// Image block.
#[must_use]
pub fn image_block(asset: &PostAsset) -> String {
    format!(
        concat!(
            r#"<!-- wp:image {{"id":{id},"sizeSlug":"large","linkDestination":"none"}} -->"#,
            r#"<figure class="wp-block-image size-large"><img src="{url}" alt="{alt}" class="wp-image-{id}"/></figure>"#,
            "<!-- /wp:image -->"
        ),
        id = asset.id,
        url = escape(&asset.url),
        alt = escape(&asset.alt),
    )
}

/// Video block.
#[must_use]
pub fn video_block(asset: &PostAsset) -> String {
    format!(
        concat!(
            r#"<!-- wp:video {{"id":{id}}} -->"#,
            r#"<figure class="wp-block-video"><video controls src="{url}"></video></figure>"#,
            "<!-- /wp:video -->"
        ),
        id = asset.id,
        url = escape(&asset.url),
    )
}

/// Gallery block wrapping one image block per asset.
#[must_use]
pub fn gallery_block(assets: &[&PostAsset]) -> String {
    let inner: String = assets.iter().map(|asset| image_block(asset)).collect();
    format!(
        concat!(
            r#"<!-- wp:gallery {{"linkTo":"none"}} -->"#,
            r#"<figure class="wp-block-gallery has-nested-images columns-default is-cropped">{}</figure>"#,
            "<!-- /wp:gallery -->"
        ),
        inner
    )
}

/// Composes post content: optional intro paragraph, then the assets.
#[must_use]
pub fn compose_post(text: Option<&str>, assets: &[PostAsset], format: PostFormat) -> String {
    let mut blocks = Vec::new();

    if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
        blocks.push(paragraph_block(text));
    }

    match format {
        PostFormat::Gallery => {
            let (videos, images): (Vec<&PostAsset>, Vec<&PostAsset>) =
                assets.iter().partition(|a| a.is_video());
            if !images.is_empty() {
                blocks.push(gallery_block(&images));
            }
            blocks.extend(videos.into_iter().map(video_block));
        }
        PostFormat::Images => {
            blocks.extend(assets.iter().map(|asset| {
                if asset.is_video() {
                    video_block(asset)
                } else {
                    image_block(asset)
                }
            }));
        }
    }

    blocks.join("\n\n")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
