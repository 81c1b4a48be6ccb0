//! Filename naming conventions used by the CMS when it writes renditions.
//!
//! - `photo-300x200.jpg` — a resized rendition of `photo.jpg`
//! - `photo-scaled.jpg` — a large original stored downscaled, while metadata
//!   still refers to it as `photo.jpg`

use regex::Regex;
use std::sync::LazyLock;

/// Greedy `(.+)` makes `base` everything before the last `-WxH.` group.
static THUMBNAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+)-([0-9]+)x([0-9]+)\.(jpg|jpeg|png|gif|webp)$").expect("static pattern")
});

const SCALED_SUFFIX: &str = "-scaled";
const SCALABLE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Parsed `<base>-<width>x<height>.<extension>` filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailMatch {
    pub base: String,
    pub width: u32,
    pub height: u32,
    pub extension: String,
}

impl ThumbnailMatch {
    /// Name of the file the rendition was derived from.
    pub fn original_filename(&self) -> String {
        format!("{}.{}", self.base, self.extension)
    }
}

/// Match a sized-rendition filename. Dimensions that overflow `u32` do not match.
pub fn match_thumbnail(filename: &str) -> Option<ThumbnailMatch> {
    let caps = THUMBNAIL.captures(filename)?;
    Some(ThumbnailMatch {
        base: caps[1].to_string(),
        width: caps[2].parse().ok()?,
        height: caps[3].parse().ok()?,
        extension: caps[4].to_string(),
    })
}

/// `bigphoto.jpg` → `bigphoto-scaled.jpg`. `None` for other extensions and for
/// names that already carry the suffix.
pub fn scaled_candidate(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || !SCALABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return None;
    }
    if stem.to_ascii_lowercase().ends_with(SCALED_SUFFIX) {
        return None;
    }
    Some(format!("{stem}{SCALED_SUFFIX}.{ext}"))
}
