//! Page layouts and their slot capacities.
//!
//! Every page carries one [`Layout`]. The layout decides how many images the
//! page *shows* and how many the distribution engine will *place* on it:
//!
//! | Layout | Slots |
//! |--------|-------|
//! | `single` | 1 |
//! | `double` | 2 |
//! | `grid` | 4 |
//! | `collage` | 6 |
//!
//! The capacity is a rendering and allocation rule, not a storage cap. A page
//! may hold more images than its layout shows (after switching from `collage`
//! to `single`, or after a manual drag). The surplus stays in the page's image
//! list and is simply not rendered; see [`visible`].
//!
//! Layout tags are lowercase in JSON. Any unrecognised tag read from a
//! document is treated as `collage`, so its capacity falls back to 6.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named slot-capacity preset for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Single,
    Double,
    Grid,
    #[serde(other)]
    Collage,
}

impl Layout {
    pub const ALL: [Layout; 4] = [Layout::Single, Layout::Double, Layout::Grid, Layout::Collage];

    /// Number of image slots this layout renders.
    pub fn capacity(self) -> usize {
        match self {
            Layout::Single => 1,
            Layout::Double => 2,
            Layout::Grid => 4,
            Layout::Collage => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Double => "double",
            Layout::Grid => "grid",
            Layout::Collage => "collage",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Layout::from_str`] for tags outside the four presets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layout '{0}' (expected single, double, grid or collage)")]
pub struct UnknownLayout(pub String);

/// Strict parsing for user input. Documents use the lenient serde path.
impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLayout(s.to_string()))
    }
}

/// Capacity for a raw layout tag, falling back to the collage capacity for
/// anything unrecognised.
pub fn capacity_for_tag(tag: &str) -> usize {
    tag.parse::<Layout>()
        .unwrap_or(Layout::Collage)
        .capacity()
}

/// Slots still free on a page: `capacity - occupied`, never negative.
pub fn remaining(layout: Layout, occupied: usize) -> usize {
    layout.capacity().saturating_sub(occupied)
}

/// The images a page actually renders: the first `capacity` entries.
pub fn visible<T>(layout: Layout, images: &[T]) -> &[T] {
    &images[..images.len().min(layout.capacity())]
}
