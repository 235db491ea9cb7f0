//! Math support
//!
//!     Markdown parsers mangle TeX (`_`, `*`, `\\` are all markup-significant), so math
//!     spans never reach the parser. The pipeline is:
//!
//!     1. [`fence::protect`] swaps every `$$…$$` / `$…$` span for an opaque placeholder.
//!     2. The markdown renderer runs on the protected text.
//!     3. [`fence::restore`] swaps each placeholder for a typeset container carrying the
//!        original TeX in a `data-latex` attribute (percent-encoded).
//!     4. The document model builder reads that attribute back and rasterizes the exact
//!        source through [`raster::MathRasterizer`], ignoring the typeset markup.
//!
//!     Typesetting ([`typeset`]) and off-screen rasterization ([`raster`]) are black boxes
//!     behind traits so they can be swapped or stubbed.

#[cfg(feature = "native-export")]
pub mod browser;
pub mod fence;
pub mod raster;
pub mod typeset;

#[cfg(feature = "native-export")]
pub use browser::ChromeRasterizer;

pub use fence::{protect, restore, Protected, MATH_SOURCE_ATTR};
pub use raster::{
    EquationRasterizer, MathRasterizer, MathSettings, NoRasterizer, PixelSurface, RasterOptions,
    SurfaceRasterizer,
};
pub use typeset::{MathMlTypesetter, Typesetter};

/// Display (block) or inline math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    Block,
    Inline,
}

impl MathKind {
    pub fn is_display(&self) -> bool {
        matches!(self, MathKind::Block)
    }
}

/// A math span lifted out of the source text. Lives for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathFragment {
    pub kind: MathKind,
    /// Trimmed TeX between the fences.
    pub source_tex: String,
    /// Dense 0-based index into the fragment list.
    pub ordinal: usize,
}
