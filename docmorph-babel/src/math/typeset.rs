//! TeX typesetting
//!
//! The typesetter turns one TeX expression into displayable markup. The markup is only
//! used for previews and as rasterizer input; the document model never parses it.

use latex2mathml::{latex_to_mathml, DisplayStyle};

use crate::error::MathError;

pub trait Typesetter {
    /// Lays out `tex` as display (block) or inline math.
    fn typeset(&self, tex: &str, display: bool) -> Result<String, MathError>;
}

/// Typesets to MathML, which browsers render natively.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlTypesetter;

impl Typesetter for MathMlTypesetter {
    fn typeset(&self, tex: &str, display: bool) -> Result<String, MathError> {
        let style = if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        };
        latex_to_mathml(tex, style).map_err(|err| MathError {
            tex: tex.to_string(),
            message: err.to_string(),
        })
    }
}
