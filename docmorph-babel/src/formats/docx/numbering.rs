//! List numbering definitions.
//!
//! Bulleted lists share one definition. Every ordered list gets its own, so each
//! ordered list restarts at 1.

use docx_rs::{
    AbstractNumbering, Docx, Level, LevelJc, LevelText, NumberFormat, Numbering,
    SpecialIndentType, Start,
};

/// Left indent of a list item, in twips.
pub const LIST_INDENT: i32 = 720;

/// Hanging indent of the bullet or number, in twips.
pub const LIST_HANGING: i32 = 360;

#[derive(Debug, Clone)]
pub struct ListNumbering {
    next_id: usize,
    bullet_id: Option<usize>,
}

impl Default for ListNumbering {
    fn default() -> Self {
        Self {
            next_id: 1,
            bullet_id: None,
        }
    }
}

fn level(format: &str, text: &str) -> Level {
    Level::new(
        0,
        Start::new(1),
        NumberFormat::new(format),
        LevelText::new(text),
        LevelJc::new("left"),
    )
    .indent(
        Some(LIST_INDENT),
        Some(SpecialIndentType::Hanging(LIST_HANGING)),
        None,
        None,
    )
}

impl ListNumbering {
    fn register(&mut self, docx: Docx, level: Level) -> (Docx, usize) {
        let id = self.next_id;
        self.next_id += 1;
        let docx = docx
            .add_abstract_numbering(AbstractNumbering::new(id).add_level(level))
            .add_numbering(Numbering::new(id, id));
        (docx, id)
    }

    /// Numbering id for a list, registering a definition on first need.
    pub fn numbering_for(&mut self, docx: Docx, ordered: bool) -> (Docx, usize) {
        if ordered {
            return self.register(docx, level("decimal", "%1."));
        }
        match self.bullet_id {
            Some(id) => (docx, id),
            None => {
                let (docx, id) = self.register(docx, level("bullet", "•"));
                self.bullet_id = Some(id);
                (docx, id)
            }
        }
    }
}
