use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::geometry::{Padding, Rect};

/// The text to lay out and everything that affects where it ends up.
///
/// Fields are only reachable through setters so that every mutation bumps
/// [`TextBlock::revision`], which is what [`crate::text_layout::LayoutCache`]
/// keys on. Revisions come from one process-wide counter, so two blocks only
/// share a revision when one is an unedited clone of the other.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    content: String,
    font: FontDescriptor,
    line_spacing: f32,
    wrap_enabled: bool,
    container: Rect,
    padding: Padding,
    block_anchor: BlockAnchor,
    line_alignment_overrides: BTreeMap<String, TextAlign>,
    revision: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub size: FontSize,
    pub weight: FontWeight,
    pub style: FontStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FontSize {
    Fixed(f32),
    Auto,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Where the whole text block sits inside the padded container.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAnchor {
    pub horizontal: TextAlign,
    pub vertical: VerticalAlign,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_owned(),
            size: FontSize::Auto,
            weight: FontWeight::default(),
            style: FontStyle::default(),
        }
    }
}

impl FontDescriptor {
    /// Returns a copy of this descriptor pinned to a concrete size.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size: FontSize::Fixed(size),
            ..self.clone()
        }
    }

    /// The concrete size, or `None` while the size is still `Auto`.
    pub fn fixed_size(&self) -> Option<f32> {
        match self.size {
            FontSize::Fixed(size) => Some(size),
            FontSize::Auto => None,
        }
    }
}

impl BlockAnchor {
    pub fn new(horizontal: TextAlign, vertical: VerticalAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Key under which a line alignment override is stored.
///
/// Overrides follow the text of a line rather than its index, so they keep
/// applying after a rewrap shuffles line numbers.
pub fn normalize_line_key(text: &str) -> String {
    text.trim().to_owned()
}

impl TextBlock {
    pub fn new(content: impl Into<String>, container: Rect) -> Self {
        Self {
            content: content.into(),
            font: FontDescriptor::default(),
            line_spacing: 0.0,
            wrap_enabled: true,
            container,
            padding: Padding::default(),
            block_anchor: BlockAnchor::default(),
            line_alignment_overrides: BTreeMap::new(),
            revision: next_revision(),
        }
    }

    pub fn with_font(mut self, font: FontDescriptor) -> Self {
        self.set_font(font);
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.set_padding(padding);
        self
    }

    pub fn with_anchor(mut self, anchor: BlockAnchor) -> Self {
        self.set_block_anchor(anchor);
        self
    }

    pub fn with_line_spacing(mut self, line_spacing: f32) -> Self {
        self.set_line_spacing(line_spacing);
        self
    }

    pub fn with_wrap(mut self, wrap_enabled: bool) -> Self {
        self.set_wrap_enabled(wrap_enabled);
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    pub fn line_spacing(&self) -> f32 {
        self.line_spacing
    }

    pub fn wrap_enabled(&self) -> bool {
        self.wrap_enabled
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn block_anchor(&self) -> BlockAnchor {
        self.block_anchor
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The box the text is laid out in: the container minus its padding.
    pub fn content_box(&self) -> Rect {
        self.container.inset(&self.padding)
    }

    /// Alignment for a physical line: its override if one matches the line's
    /// trimmed text, otherwise the block anchor's horizontal alignment.
    pub fn alignment_for(&self, line_text: &str) -> TextAlign {
        self.line_alignment_overrides
            .get(&normalize_line_key(line_text))
            .copied()
            .unwrap_or(self.block_anchor.horizontal)
    }

    pub fn line_alignment_overrides(&self) -> &BTreeMap<String, TextAlign> {
        &self.line_alignment_overrides
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.bump();
    }

    pub fn set_font(&mut self, font: FontDescriptor) {
        self.font = font;
        self.bump();
    }

    pub fn set_line_spacing(&mut self, line_spacing: f32) {
        self.line_spacing = line_spacing;
        self.bump();
    }

    pub fn set_wrap_enabled(&mut self, wrap_enabled: bool) {
        self.wrap_enabled = wrap_enabled;
        self.bump();
    }

    pub fn set_container(&mut self, container: Rect) {
        self.container = container;
        self.bump();
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding;
        self.bump();
    }

    pub fn set_block_anchor(&mut self, block_anchor: BlockAnchor) {
        self.block_anchor = block_anchor;
        self.bump();
    }

    /// Pins the alignment of every physical line whose trimmed text equals
    /// `line_text`'s. Passing `None` removes the override.
    pub fn set_line_alignment(&mut self, line_text: &str, align: Option<TextAlign>) {
        let key = normalize_line_key(line_text);
        match align {
            Some(align) => self.line_alignment_overrides.insert(key, align),
            None => self.line_alignment_overrides.remove(&key),
        };
        self.bump();
    }

    pub fn clear_line_alignments(&mut self) {
        self.line_alignment_overrides.clear();
        self.bump();
    }

    fn bump(&mut self) {
        self.revision = next_revision();
    }
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}
