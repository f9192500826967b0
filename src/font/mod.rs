use std::collections::BTreeMap;

use ttf_parser::{name_id, Face, GlyphId};

use crate::{document::FontDescriptor, error::Error};

#[cfg(test)]
pub(crate) mod test_face;

/// Measures the rendered width of a string.
///
/// This is the only thing layout needs to know about fonts. Implementations
/// are expected to be pure: the same text and descriptor must always give the
/// same width.
pub trait MeasureText {
    fn measure(&self, text: &str, font: &FontDescriptor) -> f32;
}

impl<F> MeasureText for F
where
    F: Fn(&str, &FontDescriptor) -> f32,
{
    fn measure(&self, text: &str, font: &FontDescriptor) -> f32 {
        self(text, font)
    }
}

/// A parsed TrueType/OpenType face used for measuring text.
pub struct Font<'a> {
    pub data: &'a [u8],
    pub face: Face<'a>,
    pub family: String,
}

impl<'a> Font<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, Error> {
        let face = Face::parse(data, 0)?;

        // Fall back to an empty family name rather than rejecting the face;
        // lookups by family then simply never match it.
        let family = face
            .names()
            .into_iter()
            .find(|name| name.name_id == name_id::FAMILY && name.is_unicode())
            .and_then(|name| name.to_string())
            .unwrap_or_default();

        Ok(Self { data, face, family })
    }

    /// Horizontal advance of `c` in ems. Characters the face has no glyph for
    /// use the advance of `.notdef`.
    pub fn advance(&self, c: char) -> f32 {
        let glyph_id = self.face.glyph_index(c).unwrap_or(GlyphId(0));
        let advance = self.face.glyph_hor_advance(glyph_id).unwrap_or(0);
        advance as f32 / self.face.units_per_em() as f32
    }

    /// Width of `text` in ems.
    pub fn width_em(&self, text: &str) -> f32 {
        text.chars().map(|c| self.advance(c)).sum()
    }
}

impl MeasureText for Font<'_> {
    fn measure(&self, text: &str, font: &FontDescriptor) -> f32 {
        // An unresolved auto size has no width yet.
        font.fixed_size().map_or(0.0, |size| size * self.width_em(text))
    }
}

/// Picks the face whose family matches the descriptor, falling back to the
/// first registered face.
impl MeasureText for BTreeMap<&str, &Font<'_>> {
    fn measure(&self, text: &str, font: &FontDescriptor) -> f32 {
        let face = self
            .get(font.family.as_str())
            .or_else(|| self.values().next());
        match face {
            Some(face) => face.measure(text, font),
            None => 0.0,
        }
    }
}
