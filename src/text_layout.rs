use itertools::Itertools;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{
    document::{FontDescriptor, FontSize, TextAlign, TextBlock, VerticalAlign},
    error::{Error, Result},
    font::MeasureText,
    geometry::Rect,
};

/// One physical line after wrapping, positioned in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub alignment: TextAlign,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayoutResult {
    pub lines: Vec<Line>,
    pub font_size: f32,
}

/// Candidate sizes tried when the font size is `Auto`: from `max_size`
/// (capped by the available height) down to `min_size` in `step` decrements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AutoFit {
    max_size: f32,
    min_size: f32,
    step: f32,
}

/// Remembers the last layout and reuses it while the block's revision is
/// unchanged.
#[derive(Debug, Default)]
pub struct LayoutCache {
    cached: Option<(u64, LayoutResult)>,
}

impl Line {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Height from the top of the first line to the bottom of the last.
    pub fn text_height(&self) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => last.y + last.height - first.y,
            _ => 0.0,
        }
    }
}

impl Default for AutoFit {
    fn default() -> Self {
        Self {
            max_size: 120.0,
            min_size: 8.0,
            step: 2.0,
        }
    }
}

impl AutoFit {
    pub fn new(max_size: f32, min_size: f32, step: f32) -> Result<Self> {
        if !(step > 0.0 && step.is_finite()) {
            return Err(Error::InvalidAutoFit(format!("step must be positive, got {step}")));
        }
        if !(min_size > 0.0 && min_size.is_finite()) {
            return Err(Error::InvalidAutoFit(format!(
                "minimum size must be positive, got {min_size}"
            )));
        }
        if !(max_size >= min_size && max_size.is_finite()) {
            return Err(Error::InvalidAutoFit(format!(
                "maximum size {max_size} is below minimum size {min_size}"
            )));
        }
        Ok(Self {
            max_size,
            min_size,
            step,
        })
    }

    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}

impl<'de> Deserialize<'de> for AutoFit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            max_size: f32,
            min_size: f32,
            step: f32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.max_size, raw.min_size, raw.step).map_err(de::Error::custom)
    }
}

impl LayoutCache {
    pub fn layout(
        &mut self,
        block: &TextBlock,
        measurer: &impl MeasureText,
        auto_fit: &AutoFit,
    ) -> &LayoutResult {
        let revision = block.revision();
        if self.cached_revision() != Some(revision) {
            self.cached = None;
        }
        let (_, result) = self.cached.get_or_insert_with(|| {
            log::debug!("laying out text block at revision {revision}");
            (revision, layout_with(block, measurer, auto_fit))
        });
        result
    }

    /// Forgets the cached layout, e.g. after the measurer or auto-fit
    /// settings change without the block itself changing.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn cached_revision(&self) -> Option<u64> {
        self.cached.as_ref().map(|(revision, _)| *revision)
    }
}

/// Lays out `block` using the default auto-fit range.
pub fn layout(block: &TextBlock, measurer: &impl MeasureText) -> LayoutResult {
    layout_with(block, measurer, &AutoFit::default())
}

pub fn layout_with(
    block: &TextBlock,
    measurer: &impl MeasureText,
    auto_fit: &AutoFit,
) -> LayoutResult {
    let content_box = block.content_box();
    let available_width = content_box.width();
    let available_height = content_box.height();

    if available_width <= 0.0 || available_height <= 0.0 {
        return LayoutResult {
            lines: Vec::new(),
            font_size: block.font().fixed_size().unwrap_or(auto_fit.min_size),
        };
    }

    let font_size = match block.font().size {
        FontSize::Fixed(size) => size,
        FontSize::Auto => {
            fit_font_size(block, measurer, auto_fit, available_width, available_height)
        }
    };
    let font = block.font().with_size(font_size);

    let texts = wrap_text(
        block.content(),
        block.wrap_enabled(),
        available_width,
        &font,
        measurer,
    );
    let widths = texts
        .iter()
        .map(|text| measure_line(text, &font, measurer))
        .collect::<Vec<_>>();

    let line_spacing = block.line_spacing();
    let text_height = total_height(texts.len(), font_size, line_spacing);

    let anchor = block.block_anchor();
    let origin_y = match anchor.vertical {
        VerticalAlign::Top => content_box.y(),
        VerticalAlign::Middle => content_box.y() + 0.5 * (available_height - text_height),
        VerticalAlign::Bottom => content_box.y() + available_height - text_height,
    };

    // Centered lines share one vertical axis. For a centered block that is the
    // middle of the content box; otherwise it is the middle of the widest
    // line, pushed against the anchored edge.
    let block_width = widths.iter().copied().fold(0.0, f32::max);
    let center_x = match anchor.horizontal {
        TextAlign::Left => content_box.x() + 0.5 * block_width,
        TextAlign::Center => content_box.x() + 0.5 * available_width,
        TextAlign::Right => content_box.right() - 0.5 * block_width,
    };

    let lines = texts
        .into_iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (text, width))| {
            let alignment = block.alignment_for(&text);
            let x = match alignment {
                TextAlign::Left => content_box.x(),
                TextAlign::Center => center_x - 0.5 * width,
                TextAlign::Right => content_box.right() - width,
            };
            Line {
                text,
                x,
                y: origin_y + i as f32 * (font_size + line_spacing),
                width,
                height: font_size,
                alignment,
            }
        })
        .collect();

    LayoutResult { lines, font_size }
}

/// Largest candidate size whose wrapped text fits the content box, or the
/// floor size when none does.
fn fit_font_size(
    block: &TextBlock,
    measurer: &impl MeasureText,
    auto_fit: &AutoFit,
    available_width: f32,
    available_height: f32,
) -> f32 {
    let start = available_height.min(auto_fit.max_size);

    itertools::iterate(start, |size| size - auto_fit.step)
        .take_while(|&size| size >= auto_fit.min_size)
        .find(|&size| {
            let font = block.font().with_size(size);
            let texts = wrap_text(
                block.content(),
                block.wrap_enabled(),
                available_width,
                &font,
                measurer,
            );
            let height = total_height(texts.len(), size, block.line_spacing());
            height <= available_height
                && texts
                    .iter()
                    .all(|text| measure_line(text, &font, measurer) <= available_width)
        })
        .unwrap_or(auto_fit.min_size)
}

fn total_height(line_count: usize, font_size: f32, line_spacing: f32) -> f32 {
    match line_count {
        0 => 0.0,
        n => n as f32 * font_size + (n - 1) as f32 * line_spacing,
    }
}

fn measure_line(text: &str, font: &FontDescriptor, measurer: &impl MeasureText) -> f32 {
    if text.trim().is_empty() {
        0.0
    } else {
        measurer.measure(text, font)
    }
}

/// Splits `content` on explicit breaks and, when wrapping is enabled, packs
/// each paragraph's words greedily into lines no wider than `max_width`.
///
/// A word that is wider than `max_width` on its own still gets its own line.
pub fn wrap_text(
    content: &str,
    wrap_enabled: bool,
    max_width: f32,
    font: &FontDescriptor,
    measurer: &impl MeasureText,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');

        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        if !wrap_enabled {
            lines.push(paragraph.to_owned());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = [current.as_str(), word].iter().join(" ");
            if measurer.measure(&candidate, font) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use glam::vec2;

    use crate::{
        document::{BlockAnchor, FontDescriptor, FontSize, TextAlign, TextBlock, VerticalAlign},
        geometry::{Padding, Rect},
    };

    use super::{layout, layout_with, wrap_text, AutoFit, LayoutCache};

    /// Every character is as wide as the font size.
    fn monospace(text: &str, font: &FontDescriptor) -> f32 {
        text.chars().count() as f32 * font.fixed_size().unwrap_or(0.0)
    }

    fn fixed(size: f32) -> FontDescriptor {
        FontDescriptor {
            size: FontSize::Fixed(size),
            ..FontDescriptor::default()
        }
    }

    #[test]
    fn test_single_centered_line() {
        let block = TextBlock::new("Love", Rect::new(0.0, 0.0, 800.0, 800.0))
            .with_font(fixed(100.0))
            .with_anchor(BlockAnchor::new(TextAlign::Center, VerticalAlign::Top));

        let result = layout(&block, &monospace);
        assert_eq!(result.font_size, 100.0);
        assert_eq!(result.lines.len(), 1);

        let line = &result.lines[0];
        assert_eq!(line.text, "Love");
        assert_eq!(line.rect(), Rect::new(200.0, 0.0, 400.0, 100.0));
        assert_eq!(line.alignment, TextAlign::Center);
    }

    #[test]
    fn test_wraps_greedily() {
        let font = fixed(10.0);
        // "aaa bbb" is 70 wide, "aaa bbb cc" 100, "aaa bbb cc d" 120.
        let lines = wrap_text("aaa bbb cc d", true, 100.0, &font, &monospace);
        assert_eq!(lines, vec!["aaa bbb cc", "d"]);

        let lines = wrap_text("aaa bbb cc d", false, 100.0, &font, &monospace);
        assert_eq!(lines, vec!["aaa bbb cc d"]);
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let font = fixed(10.0);
        let lines = wrap_text("a abcdefghijklmnop b", true, 50.0, &font, &monospace);
        assert_eq!(lines, vec!["a", "abcdefghijklmnop", "b"]);
    }

    #[test]
    fn test_empty_paragraphs_are_kept() {
        let font = fixed(10.0);
        let lines = wrap_text("one\n\ntwo\r\n", true, 100.0, &font, &monospace);
        assert_eq!(lines, vec!["one", "", "two", ""]);
    }

    #[test]
    fn test_vertical_anchors() {
        let container = Rect::new(0.0, 0.0, 400.0, 400.0);
        let base = TextBlock::new("ab\ncd", container)
            .with_font(fixed(20.0))
            .with_line_spacing(10.0);
        // Two lines: 2 * 20 + 10 = 50 tall.
        for (vertical, first_y) in [
            (VerticalAlign::Top, 0.0),
            (VerticalAlign::Middle, 175.0),
            (VerticalAlign::Bottom, 350.0),
        ] {
            let block = base
                .clone()
                .with_anchor(BlockAnchor::new(TextAlign::Left, vertical));
            let result = layout(&block, &monospace);
            assert_eq!(result.lines[0].y, first_y);
            assert_eq!(result.lines[1].y, first_y + 30.0);
            assert_eq!(result.text_height(), 50.0);
        }
    }

    #[test]
    fn test_line_alignment_relative_to_content_box() {
        let block = TextBlock::new("ab\nwxyz", Rect::new(0.0, 0.0, 200.0, 200.0))
            .with_font(fixed(10.0))
            .with_padding(Padding::uniform(20.0))
            .with_anchor(BlockAnchor::new(TextAlign::Right, VerticalAlign::Top));

        let result = layout(&block, &monospace);
        assert_eq!(result.lines[0].x, 160.0);
        assert_eq!(result.lines[1].x, 140.0);
        assert_eq!(result.lines[0].y, 20.0);

        let mut block = block;
        block.set_line_alignment("ab", Some(TextAlign::Left));
        block.set_line_alignment("wxyz", Some(TextAlign::Center));
        let result = layout(&block, &monospace);
        assert_eq!(result.lines[0].x, 20.0);
        assert_eq!(result.lines[0].alignment, TextAlign::Left);
        // Centered on the right-anchored block, whose widest line is 40 wide.
        assert_eq!(result.lines[1].x, 140.0);
    }

    #[test]
    fn test_alignment_override_survives_rewrap() {
        let mut block = TextBlock::new("Join us today", Rect::new(0.0, 0.0, 100.0, 300.0))
            .with_font(fixed(10.0))
            .with_anchor(BlockAnchor::new(TextAlign::Left, VerticalAlign::Top));
        block.set_line_alignment("today", Some(TextAlign::Right));

        let result = layout(&block, &monospace);
        let texts = result.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["Join us", "today"]);
        assert_eq!(result.lines[1].x, 50.0);

        block.set_content("Please join us today");
        let result = layout(&block, &monospace);
        let today = result.lines.iter().find(|l| l.text == "today").unwrap();
        assert_eq!(today.alignment, TextAlign::Right);
        assert_eq!(today.x, 50.0);
    }

    #[test]
    fn test_auto_fit_picks_largest_fitting_size() {
        // Ten characters in a 300 wide box fit at size 30 and below.
        let block = TextBlock::new("abcdefghij", Rect::new(0.0, 0.0, 300.0, 500.0))
            .with_wrap(false);
        let result = layout(&block, &monospace);
        assert_eq!(result.font_size, 30.0);
        assert_eq!(result.lines[0].width, 300.0);
    }

    #[test]
    fn test_auto_fit_capped_by_height() {
        let block = TextBlock::new("a", Rect::new(0.0, 0.0, 1000.0, 51.0));
        let result = layout(&block, &monospace);
        // Starts at 51 and steps down by two.
        assert_eq!(result.font_size, 51.0);

        let block = TextBlock::new("a", Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(layout(&block, &monospace).font_size, 120.0);
    }

    #[test]
    fn test_auto_fit_falls_back_to_floor() {
        let block = TextBlock::new("abcdefghijklmnopqrstuvwxyz", Rect::new(0.0, 0.0, 50.0, 50.0))
            .with_wrap(false);
        let result = layout(&block, &monospace);
        assert_eq!(result.font_size, 8.0);
        assert!(result.lines[0].width > 50.0);
    }

    #[test]
    fn test_auto_fit_with_custom_range() {
        let auto_fit = AutoFit::new(40.0, 10.0, 5.0).unwrap();
        let block = TextBlock::new("abcdefghij", Rect::new(0.0, 0.0, 260.0, 500.0))
            .with_wrap(false);
        assert_eq!(layout_with(&block, &monospace, &auto_fit).font_size, 25.0);

        assert!(AutoFit::new(40.0, 10.0, 0.0).is_err());
        assert!(AutoFit::new(5.0, 10.0, 1.0).is_err());
        assert!(AutoFit::new(40.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_degenerate_container_has_no_lines() {
        let block = TextBlock::new("Love", Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_padding(Padding {
                left: 60.0,
                right: 40.0,
                ..Padding::default()
            });
        assert!(layout(&block, &monospace).is_empty());

        let block = TextBlock::new("Love", Rect::from_size(vec2(100.0, 0.0)));
        assert!(layout(&block, &monospace).is_empty());
    }

    #[test]
    fn test_cache_follows_revision() {
        let calls = std::cell::Cell::new(0);
        let counting = |text: &str, font: &FontDescriptor| {
            calls.set(calls.get() + 1);
            monospace(text, font)
        };

        let mut block = TextBlock::new("Love", Rect::new(0.0, 0.0, 800.0, 800.0))
            .with_font(fixed(100.0));
        let mut cache = LayoutCache::default();

        cache.layout(&block, &counting, &AutoFit::default());
        let after_first = calls.get();
        assert!(after_first > 0);
        assert_eq!(cache.cached_revision(), Some(block.revision()));

        cache.layout(&block, &counting, &AutoFit::default());
        assert_eq!(calls.get(), after_first);

        block.set_content("Love you");
        let result = cache.layout(&block, &counting, &AutoFit::default());
        assert_eq!(result.lines[0].text, "Love you");
        assert!(calls.get() > after_first);

        cache.invalidate();
        assert_eq!(cache.cached_revision(), None);
    }

    #[test]
    fn test_cache_tells_blocks_apart() {
        let container = Rect::new(0.0, 0.0, 800.0, 800.0);
        let love = TextBlock::new("Love", container).with_font(fixed(40.0));
        let goodbye = TextBlock::new("Goodbye forever", container).with_font(fixed(40.0));
        let mut cache = LayoutCache::default();

        let result = cache.layout(&love, &monospace, &AutoFit::default());
        assert_eq!(result.lines[0].text, "Love");
        let result = cache.layout(&goodbye, &monospace, &AutoFit::default());
        assert_eq!(result.lines[0].text, "Goodbye forever");

        // An edited clone starts from the same revision but must not be
        // served the original's layout.
        let mut edited = love.clone();
        cache.layout(&love, &monospace, &AutoFit::default());
        edited.set_content("Love you");
        let result = cache.layout(&edited, &monospace, &AutoFit::default());
        assert_eq!(result.lines[0].text, "Love you");
    }
}
