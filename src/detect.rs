use glam::Vec2;

use crate::{
    error::{Error, Result},
    geometry::{Padding, Rect},
    spot::Spot,
    text_layout::Line,
};

/// Spots smaller than this in either dimension are not worth filling.
pub const DEFAULT_MIN_SIZE: Vec2 = Vec2::new(50.0, 50.0);

/// Finds the open rectangles around the laid out `lines`.
///
/// Lines are walked top to bottom. Each non-empty line gets a band running
/// from where the previous band ended down to the line's bottom edge, and the
/// space left and right of the line within that band becomes a candidate.
/// Whatever is left below the last band is one more candidate. Candidates
/// smaller than `min_size` are dropped, and the rest are numbered from 1 in
/// the order left, right (per line), then trailing.
pub fn detect(
    canvas_size: Vec2,
    lines: &[Line],
    padding: &Padding,
    min_size: Vec2,
) -> Result<Vec<Spot>> {
    if !min_size.is_finite() || min_size.cmplt(Vec2::ZERO).any() {
        return Err(Error::InvalidMinSize(min_size));
    }

    let right_edge = canvas_size.x - padding.right;
    let mut current_y = padding.top;
    let mut candidates = Vec::new();

    for line in lines.iter().filter(|line| !line.is_empty()) {
        let band_bottom = (line.y + line.height).max(current_y);
        let band_height = band_bottom - current_y;

        candidates.push(Rect::new(
            padding.left,
            current_y,
            line.x - padding.left,
            band_height,
        ));
        let line_right = line.x + line.width;
        candidates.push(Rect::new(
            line_right,
            current_y,
            right_edge - line_right,
            band_height,
        ));

        current_y = band_bottom;
    }

    candidates.push(Rect::new(
        padding.left,
        current_y,
        right_edge - padding.left,
        canvas_size.y - padding.bottom - current_y,
    ));

    let spots = candidates
        .into_iter()
        .filter(|rect| rect.fits(min_size))
        .zip(1..)
        .map(|(rect, id)| Spot::empty(id, rect))
        .collect::<Vec<_>>();

    log::debug!(
        "detected {} spots around {} lines",
        spots.len(),
        lines.len()
    );

    Ok(spots)
}
