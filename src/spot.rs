use std::{collections::VecDeque, sync::Arc};

use glam::{vec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::{document::TextAlign, geometry::Rect};

/// An open region around the text, numbered in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub id: u32,
    pub rect: Rect,
    pub content: SpotContent,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpotContent {
    #[default]
    Empty,
    Image(ImageContent),
    Text(TextContent),
    Mask(MaskContent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotKind {
    Empty,
    Image,
    Text,
    Mask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub alignment: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Re-decodable reference to the image, e.g. a path or data URL.
    pub source: ImageSource,
    #[serde(default)]
    pub transform: ImageTransform,
    /// The decoded image. Never serialized; restored spots get a fresh handle
    /// from an [`crate::restore::ImageResolver`].
    #[serde(skip)]
    pub handle: Option<ImageHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSource(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    pub offset: Vec2,
    pub scale: f32,
    pub rotation: f32,
}

/// A decoded image owned by the caller. Cloning shares the pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub size: glam::UVec2,
    pub pixels: Arc<[u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskContent {
    pub opacity: f32,
}

/// A copy of a non-empty spot taken before a detection pass replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSpotSnapshot {
    pub original_id: u32,
    pub rect: Rect,
    pub content: SpotContent,
}

/// Snapshots that no spot of the latest pass could take, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitingQueue {
    entries: VecDeque<SavedSpotSnapshot>,
}

impl Spot {
    pub fn empty(id: u32, rect: Rect) -> Self {
        Self {
            id,
            rect,
            content: SpotContent::Empty,
        }
    }

    pub fn kind(&self) -> SpotKind {
        self.content.kind()
    }

    pub fn is_empty(&self) -> bool {
        self.kind() == SpotKind::Empty
    }
}

impl SpotContent {
    pub fn kind(&self) -> SpotKind {
        match self {
            SpotContent::Empty => SpotKind::Empty,
            SpotContent::Image(_) => SpotKind::Image,
            SpotContent::Text(_) => SpotKind::Text,
            SpotContent::Mask(_) => SpotKind::Mask,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        SpotContent::Text(TextContent {
            text: text.into(),
            color: None,
            font_size: None,
            alignment: TextAlign::default(),
        })
    }

    pub fn image(source: impl Into<String>) -> Self {
        SpotContent::Image(ImageContent {
            source: ImageSource(source.into()),
            transform: ImageTransform::default(),
            handle: None,
        })
    }

    pub fn mask(opacity: f32) -> Self {
        SpotContent::Mask(MaskContent { opacity })
    }

    /// The content as it would be persisted: identical, except that live
    /// image handles are dropped.
    pub fn detached(&self) -> Self {
        match self {
            SpotContent::Image(image) => SpotContent::Image(ImageContent {
                handle: None,
                ..image.clone()
            }),
            other => other.clone(),
        }
    }
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            offset: vec2(0.0, 0.0),
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl SavedSpotSnapshot {
    /// Captures `spot`, or returns `None` for an empty spot.
    pub fn capture(spot: &Spot) -> Option<Self> {
        if spot.is_empty() {
            return None;
        }
        Some(Self {
            original_id: spot.id,
            rect: spot.rect,
            content: spot.content.detached(),
        })
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, snapshot: SavedSpotSnapshot) {
        self.entries.push_back(snapshot);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedSpotSnapshot> {
        self.entries.iter()
    }

    /// Removes every entry, oldest first. The caller is expected to feed them
    /// back into the next restoration so nothing is lost.
    pub fn take(&mut self) -> Vec<SavedSpotSnapshot> {
        self.entries.drain(..).collect()
    }
}

impl FromIterator<SavedSpotSnapshot> for WaitingQueue {
    fn from_iter<T: IntoIterator<Item = SavedSpotSnapshot>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<SavedSpotSnapshot> for WaitingQueue {
    fn extend<T: IntoIterator<Item = SavedSpotSnapshot>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
