//! Lays out a block of text on a canvas and finds the open rectangles
//! ("spots") left around it, keeping whatever was placed in those spots
//! attached as the text changes.

pub mod composer;
pub mod config;
pub mod detect;
pub mod document;
pub mod error;
pub mod font;
pub mod geometry;
pub mod restore;
pub mod schedule;
pub mod spot;
pub mod text_layout;

pub use crate::{
    composer::Composer,
    config::Config,
    detect::detect,
    error::{Error, Result},
    restore::{restore, snapshot},
    text_layout::layout,
};
