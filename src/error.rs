use glam::Vec2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("minimum spot size must be finite and non-negative, got {0}")]
    InvalidMinSize(Vec2),
    #[error("proximity threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f32),
    #[error("invalid auto-fit range: {0}")]
    InvalidAutoFit(String),
    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to parse face: {0}")]
    FaceParsing(#[from] ttf_parser::FaceParsingError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
