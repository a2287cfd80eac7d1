//! Media type descriptor parsing
//!
//! Video media types arrive as a `key=value,...` string, e.g.
//! `"width=640,height=480,framerate=30/1"`. Unrecognized keys and bare
//! tokens are ignored; malformed values are fatal at construction.

use crate::error::{AviBuildError, Result};

/// Parsed video media type descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoMediaType {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Declared frame rate numerator (0 if absent)
    pub frame_rate_num: u32,
    /// Declared frame rate denominator
    pub frame_rate_den: u32,
}

impl VideoMediaType {
    /// Parse a `key=value,...` descriptor string
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut media_type = VideoMediaType::default();

        for token in descriptor.split(',') {
            let token = token.trim();
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };

            match key {
                "width" => media_type.width = parse_u32(value)?,
                "height" => media_type.height = parse_u32(value)?,
                "framerate" => {
                    let (num, den) = value.split_once('/').ok_or_else(|| {
                        AviBuildError::InvalidMediaType(format!(
                            "framerate must be NUM/DEN, got '{value}'"
                        ))
                    })?;
                    media_type.frame_rate_num = parse_u32(num)?;
                    media_type.frame_rate_den = parse_u32(den)?;
                }
                _ => {}
            }
        }

        Ok(media_type)
    }

    /// True if the descriptor declared a usable frame rate
    pub fn has_frame_rate(&self) -> bool {
        self.frame_rate_num != 0
    }
}

fn parse_u32(value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| AviBuildError::InvalidMediaType(format!("invalid number '{value}'")))
}
