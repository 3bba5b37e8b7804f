use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawImageSize")]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
struct RawImageSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawImageSize> for ImageSize {
    type Error = ValidationError;

    fn try_from(raw: RawImageSize) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::EmptyImage { width, height });
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_rejected() {
        assert!(ImageSize::new(0, 720).is_err());
        assert!(ImageSize::new(1280, 0).is_err());
        assert_eq!(ImageSize::new(1280, 720).unwrap().to_string(), "1280x720");
    }
}
