//! Capture pipeline configuration

/// Capture pipeline parameters
///
/// Handed to the video source at (re)start time and never mutated while
/// production is running; changing any field goes through
/// [`PipelineController::apply`](super::PipelineController::apply).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Frames per second requested from the source
    pub fps: u32,
    /// Encoder quality (1-100 for JPEG encoders)
    pub quality: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            quality: 80,
            width: 1280,
            height: 720,
        }
    }
}

impl PipelineConfig {
    /// Set the frame rate
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the encoder quality
    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the frame resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Apply a partial update, leaving unset fields unchanged
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        Self {
            fps: update.fps.unwrap_or(self.fps),
            quality: update.quality.unwrap_or(self.quality),
            width: update.width.unwrap_or(self.width),
            height: update.height.unwrap_or(self.height),
        }
    }
}

/// Partial configuration update, usually parsed from the settings form
///
/// `None` fields leave the active value unchanged. Building one from form
/// pairs never fails: a missing, non-numeric or non-positive field is
/// ignored and the remaining fields still apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    /// New frame rate, if given
    pub fps: Option<u32>,
    /// New encoder quality, if given
    pub quality: Option<u32>,
    /// New frame width, if given
    pub width: Option<u32>,
    /// New frame height, if given
    pub height: Option<u32>,
}

impl ConfigUpdate {
    /// Build an update from `key=value` pairs
    ///
    /// Recognized keys are `fps`, `quality`, `width` and `height`; values
    /// must parse as positive integers. Everything else is skipped, invalid
    /// values with a debug log.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = Self::default();
        for (key, value) in pairs {
            let field = match key {
                "fps" => &mut update.fps,
                "quality" => &mut update.quality,
                "width" => &mut update.width,
                "height" => &mut update.height,
                _ => continue,
            };
            match parse_positive(value) {
                Some(parsed) => *field = Some(parsed),
                None => {
                    tracing::debug!(field = key, value = value, "Ignoring invalid settings value");
                }
            }
        }
        update
    }

    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.fps.is_none() && self.quality.is_none() && self.width.is_none() && self.height.is_none()
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v > 0)
}
