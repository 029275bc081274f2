use serde::Deserialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Codec configuration
pub struct CodecConfig {
    /// Max remaining length of a frame, `0` means unlimited
    pub max_size: u32,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max frame size.
    ///
    /// By default max size is set to `0`, size is unlimited.
    pub fn max_size(mut self, size: u32) -> Self {
        self.max_size = size;
        self
    }
}
