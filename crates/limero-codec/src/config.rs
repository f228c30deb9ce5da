/// Default maximum frame size in bytes, matching the firmware encoder.
pub const DEFAULT_MAX_FRAME: usize = 256;

/// Configuration shared by encoders, decoders and reassemblers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum number of bytes a buffer may hold. Default: 256.
    pub max_frame_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}
