use std::fmt;

/// Pixel layouts understood by the compositing engine.
///
/// `Any` is the sentinel layout used by format-agnostic kernels; it never
/// describes an actual buffer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PixelFormat {
    /// Single 8-bit value channel.
    V8,
    /// Value + alpha, 8 bits each.
    Va8,
    /// Three 8-bit color channels.
    Rgb8,
    /// Three color channels + alpha, 8 bits each.
    Rgba8,
    /// Sentinel: unconstrained layout.
    Any,
}

impl PixelFormat {
    /// Every format, sentinel included.
    pub const ALL: [PixelFormat; 5] = [
        PixelFormat::V8,
        PixelFormat::Va8,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
        PixelFormat::Any,
    ];

    /// The formats that can describe an actual buffer.
    pub const CONCRETE: [PixelFormat; 4] = [
        PixelFormat::V8,
        PixelFormat::Va8,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
    ];

    /// Bytes occupied by one pixel. `Any` is 0.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::V8 => 1,
            PixelFormat::Va8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Any => 0,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Va8 | PixelFormat::Rgba8)
    }

    /// The same layout with alpha presence flipped. Involution: toggling
    /// twice returns the original format. The sentinel maps to itself.
    pub const fn alpha_toggled(self) -> PixelFormat {
        match self {
            PixelFormat::V8 => PixelFormat::Va8,
            PixelFormat::Va8 => PixelFormat::V8,
            PixelFormat::Rgb8 => PixelFormat::Rgba8,
            PixelFormat::Rgba8 => PixelFormat::Rgb8,
            PixelFormat::Any => PixelFormat::Any,
        }
    }

    /// Diagnostic label. Never used for logic.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::V8 => "v8",
            PixelFormat::Va8 => "va8",
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Rgba8 => "rgba8",
            PixelFormat::Any => "any",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
