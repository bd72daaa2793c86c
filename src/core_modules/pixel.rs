// THEORY:
// The `Pixel` module is the most fundamental unit of the detection system. It is a
// "dumb" data container for a single RGBA pixel plus the handful of single-pixel
// transforms the skin classifier needs. Anything that requires knowledge of a
// pixel's neighbors in space (grids, regions) or of other frames belongs in the
// higher-level modules.
//
// Key architectural principles:
// 1.  **Single-pixel scope**: Every method here is a pure function of this pixel's
//     channel values. No neighbors, no history.
// 2.  **Raw channel fidelity**: Channels stay as raw 0-255 bytes. The classifier's
//     color model is defined over raw sRGB values, so no gamma correction or
//     normalization is applied.
// 3.  **Data container**: The struct knows how to summarize itself (brightness,
//     YCbCr) but not how to judge itself. Classification lives in `skin`.

pub mod pixel {
    pub type Channel = u8;
    pub type Brightness = f64;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// The mean of the three color channels. This is the "brightness" the
        /// lighting heuristics operate on, not a perceptual luminance.
        pub fn brightness(&self) -> Brightness {
            (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0
        }

        /// Converts the pixel to the YCbCr color space using the standard
        /// BT.601 coefficients. Returned as (y, cb, cr), each nominally 0-255.
        pub fn ycbcr(&self) -> (f64, f64, f64) {
            let r = self.red as f64;
            let g = self.green as f64;
            let b = self.blue as f64;

            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
            let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;

            (y, cb, cr)
        }
    }

    impl From<&[u8]> for Pixel {
        /// Builds a pixel from a 4-byte RGBA slice. Missing trailing bytes are
        /// treated as zero so a truncated buffer degrades instead of panicking.
        fn from(bytes: &[u8]) -> Self {
            Self {
                red: bytes.first().copied().unwrap_or(0),
                green: bytes.get(1).copied().unwrap_or(0),
                blue: bytes.get(2).copied().unwrap_or(0),
                alpha: bytes.get(3).copied().unwrap_or(0),
            }
        }
    }
}
