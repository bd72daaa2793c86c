// THEORY:
// The `Frame` module is the bridge between a live video source and the analysis
// pipeline. A `Frame` is an immutable raster snapshot: width, height and a
// flattened RGBA byte buffer, produced once per sampling tick and consumed once
// by the classifier. It is never retained across ticks.
//
// The `FrameSource` trait is the narrow contract a capture device has to meet:
// hand over the current frame, or report "not ready" while the device has not
// yet decoded one. Acquisition, permissions and device release are the concern
// of whoever owns the source, not of this module.

pub mod frame {
    use crate::core_modules::pixel::pixel::Pixel;

    const CHANNELS: usize = 4;

    /// An immutable RGBA raster snapshot of a single video frame.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        /// The frame width in pixels.
        width: u32,
        /// The frame height in pixels.
        height: u32,
        /// The flattened pixel buffer, 4 bytes (R, G, B, A) per pixel.
        data: Vec<u8>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
            Self {
                width,
                height,
                data,
            }
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn data(&self) -> &[u8] {
            &self.data
        }

        /// A frame is ready for analysis when it has non-zero dimensions and a
        /// buffer that actually covers them. Anything else is treated as a
        /// "not ready" capture and skipped by the pipeline.
        pub fn is_ready(&self) -> bool {
            self.width > 0
                && self.height > 0
                && self.data.len() >= (self.width as usize * self.height as usize * CHANNELS)
        }

        /// Reads the pixel at (x, y). Out-of-bounds coordinates yield a zero
        /// pixel rather than panicking.
        pub fn pixel_at(&self, x: u32, y: u32) -> Pixel {
            if x >= self.width || y >= self.height {
                return Pixel::default();
            }
            let index = (y as usize * self.width as usize + x as usize) * CHANNELS;
            Pixel::from(&self.data[index..index + CHANNELS])
        }

        /// The total number of pixels in the frame.
        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }
    }

    /// The contract a live capture device exposes to the sampling loop.
    ///
    /// `grab_frame` returns `None` while the device has not produced at least
    /// one decoded frame. Implementations are expected to release the
    /// underlying device when dropped, so that stopping a session (or any
    /// termination path) frees the camera.
    pub trait FrameSource {
        fn grab_frame(&mut self) -> Option<Frame>;
    }
}
