// Small bridge between image files on disk and the pipeline's `Frame` type.
// Used by the demo runner and by tests that work from captured stills.

pub mod image_helper {
    use crate::core_modules::frame::frame::Frame;
    use image::ImageEncoder;
    use std::path::Path;

    /// Loads an image file and converts it to an RGBA `Frame`.
    pub fn load(path: impl AsRef<Path>) -> Result<Frame, image::error::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Frame::new(width, height, rgba.into_raw()))
    }

    /// Writes a frame out as a PNG, mostly useful for inspecting synthetic
    /// test frames by eye.
    pub fn save(frame: &Frame, path: impl AsRef<Path>) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        encoder.write_image(
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}
