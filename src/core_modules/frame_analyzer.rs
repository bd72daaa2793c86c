// THEORY:
// The `frame_analyzer` is the classifier stage of the pipeline. It is a
// stateless, pure function of a single frame: scan a sampled subset of the
// pixels, classify each against the skin model, pool the hits into an
// occupancy grid, and reduce the whole thing to one `ClassificationResult`.
//
// Key architectural principles:
// 1.  **Strided sampling**: only a fraction of the pixels are ever touched.
//     The continuous detector samples a coarse x/y lattice; the slower exam
//     monitor walks every Nth flattened index. Both are cheap enough to run
//     inside a timer callback without dropping frames.
// 2.  **Single pass**: skin classification, brightness accounting, the central
//     face region and the occupancy grid are all accumulated in one sweep over
//     the sampled pixels.
// 3.  **Stateless**: the analyzer holds nothing between frames. All session
//     state lives in the interpreter.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::multi_person;
use crate::core_modules::occupancy_grid::OccupancyGrid;
use crate::core_modules::skin::skin;
use crate::pipeline::{DetectorConfig, SamplingStride};

/// The per-tick verdict of the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    /// True when the skin evidence is consistent with exactly one centered face.
    pub face_detected: bool,
    /// True when the occupancy grid shows more skin mass than one face explains.
    pub multiple_people: bool,
    /// Rolling confidence score, 0-100. Zero whenever no face is detected.
    pub confidence: f64,
}

impl ClassificationResult {
    /// The "nothing seen" result, used for frames that cannot be analyzed.
    pub fn empty() -> Self {
        Self {
            face_detected: false,
            multiple_people: false,
            confidence: 0.0,
        }
    }
}

/// The full output of one classifier pass: the verdict plus the raw evidence
/// it was derived from.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub classification: ClassificationResult,
    /// The occupancy grid built from this frame's skin pixels.
    pub grid: OccupancyGrid,
    /// How many pixels the stride actually visited.
    pub sampled_pixels: usize,
    /// How many sampled pixels passed both skin predicates.
    pub skin_pixels: usize,
    /// Skin pixels that fell inside the central face region.
    pub face_region_pixels: usize,
    /// Sampled pixels brighter than the lighting floor.
    pub bright_pixels: usize,
    /// True when the lighting heuristic flagged this frame (exam monitor only).
    pub lighting_anomaly: bool,
}

impl FrameAnalysis {
    fn empty(config: &DetectorConfig) -> Self {
        Self {
            classification: ClassificationResult::empty(),
            grid: OccupancyGrid::new(0, 0, config.block_size),
            sampled_pixels: 0,
            skin_pixels: 0,
            face_region_pixels: 0,
            bright_pixels: 0,
            lighting_anomaly: false,
        }
    }
}

/// Runs the classifier over one frame. Not-ready frames yield an empty analysis.
pub fn analyze(frame: &Frame, config: &DetectorConfig) -> FrameAnalysis {
    if !frame.is_ready() {
        return FrameAnalysis::empty(config);
    }

    let width = frame.width();
    let height = frame.height();

    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let face_region_radius = config.face_region_scale * width.min(height) as f64;

    let mut grid = OccupancyGrid::new(width, height, config.block_size);
    let mut sampled_pixels = 0usize;
    let mut skin_pixels = 0usize;
    let mut face_region_pixels = 0usize;
    let mut bright_pixels = 0usize;
    let mut hot_pixels = 0usize;

    let coords: Box<dyn Iterator<Item = (u32, u32)>> = match config.stride {
        SamplingStride::Lattice(step) => Box::new((0..height).step_by(step as usize).flat_map(
            move |y| (0..width).step_by(step as usize).map(move |x| (x, y)),
        )),
        SamplingStride::Flat(step) => Box::new(
            (0..width as u64 * height as u64)
                .step_by(step as usize)
                .map(move |i| ((i % width as u64) as u32, (i / width as u64) as u32)),
        ),
    };

    for (x, y) in coords {
        let pixel = frame.pixel_at(x, y);
        sampled_pixels += 1;

        let brightness = pixel.brightness();
        if brightness > config.bright_pixel_floor {
            bright_pixels += 1;
        }
        if let Some(lighting) = &config.lighting {
            if brightness > lighting.brightness_threshold {
                hot_pixels += 1;
            }
        }

        if skin::is_facial_skin(&pixel) {
            skin_pixels += 1;
            grid.record(x, y);

            let dx = x as f64 - center_x;
            let dy = y as f64 - center_y;
            if (dx * dx + dy * dy).sqrt() < face_region_radius {
                face_region_pixels += 1;
            }
        }
    }

    let multiple_people = multi_person::detect(&grid, &config.multi_person);

    let skin_fraction = skin_pixels as f64 / sampled_pixels as f64;
    let face_region_fraction = face_region_pixels as f64 / skin_pixels.max(1) as f64;
    let bright_fraction = bright_pixels as f64 / sampled_pixels as f64;

    let has_enough_skin =
        skin_fraction > config.min_skin_fraction && skin_fraction < config.max_skin_fraction;
    let has_concentrated_face = face_region_fraction > config.min_face_region_fraction;
    let has_good_lighting = bright_fraction > config.min_bright_fraction;
    let has_minimum_face_pixels = face_region_pixels > config.min_face_region_pixels;
    let has_proper_face_size = face_region_pixels < config.max_face_region_pixels;

    let face_detected = has_enough_skin
        && has_concentrated_face
        && has_good_lighting
        && has_minimum_face_pixels
        && has_proper_face_size;

    let confidence = if face_detected {
        (skin_fraction * 800.0 + face_region_fraction * 80.0).min(100.0)
    } else {
        0.0
    };

    let lighting_anomaly = config.lighting.as_ref().is_some_and(|lighting| {
        hot_pixels as f64 / sampled_pixels as f64 > lighting.max_bright_ratio
    });

    FrameAnalysis {
        classification: ClassificationResult {
            face_detected,
            multiple_people,
            confidence,
        },
        grid,
        sampled_pixels,
        skin_pixels,
        face_region_pixels,
        bright_pixels,
        lighting_anomaly,
    }
}
