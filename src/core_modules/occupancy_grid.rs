// THEORY:
// The `OccupancyGrid` is the spatial pooling layer of the classifier. Skin
// pixels on their own say nothing about how many distinct people are in frame;
// binning them into fixed-size blocks turns a pixel cloud into a coarse density
// map that the multi-person rules can reason about.
//
// Key architectural principles:
// 1.  **Deterministic geometry**: grid dimensions are a pure function of the
//     frame dimensions and the block size (ceiling division), and never change
//     mid-session.
// 2.  **Per-tick lifetime**: a grid is rebuilt from scratch for every sampled
//     frame. It carries no state between ticks.
// 3.  **Dumb accumulator**: the grid counts, it does not judge. Interpretation
//     of the densities lives in `multi_person`.

use std::fmt;

/// The default edge length, in source pixels, of one grid block.
pub const DEFAULT_BLOCK_SIZE: u32 = 15;

/// A cell of the occupancy grid that crossed a density threshold, together
/// with its grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// The column index of this cell in the grid.
    pub x: u32,
    /// The row index of this cell in the grid.
    pub y: u32,
    /// The number of skin pixels binned into this cell.
    pub density: u32,
}

impl Region {
    /// Euclidean distance to another region, in grid-cell units.
    pub fn distance_to(&self, other: &Region) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A 2-D map of skin-pixel counts, one cell per fixed-size block of the frame.
#[derive(Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    grid_width: u32,
    grid_height: u32,
    block_size: u32,
    cells: Vec<u32>,
}

impl OccupancyGrid {
    /// Creates an empty grid covering a frame of the given dimensions.
    pub fn new(frame_width: u32, frame_height: u32, block_size: u32) -> Self {
        let grid_width = frame_width.div_ceil(block_size);
        let grid_height = frame_height.div_ceil(block_size);
        Self {
            grid_width,
            grid_height,
            block_size,
            cells: vec![0; (grid_width * grid_height) as usize],
        }
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Increments the cell containing the source pixel (x, y). Coordinates
    /// beyond the covered area are ignored.
    pub fn record(&mut self, pixel_x: u32, pixel_y: u32) {
        let grid_x = pixel_x / self.block_size;
        let grid_y = pixel_y / self.block_size;
        if grid_x < self.grid_width && grid_y < self.grid_height {
            self.cells[(grid_y * self.grid_width + grid_x) as usize] += 1;
        }
    }

    /// The count stored in the cell at grid coordinates (x, y).
    pub fn cell(&self, grid_x: u32, grid_y: u32) -> u32 {
        if grid_x >= self.grid_width || grid_y >= self.grid_height {
            return 0;
        }
        self.cells[(grid_y * self.grid_width + grid_x) as usize]
    }

    /// All cells whose count is strictly above `min_density`.
    pub fn regions_above(&self, min_density: u32) -> Vec<Region> {
        let mut regions = Vec::new();
        for y in 0..self.grid_height {
            for x in 0..self.grid_width {
                let density = self.cells[(y * self.grid_width + x) as usize];
                if density > min_density {
                    regions.push(Region { x, y, density });
                }
            }
        }
        regions
    }
}

impl fmt::Debug for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupancyGrid")
            .field("grid_width", &self.grid_width)
            .field("grid_height", &self.grid_height)
            .field("block_size", &self.block_size)
            .field("occupied_cells", &self.cells.iter().filter(|c| **c > 0).count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_use_ceiling_division() {
        let grid = OccupancyGrid::new(200, 120, 15);
        assert_eq!(grid.grid_width(), 14);
        assert_eq!(grid.grid_height(), 8);

        let exact = OccupancyGrid::new(150, 150, 15);
        assert_eq!(exact.grid_width(), 10);
        assert_eq!(exact.grid_height(), 10);
    }

    #[test]
    fn record_bins_pixels_by_block() {
        let mut grid = OccupancyGrid::new(60, 60, 15);
        grid.record(0, 0);
        grid.record(14, 14);
        grid.record(15, 0);
        assert_eq!(grid.cell(0, 0), 2);
        assert_eq!(grid.cell(1, 0), 1);
        assert_eq!(grid.cell(1, 1), 0);
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut grid = OccupancyGrid::new(30, 30, 15);
        grid.record(500, 500);
        assert!(grid.regions_above(0).is_empty());
    }

    #[test]
    fn regions_above_is_strict() {
        let mut grid = OccupancyGrid::new(30, 30, 15);
        for _ in 0..5 {
            grid.record(0, 0);
        }
        assert!(grid.regions_above(5).is_empty());
        let regions = grid.regions_above(4);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0], Region { x: 0, y: 0, density: 5 });
    }

    #[test]
    fn region_distance_is_euclidean() {
        let a = Region { x: 0, y: 0, density: 1 };
        let b = Region { x: 3, y: 4, density: 1 };
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
