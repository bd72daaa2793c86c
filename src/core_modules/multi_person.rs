// THEORY:
// The `multi_person` module is the spatial reasoning layer on top of the
// occupancy grid. A single face produces one compact cluster of dense cells
// around the frame center; a second person shows up as extra dense mass
// somewhere it should not be. Three rules, checked in order of strength:
//
// 1.  **Cluster count**: several cells above the significant-density threshold
//     means more skin mass than one face can account for.
// 2.  **Separated peaks**: two of the densest cells lying far apart on the grid
//     cannot belong to the same face, whatever their absolute count.
// 3.  **Left/right spread**: dense mass in both outer thirds of the frame is
//     the classic "second person leaning in" signature, even when neither
//     cluster is individually dominant.
//
// The thresholds are empirically tuned and differ between the continuous login
// detector and the slower exam monitor, so they are carried as a parameter
// struct rather than constants.

use crate::core_modules::occupancy_grid::OccupancyGrid;
use log::debug;
use serde::{Deserialize, Serialize};

/// Density thresholds and counts for the multi-person rules. Two tunings ship
/// as presets on `PipelineConfig`; see `login` and `exam_monitor` there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPersonRules {
    /// Minimum cell density for a cell to be considered a candidate region at all.
    pub candidate_density: u32,
    /// Minimum density for a candidate to count toward the cluster-count rule.
    pub significant_density: u32,
    /// How many significant clusters trigger the cluster-count rule.
    pub min_significant_regions: usize,
    /// Grid-cell distance beyond which two dense peaks are "separated".
    pub pair_distance: f64,
    /// Minimum density both peaks need for the separated-peaks rule.
    pub pair_density: u32,
    /// Minimum per-side peak density for the left/right-spread rule.
    pub side_density: u32,
}

/// Applies the three multi-person rules to a populated occupancy grid.
pub fn detect(grid: &OccupancyGrid, rules: &MultiPersonRules) -> bool {
    let mut regions = grid.regions_above(rules.candidate_density);
    if regions.len() < 2 {
        return false;
    }

    regions.sort_by(|a, b| b.density.cmp(&a.density));

    // Rule 1: too many significant clusters.
    let significant = regions
        .iter()
        .filter(|r| r.density > rules.significant_density)
        .count();
    if significant >= rules.min_significant_regions {
        debug!(
            "multiple people: {} clusters above density {}",
            significant, rules.significant_density
        );
        return true;
    }

    // Rule 2: two dense peaks separated on the grid. Only the top three
    // regions by density are considered.
    let top = regions.len().min(3);
    for i in 0..top {
        for j in (i + 1)..top {
            let (a, b) = (&regions[i], &regions[j]);
            let distance = a.distance_to(b);
            if distance > rules.pair_distance
                && a.density > rules.pair_density
                && b.density > rules.pair_density
            {
                debug!(
                    "multiple people: peaks at ({},{}) and ({},{}) are {:.1} cells apart",
                    a.x, a.y, b.x, b.y, distance
                );
                return true;
            }
        }
    }

    // Rule 3: dense mass in both outer thirds of the grid.
    let third = grid.grid_width() as f64 / 3.0;
    let max_left = regions
        .iter()
        .filter(|r| (r.x as f64) < third)
        .map(|r| r.density)
        .max();
    let max_right = regions
        .iter()
        .filter(|r| (r.x as f64) > 2.0 * third)
        .map(|r| r.density)
        .max();

    if let (Some(left), Some(right)) = (max_left, max_right) {
        if left > rules.side_density && right > rules.side_density {
            debug!(
                "multiple people: left/right spread (max left {}, max right {})",
                left, right
            );
            return true;
        }
    }

    false
}
