pub mod frame;
pub mod frame_analyzer;
pub mod interpreter;
pub mod multi_person;
pub mod occupancy_grid;
pub mod pixel;
pub mod skin;
pub mod utils;
pub mod violation;
