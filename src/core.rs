pub mod clustering;
pub mod segmenter;
pub mod series;
pub mod state;
pub mod timestamp;
