use clap::Parser;

use crate::{
    core::{clustering::KMeansClusterer, segmenter::DEFAULT_WINDOW_SIZE},
    model::Submetered,
    session::Session,
};

#[derive(Copy, Clone, Parser)]
pub struct SegmentationArgs {
    /// Samples per window: a sample above the threshold switches ON the whole window after it.
    #[clap(long, env = "NILM_WINDOW_SIZE", default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Random seed of the k-means initialisation.
    #[clap(long, env = "NILM_SEED", default_value_t = KMeansClusterer::DEFAULT_SEED)]
    pub seed: u64,
}

impl SegmentationArgs {
    pub fn session(self) -> Session<Submetered, KMeansClusterer> {
        Session::builder()
            .model(Submetered)
            .clusterer(KMeansClusterer::new(self.seed))
            .window_size(self.window_size)
            .build()
    }
}
