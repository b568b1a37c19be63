pub mod boundaries;
pub mod dataset;
pub mod observation;
pub mod risk;
pub mod skin;

pub use boundaries::StateBoundaries;
pub use dataset::UvDataset;
pub use observation::{Measure, UvObservation};
pub use risk::RiskBand;
pub use skin::SkinType;
