pub mod figure;
pub mod palette;
pub mod table;

pub use figure::{Figure, Trace, Values};
pub use table::{RegionFill, RiskTableRow};
