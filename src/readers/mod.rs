pub mod boundary_reader;
pub mod observation_reader;

pub use boundary_reader::BoundaryReader;
pub use observation_reader::{parse_packed_date, ObservationReader};
