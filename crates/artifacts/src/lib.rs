//! Persistence for the demand pipeline: CSV tables in and out, and the
//! checksummed model file. Every writer goes through [`atomic_write`].

pub mod atomic_write;
mod csv_table;
pub mod error;
pub mod events_csv;
pub mod model_file;
pub mod tables;

pub use atomic_write::atomic_write;
pub use error::{ArtifactError, Result};
pub use events_csv::{read_events, read_events_from, write_events};
pub use model_file::{load_model, save_model};
pub use tables::{
    read_staffing_plan, read_zone_hours, read_zones, write_peak_hours, write_staffing_plan,
    write_zone_hours, write_zones,
};
