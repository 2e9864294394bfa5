//! Where each artifact lives on disk.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Layout {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl Layout {
    pub fn simulated_orders(&self) -> PathBuf {
        self.data_dir.join("simulated_orders.csv")
    }

    pub fn events_with_zones(&self) -> PathBuf {
        self.data_dir.join("events_with_zones.csv")
    }

    pub fn zone_centers(&self) -> PathBuf {
        self.data_dir.join("zone_centers.csv")
    }

    pub fn zone_hour_table(&self) -> PathBuf {
        self.data_dir.join("zone_hour_agg.csv")
    }

    pub fn model(&self) -> PathBuf {
        self.model_dir.join("demand_model.bin")
    }

    pub fn driver_plan(&self) -> PathBuf {
        self.out_dir.join("driver_plan.csv")
    }

    pub fn peak_hours(&self) -> PathBuf {
        self.out_dir.join("peak_hours.csv")
    }

    /// `path` if given, otherwise the simulator's output.
    pub fn events_input(&self, path: Option<&Path>) -> PathBuf {
        path.map_or_else(|| self.simulated_orders(), Path::to_path_buf)
    }
}
