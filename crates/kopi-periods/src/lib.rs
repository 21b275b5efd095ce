pub mod loader;
pub mod record;

pub use loader::{load_daily_dir, load_period_dir, load_weekly_dir};
pub use record::{
    ByCategory, Category, Intensity, PeriodKind, PeriodRecord, Quote, ThematicCluster,
};
