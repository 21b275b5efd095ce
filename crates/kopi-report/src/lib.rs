pub mod commentary;
pub mod insights;
pub mod render;
pub mod report;

pub use commentary::{CommentaryInputs, CommentaryProvider, DisabledCommentaryProvider};
pub use render::render_markdown;
pub use report::{AnalyticsReport, PeriodComparison, ReportAssembler};
