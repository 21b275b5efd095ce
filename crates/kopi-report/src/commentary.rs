//! Inputs for a plain-language sentiment commentary and the seam through
//! which a text generator plugs in.

use crate::insights::dominant_category;
use kopi_analytics::{IntensityCounts, TimeSeries, TrendDirection};
use kopi_core::config::CommentaryConfig;
use kopi_core::{AppError, AppResult};
use kopi_periods::{ByCategory, Category, PeriodRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCommentaryInputs {
    pub score: f64,
    pub previous_score: f64,
    pub count: usize,
    pub min_score: f64,
    pub max_score: f64,
    pub intensity: IntensityCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryInputs {
    pub model: String,
    pub max_tokens: u32,
    pub categories: ByCategory<CategoryCommentaryInputs>,
    pub dominant_category: Category,
    pub trend_direction: TrendDirection,
    pub periods_analyzed: usize,
}

impl CommentaryInputs {
    /// `None` when the series has fewer than two periods.
    ///
    /// `latest` supplies the intensity breakdown of the newest period.
    pub fn from_series(
        series: &TimeSeries,
        latest: Option<&PeriodRecord>,
        config: &CommentaryConfig,
    ) -> Option<Self> {
        let [.., previous, today] = series.data_points.as_slice() else {
            return None;
        };
        let categories = ByCategory::from_fn(|category| {
            let values = series.category_values(category);
            let mut intensity = IntensityCounts::default();
            if let Some(record) = latest {
                for quote in record.quotes.get(category) {
                    intensity.add(quote.intensity);
                }
            }
            CategoryCommentaryInputs {
                score: *today.zscore_sums.get(category),
                previous_score: *previous.zscore_sums.get(category),
                count: *today.counts.get(category),
                min_score: values.iter().copied().fold(f64::INFINITY, f64::min),
                max_score: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                intensity,
            }
        });
        Some(Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            categories,
            dominant_category: dominant_category(&today.zscore_sums),
            trend_direction: series.trend.direction,
            periods_analyzed: series.len(),
        })
    }
}

pub trait CommentaryProvider {
    fn generate(&self, inputs: &CommentaryInputs) -> AppResult<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCommentaryProvider;

impl DisabledCommentaryProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CommentaryProvider for DisabledCommentaryProvider {
    fn generate(&self, _inputs: &CommentaryInputs) -> AppResult<String> {
        Err(AppError::usage("commentary provider is disabled"))
    }
}

/// Runs the provider; any failure yields an empty commentary.
pub fn generate_commentary(provider: &dyn CommentaryProvider, inputs: Option<&CommentaryInputs>) -> String {
    let Some(inputs) = inputs else {
        return String::new();
    };
    match provider.generate(inputs) {
        Ok(text) => {
            let text = text.trim();
            let text = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            debug!(chars = text.len(), "commentary generated");
            text.to_string()
        }
        Err(err) => {
            warn!(error = %err, "commentary unavailable");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider(&'static str);

    impl CommentaryProvider for StaticProvider {
        fn generate(&self, _inputs: &CommentaryInputs) -> AppResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn inputs() -> CommentaryInputs {
        let category = CategoryCommentaryInputs {
            score: 1.0,
            previous_score: 0.5,
            count: 2,
            min_score: 0.0,
            max_score: 1.0,
            intensity: IntensityCounts::default(),
        };
        CommentaryInputs {
            model: "model".to_string(),
            max_tokens: 100,
            categories: ByCategory::from_fn(|_| category.clone()),
            dominant_category: Category::Fears,
            trend_direction: TrendDirection::Stable,
            periods_analyzed: 2,
        }
    }

    #[test]
    fn disabled_provider_yields_empty_commentary() {
        let text = generate_commentary(&DisabledCommentaryProvider::new(), Some(&inputs()));
        assert!(text.is_empty());
    }

    #[test]
    fn surrounding_quotes_are_stripped() {
        let text = generate_commentary(&StaticProvider("  \"Fears eased today.\" "), Some(&inputs()));
        assert_eq!(text, "Fears eased today.");
    }

    #[test]
    fn missing_inputs_skip_the_provider() {
        assert!(generate_commentary(&StaticProvider("unused"), None).is_empty());
    }
}
