use kopi_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;

/// The three tracked sentiment categories, in their fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fears,
    Frustrations,
    Optimism,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Fears, Category::Frustrations, Category::Optimism];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fears => "fears",
            Category::Frustrations => "frustrations",
            Category::Optimism => "optimism",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Fears => "Fears",
            Category::Frustrations => "Frustrations",
            Category::Optimism => "Optimism",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fears" => Ok(Category::Fears),
            "frustrations" => Ok(Category::Frustrations),
            "optimism" => Ok(Category::Optimism),
            other => Err(AppError::validation(format!(
                "unknown category '{other}'; expected fears|frustrations|optimism"
            ))),
        }
    }
}

/// One value per category, addressed by [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ByCategory<T> {
    pub fears: T,
    pub frustrations: T,
    pub optimism: T,
}

impl<T> ByCategory<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            fears: f(Category::Fears),
            frustrations: f(Category::Frustrations),
            optimism: f(Category::Optimism),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Fears => &self.fears,
            Category::Frustrations => &self.frustrations,
            Category::Optimism => &self.optimism,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Fears => &mut self.fears,
            Category::Frustrations => &mut self.frustrations,
            Category::Optimism => &mut self.optimism,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> ByCategory<U> {
        ByCategory::from_fn(|category| f(category, self.get(category)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Mild,
    #[default]
    Moderate,
    Strong,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Mild, Intensity::Moderate, Intensity::Strong];

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Mild => "mild",
            Intensity::Moderate => "moderate",
            Intensity::Strong => "strong",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Intensity::Mild),
            "moderate" => Ok(Intensity::Moderate),
            "strong" => Ok(Intensity::Strong),
            other => Err(AppError::validation(format!(
                "unknown intensity '{other}'; expected mild|moderate|strong"
            ))),
        }
    }
}

/// An already-classified quote: its engagement weight and intensity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub engagement: i64,
    pub intensity: Intensity,
}

impl Quote {
    pub fn new(engagement: i64, intensity: Intensity) -> Self {
        Self {
            engagement,
            intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ThematicCluster {
    pub entities: Vec<String>,
    pub engagement_score: i64,
    pub dominant_emotion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    #[default]
    Daily,
    Weekly,
}

impl PeriodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            PeriodKind::Daily => "day",
            PeriodKind::Weekly => "week",
        }
    }
}

impl FromStr for PeriodKind {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "daily" => Ok(PeriodKind::Daily),
            "weekly" => Ok(PeriodKind::Weekly),
            other => Err(AppError::usage(format!(
                "invalid period mode '{other}'; expected daily|weekly"
            ))),
        }
    }
}

/// One period's worth of categorized quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period_id: String,
    #[serde(with = "kopi_core::date::iso")]
    pub date: Date,
    pub quotes: ByCategory<Vec<Quote>>,
    #[serde(default)]
    pub clusters: Vec<ThematicCluster>,
}

impl PeriodRecord {
    pub fn new(period_id: impl Into<String>, date: Date, quotes: ByCategory<Vec<Quote>>) -> Self {
        Self {
            period_id: period_id.into(),
            date,
            quotes,
            clusters: Vec::new(),
        }
    }

    pub fn total_quotes(&self) -> usize {
        self.quotes.iter().map(|(_, quotes)| quotes.len()).sum()
    }

    pub fn all_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter().flat_map(|(_, quotes)| quotes.iter())
    }
}
