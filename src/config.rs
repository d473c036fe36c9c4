use crate::layout::GridLayout;
use crate::measure::TextMetrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    pub metrics: TextMetrics,
    pub grid: GridLayout,
    pub theme: Theme,
    /// Animation frames a settle watcher follows a moving table (~300ms at 60fps).
    pub settle_frames: u32,
    /// Offered in the relationship dialog; the first one is preselected.
    pub relation_kinds: Vec<String>,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            grid: GridLayout::default(),
            theme: Theme::Light,
            settle_frames: 19,
            relation_kinds: ["one-to-one", "one-to-many", "many-to-one", "many-to-many"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DesignerConfig {
    pub fn default_kind(&self) -> &str {
        self.relation_kinds
            .first()
            .map(|s| s.as_str())
            .unwrap_or("one-to-many")
    }
}
