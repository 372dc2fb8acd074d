use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ColorScale, Rgb};

/// Category dimensions that each own a derived colour scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Country,
    UseCase,
    Technology,
    Architecture,
    Infrastructure,
    Access,
    Test,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Country,
        Dimension::UseCase,
        Dimension::Technology,
        Dimension::Architecture,
        Dimension::Infrastructure,
        Dimension::Access,
        Dimension::Test,
    ];

    pub fn key(self) -> CategoryKey {
        match self {
            Dimension::Country => CategoryKey::Name,
            Dimension::UseCase => CategoryKey::UseCase,
            Dimension::Technology => CategoryKey::Technology,
            Dimension::Architecture => CategoryKey::Architecture,
            Dimension::Infrastructure => CategoryKey::Infrastructure,
            Dimension::Access => CategoryKey::Access,
            Dimension::Test => CategoryKey::Test,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::UseCase => "use_case",
            Dimension::Technology => "technology",
            Dimension::Architecture => "architecture",
            Dimension::Infrastructure => "infrastructure",
            Dimension::Access => "access",
            Dimension::Test => "test",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown dimension `{s}`"))
    }
}

/// Internal category keys with a human-readable label
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    Name,
    NewStatus,
    UseCase,
    Technology,
    Architecture,
    Infrastructure,
    Access,
    CorporatePartnership,
    CrossborderPartnerships,
    Test,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 10] = [
        CategoryKey::Name,
        CategoryKey::NewStatus,
        CategoryKey::UseCase,
        CategoryKey::Technology,
        CategoryKey::Architecture,
        CategoryKey::Infrastructure,
        CategoryKey::Access,
        CategoryKey::CorporatePartnership,
        CategoryKey::CrossborderPartnerships,
        CategoryKey::Test,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CategoryKey::Name => "name",
            CategoryKey::NewStatus => "new_status",
            CategoryKey::UseCase => "use_case",
            CategoryKey::Technology => "technology",
            CategoryKey::Architecture => "architecture",
            CategoryKey::Infrastructure => "infrastructure",
            CategoryKey::Access => "access",
            CategoryKey::CorporatePartnership => "corporate_partnership",
            CategoryKey::CrossborderPartnerships => "crossborder_partnerships",
            CategoryKey::Test => "test",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryKey::Name => "Country",
            CategoryKey::NewStatus => "CBDC Status",
            CategoryKey::UseCase => "Purpose",
            CategoryKey::Technology => "Technology",
            CategoryKey::Architecture => "Architecture",
            CategoryKey::Infrastructure => "Infrastructure",
            CategoryKey::Access => "Access",
            CategoryKey::CorporatePartnership => "Corporate partnership",
            CategoryKey::CrossborderPartnerships => "Crossborder partnerships",
            CategoryKey::Test => "Test",
        }
    }
}

/// `(key, label)` pairs in display order
pub fn display_names() -> Vec<(&'static str, &'static str)> {
    CategoryKey::ALL.iter().map(|k| (k.key(), k.label())).collect()
}

/// Status levels, most advanced first
pub const STATUS_LEVELS: [&str; 6] = ["Launched", "Pilot", "Development", "Research", "Inactive", "Cancelled"];

/// Colours paired index-for-index with [`STATUS_LEVELS`]
pub const STATUS_COLORS: [Rgb; 6] = [
    Rgb::new(0x1b, 0x4f, 0x72),
    Rgb::new(0x2e, 0x86, 0xc1),
    Rgb::new(0x5d, 0xad, 0xe2),
    Rgb::new(0xae, 0xd6, 0xf1),
    Rgb::new(0xd5, 0xd8, 0xdc),
    Rgb::new(0x95, 0xa5, 0xa6),
];

/// The fixed status scale. Not generated.
pub fn status_color_scale() -> ColorScale {
    STATUS_LEVELS
        .iter()
        .zip(STATUS_COLORS)
        .map(|(name, color)| (name.to_string(), color))
        .collect()
}
