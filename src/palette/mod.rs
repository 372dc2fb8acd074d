//! Categorical colour scales.
//!
//! Colours are spaced evenly around the hue circle at a fixed chroma and
//! luminance. A scale is regenerated wholesale from its category list; there
//! are no partial updates.

mod categories;
mod color;

pub use categories::{
    display_names, status_color_scale, CategoryKey, Dimension, STATUS_COLORS, STATUS_LEVELS,
};
pub use color::{Hcl, Lab, ParseColorError, Rgb};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

pub const DEFAULT_CHROMA: f64 = 50.0;
pub const DEFAULT_LIGHTNESS: f64 = 80.0;
pub const DEFAULT_NA_LABEL: &str = "not available";
pub const DEFAULT_UD_LABEL: &str = "Undecided";
pub const DEFAULT_NA_COLOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// A record from a filtered category list; only `name` is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// `n` colours with hue `360 * i / (n + 1)`. The `+ 1` leaves a gap so the
/// last hue never meets the first.
///
/// Distinctness is bounded by 8-bit rounding and gamut clamping: at the
/// default chroma and lightness every colour is unique up to `n = 86`, and
/// neighbouring hues start to collide from `n = 87`.
pub fn generate_category_colors(n: usize, chroma: f64, lightness: f64) -> Vec<Rgb> {
    (0..n)
        .map(|i| Hcl::new(360.0 * i as f64 / (1.0 + n as f64), chroma, lightness).to_rgb())
        .collect()
}

/// Assign each item the generated colour at its index, except items named
/// `na_label` or `ud_label`, which get `na_color`. The colour generated for
/// such an index is dropped; later items keep their own index.
pub fn generate_harmonic_color_scale<S: AsRef<str>>(
    items: &[S],
    na_label: &str,
    ud_label: &str,
    na_color: Rgb,
) -> ColorScale {
    harmonic_scale(items, na_label, ud_label, na_color, DEFAULT_CHROMA, DEFAULT_LIGHTNESS)
}

fn harmonic_scale<S: AsRef<str>>(
    items: &[S],
    na_label: &str,
    ud_label: &str,
    na_color: Rgb,
    chroma: f64,
    lightness: f64,
) -> ColorScale {
    let colors = generate_category_colors(items.len(), chroma, lightness);
    let mut scale = ColorScale::default();
    for (item, color) in items.iter().zip(colors) {
        let name = item.as_ref();
        let color = if name == na_label || name == ud_label { na_color } else { color };
        scale.insert(name, color);
    }
    scale
}

/// Generation parameters shared by every category dimension
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    pub chroma: f64,
    pub lightness: f64,
    pub na_label: String,
    pub ud_label: String,
    pub na_color: Rgb,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            chroma: DEFAULT_CHROMA,
            lightness: DEFAULT_LIGHTNESS,
            na_label: DEFAULT_NA_LABEL.to_string(),
            ud_label: DEFAULT_UD_LABEL.to_string(),
            na_color: DEFAULT_NA_COLOR,
        }
    }
}

impl PaletteOptions {
    pub fn scale_for(&self, categories: &[Category]) -> ColorScale {
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        harmonic_scale(
            &names,
            &self.na_label,
            &self.ud_label,
            self.na_color,
            self.chroma,
            self.lightness,
        )
    }
}

/// Ordered mapping from category name to colour.
///
/// Keeps first-insertion order; inserting an existing name replaces its
/// colour in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorScale {
    entries: Vec<(String, Rgb)>,
    index: HashMap<String, usize>,
}

impl ColorScale {
    pub fn insert(&mut self, name: &str, color: Rgb) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = color,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), color));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> + '_ {
        self.entries.iter().map(|(name, color)| (name.as_str(), *color))
    }
}

impl FromIterator<(String, Rgb)> for ColorScale {
    fn from_iter<T: IntoIterator<Item = (String, Rgb)>>(iter: T) -> Self {
        let mut scale = ColorScale::default();
        for (name, color) in iter {
            scale.insert(&name, color);
        }
        scale
    }
}

impl Serialize for ColorScale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, color) in &self.entries {
            map.serialize_entry(name, color)?;
        }
        map.end()
    }
}
