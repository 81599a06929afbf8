// Colour scales for zone prices
use serde::Serialize;
use std::fmt;

use super::lmp::PriceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(&'static str);

impl Color {
    pub const fn hex(value: &'static str) -> Self {
        Self(value)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Used for any zone without a value, regardless of scale.
pub const NO_DATA_COLOR: Color = Color::hex("#cccccc");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEntry {
    pub threshold: f64,
    pub color: Color,
}

const fn entry(threshold: f64, color: &'static str) -> ScaleEntry {
    ScaleEntry {
        threshold,
        color: Color::hex(color),
    }
}

/// Thresholds sorted descending and terminated by a `-inf` catch-all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    entries: &'static [ScaleEntry],
}

pub const PRICE_SCALE: ColorScale = ColorScale {
    entries: &[
        entry(100.0, "#b30000"),
        entry(75.0, "#dc3545"),
        entry(62.0, "#ff5500"),
        entry(52.0, "#ff7b00"),
        entry(44.0, "#ff9900"),
        entry(37.0, "#ffc107"),
        entry(30.0, "#99cc33"),
        entry(25.0, "#00cc66"),
        entry(20.0, "#00aaff"),
        entry(0.0, "#007bff"),
        entry(f64::NEG_INFINITY, "#800080"),
    ],
};

pub const DIVERGING_SCALE: ColorScale = ColorScale {
    entries: &[
        entry(20.0, "#8b0000"),
        entry(15.0, "#cc0000"),
        entry(10.0, "#ff6666"),
        entry(6.0, "#ff9999"),
        entry(2.0, "#ffcccc"),
        entry(-2.0, "#ffffff"),
        entry(-6.0, "#bbdefb"),
        entry(-10.0, "#64b5f6"),
        entry(-15.0, "#1976d2"),
        entry(-20.0, "#0d47a1"),
        entry(f64::NEG_INFINITY, "#000050"),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

impl ColorScale {
    pub fn for_price_type(price_type: PriceType) -> Self {
        if price_type.is_diverging() {
            DIVERGING_SCALE
        } else {
            PRICE_SCALE
        }
    }

    pub(crate) fn entries(&self) -> &'static [ScaleEntry] {
        self.entries
    }

    /// First entry whose threshold the value strictly exceeds.
    pub fn color_for(&self, value: Option<f64>) -> Color {
        let value = match value {
            Some(v) if !v.is_nan() => v,
            _ => return NO_DATA_COLOR,
        };
        self.entries
            .iter()
            .find(|e| value > e.threshold)
            .or_else(|| self.entries.last())
            .map(|e| e.color)
            .unwrap_or(NO_DATA_COLOR)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let mut legend = Vec::with_capacity(self.entries.len());
        let mut upper: Option<f64> = None;
        for e in self.entries {
            let label = match upper {
                None => format!("> ${}", e.threshold),
                Some(prev) if e.threshold == f64::NEG_INFINITY => format!("≤ ${}", prev),
                Some(prev) => format!("${} – ${}", e.threshold, prev),
            };
            legend.push(LegendEntry {
                label,
                color: e.color,
            });
            upper = Some(e.threshold);
        }
        legend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_neutral_on_every_scale() {
        assert_eq!(PRICE_SCALE.color_for(None), NO_DATA_COLOR);
        assert_eq!(DIVERGING_SCALE.color_for(None), NO_DATA_COLOR);
        assert_eq!(PRICE_SCALE.color_for(Some(f64::NAN)), NO_DATA_COLOR);
    }

    #[test]
    fn test_boundary_goes_to_lower_bucket() {
        assert_eq!(PRICE_SCALE.color_for(Some(100.0)).as_str(), "#dc3545");
        assert_eq!(PRICE_SCALE.color_for(Some(100.01)).as_str(), "#b30000");
        assert_eq!(PRICE_SCALE.color_for(Some(0.0)).as_str(), "#800080");
        assert_eq!(PRICE_SCALE.color_for(Some(-40.0)).as_str(), "#800080");
    }

    #[test]
    fn test_diverging_scale_centre() {
        assert_eq!(DIVERGING_SCALE.color_for(Some(0.0)).as_str(), "#ffffff");
        assert_eq!(DIVERGING_SCALE.color_for(Some(10.0)).as_str(), "#ff9999");
        assert_eq!(DIVERGING_SCALE.color_for(Some(-25.0)).as_str(), "#000050");
        assert_eq!(ColorScale::for_price_type(PriceType::Congestion), DIVERGING_SCALE);
        assert_eq!(ColorScale::for_price_type(PriceType::Rt), PRICE_SCALE);
    }

    #[test]
    fn test_legend_labels() {
        let legend = PRICE_SCALE.legend();
        assert_eq!(legend.len(), PRICE_SCALE.entries().len());
        assert_eq!(legend[0].label, "> $100");
        assert_eq!(legend[1].label, "$75 – $100");
        assert_eq!(legend.last().unwrap().label, "≤ $0");
    }
}
