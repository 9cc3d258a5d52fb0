use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BorderColor {
    Orange,
    Red,
}

impl Default for BorderColor {
    fn default() -> Self {
        BorderColor::Orange
    }
}

/// A point annotation placed on the current image.
///
/// Coordinates are percentages of the rendered image box and already account
/// for the marker's half-size, so `x_percent`/`y_percent` locate its top-left
/// corner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: i64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub size_units: f64,
    #[serde(default)]
    pub border_color: BorderColor,
}
