//! Viewport actions.
use serde::{Deserialize, Serialize};

/// Centers the viewport on a set of elements (`center`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterAction {
    /// Ids of the elements to center on. Empty means the whole model.
    #[serde(default)]
    pub element_ids: Vec<String>,
    /// Whether the viewport change is animated.
    #[serde(default = "default_animate")]
    pub animate: bool,
    /// Whether the current zoom level is kept.
    #[serde(default)]
    pub retain_zoom: bool,
}

fn default_animate() -> bool {
    true
}

impl CenterAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "center";

    /// Center on `element_ids` with animation and zoom reset.
    pub fn new(element_ids: Vec<String>) -> Self {
        Self {
            element_ids,
            animate: true,
            retain_zoom: false,
        }
    }
}

/// Zooms the viewport so a set of elements fills the screen (`fit`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitToScreenAction {
    /// Ids of the elements to fit. Empty means the whole model.
    #[serde(default)]
    pub element_ids: Vec<String>,
    /// Padding, in model coordinates, left around the fitted elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    /// Upper bound on the resulting zoom level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// Whether the viewport change is animated.
    #[serde(default = "default_animate")]
    pub animate: bool,
}

impl FitToScreenAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "fit";

    /// Fit `element_ids` with animation and no padding/zoom constraints.
    pub fn new(element_ids: Vec<String>) -> Self {
        Self {
            element_ids,
            padding: None,
            max_zoom: None,
            animate: true,
        }
    }
}
