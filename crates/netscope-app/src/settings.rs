use anyhow::{ensure, Context};
use netscope_core::LayoutDirection;
use netscope_graph::{FitOptions, LayoutConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "netscope";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub layout_direction: LayoutDirection,
    pub show_edge_labels: bool,
    pub show_legend: bool,
    pub layout: LayoutConfig,
    /// Applied right after a graph loads.
    pub initial_fit: FitOptions,
    /// Applied by the fit-view command.
    pub toolbar_fit: FitOptions,
    pub fit_duration_ms: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            layout_direction: LayoutDirection::TopToBottom,
            show_edge_labels: true,
            show_legend: true,
            layout: LayoutConfig::default(),
            initial_fit: FitOptions::initial_load(),
            toolbar_fit: FitOptions::full(),
            fit_duration_ms: 800,
        }
    }
}

impl ViewerSettings {
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Rejects values the layout and fit stages cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let layout = &self.layout;
        ensure!(
            layout.node_width.is_finite() && layout.node_width > 0.0,
            "layout.node_width must be positive, got {}",
            layout.node_width
        );
        ensure!(
            layout.node_height.is_finite() && layout.node_height > 0.0,
            "layout.node_height must be positive, got {}",
            layout.node_height
        );
        for separation in [&layout.vertical, &layout.horizontal] {
            ensure!(
                separation.node.is_finite() && separation.rank.is_finite(),
                "layout separations must be finite"
            );
        }
        validate_fit("initial_fit", &self.initial_fit)?;
        validate_fit("toolbar_fit", &self.toolbar_fit)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings file {}", path.display()))
    }

    /// Settings from the user config dir, or defaults when absent or broken.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::info!("No config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        tracing::info!("Loading settings from {:?}", path);
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("{e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path().context("no config directory available")?;
        self.save_to(&path)
    }
}

fn validate_fit(name: &str, fit: &FitOptions) -> anyhow::Result<()> {
    for (field, zoom) in [("min_zoom", fit.min_zoom), ("max_zoom", fit.max_zoom)] {
        ensure!(
            zoom.is_finite() && zoom > 0.0,
            "{name}.{field} must be positive, got {zoom}"
        );
    }
    ensure!(
        fit.min_zoom <= fit.max_zoom,
        "{name}.min_zoom ({}) exceeds max_zoom ({})",
        fit.min_zoom,
        fit.max_zoom
    );
    ensure!(
        fit.padding.is_finite() && fit.padding >= 0.0,
        "{name}.padding must be non-negative, got {}",
        fit.padding
    );
    ensure!(
        fit.viewport_width.is_finite()
            && fit.viewport_width > 0.0
            && fit.viewport_height.is_finite()
            && fit.viewport_height > 0.0,
        "{name} viewport must be positive, got {}x{}",
        fit.viewport_width,
        fit.viewport_height
    );
    Ok(())
}
