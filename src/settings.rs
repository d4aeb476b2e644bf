//! Process-wide presentation defaults shared by every chart

use once_cell::sync::OnceCell;
use plotters::style::RGBColor;

static PLOT_SETTINGS: OnceCell<PlotSettings> = OnceCell::new();

/// Figure geometry, font tiers and theme colours.
///
/// Font sizes are in points and converted to pixels at `dpi`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    /// Figure size in inches (width, height)
    pub figure_size: (f64, f64),
    pub dpi: u32,
    pub font_family: &'static str,
    pub font_size: f64,
    pub axes_label_size: f64,
    pub axes_title_size: f64,
    pub xtick_label_size: f64,
    pub ytick_label_size: f64,
    pub background: RGBColor,
    pub grid_color: RGBColor,
    pub text_color: RGBColor,
}

impl Default for PlotSettings {
    /// White-grid theme, 12 x 7 inch figures at 300 DPI
    fn default() -> Self {
        Self {
            figure_size: (12.0, 7.0),
            dpi: 300,
            font_family: "sans-serif",
            font_size: 12.0,
            axes_label_size: 14.0,
            axes_title_size: 16.0,
            xtick_label_size: 12.0,
            ytick_label_size: 12.0,
            background: RGBColor(255, 255, 255),
            grid_color: RGBColor(204, 204, 204),
            text_color: RGBColor(38, 38, 38),
        }
    }
}

impl PlotSettings {
    /// Bitmap size in pixels
    pub fn figure_pixels(&self) -> (u32, u32) {
        let (w, h) = self.figure_size;
        (
            (w * self.dpi as f64).round() as u32,
            (h * self.dpi as f64).round() as u32,
        )
    }

    /// Convert a size in points to pixels
    pub fn px(&self, points: f64) -> u32 {
        (points * self.dpi as f64 / 72.0).round() as u32
    }

    pub fn title_font(&self) -> (&'static str, u32) {
        (self.font_family, self.px(self.axes_title_size))
    }

    pub fn label_font(&self) -> (&'static str, u32) {
        (self.font_family, self.px(self.axes_label_size))
    }

    pub fn xtick_font(&self) -> (&'static str, u32) {
        (self.font_family, self.px(self.xtick_label_size))
    }

    pub fn ytick_font(&self) -> (&'static str, u32) {
        (self.font_family, self.px(self.ytick_label_size))
    }

    pub fn annotation_font(&self) -> (&'static str, u32) {
        (self.font_family, self.px(self.font_size))
    }
}

/// Install the default presentation settings. Only the first call has any
/// effect.
pub fn configure_plot_settings() {
    if PLOT_SETTINGS.set(PlotSettings::default()).is_ok() {
        tracing::debug!("plot settings configured");
    }
}

/// Settings read by chart generators; defaults if never configured
pub fn plot_settings() -> &'static PlotSettings {
    PLOT_SETTINGS.get_or_init(PlotSettings::default)
}
