//! Visualization utilities for highway_planner
//!
//! Thin wrapper over gnuplot for plotting tracks, driven traces and traffic.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D, Pose2D};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const CENTERLINE: &str = GRAY;
    pub const LANE_EDGE: &str = BLACK;
    pub const TRACE: &str = BLUE;
    pub const PLANNED: &str = RED;
    pub const EGO: &str = CYAN;
    pub const TRAFFIC: &str = ORANGE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PLANNED, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Zoom onto a square window around `center`
    pub fn focus(&mut self, center: Point2D, half_width: f64) -> &mut Self {
        self.set_x_range(center.x - half_width, center.x + half_width);
        self.set_y_range(center.y - half_width, center.y + half_width)
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.plot_path_xy(&path.x_coords(), &path.y_coords(), style)
    }

    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        let axes = self.figure.axes2d();
        if style.caption.is_empty() {
            axes.lines(x, y, &[Color(style.color.as_str()), LineWidth(style.line_width)]);
        } else {
            axes.lines(x, y, &[
                Caption(style.caption.as_str()),
                Color(style.color.as_str()),
                LineWidth(style.line_width),
            ]);
        }
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();

        self.figure.axes2d().points(&x, &y, &[
            Caption(style.caption.as_str()),
            Color(style.color.as_str()),
            PointSymbol(style.symbol),
            PointSize(style.size),
        ]);
        self
    }

    /// Vehicle position with a short heading line
    pub fn plot_vehicle(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        self.plot_points(&[pose.position()], &PointStyle::new(colors::EGO, "Ego").with_size(size));

        let arrow_len = size * 4.0;
        let end_x = pose.x + arrow_len * pose.yaw.cos();
        let end_y = pose.y + arrow_len * pose.yaw.sin();
        self.figure.axes2d().lines(&[pose.x, end_x], &[pose.y, end_y], &[
            Color(colors::EGO),
            LineWidth(2.0),
        ]);
        self
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    pub fn save_svg(&mut self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        self.apply_settings();
        self.figure
            .save_to_svg(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualizer_creation() {
        let vis = Visualizer::new();
        assert_eq!(vis.aspect_ratio, Some(1.0));
        assert!(vis.x_range.is_none());
    }

    #[test]
    fn test_focus_sets_square_window() {
        let mut vis = Visualizer::new();
        vis.focus(Point2D::new(10.0, -5.0), 50.0);
        assert_eq!(vis.x_range, Some((-40.0, 60.0)));
        assert_eq!(vis.y_range, Some((-55.0, 45.0)));
    }

    #[test]
    fn test_styles() {
        let style = PathStyle::new(colors::TRACE, "Driven").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::BLUE);
        let point = PointStyle::new(colors::TRAFFIC, "Traffic").with_size(2.0).with_symbol('S');
        assert_eq!(point.symbol, 'S');
        assert_eq!(point.size, 2.0);
    }
}
