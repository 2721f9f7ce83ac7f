use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::header_height;
use crate::layout::axes::Axis;
use crate::paint::Font;

/// Rectangle of the canvas holding one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Single panel filling the canvas inside margins sized for the axes.
    pub fn auto(canvas: &Canvas, y_axis: &Axis, x_axis: &Axis, config: &VizConfig) -> Self {
        let left = left_margin(canvas, y_axis, config);
        let top = header_height(config);
        let bottom = bottom_margin(x_axis, config);
        let right = 15.0;
        Self {
            left,
            top,
            width: (canvas.width - left - right).max(50.0),
            height: (canvas.height - top - bottom).max(50.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Pixel x of a data value on `axis`.
    pub fn x(&self, axis: &Axis, value: f64) -> f64 {
        self.left + axis.fraction(value) * self.width
    }

    /// Pixel y of a data value on `axis`.
    pub fn y(&self, axis: &Axis, value: f64) -> f64 {
        self.bottom() - axis.fraction(value) * self.height
    }

    /// Split into an upper main panel and a lower panel taking `lower_frac`
    /// of the height, `gap` apart.
    pub fn split(self, gap: f64, lower_frac: f64) -> (PlotArea, PlotArea) {
        let lower_h = self.height * lower_frac;
        let upper_h = self.height - lower_h - gap;
        (
            PlotArea::manual(self.left, self.top, self.width, upper_h),
            PlotArea::manual(self.left, self.top + upper_h + gap, self.width, lower_h),
        )
    }
}

/// Left margin fitting the y tick labels and the rotated axis title.
pub fn left_margin(canvas: &Canvas, y_axis: &Axis, config: &VizConfig) -> f64 {
    let tick_font = Font::new(config.font.tick_size);
    let widest = y_axis
        .major
        .iter()
        .map(|t| canvas.measure_text(&t.label, &tick_font).width)
        .fold(0.0_f64, f64::max);
    let title = if y_axis.title.is_empty() { 0.0 } else { config.font.label_size + 6.0 };
    15.0 + widest + 8.0 + title
}

/// Space under a panel for x tick labels and the axis title.
pub fn bottom_margin(x_axis: &Axis, config: &VizConfig) -> f64 {
    let title = if x_axis.title.is_empty() { 0.0 } else { config.font.label_size + 6.0 };
    15.0 + config.font.tick_size + 6.0 + title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_panels_stack_without_overlap() {
        let (main, lower) = PlotArea::manual(40.0, 30.0, 400.0, 400.0).split(4.0, 0.25);
        assert_eq!(lower.height, 100.0);
        assert_eq!(main.height, 296.0);
        assert_eq!(main.bottom() + 4.0, lower.top);
        assert_eq!(lower.bottom(), 430.0);
    }

    #[test]
    fn data_to_pixels() {
        let area = PlotArea::manual(100.0, 50.0, 200.0, 100.0);
        let axis = Axis::linear(0.0, 10.0, 6);
        assert_eq!(area.x(&axis, 5.0), 200.0);
        assert_eq!(area.y(&axis, 0.0), 150.0);
        assert_eq!(area.y(&axis, 10.0), 50.0);
    }

    #[test]
    fn titled_axes_need_more_room() {
        let canvas = Canvas::new(400.0, 400.0).unwrap();
        let config = VizConfig::default();
        let bare = Axis::linear(0.0, 1000.0, 5);
        let titled = bare.clone().titled("Events");
        assert!(left_margin(&canvas, &titled, &config) > left_margin(&canvas, &bare, &config));
        let area = PlotArea::auto(&canvas, &titled, &titled, &config);
        assert!(area.right() < canvas.width && area.bottom() < canvas.height);
    }
}
