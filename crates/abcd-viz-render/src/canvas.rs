//! Streaming SVG canvas. Coordinates are points (1/72 in), y grows downwards.

use crate::layout::margins::PlotArea;
use crate::paint::{Align, Font, Glyph, Marker, Paint, Stroke, VAlign};
use crate::text::{TextMetrics, measure};

pub struct Canvas {
    pub width: f64,
    pub height: f64,
    defs: String,
    body: String,
    open_clips: usize,
    n_clips: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(crate::RenderError::Layout(format!(
                "canvas size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height, defs: String::new(), body: String::new(), open_clips: 0, n_clips: 0 })
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, paint: &Paint) {
        let attrs = paint_attrs(paint);
        self.emit(format!(r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}"{attrs}/>"#));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) {
        let attrs = stroke_attrs(stroke);
        self.emit(format!(r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"{attrs}/>"#));
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        let attrs = stroke_attrs(stroke);
        self.emit(format!(r#"<polyline points="{}" fill="none"{attrs}/>"#, point_list(points)));
    }

    /// Closed area between two curves sampled at the same `x` (pixel coordinates).
    pub fn band(&mut self, x: &[f64], lo: &[f64], hi: &[f64], paint: &Paint) {
        let upper = x.iter().zip(hi).map(|(&x, &y)| (x, y));
        let lower = x.iter().zip(lo).map(|(&x, &y)| (x, y)).rev();
        let outline: Vec<(f64, f64)> = upper.chain(lower).collect();
        if outline.len() < 4 {
            return;
        }
        let attrs = paint_attrs(paint);
        self.emit(format!(r#"<path d="M{}Z"{attrs}/>"#, point_list(&outline).replace(' ', " L")));
    }

    /// Histogram outline: one horizontal segment per bin, joined at the edges.
    pub fn step(&mut self, edges: &[f64], y: &[f64], stroke: &Stroke) {
        let points: Vec<(f64, f64)> =
            edges.windows(2).zip(y).flat_map(|(e, &y)| [(e[0], y), (e[1], y)]).collect();
        self.polyline(&points, stroke);
    }

    /// Vertical error bar without caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, stroke: &Stroke) {
        self.line(x, y_lo, x, y_hi, stroke);
    }

    pub fn marker(&mut self, x: f64, y: f64, marker: &Marker) {
        let attrs = paint_attrs(&marker.paint());
        let r = marker.radius;
        match marker.glyph {
            Glyph::Dot => self.emit(format!(r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r:.2}"{attrs}/>"#)),
            Glyph::Square => {
                let (x0, y0, s) = (x - r, y - r, 2.0 * r);
                self.emit(format!(r#"<rect x="{x0:.2}" y="{y0:.2}" width="{s:.2}" height="{s:.2}"{attrs}/>"#));
            }
        }
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, font: &Font) {
        self.text_at(x, y, content, font, None);
    }

    /// Text turned by `angle` degrees around its anchor.
    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, font: &Font, angle: f64) {
        self.text_at(x, y, content, font, Some(angle));
    }

    fn text_at(&mut self, x: f64, y: f64, content: &str, font: &Font, angle: Option<f64>) {
        let mut attrs = format!(
            r#" font-family="Helvetica, Arial, sans-serif" font-size="{:.1}" fill="{}""#,
            font.size,
            font.color.svg()
        );
        match font.align {
            Align::Left => {}
            Align::Center => attrs.push_str(r#" text-anchor="middle""#),
            Align::Right => attrs.push_str(r#" text-anchor="end""#),
        }
        match font.valign {
            VAlign::Baseline => {}
            VAlign::Middle => attrs.push_str(r#" dominant-baseline="central""#),
            VAlign::Top => attrs.push_str(r#" dominant-baseline="hanging""#),
        }
        if font.bold {
            attrs.push_str(r#" font-weight="bold""#);
        }
        if font.italic {
            attrs.push_str(r#" font-style="italic""#);
        }
        if let Some(angle) = angle {
            attrs.push_str(&format!(r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#));
        }
        self.emit(format!(r#"<text x="{x:.2}" y="{y:.2}"{attrs}>{}</text>"#, escape(content)));
    }

    /// Clip what follows to `area` until the matching [`unclip`](Self::unclip).
    pub fn clip_to(&mut self, area: &PlotArea) {
        let id = format!("clip{}", self.n_clips);
        self.n_clips += 1;
        self.defs.push_str(&format!(
            r#"<clipPath id="{id}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath>"#,
            area.left, area.top, area.width, area.height
        ));
        self.defs.push('\n');
        self.emit(format!(r#"<g clip-path="url(#{id})">"#));
        self.open_clips += 1;
    }

    pub fn unclip(&mut self) {
        if self.open_clips > 0 {
            self.open_clips -= 1;
            self.emit("</g>".to_string());
        }
    }

    pub fn measure_text(&self, content: &str, font: &Font) -> TextMetrics {
        measure(content, font)
    }

    /// The finished document; unbalanced clip groups are closed.
    pub fn finish(mut self) -> String {
        while self.open_clips > 0 {
            self.unclip();
        }
        let (w, h) = (self.width, self.height);
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        svg.push('\n');
        if !self.defs.is_empty() {
            svg.push_str("<defs>\n");
            svg.push_str(&self.defs);
            svg.push_str("</defs>\n");
        }
        svg.push_str(&format!("<rect width=\"{w}\" height=\"{h}\" fill=\"white\"/>\n"));
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }

    fn emit(&mut self, element: String) {
        self.body.push_str(&element);
        self.body.push('\n');
    }
}

fn point_list(points: &[(f64, f64)]) -> String {
    points.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).collect::<Vec<_>>().join(" ")
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut attrs = format!(r#" stroke="{}" stroke-width="{:.2}""#, stroke.color.svg(), stroke.width);
    if let Some(pattern) = stroke.dash.pattern() {
        attrs.push_str(&format!(r#" stroke-dasharray="{pattern}""#));
    }
    attrs
}

fn paint_attrs(paint: &Paint) -> String {
    let mut attrs = match paint.fill {
        Some(fill) => format!(r#" fill="{}""#, fill.svg()),
        None => r#" fill="none""#.to_string(),
    };
    if let Some(outline) = &paint.outline {
        attrs.push_str(&stroke_attrs(outline));
    }
    attrs
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn area() -> PlotArea {
        PlotArea::manual(0.0, 0.0, 50.0, 50.0)
    }

    #[test]
    fn empty_canvas_has_a_white_background() {
        let svg = Canvas::new(100.0, 50.0).unwrap().finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(svg.contains(r#"fill="white""#));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        assert!(Canvas::new(0.0, 50.0).is_err());
        assert!(Canvas::new(10.0, f64::NAN).is_err());
    }

    #[test]
    fn filled_and_outlined_rect() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        let paint = Paint::fill(Color::rgb(255, 0, 0)).outlined(Stroke::dashed(Color::BLACK, 0.5));
        c.rect(10.0, 20.0, 50.0, 30.0, &paint);
        let svg = c.finish();
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains(r#"stroke-dasharray="6 3""#));
        assert!(svg.contains(r#"width="50.00""#));
    }

    #[test]
    fn text_is_escaped_and_aligned() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.text(10.0, 20.0, "C/D < 1 & rising", &Font::new(10.0).aligned(Align::Right, VAlign::Middle));
        let svg = c.finish();
        assert!(svg.contains("C/D &lt; 1 &amp; rising"));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r#"dominant-baseline="central""#));
    }

    #[test]
    fn clip_groups_wrap_only_their_contents() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.clip_to(&area());
        c.line(0.0, 0.0, 100.0, 100.0, &Stroke::solid(Color::BLACK, 1.0));
        c.unclip();
        c.line(0.0, 0.0, 10.0, 10.0, &Stroke::solid(Color::BLACK, 1.0));
        c.clip_to(&area());
        let svg = c.finish();
        assert!(svg.contains(r#"<clipPath id="clip0">"#));
        assert!(svg.contains(r#"<clipPath id="clip1">"#));
        assert_eq!(svg.matches("<g clip-path=").count(), svg.matches("</g>").count());
    }

    #[test]
    fn step_and_band_geometry() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.step(&[0.0, 10.0, 20.0], &[5.0, 7.0], &Stroke::solid(Color::BLACK, 1.0));
        c.band(&[0.0, 10.0], &[8.0, 9.0], &[2.0, 3.0], &Paint::fill(Color::grey(200)));
        let svg = c.finish();
        assert!(svg.contains(r#"points="0.00,5.00 10.00,5.00 10.00,7.00 20.00,7.00""#));
        assert!(svg.contains(r#"d="M0.00,2.00 L10.00,3.00 L10.00,9.00 L0.00,8.00Z""#));
    }

    #[test]
    fn marker_glyphs() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.marker(10.0, 10.0, &Marker::dot(Color::BLACK, 2.0));
        c.marker(20.0, 10.0, &Marker::for_kind(abcd_core::SampleKind::Simulated, Color::BLACK, 2.0));
        let svg = c.finish();
        assert!(svg.contains(r#"<circle cx="10.00" cy="10.00" r="2.00""#));
        assert!(svg.contains(r#"<rect x="18.00" y="8.00" width="4.00" height="4.00""#));
    }
}
