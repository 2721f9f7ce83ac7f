pub mod closure;
pub mod pulls;
pub mod ratio_fit;

mod axes_draw;

/// Placeholder for artifacts without bins.
fn empty_svg(message: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="50"><text x="10" y="30">{message}</text></svg>"#
    )
}
