//! Particle canvas widget

use ratatui::{
    layout::Rect,
    style::Color,
    symbols,
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders,
    },
    Frame,
};
use tenkey::vis::Particle;

use super::host::FIELD;

/// Render the particle field
pub fn render_particles(frame: &mut Frame, area: Rect, particles: &[Particle], title: &str) {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL);

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, FIELD.0])
        .y_bounds([0.0, FIELD.1])
        .paint(|ctx| {
            for p in particles {
                ctx.draw(&Points {
                    coords: &[(p.x, p.y)],
                    color: hue_to_color(p.hue),
                });
            }
        });

    frame.render_widget(canvas, area);
}

/// Fully saturated, full value HSV colour for `hue` in degrees.
fn hue_to_color(hue: f64) -> Color {
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let to_u8 = |c: f64| (c * 255.0).round() as u8;
    Color::Rgb(to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hue_to_color(0.0), Color::Rgb(255, 0, 0));
        assert_eq!(hue_to_color(120.0), Color::Rgb(0, 255, 0));
        assert_eq!(hue_to_color(240.0), Color::Rgb(0, 0, 255));
        assert_eq!(hue_to_color(360.0), Color::Rgb(255, 0, 0));
    }
}
