use super::model::{Marker, TrailState};
use cairo::Context;
use palette::Srgb;
use std::f64::consts::PI;

pub fn draw(cr: &Context, state: &TrailState) -> Result<(), cairo::Error> {
    let config = &state.config;
    for marker in &state.markers {
        if marker.opacity <= 0.0 {
            continue;
        }
        draw_marker(
            cr,
            marker,
            config.circle_width,
            config.circle_height,
            config.circle_border_radius,
        )?;
    }
    Ok(())
}

fn draw_marker(
    cr: &Context,
    marker: &Marker,
    width: f64,
    height: f64,
    border_radius: f64,
) -> Result<(), cairo::Error> {
    let w = width * marker.scale;
    let h = height * marker.scale;
    let radius = (border_radius * marker.scale).min(w / 2.0).min(h / 2.0);
    let (x, y) = (marker.center.x - w / 2.0, marker.center.y - h / 2.0);

    let color: Srgb<f64> = marker.color.into_format();
    cr.set_source_rgba(color.red, color.green, color.blue, marker.opacity);
    rounded_rect(cr, x, y, w, h, radius);
    cr.fill()
}

fn rounded_rect(cr: &Context, x: f64, y: f64, w: f64, h: f64, r: f64) {
    cr.new_sub_path();
    cr.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
    cr.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
    cr.arc(x + r, y + h - r, r, PI / 2.0, PI);
    cr.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
    cr.close_path();
}
