use super::plot::PlotConfig;
use super::{finite_min_and_max, Channel, LogTable};
use minifb::{Key, Window, WindowOptions};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::error::Error;
use std::ops::Range;
use tracing::{debug, info};

pub const X_DESC: &str = "Sample";
const TITLE_FONT_SIZE: i32 = 32;
const LABEL_FONT_SIZE: i32 = 18;
const LINE_WIDTH: u32 = 2;
// axis ends stay within this so the axis span itself is finite
const MAX_AXIS_ABS: f64 = f64::MAX / 4.;

/// x range shared by the three panels, the row index of the first and last record
pub fn time_range(n: usize) -> Range<f64> {
    0f64..(n.max(2) - 1) as f64
}

/// y range over the finite values with a 10% margin,
/// optionally stretched to include zero
pub fn value_range(ys: &[f64], include_zero: bool) -> Range<f64> {
    let (mut ymin, mut ymax) = match finite_min_and_max(ys) {
        Some(m) => m,
        None => return -1f64..1f64,
    };
    if include_zero {
        ymin = ymin.min(0.);
        ymax = ymax.max(0.);
    }
    // divided before subtracting so +-1e308 does not overflow
    let ymargin = ymax / 10f64 - ymin / 10f64;
    let ymargin = if ymargin < 1e-10 { 0.5 } else { ymargin };
    let start = (ymin - ymargin).max(-MAX_AXIS_ABS);
    let end = (ymax + ymargin).min(MAX_AXIS_ABS);
    if start < end {
        start..end
    } else {
        -MAX_AXIS_ABS..MAX_AXIS_ABS
    }
}

/// splits the series at the non-finite values, each chunk is drawn as its own line
pub fn finite_segments(xs: &[f64], ys: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Draws the figure title and the three stacked panels (error, derivative, mv)
/// on the given area. All panels share the x range; the error panel
/// carries a dashed reference line at zero.
pub fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    table: &LogTable,
    title: &str,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let body = root.titled(title, ("sans-serif", TITLE_FONT_SIZE))?;
    let panels = body.split_evenly((Channel::ALL.len(), 1));
    let time = table.time_axis();
    let xrange = time_range(table.len());
    let yfmt = |y: &f64| format!("{:.2}", y);

    for (i, (area, &channel)) in panels.iter().zip(Channel::ALL.iter()).enumerate() {
        let bottom = i == Channel::ALL.len() - 1;
        let values = table.column(channel);
        let yrange = value_range(&values, channel == Channel::Error);
        debug!(
            "{} panel: x {:?}, y {:?}",
            channel.label(),
            xrange,
            yrange
        );
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(if bottom { 50 } else { 30 })
            .y_label_area_size(90)
            .build_cartesian_2d(xrange.clone(), yrange.clone())?;

        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(RGBColor(235, 235, 235).stroke_width(1))
            .bold_line_style(RGBColor(200, 200, 200).stroke_width(1))
            .label_style(("sans-serif", LABEL_FONT_SIZE))
            .y_desc(channel.label())
            .y_label_formatter(&yfmt);
        if bottom {
            mesh.x_desc(X_DESC);
        }
        mesh.draw()?;

        if channel == Channel::Error {
            chart.draw_series(DashedLineSeries::new(
                vec![(xrange.start, 0.), (xrange.end, 0.)],
                10,
                6,
                RED.stroke_width(1),
            ))?;
        }

        let color = channel.color();
        for segment in finite_segments(&time, &values) {
            // only differs from the data when it lies beyond MAX_AXIS_ABS
            let clamped = segment
                .into_iter()
                .map(|(x, y)| (x, y.max(yrange.start).min(yrange.end)));
            chart.draw_series(LineSeries::new(clamped, color.stroke_width(LINE_WIDTH)))?;
        }
        // empty series carrying the legend entry, also present for an empty table
        chart
            .draw_series(LineSeries::new(
                Vec::<(f64, f64)>::new(),
                color.stroke_width(LINE_WIDTH),
            ))?
            .label(channel.label())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH))
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", LABEL_FONT_SIZE))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

/// packs the RGB bytes written by plotters into the 0RGB words minifb expects
pub fn rgb_to_0rgb(rgb: &[u8]) -> Vec<u32> {
    rgb.chunks_exact(3)
        .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
        .collect()
}

/// Renders the table in memory and shows it in a window,
/// returns once the window is closed or Esc is pressed.
pub fn render(table: &LogTable, config: &PlotConfig) -> Result<(), Box<dyn Error>> {
    let (width, height) = (config.width as usize, config.height as usize);
    let mut rgb: Vec<u8> = vec![0; width * height * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (config.width, config.height))
            .into_drawing_area();
        draw_panels(&root, table, &config.title)?;
        root.present()?;
    }
    let buffer = rgb_to_0rgb(&rgb);

    let window_title = format!("{} - {}", config.title, config.log_file_path.display());
    let mut window = Window::new(&window_title, width, height, WindowOptions::default())?;
    window.set_target_fps(60);
    info!(
        "showing {} rows in a {}x{} window, close it or press Esc to exit",
        table.len(),
        width,
        height
    );
    while window.is_open() && !window.is_key_down(Key::Escape) {
        window.update_with_buffer(&buffer, width, height)?;
    }
    debug!("window closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_covers_every_row() {
        assert_eq!(time_range(3), 0.0..2.0);
        assert_eq!(time_range(1000), 0.0..999.0);
    }

    #[test]
    fn time_range_never_collapses() {
        assert_eq!(time_range(0), 0.0..1.0);
        assert_eq!(time_range(1), 0.0..1.0);
    }

    #[test]
    fn value_range_pads_by_a_tenth() {
        let r = value_range(&[4.0, 5.0, 4.5], false);
        assert!((r.start - 3.9).abs() < 1e-12);
        assert!((r.end - 5.1).abs() < 1e-12);
    }

    #[test]
    fn value_range_includes_zero_for_error() {
        let r = value_range(&[4.0, 5.0], true);
        assert!(r.start < 0.0 && r.end > 5.0);
    }

    #[test]
    fn value_range_of_flat_or_empty_series() {
        assert_eq!(value_range(&[2.0, 2.0], false), 1.5..2.5);
        assert_eq!(value_range(&[], true), -1.0..1.0);
        assert_eq!(value_range(&[f64::NAN], false), -1.0..1.0);
    }

    #[test]
    fn value_range_of_huge_values_stays_finite() {
        for &(ys, zero) in [
            (&[-1e308, 1e308][..], false),
            (&[f64::MAX, f64::MIN][..], true),
            (&[f64::MAX, f64::MAX][..], false),
        ]
        .iter()
        {
            let r = value_range(ys, zero);
            assert!(r.start.is_finite() && r.end.is_finite(), "{:?}", r);
            assert!((r.end - r.start).is_finite(), "{:?}", r);
            assert!(r.start < r.end, "{:?}", r);
        }
    }

    #[test]
    fn segments_break_at_nan() {
        let xs = [0., 1., 2., 3., 4., 5.];
        let ys = [1., f64::NAN, f64::NAN, 2., 3., f64::INFINITY];
        assert_eq!(
            finite_segments(&xs, &ys),
            vec![vec![(0., 1.)], vec![(3., 2.), (4., 3.)]]
        );
        assert!(finite_segments(&[], &[]).is_empty());
    }

    #[test]
    fn rgb_packs_into_words() {
        let rgb = [0xff, 0x00, 0x80, 0x01, 0x02, 0x03];
        assert_eq!(rgb_to_0rgb(&rgb), vec![0x00ff0080, 0x00010203]);
    }
}
