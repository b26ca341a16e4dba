use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::analysis::error::{Result, SweepError};
use crate::analysis::SweepResult;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Caption, axis labels and legend. These need a system font; turn off on headless hosts.
    pub labels: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, WHITE],
            labels: true,
        }
    }
}
/// Overlays every accepted trace of `result` on the shared time axis.
pub fn render_traces_png(result: &SweepResult, style: &PlotStyle) -> Result<Vec<u8>> {
    if result.traces.is_empty() {
        return Err(SweepError::Plot("sweep produced no valid traces".into()));
    }
    if style.width == 0 || style.height == 0 || style.palette.is_empty() {
        return Err(SweepError::Plot(
            "plot style needs a non-zero size and at least one colour".into(),
        ));
    }
    let times = result.time_axis.times_ms();
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (y_min, y_max) = result
            .traces
            .iter()
            .flat_map(|t| t.samples_mv.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let y_bounds = if (y_max - y_min).abs() < f64::EPSILON {
            (y_min - 5.0, y_max + 5.0)
        } else {
            let pad = (y_max - y_min) * 0.05;
            (y_min - pad, y_max + pad)
        };
        let x_bounds = if result.time_axis.len() > 1 {
            (result.time_axis.start_ms(), result.time_axis.end_ms())
        } else {
            (result.time_axis.start_ms() - 0.5, result.time_axis.start_ms() + 0.5)
        };
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.labels {
            builder
                .caption(
                    format!("Membrane response ({} model)", result.model),
                    ("sans-serif", 20).into_font().color(&WHITE),
                )
                .set_label_area_size(LabelAreaPosition::Left, 55)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart =
            builder.build_cartesian_2d(x_bounds.0..x_bounds.1, y_bounds.0..y_bounds.1)?;
        if style.labels {
            chart
                .configure_mesh()
                .x_desc("time (ms)")
                .y_desc("membrane potential (mV)")
                .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
                .label_style(("sans-serif", 12).into_font().color(&WHITE))
                .light_line_style(&WHITE.mix(0.1))
                .draw()?;
        }
        for (idx, trace) in result.traces.iter().enumerate() {
            let color = style.palette[idx % style.palette.len()];
            let series = times.iter().copied().zip(trace.samples_mv.iter().copied());
            let drawn = chart.draw_series(LineSeries::new(series, &color))?;
            if style.labels {
                drawn
                    .label(format!("{:.2} mA", trace.current_ma))
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
        if style.labels {
            chart
                .configure_series_labels()
                .label_font(("sans-serif", 12).into_font().color(&WHITE))
                .border_style(&WHITE.mix(0.2))
                .background_style(&style.background)
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn save_traces_png(result: &SweepResult, style: &PlotStyle, path: &Path) -> Result<()> {
    let png = render_traces_png(result, style)?;
    std::fs::write(path, png)?;
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| SweepError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
