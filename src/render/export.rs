//! Static multi-panel PNG export of the current view.
//!
//! Export is split in two: [`prepare_figure`] windows every visible series to
//! the viewport and is fully deterministic; a [`FigureRenderer`] turns the
//! prepared figure into image bytes. Only the filename carries the
//! generation time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::NaiveDateTime;
use plotters::prelude::*;

use crate::config::ExportSettings;
use crate::data::datetime::format_date;
use crate::error::ExportError;
use crate::render::interaction::padded_bounds;
use crate::render::projection::Projection;

/// One stacked panel of the exported figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPanel {
    pub label: String,
    pub color: [u8; 4],
    pub points: Vec<(f64, f64)>,
    pub y_range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFigure {
    pub title: String,
    pub x_range: (f64, f64),
    pub width: u32,
    pub panel_height: u32,
    pub panels: Vec<ExportPanel>,
}

impl ExportFigure {
    /// Total image height, `None` if it does not fit in a `u32`.
    pub fn height(&self) -> Option<u32> {
        u32::try_from(self.panels.len())
            .ok()
            .and_then(|n| self.panel_height.checked_mul(n))
    }
}

/// Window every descriptor to the viewport, keeping display order.
pub fn prepare_figure(
    projection: &Projection,
    settings: &ExportSettings,
) -> Result<ExportFigure, ExportError> {
    if projection.is_empty() {
        return Err(ExportError::NoSeriesSelected);
    }

    let (start, end) = projection.viewport.range();
    let panels = projection
        .descriptors
        .iter()
        .map(|d| {
            let points = d.points_in(start, end);
            let (min, max) = points
                .iter()
                .map(|p| p.1)
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| (a.min(v), b.max(v)));
            ExportPanel {
                label: d.label(),
                color: d.color,
                points,
                y_range: padded_bounds(min, max),
            }
        })
        .collect();

    Ok(ExportFigure {
        title: settings.title.clone(),
        x_range: (start, end),
        width: settings.width,
        panel_height: settings.panel_height,
        panels,
    })
}

/// `<product>_export_<YYYYMMDD_HHMMSS>.png`
pub fn export_filename(product: &str, generated_at: NaiveDateTime) -> String {
    format!("{product}_export_{}.png", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Turns a prepared figure into encoded image bytes.
pub trait FigureRenderer: Send + Sync {
    fn render_png(&self, figure: &ExportFigure) -> Result<Vec<u8>, ExportError>;
}

/// Draws with plotters into an RGB buffer and encodes it as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

fn render_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render(e.to_string())
}

/// plotters rejects empty ranges.
fn non_degenerate(range: (f64, f64)) -> (f64, f64) {
    if range.1 - range.0 > 1e-9 {
        range
    } else {
        (range.0 - 0.5, range.1 + 0.5)
    }
}

impl FigureRenderer for PlottersRenderer {
    fn render_png(&self, figure: &ExportFigure) -> Result<Vec<u8>, ExportError> {
        if figure.panels.is_empty() {
            return Err(ExportError::NoSeriesSelected);
        }
        let width = figure.width;
        let height = figure
            .height()
            .ok_or_else(|| ExportError::Render("figure too large".to_string()))?;
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(3))
            .ok_or_else(|| ExportError::Render("figure too large".to_string()))?;
        let mut buffer = vec![0u8; len];
        let (x0, x1) = non_degenerate(figure.x_range);
        let date_label = |t: &f64| format_date(*t);
        let grid = RGBColor(220, 220, 220);
        let axis = RGBColor(90, 90, 90);

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let body = root
                .titled(&figure.title, ("sans-serif", 28).into_font().style(FontStyle::Bold))
                .map_err(render_err)?;
            let areas = body.split_evenly((figure.panels.len(), 1));
            let last = figure.panels.len() - 1;

            for (i, (area, panel)) in areas.iter().zip(&figure.panels).enumerate() {
                let (y0, y1) = non_degenerate(panel.y_range);
                let mut chart = ChartBuilder::on(area)
                    .margin(10)
                    .set_label_area_size(LabelAreaPosition::Left, 110)
                    .set_label_area_size(LabelAreaPosition::Bottom, if i == last { 70 } else { 10 })
                    .build_cartesian_2d(x0..x1, y0..y1)
                    .map_err(render_err)?;

                let mut mesh = chart.configure_mesh();
                mesh.y_desc(panel.label.as_str())
                    .axis_desc_style(("sans-serif", 16).into_font())
                    .label_style(("sans-serif", 13).into_font())
                    .axis_style(&axis)
                    .light_line_style(&WHITE)
                    .bold_line_style(&grid);
                if i == last {
                    mesh.x_desc("Time").x_labels(8).x_label_formatter(&date_label);
                } else {
                    mesh.x_labels(0);
                }
                mesh.draw().map_err(render_err)?;

                let color = RGBColor(panel.color[0], panel.color[1], panel.color[2]);
                chart
                    .draw_series(LineSeries::new(panel.points.iter().copied(), color.stroke_width(1)))
                    .map_err(render_err)?;
            }
            root.present().map_err(render_err)?;
        }

        let image = image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ExportError::Encode("buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        Ok(png)
    }
}

/// A finished export, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub panel_count: usize,
}

impl ImageArtifact {
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    pub fn status_message(&self, path: &Path) -> String {
        let plots = if self.panel_count == 1 { "plot" } else { "plots" };
        format!("Exported {} {plots} to {}", self.panel_count, path.display())
    }
}

pub struct StaticExporter<R: FigureRenderer = PlottersRenderer> {
    settings: ExportSettings,
    renderer: R,
}

impl StaticExporter<PlottersRenderer> {
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_renderer(settings, PlottersRenderer)
    }
}

impl<R: FigureRenderer> StaticExporter<R> {
    pub fn with_renderer(settings: ExportSettings, renderer: R) -> Self {
        Self { settings, renderer }
    }

    pub fn export(
        &self,
        projection: &Projection,
        generated_at: NaiveDateTime,
    ) -> Result<ImageArtifact, ExportError> {
        let figure = prepare_figure(projection, &self.settings)?;
        let bytes = self.renderer.render_png(&figure)?;
        tracing::info!(
            "Rendered export with {} panels ({} bytes)",
            figure.panels.len(),
            bytes.len()
        );
        Ok(ImageArtifact {
            filename: export_filename(&self.settings.product, generated_at),
            bytes,
            panel_count: figure.panels.len(),
        })
    }
}

/// Admits one export at a time. A request made while another is in flight
/// is rejected with [`ExportError::Busy`].
#[derive(Debug, Clone, Default)]
pub struct ExportSlot {
    in_flight: Arc<AtomicBool>,
}

/// Held for the duration of one export; releases the slot on drop.
#[derive(Debug)]
pub struct ExportTicket {
    in_flight: Arc<AtomicBool>,
}

impl ExportSlot {
    pub fn try_acquire(&self) -> Result<ExportTicket, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        Ok(ExportTicket {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// An export running on a worker thread. The slot stays taken until the
/// job's outcome has been collected and the job is dropped.
pub struct ExportJob {
    handle: Option<JoinHandle<Result<String, ExportError>>>,
    _ticket: ExportTicket,
}

impl ExportJob {
    /// Render `projection` and write it under `dir` on a new thread.
    /// Rejected with `Busy` while another job holds `slot`, and with
    /// `NoSeriesSelected` when nothing is visible. `on_done` runs on the
    /// worker once the artifact is written or the export failed.
    pub fn spawn<R: FigureRenderer + 'static>(
        exporter: Arc<StaticExporter<R>>,
        slot: &ExportSlot,
        projection: Projection,
        dir: PathBuf,
        generated_at: NaiveDateTime,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Result<Self, ExportError> {
        let ticket = slot.try_acquire()?;
        if projection.is_empty() {
            return Err(ExportError::NoSeriesSelected);
        }
        tracing::info!(
            "Exporting {} panels to {}",
            projection.descriptors.len(),
            dir.display()
        );
        let handle = std::thread::spawn(move || {
            let outcome = exporter.export(&projection, generated_at).and_then(|artifact| {
                let path = artifact.save_in(&dir)?;
                Ok(artifact.status_message(&path))
            });
            on_done();
            outcome
        });
        Ok(Self {
            handle: Some(handle),
            _ticket: ticket,
        })
    }

    /// The outcome once the worker has finished, otherwise `None`. A worker
    /// that panicked is reported as a render failure.
    pub fn poll(&mut self) -> Option<Result<String, ExportError>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(
            handle
                .join()
                .unwrap_or_else(|_| Err(ExportError::Render("export worker panicked".to_string()))),
        )
    }
}

/// What the control panel shows about the last export.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Working,
    Done(String),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::{IngestedSeries, SeriesStore};
    use crate::processing::transform::TransformEngine;
    use crate::render::projection::project;
    use crate::state::viewport::{Viewport, ViewportMode};
    use crate::state::visibility::VisibilityOrder;
    use std::sync::Mutex;

    /// Records the figure it was asked to draw.
    #[derive(Default)]
    struct RecordingRenderer {
        seen: Mutex<Vec<ExportFigure>>,
    }

    impl FigureRenderer for RecordingRenderer {
        fn render_png(&self, figure: &ExportFigure) -> Result<Vec<u8>, ExportError> {
            self.seen.lock().unwrap().push(figure.clone());
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    fn store() -> SeriesStore {
        SeriesStore::from_series(vec![
            IngestedSeries {
                name: "Rain".into(),
                unit: "mm".into(),
                times: vec![0.0, 10.0, 20.0, 30.0, 40.0],
                values: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            },
            IngestedSeries {
                name: "Tides".into(),
                unit: "nstr".into(),
                times: vec![5.0, 15.0, 25.0],
                values: vec![-1.0, 0.0, 1.0],
            },
        ])
    }

    fn projection(visible: &[usize], range: (f64, f64)) -> (SeriesStore, Projection) {
        let store = store();
        let mut views = VisibilityOrder::new(store.len());
        for &i in visible {
            views.set_visible(i, true);
        }
        let viewport = Viewport { start: range.0, end: range.1, mode: ViewportMode::Manual };
        let p = project(&store, &views, &TransformEngine::new(), viewport);
        (store, p)
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn empty_selection_is_an_error_and_draws_nothing() {
        let (_, p) = projection(&[], (0.0, 1.0));
        let exporter = StaticExporter::with_renderer(ExportSettings::default(), RecordingRenderer::default());
        let err = exporter.export(&p, at("2024-05-01 12:00:00")).unwrap_err();
        assert!(matches!(err, ExportError::NoSeriesSelected));
        assert_eq!(err.to_string(), "no series selected");
        assert!(exporter.renderer.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn panels_are_windowed_but_datasets_untouched() {
        let (store, p) = projection(&[1, 0], (10.0, 30.0));
        let figure = prepare_figure(&p, &ExportSettings::default()).unwrap();

        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[0].label, "Tides (nstr)");
        assert_eq!(figure.panels[0].points, vec![(15.0, 0.0), (25.0, 1.0)]);
        assert_eq!(figure.panels[1].points, vec![(10.0, 2.0), (20.0, 3.0), (30.0, 4.0)]);
        assert_eq!(figure.x_range, (10.0, 30.0));
        assert_eq!(figure.height(), Some(900));
        assert_eq!(store.get("Rain").unwrap().point_count(), 5);
    }

    #[test]
    fn same_inputs_give_same_artifact_except_name() {
        let (_, p) = projection(&[0], (0.0, 40.0));
        let exporter = StaticExporter::with_renderer(ExportSettings::default(), RecordingRenderer::default());
        let a = exporter.export(&p, at("2024-05-01 12:00:00")).unwrap();
        let b = exporter.export(&p, at("2024-05-01 12:00:07")).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.filename, "serprateai_export_20240501_120000.png");
        assert_eq!(b.filename, "serprateai_export_20240501_120007.png");
        let seen = exporter.renderer.seen.lock().unwrap();
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn empty_window_panel_still_gets_a_range() {
        let (_, p) = projection(&[1], (100.0, 200.0));
        let figure = prepare_figure(&p, &ExportSettings::default()).unwrap();
        assert!(figure.panels[0].points.is_empty());
        assert_eq!(figure.panels[0].y_range, (0.0, 1.0));
    }

    #[test]
    fn second_export_is_rejected_while_first_in_flight() {
        let slot = ExportSlot::default();
        let ticket = slot.try_acquire().unwrap();
        assert!(slot.is_busy());
        assert!(matches!(slot.try_acquire(), Err(ExportError::Busy)));
        drop(ticket);
        assert!(!slot.is_busy());
        assert!(slot.try_acquire().is_ok());
    }

    #[test]
    fn artifact_is_written_under_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ImageArtifact {
            filename: "serprateai_export_20240501_120000.png".into(),
            bytes: vec![1, 2, 3],
            panel_count: 2,
        };
        let path = artifact.save_in(dir.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert!(artifact.status_message(&path).starts_with("Exported 2 plots to"));
    }

    #[test]
    fn plotters_output_is_a_stable_png_of_the_right_size() {
        let (_, p) = projection(&[0, 1], (0.0, 40.0));
        let settings = ExportSettings {
            width: 600,
            panel_height: 200,
            ..ExportSettings::default()
        };
        let exporter = StaticExporter::new(settings);
        let a = exporter.export(&p, at("2024-05-01 12:00:00")).unwrap();
        let b = exporter.export(&p, at("2024-05-01 12:00:00")).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.panel_count, 2);

        let decoded = image::load_from_memory(&a.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (600, 400));
    }

    #[test]
    fn oversized_figure_is_an_error_not_a_panic() {
        let (_, p) = projection(&[0, 1], (0.0, 40.0));
        let settings = ExportSettings {
            panel_height: u32::MAX,
            ..ExportSettings::default()
        };
        let figure = prepare_figure(&p, &settings).unwrap();
        assert_eq!(figure.height(), None);
        assert!(matches!(PlottersRenderer.render_png(&figure), Err(ExportError::Render(_))));
    }

    struct PanickingRenderer;

    impl FigureRenderer for PanickingRenderer {
        fn render_png(&self, _figure: &ExportFigure) -> Result<Vec<u8>, ExportError> {
            panic!("renderer blew up");
        }
    }

    fn wait(job: &mut ExportJob) -> Result<String, ExportError> {
        loop {
            if let Some(outcome) = job.poll() {
                return outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn job_writes_artifact_and_holds_slot_until_collected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, p) = projection(&[0], (0.0, 40.0));
        let exporter = Arc::new(StaticExporter::with_renderer(
            ExportSettings::default(),
            RecordingRenderer::default(),
        ));
        let slot = ExportSlot::default();
        let mut job = ExportJob::spawn(
            Arc::clone(&exporter),
            &slot,
            p.clone(),
            dir.path().to_path_buf(),
            at("2024-05-01 12:00:00"),
            || {},
        )
        .unwrap();

        let second = ExportJob::spawn(exporter, &slot, p, dir.path().to_path_buf(), at("2024-05-01 12:00:01"), || {});
        assert!(matches!(second, Err(ExportError::Busy)));

        let message = wait(&mut job).unwrap();
        assert!(message.starts_with("Exported 1 plot to"));
        assert!(dir.path().join("serprateai_export_20240501_120000.png").exists());
        assert!(slot.is_busy());
        drop(job);
        assert!(!slot.is_busy());
    }

    #[test]
    fn job_with_nothing_visible_is_rejected_and_frees_slot() {
        let (_, p) = projection(&[], (0.0, 1.0));
        let exporter = Arc::new(StaticExporter::with_renderer(
            ExportSettings::default(),
            RecordingRenderer::default(),
        ));
        let slot = ExportSlot::default();
        let err = ExportJob::spawn(exporter, &slot, p, std::env::temp_dir(), at("2024-05-01 12:00:00"), || {})
            .err()
            .unwrap();
        assert!(matches!(err, ExportError::NoSeriesSelected));
        assert!(!slot.is_busy());
    }

    #[test]
    fn panicking_worker_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (_, p) = projection(&[0], (0.0, 40.0));
        let exporter = Arc::new(StaticExporter::with_renderer(ExportSettings::default(), PanickingRenderer));
        let slot = ExportSlot::default();
        let mut job = ExportJob::spawn(exporter, &slot, p, dir.path().to_path_buf(), at("2024-05-01 12:00:00"), || {})
            .unwrap();

        let err = wait(&mut job).unwrap_err();
        assert!(matches!(err, ExportError::Render(ref msg) if msg == "export worker panicked"));
        assert!(job.poll().is_none());
        drop(job);
        assert!(!slot.is_busy());
    }
}
