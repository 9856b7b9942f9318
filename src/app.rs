use std::sync::Arc;

use eframe::egui;

use crate::config::ExplorerConfig;
use crate::render::export::{ExportJob, ExportSlot, ExportStatus, StaticExporter};
use crate::state::session::{Session, SessionAction};
use crate::state::theme::Theme;
use crate::ui::controls::{self, ControlsContext};
use crate::ui::panels;

/// The explorer window: controls on the left, stacked panels in the centre.
pub struct ExplorerApp {
    session: Session,
    config: ExplorerConfig,
    exporter: Arc<StaticExporter>,
    export_slot: ExportSlot,
    pending_export: Option<ExportJob>,
    export_status: ExportStatus,
    /// Pointer time over any panel, shared so every panel draws the crosshair.
    hover_time: Option<f64>,
    theme: Theme,
    /// Datasets that failed to load, already formatted for display.
    failures: Vec<String>,
}

impl ExplorerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        config: ExplorerConfig,
        failures: Vec<String>,
    ) -> Self {
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.text_styles.insert(egui::TextStyle::Body, egui::FontId::proportional(15.0));
        style.text_styles.insert(egui::TextStyle::Button, egui::FontId::proportional(14.5));
        style.text_styles.insert(egui::TextStyle::Heading, egui::FontId::proportional(20.0));
        style.text_styles.insert(egui::TextStyle::Small, egui::FontId::proportional(12.0));
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        ctx.set_style(style);

        let theme = Theme::default();
        ctx.set_visuals(styled_visuals(theme));

        let exporter = Arc::new(StaticExporter::new(config.export.clone()));
        Self {
            session,
            config,
            exporter,
            export_slot: ExportSlot::default(),
            pending_export: None,
            export_status: ExportStatus::Idle,
            hover_time: None,
            theme,
            failures,
        }
    }

    fn dispatch(&mut self, action: SessionAction) {
        if let Err(e) = self.session.dispatch(action) {
            tracing::warn!("Ignoring action: {e}");
        }
    }

    /// Snapshot the current projection and render it off the UI thread.
    fn start_export(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let job = ExportJob::spawn(
            Arc::clone(&self.exporter),
            &self.export_slot,
            self.session.project(),
            self.config.export_dir.clone(),
            chrono::Local::now().naive_local(),
            move || ctx.request_repaint(),
        );
        match job {
            Ok(job) => {
                self.export_status = ExportStatus::Working;
                self.pending_export = Some(job);
            }
            Err(e) => {
                tracing::warn!("Export request rejected: {e}");
                self.export_status = ExportStatus::Failed(e.to_string());
            }
        }
    }

    fn poll_export(&mut self, ctx: &egui::Context) {
        let Some(job) = self.pending_export.as_mut() else {
            return;
        };
        let Some(outcome) = job.poll() else {
            // The worker's repaint can land just before it has finished.
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
            return;
        };
        self.export_status = match outcome {
            Ok(message) => {
                tracing::info!("{message}");
                ExportStatus::Done(message)
            }
            Err(e) => {
                tracing::error!("Export failed: {e}");
                ExportStatus::Failed(format!("Export failed: {e}"))
            }
        };
        self.pending_export = None;
    }

    fn pick_export_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.export_dir)
            .pick_folder()
        {
            tracing::info!("Export folder set to {}", dir.display());
            self.config.export_dir = dir;
        }
    }
}

fn styled_visuals(theme: Theme) -> egui::Visuals {
    let mut vis = theme.visuals();
    vis.window_corner_radius = egui::CornerRadius::same(8);
    vis.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.active.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.hovered.bg_stroke = egui::Stroke::new(1.5, egui::Color32::from_gray(160));
    vis
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export(ctx);

        let controls = egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .min_width(240.0)
            .show(ctx, |ui| {
                let cx = ControlsContext {
                    title: &self.config.title,
                    status: &self.export_status,
                    export_busy: self.export_slot.is_busy(),
                    export_dir: &self.config.export_dir,
                    failures: &self.failures,
                    theme: self.theme,
                };
                controls::show_controls(ui, &self.session, &cx)
            })
            .inner;

        for action in controls.actions {
            self.dispatch(action);
        }
        if controls.toggle_theme {
            self.theme = self.theme.toggle();
            ctx.set_visuals(styled_visuals(self.theme));
        }
        if controls.pick_export_dir {
            self.pick_export_dir();
        }
        if controls.export_requested {
            self.start_export(ctx);
        }

        let projection = self.session.project();
        let output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                panels::show_panels(
                    ui,
                    &projection,
                    self.session.viewport_controller(),
                    self.theme,
                    self.hover_time,
                )
            })
            .inner;

        if let Some(action) = output.action {
            self.dispatch(action);
        }
        if output.hover_time != self.hover_time {
            self.hover_time = output.hover_time;
            ctx.request_repaint();
        }
    }
}
