use std::path::Path;

use crate::processing::transform::Transform;
use crate::render::export::ExportStatus;
use crate::state::session::{Session, SessionAction};
use crate::state::theme::{color32, Theme};

/// Read-only inputs for the control panel besides the session itself.
pub struct ControlsContext<'a> {
    pub title: &'a str,
    pub status: &'a ExportStatus,
    pub export_busy: bool,
    pub export_dir: &'a Path,
    pub failures: &'a [String],
    pub theme: Theme,
}

/// What the user asked for this frame.
#[derive(Debug, Default)]
pub struct ControlsOutput {
    pub actions: Vec<SessionAction>,
    pub export_requested: bool,
    pub pick_export_dir: bool,
    pub toggle_theme: bool,
}

fn swatch(ui: &mut egui::Ui, color: [u8; 4]) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color32(color));
}

/// Left-hand panel: dataset checkboxes, display order, export and help.
pub fn show_controls(ui: &mut egui::Ui, session: &Session, cx: &ControlsContext<'_>) -> ControlsOutput {
    let mut out = ControlsOutput::default();

    ui.heading(cx.title);
    ui.add_space(4.0);

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.label(egui::RichText::new("Select Datasets:").strong());
        for dataset in session.store().iter() {
            let Ok(state) = session.view_state(&dataset.name) else {
                continue;
            };
            ui.horizontal(|ui| {
                swatch(ui, dataset.color);
                let mut visible = state.visible;
                if ui
                    .checkbox(&mut visible, dataset.name.as_str())
                    .on_hover_text(dataset.unit.as_str())
                    .changed()
                {
                    out.actions.push(SessionAction::SetVisible {
                        name: dataset.name.clone(),
                        visible,
                    });
                }
                ui.label(
                    egui::RichText::new(format!("{} pts", dataset.point_count()))
                        .small()
                        .weak(),
                );
            });
        }
        if session.store().is_empty() {
            ui.label(egui::RichText::new("No datasets could be loaded.").weak());
        }

        let order = session.display_order();
        if !order.is_empty() {
            ui.separator();
            ui.label(egui::RichText::new("Display Order:").strong());
            let last = order.len() - 1;
            for (pos, name) in order.iter().enumerate() {
                let (Ok(dataset), Ok(state)) = (session.store().get(name), session.view_state(name)) else {
                    continue;
                };
                ui.horizontal(|ui| {
                    swatch(ui, dataset.color);
                    if ui
                        .add_enabled(pos > 0, egui::Button::new("\u{25B2}"))
                        .on_hover_text("Move up")
                        .clicked()
                    {
                        out.actions.push(SessionAction::MoveUp(name.clone()));
                    }
                    if ui
                        .add_enabled(pos < last, egui::Button::new("\u{25BC}"))
                        .on_hover_text("Move down")
                        .clicked()
                    {
                        out.actions.push(SessionAction::MoveDown(name.clone()));
                    }
                    let cumulative = state.transform == Transform::CumulativeSum;
                    if ui
                        .selectable_label(cumulative, "\u{03A3}")
                        .on_hover_text("Toggle cumulative sum")
                        .clicked()
                    {
                        out.actions.push(SessionAction::ToggleTransform(name.clone()));
                    }
                    ui.label(name.as_str());
                });
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            let export = ui.add_enabled(!cx.export_busy, egui::Button::new("Export PNG"));
            if export.clicked() {
                out.export_requested = true;
            }
            if ui.button("Folder\u{2026}").clicked() {
                out.pick_export_dir = true;
            }
        });
        ui.label(
            egui::RichText::new(format!("Saving to {}", cx.export_dir.display()))
                .small()
                .weak(),
        );
        match cx.status {
            ExportStatus::Idle => {}
            ExportStatus::Working => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Exporting\u{2026}");
                });
            }
            ExportStatus::Done(msg) => {
                ui.colored_label(egui::Color32::from_rgb(40, 160, 60), format!("\u{2713} {msg}"));
            }
            ExportStatus::Failed(msg) => {
                ui.colored_label(egui::Color32::from_rgb(210, 50, 50), msg.as_str());
            }
        }

        ui.separator();
        if ui.button(cx.theme.switch_label()).clicked() {
            out.toggle_theme = true;
        }

        ui.separator();
        ui.label(egui::RichText::new("Instructions:").strong());
        for line in [
            "Select datasets using the checkboxes above",
            "Drag to pan, scroll to zoom",
            "Right-drag or shift-drag to zoom to a span",
            "Double-click a plot to fit the selection",
            "All plots zoom and pan together",
            "\u{03A3} shows the running total of a series",
            "Export PNG saves the current view",
        ] {
            ui.label(format!("\u{2022} {line}"));
        }

        if !cx.failures.is_empty() {
            ui.separator();
            ui.label(egui::RichText::new("Not loaded:").strong());
            for failure in cx.failures {
                ui.label(egui::RichText::new(failure.as_str()).small().weak());
            }
        }
    });

    out
}
