use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke};

use crate::data::datetime::{format_date, format_timestamp};
use crate::processing::downsampling;
use crate::render::interaction;
use crate::render::projection::{Projection, RenderDescriptor};
use crate::state::session::SessionAction;
use crate::state::theme::{color32, Theme};
use crate::state::viewport::ViewportController;

const LEFT_MARGIN: f32 = 72.0;
const RIGHT_MARGIN: f32 = 14.0;
const TOP_MARGIN: f32 = 22.0;
const BOTTOM_MARGIN: f32 = 8.0;
const AXIS_HEIGHT: f32 = 34.0;
const MIN_PANEL_HEIGHT: f32 = 140.0;
const TWO_DAYS: f64 = 2.0 * 86_400.0;

/// Result of drawing the stacked panels for one frame.
#[derive(Debug, Default)]
pub struct PanelsOutput {
    /// At most one range change per frame; every panel shares the viewport.
    pub action: Option<SessionAction>,
    /// Time under the pointer, if any panel is hovered.
    pub hover_time: Option<f64>,
}

/// Draw one panel per descriptor, top to bottom, sharing the time axis.
/// `hover` is the pointer time from the previous frame so the crosshair
/// appears in every panel, not only the hovered one.
pub fn show_panels(
    ui: &mut egui::Ui,
    projection: &Projection,
    controller: &ViewportController,
    theme: Theme,
    hover: Option<f64>,
) -> PanelsOutput {
    let mut out = PanelsOutput::default();

    if projection.is_empty() {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("No datasets selected").strong().size(16.0));
            ui.add_space(6.0);
            ui.label(egui::RichText::new("Tick a dataset on the left to plot it.").weak());
        });
        return out;
    }

    let count = projection.descriptors.len();
    let available = ui.available_height() - AXIS_HEIGHT;
    let panel_height = (available / count as f32).max(MIN_PANEL_HEIGHT);

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (i, descriptor) in projection.descriptors.iter().enumerate() {
            let is_bottom = i + 1 == count;
            let height = if is_bottom { panel_height + AXIS_HEIGHT } else { panel_height };
            let panel = show_panel(ui, descriptor, controller, theme, hover, is_bottom, height);
            if out.action.is_none() {
                out.action = panel.action;
            }
            out.hover_time = out.hover_time.or(panel.hover_time);
        }
    });

    out
}

fn show_panel(
    ui: &mut egui::Ui,
    descriptor: &RenderDescriptor,
    controller: &ViewportController,
    theme: Theme,
    hover: Option<f64>,
    is_bottom: bool,
    height: f32,
) -> PanelsOutput {
    let mut out = PanelsOutput::default();
    let range = controller.viewport().range();
    let (start, end) = range;

    let (total_rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), height), Sense::hover());
    let bottom_margin = if is_bottom { AXIS_HEIGHT } else { BOTTOM_MARGIN };
    let plot_rect = Rect::from_min_max(
        Pos2::new(total_rect.left() + LEFT_MARGIN, total_rect.top() + TOP_MARGIN),
        Pos2::new(total_rect.right() - RIGHT_MARGIN, total_rect.bottom() - bottom_margin),
    );

    let plot_id = egui::Id::new("series_panel").with(&descriptor.name);
    let response = ui.interact(plot_rect, plot_id, Sense::click_and_drag());

    // Right-drag or shift-drag selects a time span to zoom to.
    let box_id = plot_id.with("box_zoom");
    let shift = ui.input(|i| i.modifiers.shift);
    if response.drag_started_by(egui::PointerButton::Secondary)
        || (shift && response.drag_started_by(egui::PointerButton::Primary))
    {
        if let Some(pos) = response.interact_pointer_pos() {
            ui.data_mut(|d| d.insert_temp(box_id, pos.x));
        }
    }
    let box_start = ui
        .data(|d| d.get_temp::<f32>(box_id))
        .filter(|_| response.dragged() || response.drag_stopped());
    let pointer_x = response.interact_pointer_pos().or(response.hover_pos()).map(|p| p.x);

    // Pan, zoom and reset all go through the shared viewport.
    if response.double_clicked() {
        out.action = Some(SessionAction::ResetView);
    } else if let Some(x0) = box_start {
        if response.drag_stopped() {
            ui.data_mut(|d| d.remove::<f32>(box_id));
            let selected = pointer_x
                .and_then(|x1| interaction::box_zoom_range(x0, x1, range, plot_rect.left(), plot_rect.width()));
            if let Some((s, e)) = selected {
                out.action = Some(SessionAction::SetRange { start: s, end: e });
            }
        }
    } else if response.dragged_by(egui::PointerButton::Primary) {
        let dx = response.drag_delta().x;
        if dx != 0.0 {
            let delta = interaction::drag_delta(range, dx, plot_rect.width());
            let (s, e) = controller.pan_by(delta);
            out.action = Some(SessionAction::SetRange { start: s, end: e });
        }
    } else if response.hovered() {
        let scroll = ui.ctx().input(|i| i.smooth_scroll_delta.y);
        if scroll.abs() > 0.0 {
            if let Some(pos) = response.hover_pos() {
                let center = interaction::x_to_time(pos.x, range, plot_rect.left(), plot_rect.width());
                let (s, e) = controller.zoom_about(center, interaction::scroll_zoom_factor(scroll));
                out.action = Some(SessionAction::SetRange { start: s, end: e });
            }
        }
    }
    if let Some(pos) = response.hover_pos() {
        out.hover_time = Some(interaction::x_to_time(pos.x, range, plot_rect.left(), plot_rect.width()));
    }

    let painter = ui.painter_at(total_rect);
    let text_color = painter.ctx().style().visuals.text_color();
    let dim_color = text_color.gamma_multiply(0.6);
    let color = color32(descriptor.color);
    let font = FontId::proportional(11.0);

    painter.rect_filled(plot_rect, 0.0, theme.plot_bg());

    let y_bounds = interaction::value_bounds(&descriptor.times, &descriptor.values, start, end);
    let to_screen = |t: f64, v: f64| {
        Pos2::new(
            interaction::time_to_x(t, range, plot_rect.left(), plot_rect.width()),
            interaction::value_to_y(v, y_bounds, plot_rect.top(), plot_rect.bottom()),
        )
    };

    // Grid and y labels
    for (value, is_major) in interaction::compute_grid_lines(y_bounds.0, y_bounds.1) {
        let y = interaction::value_to_y(value, y_bounds, plot_rect.top(), plot_rect.bottom());
        let stroke = if is_major {
            Stroke::new(1.0, theme.grid_color())
        } else {
            Stroke::new(0.5, theme.grid_color().gamma_multiply(0.5))
        };
        painter.line_segment([Pos2::new(plot_rect.left(), y), Pos2::new(plot_rect.right(), y)], stroke);
        if is_major {
            painter.text(
                Pos2::new(plot_rect.left() - 6.0, y),
                Align2::RIGHT_CENTER,
                interaction::format_tick_value(value),
                font.clone(),
                dim_color,
            );
        }
    }
    let ticks = interaction::time_ticks(start, end, (plot_rect.width() / 110.0).max(2.0) as usize);
    for &t in &ticks {
        let x = interaction::time_to_x(t, range, plot_rect.left(), plot_rect.width());
        painter.line_segment(
            [Pos2::new(x, plot_rect.top()), Pos2::new(x, plot_rect.bottom())],
            Stroke::new(0.5, theme.grid_color()),
        );
        if is_bottom {
            let label = if controller.viewport().span() > TWO_DAYS { format_date(t) } else { format_timestamp(t) };
            painter.text(
                Pos2::new(x, plot_rect.bottom() + 4.0),
                Align2::CENTER_TOP,
                label,
                font.clone(),
                dim_color,
            );
        }
    }
    if is_bottom {
        painter.text(
            Pos2::new(plot_rect.center().x, total_rect.bottom() - 2.0),
            Align2::CENTER_BOTTOM,
            "Time",
            font.clone(),
            text_color,
        );
    }

    painter.text(
        Pos2::new(plot_rect.left(), total_rect.top() + 3.0),
        Align2::LEFT_TOP,
        descriptor.label(),
        FontId::proportional(13.0),
        color,
    );

    // Series line, broken at gaps (non-finite values)
    let max_points = (plot_rect.width() as usize * 2).max(16);
    let points = downsampling::points_for_view(&descriptor.times, &descriptor.values, start, end, max_points);
    let plot_painter = painter.with_clip_rect(plot_rect);
    let mut run: Vec<Pos2> = Vec::new();
    for [t, v] in points {
        if v.is_finite() {
            run.push(to_screen(t, v));
        } else {
            flush_line(&plot_painter, &mut run, color);
        }
    }
    flush_line(&plot_painter, &mut run, color);

    painter.rect_stroke(plot_rect, 0.0, Stroke::new(1.0, dim_color), egui::StrokeKind::Outside);

    if let (Some(x0), Some(x1), true) = (box_start, pointer_x, response.dragged()) {
        let selection = Rect::from_x_y_ranges(x0.min(x1)..=x0.max(x1), plot_rect.y_range()).intersect(plot_rect);
        plot_painter.rect_filled(selection, 0.0, theme.crosshair_color().gamma_multiply(0.15));
        plot_painter.rect_stroke(
            selection,
            0.0,
            Stroke::new(1.0, theme.crosshair_color()),
            egui::StrokeKind::Inside,
        );
    }

    if let Some(t) = out.hover_time.or(hover).filter(|&t| controller.viewport().contains(t)) {
        draw_crosshair(&painter, &plot_painter, descriptor, t, plot_rect, &to_screen, theme, color);
    }

    out
}

fn flush_line(painter: &egui::Painter, run: &mut Vec<Pos2>, color: Color32) {
    match run.len() {
        0 => {}
        1 => {
            painter.circle_filled(run[0], 1.5, color);
        }
        _ => {
            painter.add(egui::Shape::line(std::mem::take(run), Stroke::new(1.5, color)));
        }
    }
    run.clear();
}

#[allow(clippy::too_many_arguments)]
fn draw_crosshair(
    painter: &egui::Painter,
    plot_painter: &egui::Painter,
    descriptor: &RenderDescriptor,
    t: f64,
    plot_rect: Rect,
    to_screen: &dyn Fn(f64, f64) -> Pos2,
    theme: Theme,
    color: Color32,
) {
    let x = to_screen(t, 0.0).x;
    plot_painter.line_segment(
        [Pos2::new(x, plot_rect.top()), Pos2::new(x, plot_rect.bottom())],
        Stroke::new(1.0, theme.crosshair_color()),
    );

    let Some(index) = interaction::nearest_index(&descriptor.times, t) else {
        return;
    };
    let (pt, pv) = (descriptor.times[index], descriptor.values[index]);
    if !pv.is_finite() {
        return;
    }
    let marker = to_screen(pt, pv);
    if !plot_rect.contains(marker) {
        return;
    }
    plot_painter.circle_filled(marker, 4.0, color);
    plot_painter.circle_stroke(marker, 4.0, Stroke::new(1.0, Color32::WHITE));

    let text = format!(
        "{}\n{} {}",
        format_timestamp(pt),
        interaction::format_tick_value(pv),
        descriptor.unit
    );
    let font = FontId::proportional(11.0);
    let galley = painter.layout_no_wrap(text.clone(), font.clone(), color);
    let size = galley.size() + egui::vec2(8.0, 6.0);
    let mut pos = marker + egui::vec2(10.0, -size.y - 6.0);
    if pos.x + size.x > plot_rect.right() {
        pos.x = marker.x - size.x - 10.0;
    }
    pos.y = pos.y.max(plot_rect.top());
    let bg_rect = Rect::from_min_size(pos, size);
    let bg_color = painter.ctx().style().visuals.window_fill;
    painter.rect_filled(bg_rect, 3.0, bg_color.gamma_multiply(0.9));
    painter.rect_stroke(bg_rect, 3.0, Stroke::new(0.5, color), egui::StrokeKind::Outside);
    painter.text(pos + egui::vec2(4.0, 3.0), Align2::LEFT_TOP, text, font, color);
}
