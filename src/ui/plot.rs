use std::collections::BTreeMap;

use eframe::egui::{Color32, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, PlotUi, Points};

use crate::chart::{Chart, ChartKind};
use crate::dashboard::Section;
use crate::state::AppState;
use crate::ui::table;

const PLOT_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render every section in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a listings file to start  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Vehicle Advertisement Data Analysis");
            for section in Section::ALL {
                ui.add_space(12.0);
                ui.heading(section.header());
                match state.chart(section) {
                    Some(chart) if chart.is_empty() => {
                        ui.strong(chart.spec.title);
                        ui.weak("No listings match this chart.");
                    }
                    Some(chart) => {
                        chart_plot(ui, chart);
                        table::chart_data(ui, chart);
                    }
                    None if section.toggle_label().is_some() => {
                        ui.weak("Enable the filter in the side panel to show this chart.");
                    }
                    None => {
                        ui.weak("Chart unavailable.");
                    }
                }
                ui.separator();
            }
        });
}

// ---------------------------------------------------------------------------
// Single chart
// ---------------------------------------------------------------------------

/// Draw one chart with `egui_plot`.
pub fn chart_plot(ui: &mut Ui, chart: &Chart) {
    let spec = &chart.spec;
    ui.strong(spec.title);

    let mut plot = Plot::new(spec.title)
        .height(PLOT_HEIGHT)
        .x_axis_label(spec.x_label)
        .y_axis_label(spec.y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    if chart.series.len() > 1 {
        plot = plot.legend(Legend::default());
    }
    if spec.kind.is_categorical() {
        let labels = chart.categories.clone();
        plot = plot.x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        });
    }

    plot.show(ui, |plot_ui| match spec.kind {
        ChartKind::Scatter => scatter(plot_ui, chart),
        ChartKind::Bar | ChartKind::StackedBar | ChartKind::StackedHistogram => {
            bars(plot_ui, chart)
        }
        ChartKind::BarWithErrors => {
            bars(plot_ui, chart);
            error_bars(plot_ui, chart);
        }
    });
}

fn scatter(plot_ui: &mut PlotUi, chart: &Chart) {
    for series in &chart.series {
        let points: PlotPoints = series.points.iter().map(|p| [p.x, p.y]).collect();
        plot_ui.points(
            Points::new(points)
                .name(&series.name)
                .color(series.color)
                .radius(2.0),
        );
    }
}

/// One bar chart per series. Stacked kinds place every series on the same
/// sorted set of x slots, so `stack_on` (which matches bars by index) lines up.
fn bars(plot_ui: &mut PlotUi, chart: &Chart) {
    let stacked = chart.spec.kind.is_stacked();
    let slots: Vec<f64> = {
        let mut xs: Vec<f64> = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.x))
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs
    };
    let width = if chart.spec.kind == ChartKind::StackedHistogram {
        0.95
    } else {
        0.7
    };

    let mut drawn: Vec<BarChart> = Vec::new();
    for series in &chart.series {
        let bars: Vec<Bar> = if stacked {
            let by_x: BTreeMap<u64, f64> = series
                .points
                .iter()
                .map(|p| (p.x.to_bits(), p.y))
                .collect();
            slots
                .iter()
                .map(|&x| {
                    let y = by_x.get(&x.to_bits()).copied().unwrap_or(0.0);
                    bar(chart, x, y, None, &series.name).width(width)
                })
                .collect()
        } else {
            series
                .points
                .iter()
                .map(|p| bar(chart, p.x, p.y, p.hover.as_deref(), &series.name).width(width))
                .collect()
        };

        let mut bar_chart = BarChart::new(bars)
            .name(&series.name)
            .color(series.color);
        if stacked {
            let below: Vec<&BarChart> = drawn.iter().collect();
            bar_chart = bar_chart.stack_on(&below);
        }
        drawn.push(bar_chart);
    }

    for bar_chart in drawn {
        plot_ui.bar_chart(bar_chart);
    }
}

fn bar(chart: &Chart, x: f64, y: f64, hover: Option<&str>, series: &str) -> Bar {
    let label = if chart.spec.kind.is_categorical() {
        chart
            .categories
            .get(x as usize)
            .cloned()
            .unwrap_or_default()
    } else {
        format!("{x}")
    };
    let name = match hover {
        Some(extra) => format!("{label} ({series}, n = {extra})"),
        None => format!("{label} ({series})"),
    };
    Bar::new(x, y).name(name)
}

fn error_bars(plot_ui: &mut PlotUi, chart: &Chart) {
    for series in &chart.series {
        for p in &series.points {
            let Some(err) = p.error else {
                continue;
            };
            let whisker = vec![[p.x, p.y - err], [p.x, p.y + err]];
            plot_ui.line(
                Line::new(PlotPoints::from(whisker))
                    .color(Color32::DARK_GRAY)
                    .width(1.5),
            );
        }
    }
}
