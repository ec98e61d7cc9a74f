use eframe::egui::{CollapsingHeader, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::Chart;

const ROW_HEIGHT: f32 = 18.0;

/// Collapsible table listing the values behind a chart.
pub fn chart_data(ui: &mut Ui, chart: &Chart) {
    let spec = &chart.spec;
    let rows: Vec<[String; 4]> = chart
        .series
        .iter()
        .flat_map(|series| {
            series.points.iter().map(move |p| {
                let x = if spec.kind.is_categorical() {
                    chart
                        .categories
                        .get(p.x as usize)
                        .cloned()
                        .unwrap_or_default()
                } else {
                    format!("{}", p.x)
                };
                let extra = match (p.error, &p.hover) {
                    (Some(err), Some(hover)) => format!("± {err:.1}  (n = {hover})"),
                    (Some(err), None) => format!("± {err:.1}"),
                    (None, Some(hover)) => format!("n = {hover}"),
                    (None, None) => String::new(),
                };
                [x, series.name.clone(), format!("{:.2}", p.y), extra]
            })
        })
        .collect();

    CollapsingHeader::new(format!("Data ({} rows)", rows.len()))
        .id_salt((spec.title, "data"))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.push_id(spec.title, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .max_scroll_height(240.0)
                    .column(Column::auto().at_least(120.0))
                    .column(Column::auto().at_least(100.0))
                    .column(Column::auto().at_least(100.0))
                    .column(Column::remainder())
                    .header(ROW_HEIGHT + 2.0, |mut header| {
                        for title in [spec.x_label, "series", spec.y_label, ""] {
                            header.col(|ui| {
                                ui.strong(title);
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                            let cells = &rows[row.index()];
                            for cell in cells {
                                row.col(|ui| {
                                    ui.label(cell);
                                });
                            }
                        });
                    });
            });
        });
}
