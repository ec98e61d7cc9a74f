//! Chart adapter: turns an [`AggregateView`] into plot-ready series.
//!
//! The adapter knows nothing about the pipeline beyond the column names a
//! [`ChartSpec`] points at.

use std::collections::HashMap;

use eframe::egui::Color32;
use thiserror::Error;

use crate::color::{ColorMap, SINGLE_SERIES};
use crate::data::model::CellValue;
use crate::data::views::AggregateView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
    StackedBar,
    Bar,
    BarWithErrors,
    StackedHistogram,
}

impl ChartKind {
    /// Whether x values are category labels placed on integer slots.
    pub fn is_categorical(self) -> bool {
        matches!(self, ChartKind::StackedBar | ChartKind::Bar | ChartKind::BarWithErrors)
    }

    pub fn is_stacked(self) -> bool {
        matches!(self, ChartKind::StackedBar | ChartKind::StackedHistogram)
    }
}

/// How to draw one view: which columns feed which channel, plus labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x: &'static str,
    pub y: &'static str,
    pub color: Option<&'static str>,
    pub error: Option<&'static str>,
    pub hover: Option<&'static str>,
    pub opacity: f32,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &'static str, x: &'static str, y: &'static str) -> Self {
        ChartSpec {
            kind,
            title,
            x_label: x,
            y_label: y,
            x,
            y,
            color: None,
            error: None,
            hover: None,
            opacity: 1.0,
        }
    }

    pub fn labels(mut self, x_label: &'static str, y_label: &'static str) -> Self {
        self.x_label = x_label;
        self.y_label = y_label;
        self
    }

    pub fn color_by(mut self, column: &'static str) -> Self {
        self.color = Some(column);
        self
    }

    pub fn error_by(mut self, column: &'static str) -> Self {
        self.error = Some(column);
        self
    }

    pub fn hover(mut self, column: &'static str) -> Self {
        self.hover = Some(column);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub error: Option<f64>,
    pub hover: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Color32,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("chart '{chart}' needs column '{column}', which the view does not have")]
    MissingColumn {
        chart: &'static str,
        column: &'static str,
    },
}

/// A fully resolved chart, ready for the plot widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub spec: ChartSpec,
    /// Tick labels for categorical x axes, indexed by slot.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Chart {
    /// Consume a view and lay it out according to `spec`.
    ///
    /// Rows whose x, y or colour cell is undefined are left out.
    pub fn from_view(view: AggregateView, spec: ChartSpec) -> Result<Chart, ChartError> {
        let index = |column: &'static str| {
            view.column_index(column).ok_or(ChartError::MissingColumn {
                chart: spec.title,
                column,
            })
        };
        let x_idx = index(spec.x)?;
        let y_idx = index(spec.y)?;
        let color_idx = spec.color.map(index).transpose()?;
        let error_idx = spec.error.map(index).transpose()?;
        let hover_idx = spec.hover.map(index).transpose()?;

        let mut categories: Vec<String> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut series: Vec<(String, Vec<ChartPoint>)> = Vec::new();
        let mut series_slots: HashMap<String, usize> = HashMap::new();

        for row in view.rows() {
            let Some(y) = row[y_idx].as_f64() else {
                continue;
            };
            let name = match color_idx.map(|i| &row[i]) {
                Some(CellValue::Null) => continue,
                Some(cell) => cell.to_string(),
                None => spec.y.to_string(),
            };
            let x = if spec.kind.is_categorical() {
                if row[x_idx].is_null() {
                    continue;
                }
                let label = row[x_idx].to_string();
                *slots.entry(label.clone()).or_insert_with(|| {
                    categories.push(label);
                    categories.len() - 1
                }) as f64
            } else {
                match row[x_idx].as_f64() {
                    Some(x) => x,
                    None => continue,
                }
            };

            let point = ChartPoint {
                x,
                y,
                error: error_idx.and_then(|i| row[i].as_f64()),
                hover: hover_idx.map(|i| row[i].to_string()),
            };
            let slot = *series_slots.entry(name.clone()).or_insert_with(|| {
                series.push((name, Vec::new()));
                series.len() - 1
            });
            series[slot].1.push(point);
        }

        let colors = ColorMap::new(series.iter().map(|(name, _)| name.as_str()));
        let single = series.len() == 1;
        let series = series
            .into_iter()
            .map(|(name, points)| {
                let base = if single {
                    SINGLE_SERIES
                } else {
                    colors.color_for(&name)
                };
                Series {
                    color: base.gamma_multiply(spec.opacity),
                    name,
                    points,
                }
            })
            .collect();

        Ok(Chart {
            spec,
            categories,
            series,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}
