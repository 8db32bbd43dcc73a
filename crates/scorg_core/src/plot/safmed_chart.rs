//! SAFMED progress chart rendered as SVG.
//!
//! # Responsibility
//! - Turn a student's score history into a celeration-style chart.
//! - Return markup the front-end can inject directly.
//!
//! # Invariants
//! - Y axis is logarithmic; zero counts sit on the `CHART_FLOOR` line.
//! - X axis counts days since the earliest score.
//! - Rendering never touches the filesystem.

use crate::dates::format_date;
use crate::model::score::{AssessmentKind, SafmedScore};
use crate::model::student::Student;
use chrono::{Days, NaiveDate};
use log::debug;
use plotters::prelude::*;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest plotted value; log scales cannot show zero.
const CHART_FLOOR: f64 = 0.5;
/// Minimum top of the y axis so sparse charts keep a readable scale.
const MIN_CHART_CEILING: f64 = 100.0;
const CORRECT_POINT_SIZE: i32 = 6;
const INCORRECT_POINT_SIZE: i32 = 5;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotError {
    /// The student has no scores to draw.
    NoScores,
    /// Backend drawing failure.
    Render(String),
}

impl Display for PlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoScores => write!(f, "no scores found to plot"),
            Self::Render(message) => write!(f, "failed to render chart: {message}"),
        }
    }
}

impl Error for PlotError {}

/// Output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
        }
    }
}

/// Renders `scores` for `student` to an SVG document.
pub fn render_safmed_chart(
    student: &Student,
    scores: &[SafmedScore],
    options: &ChartOptions,
) -> PlotResult<String> {
    let Some(first_date) = scores.iter().map(|score| score.date).min() else {
        return Err(PlotError::NoScores);
    };
    let last_date = scores
        .iter()
        .map(|score| score.date)
        .max()
        .unwrap_or(first_date);

    let span = day_offset(first_date, last_date) + 1;
    let correct = series(scores, first_date, |score| score.correct);
    let incorrect = series(scores, first_date, |score| score.incorrect);
    let ceiling = chart_ceiling(scores);
    let caption = format!(
        "{} scores for {}",
        AssessmentKind::Safmed.label(),
        student.display_name()
    );

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 24))
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-1i64..span, (CHART_FLOOR..ceiling).log_scale())
            .map_err(render_err)?;

        let label_for_offset = |offset: &i64| match u64::try_from(*offset) {
            Ok(days) => first_date
                .checked_add_days(Days::new(days))
                .map(format_date)
                .unwrap_or_default(),
            Err(_) => String::new(),
        };

        chart
            .configure_mesh()
            .x_desc("date")
            .y_desc("count per minute")
            .x_labels(usize::try_from(span.min(12)).unwrap_or(12))
            .x_label_formatter(&label_for_offset)
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(correct.clone(), GREEN.stroke_width(1)))
            .map_err(render_err)?;
        chart
            .draw_series(
                correct
                    .iter()
                    .map(|point| Circle::new(*point, CORRECT_POINT_SIZE, GREEN.filled())),
            )
            .map_err(render_err)?
            .label("correct")
            .legend(|(x, y)| Circle::new((x, y), CORRECT_POINT_SIZE, GREEN.filled()));

        chart
            .draw_series(LineSeries::new(incorrect.clone(), RED.stroke_width(1)))
            .map_err(render_err)?;
        chart
            .draw_series(
                incorrect
                    .iter()
                    .map(|point| Cross::new(*point, INCORRECT_POINT_SIZE, RED.stroke_width(2))),
            )
            .map_err(render_err)?
            .label("incorrect")
            .legend(|(x, y)| Cross::new((x, y), INCORRECT_POINT_SIZE, RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    debug!(
        "event=chart_render module=plot status=ok student_id={} points={} bytes={}",
        student.id,
        scores.len(),
        svg.len()
    );
    Ok(svg)
}

fn series(
    scores: &[SafmedScore],
    first_date: NaiveDate,
    count: impl Fn(&SafmedScore) -> u32,
) -> Vec<(i64, f64)> {
    let mut points: Vec<(i64, f64)> = scores
        .iter()
        .map(|score| {
            (
                day_offset(first_date, score.date),
                f64::from(count(score)).max(CHART_FLOOR),
            )
        })
        .collect();
    points.sort_by_key(|(offset, _)| *offset);
    points
}

fn day_offset(first_date: NaiveDate, date: NaiveDate) -> i64 {
    date.signed_duration_since(first_date).num_days()
}

fn chart_ceiling(scores: &[SafmedScore]) -> f64 {
    let highest = scores
        .iter()
        .map(|score| score.correct.max(score.incorrect))
        .max()
        .unwrap_or(0);
    (f64::from(highest) * 1.5).max(MIN_CHART_CEILING)
}

fn render_err(err: impl Display) -> PlotError {
    PlotError::Render(err.to_string())
}
