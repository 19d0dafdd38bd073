//! Results tab: a selection control listing an application's results and a
//! table with the lines of the selected one.
//!
//! The panel is plain data so any front end can draw it; [`render_text`]
//! is the terminal rendering.

use crate::model::{ResultLine, ResultMeta};
use crate::repository::ResultRepository;
use crate::storage::KvStore;
use serde::Serialize;
use std::fmt::Write as _;

pub const ACTIVE_MARKER: &str = "(Active)";
pub const NO_LINES_TEXT: &str = "No lines saved.";
pub const NOTHING_SELECTED_TEXT: &str = "No result selected.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultOption {
    pub value: i64,
    pub text: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    Placeholder,
    NoLines,
    Table { lines: Vec<ResultLine> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsPanel {
    pub application_id: i64,
    pub options: Vec<ResultOption>,
    pub selected: Option<i64>,
    pub body: PanelBody,
}

pub fn option_text(meta: &ResultMeta) -> String {
    let when = meta
        .created_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S");
    let mut text = format!("{} — {}", meta.display_name(), when);
    if meta.is_active {
        text.push(' ');
        text.push_str(ACTIVE_MARKER);
    }
    text
}

/// Rebuilds the whole panel for `application_id`.
///
/// The active result is preselected; without one the first (newest)
/// option is, as a selection control would show it.
pub fn refresh<S: KvStore>(repo: &ResultRepository<S>, application_id: i64) -> ResultsPanel {
    let metas = repo.list_results_by_application(application_id);
    let active_id = repo.get_active_result_id(application_id);

    let options: Vec<ResultOption> = metas
        .iter()
        .map(|m| ResultOption {
            value: m.result_id,
            text: option_text(m),
            is_active: m.is_active,
        })
        .collect();

    let selected = active_id
        .filter(|id| options.iter().any(|o| o.value == *id))
        .or_else(|| options.first().map(|o| o.value));

    ResultsPanel {
        application_id,
        body: body_for(repo, selected),
        options,
        selected,
    }
}

/// Selection changed: only the table is re-rendered.
pub fn select<S: KvStore>(repo: &ResultRepository<S>, panel: &mut ResultsPanel, result_id: Option<i64>) {
    panel.selected = result_id;
    panel.body = body_for(repo, result_id);
}

/// "Make active" on the current selection, then a full refresh.
/// Without a selection nothing happens and `None` is returned.
pub fn make_active<S: KvStore>(
    repo: &ResultRepository<S>,
    application_id: i64,
    selected: Option<i64>,
) -> anyhow::Result<Option<ResultsPanel>> {
    let Some(result_id) = selected else {
        return Ok(None);
    };
    repo.set_active(application_id, result_id)?;
    Ok(Some(refresh(repo, application_id)))
}

fn body_for<S: KvStore>(repo: &ResultRepository<S>, selected: Option<i64>) -> PanelBody {
    let Some(result_id) = selected else {
        return PanelBody::Placeholder;
    };
    let lines = repo.get_result_lines(result_id);
    if lines.is_empty() {
        PanelBody::NoLines
    } else {
        PanelBody::Table { lines }
    }
}

pub fn render_text(panel: &ResultsPanel) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Results for application {}", panel.application_id);

    if panel.options.is_empty() {
        let _ = writeln!(s, "  (no saved results)");
    }
    for o in &panel.options {
        let cursor = if Some(o.value) == panel.selected { ">" } else { " " };
        let _ = writeln!(s, "{} {:<10} {}", cursor, o.value, o.text);
    }
    s.push('\n');

    match &panel.body {
        PanelBody::Placeholder => {
            let _ = writeln!(s, "{}", NOTHING_SELECTED_TEXT);
        }
        PanelBody::NoLines => {
            let _ = writeln!(s, "{}", NO_LINES_TEXT);
        }
        PanelBody::Table { lines } => s.push_str(&render_lines(lines)),
    }
    s
}

/// Fixed-width table of `lines` with a trailing count.
pub fn render_lines(lines: &[ResultLine]) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{:>4}  {:<10}  {:>8}  {:>8}  {:<12}  {:>5}  {:>5}  {:>5}  {:>6}  {:<8}  {:>1}  {}",
        "#", "Start", "Child", "Provider", "Base", "FD", "PD", "HD", "Hrs", "Region", "X", "Summer"
    );
    for l in lines {
        let d = &l.detail;
        let _ = writeln!(
            s,
            "{:>4}  {:<10}  {:>8}  {:>8}  {:<12}  {:>5}  {:>5}  {:>5}  {:>6}  {:<8}  {:>1}  {}",
            l.line_id,
            d.start_date.format("%Y-%m-%d").to_string(),
            d.child_id,
            d.provider_id,
            d.base_type,
            d.units.fd,
            d.units.pd,
            d.units.hd,
            d.units.hrs,
            d.region,
            d.x_code.as_str(),
            if d.is_summer { "yes" } else { "no" }
        );
    }
    let _ = writeln!(s, "{} line(s)", lines.len());
    s
}
