use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::datetime::{format_display_date, format_display_timestamp};
use crate::suggest::SuggestedTask;
use crate::task::Task;
use crate::view::{Projection, TaskStats};

const NOTES_PREVIEW_WIDTH: usize = 48;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, projection))]
    pub fn print_projection(&mut self, projection: &Projection) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_projection(&mut out, projection)
    }

    pub fn write_projection<W: Write>(
        &self,
        mut out: W,
        projection: &Projection,
    ) -> anyhow::Result<()> {
        if projection.tasks.is_empty() {
            writeln!(out, "No tasks.")?;
        } else {
            self.write_task_table(&mut out, &projection.tasks)?;
        }
        writeln!(out)?;
        write_stats_line(&mut out, &projection.stats)?;
        Ok(())
    }

    fn write_task_table<W: Write>(&self, out: W, tasks: &[Task]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Created".to_string(),
            "Title".to_string(),
            "Notes".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = self.paint(&task.short_id(), "33");
            let status = if task.is_completed() {
                self.paint(task.status.as_str(), "32")
            } else {
                task.status.as_str().to_string()
            };
            let notes = task
                .notes
                .as_deref()
                .map(notes_preview)
                .unwrap_or_default();

            rows.push(vec![
                id,
                status,
                format_display_date(task.created_at),
                task.title.clone(),
                notes,
            ]);
        }

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, stats))]
    pub fn print_stats(&mut self, stats: &TaskStats) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "total       {}", stats.total)?;
        writeln!(out, "completed   {}", stats.completed)?;
        writeln!(out, "pending     {}", stats.pending)?;
        writeln!(out, "completion  {}%", stats.completion_rate)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &Task) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "owner     {}", task.owner)?;
        writeln!(out, "status    {}", task.status)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "created   {}", format_display_timestamp(task.created_at))?;

        if let Some(notes) = &task.notes {
            writeln!(out, "notes")?;
            for line in notes.lines() {
                writeln!(out, "  {line}")?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, suggestions))]
    pub fn print_suggestions(&mut self, suggestions: &[SuggestedTask]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_suggestions(&mut out, suggestions)
    }

    pub fn write_suggestions<W: Write>(
        &self,
        mut out: W,
        suggestions: &[SuggestedTask],
    ) -> anyhow::Result<()> {
        for (idx, suggestion) in suggestions.iter().enumerate() {
            let number = self.paint(&format!("{}.", idx + 1), "33");
            writeln!(out, "{number} {}", suggestion.title)?;
            writeln!(out, "   {}", suggestion.notes)?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_stats_line<W: Write>(mut out: W, stats: &TaskStats) -> anyhow::Result<()> {
    writeln!(
        out,
        "{} total, {} completed, {} pending ({}% complete)",
        stats.total, stats.completed, stats.pending, stats.completion_rate
    )?;
    Ok(())
}

fn notes_preview(notes: &str) -> String {
    let first = notes.lines().next().unwrap_or_default();
    let more = notes.lines().nth(1).is_some();
    if UnicodeWidthStr::width(first) <= NOTES_PREVIEW_WIDTH && !more {
        return first.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in first.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w > NOTES_PREVIEW_WIDTH - 3 {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::task::Status;
    use crate::view::{ViewState, project};

    #[test]
    fn long_or_multiline_notes_are_shortened() {
        assert_eq!(notes_preview("short"), "short");
        assert_eq!(notes_preview("first\nsecond"), "first...");
        let long = "x".repeat(80);
        let preview = notes_preview(&long);
        assert_eq!(preview.len(), NOTES_PREVIEW_WIDTH);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn table_pads_around_ansi_codes() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["\x1b[33mxyz\x1b[0m".to_string(), "1".to_string()]],
        )
        .expect("write table");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A   B ");
        assert_eq!(lines[1], "--- - ");
        assert_eq!(strip_ansi(lines[2]), "xyz 1 ");
    }

    #[test]
    fn projection_output_ends_with_stats() {
        let task = Task {
            id: Uuid::new_v4(),
            owner: "ana".to_string(),
            title: "Pay rent".to_string(),
            notes: None,
            status: Status::Completed,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
        };
        let projection = project(&[task], &ViewState::default());

        let mut buf = Vec::new();
        Renderer::plain()
            .write_projection(&mut buf, &projection)
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Pay rent"));
        assert!(text.trim_end().ends_with("1 total, 1 completed, 0 pending (100% complete)"));

        let mut buf = Vec::new();
        Renderer::plain()
            .write_projection(&mut buf, &project(&[], &ViewState::default()))
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("No tasks."));
        assert!(text.contains("0 total, 0 completed, 0 pending (0% complete)"));
    }
}
