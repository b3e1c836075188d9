//! Rendering of recording metadata into ffmpeg's metadata file format.
//!
//! The output is appended to a file produced by `ffmpeg -f ffmetadata`, so it
//! carries no `;FFMETADATA1` header of its own.

use crate::configuration::types::ChapterPolicy;
use crate::storage::types::{Chapter, RecordingMetadata};

/// One chapter in timebase ticks relative to the start of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterMark {
    pub start: i64,
    pub end: i64,
    pub title: String,
}

/// Renders the global tags followed by one `[CHAPTER]` section per category.
pub fn render(metadata: &RecordingMetadata, policy: &ChapterPolicy) -> String {
    let mut out = String::new();

    if let Some(title) = &metadata.title {
        out.push_str(&format!("title={}\n", escape(title)));
    }
    if let Some(author) = &metadata.author {
        out.push_str(&format!("author={}\n", escape(author)));
    }

    let description = description(metadata);
    if !description.is_empty() {
        out.push_str(&format!("description={}\n", escape(&description)));
    }

    for mark in chapter_marks(metadata, policy) {
        out.push_str(&format!(
            "\n[CHAPTER]\nTIMEBASE=1/{}\nSTART={}\nEND={}\ntitle={}\n",
            policy.timebase,
            mark.start,
            mark.end,
            escape(&mark.title)
        ));
    }
    out
}

/// Free-form description with the stream ID and the category/title timelines.
pub fn description(metadata: &RecordingMetadata) -> String {
    let mut description = metadata.description.clone().unwrap_or_default();
    if let Some(id) = &metadata.id {
        description.push_str(&format!("\nID: {}", id));
    }
    if let Some(start) = metadata.start_time {
        push_timeline(&mut description, "Categories:", &metadata.categories, start);
        push_timeline(&mut description, "Titles:", &metadata.titles, start);
    }
    description
}

fn push_timeline(out: &mut String, header: &str, entries: &[Chapter], start: f64) {
    if !entries.is_empty() {
        out.push('\n');
        out.push_str(header);
    }
    for (i, entry) in entries.iter().enumerate() {
        let next = entries.get(i + 1).map(|c| c.time).unwrap_or(f64::INFINITY);
        // superseded before the file even starts
        if next <= start {
            continue;
        }
        let offset = (entry.time - start).max(0.0).round_ties_even() as u64;
        out.push_str(&format!("\n{}: {}", format_offset(offset), entry.title));
    }
}

/// Lays category changes out as chapters covering `[start_time, end_time]`.
///
/// The first chapter always begins at zero, even when the first category was
/// observed a little after the file started. Categories that were already
/// superseded when the file started are dropped, and chapters shorter than
/// the policy's minimum are folded into the chapter that follows them.
pub fn chapter_marks(metadata: &RecordingMetadata, policy: &ChapterPolicy) -> Vec<ChapterMark> {
    let (Some(start_time), Some(end_time)) = (metadata.start_time, metadata.end_time) else {
        return Vec::new();
    };
    let scale = policy.timebase as f64;
    let t_start = (scale * start_time).floor() as i64;

    let mut raw = Vec::new();
    let mut t_curr = t_start;
    for (i, category) in metadata.categories.iter().enumerate() {
        let next_time = metadata
            .categories
            .get(i + 1)
            .map(|c| c.time)
            .unwrap_or(end_time);
        let t_next = (scale * next_time).floor() as i64;
        if t_next <= t_start {
            continue;
        }
        raw.push(ChapterMark {
            start: t_curr - t_start,
            end: t_next - t_start,
            title: category.title.clone(),
        });
        t_curr = t_next;
    }

    let min_ticks = (policy.min_chapter_secs * scale).round() as i64;
    if min_ticks <= 0 {
        return raw;
    }

    let count = raw.len();
    let mut merged = Vec::with_capacity(count);
    let mut carried_start: Option<i64> = None;
    for (i, mark) in raw.into_iter().enumerate() {
        let start = carried_start.take().unwrap_or(mark.start);
        if i + 1 < count && mark.end - mark.start < min_ticks {
            carried_start = Some(start);
            continue;
        }
        merged.push(ChapterMark {
            start,
            end: mark.end,
            title: mark.title,
        });
    }
    merged
}

/// `H:MM:SS` with unpadded hours below a day, `N day(s), H:MM:SS` from there.
pub fn format_offset(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let rest = total_secs % 86_400;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// Backslash-escapes the characters ffmetadata treats specially.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
