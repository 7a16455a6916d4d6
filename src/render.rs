//! Terminal rendering for schedule events and sync reviews.
//!
//! Event titles are tinted with the same colors the calendar uses, so online
//! and offline sessions are told apart at a glance.

use attendance_core::{Presentation, ScheduleEvent, SyncPlan, Track, WireEvent};
use owo_colors::OwoColorize;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ScheduleEvent {
    fn render(&self) -> String {
        let title = tint(self.title(), self.presentation());
        let venue = match self.branch() {
            Some(branch) => branch.name.clone(),
            None => "online".to_string(),
        };
        let instructor = self
            .instructor()
            .map(|i| format!(" · {}", i))
            .unwrap_or_default();
        let draft = if self.id().is_draft() {
            format!(" {}", "(unsaved)".yellow())
        } else {
            String::new()
        };

        format!(
            "{} {} {} {}{}{}",
            self.day().format("%a %Y-%m-%d"),
            self.duration_display().dimmed(),
            title,
            format!("[{}]", venue).dimmed(),
            instructor.dimmed(),
            draft
        )
    }
}

impl Render for Track {
    fn render(&self) -> String {
        let program = self
            .program_type_display
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();
        format!("{:>4}  {}{}", self.id.to_string().dimmed(), self.label(), program.dimmed())
    }
}

/// Numbered list of the events shown for the selected track.
pub fn render_event_list(events: &[&ScheduleEvent]) -> String {
    if events.is_empty() {
        return "   No sessions".dimmed().to_string();
    }
    events
        .iter()
        .enumerate()
        .map(|(i, event)| format!("{:>4}  {}", i + 1, event.render()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The review shown before a sync: new and updated sessions in two tables.
pub fn render_review(plan: &SyncPlan) -> String {
    let mut lines = Vec::new();

    lines.push(format!("{} ({})", "New sessions".green().bold(), plan.new_count()));
    let new_events: Vec<&WireEvent> = plan.new_events().collect();
    render_table(&new_events, &mut lines);

    lines.push(String::new());
    lines.push(format!(
        "{} ({})",
        "Updated sessions".yellow().bold(),
        plan.updated_count()
    ));
    let updated: Vec<&WireEvent> = plan.updated_events().iter().collect();
    render_table(&updated, &mut lines);

    lines.join("\n")
}

fn render_table(events: &[&WireEvent], lines: &mut Vec<String>) {
    if events.is_empty() {
        lines.push("   (none)".dimmed().to_string());
        return;
    }

    let title_width = events
        .iter()
        .map(|e| e.title.chars().count())
        .max()
        .unwrap_or(0)
        .max("Title".len());

    lines.push(
        format!(
            "   {:<title_width$}  {:<10}  {:<11}  {:<16}  {}",
            "Title", "Date", "Time", "Instructor", "Where"
        )
        .dimmed()
        .to_string(),
    );
    for event in events {
        let venue = match (&event.branch, event.is_online) {
            (_, true) => "online".to_string(),
            (Some(branch), false) => branch.name.clone(),
            (None, false) => "-".to_string(),
        };
        lines.push(format!(
            "   {:<title_width$}  {:<10}  {:<11}  {:<16}  {}",
            event.title,
            event.start.format("%Y-%m-%d").to_string(),
            format!("{}-{}", event.start.format("%H:%M"), event.end.format("%H:%M")),
            event.instructor.as_deref().unwrap_or("-"),
            venue
        ));
    }
}

/// Color text with the presentation's background color.
fn tint(text: &str, presentation: Presentation) -> String {
    match hex_rgb(presentation.background_color) {
        Some((r, g, b)) => text.truecolor(r, g, b).bold().to_string(),
        None => text.to_string(),
    }
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
