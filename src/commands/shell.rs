//! The interactive scheduling shell.
//!
//! Stands in for the calendar page: every line is one gesture (create, move,
//! resize, toggle, ...) applied to the in-memory event store, and `sync`
//! sends the selected track's sessions to the backend after a review.
//! Unsynced drafts live only as long as the shell does.

use anyhow::{Context, Result};
use attendance_core::{
    DayCheck, EventDraft, EventId, EventPatch, EventStore, ScheduleEvent, Session, SyncBackend,
    SyncError, SyncGateway, SyncPlan, TrackId, TrackSelector, ValidationError,
};
use chrono::{Local, NaiveDateTime, TimeDelta};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use owo_colors::OwoColorize;

use crate::config;
use crate::render::{self, Render};
use crate::utils::{parse_date, parse_datetime, split_args};

#[derive(Parser, Debug)]
#[command(name = "attendance", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// List the available tracks
    Tracks,
    /// Select the track whose sessions are shown
    Track {
        /// Track id (see `tracks`)
        id: String,
    },
    /// Show the sessions of the selected track
    #[command(alias = "ls")]
    List,
    /// List the branches sessions can take place at
    Branches,
    /// Create a session in the selected track
    New {
        /// Session title
        title: String,

        /// Start (e.g. "2025-03-20T09:00")
        #[arg(short, long)]
        start: String,

        /// End, on the same day as the start
        #[arg(short, long)]
        end: String,

        /// Instructor name
        #[arg(short, long)]
        instructor: Option<String>,

        /// Hold the session online instead of at a branch
        #[arg(long)]
        online: bool,
    },
    /// Change a session's details
    Edit {
        /// Row number from `list`
        row: usize,

        #[arg(long)]
        title: Option<String>,

        /// Instructor name ("" clears it)
        #[arg(long)]
        instructor: Option<String>,

        /// true for online, false for offline
        #[arg(long)]
        online: Option<bool>,

        /// Branch id for an offline session
        #[arg(long)]
        branch: Option<String>,
    },
    /// Move a session to another time, keeping its length unless --end is given
    Move {
        row: usize,

        #[arg(short, long)]
        start: String,

        #[arg(short, long)]
        end: Option<String>,
    },
    /// Change when a session ends (and optionally starts)
    Resize {
        row: usize,

        #[arg(short, long)]
        end: String,

        #[arg(short, long)]
        start: Option<String>,
    },
    /// Switch a session between online and offline
    Toggle { row: usize },
    /// Set the branch for every offline session on a day
    BranchDay {
        /// Day (YYYY-MM-DD)
        date: String,

        /// Branch id (see `branches`)
        branch: String,
    },
    /// Remove a session
    Delete {
        row: usize,

        /// Also delete a saved session on the backend
        #[arg(long)]
        remote: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Review and save the selected track's sessions to the backend
    Sync {
        /// Skip the review prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Leave the shell (unsynced sessions are discarded)
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn run(cfg: &config::Config) -> Result<()> {
    let (session, client) = super::connect(cfg)?;

    let mut store = EventStore::new(cfg.branch_directory());
    let tracks = client.list_tracks().await.context("Failed to fetch tracks")?;
    store.set_tracks(tracks);

    println!(
        "Logged in as {} ({}). Type `help` for commands.",
        session.name().bold(),
        session.role()
    );
    if !session.can_schedule() {
        println!("{}", "Read-only: only supervisors and admins can change the schedule.".dimmed());
    }

    let mut shell = Shell::new(store, SyncGateway::new(client), session, local_now);
    loop {
        let line: String = match Input::new()
            .with_prompt(shell.prompt())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(_) => break,
        };

        match shell.handle_line(&line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => report(&err),
        }
    }

    shell.finish();
    Ok(())
}

/// End of a session of `length` starting at `start`.
fn end_after(start: NaiveDateTime, length: TimeDelta) -> Result<NaiveDateTime> {
    start
        .checked_add_signed(length)
        .ok_or_else(|| anyhow::anyhow!("A session starting at {} would end out of range", start))
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Validation problems are notices; everything else is an error.
fn report(err: &anyhow::Error) {
    if let Some(invalid) = err.downcast_ref::<ValidationError>() {
        println!("{} {}", "!".yellow(), invalid.yellow());
    } else {
        eprintln!("{} {:#}", "x".red(), err);
    }
}

pub struct Shell<B> {
    store: EventStore,
    selector: TrackSelector,
    gateway: SyncGateway<B>,
    session: Session,
    clock: fn() -> NaiveDateTime,
}

impl<B: SyncBackend> Shell<B> {
    pub fn new(
        store: EventStore,
        gateway: SyncGateway<B>,
        session: Session,
        clock: fn() -> NaiveDateTime,
    ) -> Self {
        Shell {
            store,
            selector: TrackSelector::new(),
            gateway,
            session,
            clock,
        }
    }

    fn prompt(&self) -> String {
        match self.selector.selected().and_then(|id| self.store.track(id)) {
            Some(track) => format!("attendance [{}]", track.name),
            None => "attendance".to_string(),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let args = split_args(line)?;
        if args.is_empty() {
            return Ok(Flow::Continue);
        }

        let parsed = match ShellLine::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(err) => {
                err.print()?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(command = ?parsed.command, "shell command");
        self.execute(parsed.command).await
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Tracks => self.list_tracks(),
            ShellCommand::Track { id } => self.select_track(TrackId::new(id)).await?,
            ShellCommand::List => self.list_events(),
            ShellCommand::Branches => println!("{}", super::branches::render(self.store.branches())),
            ShellCommand::New {
                title,
                start,
                end,
                instructor,
                online,
            } => {
                self.require_scheduling()?;
                let track_id = self
                    .selector
                    .selected()
                    .cloned()
                    .ok_or(ValidationError::NoTrackSelected)?;
                let draft = EventDraft {
                    title,
                    instructor,
                    start: parse_datetime(&start)?,
                    end: parse_datetime(&end)?,
                    is_online: online,
                };
                let id = self.store.create_event(&track_id, draft, (self.clock)())?;
                self.print_event("Created", &id);
            }
            ShellCommand::Edit {
                row,
                title,
                instructor,
                online,
                branch,
            } => {
                self.require_scheduling()?;
                let id = self.row_id(row)?;
                let branch = branch
                    .map(|b| {
                        self.store
                            .branches()
                            .get(&b)
                            .cloned()
                            .ok_or(ValidationError::UnknownBranch(b))
                    })
                    .transpose()?;
                let patch = EventPatch {
                    title,
                    instructor: instructor.map(Some),
                    is_online: online,
                    branch,
                };
                if patch.is_empty() {
                    anyhow::bail!("Nothing to change. See `edit --help`");
                }
                self.store.update_event(&id, patch)?;
                self.print_event("Updated", &id);
            }
            ShellCommand::Move { row, start, end } => {
                self.require_scheduling()?;
                let (id, length) = {
                    let event = self.row(row)?;
                    (event.id().clone(), event.end() - event.start())
                };
                let start = parse_datetime(&start)?;
                let end = match end {
                    Some(end) => parse_datetime(&end)?,
                    None => end_after(start, length)?,
                };
                let check = self.store.move_event(&id, start, end)?;
                self.report_day_check(check);
                self.print_event("Moved", &id);
            }
            ShellCommand::Resize { row, end, start } => {
                self.require_scheduling()?;
                let (id, current_start) = {
                    let event = self.row(row)?;
                    (event.id().clone(), event.start())
                };
                let start = match start {
                    Some(start) => parse_datetime(&start)?,
                    None => current_start,
                };
                let check = self.store.resize_event(&id, start, parse_datetime(&end)?)?;
                self.report_day_check(check);
                self.print_event("Resized", &id);
            }
            ShellCommand::Toggle { row } => {
                self.require_scheduling()?;
                let id = self.row_id(row)?;
                self.store.toggle_online(&id)?;
                self.print_event("Updated", &id);
            }
            ShellCommand::BranchDay { date, branch } => {
                self.require_scheduling()?;
                let day = parse_date(&date)?;
                let updated = self.store.assign_branch_to_day(day, &branch)?;
                println!("Updated {} session(s) on {}", updated, day);
            }
            ShellCommand::Delete { row, remote, yes } => {
                self.require_scheduling()?;
                self.delete(row, remote, yes).await?;
            }
            ShellCommand::Sync { yes } => {
                self.require_scheduling()?;
                self.sync(yes).await?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn require_scheduling(&self) -> Result<()> {
        if !self.session.can_schedule() {
            anyhow::bail!(
                "A {} account cannot change the schedule",
                self.session.role()
            );
        }
        Ok(())
    }

    /// Sessions of the selected track, ordered by start. Row numbers index this.
    fn visible(&self) -> Vec<&ScheduleEvent> {
        let mut events = self.selector.filter(self.store.events());
        events.sort_by_key(|e| e.start());
        events
    }

    fn row(&self, row: usize) -> Result<&ScheduleEvent> {
        if self.selector.selected().is_none() {
            return Err(ValidationError::NoTrackSelected.into());
        }
        row.checked_sub(1)
            .and_then(|i| self.visible().get(i).copied())
            .ok_or_else(|| anyhow::anyhow!("No session #{}. Run `list` to see row numbers", row))
    }

    fn row_id(&self, row: usize) -> Result<EventId> {
        Ok(self.row(row)?.id().clone())
    }

    fn print_event(&self, verb: &str, id: &EventId) {
        if let Some(event) = self.store.get(id) {
            println!("{} {}", verb.green(), event.render());
        }
    }

    fn report_day_check(&self, check: DayCheck) {
        if check == DayCheck::CrossesDay {
            println!(
                "{} {}",
                "!".yellow(),
                "This session now spans more than one day".yellow()
            );
        }
    }

    fn list_tracks(&self) {
        if self.store.tracks().is_empty() {
            println!("No tracks.");
        }
        let selected = self.selector.selected();
        for track in self.store.tracks() {
            let marker = if Some(&track.id) == selected { "*" } else { " " };
            println!("{} {}", marker.green(), track.render());
        }
    }

    fn list_events(&self) {
        if self.selector.selected().is_none() {
            println!("Select a track first (`track <id>`)");
            return;
        }
        println!("{}", render::render_event_list(&self.visible()));
    }

    async fn select_track(&mut self, track_id: TrackId) -> Result<()> {
        if self.store.track(&track_id).is_none() {
            return Err(ValidationError::UnknownTrack(track_id).into());
        }
        self.selector.select(track_id.clone());

        match self.gateway.load_track(&mut self.store, &track_id).await {
            Ok(0) => {}
            Ok(added) => println!("Loaded {} saved session(s)", added),
            Err(err) => println!(
                "{} {}",
                "!".yellow(),
                format!("Could not load saved sessions: {}", err).yellow()
            ),
        }
        self.list_events();
        Ok(())
    }

    async fn delete(&mut self, row: usize, remote: bool, yes: bool) -> Result<()> {
        let (id, title) = {
            let event = self.row(row)?;
            (event.id().clone(), event.title().to_string())
        };

        if !yes
            && !Confirm::new()
                .with_prompt(format!("Delete \"{}\"?", title))
                .default(false)
                .interact()?
        {
            return Ok(());
        }

        if remote {
            self.gateway.delete_remote(&mut self.store, &id).await?;
        } else {
            self.store.delete_event(&id)?;
        }
        println!("{} {}", "Deleted".red(), title);
        Ok(())
    }

    async fn sync(&mut self, yes: bool) -> Result<()> {
        if self.selector.selected().is_none() {
            return Err(ValidationError::NoTrackSelected.into());
        }
        let plan = SyncPlan::from_events(self.visible());
        if plan.is_empty() {
            println!("Nothing to sync.");
            return Ok(());
        }

        println!("{}", render::render_review(&plan));
        if !yes
            && !Confirm::new()
                .with_prompt("Save these sessions?")
                .default(true)
                .interact()?
        {
            return Ok(());
        }

        match self.gateway.sync(&mut self.store, &plan).await {
            Ok(receipt) => {
                println!(
                    "{} Saved {} new and {} updated session(s)",
                    "ok".green(),
                    plan.new_count(),
                    plan.updated_count()
                );
                if receipt.assigned.len() < plan.new_count() {
                    println!(
                        "Reloaded {} saved session(s) for sessions the backend did not echo",
                        receipt.reloaded
                    );
                }
            }
            Err(SyncError::InFlight) => {
                println!("{} A sync is already running", "!".yellow());
            }
            Err(err) => {
                eprintln!("{} Sync failed: {}. Nothing was changed locally.", "x".red(), err);
            }
        }
        Ok(())
    }

    /// End the shell session. Unsynced drafts are dropped with the store.
    pub fn finish(self) {
        let drafts = self
            .store
            .events()
            .iter()
            .filter(|e| e.id().is_draft())
            .count();
        if drafts > 0 {
            println!("{} unsaved session(s) discarded", drafts);
        }
        self.session.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::{
        Branch, BranchDirectory, BulkSyncRequest, BulkSyncResponse, Role, ServerId, SessionConfig,
        Track, WireEvent,
    };
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<BulkSyncRequest>>,
        deleted: Mutex<Vec<ServerId>>,
    }

    impl SyncBackend for RecordingBackend {
        async fn bulk_create_or_update(
            &self,
            request: &BulkSyncRequest,
        ) -> Result<BulkSyncResponse, SyncError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(BulkSyncResponse::default())
        }

        async fn delete_session(&self, id: &ServerId) -> Result<(), SyncError> {
            self.deleted.lock().unwrap().push(id.clone());
            Ok(())
        }

        async fn list_sessions(&self, track_id: &TrackId) -> Result<Vec<WireEvent>, SyncError> {
            let day = NaiveDate::from_ymd_opt(2030, 1, 16).unwrap();
            Ok(vec![WireEvent {
                id: Some(ServerId::new("srv-1")),
                title: "Saved".to_string(),
                instructor: None,
                start: day.and_hms_opt(9, 0, 0).unwrap(),
                end: day.and_hms_opt(10, 0, 0).unwrap(),
                is_online: true,
                track_id: track_id.clone(),
                branch: None,
            }])
        }
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn shell(role: Role) -> Shell<RecordingBackend> {
        let branch = Branch::new("1", "Smart Village");
        let mut store = EventStore::new(BranchDirectory::new(vec![
            branch.clone(),
            Branch::new("2", "New Capital"),
        ]));
        store.set_tracks(vec![Track::new("web", "Web").with_default_branch(branch)]);
        let session = Session::init(SessionConfig {
            token: Some("t".to_string()),
            role,
            name: None,
        })
        .unwrap();
        Shell::new(
            store,
            SyncGateway::new(RecordingBackend::default()),
            session,
            fixed_now,
        )
    }

    #[test]
    fn parses_shell_commands() {
        let line = ShellLine::try_parse_from(["branch-day", "2030-01-15", "2"]).unwrap();
        assert!(matches!(line.command, ShellCommand::BranchDay { .. }));

        let line = ShellLine::try_parse_from(["edit", "2", "--online", "false"]).unwrap();
        assert!(matches!(
            line.command,
            ShellCommand::Edit { row: 2, online: Some(false), .. }
        ));

        assert!(ShellLine::try_parse_from(["exit"]).is_ok());
        assert!(ShellLine::try_parse_from(["frobnicate"]).is_err());
    }

    #[tokio::test]
    async fn create_edit_and_sync_selected_track() {
        let mut shell = shell(Role::Supervisor);

        shell.handle_line("track web").await.unwrap();
        assert_eq!(shell.store.len(), 1, "saved session loaded");

        shell
            .handle_line(r#"new "HTML Basics" --start 2030-01-15T09:00 --end 2030-01-15T12:00 -i Mona"#)
            .await
            .unwrap();
        assert_eq!(shell.visible()[0].title(), "HTML Basics");

        shell.handle_line("toggle 1").await.unwrap();
        assert!(shell.visible()[0].is_online());

        shell.handle_line("edit 1 --online false --branch 2").await.unwrap();
        assert_eq!(shell.visible()[0].branch().unwrap().name, "New Capital");

        shell.handle_line("move 1 --start 2030-01-15T13:00").await.unwrap();
        assert_eq!(shell.visible()[0].end().format("%H:%M").to_string(), "16:00");

        shell.handle_line("sync --yes").await.unwrap();
        let requests = shell.gateway.backend().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let combined = &requests[0].combined_events;
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].id, None);
        assert_eq!(combined[1].id, Some(ServerId::new("srv-1")));
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let mut shell = shell(Role::Admin);
        shell.handle_line("track web").await.unwrap();

        let err = shell
            .handle_line(r#"new "" --start 2030-01-15T09:00 --end 2030-01-15T10:00"#)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyTitle)
        );
        assert_eq!(shell.store.len(), 1);
    }

    #[tokio::test]
    async fn new_requires_selected_track() {
        let mut shell = shell(Role::Admin);
        let err = shell
            .handle_line("new HTML --start 2030-01-15T09:00 --end 2030-01-15T10:00")
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoTrackSelected)
        );
    }

    #[tokio::test]
    async fn remote_delete_only_for_flagged_rows() {
        let mut shell = shell(Role::Admin);
        shell.handle_line("track web").await.unwrap();

        shell.handle_line("delete 1 --remote --yes").await.unwrap();
        assert!(shell.store.is_empty());
        assert_eq!(
            *shell.gateway.backend().deleted.lock().unwrap(),
            vec![ServerId::new("srv-1")]
        );
    }

    #[tokio::test]
    async fn students_cannot_change_schedule() {
        let mut shell = shell(Role::Student);
        shell.handle_line("track web").await.unwrap();

        assert!(shell.handle_line("toggle 1").await.is_err());
        assert!(shell.store.events()[0].is_online());
    }

    #[tokio::test]
    async fn unknown_row_is_an_error() {
        let mut shell = shell(Role::Admin);
        shell.handle_line("track web").await.unwrap();
        assert!(shell.handle_line("toggle 7").await.is_err());
        assert!(shell.handle_line("toggle 0").await.is_err());
    }

    #[test]
    fn move_without_end_keeps_length_in_range() {
        let start = fixed_now();
        assert_eq!(
            end_after(start, TimeDelta::hours(2)).unwrap(),
            start + TimeDelta::hours(2)
        );
        assert!(end_after(NaiveDateTime::MAX, TimeDelta::hours(1)).is_err());
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let mut shell = shell(Role::Admin);
        assert_eq!(shell.handle_line("quit").await.unwrap(), Flow::Quit);
        assert_eq!(shell.handle_line("   ").await.unwrap(), Flow::Continue);
    }
}
