use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pagespace::aggregates::{self, DashboardSummary};
use pagespace::assistant::{ChatPanel, QUICK_ACTIONS};
use pagespace::config::{AppConfig, load_config};
use pagespace::core::{BlockId, PageId, Task};
use pagespace::editor;
use pagespace::format::format_page;
use pagespace::inbox::{
    self, CalendarEvent, Email, EmailCategory, Inbox, MeetingRequestId, SlotSelection, TimeSlot,
};
use pagespace::seed::sample_inbox;
use pagespace::storage::{JsonFileSource, SampleSeed, load_store};
use pagespace::{DocumentStore, Operation};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pagespace",
    about = "Page and block workspace tooling built on the pagespace crate",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    /// JSON config file (assistant delay, default seed).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Workspace snapshot to start from. Defaults to the built-in sample workspace.
    #[arg(long, global = true)]
    seed: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the page tree as the sidebar shows it.
    Outline(OutlineArgs),

    /// Render a page as plain text.
    Show(ShowArgs),

    /// List tasks, optionally filtered.
    Tasks(TasksArgs),

    /// List goals with their linked tasks.
    Goals(JsonArgs),

    /// Print dashboard counters.
    Dashboard(JsonArgs),

    /// List sample mail with unread, meeting and urgent badges.
    Inbox(InboxArgs),

    /// Show the events of one day.
    Calendar(CalendarArgs),

    /// Offer times for a meeting request and draft the reply.
    Meeting(MeetingArgs),

    /// Apply a JSON script of store operations in order.
    Apply(ApplyArgs),

    /// Append shorthand lines (`# `, `[] `, `> `, ...) to a page, or to a new page.
    Write(WriteArgs),

    /// Ask the simulated assistant something.
    Ask(AskArgs),

    /// Dump the whole workspace as JSON.
    Snapshot,
}

#[derive(Debug, Args)]
struct OutlineArgs {
    /// Only top-level pages whose title contains this text.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Page id or title. Defaults to the focused page.
    page: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct TasksArgs {
    /// Only tasks that are not completed.
    #[arg(long)]
    active: bool,
    /// Only high-priority open tasks.
    #[arg(long, conflicts_with = "active")]
    urgent: bool,
    /// Only tasks linked to this page id.
    #[arg(long)]
    page: Option<String>,
    /// Only tasks linked to this goal id.
    #[arg(long)]
    goal: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct JsonArgs {
    /// Emit JSON instead of a human-readable list.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// JSON file holding an array of operations.
    script: PathBuf,
    /// What to print once every operation has run.
    #[arg(long, value_enum, default_value_t = ApplyOutput::Outline)]
    emit: ApplyOutput,
    /// Write the resulting workspace snapshot to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ApplyOutput {
    Outline,
    Snapshot,
    None,
}

#[derive(Debug, Args)]
struct WriteArgs {
    /// Target page id or title. Omit to create a new Untitled page.
    #[arg(long)]
    page: Option<String>,
    /// Insert after this block instead of at the end.
    #[arg(long)]
    after: Option<String>,
    /// Lines to insert, in order.
    #[arg(required = true)]
    lines: Vec<String>,
    /// Write the resulting workspace snapshot to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InboxArgs {
    /// Only messages in this category (meeting, task, deadline, follow-up, ...).
    #[arg(long)]
    category: Option<EmailCategory>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CalendarArgs {
    /// Day to show (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Days to move forward from `--date`, or back when negative.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i64,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct MeetingArgs {
    /// Meeting request id. Defaults to the first pending request.
    request: Option<String>,
    /// Slot number (1-based) to offer in the reply. Repeat for up to three.
    #[arg(long = "slot")]
    slots: Vec<usize>,
}

#[derive(Debug, Args)]
struct AskArgs {
    /// Free-form prompt.
    prompt: Option<String>,
    /// Use a quick action (1-based) instead of a prompt.
    #[arg(long, conflicts_with = "prompt")]
    quick: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let mut store = open_store(cli.seed.as_deref(), &config)?;
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Outline(args) => handle_outline(&store, args),
        Commands::Show(args) => handle_show(&store, args),
        Commands::Tasks(args) => handle_tasks(&store, args),
        Commands::Goals(args) => handle_goals(&store, args),
        Commands::Dashboard(args) => handle_dashboard(&store, args, now),
        Commands::Inbox(args) => handle_inbox(&sample_inbox(now), args),
        Commands::Calendar(args) => handle_calendar(&sample_inbox(now), args, now),
        Commands::Meeting(args) => handle_meeting(&sample_inbox(now), args, now),
        Commands::Apply(args) => handle_apply(&mut store, args),
        Commands::Write(args) => handle_write(&mut store, args),
        Commands::Ask(args) => handle_ask(&store, &config, args).await,
        Commands::Snapshot => print_json(store.workspace()),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(seed: Option<&Path>, config: &AppConfig) -> Result<DocumentStore> {
    match seed.or(config.seed.as_deref()) {
        Some(path) => {
            debug!(?path, "seeding from snapshot");
            load_store(&JsonFileSource::new(path))
        }
        None => load_store(&SampleSeed),
    }
}

fn handle_outline(store: &DocumentStore, args: OutlineArgs) -> Result<()> {
    let OutlineArgs { search, json } = args;
    let workspace = store.workspace();
    let mut outline = aggregates::page_outline(workspace);
    if let Some(query) = search.as_deref() {
        let hits: Vec<&PageId> = aggregates::search_pages(workspace, query)
            .into_iter()
            .map(|p| &p.id)
            .collect();
        outline.retain(|entry| entry.depth == 0 && hits.contains(&&entry.id));
    }

    if json {
        return print_json(&outline);
    }
    let current = store.current_page_id();
    for entry in outline {
        let marker = if Some(&entry.id) == current { '*' } else { ' ' };
        println!(
            "{marker} {}{} {}  ({})",
            "  ".repeat(entry.depth),
            entry.icon,
            entry.title,
            entry.id
        );
    }
    Ok(())
}

fn handle_show(store: &DocumentStore, args: ShowArgs) -> Result<()> {
    let ShowArgs { page, json } = args;
    let page = match page.as_deref() {
        Some(key) => resolve_page(store, key)?,
        None => store
            .current_page()
            .map(|p| p.id.clone())
            .context("no page is focused")?,
    };
    let page = store
        .find_page(&page)
        .with_context(|| format!("page {page} vanished"))?;
    if json {
        return print_json(page);
    }
    print!("{}", format_page(page));
    let tasks = aggregates::tasks_by_page(store.workspace(), &page.id);
    if !tasks.is_empty() {
        println!("\nLinked tasks:");
        for task in tasks {
            println!("  {}", render_task_line(task));
        }
    }
    Ok(())
}

fn handle_tasks(store: &DocumentStore, args: TasksArgs) -> Result<()> {
    let TasksArgs {
        active,
        urgent,
        page,
        goal,
        json,
    } = args;
    let workspace = store.workspace();
    let mut tasks = if urgent {
        aggregates::urgent_tasks(workspace)
    } else if active {
        aggregates::active_tasks(workspace)
    } else {
        workspace.tasks.iter().collect()
    };
    if let Some(page) = page {
        let linked = aggregates::tasks_by_page(workspace, &PageId(page));
        tasks.retain(|t| linked.iter().any(|l| l.id == t.id));
    }
    if let Some(goal) = goal {
        let linked = aggregates::tasks_by_goal(workspace, &goal.as_str().into());
        tasks.retain(|t| linked.iter().any(|l| l.id == t.id));
    }

    if json {
        return print_json(&tasks);
    }
    for task in tasks {
        println!("{}", render_task_line(task));
    }
    Ok(())
}

fn handle_goals(store: &DocumentStore, args: JsonArgs) -> Result<()> {
    let workspace = store.workspace();
    let goals: Vec<_> = workspace
        .goals
        .iter()
        .filter_map(|g| aggregates::goal_snapshot(workspace, &g.id))
        .collect();
    if args.json {
        return print_json(&goals);
    }
    for goal in goals {
        let due = goal
            .due_date
            .map(|d| format!(" due {d}"))
            .unwrap_or_default();
        println!("{} [{:>3}%]{}  ({})", goal.title, goal.progress, due, goal.id);
        if !goal.description.is_empty() {
            println!("    {}", goal.description);
        }
        for task in &goal.tasks {
            println!("    {}", render_task_line(task));
        }
    }
    Ok(())
}

fn handle_dashboard(store: &DocumentStore, args: JsonArgs, now: NaiveDateTime) -> Result<()> {
    let summary = aggregates::dashboard_summary(store.workspace(), &sample_inbox(now), now);
    if args.json {
        return print_json(&summary);
    }
    print!("{}", render_dashboard(&summary));
    Ok(())
}

fn handle_apply(store: &mut DocumentStore, args: ApplyArgs) -> Result<()> {
    let ApplyArgs {
        script,
        emit,
        output,
    } = args;
    let ops = read_script(&script)?;
    for (idx, op) in ops.into_iter().enumerate() {
        let name = op.name();
        let outcome = store.apply(op);
        eprintln!("{:>3}. {name}: {outcome:?}", idx + 1);
    }

    if let Some(path) = output {
        write_snapshot(store, &path)?;
    }
    match emit {
        ApplyOutput::Outline => handle_outline(
            store,
            OutlineArgs {
                search: None,
                json: false,
            },
        ),
        ApplyOutput::Snapshot => print_json(store.workspace()),
        ApplyOutput::None => Ok(()),
    }
}

fn handle_write(store: &mut DocumentStore, args: WriteArgs) -> Result<()> {
    let WriteArgs {
        page,
        after,
        lines,
        output,
    } = args;
    let page_id = match page.as_deref() {
        Some(key) => resolve_page(store, key)?,
        None => editor::new_page(store),
    };
    let mut anchor = after.map(BlockId);
    for line in &lines {
        let inserted = editor::insert_shorthand(store, &page_id, anchor.as_ref(), line)
            .with_context(|| format!("page {page_id} is gone"))?;
        if anchor.is_some() {
            anchor = Some(inserted);
        }
    }
    if let Some(path) = output {
        write_snapshot(store, &path)?;
    }
    let page = store
        .find_page(&page_id)
        .with_context(|| format!("page {page_id} is gone"))?;
    print!("{}", format_page(page));
    Ok(())
}

fn handle_inbox(mail: &Inbox, args: InboxArgs) -> Result<()> {
    let InboxArgs { category, json } = args;
    let emails = inbox::filter_emails(&mail.emails, category);
    if json {
        return print_json(&emails);
    }
    let counts = inbox::inbox_counts(&mail.emails);
    println!(
        "{} unread, {} meetings, {} urgent",
        counts.unread, counts.meetings, counts.urgent
    );
    for email in emails {
        println!("{}", render_email_line(email));
    }
    Ok(())
}

fn handle_calendar(mail: &Inbox, args: CalendarArgs, now: NaiveDateTime) -> Result<()> {
    let CalendarArgs { date, offset, json } = args;
    let day = inbox::shift_day(date.unwrap_or(now.date()), offset);
    let events = inbox::events_on(&mail.events, day);
    if json {
        return print_json(&events);
    }
    println!("{}", day.format("%A, %B %-d, %Y"));
    if events.is_empty() {
        println!("  No events scheduled");
    }
    for event in events {
        println!("{}", render_event_line(event));
    }
    Ok(())
}

fn handle_meeting(mail: &Inbox, args: MeetingArgs, now: NaiveDateTime) -> Result<()> {
    let MeetingArgs { request, slots } = args;
    let request = match request {
        Some(id) => mail
            .find_meeting_request(&MeetingRequestId(id.clone()))
            .with_context(|| format!("no meeting request {id:?}"))?,
        None => inbox::pending_meetings(&mail.meeting_requests)
            .into_iter()
            .next()
            .context("no pending meeting requests")?,
    };
    let offered = inbox::suggested_slots(Some(request), now);
    if slots.is_empty() {
        println!("{}  ({} min)", request.subject, request.duration_minutes);
        for (idx, slot) in offered.iter().enumerate() {
            println!("{}. {}", idx + 1, render_slot_line(slot));
        }
        return Ok(());
    }
    let picked = pick_slots(&offered, &slots)?;
    println!("{}", inbox::reply_draft(picked.slots(), inbox::sender_name(mail, request)));
    Ok(())
}

/// Toggle the 1-based `picks` into a selection, in order.
fn pick_slots(offered: &[TimeSlot], picks: &[usize]) -> Result<SlotSelection> {
    let mut selection = SlotSelection::default();
    for &n in picks {
        let Some(slot) = n.checked_sub(1).and_then(|i| offered.get(i)) else {
            bail!("slot {n} does not exist (1-{})", offered.len());
        };
        if !selection.toggle(*slot) && selection.slots().len() == inbox::MAX_SELECTED_SLOTS {
            bail!("at most {} slots can be offered", inbox::MAX_SELECTED_SLOTS);
        }
    }
    Ok(selection)
}

async fn handle_ask(store: &DocumentStore, config: &AppConfig, args: AskArgs) -> Result<()> {
    let AskArgs { prompt, quick } = args;
    let prompt = match (prompt, quick) {
        (Some(prompt), _) => prompt,
        (None, Some(n)) => QUICK_ACTIONS
            .get(n.wrapping_sub(1))
            .map(|a| a.prompt.to_string())
            .with_context(|| format!("quick action {n} does not exist (1-{})", QUICK_ACTIONS.len()))?,
        (None, None) => {
            for (idx, action) in QUICK_ACTIONS.iter().enumerate() {
                println!("{}. {}  \"{}\"", idx + 1, action.label, action.prompt);
            }
            return Ok(());
        }
    };

    let mut panel = ChatPanel::new(config.assistant.reply_delay());
    panel.send(&prompt, store)?;
    if let Some(reply) = panel.next_reply().await {
        println!("{}", reply.content);
    }
    Ok(())
}

/// Match by id first, then by exact title (ignoring case) anywhere in the forest.
fn resolve_page(store: &DocumentStore, key: &str) -> Result<PageId> {
    let id = PageId::from(key);
    if store.find_page(&id).is_some() {
        return Ok(id);
    }
    store
        .workspace()
        .all_pages()
        .into_iter()
        .find(|p| p.title.eq_ignore_ascii_case(key))
        .map(|p| p.id.clone())
        .with_context(|| format!("no page with id or title {key:?}"))
}

fn write_snapshot(store: &DocumentStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store.workspace())?;
    fs::write(path, json).with_context(|| format!("writing snapshot {:?}", path))
}

fn read_script(path: &Path) -> Result<Vec<Operation>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading script {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing operations in {:?}", path))
}

fn render_task_line(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    let due = task
        .due_date
        .map(|d| format!(" due {d}"))
        .unwrap_or_default();
    format!("[{mark}] {} ({}){}", task.title, task.priority, due)
}

fn render_dashboard(summary: &DashboardSummary) -> String {
    format!(
        "{}\n\nActive tasks:     {}\nUrgent tasks:     {}\nCompleted tasks:  {}\nGoals:            {}\nPages:            {}\nUnread emails:    {}\nUrgent emails:    {}\nPending meetings: {}\nToday's events:   {}\n",
        summary.greeting,
        summary.active_tasks,
        summary.urgent_tasks,
        summary.completed_tasks,
        summary.goals,
        summary.pages,
        summary.unread_emails,
        summary.urgent_emails,
        summary.pending_meetings,
        summary.todays_events
    )
}

fn render_email_line(email: &Email) -> String {
    let unread = if email.is_read { ' ' } else { '*' };
    let urgent = if email.is_urgent() { " !" } else { "" };
    format!(
        "{unread} {:<14} {:<20} {}{urgent}",
        email.category.as_str(),
        email.from.name,
        email.subject
    )
}

fn render_event_line(event: &CalendarEvent) -> String {
    let place = event
        .location
        .as_deref()
        .or(event.meeting_link.as_deref())
        .map(|p| format!("  @ {p}"))
        .unwrap_or_default();
    format!(
        "  {}-{} {}{place}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M"),
        event.title
    )
}

fn render_slot_line(slot: &TimeSlot) -> String {
    format!("{}  [{}% match]", inbox::format_slot(slot), slot.score)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagespace::core::{Priority, TaskId};
    use pagespace::storage::WorkspaceSource;

    fn sample_store() -> DocumentStore {
        load_store(&SampleSeed).expect("sample store")
    }

    #[test]
    fn resolve_page_accepts_id_or_title() {
        let store = sample_store();
        assert_eq!(resolve_page(&store, "page-3").unwrap().as_str(), "page-3");
        assert_eq!(resolve_page(&store, "meeting notes").unwrap().as_str(), "page-2-1");
        assert!(resolve_page(&store, "Nowhere").is_err());
    }

    #[test]
    fn read_script_parses_operation_list() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("ops.json");
        fs::write(
            &path,
            r#"[{"op": "toggle_task", "taskId": "task-7"}, {"op": "delete_page", "pageId": "page-2"}]"#,
        )
        .expect("write script");

        let ops = read_script(&path).expect("parse");
        let names: Vec<_> = ops.iter().map(|op| op.name()).collect();
        assert_eq!(names, ["toggle_task", "delete_page"]);
    }

    #[test]
    fn seed_flag_overrides_config() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("seed.json");
        let mut workspace = SampleSeed.load().expect("sample");
        workspace.pages.truncate(1);
        fs::write(&path, serde_json::to_string(&workspace).unwrap()).expect("write seed");

        let config = AppConfig {
            seed: Some(tmp.path().join("missing.json")),
            ..AppConfig::default()
        };
        let store = open_store(Some(path.as_path()), &config).expect("open");
        assert_eq!(store.workspace().pages.len(), 1);
        assert!(open_store(None, &config).is_err());
    }

    #[test]
    fn task_line_shows_state_and_priority() {
        let mut task = Task::new(TaskId::from("t"), "Ship", Priority::High);
        task.completed = true;
        assert_eq!(render_task_line(&task), "[x] Ship (high)");
    }

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 23)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    #[test]
    fn dashboard_text_lists_every_counter() {
        let now = morning();
        let summary =
            aggregates::dashboard_summary(sample_store().workspace(), &sample_inbox(now), now);
        let text = render_dashboard(&summary);
        assert!(text.starts_with("Good morning\n"));
        assert!(text.contains("Active tasks:     5"));
        assert!(text.contains("Pages:            5"));
        assert!(text.contains("Unread emails:    3"));
        assert!(text.contains("Today's events:   3"));
    }

    #[test]
    fn write_can_save_the_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("after-write.json");
        let mut store = sample_store();
        handle_write(
            &mut store,
            WriteArgs {
                page: Some("page-3".into()),
                after: None,
                lines: vec!["[] Book venue".into()],
                output: Some(path.clone()),
            },
        )
        .expect("write");

        let reloaded = load_store(&JsonFileSource::new(&path)).expect("reload snapshot");
        let page = reloaded
            .find_page(&PageId::from("page-3"))
            .expect("page-3");
        assert!(page.blocks.iter().any(|b| b.content == "Book venue"));
        assert_eq!(reloaded.workspace().all_pages().len(), store.workspace().all_pages().len());
    }

    #[test]
    fn slot_picks_are_one_based_and_capped() {
        let now = morning();
        let offered = inbox::suggested_slots(None, now);
        let picked = pick_slots(&offered, &[2, 1]).expect("picks");
        assert_eq!(picked.slots(), &[offered[1], offered[0]]);
        assert!(pick_slots(&offered, &[0]).is_err());
        assert!(pick_slots(&offered, &[4]).is_err());

        let mut more = offered.clone();
        more.extend(inbox::suggested_slots(None, now + chrono::Duration::days(7)));
        assert!(pick_slots(&more, &[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn email_line_marks_unread_and_urgent() {
        let mail = sample_inbox(morning());
        let line = render_email_line(&mail.emails[0]);
        assert!(line.starts_with("* meeting"));
        assert!(line.ends_with("Quick sync on Q1 roadmap - Can we meet this week? !"));
    }
}
