use chrono::{DateTime, Days, NaiveDate, Utc};
use wellness_core::config::MAX_WINDOW_DAYS;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};
use wellness_core::config::DataConfig;
use wellness_core::*;

#[derive(Parser)]
#[command(name = "wellness")]
#[command(about = "Wellness tracker: moods, habits, exercise routines and stats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Name shown in greetings
        #[arg(long)]
        name: String,
    },

    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Log and review moods
    Mood {
        #[command(subcommand)]
        command: MoodCommand,
    },

    /// Manage habits and mark them done
    Habit {
        #[command(subcommand)]
        command: HabitCommand,
    },

    /// Mood and habit statistics
    Stats {
        /// Days to cover, including today (default from config)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Motivational quote of the day
    Quote,

    /// Browse and play exercise routines
    Routine {
        #[command(subcommand)]
        command: RoutineCommand,
    },
}

#[derive(Subcommand)]
enum MoodCommand {
    /// Log how you feel right now (happy, calm, neutral, tired, sad, anxious, angry)
    Log {
        mood: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// List recent entries
    List {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Delete an entry
    Delete { id: String },
}

#[derive(Subcommand)]
enum HabitCommand {
    /// Add a habit
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List habits with today's status
    List,
    /// Mark a habit done (today unless --date is given)
    Done {
        id: String,
        /// Day to mark, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Remove the mark instead
        #[arg(long)]
        undo: bool,
    },
    /// Rename a habit
    Rename { id: String, name: String },
    /// Delete a habit
    Delete { id: String },
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// List routine categories
    Categories,
    /// Show the exercises of a routine
    Show { category: Option<String> },
    /// Play a routine with its countdown timer
    Play {
        category: Option<String>,
        /// Run ticks without waiting and complete repetitions automatically
        #[arg(long)]
        fast: bool,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    wellness_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data = DataConfig {
        data_dir: cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()),
    };
    tracing::debug!("Using data directory {:?}", data.data_dir);

    match cli.command {
        Commands::Register {
            email,
            password,
            name,
        } => cmd_register(&data, &email, &password, &name),
        Commands::Login { email, password } => cmd_login(&data, &email, &password),
        Commands::Logout => cmd_logout(&data),
        Commands::Whoami => cmd_whoami(&data),
        Commands::Mood { command } => cmd_mood(&data, command),
        Commands::Habit { command } => cmd_habit(&data, command),
        Commands::Stats { days } => {
            cmd_stats(&data, days.unwrap_or(config.stats.window_days))
        }
        Commands::Quote => cmd_quote(&data),
        Commands::Routine { command } => {
            cmd_routine(command, &config.routine.default_category)
        }
    }
}

fn open_store(data: &DataConfig) -> Result<LocalStore> {
    LocalStore::open(data.store_path())
}

fn open_auth(data: &DataConfig) -> Result<LocalAuth> {
    LocalAuth::open(data.auth_path())
}

fn signed_in_user(data: &DataConfig) -> Result<String> {
    open_auth(data)?.current_user_id().ok_or(Error::NotSignedIn)
}

// ============================================================================
// Accounts
// ============================================================================

fn cmd_register(data: &DataConfig, email: &str, password: &str, name: &str) -> Result<()> {
    let mut auth = open_auth(data)?;
    let mut store = open_store(data)?;
    let profile = AccountService::new(&mut auth, &mut store).register(email, password, name)?;
    println!("✓ Registered {} <{}>", profile.display_name, profile.email);
    Ok(())
}

fn cmd_login(data: &DataConfig, email: &str, password: &str) -> Result<()> {
    let mut auth = open_auth(data)?;
    let mut store = open_store(data)?;
    let mut accounts = AccountService::new(&mut auth, &mut store);
    accounts.sign_in(email, password)?;
    let name = accounts
        .current_profile()?
        .map(|p| p.display_name)
        .unwrap_or_else(|| email.trim().to_string());
    println!("✓ Signed in as {}", name);
    Ok(())
}

fn cmd_logout(data: &DataConfig) -> Result<()> {
    open_auth(data)?.sign_out()?;
    println!("✓ Signed out");
    Ok(())
}

fn cmd_whoami(data: &DataConfig) -> Result<()> {
    let auth = open_auth(data)?;
    let Some(user_id) = auth.current_user_id() else {
        println!("Not signed in");
        return Ok(());
    };

    let mut store = open_store(data)?;
    match UserRepository::new(&mut store).profile(&user_id)? {
        Some(profile) => println!("{} <{}>", profile.display_name, profile.email),
        None => println!("{}", auth.current_email().unwrap_or(&user_id)),
    }
    Ok(())
}

// ============================================================================
// Moods
// ============================================================================

fn cmd_mood(data: &DataConfig, command: MoodCommand) -> Result<()> {
    let user_id = signed_in_user(data)?;
    let mut store = open_store(data)?;
    let mut moods = MoodRepository::new(&mut store, user_id);

    match command {
        MoodCommand::Log { mood, note } => {
            let kind: MoodKind = mood.parse()?;
            let entry = moods.log(kind, &note, Utc::now())?;
            println!("✓ Logged mood: {} (id: {})", entry.mood, entry.id);
        }
        MoodCommand::List { days } => {
            let to = Utc::now();
            let from = days_before(to, days)?;
            let entries = moods.list_between(from, to)?;
            if entries.is_empty() {
                println!("No mood entries in the last {} days.", days);
            }
            for entry in entries {
                let note = if entry.note.is_empty() {
                    String::new()
                } else {
                    format!("  \"{}\"", entry.note)
                };
                println!(
                    "{}  {:<8}{}  (id: {})",
                    entry.logged_at.format("%Y-%m-%d %H:%M"),
                    entry.mood,
                    note,
                    entry.id
                );
            }
        }
        MoodCommand::Delete { id } => {
            moods.delete(&id)?;
            println!("✓ Deleted mood entry {}", id);
        }
    }
    Ok(())
}

// ============================================================================
// Habits
// ============================================================================

fn cmd_habit(data: &DataConfig, command: HabitCommand) -> Result<()> {
    let user_id = signed_in_user(data)?;
    let mut store = open_store(data)?;
    let mut habits = HabitRepository::new(&mut store, user_id);
    let today = Utc::now().date_naive();

    match command {
        HabitCommand::Add { name, description } => {
            let habit = habits.add(&name, &description)?;
            println!("✓ Added habit '{}' (id: {})", habit.name, habit.id);
        }
        HabitCommand::List => {
            let list = habits.list()?;
            if list.is_empty() {
                println!("No habits yet. Add one with `wellness habit add <name>`.");
            }
            for habit in list {
                let mark = if habit.is_completed_on(today) { "x" } else { " " };
                println!(
                    "[{}] {}  streak: {}  (id: {})",
                    mark,
                    habit.name,
                    habit.current_streak(today),
                    habit.id
                );
                if !habit.description.is_empty() {
                    println!("    {}", habit.description);
                }
            }
        }
        HabitCommand::Done { id, date, undo } => {
            let date = date.unwrap_or(today);
            let habit = habits.set_completed(&id, date, !undo)?;
            if undo {
                println!("✓ '{}' unmarked for {}", habit.name, date);
            } else {
                println!(
                    "✓ '{}' done for {} (streak: {})",
                    habit.name,
                    date,
                    habit.current_streak(today)
                );
            }
        }
        HabitCommand::Rename { id, name } => {
            let habit = habits.update(
                &id,
                HabitUpdate {
                    name: Some(name),
                    description: None,
                },
            )?;
            println!("✓ Renamed habit to '{}'", habit.name);
        }
        HabitCommand::Delete { id } => {
            habits.delete(&id)?;
            println!("✓ Deleted habit {}", id);
        }
    }
    Ok(())
}

// ============================================================================
// Stats and quotes
// ============================================================================

/// Start of a look-back window of `days` days ending at `now`
fn days_before(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(Error::Validation(format!(
            "--days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    now.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| Error::Validation(format!("--days {} reaches too far back", days)))
}

fn cmd_stats(data: &DataConfig, days: u32) -> Result<()> {
    let now = Utc::now();
    let today = now.date_naive();
    // The window includes today
    let first_day = days_before(now, days)?.date_naive() + Days::new(1);
    let user_id = signed_in_user(data)?;
    let mut store = open_store(data)?;

    let window_start = moods::day_bounds(first_day).0;
    let entries = MoodRepository::new(&mut store, user_id.as_str())
        .list_between(window_start, now + chrono::Duration::seconds(1))?;
    let habit_list = HabitRepository::new(&mut store, user_id.as_str()).list()?;

    let mood = MoodSummary::from_entries(&entries);
    let habit = HabitSummary::compute(&habit_list, today, days);

    println!("Last {} days", days);
    println!();
    println!("Mood");
    println!("  entries: {}", mood.total);
    if let Some(avg) = mood.average_score {
        println!("  average: {:.1} / 5", avg);
    }
    if let Some(kind) = mood.most_frequent {
        println!("  most frequent: {}", kind);
    }
    if !mood.counts.is_empty() {
        let breakdown: Vec<String> = mood
            .counts
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        println!("  {}", breakdown.join(", "));
    }

    println!();
    println!("Habits");
    println!(
        "  habits: {} ({} done today)",
        habit.total_habits, habit.completed_today
    );
    if let Some(rate) = habit.completion_rate {
        println!("  completion: {:.0}%", rate * 100.0);
    }
    if let Some(best) = habit.best_streak {
        println!("  best streak: {} ({} days)", best.habit_name, best.days);
    }
    Ok(())
}

fn cmd_quote(data: &DataConfig) -> Result<()> {
    let mut store = open_store(data)?;
    let quote = QuoteRepository::new(&mut store).quote_for_day(Utc::now().date_naive());
    println!("\"{}\"", quote.text);
    println!("  - {}", quote.author);
    Ok(())
}

// ============================================================================
// Routines
// ============================================================================

fn cmd_routine(command: RoutineCommand, default_category: &str) -> Result<()> {
    match command {
        RoutineCommand::Categories => {
            for category in categories() {
                println!("{}", category);
            }
            Ok(())
        }
        RoutineCommand::Show { category } => {
            let routine = load_routine(category.as_deref().unwrap_or(default_category));
            println!(
                "{} routine ({} exercises)",
                routine.category(),
                routine.len()
            );
            for (i, exercise) in routine.exercises().iter().enumerate() {
                println!(
                    "  {}. {} ({})",
                    i + 1,
                    exercise.name(),
                    exercise.display_duration()
                );
                println!("     {}", exercise.description());
            }
            Ok(())
        }
        RoutineCommand::Play { category, fast } => {
            let routine = load_routine(category.as_deref().unwrap_or(default_category));
            play_routine(routine, fast)
        }
    }
}

/// Unknown names play the general routine after a notice
fn load_routine(name: &str) -> Routine {
    let known = categories().contains(&name.trim().to_lowercase().as_str());
    if !known {
        eprintln!("Unknown category '{}', using the general routine.", name);
    }
    build_routine(name)
}

fn play_routine(routine: Routine, fast: bool) -> Result<()> {
    let exercises = routine.exercises().to_vec();
    let interactive = !fast;
    let mut session = RoutineSession::default();
    session.set_listener(render_state(exercises, interactive));

    if interactive {
        println!("Controls: Enter = done (reps), p = pause/resume, n = next, b = back, r = restart, q = quit");
    }
    session.start(routine);

    if fast {
        while !session.state().is_finished() {
            match session.state().phase {
                PlayerPhase::Running => {
                    session.advance_clock(Duration::from_millis(TICK_INTERVAL_MS));
                }
                PlayerPhase::AwaitingRepetitions => {
                    session.mark_repetition_done();
                }
                _ => break,
            }
        }
        return Ok(());
    }

    let input = spawn_input_reader();
    let mut input_closed = false;
    let mut last = Instant::now();

    while !session.state().is_finished() {
        loop {
            match input.try_recv() {
                Ok(line) => handle_command(&mut session, line.trim()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    input_closed = true;
                    break;
                }
            }
        }
        // Without input nobody can confirm repetitions or resume
        if input_closed {
            match session.state().phase {
                PlayerPhase::AwaitingRepetitions => {
                    session.mark_repetition_done();
                }
                PlayerPhase::Paused => {
                    session.finish();
                }
                _ => {}
            }
        }

        let now = Instant::now();
        session.advance_clock(now - last);
        last = now;
        std::thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}

fn handle_command(session: &mut RoutineSession, command: &str) {
    match command {
        "" | "d" => {
            session.mark_repetition_done();
        }
        "p" => {
            if session.state().phase == PlayerPhase::Paused {
                session.resume();
            } else {
                session.pause();
            }
        }
        "n" => {
            session.advance();
        }
        "b" => {
            session.retreat();
        }
        "r" => {
            session.restart();
        }
        "q" => {
            session.finish();
        }
        other => eprintln!("Unknown command '{}'", other),
    }
}

/// Reads stdin lines on a separate thread so the countdown keeps going
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Listener printing a header per exercise and, interactively, a countdown
fn render_state(exercises: Vec<Exercise>, show_countdown: bool) -> impl FnMut(&PlaybackState) {
    let total = exercises.len();
    let mut last_shown: Option<(usize, PlayerPhase)> = None;

    move |state: &PlaybackState| {
        let key = (state.current_index, state.phase);
        if last_shown == Some(key) {
            if show_countdown && state.phase == PlayerPhase::Running {
                let secs = state.remaining_seconds();
                print!("\r  {:02}:{:02} left ", secs / 60, secs % 60);
                let _ = io::stdout().flush();
            }
            return;
        }
        last_shown = Some(key);

        match state.phase {
            PlayerPhase::Running | PlayerPhase::AwaitingRepetitions => {
                let index = state.current_index;
                let Some(exercise) = exercises.get(index) else {
                    return;
                };
                println!();
                println!(
                    "▶ [{}/{}] {} ({})",
                    index + 1,
                    total,
                    exercise.name(),
                    exercise.display_duration()
                );
                println!("  {}", exercise.description());
                if let Some(next) = exercises.get(index + 1) {
                    println!("  Next: {}", next.name());
                }
                if show_countdown && state.phase == PlayerPhase::AwaitingRepetitions {
                    println!("  Press Enter when done");
                }
            }
            PlayerPhase::Paused => {
                println!();
                println!("⏸ Paused ({}s left), p to resume", state.remaining_seconds());
            }
            PlayerPhase::Finished => {
                println!();
                println!("✓ Routine finished");
            }
            PlayerPhase::Idle => {}
        }
    }
}
