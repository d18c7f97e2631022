//! Interactive terminal front end over the session orchestrator.
//!
//! Reads one command per line from stdin and re-renders after every command
//! and every session event.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::advice::GentleAdvisor;
use crate::catalog::Availability;
use crate::clock::SystemClock;
use crate::config::{self, ADVICE_API_KEY_ENV};
use crate::db::TrackerDb;
use crate::error::{InlineNotice, TrackerError};
use crate::identity::LocalIdentity;
use crate::persistence::LocalStore;
use crate::regulation::{self, RecoveryNeed, RECOVERY_EXIT_MESSAGE, SOS_CARD_LINES};
use crate::session::{Collaborators, Screen, Session, SessionEvent};
use crate::status::AxisTone;
use crate::types::{CheckInDraft, ViewState};

/// Spoon-theory energy budget and self-regulation tracker
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Config file (defaults to ~/.spoonkeeper/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Database file (overrides the config's databasePath)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

const HELP: &str = "\
commands:
  signup <email> <password> [name]   signin <email> <password>   signout
  checkin <sensory> <social> <emotional> <physical> [note]
  log <activity-id>   reset   total <1-20>
  add <cost 1-10> <critical y/n> <name>   pin <id>   delete <id>
  go <dashboard|regulation|history|scan>
  next (onboarding)   yes | no | cancel (sensory scan)
  sos   close   recover   need <water|light|food|rest>   leave (recovery)
  breathe <seconds>   insight   help   quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        name: Option<String>,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    CheckIn(CheckInDraft),
    Log(String),
    Reset,
    Total(u32),
    Add {
        cost: u32,
        is_critical: bool,
        name: String,
    },
    Pin(String),
    Delete(String),
    Go(ViewState),
    Next,
    Answer(bool),
    Cancel,
    Sos,
    CloseSos,
    Recover,
    Need(RecoveryNeed),
    Leave,
    Breathe(u64),
    Insight,
    Help,
    Quit,
}

fn number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T, String> {
    word.ok_or_else(|| format!("missing {what}"))?
        .parse()
        .map_err(|_| format!("{what} must be a number"))
}

fn word(word: Option<&str>, what: &str) -> Result<String, String> {
    word.map(str::to_string).ok_or_else(|| format!("missing {what}"))
}

fn rest(words: std::str::SplitWhitespace<'_>) -> Option<String> {
    let joined = words.collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("type 'help' for commands".to_string());
    };

    let command = match head.to_lowercase().as_str() {
        "signup" => Command::SignUp {
            email: word(words.next(), "email")?,
            password: word(words.next(), "password")?,
            name: rest(words),
        },
        "signin" => Command::SignIn {
            email: word(words.next(), "email")?,
            password: word(words.next(), "password")?,
        },
        "signout" => Command::SignOut,
        "checkin" => Command::CheckIn(CheckInDraft {
            sensory_load: number(words.next(), "sensory load")?,
            social_battery: number(words.next(), "social battery")?,
            emotional_intensity: number(words.next(), "emotional intensity")?,
            physical_fatigue: number(words.next(), "physical fatigue")?,
            note: rest(words),
        }),
        "log" => Command::Log(word(words.next(), "activity id")?),
        "reset" => Command::Reset,
        "total" => Command::Total(number(words.next(), "total")?),
        "add" => {
            let cost = number(words.next(), "cost")?;
            let is_critical = matches!(words.next(), Some("y" | "yes"));
            let name = rest(words).ok_or("missing name")?;
            Command::Add {
                cost,
                is_critical,
                name,
            }
        }
        "pin" => Command::Pin(word(words.next(), "activity id")?),
        "delete" => Command::Delete(word(words.next(), "activity id")?),
        "go" => Command::Go(match words.next() {
            Some("dashboard") => ViewState::Dashboard,
            Some("regulation") => ViewState::Regulation,
            Some("history") => ViewState::History,
            Some("scan") => ViewState::SensoryScan,
            other => return Err(format!("unknown view {:?}", other.unwrap_or(""))),
        }),
        "next" => Command::Next,
        "yes" | "y" => Command::Answer(true),
        "no" | "n" => Command::Answer(false),
        "cancel" => Command::Cancel,
        "sos" => Command::Sos,
        "close" => Command::CloseSos,
        "recover" => Command::Recover,
        "need" => Command::Need(match words.next() {
            Some("water") => RecoveryNeed::Water,
            Some("light") => RecoveryNeed::DimLight,
            Some("food") => RecoveryNeed::SimpleFood,
            Some("rest") => RecoveryNeed::LieDown,
            other => return Err(format!("unknown need {:?}", other.unwrap_or(""))),
        }),
        "leave" => Command::Leave,
        "breathe" => Command::Breathe(number(words.next(), "seconds")?),
        "insight" => Command::Insight,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(command)
}

async fn apply(session: &mut Session, command: Command) -> Result<(), TrackerError> {
    match command {
        Command::SignUp {
            email,
            password,
            name,
        } => session.sign_up(&email, &password, name.as_deref()).await,
        Command::SignIn { email, password } => session.sign_in(&email, &password).await,
        Command::SignOut => session.sign_out().await,
        Command::CheckIn(draft) => {
            session.open_check_in()?;
            session.record_check_in(draft).await
        }
        Command::Log(id) => session.log_activity(&id).await,
        Command::Reset => session.reset_day().await,
        Command::Total(total) => session.set_daily_total(total).await,
        Command::Add {
            cost,
            is_critical,
            name,
        } => session
            .create_activity(&name, Some(cost), is_critical)
            .await
            .map(|_| ()),
        Command::Pin(id) => session.toggle_pin(&id).await,
        Command::Delete(id) => session.delete_activity(&id).await,
        Command::Go(view) => session.open_view(view),
        Command::Next => session.advance_onboarding().await,
        Command::Answer(yes) => session.answer_scan(yes).map(|_| ()),
        Command::Cancel => session.cancel_scan(),
        Command::Sos => session.open_sos(),
        Command::CloseSos => {
            session.close_sos();
            Ok(())
        }
        Command::Recover => session.activate_recovery(),
        Command::Need(need) => session.toggle_recovery_need(need),
        Command::Leave => session.request_recovery_exit().map(|_| ()),
        Command::Breathe(secs) => {
            let phase = regulation::breath_phase_at(Duration::from_secs(secs));
            println!("  {} (x{:.1})", phase.label(), phase.target_scale());
            Ok(())
        }
        Command::Insight => session.refresh_insight(),
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}

fn tone_marker(tone: AxisTone) -> &'static str {
    match tone {
        AxisTone::Calm => "",
        AxisTone::Elevated => " (!)",
        AxisTone::Alert => " (!!)",
    }
}

fn render(session: &Session) {
    let view = match session.screen() {
        Screen::Loading => {
            println!("[loading...]");
            return;
        }
        Screen::View(view) => view,
    };

    match view {
        ViewState::Auth => println!("[auth] signup or signin"),
        ViewState::Onboarding => {
            if let Some(slide) = session.onboarding_slide() {
                println!("[onboarding] {}\n  {}", slide.title, slide.body);
            }
        }
        ViewState::Recovery => {
            let Some(recovery) = session.recovery() else {
                return;
            };
            if recovery.is_exiting() {
                println!("[recovery] {}", RECOVERY_EXIT_MESSAGE);
                return;
            }
            println!(
                "[recovery] paused for {} min",
                recovery.minutes_paused(Instant::now())
            );
            for need in RecoveryNeed::ALL {
                let mark = if recovery.is_checked(need) { "x" } else { " " };
                println!("  [{}] {}", mark, need.label());
            }
        }
        ViewState::SensoryScan => {
            if let Some(question) = session.scan_question() {
                println!("[scan] {}", question.text);
            }
        }
        ViewState::History => match session.history() {
            None => println!("[history] not enough data yet"),
            Some(series) => {
                println!("[history]");
                for point in series {
                    println!(
                        "  {}  sensory {:>3}  social {:>3}",
                        point.timestamp, point.sensory_load, point.social_battery
                    );
                }
            }
        },
        ViewState::Regulation => {
            println!("[regulation] breathe <seconds> for the 4-4-4 pacer");
        }
        ViewState::Dashboard => render_dashboard(session),
    }

    if session.is_sos_open() {
        for line in SOS_CARD_LINES {
            println!("  ** {line}");
        }
    }
}

fn render_dashboard(session: &Session) {
    if let Some(user) = session.user() {
        println!("[dashboard] hi {} ({})", user.greeting_name(), user.initial());
    }
    let ledger = session.effective_ledger();
    println!(
        "  status {}  spoons {}/{}{}",
        session.status().as_str(),
        ledger.remaining,
        ledger.total,
        if session.is_low_energy() { "  low energy" } else { "" }
    );

    if let Some(tones) = session.check_in_tones() {
        let line: Vec<String> = tones
            .iter()
            .map(|(axis, tone)| format!("{axis}{}", tone_marker(*tone)))
            .collect();
        println!("  gauges: {}", line.join(", "));
    }

    for (activity, availability) in session.dashboard_activities() {
        let badge = match availability {
            Availability::Available => "",
            Availability::Locked => " [locked]",
            Availability::Unaffordable => " [not enough]",
        };
        println!(
            "  - {} ({}) cost {}{}",
            activity.name, activity.id, activity.cost, badge
        );
    }

    match session.insight() {
        Some(text) => println!("  \"{text}\""),
        None if session.is_insight_pending() => println!("  (thinking...)"),
        None => {}
    }
}

fn print_notice(notice: &InlineNotice) {
    println!("  ~ {}", notice.message);
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Event(SessionEvent),
}

pub async fn run(args: Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => config::apply_api_key_override(
            config::load_config_from(path)?,
            std::env::var(ADVICE_API_KEY_ENV).ok(),
        ),
        None => config::load_config()?,
    };

    let db_override = args.db.as_deref().or(config.database_path.as_deref());
    let db_path = TrackerDb::resolve_path(db_override).map_err(|e| e.to_string())?;
    let store = LocalStore::open_at(db_path).map_err(|e| e.to_string())?;

    let tz = config.tz();
    let deps = Collaborators {
        persistence: Arc::new(store.clone()),
        identity: Arc::new(LocalIdentity::new(store.db())),
        advice: Arc::new(GentleAdvisor::new(&config.advice, tz)),
        clock: Arc::new(SystemClock::new(tz)),
    };
    log::info!("Starting with timezone {}", tz);

    let mut session = Session::new(deps, config);
    session.start().await;
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            event = session.next_event() => Input::Event(event),
        };

        match input {
            Input::Line(Ok(Some(line))) => match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(e) = apply(&mut session, command).await {
                        print_notice(&InlineNotice::from(&e));
                    }
                }
                Err(msg) => println!("  {msg}"),
            },
            Input::Line(Ok(None)) => break,
            Input::Line(Err(e)) => {
                log::warn!("stdin closed: {}", e);
                break;
            }
            Input::Event(event) => session.handle_event(event).await,
        }

        if let Some(notice) = session.take_notice() {
            print_notice(&notice);
        }
        render(&session);
    }

    log::info!("Bye");
    Ok(())
}
