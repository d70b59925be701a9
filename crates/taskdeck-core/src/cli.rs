use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::view::{SortOrder, StatusFilter};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdeck",
    version,
    about = "Taskdeck: personal task list with goal-based suggestions",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "taskdeckrc", global = true)]
    pub taskdeckrc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[arg(long = "owner", global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a pending task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change a task's title or notes.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
    },
    /// Mark a task completed.
    Done { id: String },
    /// Mark a task pending again.
    Reopen { id: String },
    /// Flip a task between pending and completed.
    Toggle { id: String },
    Delete { id: String },
    Info { id: String },
    /// Show tasks with the current search, status and sort selection.
    List(ListArgs),
    Stats,
    /// Suggest tasks for a goal and optionally save them.
    Suggest(SuggestArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, short = 's')]
    pub search: Option<String>,
    #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<StatusFilter>()))]
    pub status: Option<StatusFilter>,
    #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<SortOrder>()))]
    pub sort: Option<SortOrder>,
}

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    #[arg(required_unless_present = "themes")]
    pub goal: Vec<String>,
    /// 1-based index of a suggestion to save; repeatable.
    #[arg(long = "save", action = ArgAction::Append)]
    pub save: Vec<usize>,
    #[arg(long, conflicts_with = "save")]
    pub save_all: bool,
    /// List the recognised goal themes.
    #[arg(long, conflicts_with_all = ["save", "save_all"])]
    pub themes: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> GlobalCli {
        GlobalCli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn add_joins_title_words_and_takes_notes() {
        let cli = parse(&["taskdeck", "add", "Buy", "milk", "--notes", "2 litres"]);
        match cli.command {
            Some(Command::Add { title, notes }) => {
                assert_eq!(title.join(" "), "Buy milk");
                assert_eq!(notes.as_deref(), Some("2 litres"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["taskdeck", "list", "--status", "pending", "-vv", "--rc", "color=off"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "color");
        match cli.command {
            Some(Command::List(args)) => {
                assert_eq!(args.status, Some(StatusFilter::Pending));
                assert_eq!(args.sort, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sort_order() {
        assert!(GlobalCli::try_parse_from(["taskdeck", "list", "--sort", "newest"]).is_err());
    }

    #[test]
    fn suggest_requires_goal_unless_listing_themes() {
        assert!(GlobalCli::try_parse_from(["taskdeck", "suggest"]).is_err());
        let cli = parse(&["taskdeck", "suggest", "--themes"]);
        assert!(matches!(cli.command, Some(Command::Suggest(SuggestArgs { themes: true, .. }))));

        let cli = parse(&["taskdeck", "suggest", "plan", "travel", "--save", "1", "--save", "3"]);
        match cli.command {
            Some(Command::Suggest(args)) => {
                assert_eq!(args.goal.join(" "), "plan travel");
                assert_eq!(args.save, vec![1, 3]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn keyval_requires_equals() {
        assert!("color".parse::<KeyVal>().is_err());
        let kv: KeyVal = " view.sort = oldest ".parse().expect("keyval");
        assert_eq!(kv.key, "view.sort");
        assert_eq!(kv.value, "oldest");
    }
}
