#![forbid(unsafe_code)]

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use appui_undo::{Subscription, UndoConfig, UndoStack};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::commands::{SetColorCmd, SetTextCmd};
use crate::error::{DemoError, Result};
use crate::script::{Step, parse_steps};
use crate::store::{AppState, SharedStore, Store};

#[derive(Debug, Parser)]
#[command(
    name = "appui-undo-demo",
    about = "Run a script of edits, undos and redos against a small store",
    version
)]
pub struct Cli {
    /// Undo memory limit; overrides the config file.
    #[arg(long)]
    pub limit: Option<u64>,

    /// Undo config file (.toml or .json).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log stack activity at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Steps: color=<name|#rrggbb> text=<s> type=<s> undo redo index=<n>
    /// begin=<name> end clean reset-clean clear
    #[arg(value_name = "STEP")]
    pub steps: Vec<String>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let session = run(&cli)?;
    print!("{session}");
    Ok(())
}

/// Install a stderr fmt subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the script, then run it against a fresh session.
pub fn run(cli: &Cli) -> Result<Session> {
    let config = load_config(cli.config.as_deref(), cli.limit)?;
    let steps = parse_steps(&cli.steps)?;
    let mut session = Session::new(config);
    session.run(&steps)?;
    Ok(session)
}

pub fn load_config(path: Option<&Path>, limit: Option<u64>) -> Result<UndoConfig> {
    let mut config = match path {
        None => UndoConfig::default(),
        Some(path) => match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => UndoConfig::from_toml_file(path)?,
            Some("json") => UndoConfig::from_json_file(path)?,
            _ => {
                return Err(DemoError::UnsupportedConfig {
                    path: path.display().to_string(),
                });
            }
        },
    };
    if let Some(limit) = limit {
        config.undo_limit = limit;
    }
    Ok(config.validated()?)
}

// ============================================================================
// Session
// ============================================================================

/// A store, the stack recording its edits, and notification counters.
pub struct Session {
    store: SharedStore,
    stack: UndoStack,
    index_events: Rc<Cell<usize>>,
    clean_events: Rc<Cell<usize>>,
    _subscriptions: Vec<Subscription>,
}

impl Session {
    #[must_use]
    pub fn new(config: UndoConfig) -> Self {
        let mut stack = UndoStack::with_config(config);
        let index_events = Rc::new(Cell::new(0));
        let clean_events = Rc::new(Cell::new(0));

        let counter = index_events.clone();
        let on_index = stack.on_index_changed(move |index| {
            counter.set(counter.get() + 1);
            debug!(index, "index changed");
        });
        let counter = clean_events.clone();
        let on_clean = stack.on_clean_changed(move || {
            counter.set(counter.get() + 1);
            debug!("clean state changed");
        });

        Self {
            store: Store::shared(AppState::default()),
            stack,
            index_events,
            clean_events,
            _subscriptions: vec![on_index, on_clean],
        }
    }

    #[must_use]
    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    #[must_use]
    pub fn state(&self) -> AppState {
        self.store.borrow().state().clone()
    }

    /// Number of index-changed notifications received.
    #[must_use]
    pub fn index_events(&self) -> usize {
        self.index_events.get()
    }

    /// Number of clean-changed notifications received.
    #[must_use]
    pub fn clean_events(&self) -> usize {
        self.clean_events.get()
    }

    /// Run `steps` in order, stopping at the first failure.
    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.apply(step).map_err(|source| DemoError::Undo {
                position: i + 1,
                step: step.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn apply(&mut self, step: &Step) -> appui_undo::Result<()> {
        debug!(%step, "apply step");
        match step {
            Step::Color(color) => {
                let cmd = SetColorCmd::capture(&self.store, *color);
                let action = cmd.action();
                self.stack.push(Box::new(cmd))?;
                self.store.borrow_mut().dispatch(action);
                Ok(())
            }
            Step::Text(text) => {
                let cmd = SetTextCmd::capture(&self.store, text);
                let action = cmd.action();
                self.stack.push(Box::new(cmd))?;
                self.store.borrow_mut().dispatch(action);
                Ok(())
            }
            Step::Type(suffix) => {
                let text = format!("{}{suffix}", self.store.borrow().state().text);
                let mut cmd = SetTextCmd::capture(&self.store, &text);
                let action = cmd.action();
                if !self.stack.try_merge_last(&mut cmd) {
                    self.stack.push(Box::new(cmd))?;
                }
                self.store.borrow_mut().dispatch(action);
                Ok(())
            }
            Step::Undo => self.stack.undo(),
            Step::Redo => self.stack.redo(),
            Step::Index(index) => self.stack.set_index(*index),
            Step::BeginMacro(name) => {
                self.stack.begin_macro(name.clone());
                Ok(())
            }
            Step::EndMacro => self.stack.end_macro(),
            Step::Clean => {
                self.stack.set_clean();
                Ok(())
            }
            Step::ResetClean => {
                self.stack.reset_clean();
                Ok(())
            }
            Step::Clear => {
                self.stack.clear();
                Ok(())
            }
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        let stack = &self.stack;
        writeln!(f, "color:   {}", state.color)?;
        writeln!(f, "text:    {}", state.text)?;
        writeln!(
            f,
            "index:   {} of {} ({})",
            stack.index(),
            stack.count(),
            if stack.is_clean() { "clean" } else { "modified" }
        )?;
        writeln!(
            f,
            "memory:  {} / {}",
            stack.memory_size(),
            stack.undo_limit()
        )?;
        writeln!(f, "undo:    {}", stack.undo_text().unwrap_or("-"))?;
        writeln!(f, "redo:    {}", stack.redo_text().unwrap_or("-"))?;
        if stack.is_composing() {
            writeln!(f, "macro:   open (depth {})", stack.macro_depth())?;
        }
        writeln!(f, "history:")?;
        let marker = |at: isize| if at == stack.index() { '>' } else { ' ' };
        writeln!(f, "  {} -  (start)", marker(-1))?;
        for (i, command) in stack.commands().enumerate() {
            let at = i as isize;
            let clean = if at == stack.clean_index() {
                "  [clean]"
            } else {
                ""
            };
            writeln!(f, "  {} {at}  {}{clean}", marker(at), command.name())?;
        }
        Ok(())
    }
}
