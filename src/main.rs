mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod logging;
mod store;
mod theme;
mod tree;
mod tui;
mod ui;
mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, LogConfig, ServerConfig, ThemeConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::store::{HttpFileStorage, TreeStore};
use crate::tui::{install_panic_hook, Tui};
use crate::view::TreeView;

/// Browse a remote file tree in the terminal.
#[derive(Parser, Debug)]
#[command(name = "ft", version, about)]
struct Cli {
    /// Base URL of the file server (serves `/files`)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// Path to a config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Id of the item shown as the tree root
    #[arg(long)]
    root: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Color scheme: dark, light, or custom
    #[arg(long)]
    theme: Option<String>,
}

impl Cli {
    /// Flags as a config layer that overrides every file.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
            },
            server: ServerConfig {
                base_url: self.server.clone(),
                timeout_ms: None,
            },
            tree: TreeConfig {
                root_id: self.root.clone(),
                ..Default::default()
            },
            log: LogConfig {
                file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                level: None,
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Some(log_file) = config.log_file() {
        if let Err(e) = logging::init_global(&log_file, config.log_level()) {
            eprintln!("Warning: logging disabled ({}): {}", log_file.display(), e);
        }
    }
    tracing::info!(server = config.base_url(), root = config.root_id(), "starting");

    let storage = HttpFileStorage::new(config.base_url(), config.request_timeout())?;
    let store = TreeStore::new(Arc::new(storage), config.root_id());
    let view = TreeView::new(config.root_id(), config.tree_flags());
    let theme = theme::resolve_theme(&config.theme);

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut app = App::new(store, view, theme, config.use_icons());
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    app.mount(&event_tx);

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key, &event_tx),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::Store(action) => app.handle_store_action(action),
            Event::Created {
                kind,
                label,
                result,
            } => app.handle_created(kind, &label, result),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
