mod category;
mod cli;
mod content;
mod error;
mod files;
mod opener;
mod tree;
mod ui;
mod view;

use clap::Parser;
use winit::event_loop::EventLoop;

use crate::category::Categories;
use crate::cli::Cli;
use crate::content::ensure_default_image;
use crate::opener::Companion;
use crate::tree::Tree;
use crate::ui::state::{BrowserState, Mode};
use crate::ui::App;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = ensure_default_image(&cli.default_image) {
        log::warn!("{}", e);
    }

    let mode = if cli.categories {
        Mode::Categories
    } else {
        Mode::Tree
    };
    let companion = Companion::new(&cli.companion_cmd, cli.companion_dir);
    let mut state = BrowserState::new(
        mode,
        Tree::new(cli.root),
        Categories::new(cli.base_dir),
        cli.default_image,
        companion,
    );
    state.startup();

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            log::error!("Cannot create event loop: {}", e);
            std::process::exit(1);
        }
    };
    let mut app = App::new(state);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {}", e);
        std::process::exit(1);
    }
}
