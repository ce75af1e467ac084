// Entry point for the Minesweeper TUI application
// Loads configuration, starts logging, and launches the render loop

use std::error::Error;

// Module declarations
mod msw_board;  // Tiles, mine layout and flood-fill reveal
mod msw_color;  // Tinting and terminal colour matching
mod msw_config; // User preferences on disk
mod msw_game;   // Session state and mouse interaction state machine
mod msw_lang;   // Multi-language string resources
mod msw_log;    // File logger
mod msw_render; // Per-frame draw commands
mod msw_ui;     // Terminal host: input polling and compositing

use msw_config::load_or_create_config;
use msw_lang::Lang;
use msw_log::init_logging;
use msw_ui::run as run_ui;

fn main() -> Result<(), Box<dyn Error>> {
    let loaded = load_or_create_config();
    let cfg = loaded.config;
    init_logging(&cfg.log_level);
    if let Some(warning) = loaded.warning {
        log::warn!("{}", warning);
    }

    let lang = Lang::new(&cfg.language);
    log::debug!("Language: {}", lang.current_lang);

    let result = run_ui(&cfg, &lang);
    if let Err(e) = &result {
        log::error!("Terminal error: {}", e);
    }
    result
}
