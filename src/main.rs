// Entrypoint for the CLI application.
// - Keeps `main` small: resolve config, load the token, create an API
//   client and hand it to the menu loop.
// - Returns `anyhow::Result` so transport failures end the process with
//   a readable message.

use ghrepo_cli::api::GitHubApi;
use ghrepo_cli::config::Config;
use ghrepo_cli::token::{load_token, FileTokenStore};
use ghrepo_cli::ui::{self, main_menu};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the menu on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();

    ui::clear_screen()?;
    ui::display_logo();

    let store = FileTokenStore::new(config.token_file.clone());
    let token = load_token(&store, ui::prompt_token)?;
    let api = GitHubApi::new(&token, &config)?;

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(&api, &store)?;
    Ok(())
}
