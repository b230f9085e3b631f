// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive menu.
//
// Module responsibilities:
// - `config`: Resolves the API base URL, token file and upload branch
//   from the environment.
// - `token`: Token persistence behind the `TokenStore` trait.
// - `walk`: Depth-first listing of the files under a local folder.
// - `api`: Encapsulates HTTP interactions with the GitHub REST API.
// - `ui`: Implements the terminal menu and delegates requests to `api`.
pub mod api;
pub mod config;
pub mod token;
pub mod ui;
pub mod walk;
