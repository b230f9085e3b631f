// UI layer: a numbered terminal menu built on `dialoguer` prompts, with
// `crossterm` handling colors and screen clearing. Each menu entry collects
// its inputs, calls one `GitHubApi` operation and prints the result.

use crate::api::{ApiOutcome, FileUpload, GitHubApi, RepositorySummary};
use crate::token::{TokenDeletion, TokenStore};
use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const LOGO: &str = r"
     _   __      _  __
    / | / /___  (_)/ /_
   /  |/ / __ \/ / / __/
  / /|  / /_/ / / / /_
 /_/ |_/ .___/_/ /\__\
      /_/
";

/// Entries of the main menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateRepo,
    DeleteRepo,
    AddFolder,
    ViewUserRepo,
    Download,
    DeleteToken,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 7] = [
        MenuChoice::CreateRepo,
        MenuChoice::DeleteRepo,
        MenuChoice::AddFolder,
        MenuChoice::ViewUserRepo,
        MenuChoice::Download,
        MenuChoice::DeleteToken,
        MenuChoice::Exit,
    ];

    /// Parse the operator's answer (`"1"` to `"7"`, surrounding blanks
    /// ignored).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::CreateRepo),
            "2" => Some(MenuChoice::DeleteRepo),
            "3" => Some(MenuChoice::AddFolder),
            "4" => Some(MenuChoice::ViewUserRepo),
            "5" => Some(MenuChoice::Download),
            "6" => Some(MenuChoice::DeleteToken),
            "7" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::CreateRepo => "Create Repo",
            MenuChoice::DeleteRepo => "Delete Repo",
            MenuChoice::AddFolder => "Add Folder",
            MenuChoice::ViewUserRepo => "View Another User Repo",
            MenuChoice::Download => "Download Code from your repo/other repo",
            MenuChoice::DeleteToken => "Delete Token",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Invalid repository number(s) typed at a prompt.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No repository number entered")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("Repository number {index} is out of range (1-{len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Enter a single repository number")]
    NotSingle,
}

/// Parse a comma-separated list of 1-based numbers into 0-based indices
/// into a listing of `len` entries. Order is kept and duplicates dropped.
pub fn parse_selection(input: &str, len: usize) -> Result<Vec<usize>, SelectionError> {
    let mut indices = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let number: usize = part
            .parse()
            .map_err(|_| SelectionError::NotANumber(part.to_string()))?;
        if number == 0 || number > len {
            return Err(SelectionError::OutOfRange { index: number, len });
        }
        if !indices.contains(&(number - 1)) {
            indices.push(number - 1);
        }
    }
    if indices.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(indices)
}

/// Like `parse_selection` but exactly one number is allowed.
pub fn parse_single_selection(input: &str, len: usize) -> Result<usize, SelectionError> {
    match parse_selection(input, len)?.as_slice() {
        [index] => Ok(*index),
        _ => Err(SelectionError::NotSingle),
    }
}

/// Numbered lines for a repository listing, starting at 1.
pub fn format_repository_list(repos: &[RepositorySummary]) -> Vec<String> {
    repos
        .iter()
        .enumerate()
        .map(|(i, repo)| format!("{}. {}", i + 1, repo.name))
        .collect()
}

pub fn clear_screen() -> Result<()> {
    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

pub fn display_logo() {
    println!("{}", LOGO.cyan().bold());
}

/// Ask for a personal access token; input is hidden.
pub fn prompt_token() -> Result<String> {
    let token = Password::new()
        .with_prompt("Enter your GitHub token")
        .interact()?;
    Ok(token.trim().to_string())
}

/// Main interactive menu. Runs until the operator chooses "Exit".
pub fn main_menu(api: &GitHubApi, store: &dyn TokenStore) -> Result<()> {
    loop {
        clear_screen()?;
        print_menu();

        let answer: String = Input::new()
            .with_prompt("Enter your choice".yellow().to_string())
            .interact_text()?;

        clear_screen()?;
        let Some(choice) = MenuChoice::parse(&answer) else {
            println!("{}", "Invalid choice. Please try again.".red());
            pause()?;
            continue;
        };

        match choice {
            MenuChoice::CreateRepo => handle_create(api)?,
            MenuChoice::DeleteRepo => handle_delete(api)?,
            MenuChoice::AddFolder => handle_add_folder(api)?,
            MenuChoice::ViewUserRepo => handle_view(api)?,
            MenuChoice::Download => handle_download(api)?,
            MenuChoice::DeleteToken => match store.delete()? {
                TokenDeletion::Deleted => println!("{}", "Token deleted successfully.".green()),
                TokenDeletion::NotFound => println!("{}", "No token file found.".yellow()),
            },
            MenuChoice::Exit => {
                println!("{}", "Exiting program...".cyan().bold());
                break;
            }
        }
        pause()?;
    }
    Ok(())
}

fn print_menu() {
    let rule = format!(" {} ", "_".repeat(40));
    println!("{}", rule.as_str().blue().bold());
    println!("{}", " GitHub CLI".cyan().bold());
    println!("{}", rule.as_str().blue().bold());
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        println!("{}. {}", i + 1, choice.label());
    }
}

/// Keep results on screen until the operator is done reading them.
fn pause() -> Result<()> {
    let _: String = Input::new()
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}

fn print_failure(action: &str, status: u16, message: &str) {
    println!(
        "{}",
        format!("{} failed ({}): {}", action, status, message).red()
    );
}

fn handle_create(api: &GitHubApi) -> Result<()> {
    let name: String = Input::new()
        .with_prompt("Enter repository name")
        .interact_text()?;
    let description: String = Input::new()
        .with_prompt("Enter repository description")
        .allow_empty(true)
        .interact_text()?;
    let add_readme = Confirm::new()
        .with_prompt("Do you want to add a readme file?")
        .default(false)
        .interact()?;

    match api.create_repository(&name, &description, add_readme)? {
        ApiOutcome::Success(repo) => {
            let url = repo.get("html_url").and_then(|u| u.as_str()).unwrap_or("");
            println!("{} {}", "Repository created:".green(), url);
        }
        ApiOutcome::Failure { status, message } => {
            print_failure("Repository creation", status, &message)
        }
    }
    Ok(())
}

/// Ask for a username, fetch and print their repositories. Returns `None`
/// when there is nothing to pick from.
fn pick_user_repositories(api: &GitHubApi) -> Result<Option<(String, Vec<RepositorySummary>)>> {
    let username: String = Input::new()
        .with_prompt("Enter GitHub username")
        .interact_text()?;
    let username = username.trim().to_string();

    let repos = match api.list_user_repositories(&username)? {
        ApiOutcome::Success(repos) => repos,
        ApiOutcome::Failure { status, message } => {
            print_failure("Listing repositories", status, &message);
            return Ok(None);
        }
    };
    if repos.is_empty() {
        println!("{}", format!("No repositories found for {}.", username).yellow());
        return Ok(None);
    }
    for line in format_repository_list(&repos) {
        println!("{}", line);
    }
    Ok(Some((username, repos)))
}

/// Prompt for one repository number, reporting bad input instead of
/// failing.
fn pick_one(prompt: &str, repos: &[RepositorySummary]) -> Result<Option<usize>> {
    let answer: String = Input::new().with_prompt(prompt).interact_text()?;
    match parse_single_selection(&answer, repos.len()) {
        Ok(index) => Ok(Some(index)),
        Err(e) => {
            println!("{}", e.to_string().red());
            Ok(None)
        }
    }
}

fn handle_delete(api: &GitHubApi) -> Result<()> {
    let Some((_, repos)) = pick_user_repositories(api)? else {
        return Ok(());
    };
    let answer: String = Input::new()
        .with_prompt("Enter the number(s) of the repository to delete (use ',' to separate multiple numbers)")
        .interact_text()?;
    let indices = match parse_selection(&answer, repos.len()) {
        Ok(indices) => indices,
        Err(e) => {
            println!("{}", e.to_string().red());
            return Ok(());
        }
    };

    let full_names: Vec<&str> = indices.iter().map(|&i| repos[i].full_name.as_str()).collect();
    let deleted = api.delete_repositories(&full_names)?;
    println!("{} {:?}", "Deleted repositories:".green(), deleted);
    if deleted.len() < full_names.len() {
        println!(
            "{}",
            format!("{} repositories could not be deleted.", full_names.len() - deleted.len())
                .yellow()
        );
    }
    Ok(())
}

fn handle_add_folder(api: &GitHubApi) -> Result<()> {
    let Some((owner, repos)) = pick_user_repositories(api)? else {
        return Ok(());
    };
    let Some(index) = pick_one("Enter the repository number to add folder", &repos)? else {
        return Ok(());
    };
    let repo = &repos[index].name;

    let folder: String = Input::new()
        .with_prompt("Enter the folder location")
        .interact_text()?;
    let folder = PathBuf::from(folder.trim());
    if !folder.is_dir() {
        println!("{}", format!("{} is not a folder.", folder.display()).red());
        return Ok(());
    }

    println!(
        "{}",
        format!("Uploading folder {} to repository {}...", folder.display(), repo).cyan()
    );
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Uploading...");

    let summary = api.upload_folder(&owner, repo, &folder, |upload: &FileUpload| {
        spinner.println(upload_line(upload));
    })?;
    spinner.finish_and_clear();

    if summary.failed() == 0 {
        println!("{}", "Folder added successfully.".green());
    } else {
        println!(
            "{}",
            format!(
                "Uploaded {} file(s), {} failed.",
                summary.uploaded(),
                summary.failed()
            )
            .yellow()
        );
    }
    Ok(())
}

fn upload_line(upload: &FileUpload) -> String {
    match &upload.outcome {
        ApiOutcome::Success(()) => format!("File '{}' uploaded successfully.", upload.relative_path)
            .green()
            .to_string(),
        ApiOutcome::Failure { message, .. } => format!(
            "Failed to upload file '{}'. Error: {}",
            upload.relative_path, message
        )
        .red()
        .to_string(),
    }
}

fn handle_view(api: &GitHubApi) -> Result<()> {
    let Some((owner, repos)) = pick_user_repositories(api)? else {
        return Ok(());
    };
    let Some(index) = pick_one("Enter the repository number to view files inside", &repos)? else {
        return Ok(());
    };

    match api.view_repository_contents(&owner, &repos[index].name)? {
        ApiOutcome::Success(entries) => {
            for entry in entries {
                println!("{}", entry.name);
            }
        }
        ApiOutcome::Failure { status, message } => {
            print_failure("Viewing contents", status, &message)
        }
    }
    Ok(())
}

fn handle_download(api: &GitHubApi) -> Result<()> {
    let Some((owner, repos)) = pick_user_repositories(api)? else {
        return Ok(());
    };
    let Some(index) = pick_one("Enter the repository number to download", &repos)? else {
        return Ok(());
    };
    let path: String = Input::new()
        .with_prompt("Enter download path")
        .interact_text()?;
    let path = PathBuf::from(path.trim());

    match api.download_repository_contents(&owner, &repos[index].name, &path)? {
        ApiOutcome::Success(written) => {
            for file in &written {
                println!("{}", file.display());
            }
            println!("{}", "Code downloaded successfully.".green());
        }
        ApiOutcome::Failure { status, message } => print_failure("Download", status, &message),
    }
    Ok(())
}
