use chrono::NaiveDate;
use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use release_radar::{Res, cli, config, config::Settings, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[clap(about = "Update the release radar of every active user once")]
    Run(RunOptions),

    #[clap(about = "Serve the HTTP trigger")]
    Serve,

    #[clap(about = "Update release radars on a cron schedule")]
    Schedule(ScheduleOptions),

    Users(UsersOptions),

    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RunOptions {
    /// Reference date of the recency window (YYYY-MM-DD), defaults to today
    #[clap(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Print the summary as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ScheduleOptions {
    /// Run once right away before waiting for the schedule
    #[clap(long)]
    pub run_now: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Manage registered users")]
pub struct UsersOptions {
    #[command(subcommand)]
    pub command: UsersSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersSubcommand {
    List {
        #[clap(long)]
        active: bool,
    },
    Add {
        #[clap(long)]
        email: String,
        #[clap(long)]
        user_id: String,
        #[clap(long)]
        refresh_token: String,
        /// Register the user without opting in
        #[clap(long)]
        inactive: bool,
    },
    Activate {
        email: String,
    },
    Deactivate {
        email: String,
    },
    Show {
        email: String,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn load_settings() -> Res<Settings> {
    config::load_env().await?;
    Ok(Settings::from_env()?)
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let settings = match load_settings().await {
        Ok(settings) => settings,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    match cli.command {
        Command::Run(opt) => cli::run(&settings, opt.today, opt.json).await,
        Command::Serve => cli::serve(&settings).await,
        Command::Schedule(opt) => cli::schedule(&settings, opt.run_now).await,
        Command::Users(opt) => match opt.command {
            UsersSubcommand::List { active } => cli::list_users(&settings, active).await,
            UsersSubcommand::Add {
                email,
                user_id,
                refresh_token,
                inactive,
            } => cli::add_user(&settings, email, user_id, refresh_token, !inactive).await,
            UsersSubcommand::Activate { email } => cli::set_active(&settings, &email, true).await,
            UsersSubcommand::Deactivate { email } => {
                cli::set_active(&settings, &email, false).await
            }
            UsersSubcommand::Show { email } => cli::show_user(&settings, &email).await,
        },
        Command::Completions(_) => {}
    }
}
