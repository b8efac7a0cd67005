use anyhow::Result;
use clap::{Parser, Subcommand};
use tabula_core::compare::{ComparisonType, JoinType};

mod commands;
mod context;
mod logging;
mod render;

use context::AppContext;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula - analyze, compare and chat with tabular data", long_about = None)]
struct Cli {
    /// Backend origin, overriding config.toml
    #[arg(long, global = true, env = "TABULA_API_URL")]
    api_url: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the token for later commands
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TABULA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, env = "TABULA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Upload a file and analyze it outside any project
    Analyze {
        file: String,
        /// What you want to learn from the data
        #[arg(long)]
        intent: Option<String>,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage the files of a project
    Files {
        #[command(subcommand)]
        action: FileAction,
    },
    /// Compare two files of a project
    Compare {
        project: i64,
        file_a: i64,
        file_b: i64,
        #[arg(long = "type", default_value = "schema")]
        comparison_type: ComparisonType,
    },
    /// Join two files of a project and analyze the result
    Merge {
        project: i64,
        file_a: i64,
        file_b: i64,
        /// Column present in both files
        #[arg(long)]
        key: String,
        #[arg(long = "join", default_value = "inner")]
        join_type: JoinType,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Ask questions about a file, one per line
    Chat { project: i64, file: i64 },
    /// Inspect or edit config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List your projects
    List,
    /// Create a project
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a project and its files
    Show { project: i64 },
    /// Rename a project or change its description
    Update {
        project: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project and everything in it
    Delete { project: i64 },
}

#[derive(Subcommand)]
enum FileAction {
    /// Add a file to a project
    Upload {
        project: i64,
        file: String,
        /// Analyze the file right after the upload
        #[arg(long)]
        analyze: bool,
        #[arg(long)]
        intent: Option<String>,
    },
    /// Analyze a stored file again
    Analyze {
        project: i64,
        file: i64,
        #[arg(long)]
        intent: Option<String>,
    },
    /// List the analyses kept for a file
    History { project: i64, file: i64 },
    /// Remove one analysis from a file's history
    DeleteAnalysis {
        project: i64,
        file: i64,
        analysis: i64,
    },
    /// Explain one chart of a stored file's latest analysis
    Insight {
        project: i64,
        file: i64,
        chart: String,
    },
    /// Remove a file from a project
    Delete { project: i64, file: i64 },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print where configuration, token and logs live
    Paths,
    /// Store the backend origin in config.toml
    SetApiUrl { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = tabula_infrastructure::TabulaPaths::resolve()?;
    paths.ensure_dirs()?;
    let _log_guard = logging::init(&paths.logs_dir(), cli.verbose)?;

    // Config commands must work even when the stored config cannot build a client.
    let command = match cli.command {
        Commands::Config { action } => {
            return match action {
                ConfigAction::Show => commands::config::show(&paths),
                ConfigAction::Paths => commands::config::paths(&paths),
                ConfigAction::SetApiUrl { url } => commands::config::set_api_url(&paths, &url),
            };
        }
        command => command,
    };

    let ctx = AppContext::build(&paths, cli.api_url)?;

    match command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password).await?,
        Commands::Register {
            email,
            name,
            password,
        } => commands::auth::register(&ctx, &email, name.as_deref(), password).await?,
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Analyze { file, intent } => commands::analyze::run(&ctx, &file, intent).await?,
        Commands::Projects { action } => match action {
            ProjectAction::List => commands::projects::list(&ctx).await?,
            ProjectAction::Create { name, description } => {
                commands::projects::create(&ctx, name, description).await?
            }
            ProjectAction::Show { project } => commands::projects::show(&ctx, project).await?,
            ProjectAction::Update {
                project,
                name,
                description,
            } => commands::projects::update(&ctx, project, name, description).await?,
            ProjectAction::Delete { project } => commands::projects::delete(&ctx, project).await?,
        },
        Commands::Files { action } => match action {
            FileAction::Upload {
                project,
                file,
                analyze,
                intent,
            } => commands::files::upload(&ctx, project, &file, analyze, intent).await?,
            FileAction::Analyze {
                project,
                file,
                intent,
            } => commands::files::analyze(&ctx, project, file, intent).await?,
            FileAction::History { project, file } => {
                commands::files::history(&ctx, project, file).await?
            }
            FileAction::DeleteAnalysis {
                project,
                file,
                analysis,
            } => commands::files::delete_analysis(&ctx, project, file, analysis).await?,
            FileAction::Insight {
                project,
                file,
                chart,
            } => commands::files::insight(&ctx, project, file, &chart).await?,
            FileAction::Delete { project, file } => {
                commands::files::delete(&ctx, project, file).await?
            }
        },
        Commands::Compare {
            project,
            file_a,
            file_b,
            comparison_type,
        } => commands::compare::compare(&ctx, project, file_a, file_b, comparison_type).await?,
        Commands::Merge {
            project,
            file_a,
            file_b,
            key,
            join_type,
            intent,
        } => {
            commands::compare::merge(&ctx, project, file_a, file_b, key, join_type, intent).await?
        }
        Commands::Chat { project, file } => commands::chat::run(&ctx, project, file).await?,
        Commands::Config { .. } => {} // handled above
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_arguments() {
        let cli = Cli::try_parse_from([
            "tabula", "merge", "3", "10", "11", "--key", "customer_id", "--join", "left",
        ])
        .unwrap();
        match cli.command {
            Commands::Merge {
                project,
                key,
                join_type,
                intent,
                ..
            } => {
                assert_eq!(project, 3);
                assert_eq!(key, "customer_id");
                assert_eq!(join_type, JoinType::Left);
                assert!(intent.is_none());
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_unknown_comparison_type_is_rejected() {
        let parsed = Cli::try_parse_from(["tabula", "compare", "1", "2", "3", "--type", "fuzzy"]);
        assert!(parsed.is_err());
    }
}
