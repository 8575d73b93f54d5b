//! issuedesk - command line client for the issue tracker
//!
//! Projects, tickets, Kanban boards, comments, solutions, logs and the live
//! notification feed of one tenant, from the terminal.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::error;

use issuedesk::config::Config;
use issuedesk::error::ApiError;
use issuedesk::kanban::{Board, DropEvent, DropOutcome, Viewer};
use issuedesk::models::{
    BoardStatus, Comment, IssueStatus, Logo, NewComment, NewProject, ProjectType, Severity,
    Ticket,
};
use issuedesk::notifications::{Inbox, NotificationFeed};
use issuedesk::policy::{Workflow, visible_sections};
use issuedesk::services::LogFilter;
use issuedesk::store::{Session, SessionStore, ViewMode};
use issuedesk::tags::{TagCheck, TagChecker};
use issuedesk::threads::extract_mentions;
use issuedesk::wizard::{Architecture, MicroserviceDraft, ProjectWizard, WizardError};
use issuedesk::ApiClient;

#[derive(Parser)]
#[command(name = "issuedesk")]
#[command(about = "Command line client for the issuedesk tracker")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new config file
    Init {
        /// Output path for config file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Log in and remember the session
    Login {
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the local session
    Logout,

    /// Show the logged-in user and what they can see
    Whoami,

    /// Projects, packages and microservices
    Projects {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// Microservice packages
    Package {
        #[command(subcommand)]
        action: PackageCommand,
    },

    /// Tickets
    Tickets {
        #[command(subcommand)]
        action: TicketCommand,
    },

    /// Print the Kanban board of a project
    Board {
        project: i64,

        #[arg(long, value_enum, default_value_t = Flow::Issue)]
        flow: Flow,
    },

    /// Ticket comments
    Comments {
        #[command(subcommand)]
        action: CommentCommand,
    },

    /// Ticket solutions
    Solutions {
        #[command(subcommand)]
        action: SolutionCommand,
    },

    /// Ingested application logs
    Logs {
        #[command(subcommand)]
        action: LogCommand,
    },

    /// Staff administration
    Staff {
        #[command(subcommand)]
        action: StaffCommand,
    },

    /// Dashboard statistics
    Stats {
        /// Limit to one project
        #[arg(short, long)]
        project: Option<i64>,
    },

    /// Show or change local preferences
    Prefs {
        #[arg(long)]
        dark_mode: Option<bool>,

        /// grid or list
        #[arg(long)]
        view: Option<ViewMode>,
    },

    /// Follow the live notification feed
    Watch,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// List projects
    List,

    /// Show one project
    Show { id: i64 },

    /// Check whether a project tag is free
    CheckTag { tag: String },

    /// Create a monolithic project
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        tag: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Comma separated
        #[arg(long, value_delimiter = ',')]
        technologies: Vec<String>,

        #[arg(long)]
        repository: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<NaiveDate>,

        /// Logo image file
        #[arg(long)]
        logo: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PackageCommand {
    /// Create a package and its microservices
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        tag: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Microservice as NAME:TAG, repeatable
        #[arg(short, long = "service", required = true)]
        services: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TicketCommand {
    /// List tickets, optionally of one project
    List {
        #[arg(short, long)]
        project: Option<i64>,

        /// Also load each ticket's solution
        #[arg(long)]
        solutions: bool,
    },

    /// Move a ticket to another status, as a board drop would
    Move {
        id: i64,
        status: String,

        #[arg(long, value_enum, default_value_t = Flow::Issue)]
        flow: Flow,
    },

    /// Assign a ticket to a user
    Assign { id: i64, user: i64 },
}

#[derive(Subcommand)]
enum CommentCommand {
    /// Print the comment thread of a ticket
    Show { ticket: i64 },

    /// Comment on a ticket; @handles of project members are notified
    Add {
        ticket: i64,
        content: String,

        /// Reply to this comment
        #[arg(long)]
        reply_to: Option<i64>,
    },
}

#[derive(Subcommand)]
enum SolutionCommand {
    /// Show the solution of a ticket
    Show { ticket: i64 },

    /// Ask the backend for a suggested solution
    Recommend {
        ticket: i64,

        /// Save the suggestion as a draft
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// List logs
    List {
        #[arg(short, long)]
        project: Option<i64>,

        /// low, medium, high or critical
        #[arg(short, long, value_parser = parse_severity)]
        severity: Option<Severity>,

        /// Only logs nobody handled yet
        #[arg(long)]
        unhandled: bool,
    },

    /// Mark a log as handled
    Handle { id: i64 },
}

#[derive(Subcommand)]
enum StaffCommand {
    /// List staff members
    List,
}

/// Which status vocabulary a board uses
#[derive(Clone, Copy, ValueEnum)]
enum Flow {
    Issue,
    Board,
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => Err(format!("unknown severity '{}'", other)),
    }
}

/// Everything a command needs: config, local state and an authenticated client
struct App {
    config: Config,
    store: SessionStore,
    client: ApiClient,
}

impl App {
    fn open(config_path: Option<&Path>, base_url: Option<String>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(url) = base_url {
            config.api.base_url = url;
        }

        let store = SessionStore::open(&config.session.path).context("Failed to open session store")?;
        let mut client = ApiClient::new(&config.api.base_url);
        client.set_token(store.token()?);

        Ok(Self {
            config,
            store,
            client,
        })
    }

    fn session(&self) -> Result<Session> {
        self.client
            .auth()
            .current(&self.store)?
            .context("Not logged in. Run 'issuedesk login <email>' first.")
    }

    fn concurrency(&self) -> usize {
        self.config.fanout.concurrency
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "issuedesk=debug"
    } else {
        "issuedesk=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { output } = &cli.command {
        return init(output.clone().or(cli.config.clone()));
    }

    let app = App::open(cli.config.as_deref(), cli.base_url.clone())?;
    if let Err(err) = run(&app, cli.command).await {
        report(&app, &err);
        std::process::exit(1);
    }
    Ok(())
}

fn init(output: Option<PathBuf>) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => Config::default_path()?,
    };
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }
    Config::default().save_to(&path)?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point api.base_url at your tracker");
    println!("  2. Log in: issuedesk login you@example.com");
    Ok(())
}

/// Print an error the way the web client would toast it
fn report(app: &App, err: &anyhow::Error) {
    let api = err.downcast_ref::<ApiError>().or_else(|| match err.downcast_ref::<WizardError>() {
        Some(WizardError::Api(api)) => Some(api),
        _ => None,
    });

    let Some(api) = api else {
        eprintln!("Error: {:#}", err);
        return;
    };

    error!(status = api.status(), error = %api, "Request failed");
    eprintln!("Error: {}", api.user_message());
    if matches!(api, ApiError::SessionExpired)
        && let Err(e) = app.store.clear_login()
    {
        eprintln!("Could not clear the local session: {:#}", e);
    }
    if api.requires_login() {
        eprintln!("Run 'issuedesk login <email>' to sign in again.");
    }
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Login { email, password } => login(app, &email, password).await,
        Commands::Logout => {
            app.client.auth().logout(&app.store).await?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami(app),
        Commands::Projects { action } => projects(app, action).await,
        Commands::Package { action } => package(app, action).await,
        Commands::Tickets { action } => tickets(app, action).await,
        Commands::Board { project, flow } => match flow {
            Flow::Issue => board::<IssueStatus>(app, project).await,
            Flow::Board => board::<BoardStatus>(app, project).await,
        },
        Commands::Comments { action } => comments(app, action).await,
        Commands::Solutions { action } => solutions(app, action).await,
        Commands::Logs { action } => logs(app, action).await,
        Commands::Staff { action } => staff(app, action).await,
        Commands::Stats { project } => stats(app, project).await,
        Commands::Prefs { dark_mode, view } => prefs(app, dark_mode, view),
        Commands::Watch => watch(app).await,
    }
}

async fn login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            print!("Password: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let session = app.client.auth().login(&app.store, email, &password).await?;
    println!(
        "Logged in as {} ({})",
        session.user.full_name(),
        session.role()
    );
    Ok(())
}

fn whoami(app: &App) -> Result<()> {
    let session = app.session()?;
    println!("{} <{}>", session.user.full_name(), session.user.email);
    println!("Role:   {}", session.role());
    if let Some(tenant) = session.tenant() {
        println!("Tenant: {}", tenant);
    }
    let sections: Vec<String> = visible_sections(session.role())
        .iter()
        .map(|s| format!("{:?}", s))
        .collect();
    println!("Menu:   {}", sections.join(", "));
    Ok(())
}

async fn projects(app: &App, action: ProjectCommand) -> Result<()> {
    let service = app.client.projects();
    match action {
        ProjectCommand::List => {
            let projects = service.list().await?;
            if projects.is_empty() {
                println!("No projects.");
                return Ok(());
            }
            match app.store.project_view_mode()? {
                ViewMode::List => {
                    for p in &projects {
                        println!(
                            "{:>5}  {:<12} {:<24} {:>3}%",
                            p.id,
                            p.project_tag.as_deref().unwrap_or("-"),
                            p.name,
                            p.progress()
                        );
                    }
                }
                ViewMode::Grid => {
                    for p in &projects {
                        println!("┌ #{} {}", p.id, p.name);
                        println!("│ {} · {}", p.project_type.as_str(), p.project_tag.as_deref().unwrap_or("-"));
                        println!("└ {}% · {} members", p.progress(), p.members_count);
                    }
                }
            }
            Ok(())
        }

        ProjectCommand::Show { id } => {
            let project = service.get(id).await?;
            println!("#{} {}", project.id, project.name);
            println!("Type:     {}", project.project_type.as_str());
            if let Some(tag) = &project.project_tag {
                println!("Tag:      {}", tag);
            }
            if let Some(description) = &project.description {
                println!("About:    {}", description);
            }
            if !project.technologies.is_empty() {
                println!("Stack:    {}", project.technologies.join(", "));
            }
            if let Some(deadline) = project.deadline_date {
                println!("Deadline: {}", deadline);
            }
            println!("Progress: {}%", project.progress());
            if let Err(problem) = project.validate_hierarchy() {
                println!("Warning:  {}", problem);
            }

            if project.is_package() {
                let session = app.session().ok();
                println!();
                println!("Microservices:");
                match session {
                    Some(session) => {
                        let membership = service
                            .package_membership(project.id, session.user_id(), app.concurrency())
                            .await?;
                        for (sub, member) in membership {
                            let marker = if member { "*" } else { " " };
                            println!("  {} #{} {}", marker, sub.id, sub.name);
                        }
                        println!("  (* you are a member)");
                    }
                    None => {
                        for sub in service.sub_projects(project.id).await? {
                            println!("    #{} {}", sub.id, sub.name);
                        }
                    }
                }
            }
            Ok(())
        }

        ProjectCommand::CheckTag { tag } => {
            let checker = TagChecker::with_delay(service, Duration::ZERO);
            match checker.check(&tag).await? {
                TagCheck::Empty => println!("Enter a tag."),
                TagCheck::Available => println!("'{}' is available.", tag.trim()),
                TagCheck::Taken { suggestions } => {
                    println!("'{}' is taken.", tag.trim());
                    if !suggestions.is_empty() {
                        println!("Try: {}", suggestions.join(", "));
                    }
                }
                TagCheck::Superseded => {}
            }
            Ok(())
        }

        ProjectCommand::Create {
            name,
            tag,
            description,
            technologies,
            repository,
            deadline,
            logo,
        } => {
            ensure_tag_free(app, &tag).await?;

            let mut details = NewProject::new(name, tag, ProjectType::Monolithic);
            details.description = description;
            details.technologies = technologies;
            details.repository_link = repository;
            details.deadline_date = deadline;
            details.logo = logo.as_deref().map(read_logo).transpose()?;

            let mut wizard = ProjectWizard::new();
            wizard.choose_architecture(Architecture::Monolithic)?;
            wizard.next(&service).await?;
            wizard.set_details(details)?;
            wizard.next(&service).await?;

            if let Some(project) = wizard.project() {
                println!("Created project #{} {}", project.id, project.name);
            }
            Ok(())
        }
    }
}

async fn ensure_tag_free(app: &App, tag: &str) -> Result<()> {
    let checker = TagChecker::with_delay(app.client.projects(), Duration::ZERO);
    if let TagCheck::Taken { suggestions } = checker.check(tag).await? {
        if suggestions.is_empty() {
            bail!("Project tag '{}' is taken", tag);
        }
        bail!(
            "Project tag '{}' is taken; try {}",
            tag,
            suggestions.join(", ")
        );
    }
    Ok(())
}

fn read_logo(path: &Path) -> Result<Logo> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("logo")
        .to_string();
    Ok(Logo {
        file_name,
        mime: mime.to_string(),
        bytes,
    })
}

async fn package(app: &App, action: PackageCommand) -> Result<()> {
    let PackageCommand::Create {
        name,
        tag,
        description,
        services,
    } = action;

    let drafts = services
        .iter()
        .map(|entry| {
            let (name, tag) = entry
                .split_once(':')
                .with_context(|| format!("Expected NAME:TAG, got '{}'", entry))?;
            Ok(MicroserviceDraft::new(name.trim(), tag.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    ensure_tag_free(app, &tag).await?;
    for draft in &drafts {
        ensure_tag_free(app, &draft.project_tag).await?;
    }

    let service = app.client.projects();
    let mut details = NewProject::new(name, tag, ProjectType::MicroservicesPackage);
    details.description = description;

    let mut wizard = ProjectWizard::new();
    wizard.choose_architecture(Architecture::Microservices)?;
    wizard.next(&service).await?;
    wizard.set_details(details)?;
    wizard.next(&service).await?;
    for draft in drafts {
        wizard.add_microservice(draft)?;
    }

    let submitted = wizard.submit(&service).await.map(|_| ());
    if let Err(err) = submitted {
        if let Some(id) = wizard.package_id() {
            eprintln!(
                "Package #{} saved; {} microservice(s) created before the failure:",
                id,
                wizard.created().len()
            );
            for project in wizard.created() {
                eprintln!("  #{} {}", project.id, project.name);
            }
        }
        return Err(err.into());
    }

    if let Some(package) = wizard.project() {
        println!("Created package #{} {}", package.id, package.name);
    }
    for project in wizard.created() {
        println!("  #{} {}", project.id, project.name);
    }
    Ok(())
}

fn print_ticket(ticket: &Ticket) {
    let assignee = ticket
        .assigned_to_user_id
        .map(|id| format!("@{}", id))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>6}  {:<15} {:<9} {:<6} {}",
        ticket.id,
        ticket.status,
        format!("{:?}", ticket.priority),
        assignee,
        ticket.title
    );
}

/// Tickets of a project, or of every microservice when it is a package
async fn project_tickets(app: &App, project_id: i64) -> Result<Vec<Ticket>> {
    let project = app.client.projects().get(project_id).await?;
    let tickets = app.client.tickets();
    if project.is_package() {
        let subs = app.client.projects().sub_projects(project_id).await?;
        let ids: Vec<i64> = subs.iter().map(|p| p.id).collect();
        Ok(tickets.for_projects(&ids, app.concurrency()).await?)
    } else {
        Ok(tickets.for_project(project_id).await?)
    }
}

async fn tickets(app: &App, action: TicketCommand) -> Result<()> {
    match action {
        TicketCommand::List { project, solutions } => {
            let tickets = match project {
                Some(id) => project_tickets(app, id).await?,
                None => app.client.tickets().list().await?,
            };
            if tickets.is_empty() {
                println!("No tickets.");
                return Ok(());
            }

            if solutions {
                let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
                let found = app
                    .client
                    .solutions()
                    .for_tickets(&ids, app.concurrency())
                    .await?;
                for (ticket, (_, solution)) in tickets.iter().zip(found) {
                    print_ticket(ticket);
                    if let Some(solution) = solution {
                        println!("{:>8}solution: {} [{:?}]", "", solution.title, solution.status);
                    }
                }
            } else {
                tickets.iter().for_each(print_ticket);
            }
            Ok(())
        }

        TicketCommand::Move { id, status, flow } => match flow {
            Flow::Issue => move_ticket::<IssueStatus>(app, id, &status).await,
            Flow::Board => move_ticket::<BoardStatus>(app, id, &status).await,
        },

        TicketCommand::Assign { id, user } => {
            let ticket = app.client.tickets().assign(id, user).await?;
            println!("Ticket #{} assigned to user {}", ticket.id, user);
            Ok(())
        }
    }
}

async fn move_ticket<S: Workflow>(app: &App, ticket_id: i64, raw_status: &str) -> Result<()> {
    let session = app.session()?;
    let viewer = Viewer::from(&session);
    let target = S::parse(raw_status).with_context(|| {
        let known: Vec<&str> = S::ALL.iter().map(|s| s.as_str()).collect();
        format!("Unknown status '{}'; expected one of {}", raw_status, known.join(", "))
    })?;

    let service = app.client.tickets();
    let ticket = service.get(ticket_id).await?;
    let siblings = match ticket.project_id {
        Some(project_id) => service.for_project(project_id).await?,
        None => vec![ticket],
    };

    let mut board = Board::<S>::from_tickets(&siblings, &viewer);
    let (from, previous_index) = board
        .locate(ticket_id)
        .with_context(|| format!("Ticket #{} is not on your board", ticket_id))?;
    let current_index = board.column(target).map_or(0, |c| c.tickets.len());

    let event = DropEvent {
        from,
        to: target,
        previous_index,
        current_index,
    };
    match board.drop_ticket(event, &viewer, &service).await? {
        DropOutcome::Moved { ticket_id, status } => {
            println!("Ticket #{} moved to {}", ticket_id, status.label());
        }
        DropOutcome::Rejected { reason, .. } => bail!(reason),
        DropOutcome::Reordered => println!("Ticket #{} is already {}", ticket_id, target.label()),
        DropOutcome::Ignored => bail!("Ticket #{} could not be moved", ticket_id),
    }
    Ok(())
}

async fn board<S: Workflow>(app: &App, project_id: i64) -> Result<()> {
    let session = app.session()?;
    let viewer = Viewer::from(&session);
    let tickets = project_tickets(app, project_id).await?;
    let board = Board::<S>::from_tickets(&tickets, &viewer);

    for column in &board.columns {
        println!("== {} ({})", column.status.label(), column.tickets.len());
        for ticket in &column.tickets {
            print_ticket(ticket);
        }
        println!();
    }
    if !board.hidden.is_empty() {
        println!("{} ticket(s) hidden by your role filter", board.hidden.len());
    }
    Ok(())
}

fn print_comment(comment: &Comment, depth: usize) {
    let indent = "    ".repeat(depth);
    let author = comment
        .author_user_id
        .map(|id| format!("user {}", id))
        .unwrap_or_else(|| "unknown".to_string());
    let when = comment
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!("{}#{} {} {}", indent, comment.id, author, when);
    for line in comment.content.lines() {
        println!("{}  {}", indent, line);
    }
}

async fn comments(app: &App, action: CommentCommand) -> Result<()> {
    let service = app.client.comments();
    match action {
        CommentCommand::Show { ticket } => {
            let thread = service.thread(ticket).await?;
            if thread.is_empty() {
                println!("No comments.");
            }
            for node in &thread.roots {
                print_comment(&node.comment, 0);
                for reply in &node.replies {
                    print_comment(reply, 1);
                }
            }
            Ok(())
        }

        CommentCommand::Add {
            ticket,
            content,
            reply_to,
        } => {
            let session = app.session()?;
            let project_id = app.client.tickets().get(ticket).await?.project_id;
            let members = match project_id {
                Some(id) => app.client.projects().members(id).await?,
                None => Vec::new(),
            };
            let mentioned_user_ids = extract_mentions(&content, &members);

            let comment = service
                .create(&NewComment {
                    ticket_id: ticket,
                    content,
                    author_user_id: session.user_id(),
                    mentioned_user_ids,
                    parent_comment_id: reply_to,
                })
                .await?;
            println!("Comment #{} added", comment.id);
            if !comment.mentioned_user_ids.is_empty() {
                println!("Mentioned users: {:?}", comment.mentioned_user_ids);
            }
            Ok(())
        }
    }
}

async fn solutions(app: &App, action: SolutionCommand) -> Result<()> {
    let service = app.client.solutions();
    match action {
        SolutionCommand::Show { ticket } => {
            match service.for_ticket(ticket).await? {
                Some(solution) => {
                    println!("{} [{:?}, {:?}]", solution.title, solution.status, solution.complexity);
                    println!();
                    println!("{}", solution.content);
                }
                None => println!("Ticket #{} has no solution yet.", ticket),
            }
            Ok(())
        }

        SolutionCommand::Recommend { ticket, save } => {
            let recommendation = service.recommend(ticket).await?;
            println!("{} [{:?}]", recommendation.title, recommendation.complexity);
            println!();
            println!("{}", recommendation.content);

            if save {
                let author = app.session().ok().map(|s| s.user_id());
                let saved = service.create(&recommendation.into_draft(ticket, author)).await?;
                println!();
                println!("Saved as draft solution #{}", saved.id);
            }
            Ok(())
        }
    }
}

async fn logs(app: &App, action: LogCommand) -> Result<()> {
    let service = app.client.logs();
    match action {
        LogCommand::List {
            project,
            severity,
            unhandled,
        } => {
            let filter = LogFilter {
                project_id: project,
                severity,
                handled: unhandled.then_some(false),
            };
            let logs = service.list(&filter).await?;
            if logs.is_empty() {
                println!("No logs.");
            }
            for log in logs {
                let mark = if log.handled { "✓" } else { " " };
                println!(
                    "{} {:>6}  {}  {:<8} {:<12} {}",
                    mark,
                    log.id,
                    log.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    format!("{:?}", log.severity),
                    log.log_type,
                    log.message.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }

        LogCommand::Handle { id } => {
            service.mark_handled(id).await?;
            println!("Log #{} marked as handled", id);
            Ok(())
        }
    }
}

async fn staff(app: &App, action: StaffCommand) -> Result<()> {
    let StaffCommand::List = action;
    let members = app.client.staff().list().await?;
    if members.is_empty() {
        println!("No staff members.");
    }
    for member in members {
        println!(
            "{:>5}  {:<10} {:<24} {}",
            member.id,
            member.role,
            member.full_name(),
            member.email
        );
    }
    Ok(())
}

async fn stats(app: &App, project: Option<i64>) -> Result<()> {
    let stats = app.client.stats().dashboard(project).await?;
    println!("Projects:       {}", stats.total_projects);
    println!("Tickets:        {} ({} open)", stats.total_tickets, stats.open_tickets);
    println!("Logs:           {} ({} unhandled)", stats.total_logs, stats.unhandled_logs);

    let sections = [
        ("Tickets by status", &stats.tickets_by_status),
        ("Tickets by priority", &stats.tickets_by_priority),
        ("Logs by severity", &stats.logs_by_severity),
    ];
    for (title, counts) in sections {
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("{}:", title);
        for (key, count) in counts {
            println!("  {:<16} {}", key, count);
        }
    }
    Ok(())
}

fn prefs(app: &App, dark_mode: Option<bool>, view: Option<ViewMode>) -> Result<()> {
    if let Some(enabled) = dark_mode {
        app.store.set_dark_mode(enabled)?;
    }
    if let Some(mode) = view {
        app.store.set_project_view_mode(mode)?;
    }
    println!("darkMode:        {}", app.store.dark_mode()?);
    println!("projectViewMode: {}", app.store.project_view_mode()?.as_str());
    Ok(())
}

async fn watch(app: &App) -> Result<()> {
    let session = app.session()?;
    let url = app.config.notifications_url();
    let mut feed = NotificationFeed::connect(&url, &session.user.email, Some(&session.token))?;
    let mut status = feed.status();
    let mut inbox = Inbox::default();
    let mut status_open = true;

    println!("Watching notifications for {} (Ctrl-C to stop)", session.user.email);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed(), if status_open => {
                if changed.is_err() {
                    status_open = false;
                    continue;
                }
                println!("[{:?}]", *status.borrow_and_update());
            }
            next = feed.next() => match next {
                Some(notification) => {
                    let ticket = notification
                        .ticket_id
                        .map(|id| format!(" (ticket #{})", id))
                        .unwrap_or_default();
                    println!("• {}{}", notification.message, ticket);
                    inbox.push(notification);
                }
                None => {
                    println!("Feed closed.");
                    break;
                }
            },
        }
    }

    println!("{} notification(s) received, {} unread", inbox.items().len(), inbox.unread_count());
    feed.close();
    Ok(())
}
