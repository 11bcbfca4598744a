
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use portal::auth::{AuthState, Screen};
use portal::config::{ConfigError, TOKEN_STORAGE_KEY};
use portal::format::{DocumentKind, format_document};
use portal::net::ApiError;
use portal::net::types::RecordId;
use portal::screens::{
    ActionOutcome, BoletoForm, BoletosScreen, DocumentForm, DocumentsScreen, LoginScreen, RegisterScreen,
};
use portal::session::{FileStorage, StorageError, TokenStorage};
use portal::{Portal, PortalConfig, View};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("no config directory; pass --token-file or set PORTAL_TOKEN_FILE")]
    NoConfigDir,
    #[error("not logged in; run `boleto-cli login`")]
    NotLoggedIn,
    #[error("admin access required")]
    Forbidden,
    #[error("already logged in; run `boleto-cli logout` first")]
    AlreadyLoggedIn,
    #[error("could not verify session: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Action(String),
}

#[derive(Parser, Debug)]
#[command(name = "boleto-cli", about = "Boleto portal client")]
struct Cli {
    /// API base URL (defaults to the production endpoint).
    #[arg(long, env = "PORTAL_API_URL")]
    api_url: Option<String>,

    /// Where the session token is persisted.
    #[arg(long, env = "PORTAL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Create an account for a pre-authorized CPF/CNPJ.
    Register(RegisterArgs),
    /// Show the logged-in user's role.
    Whoami,
    /// Check whether a CPF/CNPJ may register.
    Verificar { documento: String },
    Boletos(BoletosCommand),
    Documentos(DocumentosCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    nome: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    senha: String,
    /// Defaults to `--senha`.
    #[arg(long)]
    confirmar_senha: Option<String>,
    #[arg(long)]
    documento: String,
}

#[derive(Args, Debug)]
struct BoletosCommand {
    #[command(subcommand)]
    command: BoletosSubcommand,
}

#[derive(Subcommand, Debug)]
enum BoletosSubcommand {
    List,
    Create {
        /// Amount, `100.50` or `100,50`.
        #[arg(long)]
        valor: String,
        /// Due date, `YYYY-MM-DD`.
        #[arg(long)]
        vencimento: String,
        #[arg(long)]
        descricao: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct DocumentosCommand {
    #[command(subcommand)]
    command: DocumentosSubcommand,
}

#[derive(Subcommand, Debug)]
enum DocumentosSubcommand {
    List,
    Create {
        #[arg(long, value_parser = parse_kind)]
        tipo: DocumentKind,
        #[arg(long)]
        documento: String,
        #[arg(long)]
        nome: String,
    },
    Delete {
        id: String,
    },
}

fn parse_kind(raw: &str) -> Result<DocumentKind, String> {
    DocumentKind::parse(raw).ok_or_else(|| format!("expected CPF or CNPJ, got {raw:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = PortalConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    let token_file = match cli.token_file {
        Some(path) => path,
        None => default_token_file().ok_or(CliError::NoConfigDir)?,
    };
    tracing::debug!(api_url = %config.api_url, token_file = %token_file.display(), "starting");

    let storage = Arc::new(FileStorage::new(token_file));
    let mut portal = Portal::new(config, storage.clone())?;
    portal.start().await;

    match cli.command {
        Command::Login { email, password } => run_login(&mut portal, storage.as_ref(), &email, &password).await,
        Command::Logout => {
            portal.logout();
            if storage.get(TOKEN_STORAGE_KEY)?.is_some() {
                return Err(CliError::Action("token was not removed".to_owned()));
            }
            println!("logged out");
            Ok(())
        }
        Command::Register(args) => run_register(&mut portal, args).await,
        Command::Whoami => run_whoami(&mut portal).await,
        Command::Verificar { documento } => run_verificar(&mut portal, &documento).await,
        Command::Boletos(cmd) => run_boletos(&mut portal, cmd.command).await,
        Command::Documentos(cmd) => run_documentos(&mut portal, cmd.command).await,
    }
}

fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("boleto-portal").join("session.json"))
}

/// Navigate to `screen`; anything but rendering it is an error.
fn enter(portal: &mut Portal, screen: Screen) -> Result<(), CliError> {
    landed_on(portal.navigate(screen.path()), screen)
}

fn landed_on(view: View, screen: Screen) -> Result<(), CliError> {
    match view {
        View::Screen(landed) if landed == screen => Ok(()),
        // Public screens bounce a live session to the boletos list.
        View::Screen(_) if screen.is_public() => Err(CliError::AlreadyLoggedIn),
        View::Screen(Screen::Login) | View::Loading => Err(CliError::NotLoggedIn),
        View::Screen(_) => Err(CliError::Forbidden),
        View::Unavailable(message) => Err(CliError::Unavailable(message)),
    }
}

fn check(outcome: ActionOutcome, error: Option<&str>) -> Result<(), CliError> {
    match outcome {
        ActionOutcome::Completed => Ok(()),
        // Only a 401 leaves the banner empty.
        ActionOutcome::Failed if error.is_none() => Err(CliError::NotLoggedIn),
        _ => Err(CliError::Action(error.unwrap_or("request ignored").to_owned())),
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

async fn run_login(
    portal: &mut Portal,
    storage: &dyn TokenStorage,
    email: &str,
    password: &str,
) -> Result<(), CliError> {
    enter(portal, Screen::Login)?;
    let mut screen = LoginScreen::new(email, password);
    let outcome = portal.login(&mut screen).await;
    if outcome != ActionOutcome::Completed {
        return Err(CliError::Action(screen.error.unwrap_or_default()));
    }
    if storage.get(TOKEN_STORAGE_KEY)?.is_none() {
        return Err(CliError::Action("token was not persisted".to_owned()));
    }
    match portal.state() {
        AuthState::Authenticated { role, .. } => println!("logged in as {email} ({role})"),
        AuthState::Unverified { message, .. } => println!("logged in as {email} (role not verified: {message})"),
        _ => println!("logged in as {email}"),
    }
    Ok(())
}

async fn run_register(portal: &mut Portal, args: RegisterArgs) -> Result<(), CliError> {
    enter(portal, Screen::Register)?;
    let confirmar_senha = args.confirmar_senha.as_deref().unwrap_or(&args.senha);
    let mut screen = RegisterScreen::new(&args.nome, &args.email, &args.senha, confirmar_senha);
    screen.set_documento(&args.documento);

    let outcome = screen.verify_document(portal.api()).await;
    check(outcome, screen.error.as_deref())?;
    let outcome = screen.submit(portal.api()).await;
    check(outcome, screen.error.as_deref())?;
    println!("account created for {}; run `boleto-cli login`", screen.email);
    Ok(())
}

async fn run_whoami(portal: &mut Portal) -> Result<(), CliError> {
    enter(portal, Screen::Boletos)?;
    let profile = portal.api().me().await?;
    println!("email: {}", profile.email.as_deref().unwrap_or("-"));
    println!("nome:  {}", profile.nome.as_deref().unwrap_or("-"));
    match portal.state() {
        AuthState::Authenticated { role, .. } => println!("role:  {role}"),
        _ => println!("role:  -"),
    }
    Ok(())
}

async fn run_verificar(portal: &mut Portal, documento: &str) -> Result<(), CliError> {
    enter(portal, Screen::Register)?;
    let mut screen = RegisterScreen::default();
    screen.set_documento(documento);
    let outcome = screen.verify_document(portal.api()).await;
    check(outcome, screen.error.as_deref())?;
    println!("{} autorizado", screen.documento());
    Ok(())
}

// =============================================================================
// BOLETOS
// =============================================================================

async fn run_boletos(portal: &mut Portal, command: BoletosSubcommand) -> Result<(), CliError> {
    enter(portal, Screen::Boletos)?;
    let mut screen = BoletosScreen::default();
    let outcome = match command {
        BoletosSubcommand::List => screen.load(portal.api()).await,
        BoletosSubcommand::Create { valor, vencimento, descricao } => {
            screen.form = BoletoForm::new(&valor, &vencimento, &descricao);
            screen.create(portal.api()).await
        }
        BoletosSubcommand::Delete { id } => screen.delete(portal.api(), &RecordId::parse(&id)).await,
    };
    check(outcome, screen.error.as_deref())?;
    print_boletos(&screen);
    Ok(())
}

fn print_boletos(screen: &BoletosScreen) {
    if screen.boletos.is_empty() {
        println!("nenhum boleto");
        return;
    }
    println!("{:<8} {:>16} {:<10} {:<10} DESCRIÇÃO", "ID", "VALOR", "VENCIMENTO", "STATUS");
    for boleto in &screen.boletos {
        println!(
            "{:<8} {:>16} {:<10} {:<10} {}",
            boleto.id.to_string(),
            format_brl(boleto.valor),
            boleto.vencimento.format("%d/%m/%Y").to_string(),
            boleto.status.as_str(),
            boleto.descricao
        );
    }
}

/// `1234.5` -> `R$ 1.234,50`.
fn format_brl(valor: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let cents = (valor * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let reais = (cents / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, digit) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

// =============================================================================
// AUTHORIZED DOCUMENTS
// =============================================================================

async fn run_documentos(portal: &mut Portal, command: DocumentosSubcommand) -> Result<(), CliError> {
    enter(portal, Screen::AdminDocuments)?;
    let mut screen = DocumentsScreen::default();
    let outcome = match command {
        DocumentosSubcommand::List => screen.load(portal.api()).await,
        DocumentosSubcommand::Create { tipo, documento, nome } => {
            screen.form = DocumentForm::new(tipo, &documento, &nome);
            screen.create(portal.api()).await
        }
        DocumentosSubcommand::Delete { id } => screen.delete(portal.api(), &RecordId::parse(&id)).await,
    };
    check(outcome, screen.error.as_deref())?;
    print_documents(&screen);
    Ok(())
}

fn print_documents(screen: &DocumentsScreen) {
    if screen.documents.is_empty() {
        println!("nenhum documento autorizado");
        return;
    }
    println!("{:<8} {:<5} {:<20} {:<10} NOME", "ID", "TIPO", "DOCUMENTO", "REGISTRADO");
    for document in &screen.documents {
        println!(
            "{:<8} {:<5} {:<20} {:<10} {}",
            document.id.to_string(),
            document.tipo.as_str(),
            format_document(&document.documento),
            if document.registrado { "sim" } else { "não" },
            document.nome
        );
    }
}
