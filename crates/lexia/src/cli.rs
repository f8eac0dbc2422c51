//! Command-line interface.
//!
//! ```text
//! lexia list    (--file F | --api) [table options]
//! lexia history <id> (--file F | --api) [table options]
//! lexia stats   (--file F | --api)
//! lexia execute <id> (--file F | --api)
//! lexia validate <preset> <value>
//! lexia register --nombre N --email E [--tipo-cuenta personal|business]
//! lexia login --email E [--save]
//! lexia whoami
//! lexia logout [--save]
//! ```

use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use lexia_seeker::{FilterOp, FilterSpec, Scalar, Seekable, SeekerError, SortOrder};
use lexia_table::Table;
use lexia_validate::{presets, Outcome};
use serde::Serialize;
use serde_json::Value;

use crate::api::{self, Dataset, HttpApi, InMemoryApi, SolicitudesApi, DEFAULT_LIMIT};
use crate::auth::AuthApi;
use crate::config::{self, LexiaConfig};
use crate::model::{AccountType, Ejecucion, NuevoUsuario, Solicitud};
use crate::output::{self, Column, Listing, OutputMode};
use crate::supervisor::Supervisor;

const SOLICITUD_COLUMNS: &[Column] = &[
    Column::new("id", "ID", 8),
    Column::new("alias", "Alias", 40),
    Column::new("tipo_busqueda", "Type", 9),
    Column::new("frecuencia_envio", "Frequency", 9),
    Column::new("activa", "Active", 6),
    Column::new("ultima_ejecucion", "Last run", 16),
];

const HISTORY_COLUMNS: &[Column] = &[
    Column::new("fecha_ejecucion", "Executed", 16),
    Column::new("numero_radicado_completo", "Radicado", 23),
    Column::new("despacho_juzgado", "Court", 40),
    Column::new("fecha_ultimo_auto", "Last order", 16),
    Column::new("estado_extraccion", "Status", 13),
];

pub const PASSWORD_ENV: &str = "LEXIA_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "lexia", version, about = "Browse and validate monitored court cases")]
pub struct Cli {
    /// Config file (default: $LEXIA_CONFIG or ./lexia.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging for lexia crates.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List solicitudes with search, filters, sorting and paging.
    List {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Execution history of one solicitud.
    History {
        id: String,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Dashboard numbers.
    Stats {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t)]
        output: OutputMode,
    },
    /// Run a solicitud now.
    Execute {
        id: String,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t)]
        output: OutputMode,
    },
    /// Create an account on the backend.
    Register {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value_t)]
        tipo_cuenta: AccountType,
    },
    /// Log in and print the access token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
        /// Store the token in the config file.
        #[arg(long)]
        save: bool,
    },
    /// Show the user the configured token belongs to.
    Whoami {
        #[arg(long, value_enum, default_value_t)]
        output: OutputMode,
    },
    /// End the session.
    Logout {
        /// Remove the token from the config file.
        #[arg(long)]
        save: bool,
    },
    /// Check a value against a preset rule set.
    Validate {
        /// One of: required, email, password, radicado, cedula, telefono, nombre.
        preset: String,
        value: String,
    },
}

/// Where records come from.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// JSON file with an array of solicitudes, or an object with
    /// `solicitudes` and `resultados`.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Query the backend configured in `api.base_url`.
    #[arg(long)]
    pub api: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct TableArgs {
    /// Free-text search term.
    #[arg(long)]
    pub search: Option<String>,

    /// Restrict search to this field (repeatable, dot paths allowed).
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,

    /// `field=value`, `field=a|b` or `field:op:value` (repeatable).
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    #[arg(long, value_name = "FIELD")]
    pub sort: Option<String>,

    /// Sort descending.
    #[arg(long, requires = "sort")]
    pub desc: bool,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long)]
    pub page_size: Option<usize>,

    /// Select a row by id (repeatable).
    #[arg(long = "select", value_name = "ID")]
    pub select: Vec<String>,

    /// Select every row on the shown page.
    #[arg(long)]
    pub select_page: bool,

    #[arg(long, value_enum, default_value_t)]
    pub output: OutputMode,
}

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let path = config::resolve_path(cli.config.as_deref());
    let config = config::load_config(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    let supervisor = Supervisor::new();

    match cli.command {
        Command::List { source, table } => {
            let api = connect(&source, &config)?;
            let rows = load(&supervisor, "solicitudes", fetch_solicitudes(api.as_ref())).await?;
            print!("{}", render_rows(rows, &table, &config, SOLICITUD_COLUMNS)?);
        }
        Command::History { id, source, table } => {
            let api = connect(&source, &config)?;
            let rows = load(&supervisor, "history", fetch_history(api.as_ref(), &id)).await?;
            print!("{}", render_rows(rows, &table, &config, HISTORY_COLUMNS)?);
        }
        Command::Stats { source, output } => {
            let api = connect(&source, &config)?;
            let stats = load(&supervisor, "stats", api.stats()).await?;
            print!("{}", output::render_value(&stats, output)?);
        }
        Command::Execute { id, source, output } => {
            let api = connect(&source, &config)?;
            let report = load(&supervisor, "execution", api.execute(&id)).await?;
            print!("{}", output::render_value(&report, output)?);
        }
        Command::Register {
            nombre,
            email,
            password,
            tipo_cuenta,
        } => {
            let nuevo = NuevoUsuario {
                nombre,
                email,
                password,
                tipo_cuenta,
            };
            let usuario = auth_client(&config)?
                .register(nuevo)
                .await
                .context("registering account")?;
            println!("registered {} ({})", usuario.email, usuario.tipo_cuenta.as_str());
        }
        Command::Login {
            email,
            password,
            save,
        } => {
            let token = auth_client(&config)?
                .login(&email, &password)
                .await
                .context("logging in")?;
            if save {
                store_token(&path, config, Some(token.access_token))?;
                println!("token saved to {}", path.display());
            } else {
                println!("{}", token.access_token);
            }
        }
        Command::Whoami { output } => {
            let usuario = auth_client(&config)?.me().await.context("loading current user")?;
            print!("{}", output::render_value(&usuario, output)?);
        }
        Command::Logout { save } => {
            auth_client(&config)?.logout().await.context("logging out")?;
            if save {
                store_token(&path, config, None)?;
            }
            println!("logged out");
        }
        Command::Validate { preset, value } => {
            let outcome = validate(&config, &preset, &value).await?;
            return Ok(match outcome {
                Outcome::Invalid(message) => {
                    println!("invalid: {message}");
                    ExitCode::FAILURE
                }
                _ => {
                    println!("valid");
                    ExitCode::SUCCESS
                }
            });
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Checks `value` against the named preset.
pub async fn validate(config: &LexiaConfig, preset: &str, value: &str) -> Result<Outcome> {
    let rules = presets::by_name(preset)?;
    let validator = config.validator().field(preset, rules);
    Ok(validator
        .validate_field(preset, &Value::String(value.to_string()))
        .await)
}

fn connect(source: &SourceArgs, config: &LexiaConfig) -> Result<Box<dyn SolicitudesApi>> {
    match &source.file {
        Some(path) => Ok(Box::new(InMemoryApi::from_dataset(read_dataset(path)?))),
        None => {
            let api = HttpApi::new(&config.api.base_url, config.api.token.clone())
                .context("configuring the API client")?;
            Ok(Box::new(api))
        }
    }
}

fn auth_client(config: &LexiaConfig) -> Result<HttpApi> {
    HttpApi::new(&config.api.base_url, config.api.token.clone())
        .context("configuring the API client")
}

/// Replaces the API token in the config file at `path`.
pub fn store_token(path: &Path, mut config: LexiaConfig, token: Option<String>) -> Result<()> {
    config.api.token = token;
    config::save_config(path, &config)
        .with_context(|| format!("saving configuration to {}", path.display()))
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

/// Pages through a listing until a short page.
///
/// Rows are deduplicated by `key`. A full page that adds no new rows also
/// ends the walk, so a backend that ignores `skip` cannot loop forever.
pub async fn fetch_pages<T, K, F, Fut>(limit: usize, key: K, mut fetch: F) -> api::Result<Vec<T>>
where
    K: Fn(&T) -> String,
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = api::Result<Vec<T>>>,
{
    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    let mut skip = 0;
    loop {
        let page = fetch(skip, limit).await?;
        let received = page.len();
        let before = rows.len();
        skip += received;
        rows.extend(page.into_iter().filter(|row| seen.insert(key(row))));

        if received < limit {
            return Ok(rows);
        }
        if rows.len() == before {
            tracing::warn!(skip, "page repeated earlier rows, stopping");
            return Ok(rows);
        }
    }
}

async fn fetch_solicitudes(api: &dyn SolicitudesApi) -> api::Result<Vec<Solicitud>> {
    fetch_pages(
        DEFAULT_LIMIT,
        |s: &Solicitud| s.id.clone(),
        |skip, limit| api.list(skip, limit),
    )
    .await
}

async fn fetch_history(api: &dyn SolicitudesApi, id: &str) -> api::Result<Vec<Ejecucion>> {
    fetch_pages(
        DEFAULT_LIMIT,
        |e: &Ejecucion| e.id.clone(),
        |skip, limit| api.history(id, skip, limit),
    )
    .await
}

async fn load<T, E, F>(supervisor: &Supervisor, what: &str, work: F) -> Result<T>
where
    E: std::fmt::Display,
    F: std::future::Future<Output = std::result::Result<T, E>>,
{
    supervisor
        .guard_async(work)
        .await
        .into_result()
        .map_err(|incident| anyhow!("could not load {what}: {incident}"))
}

/// Builds a table over `rows` with the options from the command line.
pub fn build_table<T: Seekable>(
    rows: Vec<T>,
    args: &TableArgs,
    config: &LexiaConfig,
) -> Result<Table<T>> {
    let mut options = config.table_options().search_fields(args.fields.iter().cloned());
    if let Some(size) = args.page_size {
        options = options.page_size(size);
    }
    if let Some(field) = &args.sort {
        let order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };
        options = options.sort_by(field.clone(), order);
    }

    let mut table = Table::new(rows, options);
    if let Some(term) = &args.search {
        table.set_search_term(term.clone());
        table.flush_search();
    }
    for expr in &args.filters {
        let (field, spec) = parse_filter(expr)?;
        table.set_filter(&field, spec);
    }
    table.set_page(args.page);
    for id in &args.select {
        table.toggle_row_selection(id.clone(), true);
    }
    if args.select_page {
        table.select_all_on_page(true);
    }
    Ok(table)
}

fn render_rows<T: Seekable + Serialize>(
    rows: Vec<T>,
    args: &TableArgs,
    config: &LexiaConfig,
    columns: &[Column],
) -> Result<String> {
    let table = build_table(rows, args, config)?;
    let view = table.view();
    let listing = Listing {
        rows: view.rows,
        pagination: view.pagination,
    };
    let mut out = output::render_listing(&listing, columns, args.output)?;
    if args.output == OutputMode::Text && table.selected_count() > 0 {
        let ids: Vec<&str> = table.selected_ids().iter().map(String::as_str).collect();
        out.push_str(&format!("Selected: {}\n", ids.join(", ")));
    }
    Ok(out)
}

/// Parses a `--filter` expression.
///
/// - `field=value`: equality; `field=a|b` is membership; `field=` removes
///   the filter.
/// - `field:op:value`: an operator by name (`contains`, `gte`, ...);
///   `between` takes `low,high` and `in` takes a comma list.
///
/// Values are read as `null`, booleans, numbers or text.
pub fn parse_filter(expr: &str) -> lexia_seeker::Result<(String, Option<FilterSpec>)> {
    let eq = expr.find('=');
    let colon = expr.find(':');

    let (field, spec) = match (eq, colon) {
        (Some(e), c) if c.map_or(true, |c| e < c) => {
            let (field, value) = (&expr[..e], &expr[e + 1..]);
            let spec = if value.contains('|') {
                Some(FilterSpec::one_of(value.split('|').map(Scalar::infer)))
            } else {
                let scalar = Scalar::infer(value);
                (!scalar.is_blank()).then(|| FilterSpec::eq(scalar))
            };
            (field, spec)
        }
        (_, Some(_)) => {
            let mut parts = expr.splitn(3, ':');
            let field = parts.next().unwrap_or_default();
            let (Some(op), Some(value)) = (parts.next(), parts.next()) else {
                return Err(SeekerError::invalid_filter(field, "expected field:op:value"));
            };
            (field, Some(operator_spec(field, op, value)?))
        }
        _ => {
            return Err(SeekerError::invalid_filter(
                expr,
                "expected field=value or field:op:value",
            ))
        }
    };

    if field.trim().is_empty() {
        return Err(SeekerError::invalid_filter(expr, "missing field name"));
    }
    Ok((field.trim().to_string(), spec))
}

fn operator_spec(field: &str, op: &str, value: &str) -> lexia_seeker::Result<FilterSpec> {
    if op.eq_ignore_ascii_case("in") {
        return Ok(FilterSpec::one_of(value.split(',').map(Scalar::infer)));
    }
    let op = FilterOp::parse(op);
    match op {
        FilterOp::Between => match value.split_once(',') {
            Some((low, high)) => Ok(FilterSpec::between(Scalar::infer(low), Scalar::infer(high))),
            None => Err(SeekerError::invalid_filter(field, "between expects low,high")),
        },
        op if op.is_text_op() => Ok(FilterSpec::op(op, value)),
        op => Ok(FilterSpec::op(op, Scalar::infer(value))),
    }
}
