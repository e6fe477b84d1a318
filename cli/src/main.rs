use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bookshelf_core::{
    BookRecord, ColumnSchema, Field, Filter, SchemaVersion, Sort, SortBy, ViewOptions,
    VolumesResponse, validate_descriptor,
};
use bookshelf_db::{
    Bookshelf, NoAuth, SchemaRegistry, ShelfConfig, ValuesFile, fingerprint, load_descriptor,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(version)]
#[command(about = "Spreadsheet-backed book tracker")]
struct Cli {
    /// Shelf configuration file.
    #[arg(long, global = true, default_value = "bookshelf.yml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect and validate column schemas.
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// List books.
    List(ListArgs),
    /// Add a book.
    Add(AddArgs),
    /// Set one field of a book.
    Set(SetArgs),
    /// Merge a catalog search result into a book.
    Merge(MergeArgs),
    /// Hide a book; `list --all` still shows it.
    Remove(RowArgs),
    /// Export the public entries.
    Publish(PublishArgs),
}

#[derive(Debug, Subcommand)]
enum SchemaCommand {
    /// Print the column layout of a schema.
    Show(ShowArgs),
    /// Check descriptor files for integrity violations.
    Validate(ValidateArgs),
    /// Check that a directory of descriptors evolves append-only.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Built-in schema version (default: the configured schema).
    #[arg(long)]
    version: Option<SchemaVersion>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Descriptor files (JSON or YAML).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Directory holding descriptor files.
    dir: PathBuf,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Case-insensitive search over title, authors, year, genres and comments.
    #[arg(long, default_value = "")]
    query: String,
    /// none, starred, want-to-read or want-to-own.
    #[arg(long, default_value = "none")]
    filter: Filter,
    /// author, title, created, updated, date-read or starred.
    #[arg(long, default_value = "updated")]
    sort: SortBy,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
    /// Include hidden books.
    #[arg(long)]
    all: bool,
    /// Print records as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    /// Authors, separated by ';'.
    #[arg(long)]
    authors: String,
    #[arg(long)]
    year: Option<i32>,
    /// Genres, separated by ';'.
    #[arg(long, default_value = "")]
    genres: String,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Data row of the book.
    row: usize,
    /// Column name, e.g. COMMENTS.
    field: String,
    /// Raw cell value.
    value: String,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Data row of the book.
    row: usize,
    /// Catalog volumes response (JSON).
    #[arg(long)]
    catalog: PathBuf,
    /// Index of the volume to merge.
    #[arg(long, default_value_t = 0)]
    pick: usize,
}

#[derive(Debug, Args)]
struct RowArgs {
    /// Data row of the book.
    row: usize,
}

#[derive(Debug, Args)]
struct PublishArgs {
    /// Output file (default: the configured public output, else stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

type Shelf = Bookshelf<ValuesFile, NoAuth>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Schema(SchemaCommand::Show(args)) => run_schema_show(&cli.config, args),
        Command::Schema(SchemaCommand::Validate(args)) => run_schema_validate(args),
        Command::Schema(SchemaCommand::Check(args)) => run_schema_check(args),
        Command::List(args) => run_list(&cli.config, args),
        Command::Add(args) => run_add(&cli.config, args),
        Command::Set(args) => run_set(&cli.config, args),
        Command::Merge(args) => run_merge(&cli.config, args),
        Command::Remove(args) => run_remove(&cli.config, args),
        Command::Publish(args) => run_publish(&cli.config, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<ShelfConfig, String> {
    ShelfConfig::load(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))
}

fn open_shelf(config: &ShelfConfig) -> Result<Shelf, String> {
    let schema = Arc::new(config.load_schema().map_err(|e| e.to_string())?);
    let values = config
        .sheet
        .values
        .as_ref()
        .ok_or_else(|| "config has no sheet.values file".to_string())?;
    let store = ValuesFile::open_or_create(values, &config.data_range(&schema))
        .map_err(|err| format!("Failed to open '{}': {err}", values.display()))?;
    Bookshelf::load(schema, config.sheet.clone(), NoAuth, store).map_err(|e| e.to_string())
}

fn run_schema_show(config_path: &Path, args: ShowArgs) -> Result<(), String> {
    let schema = match args.version {
        Some(version) => ColumnSchema::builtin(version),
        None if config_path.exists() => load_config(config_path)?
            .load_schema()
            .map_err(|e| e.to_string())?,
        None => ColumnSchema::latest(),
    };

    println!("schema {} ({} columns)", schema.version(), schema.width());
    for field in schema.fields() {
        if let Some(column) = schema.column_of(*field) {
            println!("{:>3}  {field}", column.to_string());
        }
    }
    println!("fingerprint {}", fingerprint(&schema));
    Ok(())
}

fn run_schema_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failures = 0;
    for path in &args.inputs {
        let descriptor = load_descriptor(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let violations = validate_descriptor(&descriptor);
        if violations.is_empty() {
            println!("{}: ok", path.display());
        } else {
            failures += 1;
            for violation in violations {
                println!("{}: {violation}", path.display());
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} descriptor(s) failed validation"));
    }
    println!("Validated {} descriptor(s).", args.inputs.len());
    Ok(())
}

fn run_schema_check(args: CheckArgs) -> Result<(), String> {
    let registry = SchemaRegistry::from_dir(&args.dir).map_err(|e| e.to_string())?;
    let versions: Vec<&str> = registry.versions().collect();
    println!(
        "{} schema version(s) evolve cleanly: {}",
        registry.len(),
        versions.join(", ")
    );
    Ok(())
}

fn run_list(config_path: &Path, args: ListArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let shelf = open_shelf(&config)?;
    let options = ViewOptions {
        query: args.query,
        filter: args.filter,
        sort: Sort {
            by: args.sort,
            desc: args.desc,
        },
        include_hidden: args.all,
    };
    let books = shelf.view(&options);

    if args.json {
        let raw = serde_json::to_string_pretty(&books)
            .map_err(|err| format!("Failed to serialize books: {err}"))?;
        println!("{raw}");
        return Ok(());
    }

    for book in books {
        println!("{}", summary_line(book));
    }
    Ok(())
}

fn summary_line(book: &BookRecord) -> String {
    let row = book.row.map(|r| r.to_string()).unwrap_or_default();
    let star = if book.starred { "*" } else { " " };
    let year = book.cell(Field::Year);
    if year.is_empty() {
        format!("{row:>4} {star} {} by {}", book.title, book.authors)
    } else {
        format!("{row:>4} {star} {} by {} ({year})", book.title, book.authors)
    }
}

fn run_add(config_path: &Path, args: AddArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let mut shelf = open_shelf(&config)?;

    let mut book = BookRecord::new(args.title, args.authors);
    book.year = args.year;
    book.genres = args.genres;
    let added = shelf.add(&book).map_err(|e| e.to_string())?;
    println!("Added {}", summary_line(added).trim_start());
    Ok(())
}

fn run_set(config_path: &Path, args: SetArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let mut shelf = open_shelf(&config)?;

    let updated = shelf
        .update_field(args.row, &args.field, &args.value)
        .map_err(|e| e.to_string())?;
    println!("Updated {}", summary_line(updated).trim_start());
    Ok(())
}

fn run_merge(config_path: &Path, args: MergeArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let raw = fs::read_to_string(&args.catalog)
        .map_err(|err| format!("Failed to read '{}': {err}", args.catalog.display()))?;
    let response = VolumesResponse::from_json(&raw).map_err(|e| e.to_string())?;
    let candidates = response.to_partials();
    let partial = candidates.get(args.pick).ok_or_else(|| {
        format!(
            "catalog result has {} volume(s), cannot pick {}",
            candidates.len(),
            args.pick
        )
    })?;

    let mut shelf = open_shelf(&config)?;
    let changed = shelf
        .get(args.row)
        .map(|book| book.merge_changes(partial))
        .unwrap_or_default();
    let merged = shelf.merge(args.row, partial).map_err(|e| e.to_string())?;
    let names: Vec<&str> = changed.iter().map(|f| f.name()).collect();
    println!("Merged {}", summary_line(merged).trim_start());
    if !names.is_empty() {
        println!("Changed: {}", names.join(", "));
    }
    Ok(())
}

fn run_remove(config_path: &Path, args: RowArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let mut shelf = open_shelf(&config)?;

    let removed = shelf.remove(args.row).map_err(|e| e.to_string())?;
    println!("Removed {} (hidden; list --all still shows it).", removed.title);
    Ok(())
}

fn run_publish(config_path: &Path, args: PublishArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let shelf = open_shelf(&config)?;
    let entries = shelf.public_entries();
    let raw = serde_json::to_string_pretty(&entries)
        .map_err(|err| format!("Failed to serialize public entries: {err}"))?;

    let Some(output) = args.output.or(config.public.output) else {
        println!("{raw}");
        return Ok(());
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(&output, raw)
        .map_err(|err| format!("Failed to write '{}': {err}", output.display()))?;

    match config.public.external_path {
        Some(path) => println!(
            "Published {} book(s) to '{}' (served at /{path}).",
            entries.len(),
            output.display()
        ),
        None => println!(
            "Published {} book(s) to '{}'.",
            entries.len(),
            output.display()
        ),
    }
    Ok(())
}
