use std::fs;
use std::path::{Path, PathBuf};

use asdl_schema_core::{Module, Node, NodeKind, Version, Visitor, merge, validate_module};
use asdl_schema_emit::{
    DumpFormat, EmitConfig, EmitError, GraphQlGenerator, PythonGenerator, SchemaFormat,
    SourceInput, StubGenerator, dump, format_module, generated_header,
};
use asdl_schema_parser::{load_versioned, parse};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{debug, info};

const TOOL_NAME: &str = "asdlgen";

/// CLI-specific model output format with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliSchemaFormat {
    Json,
    Yaml,
    Asdl,
}

impl From<CliSchemaFormat> for SchemaFormat {
    fn from(fmt: CliSchemaFormat) -> Self {
        match fmt {
            CliSchemaFormat::Json => Self::Json,
            CliSchemaFormat::Yaml => Self::Yaml,
            CliSchemaFormat::Asdl => Self::Asdl,
        }
    }
}

/// CLI-specific merge output format.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDumpFormat {
    Json,
    Yaml,
}

impl From<CliDumpFormat> for DumpFormat {
    fn from(fmt: CliDumpFormat) -> Self {
        match fmt {
            CliDumpFormat::Json => Self::Json,
            CliDumpFormat::Yaml => Self::Yaml,
        }
    }
}

/// Code generation targets for a single schema.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Target {
    Python,
    Graphql,
}

#[derive(Debug, Parser)]
#[command(name = "asdlgen")]
#[command(about = "Parse, validate, merge and generate code from ASDL schemas")]
struct Cli {
    /// Enable debug logging on stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a schema and print its model.
    Parse(ParseArgs),
    /// Parse and validate one or more schemas.
    Check(CheckArgs),
    /// List the nodes of a schema.
    Outline(OutlineArgs),
    /// Generate Python dataclasses or GraphQL SDL from one schema.
    Generate(GenerateArgs),
    /// Merge version-tagged schemas and print the merged model.
    Merge(MergeArgs),
    /// Generate a typing stub covering every version of version-tagged schemas.
    Stub(StubArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Schema file.
    input: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliSchemaFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct OutlineArgs {
    /// Schema file.
    input: PathBuf,
    /// Only list nodes of this kind (module, type, sum, product, constructor, field).
    #[arg(long)]
    kind: Option<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Schema file.
    input: PathBuf,
    /// Output language.
    #[arg(long)]
    target: Target,
    /// Give optional and sequence dataclass fields default values.
    #[arg(long)]
    with_defaults: bool,
    /// Output path (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// YAML emitter configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Version-tagged schema files, in any order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliDumpFormat,
}

#[derive(Debug, Args)]
struct StubArgs {
    /// Version-tagged schema files, in any order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output path (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// YAML emitter configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Check(args) => run_check(args),
        Command::Outline(args) => run_outline(args),
        Command::Generate(args) => run_generate(args),
        Command::Merge(args) => run_merge(args),
        Command::Stub(args) => run_stub(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Installs a stderr subscriber when `RUST_LOG` is set or `--verbose` is passed.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let source = read_source(&args.input)?;
    let module = parse_source(&args.input, &source)?;
    let output = format_module(&module, args.format.into()).map_err(|e| e.to_string())?;
    print!("{}", with_trailing_newline(output));
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let results: Vec<Result<Module, String>> = args
        .inputs
        .par_iter()
        .map(|path| {
            let source = read_source(path)?;
            parse_source(path, &source)
        })
        .collect();

    let mut failed = 0;
    for (path, result) in args.inputs.iter().zip(results) {
        let module = match result {
            Ok(module) => module,
            Err(err) => {
                eprintln!("{err}");
                failed += 1;
                continue;
            }
        };
        let errors = validate_module(&module);
        if errors.is_empty() {
            println!("{}: ok ({} type(s))", path.display(), module.body.len());
        } else {
            for error in &errors {
                eprintln!("{}: {error}", path.display());
            }
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} of {} schema file(s) failed validation",
            args.inputs.len()
        ));
    }
    println!("Validated {} schema file(s).", args.inputs.len());
    Ok(())
}

fn run_outline(args: OutlineArgs) -> Result<(), String> {
    let kind = args
        .kind
        .as_deref()
        .map(str::parse::<NodeKind>)
        .transpose()
        .map_err(|e| e.to_string())?;
    let source = read_source(&args.input)?;
    let module = parse_source(&args.input, &source)?;

    let mut outline = Outline::default();
    outline.visit_module(&module, &0);
    for entry in outline.entries {
        match kind {
            Some(wanted) if entry.kind != wanted => {}
            Some(_) => println!("{}", entry.label),
            None => println!("{}{} {}", "  ".repeat(entry.depth), entry.kind, entry.label),
        }
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let mut config = load_config(args.config.as_deref())?;
    if args.with_defaults {
        config.with_defaults = true;
    }

    let source = read_source(&args.input)?;
    let module = parse_source(&args.input, &source)?;
    let errors = validate_module(&module);
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(format!(
            "'{}' is invalid: {}",
            args.input.display(),
            messages.join("; ")
        ));
    }

    let body = match args.target {
        Target::Python => PythonGenerator::new(&config).generate(&module),
        Target::Graphql => GraphQlGenerator.generate(&module),
    };
    let name = display_name(&args.input);
    let inputs = [SourceInput {
        name: &name,
        text: &source,
    }];
    write_output(args.output.as_deref(), &stamp(&config, &inputs, body))
}

fn run_merge(args: MergeArgs) -> Result<(), String> {
    let snapshots = load_snapshots(&args.inputs)?;
    let merged = merge(snapshots.into_iter().map(|snapshot| (snapshot.version, snapshot.module)))
        .map_err(|e| EmitError::from(e).to_string())?;
    let output = dump(&merged, args.format.into()).map_err(|e| e.to_string())?;
    print!("{}", with_trailing_newline(output));
    Ok(())
}

fn run_stub(args: StubArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let snapshots = load_snapshots(&args.inputs)?;

    let names: Vec<String> = snapshots
        .iter()
        .map(|snapshot| display_name(&snapshot.path))
        .collect();
    let inputs: Vec<SourceInput<'_>> = snapshots
        .iter()
        .zip(&names)
        .map(|(snapshot, name)| SourceInput {
            name,
            text: &snapshot.source,
        })
        .collect();

    let merged = merge(
        snapshots
            .iter()
            .map(|snapshot| (snapshot.version.clone(), snapshot.module.clone())),
    )
    .map_err(|e| EmitError::from(e).to_string())?;
    let body = StubGenerator::new(&config).generate(&merged);
    write_output(args.output.as_deref(), &stamp(&config, &inputs, body))
}

// ---------------------------------------------------------------------------
// loading
// ---------------------------------------------------------------------------

/// A version-tagged schema file.
struct Snapshot {
    path: PathBuf,
    source: String,
    version: Version,
    module: Module,
}

/// Loads snapshot files in parallel, preserving argument order.
fn load_snapshots(paths: &[PathBuf]) -> Result<Vec<Snapshot>, String> {
    let snapshots: Vec<Snapshot> = paths
        .par_iter()
        .map(|path| {
            let source = read_source(path)?;
            let (version, module) = load_versioned(&source, &display_name(path))
                .map_err(|e| EmitError::from(e).to_string())?;
            debug!(file = %path.display(), %version, "Loaded snapshot");
            Ok(Snapshot {
                path: path.clone(),
                source,
                version,
                module,
            })
        })
        .collect::<Result<_, String>>()?;
    info!(files = snapshots.len(), "Loaded versioned snapshots");
    Ok(snapshots)
}

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}

fn parse_source(path: &Path, source: &str) -> Result<Module, String> {
    parse(source, &display_name(path)).map_err(|e| e.to_string())
}

fn load_config(path: Option<&Path>) -> Result<EmitConfig, String> {
    match path {
        Some(path) => EmitConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(EmitConfig::default()),
    }
}

/// File name used in diagnostics and headers.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

/// Prefixes `body` with the `@generated` header when enabled.
fn stamp(config: &EmitConfig, inputs: &[SourceInput<'_>], body: String) -> String {
    if !config.header {
        return body;
    }
    let mut out = generated_header("#", TOOL_NAME, inputs);
    out.push('\n');
    out.push_str(&body);
    out
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), String> {
    let Some(path) = path else {
        print!("{content}");
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(path, content)
        .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
    println!("Wrote '{}'.", path.display());
    Ok(())
}

fn with_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// outline
// ---------------------------------------------------------------------------

struct OutlineEntry {
    depth: usize,
    kind: NodeKind,
    label: String,
}

/// Records every node with its nesting depth, in traversal order.
#[derive(Default)]
struct Outline {
    entries: Vec<OutlineEntry>,
}

impl<'ast> Visitor<'ast> for Outline {
    type Output = ();
    /// Nesting depth.
    type Context = usize;

    fn generic_visit(&mut self, node: Node<'ast>, depth: &usize) {
        let label = match node {
            Node::Field(field) => field.to_string(),
            _ => node.name().unwrap_or_default().to_string(),
        };
        self.entries.push(OutlineEntry {
            depth: *depth,
            kind: node.kind(),
            label,
        });
        for child in node.children() {
            self.visit(child, &(depth + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_records_depth_and_labels() {
        let module = parse(
            "module M { expr = Name(identifier id) attributes (int lineno) }",
            "m.asdl",
        )
        .unwrap();
        let mut outline = Outline::default();
        outline.visit_module(&module, &0);

        let rows: Vec<(usize, &str, &str)> = outline
            .entries
            .iter()
            .map(|entry| (entry.depth, entry.kind.name(), entry.label.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "module", "M"),
                (1, "type", "expr"),
                (2, "sum", ""),
                (3, "constructor", "Name"),
                (4, "field", "identifier id"),
                (3, "field", "int lineno"),
            ]
        );
    }

    #[test]
    fn test_stamp_respects_header_flag() {
        let inputs = [SourceInput {
            name: "a.asdl",
            text: "module A {}",
        }];
        let stamped = stamp(&EmitConfig::default(), &inputs, "body\n".to_string());
        assert!(stamped.starts_with("# @generated by asdlgen from a.asdl\n"));
        assert!(stamped.ends_with("\nbody\n"));

        let config = EmitConfig {
            header: false,
            ..EmitConfig::default()
        };
        assert_eq!(stamp(&config, &inputs, "body\n".to_string()), "body\n");
    }

    #[test]
    fn test_display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("grammars/python-3.8.asdl")), "python-3.8.asdl");
    }

    #[test]
    fn test_with_trailing_newline() {
        assert_eq!(with_trailing_newline("a".to_string()), "a\n");
        assert_eq!(with_trailing_newline("a\n".to_string()), "a\n");
    }
}
