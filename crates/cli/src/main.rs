use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use cwl_inspector_engine::{Document, InspectOptions, inspect};
use cwl_inspector_types::{RuntimeParams, Settings};
use cwl_inspector_util::expand_tilde;
use tracing::debug;

mod output;
mod params;

use output::{OutputFormat, render};
use params::collect_args;

/// Environment variable naming the Node.js executable used for script expressions.
const NODEJS_ENV: &str = "CWL_INSPECTOR_NODEJS";

/// Inspect CWL tool and workflow descriptions.
///
/// QUERY is a root path (`.inputs.x.label`), `keys(.path)`, `commandline`,
/// `commandline(step)`, or `ls(.outputs.x)`. Input values follow as
/// `name=value` or `--name value`; use `--` before them when they start with `--`.
#[derive(Parser, Debug)]
#[command(name = "cwl-inspector", version, about)]
struct Args {
    /// Document to inspect, or `-` to read it from standard input
    document: Option<String>,

    /// Query to evaluate
    query: Option<String>,

    /// Input parameter values
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    params: Vec<String>,

    /// Print the result in YAML format
    #[arg(long)]
    yaml: bool,

    /// Path to nodejs for InlineJavascriptRequirement
    #[arg(long = "nodejs-bin", value_name = "NODE")]
    nodejs_bin: Option<String>,

    /// Directory for outputs
    #[arg(long = "runtime.outdir", value_name = "DIR")]
    outdir: Option<String>,

    /// Directory for temporary files
    #[arg(long = "runtime.tmpdir", value_name = "DIR")]
    tmpdir: Option<String>,

    /// Input parameters file (YAML or JSON)
    #[arg(short = 'i', value_name = "YML")]
    input: Option<String>,
}

impl Args {
    /// Moves declared options that follow the first inline parameter out of
    /// `params`, where the trailing capture would otherwise keep them.
    /// Everything after a literal `--` stays an inline parameter.
    fn reclaim_trailing_options(&mut self) -> Result<()> {
        let mut params = Vec::new();
        let mut tokens = std::mem::take(&mut self.params).into_iter();

        while let Some(token) = tokens.next() {
            if token == "--" {
                params.extend(tokens.by_ref());
                break;
            }
            let (flag, attached) = match token.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (token.as_str(), None),
            };
            let slot = match flag {
                "--yaml" if attached.is_none() => {
                    self.yaml = true;
                    continue;
                }
                "--nodejs-bin" => &mut self.nodejs_bin,
                "--runtime.outdir" => &mut self.outdir,
                "--runtime.tmpdir" => &mut self.tmpdir,
                "-i" => &mut self.input,
                _ => {
                    params.push(token.clone());
                    continue;
                }
            };
            let value = match attached {
                Some(value) => value,
                None => tokens.next().with_context(|| format!("{flag} requires a value"))?,
            };
            if slot.replace(value).is_some() {
                bail!("{flag} was given more than once");
            }
        }

        self.params = params;
        Ok(())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let mut args = Args::parse();
    args.reclaim_trailing_options()?;

    let (Some(document_path), Some(query)) = (args.document.as_deref(), args.query.as_deref()) else {
        Args::command().print_help()?;
        return Ok(());
    };

    let params_file = args.input.as_deref().map(expand_tilde);
    let settings = Settings::new(
        RuntimeParams {
            outdir: args.outdir.as_deref().map(expand_path),
            tmpdir: args.tmpdir.as_deref().map(expand_path),
        },
        collect_args(&args.params, params_file.as_deref())?,
    );
    let options = InspectOptions {
        script_engine: script_engine_path(args.nodejs_bin.as_deref()),
        ..InspectOptions::default()
    };
    debug!(?settings, ?options, "evaluating query");

    let document = load_document(document_path)?;
    let result = inspect(&document, query, &settings, &options)?;

    let format = if args.yaml { OutputFormat::Yaml } else { OutputFormat::Plain };
    println!("{}", render(&result, format)?);
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn load_document(path: &str) -> Result<Document> {
    if path == "-" {
        return Document::from_reader(io::stdin().lock(), ".").context("failed to load document from standard input");
    }
    Document::from_path(expand_tilde(path)).with_context(|| format!("failed to load document {path}"))
}

fn expand_path(raw: &str) -> String {
    expand_tilde(raw).to_string_lossy().into_owned()
}

/// The `--nodejs-bin` flag wins over the environment; `None` searches `PATH`.
fn script_engine_path(flag: Option<&str>) -> Option<PathBuf> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(NODEJS_ENV).ok().filter(|value| !value.is_empty()))
        .map(|raw| expand_tilde(&raw))
}
