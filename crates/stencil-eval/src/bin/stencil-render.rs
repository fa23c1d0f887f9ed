/// Render a stencil template from the command line

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stencil_compiler::MsgBundle;
use stencil_eval::{InterpreterOptions, Renderer, TemplateData};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stencil-render")]
#[command(about = "Render a stencil template from a JSON file-set description")]
#[command(version)]
struct Args {
    /// JSON file-set description
    #[arg(value_name = "TREE")]
    input: PathBuf,

    /// Template to render: a full name, or a partial name with --namespace
    #[arg(short, long, value_name = "NAME")]
    template: String,

    /// Namespace partial template names are relative to
    #[arg(short, long, value_name = "NS")]
    namespace: Option<String>,

    /// Template data as a JSON object
    #[arg(short, long, value_name = "JSON", default_value = "{}")]
    data: String,

    /// Message bundle (JSON) to translate with
    #[arg(long, value_name = "FILE")]
    bundle: Option<PathBuf>,

    /// Global text direction: 1 (ltr), -1 (rtl) or 0 (from the bundle's locale)
    #[arg(long, value_name = "N", default_value_t = 0, allow_hyphen_values = true)]
    bidi_dir: i32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let tree = stencil_tree::load_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let bundle = match &args.bundle {
        Some(path) => Some(Arc::new(
            MsgBundle::load(path)
                .with_context(|| format!("failed to load bundle {}", path.display()))?,
        )),
        None => None,
    };
    let data = TemplateData::from_json(&args.data).context("invalid --data")?;

    let options = InterpreterOptions::new().bidi_global_dir(args.bidi_dir);
    let renderer = Renderer::new(tree, options)?.for_namespace(args.namespace.as_deref());

    let output = renderer
        .render(&args.template, &data, bundle)
        .with_context(|| format!("failed to render {}", args.template))?;
    println!("{}", output);
    Ok(())
}
