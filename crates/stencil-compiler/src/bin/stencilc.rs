/// Stencil compiler CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stencil_compiler::{CompileOptions, Compiler, OverridePolicy, Target};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Js,
    Java,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverrideArg {
    First,
    Last,
}

#[derive(Parser, Debug)]
#[command(name = "stencilc")]
#[command(about = "Stencil compiler - generates JavaScript or Java from stencil template trees")]
#[command(version)]
struct Args {
    /// JSON file-set description
    #[arg(value_name = "TREE")]
    input: PathBuf,

    /// Target language
    #[arg(short, long, value_enum, default_value = "js")]
    backend: BackendArg,

    /// Message bundle (JSON) to translate with
    #[arg(long, value_name = "FILE")]
    bundle: Option<PathBuf>,

    /// Global text direction: 1 (ltr), -1 (rtl) or 0 (from the bundle's locale)
    #[arg(long, value_name = "N", default_value_t = 0, allow_hyphen_values = true)]
    bidi_dir: i32,

    /// Which definition of an overridden template wins
    #[arg(long, value_enum, default_value = "last")]
    overrides: OverrideArg,

    /// Java package for generated classes
    #[arg(long, value_name = "PACKAGE")]
    package: Option<String>,

    /// Output directory for generated files (prints to stdout when absent)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the loaded tree and exit (debug mode)
    #[arg(long)]
    dump_tree: bool,
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

    if args.dump_tree {
        let tree = stencil_tree::load_file(&args.input)
            .with_context(|| format!("failed to load {}", args.input.display()))?;
        print!("{}", stencil_tree::dump_tree(&tree, tree.root()));
        return Ok(());
    }

    let target = match args.backend {
        BackendArg::Js => Target::JsSrc,
        BackendArg::Java => Target::JavaSrc,
    };
    let policy = match args.overrides {
        OverrideArg::First => OverridePolicy::KeepFirst,
        OverrideArg::Last => OverridePolicy::KeepLast,
    };

    let mut options = CompileOptions::new(&args.input, target)
        .bidi_global_dir(args.bidi_dir)
        .override_policy(policy)
        .verbose(args.verbose);
    if let Some(bundle) = args.bundle {
        options = options.bundle(bundle);
    }
    if let Some(package) = args.package {
        options = options.java_package(package);
    }
    if let Some(output) = &args.output {
        options = options.output_dir(output);
    }

    let compiler = Compiler::new(options);
    let output = compiler
        .compile()
        .with_context(|| format!("compilation of {} failed", args.input.display()))?;

    if args.output.is_some() {
        let written = compiler.write_output(&output)?;
        for path in written {
            tracing::info!(path = %path.display(), "wrote");
        }
    } else {
        for unit in &output.units {
            println!("// ---- {} ----", unit.file_name);
            print!("{}", unit.code);
        }
    }
    Ok(())
}
