/// Compiler driver that orchestrates the compilation pipeline

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use stencil_tree::Tree;

use crate::backend::{self, JavaSrcBackend, JavaSrcOptions, JsSrcBackend, JsSrcOptions, OutputUnit};
use crate::directives::{BackendKind, DirectiveRegistry};
use crate::error::{CompileError, Result};
use crate::msgs::MsgBundle;
use crate::passes::{
    CheckDirectives, CheckOverrides, MarkEscapingSites, MutatingVisitor, PerformAutoescape,
    PrependNamespaces, Visitor,
};
use crate::templates::OverridePolicy;

/// Source language to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    JsSrc,
    JavaSrc,
}

impl Target {
    pub fn backend_kind(self) -> BackendKind {
        match self {
            Target::JsSrc => BackendKind::JsSrc,
            Target::JavaSrc => BackendKind::JavaSrc,
        }
    }
}

/// Compilation output structure
#[derive(Debug)]
pub struct CompileOutput {
    /// File-set description that was compiled
    pub source_file: PathBuf,
    /// One unit per input file, in file-set order
    pub units: Vec<OutputUnit>,
}

/// Options for compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// JSON file-set description
    pub input: PathBuf,
    pub target: Target,
    /// Message bundle to translate with
    pub bundle: Option<PathBuf>,
    /// `1` ltr, `-1` rtl, `0` to derive from the bundle's locale
    pub bidi_global_dir: i32,
    pub override_policy: OverridePolicy,
    /// Java package for generated classes
    pub java_package: Option<String>,
    /// Emit JavaScript namespace guards
    pub declare_namespaces: bool,
    /// Output directory (optional, defaults to ./out)
    pub output_dir: Option<PathBuf>,
    /// Whether to log each pipeline step
    pub verbose: bool,
}

impl CompileOptions {
    pub fn new(input: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            input: input.into(),
            target,
            bundle: None,
            bidi_global_dir: 0,
            override_policy: OverridePolicy::default(),
            java_package: None,
            declare_namespaces: true,
            output_dir: None,
            verbose: false,
        }
    }

    pub fn bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle = Some(path.into());
        self
    }

    pub fn bidi_global_dir(mut self, dir: i32) -> Self {
        self.bidi_global_dir = dir;
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    pub fn java_package(mut self, package: impl Into<String>) -> Self {
        self.java_package = Some(package.into());
        self
    }

    pub fn declare_namespaces(mut self, declare: bool) -> Self {
        self.declare_namespaces = declare;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Run the passes every backend relies on, in order: namespace resolution,
/// override checking, directive checking, escaping-site analysis and
/// auto-escaping.
///
/// With `backend` set, directives lacking a realization for it are rejected
/// here rather than during emission.
pub fn prepare_tree(
    tree: &mut Tree,
    registry: &DirectiveRegistry,
    backend: Option<BackendKind>,
) -> Result<()> {
    let span = tracing::debug_span!("front_passes", nodes = tree.len());
    let _enter = span.enter();

    PrependNamespaces::new().exec(tree)?;
    CheckOverrides::new().exec(tree)?;

    let mut check = CheckDirectives::new(registry);
    if let Some(backend) = backend {
        check = check.for_backend(backend);
    }
    check.exec(tree)?;

    MarkEscapingSites::new().exec(tree)?;
    let mut autoescape = PerformAutoescape::new(registry);
    autoescape.exec(tree)?;
    tracing::debug!(inserted = autoescape.inserted(), "auto-escaping applied");
    Ok(())
}

/// The stencil compiler
pub struct Compiler {
    options: CompileOptions,
    registry: DirectiveRegistry,
}

impl Compiler {
    /// Create a compiler using the built-in directives
    pub fn new(options: CompileOptions) -> Self {
        Self::with_registry(options, DirectiveRegistry::with_basic_directives())
    }

    pub fn with_registry(options: CompileOptions, registry: DirectiveRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Load the input file set and run the full pipeline
    pub fn compile(&self) -> Result<CompileOutput> {
        tracing::info!(input = %self.options.input.display(), "compiling");
        let tree = stencil_tree::load_file(&self.options.input)?;
        if self.options.verbose {
            tracing::info!(
                files = tree.files().len(),
                nodes = tree.len(),
                "loaded file set"
            );
        }

        let units = self.compile_tree(tree)?;
        Ok(CompileOutput {
            source_file: self.options.input.clone(),
            units,
        })
    }

    /// Run the pipeline over an already built tree
    pub fn compile_tree(&self, mut tree: Tree) -> Result<Vec<OutputUnit>> {
        let bundle = self.load_bundle()?;
        prepare_tree(&mut tree, &self.registry, Some(self.options.target.backend_kind()))?;

        let units = match self.options.target {
            Target::JsSrc => {
                let options = JsSrcOptions::new()
                    .bidi_global_dir(self.options.bidi_global_dir)
                    .should_declare_namespaces(self.options.declare_namespaces)
                    .override_policy(self.options.override_policy);
                let backend = JsSrcBackend::with_registry(options, self.registry.clone());
                backend::generate(&backend, &mut tree, bundle)?
            }
            Target::JavaSrc => {
                let mut options = JavaSrcOptions::new()
                    .bidi_global_dir(self.options.bidi_global_dir)
                    .override_policy(self.options.override_policy);
                if let Some(package) = &self.options.java_package {
                    options = options.package(package.clone());
                }
                let backend = JavaSrcBackend::with_registry(options, self.registry.clone());
                backend::generate(&backend, &mut tree, bundle)?
            }
        };

        if self.options.verbose {
            let bytes: usize = units.iter().map(|u| u.code.len()).sum();
            tracing::info!(units = units.len(), bytes, "code generation successful");
        }
        Ok(units)
    }

    /// Write every unit into the output directory, returning the written paths.
    ///
    /// Fails before writing anything if two units map to the same path.
    pub fn write_output(&self, output: &CompileOutput) -> Result<Vec<PathBuf>> {
        let dir = self
            .options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("out"));

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for unit in &output.units {
            if let Some(first) = seen.insert(&unit.file_name, &unit.source_path) {
                return Err(CompileError::DuplicateOutput {
                    path: unit.file_name.clone(),
                    first_source: first.to_string(),
                    second_source: unit.source_path.clone(),
                });
            }
        }

        let mut written = Vec::with_capacity(output.units.len());
        for unit in &output.units {
            let path = dir.join(&unit.file_name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &unit.code)?;
            tracing::debug!(path = %path.display(), "wrote output unit");
            written.push(path);
        }
        Ok(written)
    }

    fn load_bundle(&self) -> Result<Option<Arc<MsgBundle>>> {
        match &self.options.bundle {
            Some(path) => {
                let bundle = MsgBundle::load(path)?;
                tracing::debug!(
                    locale = bundle.locale(),
                    messages = bundle.len(),
                    "loaded message bundle"
                );
                Ok(Some(Arc::new(bundle)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_tree::{DirectiveCall, Expr, NodeKind};

    fn tree_with_print(directives: Vec<DirectiveCall>) -> (Tree, stencil_tree::NodeRef) {
        let mut tree = Tree::new();
        let root = tree.root();
        let f = tree
            .add(root, NodeKind::File { path: "a.stn".into(), namespace: "app".into() })
            .unwrap();
        let t = tree.add(f, NodeKind::template(".main")).unwrap();
        let print = tree
            .add(
                t,
                NodeKind::Print {
                    expr: Expr::data("url"),
                    directives,
                    escape: None,
                },
            )
            .unwrap();
        (tree, print)
    }

    #[test]
    fn test_prepare_tree_escapes_and_qualifies() {
        let (mut tree, print) = tree_with_print(vec![]);
        let registry = DirectiveRegistry::with_basic_directives();
        prepare_tree(&mut tree, &registry, None).unwrap();

        assert_eq!(tree.to_source_string(print), "{$url |escapeHtml}");
        assert!(tree.to_source_string(tree.root()).contains("{template app.main}"));
    }

    #[test]
    fn test_prepare_tree_rejects_unsupported_directive() {
        let (mut tree, _) = tree_with_print(vec![DirectiveCall::with_args(
            "|truncate",
            vec![Expr::Number(4.0)],
        )]);
        let registry = DirectiveRegistry::with_basic_directives();
        let err = prepare_tree(&mut tree, &registry, Some(BackendKind::JavaSrc)).unwrap_err();
        assert!(matches!(
            err,
            crate::CompileError::UnsupportedDirectiveForBackend { ref directive, .. } if directive == "|truncate"
        ));
    }

    #[test]
    fn test_options_builder() {
        let options = CompileOptions::new("set.json", Target::JavaSrc)
            .bidi_global_dir(-1)
            .java_package("gen")
            .verbose(true);
        assert_eq!(options.bidi_global_dir, -1);
        assert_eq!(options.java_package.as_deref(), Some("gen"));
        assert!(options.declare_namespaces);
        assert_eq!(options.override_policy, OverridePolicy::KeepLast);
    }
}
