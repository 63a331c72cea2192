use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vizdeck", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every stale page and update the build manifest.
    Build(BuildArgs),
    /// Render selected pages to preview JSON without touching the manifest.
    Preview(PreviewArgs),
    /// Print the resolved content tree of each page.
    Tree(TreeArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Project JSON file.
    #[arg(long)]
    project: PathBuf,

    /// Rebuild every page regardless of the manifest.
    #[arg(long)]
    no_incremental: bool,

    /// Render stale pages in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel` (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Output directory (overrides the project's `output.out_dir`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Manifest path (overrides the project's `output.manifest`).
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Project JSON file.
    #[arg(long)]
    project: PathBuf,

    /// Page ids to preview (default: all pages).
    #[arg(long = "page")]
    pages: Vec<String>,

    /// Output directory for `<id>.preview.json` files.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TreeArgs {
    /// Project JSON file.
    #[arg(long)]
    project: PathBuf,

    /// Only print this page.
    #[arg(long)]
    page: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Tree(args) => cmd_tree(args),
    }
}

fn load_project(path: &Path) -> anyhow::Result<vizdeck::ProjectDef> {
    vizdeck::ProjectDef::from_path(path)
        .with_context(|| format!("load project '{}'", path.display()))
}

fn default_out_dir(project_path: &Path, def: &vizdeck::ProjectDef) -> PathBuf {
    def.out_dir().unwrap_or_else(|| {
        project_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("_vizdeck")
    })
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let def = load_project(&args.project)?;
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| default_out_dir(&args.project, &def));
    let manifest_path = args
        .manifest
        .clone()
        .or_else(|| def.manifest_path())
        .unwrap_or_else(|| out_dir.join(".vizdeck-manifest.json"));
    let dashboard = def.into_dashboard().context("build dashboard")?;

    let mut manifest = vizdeck::BuildManifest::load_or_reset(&manifest_path);
    let backend = vizdeck::MarkdownBackend::new(&out_dir);
    let opts = vizdeck::GenerateOpts {
        incremental: !args.no_incremental,
        parallel: args.parallel,
        threads: args.threads,
        cancel: None,
    };
    let summary = vizdeck::generate(
        &dashboard,
        &vizdeck::RendererRegistry::builtin(),
        &backend,
        &mut manifest,
        &opts,
    )?;

    println!("{summary}");
    let failed = summary.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} page(s) failed");
    }
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let def = load_project(&args.project)?;
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| default_out_dir(&args.project, &def).join("preview"));
    let dashboard = def.into_dashboard().context("build dashboard")?;

    let summary = vizdeck::preview(
        &dashboard,
        &vizdeck::RendererRegistry::builtin(),
        &args.pages,
        &out_dir,
    )?;
    println!("{summary}");
    let failed = summary.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} page(s) failed");
    }
    Ok(())
}

fn cmd_tree(args: TreeArgs) -> anyhow::Result<()> {
    let dashboard = load_project(&args.project)?
        .into_dashboard()
        .context("build dashboard")?;

    let pages: Vec<&vizdeck::Page> = match &args.page {
        Some(id) => vec![
            dashboard
                .page_by_id(id)
                .with_context(|| format!("no page with id '{id}'"))?,
        ],
        None => dashboard.pages().iter().collect(),
    };
    for page in pages {
        let tree = vizdeck::build_page_tree(page);
        let heading = format!("{} ({})", page.title(), page.id());
        print!(
            "{}",
            vizdeck::render_tree_text(&heading, &tree.root, &tree.labels, vizdeck::describe)
        );
        for e in &tree.errors {
            println!("  ! {e}");
        }
    }
    Ok(())
}
