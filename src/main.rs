mod escape;
use anyhow::{bail, Context, Result};
use escape::Escape;
use itertools::Itertools;
use std::path::{Component, Path, PathBuf};
use structopt::StructOpt;
use text_annotate::manifest::Manifest;

#[derive(StructOpt, Debug)]
#[structopt(name = "text-annotate")]
struct Args {
    #[structopt(long, parse(from_os_str))]
    /// JSON manifest listing the annotations of each file, relative to the manifest
    annotations: PathBuf,
    #[structopt(long, default_value = "html")]
    /// how literal text is written: html or none
    escape: Escape,
    #[structopt(long, default_value = "annotated", parse(from_os_str))]
    /// directory receiving the annotated files
    out_dir: PathBuf,
    #[structopt(short = "m", long = "match", default_value = "")]
    /// only annotate files whose name contains this string
    filter: String,
    #[structopt(short, long)]
    /// verbose logging
    verbose: bool,
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("text_annotate=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// manifest keys must stay inside the manifest and output directories
fn relative_name(file: &str) -> Result<&Path> {
    let path = Path::new(file);
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        bail!("manifest entry {file:?} must be a relative path without `..`");
    }
    Ok(path)
}

// annotate one file from the manifest and write it under out_dir
fn annotate_file(args: &Args, base: &Path, manifest: &Manifest, file: &str) -> Result<PathBuf> {
    relative_name(file)?;
    let anns = manifest.annotations(file).unwrap_or_default();
    let source = std::fs::read_to_string(base.join(file))
        .with_context(|| format!("failed to read {:?}", base.join(file)))?;
    let markedup = args
        .escape
        .annotate(&source, &anns)
        .with_context(|| format!("failed to annotate {file}"))?;
    let file_name = args.out_dir.join(format!("{}{}", file, args.escape.extension()));
    if let Some(p) = file_name.parent() {
        if !p.exists() {
            std::fs::create_dir_all(p).with_context(|| format!("failed to create {p:?}"))?;
        }
    }
    std::fs::write(&file_name, markedup).with_context(|| format!("failed to write {file_name:?}"))?;
    println!("Annotated {} range(s) into {:?}", anns.len(), &file_name);
    Ok(file_name)
}

// annotate every selected file of the manifest, returning the written paths
fn run(args: &Args) -> Result<Vec<PathBuf>> {
    let manifest = Manifest::load(&args.annotations)
        .with_context(|| format!("failed to load {:?}", args.annotations))?;
    let base = args
        .annotations
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut written = Vec::new();
    for file in manifest.files().filter(|f| f.contains(&args.filter)).sorted() {
        tracing::debug!(file, "annotating");
        written.push(annotate_file(args, &base, &manifest, file)?);
    }
    Ok(written)
}

fn main() -> Result<()> {
    let args = Args::from_args();
    setup_tracing(args.verbose);
    let written = run(&args)?;
    println!("There are {} annotated file(s) in {:?}.", written.len(), args.out_dir);
    Ok(())
}
