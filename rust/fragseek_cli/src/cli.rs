use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Protein database, FASTA or NDJSON (repeatable, will over-write the config file)
    #[arg(short, long)]
    pub fasta: Vec<PathBuf>,

    /// Path to the MGF file with the spectra (will over-write the config file)
    #[arg(short, long)]
    pub spectra: Option<PathBuf>,

    /// Path to the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Always build the index, neither reading nor writing the cache
    #[arg(long)]
    pub no_cache: bool,
}
