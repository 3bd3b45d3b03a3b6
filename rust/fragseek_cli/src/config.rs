use fragseek::digestion::{
    DigestionParameters,
    InitiatorMethionineBehavior,
    MAX_PEPTIDE_LENGTH,
    MIN_PEPTIDE_LENGTH,
    Protease,
};
use fragseek::fragment_mass::{
    DEFAULT_MAX_FRAGMENT_MASS,
    IonType,
};
use fragseek::indexing::DEFAULT_MAX_ISOFORMS;
use fragseek::scoring::{
    DEFAULT_MAX_PEAKS,
    MassTolerance,
};
use fragseek::{
    IndexingParameters,
    SearchMode,
    SearchParameters,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub digestion: DigestionConfig,
    #[serde(default)]
    pub modifications: Vec<ModificationListConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    pub output: Option<OutputConfig>,
    pub cache_directory: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct InputConfig {
    #[serde(default)]
    pub databases: Vec<PathBuf>,
    pub spectra: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DigestionConfig {
    pub protease: String,
    pub max_missed_cleavages: usize,
    pub initiator_methionine: InitiatorMethionineBehavior,
    pub max_isoforms: usize,
    pub min_peptide_length: usize,
    pub max_peptide_length: usize,
    pub build_decoys: bool,
}

impl Default for DigestionConfig {
    fn default() -> Self {
        Self {
            protease: "trypsin".to_string(),
            max_missed_cleavages: 2,
            initiator_methionine: InitiatorMethionineBehavior::Variable,
            max_isoforms: DEFAULT_MAX_ISOFORMS,
            min_peptide_length: MIN_PEPTIDE_LENGTH,
            max_peptide_length: MAX_PEPTIDE_LENGTH,
            build_decoys: true,
        }
    }
}

/// A modification list file and what it is used for.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModificationListConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub variable: bool,
    #[serde(default)]
    pub localize: bool,
}

fn default_search_modes() -> Vec<SearchMode> {
    vec![SearchMode::within_half_dalton(), SearchMode::open()]
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub fragment_tolerance: MassTolerance,
    pub max_peaks: usize,
    pub ion_types: Vec<IonType>,
    pub max_fragment_mass: f64,
    pub search_modes: Vec<SearchMode>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fragment_tolerance: MassTolerance::default(),
            max_peaks: DEFAULT_MAX_PEAKS,
            ion_types: vec![IonType::B, IonType::Y],
            max_fragment_mass: DEFAULT_MAX_FRAGMENT_MASS,
            search_modes: default_search_modes(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, CliError> {
        let file = std::fs::File::open(path).map_err(|e| CliError::io(e, path))?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Command line arguments take precedence over the config file.
    pub fn with_cli_args(mut self, args: &Cli) -> Result<Self, CliError> {
        if !args.fasta.is_empty() {
            self.input.databases = args.fasta.clone();
        }
        if let Some(spectra) = &args.spectra {
            self.input.spectra = Some(spectra.clone());
        }
        if let Some(output_dir) = &args.output_dir {
            self.output = Some(OutputConfig {
                directory: output_dir.clone(),
            });
        }

        if self.input.databases.is_empty() {
            return Err(CliError::Config {
                source: "No protein database provided, please provide one in either the config file or with the --fasta flag".to_string(),
            });
        }
        if self.input.spectra.is_none() {
            return Err(CliError::Config {
                source: "No spectra provided, please provide them in either the config file or with the --spectra flag".to_string(),
            });
        }
        if self.output.is_none() {
            return Err(CliError::Config {
                source: "No output directory provided, please provide one in either the config file or with the --output-dir flag".to_string(),
            });
        }
        Ok(self)
    }

    pub fn indexing_parameters(&self) -> Result<IndexingParameters, CliError> {
        let protease: Protease = self.digestion.protease.parse()?;
        let params = IndexingParameters {
            digestion: DigestionParameters {
                protease,
                max_missed_cleavages: self.digestion.max_missed_cleavages,
                initiator_methionine: self.digestion.initiator_methionine,
                min_peptide_length: self.digestion.min_peptide_length,
                max_peptide_length: self.digestion.max_peptide_length,
            },
            max_isoforms: self.digestion.max_isoforms,
            ion_types: self.search.ion_types.clone(),
            max_fragment_mass: self.search.max_fragment_mass,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn search_parameters(&self) -> SearchParameters {
        SearchParameters {
            fragment_tolerance: self.search.fragment_tolerance,
            max_peaks: self.search.max_peaks,
        }
    }
}
