//! veidt CLI – describe structure files and fit baseline models on them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use ndarray::{Array1, Array2};

use veidt::data::filter::labeled_subset;
use veidt::data::loader::{load_structures, save_descriptor};
use veidt::{
    CompositionDescriber, Describer, Descriptor, FitConfig, FracCoordsDescriber, LinearModel,
    MeanModel, Model, Persist, Standardized, Structure, StructureDescriber,
};

#[derive(Parser, Debug)]
#[command(
    name = "veidt",
    version,
    about = "Describe atomic structures and fit models on the descriptors"
)]
struct Cli {
    /// Log at debug level (otherwise RUST_LOG, defaulting to info).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn a structure file into a descriptor table.
    Describe {
        /// Structures (.json or .csv).
        #[arg(short, long)]
        input: PathBuf,

        /// Descriptor table to write (.csv, .json or .parquet).
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        describer: DescriberArgs,
    },

    /// Fit a model on structure descriptors against a numeric property.
    Fit {
        /// Structures (.json or .csv).
        #[arg(short, long)]
        input: PathBuf,

        /// Property to learn, e.g. `energy`.
        #[arg(short, long)]
        target: String,

        #[arg(short, long, value_enum, default_value_t = ModelKind::Linear)]
        model: ModelKind,

        /// JSON file with training options (learning_rate, epochs, l2, tolerance).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to persist the fitted model.
        #[arg(long)]
        save_model: Option<PathBuf>,

        #[command(flatten)]
        describer: DescriberArgs,
    },
}

#[derive(Args, Debug)]
struct DescriberArgs {
    #[arg(short, long, value_enum, default_value_t = DescriberKind::Composition)]
    describer: DescriberKind,

    /// Fixed element columns for the composition describer (learned when omitted).
    #[arg(long, value_delimiter = ',')]
    elements: Vec<String>,

    /// Wrap fractional coordinates into the unit cell.
    #[arg(long)]
    wrap: bool,

    /// Standardize every descriptor column over the input structures.
    #[arg(long)]
    standardize: bool,

    /// Where to persist the fitted describer.
    #[arg(long)]
    save_describer: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DescriberKind {
    FracCoords,
    Composition,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModelKind {
    Mean,
    Linear,
}

impl DescriberArgs {
    fn build(&self) -> StructureDescriber {
        match self.describer {
            DescriberKind::FracCoords => {
                StructureDescriber::FracCoords(FracCoordsDescriber::new(self.wrap))
            }
            DescriberKind::Composition if self.elements.is_empty() => {
                StructureDescriber::Composition(CompositionDescriber::learned())
            }
            DescriberKind::Composition => StructureDescriber::Composition(
                CompositionDescriber::new(self.elements.iter().cloned()),
            ),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Describe {
            input,
            output,
            describer,
        } => describe(&input, &output, &describer),
        Commands::Fit {
            input,
            target,
            model,
            config,
            save_model,
            describer,
        } => fit(&input, &target, model, config.as_deref(), save_model.as_deref(), &describer),
    }
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

fn describe(input: &Path, output: &Path, args: &DescriberArgs) -> Result<()> {
    let structures = load_structures(input)
        .with_context(|| format!("loading structures from {}", input.display()))?;

    let describer = args.build();
    let table = if args.standardize {
        fit_and_describe(Standardized::new(describer), &structures, args.save_describer.as_deref())?
    } else {
        fit_and_describe(describer, &structures, args.save_describer.as_deref())?
    };

    save_descriptor(output, &table)
        .with_context(|| format!("writing descriptor to {}", output.display()))?;
    println!(
        "Wrote {} rows x {} columns ({}) to {}",
        table.n_rows(),
        table.n_cols(),
        table.columns().join(", "),
        output.display()
    );
    Ok(())
}

fn fit_and_describe<D>(
    mut describer: D,
    structures: &[Structure],
    save: Option<&Path>,
) -> Result<Descriptor>
where
    D: Describer<Object = Structure>,
{
    describer.fit(structures, None)?;
    let table = describer.describe_all(structures)?;
    if let Some(path) = save {
        describer
            .save(path)
            .with_context(|| format!("saving describer to {}", path.display()))?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// fit
// ---------------------------------------------------------------------------

fn fit(
    input: &Path,
    target: &str,
    model: ModelKind,
    config: Option<&Path>,
    save_model: Option<&Path>,
    args: &DescriberArgs,
) -> Result<()> {
    let structures = load_structures(input)
        .with_context(|| format!("loading structures from {}", input.display()))?;
    let (labeled, targets) = labeled_subset(&structures, target);
    if labeled.is_empty() {
        bail!("No structure in {} carries a finite '{target}' property", input.display());
    }
    info!("{} of {} structures carry '{target}'", labeled.len(), structures.len());

    let config = match config {
        Some(path) => FitConfig::from_json_file(path)
            .with_context(|| format!("reading fit config {}", path.display()))?,
        None => FitConfig::default(),
    };

    let describer = args.build();
    let save_describer = args.save_describer.as_deref();
    let features = if args.standardize {
        fit_features(Standardized::new(describer), &labeled, &targets, save_describer)?
    } else {
        fit_features(describer, &labeled, &targets, save_describer)?
    };

    match model {
        ModelKind::Mean => train(MeanModel::new(), &features, &targets, &config, save_model),
        ModelKind::Linear => train(LinearModel::new(), &features, &targets, &config, save_model),
    }
}

fn fit_features<D>(
    mut describer: D,
    structures: &[Structure],
    targets: &Array1<f64>,
    save: Option<&Path>,
) -> Result<Array2<f64>>
where
    D: Describer<Object = Structure>,
{
    let targets = targets.to_vec();
    let features = describer.fit_transform(structures, Some(&targets))?;
    if features.nrows() != targets.len() {
        bail!(
            "{} produced {} rows for {} structures; fitting needs one row per structure",
            D::NAME,
            features.nrows(),
            targets.len()
        );
    }
    if let Some(path) = save {
        describer
            .save(path)
            .with_context(|| format!("saving describer to {}", path.display()))?;
    }
    Ok(features)
}

fn train<M: Model>(
    mut model: M,
    features: &Array2<f64>,
    targets: &Array1<f64>,
    config: &FitConfig,
    save: Option<&Path>,
) -> Result<()> {
    model.fit(features.view(), targets.view(), config)?;
    let score = model.score(features.view(), targets.view())?;
    info!("{}: training R² = {score:.4}", M::NAME);
    println!("{} fitted on {} rows, training R² = {score:.4}", M::NAME, targets.len());

    if let Some(path) = save {
        model
            .save(path)
            .with_context(|| format!("saving model to {}", path.display()))?;
        println!("Saved model to {}", path.display());
    }
    Ok(())
}
