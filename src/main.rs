use std::{
    env,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::info;
use rand::{SeedableRng, rngs::StdRng};

use walkauth::{
    config::Config,
    dataset::{self, Normalization, Sample},
    evaluation::Metrics,
    training::{self, CsvSink, JsonSink, LogSink, NoopSink, Training},
};

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: walkauth <config.json>");
    };

    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (positives, negatives) = dataset::load_walks(
        &config.data_path,
        &config.testing_user,
        config.entries_per_sample,
    )
    .context("loading walk recordings")?;

    let all: Vec<Sample> = positives.iter().chain(&negatives).cloned().collect();
    let normalization = Normalization::fit(&all)?;
    info!(
        mean = normalization.mean(), deviation = normalization.deviation();
        "normalizing samples"
    );

    let split = dataset::split(
        normalization.normalize(&positives),
        normalization.normalize(&negatives),
        config.ratios()?,
        &mut rng,
    );
    println!("{}", split.overview());

    let input_size = split
        .training
        .first()
        .map(|s| s.features().len())
        .context("the training batch is empty")?;
    let topology = config.topology(input_size);

    let mut sink: Box<dyn LogSink> = match &config.learning_log {
        Some(path) if path.extension().is_some_and(|ext| ext == "json") => {
            Box::new(JsonSink::new(create(path)?))
        }
        Some(path) => Box::new(CsvSink::new(create(path)?)?),
        None => Box::new(NoopSink),
    };

    let Training {
        network,
        state,
        iterations,
    } = training::train_network(
        &topology,
        &config.descent(),
        &split.training,
        &split.validation,
        config.learning_rate().as_mut(),
        sink.as_mut(),
        &mut rng,
    )
    .context("training")?;

    if let Some(path) = &config.weights_log {
        training::write_weights(&network, create(path)?)?;
    }

    let test = Metrics::compute(&network, &split.testing)?;
    println!("finished after {iterations} iterations: {}", state.reason());
    println!("test error: {:.4}", test.error);
    println!("test RMSE: {:.4}", test.rmse);
    println!("test accuracy: {:.4}", test.accuracy);
    println!("test precision: {:.4}", test.precision);
    println!("test recall: {:.4}", test.recall);
    println!("test F1: {:.4}", test.f1);

    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}
