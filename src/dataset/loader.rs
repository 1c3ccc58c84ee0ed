use std::{
    fs,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use log::{debug, info};

use super::{DataErr, Sample};

/// Parses a walk recording into samples.
///
/// A recording holds one `x,y,z` accelerometer entry per line. Every run of `entries_per_sample`
/// consecutive entries becomes a sample whose features are the flattened entries
/// (`[x1, y1, z1, x2, ...]`). Blank lines are skipped and a trailing incomplete run is dropped.
///
/// # Arguments
/// * `reader` - The recording.
/// * `path` - Where the recording comes from, only used in error messages.
/// * `entries_per_sample` - How many entries make up a sample.
/// * `positive` - Whether the recording belongs to the authenticated user.
pub fn parse_walk<R: Read>(
    reader: R,
    path: &Path,
    entries_per_sample: usize,
    positive: bool,
) -> Result<Vec<Sample>, DataErr> {
    if entries_per_sample == 0 {
        return Err(DataErr::Empty("a sample needs at least one entry".into()));
    }

    let mut samples = Vec::new();
    let mut features = Vec::with_capacity(entries_per_sample * 3);

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|source| DataErr::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let entry = parse_entry(line).map_err(|reason| DataErr::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        })?;

        features.extend(entry);
        if features.len() == entries_per_sample * 3 {
            let full = std::mem::replace(&mut features, Vec::with_capacity(entries_per_sample * 3));
            samples.push(Sample::new(positive, full));
        }
    }

    if !features.is_empty() {
        debug!(
            "dropping {} trailing entries of {}",
            features.len() / 3,
            path.display()
        );
    }

    Ok(samples)
}

fn parse_entry(line: &str) -> Result<[f64; 3], String> {
    let coordinates: Vec<_> = line.split(',').map(str::trim).collect();

    let [x, y, z] = coordinates[..] else {
        return Err(format!(
            "expected 3 coordinates, got {} in '{line}'",
            coordinates.len()
        ));
    };

    let parse = |c: &str| {
        c.parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{c}': {e}"))
    };

    Ok([parse(x)?, parse(y)?, parse(z)?])
}

/// Loads every walk recording in a directory.
///
/// The recording named `testing_user` yields the positive samples, every other regular file the
/// negative ones. Files are read in name order.
///
/// # Returns
/// A tuple with the positive and the negative samples.
pub fn load_walks(
    dir: &Path,
    testing_user: &str,
    entries_per_sample: usize,
) -> Result<(Vec<Sample>, Vec<Sample>), DataErr> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DataErr::Io { path, source }
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err(dir))?;
    paths.retain(|p| p.is_file());
    paths.sort();

    let mut positives = None;
    let mut negatives = Vec::new();

    for path in paths {
        let positive = path.file_name().is_some_and(|name| name == testing_user);
        let file = fs::File::open(&path).map_err(io_err(&path))?;
        let samples = parse_walk(file, &path, entries_per_sample, positive)?;
        debug!("loaded {} samples from {}", samples.len(), path.display());

        if positive {
            positives = Some(samples);
        } else {
            negatives.extend(samples);
        }
    }

    let positives = positives.ok_or_else(|| {
        DataErr::Empty(format!(
            "no recording named '{testing_user}' in {}",
            dir.display()
        ))
    })?;

    if positives.is_empty() || negatives.is_empty() {
        return Err(DataErr::Empty(format!(
            "got {} positive and {} negative samples, both classes are needed",
            positives.len(),
            negatives.len()
        )));
    }

    info!(
        "loaded {} positive and {} negative samples",
        positives.len(),
        negatives.len()
    );

    Ok((positives, negatives))
}
