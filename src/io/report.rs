//! Text reports over a corpus.

use crate::core::constants::{
    FILTERED_REPORT_HEADER, HABITABLE_RULE_FEATURES, PURITY_REPORT_HEADER,
};
use crate::core::error::{ForestError, Result};
use crate::core::traits::Classifier;
use crate::core::types::Class;
use crate::dataset::{DataPoint, DataSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `Event\tPurity` followed by one `<index>\t<output>` row per point.
///
/// Fails before writing anything when a point is narrower than the model.
pub fn write_purity_report<C, W>(model: &C, data: &DataSet, mut writer: W) -> Result<()>
where
    C: Classifier,
    W: Write,
{
    data.ensure_width("data", model.num_features())?;
    writeln!(writer, "{}", PURITY_REPORT_HEADER)?;
    for (index, point) in data.points().iter().enumerate() {
        writeln!(writer, "{}\t{}", index, model.run_data_point(point))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_purity_report_file<C, P>(model: &C, data: &DataSet, path: P) -> Result<()>
where
    C: Classifier,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    data.ensure_width("data", model.num_features())?;
    write_purity_report(model, data, BufWriter::new(File::create(path)?))?;
    log::info!(
        "Wrote {} report for {} points to {}",
        model.name(),
        data.len(),
        path.display()
    );
    Ok(())
}

/// Writes the header line and then the index of every point the model calls
/// signal or, failing that, `predicate` accepts. Returns the number of
/// indices written.
pub fn write_filtered_indices<C, F, W>(
    model: &C,
    data: &DataSet,
    predicate: F,
    mut writer: W,
) -> Result<usize>
where
    C: Classifier,
    F: Fn(&DataPoint) -> Result<bool>,
    W: Write,
{
    data.ensure_width("data", model.num_features())?;
    writeln!(writer, "{}", FILTERED_REPORT_HEADER)?;
    let mut written = 0;
    for (index, point) in data.points().iter().enumerate() {
        let selected =
            Class::from_purity(model.run_data_point(point)).is_signal() || predicate(point)?;
        if selected {
            writeln!(writer, "{}", index)?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

pub fn write_filtered_indices_file<C, F, P>(
    model: &C,
    data: &DataSet,
    predicate: F,
    path: P,
) -> Result<usize>
where
    C: Classifier,
    F: Fn(&DataPoint) -> Result<bool>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    data.ensure_width("data", model.num_features())?;
    let written =
        write_filtered_indices(model, data, predicate, BufWriter::new(File::create(path)?))?;
    log::info!(
        "Wrote {} of {} indices to {}",
        written,
        data.len(),
        path.display()
    );
    Ok(written)
}

/// Fixed membership rule over position (0-2), velocity (3-5), mass (6) and
/// integer colour channels (7-9, truncated toward zero).
pub fn habitable_planet_rule(point: &DataPoint) -> Result<bool> {
    let f = &point.features;
    if f.len() < HABITABLE_RULE_FEATURES {
        return Err(ForestError::invalid_parameter(
            "features",
            f.len().to_string(),
            format!("the habitable planet rule reads {} features", HABITABLE_RULE_FEATURES),
        ));
    }

    let (px, py, pz) = (f[0], f[1], f[2]);
    let (vx, vy, vz) = (f[3], f[4], f[5]);
    let mass = f[6];
    let (r, g, b) = (f[7].trunc(), f[8].trunc(), f[9].trunc());
    let position_sum = px + py + pz;

    Ok(20.0 * vx * vy * vz > position_sum * mass
        || r * g * b < 50.0 * position_sum * mass
        || r + g + b > 45.0 * (vx + vy + vz)
        || ((px - mass).abs() > 15.0 * vx
            && (py - mass).abs() > 15.0 * vy
            && (pz - mass).abs() > 15.0 * vz))
}
