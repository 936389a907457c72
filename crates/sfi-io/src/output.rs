use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sfi_inp::{DeckBuffer, format_value};

/// One generated deck, ready for submission as its own job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressVariant {
    /// 1-based position in the sweep.
    pub index: usize,
    pub scale: f64,
    pub job_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub schema_version: u32,
    pub generated_at: String,
    pub job_name: String,
    pub source_deck: PathBuf,
    pub categories: usize,
    pub elements: usize,
    pub variants: Vec<StressVariant>,
    /// Categories whose stress fell back to zero.
    pub defaulted_categories: Vec<String>,
}

pub fn variant_file_name(scale: f64) -> String {
    format!("stress_input_scale_{}.inp", format_value(scale))
}

pub fn variant_job_name(job_name: &str, index: usize) -> String {
    format!("{job_name}_Stress_Input_Scale_{index}")
}

/// Writes one deck variant into `dir`, replacing any file of the same name.
pub fn write_variant(
    dir: impl AsRef<Path>,
    job_name: &str,
    index: usize,
    scale: f64,
    deck: &DeckBuffer,
) -> io::Result<StressVariant> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(variant_file_name(scale));
    deck.write_file(&path)?;
    Ok(StressVariant {
        index,
        scale,
        job_name: variant_job_name(job_name, index),
        path,
    })
}

pub fn save_manifest(path: impl AsRef<Path>, manifest: &JobManifest) -> io::Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let bytes = serde_json::to_vec_pretty(manifest)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, bytes)
}

pub fn load_manifest(path: impl AsRef<Path>) -> io::Result<JobManifest> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
