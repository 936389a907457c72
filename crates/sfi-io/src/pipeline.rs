//! End-to-end stress input generation.
//!
//! Stages run strictly in order: pre-flight, characterization, stress
//! assignment, element-set injection (once), then one stress-field injection
//! per scale factor. Any stage-fatal failure returns before a deck is written.

use std::path::PathBuf;

use chrono::Utc;
use sfi_inp::{DeckBuffer, DeckError, inject_element_sets, inject_stress_field, locate_field_anchor};
use sfi_model::{MeshData, StressReport, assign_stresses, characterize};
use tracing::{info, warn};

use crate::config::{Preflight, RunConfig, preflight};
use crate::error::{IoError, Result};
use crate::output::{JobManifest, StressVariant, save_manifest, write_variant};
use crate::rules::RuleLoader;

const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// A deck generated for one scale factor, not yet on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledDeck {
    pub scale: f64,
    pub deck: DeckBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub variants: Vec<StressVariant>,
    pub manifest_path: PathBuf,
    pub stress: StressReport,
}

/// Injects element sets into `deck` once, then derives one independent deck
/// per scale factor from that shared base.
pub fn build_variants(
    deck: &DeckBuffer,
    mesh: &MeshData,
    scales: &[f64],
) -> std::result::Result<Vec<ScaledDeck>, DeckError> {
    let injection = inject_element_sets(deck, &mesh.part_sets())?;
    info!(
        parts = injection.injected_parts.len(),
        lines = injection.deck.len(),
        "element sets injected"
    );
    let anchor = locate_field_anchor(&injection.deck, injection.resume_at)?;

    scales
        .iter()
        .map(|&scale| {
            let records = mesh.stress_records(scale);
            let deck = inject_stress_field(&injection.deck, &anchor, &records)?;
            Ok(ScaledDeck { scale, deck })
        })
        .collect()
}

/// Runs every stage for `config`, writing the variant decks and the manifest.
///
/// The rule script is loaded afresh before characterization and again before
/// stress assignment. A failed first load only disables classification.
pub fn run(config: &RunConfig, rules: &dyn RuleLoader) -> Result<RunOutcome> {
    let Preflight { scales, deck, model } = preflight(config, rules)?;
    let instances = model.instance_meshes()?;

    info!(rules = %rules.describe(), "loading classification rules");
    let script = match rules.load() {
        Ok(script) => Some(script),
        Err(err) => {
            warn!(error = %err, "rule script failed to load, one category per element");
            None
        }
    };
    let classifier = script.as_deref().and_then(|script| script.classifier());
    let mut mesh =
        characterize(&instances, classifier).map_err(|err| IoError::NoMeshData(err.to_string()))?;
    info!(
        categories = mesh.category_count(),
        elements = mesh.element_count(),
        "mesh characterized"
    );

    info!(rules = %rules.describe(), "loading stress rules");
    let script = rules
        .load()
        .map_err(|err| IoError::NoMeshData(format!("stress rules failed to load: {err}")))?;
    let stress = assign_stresses(&mut mesh, script.stress_function());
    if !stress.defaulted.is_empty() {
        warn!(count = stress.defaulted.len(), "categories defaulted to zero stress");
    }

    let factors = scales.factors();
    let decks = build_variants(&deck, &mesh, &factors)?;

    let mut variants = Vec::with_capacity(decks.len());
    for (i, scaled) in decks.iter().enumerate() {
        let variant = write_variant(&config.output_dir, &config.job_name, i + 1, scaled.scale, &scaled.deck)?;
        info!(scale = scaled.scale, path = %variant.path.display(), job = %variant.job_name, "stress input written");
        variants.push(variant);
    }

    let manifest = JobManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        job_name: config.job_name.clone(),
        source_deck: config.deck.clone(),
        categories: mesh.category_count(),
        elements: mesh.element_count(),
        variants: variants.clone(),
        defaulted_categories: stress.defaulted.clone(),
    };
    let manifest_path = config.manifest_path();
    save_manifest(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "manifest written");

    Ok(RunOutcome {
        variants,
        manifest_path,
        stress,
    })
}
