use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use sfi_io::{ConfigError, FileRuleLoader, IoError, RuleLoader, RunConfig, load_manifest, run};
use sfi_model::{Classifier, RuleError, RuleScript, StressFunction, StressVector};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

fn config(deck: &str, output_dir: &Path) -> RunConfig {
    RunConfig {
        job_name: "Job-1".to_string(),
        deck: fixture(deck),
        rules: Some(fixture("rules.json")),
        output_dir: output_dir.to_path_buf(),
        ..RunConfig::default()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read deck")
        .lines()
        .map(str::to_string)
        .collect()
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read output dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Singleton categories; elements right of x = 1 fail stress evaluation.
struct FailsRightOfOne;

impl StressFunction for FailsRightOfOne {
    fn stress(&self, _part_name: &str, point: &Point3<f64>) -> Result<StressVector, RuleError> {
        if point.x > 1.0 {
            return Err(RuleError::Evaluation("outside calibrated region".to_string()));
        }
        Ok(StressVector::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0))
    }
}

impl RuleScript for FailsRightOfOne {
    fn classifier(&self) -> Option<&dyn Classifier> {
        None
    }

    fn stress_function(&self) -> Option<&dyn StressFunction> {
        Some(self)
    }
}

/// Delegates to the fixture rules but fails the n-th load (1-based).
struct FailingLoad {
    inner: FileRuleLoader,
    fail_on: usize,
    calls: Cell<usize>,
}

impl FailingLoad {
    fn new(fail_on: usize) -> Self {
        Self {
            inner: FileRuleLoader::new(fixture("rules.json")),
            fail_on,
            calls: Cell::new(0),
        }
    }
}

impl RuleLoader for FailingLoad {
    fn load(&self) -> sfi_io::Result<Box<dyn RuleScript>> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on {
            return Err(IoError::Rules {
                path: self.inner.path().to_path_buf(),
                message: "syntax error".to_string(),
            });
        }
        self.inner.load()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

struct StaticLoader;

impl RuleLoader for StaticLoader {
    fn load(&self) -> sfi_io::Result<Box<dyn RuleScript>> {
        Ok(Box::new(FailsRightOfOne))
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

#[test]
fn stress_block_lands_before_terminator_and_leaves_other_lines_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config("single_part.inp", dir.path());
    let outcome = run(&config, &FileRuleLoader::new(fixture("rules.json"))).expect("run");

    assert_eq!(outcome.variants.len(), 1);
    let original = read_lines(&fixture("single_part.inp"));
    let mut generated = read_lines(&outcome.variants[0].path);
    assert_eq!(generated.len(), original.len() + 4 + 6);

    let terminator = generated
        .iter()
        .position(|line| line.starts_with("** ---"))
        .expect("terminator kept");
    let block: Vec<String> = generated.drain(terminator - 6..terminator).collect();
    assert_eq!(
        block,
        vec![
            "** ",
            "** PREDEFINED FIELDS",
            "** ",
            "*Initial Conditions, type=STRESS",
            "Plate-1.SFI_CAT_band0,1.0,2.0,3.0,4.0,5.0,6.0,",
            "Plate-1.SFI_CAT_band1,1.0,2.0,3.0,4.0,5.0,6.0,",
        ]
    );

    let end_part = generated
        .iter()
        .position(|line| line == "*End Part")
        .expect("part end kept");
    let sets: Vec<String> = generated.drain(end_part - 4..end_part).collect();
    assert_eq!(
        sets,
        vec!["*Elset, elset=SFI_CAT_band0", "1,", "*Elset, elset=SFI_CAT_band1", "2,"]
    );

    assert_eq!(generated, original);
}

#[test]
fn every_scale_writes_its_own_deck() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = RunConfig {
        scale_count: 2,
        scale_min: 1.0,
        scale_max: 2.5,
        ..config("single_part.inp", dir.path())
    };
    let outcome = run(&config, &FileRuleLoader::new(fixture("rules.json"))).expect("run");

    let scales: Vec<f64> = outcome.variants.iter().map(|v| v.scale).collect();
    assert_eq!(scales, vec![1.0, 2.5]);
    assert_eq!(outcome.variants[1].job_name, "Job-1_Stress_Input_Scale_2");
    assert_eq!(
        output_files(dir.path()),
        vec![
            "Job-1_stress_inputs.json",
            "stress_input_scale_1.0.inp",
            "stress_input_scale_2.5.inp",
        ]
    );

    let scaled = read_lines(&dir.path().join("stress_input_scale_2.5.inp"));
    assert!(scaled.contains(&"Plate-1.SFI_CAT_band0,2.5,5.0,7.5,10.0,12.5,15.0,".to_string()));
    let unscaled = read_lines(&dir.path().join("stress_input_scale_1.0.inp"));
    assert!(unscaled.contains(&"Plate-1.SFI_CAT_band0,1.0,2.0,3.0,4.0,5.0,6.0,".to_string()));
    assert_eq!(
        unscaled.iter().filter(|l| l.starts_with("*Initial Conditions")).count(),
        1
    );
}

#[test]
fn empty_instances_contribute_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config("plate_bolt.inp", dir.path());
    let outcome = run(&config, &FileRuleLoader::new(fixture("rules.json"))).expect("run");

    let generated = read_lines(&outcome.variants[0].path);
    let elsets: Vec<&String> = generated.iter().filter(|l| l.starts_with("*Elset")).collect();
    assert_eq!(
        elsets,
        vec![
            "*Elset, elset=SFI_CAT_band0",
            "*Elset, elset=SFI_CAT_band1",
            "*Elset, elset=SFI_CAT_Bolt",
        ]
    );
    assert!(generated.iter().all(|l| !l.starts_with("Empty-1.")));
    assert!(generated.contains(&"Bolt-1.SFI_CAT_Bolt,0.0,0.0,16.0,0.0,0.0,0.0,".to_string()));

    let bolt_header = generated
        .iter()
        .position(|l| l == "*Part, name=Bolt")
        .expect("bolt part");
    let bolt_set = generated
        .iter()
        .position(|l| l == "*Elset, elset=SFI_CAT_Bolt")
        .expect("bolt set");
    assert!(bolt_set > bolt_header);
    assert_eq!(generated[bolt_set + 2], "*Solid Section, elset=Bolt-All, material=Steel");

    let manifest = load_manifest(&outcome.manifest_path).expect("manifest");
    assert_eq!(manifest.job_name, "Job-1");
    assert_eq!(manifest.categories, 3);
    assert_eq!(manifest.elements, 3);
    assert_eq!(manifest.variants, outcome.variants);
    assert!(manifest.defaulted_categories.is_empty());
}

#[test]
fn quoted_part_and_instance_names_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let deck = dir.path().join("quoted.inp");
    let source = fs::read_to_string(fixture("single_part.inp"))
        .expect("read fixture")
        .replace("*Part, name=Plate", "*Part, name=\"Plate A\"")
        .replace(
            "*Instance, name=Plate-1, part=Plate",
            "*Instance, name=\"Plate A-1\", part=\"Plate A\"",
        );
    fs::write(&deck, source).expect("write deck");
    let output = dir.path().join("out");
    let config = RunConfig {
        deck,
        ..config("single_part.inp", &output)
    };

    let outcome = run(&config, &FileRuleLoader::new(fixture("rules.json"))).expect("run");
    let generated = read_lines(&outcome.variants[0].path);
    let header = generated
        .iter()
        .position(|l| l == "*Part, name=\"Plate A\"")
        .expect("part header kept");
    assert_eq!(generated[header + 11], "*Elset, elset=SFI_CAT_band0");
    assert!(generated.contains(&"\"Plate A-1\".SFI_CAT_band1,1.0,2.0,3.0,4.0,5.0,6.0,".to_string()));
}

#[test]
fn failed_stress_evaluation_zeroes_only_that_category() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config("single_part.inp", dir.path());
    let outcome = run(&config, &StaticLoader).expect("run");

    assert_eq!(outcome.stress.assigned, 1);
    assert_eq!(outcome.stress.defaulted, vec!["Plate-1.SFI_CAT_2".to_string()]);

    let generated = read_lines(&outcome.variants[0].path);
    assert!(generated.contains(&"Plate-1.SFI_CAT_1,1.0,2.0,3.0,4.0,5.0,6.0,".to_string()));
    assert!(generated.contains(&"Plate-1.SFI_CAT_2,0.0,0.0,0.0,0.0,0.0,0.0,".to_string()));

    let manifest = load_manifest(&outcome.manifest_path).expect("manifest");
    assert_eq!(manifest.defaulted_categories, vec!["Plate-1.SFI_CAT_2".to_string()]);
}

#[test]
fn classifier_load_failure_falls_back_to_one_category_per_element() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config("single_part.inp", dir.path());
    // load 1 is the pre-flight check, load 2 precedes characterization
    let outcome = run(&config, &FailingLoad::new(2)).expect("run");

    let generated = read_lines(&outcome.variants[0].path);
    assert!(generated.contains(&"*Elset, elset=SFI_CAT_1".to_string()));
    assert!(generated.contains(&"*Elset, elset=SFI_CAT_2".to_string()));
    assert!(generated.iter().all(|l| !l.contains("band")));
}

#[test]
fn stress_load_failure_aborts_without_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config("single_part.inp", dir.path());
    let err = run(&config, &FailingLoad::new(3)).expect_err("stress stage fails");

    assert!(matches!(err, IoError::NoMeshData(_)));
    assert!(output_files(dir.path()).is_empty());
}

#[test]
fn classifier_error_aborts_characterization() {
    let dir = tempfile::tempdir().expect("temp dir");
    let rules = dir.path().join("narrow.json");
    fs::write(
        &rules,
        r#"{"classify": {"kind": "bands", "axis": "x", "edges": [0.0, 1.0]},
            "stress": {"kind": "uniform", "value": [1, 1, 1, 0, 0, 0]}}"#,
    )
    .expect("write rules");
    let output = dir.path().join("out");
    let config = config("single_part.inp", &output);

    let err = run(&config, &FileRuleLoader::new(&rules)).expect_err("centroid outside bands");
    assert!(matches!(err, IoError::NoMeshData(_)));
    assert!(!output.exists());
}

#[test]
fn preflight_rejects_bad_configuration_before_writing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let loader = FileRuleLoader::new(fixture("rules.json"));

    let single_count_range = RunConfig {
        scale_count: 1,
        scale_min: 1.0,
        scale_max: 2.0,
        ..config("single_part.inp", dir.path())
    };
    assert!(matches!(
        run(&single_count_range, &loader),
        Err(IoError::Config(ConfigError::Scale(_)))
    ));

    let no_job = RunConfig {
        job_name: " ".to_string(),
        ..config("single_part.inp", dir.path())
    };
    assert!(matches!(run(&no_job, &loader), Err(IoError::Config(ConfigError::NoJob))));

    let no_stress = FileRuleLoader::new(fixture("classify_only.json"));
    assert!(matches!(
        run(&config("single_part.inp", dir.path()), &no_stress),
        Err(IoError::Config(ConfigError::NoStressFunction { .. }))
    ));

    let bare = dir.path().join("bare.inp");
    fs::write(&bare, "*Heading\n** BOUNDARY CONDITIONS\n** ---\n").expect("write deck");
    let no_model = RunConfig {
        deck: bare,
        ..config("single_part.inp", dir.path())
    };
    assert!(matches!(
        run(&no_model, &loader),
        Err(IoError::Config(ConfigError::NoActiveModel { .. }))
    ));

    assert_eq!(output_files(dir.path()), vec!["bare.inp"]);
}
