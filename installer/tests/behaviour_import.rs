//! Behaviour tests for whole-run imports.
//!
//! A real recipes tree is written to a temporary directory and driven through
//! `install`, with the network fetcher, registrar, and pre-flight command
//! replaced by in-memory doubles.

use camino::Utf8PathBuf;
use recipe_installer::artefact::extraction::DetectingExtractor;
use recipe_installer::cli::Cli;
use recipe_installer::config::InstallerConfig;
use recipe_installer::install::{Toolkit, install};
use recipe_installer::package_name::PackageName;
use recipe_installer::test_utils::{
    ExpectedCall, RecordingRegistrar, StubExecutor, StubFetcher, StubResponse, sha256_hex,
    success_output, tar_gz_bytes,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tempfile::TempDir;

/// One version entry to write into a descriptor.
struct PairSpec {
    version: String,
    archive: Vec<u8>,
    sha256: Option<String>,
    user: Option<String>,
    channel: Option<String>,
}

impl PairSpec {
    fn new(name: &str, version: &str) -> Self {
        let path = format!("{name}-{version}/conanfile.py");
        let archive = tar_gz_bytes(&[(path.as_str(), b"class Recipe: pass\n".as_slice())])
            .expect("build archive");
        Self {
            version: version.to_owned(),
            archive,
            sha256: None,
            user: None,
            channel: None,
        }
    }

    fn is_fetched(&self) -> bool {
        self.channel.is_none() || self.user.is_some()
    }

    fn yaml(&self, name: &str) -> String {
        let mut text = format!(
            "  \"{version}\":\n    url: https://example.test/{name}-{version}.tar.gz\n",
            version = self.version
        );
        for (key, value) in [
            ("sha256", &self.sha256),
            ("user", &self.user),
            ("channel", &self.channel),
        ] {
            if let Some(value) = value {
                writeln!(text, "    {key}: {value}").expect("write to string");
            }
        }
        text
    }
}

#[derive(Default)]
struct ImportWorld {
    packages: BTreeMap<String, Vec<PairSpec>>,
    selected: Vec<String>,
    dry_run: bool,
    registrar_missing: bool,
    fetcher: StubFetcher,
    registrar: RecordingRegistrar,
    result: Option<Result<i32, String>>,
    output: String,
    _dir: Option<TempDir>,
}

impl ImportWorld {
    fn add(&mut self, name: &str, pair: PairSpec) {
        self.packages.entry(name.to_owned()).or_default().push(pair);
    }

    fn write_tree(&mut self) -> Utf8PathBuf {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().join("recipes")).expect("utf8 temp dir");
        for (name, pairs) in &self.packages {
            let package_dir = root.join(name);
            std::fs::create_dir_all(&package_dir).expect("create package dir");
            let mut text = String::from("sources:\n");
            for pair in pairs {
                text.push_str(&pair.yaml(name));
                if pair.is_fetched() {
                    self.fetcher.push(StubResponse::Archive {
                        file_name: format!("{name}-{}.tar.gz", pair.version),
                        contents: pair.archive.clone(),
                    });
                }
            }
            std::fs::write(package_dir.join("conandata.yml"), text).expect("write descriptor");
        }
        self._dir = Some(dir);
        root
    }

    fn output_text(&self) -> &str {
        &self.output
    }
}

#[fixture]
fn world() -> ImportWorld {
    ImportWorld::default()
}

#[given("package {name} offers version {version}")]
fn given_version(world: &mut ImportWorld, name: String, version: String) {
    world.add(&name, PairSpec::new(&name, &version));
}

#[given("a checksummed package {name} offers version {version}")]
fn given_matching_checksum(world: &mut ImportWorld, name: String, version: String) {
    let mut pair = PairSpec::new(&name, &version);
    pair.sha256 = Some(sha256_hex(&pair.archive).to_ascii_uppercase());
    world.add(&name, pair);
}

#[given("a mis-checksummed package {name} offers version {version}")]
fn given_wrong_checksum(world: &mut ImportWorld, name: String, version: String) {
    let mut pair = PairSpec::new(&name, &version);
    pair.sha256 = Some("0".repeat(64));
    world.add(&name, pair);
}

#[given("an ownerless package {name} offers version {version} on channel {channel}")]
fn given_channel_without_user(
    world: &mut ImportWorld,
    name: String,
    version: String,
    channel: String,
) {
    let mut pair = PairSpec::new(&name, &version);
    pair.channel = Some(channel);
    world.add(&name, pair);
}

#[given("a namespaced package {name} offers version {version} as {user}/{channel}")]
fn given_namespaced(
    world: &mut ImportWorld,
    name: String,
    version: String,
    user: String,
    channel: String,
) {
    let mut pair = PairSpec::new(&name, &version);
    pair.user = Some(user);
    pair.channel = Some(channel);
    world.add(&name, pair);
}

#[given("a dry run is requested")]
fn given_dry_run(world: &mut ImportWorld) {
    world.dry_run = true;
}

#[given("only package {name} is selected")]
fn given_selected(world: &mut ImportWorld, name: String) {
    world.selected.push(name);
}

#[given("the registrar is missing")]
fn given_registrar_missing(world: &mut ImportWorld) {
    world.registrar_missing = true;
}

#[when("the installer runs")]
fn when_installer_runs(world: &mut ImportWorld) {
    let root = world.write_tree();
    let cli = Cli {
        dry_run: world.dry_run,
        no_progress: true,
        package: world.selected.clone(),
        ..Cli::default()
    };
    let mut settings = cli.resolve(InstallerConfig::default());
    settings.recipes_dir = root;

    let check = if world.registrar_missing {
        Err(std::io::Error::from(std::io::ErrorKind::NotFound))
    } else {
        Ok(success_output())
    };
    let executor = StubExecutor::new(vec![ExpectedCall {
        cmd: "conan",
        args: vec!["--version"],
        result: check,
    }]);
    let extractor = DetectingExtractor;
    let tools = Toolkit {
        fetcher: &world.fetcher,
        extractor: &extractor,
        registrar: &world.registrar,
        executor: &executor,
    };

    let mut out = Vec::new();
    let result = install(&settings, &tools, &mut out).map_err(|e| e.to_string());
    world.output = String::from_utf8(out).expect("utf8 output");
    world.result = Some(result);
}

#[then("the exit code is {code:i32}")]
fn then_exit_code(world: &mut ImportWorld, code: i32) {
    let result = world.result.as_ref().expect("run recorded");
    assert_eq!(result, &Ok(code), "output:\n{}", world.output_text());
}

#[then("the run aborts with \"{message}\"")]
fn then_run_aborts(world: &mut ImportWorld, message: String) {
    let result = world.result.as_ref().expect("run recorded");
    let err = result.as_ref().expect_err("run should abort");
    assert!(err.contains(&message), "unexpected error: {err}");
}

#[then("{count:usize} sources are exported")]
fn then_exported(world: &mut ImportWorld, count: usize) {
    assert_eq!(world.registrar.exports().len(), count);
}

#[then("{count:usize} sources are downloaded")]
fn then_downloaded(world: &mut ImportWorld, count: usize) {
    assert_eq!(world.fetcher.requests().len(), count);
}

#[then("package {name} version {version} is exported first")]
fn then_exported_first(world: &mut ImportWorld, name: String, version: String) {
    let exports = world.registrar.exports();
    let first = exports.first().expect("at least one export");
    assert_eq!(first.name, PackageName::from(name.as_str()));
    assert_eq!(first.root_name, format!("{name}-{version}"));
    assert_eq!(first.root_listing, ["conanfile.py"]);
}

#[then("package {name} is exported under \"{namespace}\"")]
fn then_exported_under(world: &mut ImportWorld, name: String, namespace: String) {
    let exports = world.registrar.exports();
    let export = exports
        .iter()
        .find(|e| e.name.as_str() == name)
        .expect("package exported");
    assert_eq!(export.namespace.to_string(), namespace);
}

#[then("the output contains \"{text}\"")]
fn then_output_contains(world: &mut ImportWorld, text: String) {
    assert!(
        world.output_text().contains(&text),
        "expected {text:?} in output:\n{}",
        world.output_text()
    );
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Import every version of every package"
)]
fn scenario_import_everything(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Accept a matching checksum"
)]
fn scenario_matching_checksum(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Report a checksum mismatch and continue"
)]
fn scenario_checksum_mismatch(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Reject a channel without a user before downloading"
)]
fn scenario_channel_without_user(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Export under a user and channel"
)]
fn scenario_namespaced_export(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Dry run lists sources without downloading"
)]
fn scenario_dry_run(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Import only the selected package"
)]
fn scenario_selected_package(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Abort when a selected package does not exist"
)]
fn scenario_unknown_package(world: ImportWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/import.feature",
    name = "Abort when the registrar is missing"
)]
fn scenario_registrar_missing(world: ImportWorld) {
    let _ = world;
}
