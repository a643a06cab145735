//! Behaviour tests for descriptor discovery and parsing.

use camino::Utf8PathBuf;
use recipe_installer::descriptor::{PackageDescriptor, discover};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::HashMap;
use tempfile::TempDir;

struct DescriptorWorld {
    dir: TempDir,
    root: Utf8PathBuf,
    declared: HashMap<String, Vec<String>>,
    result: Option<Result<Vec<PackageDescriptor>, String>>,
}

impl DescriptorWorld {
    fn write(&self, name: &str, text: &str) {
        let package_dir = self.root.join(name);
        std::fs::create_dir_all(&package_dir).expect("create package dir");
        std::fs::write(package_dir.join("conandata.yml"), text).expect("write descriptor");
    }

    fn found(&self) -> &[PackageDescriptor] {
        match self.result.as_ref().expect("discovery ran") {
            Ok(found) => found,
            Err(err) => panic!("discovery failed: {err}"),
        }
    }

    fn package(&self, name: &str) -> &PackageDescriptor {
        self.found()
            .iter()
            .find(|d| d.name.as_str() == name)
            .expect("package discovered")
    }
}

#[fixture]
fn world() -> DescriptorWorld {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(dir.path().join("recipes")).expect("utf8 temp dir");
    std::fs::create_dir_all(&root).expect("create recipes root");
    DescriptorWorld {
        dir,
        root,
        declared: HashMap::new(),
        result: None,
    }
}

#[given("a descriptor for {name} listing versions {first} and {second}")]
fn given_two_versions(world: &mut DescriptorWorld, name: String, first: String, second: String) {
    let text = format!(
        concat!(
            "sources:\n",
            "  \"{first}\":\n    url: https://example.test/{name}-{first}.tar.gz\n",
            "  \"{second}\":\n    url: https://example.test/{name}-{second}.zip\n",
            "patches: {{}}\n",
        ),
        name = name,
        first = first,
        second = second
    );
    world.write(&name, &text);
    world.declared.insert(name, vec![first, second]);
}

#[given("a descriptor for {name} with no sources")]
fn given_empty_sources(world: &mut DescriptorWorld, name: String) {
    world.write(&name, "sources: {}\n");
}

#[given("a descriptor for {name} containing \"{text}\"")]
fn given_raw_descriptor(world: &mut DescriptorWorld, name: String, text: String) {
    world.write(&name, &text);
}

#[given("a directory named {name} without a descriptor")]
fn given_bare_directory(world: &mut DescriptorWorld, name: String) {
    std::fs::create_dir_all(world.root.join(name)).expect("create directory");
}

#[given("the recipes root does not exist")]
fn given_missing_root(world: &mut DescriptorWorld) {
    world.root = Utf8PathBuf::try_from(world.dir.path().join("absent")).expect("utf8 temp dir");
}

#[when("descriptors are discovered")]
fn when_discovered(world: &mut DescriptorWorld) {
    world.result = Some(discover(&world.root, "conandata.yml").map_err(|e| e.to_string()));
}

#[then("{count:usize} packages are found")]
fn then_count(world: &mut DescriptorWorld, count: usize) {
    assert_eq!(world.found().len(), count);
}

#[then("the first package is {name}")]
fn then_first(world: &mut DescriptorWorld, name: String) {
    let first = world.found().first().expect("at least one package");
    assert_eq!(first.name.as_str(), name);
}

#[then("{name} lists versions in file order")]
fn then_versions_in_order(world: &mut DescriptorWorld, name: String) {
    let versions: Vec<&str> = world.package(&name).entries().map(|(v, _)| v).collect();
    let declared = world.declared.get(&name).expect("declared versions");
    assert_eq!(versions, *declared);
}

#[then("{name} lists no versions")]
fn then_no_versions(world: &mut DescriptorWorld, name: String) {
    assert!(world.package(&name).is_empty());
}

#[then("discovery fails mentioning \"{text}\"")]
fn then_fails(world: &mut DescriptorWorld, text: String) {
    let result = world.result.as_ref().expect("discovery ran");
    let err = result.as_ref().expect_err("discovery should fail");
    assert!(err.contains(&text), "unexpected error: {err}");
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Discover packages in name order"
)]
fn scenario_discover_in_order(world: DescriptorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Accept a package with an empty sources mapping"
)]
fn scenario_empty_sources(world: DescriptorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Reject a descriptor without sources"
)]
fn scenario_missing_sources(world: DescriptorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Reject a source without a url"
)]
fn scenario_missing_url(world: DescriptorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Reject malformed YAML"
)]
fn scenario_malformed_yaml(world: DescriptorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/descriptors.feature",
    name = "Reject a missing recipes root"
)]
fn scenario_missing_root(world: DescriptorWorld) {
    let _ = world;
}
