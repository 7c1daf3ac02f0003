//! Tests for CategoryRegistry scanning and TreeBuilder wiring

use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use cattree::application::render::to_structured_document;
use cattree::domain::{
    CategoryRegistry, ConflictPolicy, DomainError, Forest, TreeBuilder, DEFAULT_ROOT_LABEL,
};
use cattree::util::testing;

/// Helper to create a category file, creating parent directories as needed
fn create_category(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create category dir");
    }
    std::fs::write(&path, content).expect("write category file");
}

fn build(dir: &Path) -> Forest {
    TreeBuilder::new()
        .build_from_directory(dir)
        .expect("build forest")
}

fn json(forest: &Forest) -> String {
    let bytes = to_structured_document(forest)
        .to_json_bytes()
        .expect("serialize");
    String::from_utf8(bytes).expect("utf8")
}

#[test]
fn given_ads_dataset_when_building_then_includes_nest_under_category() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    create_category(
        temp.path(),
        "category-ads",
        "include:geolocation-cn\ninclude:ads-google\n",
    );
    create_category(temp.path(), "geolocation-cn", "domain:example.cn\n");
    create_category(temp.path(), "ads-google", "full:ads.google.com\n");

    let forest = build(temp.path());

    let expected = r#"{
  "name": "domain-list-community",
  "children": {
    "category-ads": {
      "name": "category-ads",
      "children": {
        "ads-google": {
          "name": "ads-google"
        },
        "geolocation-cn": {
          "name": "geolocation-cn"
        }
      }
    }
  }
}"#;
    assert_eq!(json(&forest), expected);
    assert_eq!(forest.label(), DEFAULT_ROOT_LABEL);
    assert_eq!(forest.category_count(), 3);
    assert_eq!(forest.depth(), 2);
    assert!(forest.report().is_clean());
}

#[test]
fn given_unchanged_files_when_building_twice_then_output_is_identical() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "a", "include:b\ninclude:c\n");
    create_category(temp.path(), "b", "include:d\n");
    create_category(temp.path(), "c", "");
    create_category(temp.path(), "d", "");
    create_category(temp.path(), "e", "include:missing\n");

    let first = json(&build(temp.path()));
    let second = json(&build(temp.path()));

    assert_eq!(first, second);
}

#[test]
fn given_files_created_in_different_order_when_building_then_trees_match() {
    let files = [
        ("zeta", "include:alpha-child\n"),
        ("alpha-child", "include:leaf\n"),
        ("leaf", ""),
        ("mid", "include:other\n"),
        ("other", ""),
    ];
    let forward = TempDir::new().unwrap();
    for (name, content) in files.iter() {
        create_category(forward.path(), name, content);
    }
    let backward = TempDir::new().unwrap();
    for (name, content) in files.iter().rev() {
        create_category(backward.path(), name, content);
    }

    assert_eq!(json(&build(forward.path())), json(&build(backward.path())));
}

#[test]
fn given_registry_inserted_in_different_order_when_building_then_trees_match() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "x", "include:y\n");
    create_category(temp.path(), "y", "include:z\n");
    create_category(temp.path(), "z", "");

    let mut forward = CategoryRegistry::new();
    for name in ["x", "y", "z"] {
        forward.insert(name.into(), temp.path().join(name));
    }
    let mut backward = CategoryRegistry::new();
    for name in ["z", "y", "x"] {
        backward.insert(name.into(), temp.path().join(name));
    }

    let forward = TreeBuilder::new().build(forward).unwrap();
    let backward = TreeBuilder::new().build(backward).unwrap();

    assert_eq!(json(&forward), json(&backward));
    assert_eq!(forward.root_names(), vec!["x"]);
}

#[test]
fn given_dangling_include_when_building_then_no_edge_and_no_error() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "apple", "include:nonexistent\ndomain:apple.com\n");

    let forest = build(temp.path());

    let apple = forest.get("apple").unwrap();
    assert!(apple.is_leaf());
    assert_eq!(forest.root_names(), vec!["apple"]);
    assert_eq!(forest.report().dangling.len(), 1);
    assert_eq!(forest.report().dangling[0].category.as_str(), "apple");
    assert_eq!(forest.report().dangling[0].target, "nonexistent");
}

#[test]
fn given_two_way_cycle_when_building_then_terminates_with_each_node_once() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "A", "include:B\n");
    create_category(temp.path(), "B", "include:A\n");

    let forest = build(temp.path());

    let names: Vec<&str> = forest.iter().map(|(_, node)| node.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(forest.root_names(), vec!["A"]);
    assert_eq!(forest.report().cycles.len(), 1);
}

#[test]
fn given_three_way_cycle_when_building_then_every_node_appears_once() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "a", "include:b\n");
    create_category(temp.path(), "b", "include:c\n");
    create_category(temp.path(), "c", "include:a\n");

    let forest = build(temp.path());

    let walked: Vec<(usize, &str)> = forest
        .iter()
        .map(|(depth, node)| (depth, node.name.as_str()))
        .collect();
    assert_eq!(walked, vec![(0, "a"), (1, "b"), (2, "c")]);
    assert_eq!(forest.report().cycles[0].from.as_str(), "c");
    assert_eq!(forest.report().cycles[0].to.as_str(), "a");
}

#[test]
fn given_self_include_when_building_then_no_edge() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "loop", "include:loop\n");

    let forest = build(temp.path());

    assert!(forest.get("loop").unwrap().is_leaf());
    assert_eq!(forest.root_names(), vec!["loop"]);
}

#[test]
fn given_unincluded_categories_when_building_then_each_is_a_root() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "steam", "");
    create_category(temp.path(), "category-games", "include:epicgames\n");
    create_category(temp.path(), "epicgames", "");

    let forest = build(temp.path());

    assert_eq!(forest.root_names(), vec!["category-games", "steam"]);
    assert_eq!(forest.leaf_names(), vec!["epicgames", "steam"]);
    assert!(forest.parent_of("steam").is_none());
}

#[test]
fn given_nested_file_with_extension_when_scanning_then_name_is_normalized() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "geo/cn.dat", "");
    create_category(temp.path(), "geolocation-cn", "include:geo/cn\n");

    let forest = build(temp.path());

    assert!(forest.get("geo/cn").is_some());
    assert_eq!(
        forest.parent_of("geo/cn").map(|n| n.name.as_str()),
        Some("geolocation-cn")
    );
}

#[test]
fn given_shared_child_when_last_writer_wins_then_later_parent_claims_it() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "alpha", "include:shared\n");
    create_category(temp.path(), "beta", "include:shared\n");
    create_category(temp.path(), "shared", "");

    let forest = build(temp.path());

    assert_eq!(
        forest.parent_of("shared").map(|n| n.name.as_str()),
        Some("beta")
    );
    assert!(forest.get("alpha").unwrap().is_leaf());
    let reassigned = &forest.report().reassigned;
    assert_eq!(reassigned.len(), 1);
    assert_eq!(reassigned[0].from.as_str(), "alpha");
    assert_eq!(reassigned[0].to.as_str(), "beta");
}

#[test]
fn given_shared_child_when_reject_policy_then_build_fails() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "alpha", "include:shared\n");
    create_category(temp.path(), "beta", "include:shared\n");
    create_category(temp.path(), "shared", "");

    let result = TreeBuilder::new()
        .with_policy(ConflictPolicy::Reject)
        .build_from_directory(temp.path());

    assert!(matches!(result, Err(DomainError::MultipleParents { .. })));
}

#[test]
fn given_duplicate_include_lines_when_building_then_child_is_wired_once() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "parent", "include:child\n  include: child  \n");
    create_category(temp.path(), "child", "");

    let forest = build(temp.path());

    let parent = forest.get("parent").unwrap();
    assert_eq!(parent.children.len(), 1);
    assert!(forest.report().is_clean());
}

#[test]
fn given_missing_directory_when_building_then_directory_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("data");

    let result = TreeBuilder::new().build_from_directory(&missing);

    assert!(matches!(result, Err(DomainError::DirectoryNotFound(p)) if p == missing));
}

#[test]
fn given_file_as_root_when_building_then_not_a_directory() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "file", "");

    let result = TreeBuilder::new().build_from_directory(&temp.path().join("file"));

    assert!(matches!(result, Err(DomainError::NotADirectory(_))));
}

#[test]
fn given_custom_root_label_when_building_then_anchor_uses_it() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "a", "");

    let forest = TreeBuilder::new()
        .with_root_label("dlc")
        .build_from_directory(temp.path())
        .unwrap();

    assert_eq!(to_structured_document(&forest).name(), "dlc");
}

#[test]
fn given_empty_directory_when_building_then_forest_is_empty() {
    let temp = TempDir::new().unwrap();

    let forest = build(temp.path());

    assert_eq!(forest.category_count(), 0);
    assert_eq!(forest.depth(), 0);
    assert_eq!(json(&forest), "{\n  \"name\": \"domain-list-community\"\n}");
}

#[cfg(unix)]
#[test]
fn given_symlinked_rule_file_when_scanning_then_only_regular_files_are_categories() {
    let temp = TempDir::new().unwrap();
    create_category(temp.path(), "github", "domain:github.com\n");
    create_category(temp.path(), "category-dev", "include:github-alias\n");
    std::os::unix::fs::symlink(temp.path().join("github"), temp.path().join("github-alias"))
        .unwrap();

    let forest = build(temp.path());

    assert!(forest.get("github-alias").is_none());
    assert_eq!(forest.category_count(), 2);
    assert_eq!(forest.report().dangling.len(), 1);
    assert_eq!(forest.report().dangling[0].target, "github-alias");
}
