mod common;

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use common::{classes_dir, hierarchy};
use devscope::class::{Hierarchy, ROOT_CLASS};
use devscope::{ExtensionRegistry, HierarchyLoader};

/// Write every class definition back into a class directory.
fn write_tree(hierarchy: &Hierarchy, dir: &Path) {
    for class in hierarchy.iter() {
        let name = if class.is_root() {
            ROOT_CLASS
        } else {
            class.full_name()
        };
        let file = dir.join(format!("{name}.yaml"));
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, serde_yaml::to_string(class.definition()).unwrap()).unwrap();
    }
}

#[test]
fn test_fixture_tree() {
    let hierarchy = hierarchy();
    let names: Vec<&str> = hierarchy.iter().map(|c| c.full_name()).collect();
    for expected in [
        "generic",
        "adva",
        "adva/fsp3kr7",
        "ceraos",
        "ceraos/ip10",
        "ekinops",
        "routerOS",
        "routerOS/chr",
        "timos",
    ] {
        assert!(names.contains(&expected), "missing class {expected}");
    }

    for class in ["adva/fsp3kr7", "ceraos/ip10", "ekinops", "timos"] {
        assert!(hierarchy.find(class).unwrap().extension().is_some(), "{class}");
    }
    assert!(hierarchy.find("adva").unwrap().extension().is_none());
}

#[test]
fn test_load_serialize_load() {
    let original = hierarchy();
    let dir = tempfile::tempdir().unwrap();
    write_tree(&original, dir.path());
    let mappings = dir.path().join("mappings");
    fs::create_dir(&mappings).unwrap();
    fs::copy(
        classes_dir().join("mappings/ifType.yaml"),
        mappings.join("ifType.yaml"),
    )
    .unwrap();

    let reloaded = HierarchyLoader::new(dir.path())
        .mappings(&mappings)
        .extensions(ExtensionRegistry::with_builtin())
        .load()
        .unwrap();

    assert_eq!(reloaded.len(), original.len());
    for class in original.iter() {
        let other = reloaded
            .find(class.full_name())
            .unwrap_or_else(|| panic!("{} lost", class.full_name()));
        assert_eq!(other.definition(), class.definition());
        assert_eq!(other.components(), class.components());
        assert_eq!(other.try_to_match_last(), class.try_to_match_last());
        assert_eq!(other.max_repetitions(), class.max_repetitions());
        assert_eq!(other.extension().is_some(), class.extension().is_some());

        let parent = |h: &Hierarchy, c: &devscope::DeviceClass| {
            c.parent().and_then(|p| h.get(p)).map(|p| p.full_name().to_string())
        };
        assert_eq!(parent(&reloaded, other), parent(&original, class));
    }
}

#[test]
fn test_empty_and_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("generic.yaml"), "name: generic\n").unwrap();
    fs::write(
        dir.path().join("broken.yaml"),
        "name: broken\nmatch:\n  logical_operator: AND\n  conditions: []\n",
    )
    .unwrap();

    let err = HierarchyLoader::new(dir.path())
        .extensions(ExtensionRegistry::new())
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("broken"), "{err}");
}

#[test]
fn test_unknown_mapping_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("generic.yaml"),
        r#"
name: generic
components:
  interfaces:
    properties:
      values:
        ifType:
          oid: 1.3.6.1.2.1.2.2.1.3
          operators:
            - type: modify
              modify_method: map
              mappings: missing.yaml
"#,
    )
    .unwrap();

    let err = HierarchyLoader::new(dir.path())
        .extensions(ExtensionRegistry::new())
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("missing.yaml"), "{err}");
}
