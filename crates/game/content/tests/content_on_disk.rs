//! Loads a content directory from disk and runs a plan against it.

use std::fs;

use accord_content::{ConfigLoader, TemplateLoader, WorldLoader};
use accord_core::{Feasibility, PlanInstance, Realm};

const TEMPLATES: &str = r#"
(
    templates: [
        (
            name: "sew",
            phases: [
                (actions: [
                    (selector: Tag("needle"), kind: Wield, name: Some("needle")),
                    (selector: Tag("thread"), kind: Consume(quantity: 2)),
                ]),
            ],
        ),
        (
            name: "lift-chest",
            phases: [(actions: [(selector: Tag("chest"), kind: Wield)])],
        ),
    ],
)
"#;

const WORLD: &str = r#"
(
    locations: ["workshop"],
    actors: [
        (name: "tailor", location: Some("workshop")),
        (
            name: "child",
            location: Some("workshop"),
            limbs: Some([
                (name: "left hand", kind: Hand, strength: Feeble),
                (name: "right hand", kind: Hand, strength: Feeble),
            ]),
        ),
    ],
    items: [
        (name: "needle", tags: ["needle"], place: Carried("tailor")),
        (name: "thread", tags: ["thread"], quantity: 5, place: Ground("workshop")),
        (name: "chest", tags: ["chest"], hands: 2, min_strength: Strong, place: Ground("workshop")),
    ],
)
"#;

const CONFIG: &str = r#"
default_proposal_ticks = 60
max_proposals_per_target = 2
"#;

#[test]
fn loaded_content_drives_a_realm() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("templates.ron"), TEMPLATES).unwrap();
    fs::write(dir.path().join("world.ron"), WORLD).unwrap();
    fs::write(dir.path().join("core.toml"), CONFIG).unwrap();

    let templates = TemplateLoader::load(&dir.path().join("templates.ron")).unwrap();
    let loaded = WorldLoader::load(&dir.path().join("world.ron")).unwrap();
    let config = ConfigLoader::load(&dir.path().join("core.toml")).unwrap();
    assert_eq!(config.max_proposals_per_target, 2);

    let tailor = loaded.require("tailor").unwrap();
    let child = loaded.require("child").unwrap();
    let thread = loaded.require("thread").unwrap();
    let mut realm = Realm::with_world(loaded.world.clone(), config);
    assert_eq!(realm.config().default_proposal_ticks, 60);

    let mut sew = PlanInstance::new(templates.require("sew").unwrap(), tailor);
    assert_eq!(sew.check_feasibility(realm.world()), Feasibility::Feasible);
    sew.execute(realm.world_mut()).unwrap();
    assert!(sew.finalize(realm.world_mut(), true).is_none());
    assert_eq!(realm.world().item_state(thread).map(|t| t.quantity), Some(3));

    let mut lift = PlanInstance::new(templates.require("lift-chest").unwrap(), child);
    assert_eq!(lift.check_feasibility(realm.world()), Feasibility::InsufficientWielders);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.ron");
    let err = WorldLoader::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.ron"));
}
