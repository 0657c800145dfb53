use ice_core::{Document, ItemPath, PathKind};
use serde_json::json;

const ITEMS: &str = r#"
epic_sword:
  display:
    material: DIAMOND_SWORD
    shiny: "true"
  actions:
    all:
      - condition: 'js: vars("%cmi_user_balance%") >= 50'
        actions:
          - "console: cmi money take %player_name% 50"
          - "console: say bought"
plain_stone:
  display:
    material: STONE
"#;

fn load_items() -> Document {
    Document::load(ITEMS).expect("load items")
}

fn p(s: &str) -> ItemPath {
    s.parse().expect("path")
}

#[test]
fn discover_paths_in_fixed_order() {
    let doc = load_items();
    let found = ice_core::discover_paths(doc.item("epic_sword").unwrap());
    let paths: Vec<String> = found.iter().map(|d| d.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["display.shiny", "actions.all.0.condition", "actions.all.0.actions"]
    );
    let kinds: Vec<PathKind> = found.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![PathKind::String, PathKind::String, PathKind::Array]);

    assert!(ice_core::discover_paths(doc.item("plain_stone").unwrap()).is_empty());
}

#[test]
fn discover_skips_falsy_fields() {
    let item = json!({
        "display": { "shiny": false },
        "actions": {
            "left": [ { "condition": "", "actions": [] }, { "other": 1 } ],
            "right": "not a list"
        }
    });
    let found = ice_core::discover_paths(&item);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path.to_string(), "actions.left.0.actions");
    assert_eq!(found[0].kind, PathKind::Array);
}

#[test]
fn path_kind_follows_final_segment() {
    assert_eq!(p("actions.all.0.actions").kind(), PathKind::Array);
    assert_eq!(p("display.lore").kind(), PathKind::Array);
    assert_eq!(p("actions.all.0.condition").kind(), PathKind::String);
    assert_eq!(p("display.shiny").kind(), PathKind::String);
}

#[test]
fn item_path_text_forms() {
    let path = p("actions.all.0.condition");
    assert_eq!(path.segments().len(), 4);
    assert_eq!(path.to_string(), "actions.all.0.condition");
    assert_eq!(path.to_pointer("epic_sword"), "/epic_sword/actions/all/0/condition");

    let dotted = p(r#"["actions","on.click","0","actions"]"#);
    assert_eq!(dotted.segments()[1], "on.click");
    assert_eq!(dotted.to_string(), r#"["actions","on.click","0","actions"]"#);
    assert_eq!(ItemPath::new(["a/b", "c~d"]).to_pointer("x"), "/x/a~1b/c~0d");

    assert!("".parse::<ItemPath>().is_err());
}

#[test]
fn accessor_get_and_set() {
    let mut doc = load_items();
    let cond = p("actions.all.0.condition");
    assert_eq!(
        ice_core::path::get(&doc, "epic_sword", &cond),
        Some(&json!(r#"js: vars("%cmi_user_balance%") >= 50"#))
    );
    assert!(ice_core::path::get(&doc, "epic_sword", &p("actions.none.0.condition")).is_none());
    assert!(ice_core::path::get(&doc, "missing_item", &cond).is_none());

    ice_core::path::set(&mut doc, "epic_sword", &cond, json!("js: true")).unwrap();
    assert_eq!(ice_core::path::get(&doc, "epic_sword", &cond), Some(&json!("js: true")));

    // appending at index == len is allowed
    let next = p("actions.all.0.actions.2");
    ice_core::path::set(&mut doc, "epic_sword", &next, json!("console: say more")).unwrap();
    assert_eq!(ice_core::path::get(&doc, "epic_sword", &next), Some(&json!("console: say more")));
}

#[test]
fn accessor_set_on_missing_parent_is_noop() {
    let mut doc = load_items();
    let before = doc.clone();
    let err = ice_core::path::set(&mut doc, "epic_sword", &p("actions.missing.0.condition"), json!("x")).unwrap_err();
    assert!(matches!(err, ice_core::PathError::NotFound { .. }));
    let err = ice_core::path::set(&mut doc, "epic_sword", &p("display.material.inner"), json!("x")).unwrap_err();
    assert!(matches!(err, ice_core::PathError::NotFound { .. }));
    assert!(ice_core::path::set(&mut doc, "epic_sword", &p("actions.all.5"), json!("x")).is_err());
    assert_eq!(doc, before);
}

#[test]
fn document_load_errors() {
    match Document::load("a: b: c\n") {
        Err(ice_core::DocumentError::Syntax { line, reason }) => {
            assert_eq!(line, Some(1));
            assert!(!reason.is_empty());
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
    assert!(matches!(
        Document::load("- a\n- b\n"),
        Err(ice_core::DocumentError::NotAMapping("sequence"))
    ));
    let empty = Document::load("   \n").unwrap();
    assert!(empty.is_empty());
}

#[test]
fn document_dump_reloads_identically() {
    let mut doc = load_items();
    let cond = p("actions.all.0.condition");
    let records = ice_core::parse_scalar("js:\n  vars(\"%player_level%\") >= 10 &&\n  vars(\"%cmi_user_balance%\") >= 5");
    ice_core::commit_conditions(&mut doc, "epic_sword", &cond, &records).unwrap();

    let yaml = doc.dump(ice_core::DumpFormat::Yaml).unwrap();
    assert!(yaml.contains("epic_sword:"));
    let reloaded = Document::load(&yaml).unwrap();
    assert_eq!(reloaded, doc);
    assert_eq!(reloaded.item_keys().collect::<Vec<_>>(), vec!["epic_sword", "plain_stone"]);

    let js = doc.dump(ice_core::DumpFormat::Json).unwrap();
    let v: serde_json::Value = serde_json::from_str(&js).unwrap();
    assert_eq!(&v, doc.root());
}

#[test]
fn session_add_edit_delete_commit() {
    use ice_core::{CommitOutcome, ConditionKind, EditSession, SessionError};

    let mut doc = load_items();
    let cond = p("actions.all.0.condition");
    let mut session = EditSession::open(&doc, "epic_sword", cond.clone()).unwrap();
    assert_eq!(session.kind(), PathKind::String);
    assert_eq!(session.records().len(), 1);
    assert_eq!(session.selected().map(|(i, _)| i), Some(0));

    let idx = session.add_condition();
    assert_eq!(idx, 1);
    assert_eq!(session.selected().map(|(i, _)| i), Some(1));
    {
        let rec = session.record_mut(idx).unwrap();
        rec.set_kind(ConditionKind::MythicMobs);
        rec.set_name("Sword");
        rec.set_key("epic_sword");
        rec.set_amount(1.0);
    }
    assert!(session.is_dirty());
    assert_eq!(session.commit(&mut doc).unwrap(), CommitOutcome::Written);
    assert_eq!(
        ice_core::path::get(&doc, "epic_sword", &cond),
        Some(&json!(
            "js:\n  vars(\"%cmi_user_balance%\") >= 50 &&\n  vars(\"%checkitem_amount_nameequals:Sword,nbtstrings:PublicBukkitValues..mythicmobs:type=epic_sword%\") >= 1"
        ))
    );
    assert_eq!(
        session.records()[1].raw_text,
        "vars(\"%checkitem_amount_nameequals:Sword,nbtstrings:PublicBukkitValues..mythicmobs:type=epic_sword%\") >= 1"
    );
    assert_eq!(session.commit(&mut doc).unwrap(), CommitOutcome::Unchanged);

    let removed = session.delete_condition(0).unwrap();
    assert_eq!(removed.kind(), ConditionKind::Money);
    assert!(session.selected().is_none());
    assert!(matches!(
        session.delete_condition(7),
        Err(SessionError::IndexOutOfRange { index: 7, len: 1 })
    ));
    session.commit(&mut doc).unwrap();

    let reopened = EditSession::open(&doc, "epic_sword", cond).unwrap();
    assert_eq!(reopened.records().len(), 1);
    assert_eq!(reopened.records()[0].kind(), ConditionKind::MythicMobs);
    assert_eq!(reopened.records()[0].use_name(), Some(true));
}

#[test]
fn session_unchanged_commit_keeps_value_type() {
    use ice_core::{CommitOutcome, EditSession};

    let mut doc = Document::load("gem:\n  display:\n    shiny: true\n").unwrap();
    let shiny = p("display.shiny");
    let mut session = EditSession::open(&doc, "gem", shiny.clone()).unwrap();
    assert_eq!(session.records().len(), 1);
    assert!(!session.records()[0].is_parsed());
    assert_eq!(session.commit(&mut doc).unwrap(), CommitOutcome::Unchanged);
    assert_eq!(ice_core::path::get(&doc, "gem", &shiny), Some(&json!(true)));
}

#[test]
fn session_open_errors() {
    use ice_core::{EditSession, SessionError};

    let doc = load_items();
    assert!(matches!(
        EditSession::open(&doc, "nope", p("display.shiny")),
        Err(SessionError::UnknownItem(_))
    ));
    assert!(matches!(
        EditSession::open(&doc, "epic_sword", p("display")),
        Err(SessionError::UnsupportedValue { found: "mapping", .. })
    ));
    // missing path reads as empty; adding then commits a fresh field
    let mut doc = doc;
    let mut session = EditSession::open(&doc, "plain_stone", p("display.shiny")).unwrap();
    assert!(session.records().is_empty());
    session.add_condition();
    session.commit(&mut doc).unwrap();
    assert_eq!(
        ice_core::path::get(&doc, "plain_stone", &p("display.shiny")),
        Some(&json!("js: vars(\"%cmi_user_balance%\") >= 0"))
    );
}

#[test]
fn commit_empty_records() {
    use ice_core::CommitOutcome;

    let mut doc = load_items();
    let cond = p("actions.all.0.condition");
    let acts = p("actions.all.0.actions");
    assert_eq!(
        ice_core::commit_conditions(&mut doc, "epic_sword", &cond, &[]).unwrap(),
        CommitOutcome::Removed
    );
    assert!(ice_core::path::get(&doc, "epic_sword", &cond).is_none());
    assert_eq!(
        ice_core::commit_conditions(&mut doc, "epic_sword", &acts, &[]).unwrap(),
        CommitOutcome::Written
    );
    assert_eq!(ice_core::path::get(&doc, "epic_sword", &acts), Some(&json!([])));
}

const SYNC_ITEMS: &str = r#"
relic:
  actions:
    left:
      - condition: 'js: vars("%player_level%") >= 5'
        actions:
          - "console: say hi"
          - "console: cmi money take %player_name% 5"
      - condition: 'js: vars("%cmi_user_balance%") >= 1 && player.isOp()'
    right:
      - actions:
          - "console: cmi money take %player_name% 1"
"#;

#[test]
fn sync_string_source_updates_only_string_paths() {
    let mut doc = Document::load(SYNC_ITEMS).unwrap();
    let source = p("actions.left.0.condition");
    let before_left_actions = ice_core::path::get(&doc, "relic", &p("actions.left.0.actions")).cloned();
    let before_right_actions = ice_core::path::get(&doc, "relic", &p("actions.right.0.actions")).cloned();

    let records = ice_core::load_conditions(&doc, "relic", &source).unwrap();
    let report = ice_core::sync_conditions(&mut doc, "relic", &source, &records).unwrap();
    assert_eq!(report.updated_count(), 1);
    assert_eq!(report.updated, vec![p("actions.left.1.condition")]);

    assert_eq!(
        ice_core::path::get(&doc, "relic", &p("actions.left.1.condition")),
        Some(&json!("js: vars(\"%player_level%\") >= 5"))
    );
    assert_eq!(
        ice_core::path::get(&doc, "relic", &p("actions.left.0.actions")).cloned(),
        before_left_actions
    );
    assert_eq!(
        ice_core::path::get(&doc, "relic", &p("actions.right.0.actions")).cloned(),
        before_right_actions
    );
}

#[test]
fn sync_array_source_keeps_target_raw_lines() {
    use ice_core::{Condition, ConditionRecord};

    let mut doc = Document::load(SYNC_ITEMS).unwrap();
    let source = p("actions.right.0.actions");
    let records = vec![
        ConditionRecord::action(Condition::Money { amount: 20.0 }),
        ConditionRecord::raw("console: say only at source"),
    ];
    let report = ice_core::sync_conditions(&mut doc, "relic", &source, &records).unwrap();
    assert_eq!(report.updated, vec![p("actions.left.0.actions")]);
    assert_eq!(
        ice_core::path::get(&doc, "relic", &p("actions.left.0.actions")),
        Some(&json!(["console: say hi", "console: cmi money take %player_name% 20"]))
    );
    // source itself is not rewritten by sync
    assert_eq!(
        ice_core::path::get(&doc, "relic", &source),
        Some(&json!(["console: cmi money take %player_name% 1"]))
    );
}

#[test]
fn sync_without_structured_records() {
    use ice_core::{ConditionRecord, SyncError};

    let mut doc = Document::load(SYNC_ITEMS).unwrap();
    let before = doc.clone();
    let source = p("actions.left.0.condition");
    let raw_only = vec![ConditionRecord::raw("player.isOp()")];
    assert_eq!(
        ice_core::sync_conditions(&mut doc, "relic", &source, &raw_only),
        Err(SyncError::NothingToSync)
    );
    assert_eq!(doc, before);

    let records = ice_core::load_conditions(&doc, "relic", &source).unwrap();
    assert_eq!(
        ice_core::sync_conditions(&mut doc, "ghost", &source, &records),
        Err(SyncError::UnknownItem("ghost".into()))
    );
}

#[test]
fn session_sync_uses_current_records() {
    use ice_core::EditSession;

    let mut doc = Document::load(SYNC_ITEMS).unwrap();
    let mut session = EditSession::open(&doc, "relic", p("actions.left.1.condition")).unwrap();
    assert_eq!(session.records().len(), 2);
    session.record_mut(0).unwrap().set_amount(9.0);
    let report = session.sync(&mut doc).unwrap();
    assert_eq!(report.updated, vec![p("actions.left.0.condition")]);
    assert_eq!(
        ice_core::path::get(&doc, "relic", &p("actions.left.0.condition")),
        Some(&json!("js: vars(\"%cmi_user_balance%\") >= 9"))
    );
}

#[test]
fn find_files_and_backups() {
    use ice_core::files;
    use std::fs;
    use tempfile::tempdir;

    let d = tempdir().unwrap();
    let cfg = d.path().join("items");
    fs::create_dir_all(cfg.join("weapons")).unwrap();
    fs::write(cfg.join("weapons/swords.yml"), ITEMS).unwrap();
    fs::write(cfg.join("relics.yaml"), SYNC_ITEMS).unwrap();
    fs::write(cfg.join("notes.txt"), "not yaml").unwrap();

    let found = files::find_item_files(&cfg);
    assert_eq!(found, vec![cfg.join("relics.yaml"), cfg.join("weapons/swords.yml")]);

    let src = cfg.join("weapons/swords.yml");
    let mut doc = files::read_document(&src).unwrap();
    ice_core::path::set(&mut doc, "epic_sword", &p("display.shiny"), json!("js: false")).unwrap();
    let bak = files::backup_file(&src).unwrap();
    assert!(bak.exists());
    files::write_document(&src, &doc).unwrap();
    assert_eq!(files::read_document(&src).unwrap(), doc);
    assert_eq!(files::read_document(&bak).unwrap(), load_items());

    let zip = files::zip_backup_dir(&cfg).unwrap();
    assert!(zip.exists());
    assert_eq!(zip.parent(), Some(d.path()));
    let mut archive = zip::ZipArchive::new(fs::File::open(&zip).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(names, vec!["relics.yaml", "weapons/swords.yml"]);
    let mut entry = archive.by_name("relics.yaml").unwrap();
    let mut text = String::new();
    std::io::Read::read_to_string(&mut entry, &mut text).unwrap();
    assert_eq!(text, SYNC_ITEMS);

    assert!(files::zip_backup_dir(&src).is_err());
    let empty = d.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    assert!(files::zip_backup_dir(&empty).is_err());
}

#[test]
fn merge_keys_are_applied_on_load() {
    let text = r#"
base: &base
  display:
    material: IRON_SWORD
    shiny: 'js: vars("%player_level%") >= 1'
  actions:
    all:
      - actions:
          - "console: say shared"
merged_sword:
  <<: *base
  lore:
    - "a sword"
"#;
    let doc = Document::load(text).unwrap();
    let item = doc.item("merged_sword").unwrap();
    assert!(item.get("<<").is_none());
    assert_eq!(item["display"]["material"], json!("IRON_SWORD"));
    let paths: Vec<String> = ice_core::discover_paths(item).iter().map(|d| d.path.to_string()).collect();
    assert_eq!(paths, vec!["display.shiny", "actions.all.0.actions"]);

    let yaml = doc.dump(ice_core::DumpFormat::Yaml).unwrap();
    assert!(!yaml.contains("<<"));
    assert_eq!(Document::load(&yaml).unwrap(), doc);
}
