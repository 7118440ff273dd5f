//! Document-level properties: persistence round trip, referential
//! integrity, catalog propagation and history.

use kurbo::{Point, Rect};
use lineframe_core::document::{MemberOptions, MemberPatch, SupportOptions, SurfaceOptions};
use lineframe_core::elements::{PointForces, SectionSize};
use lineframe_core::{
    Color, Document, FormatError, History, LoadKind, MemberKind, NewSection, SectionKind, SectionPatch,
    SurfaceGeometry, SurfaceKind, ValidationError,
};

const BEAM: SectionKind = SectionKind::Member(MemberKind::Beam);

fn member(doc: &mut Document, a: (f64, f64), b: (f64, f64), options: MemberOptions) -> String {
    let start = doc.find_or_create_node(Point::new(a.0, a.1), 0.01).unwrap();
    let end = doc.find_or_create_node(Point::new(b.0, b.1), 0.01).unwrap();
    doc.add_member(&start, &end, options).unwrap()
}

fn sample() -> Document {
    let mut doc = Document::new();
    doc.meta.name = "warehouse".to_string();
    doc.add_section(
        NewSection::new(BEAM, "B300x500")
            .with_size(300.0, 500.0)
            .with_color(Color::rgb(0x12, 0x34, 0x56)),
    )
    .unwrap();
    doc.add_section(NewSection::new(BEAM, "UNUSED")).unwrap();

    member(&mut doc, (0.0, 0.0), (5000.0, 0.0), MemberOptions::default());
    let custom = MemberOptions {
        section_name: Some("B300x500".into()),
        ..MemberOptions::default()
    };
    member(&mut doc, (5000.0, 0.0), (5000.0, 4000.0), custom);
    let column = MemberOptions {
        kind: MemberKind::Column,
        ..MemberOptions::default()
    };
    member(&mut doc, (0.0, 0.0), (0.0, 4000.0), column);

    let floor = SurfaceGeometry::rect(Point::new(0.0, 0.0), Point::new(5000.0, 4000.0));
    doc.add_surface(floor, SurfaceOptions::default()).unwrap();
    let outline = SurfaceGeometry::Polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(5000.0, 0.0),
        Point::new(5000.0, 4000.0),
        Point::new(0.0, 4000.0),
    ]);
    let exterior = SurfaceOptions {
        kind: Some(SurfaceKind::ExteriorWall),
        ..SurfaceOptions::default()
    };
    doc.add_surface(outline, exterior).unwrap();

    doc.add_load(
        LoadKind::Area {
            rect: Rect::new(0.0, 0.0, 5000.0, 4000.0),
            value: 2.5,
        },
        None,
    )
    .unwrap();
    doc.add_load(
        LoadKind::Point {
            at: Point::new(2500.0, 2000.0),
            forces: PointForces {
                fz: -10.0,
                ..PointForces::default()
            },
        },
        None,
    )
    .unwrap();
    doc.add_support(Point::new(0.0, 0.0), SupportOptions::default()).unwrap();
    doc
}

#[test]
fn test_round_trip_preserves_resolved_state() {
    let doc = sample();
    let json = doc.to_json().unwrap();
    let loaded = Document::from_json(&json).unwrap();

    assert_eq!(loaded.meta, doc.meta);
    assert_eq!(loaded.settings, doc.settings);
    assert_eq!(loaded.levels(), doc.levels());
    assert_eq!(loaded.nodes(), doc.nodes());
    assert_eq!(loaded.members().len(), doc.members().len());
    for (a, b) in doc.members().iter().zip(loaded.members()) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.section_name, b.section_name);
        assert_eq!(a.section, b.section);
        assert_eq!(a.material, b.material);
        assert_eq!(a.color, b.color);
        assert_eq!(a.start_node, b.start_node);
        assert_eq!(a.end_node, b.end_node);
        assert_eq!(a.top_level_id, b.top_level_id);
    }
    assert_eq!(loaded.surfaces(), doc.surfaces());
    assert_eq!(loaded.loads(), doc.loads());
    assert_eq!(loaded.supports(), doc.supports());

    // Unreferenced custom entries are not written to the document file.
    assert!(loaded.catalog().section(BEAM, "B300x500").is_some());
    assert!(loaded.catalog().section(BEAM, "UNUSED").is_none());
}

#[test]
fn test_loaded_ids_continue_from_highest_suffix() {
    let json = sample().to_json().unwrap();
    let mut loaded = Document::from_json(&json).unwrap();
    let next = member(&mut loaded, (9000.0, 0.0), (9000.0, 5000.0), MemberOptions::default());
    assert_eq!(next, "M4");
    assert_eq!(loaded.add_level("3F", 5600.0).unwrap(), "L2");
}

#[test]
fn test_referential_integrity() {
    let mut doc = Document::new();
    doc.add_section(NewSection::new(BEAM, "B1")).unwrap();
    let level = doc.add_level("3F", 5600.0).unwrap();
    let options = MemberOptions {
        section_name: Some("B1".into()),
        level_id: Some(level.clone()),
        ..MemberOptions::default()
    };
    let id = member(&mut doc, (0.0, 0.0), (5000.0, 0.0), options);

    assert!(matches!(doc.remove_section(BEAM, "B1"), Err(ValidationError::InUse(_))));
    assert!(matches!(doc.remove_level(&level), Err(ValidationError::InUse(_))));

    let retarget = MemberPatch {
        section_name: Some("_G".into()),
        level_id: Some("L0".into()),
        ..MemberPatch::default()
    };
    doc.update_member(&id, retarget).unwrap();
    assert!(doc.remove_section(BEAM, "B1").is_ok());
    assert!(doc.remove_level(&level).is_ok());
}

#[test]
fn test_default_beam_then_custom_section() {
    let mut doc = Document::new();
    let id = member(&mut doc, (0.0, 0.0), (5000.0, 0.0), MemberOptions::default());
    let m = doc.member(&id).unwrap();
    assert_eq!(m.section_name, "_G");
    assert_eq!(m.section, SectionSize::new(200.0, 400.0));
    assert_eq!(m.color.to_hex(), "#666666");

    doc.add_section(
        NewSection::new(BEAM, "B300x500")
            .with_size(300.0, 500.0)
            .with_color(Color::rgb(0x12, 0x34, 0x56)),
    )
    .unwrap();
    let patch = MemberPatch {
        section_name: Some("B300x500".into()),
        ..MemberPatch::default()
    };
    let m = doc.update_member(&id, patch).unwrap();
    assert_eq!(m.section, SectionSize::new(300.0, 500.0));
    assert_eq!(m.color.to_hex(), "#123456");

    let direct = MemberPatch {
        color: Some(Color::rgb(0xff, 0, 0)),
        ..MemberPatch::default()
    };
    assert_eq!(doc.update_member(&id, direct).unwrap().color.to_hex(), "#123456");
}

#[test]
fn test_catalog_propagation_leaves_others_untouched() {
    let mut doc = sample();
    let patch = SectionPatch {
        b: Some(350.0),
        h: Some(700.0),
        color: Some(Color::rgb(0xab, 0xcd, 0xef)),
    };
    doc.update_section(BEAM, "B300x500", patch).unwrap();
    for m in doc.members() {
        if m.section_name == "B300x500" {
            assert_eq!(m.section, SectionSize::new(350.0, 700.0));
            assert_eq!(m.color.to_hex(), "#abcdef");
        } else {
            assert_ne!(m.color.to_hex(), "#abcdef");
        }
    }
}

#[test]
fn test_duplicate_level_elevation_rejected() {
    let mut doc = Document::new();
    let before = doc.levels().to_vec();
    assert_eq!(doc.add_level("dup", 2800.0), Err(ValidationError::DuplicateElevation(2800.0)));
    assert_eq!(doc.levels(), before.as_slice());
}

#[test]
fn test_non_finite_input_keeps_document_loadable() {
    let mut doc = sample();
    assert_eq!(doc.add_level("A", f64::NAN), Err(ValidationError::NonFinite));
    assert_eq!(doc.add_level("B", f64::INFINITY), Err(ValidationError::NonFinite));
    assert_eq!(
        doc.add_support(Point::new(f64::NAN, 0.0), SupportOptions::default()),
        Err(ValidationError::NonFinite)
    );
    let area = LoadKind::Area {
        rect: Rect::new(0.0, 0.0, 1000.0, 1000.0),
        value: f64::INFINITY,
    };
    assert_eq!(doc.add_load(area, None), Err(ValidationError::NonFinite));
    let outline = SurfaceGeometry::Polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(f64::NAN, 0.0),
        Point::new(0.0, 1000.0),
    ]);
    assert_eq!(
        doc.add_surface(outline, SurfaceOptions::default()),
        Err(ValidationError::NonFinite)
    );

    let json = doc.to_json().unwrap();
    let loaded = Document::from_json(&json).unwrap();
    assert_eq!(loaded.levels(), doc.levels());
}

#[test]
fn test_undo_redo_idempotent() {
    let mut doc = Document::new();
    let mut history = History::new();
    history.save(&doc);
    member(&mut doc, (0.0, 0.0), (5000.0, 0.0), MemberOptions::default());
    history.save(&doc);
    doc.add_support(Point::new(0.0, 0.0), SupportOptions::default()).unwrap();

    let before = doc.snapshot();
    assert!(history.undo(&mut doc));
    assert!(history.redo(&mut doc));
    assert_eq!(doc.snapshot(), before);

    assert!(history.undo(&mut doc));
    history.save(&doc);
    assert!(!history.can_redo());
}

#[test]
fn test_load_keeps_imported_definitions() {
    let mut doc = Document::new();
    let defs = r##"{
        "userDefinitions": true,
        "sections": [
            {"target": "member", "type": "beam", "name": "IMPORTED", "b": 250, "h": 450, "color": "#abcdef"},
            {"target": "member", "type": "beam", "name": "_G", "isDefault": true}
        ],
        "springs": [{"symbol": "SP1", "memo": "k=10"}]
    }"##;
    assert_eq!(doc.import_user_definitions(defs).unwrap(), 2);

    let other = sample().to_json().unwrap();
    doc.load_json(&other).unwrap();
    assert!(doc.catalog().section(BEAM, "IMPORTED").is_some());
    assert!(doc.catalog().spring("SP1").is_some());
    assert_eq!(doc.meta.name, "warehouse");

    let exported = doc.export_user_definitions().unwrap().unwrap();
    assert!(exported.contains("IMPORTED"));
    assert!(!exported.contains("\"_G\""));
}

#[test]
fn test_divergent_default_rejected_atomically() {
    let mut doc = sample();
    let bad = r##"{
        "schemaVersion": 3,
        "sectionCatalog": [
            {"target": "member", "type": "beam", "name": "_G", "material": "steel",
             "b": 999, "h": 400, "color": "#666666", "isDefault": false}
        ]
    }"##;
    assert!(matches!(doc.load_json(bad), Err(FormatError::ReservedCollision(_))));
    assert_eq!(doc.members().len(), 3);
    assert_eq!(doc.meta.name, "warehouse");

    let same = r##"{
        "schemaVersion": 3,
        "sectionCatalog": [
            {"target": "member", "type": "beam", "name": "_G", "material": "steel",
             "b": 200, "h": 400, "color": "#666666", "isDefault": true}
        ]
    }"##;
    doc.load_json(same).unwrap();
    assert!(doc.members().is_empty());
}

#[test]
fn test_unsupported_version_rejected() {
    let result = Document::from_json(r#"{"schemaVersion": 99}"#);
    assert!(matches!(result, Err(FormatError::UnsupportedVersion(99))));
}

#[test]
fn test_legacy_inline_section_binds_custom_entry() {
    let legacy = r##"{
        "nodes": [{"id": "N1", "x": 0, "y": 0}, {"id": "N2", "x": 4000, "y": 0}],
        "members": [{
            "type": "brace", "startNodeId": "N1", "endNodeId": "N2",
            "section": {"b": 60, "h": 60}, "material": "steel", "color": "#222222",
            "iEnd": {"fixity": "pin"}, "jEnd": {"type": "bogus"}
        }]
    }"##;
    let doc = Document::from_json(legacy).unwrap();
    let m = &doc.members()[0];
    assert_eq!(m.kind, MemberKind::HBrace);
    assert_eq!(m.section_name, "U1");
    assert_eq!(m.section, SectionSize::new(60.0, 60.0));
    assert_eq!(m.color.to_hex(), "#222222");
    assert_eq!(m.end_i.condition.as_str(), "pin");
    assert_eq!(m.end_j.condition.as_str(), "rigid");
}
