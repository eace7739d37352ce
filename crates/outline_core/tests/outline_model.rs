use outline_core::{
    ContentKind, NodeDetail, NodeKind, NodePath, Outline, OutlineError, OutlineNode,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn sample_outline() -> Outline {
    Outline::from_sections([
        OutlineNode::section("Getting Started").with_children([
            OutlineNode::unit("Greetings").with_children([OutlineNode::activity(
                "Say hello",
                Some("lesson-1".to_string()),
            )
            .with_children([
                OutlineNode::content("Hello video", ContentKind::LessonItem, json!({"media": 1})),
                OutlineNode::content("Hello quiz", ContentKind::QuizItem, json!({"questions": 3})),
            ])]),
            OutlineNode::unit("Numbers"),
        ]),
        OutlineNode::section("Grammar"),
    ])
}

#[test]
fn builders_number_children_by_position() {
    let outline = sample_outline();

    assert_eq!(outline.sections[0].order, 1);
    assert_eq!(outline.sections[1].order, 2);
    let units = outline.sections[0].children();
    assert_eq!(units[0].order, 1);
    assert_eq!(units[1].order, 2);
    assert!(outline.check_orders().is_ok());
    assert!(outline.validate().is_ok());
    assert_eq!(outline.node_count(), 7);
}

#[test]
fn get_and_find_path_agree() {
    let outline = sample_outline();
    let quiz_path = NodePath::new(vec![0, 0, 0, 1]);

    let quiz = outline.get(&quiz_path).unwrap();
    assert_eq!(quiz.name, "Hello quiz");
    assert_eq!(quiz.kind(), NodeKind::Content);
    assert_eq!(quiz.content_kind(), Some(ContentKind::QuizItem));
    assert_eq!(outline.find_path(quiz.id), Some(quiz_path));

    assert!(outline.get(&NodePath::root()).is_none());
    assert!(outline.get(&NodePath::new(vec![0, 5])).is_none());
    assert!(outline.find_path(Uuid::new_v4()).is_none());
}

#[test]
fn children_at_root_returns_sections() {
    let outline = sample_outline();
    let sections = outline.children_at(&NodePath::root()).unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(outline.slot_kind(&NodePath::root()), Some(None));
    assert_eq!(
        outline.slot_kind(&NodePath::new(vec![0])),
        Some(Some(NodeKind::Section))
    );
    assert_eq!(outline.slot_kind(&NodePath::new(vec![9])), None);
}

#[test]
fn walk_visits_nodes_in_pre_order_with_paths() {
    let outline = sample_outline();
    let mut visited = Vec::new();
    outline.walk(|path, node| visited.push((path.to_string(), node.name.clone())));

    assert_eq!(visited[0], ("/0".to_string(), "Getting Started".to_string()));
    assert_eq!(visited[1], ("/0/0".to_string(), "Greetings".to_string()));
    assert_eq!(visited[3], ("/0/0/0/0".to_string(), "Hello video".to_string()));
    assert_eq!(visited[5], ("/0/1".to_string(), "Numbers".to_string()));
    assert_eq!(visited[6], ("/1".to_string(), "Grammar".to_string()));
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = OutlineNode::with_id(Uuid::nil(), NodeDetail::Unit, "x").unwrap_err();
    assert_eq!(err, OutlineError::NilId);
}

#[test]
fn validate_rejects_nil_id_anywhere_in_outline() {
    let mut unit = OutlineNode::unit("U");
    unit.id = Uuid::nil();
    let outline = Outline::from_sections([OutlineNode::section("S").with_children([unit])]);

    assert_eq!(outline.validate(), Err(OutlineError::NilId));
    assert!(sample_outline().validate().is_ok());
}

#[test]
fn validate_rejects_nil_id_from_snapshot_json() {
    let outline: Outline = serde_json::from_value(json!({
        "sections": [{
            "id": Uuid::nil(),
            "name": "S",
            "order": 1,
            "level": "section",
            "children": []
        }]
    }))
    .unwrap();

    assert_eq!(outline.validate(), Err(OutlineError::NilId));
}

#[test]
fn validate_rejects_duplicate_ids_across_levels() {
    let id = Uuid::new_v4();
    let section = OutlineNode::with_id(id, NodeDetail::Section, "S").unwrap();
    let unit = OutlineNode::with_id(id, NodeDetail::Unit, "U").unwrap();
    let outline = Outline::from_sections([section.with_children([unit])]);

    assert_eq!(outline.validate(), Err(OutlineError::DuplicateId(id)));
}

#[test]
fn validate_rejects_activity_directly_under_section() {
    let outline = Outline::from_sections([
        OutlineNode::section("S").with_children([OutlineNode::activity("A", None)])
    ]);

    assert_eq!(
        outline.validate(),
        Err(OutlineError::InvalidChildLevel {
            parent: Some(NodeKind::Section),
            child: NodeKind::Activity,
        })
    );
}

#[test]
fn validate_rejects_non_section_at_root() {
    let outline = Outline {
        sections: vec![Arc::new(OutlineNode::unit("U"))],
    };
    assert!(matches!(
        outline.validate(),
        Err(OutlineError::InvalidChildLevel {
            parent: None,
            child: NodeKind::Unit
        })
    ));
}

#[test]
fn content_items_may_nest() {
    let outline = Outline::from_sections([OutlineNode::section("S").with_children([
        OutlineNode::unit("U").with_children([OutlineNode::activity("A", None).with_children([
            OutlineNode::content("Folder", ContentKind::LessonItem, json!(null)).with_children([
                OutlineNode::content("Inner", ContentKind::QuizItem, json!(null)),
            ]),
        ])]),
    ])]);

    assert!(outline.validate().is_ok());
    assert_eq!(
        outline.get(&NodePath::new(vec![0, 0, 0, 0, 0])).unwrap().name,
        "Inner"
    );
}

#[test]
fn check_orders_reports_first_gap() {
    let mut outline = sample_outline();
    let section = Arc::make_mut(&mut outline.sections[0]);
    Arc::make_mut(&mut section.children[1]).order = 5;

    assert_eq!(
        outline.check_orders(),
        Err(OutlineError::InvalidOrder {
            path: NodePath::new(vec![0]),
            expected: 2,
            found: 5,
        })
    );
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let node = OutlineNode::with_id(
        id,
        NodeDetail::Content {
            kind: ContentKind::QuizItem,
            payload: json!({"questions": [1, 2]}),
        },
        "Checkpoint",
    )
    .unwrap();

    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["id"], id.to_string());
    assert_eq!(value["name"], "Checkpoint");
    assert_eq!(value["order"], 0);
    assert_eq!(value["level"], "content");
    assert_eq!(value["kind"], "quiz_item");
    assert_eq!(value["payload"]["questions"][1], 2);
    assert_eq!(value["children"], json!([]));

    let decoded: OutlineNode = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, node);
}

#[test]
fn snapshot_deserializes_from_nested_json() {
    let value = json!({
        "sections": [{
            "id": "11111111-2222-4333-8444-000000000001",
            "name": "Basics",
            "order": 1,
            "level": "section",
            "children": [{
                "id": "11111111-2222-4333-8444-000000000002",
                "name": "Unit 1",
                "order": 1,
                "level": "unit",
                "children": [{
                    "id": "11111111-2222-4333-8444-000000000003",
                    "name": "Warmup",
                    "order": 1,
                    "level": "activity",
                    "content_ref": "doc-7"
                }]
            }]
        }]
    });

    let outline: Outline = serde_json::from_value(value).unwrap();
    assert!(outline.validate().is_ok());
    let activity = outline.get(&NodePath::new(vec![0, 0, 0])).unwrap();
    assert_eq!(
        activity.detail,
        NodeDetail::Activity {
            content_ref: Some("doc-7".to_string())
        }
    );
    assert!(activity.children.is_empty());
    assert!(activity.payload().is_none());
}
