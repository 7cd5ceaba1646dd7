//! End-to-end behaviour of expansion and summarization against scripted
//! endpoints.

use ideaink_ai::client::{GenerateError, GeneratorConfig, TextGenerator};
use ideaink_ai::prompt::{GenerationKind, GenerationRequest};
use ideaink_ai::service::{self, CHILD_DISTANCE};
use ideaink_core::mindmap::NodeId;
use ideaink_core::scene::Scene;
use ideaink_core::storage::BoxFuture;
use ideaink_core::{Session, ToolKind};
use kurbo::Point;
use std::sync::Mutex;

/// How the fake endpoint answers.
#[derive(Debug, Clone)]
enum Reply {
    Text(&'static str),
    Status(u16),
}

struct ScriptedGenerator {
    reply: Reply,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        let seen = self.seen.lock().unwrap();
        seen.last().map(|r| r.user_prompt.clone()).unwrap_or_default()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'_, Result<String, GenerateError>> {
        self.seen.lock().unwrap().push(request);
        let reply = self.reply.clone();
        Box::pin(async move {
            match reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Status(status) => Err(GenerateError::Status {
                    status,
                    body: "upstream unavailable".to_string(),
                }),
            }
        })
    }
}

fn scenarios() -> Vec<(&'static str, Reply)> {
    vec![
        (
            "numbered list",
            Reply::Text("1. Soil health\n2. Crop rotation\n3. Companion planting\n4. Water use"),
        ),
        (
            "bare lines",
            Reply::Text("Soil health\nCrop rotation\nCompanion planting\nWater use\nPests\nTools"),
        ),
        ("empty", Reply::Text("")),
        ("http error", Reply::Status(503)),
    ]
}

fn garden() -> (Session, NodeId) {
    let mut session = Session::default();
    let root = session.spawn_node(Point::new(400.0, 300.0), "Garden");
    (session, root)
}

fn children_of(session: &Session, node: &NodeId) -> Vec<NodeId> {
    session
        .scene()
        .mind_node(node)
        .map(|n| n.node.connections.iter().map(|c| c.target_id.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn expansion_always_adds_four_or_five_children() {
    for (name, reply) in scenarios() {
        let (mut session, root) = garden();
        let generator = ScriptedGenerator::new(reply);
        let config = GeneratorConfig::default();

        let added = service::expand(&mut session, &root, &generator, &config)
            .await
            .unwrap();

        assert!((4..=5).contains(&added.len()), "{name}: {} children", added.len());
        assert_eq!(children_of(&session, &root), added, "{name}");
        assert_eq!(session.graph().len(), added.len() + 1, "{name}");
        assert!(!session.is_busy(), "{name}: busy flag left set");

        let origin = Point::new(400.0, 300.0);
        for child in &added {
            let at = session.scene().mind_node(child).unwrap().position();
            assert!((at.distance(origin) - CHILD_DISTANCE).abs() < 1e-6, "{name}");
        }
    }
}

#[tokio::test]
async fn summarization_always_adds_one_child() {
    for (name, reply) in scenarios() {
        let (mut session, root) = garden();
        let generator = ScriptedGenerator::new(reply);
        let config = GeneratorConfig::default();

        let added = service::summarize(&mut session, &root, &generator, &config)
            .await
            .unwrap();

        assert_eq!(added.len(), 1, "{name}");
        assert_eq!(children_of(&session, &root), added, "{name}");
        let child = session.scene().mind_node(&added[0]).unwrap();
        assert!(!child.text().is_empty(), "{name}");
        assert_eq!(child.position(), Point::new(400.0, 500.0), "{name}");
        assert!(!session.is_busy(), "{name}");
    }
}

#[tokio::test]
async fn new_children_are_wired_like_any_node() {
    let (mut session, root) = garden();
    let generator = ScriptedGenerator::new(Reply::Text("1. A\n2. B\n3. C\n4. D"));
    let added = service::expand(&mut session, &root, &generator, &GeneratorConfig::default())
        .await
        .unwrap();

    for child in &added {
        let shape = session.scene().node_shape(child).unwrap();
        assert_eq!(
            session.scene().subscriptions(shape),
            ideaink_core::scene::ObjectEvents::MIND_NODE
        );
        assert!(session.scene().is_interactive(shape));
    }

    // Children can be expanded in turn, with the whole tree as context
    let grandchild_source = &added[1];
    service::expand(&mut session, grandchild_source, &generator, &GeneratorConfig::default())
        .await
        .unwrap();
    let prompt = generator.last_prompt();
    assert!(prompt.contains("Garden > B"));
    assert!(prompt.contains("- Garden\n  - A\n  - B\n"));
    assert_eq!(session.graph().len(), 9);
}

#[tokio::test]
async fn second_request_on_busy_node_is_refused() {
    let (mut session, root) = garden();
    let config = GeneratorConfig::default();
    let generator = ScriptedGenerator::new(Reply::Text("1. A\n2. B\n3. C\n4. D"));

    let first = service::prepare(&session, &root, GenerationKind::Expand, &config).unwrap();
    assert!(session.is_busy());
    assert!(service::prepare(&session, &root, GenerationKind::Summarize, &config).is_none());

    // The session stays usable while the request is out
    session.set_tool(ToolKind::MindMap);
    session.handle_pointer(ideaink_core::PointerEvent::down(Point::new(1200.0, 1200.0)));
    session.commit_edit();
    assert_eq!(session.graph().len(), 2);

    let generated = service::generate(first, &generator).await;
    assert!(session.is_busy());
    let added = service::apply(&mut session, generated);
    assert_eq!(added.len(), 4);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn source_removed_mid_flight_adds_nothing() {
    let (mut session, root) = garden();
    let config = GeneratorConfig::default();
    let generator = ScriptedGenerator::new(Reply::Text("1. A\n2. B\n3. C\n4. D"));

    let prepared = service::prepare(&session, &root, GenerationKind::Expand, &config).unwrap();
    ideaink_core::mindmap::remove_node(session.scene_mut(), &root);

    let generated = service::generate(prepared, &generator).await;
    assert!(service::apply(&mut session, generated).is_empty());
    assert!(session.scene().is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn dropped_request_clears_busy_flag() {
    let (session, root) = garden();
    let prepared =
        service::prepare(&session, &root, GenerationKind::Summarize, &GeneratorConfig::default())
            .unwrap();
    assert!(session.is_busy());
    drop(prepared);
    assert!(!session.is_busy());
}
