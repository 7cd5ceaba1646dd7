//! Expansion and summarization of mind-map nodes.
//!
//! A request runs in three steps so the network wait never holds the
//! session:
//!
//! 1. [`prepare`] reads the graph on the interaction thread and claims the
//!    node's in-flight slot.
//! 2. [`generate`] awaits the model anywhere, turning every failure into
//!    placeholder text.
//! 3. [`apply`] writes the children back on the interaction thread.
//!
//! The in-flight slot is released when the [`Generated`] value is applied
//! or dropped, whichever comes first.

use crate::client::{GeneratorConfig, TextGenerator};
use crate::parse::{FALLBACK_SUMMARY, fallback_ideas, parse_ideas, parse_summary};
use crate::prompt::{GenerationKind, GenerationRequest, PromptContext};
use ideaink_core::activity::ActivityGuard;
use ideaink_core::mindmap::NodeId;
use ideaink_core::scene::Scene;
use ideaink_core::session::Session;
use kurbo::{Point, Vec2};
use std::f64::consts::TAU;

/// Distance from a node to the children created for it.
pub const CHILD_DISTANCE: f64 = 200.0;

/// A request ready to be sent.
#[derive(Debug)]
pub struct PreparedRequest {
    pub kind: GenerationKind,
    pub source: NodeId,
    pub request: GenerationRequest,
    guard: ActivityGuard,
}

/// Model output ready to be applied.
#[derive(Debug)]
pub struct Generated {
    pub kind: GenerationKind,
    pub source: NodeId,
    /// Child labels: 4 or 5 ideas, or exactly one summary.
    pub outputs: Vec<String>,
    guard: ActivityGuard,
}

/// Build the request for `node` and mark it in flight.
///
/// Returns `None` for unknown nodes and, when requests are exclusive, for
/// nodes that already have one running.
pub fn prepare<S: Scene>(
    session: &Session<S>,
    node: &NodeId,
    kind: GenerationKind,
    config: &GeneratorConfig,
) -> Option<PreparedRequest> {
    let guard = session.begin_request(node)?;
    let context = PromptContext::gather(&session.graph(), node)?;
    log::debug!("Prepared {:?} for {} ({})", kind, node, context.breadcrumb);
    Some(PreparedRequest {
        kind,
        source: node.clone(),
        request: context.request(kind, config),
        guard,
    })
}

/// Run the request. Never fails: errors become placeholder outputs.
pub async fn generate(prepared: PreparedRequest, generator: &dyn TextGenerator) -> Generated {
    let PreparedRequest {
        kind,
        source,
        request,
        guard,
    } = prepared;

    let outputs = match generator.generate(request).await {
        Ok(content) => match kind {
            GenerationKind::Expand => parse_ideas(&content),
            GenerationKind::Summarize => vec![parse_summary(&content)],
        },
        Err(e) => {
            log::warn!("Generation for {} failed, using placeholders: {}", source, e);
            match kind {
                GenerationKind::Expand => fallback_ideas(),
                GenerationKind::Summarize => vec![FALLBACK_SUMMARY.to_string()],
            }
        }
    };

    Generated {
        kind,
        source,
        outputs,
        guard,
    }
}

/// Where the `index`-th of `count` children of a node at `source` goes.
pub fn child_position(kind: GenerationKind, source: Point, index: usize, count: usize) -> Point {
    match kind {
        GenerationKind::Expand => {
            let angle = TAU * index as f64 / count.max(1) as f64;
            source + Vec2::from_angle(angle) * CHILD_DISTANCE
        }
        GenerationKind::Summarize => source + Vec2::new(0.0, CHILD_DISTANCE),
    }
}

/// Create and connect the children. Returns the new nodes, or nothing if
/// the source node disappeared while the request was out.
pub fn apply<S: Scene>(session: &mut Session<S>, generated: Generated) -> Vec<NodeId> {
    let Generated {
        kind,
        source,
        outputs,
        guard,
    } = generated;

    let Some(origin) = session.scene().mind_node(&source).map(|n| n.position()) else {
        log::warn!("Node {} was removed before its {:?} finished", source, kind);
        return Vec::new();
    };

    let count = outputs.len();
    let children: Vec<NodeId> = outputs
        .iter()
        .enumerate()
        .filter_map(|(i, text)| {
            session.add_child_node(&source, child_position(kind, origin, i, count), text)
        })
        .collect();
    session.scene_mut().request_redraw();
    drop(guard);

    log::info!("{:?} of {} added {} nodes", kind, source, children.len());
    children
}

/// Prepare, generate and apply in one go, holding the session throughout.
///
/// Returns `None` when the request could not start.
pub async fn run<S: Scene>(
    session: &mut Session<S>,
    node: &NodeId,
    kind: GenerationKind,
    generator: &dyn TextGenerator,
    config: &GeneratorConfig,
) -> Option<Vec<NodeId>> {
    let prepared = prepare(session, node, kind, config)?;
    let generated = generate(prepared, generator).await;
    Some(apply(session, generated))
}

/// Add 4 or 5 child ideas under `node`.
pub async fn expand<S: Scene>(
    session: &mut Session<S>,
    node: &NodeId,
    generator: &dyn TextGenerator,
    config: &GeneratorConfig,
) -> Option<Vec<NodeId>> {
    run(session, node, GenerationKind::Expand, generator, config).await
}

/// Add one summary node below `node`.
pub async fn summarize<S: Scene>(
    session: &mut Session<S>,
    node: &NodeId,
    generator: &dyn TextGenerator,
    config: &GeneratorConfig,
) -> Option<Vec<NodeId>> {
    run(session, node, GenerationKind::Summarize, generator, config).await
}
