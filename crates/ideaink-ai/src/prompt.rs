//! Prompt construction from the mind-map context.

use crate::client::GeneratorConfig;
use ideaink_core::mindmap::{GraphView, NodeId, breadcrumb, path_to_node};
use serde::{Deserialize, Serialize};

/// Number of child ideas asked for on expansion.
pub const REQUESTED_IDEAS: usize = 4;

/// Marks the line of the user prompt naming the node being worked on.
pub(crate) const SUBJECT_PREFIX: &str = "Selected idea: ";

const EXPAND_INSTRUCTION: &str = "You are a brainstorming assistant working on a mind map. \
Reply with exactly 4 short child ideas for the selected idea, at most 5 words each, \
as a numbered list with one idea per line and no other text.";

const SUMMARIZE_INSTRUCTION: &str = "You are an assistant that condenses branches of a mind map. \
Reply with a single summary of the selected idea in 20 to 30 words of plain prose, \
with no heading, list or quotation marks.";

/// What a request asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Expand,
    Summarize,
}

/// Request body sent to the generative endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Not sent; lets generators tell the two request shapes apart.
    #[serde(skip, default = "default_kind")]
    pub kind: GenerationKind,
}

fn default_kind() -> GenerationKind {
    GenerationKind::Expand
}

/// Everything the model gets to see about the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Indented outline of the whole tree the node belongs to.
    pub outline: String,
    pub subject: String,
    /// Root-to-node path, ` > ` separated.
    pub breadcrumb: String,
}

impl PromptContext {
    /// Collect the context for `node`: the tree under its root, and the
    /// path down to it.
    pub fn gather(graph: &GraphView<'_>, node: &NodeId) -> Option<Self> {
        let subject = graph.get(node)?.text.clone();
        let root = graph.find_root(node);
        let tree = graph.build_context_tree(&root)?;
        let path = path_to_node(&tree, node);
        Some(Self {
            outline: tree.render_outline(),
            subject,
            breadcrumb: breadcrumb(&path),
        })
    }

    fn render(&self, task: &str) -> String {
        format!(
            "Mind map so far:\n{}\nPath to the selected idea: {}\n{}{}\n\n{}",
            self.outline, self.breadcrumb, SUBJECT_PREFIX, self.subject, task
        )
    }

    pub fn expansion_request(&self, config: &GeneratorConfig) -> GenerationRequest {
        GenerationRequest {
            system_instruction: EXPAND_INSTRUCTION.to_string(),
            user_prompt: self.render(&format!(
                "Suggest {} child ideas for the selected idea that fit the rest of the map.",
                REQUESTED_IDEAS
            )),
            temperature: config.expand_temperature,
            max_output_tokens: config.expand_max_tokens,
            kind: GenerationKind::Expand,
        }
    }

    pub fn summary_request(&self, config: &GeneratorConfig) -> GenerationRequest {
        GenerationRequest {
            system_instruction: SUMMARIZE_INSTRUCTION.to_string(),
            user_prompt: self.render(
                "Summarize the selected idea in 20-30 words, taking its place in the map into account.",
            ),
            temperature: config.summarize_temperature,
            max_output_tokens: config.summarize_max_tokens,
            kind: GenerationKind::Summarize,
        }
    }

    pub fn request(&self, kind: GenerationKind, config: &GeneratorConfig) -> GenerationRequest {
        match kind {
            GenerationKind::Expand => self.expansion_request(config),
            GenerationKind::Summarize => self.summary_request(config),
        }
    }
}

/// The node text a prompt was built for, if it carries one.
pub(crate) fn subject_of(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(SUBJECT_PREFIX))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideaink_core::Session;
    use kurbo::Point;

    fn sample() -> (Session, NodeId, NodeId) {
        let mut session = Session::default();
        let root = session.spawn_node(Point::new(0.0, 0.0), "Garden");
        let veg = session
            .add_child_node(&root, Point::new(300.0, 0.0), "Vegetables")
            .unwrap();
        let tomato = session
            .add_child_node(&veg, Point::new(600.0, 0.0), "Tomatoes")
            .unwrap();
        session.add_child_node(&root, Point::new(0.0, 300.0), "Flowers");
        (session, veg, tomato)
    }

    #[test]
    fn test_context_covers_whole_tree() {
        let (session, veg, tomato) = sample();
        let ctx = PromptContext::gather(&session.graph(), &tomato).unwrap();
        assert_eq!(ctx.subject, "Tomatoes");
        assert_eq!(ctx.breadcrumb, "Garden > Vegetables > Tomatoes");
        assert_eq!(
            ctx.outline,
            "- Garden\n  - Vegetables\n    - Tomatoes\n  - Flowers\n"
        );

        let ctx = PromptContext::gather(&session.graph(), &veg).unwrap();
        assert_eq!(ctx.breadcrumb, "Garden > Vegetables");
    }

    #[test]
    fn test_requests_carry_settings_and_subject() {
        let (session, veg, _) = sample();
        let ctx = PromptContext::gather(&session.graph(), &veg).unwrap();
        let config = GeneratorConfig::default();

        let expand = ctx.request(GenerationKind::Expand, &config);
        assert_eq!(expand.kind, GenerationKind::Expand);
        assert!((expand.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(expand.max_output_tokens, 150);
        assert!(expand.user_prompt.contains("Garden > Vegetables"));
        assert_eq!(subject_of(&expand.user_prompt), Some("Vegetables"));

        let summary = ctx.request(GenerationKind::Summarize, &config);
        assert_eq!(summary.max_output_tokens, 120);
        assert!(summary.system_instruction.contains("20 to 30 words"));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let (session, veg, _) = sample();
        let ctx = PromptContext::gather(&session.graph(), &veg).unwrap();
        let json = serde_json::to_value(ctx.expansion_request(&GeneratorConfig::default())).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert!(json.get("maxOutputTokens").is_some());
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_unknown_node_has_no_context() {
        let (session, _, _) = sample();
        assert!(PromptContext::gather(&session.graph(), &NodeId::from("gone")).is_none());
    }
}
