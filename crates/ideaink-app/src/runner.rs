//! Drives a [`Session`] from scripted commands.
//!
//! The runner owns the session and is the only place it is mutated.
//! Generation requests are prepared here and awaited on spawned tasks, so
//! the interaction loop keeps going while a model is thinking. Finished
//! requests are collected and applied between commands.

use crate::script::Command;
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ideaink_ai::{GenerationKind, Generated, GeneratorConfig, TextGenerator, service};
use ideaink_core::{Affordance, NodeId, Scene, SerializableColor, Session, Storage};
use kurbo::{Point, Vec2};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

pub struct Runner {
    session: Session,
    generator: Arc<dyn TextGenerator>,
    generator_config: GeneratorConfig,
    storage: Arc<dyn Storage>,
    workspace_id: String,
    workspace_name: String,
    in_flight: JoinSet<Generated>,
}

impl Runner {
    pub fn new(
        session: Session,
        generator: Arc<dyn TextGenerator>,
        generator_config: GeneratorConfig,
        storage: Arc<dyn Storage>,
        workspace_id: impl Into<String>,
        workspace_name: impl Into<String>,
    ) -> Self {
        Self {
            session,
            generator,
            generator_config,
            storage,
            workspace_id: workspace_id.into(),
            workspace_name: workspace_name.into(),
            in_flight: JoinSet::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Requests sent but not yet applied.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Load the stored workspace into the session if there is one.
    ///
    /// Returns whether a workspace was found.
    pub async fn open(&mut self) -> Result<bool> {
        if !self.storage.exists(&self.workspace_id).await? {
            log::info!("Workspace {} not found, starting empty", self.workspace_id);
            return Ok(false);
        }
        let workspace = self
            .storage
            .load(&self.workspace_id)
            .await
            .with_context(|| format!("loading workspace {}", self.workspace_id))?;
        self.workspace_name = workspace.name.clone();
        self.session
            .open_workspace(&workspace)
            .with_context(|| format!("opening workspace {}", self.workspace_id))?;
        Ok(true)
    }

    /// Snapshot the session and write it to storage.
    pub async fn save(&mut self) -> Result<()> {
        let mut workspace = self
            .session
            .to_workspace(self.workspace_id.clone(), self.workspace_name.clone())?;
        workspace.touch();
        self.storage.save(&workspace).await?;
        log::info!("Saved workspace {} ({} objects)", workspace.id, self.session.scene().len());
        Ok(())
    }

    /// Send a generation request for `node` without waiting for it.
    ///
    /// Returns false when the request could not start.
    pub fn request(&mut self, node: &NodeId, kind: GenerationKind) -> bool {
        let Some(prepared) =
            service::prepare(&self.session, node, kind, &self.generator_config)
        else {
            log::info!("{:?} of {} refused", kind, node);
            return false;
        };
        let generator = Arc::clone(&self.generator);
        self.in_flight
            .spawn(async move { service::generate(prepared, generator.as_ref()).await });
        true
    }

    /// A task that died takes its in-flight slot with it; there is nothing
    /// to apply.
    fn settle(&mut self, joined: Result<Generated, JoinError>) -> bool {
        match joined {
            Ok(generated) => {
                service::apply(&mut self.session, generated);
                true
            }
            Err(e) => {
                log::error!("Generation task failed: {}", e);
                false
            }
        }
    }

    /// Apply every request that has already finished.
    pub fn apply_finished(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.in_flight.try_join_next() {
            if self.settle(joined) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for and apply every outstanding request.
    pub async fn wait_idle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            self.settle(joined);
        }
    }

    /// Resolve a node by id or, failing that, by its label.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        let graph = self.session.graph();
        let by_id = NodeId::from(name);
        if graph.get(&by_id).is_some() {
            return Some(by_id);
        }
        graph.nodes().find(|n| n.text == name).map(|n| n.id.clone())
    }

    fn request_named(&mut self, name: &str, kind: GenerationKind) -> Result<()> {
        let id = self
            .find_node(name)
            .ok_or_else(|| anyhow!("no node named {:?}", name))?;
        self.request(&id, kind);
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        log::trace!("{:?}", command);
        match command {
            Command::Tool { tool } => self.session.set_tool(tool),
            Command::Down { .. }
            | Command::Move { .. }
            | Command::Up { .. }
            | Command::Click { .. }
            | Command::DoubleClick { .. } => {
                for event in command.pointer_events() {
                    if let Some(action) = self.session.handle_pointer(event) {
                        let kind = match action.affordance {
                            Affordance::Expand => GenerationKind::Expand,
                            Affordance::Summarize => GenerationKind::Summarize,
                        };
                        self.request(&action.node, kind);
                    }
                }
            }
            Command::Type { text } => {
                if !self.session.set_edit_text(&text) {
                    log::warn!("Nothing is being edited, ignoring text {:?}", text);
                }
            }
            Command::Commit => {
                self.session.commit_edit();
            }
            Command::Color { color } => {
                let parsed = SerializableColor::from_hex(&color)
                    .ok_or_else(|| anyhow!("invalid colour {:?}", color))?;
                self.session.set_color(parsed);
            }
            Command::Expand { node } => self.request_named(&node, GenerationKind::Expand)?,
            Command::Summarize { node } => {
                self.request_named(&node, GenerationKind::Summarize)?
            }
            Command::ImportImage {
                data,
                width,
                height,
            } => {
                let bytes = STANDARD
                    .decode(data.as_bytes())
                    .context("decoding image data")?;
                self.session.import_image(&bytes, width, height);
            }
            Command::Delete => {
                self.session.delete_selected();
            }
            Command::Clear => self.session.clear(),
            Command::Resize { width, height } => {
                self.session.scene_mut().set_viewport_size(width, height);
            }
            Command::Pan { dx, dy } => self.session.scene_mut().camera.pan(Vec2::new(dx, dy)),
            Command::Zoom { x, y, factor } => {
                self.session
                    .scene_mut()
                    .camera
                    .zoom_at(Point::new(x, y), factor)
            }
            Command::ResetView => self.session.scene_mut().camera.reset(),
            Command::Wait => self.wait_idle().await,
            Command::Save => self.save().await?,
        }
        Ok(())
    }

    /// Execute `commands` in order, applying finished requests between
    /// them, then wait for whatever is still running.
    pub async fn run_script(&mut self, commands: Vec<Command>) -> Result<()> {
        for command in commands {
            self.apply_finished();
            self.execute(command).await?;
        }
        self.wait_idle().await;
        Ok(())
    }

    /// Indented outline of every mind map on the canvas.
    pub fn outline(&self) -> String {
        let graph = self.session.graph();
        graph
            .nodes()
            .filter(|n| !graph.has_incoming(&n.id))
            .filter_map(|n| graph.build_context_tree(&n.id))
            .map(|tree| tree.render_outline())
            .collect()
    }
}
