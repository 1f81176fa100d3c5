//! Tree edit service
//!
//! Attach, detach and paste operations over one program tree, with an
//! optional commit back to the repository.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::commands::{AttachNodeCommand, DetachNodeCommand, PasteElementCommand};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DetachedLink, LinkIdentity, ProgramTree};
use crate::infrastructure::traits::ProgramTreeRepository;
use crate::infrastructure::StoreError;

/// Service editing the structure of program trees.
pub struct TreeEditService {
    trees: Arc<dyn ProgramTreeRepository>,
}

impl TreeEditService {
    pub fn new(trees: Arc<dyn ProgramTreeRepository>) -> Self {
        Self { trees }
    }

    fn load(&self, command_root: &crate::domain::NodeId) -> ApplicationResult<ProgramTree> {
        self.trees.get(command_root).map_err(|e| match e {
            StoreError::TreeNotFound(id) => ApplicationError::TreeNotFound(id),
            other => other.into(),
        })
    }

    fn commit_if(&self, commit: bool, tree: &mut ProgramTree) -> ApplicationResult<()> {
        if commit {
            self.trees.update(tree)?;
        }
        Ok(())
    }

    /// Attach a catalog node. Returns the created link and the edited tree
    /// (persisted when the command commits).
    #[instrument(level = "debug", skip(self, command), fields(root = %command.root, node = %command.node_to_attach))]
    pub fn attach_node(
        &self,
        command: &AttachNodeCommand,
    ) -> ApplicationResult<(LinkIdentity, ProgramTree)> {
        let mut tree = self.load(&command.root)?;
        let node = self.trees.load_node(&command.node_to_attach)?;
        let link = tree.attach_node(node, &command.path_where_to_attach, command.attributes.clone())?;
        self.commit_if(command.commit, &mut tree)?;
        debug!(link = %link, "node attached");
        Ok((link, tree))
    }

    #[instrument(level = "debug", skip(self, command), fields(root = %command.root, path = %command.path_to_detach))]
    pub fn detach_node(
        &self,
        command: &DetachNodeCommand,
    ) -> ApplicationResult<(DetachedLink, ProgramTree)> {
        let mut tree = self.load(&command.root)?;
        let detached = tree.detach_node(&command.path_to_detach)?;
        self.commit_if(command.commit, &mut tree)?;
        debug!(link = %detached.identity, "node detached");
        Ok((detached, tree))
    }

    /// Cut or copy a node to a new position.
    ///
    /// Cut keeps the detached subtree alive in the tree's arena, so the
    /// re-attach reuses the same elements. Copy loads the node fresh from
    /// the catalog.
    #[instrument(level = "debug", skip(self, command), fields(root = %command.root, node = %command.node_to_paste))]
    pub fn paste_element(
        &self,
        command: &PasteElementCommand,
    ) -> ApplicationResult<(LinkIdentity, ProgramTree)> {
        let mut tree = self.load(&command.root)?;
        let link = match &command.path_where_to_detach {
            Some(detach_path) => {
                let detached = tree.detach_node(detach_path)?;
                tree.attach_existing(
                    detached.child_element,
                    &command.path_where_to_paste,
                    command.attributes.clone(),
                )?
            }
            None => {
                let node = self.trees.load_node(&command.node_to_paste)?;
                tree.attach_node(
                    node,
                    &command.path_where_to_paste,
                    command.attributes.clone(),
                )?
            }
        };
        self.commit_if(command.commit, &mut tree)?;
        debug!(link = %link, "node pasted");
        Ok((link, tree))
    }
}
