//! ProgramTree: the aggregate owning the node hierarchy.
//!
//! Nodes live in an arena; links reference children by arena index, so a
//! node loaded from storage may be shared by several parents. Structural
//! operations validate before mutating and track pending changes (changed
//! links, deleted links, rewritten prerequisites) for the persist step.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::link::{DetachedLink, Link, LinkAttributes, LinkIdentity};
use crate::domain::node::{Node, NodeId, NodeKind, NodeType};
use crate::domain::prerequisite::Prerequisite;
use crate::domain::relationship::AuthorizedRelationshipList;

/// Address of a node inside one tree: the `|`-joined element ids from the
/// root down to the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<u64>);

impl TreePath {
    pub fn new(segments: Vec<u64>) -> Self {
        Self(segments)
    }

    pub fn root(element_id: u64) -> Self {
        Self(vec![element_id])
    }

    /// Path extended by one child segment.
    pub fn child(&self, element_id: u64) -> Self {
        let mut segments = self.0.clone();
        segments.push(element_id);
        Self(segments)
    }

    pub fn segments(&self) -> &[u64] {
        &self.0
    }

    pub fn parent(&self) -> Option<TreePath> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn leaf(&self) -> Option<u64> {
        self.0.last().copied()
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('|')
            .map(|seg| seg.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| DomainError::InvalidPath(s.to_string()))?;
        if segments.is_empty() {
            return Err(DomainError::InvalidPath(s.to_string()));
        }
        Ok(Self(segments))
    }
}

/// Everything the persist step needs to write: changed links with their
/// current state, deleted link identities, rewritten prerequisites.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    pub changed_links: Vec<ChangedLink>,
    pub deleted_links: Vec<LinkIdentity>,
    pub changed_prerequisites: Vec<(NodeId, Option<Prerequisite>)>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.changed_links.is_empty()
            && self.deleted_links.is_empty()
            && self.changed_prerequisites.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ChangedLink {
    pub identity: LinkIdentity,
    pub order: u32,
    pub attributes: LinkAttributes,
}

/// The program hierarchy rooted at one education-group-year.
#[derive(Debug)]
pub struct ProgramTree {
    arena: Arena<Node>,
    root: Index,
    elements: HashMap<u64, Index>,
    relationships: AuthorizedRelationshipList,
    deleted_links: Vec<LinkIdentity>,
    changed_prerequisites: Vec<(NodeId, Option<Prerequisite>)>,
    next_element_id: u64,
    loaded_fingerprint: Option<String>,
}

impl ProgramTree {
    pub fn new(root: Node, relationships: AuthorizedRelationshipList) -> DomainResult<Self> {
        if root.is_leaf() {
            return Err(DomainError::RootMustBeGroup(root.id));
        }
        let mut tree = Self {
            arena: Arena::new(),
            root: Index::from_raw_parts(0, 0), // replaced below
            elements: HashMap::new(),
            relationships,
            deleted_links: Vec::new(),
            changed_prerequisites: Vec::new(),
            next_element_id: 1,
            loaded_fingerprint: None,
        };
        tree.root = tree.insert(root);
        Ok(tree)
    }

    /// Identity of the whole tree, derived from its root.
    pub fn identity(&self) -> NodeId {
        self.root().id.clone()
    }

    pub fn root(&self) -> &Node {
        &self.arena[self.root]
    }

    pub fn root_index(&self) -> Index {
        self.root
    }

    /// Path addressing the root node.
    pub fn root_path(&self) -> TreePath {
        TreePath::root(self.root().node_id)
    }

    pub fn relationships(&self) -> &AuthorizedRelationshipList {
        &self.relationships
    }

    pub fn node(&self, index: Index) -> Option<&Node> {
        self.arena.get(index)
    }

    pub fn node_mut(&mut self, index: Index) -> Option<&mut Node> {
        self.arena.get_mut(index)
    }

    pub fn index_of_element(&self, element_id: u64) -> Option<Index> {
        self.elements.get(&element_id).copied()
    }

    /// Insert a node into the arena, assigning an element id if it has none.
    fn insert(&mut self, mut node: Node) -> Index {
        if node.node_id == 0 || self.elements.contains_key(&node.node_id) {
            node.node_id = self.next_element_id;
        }
        self.next_element_id = self.next_element_id.max(node.node_id + 1);
        let element_id = node.node_id;
        let index = self.arena.insert(node);
        self.elements.insert(element_id, index);
        index
    }

    /// Insert a loaded node keeping its stored element id.
    pub(crate) fn restore_node(&mut self, node: Node) -> Index {
        self.insert(node)
    }

    /// Re-create a stored link without marking it changed.
    pub(crate) fn restore_link(
        &mut self,
        parent: Index,
        child: Index,
        attributes: LinkAttributes,
        order: u32,
    ) {
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(Link {
                child,
                order,
                attributes,
                has_changed: false,
            });
            node.children.sort_by_key(|l| l.order);
        }
    }

    /// Resolve a path to the node it addresses.
    pub fn get_node(&self, path: &TreePath) -> DomainResult<&Node> {
        let index = self.resolve(path)?;
        Ok(&self.arena[index])
    }

    /// Resolve a path walking `children` at each level.
    fn resolve(&self, path: &TreePath) -> DomainResult<Index> {
        Ok(*self
            .resolve_chain(path)?
            .last()
            .expect("resolve_chain returns at least the root"))
    }

    /// Resolve a path keeping every node on it (root first).
    fn resolve_chain(&self, path: &TreePath) -> DomainResult<Vec<Index>> {
        let mut segments = path.segments().iter();
        let first = segments
            .next()
            .ok_or_else(|| DomainError::NodeNotFound(path.clone()))?;
        if *first != self.root().node_id {
            return Err(DomainError::NodeNotFound(path.clone()));
        }
        let mut chain = vec![self.root];
        let mut current = self.root;
        for segment in segments {
            let node = &self.arena[current];
            let next = node
                .children
                .iter()
                .find(|link| {
                    self.arena
                        .get(link.child)
                        .map(|child| child.node_id == *segment)
                        .unwrap_or(false)
                })
                .map(|link| link.child)
                .ok_or_else(|| DomainError::NodeNotFound(path.clone()))?;
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    /// All nodes below `start` (excluded), depth-first, cycle-safe.
    pub fn get_all_children(&self, start: Index) -> Vec<Index> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut stack: Vec<Index> = self.arena[start]
            .children
            .iter()
            .rev()
            .map(|l| l.child)
            .collect();
        visited.insert(start);
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            result.push(index);
            if let Some(node) = self.arena.get(index) {
                for link in node.children.iter().rev() {
                    stack.push(link.child);
                }
            }
        }
        result
    }

    fn descendant_identities(&self) -> HashSet<NodeId> {
        self.get_all_children(self.root)
            .into_iter()
            .filter_map(|i| self.arena.get(i).map(|n| n.id.clone()))
            .collect()
    }

    /// Identities of all learning units reachable from the root.
    pub fn learning_unit_identities(&self) -> BTreeSet<NodeId> {
        self.get_all_children(self.root)
            .into_iter()
            .filter_map(|i| self.arena.get(i))
            .filter(|n| n.is_leaf())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Every path producible by a depth-first walk. Paths are unique
    /// addresses: a node shared by two parents appears under two paths.
    pub fn all_paths(&self) -> Vec<TreePath> {
        let mut paths = Vec::new();
        self.collect_paths(self.root, self.root_path(), &mut paths);
        paths
    }

    fn collect_paths(&self, index: Index, path: TreePath, out: &mut Vec<TreePath>) {
        out.push(path.clone());
        for link in &self.arena[index].children {
            if let Some(child) = self.arena.get(link.child) {
                // Guard against malformed (cyclic) stored data.
                if path.segments().contains(&child.node_id) {
                    continue;
                }
                self.collect_paths(link.child, path.child(child.node_id), out);
            }
        }
    }

    /// Every link in the tree whose child is the given node.
    pub fn get_links_using_node(&self, node: &NodeId) -> Vec<LinkIdentity> {
        let mut usages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let parent = &self.arena[index];
            for link in &parent.children {
                if let Some(child) = self.arena.get(link.child) {
                    if child.id == *node {
                        usages.push(LinkIdentity::new(parent.id.clone(), child.id.clone()));
                    }
                    stack.push(link.child);
                }
            }
        }
        usages
    }

    /// Validate an attach without mutating. Returns the parent index.
    ///
    /// Order matters: the cycle check runs before the duplicate check so
    /// that attaching an ancestor of the attach point reports a cycle,
    /// even though ancestors are also descendants of the root.
    fn validate_attach(
        &self,
        child_id: &NodeId,
        child_type: NodeType,
        path: &TreePath,
    ) -> DomainResult<Index> {
        let chain = self.resolve_chain(path)?;
        let parent_index = *chain.last().expect("chain is never empty");
        let parent = &self.arena[parent_index];
        if parent.is_leaf() {
            return Err(DomainError::ChildrenNotAllowed(parent.id.clone()));
        }
        if chain
            .iter()
            .any(|i| self.arena[*i].id == *child_id)
        {
            return Err(DomainError::CycleDetected(child_id.clone()));
        }
        if self.descendant_identities().contains(child_id) {
            return Err(DomainError::AlreadyAttached(child_id.clone()));
        }
        let parent_type = parent.node_type();
        if !self.relationships.is_authorized(parent_type, child_type) {
            return Err(DomainError::UnauthorizedRelationship {
                parent_type,
                child_type,
            });
        }
        let (_, max) = self.relationships.cardinality(parent_type, child_type);
        if let Some(max) = max {
            let count = parent
                .children
                .iter()
                .filter(|l| {
                    self.arena
                        .get(l.child)
                        .map(|c| c.node_type() == child_type)
                        .unwrap_or(false)
                })
                .count() as u32;
            if count + 1 > max {
                return Err(DomainError::CardinalityExceeded {
                    parent: parent.id.clone(),
                    child_type,
                    count,
                    max,
                });
            }
        }
        Ok(parent_index)
    }

    fn push_link(
        &mut self,
        parent: Index,
        child: Index,
        attributes: LinkAttributes,
    ) -> LinkIdentity {
        let child_id = self.arena[child].id.clone();
        let node = &mut self.arena[parent];
        let order = node.children.len() as u32;
        node.children.push(Link {
            child,
            order,
            attributes,
            has_changed: true,
        });
        let identity = LinkIdentity::new(node.id.clone(), child_id);
        debug!(link = %identity, order, "link created");
        identity
    }

    /// Attach a new node under the node addressed by `path`.
    #[instrument(level = "debug", skip(self, node, attributes), fields(node = %node.id, path = %path))]
    pub fn attach_node(
        &mut self,
        node: Node,
        path: &TreePath,
        attributes: LinkAttributes,
    ) -> DomainResult<LinkIdentity> {
        let parent = self.validate_attach(&node.id, node.node_type(), path)?;
        let child = self.insert(node);
        Ok(self.push_link(parent, child, attributes))
    }

    /// Re-attach a node already present in the arena (cut/paste).
    #[instrument(level = "debug", skip(self, attributes), fields(path = %path))]
    pub fn attach_existing(
        &mut self,
        element_id: u64,
        path: &TreePath,
        attributes: LinkAttributes,
    ) -> DomainResult<LinkIdentity> {
        let child = self
            .index_of_element(element_id)
            .ok_or_else(|| DomainError::NodeNotFound(TreePath::root(element_id)))?;
        let (child_id, child_type) = {
            let node = &self.arena[child];
            (node.id.clone(), node.node_type())
        };
        let parent = self.validate_attach(&child_id, child_type, path)?;
        Ok(self.push_link(parent, child, attributes))
    }

    /// Detach the link addressed by `path` (last segment is the child,
    /// second-to-last its parent). The subtree stays in the arena.
    #[instrument(level = "debug", skip(self), fields(path = %path))]
    pub fn detach_node(&mut self, path: &TreePath) -> DomainResult<DetachedLink> {
        let parent_path = path
            .parent()
            .ok_or_else(|| DomainError::CannotDetachRoot(self.root().id.clone()))?;
        let child_segment = path.leaf().expect("path with a parent has a leaf");
        // Resolve the full path first so a bad address fails before any
        // mutation.
        self.resolve(path)?;
        let parent_index = self.resolve(&parent_path)?;
        let parent_id = self.arena[parent_index].id.clone();

        let position = self.arena[parent_index]
            .children
            .iter()
            .position(|link| {
                self.arena
                    .get(link.child)
                    .map(|c| c.node_id == child_segment)
                    .unwrap_or(false)
            })
            .ok_or_else(|| DomainError::NodeNotFound(path.clone()))?;

        let removed = self.arena[parent_index].children.remove(position);
        let child_node = &self.arena[removed.child];
        let identity = LinkIdentity::new(parent_id, child_node.id.clone());
        let detached = DetachedLink {
            identity: identity.clone(),
            child_element: child_node.node_id,
            attributes: removed.attributes,
            order: removed.order,
        };
        self.renumber_children(parent_index);
        self.deleted_links.push(identity);
        debug!(link = %detached.identity, "link detached");
        Ok(detached)
    }

    /// Keep sibling order values dense and zero-based.
    fn renumber_children(&mut self, parent: Index) {
        let node = &mut self.arena[parent];
        for (position, link) in node.children.iter_mut().enumerate() {
            if link.order != position as u32 {
                link.order = position as u32;
                link.has_changed = true;
            }
        }
    }

    /// Update the attributes of the link addressed by `path`.
    pub fn update_link(
        &mut self,
        path: &TreePath,
        attributes: LinkAttributes,
    ) -> DomainResult<LinkIdentity> {
        let parent_path = path
            .parent()
            .ok_or_else(|| DomainError::NodeNotFound(path.clone()))?;
        let child_segment = path.leaf().expect("path with a parent has a leaf");
        self.resolve(path)?;
        let parent_index = self.resolve(&parent_path)?;
        let parent_id = self.arena[parent_index].id.clone();
        let child_ids: Vec<(usize, NodeId, u64)> = self.arena[parent_index]
            .children
            .iter()
            .enumerate()
            .filter_map(|(pos, link)| {
                self.arena
                    .get(link.child)
                    .map(|c| (pos, c.id.clone(), c.node_id))
            })
            .collect();
        let (position, child_id, _) = child_ids
            .into_iter()
            .find(|(_, _, element)| *element == child_segment)
            .ok_or_else(|| DomainError::NodeNotFound(path.clone()))?;
        let link = &mut self.arena[parent_index].children[position];
        if link.attributes != attributes {
            link.attributes = attributes;
            link.has_changed = true;
        }
        Ok(LinkIdentity::new(parent_id, child_id))
    }

    /// Set or clear the prerequisite of a learning unit.
    ///
    /// Self-references and references that do not resolve to a learning
    /// unit of this tree are rejected; the source enforced the same at
    /// save time.
    pub fn set_prerequisite(
        &mut self,
        owner: &NodeId,
        prerequisite: Option<Prerequisite>,
    ) -> DomainResult<()> {
        let index = self
            .get_all_children(self.root)
            .into_iter()
            .find(|i| self.arena[*i].id == *owner)
            .ok_or_else(|| DomainError::NodeNotFound(self.root_path()))?;
        if !self.arena[index].is_leaf() {
            return Err(DomainError::PrerequisiteOnGroup(owner.clone()));
        }
        if let Some(prerequisite) = &prerequisite {
            let known = self.learning_unit_identities();
            for item in prerequisite.items() {
                let referenced = item.node_id();
                if referenced == *owner {
                    return Err(DomainError::SelfPrerequisite(owner.clone()));
                }
                if !known.contains(&referenced) {
                    return Err(DomainError::DanglingPrerequisite {
                        owner: owner.clone(),
                        referenced,
                    });
                }
            }
        }
        if let NodeKind::LearningUnit {
            prerequisite: slot, ..
        } = &mut self.arena[index].kind
        {
            *slot = prerequisite.clone();
        }
        self.changed_prerequisites
            .push((owner.clone(), prerequisite));
        Ok(())
    }

    /// Collect everything the persist step has to write.
    pub fn pending_changes(&self) -> PendingChanges {
        let mut changed_links = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let parent = &self.arena[index];
            for link in &parent.children {
                if let Some(child) = self.arena.get(link.child) {
                    if link.has_changed {
                        changed_links.push(ChangedLink {
                            identity: LinkIdentity::new(parent.id.clone(), child.id.clone()),
                            order: link.order,
                            attributes: link.attributes.clone(),
                        });
                    }
                    stack.push(link.child);
                }
            }
        }
        PendingChanges {
            changed_links,
            deleted_links: self.deleted_links.clone(),
            changed_prerequisites: self.changed_prerequisites.clone(),
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending_changes().is_empty()
    }

    /// Reset all transient mutation bookkeeping after a successful persist.
    pub fn clear_pending_changes(&mut self) {
        self.deleted_links.clear();
        self.changed_prerequisites.clear();
        let indices: Vec<Index> = self.arena.iter().map(|(i, _)| i).collect();
        for index in indices {
            for link in &mut self.arena[index].children {
                link.has_changed = false;
            }
        }
    }

    pub fn loaded_fingerprint(&self) -> Option<&str> {
        self.loaded_fingerprint.as_deref()
    }

    pub fn set_loaded_fingerprint(&mut self, fingerprint: Option<String>) {
        self.loaded_fingerprint = fingerprint;
    }

    /// Deep copy with every node moved to the next academic year.
    /// All links are marked changed: for storage the copy is entirely new.
    pub fn copy_to_next_year(&self) -> DomainResult<ProgramTree> {
        self.duplicate(|id| id.next_year(), 1)
    }

    /// Deep copy under a different root code, same year. Used when
    /// deriving a specific program version from the standard tree.
    pub fn duplicate_as(&self, root_code: &str) -> DomainResult<ProgramTree> {
        let root_id = self.root().id.clone();
        let root_code = root_code.to_string();
        self.duplicate(
            move |id| {
                if *id == root_id {
                    NodeId::new(root_code.clone(), id.year)
                } else {
                    id.clone()
                }
            },
            0,
        )
    }

    fn duplicate(
        &self,
        map_id: impl Fn(&NodeId) -> NodeId,
        year_shift: i32,
    ) -> DomainResult<ProgramTree> {
        let mut mapping: HashMap<Index, Index> = HashMap::new();
        let root_node = self.clone_node(self.root, &map_id, year_shift);
        let mut copy = ProgramTree::new(root_node, self.relationships.clone())?;
        mapping.insert(self.root, copy.root);

        // Preorder so parents are copied before their links.
        let mut order = vec![self.root];
        order.extend(self.get_all_children(self.root));
        for index in &order {
            if mapping.contains_key(index) {
                continue;
            }
            let node = self.clone_node(*index, &map_id, year_shift);
            let new_index = copy.insert(node);
            mapping.insert(*index, new_index);
        }
        for index in &order {
            let new_parent = mapping[index];
            for link in &self.arena[*index].children {
                if let Some(new_child) = mapping.get(&link.child) {
                    copy.arena[new_parent].children.push(Link {
                        child: *new_child,
                        order: link.order,
                        attributes: link.attributes.clone(),
                        has_changed: true,
                    });
                }
            }
        }
        Ok(copy)
    }

    fn clone_node(
        &self,
        index: Index,
        map_id: &impl Fn(&NodeId) -> NodeId,
        year_shift: i32,
    ) -> Node {
        let source = &self.arena[index];
        let mut node = source.clone();
        node.node_id = 0;
        node.children = Vec::new();
        node.id = map_id(&source.id);
        node.id.year += year_shift;
        if let NodeKind::LearningUnit {
            prerequisite: Some(prerequisite),
            ..
        } = &mut node.kind
        {
            for group in &mut prerequisite.groups {
                for item in &mut group.items {
                    item.year += year_shift;
                }
            }
        }
        node
    }
}
