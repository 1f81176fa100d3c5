//! Tests for the tree edit service: attach, detach, cut-paste and
//! copy-paste, with and without commit.

use std::sync::Arc;

use cursus::application::commands::{
    AttachNodeCommand, DetachNodeCommand, PasteElementCommand,
};
use cursus::application::{ApplicationError, TreeEditService};
use cursus::domain::{
    default_rules, AuthorizedRelationshipList, ElementType, GroupKind, LinkAttributes, Node,
    NodeId, ProgramTree,
};
use cursus::infrastructure::traits::ProgramTreeRepository;
use cursus::infrastructure::InMemoryTreeRepository;

fn rules() -> AuthorizedRelationshipList {
    AuthorizedRelationshipList::new(default_rules()).expect("baseline rules")
}

/// Root LDROI100B (1) with a common core (2) holding a subgroup (3) and a
/// learning unit (4).
fn bachelor_tree(year: i32) -> ProgramTree {
    let root = Node::new_group(NodeId::new("LDROI100B", year), "Bachelier en droit", GroupKind::Bachelor)
        .with_credits(180.0);
    let mut tree = ProgramTree::new(root, rules()).unwrap();
    let core = Node::new_group(NodeId::new("LDROI100T", year), "Tronc commun", GroupKind::CommonCore);
    tree.attach_node(core, &"1".parse().unwrap(), LinkAttributes::default())
        .unwrap();
    let sub = Node::new_group(NodeId::new("LDROI104G", year), "Sous-groupe", GroupKind::SubGroup);
    tree.attach_node(sub, &"1|2".parse().unwrap(), LinkAttributes::default())
        .unwrap();
    let unit = Node::new_learning_unit(NodeId::new("LDROI1001", year), "Introduction au droit", 5.0);
    tree.attach_node(unit, &"1|2".parse().unwrap(), LinkAttributes::default())
        .unwrap();
    tree
}

fn repository_with_tree() -> Arc<InMemoryTreeRepository> {
    let repo = Arc::new(InMemoryTreeRepository::new(rules()));
    repo.create(&bachelor_tree(2024)).unwrap();
    repo
}

#[test]
fn given_catalog_node_when_attaching_with_commit_then_persisted() {
    // Arrange
    let repo = repository_with_tree();
    let unit = Node::new_learning_unit(NodeId::new("LPSP1002", 2024), "Psychologie", 4.0);
    repo.register_node(&unit);
    let service = TreeEditService::new(repo.clone());

    // Act
    let (link, tree) = service
        .attach_node(&AttachNodeCommand {
            root: NodeId::new("LDROI100B", 2024),
            node_to_attach: NodeId::new("LPSP1002", 2024),
            path_where_to_attach: "1|2|3".parse().unwrap(),
            attributes: LinkAttributes::default(),
            commit: true,
        })
        .unwrap();

    // Assert
    assert_eq!(link.to_string(), "LDROI104G -> LPSP1002");
    assert!(!tree.has_pending_changes());
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    assert!(reloaded
        .all_paths()
        .contains(&"1|2|3|5".parse().unwrap()));
}

#[test]
fn given_dry_run_when_attaching_then_store_untouched() {
    // Arrange
    let repo = repository_with_tree();
    let unit = Node::new_learning_unit(NodeId::new("LPSP1002", 2024), "Psychologie", 4.0);
    repo.register_node(&unit);
    let service = TreeEditService::new(repo.clone());

    // Act
    let (_, tree) = service
        .attach_node(&AttachNodeCommand {
            root: NodeId::new("LDROI100B", 2024),
            node_to_attach: NodeId::new("LPSP1002", 2024),
            path_where_to_attach: "1|2|3".parse().unwrap(),
            attributes: LinkAttributes::default(),
            commit: false,
        })
        .unwrap();

    // Assert - the returned tree carries the edit, the store does not
    assert!(tree.has_pending_changes());
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    assert_eq!(reloaded.all_paths().len(), 4);
}

#[test]
fn given_path_when_detaching_with_commit_then_persisted() {
    // Arrange
    let repo = repository_with_tree();
    let service = TreeEditService::new(repo.clone());

    // Act
    let (detached, _) = service
        .detach_node(&DetachNodeCommand {
            root: NodeId::new("LDROI100B", 2024),
            path_to_detach: "1|2|4".parse().unwrap(),
            commit: true,
        })
        .unwrap();

    // Assert
    assert_eq!(detached.identity.to_string(), "LDROI100T -> LDROI1001");
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    assert_eq!(reloaded.all_paths().len(), 3);
}

#[test]
fn given_cut_paste_when_committing_then_node_moved_not_duplicated() {
    // Arrange - move the learning unit from the core into the subgroup
    let repo = repository_with_tree();
    let service = TreeEditService::new(repo.clone());

    // Act
    let (link, _) = service
        .paste_element(&PasteElementCommand {
            root: NodeId::new("LDROI100B", 2024),
            node_to_paste: NodeId::new("LDROI1001", 2024),
            element_type: ElementType::LearningUnit,
            path_where_to_detach: Some("1|2|4".parse().unwrap()),
            path_where_to_paste: "1|2|3".parse().unwrap(),
            attributes: LinkAttributes::default(),
            commit: true,
        })
        .unwrap();

    // Assert - same element id at the new position, old position gone
    assert_eq!(link.to_string(), "LDROI104G -> LDROI1001");
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    let paths = reloaded.all_paths();
    assert_eq!(paths.len(), 4);
    assert!(paths.contains(&"1|2|3|4".parse().unwrap()));
    assert!(!paths.contains(&"1|2|4".parse().unwrap()));
}

#[test]
fn given_copy_paste_when_committing_then_catalog_node_attached() {
    // Arrange
    let repo = repository_with_tree();
    let unit = Node::new_learning_unit(NodeId::new("LPSP1002", 2024), "Psychologie", 4.0);
    repo.register_node(&unit);
    let service = TreeEditService::new(repo.clone());

    // Act
    let (link, _) = service
        .paste_element(&PasteElementCommand {
            root: NodeId::new("LDROI100B", 2024),
            node_to_paste: NodeId::new("LPSP1002", 2024),
            element_type: ElementType::LearningUnit,
            path_where_to_detach: None,
            path_where_to_paste: "1|2|3".parse().unwrap(),
            attributes: LinkAttributes::default(),
            commit: true,
        })
        .unwrap();

    // Assert
    assert_eq!(link.to_string(), "LDROI104G -> LPSP1002");
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    assert_eq!(reloaded.all_paths().len(), 5);
}

#[test]
fn given_missing_tree_when_attaching_then_tree_not_found() {
    let repo = Arc::new(InMemoryTreeRepository::new(rules()));
    let service = TreeEditService::new(repo);

    let result = service.attach_node(&AttachNodeCommand {
        root: NodeId::new("LDROI100B", 2024),
        node_to_attach: NodeId::new("LPSP1002", 2024),
        path_where_to_attach: "1".parse().unwrap(),
        attributes: LinkAttributes::default(),
        commit: false,
    });

    assert!(matches!(result, Err(ApplicationError::TreeNotFound(_))));
}

#[test]
fn given_invalid_target_when_pasting_then_nothing_persisted() {
    // Arrange - the paste target sits inside the subtree being cut
    let repo = repository_with_tree();
    let service = TreeEditService::new(repo.clone());

    // Act
    let result = service.paste_element(&PasteElementCommand {
        root: NodeId::new("LDROI100B", 2024),
        node_to_paste: NodeId::new("LDROI100T", 2024),
        element_type: ElementType::EducationGroup,
        path_where_to_detach: Some("1|2".parse().unwrap()),
        path_where_to_paste: "1|2|3".parse().unwrap(),
        attributes: LinkAttributes::default(),
        commit: true,
    });

    // Assert
    assert!(result.is_err());
    let reloaded = repo.get(&NodeId::new("LDROI100B", 2024)).unwrap();
    assert_eq!(reloaded.all_paths().len(), 4);
}
