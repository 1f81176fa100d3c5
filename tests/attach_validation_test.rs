//! Tests for attach validation: cycles, duplicates, authorization,
//! cardinality. A rejected attach must leave the tree untouched.

use cursus::domain::{
    default_rules, AuthorizedRelationshipList, DomainError, GroupKind, LinkAttributes, Node,
    NodeId, ProgramTree, TreePath,
};

fn rules() -> AuthorizedRelationshipList {
    AuthorizedRelationshipList::new(default_rules()).expect("baseline rules")
}

fn bachelor_tree() -> ProgramTree {
    let root = Node::new_group(NodeId::new("LDROI100B", 2024), "Bachelier en droit", GroupKind::Bachelor);
    let mut tree = ProgramTree::new(root, rules()).unwrap();
    let root_path = tree.root_path();

    let core = Node::new_group(NodeId::new("LDROI100T", 2024), "Tronc commun", GroupKind::CommonCore);
    tree.attach_node(core, &root_path, LinkAttributes::default())
        .unwrap();
    let core_path = root_path.child(2);

    let sub = Node::new_group(NodeId::new("LDROI104G", 2024), "Sous-groupe", GroupKind::SubGroup);
    tree.attach_node(sub, &core_path, LinkAttributes::default())
        .unwrap();

    let unit = Node::new_learning_unit(NodeId::new("LDROI1001", 2024), "Droit civil", 5.0);
    tree.attach_node(unit, &core_path, LinkAttributes::default())
        .unwrap();
    tree
}

fn assert_unchanged(tree: &ProgramTree) {
    assert_eq!(tree.all_paths().len(), 4, "failed attach must not mutate");
}

#[test]
fn given_learning_unit_root_when_creating_tree_then_rejected() {
    let leaf = Node::new_learning_unit(NodeId::new("LDROI1001", 2024), "Droit civil", 5.0);

    let result = ProgramTree::new(leaf, rules());

    assert!(matches!(result, Err(DomainError::RootMustBeGroup(_))));
}

#[test]
fn given_ancestor_identity_when_attaching_below_then_cycle_detected() {
    // Arrange
    let mut tree = bachelor_tree();
    let sub_path: TreePath = "1|2|3".parse().unwrap();
    // Same identity as the common core, which sits on the attach path.
    let ancestor_twin =
        Node::new_group(NodeId::new("LDROI100T", 2024), "Tronc commun", GroupKind::SubGroup);

    // Act
    let result = tree.attach_node(ancestor_twin, &sub_path, LinkAttributes::default());

    // Assert
    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
    assert_unchanged(&tree);
}

#[test]
fn given_root_identity_when_attaching_below_then_cycle_not_duplicate() {
    // The root is also a descendant of itself in path terms; the cycle
    // check must win over the duplicate check.
    let mut tree = bachelor_tree();
    let sub_path: TreePath = "1|2|3".parse().unwrap();
    let root_twin =
        Node::new_group(NodeId::new("LDROI100B", 2024), "Bachelier en droit", GroupKind::SubGroup);

    let result = tree.attach_node(root_twin, &sub_path, LinkAttributes::default());

    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
    assert_unchanged(&tree);
}

#[test]
fn given_node_already_in_tree_when_attaching_elsewhere_then_duplicate() {
    // Arrange - the learning unit already hangs under the common core
    let mut tree = bachelor_tree();
    let sub_path: TreePath = "1|2|3".parse().unwrap();
    let unit_twin = Node::new_learning_unit(NodeId::new("LDROI1001", 2024), "Droit civil", 5.0);

    // Act
    let result = tree.attach_node(unit_twin, &sub_path, LinkAttributes::default());

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyAttached(_))));
    assert_unchanged(&tree);
}

#[test]
fn given_unauthorized_child_type_when_attaching_then_rejected() {
    // Arrange - CommonCore may not hang under a SubGroup
    let mut tree = bachelor_tree();
    let sub_path: TreePath = "1|2|3".parse().unwrap();
    let core = Node::new_group(NodeId::new("LFIAL200T", 2024), "Autre tronc", GroupKind::CommonCore);

    // Act
    let result = tree.attach_node(core, &sub_path, LinkAttributes::default());

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::UnauthorizedRelationship { .. })
    ));
    assert_unchanged(&tree);
}

#[test]
fn given_cardinality_reached_when_attaching_then_rejected() {
    // Arrange - a Bachelor holds at most one CommonCore
    let mut tree = bachelor_tree();
    let root_path = tree.root_path();
    let second_core =
        Node::new_group(NodeId::new("LFIAL100T", 2024), "Deuxieme tronc", GroupKind::CommonCore);

    // Act
    let result = tree.attach_node(second_core, &root_path, LinkAttributes::default());

    // Assert
    match result {
        Err(DomainError::CardinalityExceeded { count, max, .. }) => {
            assert_eq!(count, 1);
            assert_eq!(max, 1);
        }
        other => panic!("expected CardinalityExceeded, got {:?}", other),
    }
    assert_unchanged(&tree);
}

#[test]
fn given_learning_unit_parent_when_attaching_then_rejected() {
    // Arrange
    let mut tree = bachelor_tree();
    let unit_path: TreePath = "1|2|4".parse().unwrap();
    let child = Node::new_learning_unit(NodeId::new("LPSP1002", 2024), "Psychologie", 3.0);

    // Act
    let result = tree.attach_node(child, &unit_path, LinkAttributes::default());

    // Assert
    assert!(matches!(result, Err(DomainError::ChildrenNotAllowed(_))));
    assert_unchanged(&tree);
}

#[test]
fn given_unknown_path_when_attaching_then_node_not_found() {
    let mut tree = bachelor_tree();
    let bad_path: TreePath = "1|9".parse().unwrap();
    let child = Node::new_learning_unit(NodeId::new("LPSP1002", 2024), "Psychologie", 3.0);

    let result = tree.attach_node(child, &bad_path, LinkAttributes::default());

    assert!(matches!(result, Err(DomainError::NodeNotFound(_))));
    assert_unchanged(&tree);
}
