//! Tests for program tree versions: copy consistency, the version builder,
//! and the version service.

use std::sync::Arc;

use cursus::application::commands::CreateProgramTreeVersionCommand;
use cursus::application::{ApplicationError, VersionService};
use cursus::domain::{
    check_copy_consistency, default_rules, AuthorizedRelationshipList, DomainError, GroupKind,
    LinkAttributes, Node, NodeId, ProgramTree, ProgramTreeVersion, ProgramTreeVersionBuilder,
    ProgramTreeVersionIdentity, VersionSpec,
};
use cursus::infrastructure::traits::{ProgramTreeRepository, ProgramTreeVersionRepository};
use cursus::infrastructure::{InMemoryTreeRepository, InMemoryVersionRepository};

fn rules() -> AuthorizedRelationshipList {
    AuthorizedRelationshipList::new(default_rules()).expect("baseline rules")
}

fn master_tree(year: i32) -> ProgramTree {
    let root = Node::new_group(NodeId::new("LDROI200M", year), "Master en droit", GroupKind::Master120)
        .with_credits(120.0);
    let mut tree = ProgramTree::new(root, rules()).unwrap();
    let root_path = tree.root_path();
    let core = Node::new_group(NodeId::new("LDROI200T", year), "Tronc commun", GroupKind::CommonCore);
    tree.attach_node(core, &root_path, LinkAttributes::default())
        .unwrap();
    tree
}

fn standard_version(year: i32) -> ProgramTreeVersion {
    ProgramTreeVersion {
        identity: ProgramTreeVersionIdentity::standard("DROI2M", year),
        tree_identity: NodeId::new("LDROI200M", year),
        title_fr: Some("Master en droit".to_string()),
        title_en: None,
        end_year_of_existence: None,
    }
}

fn spec() -> VersionSpec {
    VersionSpec {
        version_name: "CEMS".to_string(),
        is_transition: false,
        title_fr: Some("Master en droit (CEMS)".to_string()),
        title_en: None,
        end_year: None,
    }
}

#[test]
fn given_identical_copy_when_checking_consistency_then_ok() {
    let source = master_tree(2024);
    let copy = source.copy_to_next_year().unwrap();

    assert!(check_copy_consistency(&source, &copy).is_ok());
}

#[test]
fn given_diverged_root_when_checking_consistency_then_fields_reported() {
    // Arrange
    let source = master_tree(2024);
    let mut copy = source.copy_to_next_year().unwrap();
    let root_index = copy.root_index();
    {
        let root = copy.node_mut(root_index).unwrap();
        root.title = "Master en droit (reforme)".to_string();
        root.credits = Some(60.0);
    }

    // Act
    let result = check_copy_consistency(&source, &copy);

    // Assert
    match result {
        Err(DomainError::CopyConsistency { fields }) => {
            assert!(fields.contains(&"title".to_string()));
            assert!(fields.contains(&"credits".to_string()));
        }
        other => panic!("expected CopyConsistency, got {:?}", other),
    }
}

#[test]
fn given_standard_version_when_building_specific_then_root_code_is_derived() {
    // Arrange
    let standard = standard_version(2024);
    let tree = master_tree(2024);

    // Act
    let (version, derived_tree) =
        ProgramTreeVersionBuilder::build_from(&standard, &tree, &spec()).unwrap();

    // Assert
    assert_eq!(version.identity.version_name, "CEMS");
    assert_eq!(version.identity.offer_acronym, "DROI2M");
    assert!(!version.identity.is_standard());
    assert_eq!(derived_tree.identity(), NodeId::new("LDROI200MCEMS", 2024));
    // The rest of the structure keeps its own codes.
    assert_eq!(derived_tree.all_paths().len(), tree.all_paths().len());
}

#[test]
fn given_non_standard_source_when_building_then_rejected() {
    let mut not_standard = standard_version(2024);
    not_standard.identity.version_name = "CEMS".to_string();
    let tree = master_tree(2024);

    let result = ProgramTreeVersionBuilder::build_from(&not_standard, &tree, &spec());

    assert!(matches!(
        result,
        Err(DomainError::NotStandardVersion(_))
    ));
}

#[test]
fn given_standard_versions_over_two_years_when_creating_then_one_specific_per_year() {
    // Arrange
    let trees = Arc::new(InMemoryTreeRepository::new(rules()));
    let versions = Arc::new(InMemoryVersionRepository::new());
    for year in [2024, 2025] {
        trees.create(&master_tree(year)).unwrap();
        versions.create(&standard_version(year)).unwrap();
    }
    let service = VersionService::new(trees.clone(), versions.clone());

    // Act
    let created = service
        .create_program_tree_version(&CreateProgramTreeVersionCommand {
            offer_acronym: "DROI2M".to_string(),
            from_year: 2024,
            version_name: "CEMS".to_string(),
            is_transition: false,
            title_fr: Some("Master en droit (CEMS)".to_string()),
            title_en: None,
            end_year: None,
        })
        .unwrap();

    // Assert - stops after 2025 because no standard exists beyond it
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].year, 2024);
    assert_eq!(created[1].year, 2025);
    trees.get(&NodeId::new("LDROI200MCEMS", 2024)).unwrap();
    trees.get(&NodeId::new("LDROI200MCEMS", 2025)).unwrap();
    assert_eq!(versions.search("DROI2M", 2024).unwrap().len(), 2);
}

#[test]
fn given_no_standard_version_when_creating_then_version_not_found() {
    let trees = Arc::new(InMemoryTreeRepository::new(rules()));
    let versions = Arc::new(InMemoryVersionRepository::new());
    let service = VersionService::new(trees, versions);

    let result = service.create_program_tree_version(&CreateProgramTreeVersionCommand {
        offer_acronym: "DROI2M".to_string(),
        from_year: 2024,
        version_name: "CEMS".to_string(),
        is_transition: false,
        title_fr: None,
        title_en: None,
        end_year: None,
    });

    assert!(matches!(result, Err(ApplicationError::VersionNotFound(_))));
}

#[test]
fn given_tree_when_copying_to_next_year_via_service_then_created_once() {
    // Arrange
    let trees = Arc::new(InMemoryTreeRepository::new(rules()));
    let versions = Arc::new(InMemoryVersionRepository::new());
    trees.create(&master_tree(2024)).unwrap();
    let service = VersionService::new(trees.clone(), versions);
    let identity = NodeId::new("LDROI200M", 2024);

    // Act
    let copied = service.copy_tree_to_next_year(&identity).unwrap();
    // Second run finds a consistent copy and leaves it alone.
    let again = service.copy_tree_to_next_year(&identity).unwrap();

    // Assert
    assert_eq!(copied, NodeId::new("LDROI200M", 2025));
    assert_eq!(again, copied);
    trees.get(&copied).unwrap();
}

#[test]
fn given_diverged_next_year_tree_when_copying_then_consistency_error() {
    // Arrange - the next year already exists with a different root title
    let trees = Arc::new(InMemoryTreeRepository::new(rules()));
    let versions = Arc::new(InMemoryVersionRepository::new());
    trees.create(&master_tree(2024)).unwrap();
    let mut diverged = master_tree(2025);
    let root_index = diverged.root_index();
    diverged.node_mut(root_index).unwrap().title = "Autre master".to_string();
    trees.create(&diverged).unwrap();
    let service = VersionService::new(trees, versions);

    // Act
    let result = service.copy_tree_to_next_year(&NodeId::new("LDROI200M", 2024));

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::CopyConsistency { .. }))
    ));
}

#[test]
fn given_versions_across_years_when_asking_last_in_past_then_latest_match() {
    let trees = Arc::new(InMemoryTreeRepository::new(rules()));
    let versions = Arc::new(InMemoryVersionRepository::new());
    for year in [2022, 2023] {
        versions.create(&standard_version(year)).unwrap();
    }
    let service = VersionService::new(trees, versions);

    let found = service
        .last_version_in_past("DROI2M", 2025, "", false)
        .unwrap()
        .expect("2023 exists");

    assert_eq!(found.identity.year, 2023);
}
