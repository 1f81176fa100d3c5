//! Command dispatch: wires settings, stores and services per invocation.

use std::io;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::commands::{
    AttachNodeCommand, DetachNodeCommand, PasteElementCommand, PostponeCommand,
};
use crate::application::{ApplicationError, PostponementService, TreeEditService};
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{
    AuthorizedRelationshipList, Block, DomainError, ElementType, LinkAttributes, NodeId,
    ProgramTree, TreePath, YearSnapshot,
};
use crate::infrastructure::traits::{
    ProgramTreeRepository, ProgramTreeVersionRepository, YearRecordStore,
};
use crate::infrastructure::{FileTreeRepository, FileVersionRepository, FileYearRecordStore};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let mut settings = Settings::load()?;
    if let Some(store_dir) = &cli.store_dir {
        settings.store_dir = store_dir.clone();
    }
    debug!(store_dir = %settings.store_dir.display(), "effective settings");

    match &cli.command {
        Some(Commands::Show { code, year }) => show(&settings, code, *year),
        Some(Commands::List) => list(&settings),
        Some(Commands::Attach {
            code,
            year,
            node,
            path,
            block,
            mandatory,
            relative_credits,
            dry_run,
        }) => attach(
            &settings,
            code,
            *year,
            node,
            path,
            block.as_deref(),
            *mandatory,
            *relative_credits,
            *dry_run,
        ),
        Some(Commands::Detach {
            code,
            year,
            path,
            dry_run,
        }) => detach(&settings, code, *year, path, *dry_run),
        Some(Commands::Paste {
            code,
            year,
            node,
            from,
            to,
            dry_run,
        }) => paste(&settings, code, *year, node, from.as_deref(), to, *dry_run),
        Some(Commands::Postpone {
            code,
            from_year,
            end_year,
        }) => postpone(&settings, code, *from_year, *end_year),
        Some(Commands::Versions { offer, year }) => versions(&settings, offer, *year),
        Some(Commands::Config) => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn tree_repository(settings: &Settings) -> CliResult<FileTreeRepository> {
    let rules = AuthorizedRelationshipList::new(crate::domain::default_rules())?;
    Ok(FileTreeRepository::new(&settings.store_dir, rules)?)
}

#[instrument(skip(settings))]
fn show(settings: &Settings, code: &str, year: i32) -> CliResult<()> {
    let repo = tree_repository(settings)?;
    let tree = repo.get(&NodeId::new(code, year))?;
    let root = tree.node(tree.root_index());
    if let Some(category) = root.and_then(|n| n.group_type()).map(|g| g.category()) {
        output::header(&format!("{} ({}) [{}]", code, year, category));
    }
    output::info(&render(&tree));
    Ok(())
}

fn list(settings: &Settings) -> CliResult<()> {
    let repo = tree_repository(settings)?;
    let identities = repo.list()?;
    if identities.is_empty() {
        output::detail(&"no trees in store");
        return Ok(());
    }
    for identity in identities {
        output::info(&identity);
    }
    Ok(())
}

fn parse_path(raw: &str) -> CliResult<TreePath> {
    raw.parse::<TreePath>().map_err(CliError::from)
}

fn parse_attributes(
    block: Option<&str>,
    mandatory: bool,
    relative_credits: Option<i32>,
) -> CliResult<LinkAttributes> {
    let block = match block {
        Some(raw) => raw.parse::<Block>()?,
        None => Block::default(),
    };
    Ok(LinkAttributes {
        relative_credits,
        is_mandatory: mandatory,
        block,
        ..LinkAttributes::default()
    })
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(settings))]
fn attach(
    settings: &Settings,
    code: &str,
    year: i32,
    node: &str,
    path: &str,
    block: Option<&str>,
    mandatory: bool,
    relative_credits: Option<i32>,
    dry_run: bool,
) -> CliResult<()> {
    let service = TreeEditService::new(Arc::new(tree_repository(settings)?));
    let command = AttachNodeCommand {
        root: NodeId::new(code, year),
        node_to_attach: NodeId::new(node, year),
        path_where_to_attach: parse_path(path)?,
        attributes: parse_attributes(block, mandatory, relative_credits)?,
        commit: !dry_run,
    };
    let (link, _) = match service.attach_node(&command) {
        Ok(attached) => attached,
        Err(err) => {
            if let ApplicationError::Domain(DomainError::UnauthorizedRelationship {
                parent_type,
                ..
            }) = &err
            {
                let rules = AuthorizedRelationshipList::new(crate::domain::default_rules())?;
                let allowed = rules.get_authorized_children_types(*parent_type);
                if !allowed.is_empty() {
                    output::detail(&format!(
                        "authorized under {}: {}",
                        parent_type,
                        allowed.iter().join(", ")
                    ));
                }
            }
            return Err(err.into());
        }
    };
    if dry_run {
        output::success(&format!("would attach {}", link));
    } else {
        output::action("attached", &link);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn detach(settings: &Settings, code: &str, year: i32, path: &str, dry_run: bool) -> CliResult<()> {
    let service = TreeEditService::new(Arc::new(tree_repository(settings)?));
    let command = DetachNodeCommand {
        root: NodeId::new(code, year),
        path_to_detach: parse_path(path)?,
        commit: !dry_run,
    };
    let (detached, _) = service.detach_node(&command)?;
    if dry_run {
        output::success(&format!("would detach {}", detached.identity));
    } else {
        output::action("detached", &detached.identity);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn paste(
    settings: &Settings,
    code: &str,
    year: i32,
    node: &str,
    from: Option<&str>,
    to: &str,
    dry_run: bool,
) -> CliResult<()> {
    let service = TreeEditService::new(Arc::new(tree_repository(settings)?));
    let command = PasteElementCommand {
        root: NodeId::new(code, year),
        node_to_paste: NodeId::new(node, year),
        element_type: ElementType::EducationGroup,
        path_where_to_detach: from.map(parse_path).transpose()?,
        path_where_to_paste: parse_path(to)?,
        attributes: LinkAttributes::default(),
        commit: !dry_run,
    };
    let (link, _) = service.paste_element(&command)?;
    if dry_run {
        output::success(&format!("would paste {}", link));
    } else {
        output::action("pasted", &link);
    }
    Ok(())
}

/// Copy a year record forward. A drift conflict is reported as a warning,
/// not a failure: the years before the conflict are already written.
#[instrument(skip(settings))]
fn postpone(settings: &Settings, code: &str, from_year: i32, end_year: Option<i32>) -> CliResult<()> {
    let store = Arc::new(FileYearRecordStore::new(&settings.store_dir)?);
    let source = store
        .get(code, from_year)?
        .ok_or_else(|| ApplicationError::RecordNotFound {
            code: code.to_string(),
            year: from_year,
        })?;
    let service = PostponementService::new(store, settings.max_postpone_years);
    let report = service.postpone(&PostponeCommand {
        code: code.to_string(),
        from_year,
        end_year,
        initial_snapshot: YearSnapshot::capture(source.fields.clone()),
    })?;
    for year in &report.postponed {
        output::success(&format!("{} copied to {}", code, year));
    }
    if let Some(conflict) = &report.conflict {
        output::warning(&conflict.message());
    }
    Ok(())
}

#[instrument(skip(settings))]
fn versions(settings: &Settings, offer: &str, year: i32) -> CliResult<()> {
    let repo = FileVersionRepository::new(&settings.store_dir)?;
    let found = repo.search(offer, year)?;
    if found.is_empty() {
        output::detail(&format!("no versions of {} in {}", offer, year));
        return Ok(());
    }
    output::header(&format!("{} ({})", offer, year));
    for version in found {
        let title = version.title_fr.as_deref().unwrap_or("-");
        output::detail(&format!("{}  {}", version.identity, title));
    }
    Ok(())
}

/// Render a tree with box-drawing branches. Shared nodes are shown at every
/// path they are reachable through.
pub fn render(tree: &ProgramTree) -> String {
    let rendered = build_branch(tree, tree.root_index(), &mut Vec::new());
    rendered.to_string()
}

fn build_branch(
    tree: &ProgramTree,
    index: Index,
    ancestors: &mut Vec<u64>,
) -> termtree::Tree<String> {
    let node = tree.node(index).expect("render walks live indices");
    let mut branch = termtree::Tree::new(label(tree, index));
    ancestors.push(node.node_id);
    for link in &node.children {
        if let Some(child) = tree.node(link.child) {
            if ancestors.contains(&child.node_id) {
                continue;
            }
            let mut child_branch = build_branch(tree, link.child, ancestors);
            if link.is_reference() {
                child_branch.root.push_str(" (ref)");
            }
            branch.push(child_branch);
        }
    }
    ancestors.pop();
    branch
}

fn label(tree: &ProgramTree, index: Index) -> String {
    let node = tree.node(index).expect("render walks live indices");
    let mut label = format!("{} {}", node.id, node.title);
    if let Some(credits) = node.credits {
        label.push_str(&format!(" ({} cr)", credits));
    }
    if let Some(group_type) = node.group_type() {
        label.push_str(&format!(" [{}]", group_type));
    }
    label
}
