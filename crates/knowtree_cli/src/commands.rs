//! Command execution over one opened database.

use crate::args::{Cli, Commands, PositionArg};
use anyhow::{anyhow, bail, Context, Result};
use knowtree_core::repo::settings_repo::ACTIVE_TREE_KEY;
use knowtree_core::{
    commit_drop, export_library, export_tree, import_tree_json, open_db, search_nodes,
    CaptureConfig, CaptureListener, CaptureReconciler, ConversationRef, ConversationSync,
    DropRequest, ForestNode, NodeId, NodeSearchQuery, NodeStore, SettingsRepository,
    SqliteNodeStore, StaticSource, SyncOutcome, TreeId, TreeService,
};
use log::info;
use rusqlite::Connection;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

const SHORT_ID_CHARS: usize = 8;

/// Prints how many nodes a capture created.
struct PrintListener;

impl CaptureListener for PrintListener {
    fn nodes_captured(&mut self, tree_id: TreeId, count: usize) {
        println!("captured {count} new node(s) into {}", short_id(tree_id));
    }
}

pub fn execute(cli: &Cli) -> Result<()> {
    let conn = open_db(&cli.db).with_context(|| format!("cannot open {}", cli.db.display()))?;
    let service = TreeService::new(SqliteNodeStore::try_new(&conn)?);
    let settings = SettingsRepository::try_new(&conn)?;
    let ctx = Session {
        conn: &conn,
        service: &service,
        settings: &settings,
    };
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match &cli.command {
        Commands::Trees => ctx.list_trees(),
        Commands::NewTree { name } => ctx.new_tree(name.as_deref()),
        Commands::Use { tree } => ctx.use_tree(tree),
        Commands::Show { tree } => ctx.show(tree.as_deref()),
        Commands::Add {
            title,
            parent,
            tree,
        } => ctx.add(title, parent.as_deref(), tree.as_deref()),
        Commands::Capture { input, tree } => ctx.capture(input.as_deref(), tree.as_deref()),
        Commands::Sync {
            session,
            title,
            input,
        } => ctx.sync(session, title.as_deref(), input.as_deref()),
        Commands::Move {
            node,
            target,
            position,
            tree,
        } => ctx.move_node(node, target, *position, tree.as_deref()),
        Commands::Delete { node, tree } => ctx.delete(node, tree.as_deref()),
        Commands::Export { tree, all, output } => {
            ctx.export(tree.as_deref(), *all, output.as_deref())
        }
        Commands::Import { input } => ctx.import(input),
        Commands::Search { query, tree, limit } => ctx.search(query, tree.as_deref(), *limit),
    }
}

/// Borrowed handles shared by every command.
struct Session<'a, 'conn> {
    conn: &'conn Connection,
    service: &'a TreeService<SqliteNodeStore<'conn>>,
    settings: &'a SettingsRepository<'conn>,
}

impl Session<'_, '_> {
    fn store(&self) -> &SqliteNodeStore<'_> {
        self.service.store()
    }

    fn list_trees(&self) -> Result<()> {
        let active = self.active_tree_id()?;
        for tree in self.store().list_trees()? {
            let marker = if Some(tree.id) == active { "*" } else { " " };
            println!(
                "{marker} {}  {:<32} {:>5} nodes  {}",
                short_id(tree.id),
                tree.name,
                tree.node_count,
                tree.source_tag
            );
        }
        Ok(())
    }

    fn new_tree(&self, name: Option<&str>) -> Result<()> {
        let tree = self.service.create_tree(name)?;
        self.set_active(tree.id)?;
        println!("created tree {} ({})", tree.name, tree.id);
        Ok(())
    }

    fn use_tree(&self, selector: &str) -> Result<()> {
        let tree_id = self.find_tree(selector)?;
        self.set_active(tree_id)?;
        println!("active tree is now {tree_id}");
        Ok(())
    }

    fn show(&self, tree: Option<&str>) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let forest = self.service.forest(tree_id)?;
        if forest.is_empty() {
            println!("(empty)");
        }
        for root in &forest {
            print_outline(root, 0);
        }
        Ok(())
    }

    fn add(&self, title: &str, parent: Option<&str>, tree: Option<&str>) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let node = match parent {
            Some(parent) => {
                let parent_id = self.find_node(tree_id, parent)?;
                self.service.add_child_node(parent_id, Some(title))?
            }
            None => self.service.add_main_node(tree_id, Some(title))?,
        };
        println!("added {} {}", short_id(node.id), node.title);
        Ok(())
    }

    fn capture(&self, input: Option<&Path>, tree: Option<&str>) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let mut source = StaticSource::new(read_snippets(input)?);
        let reconciler = CaptureReconciler::new(self.store(), CaptureConfig::default());
        let report = reconciler.capture(tree_id, &mut source, &mut PrintListener)?;
        if report.created.is_empty() {
            println!("nothing new ({} candidate(s))", report.candidates);
        }
        if report.failed > 0 {
            eprintln!("{} snippet(s) could not be stored", report.failed);
        }
        Ok(())
    }

    fn sync(&self, session: &str, title: Option<&str>, input: Option<&Path>) -> Result<()> {
        let mut conversation = ConversationRef::new(session);
        conversation.title = title.map(str::to_string);
        let mut source = StaticSource::new(read_snippets(input)?);
        let sync = ConversationSync::new(self.store(), CaptureConfig::default());

        match sync.sync(&conversation, &mut source, &mut PrintListener)? {
            SyncOutcome::Skipped => println!("sync already in progress; skipped"),
            SyncOutcome::Synced(report) => {
                self.set_active(report.tree.id)?;
                let verb = if report.tree_created { "created" } else { "updated" };
                println!(
                    "{verb} tree {} ({} nodes)",
                    report.tree.name, report.tree.node_count
                );
            }
        }
        Ok(())
    }

    fn move_node(
        &self,
        node: &str,
        target: &str,
        position: PositionArg,
        tree: Option<&str>,
    ) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let dragged_id = self.find_node(tree_id, node)?;
        let target_id = self.find_node(tree_id, target)?;
        if dragged_id == target_id {
            bail!("a node cannot be dropped on itself");
        }
        if self.store().is_descendant(dragged_id, target_id)? {
            bail!("cannot move a node into its own subtree");
        }
        let request = DropRequest {
            dragged_id,
            target_id,
            position: position.into(),
        };
        let applied = commit_drop(self.store(), &request)?;
        println!("moved {} ({applied} update(s))", short_id(dragged_id));
        Ok(())
    }

    fn delete(&self, node: &str, tree: Option<&str>) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let node_id = self.find_node(tree_id, node)?;
        let removed = self.service.delete_node(node_id)?;
        println!("deleted {removed} node(s)");
        Ok(())
    }

    fn export(&self, tree: Option<&str>, all: bool, output: Option<&Path>) -> Result<()> {
        let json = if all {
            serde_json::to_string_pretty(&export_library(self.store())?)?
        } else {
            let tree_id = self.resolve_tree(tree)?;
            serde_json::to_string_pretty(&export_tree(self.store(), tree_id)?)?
        };
        match output {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("cannot write {}", path.display()))?,
            None => println!("{json}"),
        }
        Ok(())
    }

    fn import(&self, input: &Path) -> Result<()> {
        let json = std::fs::read_to_string(input)
            .with_context(|| format!("cannot read {}", input.display()))?;
        let imported = import_tree_json(self.store(), &json)?;
        self.set_active(imported.tree.id)?;
        println!(
            "imported tree {} with {} node(s) as {}",
            imported.tree.name,
            imported.nodes.len(),
            imported.tree.id
        );
        Ok(())
    }

    fn search(&self, query: &str, tree: Option<&str>, limit: u32) -> Result<()> {
        let tree_id = self.resolve_tree(tree)?;
        let mut request = NodeSearchQuery::new(tree_id, query);
        request.limit = limit;
        for hit in search_nodes(self.conn, &request)? {
            println!(
                "{}  {}  (depth {})",
                short_id(hit.node_id),
                hit.title,
                hit.ancestors.len()
            );
        }
        Ok(())
    }

    fn active_tree_id(&self) -> Result<Option<TreeId>> {
        let Some(value) = self.settings.get(ACTIVE_TREE_KEY)? else {
            return Ok(None);
        };
        Ok(value.as_str().and_then(|text| Uuid::parse_str(text).ok()))
    }

    fn set_active(&self, tree_id: TreeId) -> Result<()> {
        self.settings
            .set(ACTIVE_TREE_KEY, &serde_json::Value::from(tree_id.to_string()))?;
        Ok(())
    }

    /// Explicit selector, else the active tree.
    fn resolve_tree(&self, selector: Option<&str>) -> Result<TreeId> {
        if let Some(selector) = selector {
            return self.find_tree(selector);
        }
        let tree_id = self
            .active_tree_id()?
            .ok_or_else(|| anyhow!("no active tree; run `knowtree new-tree` or pass --tree"))?;
        if self.store().get_tree(tree_id)?.is_none() {
            bail!("active tree {tree_id} no longer exists; pick another with `knowtree use`");
        }
        Ok(tree_id)
    }

    fn find_tree(&self, selector: &str) -> Result<TreeId> {
        let ids: Vec<Uuid> = self
            .store()
            .list_trees()?
            .into_iter()
            .map(|tree| tree.id)
            .collect();
        match_id(&ids, selector).with_context(|| format!("tree `{selector}`"))
    }

    fn find_node(&self, tree_id: TreeId, selector: &str) -> Result<NodeId> {
        let ids: Vec<Uuid> = self
            .store()
            .nodes_by_tree(tree_id)?
            .into_iter()
            .map(|node| node.id)
            .collect();
        match_id(&ids, selector).with_context(|| format!("node `{selector}`"))
    }
}

/// Resolves a full id or a unique prefix of one.
fn match_id(candidates: &[Uuid], selector: &str) -> Result<Uuid> {
    let needle = selector.trim().to_ascii_lowercase();
    if needle.is_empty() {
        bail!("empty id");
    }
    let mut found = candidates
        .iter()
        .filter(|id| id.to_string().starts_with(&needle));
    match (found.next(), found.next()) {
        (Some(id), None) => Ok(*id),
        (None, _) => bail!("no match"),
        (Some(_), Some(_)) => bail!("ambiguous prefix"),
    }
}

fn read_snippets(input: Option<&Path>) -> Result<Vec<String>> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().lock().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn print_outline(entry: &ForestNode, depth: usize) {
    let fold = if entry.node.collapsed && !entry.children.is_empty() {
        "+"
    } else {
        "-"
    };
    println!(
        "{:indent$}{fold} {}  {}",
        "",
        entry.node.title,
        short_id(entry.node.id),
        indent = depth * 2
    );
    if entry.node.collapsed {
        return;
    }
    for child in &entry.children {
        print_outline(child, depth + 1);
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(SHORT_ID_CHARS).collect()
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Trees => "trees",
        Commands::NewTree { .. } => "new-tree",
        Commands::Use { .. } => "use",
        Commands::Show { .. } => "show",
        Commands::Add { .. } => "add",
        Commands::Capture { .. } => "capture",
        Commands::Sync { .. } => "sync",
        Commands::Move { .. } => "move",
        Commands::Delete { .. } => "delete",
        Commands::Export { .. } => "export",
        Commands::Import { .. } => "import",
        Commands::Search { .. } => "search",
    }
}
