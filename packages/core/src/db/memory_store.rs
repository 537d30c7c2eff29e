//! In-Memory Link Store
//!
//! Adjacency-list implementation of [`RowSource`] and [`LinkStore`] for both
//! hierarchies. Traversals run on demand over the adjacency lists instead of
//! re-deriving anything from a query engine:
//!
//! - Each row carries the path of link ids that produced it
//! - A link already on the path ends the branch (stored loops terminate)
//! - Expansion stops at the configured depth bound
//!
//! Rows come out breadth-first, so sibling order in built trees follows
//! depth order and link creation order.

use super::events::LinkEvent;
use super::row_source::{LinkStore, RowSource};
use crate::config::HierarchyConfig;
use crate::models::{GraphRow, Link, LinkId, LinkPath, NewLink, NodeId, RelationKind, SpaceId};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::{broadcast, RwLock};

/// Broadcast channel capacity for link events.
const LINK_EVENT_CHANNEL_CAPACITY: usize = 128;

/// One link table with its adjacency indexes
#[derive(Debug, Default)]
struct LinkTable {
    links: BTreeMap<LinkId, Link>,
    by_parent: HashMap<NodeId, Vec<LinkId>>,
    by_child: HashMap<NodeId, Vec<LinkId>>,
}

impl LinkTable {
    fn insert(&mut self, link: Link) {
        if let Some(parent_id) = link.parent_id {
            self.by_parent.entry(parent_id).or_default().push(link.id);
        }
        self.by_child.entry(link.child_id).or_default().push(link.id);
        self.links.insert(link.id, link);
    }

    fn remove(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.remove(&link_id)?;
        if let Some(parent_id) = link.parent_id {
            if let Some(ids) = self.by_parent.get_mut(&parent_id) {
                ids.retain(|id| *id != link_id);
            }
        }
        if let Some(ids) = self.by_child.get_mut(&link.child_id) {
            ids.retain(|id| *id != link_id);
        }
        Some(link)
    }

    fn children(&self, parent_id: NodeId) -> impl Iterator<Item = &Link> {
        self.by_parent
            .get(&parent_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
    }

    fn parents(&self, child_id: NodeId) -> impl Iterator<Item = &Link> {
        self.by_child
            .get(&child_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
    }

    fn has_children(&self, node_id: NodeId) -> bool {
        self.children(node_id).next().is_some()
    }

    /// The link a node is rooted through: its first unbound link, else its first link
    fn primary_link(&self, node_id: NodeId) -> Option<&Link> {
        self.parents(node_id)
            .find(|link| !link.is_bound)
            .or_else(|| self.parents(node_id).next())
    }

    fn contains_exact(&self, link: &NewLink) -> bool {
        self.parents(link.child_id).any(|existing| {
            existing.parent_id == link.parent_id && existing.is_bound == link.is_bound
        })
    }

    /// Breadth-first expansion below the given root rows
    fn expand_down(&self, seeds: Vec<GraphRow>, max_depth: usize) -> Vec<GraphRow> {
        let mut rows = Vec::new();
        let mut queue: VecDeque<GraphRow> = seeds.into_iter().collect();

        while let Some(row) = queue.pop_front() {
            for link in self.children(row.node_id) {
                if row.path.contains(link.id) {
                    tracing::debug!(
                        "Link {} repeats along path {}, ending branch",
                        link.id,
                        row.path
                    );
                    continue;
                }
                if row.depth as usize >= max_depth {
                    tracing::warn!(
                        "Traversal truncated at depth {} below node {}",
                        max_depth,
                        row.node_id
                    );
                    break;
                }
                queue.push_back(row.step(link.child_id, link.id, link.is_bound));
            }
            rows.push(row);
        }

        rows
    }

    /// Breadth-first expansion of parent edges above `node_id`
    fn expand_up(&self, node_id: NodeId, max_depth: usize) -> Vec<GraphRow> {
        let mut rows = Vec::new();
        let mut queue: VecDeque<(NodeId, u32, LinkPath)> = VecDeque::new();
        queue.push_back((node_id, 0, LinkPath::default()));

        while let Some((current, depth, path)) = queue.pop_front() {
            for link in self.parents(current) {
                if path.contains(link.id) {
                    continue;
                }
                let link_path = path.push(link.id);
                rows.push(GraphRow {
                    node_id: current,
                    parent_id: link.parent_id,
                    link_id: link.id,
                    is_bound: link.is_bound,
                    depth,
                    path: link_path.clone(),
                });

                if let Some(parent_id) = link.parent_id {
                    if (depth as usize) < max_depth {
                        queue.push_back((parent_id, depth + 1, link_path));
                    } else {
                        tracing::warn!(
                            "Upward traversal truncated at depth {} above node {}",
                            max_depth,
                            node_id
                        );
                    }
                }
            }
        }

        rows
    }
}

#[derive(Debug, Default)]
struct LinkTables {
    folders: LinkTable,
    tasks: LinkTable,
    next_id: LinkId,
}

impl LinkTables {
    fn table(&self, kind: RelationKind) -> &LinkTable {
        match kind {
            RelationKind::Folder => &self.folders,
            RelationKind::Task => &self.tasks,
        }
    }

    fn table_mut(&mut self, kind: RelationKind) -> &mut LinkTable {
        match kind {
            RelationKind::Folder => &mut self.folders,
            RelationKind::Task => &mut self.tasks,
        }
    }
}

/// Link tables for folders and tasks held in memory
pub struct MemoryLinkStore {
    tables: RwLock<LinkTables>,
    max_depth: usize,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl Default for MemoryLinkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::with_config(&HierarchyConfig::default())
    }

    pub fn with_config(config: &HierarchyConfig) -> Self {
        let (event_tx, _) = broadcast::channel(LINK_EVENT_CHANNEL_CAPACITY);
        Self {
            tables: RwLock::new(LinkTables {
                next_id: 1,
                ..LinkTables::default()
            }),
            max_depth: config.max_depth,
            event_tx,
        }
    }

    /// Subscribe to committed link changes
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.event_tx.subscribe()
    }

    /// Insert a link without any loop check
    ///
    /// Only structural validation happens here: a top-level link needs a
    /// space, a nested link must not carry one, and an identical link may not
    /// exist twice.
    pub async fn insert_unchecked(
        &self,
        kind: RelationKind,
        new_link: NewLink,
    ) -> anyhow::Result<Link> {
        match (new_link.parent_id, new_link.space_id) {
            (None, None) if kind == RelationKind::Folder => {
                bail!("top-level folder {} needs a space", new_link.child_id)
            }
            (Some(parent_id), Some(_)) => bail!(
                "link of {} under {} cannot also be top-level",
                new_link.child_id,
                parent_id
            ),
            _ => {}
        }

        let link = {
            let mut tables = self.tables.write().await;
            if tables.table(kind).contains_exact(&new_link) {
                return Err(anyhow!(
                    "{} link of {} under {:?} already exists",
                    kind,
                    new_link.child_id,
                    new_link.parent_id
                ));
            }

            let link = Link {
                id: tables.next_id,
                parent_id: new_link.parent_id,
                child_id: new_link.child_id,
                is_bound: new_link.is_bound,
                space_id: new_link.space_id,
            };
            tables.next_id += 1;
            tables.table_mut(kind).insert(link.clone());
            link
        };

        tracing::info!(
            "Created {} link {} ({:?} -> {}, bound: {})",
            kind,
            link.id,
            link.parent_id,
            link.child_id,
            link.is_bound
        );
        let _ = self.event_tx.send(LinkEvent::LinkCreated {
            kind,
            link: link.clone(),
        });
        Ok(link)
    }

    /// Remove a link; returns the removed link if it existed
    pub async fn remove_link(&self, kind: RelationKind, link_id: LinkId) -> Option<Link> {
        let removed = self.tables.write().await.table_mut(kind).remove(link_id);
        if removed.is_some() {
            let _ = self.event_tx.send(LinkEvent::LinkRemoved { kind, link_id });
        }
        removed
    }

    /// All links of one hierarchy, ordered by id
    pub async fn links(&self, kind: RelationKind) -> Vec<Link> {
        self.tables.read().await.table(kind).links.values().cloned().collect()
    }
}

#[async_trait]
impl RowSource for MemoryLinkStore {
    async fn descendant_rows(
        &self,
        kind: RelationKind,
        roots: &[NodeId],
    ) -> anyhow::Result<Vec<GraphRow>> {
        let tables = self.tables.read().await;
        let table = tables.table(kind);

        let seeds: Vec<GraphRow> = roots
            .iter()
            .filter_map(|root| match table.primary_link(*root) {
                Some(link) => Some(GraphRow::root(link.child_id, link.id, link.is_bound)),
                None if table.has_children(*root) => Some(GraphRow::unlinked(*root)),
                None => None,
            })
            .collect();

        let rows = table.expand_down(seeds, self.max_depth);
        tracing::debug!("Expanded {} {} rows below {:?}", rows.len(), kind, roots);
        Ok(rows)
    }

    async fn ancestor_rows(
        &self,
        kind: RelationKind,
        node_id: NodeId,
    ) -> anyhow::Result<Vec<GraphRow>> {
        let tables = self.tables.read().await;
        Ok(tables.table(kind).expand_up(node_id, self.max_depth))
    }

    async fn space_rows(
        &self,
        kind: RelationKind,
        space_id: SpaceId,
    ) -> anyhow::Result<Vec<GraphRow>> {
        let tables = self.tables.read().await;
        let table = tables.table(kind);

        let seeds: Vec<GraphRow> = table
            .links
            .values()
            .filter(|link| link.parent_id.is_none() && link.space_id == Some(space_id))
            .map(|link| GraphRow::root(link.child_id, link.id, link.is_bound))
            .collect();

        let rows = table.expand_down(seeds, self.max_depth);
        tracing::debug!("Expanded {} {} rows in space {}", rows.len(), kind, space_id);
        Ok(rows)
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn insert_link(&self, kind: RelationKind, link: NewLink) -> anyhow::Result<Link> {
        self.insert_unchecked(kind, link).await
    }
}
