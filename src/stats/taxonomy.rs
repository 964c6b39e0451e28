//! Membership strategies. A taxonomy decides which node(s) of its tree a log belongs to, the
//! aggregator does the rest.

use std::{collections::HashMap, fmt::Display, sync::Arc};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::snapshot::entities::{Category, Scope, Taxonomies, TimeLog, TodoCategory, TodoItem};

use super::palette::todo_category_color;

pub const UNSCOPED_ID: &str = "__unscoped";
pub const UNKNOWN_ACTIVITY: &str = "Unknown";

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Activity,
    Todo,
    Scope,
}

impl Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxonomyKind::Activity => write!(f, "activity"),
            TaxonomyKind::Todo => write!(f, "todo"),
            TaxonomyKind::Scope => write!(f, "scope"),
        }
    }
}

/// What happens to logs without any scope when aggregating by scope.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnscopedPolicy {
    /// Logs without scopes are not part of the taxonomy at all.
    #[default]
    Exclude,
    /// Logs without scopes are collected in a synthetic "Unscoped" node.
    Bucket,
}

/// Position of a log inside a two level taxonomy tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub parent: Arc<str>,
    pub child: Arc<str>,
}

impl NodeRef {
    pub fn new(parent: impl Into<Arc<str>>, child: impl Into<Arc<str>>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    /// The log doesn't take part in this taxonomy.
    Outside,
    /// The log counts toward the total, but no known node claims it.
    Untracked,
    /// Full duration goes to a single node.
    Whole(NodeRef),
    /// Duration is split evenly across all nodes.
    Split(Vec<NodeRef>),
}

/// Display metadata of a top level node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub color: Option<Arc<str>>,
}

pub trait Taxonomy {
    fn kind(&self) -> TaxonomyKind;

    fn membership(&self, log: &TimeLog) -> Membership;

    /// Top level nodes in definition order.
    fn parents(&self) -> Vec<NodeInfo>;

    /// Display name of a child. `None` hides the child from breakdowns while its duration still
    /// counts toward the parent.
    fn child_name(&self, parent: &str, child: &str) -> Option<Arc<str>>;
}

/// Category → activity tree. Every log belongs to exactly one pair.
pub struct ActivityTaxonomy<'a> {
    categories: &'a [Category],
}

impl<'a> ActivityTaxonomy<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self { categories }
    }
}

impl Taxonomy for ActivityTaxonomy<'_> {
    fn kind(&self) -> TaxonomyKind {
        TaxonomyKind::Activity
    }

    fn membership(&self, log: &TimeLog) -> Membership {
        Membership::Whole(NodeRef::new(
            log.category_id.clone(),
            log.activity_id.clone(),
        ))
    }

    fn parents(&self) -> Vec<NodeInfo> {
        self.categories
            .iter()
            .map(|v| NodeInfo {
                id: v.id.clone(),
                name: v.name.clone(),
                color: v.theme_color.clone(),
            })
            .collect()
    }

    fn child_name(&self, parent: &str, child: &str) -> Option<Arc<str>> {
        self.categories
            .iter()
            .find(|v| &*v.id == parent)
            .and_then(|v| v.activity(child))
            .map(|v| v.name.clone())
    }
}

/// Todo category → todo tree. Only logs linked to a todo take part.
pub struct TodoTaxonomy<'a> {
    categories: &'a [TodoCategory],
    todos: HashMap<&'a str, &'a TodoItem>,
}

impl<'a> TodoTaxonomy<'a> {
    pub fn new(categories: &'a [TodoCategory], todos: &'a [TodoItem]) -> Self {
        Self {
            categories,
            todos: todos.iter().map(|v| (&*v.id, v)).collect(),
        }
    }
}

impl Taxonomy for TodoTaxonomy<'_> {
    fn kind(&self) -> TaxonomyKind {
        TaxonomyKind::Todo
    }

    fn membership(&self, log: &TimeLog) -> Membership {
        let Some(todo_id) = log.linked_todo_id.as_deref() else {
            return Membership::Outside;
        };
        match self.todos.get(todo_id) {
            Some(todo) => Membership::Whole(NodeRef::new(todo.category_id.clone(), todo.id.clone())),
            None => Membership::Untracked,
        }
    }

    fn parents(&self) -> Vec<NodeInfo> {
        self.categories
            .iter()
            .enumerate()
            .map(|(index, v)| NodeInfo {
                id: v.id.clone(),
                name: v.name.clone(),
                color: Some(todo_category_color(index).into()),
            })
            .collect()
    }

    fn child_name(&self, parent: &str, child: &str) -> Option<Arc<str>> {
        self.todos
            .get(child)
            .filter(|v| &*v.category_id == parent)
            .map(|v| v.title.clone())
    }
}

/// Flat scope list. A log may belong to several scopes, in which case its duration is split
/// evenly. Children of a scope are the activities (by name) that were done within it.
pub struct ScopeTaxonomy<'a> {
    scopes: &'a [Scope],
    categories: &'a [Category],
    unscoped: UnscopedPolicy,
}

impl<'a> ScopeTaxonomy<'a> {
    pub fn new(scopes: &'a [Scope], categories: &'a [Category], unscoped: UnscopedPolicy) -> Self {
        Self {
            scopes,
            categories,
            unscoped,
        }
    }

    fn activity_name(&self, log: &TimeLog) -> Arc<str> {
        self.categories
            .iter()
            .find(|v| v.id == log.category_id)
            .and_then(|v| v.activity(&log.activity_id))
            .map(|v| v.name.clone())
            .unwrap_or_else(|| UNKNOWN_ACTIVITY.into())
    }
}

impl Taxonomy for ScopeTaxonomy<'_> {
    fn kind(&self) -> TaxonomyKind {
        TaxonomyKind::Scope
    }

    fn membership(&self, log: &TimeLog) -> Membership {
        let activity = self.activity_name(log);
        match (log.scope_ids.as_slice(), self.unscoped) {
            ([], UnscopedPolicy::Exclude) => Membership::Outside,
            ([], UnscopedPolicy::Bucket) => Membership::Whole(NodeRef::new(UNSCOPED_ID, activity)),
            ([scope], _) => Membership::Whole(NodeRef::new(scope.clone(), activity)),
            (scopes, _) => Membership::Split(
                scopes
                    .iter()
                    .map(|scope| NodeRef::new(scope.clone(), activity.clone()))
                    .collect(),
            ),
        }
    }

    fn parents(&self) -> Vec<NodeInfo> {
        let mut parents = self
            .scopes
            .iter()
            .map(|v| NodeInfo {
                id: v.id.clone(),
                name: v.name.clone(),
                color: Some(v.theme_color.clone().unwrap_or_else(|| "stone".into())),
            })
            .collect::<Vec<_>>();
        if self.unscoped == UnscopedPolicy::Bucket {
            parents.push(NodeInfo {
                id: UNSCOPED_ID.into(),
                name: "Unscoped".into(),
                color: Some("stone".into()),
            });
        }
        parents
    }

    fn child_name(&self, _parent: &str, child: &str) -> Option<Arc<str>> {
        Some(child.into())
    }
}

/// Owned selection of a taxonomy, so callers can pick one at runtime.
pub enum AnyTaxonomy<'a> {
    Activity(ActivityTaxonomy<'a>),
    Todo(TodoTaxonomy<'a>),
    Scope(ScopeTaxonomy<'a>),
}

impl<'a> AnyTaxonomy<'a> {
    pub fn from_definitions(
        kind: TaxonomyKind,
        taxonomies: &'a Taxonomies,
        unscoped: UnscopedPolicy,
    ) -> Self {
        match kind {
            TaxonomyKind::Activity => Self::Activity(ActivityTaxonomy::new(&taxonomies.categories)),
            TaxonomyKind::Todo => {
                Self::Todo(TodoTaxonomy::new(&taxonomies.todo_categories, &taxonomies.todos))
            }
            TaxonomyKind::Scope => Self::Scope(ScopeTaxonomy::new(
                &taxonomies.scopes,
                &taxonomies.categories,
                unscoped,
            )),
        }
    }

    fn inner(&self) -> &dyn Taxonomy {
        match self {
            AnyTaxonomy::Activity(v) => v,
            AnyTaxonomy::Todo(v) => v,
            AnyTaxonomy::Scope(v) => v,
        }
    }
}

impl Taxonomy for AnyTaxonomy<'_> {
    fn kind(&self) -> TaxonomyKind {
        self.inner().kind()
    }

    fn membership(&self, log: &TimeLog) -> Membership {
        self.inner().membership(log)
    }

    fn parents(&self) -> Vec<NodeInfo> {
        self.inner().parents()
    }

    fn child_name(&self, parent: &str, child: &str) -> Option<Arc<str>> {
        self.inner().child_name(parent, child)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{
        ActivityTaxonomy, Membership, NodeRef, ScopeTaxonomy, Taxonomy, TodoTaxonomy,
        UNSCOPED_ID, UnscopedPolicy,
    };
    use crate::snapshot::entities::{Activity, Category, TimeLog, TodoCategory, TodoItem};

    fn log() -> TimeLog {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 14, 0, 0).unwrap();
        TimeLog::new("l1", "work", "code", start, start + Duration::hours(1))
    }

    fn categories() -> Vec<Category> {
        vec![Category {
            id: "work".into(),
            name: "Work".into(),
            theme_color: None,
            activities: vec![Activity {
                id: "code".into(),
                name: "Coding".into(),
                color: None,
            }],
        }]
    }

    #[test]
    fn activity_membership_is_single() {
        let categories = categories();
        let taxonomy = ActivityTaxonomy::new(&categories);
        assert_eq!(
            taxonomy.membership(&log()),
            Membership::Whole(NodeRef::new("work", "code"))
        );
        assert_eq!(taxonomy.child_name("work", "code").as_deref(), Some("Coding"));
        assert_eq!(taxonomy.child_name("work", "missing"), None);
    }

    #[test]
    fn todo_membership_requires_link() {
        let todo_categories = vec![TodoCategory {
            id: "tc".into(),
            name: "Study".into(),
        }];
        let todos = vec![TodoItem {
            id: "t1".into(),
            category_id: "tc".into(),
            title: "Read paper".into(),
        }];
        let taxonomy = TodoTaxonomy::new(&todo_categories, &todos);
        assert_eq!(taxonomy.membership(&log()), Membership::Outside);
        assert_eq!(
            taxonomy.membership(&log().with_todo("t1")),
            Membership::Whole(NodeRef::new("tc", "t1"))
        );
        assert_eq!(taxonomy.membership(&log().with_todo("gone")), Membership::Untracked);
        assert!(taxonomy.parents()[0].color.is_some());
    }

    #[test]
    fn scope_membership_follows_policy() {
        let categories = categories();
        let excluding = ScopeTaxonomy::new(&[], &categories, UnscopedPolicy::Exclude);
        assert_eq!(excluding.membership(&log()), Membership::Outside);

        let bucketing = ScopeTaxonomy::new(&[], &categories, UnscopedPolicy::Bucket);
        assert_eq!(
            bucketing.membership(&log()),
            Membership::Whole(NodeRef::new(UNSCOPED_ID, "Coding"))
        );
        assert_eq!(bucketing.parents().len(), 1);

        assert_eq!(
            excluding.membership(&log().with_scopes(["a", "b"])),
            Membership::Split(vec![NodeRef::new("a", "Coding"), NodeRef::new("b", "Coding")])
        );
    }
}
