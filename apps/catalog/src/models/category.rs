//! Categories and the in-memory category forest.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    /// Stable external reference id from the source feed.
    pub csv_id: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Parent/child view over a category snapshot.
///
/// Built per request by the facet engine; category selections expand to
/// their full descendant closure through this structure. Traversals carry
/// a visited set, so a corrupt snapshot cannot loop.
#[derive(Debug, Default)]
pub struct CategoryForest {
    by_id: HashMap<Uuid, Category>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl CategoryForest {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for category in &categories {
            if let Some(parent) = category.parent_id {
                children.entry(parent).or_default().push(category.id);
            }
        }
        // Deterministic child order: alphabetical by name, id as tiebreak.
        let by_id: HashMap<Uuid, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();
        for ids in children.values_mut() {
            ids.sort_by(|a, b| {
                let an = by_id.get(a).map(|c| c.name.as_str()).unwrap_or_default();
                let bn = by_id.get(b).map(|c| c.name.as_str()).unwrap_or_default();
                an.cmp(bn).then_with(|| a.cmp(b))
            });
        }
        Self { by_id, children }
    }

    pub fn get(&self, id: Uuid) -> Option<&Category> {
        self.by_id.get(&id)
    }

    /// Direct children, alphabetically by name.
    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The category itself plus every transitive descendant.
    pub fn closure(&self, id: Uuid) -> HashSet<Uuid> {
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            stack.extend(self.children(current));
        }
        seen
    }

    /// Union of closures for a selection of ids.
    pub fn closure_of(&self, ids: &[Uuid]) -> HashSet<Uuid> {
        let mut all = HashSet::new();
        for id in ids {
            all.extend(self.closure(*id));
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: Uuid, name: &str, parent_id: Option<Uuid>) -> Category {
        Category {
            id,
            csv_id: name.to_lowercase(),
            name: name.to_string(),
            parent_id,
        }
    }

    #[test]
    fn closure_includes_self_and_all_descendants() {
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        let other = Uuid::new_v4();
        let forest = CategoryForest::new(vec![
            category(root, "Parts", None),
            category(child, "Filters", Some(root)),
            category(grandchild, "Oil filters", Some(child)),
            category(other, "Tools", None),
        ]);

        let closure = forest.closure(root);
        assert_eq!(closure.len(), 3);
        assert!(closure.contains(&grandchild));
        assert!(!closure.contains(&other));

        assert_eq!(forest.closure(grandchild), HashSet::from([grandchild]));
    }

    #[test]
    fn children_are_sorted_by_name() {
        let root = Uuid::new_v4();
        let b = Uuid::new_v4();
        let a = Uuid::new_v4();
        let forest = CategoryForest::new(vec![
            category(root, "Parts", None),
            category(b, "Brakes", Some(root)),
            category(a, "Belts", Some(root)),
        ]);
        assert_eq!(forest.children(root), &[a, b]);
    }

    #[test]
    fn closure_terminates_on_a_corrupt_parent_loop() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let forest = CategoryForest::new(vec![
            category(a, "A", Some(b)),
            category(b, "B", Some(a)),
        ]);
        let closure = forest.closure(a);
        assert_eq!(closure, HashSet::from([a, b]));
    }
}
