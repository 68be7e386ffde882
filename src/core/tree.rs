//! Sub-category tree resolution.
//!
//! Sub-categories are stored flat with a nullable `parent_id`. This module turns a
//! fetched list into a depth-limited nested tree for API responses, builds
//! breadcrumb display names, and checks parent chains for cycles. Every walk up the
//! parent chain is iterative and guarded by a visited set, so a corrupt chain
//! produces an error or `false` instead of an endless loop.

use crate::{
    entities::sub_category,
    errors::{Error, Result},
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Separator placed between ancestor names in a breadcrumb.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// A sub-category with its children attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryNode {
    /// The sub-category itself
    #[serde(flatten)]
    pub sub_category: sub_category::Model,
    /// Children, empty once the depth limit is reached
    pub child_sub_categories: Vec<SubCategoryNode>,
}

/// Builds a nested tree from a flat list of sub-categories.
///
/// Top-level nodes are those without a parent, plus those whose parent is not in
/// `subs` (a dangling reference is treated as top-level). Children are attached for
/// `max_depth` levels below the top; nodes at the limit keep their own fields but get
/// an empty `child_sub_categories`. Siblings keep their input order.
///
/// Nodes that only appear inside a parent cycle have no path from a top-level node
/// and are therefore left out.
#[must_use]
pub fn build_tree(subs: &[sub_category::Model], max_depth: usize) -> Vec<SubCategoryNode> {
    let present: HashSet<i64> = subs.iter().map(|s| s.id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<&sub_category::Model>> = HashMap::new();
    for sub in subs {
        match sub.parent_id {
            Some(parent_id) if parent_id != sub.id && present.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(sub);
            }
            Some(parent_id) if parent_id == sub.id => {}
            _ => roots.push(sub),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &children, max_depth))
        .collect()
}

fn attach_children(
    sub: &sub_category::Model,
    children: &HashMap<i64, Vec<&sub_category::Model>>,
    remaining: usize,
) -> SubCategoryNode {
    let child_sub_categories = if remaining == 0 {
        Vec::new()
    } else {
        children
            .get(&sub.id)
            .map(|kids| {
                kids.iter()
                    .map(|kid| attach_children(kid, children, remaining - 1))
                    .collect()
            })
            .unwrap_or_default()
    };

    SubCategoryNode {
        sub_category: sub.clone(),
        child_sub_categories,
    }
}

/// Builds the `"Root > Child > Leaf"` display name for one sub-category.
///
/// Walks parent references upward until a node without a parent (or with a parent
/// missing from `subs`) is reached.
///
/// # Errors
/// - [`Error::NotFound`] if `id` is not in `subs`
/// - [`Error::CyclicHierarchy`] if the walk revisits a node
pub fn breadcrumb(subs: &[sub_category::Model], id: i64) -> Result<String> {
    let by_id: HashMap<i64, &sub_category::Model> = subs.iter().map(|s| (s.id, s)).collect();
    breadcrumb_indexed(&by_id, id)
}

fn breadcrumb_indexed(by_id: &HashMap<i64, &sub_category::Model>, id: i64) -> Result<String> {
    let mut current = *by_id
        .get(&id)
        .ok_or_else(|| Error::not_found("sub-category", id))?;

    let mut visited = HashSet::new();
    let mut names = Vec::new();
    loop {
        if !visited.insert(current.id) {
            return Err(Error::CyclicHierarchy { id: current.id });
        }
        names.push(current.name.as_str());
        match current.parent_id.and_then(|parent_id| by_id.get(&parent_id)) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    names.reverse();
    Ok(names.join(BREADCRUMB_SEPARATOR))
}

/// Computes breadcrumbs for every sub-category in `subs`, in input order.
///
/// # Errors
/// Returns [`Error::CyclicHierarchy`] if any parent chain loops.
pub fn breadcrumbs(subs: &[sub_category::Model]) -> Result<Vec<(i64, String)>> {
    let by_id: HashMap<i64, &sub_category::Model> = subs.iter().map(|s| (s.id, s)).collect();
    subs.iter()
        .map(|sub| breadcrumb_indexed(&by_id, sub.id).map(|name| (sub.id, name)))
        .collect()
}

/// Returns `true` when the parent chain starting at `id` ends without looping.
///
/// A self-parented node, or any chain that revisits a node, yields `false`.
/// An unknown `id` has no ancestry to loop through and yields `true`.
#[must_use]
pub fn has_acyclic_ancestry(subs: &[sub_category::Model], id: i64) -> bool {
    let by_id: HashMap<i64, &sub_category::Model> = subs.iter().map(|s| (s.id, s)).collect();
    let mut visited = HashSet::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if !visited.insert(current) {
            return false;
        }
        cursor = by_id.get(&current).and_then(|s| s.parent_id);
    }
    true
}

/// Checks whether `proposed_parent_id` may become the parent of `child_id`.
///
/// Returns `false` if the proposed parent is the child itself, if walking up from the
/// proposed parent reaches the child, or if that walk runs into an existing cycle.
/// `child_id` is `None` for a sub-category that has not been created yet.
#[must_use]
pub fn is_valid_parent(
    subs: &[sub_category::Model],
    child_id: Option<i64>,
    proposed_parent_id: i64,
) -> bool {
    if child_id == Some(proposed_parent_id) {
        return false;
    }

    let by_id: HashMap<i64, &sub_category::Model> = subs.iter().map(|s| (s.id, s)).collect();
    let mut visited = HashSet::new();
    let mut cursor = Some(proposed_parent_id);
    while let Some(current) = cursor {
        if Some(current) == child_id || !visited.insert(current) {
            return false;
        }
        cursor = by_id.get(&current).and_then(|s| s.parent_id);
    }
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::NaiveDateTime;

    fn sub(id: i64, parent_id: Option<i64>, name: &str) -> sub_category::Model {
        sub_category::Model {
            id,
            store_id: 1,
            category_id: 1,
            parent_id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            banner_image: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn chain_of_five() -> Vec<sub_category::Model> {
        vec![
            sub(1, None, "Electronics"),
            sub(2, Some(1), "Computers"),
            sub(3, Some(2), "Laptops"),
            sub(4, Some(3), "Gaming"),
            sub(5, Some(4), "Ultralight"),
        ]
    }

    #[test]
    fn test_build_tree_empty_input() {
        assert!(build_tree(&[], 3).is_empty());
    }

    #[test]
    fn test_build_tree_groups_children_in_input_order() {
        let subs = vec![
            sub(1, None, "Men"),
            sub(2, None, "Women"),
            sub(3, Some(1), "Shirts"),
            sub(4, Some(1), "Shoes"),
            sub(5, Some(2), "Dresses"),
        ];

        let tree = build_tree(&subs, 3);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].sub_category.name, "Men");
        let men_children: Vec<&str> = tree[0]
            .child_sub_categories
            .iter()
            .map(|n| n.sub_category.name.as_str())
            .collect();
        assert_eq!(men_children, vec!["Shirts", "Shoes"]);
        assert_eq!(tree[1].child_sub_categories.len(), 1);
        assert_eq!(tree[1].child_sub_categories[0].sub_category.id, 5);
    }

    #[test]
    fn test_build_tree_truncates_at_depth_limit() {
        let tree = build_tree(&chain_of_five(), 3);
        assert_eq!(tree.len(), 1);

        let level1 = &tree[0].child_sub_categories[0];
        let level2 = &level1.child_sub_categories[0];
        let level3 = &level2.child_sub_categories[0];
        assert_eq!(level3.sub_category.name, "Gaming");
        // Node at the limit keeps its fields but has no children attached
        assert!(level3.child_sub_categories.is_empty());
    }

    #[test]
    fn test_build_tree_depth_zero_returns_only_roots() {
        let tree = build_tree(&chain_of_five(), 0);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].child_sub_categories.is_empty());
    }

    #[test]
    fn test_build_tree_dangling_parent_is_top_level() {
        let subs = vec![sub(1, None, "Home"), sub(2, Some(99), "Orphan")];
        let tree = build_tree(&subs, 3);
        let names: Vec<&str> = tree.iter().map(|n| n.sub_category.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Orphan"]);
    }

    #[test]
    fn test_build_tree_skips_cycles() {
        let subs = vec![
            sub(1, None, "Root"),
            sub(2, Some(3), "A"),
            sub(3, Some(2), "B"),
            sub(4, Some(4), "Selfish"),
        ];
        let tree = build_tree(&subs, 3);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].sub_category.id, 1);
    }

    #[test]
    fn test_tree_serializes_child_sub_categories() {
        let subs = vec![sub(1, None, "Root"), sub(2, Some(1), "Leaf")];
        let tree = build_tree(&subs, 1);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["name"], "Root");
        assert_eq!(json[0]["childSubCategories"][0]["name"], "Leaf");
        assert_eq!(json[0]["childSubCategories"][0]["parentId"], 1);
        assert!(
            json[0]["childSubCategories"][0]["childSubCategories"]
                .as_array()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_breadcrumb_root_to_leaf() {
        let subs = chain_of_five();
        assert_eq!(breadcrumb(&subs, 1).unwrap(), "Electronics");
        assert_eq!(
            breadcrumb(&subs, 3).unwrap(),
            "Electronics > Computers > Laptops"
        );
        assert_eq!(
            breadcrumb(&subs, 5).unwrap(),
            "Electronics > Computers > Laptops > Gaming > Ultralight"
        );
    }

    #[test]
    fn test_breadcrumb_missing_parent_stops_walk() {
        let subs = vec![sub(2, Some(99), "Orphan"), sub(3, Some(2), "Child")];
        assert_eq!(breadcrumb(&subs, 3).unwrap(), "Orphan > Child");
    }

    #[test]
    fn test_breadcrumb_unknown_id() {
        let result = breadcrumb(&chain_of_five(), 42);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_breadcrumb_self_parent_is_an_error() {
        let subs = vec![sub(7, Some(7), "Loop")];
        let result = breadcrumb(&subs, 7);
        assert!(matches!(result, Err(Error::CyclicHierarchy { id: 7 })));
    }

    #[test]
    fn test_breadcrumb_two_node_cycle_is_an_error() {
        let subs = vec![sub(1, Some(2), "A"), sub(2, Some(1), "B")];
        assert!(matches!(
            breadcrumb(&subs, 1),
            Err(Error::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn test_breadcrumbs_for_all() {
        let subs = vec![sub(1, None, "Men"), sub(2, Some(1), "Shirts")];
        let names = breadcrumbs(&subs).unwrap();
        assert_eq!(
            names,
            vec![(1, "Men".to_string()), (2, "Men > Shirts".to_string())]
        );
    }

    #[test]
    fn test_has_acyclic_ancestry() {
        let subs = chain_of_five();
        assert!(has_acyclic_ancestry(&subs, 5));
        assert!(has_acyclic_ancestry(&subs, 42));

        let looped = vec![sub(7, Some(7), "Loop")];
        assert!(!has_acyclic_ancestry(&looped, 7));
    }

    #[test]
    fn test_is_valid_parent_rejects_self() {
        let subs = vec![sub(7, Some(7), "Loop")];
        assert!(!is_valid_parent(&subs, Some(7), 7));
    }

    #[test]
    fn test_is_valid_parent_rejects_descendant() {
        let subs = chain_of_five();
        // Making Computers a child of Gaming would close a loop
        assert!(!is_valid_parent(&subs, Some(2), 4));
        // Moving Gaming under Electronics is fine
        assert!(is_valid_parent(&subs, Some(4), 1));
    }

    #[test]
    fn test_is_valid_parent_for_new_node() {
        let subs = chain_of_five();
        assert!(is_valid_parent(&subs, None, 5));
    }

    #[test]
    fn test_is_valid_parent_rejects_existing_cycle() {
        let subs = vec![sub(1, Some(2), "A"), sub(2, Some(1), "B"), sub(3, None, "C")];
        assert!(!is_valid_parent(&subs, Some(3), 1));
    }
}
