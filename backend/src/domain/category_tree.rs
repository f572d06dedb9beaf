//! # Category Tree
//!
//! Turns a flat category listing into a parent/child forest.
//!
//! ## Rules
//!
//! - The type filter is applied first; everything after works on the survivors
//! - A category is a root when it has no parent or its parent did not survive
//!   the filter
//! - Roots sit at depth 0. A node at depth `d` gets children only while
//!   `max_depth == 0 || d < max_depth`
//! - Siblings, the root list included, are ordered by name, then ID
//! - Malformed input with parent cycles never loops: each cycle is broken at
//!   its first member in sibling order, which becomes a root
//!
//! The builder is pure and never touches storage or the cache.

use std::collections::{HashMap, HashSet};

use super::models::{Category, CategoryType};

/// A category with its attached subtree
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTreeNode {
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Number of nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Edges on the longest path from this node down to a leaf
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.height() + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTreeBuilder {
    /// Zero means unlimited
    pub max_depth: u32,
    pub category_type: Option<CategoryType>,
}

impl CategoryTreeBuilder {
    pub fn new(max_depth: u32, category_type: Option<CategoryType>) -> Self {
        Self {
            max_depth,
            category_type,
        }
    }

    pub fn build(&self, categories: &[Category]) -> Vec<CategoryTreeNode> {
        let mut survivors: Vec<&Category> = categories
            .iter()
            .filter(|c| self.category_type.map_or(true, |t| c.category_type == t))
            .collect();
        survivors.sort_by(|a, b| Category::listing_order(a, b));

        let by_id: HashMap<&str, &Category> =
            survivors.iter().map(|c| (c.id.as_str(), *c)).collect();

        // Survivors are already sorted, so every child list comes out sorted too
        let mut children_of: HashMap<&str, Vec<&Category>> = HashMap::new();
        let mut roots: Vec<&Category> = Vec::new();
        for &category in &survivors {
            match category.parent_id.as_deref() {
                Some(parent) if by_id.contains_key(parent) => {
                    children_of.entry(parent).or_default().push(category)
                }
                _ => roots.push(category),
            }
        }

        // Anything not reachable from a root is stuck in a parent cycle
        let mut reachable: HashSet<&str> = HashSet::new();
        for &root in &roots {
            Self::mark_reachable(root, &children_of, &mut reachable);
        }
        for &category in &survivors {
            if !reachable.contains(category.id.as_str()) {
                roots.push(category);
                Self::mark_reachable(category, &children_of, &mut reachable);
            }
        }
        roots.sort_by(|a, b| Category::listing_order(a, b));

        let mut attached: HashSet<&str> = HashSet::new();
        roots
            .into_iter()
            .filter_map(|root| self.attach(root, 0, &children_of, &mut attached))
            .collect()
    }

    fn mark_reachable<'a>(
        start: &'a Category,
        children_of: &HashMap<&str, Vec<&'a Category>>,
        reachable: &mut HashSet<&'a str>,
    ) {
        let mut stack = vec![start];
        while let Some(category) = stack.pop() {
            if !reachable.insert(category.id.as_str()) {
                continue;
            }
            if let Some(children) = children_of.get(category.id.as_str()) {
                stack.extend(children.iter().copied());
            }
        }
    }

    fn attach<'a>(
        &self,
        category: &'a Category,
        depth: u32,
        children_of: &HashMap<&str, Vec<&'a Category>>,
        attached: &mut HashSet<&'a str>,
    ) -> Option<CategoryTreeNode> {
        if !attached.insert(category.id.as_str()) {
            return None;
        }

        let mut children = Vec::new();
        if self.max_depth == 0 || depth < self.max_depth {
            if let Some(candidates) = children_of.get(category.id.as_str()) {
                for &child in candidates {
                    if let Some(node) = self.attach(child, depth + 1, children_of, attached) {
                        children.push(node);
                    }
                }
            }
        }

        Some(CategoryTreeNode {
            category: category.clone(),
            children,
        })
    }
}
