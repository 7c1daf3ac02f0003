//! Console tree view
//!
//! termtree has no notion of our arena, so the forest is converted into an
//! owned `Tree<String>` with children in sorted order.

use std::vec;

use termtree::Tree;

use crate::domain::{CategoryNode, Forest};

pub trait ForestConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

type Frame<'a> = (Tree<String>, vec::IntoIter<&'a CategoryNode>);

impl ForestConvert for Forest {
    /// Assembled bottom-up with an explicit stack: a subtree is pushed into its
    /// parent once all of its children are done.
    fn to_tree_string(&self) -> Tree<String> {
        let roots: Vec<_> = self.roots().collect();
        let mut stack: Vec<Frame<'_>> =
            vec![(Tree::new(self.label().to_string()), roots.into_iter())];
        let mut finished = None;

        while let Some((_, pending)) = stack.last_mut() {
            if let Some(child) = pending.next() {
                let children: Vec<_> = self.children(child).collect();
                stack.push((Tree::new(child.name.to_string()), children.into_iter()));
                continue;
            }
            if let Some((done, _)) = stack.pop() {
                match stack.last_mut() {
                    Some((parent, _)) => {
                        parent.push(done);
                    }
                    None => finished = Some(done),
                }
            }
        }

        finished.unwrap_or_else(|| Tree::new(self.label().to_string()))
    }
}
