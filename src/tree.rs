//! The game tree: an arena of [`Node`]s with a fixed board size.
//!
//! Nodes are addressed by [`NodeId`]. A node gets a father exactly once, when
//! it is appended, so the structure stays a single-parent tree and cycles are
//! impossible. Removing a node frees its whole subtree; freed slots are never
//! reused, so identifiers held by callers never alias a different node.
//!
//! Moves and setup stones set through the tree are checked against the board
//! size. [`GameTree::node_mut`] hands out the node unchecked.

use tracing::debug;

use crate::color::Color;
use crate::constants::{DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::error::TreeError;
use crate::game_info::GameInfo;
use crate::go::{Move, Point};
use crate::node::{Node, NodeId};

#[derive(Clone, Debug)]
pub struct GameTree {
    board_size: usize,
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::with_root(DEFAULT_BOARD_SIZE, Node::new())
    }
}

impl GameTree {
    /// Create a tree holding an empty root.
    ///
    /// # Errors
    /// `TreeError::InvalidBoardSize` unless `1 <= board_size <= 25`.
    pub fn new(board_size: usize) -> Result<Self, TreeError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            return Err(TreeError::InvalidBoardSize(board_size));
        }
        Ok(Self::with_root(board_size, Node::new()))
    }

    /// Create a tree whose root holds `root`'s data. The board size is not
    /// validated.
    pub(crate) fn with_root(board_size: usize, mut root: Node) -> Self {
        root.father = None;
        root.children.clear();
        Self {
            board_size,
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // -------------------------------------------------------------------------
    // Node access
    // -------------------------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    /// # Panics
    /// If `id` does not name a live node of this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id)
            .unwrap_or_else(|| panic!("node {id} does not exist"))
    }

    /// Unchecked access: points stored through the returned node are not
    /// validated against the board size. Use the tree's move and setup
    /// methods to keep the tree writable and readable.
    ///
    /// # Panics
    /// If `id` does not name a live node of this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("node {id} does not exist"))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn checked(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn checked_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    fn check_point(&self, point: Point) -> Result<(), TreeError> {
        if point.is_on_board(self.board_size) {
            Ok(())
        } else {
            Err(TreeError::PointOffBoard {
                point,
                board_size: self.board_size,
            })
        }
    }

    fn check_move(&self, mv: Option<Move>) -> Result<(), TreeError> {
        match mv.and_then(|m| m.point) {
            Some(p) => self.check_point(p),
            None => Ok(()),
        }
    }

    /// Number of live nodes, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Add a detached empty node to the arena.
    pub fn create_node(&mut self) -> NodeId {
        self.insert(Node::new())
    }

    /// Add a detached node holding a move.
    ///
    /// # Errors
    /// `PointOffBoard` if the move is outside the board.
    pub fn create_node_with_move(&mut self, mv: Move) -> Result<NodeId, TreeError> {
        self.check_move(Some(mv))?;
        Ok(self.insert(Node::with_move(mv)))
    }

    /// Add a detached node holding the data of `node`. Game info is dropped,
    /// since only the root may carry it.
    ///
    /// # Errors
    /// `PointOffBoard` if the move or a setup point is outside the board.
    pub fn create_node_from(&mut self, node: Node) -> Result<NodeId, TreeError> {
        if let Some(point) = node.points().find(|p| !p.is_on_board(self.board_size)) {
            return Err(TreeError::PointOffBoard {
                point,
                board_size: self.board_size,
            });
        }
        Ok(self.insert(node))
    }

    /// Replace the data of the root, keeping its children and game info.
    pub(crate) fn set_root_data(&mut self, mut node: Node) {
        let root = self.root;
        let old = self.node_mut(root);
        node.children = std::mem::take(&mut old.children);
        node.detach_game_info();
        if let Some(info) = old.detach_game_info() {
            node.attach_game_info(info);
        }
        node.father = None;
        *old = node;
    }

    fn insert(&mut self, mut node: Node) -> NodeId {
        node.detach_game_info();
        node.father = None;
        node.children.clear();
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// - `UnknownNode` if either id is not live
    /// - `IsRoot` if `child` is the root
    /// - `AlreadyAttached` if `child` already has a father
    /// - `Cycle` if `parent` lies in the subtree of `child`
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.checked(parent)?;
        if child == self.root {
            return Err(TreeError::IsRoot(child));
        }
        if self.checked(child)?.father.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(TreeError::Cycle { parent, child });
            }
            cursor = self.node(id).father;
        }
        self.node_mut(child).father = Some(parent);
        self.node_mut(parent).children.push(child);
        Ok(())
    }

    /// Create a node with `mv` and append it to `parent`.
    pub fn append_move(&mut self, parent: NodeId, mv: Move) -> Result<NodeId, TreeError> {
        self.checked(parent)?;
        let child = self.create_node_with_move(mv)?;
        self.append(parent, child)?;
        Ok(child)
    }

    /// Detach a node from its father and free its subtree.
    ///
    /// Detached nodes that were never appended can be removed too.
    ///
    /// # Errors
    /// `IsRoot` for the root, `UnknownNode` for a dead id.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::IsRoot(id));
        }
        if let Some(father) = self.checked(id)?.father {
            self.node_mut(father).children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.0].take() {
                stack.extend(node.children);
                freed += 1;
            }
        }
        debug!(node = %id, freed, "removed subtree");
        Ok(())
    }

    /// Move a node to the front of its father's children, making it the main
    /// variation.
    pub fn make_main_variation(&mut self, id: NodeId) -> Result<(), TreeError> {
        let father = self.checked(id)?.father.ok_or(TreeError::IsRoot(id))?;
        let children = &mut self.node_mut(father).children;
        if let Some(i) = children.iter().position(|&c| c == id) {
            children[..=i].rotate_right(1);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Node data
    // -------------------------------------------------------------------------

    /// Attach empty game info to the root.
    ///
    /// # Errors
    /// `GameInfoNotRoot` for any other node, `GameInfoExists` if the root
    /// already carries game info.
    pub fn create_game_info(&mut self, id: NodeId) -> Result<&mut GameInfo, TreeError> {
        self.checked(id)?;
        if id != self.root {
            return Err(TreeError::GameInfoNotRoot(id));
        }
        let node = self.node_mut(id);
        if node.game_info().is_some() {
            return Err(TreeError::GameInfoExists(id));
        }
        Ok(node.attach_game_info(GameInfo::new()))
    }

    pub fn game_info(&self) -> Option<&GameInfo> {
        self.node(self.root).game_info()
    }

    pub fn game_info_mut(&mut self) -> Option<&mut GameInfo> {
        let root = self.root;
        self.node_mut(root).game_info_mut()
    }

    /// # Errors
    /// `UnknownNode`, or `PointOffBoard` if the move is outside the board.
    pub fn set_move(&mut self, id: NodeId, mv: Option<Move>) -> Result<(), TreeError> {
        self.checked(id)?;
        self.check_move(mv)?;
        self.node_mut(id).set_move(mv);
        Ok(())
    }

    /// Place a setup stone, replacing any other setup at the point.
    pub fn add_setup_stone(&mut self, id: NodeId, c: Color, p: Point) -> Result<(), TreeError> {
        self.checked(id)?;
        self.check_point(p)?;
        self.node_mut(id).add_setup_stone(c, p);
        Ok(())
    }

    /// Clear a point by setup, replacing any other setup at the point.
    pub fn add_setup_empty(&mut self, id: NodeId, p: Point) -> Result<(), TreeError> {
        self.checked(id)?;
        self.check_point(p)?;
        self.node_mut(id).add_setup_empty(p);
        Ok(())
    }

    /// Replace the whole setup of a node. Nothing changes if any point is
    /// outside the board.
    pub fn set_setup_stones(
        &mut self,
        id: NodeId,
        black: &[Point],
        white: &[Point],
        empty: &[Point],
    ) -> Result<(), TreeError> {
        self.checked(id)?;
        for &p in black.iter().chain(white).chain(empty) {
            self.check_point(p)?;
        }
        self.node_mut(id)
            .set_setup_stones(black.iter().copied(), white.iter().copied(), empty.iter().copied());
        Ok(())
    }

    pub fn set_player(&mut self, id: NodeId, c: Option<Color>) -> Result<(), TreeError> {
        self.checked_mut(id)?.set_player(c);
        Ok(())
    }

    pub fn set_time_left(&mut self, id: NodeId, c: Color, seconds: f64) -> Result<(), TreeError> {
        self.checked_mut(id)?.set_time_left(c, seconds);
        Ok(())
    }

    pub fn set_moves_left(&mut self, id: NodeId, c: Color, n: Option<u32>) -> Result<(), TreeError> {
        self.checked_mut(id)?.set_moves_left(c, n);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    pub fn father(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).father
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.node(id).children.get(i).copied()
    }

    /// Position of a node among its father's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let father = self.node(id).father?;
        self.node(father).children.iter().position(|&c| c == id)
    }

    /// Number of edges between the node and the top of its tree.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.node(id).father;
        while let Some(f) = cursor {
            depth += 1;
            cursor = self.node(f).father;
        }
        depth
    }

    /// Number of moves on the path from the root to the node, inclusive.
    pub fn move_number(&self, id: NodeId) -> usize {
        self.path_from_root(id)
            .into_iter()
            .filter(|&n| self.node(n).get_move().is_some())
            .count()
    }

    /// Nodes from the top of the tree down to `id`, inclusive.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.node(id).father;
        while let Some(f) = cursor {
            path.push(f);
            cursor = self.node(f).father;
        }
        path.reverse();
        path
    }

    /// Color to play after the node.
    ///
    /// The player override is setup applied before the node's move, so the
    /// nearest move's opponent wins over an override on the same node. Black
    /// plays at the start of a game without moves.
    pub fn to_play(&self, id: NodeId) -> Color {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            let node = self.node(n);
            if let Some(mv) = node.get_move() {
                return mv.color.other();
            }
            if let Some(c) = node.player() {
                return c;
            }
            cursor = node.father;
        }
        Color::Black
    }

    /// Follow first children down to the end of the main line.
    pub fn main_line_end(&self, id: NodeId) -> NodeId {
        let mut cursor = id;
        while let Some(&first) = self.node(cursor).children.first() {
            cursor = first;
        }
        cursor
    }

    /// Iterate the subtree of `id` in pre-order, children in order.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    fn subtree_eq(&self, id: NodeId, other: &GameTree, other_id: NodeId) -> bool {
        let mut stack = vec![(id, other_id)];
        while let Some((x, y)) = stack.pop() {
            let (a, b) = (self.node(x), other.node(y));
            if !a.same_data(b) || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }
}

/// Structural equality: board size plus recursively equal data and child
/// order. Node identifiers are ignored.
impl PartialEq for GameTree {
    fn eq(&self, other: &Self) -> bool {
        self.board_size == other.board_size && self.subtree_eq(self.root, other, other.root)
    }
}

pub struct Preorder<'a> {
    tree: &'a GameTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::go::Point;

    fn black(x: usize, y: usize) -> Move {
        Move::new(Color::Black, Some(Point::new(x, y)))
    }

    fn white(x: usize, y: usize) -> Move {
        Move::new(Color::White, Some(Point::new(x, y)))
    }

    #[test]
    fn test_new_tree() {
        let tree = GameTree::new(9).unwrap();
        assert_eq!(tree.board_size(), 9);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.node(tree.root()).is_empty());
        assert_eq!(GameTree::default().board_size(), 19);
    }

    #[test]
    fn test_invalid_board_size() {
        assert_eq!(GameTree::new(0).unwrap_err(), TreeError::InvalidBoardSize(0));
        assert_eq!(GameTree::new(26).unwrap_err(), TreeError::InvalidBoardSize(26));
        assert!(GameTree::new(25).is_ok());
    }

    #[test]
    fn test_append_sets_father() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let b = tree.append_move(root, black(15, 15)).unwrap();
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.father(a), Some(root));
        assert_eq!(tree.child_index(b), Some(1));
    }

    #[test]
    fn test_append_twice_fails() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let b = tree.append_move(root, black(4, 4)).unwrap();
        assert_eq!(tree.append(b, a), Err(TreeError::AlreadyAttached(a)));
        assert_eq!(tree.children(b), &[] as &[NodeId]);
    }

    #[test]
    fn test_append_root_fails() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.create_node();
        tree.append(root, a).unwrap();
        assert_eq!(tree.append(a, root), Err(TreeError::IsRoot(root)));
    }

    #[test]
    fn test_append_cycle_fails() {
        let mut tree = GameTree::default();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.append(a, b).unwrap();
        assert_eq!(
            tree.append(b, a),
            Err(TreeError::Cycle { parent: b, child: a })
        );
        assert_eq!(tree.append(a, a), Err(TreeError::Cycle { parent: a, child: a }));
    }

    #[test]
    fn test_remove_frees_subtree() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let b = tree.append_move(a, white(15, 15)).unwrap();
        let c = tree.append_move(root, black(2, 2)).unwrap();
        tree.remove(a).unwrap();
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.children(root), &[c]);
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.remove(root), Err(TreeError::IsRoot(root)));
        assert_eq!(tree.remove(a), Err(TreeError::UnknownNode(a)));
    }

    #[test]
    fn test_ids_not_reused() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        tree.remove(a).unwrap();
        let b = tree.create_node();
        assert_ne!(a, b);
    }

    #[test]
    fn test_make_main_variation() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let b = tree.append_move(root, black(4, 4)).unwrap();
        let c = tree.append_move(root, black(5, 5)).unwrap();
        tree.make_main_variation(c).unwrap();
        assert_eq!(tree.children(root), &[c, a, b]);
        assert_eq!(tree.make_main_variation(root), Err(TreeError::IsRoot(root)));
    }

    #[test]
    fn test_game_info_only_on_root() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        assert_eq!(
            tree.create_game_info(a).unwrap_err(),
            TreeError::GameInfoNotRoot(a)
        );
        tree.create_game_info(root).unwrap().set_result("W+R");
        assert_eq!(
            tree.create_game_info(root).unwrap_err(),
            TreeError::GameInfoExists(root)
        );
        assert_eq!(tree.game_info().unwrap().result.as_deref(), Some("W+R"));
    }

    #[test]
    fn test_depth_and_move_number() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let empty = tree.create_node();
        tree.append(a, empty).unwrap();
        let b = tree.append_move(empty, white(15, 15)).unwrap();
        assert_eq!(tree.depth(b), 3);
        assert_eq!(tree.move_number(b), 2);
        assert_eq!(tree.path_from_root(b), vec![root, a, empty, b]);
        assert_eq!(tree.main_line_end(root), b);
    }

    #[test]
    fn test_to_play() {
        let mut tree = GameTree::default();
        let root = tree.root();
        assert_eq!(tree.to_play(root), Color::Black);
        let a = tree.append_move(root, black(3, 3)).unwrap();
        assert_eq!(tree.to_play(a), Color::White);
        tree.set_player(root, Some(Color::White)).unwrap();
        assert_eq!(tree.to_play(root), Color::White);
        assert_eq!(tree.to_play(a), Color::White);
    }

    #[test]
    fn test_to_play_move_wins_over_override_on_same_node() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, white(3, 3)).unwrap();
        tree.set_player(a, Some(Color::White)).unwrap();
        assert_eq!(tree.to_play(a), Color::Black);
        let b = tree.create_node();
        tree.append(a, b).unwrap();
        tree.set_player(b, Some(Color::White)).unwrap();
        assert_eq!(tree.to_play(b), Color::White);
    }

    #[test]
    fn test_off_board_points_rejected() {
        let mut tree = GameTree::new(9).unwrap();
        let root = tree.root();
        let q16 = Point::new(15, 15);
        let off = TreeError::PointOffBoard {
            point: q16,
            board_size: 9,
        };
        assert_eq!(tree.append_move(root, black(15, 15)), Err(off.clone()));
        assert_eq!(tree.set_move(root, Some(black(15, 15))), Err(off.clone()));
        assert_eq!(tree.add_setup_stone(root, Color::White, q16), Err(off.clone()));
        assert_eq!(tree.add_setup_empty(root, q16), Err(off.clone()));
        assert_eq!(
            tree.set_setup_stones(root, &[Point::new(2, 2)], &[q16], &[]),
            Err(off.clone())
        );
        let mut node = Node::new();
        node.add_setup_stone(Color::Black, q16);
        assert_eq!(tree.create_node_from(node).unwrap_err(), off);

        assert!(tree.node(root).is_empty());
        assert_eq!(tree.node_count(), 1);
        tree.set_move(root, Some(black(8, 8))).unwrap();
        tree.add_setup_stone(root, Color::White, Point::new(0, 0)).unwrap();
        assert!(tree.append_move(root, Move::pass(Color::White)).is_ok());
    }

    #[test]
    fn test_deep_variations_compare_without_recursion() {
        let build = || {
            let mut tree = GameTree::default();
            let mut node = tree.root();
            for _ in 0..50_000 {
                tree.append_move(node, Move::pass(Color::Black)).unwrap();
                node = tree.append_move(node, Move::pass(Color::White)).unwrap();
            }
            tree
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_preorder() {
        let mut tree = GameTree::default();
        let root = tree.root();
        let a = tree.append_move(root, black(3, 3)).unwrap();
        let a1 = tree.append_move(a, white(4, 4)).unwrap();
        let b = tree.append_move(root, black(5, 5)).unwrap();
        let order: Vec<_> = tree.preorder(root).collect();
        assert_eq!(order, vec![root, a, a1, b]);
    }

    #[test]
    fn test_structural_eq_ignores_ids() {
        let mut t1 = GameTree::default();
        let r1 = t1.root();
        t1.create_node();
        t1.append_move(r1, black(3, 3)).unwrap();

        let mut t2 = GameTree::default();
        let r2 = t2.root();
        t2.append_move(r2, black(3, 3)).unwrap();
        assert_eq!(t1, t2);

        t2.create_game_info(r2).unwrap();
        assert_eq!(t1, t2, "empty game info equals none");

        t2.set_time_left(t2.child(r2, 0).unwrap(), Color::Black, 10.0).unwrap();
        assert_ne!(t1, t2);
    }
}
