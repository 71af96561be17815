//! Game tree vertices.
//!
//! A [`Node`] holds the data recorded for one position: an optional move,
//! setup stones, a player-to-move override, per-color clock readings, a
//! comment and any SGF properties without a dedicated field. Structure
//! (father and children) is owned by the [`GameTree`](crate::tree::GameTree)
//! arena and only readable here.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::color::{BlackWhite, Color};
use crate::constants::{SGF_MOVES_LEFT, SGF_PLAYER, SGF_TIME_LEFT};
use crate::error::TreeError;
use crate::game_info::GameInfo;
use crate::go::{Move, Point};

/// Stable identifier of a node inside one tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    mv: Option<Move>,
    player: Option<Color>,
    setup: BlackWhite<BTreeSet<Point>>,
    setup_empty: BTreeSet<Point>,
    time_left: BlackWhite<Option<f64>>,
    moves_left: BlackWhite<Option<u32>>,
    comment: Option<String>,
    sgf_props: BTreeMap<String, Vec<String>>,
    game_info: Option<Box<GameInfo>>,
    pub(crate) father: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_move(mv: Move) -> Self {
        Self {
            mv: Some(mv),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    pub fn father(&self) -> Option<NodeId> {
        self.father
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    // -------------------------------------------------------------------------
    // Move and player
    // -------------------------------------------------------------------------

    pub fn get_move(&self) -> Option<Move> {
        self.mv
    }

    pub fn set_move(&mut self, mv: Option<Move>) {
        self.mv = mv;
    }

    /// Player-to-move override set up at this node.
    pub fn player(&self) -> Option<Color> {
        self.player
    }

    pub fn set_player(&mut self, c: Option<Color>) {
        self.player = c;
    }

    // -------------------------------------------------------------------------
    // Setup stones
    // -------------------------------------------------------------------------

    pub fn setup(&self, c: Color) -> &BTreeSet<Point> {
        &self.setup[c]
    }

    /// Points cleared by setup.
    pub fn setup_empty(&self) -> &BTreeSet<Point> {
        &self.setup_empty
    }

    /// Place a setup stone, replacing any other setup at the point.
    pub fn add_setup_stone(&mut self, c: Color, p: Point) {
        self.setup[c.other()].remove(&p);
        self.setup_empty.remove(&p);
        self.setup[c].insert(p);
    }

    /// Clear a point by setup, replacing any other setup at the point.
    pub fn add_setup_empty(&mut self, p: Point) {
        for c in Color::ALL {
            self.setup[c].remove(&p);
        }
        self.setup_empty.insert(p);
    }

    /// Remove all setup information for a point.
    pub fn remove_setup(&mut self, p: Point) {
        for c in Color::ALL {
            self.setup[c].remove(&p);
        }
        self.setup_empty.remove(&p);
    }

    /// Replace the whole setup of this node.
    pub fn set_setup_stones(
        &mut self,
        black: impl IntoIterator<Item = Point>,
        white: impl IntoIterator<Item = Point>,
        empty: impl IntoIterator<Item = Point>,
    ) {
        self.setup = BlackWhite::default();
        self.setup_empty.clear();
        for p in black {
            self.add_setup_stone(Color::Black, p);
        }
        for p in white {
            self.add_setup_stone(Color::White, p);
        }
        for p in empty {
            self.add_setup_empty(p);
        }
    }

    /// Every point the node refers to: its move, then its setup.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.mv
            .and_then(|m| m.point)
            .into_iter()
            .chain(Color::ALL.into_iter().flat_map(move |c| self.setup[c].iter().copied()))
            .chain(self.setup_empty.iter().copied())
    }

    pub fn has_setup(&self) -> bool {
        Color::ALL.iter().any(|&c| !self.setup[c].is_empty()) || !self.setup_empty.is_empty()
    }

    // -------------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------------

    /// Seconds left for a color, if recorded.
    pub fn time_left(&self, c: Color) -> Option<f64> {
        self.time_left[c]
    }

    /// Record the seconds left for a color. NaN and infinities clear the
    /// value.
    pub fn set_time_left(&mut self, c: Color, seconds: f64) {
        self.time_left[c] = seconds.is_finite().then_some(seconds);
    }

    pub fn clear_time_left(&mut self, c: Color) {
        self.time_left[c] = None;
    }

    /// Moves left in the current byo-yomi period, if recorded.
    pub fn moves_left(&self, c: Color) -> Option<u32> {
        self.moves_left[c]
    }

    pub fn set_moves_left(&mut self, c: Color, n: Option<u32>) {
        self.moves_left[c] = n;
    }

    pub fn has_time_data(&self) -> bool {
        Color::ALL
            .iter()
            .any(|&c| self.time_left[c].is_some() || self.moves_left[c].is_some())
    }

    // -------------------------------------------------------------------------
    // Comment and SGF properties
    // -------------------------------------------------------------------------

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Set the comment. An empty string removes it.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        self.comment = if comment.is_empty() { None } else { Some(comment) };
    }

    pub fn sgf_properties(&self) -> &BTreeMap<String, Vec<String>> {
        &self.sgf_props
    }

    /// Store an SGF property that has no dedicated field.
    ///
    /// # Errors
    /// `TreeError::ReservedProperty` for PL, BL, WL, OB and OW, which are
    /// kept in the player and time fields.
    pub fn add_sgf_property(
        &mut self,
        key: impl Into<String>,
        values: Vec<String>,
    ) -> Result<(), TreeError> {
        let key = key.into();
        if is_reserved_property(&key) {
            return Err(TreeError::ReservedProperty(key));
        }
        self.sgf_props.insert(key, values);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Game info
    // -------------------------------------------------------------------------

    pub fn game_info(&self) -> Option<&GameInfo> {
        self.game_info.as_deref()
    }

    pub fn game_info_mut(&mut self) -> Option<&mut GameInfo> {
        self.game_info.as_deref_mut()
    }

    pub(crate) fn attach_game_info(&mut self, info: GameInfo) -> &mut GameInfo {
        self.game_info.insert(Box::new(info))
    }

    pub(crate) fn detach_game_info(&mut self) -> Option<GameInfo> {
        self.game_info.take().map(|b| *b)
    }

    // -------------------------------------------------------------------------
    // Shape predicates
    // -------------------------------------------------------------------------

    /// True if the node holds anything besides its move and game info.
    pub fn has_auxiliary_data(&self) -> bool {
        self.player.is_some()
            || self.has_setup()
            || self.has_time_data()
            || self.comment.is_some()
            || !self.sgf_props.is_empty()
    }

    /// True if the node holds neither a move nor auxiliary data.
    pub fn is_empty(&self) -> bool {
        self.mv.is_none() && !self.has_auxiliary_data()
    }

    pub fn has_only_move(&self) -> bool {
        self.mv.is_some() && !self.has_auxiliary_data()
    }

    /// Compare the recorded data of two nodes, ignoring structure.
    pub fn same_data(&self, other: &Node) -> bool {
        let info = |n: &Node| n.game_info().filter(|i| !i.is_empty()).cloned();
        self.mv == other.mv
            && self.player == other.player
            && self.setup == other.setup
            && self.setup_empty == other.setup_empty
            && self.time_left == other.time_left
            && self.moves_left == other.moves_left
            && self.comment == other.comment
            && self.sgf_props == other.sgf_props
            && info(self) == info(other)
    }
}

pub(crate) fn is_reserved_property(key: &str) -> bool {
    key == SGF_PLAYER || SGF_TIME_LEFT.contains(&key) || SGF_MOVES_LEFT.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_empty() {
        let node = Node::new();
        assert!(node.is_empty());
        assert!(!node.has_only_move());
    }

    #[test]
    fn test_only_move() {
        let node = Node::with_move(Move::pass(Color::Black));
        assert!(node.has_only_move());
        assert!(!node.is_empty());
    }

    #[test]
    fn test_player_is_auxiliary() {
        let mut node = Node::new();
        node.set_player(Some(Color::White));
        assert!(!node.is_empty());
        assert!(node.has_auxiliary_data());
    }

    #[test]
    fn test_setup_replaces_previous_setup() {
        let mut node = Node::new();
        let p = Point::new(3, 3);
        node.add_setup_stone(Color::Black, p);
        node.add_setup_stone(Color::White, p);
        assert!(node.setup(Color::Black).is_empty());
        assert!(node.setup(Color::White).contains(&p));
        node.add_setup_empty(p);
        assert!(node.setup(Color::White).is_empty());
        assert!(node.setup_empty().contains(&p));
        node.remove_setup(p);
        assert!(!node.has_setup());
    }

    #[test]
    fn test_time_left_nan_clears() {
        let mut node = Node::new();
        node.set_time_left(Color::Black, 30.0);
        assert_eq!(node.time_left(Color::Black), Some(30.0));
        assert!(node.has_time_data());
        node.set_time_left(Color::Black, f64::NAN);
        assert_eq!(node.time_left(Color::Black), None);
        assert!(!node.has_time_data());
    }

    #[test]
    fn test_time_left_infinite_clears() {
        let mut node = Node::new();
        for value in [f64::INFINITY, f64::NEG_INFINITY] {
            node.set_time_left(Color::White, 12.5);
            node.set_time_left(Color::White, value);
            assert_eq!(node.time_left(Color::White), None);
        }
        node.set_time_left(Color::White, -3.0);
        assert_eq!(node.time_left(Color::White), Some(-3.0));
    }

    #[test]
    fn test_points_lists_move_and_setup() {
        let mut node = Node::with_move(Move::new(Color::Black, Some(Point::new(4, 4))));
        node.add_setup_stone(Color::White, Point::new(1, 1));
        node.add_setup_empty(Point::new(2, 2));
        let points: Vec<_> = node.points().collect();
        assert_eq!(points, vec![Point::new(4, 4), Point::new(1, 1), Point::new(2, 2)]);
    }

    #[test]
    fn test_moves_left_is_time_data() {
        let mut node = Node::new();
        node.set_moves_left(Color::White, Some(0));
        assert!(node.has_time_data());
    }

    #[test]
    fn test_reserved_sgf_property() {
        let mut node = Node::new();
        assert_eq!(
            node.add_sgf_property("PL", vec!["B".into()]),
            Err(TreeError::ReservedProperty("PL".into()))
        );
        assert!(node.add_sgf_property("MN", vec!["12".into()]).is_ok());
        assert!(node.has_auxiliary_data());
    }

    #[test]
    fn test_empty_comment_removes() {
        let mut node = Node::new();
        node.set_comment("hello");
        assert_eq!(node.comment(), Some("hello"));
        node.set_comment("");
        assert_eq!(node.comment(), None);
    }
}
