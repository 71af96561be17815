//! Parse the XML game record format back into a [`GameTree`].
//!
//! Reading happens in two passes: quick-xml events are collected into a
//! small element tree, and the element tree is interpreted into a fresh
//! [`GameTree`] that is handed out only when the whole document has been
//! accepted. A rejected document therefore never leaves a half-built tree
//! behind.
//!
//! A move element right after a non-empty `<Node>` that has no move yet
//! belongs to that node when its `number` equals the node's depth; in every
//! other position the move starts a node of its own and `number` is only
//! advisory.

use std::io::Read;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::color::Color;
use crate::constants::{
    DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE, SGF_MOVES_LEFT, SGF_PLAYER, SGF_TIME_LEFT,
};
use crate::error::{ReadError, TreeError};
use crate::game_info::{GameInfo, TimeSettings};
use crate::go::{Move, Point};
use crate::komi::Komi;
use crate::node::{Node, NodeId};
use crate::tree::GameTree;

/// Read a document from `source`.
pub fn read<R: Read>(mut source: R) -> Result<GameTree, ReadError> {
    let mut text = String::new();
    source.read_to_string(&mut text)?;
    read_str(&text)
}

/// Read a document from a string.
pub fn read_str(text: &str) -> Result<GameTree, ReadError> {
    let root = parse_elements(text)?;
    let tree = interpret(&root)?;
    debug!(
        board_size = tree.board_size(),
        nodes = tree.node_count(),
        "read game record"
    );
    Ok(tree)
}

// =============================================================================
// Element tree
// =============================================================================

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Content>,
    position: u64,
}

#[derive(Debug)]
enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    fn from_start(start: &BytesStart<'_>, position: u64) -> Result<Element, ReadError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ReadError::malformed(position, e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ReadError::malformed(position, e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
            position,
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required_attr(&self, key: &str) -> Result<&str, ReadError> {
        self.attr(key)
            .ok_or_else(|| self.fail(format!("<{}> lacks attribute '{key}'", self.name)))
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated text content, not trimmed.
    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    /// Text of `<P>` children joined by newlines, or the plain text if there
    /// are none.
    fn paragraphs(&self) -> String {
        let lines: Vec<String> = self
            .elements()
            .filter(|e| e.name == "P")
            .map(Element::text)
            .collect();
        if lines.is_empty() {
            self.text()
        } else {
            lines.join("\n")
        }
    }

    fn parse_text<T: std::str::FromStr>(&self) -> Result<T, ReadError> {
        let text = self.text();
        text.trim()
            .parse()
            .map_err(|_| self.fail(format!("invalid value '{text}' in <{}>", self.name)))
    }

    fn fail(&self, reason: impl Into<String>) -> ReadError {
        ReadError::malformed(self.position, reason)
    }
}

/// Children are released iteratively, so nesting depth is bounded only by
/// memory.
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(content) = pending.pop() {
            if let Content::Element(mut e) = content {
                pending.append(&mut e.children);
            }
        }
    }
}

fn parse_elements(text: &str) -> Result<Element, ReadError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = match reader.read_event() {
            Ok(e) => e,
            Err(e) => {
                return Err(ReadError::malformed(
                    reader.buffer_position() as u64,
                    e.to_string(),
                ));
            }
        };
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start, position)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start, position)?;
                close(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ReadError::malformed(position, "unexpected end tag"))?;
                close(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                let s = t
                    .unescape()
                    .map_err(|e| ReadError::malformed(position, e.to_string()))?;
                push_text(&mut stack, s.into_owned(), position)?;
            }
            Event::CData(c) => {
                push_text(&mut stack, String::from_utf8_lossy(&c).into_owned(), position)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(open.fail(format!("element <{}> is not closed", open.name)));
    }
    root.ok_or_else(|| ReadError::malformed(0, "document has no root element"))
}

fn close(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ReadError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Content::Element(element));
    } else if root.is_some() {
        return Err(element.fail("more than one root element"));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: String, position: u64) -> Result<(), ReadError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Content::Text(text)),
        None if !text.trim().is_empty() => {
            return Err(ReadError::malformed(position, "text outside the root element"));
        }
        None => {}
    }
    Ok(())
}

// =============================================================================
// Interpretation
// =============================================================================

fn interpret(root: &Element) -> Result<GameTree, ReadError> {
    if root.name != "Go" {
        return Err(root.fail(format!("root element is <{}>, expected <Go>", root.name)));
    }
    let mut games = root.elements().filter(|e| e.name == "GoGame");
    let game = games
        .next()
        .ok_or_else(|| root.fail("document contains no <GoGame>"))?;
    if games.next().is_some() {
        warn!("document contains more than one game, reading the first");
    }

    let (board_size, info) = match game.child("Information") {
        Some(information) => parse_information(information)?,
        None => (DEFAULT_BOARD_SIZE, None),
    };
    let mut tree = GameTree::new(board_size).map_err(|e| game.fail(e.to_string()))?;
    if let Some(nodes) = game.child("Nodes") {
        build_nodes(&mut tree, nodes)?;
    }
    if let Some(info) = info {
        let root = tree.root();
        let slot = tree
            .create_game_info(root)
            .map_err(|e| game.fail(e.to_string()))?;
        *slot = info;
    }
    Ok(tree)
}

fn parse_information(information: &Element) -> Result<(usize, Option<GameInfo>), ReadError> {
    let mut board_size = DEFAULT_BOARD_SIZE;
    let mut info = GameInfo::new();
    for e in information.elements() {
        match e.name.as_str() {
            "BoardSize" => {
                board_size = e.parse_text()?;
                if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
                    return Err(e.fail(format!("board size {board_size} out of range")));
                }
            }
            "Application" => debug!(application = %e.text(), "document written by"),
            "Komi" => {
                let text = e.text();
                info.komi = Some(
                    text.parse::<Komi>()
                        .map_err(|err| e.fail(err.to_string()))?,
                );
            }
            "Handicap" => info.handicap = Some(e.parse_text()?),
            "BlackPlayer" => info.players[Color::Black] = e.text(),
            "WhitePlayer" => info.players[Color::White] = e.text(),
            "BlackRank" => info.ranks[Color::Black] = e.text(),
            "WhiteRank" => info.ranks[Color::White] = e.text(),
            "Rules" => info.rules = Some(e.text()),
            "Time" => info.time_settings = Some(parse_time(e)?),
            "Date" => info.date = Some(e.text()),
            "Event" => info.event = Some(e.text()),
            "Round" => info.round = Some(e.text()),
            "Place" => info.place = Some(e.text()),
            "Source" => info.source = Some(e.text()),
            "Result" => info.result = Some(e.text()),
            "Comment" => info.comment = Some(e.paragraphs()),
            other => warn!(element = other, "skipping unknown game information"),
        }
    }
    let info = (!info.is_empty()).then_some(info);
    Ok((board_size, info))
}

fn parse_time(time: &Element) -> Result<TimeSettings, ReadError> {
    let main = time
        .child("Main")
        .ok_or_else(|| time.fail("<Time> lacks <Main>"))?
        .parse_text()?;
    match time.child("ByoYomi") {
        Some(b) => {
            let moves = b.required_attr("moves")?;
            let moves = moves
                .trim()
                .parse()
                .map_err(|_| b.fail(format!("invalid byo-yomi moves '{moves}'")))?;
            Ok(TimeSettings::with_byoyomi(main, b.parse_text()?, moves))
        }
        None => Ok(TimeSettings::sudden_death(main)),
    }
}

fn parse_move(e: &Element, color: Color, board_size: usize) -> Result<Move, ReadError> {
    let at = e.required_attr("at")?;
    Ok(Move::new(color, parse_point_or_pass(e, at, board_size)?))
}

fn parse_point_or_pass(e: &Element, at: &str, board_size: usize) -> Result<Option<Point>, ReadError> {
    if at.trim().is_empty() {
        return Ok(None);
    }
    Point::parse(at, board_size)
        .map(Some)
        .map_err(|err| e.fail(err.to_string()))
}

fn parse_point(e: &Element, board_size: usize) -> Result<Point, ReadError> {
    let at = e.required_attr("at")?;
    parse_point_or_pass(e, at, board_size)?
        .ok_or_else(|| e.fail(format!("<{}> needs a point", e.name)))
}

fn parse_node(e: &Element, board_size: usize) -> Result<Node, ReadError> {
    let mut node = Node::new();
    for p in e.elements() {
        match p.name.as_str() {
            "SGF" => parse_sgf_property(p, &mut node)?,
            "Comment" => node.set_comment(p.paragraphs()),
            "AddBlack" => node.add_setup_stone(Color::Black, parse_point(p, board_size)?),
            "AddWhite" => node.add_setup_stone(Color::White, parse_point(p, board_size)?),
            "Delete" => node.add_setup_empty(parse_point(p, board_size)?),
            "BlackToPlay" => node.set_player(Some(Color::Black)),
            "WhiteToPlay" => node.set_player(Some(Color::White)),
            other => return Err(p.fail(format!("unknown element <{other}> in <Node>"))),
        }
    }
    Ok(node)
}

fn parse_sgf_property(p: &Element, node: &mut Node) -> Result<(), ReadError> {
    let key = p.required_attr("type")?;
    let args: Vec<String> = p
        .elements()
        .filter(|a| a.name == "Arg")
        .map(Element::text)
        .collect();
    let single = || single_value(p, key, &args);
    let invalid = |value: &str| p.fail(format!("invalid value '{value}' for SGF property {key}"));

    if key == SGF_PLAYER {
        let value = single()?;
        node.set_player(Some(value.parse::<Color>().map_err(|_| invalid(value))?));
    } else if let Some(i) = SGF_TIME_LEFT.iter().position(|&k| k == key) {
        let value = single()?;
        let seconds: f64 = value.parse().map_err(|_| invalid(value))?;
        if !seconds.is_finite() {
            return Err(invalid(value));
        }
        node.set_time_left(Color::ALL[i], seconds);
    } else if let Some(i) = SGF_MOVES_LEFT.iter().position(|&k| k == key) {
        let value = single()?;
        let n: u32 = value.parse().map_err(|_| invalid(value))?;
        node.set_moves_left(Color::ALL[i], Some(n));
    } else {
        node.add_sgf_property(key, args.clone())
            .map_err(|err| p.fail(err.to_string()))?;
    }
    Ok(())
}

fn single_value<'a>(p: &Element, key: &str, args: &'a [String]) -> Result<&'a str, ReadError> {
    match args {
        [value] => Ok(value.trim()),
        _ => Err(p.fail(format!("SGF property {key} needs exactly one value"))),
    }
}

// =============================================================================
// Tree construction
// =============================================================================

/// One `<Nodes>` or `<Variation>` block being read.
struct Frame<'a> {
    element: &'a Element,
    items: std::slice::Iter<'a, Content>,
    /// Node the first item of the block hangs from; `None` for `<Nodes>`,
    /// whose first item is the root.
    father: Option<NodeId>,
    /// Depth of the first item.
    base_depth: usize,
    /// Items read so far and the latest of them.
    len: usize,
    last: Option<NodeId>,
    /// The latest item is a non-empty `<Node>` that can still take its move.
    open: bool,
}

impl<'a> Frame<'a> {
    fn new(element: &'a Element, father: Option<NodeId>, base_depth: usize) -> Self {
        Self {
            element,
            items: element.children.iter(),
            father,
            base_depth,
            len: 0,
            last: None,
            open: false,
        }
    }

    fn next_element(&mut self) -> Option<&'a Element> {
        self.items.find_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }
}

/// Add the node sequence under `<Nodes>` to `tree`, whose root is still
/// empty.
///
/// Blocks are walked with an explicit stack, so variation nesting depth is
/// bounded only by memory. A `<Variation>` is appended to its father as soon
/// as it is read; the father's main-line child, which follows the variations
/// in the document, is moved to the front when it arrives.
fn build_nodes(tree: &mut GameTree, nodes: &Element) -> Result<(), ReadError> {
    let board_size = tree.board_size();
    let mut stack = vec![Frame::new(nodes, None, 0)];

    while let Some(frame) = stack.last_mut() {
        let Some(e) = frame.next_element() else {
            if frame.father.is_some() && frame.len == 0 {
                return Err(frame.element.fail("empty variation"));
            }
            stack.pop();
            continue;
        };
        let depth = frame.base_depth + frame.len;
        match e.name.as_str() {
            "Node" => {
                let node = parse_node(e, board_size)?;
                let open = !node.is_empty();
                place(tree, frame, e, node)?;
                frame.open = open;
            }
            "Black" | "White" => {
                let color = if e.name == "Black" {
                    Color::Black
                } else {
                    Color::White
                };
                let mv = parse_move(e, color, board_size)?;
                let number = e.attr("number").and_then(|n| n.trim().parse::<usize>().ok());
                match frame.last {
                    Some(last) if frame.open && depth > 0 && number == Some(depth - 1) => {
                        tree.set_move(last, Some(mv))
                            .map_err(|err| e.fail(err.to_string()))?;
                    }
                    _ => {
                        if number.is_some_and(|n| n != depth) {
                            debug!(?number, depth, "move number does not match depth");
                        }
                        place(tree, frame, e, Node::with_move(mv))?;
                    }
                }
                frame.open = false;
            }
            "Variation" => {
                let father = frame
                    .last
                    .ok_or_else(|| e.fail("variation without a preceding node"))?;
                frame.open = false;
                stack.push(Frame::new(e, Some(father), depth));
            }
            other => return Err(e.fail(format!("unknown element <{other}> in node sequence"))),
        }
    }
    Ok(())
}

/// Add `node` as the next item of `frame`.
fn place(tree: &mut GameTree, frame: &mut Frame<'_>, e: &Element, node: Node) -> Result<(), ReadError> {
    let structural = |err: TreeError| e.fail(err.to_string());
    let id = match frame.last.or(frame.father) {
        Some(father) => {
            let id = tree.create_node_from(node).map_err(structural)?;
            tree.append(father, id).map_err(structural)?;
            if frame.last.is_some() && tree.children(father).len() > 1 {
                tree.make_main_variation(id).map_err(structural)?;
            }
            id
        }
        None => {
            tree.set_root_data(node);
            tree.root()
        }
    };
    frame.last = Some(id);
    frame.len += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(nodes: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Go>\n<GoGame>\n\
             <Information>\n<BoardSize>19</BoardSize>\n</Information>\n\
             <Nodes>\n{nodes}</Nodes>\n</GoGame>\n</Go>\n"
        )
    }

    fn malformed_reason(result: Result<GameTree, ReadError>) -> String {
        match result {
            Err(ReadError::Malformed { reason, .. }) => reason,
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("document accepted"),
        }
    }

    #[test]
    fn test_read_bare_move() {
        let tree = read_str(&doc("<Node/>\n<Black number=\"1\" at=\"D4\"/>\n")).unwrap();
        let root = tree.root();
        assert!(tree.node(root).is_empty());
        let child = tree.child(root, 0).unwrap();
        assert_eq!(
            tree.node(child).get_move(),
            Some(Move::new(Color::Black, Some(Point::new(3, 3))))
        );
    }

    #[test]
    fn test_read_pass() {
        let tree = read_str(&doc("<Node/>\n<White number=\"1\" at=\"\"/>\n")).unwrap();
        let child = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.node(child).get_move(), Some(Move::pass(Color::White)));
    }

    #[test]
    fn test_move_joins_preceding_node_at_same_depth() {
        let text = doc(
            "<Node/>\n<Node>\n<SGF type=\"BL\"><Arg>10</Arg></SGF>\n</Node>\n\
             <Black number=\"1\" at=\"C3\"/>\n",
        );
        let tree = read_str(&text).unwrap();
        let child = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.node(child).time_left(Color::Black), Some(10.0));
        assert!(tree.node(child).get_move().is_some());
        assert!(tree.children(child).is_empty());
    }

    #[test]
    fn test_move_after_moveless_node_is_child() {
        let text = doc(
            "<Node>\n<SGF type=\"PL\"><Arg>B</Arg></SGF>\n</Node>\n\
             <Black number=\"1\" at=\"C3\"/>\n",
        );
        let tree = read_str(&text).unwrap();
        let root = tree.root();
        assert_eq!(tree.node(root).player(), Some(Color::Black));
        assert_eq!(tree.node(root).get_move(), None);
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn test_variation_order() {
        let text = doc(
            "<Node/>\n<Variation>\n<Black number=\"1\" at=\"Q16\"/>\n</Variation>\n\
             <Black number=\"1\" at=\"D4\"/>\n",
        );
        let tree = read_str(&text).unwrap();
        let root = tree.root();
        let moves: Vec<_> = tree
            .children(root)
            .iter()
            .map(|&c| tree.node(c).get_move().and_then(|m| m.point).unwrap().to_string())
            .collect();
        assert_eq!(moves, vec!["D4", "Q16"]);
    }

    #[test]
    fn test_unknown_node_element() {
        let reason = malformed_reason(read_str(&doc("<Node/>\n<Foo/>\n")));
        assert!(reason.contains("<Foo>"), "{reason}");
    }

    #[test]
    fn test_bad_coordinate() {
        let reason = malformed_reason(read_str(&doc("<Black number=\"1\" at=\"Z99\"/>\n")));
        assert!(reason.contains("Z99"), "{reason}");
    }

    #[test]
    fn test_missing_at() {
        let reason = malformed_reason(read_str(&doc("<Black number=\"1\"/>\n")));
        assert!(reason.contains("'at'"), "{reason}");
    }

    #[test]
    fn test_board_size_out_of_range() {
        let text = doc("").replace("<BoardSize>19", "<BoardSize>26");
        let reason = malformed_reason(read_str(&text));
        assert!(reason.contains("26"), "{reason}");
        let text = doc("").replace("<BoardSize>19", "<BoardSize>0");
        assert!(read_str(&text).is_err());
    }

    #[test]
    fn test_inconsistent_number_is_advisory() {
        let tree = read_str(&doc("<Node/>\n<Black number=\"17\" at=\"D4\"/>\n")).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);
        let tree = read_str(&doc("<Node/>\n<Black number=\"x\" at=\"D4\"/>\n")).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn test_variation_without_node() {
        let text = doc("<Variation>\n<Node/>\n</Variation>\n");
        let reason = malformed_reason(read_str(&text));
        assert!(reason.contains("variation"), "{reason}");
    }

    #[test]
    fn test_not_well_formed() {
        assert!(read_str("<Go><GoGame></Go>").is_err());
        assert!(read_str("").is_err());
        assert!(read_str("<Other/>").is_err());
    }

    #[test]
    fn test_unknown_information_is_skipped() {
        let text = doc("").replace("</Information>", "<Copyright>x</Copyright>\n</Information>");
        let tree = read_str(&text).unwrap();
        assert!(tree.game_info().is_none());
    }

    #[test]
    fn test_escaped_text() {
        let text = doc("").replace(
            "</Information>",
            "<BlackPlayer>A &amp; B</BlackPlayer>\n</Information>",
        );
        let tree = read_str(&text).unwrap();
        assert_eq!(tree.game_info().unwrap().player(Color::Black), "A & B");
    }

    #[test]
    fn test_read_from_source() {
        let text = doc("<Node/>\n");
        let tree = read(text.as_bytes()).unwrap();
        assert_eq!(tree.board_size(), 19);
    }
}
