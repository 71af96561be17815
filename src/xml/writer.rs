//! Serialize a [`GameTree`] to the XML game record format.
//!
//! The output has one element per line and no indentation:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <Go>
//! <GoGame>
//! <Information>
//! <BoardSize>19</BoardSize>
//! <Komi>5.5</Komi>
//! </Information>
//! <Nodes>
//! <Node/>
//! <Black number="1" at="D4"/>
//! </Nodes>
//! </GoGame>
//! </Go>
//! ```
//!
//! Node shapes:
//! - a node without data is `<Node/>`
//! - a node holding only a move is a bare `<Black>`/`<White>` element
//! - any other node is a `<Node>` element with nested properties, followed by
//!   its move element if it has one
//!
//! The player override, time left and moves left are written as legacy
//! `<SGF type="..">` properties. Children after the first are written as
//! `<Variation>` elements right after their father; the first child then
//! continues at the same level.

use std::io::{self, Write};

use quick_xml::escape::escape;
use tracing::debug;

use crate::color::Color;
use crate::constants::{SGF_MOVES_LEFT, SGF_PLAYER, SGF_TIME_LEFT, XML_PROLOGUE};
use crate::game_info::GameInfo;
use crate::go::Move;
use crate::node::{Node, NodeId};
use crate::tree::GameTree;

/// Write `tree` to `out`.
///
/// `application` is recorded in the `Application` element if given.
pub fn write<W: Write>(mut out: W, tree: &GameTree, application: Option<&str>) -> io::Result<()> {
    out.write_all(to_string(tree, application).as_bytes())?;
    out.flush()
}

/// Render `tree` as a document.
pub fn to_string(tree: &GameTree, application: Option<&str>) -> String {
    let mut p = Printer::default();
    p.line(XML_PROLOGUE);
    p.line("<Go>");
    p.line("<GoGame>");
    p.information(tree, application);
    p.line("<Nodes>");
    p.sequence(tree, tree.root(), 0);
    p.line("</Nodes>");
    p.line("</GoGame>");
    p.line("</Go>");
    debug!(
        nodes = p.nodes,
        bytes = p.out.len(),
        "wrote game record"
    );
    p.out
}

/// Pending output of [`Printer::sequence`].
enum Step {
    Node(NodeId, usize),
    Line(&'static str),
}

#[derive(Default)]
struct Printer {
    out: String,
    nodes: usize,
}

impl Printer {
    fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn element(&mut self, name: &str, text: &str) {
        self.line(&format!("<{name}>{}</{name}>", escape(text)));
    }

    fn opt_element(&mut self, name: &str, text: Option<&str>) {
        if let Some(t) = text {
            self.element(name, t);
        }
    }

    fn paragraphs(&mut self, name: &str, text: &str) {
        self.line(&format!("<{name}>"));
        for l in text.split('\n') {
            self.line(&format!("<P>{}</P>", escape(l)));
        }
        self.line(&format!("</{name}>"));
    }

    fn sgf(&mut self, key: &str, values: &[String]) {
        let mut s = format!("<SGF type=\"{}\">", escape(key));
        for v in values {
            s.push_str(&format!("<Arg>{}</Arg>", escape(v.as_str())));
        }
        s.push_str("</SGF>");
        self.line(&s);
    }

    // -------------------------------------------------------------------------
    // Information
    // -------------------------------------------------------------------------

    fn information(&mut self, tree: &GameTree, application: Option<&str>) {
        self.line("<Information>");
        self.element("BoardSize", &tree.board_size().to_string());
        self.opt_element("Application", application);
        if let Some(info) = tree.game_info() {
            self.game_info(info);
        }
        self.line("</Information>");
    }

    fn game_info(&mut self, info: &GameInfo) {
        if let Some(komi) = info.komi {
            self.element("Komi", &komi.to_string());
        }
        if let Some(h) = info.handicap {
            self.element("Handicap", &h.to_string());
        }
        for (tag, values) in [("Player", &info.players), ("Rank", &info.ranks)] {
            for (c, v) in values.iter() {
                if !v.is_empty() {
                    self.element(&format!("{}{tag}", c.tag()), v);
                }
            }
        }
        self.opt_element("Rules", info.rules.as_deref());
        if let Some(t) = info.time_settings {
            self.line("<Time>");
            self.element("Main", &t.main_time.to_string());
            if let Some(b) = t.byoyomi {
                self.line(&format!("<ByoYomi moves=\"{}\">{}</ByoYomi>", b.moves, b.time));
            }
            self.line("</Time>");
        }
        self.opt_element("Date", info.date.as_deref());
        self.opt_element("Event", info.event.as_deref());
        self.opt_element("Round", info.round.as_deref());
        self.opt_element("Place", info.place.as_deref());
        self.opt_element("Source", info.source.as_deref());
        self.opt_element("Result", info.result.as_deref());
        if let Some(c) = &info.comment {
            self.paragraphs("Comment", c);
        }
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Write `start` and its main line; other children become variations.
    ///
    /// Uses an explicit work stack, so variation nesting depth is bounded
    /// only by memory.
    fn sequence(&mut self, tree: &GameTree, start: NodeId, depth: usize) {
        let mut stack = vec![Step::Node(start, depth)];
        while let Some(step) = stack.pop() {
            let (id, depth) = match step {
                Step::Node(id, depth) => (id, depth),
                Step::Line(s) => {
                    self.line(s);
                    continue;
                }
            };
            self.node(tree.node(id), depth);
            let children = tree.children(id);
            if let Some(&main) = children.first() {
                stack.push(Step::Node(main, depth + 1));
            }
            for &v in children.iter().skip(1).rev() {
                stack.push(Step::Line("</Variation>"));
                stack.push(Step::Node(v, depth + 1));
                stack.push(Step::Line("<Variation>"));
            }
        }
    }

    fn node(&mut self, node: &Node, depth: usize) {
        self.nodes += 1;
        if node.is_empty() {
            self.line("<Node/>");
            return;
        }
        if !node.has_only_move() {
            self.line("<Node>");
            self.properties(node);
            self.line("</Node>");
        }
        if let Some(mv) = node.get_move() {
            self.move_element(mv, depth);
        }
    }

    fn properties(&mut self, node: &Node) {
        if let Some(c) = node.player() {
            self.sgf(SGF_PLAYER, &[c.to_sgf().to_string()]);
        }
        if let Some(text) = node.comment() {
            self.paragraphs("Comment", text);
        }
        for (tag, points) in [
            ("AddBlack", node.setup(Color::Black)),
            ("AddWhite", node.setup(Color::White)),
            ("Delete", node.setup_empty()),
        ] {
            for p in points {
                self.line(&format!("<{tag} at=\"{p}\"/>"));
            }
        }
        for (i, c) in Color::ALL.into_iter().enumerate() {
            if let Some(t) = node.time_left(c) {
                self.sgf(SGF_TIME_LEFT[i], &[t.to_string()]);
            }
        }
        for (i, c) in Color::ALL.into_iter().enumerate() {
            if let Some(n) = node.moves_left(c) {
                self.sgf(SGF_MOVES_LEFT[i], &[n.to_string()]);
            }
        }
        for (key, values) in node.sgf_properties() {
            self.sgf(key, values);
        }
    }

    fn move_element(&mut self, mv: Move, depth: usize) {
        let at = mv.point.map(|p| p.to_string()).unwrap_or_default();
        self.line(&format!(
            "<{} number=\"{depth}\" at=\"{at}\"/>",
            mv.color.tag()
        ));
    }
}
