//! Structuring pass from tokens to a [`ParseTree`].
//!
//! This is a best-effort nesting heuristic, not a validating parser.
//! Brackets drive the structure: `{}` makes a `Block`, `()` an
//! `Expression` or `Condition`, `[]` a `Subscript`, and a `;` outside
//! brackets ends a `Statement`. Control keywords (`if`, `while`, `for`,
//! `switch`, `do`) group their condition and body.
//!
//! Open scopes are kept on an explicit frame stack, so arbitrarily
//! deep nesting cannot overflow the call stack. The top frame decides
//! how the next token is handled: containers (`Root`, `Block`) scan
//! for the next item, a `Statement` collects tokens up to its `;`, and
//! a `Group` collects tokens up to its closing bracket.

use std::ops::Range;

use tracing::{debug, trace};

use crate::token::{Token, TokenKind};
use crate::tree::{Node, NodeId, NodeKind, ParseTree, StructuralWarning, StructuralWarningKind};

/// Build a parse tree over `tokens`.
///
/// Never fails: unbalanced brackets are force-closed or kept as
/// leaves and reported in [`ParseTree::warnings`]. Every token other
/// than a comment appears as exactly one leaf.
#[must_use]
pub fn build(tokens: &[Token]) -> ParseTree {
    Builder::new(tokens).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    While,
    For,
    Switch,
    Do,
}

impl Control {
    fn from_token(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Keyword {
            return None;
        }
        match token.text.as_str() {
            "if" => Some(Self::If),
            "while" => Some(Self::While),
            "for" => Some(Self::For),
            "switch" => Some(Self::Switch),
            "do" => Some(Self::Do),
            _ => None,
        }
    }

    const fn node_kind(self) -> NodeKind {
        match self {
            Self::If => NodeKind::IfStatement,
            Self::While => NodeKind::WhileStatement,
            Self::For => NodeKind::ForStatement,
            Self::Switch => NodeKind::SwitchStatement,
            Self::Do => NodeKind::DoStatement,
        }
    }

    const fn first_stage(self) -> Stage {
        match self {
            Self::Do => Stage::Body,
            _ => Stage::Condition,
        }
    }
}

/// Progress through a control structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Condition,
    Body,
    /// `if` body done, an `else` may follow.
    AfterBody,
    ElseBody,
    /// `do` body done, expecting `while`.
    DoWhile,
    DoCondition,
    DoSemicolon,
    Done,
}

impl Stage {
    /// Stage reached once a child node has been completed.
    const fn after_child(self, control: Control) -> Self {
        match (self, control) {
            (Self::Condition, _) => Self::Body,
            (Self::Body, Control::If) => Self::AfterBody,
            (Self::Body, Control::Do) => Self::DoWhile,
            (Self::Body | Self::ElseBody, _) => Self::Done,
            (Self::DoCondition, _) => Self::DoSemicolon,
            (other, _) => other,
        }
    }

    const fn expects_condition(self) -> bool {
        matches!(self, Self::Condition | Self::DoCondition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Block,
    Statement,
    Group { close: char, kind: NodeKind },
    Control { control: Control, stage: Stage },
}

impl FrameKind {
    /// Whether `close` ends this frame.
    fn closed_by(self, close: char) -> bool {
        match self {
            Self::Block => close == '}',
            Self::Group { close: expected, .. } => close == expected,
            _ => false,
        }
    }

    /// Index into `Builder::open_brackets`, for frames that have a
    /// bracket.
    const fn bracket_slot(self) -> Option<usize> {
        match self {
            Self::Block => Some(0),
            Self::Group { close: ')', .. } => Some(1),
            Self::Group { .. } => Some(2),
            _ => None,
        }
    }

    /// Opening bracket, for frames that have one.
    const fn opener(self) -> Option<char> {
        match self {
            Self::Block => Some('{'),
            Self::Group { close: ')', .. } => Some('('),
            Self::Group { .. } => Some('['),
            _ => None,
        }
    }

    const fn node_kind(self, complete: bool) -> NodeKind {
        match self {
            Self::Root => NodeKind::TranslationUnit,
            Self::Block => NodeKind::Block,
            Self::Statement if complete => NodeKind::Statement,
            Self::Statement => NodeKind::Expression,
            Self::Group { kind, .. } => kind,
            Self::Control { control, .. } => control.node_kind(),
        }
    }
}

struct Frame {
    kind: FrameKind,
    /// Index of the first token covered.
    start: usize,
    children: Vec<NodeId>,
}

/// Outcome of offering a token to the top frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Consumed,
    /// The stack changed without consuming; offer the token again.
    Retry,
}

struct Builder<'a> {
    tokens: &'a [Token],
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    warnings: Vec<StructuralWarning>,
    /// Open `{`, `(` and `[` frames on the stack, by bracket slot.
    open_brackets: [usize; 3],
}

impl<'a> Builder<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            nodes: Vec::new(),
            stack: vec![Frame {
                kind: FrameKind::Root,
                start: 0,
                children: Vec::new(),
            }],
            warnings: Vec::new(),
            open_brackets: [0; 3],
        }
    }

    fn run(mut self) -> ParseTree {
        for idx in 0..self.tokens.len() {
            if self.tokens[idx].kind == TokenKind::Comment {
                continue;
            }
            while self.step(idx) == Flow::Retry {}
        }

        let end = self.tokens.len();
        while self.stack.len() > 1 {
            self.warn_if_unclosed();
            self.finish(end, false);
        }

        let children = self
            .stack
            .pop()
            .map(|frame| frame.children)
            .unwrap_or_default();
        let root = self.push_node(NodeKind::TranslationUnit, children, 0..end, None);

        debug!(
            nodes = self.nodes.len(),
            warnings = self.warnings.len(),
            "built parse tree"
        );

        ParseTree::new(self.nodes, root, self.warnings)
    }

    fn top(&self) -> &Frame {
        // the root frame is only popped by `run`
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn step(&mut self, idx: usize) -> Flow {
        let kind = self.top().kind;
        match kind {
            FrameKind::Root | FrameKind::Block => self.item(idx),
            FrameKind::Statement => self.statement(idx),
            FrameKind::Group { close, .. } => self.group(idx, close),
            FrameKind::Control { control, stage } => self.control(idx, control, stage),
        }
    }

    /// Start of an item inside a container or a control body.
    fn item(&mut self, idx: usize) -> Flow {
        let tokens = self.tokens;
        let token = &tokens[idx];
        if let Some(close) = closer(token) {
            self.close_bracket(idx, close);
        } else if token.is_symbol("{") {
            self.open(idx, FrameKind::Block);
        } else if token.kind == TokenKind::Preprocessor {
            self.push_leaf(idx);
        } else if let Some(control) = Control::from_token(token) {
            self.open(
                idx,
                FrameKind::Control {
                    control,
                    stage: control.first_stage(),
                },
            );
        } else {
            self.stack.push(Frame {
                kind: FrameKind::Statement,
                start: idx,
                children: Vec::new(),
            });
            return Flow::Retry;
        }
        Flow::Consumed
    }

    fn statement(&mut self, idx: usize) -> Flow {
        let tokens = self.tokens;
        let token = &tokens[idx];
        if token.is_symbol(";") {
            self.push_leaf(idx);
            self.finish(idx + 1, true);
        } else if let Some(close) = closer(token) {
            self.close_bracket(idx, close);
        } else if token.is_symbol("{") {
            if !self.brace_is_nested() {
                self.flush_statement();
            }
            self.open(idx, FrameKind::Block);
        } else if let Some(kind) = self.group_kind(token) {
            self.open(idx, kind);
        } else {
            self.push_leaf(idx);
        }
        Flow::Consumed
    }

    fn group(&mut self, idx: usize, close: char) -> Flow {
        let tokens = self.tokens;
        let token = &tokens[idx];
        match closer(token) {
            Some(found) if found == close => {
                self.push_leaf(idx);
                self.finish(idx + 1, true);
            }
            Some(found) => self.close_bracket(idx, found),
            None if token.is_symbol("{") => self.open(idx, FrameKind::Block),
            None => {
                if let Some(kind) = self.group_kind(token) {
                    self.open(idx, kind);
                } else {
                    self.push_leaf(idx);
                }
            }
        }
        Flow::Consumed
    }

    fn control(&mut self, idx: usize, control: Control, stage: Stage) -> Flow {
        let tokens = self.tokens;
        let token = &tokens[idx];
        match stage {
            Stage::Condition | Stage::DoCondition if token.is_symbol("(") => {
                self.open(
                    idx,
                    FrameKind::Group {
                        close: ')',
                        kind: NodeKind::Condition,
                    },
                );
                Flow::Consumed
            }
            Stage::Condition => self.set_stage(Stage::Body),
            Stage::DoCondition => self.set_stage(Stage::DoSemicolon),
            Stage::Body | Stage::ElseBody => self.item(idx),
            Stage::AfterBody if token.is_keyword("else") => {
                self.push_leaf(idx);
                self.set_stage(Stage::ElseBody);
                Flow::Consumed
            }
            Stage::DoWhile if token.is_keyword("while") => {
                self.push_leaf(idx);
                self.set_stage(Stage::DoCondition);
                Flow::Consumed
            }
            Stage::DoSemicolon if token.is_symbol(";") => {
                self.push_leaf(idx);
                self.finish(idx + 1, true);
                Flow::Consumed
            }
            Stage::AfterBody | Stage::DoWhile | Stage::DoSemicolon | Stage::Done => {
                trace!(?control, ?stage, "closing control structure");
                self.finish(idx, true);
                Flow::Retry
            }
        }
    }

    fn set_stage(&mut self, next: Stage) -> Flow {
        if let FrameKind::Control { stage, .. } = &mut self.top_mut().kind {
            *stage = next;
        }
        Flow::Retry
    }

    fn group_kind(&self, token: &Token) -> Option<FrameKind> {
        if token.is_symbol("(") {
            let kind = match self.top().kind {
                FrameKind::Control { stage, .. } if stage.expects_condition() => {
                    NodeKind::Condition
                }
                _ => NodeKind::Expression,
            };
            Some(FrameKind::Group { close: ')', kind })
        } else if token.is_symbol("[") {
            Some(FrameKind::Group {
                close: ']',
                kind: NodeKind::Subscript,
            })
        } else {
            None
        }
    }

    /// Whether a `{` inside the current statement belongs to it
    /// (initializer, lambda) rather than starting a body.
    fn brace_is_nested(&self) -> bool {
        let children = &self.top().children;
        let assigns = children.iter().enumerate().any(|(i, &child)| {
            self.leaf_token(child).is_some_and(|t| t.is_symbol("="))
                && !i
                    .checked_sub(1)
                    .and_then(|prev| self.leaf_token(children[prev]))
                    .is_some_and(|t| t.is_keyword("operator"))
        });
        let continues = children
            .last()
            .and_then(|&last| self.leaf_token(last))
            .is_some_and(|t| {
                t.kind == TokenKind::Operator || t.is_symbol(",") || t.is_keyword("return")
            });
        assigns || continues
    }

    fn leaf_token(&self, id: NodeId) -> Option<&'a Token> {
        self.nodes[id.0].token.map(|idx| &self.tokens[idx])
    }

    /// Replace the open statement by its children, which become a
    /// header in the enclosing frame.
    fn flush_statement(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.top_mut().children.extend(frame.children);
        }
    }

    fn open(&mut self, idx: usize, kind: FrameKind) {
        if let Some(slot) = kind.bracket_slot() {
            self.open_brackets[slot] += 1;
        }
        let leaf = self.leaf(idx);
        self.stack.push(Frame {
            kind,
            start: idx,
            children: vec![leaf],
        });
    }

    /// Every frame the search walks past is popped, so matching is
    /// amortised constant time per token.
    fn close_bracket(&mut self, idx: usize, close: char) {
        let target = if self.open_brackets[closer_slot(close)] == 0 {
            None
        } else {
            self.stack
                .iter()
                .rposition(|frame| frame.kind.closed_by(close))
        };
        let Some(target) = target else {
            self.warn(StructuralWarningKind::Unmatched(close), idx);
            self.push_leaf(idx);
            return;
        };

        while self.stack.len() - 1 > target {
            self.warn_if_unclosed();
            self.finish(idx, false);
        }
        self.push_leaf(idx);
        self.finish(idx + 1, true);
    }

    /// Pop the top frame into a node ending before token `end`, then
    /// let the parent react. A control structure whose last part was
    /// just completed closes as well.
    fn finish(&mut self, end: usize, complete: bool) {
        let mut complete = complete;
        while self.stack.len() > 1 {
            let Some(frame) = self.stack.pop() else {
                return;
            };
            if let Some(slot) = frame.kind.bracket_slot() {
                self.open_brackets[slot] -= 1;
            }
            let id = self.push_node(
                frame.kind.node_kind(complete),
                frame.children,
                frame.start..end,
                None,
            );

            let parent = self.top_mut();
            parent.children.push(id);
            let FrameKind::Control { control, stage } = &mut parent.kind else {
                return;
            };
            *stage = stage.after_child(*control);
            if *stage != Stage::Done {
                return;
            }
            complete = true;
        }
    }

    fn warn_if_unclosed(&mut self) {
        let frame = self.top();
        if let Some(open) = frame.kind.opener() {
            let start = frame.start;
            self.warn(StructuralWarningKind::Unclosed(open), start);
        }
    }

    fn warn(&mut self, kind: StructuralWarningKind, idx: usize) {
        let span = self.tokens[idx].span;
        trace!(%kind, line = span.line, column = span.column, "structural warning");
        self.warnings.push(StructuralWarning {
            kind,
            span,
            token: idx,
        });
    }

    fn leaf(&mut self, idx: usize) -> NodeId {
        let kind = NodeKind::Leaf(self.tokens[idx].kind);
        self.push_node(kind, Vec::new(), idx..idx + 1, Some(idx))
    }

    fn push_leaf(&mut self, idx: usize) {
        let leaf = self.leaf(idx);
        self.top_mut().children.push(leaf);
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        children: Vec<NodeId>,
        range: Range<usize>,
        token: Option<usize>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children,
            range,
            token,
        });
        id
    }
}

const fn closer_slot(close: char) -> usize {
    match close {
        '}' => 0,
        ')' => 1,
        _ => 2,
    }
}

fn closer(token: &Token) -> Option<char> {
    if token.kind != TokenKind::Punctuation {
        return None;
    }
    match token.text.as_str() {
        ")" => Some(')'),
        "]" => Some(']'),
        "}" => Some('}'),
        _ => None,
    }
}
