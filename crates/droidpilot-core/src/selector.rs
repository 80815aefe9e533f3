//! CSS-style selectors over a [`Hierarchy`].
//!
//! The supported grammar is the part of CSS selectors that is useful
//! against uiautomator dumps:
//!
//! - type selectors (`node`, `hierarchy`) and the universal selector `*`
//! - attribute predicates: `[attr]`, `[attr=v]`, `[attr^=v]`, `[attr$=v]`,
//!   `[attr*=v]`, `[attr~=v]`, with values quoted (`'..'` / `".."`) or bare
//! - descendant (whitespace) and child (`>`) combinators
//! - selector lists separated by `,`
//!
//! Matches are always reported in document order.
//!
//! # Example
//!
//! ```
//! use droidpilot_core::hierarchy::Hierarchy;
//! use droidpilot_core::selector::Selector;
//!
//! let tree = Hierarchy::parse(
//!     r#"<hierarchy><node package="com.app"><node text="Settings" bounds="[0,0][10,10]"/></node></hierarchy>"#,
//! ).unwrap();
//! let selector = Selector::parse(r#"hierarchy > node node[text="Settings"]"#).unwrap();
//! assert_eq!(selector.select(&tree).len(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{AutomatorError, Result};
use crate::hierarchy::{Hierarchy, Node, NodeId};

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    /// `None` matches any tag.
    tag: Option<String>,
    attrs: Vec<AttrPredicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrPredicate {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Word(String),
}

impl AttrPredicate {
    fn matches(&self, node: &Node) -> bool {
        let Some(value) = node.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            // Empty operands never match, as in CSS.
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
            AttrOp::Word(v) => value.split_whitespace().any(|w| w == v),
        }
    }
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if node.tag() != tag {
                return false;
            }
        }
        self.attrs.iter().all(|a| a.matches(node))
    }
}

impl Complex {
    fn matches(&self, tree: &Hierarchy, id: NodeId) -> bool {
        self.matches_at(tree, self.compounds.len() - 1, id)
    }

    fn matches_at(&self, tree: &Hierarchy, index: usize, id: NodeId) -> bool {
        if !self.compounds[index].matches(tree.node(id)) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .node(id)
                .parent()
                .map_or(false, |p| self.matches_at(tree, index - 1, p)),
            Combinator::Descendant => tree
                .ancestors(id)
                .any(|a| self.matches_at(tree, index - 1, a)),
        }
    }
}

impl Selector {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// [`AutomatorError::InvalidSelector`] describing the first syntax error.
    pub fn parse(source: &str) -> Result<Self> {
        let alternatives = Parser::new(source).parse_list().map_err(|reason| {
            AutomatorError::InvalidSelector {
                selector: source.to_string(),
                reason,
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// The selector text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `id` matches any alternative of this selector.
    pub fn matches(&self, tree: &Hierarchy, id: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(tree, id))
    }

    /// All matching nodes, in document order.
    pub fn select(&self, tree: &Hierarchy) -> Vec<NodeId> {
        tree.nodes().filter(|id| self.matches(tree, *id)).collect()
    }

    /// The first matching node in document order.
    pub fn first(&self, tree: &Hierarchy) -> Option<NodeId> {
        tree.nodes().find(|id| self.matches(tree, *id))
    }
}

impl FromStr for Selector {
    type Err = AutomatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

type ParseResult<T> = std::result::Result<T, String>;

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Skips whitespace, returning true if any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, want: char) -> ParseResult<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(format!("expected '{}' but found '{}' at offset {}", want, c, self.pos - 1)),
            None => Err(format!("expected '{}' but reached end of selector", want)),
        }
    }

    fn parse_list(&mut self) -> ParseResult<Vec<Complex>> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                None => return Ok(list),
                Some(',') => continue,
                Some(c) => return Err(format!("unexpected '{}' at offset {}", c, self.pos - 1)),
            }
        }
    }

    fn parse_complex(&mut self) -> ParseResult<Complex> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(format!("unexpected '{}' at offset {}", c, self.pos)),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex { compounds, combinators })
    }

    fn parse_compound(&mut self) -> ParseResult<Compound> {
        let mut compound = Compound::default();
        let mut has_type = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                has_type = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?);
                has_type = true;
            }
            _ => {}
        }
        while self.peek() == Some('[') {
            compound.attrs.push(self.parse_attr()?);
        }
        if !has_type && compound.attrs.is_empty() {
            return Err(match self.peek() {
                Some(c) => format!("expected tag or attribute at offset {}, found '{}'", self.pos, c),
                None => "expected tag or attribute but reached end of selector".to_string(),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while self.peek().map_or(false, is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(format!("expected a name at offset {}", start));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attr(&mut self) -> ParseResult<AttrPredicate> {
        self.expect('[')?;
        self.skip_ws();
        let name = self.parse_ident()?;
        self.skip_ws();

        let op: fn(String) -> AttrOp = match self.bump() {
            Some(']') => return Ok(AttrPredicate { name, op: AttrOp::Exists }),
            Some('=') => AttrOp::Equals,
            Some(c @ ('^' | '$' | '*' | '~')) => {
                self.expect('=')?;
                match c {
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Contains,
                    _ => AttrOp::Word,
                }
            }
            Some(c) => return Err(format!("unexpected '{}' in attribute at offset {}", c, self.pos - 1)),
            None => return Err("unterminated attribute predicate".to_string()),
        };

        self.skip_ws();
        let value = self.parse_value()?;
        self.skip_ws();
        self.expect(']')?;
        Ok(AttrPredicate { name, op: op(value) })
    }

    fn parse_value(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        None => return Err("unterminated quoted value".to_string()),
                        Some('\\') => match self.bump() {
                            Some(c) => value.push(c),
                            None => return Err("unterminated escape in quoted value".to_string()),
                        },
                        Some(c) if c == quote => return Ok(value),
                        Some(c) => value.push(c),
                    }
                }
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .map_or(false, |c| c != ']' && !c.is_whitespace())
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(format!("expected attribute value at offset {}", start));
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<hierarchy rotation="0">
  <node package="com.android.settings" class="android.widget.FrameLayout" bounds="[0,0][1080,1920]">
    <node resource-id="android:id/title" text="Network &amp; internet" class="android.widget.TextView" bounds="[0,200][1080,300]" />
    <node resource-id="com.android.settings:id/list" class="android.widget.ListView" bounds="[0,300][1080,1900]">
      <node text="Settings" class="android.widget.TextView" content-desc="open settings now" bounds="[300,1000][500,1100]" />
      <node text="Settings" class="android.widget.Button" bounds="[300,1200][500,1300]" />
    </node>
  </node>
</hierarchy>"#;

    fn tree() -> Hierarchy {
        Hierarchy::parse(DUMP).unwrap()
    }

    fn texts(tree: &Hierarchy, selector: &str) -> Vec<String> {
        Selector::parse(selector)
            .unwrap()
            .select(tree)
            .into_iter()
            .map(|id| tree.node(id).attr("class").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_attribute_equality() {
        let tree = tree();
        assert_eq!(
            texts(&tree, r#"node[text="Settings"]"#),
            vec!["android.widget.TextView", "android.widget.Button"]
        );
        assert_eq!(
            texts(&tree, "node[text='Network & internet']"),
            vec!["android.widget.TextView"]
        );
    }

    #[test]
    fn test_first_is_document_order() {
        let tree = tree();
        let selector = Selector::parse(r#"node[text="Settings"]"#).unwrap();
        let first = selector.first(&tree).unwrap();
        assert_eq!(tree.node(first).attr("bounds"), Some("[300,1000][500,1100]"));
    }

    #[test]
    fn test_compound_attributes() {
        let tree = tree();
        assert_eq!(
            texts(&tree, r#"node[text="Settings"][class="android.widget.Button"]"#),
            vec!["android.widget.Button"]
        );
    }

    #[test]
    fn test_attribute_operators() {
        let tree = tree();
        assert_eq!(texts(&tree, "[resource-id^=android:id]").len(), 1);
        assert_eq!(texts(&tree, "[resource-id$=':id/list']").len(), 1);
        assert_eq!(texts(&tree, "[class*=Text]").len(), 2);
        assert_eq!(texts(&tree, "[content-desc~=settings]").len(), 1);
        assert_eq!(texts(&tree, "[content-desc~=sett]").len(), 0);
        assert_eq!(texts(&tree, "[content-desc]").len(), 1);
        assert_eq!(texts(&tree, "[class^='']").len(), 0);
    }

    #[test]
    fn test_child_combinator() {
        let tree = tree();
        let matches = Selector::parse("hierarchy > node").unwrap().select(&tree);
        assert_eq!(matches.len(), 1);
        assert_eq!(tree.node(matches[0]).attr("package"), Some("com.android.settings"));

        assert!(Selector::parse("hierarchy > node[text=Settings]")
            .unwrap()
            .select(&tree)
            .is_empty());
    }

    #[test]
    fn test_descendant_combinator() {
        let tree = tree();
        assert_eq!(texts(&tree, "hierarchy node[text=Settings]").len(), 2);
        assert_eq!(
            texts(&tree, "node[class$=ListView] node").len(),
            2
        );
        assert_eq!(
            texts(&tree, "hierarchy > node > node > node[class$=Button]"),
            vec!["android.widget.Button"]
        );
    }

    #[test]
    fn test_descendant_backtracks_through_ancestors() {
        // The ListView matches `node` but its parent is not `hierarchy`; the
        // FrameLayout further up has to be tried next.
        let tree = tree();
        assert_eq!(texts(&tree, "hierarchy > node node[class$=Button]").len(), 1);
    }

    #[test]
    fn test_selector_list_keeps_document_order() {
        let tree = tree();
        assert_eq!(
            texts(&tree, "node[class$=Button], node[class$=ListView]"),
            vec!["android.widget.ListView", "android.widget.Button"]
        );
    }

    #[test]
    fn test_universal_selector() {
        let tree = tree();
        assert_eq!(Selector::parse("*").unwrap().select(&tree).len(), tree.len());
    }

    #[test]
    fn test_escaped_quote_in_value() {
        let tree = Hierarchy::parse(r#"<hierarchy><node text='say "hi"' /></hierarchy>"#).unwrap();
        let selector = Selector::parse(r#"node[text="say \"hi\""]"#).unwrap();
        assert_eq!(selector.select(&tree).len(), 1);
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in [
            "",
            "   ",
            "node[",
            "node[text",
            "node[text=",
            "node[text=\"x",
            "node[text=x",
            "node[text!=x]",
            "node >",
            "node,",
            "> node",
            "node)",
        ] {
            match Selector::parse(bad) {
                Err(AutomatorError::InvalidSelector { selector, reason }) => {
                    assert_eq!(selector, bad);
                    assert!(!reason.is_empty());
                }
                other => panic!("expected InvalidSelector for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_display_round_trips_source() {
        let src = r#"node[text="Settings"]"#;
        let selector: Selector = src.parse().unwrap();
        assert_eq!(selector.to_string(), src);
        assert_eq!(selector.as_str(), src);
    }
}
