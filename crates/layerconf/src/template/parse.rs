//! Parser for `${...}` placeholders.

use crate::TemplateError;

const OPEN: &str = "${";
const CLOSE: &str = "}";
const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

/// A parsed template piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Node<'a> {
    /// Text outside placeholders, copied verbatim.
    Text(&'a str),
    /// A string literal action, emitted as is.
    Literal(String),
    /// A `getenv` call with its `KEY[:default]` argument.
    Getenv(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
}

/// Parse `src` into nodes; nothing is rendered until the whole input parsed.
pub(super) fn parse<'a>(name: &str, src: &'a str) -> Result<Vec<Node<'a>>, TemplateError> {
    Parser { name, src, pos: 0 }.run()
}

struct Parser<'n, 'a> {
    name: &'n str,
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'_, 'a> {
    fn run(mut self) -> Result<Vec<Node<'a>>, TemplateError> {
        let mut nodes = Vec::new();
        let mut trim_next_text = false;
        while self.pos < self.src.len() {
            let rest = self.rest();
            let Some(offset) = rest.find(OPEN) else {
                push_text(&mut nodes, rest, trim_next_text, false);
                break;
            };
            let action_start = self.pos + offset;
            self.pos = action_start + OPEN.len();

            let trim_before = self.eat_trim_marker();
            push_text(&mut nodes, &rest[..offset], trim_next_text, trim_before);

            let (node, trim_after) = self.action(action_start)?;
            if let Some(node) = node {
                nodes.push(node);
            }
            trim_next_text = trim_after;
        }
        Ok(nodes)
    }

    /// Parse the inside of one action; `self.pos` is just past `${`.
    fn action(&mut self, start: usize) -> Result<(Option<Node<'a>>, bool), TemplateError> {
        self.skip_whitespace();
        if self.rest().starts_with(COMMENT_OPEN) {
            let Some(end) = self.rest().find(COMMENT_CLOSE) else {
                return Err(self.error_at(start, "unclosed comment"));
            };
            self.pos += end + COMMENT_CLOSE.len();
            let trim_after = self.close(start)?;
            return Ok((None, trim_after));
        }

        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_before_close();
            if let Some(trim_after) = self.try_close() {
                let node = self.command(start, tokens)?;
                return Ok((Some(node), trim_after));
            }
            let Some(c) = self.peek() else {
                return Err(self.error_at(start, "unclosed action"));
            };
            let token = match c {
                '"' => Token::Str(self.quoted()?),
                '`' => Token::Str(self.raw()?),
                c if c.is_alphabetic() || c == '_' => Token::Ident(self.ident()),
                c => {
                    return Err(
                        self.error_at(self.pos, &format!("unexpected {c:?} in placeholder"))
                    );
                }
            };
            tokens.push(token);
        }
    }

    /// Turn the tokens of one action into a node.
    fn command(&self, start: usize, tokens: Vec<Token>) -> Result<Node<'a>, TemplateError> {
        let mut tokens = tokens.into_iter();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (None, _, _) => Err(self.error_at(start, "missing value for command")),
            (Some(Token::Str(value)), None, _) => Ok(Node::Literal(value)),
            (Some(Token::Str(_)), Some(_), _) => {
                Err(self.error_at(start, "can't give argument to non-function"))
            }
            (Some(Token::Ident(func)), arg, extra) if func == "getenv" => match (arg, extra) {
                (Some(Token::Str(spec)), None) => Ok(Node::Getenv(spec)),
                (Some(Token::Ident(ident)), None) => Err(self.error_at(
                    start,
                    &format!("getenv argument must be a string literal, got {ident}"),
                )),
                (arg, extra) => {
                    let got =
                        usize::from(arg.is_some()) + usize::from(extra.is_some()) + tokens.len();
                    Err(self.error_at(
                        start,
                        &format!("wrong number of args for getenv: want 1 got {got}"),
                    ))
                }
            },
            (Some(Token::Ident(func)), _, _) => {
                Err(self.error_at(start, &format!("function {func:?} not defined")))
            }
        }
    }

    /// Consume the closing delimiter after a comment.
    fn close(&mut self, start: usize) -> Result<bool, TemplateError> {
        self.skip_whitespace_before_close();
        match self.try_close() {
            Some(trim_after) => Ok(trim_after),
            None if self.peek().is_none() => Err(self.error_at(start, "unclosed action")),
            None => Err(self.error_at(self.pos, "comment ends before closing delimiter")),
        }
    }

    /// Consume `}` or ` -}`; returns whether trailing whitespace is trimmed.
    fn try_close(&mut self) -> Option<bool> {
        let rest = self.rest();
        if rest.starts_with(CLOSE) {
            self.pos += CLOSE.len();
            return Some(false);
        }
        let trimmed = rest.trim_start();
        let marker_at = rest.len() - trimmed.len();
        if marker_at > 0 && trimmed.starts_with('-') && trimmed[1..].starts_with(CLOSE) {
            self.pos += marker_at + 1 + CLOSE.len();
            return Some(true);
        }
        None
    }

    /// Consume a `- ` trim marker right after the opening delimiter.
    fn eat_trim_marker(&mut self) -> bool {
        let rest = self.rest();
        let mut chars = rest.chars();
        if chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn quoted(&mut self) -> Result<String, TemplateError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error_at(start, "unterminated quoted string"));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(value),
                '\n' => return Err(self.error_at(start, "unterminated quoted string")),
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(self.error_at(start, "unterminated quoted string"));
                    };
                    self.pos += escaped.len_utf8();
                    value.push(match escaped {
                        '"' => '"',
                        '\\' => '\\',
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => {
                            return Err(self.error_at(
                                self.pos,
                                &format!("unknown escape sequence \\{other}"),
                            ));
                        }
                    });
                }
                c => value.push(c),
            }
        }
    }

    fn raw(&mut self) -> Result<String, TemplateError> {
        let start = self.pos;
        self.pos += 1;
        let Some(end) = self.rest().find('`') else {
            return Err(self.error_at(start, "unterminated raw quoted string"));
        };
        let value = self.rest()[..end].to_string();
        self.pos += end + 1;
        Ok(value)
    }

    fn ident(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_string()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Skip whitespace unless it introduces a ` -}` close marker.
    fn skip_whitespace_before_close(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        if trimmed.starts_with('-') && trimmed[1..].starts_with(CLOSE) {
            return;
        }
        self.pos += rest.len() - trimmed.len();
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error_at(&self, pos: usize, message: &str) -> TemplateError {
        let line = self.src[..pos.min(self.src.len())].matches('\n').count() + 1;
        TemplateError::Parse {
            name: self.name.to_string(),
            line,
            message: message.to_string(),
        }
    }
}

fn push_text<'a>(nodes: &mut Vec<Node<'a>>, text: &'a str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };
    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(src: &str) -> String {
        match parse("config", src).unwrap_err() {
            TemplateError::Parse { message, .. } => message,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn splits_text_and_actions() {
        let nodes = parse("config", "port: ${getenv \"PORT:80\"}\nhost: ${ `h` }").expect("parse");
        assert_eq!(
            nodes,
            vec![
                Node::Text("port: "),
                Node::Getenv("PORT:80".to_string()),
                Node::Text("\nhost: "),
                Node::Literal("h".to_string()),
            ]
        );
    }

    #[test]
    fn yaml_braces_are_plain_text() {
        let nodes = parse("config", "server: {port: 1}\nlist: [a, b]").expect("parse");
        assert_eq!(nodes, vec![Node::Text("server: {port: 1}\nlist: [a, b]")]);
    }

    #[test]
    fn closing_brace_inside_string_does_not_end_action() {
        let nodes = parse("config", "${\"}\"}").expect("parse");
        assert_eq!(nodes, vec![Node::Literal("}".to_string())]);
    }

    #[test]
    fn trim_markers_drop_adjacent_whitespace() {
        let nodes = parse("config", "a:   ${- \"x\" -}   \nb").expect("parse");
        assert_eq!(
            nodes,
            vec![Node::Text("a:"), Node::Literal("x".to_string()), Node::Text("b")]
        );
    }

    #[test]
    fn comments_emit_nothing() {
        let nodes = parse("config", "a${/* note } */}b").expect("parse");
        assert_eq!(nodes, vec![Node::Text("a"), Node::Text("b")]);
    }

    #[test]
    fn reports_malformed_actions() {
        assert_eq!(message("x: ${ // }"), "unexpected '/' in placeholder");
        assert_eq!(message("x: ${}"), "missing value for command");
        assert_eq!(message("x: ${getenv \"A:b}"), "unterminated quoted string");
        assert_eq!(message("x: ${getenv \"A\""), "unclosed action");
        assert_eq!(message("x: ${env \"A\"}"), "function \"env\" not defined");
        assert_eq!(
            message("x: ${getenv}"),
            "wrong number of args for getenv: want 1 got 0"
        );
        assert_eq!(
            message("x: ${getenv \"A\" \"B\"}"),
            "wrong number of args for getenv: want 1 got 2"
        );
        assert_eq!(message("x: ${\"a\" \"b\"}"), "can't give argument to non-function");
        assert_eq!(message("x: ${/* open"), "unclosed comment");
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = parse("base", "a: 1\nb: 2\nc: ${nope}").unwrap_err();
        assert_eq!(err.to_string(), "template: base:3: function \"nope\" not defined");
    }
}
