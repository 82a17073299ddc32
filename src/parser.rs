use crate::error::{CfgError, ParserError};
use crate::lexer::{Lexer, Token, TokenType};
use crate::node::ConfigNode;
use miette::NamedSource;
use std::sync::Arc;

/// Name given to the node that holds the top level of a document.
pub const ROOT_NODE_NAME: &str = "root";

/// A recursive descent parser for the ConfigNode text format.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.cfg".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));
        let mut lexer = Lexer::new(source_text);
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        Self {
            source,
            tokens,
            position: 0,
            source_text,
        }
    }

    // === Main Parsing Methods ===

    ///    Document ::= { Entry | Newline } Eof
    pub fn parse_document(&mut self) -> Result<ConfigNode, CfgError> {
        let mut root = ConfigNode::new(ROOT_NODE_NAME);
        self.parse_body(&mut root, None)?;
        Ok(root)
    }

    /// Body ::= { Entry | Newline }
    ///
    /// `open` is the brace token that opened the node, or `None` at the top level.
    fn parse_body(&mut self, node: &mut ConfigNode, open: Option<&Token>) -> Result<(), CfgError> {
        loop {
            let token = self.current_token()?.clone();
            match token.ttype {
                TokenType::Newline => self.advance(),
                TokenType::Text(_) => self.parse_entry(node)?,
                TokenType::RBrace => {
                    if open.is_some() {
                        self.advance();
                        return Ok(());
                    }
                    return Err(ParserError::UnmatchedBrace {
                        src: (*self.source).clone(),
                        span: (token.pos_start, token.pos_end - token.pos_start).into(),
                    }
                    .into());
                }
                TokenType::Eof => {
                    return match open {
                        None => Ok(()),
                        Some(brace) => Err(ParserError::UnclosedNode {
                            src: (*self.source).clone(),
                            span: (brace.pos_start, brace.pos_end - brace.pos_start).into(),
                            name: node.name().to_string(),
                        }
                        .into()),
                    };
                }
                _ => return self.err_unexpected("a key or node name"),
            }
        }
    }

    /// Entry ::= Key ( "=" ValueText | { Newline } "{" Body "}" )
    fn parse_entry(&mut self, node: &mut ConfigNode) -> Result<(), CfgError> {
        let key = self.parse_text_run(|t| matches!(t, TokenType::Text(_)));

        if self.match_token(TokenType::Equals) {
            // ValueText runs to the end of the line; it may itself contain '='.
            let value =
                self.parse_text_run(|t| matches!(t, TokenType::Text(_) | TokenType::Equals));
            node.add_value(key, value);
            return Ok(());
        }

        while self.match_token(TokenType::Newline) {}

        if self.check(TokenType::LBrace) {
            let open = self.current_token()?.clone();
            self.advance();
            let mut child = ConfigNode::new(key);
            self.parse_body(&mut child, Some(&open))?;
            node.add_node(child);
            Ok(())
        } else {
            self.err_unexpected("'=' or '{' after key")
        }
    }

    /// Consumes tokens while `accept` holds and returns the source text they cover.
    ///
    /// Working from the source slice keeps the whitespace between tokens intact.
    fn parse_text_run(&mut self, accept: impl Fn(&TokenType) -> bool) -> String {
        let mut span: Option<(usize, usize)> = None;
        while let Some(token) = self.tokens.get(self.position) {
            if !accept(&token.ttype) {
                break;
            }
            span = Some(match span {
                Some((start, _)) => (start, token.pos_end),
                None => (token.pos_start, token.pos_end),
            });
            self.advance();
        }
        span.map(|(start, end)| self.source_text[start..end].trim().to_string())
            .unwrap_or_default()
    }

    // === Tokenizer Helper Methods ===

    fn current_token(&self) -> Result<&Token, CfgError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len().saturating_sub(1);
            ParserError::UnexpectedEof {
                src: (*self.source).clone(),
                span: (pos, 0).into(),
            }
            .into()
        })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, CfgError> {
        let token = self.current_token()?;
        if token.ttype == TokenType::Eof {
            return Err(ParserError::UnexpectedEof {
                src: (*self.source).clone(),
                span: (token.pos_start, 0).into(),
            }
            .into());
        }
        Err(ParserError::UnexpectedToken {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            expected: expected.to_string(),
        }
        .into())
    }
}
