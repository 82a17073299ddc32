/// Token kinds of the ConfigNode text format. The format is line oriented, so line
/// breaks are tokens of their own.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Structure ==
    /// End of input.
    Eof,
    /// A run of whitespace that does not contain a line break.
    Whitespace,
    /// A line break (`\n`, or `\r\n`).
    Newline,
    /// A comment, starting with `//` and continuing to the end of the line.
    /// The associated `String` contains the trimmed content of the comment.
    Comment(String),

    // == Text ==
    /// A run of characters that are neither whitespace nor punctuation.
    /// Keys, node names and the pieces of a value are all made of text tokens.
    Text(String),

    // == Punctuation ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Equals: `=` (separates a key from its value)
    Equals,
}

/// A token and the byte range it covers in the source.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the whole input. The last token is always [`TokenType::Eof`].
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.ttype == TokenType::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '=' => TokenType::Equals,
                '\n' => TokenType::Newline,
                '\r' if self.peek() == Some('\n') => {
                    self.advance();
                    TokenType::Newline
                }
                '/' if self.peek() == Some('/') => self.read_comment(),
                c if c.is_whitespace() => self.read_whitespace(),
                c => self.read_text(c),
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position)
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// True when the input at the current position starts a `//` comment.
    fn at_comment(&self) -> bool {
        self.input[self.position..].starts_with("//")
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() && c != '\n' && c != '\r' {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_comment(&mut self) -> TokenType {
        self.advance(); // Consume the second '/'
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.advance();
        }
        TokenType::Comment(self.input[start..self.position].trim().to_string())
    }

    fn read_text(&mut self, first_char: char) -> TokenType {
        let mut text = String::new();
        text.push(first_char);

        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '=') || self.at_comment() {
                break;
            }
            text.push(c);
            self.advance();
        }
        TokenType::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        // Filter out whitespace and comments for most tests
        let filtered_tokens: Vec<TokenType> = token_types
            .into_iter()
            .filter(|t| !matches!(t, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        assert_eq!(filtered_tokens, expected);
    }

    fn text(s: &str) -> TokenType {
        TokenType::Text(s.to_string())
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_punctuation() {
        assert_tokens(
            "{}=",
            vec![
                TokenType::LBrace,
                TokenType::RBrace,
                TokenType::Equals,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_key_value_line() {
        assert_tokens(
            "moduleID = fuelSwitch\n",
            vec![
                text("moduleID"),
                TokenType::Equals,
                text("fuelSwitch"),
                TokenType::Newline,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_text_keeps_inner_punctuation() {
        assert_tokens(
            "path = Parts/FuelTank/model.mu 1.5,-2",
            vec![
                text("path"),
                TokenType::Equals,
                text("Parts/FuelTank/model.mu"),
                text("1.5,-2"),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_crlf_is_single_newline() {
        assert_tokens(
            "a = 1\r\nb = 2",
            vec![
                text("a"),
                TokenType::Equals,
                text("1"),
                TokenType::Newline,
                text("b"),
                TokenType::Equals,
                text("2"),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_comment_ends_text() {
        let input = "key = value// trailing note\n";
        let mut lexer = Lexer::new(input);
        let token_types: Vec<TokenType> = lexer.lex().into_iter().map(|t| t.ttype).collect();

        let expected = vec![
            text("key"),
            TokenType::Whitespace,
            TokenType::Equals,
            TokenType::Whitespace,
            text("value"),
            TokenType::Comment("trailing note".to_string()),
            TokenType::Newline,
            TokenType::Eof,
        ];
        assert_eq!(token_types, expected);
    }

    #[test]
    fn test_single_slash_is_text() {
        assert_tokens("a/b", vec![text("a/b"), TokenType::Eof]);
    }

    #[test]
    fn test_token_positions_are_byte_offsets() {
        let mut lexer = Lexer::new("é = x");
        let tokens = lexer.lex();
        assert_eq!(tokens[0].pos_start, 0);
        assert_eq!(tokens[0].pos_end, 2);
        assert_eq!(tokens[2].ttype, TokenType::Equals);
        assert_eq!(tokens[2].pos_start, 3);
    }

    #[test]
    fn test_nested_node_structure() {
        let input = r#"
PART
{
    name = tank // the tank
    MODULE { name = ModuleB9PartSwitch }
}
"#;
        let expected = vec![
            TokenType::Newline,
            text("PART"),
            TokenType::Newline,
            TokenType::LBrace,
            TokenType::Newline,
            text("name"),
            TokenType::Equals,
            text("tank"),
            TokenType::Newline,
            text("MODULE"),
            TokenType::LBrace,
            text("name"),
            TokenType::Equals,
            text("ModuleB9PartSwitch"),
            TokenType::RBrace,
            TokenType::Newline,
            TokenType::RBrace,
            TokenType::Newline,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }
}
