use crate::directive::Directive;
use crate::error::MontunoError;

/// Token types for progression text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(8)`, `(15)`, `(10)` or `(13)`
    Directive(Directive),
    /// Any other whitespace-delimited word
    Chord(String),
}

/// A token with its position in the source
#[derive(Debug, Clone)]
pub struct LocatedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Lexer for progression text
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn check_metadata_marker(&self) -> bool {
        self.input[self.position..].starts_with("---")
    }

    /// Skip a `---` ... `---` front matter block. Only recognized before the
    /// first token.
    fn skip_front_matter(&mut self) {
        for _ in 0..3 {
            self.advance();
        }
        while self.peek().is_some() {
            if self.column == 1 && self.check_metadata_marker() {
                for _ in 0..3 {
                    self.advance();
                }
                break;
            }
            self.advance();
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<LocatedToken>, MontunoError> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }

            if tokens.is_empty() && self.check_metadata_marker() {
                self.skip_front_matter();
                continue;
            }

            let line = self.line;
            let column = self.column;
            let start = self.position;
            while let Some(&ch) = self.peek() {
                if ch.is_whitespace() {
                    break;
                }
                self.advance();
            }
            let word = &self.input[start..self.position];

            let token = if word.starts_with('(') {
                let directive = Directive::from_token(word).ok_or_else(|| {
                    MontunoError::MalformedToken {
                        line,
                        column,
                        token: word.to_string(),
                    }
                })?;
                Token::Directive(directive)
            } else {
                Token::Chord(word.to_string())
            };

            tokens.push(LocatedToken {
                token,
                line,
                column,
            });
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_chords_and_directives() {
        assert_eq!(
            token_types("Cmaj7 (8) G7 (10) Am7"),
            vec![
                Token::Chord("Cmaj7".to_string()),
                Token::Directive(Directive::Octaves),
                Token::Chord("G7".to_string()),
                Token::Directive(Directive::Tenths),
                Token::Chord("Am7".to_string()),
            ]
        );
    }

    #[test]
    fn test_mixed_whitespace() {
        assert_eq!(
            token_types("  C7\tF∆\n\n(15) (13)  G7(b9) "),
            vec![
                Token::Chord("C7".to_string()),
                Token::Chord("F∆".to_string()),
                Token::Directive(Directive::DoubleOctaves),
                Token::Directive(Directive::Thirteenths),
                Token::Chord("G7(b9)".to_string()),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("C7 F7\n  (8) G7");
        let tokens = lexer.tokenize().unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(positions, vec![(1, 1), (1, 4), (2, 3), (2, 7)]);
    }

    #[test]
    fn test_malformed_directive() {
        let mut lexer = Lexer::new("Cmaj7\n (9) G7");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(
            err,
            MontunoError::MalformedToken {
                line: 2,
                column: 2,
                token: "(9)".to_string(),
            }
        );
    }

    #[test]
    fn test_glued_directives_are_malformed() {
        let mut lexer = Lexer::new("(8)(10) C");
        assert!(matches!(
            lexer.tokenize(),
            Err(MontunoError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_front_matter_skipped() {
        let source = "---\nclave: 2-3\n---\nC7 F7";
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token, Token::Chord("C7".to_string()));
        assert_eq!((tokens[0].line, tokens[0].column), (4, 1));
    }

    #[test]
    fn test_empty_input() {
        assert!(token_types("  \n\t ").is_empty());
    }
}
