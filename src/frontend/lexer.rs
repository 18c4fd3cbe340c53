use super::ast::Span;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    IntLit(String),
    FloatLit(String),
    StringLit(String),
    CharLit(char),
    Unknown(char),
    Keyword(Keyword),
    Symbol(Symbol),
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Keyword {
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Symbol {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    ColonEq,
    Dot,
    Ellipsis,
    Eq,
    EqEq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Bang,
    Amp,
    AmpAmp,
    AmpCaret,
    Pipe,
    PipePipe,
    Caret,
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Arrow,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AmpCaretEq,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A source comment, kept out of the token stream but retained for the
/// driver's `//nolint` handling. `text` excludes the comment markers.
#[derive(Clone, Debug)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

pub struct Lexer<'a> {
    bytes: &'a [u8],
    idx: usize,
    line: usize,
    col: usize,
    prev_can_insert_semi: bool,
    pending_semi: bool,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            idx: 0,
            line: 1,
            col: 1,
            prev_can_insert_semi: false,
            pending_semi: false,
            comments: Vec::new(),
        }
    }

    pub fn lex_all(mut self) -> (Vec<Token>, Vec<Comment>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.comments)
    }

    fn next_token(&mut self) -> Token {
        if self.pending_semi {
            self.pending_semi = false;
            return self.synthetic_semi();
        }
        self.skip_whitespace_and_comments();
        if self.pending_semi {
            self.pending_semi = false;
            return self.synthetic_semi();
        }
        let start = self.idx;
        let (line, column) = (self.line, self.col);
        if self.idx >= self.bytes.len() {
            // Go terminates the final token line with an implied newline.
            if self.prev_can_insert_semi {
                self.prev_can_insert_semi = false;
                return self.synthetic_semi();
            }
            return Token {
                kind: TokenKind::Eof,
                span: Span {
                    start,
                    end: start,
                    line,
                    column,
                },
            };
        }
        let ch = self.peek_char();
        if is_ident_start(ch) {
            let ident = self.read_while(is_ident_continue);
            let kind = match ident.as_str() {
                "break" => TokenKind::Keyword(Keyword::Break),
                "case" => TokenKind::Keyword(Keyword::Case),
                "chan" => TokenKind::Keyword(Keyword::Chan),
                "const" => TokenKind::Keyword(Keyword::Const),
                "continue" => TokenKind::Keyword(Keyword::Continue),
                "default" => TokenKind::Keyword(Keyword::Default),
                "defer" => TokenKind::Keyword(Keyword::Defer),
                "else" => TokenKind::Keyword(Keyword::Else),
                "fallthrough" => TokenKind::Keyword(Keyword::Fallthrough),
                "for" => TokenKind::Keyword(Keyword::For),
                "func" => TokenKind::Keyword(Keyword::Func),
                "go" => TokenKind::Keyword(Keyword::Go),
                "goto" => TokenKind::Keyword(Keyword::Goto),
                "if" => TokenKind::Keyword(Keyword::If),
                "import" => TokenKind::Keyword(Keyword::Import),
                "interface" => TokenKind::Keyword(Keyword::Interface),
                "map" => TokenKind::Keyword(Keyword::Map),
                "package" => TokenKind::Keyword(Keyword::Package),
                "range" => TokenKind::Keyword(Keyword::Range),
                "return" => TokenKind::Keyword(Keyword::Return),
                "select" => TokenKind::Keyword(Keyword::Select),
                "struct" => TokenKind::Keyword(Keyword::Struct),
                "switch" => TokenKind::Keyword(Keyword::Switch),
                "type" => TokenKind::Keyword(Keyword::Type),
                "var" => TokenKind::Keyword(Keyword::Var),
                _ => TokenKind::Ident(ident),
            };
            let end = self.idx;
            self.prev_can_insert_semi = can_insert_semi_after(&kind);
            return Token {
                kind,
                span: Span {
                    start,
                    end,
                    line,
                    column,
                },
            };
        }
        if ch.is_ascii_digit() {
            let number = self.read_number();
            let kind = if number.contains('.') {
                TokenKind::FloatLit(number)
            } else {
                TokenKind::IntLit(number)
            };
            let end = self.idx;
            self.prev_can_insert_semi = can_insert_semi_after(&kind);
            return Token {
                kind,
                span: Span {
                    start,
                    end,
                    line,
                    column,
                },
            };
        }
        let kind = match ch {
            '"' => {
                let s = self.read_string();
                TokenKind::StringLit(s)
            }
            '`' => {
                let s = self.read_raw_string();
                TokenKind::StringLit(s)
            }
            '\'' => {
                let c = self.read_char_lit();
                TokenKind::CharLit(c)
            }
            '(' => {
                self.advance();
                TokenKind::Symbol(Symbol::LParen)
            }
            ')' => {
                self.advance();
                TokenKind::Symbol(Symbol::RParen)
            }
            '{' => {
                self.advance();
                TokenKind::Symbol(Symbol::LBrace)
            }
            '}' => {
                self.advance();
                TokenKind::Symbol(Symbol::RBrace)
            }
            '[' => {
                self.advance();
                TokenKind::Symbol(Symbol::LBracket)
            }
            ']' => {
                self.advance();
                TokenKind::Symbol(Symbol::RBracket)
            }
            ',' => {
                self.advance();
                TokenKind::Symbol(Symbol::Comma)
            }
            ';' => {
                self.advance();
                TokenKind::Symbol(Symbol::Semi)
            }
            ':' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::ColonEq)
                } else {
                    TokenKind::Symbol(Symbol::Colon)
                }
            }
            '.' => {
                self.advance();
                if self.peek_char() == '.' && self.peek_next_char() == '.' {
                    self.advance();
                    self.advance();
                    TokenKind::Symbol(Symbol::Ellipsis)
                } else {
                    TokenKind::Symbol(Symbol::Dot)
                }
            }
            '=' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::EqEq)
                } else {
                    TokenKind::Symbol(Symbol::Eq)
                }
            }
            '!' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::NotEq)
                } else {
                    TokenKind::Symbol(Symbol::Bang)
                }
            }
            '<' => {
                self.advance();
                match self.peek_char() {
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::Lte)
                    }
                    '-' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::Arrow)
                    }
                    '<' => {
                        self.advance();
                        if self.peek_char() == '=' {
                            self.advance();
                            TokenKind::Symbol(Symbol::ShlEq)
                        } else {
                            TokenKind::Symbol(Symbol::Shl)
                        }
                    }
                    _ => TokenKind::Symbol(Symbol::Lt),
                }
            }
            '>' => {
                self.advance();
                match self.peek_char() {
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::Gte)
                    }
                    '>' => {
                        self.advance();
                        if self.peek_char() == '=' {
                            self.advance();
                            TokenKind::Symbol(Symbol::ShrEq)
                        } else {
                            TokenKind::Symbol(Symbol::Shr)
                        }
                    }
                    _ => TokenKind::Symbol(Symbol::Gt),
                }
            }
            '&' => {
                self.advance();
                match self.peek_char() {
                    '&' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::AmpAmp)
                    }
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::AmpEq)
                    }
                    '^' => {
                        self.advance();
                        if self.peek_char() == '=' {
                            self.advance();
                            TokenKind::Symbol(Symbol::AmpCaretEq)
                        } else {
                            TokenKind::Symbol(Symbol::AmpCaret)
                        }
                    }
                    _ => TokenKind::Symbol(Symbol::Amp),
                }
            }
            '|' => {
                self.advance();
                match self.peek_char() {
                    '|' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::PipePipe)
                    }
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::PipeEq)
                    }
                    _ => TokenKind::Symbol(Symbol::Pipe),
                }
            }
            '^' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::CaretEq)
                } else {
                    TokenKind::Symbol(Symbol::Caret)
                }
            }
            '+' => {
                self.advance();
                match self.peek_char() {
                    '+' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::PlusPlus)
                    }
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::PlusEq)
                    }
                    _ => TokenKind::Symbol(Symbol::Plus),
                }
            }
            '-' => {
                self.advance();
                match self.peek_char() {
                    '-' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::MinusMinus)
                    }
                    '=' => {
                        self.advance();
                        TokenKind::Symbol(Symbol::MinusEq)
                    }
                    _ => TokenKind::Symbol(Symbol::Minus),
                }
            }
            '*' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::StarEq)
                } else {
                    TokenKind::Symbol(Symbol::Star)
                }
            }
            '/' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::SlashEq)
                } else {
                    TokenKind::Symbol(Symbol::Slash)
                }
            }
            '%' => {
                self.advance();
                if self.peek_char() == '=' {
                    self.advance();
                    TokenKind::Symbol(Symbol::PercentEq)
                } else {
                    TokenKind::Symbol(Symbol::Percent)
                }
            }
            _ => {
                self.advance();
                TokenKind::Unknown(ch)
            }
        };
        let end = self.idx;
        self.prev_can_insert_semi = can_insert_semi_after(&kind);
        Token {
            kind,
            span: Span {
                start,
                end,
                line,
                column,
            },
        }
    }

    fn synthetic_semi(&self) -> Token {
        Token {
            kind: TokenKind::Symbol(Symbol::Semi),
            span: Span {
                start: self.idx,
                end: self.idx,
                line: self.line,
                column: self.col,
            },
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.idx >= self.bytes.len() {
                return;
            }
            let ch = self.peek_char();
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    if self.prev_can_insert_semi {
                        self.prev_can_insert_semi = false;
                        self.pending_semi = true;
                        return;
                    }
                }
                '/' if self.peek_next_char() == '/' => {
                    let start = self.idx;
                    let (line, column) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    let mut text = String::new();
                    while self.idx < self.bytes.len() && self.peek_char() != '\n' {
                        text.push(self.peek_char());
                        self.advance();
                    }
                    self.comments.push(Comment {
                        text,
                        span: Span {
                            start,
                            end: self.idx,
                            line,
                            column,
                        },
                    });
                }
                '/' if self.peek_next_char() == '*' => {
                    let start = self.idx;
                    let (line, column) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    let mut text = String::new();
                    let mut crossed_newline = false;
                    while self.idx < self.bytes.len() {
                        if self.peek_char() == '*' && self.peek_next_char() == '/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.peek_char() == '\n' {
                            crossed_newline = true;
                        }
                        text.push(self.peek_char());
                        self.advance();
                    }
                    self.comments.push(Comment {
                        text,
                        span: Span {
                            start,
                            end: self.idx,
                            line,
                            column,
                        },
                    });
                    // A general comment containing newlines acts like one.
                    if crossed_newline && self.prev_can_insert_semi {
                        self.prev_can_insert_semi = false;
                        self.pending_semi = true;
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn read_string(&mut self) -> String {
        self.advance(); // opening quote
        let mut s = String::new();
        while self.idx < self.bytes.len() {
            let ch = self.peek_char();
            if ch == '"' {
                self.advance();
                break;
            }
            if ch == '\\' {
                self.advance();
                if self.idx >= self.bytes.len() {
                    break;
                }
                let esc = self.peek_char();
                self.advance();
                let actual = match esc {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    '0' => '\0',
                    _ => esc,
                };
                s.push(actual);
            } else {
                s.push(ch);
                self.advance();
            }
        }
        s
    }

    fn read_raw_string(&mut self) -> String {
        self.advance(); // opening backquote
        let mut s = String::new();
        while self.idx < self.bytes.len() {
            let ch = self.peek_char();
            if ch == '`' {
                self.advance();
                break;
            }
            s.push(ch);
            self.advance();
        }
        s
    }

    fn read_char_lit(&mut self) -> char {
        self.advance();
        let ch = if self.peek_char() == '\\' {
            self.advance();
            let esc = self.peek_char();
            self.advance();
            match esc {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '\\' => '\\',
                '"' => '"',
                '\'' => '\'',
                '0' => '\0',
                _ => esc,
            }
        } else {
            let c = self.peek_char();
            self.advance();
            c
        };
        if self.peek_char() == '\'' {
            self.advance();
        }
        ch
    }

    fn read_number(&mut self) -> String {
        let mut s = String::new();
        while self.idx < self.bytes.len() {
            let ch = self.peek_char();
            if ch.is_ascii_hexdigit() || ch == '.' || ch == 'x' || ch == 'X' || ch == '_' {
                if ch != '_' {
                    s.push(ch);
                }
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn read_while<F>(&mut self, f: F) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut s = String::new();
        while self.idx < self.bytes.len() {
            let ch = self.peek_char();
            if !f(ch) {
                break;
            }
            s.push(ch);
            self.advance();
        }
        s
    }

    fn advance(&mut self) {
        if self.idx >= self.bytes.len() {
            return;
        }
        let ch = self.peek_char();
        self.idx += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    fn peek_char(&self) -> char {
        self.bytes.get(self.idx).copied().unwrap_or(b'\0') as char
    }

    fn peek_next_char(&self) -> char {
        self.bytes.get(self.idx + 1).copied().unwrap_or(b'\0') as char
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Go's automatic semicolon insertion rule: a newline ends the statement
/// when the line's final token could end one.
fn can_insert_semi_after(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Ident(_) => true,
        TokenKind::IntLit(_) => true,
        TokenKind::FloatLit(_) => true,
        TokenKind::StringLit(_) => true,
        TokenKind::CharLit(_) => true,
        TokenKind::Keyword(Keyword::Break)
        | TokenKind::Keyword(Keyword::Continue)
        | TokenKind::Keyword(Keyword::Fallthrough)
        | TokenKind::Keyword(Keyword::Return) => true,
        TokenKind::Symbol(Symbol::PlusPlus)
        | TokenKind::Symbol(Symbol::MinusMinus)
        | TokenKind::Symbol(Symbol::RParen)
        | TokenKind::Symbol(Symbol::RBracket)
        | TokenKind::Symbol(Symbol::RBrace) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, _) = Lexer::new(src).lex_all();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_semi_after_ident_at_newline() {
        let ks = kinds("x\ny");
        assert_eq!(
            ks,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Symbol(Symbol::Semi),
                TokenKind::Ident("y".to_string()),
                TokenKind::Symbol(Symbol::Semi),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn no_semi_after_opening_brace() {
        let ks = kinds("func f() {\n}");
        assert!(ks.contains(&TokenKind::Keyword(Keyword::Func)));
        // `{` followed by newline must not produce a semicolon.
        let brace_at = ks
            .iter()
            .position(|k| *k == TokenKind::Symbol(Symbol::LBrace))
            .expect("lbrace");
        assert_ne!(ks[brace_at + 1], TokenKind::Symbol(Symbol::Semi));
    }

    #[test]
    fn inserted_semi_has_zero_width_span() {
        let (tokens, _) = Lexer::new("x\n").lex_all();
        let semi = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Symbol(Symbol::Semi))
            .expect("semi");
        assert_eq!(semi.span.start, semi.span.end);
    }

    #[test]
    fn lexes_define_and_arrow_tokens() {
        let ks = kinds("a := <-ch");
        assert_eq!(ks[1], TokenKind::Symbol(Symbol::ColonEq));
        assert_eq!(ks[2], TokenKind::Symbol(Symbol::Arrow));
    }

    #[test]
    fn collects_line_comments_with_positions() {
        let (_, comments) = Lexer::new("x = 1 //nolint:deferrlint\ny = 2\n").lex_all();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "nolint:deferrlint");
        assert_eq!(comments[0].span.line, 1);
    }

    #[test]
    fn semi_inserted_before_line_comment() {
        // The comment must not swallow the statement boundary.
        let ks = kinds("x = 1 // trailing\ny = 2");
        let eq_count = ks
            .iter()
            .filter(|k| **k == TokenKind::Symbol(Symbol::Semi))
            .count();
        assert!(eq_count >= 2);
    }

    #[test]
    fn raw_string_keeps_backslashes() {
        let ks = kinds("`a\\n`");
        assert_eq!(ks[0], TokenKind::StringLit("a\\n".to_string()));
    }

    #[test]
    fn ellipsis_and_dot() {
        let ks = kinds("a...b.c");
        assert_eq!(ks[1], TokenKind::Symbol(Symbol::Ellipsis));
        assert_eq!(ks[3], TokenKind::Symbol(Symbol::Dot));
    }
}
