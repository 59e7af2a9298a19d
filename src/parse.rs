use crate::{
    fraction::{ArithmeticError, Fraction, ParseFractionError},
    Equation,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    iter::Peekable,
    ops::Range,
};

/// Parse an [`Equation`] from some text (e.g. `"x + 2y - 1/2z = 3"`).
pub fn parse_equation(s: &str) -> Result<Equation, ParseError> {
    Parser::new(s).parse()
}

/// A simple recursive descent parser (`LL(1)`) for linear equations.
///
/// The grammar:
///
/// ```text
/// equation    := side "=" side
///
/// side        := term "+" side
///              | term "-" side
///              | term
///
/// term        := "-" term
///              | coefficient "*"? IDENTIFIER
///              | coefficient
///              | IDENTIFIER
///
/// coefficient := NUMBER "/" NUMBER
///              | NUMBER
/// ```
///
/// Variables and constants may appear on either side. Variables are moved
/// to the left and constants to the right, so `2x + 1 = x + 3` parses as
/// `x = 2`.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    tokens: Peekable<Tokens<'a>>,
    equation: Equation,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Side {
    Left,
    Right,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser {
            tokens: Tokens::new(src).peekable(),
            equation: Equation::default(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Equation, ParseError> {
        self.side(Side::Left)?;

        match self.tokens.next() {
            Some(Ok(Token {
                kind: TokenKind::Equals,
                ..
            })) => {},
            Some(Ok(token)) => {
                return Err(ParseError::UnexpectedToken {
                    found: token.kind,
                    span: token.span,
                    expected: &[TokenKind::Equals, TokenKind::Plus, TokenKind::Minus],
                })
            },
            Some(Err(e)) => return Err(e),
            None => return Err(ParseError::MissingEquals),
        }

        self.side(Side::Right)?;

        match self.tokens.next() {
            None => {
                let mut equation = self.equation;
                equation.try_simplify()?;
                Ok(equation)
            },
            Some(Ok(token)) => Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[TokenKind::Plus, TokenKind::Minus],
            }),
            Some(Err(e)) => Err(e),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn side(&mut self, side: Side) -> Result<(), ParseError> {
        self.term(side, Fraction::ONE)?;

        loop {
            let sign = match self.peek() {
                Some(TokenKind::Plus) => Fraction::ONE,
                Some(TokenKind::Minus) => -Fraction::ONE,
                _ => return Ok(()),
            };

            // skip past the operator
            let _ = self.advance()?;
            self.term(side, sign)?;
        }
    }

    fn term(&mut self, side: Side, sign: Fraction) -> Result<(), ParseError> {
        match self.peek() {
            Some(TokenKind::Minus) => {
                let _ = self.advance()?;
                self.term(side, -sign)
            },
            Some(TokenKind::Number) => {
                let coefficient = self.coefficient()?;

                if self.peek() == Some(TokenKind::Times) {
                    let _ = self.advance()?;
                    let ident = self.identifier()?;
                    return self.record(side, Some(ident.text), sign * coefficient);
                }

                if self.peek() == Some(TokenKind::Identifier) {
                    let ident = self.advance()?;
                    self.record(side, Some(ident.text), sign * coefficient)
                } else {
                    self.record(side, None, sign * coefficient)
                }
            },
            Some(TokenKind::Identifier) => {
                let ident = self.advance()?;
                self.record(side, Some(ident.text), sign)
            },
            _ => self.unexpected(&[
                TokenKind::Number,
                TokenKind::Identifier,
                TokenKind::Minus,
            ]),
        }
    }

    /// Add a term to the equation being built, moving it to the correct side.
    fn record(
        &mut self,
        side: Side,
        variable: Option<&str>,
        value: Fraction,
    ) -> Result<(), ParseError> {
        let value = match (side, variable.is_some()) {
            (Side::Left, true) | (Side::Right, false) => value,
            (Side::Left, false) | (Side::Right, true) => value.checked_neg()?,
        };

        match variable {
            Some(name) => {
                let updated = self.equation[name].checked_add(value)?;
                self.equation[name] = updated;
            },
            None => {
                let updated = self.equation.constant().checked_add(value)?;
                self.equation.set_constant(updated);
            },
        }

        Ok(())
    }

    fn coefficient(&mut self) -> Result<Fraction, ParseError> {
        let numerator = self.integer()?;

        if self.peek() != Some(TokenKind::Slash) {
            return Ok(Fraction::from_integer(numerator.0));
        }

        let _ = self.advance()?;
        let (denominator, span) = self.integer()?;

        if denominator == 0 {
            return Err(ParseError::InvalidNumber {
                span,
                error: ParseFractionError::ZeroDenominator,
            });
        }

        Fraction::new(numerator.0, denominator)
            .try_simplify()
            .map_err(ParseError::from)
    }

    fn integer(&mut self) -> Result<(i64, Range<usize>), ParseError> {
        let token = self.advance()?;

        if token.kind != TokenKind::Number {
            return Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[TokenKind::Number],
            });
        }

        // the lexer guarantees only digits, so this can only overflow
        match token.text.parse() {
            Ok(value) => Ok((value, token.span)),
            Err(_) => Err(ParseError::InvalidNumber {
                span: token.span,
                error: ParseFractionError::Overflow,
            }),
        }
    }

    fn identifier(&mut self) -> Result<Token<'a>, ParseError> {
        let token = self.advance()?;

        if token.kind == TokenKind::Identifier {
            Ok(token)
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[TokenKind::Identifier],
            })
        }
    }

    fn unexpected<T>(
        &mut self,
        expected: &'static [TokenKind],
    ) -> Result<T, ParseError> {
        match self.tokens.next() {
            Some(Ok(Token { span, kind, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidCharacter {
        character: char,
        index: usize,
    },
    UnexpectedEndOfInput,
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    /// The text only contained one side of an equation.
    MissingEquals,
    InvalidNumber {
        span: Range<usize>,
        error: ParseFractionError,
    },
    /// Collecting like terms overflowed.
    Arithmetic(ArithmeticError),
}

impl From<ArithmeticError> for ParseError {
    fn from(e: ArithmeticError) -> Self { ParseError::Arithmetic(e) }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidCharacter { character, index } => write!(
                f,
                "Invalid character, {:?}, at index {}",
                character, index
            ),
            ParseError::UnexpectedEndOfInput => {
                write!(f, "Unexpected end of input")
            },
            ParseError::UnexpectedToken {
                found,
                span,
                expected,
            } => {
                write!(f, "Found a {} at {:?} but expected ", found, span)?;

                for (i, kind) in expected.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{}", kind)?;
                }

                Ok(())
            },
            ParseError::MissingEquals => {
                write!(f, "An equation needs an \"=\"")
            },
            ParseError::InvalidNumber { span, .. } => {
                write!(f, "Invalid number at {:?}", span)
            },
            ParseError::Arithmetic(_) => {
                write!(f, "Unable to collect like terms")
            },
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::InvalidNumber { error, .. } => Some(error),
            ParseError::Arithmetic(inner) => Some(inner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self { Tokens { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(
        &mut self,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        Some(Ok(Token::from_text(self.src, start..end, kind)))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> Range<usize>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        start..self.cursor
    }

    fn chomp_number(&mut self) -> Token<'a> {
        let span = self.take_while(|c| c.is_ascii_digit());
        Token::from_text(self.src, span, TokenKind::Number)
    }

    fn chomp_identifier(&mut self) -> Token<'a> {
        let mut seen_first_character = false;

        let span = self.take_while(|c| {
            if seen_first_character {
                c.is_alphanumeric() || c == '_'
            } else {
                seen_first_character = true;
                c.is_alphabetic() || c == '_'
            }
        });

        Token::from_text(self.src, span, TokenKind::Identifier)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '+' => self.chomp(TokenKind::Plus),
                '-' => self.chomp(TokenKind::Minus),
                '*' => self.chomp(TokenKind::Times),
                '/' => self.chomp(TokenKind::Slash),
                '=' => self.chomp(TokenKind::Equals),
                '_' | 'a'..='z' | 'A'..='Z' => {
                    Some(Ok(self.chomp_identifier()))
                },
                '0'..='9' => Some(Ok(self.chomp_number())),
                other => Some(Err(ParseError::InvalidCharacter {
                    character: other,
                    index: self.cursor,
                })),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`Equation`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    Plus,
    Minus,
    Times,
    Slash,
    Equals,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "variable"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Plus => write!(f, "\"+\""),
            TokenKind::Minus => write!(f, "\"-\""),
            TokenKind::Times => write!(f, "\"*\""),
            TokenKind::Slash => write!(f, "\"/\""),
            TokenKind::Equals => write!(f, "\"=\""),
        }
    }
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    macro_rules! tokenize_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let mut tokens = Tokens::new($src);

                let got = tokens.next().unwrap().unwrap();

                let Range { start, end } = got.span;
                assert_eq!(start, 0);
                assert_eq!(end, $src.len());
                assert_eq!(got.kind, $should_be);

                assert!(
                    tokens.next().is_none(),
                    "{:?} should be empty",
                    tokens
                );
            }
        };
    }

    tokenize_test!(plus, "+", TokenKind::Plus);
    tokenize_test!(minus, "-", TokenKind::Minus);
    tokenize_test!(times, "*", TokenKind::Times);
    tokenize_test!(slash, "/", TokenKind::Slash);
    tokenize_test!(equals, "=", TokenKind::Equals);
    tokenize_test!(single_digit_integer, "3", TokenKind::Number);
    tokenize_test!(multi_digit_integer, "31", TokenKind::Number);
    tokenize_test!(simple_identifier, "x", TokenKind::Identifier);
    tokenize_test!(longer_identifier, "hello", TokenKind::Identifier);
    tokenize_test!(
        identifiers_can_have_underscores,
        "hello_world",
        TokenKind::Identifier
    );
    tokenize_test!(
        identifiers_can_start_with_underscores,
        "_hello_world",
        TokenKind::Identifier
    );
    tokenize_test!(
        identifiers_can_contain_numbers,
        "var5",
        TokenKind::Identifier
    );

    #[test]
    fn a_coefficient_next_to_a_variable_is_two_tokens() {
        let kinds: Vec<_> = Tokens::new("2y")
            .map(|tok| tok.unwrap().kind)
            .collect();

        assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Identifier]);
    }

    #[test]
    fn decimals_are_invalid() {
        let got: Result<Vec<_>, _> = Tokens::new("3.5").collect();

        assert_eq!(
            got.unwrap_err(),
            ParseError::InvalidCharacter {
                character: '.',
                index: 1
            }
        );
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    macro_rules! parser_test {
        ($name:ident, $src:expr) => {
            parser_test!($name, $src, $src);
        };
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = Parser::new($src).parse().unwrap();

                let round_tripped = got.to_string();
                assert_eq!(round_tripped, $should_be);
            }
        };
    }

    parser_test!(single_variable, "x = 5");
    parser_test!(three_variables, "x + 2y + 4z = 3");
    parser_test!(negative_terms, "3x - y + 3z = 4");
    parser_test!(leading_negative, "-x - 3y = -2");
    parser_test!(fractions, "-3/2a + 1/2b = 1/3");
    parser_test!(explicit_multiplication, "2*x + 3 * y = 1", "2x + 3y = 1");
    parser_test!(no_whitespace, "x+y=2", "x + y = 2");
    parser_test!(constants_on_the_left, "x + y - 3 = 0", "x + y = 3");
    parser_test!(variables_on_the_right, "2x + 1 = x + 3", "x = 2");
    parser_test!(like_terms_are_collected, "x + y + x = 4", "2x + y = 4");
    parser_test!(single_variable_is_normalised, "4x = 2", "x = 1/2");
    parser_test!(double_negative, "--x + y = 1", "x + y = 1");
    parser_test!(no_variables_left, "x - x = 0", "0 = 0");
    parser_test!(fraction_folds, "6/8x + y = 3", "3/4x + y = 3");

    #[test]
    fn parse_into_terms() {
        let got: Equation = "x + 2y + 4z = 3".parse().unwrap();

        assert_eq!(got, Equation::new(vec![("x", 1), ("y", 2), ("z", 4)], 3));
    }

    #[test]
    fn missing_equals() {
        let got = parse_equation("x + y");

        assert_eq!(got, Err(ParseError::MissingEquals));
    }

    #[test]
    fn two_equals_signs() {
        let got = parse_equation("x = y = 1").unwrap_err();

        match got {
            ParseError::UnexpectedToken { found, span, .. } => {
                assert_eq!(found, TokenKind::Equals);
                assert_eq!(span, 6..7);
            },
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_right_hand_side() {
        let got = parse_equation("x + y =");

        assert_eq!(got, Err(ParseError::UnexpectedEndOfInput));
    }

    #[test]
    fn zero_denominator() {
        let got = parse_equation("1/0x = 1");

        assert_eq!(
            got,
            Err(ParseError::InvalidNumber {
                span: 2..3,
                error: ParseFractionError::ZeroDenominator,
            })
        );
    }

    #[test]
    fn numbers_that_are_too_big() {
        let got = parse_equation("99999999999999999999x = 1");

        assert_eq!(
            got,
            Err(ParseError::InvalidNumber {
                span: 0..20,
                error: ParseFractionError::Overflow,
            })
        );
    }

    #[test]
    fn solving_for_a_single_variable_can_overflow() {
        let got = parse_equation("-x = -9223372036854775807 - 1");

        assert_eq!(got, Err(ParseError::Arithmetic(ArithmeticError::Overflow)));
    }

    #[test]
    fn multiplication_needs_a_variable() {
        let got = parse_equation("2 * 3 = x").unwrap_err();

        match got {
            ParseError::UnexpectedToken {
                found, expected, ..
            } => {
                assert_eq!(found, TokenKind::Number);
                assert_eq!(expected, &[TokenKind::Identifier]);
            },
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
