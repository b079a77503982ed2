use lox_interpreter as lox;

use lox::scanner::Scanner;
use lox::token::{Literal, Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn test_scanner_01_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_02_operators() {
    assert_token_sequence(
        "! != = == > >= < <= / //ignored",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::SLASH, "/"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_03_keywords_and_identifiers() {
    assert_token_sequence(
        "var language = nil; while fortune",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "language"),
            (TokenType::EQUAL, "="),
            (TokenType::NIL, "nil"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::WHILE, "while"),
            (TokenType::IDENTIFIER, "fortune"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_04_identifier_literal_is_its_name() {
    let tokens: Vec<Token> = Scanner::new("alpha _beta g4mm4")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].literal, Literal::Str("alpha".to_string()));
    assert_eq!(tokens[1].literal, Literal::Str("_beta".to_string()));
    assert_eq!(tokens[2].literal, Literal::Str("g4mm4".to_string()));
}

#[test]
fn test_scanner_05_numbers() {
    let tokens: Vec<Token> = Scanner::new("123 45.67 89.")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].literal, Literal::Number(123.0));
    assert_eq!(tokens[1].literal, Literal::Number(45.67));

    // A trailing '.' is not part of the number.
    assert_eq!(tokens[2].token_type, TokenType::NUMBER);
    assert_eq!(tokens[2].literal, Literal::Number(89.0));
    assert_eq!(tokens[3].token_type, TokenType::DOT);
    assert_eq!(tokens[4].token_type, TokenType::EOF);
}

#[test]
fn test_scanner_06_string_literal() {
    let tokens: Vec<Token> = Scanner::new("\"hello world\"")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].token_type, TokenType::STRING);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");
    assert_eq!(tokens[0].literal, Literal::Str("hello world".to_string()));
}

#[test]
fn test_scanner_07_multiline_string_advances_line() {
    let tokens: Vec<Token> = Scanner::new("\"one\ntwo\"\nident")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].token_type, TokenType::STRING);
    assert_eq!(tokens[0].literal, Literal::Str("one\ntwo".to_string()));

    // The string spans lines 1-2, so the identifier lands on line 3.
    assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
    assert_eq!(tokens[1].line, 3);
}

#[test]
fn test_scanner_08_unterminated_string() {
    let results: Vec<_> = Scanner::new("\"oops").collect();

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "Expected string closing quote \" but found none on line 1"
    );
}

#[test]
fn test_scanner_09_unexpected_chars_token_sequence() {
    let results: Vec<_> = Scanner::new(",.$(#").collect();

    // We expect this sequence:
    // 0: COMMA ','
    // 1: DOT '.'
    // 2: Error for '$'
    // 3: LEFT_PAREN '('
    // 4: Error for '#'
    // 5: EOF
    assert_eq!(results.len(), 6, "Expected 6 items in result");

    assert_token_matches(&results[0], TokenType::COMMA, ",");
    assert_token_matches(&results[1], TokenType::DOT, ".");
    assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
    assert_token_matches(&results[5], TokenType::EOF, "");

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 2, "Expected 2 error messages");
    assert_eq!(errors[0], "Unexpected character \"$\" on line 1");
    assert_eq!(errors[1], "Unexpected character \"#\" on line 1");

    fn assert_token_matches(
        result: &Result<Token, lox::error::LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(token.token_type, expected_type);
                assert_eq!(token.lexeme, expected_lexeme);
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }
}

#[test]
fn test_scanner_10_comments_and_line_numbers() {
    let tokens: Vec<Token> = Scanner::new("// nothing here\nprint 1;")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens[0].token_type, TokenType::PRINT);
    assert_eq!(tokens[0].line, 2);
    assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::EOF));
}
