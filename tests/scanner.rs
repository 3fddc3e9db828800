#[cfg(test)]
mod scanner_tests {
    use loxwalk as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

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
    fn test_scanner_02_two_char_operators_are_greedy() {
        assert_token_sequence(
            "!= ! == = <= < >= > /",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "and andy class _x1 while orchid or",
            &[
                (TokenType::AND, "and"),
                (TokenType::IDENTIFIER, "andy"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers_need_digits_on_both_sides_of_dot() {
        let tokens: Vec<Token> = Scanner::new("123 45.67 1. .5")
            .filter_map(Result::ok)
            .collect();

        let kinds: Vec<(&str, &str)> = tokens
            .iter()
            .map(|t| (t.token_type.name(), t.lexeme.as_str()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("NUMBER", "123"),
                ("NUMBER", "45.67"),
                ("NUMBER", "1"),
                ("DOT", "."),
                ("DOT", "."),
                ("NUMBER", "5"),
                ("EOF", ""),
            ]
        );

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 45.67),
            ref other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_05_string_literal_and_unterminated_string() {
        let results: Vec<_> = Scanner::new("\"hi there\" \"oops").collect();

        assert_eq!(results.len(), 3, "string, error, EOF");

        match &results[0] {
            Ok(token) => {
                assert_eq!(token.lexeme, "\"hi there\"");
                match &token.token_type {
                    TokenType::STRING(s) => assert_eq!(s, "hi there"),
                    other => panic!("expected a string, got {:?}", other),
                }
            }
            Err(e) => panic!("unexpected error: {}", e),
        }

        let err = results[1].as_ref().expect_err("unterminated string");
        assert_eq!(err.to_string(), "[line 1] Error: Unterminated string.");

        assert!(matches!(&results[2], Ok(t) if t.token_type == TokenType::EOF));
    }

    #[test]
    fn test_scanner_06_multiline_string_counts_lines() {
        let tokens: Vec<Token> = Scanner::new("\"a\nb\"\nx")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_07_comments_and_line_numbers() {
        let tokens: Vec<Token> = Scanner::new("a // comment ( ignored\nb\n\nc // trailing")
            .filter_map(Result::ok)
            .collect();

        let lines: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.lexeme.as_str(), t.line))
            .collect();

        assert_eq!(lines, vec![("a", 1), ("b", 2), ("c", 4), ("", 4)]);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

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

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.to_string(), "[line 1] Error: Unexpected character.");
        }

        fn assert_token_matches(
            result: &lox::error::Result<Token>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_reported_once() {
        let (tokens, errors) = Scanner::new("é;\n€").scan_all();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line(), Some(1));
        assert_eq!(errors[1].line(), Some(2));

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::SEMICOLON);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_lexemes_reassemble_source() {
        let source = "var answer = (40 + 2) * 1.5;\nprint answer >= 63 and !false;\nfun f(a,b){return a!=b;}";

        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        let expected: String = source.split_whitespace().collect();

        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn test_exactly_one_eof_then_fused() {
        let mut scanner = Scanner::new("");

        assert!(matches!(scanner.next(), Some(Ok(t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<Token> = Scanner::new("3 2.5 \"hi\" foo")
            .filter_map(Result::ok)
            .collect();

        let printed: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            printed,
            vec![
                "NUMBER 3 3.0",
                "NUMBER 2.5 2.5",
                "STRING \"hi\" hi",
                "IDENTIFIER foo null",
                "EOF  null",
            ]
        );
    }
}
