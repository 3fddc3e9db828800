#[cfg(test)]
mod parser_tests {
    use loxwalk as lox;

    use lox::ast::{Expr, LiteralValue, Stmt};
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::token::TokenType;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, scan_errors) = Scanner::new(source).scan_all();
        assert!(scan_errors.is_empty(), "scan errors: {:?}", scan_errors);

        Parser::new(&tokens).parse()
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        parse(source).unwrap_or_else(|errors| {
            panic!(
                "unexpected parse errors: {:?}",
                errors.iter().map(ToString::to_string).collect::<Vec<_>>()
            )
        })
    }

    fn parse_errors(source: &str) -> Vec<String> {
        match parse(source) {
            Ok(stmts) => panic!("expected parse errors, got {:?}", stmts),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    fn number(expr: &Expr) -> f64 {
        match expr {
            Expr::Literal(LiteralValue::Number(n)) => *n,
            other => panic!("expected a number literal, got {:?}", other),
        }
    }

    #[test]
    fn test_factor_binds_tighter_than_term() {
        let stmts = parse_ok("1 + 2 * 3;");

        let Stmt::Expression(Expr::Binary {
            left,
            operator,
            right,
        }) = &stmts[0]
        else {
            panic!("expected a binary expression statement");
        };

        assert_eq!(operator.token_type, TokenType::PLUS);
        assert_eq!(number(left), 1.0);

        let Expr::Binary {
            left, operator, right, ..
        } = right.as_ref()
        else {
            panic!("expected nested multiplication");
        };

        assert_eq!(operator.token_type, TokenType::STAR);
        assert_eq!(number(left), 2.0);
        assert_eq!(number(right), 3.0);
    }

    #[test]
    fn test_term_is_left_associative() {
        let stmts = parse_ok("1 - 2 - 3;");

        let Stmt::Expression(Expr::Binary { left, right, .. }) = &stmts[0] else {
            panic!("expected a binary expression statement");
        };

        assert!(matches!(left.as_ref(), Expr::Binary { .. }));
        assert_eq!(number(right), 3.0);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let stmts = parse_ok("a or b and c;");

        let Stmt::Expression(Expr::Logical {
            operator, right, ..
        }) = &stmts[0]
        else {
            panic!("expected a logical expression");
        };

        assert_eq!(operator.token_type, TokenType::OR);
        assert!(
            matches!(right.as_ref(), Expr::Logical { operator, .. } if operator.token_type == TokenType::AND)
        );
    }

    #[test]
    fn test_assignment_targets() {
        let stmts = parse_ok("a = b = 1; obj.field = 2;");

        let Stmt::Expression(Expr::Assign { target, value }) = &stmts[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(target.name.lexeme, "a");
        assert!(matches!(value.as_ref(), Expr::Assign { .. }), "right associative");

        let Stmt::Expression(Expr::Set { object, name, .. }) = &stmts[1] else {
            panic!("expected a property assignment");
        };
        assert_eq!(name.lexeme, "field");
        assert!(matches!(object.as_ref(), Expr::Variable(v) if v.name.lexeme == "obj"));
    }

    #[test]
    fn test_invalid_assignment_target_is_reported() {
        assert_eq!(
            parse_errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );

        assert_eq!(
            parse_errors("a + b = c;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_for_loop_desugars_to_while_in_block() {
        let stmts = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(stmts.len(), 1);

        let Stmt::Block(outer) = &stmts[0] else {
            panic!("expected the loop to be wrapped in a block");
        };

        assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.lexeme == "i"));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected a while loop");
        };

        assert!(matches!(condition, Expr::Binary { .. }));

        let Stmt::Block(body) = body.as_ref() else {
            panic!("expected the body and increment in a block");
        };

        assert!(matches!(&body[0], Stmt::Print(_)));
        assert!(matches!(&body[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_for_loop_without_clauses() {
        let stmts = parse_ok("for (;;) print 1;");

        let Stmt::While { condition, body } = &stmts[0] else {
            panic!("expected a bare while loop");
        };

        assert_eq!(condition, &Expr::Literal(LiteralValue::True));
        assert!(matches!(body.as_ref(), Stmt::Print(_)));
    }

    #[test]
    fn test_dangling_else_binds_to_nearest_if() {
        let stmts = parse_ok("if (a) if (b) print 1; else print 2;");

        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = &stmts[0]
        else {
            panic!("expected an if statement");
        };

        assert!(else_branch.is_none());
        assert!(matches!(
            then_branch.as_ref(),
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_class_with_superclass_and_methods() {
        let stmts =
            parse_ok("class B < A { init(x) { this.x = x; } get() { return super.get(); } }");

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &stmts[0]
        else {
            panic!("expected a class declaration");
        };

        assert_eq!(name.lexeme, "B");
        assert_eq!(
            superclass.as_ref().map(|s| s.name.lexeme.as_str()),
            Some("A")
        );
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name.lexeme, "init");
        assert_eq!(methods[0].params.len(), 1);

        let Stmt::Return {
            value: Some(Expr::Call { callee, .. }),
            ..
        } = &methods[1].body[0]
        else {
            panic!("expected a return of a call");
        };

        assert!(
            matches!(callee.as_ref(), Expr::Super { method, .. } if method.lexeme == "get")
        );
    }

    #[test]
    fn test_function_declaration_and_call_arguments() {
        let stmts = parse_ok("fun add(a, b) { return a + b; } add(1, 2)(3);");

        let Stmt::Function(declaration) = &stmts[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(declaration.name.lexeme, "add");
        assert_eq!(declaration.params.len(), 2);

        let Stmt::Expression(Expr::Call {
            callee, arguments, ..
        }) = &stmts[1]
        else {
            panic!("expected a call");
        };
        assert_eq!(arguments.len(), 1);
        assert!(matches!(callee.as_ref(), Expr::Call { arguments, .. } if arguments.len() == 2));
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_missing_expression() {
        assert_eq!(
            parse_errors("var x = ;"),
            vec!["[line 1] Error at ';': Expect expression."]
        );
    }

    #[test]
    fn test_recovers_and_reports_every_error() {
        let errors = parse_errors("var = 1;\nprint 2\nvar x = 3;\nprint (4;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at 'var': Expect ';' after value.",
                "[line 4] Error at ';': Expect ')' after expression.",
            ]
        );
    }

    #[test]
    fn test_error_inside_block_keeps_rest_of_block() {
        let errors = parse_errors("{ print ; print 1; }\nprint 2 2;");

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("[line 1]"));
        assert!(errors[1].starts_with("[line 2]"));
    }

    #[test]
    fn test_too_many_parameters_and_arguments() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        assert_eq!(
            parse_errors(&source),
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );

        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        assert_eq!(
            parse_errors(&source),
            vec!["[line 1] Error at '255': Can't have more than 255 arguments."]
        );
    }

    #[test]
    fn test_exactly_255_parameters_is_fine() {
        let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
        let stmts = parse_ok(&format!("fun f({}) {{}}", params.join(", ")));

        let Stmt::Function(declaration) = &stmts[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(declaration.params.len(), 255);
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("// nothing here\n").is_empty());
    }
}
