use setsuna::lexer::{tokenize, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, "<test>")
        .unwrap_or_else(|e| panic!("lexing failed: {e}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn empty_input_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

#[test]
fn whitespace_is_skipped_but_newlines_are_tokens() {
    assert_eq!(
        kinds("  1 \t 2 \r\n 3"),
        vec![
            TokenKind::Int(1),
            TokenKind::Int(2),
            TokenKind::Newline,
            TokenKind::Int(3),
            TokenKind::Eof
        ]
    );
}

#[test]
fn all_keywords() {
    assert_eq!(
        kinds("let fn if else match type module import while for in as const true false"),
        vec![
            TokenKind::Let,
            TokenKind::Fn,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Match,
            TokenKind::Type,
            TokenKind::Module,
            TokenKind::Import,
            TokenKind::While,
            TokenKind::For,
            TokenKind::In,
            TokenKind::As,
            TokenKind::Const,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Eof
        ]
    );
}

#[test]
fn underscore_is_an_identifier() {
    assert_eq!(
        kinds("_ _x x_1"),
        vec![
            TokenKind::Ident("_".into()),
            TokenKind::Ident("_x".into()),
            TokenKind::Ident("x_1".into()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn floats_need_a_digit_after_the_dot() {
    assert_eq!(
        kinds("3.14 10.0 5."),
        vec![
            TokenKind::Float(3.14),
            TokenKind::Float(10.0),
            TokenKind::Int(5),
            TokenKind::Dot,
            TokenKind::Eof
        ]
    );
}

#[test]
fn negative_numbers_are_minus_then_literal() {
    assert_eq!(
        kinds("-7"),
        vec![TokenKind::Minus, TokenKind::Int(7), TokenKind::Eof]
    );
}

#[test]
fn string_payload_is_unescaped() {
    assert_eq!(
        kinds(r#""line1\nline2""#),
        vec![TokenKind::Str("line1\nline2".into()), TokenKind::Eof]
    );
}

#[test]
fn unknown_escapes_keep_the_escaped_character() {
    assert_eq!(
        kinds(r#""\x\y""#),
        vec![TokenKind::Str("xy".into()), TokenKind::Eof]
    );
}

#[test]
fn string_with_newline_inside_counts_lines() {
    let tokens = tokenize("\"a\nb\" x", "<test>").unwrap();
    // The identifier after the two-line string sits on line 2.
    assert_eq!(tokens[1].location.line, 2);
}

#[test]
fn unterminated_string_reports_its_start() {
    let err = tokenize("let s = \"oops", "<test>").unwrap_err();
    let loc = err.location.unwrap();
    assert_eq!((loc.line, loc.column), (1, 9));
}

#[test]
fn ellipsis_before_dots() {
    assert_eq!(
        kinds("... . .."),
        vec![
            TokenKind::Ellipsis,
            TokenKind::Dot,
            TokenKind::Dot,
            TokenKind::Dot,
            TokenKind::Eof
        ]
    );
}

#[test]
fn comment_only_line_still_emits_its_newline() {
    assert_eq!(
        kinds("// hello\n1"),
        vec![TokenKind::Newline, TokenKind::Int(1), TokenKind::Eof]
    );
}

#[test]
fn error_format_is_canonical() {
    let err = tokenize("?", "main.stsn").unwrap_err();
    assert_eq!(err.to_string(), "main.stsn:1:1: error: unexpected character: '?'");
}
