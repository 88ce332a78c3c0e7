use insta::assert_debug_snapshot;
use viztruct::tokenizer::Tokenizer;

#[test]
fn tokenizer_creates_the_expected_tokens() {
    let source = "type P struct { X int8; Y []*T `tag` }";

    let kinds = Tokenizer::new(source).map(|t| t.kind).collect::<Vec<_>>();

    assert_debug_snapshot!(kinds, @r#"
    [
        KeywordType,
        Identifier(
            "P",
        ),
        KeywordStruct,
        BraceOpen,
        Identifier(
            "X",
        ),
        Identifier(
            "int8",
        ),
        Semicolon,
        Identifier(
            "Y",
        ),
        BracketOpen,
        BracketClose,
        Star,
        Identifier(
            "T",
        ),
        StringLiteral(
            "tag",
        ),
        BraceClose,
        Semicolon,
    ]
    "#);
}
