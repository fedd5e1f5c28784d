//! Tests for the template parser.

use super::parser::{parse_arith, parse_global_key, parse_loop_token};
use super::{Arith, ArithOp, LoopToken, Operand, Segment, parse_template};

#[test]
fn plain_text_is_one_literal() {
  let t = parse_template("hello world");
  assert_eq!(t.segments, vec![Segment::Literal("hello world".to_string())]);
  assert!(t.is_literal());
}

#[test]
fn empty_string_has_no_segments() {
  assert!(parse_template("").segments.is_empty());
}

#[test]
fn loop_token_splits_literals() {
  let t = parse_template("Item $$N done");
  assert_eq!(t.segments.len(), 3);
  assert_eq!(t.segments[0], Segment::Literal("Item ".to_string()));
  match &t.segments[1] {
    Segment::Loop { arith, source } => {
      assert_eq!(source, "$$N");
      assert_eq!(arith.first, Operand::Loop(LoopToken::N));
      assert!(arith.rest.is_empty());
    }
    other => panic!("expected loop segment, got {other:?}"),
  }
  assert!(!t.is_literal());
}

#[test]
fn loop_arithmetic_with_literal_and_global_word() {
  let t = parse_template("$$N+1 $$M*ACTORS");
  let Segment::Loop { arith, source } = &t.segments[0] else {
    panic!("expected loop segment");
  };
  assert_eq!(source, "$$N+1");
  assert_eq!(arith.rest, vec![(ArithOp::Add, Operand::Int(1))]);
  let Segment::Loop { arith, source } = &t.segments[2] else {
    panic!("expected loop segment");
  };
  assert_eq!(source, "$$M*ACTORS");
  assert_eq!(
    arith.rest,
    vec![(ArithOp::Mul, Operand::Word("ACTORS".to_string()))]
  );
}

#[test]
fn operator_followed_by_lowercase_is_text() {
  let t = parse_template("$$N-th");
  let Segment::Loop { source, .. } = &t.segments[0] else {
    panic!("expected loop segment");
  };
  assert_eq!(source, "$$N");
  assert_eq!(t.segments[1], Segment::Literal("-th".to_string()));
}

#[test]
fn global_key_requires_two_uppercase_chars() {
  let t = parse_template("$FOO and $A and $foo");
  assert_eq!(
    t.segments[0],
    Segment::Global {
      name: "FOO".to_string(),
      source: "$FOO".to_string()
    }
  );
  assert_eq!(
    t.segments[1],
    Segment::Literal(" and $A and $foo".to_string())
  );
}

#[test]
fn braced_expression_is_parsed() {
  let t = parse_template("x${$COUNT * 2}y");
  assert_eq!(t.segments.len(), 3);
  let Segment::Braced { arith, source } = &t.segments[1] else {
    panic!("expected braced segment");
  };
  assert_eq!(source, "${$COUNT * 2}");
  assert_eq!(arith.first, Operand::Global("COUNT".to_string()));
  assert_eq!(arith.rest, vec![(ArithOp::Mul, Operand::Int(2))]);
}

#[test]
fn nested_braces() {
  let arith = parse_arith("${$$N+1} * $$M").unwrap();
  assert!(matches!(arith.first, Operand::Braced(_)));
  assert_eq!(arith.rest, vec![(ArithOp::Mul, Operand::Loop(LoopToken::M))]);
}

#[test]
fn unterminated_brace_is_literal() {
  let t = parse_template("${$FOO");
  assert!(t.is_literal());
}

#[test]
fn snippet_body_is_a_template() {
  let t = parse_template("n=`len(\"$NAME\")`");
  let Segment::Snippet { body, source } = &t.segments[1] else {
    panic!("expected snippet");
  };
  assert_eq!(source, "`len(\"$NAME\")`");
  assert_eq!(body.segments.len(), 3);
}

#[test]
fn unterminated_backtick_is_literal() {
  assert!(parse_template("it`s").is_literal());
}

#[test]
fn escaped_dollar_and_backtick() {
  let t = parse_template("cost \\$FOO \\`x\\`");
  assert_eq!(t.segments, vec![Segment::Literal("cost $FOO `x`".to_string())]);
}

#[test]
fn helper_parsers() {
  assert_eq!(parse_loop_token("$$Lx"), Some((LoopToken::L, "x")));
  assert_eq!(parse_loop_token("$$X"), None);
  assert_eq!(parse_global_key("AB_1 rest"), Some(("AB_1", " rest")));
  assert_eq!(parse_global_key("Ab"), None);
  assert_eq!(
    parse_arith("-3"),
    Some(Arith {
      first: Operand::Int(-3),
      rest: vec![]
    })
  );
  assert_eq!(parse_arith("1 +"), None);
}
