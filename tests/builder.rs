mod common;

use std::time::{Duration, Instant};

use clexer_rs::{NodeKind, ParseTree, StructuralWarningKind, Token, build, tokenize};
use common::{assert_tree_shape, labels};

fn tree_of(source: &str) -> (Vec<Token>, ParseTree) {
    let tokens = tokenize(source).tokens;
    let tree = build(&tokens);
    assert_tree_shape(&tree, &tokens);
    (tokens, tree)
}

// -----------------------------------------------------------
// Statements and blocks
// -----------------------------------------------------------

#[test]
fn empty_token_sequence() {
    let tree = build(&[]);
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 1);
    assert!(tree.warnings().is_empty());
}

#[test]
fn function_body_block() {
    let (tokens, tree) = tree_of("int main() { return 0; }");
    let root = tree.root();
    assert!(tree.warnings().is_empty());
    assert_eq!(
        labels(&tree, root),
        vec!["KEYWORD", "IDENTIFIER", "Expression", "Block"]
    );

    let branches: Vec<_> = tree.branches(root).map(|(_, node)| node.kind).collect();
    assert_eq!(branches, vec![NodeKind::Expression, NodeKind::Block]);

    let block = tree.children(root)[3];
    assert_eq!(labels(&tree, block), vec!["PUNCTUATION", "Statement", "PUNCTUATION"]);
    let statement = tree.children(block)[1];
    assert_eq!(tree.text_of(statement, &tokens), "return 0;");
}

#[test]
fn truncated_expression() {
    let (tokens, tree) = tree_of("x = 5 +");
    assert!(tree.warnings().is_empty());
    assert_eq!(labels(&tree, tree.root()), vec!["Expression"]);
    let expr = tree.children(tree.root())[0];
    assert_eq!(tree.text_of(expr, &tokens), "x = 5 +");
}

#[test]
fn comments_are_not_nodes() {
    let (tokens, tree) = tree_of("a; // trailing\n/* lead */ b;");
    assert_eq!(tokens.len(), 6);
    assert_eq!(tree.leaves().count(), 4);
    assert_eq!(labels(&tree, tree.root()), vec!["Statement", "Statement"]);
}

#[test]
fn initializer_braces_stay_in_statement() {
    let (_, tree) = tree_of("int a[] = {1, 2};");
    assert_eq!(labels(&tree, tree.root()), vec!["Statement"]);
    let statement = tree.children(tree.root())[0];
    assert_eq!(
        labels(&tree, statement),
        vec!["KEYWORD", "IDENTIFIER", "Subscript", "OPERATOR", "Block", "PUNCTUATION"]
    );
}

#[test]
fn struct_definition() {
    let (_, tree) = tree_of("struct P { int x; };");
    assert!(tree.warnings().is_empty());
    assert_eq!(
        labels(&tree, tree.root()),
        vec!["KEYWORD", "IDENTIFIER", "Block", "Statement"]
    );
}

#[test]
fn preprocessor_lines_are_leaves() {
    let (_, tree) = tree_of("#include <a.h>\n#define N 3\nint n = N;");
    assert_eq!(
        labels(&tree, tree.root()),
        vec!["PREPROCESSOR", "PREPROCESSOR", "Statement"]
    );
}

// -----------------------------------------------------------
// Control structures
// -----------------------------------------------------------

#[test]
fn if_else() {
    let (_, tree) = tree_of("if (a) b = 1; else { c(); }");
    assert_eq!(labels(&tree, tree.root()), vec!["IfStatement"]);
    let stmt = tree.children(tree.root())[0];
    assert_eq!(
        labels(&tree, stmt),
        vec!["KEYWORD", "Condition", "Statement", "KEYWORD", "Block"]
    );
}

#[test]
fn dangling_else_binds_to_inner_if() {
    let (_, tree) = tree_of("if (a) if (b) x; else y;");
    assert_eq!(labels(&tree, tree.root()), vec!["IfStatement"]);
    let outer = tree.children(tree.root())[0];
    assert_eq!(labels(&tree, outer), vec!["KEYWORD", "Condition", "IfStatement"]);
    let inner = tree.children(outer)[2];
    assert_eq!(
        labels(&tree, inner),
        vec!["KEYWORD", "Condition", "Statement", "KEYWORD", "Statement"]
    );
    assert!(tree.warnings().is_empty());
}

#[test]
fn for_loop_condition_keeps_semicolons() {
    let (tokens, tree) = tree_of("for (int i = 0; i < n; ++i) { sum += i; }");
    let stmt = tree.children(tree.root())[0];
    assert_eq!(tree.node(stmt).kind, NodeKind::ForStatement);
    assert_eq!(labels(&tree, stmt), vec!["KEYWORD", "Condition", "Block"]);
    let condition = tree.children(stmt)[1];
    assert_eq!(tree.text_of(condition, &tokens), "(int i = 0; i < n; ++i)");
}

#[test]
fn while_loop_with_statement_body() {
    let (_, tree) = tree_of("while (i < n) i++; done();");
    assert_eq!(labels(&tree, tree.root()), vec!["WhileStatement", "Statement"]);
    let stmt = tree.children(tree.root())[0];
    assert_eq!(labels(&tree, stmt), vec!["KEYWORD", "Condition", "Statement"]);
}

#[test]
fn do_while() {
    let (_, tree) = tree_of("do { x--; } while (x > 0);");
    let stmt = tree.children(tree.root())[0];
    assert_eq!(tree.node(stmt).kind, NodeKind::DoStatement);
    assert_eq!(
        labels(&tree, stmt),
        vec!["KEYWORD", "Block", "KEYWORD", "Condition", "PUNCTUATION"]
    );
}

#[test]
fn switch_cases() {
    let (_, tree) = tree_of("switch (x) { case 1: break; default: y(); }");
    let stmt = tree.children(tree.root())[0];
    assert_eq!(tree.node(stmt).kind, NodeKind::SwitchStatement);
    let block = tree.children(stmt)[2];
    assert_eq!(
        labels(&tree, block),
        vec!["PUNCTUATION", "Statement", "Statement", "PUNCTUATION"]
    );
}

#[test]
fn control_inside_function() {
    let source = "int f(int n) {\n  if (n) { return 1; }\n  return 0;\n}";
    let (_, tree) = tree_of(source);
    let body = tree.children(tree.root())[3];
    assert_eq!(
        labels(&tree, body),
        vec!["PUNCTUATION", "IfStatement", "Statement", "PUNCTUATION"]
    );
}

// -----------------------------------------------------------
// Unbalanced brackets
// -----------------------------------------------------------

#[test]
fn unclosed_brace() {
    let (tokens, tree) = tree_of("{ { }");
    assert_eq!(tree.warnings().len(), 1);
    let warning = &tree.warnings()[0];
    assert_eq!(warning.kind, StructuralWarningKind::Unclosed('{'));
    assert_eq!((warning.span.line, warning.span.column), (1, 1));
    assert_eq!(warning.token, 0);
    assert_eq!(tree.leaves().count(), tokens.len());
}

#[test]
fn unmatched_closer_stays_a_leaf() {
    let (_, tree) = tree_of("x; }");
    assert_eq!(labels(&tree, tree.root()), vec!["Statement", "PUNCTUATION"]);
    assert_eq!(tree.warnings().len(), 1);
    assert_eq!(tree.warnings()[0].kind, StructuralWarningKind::Unmatched('}'));
    assert_eq!(tree.warnings()[0].span.column, 4);
    assert_eq!(
        tree.warnings()[0].to_string(),
        "unbalanced bracket: unmatched '}' at line 1, column 4"
    );
}

#[test]
fn outer_closer_force_closes_inner_group() {
    let (tokens, tree) = tree_of("f(a[1);");
    assert_eq!(tree.warnings().len(), 1);
    assert_eq!(tree.warnings()[0].kind, StructuralWarningKind::Unclosed('['));
    let statement = tree.children(tree.root())[0];
    assert_eq!(
        labels(&tree, statement),
        vec!["IDENTIFIER", "Expression", "PUNCTUATION"]
    );
    let call = tree.children(statement)[1];
    assert_eq!(tree.text_of(call, &tokens), "(a[1)");
}

#[test]
fn every_unclosed_bracket_is_reported() {
    let (_, tree) = tree_of("void g() { h(x[");
    let kinds: Vec<_> = tree.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StructuralWarningKind::Unclosed('['),
            StructuralWarningKind::Unclosed('('),
            StructuralWarningKind::Unclosed('{'),
        ]
    );
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 100_000;
    let source = format!("{}x{}", "{".repeat(depth), "}".repeat(depth));
    let tokens = tokenize(&source).tokens;
    let tree = build(&tokens);
    assert!(tree.warnings().is_empty());
    // root, `depth` blocks, then the statement holding `x`
    assert_eq!(tree.depth(), depth + 2);
}

#[test]
fn unmatched_closers_under_deep_nesting_stay_linear() {
    let n = 100_000;
    let source = format!("{}{}", "{".repeat(n), ")".repeat(n));
    let tokens = tokenize(&source).tokens;

    let started = Instant::now();
    let tree = build(&tokens);
    let elapsed = started.elapsed();

    let unmatched = tree
        .warnings()
        .iter()
        .filter(|w| w.kind == StructuralWarningKind::Unmatched(')'))
        .count();
    assert_eq!(unmatched, n);
    assert_eq!(tree.warnings().len(), 2 * n);
    assert_eq!(tree.leaves().count(), tokens.len());
    assert!(elapsed < Duration::from_secs(5), "build took {elapsed:?}");
}
