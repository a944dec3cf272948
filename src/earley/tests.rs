use pretty_assertions::assert_eq;

use super::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Tag {
    List,
    Item,
    Sum,
    Number,
}

const LIST: RuleId = RuleId(0);
const ITEM: RuleId = RuleId(1);
const SUM: RuleId = RuleId(2);
const CHAIN: RuleId = RuleId(3);

fn grammar() -> Grammar<u8, Tag> {
    let mut builder = Grammar::builder();
    builder
        .list(
            LIST,
            "list",
            vec![
                alt(Tag::List, vec![nt(LIST), lit(","), lit(" "), nt(ITEM)]),
                alt(Tag::List, vec![nt(ITEM)]),
            ],
        )
        .rule(
            ITEM,
            "item",
            vec![alt(Tag::Item, vec![pred(u8::is_ascii_lowercase)])],
        )
        .rule(
            SUM,
            "sum",
            vec![
                alt(Tag::Sum, vec![nt(SUM), lit("+"), nt(SUM)]),
                alt(Tag::Number, vec![pred(u8::is_ascii_digit)]),
            ],
        )
        .rule(
            CHAIN,
            "chain",
            vec![
                alt(Tag::Sum, vec![nt(CHAIN), lit("+"), pred(u8::is_ascii_digit)]),
                alt(Tag::Number, vec![pred(u8::is_ascii_digit)]),
            ],
        );
    builder.build()
}

#[test]
fn list_is_flattened_in_order() {
    let grammar = grammar();
    let tree = parse(&grammar, LIST, b"a, b, c").unwrap();

    assert_eq!(tree.tag, Tag::List);
    assert_eq!(tree.range, 0..7);
    let items: Vec<u8> = tree
        .trees()
        .map(|item| {
            assert_eq!(item.tag, Tag::Item);
            *item.leaf(0).unwrap()
        })
        .collect();
    assert_eq!(items, b"abc");
    assert_eq!(tree.children.len(), 3);
}

#[test]
fn single_element_list() {
    let grammar = grammar();
    let tree = parse(&grammar, LIST, b"z").unwrap();
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.tree(0).unwrap().leaf(0), Some(&b'z'));
}

#[test]
fn closing_twice_adds_nothing() {
    let grammar = grammar();
    let mut parser = Parser::new(&grammar, LIST, b"a, b");
    parser.run().unwrap();

    for k in 0..parser.charts.len() {
        let before = parser.charts[k].items.len();
        assert_eq!(parser.close(k), 0);
        assert_eq!(parser.charts[k].items.len(), before);
    }
}

#[test]
fn no_parse() {
    let grammar = grammar();
    assert!(parse(&grammar, LIST, b"a,, b").is_none());
    // Every chart is alive, but the root is not completed.
    assert!(parse(&grammar, LIST, b"a, ").is_none());
    assert!(parse(&grammar, LIST, b"").is_none());
    assert!(parse(&grammar, ITEM, b"a, b").is_none());
}

#[test]
fn ambiguous_input_has_one_tree() {
    let grammar = grammar();
    let tree = parse(&grammar, SUM, b"1+2+3").unwrap();
    assert_eq!(tree.tag, Tag::Sum);
    assert_eq!(tree.leaves(), vec![&b'1', &b'+', &b'2', &b'+', &b'3']);
}

#[test]
fn leaves_of_nested_trees() {
    let grammar = grammar();
    let tree = parse(&grammar, SUM, b"4+5").unwrap();
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.leaf(1), Some(&b'+'));
    assert_eq!(tree.tree(2).unwrap().tag, Tag::Number);
    assert_eq!(tree.tree(2).unwrap().range, 2..3);
}

#[test]
#[should_panic]
fn empty_alternatives_are_rejected() {
    let mut builder = Grammar::<u8, Tag>::builder();
    builder.rule(LIST, "list", vec![alt(Tag::List, vec![])]);
}

#[test]
#[should_panic]
fn undefined_rules_are_rejected() {
    let mut builder = Grammar::<u8, Tag>::builder();
    builder.rule(ITEM, "item", vec![alt(Tag::Item, vec![nt(LIST)])]);
    builder.build();
}

#[test]
fn deep_trees_are_built() {
    let grammar = grammar();
    let input = format!("1{}", "+2".repeat(20_000));
    let tree = parse(&grammar, CHAIN, input.as_bytes()).unwrap();

    let mut depth = 1;
    let mut node = &tree;
    while let Some(inner) = node.tree(0) {
        assert_eq!(node.tag, Tag::Sum);
        assert_eq!(node.leaf(2), Some(&b'2'));
        depth += 1;
        node = inner;
    }
    assert_eq!(node.tag, Tag::Number);
    assert_eq!(depth, 20_001);
    assert_eq!(tree.leaves().len(), input.len());
}
