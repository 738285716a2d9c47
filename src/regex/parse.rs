//! Surface-syntax parser for the regex dialect of §4.1, built with `nom` combinators in the
//! style of the teacher's `parser::regex` module, extended with character classes, shorthand
//! escapes, `.` and bounded quantifiers.

use crate::element::Element;
use crate::regex::{Quant, Regex, RegexTree};
use nom::branch::alt;
use nom::bytes::complete::take;
use nom::character::complete::{char, digit1, none_of};
use nom::combinator::{map, map_res, opt, recognize, value, verify};
use nom::multi::{many1, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegexSyntaxError {
    #[error("could not parse regex: {0}")]
    Malformed(String),
    #[error("trailing input after regex: '{0}'")]
    TrailingInput(String),
}

/// Parses a regex in the surface syntax of §4.1, running steps 1 (parse), 2 (expand classes)
/// up front; Thompson's construction (steps 3-7) happens later in [Regex::to_nfa].
pub fn parse(input: &str) -> Result<Regex, RegexSyntaxError> {
    let (rest, tree) =
        full_regex(input).map_err(|e| RegexSyntaxError::Malformed(e.to_string()))?;
    if !rest.is_empty() {
        return Err(RegexSyntaxError::TrailingInput(rest.to_string()));
    }
    Ok(Regex::new(tree))
}

fn full_regex(input: &str) -> IResult<&str, RegexTree> {
    expression(input.trim())
}

fn expression(input: &str) -> IResult<&str, RegexTree> {
    alternation(input)
}

fn alternation(input: &str) -> IResult<&str, RegexTree> {
    map(
        separated_list1(char('|'), sequence),
        wrap_multiple(RegexTree::Union),
    )(input)
}

fn sequence(input: &str) -> IResult<&str, RegexTree> {
    map(many1(quantified), wrap_multiple(RegexTree::Concat))(input)
}

fn wrap_multiple<T>(f: impl Fn(Vec<T>) -> T) -> impl Fn(Vec<T>) -> T {
    move |mut items| {
        if items.len() > 1 {
            f(items)
        } else {
            items.remove(0)
        }
    }
}

fn quantified(input: &str) -> IResult<&str, RegexTree> {
    map(pair(atom, opt(quantifier)), |(tree, quant)| match quant {
        Some(q) => RegexTree::Quantifier(Box::new(tree), q),
        None => tree,
    })(input)
}

fn quantifier(input: &str) -> IResult<&str, Quant> {
    alt((
        value(Quant::STAR, char('*')),
        value(Quant::PLUS, char('+')),
        value(Quant::OPTIONAL, char('?')),
        bounded_quantifier,
    ))(input)
}

/// `{n}`, `{n,}` or `{n,m}`, each a digit-only body; never matches a `{name}` reference
/// (which is parsed as its own atom by [reference_atom]).
fn bounded_quantifier(input: &str) -> IResult<&str, Quant> {
    delimited(
        char('{'),
        alt((
            map(
                separated_pair(number, char(','), number),
                |(low, high)| Quant {
                    low,
                    high: Some(high),
                },
            ),
            map(
                pair(number, char(',')),
                |(low, _)| Quant { low, high: None },
            ),
            map(number, |n| Quant {
                low: n,
                high: Some(n),
            }),
        )),
        char('}'),
    )(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

fn atom(input: &str) -> IResult<&str, RegexTree> {
    alt((
        group,
        char_class,
        dot_class,
        reference_atom,
        escaped_atom,
        map(element, RegexTree::Identity),
    ))(input)
}

/// A standalone (non-bracketed) escape: `\d`, `\w`, `\s` (and their negations) expand to the
/// same multi-element class [shorthand_elements] gives `class_shorthand` inside `[...]`, so
/// the expansion works wherever a single element is accepted, not just inside brackets. A
/// one-character escape (`\t`, `\.`, ...) collapses back to a plain literal atom.
fn escaped_atom(input: &str) -> IResult<&str, RegexTree> {
    map(preceded(char('\\'), take(1usize)), |s: &str| {
        let c = s.chars().next().expect("take(1)");
        let mut elements = shorthand_elements(c);
        if elements.len() > 1 {
            RegexTree::CharClass(elements)
        } else {
            RegexTree::Identity(elements.pop().unwrap_or(Element::Literal(c)))
        }
    })(input)
}

/// `.`: any element of the base alphabet but newline, expanded eagerly to a class (§4.1 step 2).
fn dot_class(input: &str) -> IResult<&str, RegexTree> {
    map(char('.'), |_| {
        RegexTree::CharClass(
            base_alphabet()
                .into_iter()
                .filter(|c| *c != '\n')
                .map(Element::Literal)
                .collect(),
        )
    })(input)
}

fn group(input: &str) -> IResult<&str, RegexTree> {
    map(
        delimited(char('('), expression, char(')')),
        |tree| RegexTree::Group(Box::new(tree)),
    )(input)
}

/// `{name}`: only reached once [bounded_quantifier] (tried first by the caller's `atom` as
/// part of [quantified]) has failed to read the brace body as a repetition count, so any
/// non-numeric or mixed body here is a reference name.
fn reference_atom(input: &str) -> IResult<&str, RegexTree> {
    map(
        delimited(
            char('{'),
            recognize(many1(none_of("{}"))),
            char('}'),
        ),
        |name: &str| RegexTree::Identity(Element::Reference(name.into())),
    )(input)
}

fn char_class(input: &str) -> IResult<&str, RegexTree> {
    map(
        delimited(
            char('['),
            pair(opt(char('^')), many1(class_item)),
            char(']'),
        ),
        |(negate, items)| {
            let elements: Vec<Element> = items.into_iter().flatten().collect();
            if negate.is_some() {
                RegexTree::CharClass(negate_elements(&elements))
            } else {
                RegexTree::CharClass(dedup_elements(elements))
            }
        },
    )(input)
}

fn class_item(input: &str) -> IResult<&str, Vec<Element>> {
    alt((class_range, class_shorthand, class_single))(input)
}

fn class_range(input: &str) -> IResult<&str, Vec<Element>> {
    map(
        separated_pair(class_char, char('-'), class_char),
        |(low, high)| (low..=high).map(Element::Literal).collect(),
    )(input)
}

fn class_shorthand(input: &str) -> IResult<&str, Vec<Element>> {
    map(preceded(char('\\'), take(1usize)), |s: &str| {
        shorthand_elements(s.chars().next().expect("take(1)"))
    })(input)
}

fn class_single(input: &str) -> IResult<&str, Vec<Element>> {
    map(class_char, |c| vec![Element::Literal(c)])(input)
}

fn class_char(input: &str) -> IResult<&str, char> {
    alt((
        preceded(char('\\'), none_of("")),
        none_of("]"),
    ))(input)
}

fn reserved_chars() -> &'static str {
    "(){}[]|*+?.\\"
}

fn element(input: &str) -> IResult<&str, Element> {
    alt((empty_lang, empty_str, normal_char))(input)
}

fn empty_str(input: &str) -> IResult<&str, Element> {
    value(Element::Empty, char('ε'))(input)
}

fn empty_lang(input: &str) -> IResult<&str, Element> {
    value(Element::Unmatchable, char('∅'))(input)
}

fn normal_char(input: &str) -> IResult<&str, Element> {
    verify(map(take(1usize), |s: &str| {
        Element::Literal(s.chars().next().expect("take(1)"))
    }), |e| match e {
        Element::Literal(c) => !reserved_chars().contains(*c),
        _ => true,
    })(input)
}

/// The base alphabet character classes and `.` negate/expand against: printable ASCII plus
/// tab, newline and carriage return. Lexers built on top of this crate are expected to work
/// over source text, not arbitrary binary input.
pub fn base_alphabet() -> Vec<char> {
    let mut chars: Vec<char> = (0x20u8..=0x7e).map(|b| b as char).collect();
    chars.extend(['\t', '\n', '\r']);
    chars
}

fn shorthand_elements(c: char) -> Vec<Element> {
    match c {
        'd' => ('0'..='9').map(Element::Literal).collect(),
        'D' => negate_chars(&('0'..='9').collect::<Vec<_>>()),
        'w' => word_chars(),
        'W' => negate_chars(&word_chars_raw()),
        's' => vec![' ', '\t', '\n', '\r'].into_iter().map(Element::Literal).collect(),
        'S' => negate_chars(&[' ', '\t', '\n', '\r']),
        't' => vec![Element::Literal('\t')],
        'n' => vec![Element::Literal('\n')],
        other => vec![Element::Literal(other)],
    }
}

fn word_chars_raw() -> Vec<char> {
    let mut v: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    v.push('_');
    v
}

fn word_chars() -> Vec<Element> {
    word_chars_raw().into_iter().map(Element::Literal).collect()
}

fn negate_chars(excluded: &[char]) -> Vec<Element> {
    base_alphabet()
        .into_iter()
        .filter(|c| !excluded.contains(c))
        .map(Element::Literal)
        .collect()
}

fn negate_elements(included: &[Element]) -> Vec<Element> {
    let chars: Vec<char> = included
        .iter()
        .filter_map(|e| match e {
            Element::Literal(c) => Some(*c),
            _ => None,
        })
        .collect();
    negate_chars(&chars)
}

fn dedup_elements(items: Vec<Element>) -> Vec<Element> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_concat() {
        let r = parse("ab").unwrap();
        assert_eq!(
            r.tree,
            RegexTree::Concat(vec![
                RegexTree::Identity(Element::Literal('a')),
                RegexTree::Identity(Element::Literal('b')),
            ])
        );
    }

    #[test]
    fn parses_alternation_and_group() {
        let r = parse("(a|b)*").unwrap();
        match r.tree {
            RegexTree::Quantifier(inner, Quant { low: 0, high: None }) => match *inner {
                RegexTree::Group(g) => assert!(matches!(*g, RegexTree::Union(_))),
                other => panic!("expected group, got {other:?}"),
            },
            other => panic!("expected star quantifier, got {other:?}"),
        }
    }

    #[test]
    fn parses_bounded_quantifier() {
        let r = parse("a{2,4}").unwrap();
        assert_eq!(
            r.tree,
            RegexTree::Quantifier(
                Box::new(RegexTree::Identity(Element::Literal('a'))),
                Quant {
                    low: 2,
                    high: Some(4)
                }
            )
        );
    }

    #[test]
    fn brace_with_non_numeric_body_is_a_reference() {
        let r = parse("{digit}").unwrap();
        assert_eq!(
            r.tree,
            RegexTree::Identity(Element::Reference("digit".into()))
        );
    }

    #[test]
    fn digit_shorthand_expands_to_class() {
        let r = parse("\\d").unwrap();
        match r.tree {
            RegexTree::CharClass(elems) => assert_eq!(elems.len(), 10),
            other => panic!("expected char class, got {other:?}"),
        }
    }

    #[test]
    fn negated_class_excludes_listed_members() {
        let r = parse("[^a-c]").unwrap();
        match r.tree {
            RegexTree::CharClass(elems) => {
                assert!(!elems.contains(&Element::Literal('a')));
                assert!(elems.contains(&Element::Literal('d')));
            }
            other => panic!("expected char class, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(matches!(
            parse("a)"),
            Err(RegexSyntaxError::TrailingInput(_))
        ));
    }
}
