// ParseError carries spans plus the attached source text for miette
// rendering; boxing it would complicate every call site for no gain.
#![allow(clippy::result_large_err)]

use pest::Parser;
use pest_derive::Parser;

use crate::ast::{Definition, Name, Process, Program, Span};
use crate::errors::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct LorisParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

fn span_from(pair: &Pair<'_>) -> Span {
    let s = pair.as_span();
    Span::new(s.start(), s.end())
}

/// Extract the next child from a pest iterator, returning a descriptive error
/// instead of panicking. The grammar guarantees structure; this keeps the
/// AST-building phase free of unwraps all the same.
fn next_child<'a>(
    iter: &mut pest::iterators::Pairs<'a, Rule>,
    context: &str,
) -> Result<Pair<'a>, ParseError> {
    iter.next()
        .ok_or_else(|| ParseError::Internal(format!("expected child in {context}")))
}

/// A constant invocation recorded during AST building, resolved against the
/// definition list once the whole program has been read.
struct CallSite {
    name: String,
    arity: usize,
    span: Span,
}

struct BuildCtx<'a> {
    source: &'a str,
    filename: &'a str,
    calls: Vec<CallSite>,
}

impl BuildCtx<'_> {
    fn named_source(&self) -> miette::NamedSource<String> {
        miette::NamedSource::new(self.filename, self.source.to_owned())
    }

    fn source_span(&self, span: Span) -> miette::SourceSpan {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// Parse a process-calculus source file into a [`Program`].
///
/// # Parameters
/// - `source`: UTF-8 source text.
/// - `filename`: Logical filename used in diagnostics.
pub fn parse(source: &str, filename: &str) -> Result<Program, ParseError> {
    let pairs = LorisParser::parse(Rule::program, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        ParseError::syntax(format!("{e}"), Span::new(start, end), source, filename)
    })?;

    let program_pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::Internal("empty parse result".into()))?;

    let mut ctx = BuildCtx {
        source,
        filename,
        calls: Vec::new(),
    };

    let mut defs: Vec<Definition> = Vec::new();
    let mut root: Option<Process> = None;
    for pair in program_pair.into_inner() {
        match pair.as_rule() {
            Rule::definition => {
                let def = build_definition(pair, &mut ctx)?;
                if defs.iter().any(|d| d.name == def.name) {
                    return Err(ParseError::DuplicateDefinition {
                        name: def.name,
                        span: ctx.source_span(def.span),
                        src: ctx.named_source(),
                    });
                }
                defs.push(def);
            }
            Rule::process => {
                root = Some(build_process(pair, &mut ctx)?);
            }
            Rule::EOI => {}
            other => {
                return Err(ParseError::Internal(format!(
                    "unexpected {other:?} at program level"
                )))
            }
        }
    }
    let root = root.ok_or_else(|| ParseError::Internal("program has no root process".into()))?;

    // Invocations may refer forward, so resolution runs after the whole
    // program has been built.
    for call in &ctx.calls {
        match defs.iter().find(|d| d.name == call.name) {
            None => {
                return Err(ParseError::UnknownConstant {
                    name: call.name.clone(),
                    span: ctx.source_span(call.span),
                    src: ctx.named_source(),
                })
            }
            Some(def) if def.params.len() != call.arity => {
                return Err(ParseError::ArityMismatch {
                    name: call.name.clone(),
                    expected: def.params.len(),
                    actual: call.arity,
                    span: ctx.source_span(call.span),
                    src: ctx.named_source(),
                })
            }
            Some(_) => {}
        }
    }

    Ok(Program { defs, root })
}

fn build_definition(pair: Pair<'_>, ctx: &mut BuildCtx<'_>) -> Result<Definition, ParseError> {
    let span = span_from(&pair);
    let mut inner = pair.into_inner();
    let name = next_child(&mut inner, "definition")?.as_str().to_owned();
    let mut params = Vec::new();
    let mut body_pair = next_child(&mut inner, "definition")?;
    if body_pair.as_rule() == Rule::param_list {
        params = body_pair
            .into_inner()
            .map(|p| p.as_str().to_owned())
            .collect();
        body_pair = next_child(&mut inner, "definition")?;
    }
    let body = build_process(body_pair, ctx)?;
    Ok(Definition {
        name,
        params,
        body,
        span,
    })
}

fn build_process(pair: Pair<'_>, ctx: &mut BuildCtx<'_>) -> Result<Process, ParseError> {
    // process = par_term ("+" par_term)* — fold right so `a + b + c`
    // becomes Sum(a, Sum(b, c)); canonicalization re-sorts anyway.
    let terms = pair
        .into_inner()
        .map(|p| build_par_term(p, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    fold_operator(terms, |left, right| Process::Sum {
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn build_par_term(pair: Pair<'_>, ctx: &mut BuildCtx<'_>) -> Result<Process, ParseError> {
    let terms = pair
        .into_inner()
        .map(|p| build_prefix_term(p, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    fold_operator(terms, |left, right| Process::Par {
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn fold_operator(
    mut terms: Vec<Process>,
    combine: impl Fn(Process, Process) -> Process,
) -> Result<Process, ParseError> {
    let last = terms
        .pop()
        .ok_or_else(|| ParseError::Internal("operator with no operands".into()))?;
    Ok(terms.into_iter().rev().fold(last, |acc, term| combine(term, acc)))
}

fn build_prefix_term(pair: Pair<'_>, ctx: &mut BuildCtx<'_>) -> Result<Process, ParseError> {
    let inner = next_child(&mut pair.into_inner(), "prefix term")?;
    match inner.as_rule() {
        Rule::nil => Ok(Process::Nil),
        Rule::output => {
            let mut parts = inner.into_inner();
            let chan = Name::free(next_child(&mut parts, "output")?.as_str());
            let msg = Name::free(next_child(&mut parts, "output")?.as_str());
            let next = build_prefix_term(next_child(&mut parts, "output")?, ctx)?;
            Ok(Process::Output {
                chan,
                msg,
                next: Box::new(next),
            })
        }
        Rule::input => {
            let mut parts = inner.into_inner();
            let chan = Name::free(next_child(&mut parts, "input")?.as_str());
            let var = Name::free(next_child(&mut parts, "input")?.as_str());
            let next = build_prefix_term(next_child(&mut parts, "input")?, ctx)?;
            Ok(Process::Input {
                chan,
                var,
                next: Box::new(next),
            })
        }
        Rule::matching => {
            let mut parts = inner.into_inner();
            let left = Name::free(next_child(&mut parts, "match")?.as_str());
            let negated = next_child(&mut parts, "match")?.as_str() == "!=";
            let right = Name::free(next_child(&mut parts, "match")?.as_str());
            let next = build_prefix_term(next_child(&mut parts, "match")?, ctx)?;
            Ok(Process::Match {
                left,
                right,
                negated,
                next: Box::new(next),
            })
        }
        Rule::restriction => {
            let mut parts = inner.into_inner();
            let name = Name::free(next_child(&mut parts, "restriction")?.as_str());
            let next = build_prefix_term(next_child(&mut parts, "restriction")?, ctx)?;
            Ok(Process::Restrict {
                name,
                next: Box::new(next),
            })
        }
        Rule::call => {
            let span = span_from(&inner);
            let mut parts = inner.into_inner();
            let name = next_child(&mut parts, "call")?.as_str().to_owned();
            let args: Vec<Name> = match parts.next() {
                Some(list) => list.into_inner().map(|p| Name::free(p.as_str())).collect(),
                None => Vec::new(),
            };
            ctx.calls.push(CallSite {
                name: name.clone(),
                arity: args.len(),
                span,
            });
            Ok(Process::Call { name, args })
        }
        Rule::group => {
            let body = next_child(&mut inner.into_inner(), "group")?;
            build_process(body, ctx)
        }
        other => Err(ParseError::Internal(format!(
            "unexpected {other:?} in prefix term"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(source: &str) -> String {
        parse(source, "test.pi")
            .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
            .root
            .to_string()
    }

    #[test]
    fn parses_prefixes_and_operators() {
        assert_eq!(roundtrip("a'<b>.0"), "a'<b>.0");
        assert_eq!(roundtrip("a(x).x'<x>.0"), "a(x).x'<x>.0");
        assert_eq!(roundtrip("[a=b]c'<a>.0"), "[a=b]c'<a>.0");
        assert_eq!(roundtrip("[a!=b]c'<a>.0"), "[a!=b]c'<a>.0");
        assert_eq!(roundtrip("$x.x'<x>.0"), "$x.x'<x>.0");
        assert_eq!(roundtrip("a'<b>.0 | a(x).0"), "a'<b>.0 | a(x).0");
        assert_eq!(roundtrip("a'<b>.0 + c'<d>.0"), "a'<b>.0 + c'<d>.0");
    }

    #[test]
    fn parallel_binds_tighter_than_sum() {
        let program = parse("a'<b>.0 + c'<d>.0 | e'<f>.0", "test.pi").unwrap();
        match program.root {
            Process::Sum { right, .. } => match *right {
                Process::Par { .. } => {}
                other => panic!("expected parallel under sum, got {other}"),
            },
            other => panic!("expected sum at top level, got {other}"),
        }
    }

    #[test]
    fn grouping_overrides_precedence() {
        let program = parse("(a'<b>.0 + c'<d>.0) | e'<f>.0", "test.pi").unwrap();
        match program.root {
            Process::Par { left, .. } => match *left {
                Process::Sum { .. } => {}
                other => panic!("expected sum under parallel, got {other}"),
            },
            other => panic!("expected parallel at top level, got {other}"),
        }
    }

    #[test]
    fn parses_definitions_and_calls() {
        let source = "Relay(c,d) = c(x).d'<x>.0\nRelay(a,b) | a'<m>.0";
        let program = parse(source, "test.pi").unwrap();
        assert_eq!(program.defs.len(), 1);
        assert_eq!(program.defs[0].params, vec!["c", "d"]);
        assert_eq!(program.root.to_string(), "Relay(a,b) | a'<m>.0");
    }

    #[test]
    fn forward_references_resolve() {
        let source = "Ping = a(x).Pong\nPong = a'<b>.Ping\nPing";
        assert!(parse(source, "test.pi").is_ok());
    }

    #[test]
    fn comments_are_skipped() {
        let source = "-- the whole system\na'<b>.0 -- one output\n";
        assert_eq!(roundtrip(source), "a'<b>.0");
    }

    #[test]
    fn rejects_duplicate_definitions() {
        let source = "A = 0\nA = a'<b>.0\nA";
        match parse(source, "test.pi") {
            Err(ParseError::DuplicateDefinition { name, .. }) => assert_eq!(name, "A"),
            other => panic!("expected duplicate-definition error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_constants() {
        match parse("Ghost", "test.pi") {
            Err(ParseError::UnknownConstant { name, .. }) => assert_eq!(name, "Ghost"),
            other => panic!("expected unknown-constant error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_arity_mismatch() {
        let source = "Relay(c,d) = c(x).d'<x>.0\nRelay(a)";
        match parse(source, "test.pi") {
            Err(ParseError::ArityMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected arity error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("a'<b>", "test.pi").is_err());
        assert!(parse("a(x.0", "test.pi").is_err());
        assert!(parse("", "test.pi").is_err());
    }
}
