//! Structural-congruence canonicalization and the configuration key.
//!
//! Canonicalization rewrites a term into a distinguished representative of
//! its congruence class: inert subterms are absorbed, decided matches are
//! eliminated, restrictions float outward past parallel compositions, the
//! operand multisets of `+` and `|` are sorted, and binders are renamed to
//! position-derived canonical names. The serialized form of the result,
//! prefixed with the register contents, is the identity of a configuration.

use loris_dsl::ast::{Name, Process};

use crate::lts::Configuration;
use crate::pretty::pretty_register;

/// Bail-out bound for the sort/rename iteration. Reached only by terms whose
/// operand ordering never stabilizes; two rounds suffice in practice.
const MAX_NORMALIZE_ROUNDS: usize = 16;

/// Rewrite `process` to the canonical representative of its congruence class.
///
/// Idempotent: a second application returns the same term.
pub fn canonicalize(process: &mut Process) {
    let mut p = std::mem::replace(process, Process::Nil);
    // Renaming first makes every binder unique, so match elimination can
    // tell an input-bound name from a shadowing restriction exactly.
    p = alpha_normalize(p);
    p = simplify(p, &mut Vec::new());
    p = float_restrictions(p);

    // Operand sorting and alpha-renaming feed each other: sorting moves
    // binders, renaming changes the names sort keys contain. Iterate until
    // the serialization repeats; if the iteration falls into a cycle, the
    // lexicographically least member is the canonical form, which makes the
    // whole pass idempotent.
    let mut history: Vec<(String, Process)> = Vec::new();
    loop {
        p = sort_operands(p);
        p = alpha_normalize(p);
        let key = p.to_string();
        if let Some(pos) = history.iter().position(|(k, _)| *k == key) {
            if let Some((_, best)) = history[pos..].iter().min_by(|(a, _), (b, _)| a.cmp(b)) {
                p = best.clone();
            }
            break;
        }
        if history.len() >= MAX_NORMALIZE_ROUNDS {
            break;
        }
        history.push((key, p.clone()));
    }
    *process = p;
}

/// The textual identity of a configuration: sorted register contents
/// followed by the canonical term.
pub fn config_key(conf: &Configuration) -> String {
    format!("{} |- {}", pretty_register(&conf.register), conf.process)
}

/// Nil absorption and match elimination, bottom-up.
///
/// A match whose sides differ is undecided only while one side is still an
/// input binder waiting for its value; every other unequal pair is unequal
/// forever (free names are distinct constants, restricted names are distinct
/// from everything else).
fn simplify(p: Process, input_bound: &mut Vec<Name>) -> Process {
    match p {
        Process::Nil | Process::Call { .. } => p,
        Process::Output { chan, msg, next } => Process::Output {
            chan,
            msg,
            next: Box::new(simplify(*next, input_bound)),
        },
        Process::Input { chan, var, next } => {
            input_bound.push(var.clone());
            let next = simplify(*next, input_bound);
            input_bound.pop();
            Process::Input {
                chan,
                var,
                next: Box::new(next),
            }
        }
        Process::Match {
            left,
            right,
            negated,
            next,
        } => {
            let next = simplify(*next, input_bound);
            if left == right {
                if negated {
                    Process::Nil
                } else {
                    next
                }
            } else if input_bound.contains(&left) || input_bound.contains(&right) {
                Process::Match {
                    left,
                    right,
                    negated,
                    next: Box::new(next),
                }
            } else if negated {
                next
            } else {
                Process::Nil
            }
        }
        Process::Restrict { name, next } => {
            let next = simplify(*next, input_bound);
            if next == Process::Nil {
                Process::Nil
            } else {
                Process::Restrict {
                    name,
                    next: Box::new(next),
                }
            }
        }
        Process::Sum { left, right } => {
            let left = simplify(*left, input_bound);
            let right = simplify(*right, input_bound);
            match (left, right) {
                (Process::Nil, right) => right,
                (left, Process::Nil) => left,
                (left, right) => Process::Sum {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            }
        }
        Process::Par { left, right } => {
            let left = simplify(*left, input_bound);
            let right = simplify(*right, input_bound);
            match (left, right) {
                (Process::Nil, right) => right,
                (left, Process::Nil) => left,
                (left, right) => Process::Par {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            }
        }
        Process::Root { next } => Process::Root {
            next: Box::new(simplify(*next, input_bound)),
        },
        Process::PendingOut { msg, next } => Process::PendingOut {
            msg,
            next: Box::new(simplify(*next, input_bound)),
        },
        Process::PendingIn { var, next } => {
            input_bound.push(var.clone());
            let next = simplify(*next, input_bound);
            input_bound.pop();
            Process::PendingIn {
                var,
                next: Box::new(next),
            }
        }
    }
}

/// Scope extrusion: `($x.P) | Q` becomes `$x.(P | Q)` whenever `x` does not
/// occur free in `Q`, greedily, left side first.
pub(crate) fn float_restrictions(p: Process) -> Process {
    match p {
        Process::Par { left, right } => {
            let mut left = float_restrictions(*left);
            let mut right = float_restrictions(*right);
            if let Process::Restrict { name, next } = left {
                if !right.mentions_free(&name) {
                    let inner = Process::Par {
                        left: next,
                        right: Box::new(right),
                    };
                    return Process::Restrict {
                        name,
                        next: Box::new(float_restrictions(inner)),
                    };
                }
                left = Process::Restrict { name, next };
            }
            if let Process::Restrict { name, next } = right {
                if !left.mentions_free(&name) {
                    let inner = Process::Par {
                        left: Box::new(left),
                        right: next,
                    };
                    return Process::Restrict {
                        name,
                        next: Box::new(float_restrictions(inner)),
                    };
                }
                right = Process::Restrict { name, next };
            }
            Process::Par {
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        Process::Output { chan, msg, next } => Process::Output {
            chan,
            msg,
            next: Box::new(float_restrictions(*next)),
        },
        Process::Input { chan, var, next } => Process::Input {
            chan,
            var,
            next: Box::new(float_restrictions(*next)),
        },
        Process::Match {
            left,
            right,
            negated,
            next,
        } => Process::Match {
            left,
            right,
            negated,
            next: Box::new(float_restrictions(*next)),
        },
        Process::Restrict { name, next } => Process::Restrict {
            name,
            next: Box::new(float_restrictions(*next)),
        },
        Process::Sum { left, right } => Process::Sum {
            left: Box::new(float_restrictions(*left)),
            right: Box::new(float_restrictions(*right)),
        },
        Process::Root { next } => Process::Root {
            next: Box::new(float_restrictions(*next)),
        },
        Process::PendingOut { msg, next } => Process::PendingOut {
            msg,
            next: Box::new(float_restrictions(*next)),
        },
        Process::PendingIn { var, next } => Process::PendingIn {
            var,
            next: Box::new(float_restrictions(*next)),
        },
        Process::Nil | Process::Call { .. } => p,
    }
}

/// Sort the operand multisets of `+` and `|`, bottom-up.
fn sort_operands(p: Process) -> Process {
    match p {
        Process::Sum { .. } => {
            let mut ops = Vec::new();
            flatten(p, true, &mut ops);
            let mut ops: Vec<Process> = ops.into_iter().map(sort_operands).collect();
            ops.sort_by_cached_key(local_key);
            rebuild(ops, true)
        }
        Process::Par { .. } => {
            let mut ops = Vec::new();
            flatten(p, false, &mut ops);
            let mut ops: Vec<Process> = ops.into_iter().map(sort_operands).collect();
            ops.sort_by_cached_key(local_key);
            rebuild(ops, false)
        }
        Process::Output { chan, msg, next } => Process::Output {
            chan,
            msg,
            next: Box::new(sort_operands(*next)),
        },
        Process::Input { chan, var, next } => Process::Input {
            chan,
            var,
            next: Box::new(sort_operands(*next)),
        },
        Process::Match {
            left,
            right,
            negated,
            next,
        } => Process::Match {
            left,
            right,
            negated,
            next: Box::new(sort_operands(*next)),
        },
        Process::Restrict { name, next } => Process::Restrict {
            name,
            next: Box::new(sort_operands(*next)),
        },
        Process::Root { next } => Process::Root {
            next: Box::new(sort_operands(*next)),
        },
        Process::PendingOut { msg, next } => Process::PendingOut {
            msg,
            next: Box::new(sort_operands(*next)),
        },
        Process::PendingIn { var, next } => Process::PendingIn {
            var,
            next: Box::new(sort_operands(*next)),
        },
        Process::Nil | Process::Call { .. } => p,
    }
}

fn flatten(p: Process, sum: bool, acc: &mut Vec<Process>) {
    match p {
        Process::Sum { left, right } if sum => {
            flatten(*left, sum, acc);
            flatten(*right, sum, acc);
        }
        Process::Par { left, right } if !sum => {
            flatten(*left, sum, acc);
            flatten(*right, sum, acc);
        }
        other => acc.push(other),
    }
}

fn rebuild(ops: Vec<Process>, sum: bool) -> Process {
    let mut iter = ops.into_iter().rev();
    let mut acc = iter.next().expect("operator node with no operands");
    for op in iter {
        acc = if sum {
            Process::Sum {
                left: Box::new(op),
                right: Box::new(acc),
            }
        } else {
            Process::Par {
                left: Box::new(op),
                right: Box::new(acc),
            }
        };
    }
    acc
}

/// Alpha-invariant sort key for an operand: binders bound *within* the
/// operand are numbered locally in preorder, so the key does not depend on
/// the operand's position in the surrounding term. Names bound outside keep
/// their current spelling, which is identical for sibling operands.
fn local_key(p: &Process) -> String {
    let mut out = String::new();
    let mut scope: Vec<(Name, u32)> = Vec::new();
    let mut counter = 0u32;
    write_local_key(p, &mut scope, &mut counter, &mut out);
    out
}

fn write_local_key(p: &Process, scope: &mut Vec<(Name, u32)>, counter: &mut u32, out: &mut String) {
    fn put_name(n: &Name, scope: &[(Name, u32)], out: &mut String) {
        if let Some((_, k)) = scope.iter().rev().find(|(orig, _)| orig == n) {
            out.push('%');
            out.push_str(&k.to_string());
        } else {
            out.push_str(&n.to_string());
        }
    }
    match p {
        Process::Nil => out.push('0'),
        Process::Output { chan, msg, next } => {
            out.push('O');
            put_name(chan, scope, out);
            out.push(',');
            put_name(msg, scope, out);
            out.push('.');
            write_local_key(next, scope, counter, out);
        }
        Process::Input { chan, var, next } => {
            out.push('I');
            put_name(chan, scope, out);
            let k = *counter;
            *counter += 1;
            out.push('(');
            out.push('%');
            out.push_str(&k.to_string());
            out.push(')');
            scope.push((var.clone(), k));
            write_local_key(next, scope, counter, out);
            scope.pop();
        }
        Process::Match {
            left,
            right,
            negated,
            next,
        } => {
            out.push(if *negated { 'N' } else { 'M' });
            put_name(left, scope, out);
            out.push(',');
            put_name(right, scope, out);
            out.push('.');
            write_local_key(next, scope, counter, out);
        }
        Process::Restrict { name, next } => {
            out.push('R');
            let k = *counter;
            *counter += 1;
            out.push('%');
            out.push_str(&k.to_string());
            out.push('.');
            scope.push((name.clone(), k));
            write_local_key(next, scope, counter, out);
            scope.pop();
        }
        Process::Sum { left, right } => {
            out.push_str("S(");
            write_local_key(left, scope, counter, out);
            out.push(',');
            write_local_key(right, scope, counter, out);
            out.push(')');
        }
        Process::Par { left, right } => {
            out.push_str("P(");
            write_local_key(left, scope, counter, out);
            out.push(',');
            write_local_key(right, scope, counter, out);
            out.push(')');
        }
        Process::Call { name, args } => {
            out.push('C');
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                put_name(arg, scope, out);
            }
            out.push(')');
        }
        Process::Root { next } => write_local_key(next, scope, counter, out),
        Process::PendingOut { msg, next } => {
            out.push('W');
            put_name(msg, scope, out);
            out.push('.');
            write_local_key(next, scope, counter, out);
        }
        Process::PendingIn { var, next } => {
            out.push('V');
            let k = *counter;
            *counter += 1;
            out.push('%');
            out.push_str(&k.to_string());
            out.push('.');
            scope.push((var.clone(), k));
            write_local_key(next, scope, counter, out);
            scope.pop();
        }
    }
}

/// Rename every binder to `&k`, numbered by binder position in a preorder
/// traversal.
fn alpha_normalize(p: Process) -> Process {
    let mut counter = 1u32;
    alpha_walk(p, &mut Vec::new(), &mut counter)
}

fn resolve(n: Name, scope: &[(Name, Name)]) -> Name {
    scope
        .iter()
        .rev()
        .find(|(orig, _)| *orig == n)
        .map(|(_, renamed)| renamed.clone())
        .unwrap_or(n)
}

fn alpha_walk(p: Process, scope: &mut Vec<(Name, Name)>, counter: &mut u32) -> Process {
    match p {
        Process::Nil => Process::Nil,
        Process::Output { chan, msg, next } => {
            let chan = resolve(chan, scope);
            let msg = resolve(msg, scope);
            Process::Output {
                chan,
                msg,
                next: Box::new(alpha_walk(*next, scope, counter)),
            }
        }
        Process::Input { chan, var, next } => {
            let chan = resolve(chan, scope);
            let fresh = Name::Bound(*counter);
            *counter += 1;
            scope.push((var, fresh.clone()));
            let next = alpha_walk(*next, scope, counter);
            scope.pop();
            Process::Input {
                chan,
                var: fresh,
                next: Box::new(next),
            }
        }
        Process::Match {
            left,
            right,
            negated,
            next,
        } => Process::Match {
            left: resolve(left, scope),
            right: resolve(right, scope),
            negated,
            next: Box::new(alpha_walk(*next, scope, counter)),
        },
        Process::Restrict { name, next } => {
            let fresh = Name::Bound(*counter);
            *counter += 1;
            scope.push((name, fresh.clone()));
            let next = alpha_walk(*next, scope, counter);
            scope.pop();
            Process::Restrict {
                name: fresh,
                next: Box::new(next),
            }
        }
        Process::Sum { left, right } => Process::Sum {
            left: Box::new(alpha_walk(*left, scope, counter)),
            right: Box::new(alpha_walk(*right, scope, counter)),
        },
        Process::Par { left, right } => Process::Par {
            left: Box::new(alpha_walk(*left, scope, counter)),
            right: Box::new(alpha_walk(*right, scope, counter)),
        },
        Process::Call { name, args } => Process::Call {
            name,
            args: args.into_iter().map(|a| resolve(a, scope)).collect(),
        },
        Process::Root { next } => Process::Root {
            next: Box::new(alpha_walk(*next, scope, counter)),
        },
        Process::PendingOut { msg, next } => Process::PendingOut {
            msg: resolve(msg, scope),
            next: Box::new(alpha_walk(*next, scope, counter)),
        },
        Process::PendingIn { var, next } => {
            let fresh = Name::Bound(*counter);
            *counter += 1;
            scope.push((var, fresh.clone()));
            let next = alpha_walk(*next, scope, counter);
            scope.pop();
            Process::PendingIn {
                var: fresh,
                next: Box::new(next),
            }
        }
    }
}
