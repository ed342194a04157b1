use std::fmt;

/// Source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A channel name.
///
/// User-written names parse as `Free` and print verbatim. The engine mints
/// `Fresh` names when a restricted name escapes its scope or an input reads a
/// name the environment has never seen; they print as `#k`. `Bound` names are
/// the canonical spelling of binder occurrences after alpha-renaming and
/// print as `&k`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {
    Free(String),
    Fresh(u32),
    Bound(u32),
}

impl Name {
    pub fn free(id: impl Into<String>) -> Self {
        Name::Free(id.into())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Free(id) => write!(f, "{id}"),
            Name::Fresh(k) => write!(f, "#{k}"),
            Name::Bound(k) => write!(f, "&{k}"),
        }
    }
}

/// A pi-calculus process term.
///
/// `PendingOut` and `PendingIn` mark a prefix that has committed to act but
/// has not yet met its completing rule. They exist only inside one-step
/// derivations; a configuration handed to the explorer never contains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Process {
    /// The inert process `0`.
    Nil,
    /// Free output `c'<m>. P`.
    Output {
        chan: Name,
        msg: Name,
        next: Box<Process>,
    },
    /// Input `c(x). P`; `var` scopes over `next`.
    Input {
        chan: Name,
        var: Name,
        next: Box<Process>,
    },
    /// Match `[l=r] P` or, with `negated`, mismatch `[l!=r] P`.
    Match {
        left: Name,
        right: Name,
        negated: bool,
        next: Box<Process>,
    },
    /// Restriction `$x. P`; `name` scopes over `next`.
    Restrict { name: Name, next: Box<Process> },
    /// Non-deterministic choice `P + Q`.
    Sum { left: Box<Process>, right: Box<Process> },
    /// Parallel composition `P | Q`.
    Par { left: Box<Process>, right: Box<Process> },
    /// Invocation of a process constant, unfolded from its definition.
    Call { name: String, args: Vec<Name> },
    /// Marker for the top of a term.
    Root { next: Box<Process> },
    /// Output that has committed, awaiting its partner rule.
    PendingOut { msg: Name, next: Box<Process> },
    /// Input that has committed, awaiting its partner rule.
    PendingIn { var: Name, next: Box<Process> },
}

impl Process {
    /// Free names in deterministic left-to-right first-occurrence order.
    pub fn free_names(&self) -> Vec<Name> {
        let mut bound = Vec::new();
        let mut acc = Vec::new();
        self.collect_free(&mut bound, &mut acc);
        acc
    }

    fn collect_free(&self, bound: &mut Vec<Name>, acc: &mut Vec<Name>) {
        let record = |name: &Name, bound: &[Name], acc: &mut Vec<Name>| {
            if !bound.contains(name) && !acc.contains(name) {
                acc.push(name.clone());
            }
        };
        match self {
            Process::Nil => {}
            Process::Output { chan, msg, next } => {
                record(chan, bound, acc);
                record(msg, bound, acc);
                next.collect_free(bound, acc);
            }
            Process::Input { chan, var, next } => {
                record(chan, bound, acc);
                bound.push(var.clone());
                next.collect_free(bound, acc);
                bound.pop();
            }
            Process::Match {
                left, right, next, ..
            } => {
                record(left, bound, acc);
                record(right, bound, acc);
                next.collect_free(bound, acc);
            }
            Process::Restrict { name, next } => {
                bound.push(name.clone());
                next.collect_free(bound, acc);
                bound.pop();
            }
            Process::Sum { left, right } | Process::Par { left, right } => {
                left.collect_free(bound, acc);
                right.collect_free(bound, acc);
            }
            Process::Call { args, .. } => {
                for arg in args {
                    record(arg, bound, acc);
                }
            }
            Process::Root { next } => next.collect_free(bound, acc),
            Process::PendingOut { msg, next } => {
                record(msg, bound, acc);
                next.collect_free(bound, acc);
            }
            Process::PendingIn { var, next } => {
                bound.push(var.clone());
                next.collect_free(bound, acc);
                bound.pop();
            }
        }
    }

    /// True when `name` occurs free in the term.
    pub fn mentions_free(&self, name: &Name) -> bool {
        self.free_names().contains(name)
    }

    /// Replace every free occurrence of `from` by `to`.
    ///
    /// Substitution stops under a binder that rebinds `from`. Callers only
    /// ever substitute register names or freshly minted binders for names
    /// that are never themselves binders below, so capture cannot occur.
    pub fn substitute(&mut self, from: &Name, to: &Name) {
        let swap = |name: &mut Name| {
            if name == from {
                *name = to.clone();
            }
        };
        match self {
            Process::Nil => {}
            Process::Output { chan, msg, next } => {
                swap(chan);
                swap(msg);
                next.substitute(from, to);
            }
            Process::Input { chan, var, next } => {
                swap(chan);
                if var != from {
                    next.substitute(from, to);
                }
            }
            Process::Match {
                left, right, next, ..
            } => {
                swap(left);
                swap(right);
                next.substitute(from, to);
            }
            Process::Restrict { name, next } => {
                if name != from {
                    next.substitute(from, to);
                }
            }
            Process::Sum { left, right } | Process::Par { left, right } => {
                left.substitute(from, to);
                right.substitute(from, to);
            }
            Process::Call { args, .. } => {
                for arg in args.iter_mut() {
                    swap(arg);
                }
            }
            Process::Root { next } => next.substitute(from, to),
            Process::PendingOut { msg, next } => {
                swap(msg);
                next.substitute(from, to);
            }
            Process::PendingIn { var, next } => {
                if var != from {
                    next.substitute(from, to);
                }
            }
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, inside_prefix: bool) -> fmt::Result {
        match self {
            Process::Nil => write!(f, "0"),
            Process::Output { chan, msg, next } => {
                write!(f, "{chan}'<{msg}>.")?;
                next.fmt_prec(f, true)
            }
            Process::Input { chan, var, next } => {
                write!(f, "{chan}({var}).")?;
                next.fmt_prec(f, true)
            }
            Process::Match {
                left,
                right,
                negated,
                next,
            } => {
                let op = if *negated { "!=" } else { "=" };
                write!(f, "[{left}{op}{right}]")?;
                next.fmt_prec(f, true)
            }
            Process::Restrict { name, next } => {
                write!(f, "${name}.")?;
                next.fmt_prec(f, true)
            }
            Process::Sum { left, right } => {
                if inside_prefix {
                    write!(f, "(")?;
                }
                left.fmt_prec(f, true)?;
                write!(f, " + ")?;
                right.fmt_prec(f, true)?;
                if inside_prefix {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Process::Par { left, right } => {
                if inside_prefix {
                    write!(f, "(")?;
                }
                left.fmt_prec(f, true)?;
                write!(f, " | ")?;
                right.fmt_prec(f, true)?;
                if inside_prefix {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Process::Call { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Process::Root { next } => next.fmt_prec(f, inside_prefix),
            Process::PendingOut { msg, next } => {
                write!(f, "!<{msg}>.")?;
                next.fmt_prec(f, true)
            }
            Process::PendingIn { var, next } => {
                write!(f, "?({var}).")?;
                next.fmt_prec(f, true)
            }
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, false)
    }
}

/// A process-constant definition `Name(params) = body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub params: Vec<String>,
    pub body: Process,
    pub span: Span,
}

/// A parsed program: constant definitions followed by the root process.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub defs: Vec<Definition>,
    pub root: Process,
}

impl Program {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.defs.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(chan: &str, msg: &str, next: Process) -> Process {
        Process::Output {
            chan: Name::free(chan),
            msg: Name::free(msg),
            next: Box::new(next),
        }
    }

    #[test]
    fn free_names_in_traversal_order() {
        // c'<b>.0 | a(x).x'<d>.0 — x is bound, the rest free
        let p = Process::Par {
            left: Box::new(out("c", "b", Process::Nil)),
            right: Box::new(Process::Input {
                chan: Name::free("a"),
                var: Name::free("x"),
                next: Box::new(out("x", "d", Process::Nil)),
            }),
        };
        let free: Vec<String> = p.free_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(free, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn restriction_binds() {
        let p = Process::Restrict {
            name: Name::free("a"),
            next: Box::new(out("a", "b", Process::Nil)),
        };
        let free: Vec<String> = p.free_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(free, vec!["b"]);
    }

    #[test]
    fn substitute_respects_shadowing() {
        // a(x).x'<a>.0 with a := b rewrites the channel and the message,
        // but x(a)... binders rebinding the source name block the walk.
        let mut p = Process::Input {
            chan: Name::free("a"),
            var: Name::free("x"),
            next: Box::new(out("x", "a", Process::Nil)),
        };
        p.substitute(&Name::free("a"), &Name::free("b"));
        assert_eq!(p.to_string(), "b(x).x'<b>.0");

        let mut shadowed = Process::Input {
            chan: Name::free("c"),
            var: Name::free("a"),
            next: Box::new(out("a", "a", Process::Nil)),
        };
        shadowed.substitute(&Name::free("a"), &Name::free("b"));
        assert_eq!(shadowed.to_string(), "c(a).a'<a>.0");
    }

    #[test]
    fn display_parenthesizes_operators_under_prefixes() {
        let p = Process::Restrict {
            name: Name::free("x"),
            next: Box::new(Process::Sum {
                left: Box::new(Process::Nil),
                right: Box::new(out("x", "x", Process::Nil)),
            }),
        };
        assert_eq!(p.to_string(), "$x.(0 + x'<x>.0)");
    }

    #[test]
    fn display_fresh_and_bound_names() {
        assert_eq!(Name::Fresh(3).to_string(), "#3");
        assert_eq!(Name::Bound(7).to_string(), "&7");
    }
}
