//! One-step successor generation.
//!
//! A prefix does not produce a successor in a single rewrite: it first
//! commits, turning into a `PendingIn`/`PendingOut` marker, and the partner
//! rule completes it — against a register name, a freshly minted name, or a
//! concurrent prefix on the same channel. Prefixes are located by *paths*
//! from the root (sequences of [`Step`]), and every successor is built by
//! deep-copying the configuration and rewriting the copy along the recorded
//! path, so successors never alias each other.

use std::collections::HashMap;

use loris_dsl::ast::{Definition, Name, Process};

use crate::congruence::{config_key, float_restrictions};
use crate::error::EngineError;
use crate::lts::{Configuration, RuleTag, Symbol, TransitionLabel};

/// Direction of one step along a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Left,
    Right,
}

/// Total unfoldings of process constants allowed while preparing one
/// configuration. A constant that reaches itself without passing a prefix
/// exhausts this immediately.
const UNFOLD_BUDGET: usize = 512;

/// The process-constant environment: `name -> (parameters, body)`.
#[derive(Debug, Default, Clone)]
pub struct DefinitionEnv {
    defs: HashMap<String, (Vec<String>, Process)>,
}

impl DefinitionEnv {
    pub fn new(defs: &[Definition]) -> Self {
        let mut map = HashMap::new();
        for def in defs {
            map.insert(def.name.clone(), (def.params.clone(), def.body.clone()));
        }
        DefinitionEnv { defs: map }
    }

    fn get(&self, name: &str) -> Option<&(Vec<String>, Process)> {
        self.defs.get(name)
    }
}

/// Marker for a derivation path that failed to resolve; converted into
/// [`EngineError::PathMismatch`] with the offending configuration attached
/// at the public boundary.
struct PathUnresolved;

type PathResult<T> = Result<T, PathUnresolved>;

fn path_error(conf: &Configuration) -> EngineError {
    EngineError::PathMismatch {
        state: config_key(conf),
    }
}

/// All one-step successors of `conf`, labeled, in the deterministic sweep
/// order: per input site Inp2A ascending over register labels then Inp2B,
/// then output sites (Out2 or OpenOut), then Comm pairs, then Close pairs.
/// Walks visit left operands before right ones throughout.
pub fn successors(
    conf: &Configuration,
    env: &DefinitionEnv,
) -> Result<Vec<(TransitionLabel, Configuration)>, EngineError> {
    let mut work = conf.clone();
    let mut budget = UNFOLD_BUDGET;
    let mut next_bound = max_bound_index(&work.process) + 1;
    unfold_constants(&mut work.process, env, &mut budget, &mut next_bound)?;
    // An unfolded body may expose restrictions that have to float above `|`
    // before Close pairs become visible.
    let unfolded = std::mem::replace(&mut work.process, Process::Nil);
    work.process = float_restrictions(unfolded);

    let inputs = collect_sites(&work.process, true);
    let outputs = collect_sites(&work.process, false);

    let mut out = Vec::new();
    for path in &inputs {
        derive_input(&work, path, &mut out)?;
    }
    for path in &outputs {
        derive_output(&work, path, &mut out)?;
    }
    derive_taus(&work, &outputs, &inputs, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Site collection and path navigation
// ---------------------------------------------------------------------------

/// Paths to every guarded-leftmost input (or output) prefix: the walk stops
/// at prefixes, descends decided matches only when they hold, and visits
/// both operands of `+` and `|`.
fn collect_sites(p: &Process, inputs: bool) -> Vec<Vec<Step>> {
    let mut acc = Vec::new();
    let mut cur = Vec::new();
    walk_sites(p, inputs, &mut cur, &mut acc);
    acc
}

fn walk_sites(p: &Process, inputs: bool, cur: &mut Vec<Step>, acc: &mut Vec<Vec<Step>>) {
    match p {
        Process::Nil | Process::Call { .. } => {}
        Process::Output { .. } => {
            if !inputs {
                acc.push(cur.clone());
            }
        }
        Process::Input { .. } => {
            if inputs {
                acc.push(cur.clone());
            }
        }
        Process::Match {
            left,
            right,
            negated,
            next,
        } => {
            if (left == right) != *negated {
                cur.push(Step::Next);
                walk_sites(next, inputs, cur, acc);
                cur.pop();
            }
        }
        Process::Restrict { next, .. }
        | Process::Root { next }
        | Process::PendingOut { next, .. }
        | Process::PendingIn { next, .. } => {
            cur.push(Step::Next);
            walk_sites(next, inputs, cur, acc);
            cur.pop();
        }
        Process::Sum { left, right } | Process::Par { left, right } => {
            cur.push(Step::Left);
            walk_sites(left, inputs, cur, acc);
            cur.pop();
            cur.push(Step::Right);
            walk_sites(right, inputs, cur, acc);
            cur.pop();
        }
    }
}

fn child<'a>(p: &'a Process, step: Step) -> Option<&'a Process> {
    match (p, step) {
        (Process::Output { next, .. }, Step::Next)
        | (Process::Input { next, .. }, Step::Next)
        | (Process::Match { next, .. }, Step::Next)
        | (Process::Restrict { next, .. }, Step::Next)
        | (Process::Root { next }, Step::Next)
        | (Process::PendingOut { next, .. }, Step::Next)
        | (Process::PendingIn { next, .. }, Step::Next) => Some(next),
        (Process::Sum { left, .. }, Step::Left) | (Process::Par { left, .. }, Step::Left) => {
            Some(left)
        }
        (Process::Sum { right, .. }, Step::Right) | (Process::Par { right, .. }, Step::Right) => {
            Some(right)
        }
        _ => None,
    }
}

fn child_mut<'a>(p: &'a mut Process, step: Step) -> Option<&'a mut Process> {
    match (p, step) {
        (Process::Output { next, .. }, Step::Next)
        | (Process::Input { next, .. }, Step::Next)
        | (Process::Match { next, .. }, Step::Next)
        | (Process::Restrict { next, .. }, Step::Next)
        | (Process::Root { next }, Step::Next)
        | (Process::PendingOut { next, .. }, Step::Next)
        | (Process::PendingIn { next, .. }, Step::Next) => Some(next),
        (Process::Sum { left, .. }, Step::Left) | (Process::Par { left, .. }, Step::Left) => {
            Some(left)
        }
        (Process::Sum { right, .. }, Step::Right) | (Process::Par { right, .. }, Step::Right) => {
            Some(right)
        }
        _ => None,
    }
}

fn node_at<'a>(p: &'a Process, path: &[Step]) -> Option<&'a Process> {
    let mut cur = p;
    for step in path {
        cur = child(cur, *step)?;
    }
    Some(cur)
}

/// Rewrite the node at `path` in place, leaving the surrounding structure
/// untouched. Used to plant commitment markers.
fn replace_at(
    p: &mut Process,
    path: &[Step],
    f: impl FnOnce(Process) -> PathResult<Process>,
) -> PathResult<()> {
    let mut cur = p;
    for step in path {
        cur = child_mut(cur, *step).ok_or(PathUnresolved)?;
    }
    let node = std::mem::replace(cur, Process::Nil);
    *cur = f(node)?;
    Ok(())
}

/// Rebuild the term with the node at `path` replaced by `finish`'s result,
/// collapsing the context along the way: sums keep only the branch taken,
/// decided matches are consumed, and — when `open` names a restricted binder
/// — that restriction is stripped and its scope renamed to the fresh name.
fn complete_at(
    p: Process,
    path: &[Step],
    open: Option<(&Name, &Name)>,
    finish: &mut dyn FnMut(Process) -> PathResult<Process>,
) -> PathResult<Process> {
    let Some((step, rest)) = path.split_first() else {
        return finish(p);
    };
    match (p, *step) {
        (Process::Root { next }, Step::Next) => Ok(Process::Root {
            next: Box::new(complete_at(*next, rest, open, finish)?),
        }),
        (Process::Restrict { name, next }, Step::Next) => {
            if let Some((target, fresh)) = open {
                if &name == target {
                    let mut body = *next;
                    body.substitute(&name, fresh);
                    return complete_at(body, rest, None, finish);
                }
            }
            Ok(Process::Restrict {
                name,
                next: Box::new(complete_at(*next, rest, open, finish)?),
            })
        }
        (Process::Match { next, .. }, Step::Next) => complete_at(*next, rest, open, finish),
        (Process::Sum { left, .. }, Step::Left) => complete_at(*left, rest, open, finish),
        (Process::Sum { right, .. }, Step::Right) => complete_at(*right, rest, open, finish),
        (Process::Par { left, right }, Step::Left) => Ok(Process::Par {
            left: Box::new(complete_at(*left, rest, open, finish)?),
            right,
        }),
        (Process::Par { left, right }, Step::Right) => Ok(Process::Par {
            left,
            right: Box::new(complete_at(*right, rest, open, finish)?),
        }),
        _ => Err(PathUnresolved),
    }
}

// ---------------------------------------------------------------------------
// Input derivations: Inp1 -> Inp2A / Inp2B
// ---------------------------------------------------------------------------

fn derive_input(
    work: &Configuration,
    path: &[Step],
    out: &mut Vec<(TransitionLabel, Configuration)>,
) -> Result<(), EngineError> {
    let node = node_at(&work.process, path).ok_or_else(|| path_error(work))?;
    let chan = match node {
        Process::Input { chan, .. } => chan.clone(),
        _ => return Err(path_error(work)),
    };
    let chan_label = match work.register.label_of(&chan) {
        Some(label) => label,
        // A restriction-bound channel is invisible to the environment; it
        // only ever fires through Comm/Close.
        None => match &chan {
            Name::Free(id) => {
                return Err(EngineError::UnregisteredName {
                    name: id.clone(),
                    state: config_key(work),
                })
            }
            _ => return Ok(()),
        },
    };

    // Inp1: commit the prefix.
    let mut committed = work.clone();
    replace_at(&mut committed.process, path, |node| match node {
        Process::Input { var, next, .. } => Ok(Process::PendingIn { var, next }),
        _ => Err(PathUnresolved),
    })
    .map_err(|_| path_error(work))?;

    // Inp2A: receive each already-known name, ascending label order.
    let known: Vec<(usize, Name)> = committed
        .register
        .entries()
        .map(|(label, name)| (label, name.clone()))
        .collect();
    for (label, value) in known {
        let mut succ = committed.clone();
        let p = std::mem::replace(&mut succ.process, Process::Nil);
        succ.process = complete_at(p, path, None, &mut |node| match node {
            Process::PendingIn { var, next } => {
                let mut body = *next;
                body.substitute(&var, &value);
                Ok(body)
            }
            _ => Err(PathUnresolved),
        })
        .map_err(|_| path_error(work))?;
        out.push((
            TransitionLabel {
                rule: RuleTag::Inp2A,
                subject: Symbol::input(chan_label),
                object: Symbol::known(label),
            },
            succ,
        ));
    }

    // Inp2B: receive a name the environment has never sent before.
    let mut succ = committed.clone();
    let (fresh_label, fresh_name) = succ.register.allocate_fresh();
    let p = std::mem::replace(&mut succ.process, Process::Nil);
    succ.process = complete_at(p, path, None, &mut |node| match node {
        Process::PendingIn { var, next } => {
            let mut body = *next;
            body.substitute(&var, &fresh_name);
            Ok(body)
        }
        _ => Err(PathUnresolved),
    })
    .map_err(|_| path_error(work))?;
    out.push((
        TransitionLabel {
            rule: RuleTag::Inp2B,
            subject: Symbol::input(chan_label),
            object: Symbol::fresh_input(fresh_label),
        },
        succ,
    ));
    Ok(())
}

// ---------------------------------------------------------------------------
// Output derivations: Out1 -> Out2 / OpenOut
// ---------------------------------------------------------------------------

fn derive_output(
    work: &Configuration,
    path: &[Step],
    out: &mut Vec<(TransitionLabel, Configuration)>,
) -> Result<(), EngineError> {
    let node = node_at(&work.process, path).ok_or_else(|| path_error(work))?;
    let (chan, msg) = match node {
        Process::Output { chan, msg, .. } => (chan.clone(), msg.clone()),
        _ => return Err(path_error(work)),
    };
    let chan_label = match work.register.label_of(&chan) {
        Some(label) => label,
        None => match &chan {
            Name::Free(id) => {
                return Err(EngineError::UnregisteredName {
                    name: id.clone(),
                    state: config_key(work),
                })
            }
            _ => return Ok(()),
        },
    };

    // Out1: commit the prefix.
    let mut committed = work.clone();
    replace_at(&mut committed.process, path, |node| match node {
        Process::Output { msg, next, .. } => Ok(Process::PendingOut { msg, next }),
        _ => Err(PathUnresolved),
    })
    .map_err(|_| path_error(work))?;

    if let Some(msg_label) = committed.register.label_of(&msg) {
        // Out2: the message is already known.
        let mut succ = committed;
        let p = std::mem::replace(&mut succ.process, Process::Nil);
        succ.process = complete_at(p, path, None, &mut |node| match node {
            Process::PendingOut { next, .. } => Ok(*next),
            _ => Err(PathUnresolved),
        })
        .map_err(|_| path_error(work))?;
        out.push((
            TransitionLabel {
                rule: RuleTag::Out2,
                subject: Symbol::output(chan_label),
                object: Symbol::known(msg_label),
            },
            succ,
        ));
        return Ok(());
    }

    if binder_on_path(&committed.process, path, &msg) {
        // OpenOut: the restriction is opened and the name registered.
        let mut succ = committed;
        let (fresh_label, fresh_name) = succ.register.allocate_fresh();
        let p = std::mem::replace(&mut succ.process, Process::Nil);
        succ.process = complete_at(p, path, Some((&msg, &fresh_name)), &mut |node| match node {
            Process::PendingOut { next, .. } => Ok(*next),
            _ => Err(PathUnresolved),
        })
        .map_err(|_| path_error(work))?;
        out.push((
            TransitionLabel {
                rule: RuleTag::OpenOut,
                subject: Symbol::output(chan_label),
                object: Symbol::fresh_output(fresh_label),
            },
            succ,
        ));
        return Ok(());
    }

    match &msg {
        Name::Free(id) => Err(EngineError::UnregisteredName {
            name: id.clone(),
            state: config_key(work),
        }),
        _ => Err(path_error(work)),
    }
}

/// True when a restriction binding `name` sits on the path from the root to
/// the site.
fn binder_on_path(p: &Process, path: &[Step], name: &Name) -> bool {
    let mut cur = p;
    for step in path {
        if let Process::Restrict { name: bound, .. } = cur {
            if bound == name {
                return true;
            }
        }
        match child(cur, *step) {
            Some(next) => cur = next,
            None => return false,
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Internal communication: Comm / Close
// ---------------------------------------------------------------------------

fn derive_taus(
    work: &Configuration,
    outputs: &[Vec<Step>],
    inputs: &[Vec<Step>],
    out: &mut Vec<(TransitionLabel, Configuration)>,
) -> Result<(), EngineError> {
    let mut comms = Vec::new();
    let mut closes = Vec::new();
    for op in outputs {
        for ip in inputs {
            let Some(split) = divergence(op, ip) else {
                continue;
            };
            // The prefixes must sit on opposite sides of one parallel; a sum
            // never lets its branches communicate.
            match node_at(&work.process, &op[..split]) {
                Some(Process::Par { .. }) => {}
                _ => continue,
            }
            let (ochan, msg) = match node_at(&work.process, op) {
                Some(Process::Output { chan, msg, .. }) => (chan.clone(), msg.clone()),
                _ => return Err(path_error(work)),
            };
            let ichan = match node_at(&work.process, ip) {
                Some(Process::Input { chan, .. }) => chan.clone(),
                _ => return Err(path_error(work)),
            };
            if ochan != ichan {
                continue;
            }
            if work.register.label_of(&msg).is_some() {
                comms.push((op, ip, msg));
            } else if binder_on_path(&work.process, &op[..split], &msg) {
                closes.push((op, ip, msg));
            } else {
                // A restricted message whose binder does not enclose both
                // branches: canonical configurations always float it out, so
                // this is a structural invariant violation.
                return Err(path_error(work));
            }
        }
    }
    for (op, ip, msg) in comms {
        let succ = build_tau(work, op, ip, &msg, None)?;
        out.push((TransitionLabel::tau(RuleTag::Comm), succ));
    }
    for (op, ip, msg) in closes {
        let succ = build_tau(work, op, ip, &msg, Some(()))?;
        out.push((TransitionLabel::tau(RuleTag::Close), succ));
    }
    Ok(())
}

/// First index at which the two paths take different directions, or `None`
/// when one is a prefix of the other.
fn divergence(a: &[Step], b: &[Step]) -> Option<usize> {
    for (i, (sa, sb)) in a.iter().zip(b.iter()).enumerate() {
        if sa != sb {
            return Some(i);
        }
    }
    None
}

fn build_tau(
    work: &Configuration,
    out_path: &[Step],
    in_path: &[Step],
    msg: &Name,
    close: Option<()>,
) -> Result<Configuration, EngineError> {
    let mut succ = work.clone();
    replace_at(&mut succ.process, out_path, |node| match node {
        Process::Output { msg, next, .. } => Ok(Process::PendingOut { msg, next }),
        _ => Err(PathUnresolved),
    })
    .map_err(|_| path_error(work))?;
    replace_at(&mut succ.process, in_path, |node| match node {
        Process::Input { var, next, .. } => Ok(Process::PendingIn { var, next }),
        _ => Err(PathUnresolved),
    })
    .map_err(|_| path_error(work))?;

    // Close mints a register name for the extruded binder; the restriction
    // itself stays, rebound to the minted name.
    let rebind = close.map(|()| succ.register.allocate_fresh().1);

    let p = std::mem::replace(&mut succ.process, Process::Nil);
    succ.process = complete_tau(p, out_path, in_path, msg, rebind.as_ref())
        .map_err(|_| path_error(work))?;
    Ok(succ)
}

/// Walk the shared context of the two committed prefixes, then complete each
/// side: the output continues as its continuation, the input continues with
/// the transmitted name substituted for its binder.
fn complete_tau(
    p: Process,
    out_path: &[Step],
    in_path: &[Step],
    msg: &Name,
    rebind: Option<&Name>,
) -> PathResult<Process> {
    let (os, o_rest) = out_path.split_first().ok_or(PathUnresolved)?;
    let (is, i_rest) = in_path.split_first().ok_or(PathUnresolved)?;

    if os == is {
        return match (p, *os) {
            (Process::Root { next }, Step::Next) => Ok(Process::Root {
                next: Box::new(complete_tau(*next, o_rest, i_rest, msg, rebind)?),
            }),
            (Process::Restrict { name, next }, Step::Next) => {
                if let Some(fresh) = rebind {
                    if &name == msg {
                        let mut body = *next;
                        body.substitute(&name, fresh);
                        return Ok(Process::Restrict {
                            name: fresh.clone(),
                            next: Box::new(complete_tau(body, o_rest, i_rest, fresh, None)?),
                        });
                    }
                }
                Ok(Process::Restrict {
                    name,
                    next: Box::new(complete_tau(*next, o_rest, i_rest, msg, rebind)?),
                })
            }
            (Process::Match { next, .. }, Step::Next) => {
                complete_tau(*next, o_rest, i_rest, msg, rebind)
            }
            (Process::Sum { left, .. }, Step::Left) => {
                complete_tau(*left, o_rest, i_rest, msg, rebind)
            }
            (Process::Sum { right, .. }, Step::Right) => {
                complete_tau(*right, o_rest, i_rest, msg, rebind)
            }
            (Process::Par { left, right }, Step::Left) => Ok(Process::Par {
                left: Box::new(complete_tau(*left, o_rest, i_rest, msg, rebind)?),
                right,
            }),
            (Process::Par { left, right }, Step::Right) => Ok(Process::Par {
                left,
                right: Box::new(complete_tau(*right, o_rest, i_rest, msg, rebind)?),
            }),
            _ => Err(PathUnresolved),
        };
    }

    // Divergence: one parallel node, prefixes on opposite sides.
    match p {
        Process::Par { left, right } => {
            let (out_side, in_side, out_on_left) = if *os == Step::Left {
                (*left, *right, true)
            } else {
                (*right, *left, false)
            };
            let out_done = complete_at(out_side, o_rest, None, &mut |node| match node {
                Process::PendingOut { next, .. } => Ok(*next),
                _ => Err(PathUnresolved),
            })?;
            let in_done = complete_at(in_side, i_rest, None, &mut |node| match node {
                Process::PendingIn { var, next } => {
                    let mut body = *next;
                    body.substitute(&var, msg);
                    Ok(body)
                }
                _ => Err(PathUnresolved),
            })?;
            let (left, right) = if out_on_left {
                (out_done, in_done)
            } else {
                (in_done, out_done)
            };
            Ok(Process::Par {
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        _ => Err(PathUnresolved),
    }
}

// ---------------------------------------------------------------------------
// Recursion unfolding
// ---------------------------------------------------------------------------

/// Unfold every exposed process constant, substituting arguments for
/// parameters. Constants guarded behind a prefix stay folded until the
/// prefix fires.
fn unfold_constants(
    p: &mut Process,
    env: &DefinitionEnv,
    budget: &mut usize,
    next_bound: &mut u32,
) -> Result<(), EngineError> {
    match p {
        Process::Call { name, args } => {
            let (params, body) = env.get(name).ok_or_else(|| EngineError::UnknownConstant {
                name: name.clone(),
            })?;
            if params.len() != args.len() {
                return Err(EngineError::ArityMismatch {
                    name: name.clone(),
                    expected: params.len(),
                    actual: args.len(),
                });
            }
            if *budget == 0 {
                return Err(EngineError::UnguardedRecursion { name: name.clone() });
            }
            *budget -= 1;
            let mut body = body.clone();
            // Freshen the body's binders so argument names can never be
            // captured, then wire in the arguments.
            alpha_freshen(&mut body, next_bound);
            for (param, arg) in params.iter().zip(args.iter()) {
                body.substitute(&Name::free(param.clone()), arg);
            }
            *p = body;
            unfold_constants(p, env, budget, next_bound)
        }
        Process::Match {
            left,
            right,
            negated,
            next,
        } => {
            if (left == right) != *negated {
                unfold_constants(next, env, budget, next_bound)
            } else {
                Ok(())
            }
        }
        Process::Restrict { next, .. }
        | Process::Root { next }
        | Process::PendingOut { next, .. }
        | Process::PendingIn { next, .. } => unfold_constants(next, env, budget, next_bound),
        Process::Sum { left, right } | Process::Par { left, right } => {
            unfold_constants(left, env, budget, next_bound)?;
            unfold_constants(right, env, budget, next_bound)
        }
        Process::Nil | Process::Output { .. } | Process::Input { .. } => Ok(()),
    }
}

/// Rename every binder in `p` to a fresh `&k`, counting upward from the
/// caller's counter.
fn alpha_freshen(p: &mut Process, counter: &mut u32) {
    match p {
        Process::Input { var, next, .. } => {
            let fresh = Name::Bound(*counter);
            *counter += 1;
            next.substitute(var, &fresh);
            *var = fresh;
            alpha_freshen(next, counter);
        }
        Process::Restrict { name, next } => {
            let fresh = Name::Bound(*counter);
            *counter += 1;
            next.substitute(name, &fresh);
            *name = fresh;
            alpha_freshen(next, counter);
        }
        Process::PendingIn { var, next } => {
            let fresh = Name::Bound(*counter);
            *counter += 1;
            next.substitute(var, &fresh);
            *var = fresh;
            alpha_freshen(next, counter);
        }
        Process::Output { next, .. }
        | Process::Match { next, .. }
        | Process::Root { next }
        | Process::PendingOut { next, .. } => alpha_freshen(next, counter),
        Process::Sum { left, right } | Process::Par { left, right } => {
            alpha_freshen(left, counter);
            alpha_freshen(right, counter);
        }
        Process::Nil | Process::Call { .. } => {}
    }
}

/// Largest `&k` index occurring anywhere in the term.
fn max_bound_index(p: &Process) -> u32 {
    fn of_name(n: &Name) -> u32 {
        match n {
            Name::Bound(k) => *k,
            _ => 0,
        }
    }
    match p {
        Process::Nil => 0,
        Process::Output { chan, msg, next } => of_name(chan)
            .max(of_name(msg))
            .max(max_bound_index(next)),
        Process::Input { chan, var, next } => of_name(chan)
            .max(of_name(var))
            .max(max_bound_index(next)),
        Process::Match {
            left, right, next, ..
        } => of_name(left)
            .max(of_name(right))
            .max(max_bound_index(next)),
        Process::Restrict { name, next } => of_name(name).max(max_bound_index(next)),
        Process::Sum { left, right } | Process::Par { left, right } => {
            max_bound_index(left).max(max_bound_index(right))
        }
        Process::Call { args, .. } => args.iter().map(of_name).max().unwrap_or(0),
        Process::Root { next } => max_bound_index(next),
        Process::PendingOut { msg, next } => of_name(msg).max(max_bound_index(next)),
        Process::PendingIn { var, next } => of_name(var).max(max_bound_index(next)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::congruence::canonicalize;
    use crate::lts::SymbolKind;
    use crate::register::Register;
    use loris_dsl::parse;

    fn config(source: &str) -> (Configuration, DefinitionEnv) {
        let program = parse(source, "test.pi").expect("parse");
        let env = DefinitionEnv::new(&program.defs);
        let conf = crate::explorer::root_configuration(&program, 64);
        (conf, env)
    }

    fn labels_of(succs: &[(TransitionLabel, Configuration)]) -> Vec<String> {
        succs.iter().map(|(l, _)| l.to_string()).collect()
    }

    #[test]
    fn plain_output_fires_once() {
        let (conf, env) = config("a'<b>.0");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(labels_of(&succs), vec!["1' 2"]);
        assert_eq!(succs[0].0.rule, RuleTag::Out2);
        let mut p = succs[0].1.process.clone();
        canonicalize(&mut p);
        assert_eq!(p.to_string(), "0");
    }

    #[test]
    fn input_over_known_names_then_fresh() {
        let (conf, env) = config("a(x).0");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(labels_of(&succs), vec!["1 1", "1 2*"]);
        assert_eq!(succs[0].0.rule, RuleTag::Inp2A);
        assert_eq!(succs[1].0.rule, RuleTag::Inp2B);
        // The fresh branch grew the register.
        assert_eq!(succs[1].1.register.len(), 2);
        assert_eq!(succs[1].1.register.lookup(2), Some(&Name::Fresh(1)));
    }

    #[test]
    fn substitution_reaches_the_continuation() {
        let (conf, env) = config("a(x).x'<x>.0");
        let succs = successors(&conf, &env).unwrap();
        // Receiving the known `a` turns the continuation into a'<a>.0.
        let mut p = succs[0].1.process.clone();
        canonicalize(&mut p);
        assert_eq!(p.to_string(), "a'<a>.0");
    }

    #[test]
    fn sum_collapses_to_the_branch_taken() {
        let (conf, env) = config("a'<b>.0 + c'<d>.0");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(succs.len(), 2);
        for (_, succ) in &succs {
            let mut p = succ.process.clone();
            canonicalize(&mut p);
            assert_eq!(p.to_string(), "0");
        }
    }

    #[test]
    fn parallel_keeps_the_sibling() {
        let (conf, env) = config("a'<b>.0 | c'<d>.0");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(succs.len(), 2);
        let mut p = succs[0].1.process.clone();
        canonicalize(&mut p);
        // One side fired, the other is untouched.
        assert!(p.to_string() == "a'<b>.0" || p.to_string() == "c'<d>.0");
    }

    #[test]
    fn communication_produces_tau() {
        let (conf, env) = config("a'<b>.0 | a(x).0");
        let succs = successors(&conf, &env).unwrap();
        let taus: Vec<_> = succs.iter().filter(|(l, _)| l.is_tau()).collect();
        assert_eq!(taus.len(), 1);
        assert_eq!(taus[0].0.rule, RuleTag::Comm);
        let mut p = taus[0].1.process.clone();
        canonicalize(&mut p);
        assert_eq!(p.to_string(), "0");
    }

    #[test]
    fn open_out_strips_the_restriction_and_registers_the_name() {
        let (conf, env) = config("$x.a'<x>.0");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(succs.len(), 1);
        let (label, succ) = &succs[0];
        assert_eq!(label.rule, RuleTag::OpenOut);
        assert_eq!(label.subject.kind, SymbolKind::Output);
        assert_eq!(label.object.kind, SymbolKind::FreshOutput);
        assert_eq!(succ.register.lookup(label.object.value), Some(&Name::Fresh(1)));
        let mut p = succ.process.clone();
        canonicalize(&mut p);
        assert_eq!(p.to_string(), "0");
    }

    #[test]
    fn private_channels_are_silent() {
        // The output on the restricted channel x is invisible; no successor.
        let (conf, env) = config("$x.x'<a>.0");
        let succs = successors(&conf, &env).unwrap();
        assert!(succs.is_empty());
    }

    #[test]
    fn private_channels_still_communicate() {
        let (conf, env) = config("$x.(x'<a>.0 | x(y).0)");
        let succs = successors(&conf, &env).unwrap();
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].0.rule, RuleTag::Comm);
    }

    #[test]
    fn close_extrudes_and_grows_the_register() {
        let (conf, env) = config("($b.a'<b>.0) | a(x).x'<x>.0");
        let succs = successors(&conf, &env).unwrap();
        let closes: Vec<_> = succs
            .iter()
            .filter(|(l, _)| l.rule == RuleTag::Close)
            .collect();
        assert_eq!(closes.len(), 1);
        let (label, succ) = closes[0];
        assert!(label.is_tau());
        assert_eq!(succ.register.len(), conf.register.len() + 1);
        let mut p = succ.process.clone();
        canonicalize(&mut p);
        assert_eq!(p.to_string(), "$&1.&1'<&1>.0");
    }

    #[test]
    fn unknown_constant_is_fatal() {
        let program = parse("a'<b>.0", "test.pi").unwrap();
        let mut process = Process::Root {
            next: Box::new(Process::Call {
                name: "Ghost".into(),
                args: vec![],
            }),
        };
        canonicalize(&mut process);
        let conf = Configuration {
            register: Register::seed(process.free_names(), 64),
            process,
        };
        let env = DefinitionEnv::new(&program.defs);
        match successors(&conf, &env) {
            Err(EngineError::UnknownConstant { name }) => assert_eq!(name, "Ghost"),
            other => panic!("expected unknown-constant error, got {other:?}"),
        }
    }

    #[test]
    fn unguarded_recursion_is_reported() {
        let (conf, env) = config("Loop = Loop | Loop\nLoop");
        match successors(&conf, &env) {
            Err(EngineError::UnguardedRecursion { name }) => assert_eq!(name, "Loop"),
            other => panic!("expected unguarded-recursion error, got {other:?}"),
        }
    }

    #[test]
    fn guarded_recursion_unfolds_once_per_step() {
        let (conf, env) = config("Relay = a(x).Relay\nRelay");
        let succs = successors(&conf, &env).unwrap();
        // One known name plus the fresh branch.
        assert_eq!(succs.len(), 2);
        for (_, succ) in &succs {
            let mut p = succ.process.clone();
            canonicalize(&mut p);
            assert_eq!(p.to_string(), "Relay");
        }
    }
}
