//! Graph exporters: GraphViz dot, dot2tex/TikZ, and machine-readable JSON.

use serde_json::json;

use loris_dsl::ast::{Name, Process};

use crate::lts::{Configuration, Lts, SymbolKind, TransitionLabel};
use crate::pretty::pretty_register;

/// Rendering options shared by the graph exporters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions {
    /// Label vertices `sN` instead of the full configuration.
    pub state_numbers: bool,
    /// Emit the A4 page layout block.
    pub a4: bool,
}

const A4_LAYOUT: &str = "    size=\"8.3,11.7!\";\n    ratio=\"fill\";\n    margin=0;\n    rankdir = TB;\n";

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Graph form of a label: `τ` for internal steps, otherwise the subject and
/// object with their freshness marks.
pub fn graph_label(label: &TransitionLabel) -> String {
    if label.is_tau() {
        return "τ".into();
    }
    format!(
        "{}{}",
        graph_symbol(label.subject.kind, label.subject.value),
        graph_symbol(label.object.kind, label.object.value)
    )
}

fn graph_symbol(kind: SymbolKind, value: usize) -> String {
    match kind {
        SymbolKind::Input => format!("{value} "),
        SymbolKind::Output => format!("{value}' "),
        SymbolKind::FreshInput => format!("{value}●"),
        SymbolKind::FreshOutput => format!("{value}⊛"),
        SymbolKind::Known => format!("{value}"),
        SymbolKind::Tau => "τ".into(),
    }
}

/// Render the LTS as a GraphViz digraph. The root is drawn with a double
/// outline, capacity-flagged states with a triple one.
pub fn export_dot(lts: &Lts, opts: &DotOptions) -> String {
    let mut out = String::from("digraph {\n");
    if opts.a4 {
        out.push_str(A4_LAYOUT);
    }
    out.push('\n');

    for (id, conf) in &lts.states {
        let config = if opts.state_numbers {
            format!("s{id}")
        } else {
            format!(
                "{} ⊢\n{}",
                pretty_register(&conf.register),
                conf.process
            )
        };
        let mut layout = String::new();
        if *id == 0 {
            layout.push_str("peripheries=2,");
        }
        if lts.reg_size_reached.contains(id) {
            layout.push_str("peripheries=3,");
        }
        out.push_str(&format!(
            "    s{id} [{layout}label=\"{}\"]\n",
            dot_escape(&config)
        ));
    }

    out.push('\n');
    for t in &lts.transitions {
        out.push_str(&format!(
            "    s{} -> s{} [label=\"{}\"]\n",
            t.source,
            t.destination,
            dot_escape(&graph_label(&t.label))
        ));
    }
    out.push_str("}\n");
    out
}

// ---------------------------------------------------------------------------
// dot2tex / TikZ flavor
// ---------------------------------------------------------------------------

/// Typeset a name: minted names become `a_k`, canonical binders `x_k`, free
/// names stay as written.
fn tex_name(name: &Name) -> String {
    match name {
        Name::Free(id) => id.clone(),
        Name::Fresh(k) => format!("a_{{{k}}}"),
        Name::Bound(k) => format!("x_{{{k}}}"),
    }
}

fn tex_process(p: &Process) -> String {
    match p {
        Process::Nil => "0".into(),
        Process::Output { chan, msg, next } => format!(
            "\\bar{{{}}} \\langle {} \\rangle . {}",
            tex_name(chan),
            tex_name(msg),
            tex_process(next)
        ),
        Process::Input { chan, var, next } => format!(
            "{} ( {} ) . {}",
            tex_name(chan),
            tex_name(var),
            tex_process(next)
        ),
        Process::Match {
            left,
            right,
            negated,
            next,
        } => {
            let op = if *negated { "\\neq" } else { "=" };
            format!(
                "\\lbrack {} {} {} \\rbrack . {}",
                tex_name(left),
                op,
                tex_name(right),
                tex_process(next)
            )
        }
        Process::Restrict { name, next } => {
            format!("\\nu {} . {}", tex_name(name), tex_process(next))
        }
        Process::Sum { left, right } => {
            format!("( {} + {} )", tex_process(left), tex_process(right))
        }
        Process::Par { left, right } => {
            format!("( {} \\mid {} )", tex_process(left), tex_process(right))
        }
        Process::Call { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                let args: Vec<String> = args.iter().map(tex_name).collect();
                format!("{}({})", name, args.join(", "))
            }
        }
        Process::Root { next } => tex_process(next),
        Process::PendingOut { msg, next } => format!(
            "\\langle {} \\rangle . {}",
            tex_name(msg),
            tex_process(next)
        ),
        Process::PendingIn { var, next } => format!(
            "( {} ) . {}",
            tex_name(var),
            tex_process(next)
        ),
    }
}

fn tex_register(conf: &Configuration) -> String {
    let mut out = String::from("\\{");
    for (i, (label, name)) in conf.register.entries().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("({},{})", label, tex_name(name)));
    }
    out.push_str("\\}");
    out
}

fn tex_symbol(kind: SymbolKind, value: usize) -> String {
    match kind {
        SymbolKind::Input | SymbolKind::Known => format!("{value}"),
        SymbolKind::Output => format!("\\bar{{{value}}}"),
        SymbolKind::FreshInput => format!("{value}^{{\\bullet}}"),
        SymbolKind::FreshOutput => format!("{value}^{{\\circledast}}"),
        SymbolKind::Tau => "\\tau".into(),
    }
}

fn tex_label(label: &TransitionLabel) -> String {
    if label.is_tau() {
        return "\\tau".into();
    }
    format!(
        "{} \\, {}",
        tex_symbol(label.subject.kind, label.subject.value),
        tex_symbol(label.object.kind, label.object.value)
    )
}

/// Render the LTS as a GraphViz digraph annotated for dot2tex (`texlbl`
/// attributes, TikZ output).
pub fn export_dot_tex(lts: &Lts, opts: &DotOptions) -> String {
    let mut out = String::from("digraph {\n");
    if opts.a4 {
        out.push_str(A4_LAYOUT);
    }
    out.push_str("    d2toptions=\"--format tikz --crop --autosize --nominsize\";\n");
    out.push_str("    d2tdocpreamble=\"\\usepackage{amssymb}\";\n\n");

    for (id, conf) in &lts.states {
        let config = if opts.state_numbers {
            format!("s_{{{id}}}")
        } else {
            format!(
                "\\begin{{matrix}} {} \\vdash \\\\ {} \\end{{matrix}}",
                tex_register(conf),
                tex_process(&conf.process)
            )
        };
        let mut layout = String::new();
        if *id == 0 {
            layout.push_str("style=\"double\",");
        }
        if lts.reg_size_reached.contains(id) {
            layout.push_str("style=\"thick\",");
        }
        out.push_str(&format!("    s{id} [{layout}texlbl=\"${config}$\"]\n"));
    }

    out.push('\n');
    for t in &lts.transitions {
        out.push_str(&format!(
            "    s{} -> s{} [label=\"\",texlbl=\"${}$\"]\n",
            t.source,
            t.destination,
            tex_label(&t.label)
        ));
    }
    out.push_str("}\n");
    out
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Machine-readable form of the LTS.
pub fn export_json(lts: &Lts) -> serde_json::Value {
    let states: Vec<serde_json::Value> = lts
        .states
        .iter()
        .map(|(id, conf)| {
            let register: Vec<serde_json::Value> = conf
                .register
                .entries()
                .map(|(label, name)| json!([label, name.to_string()]))
                .collect();
            json!({
                "id": id,
                "register": register,
                "process": conf.process.to_string(),
                "register_full": lts.reg_size_reached.contains(id),
            })
        })
        .collect();
    let transitions: Vec<serde_json::Value> = lts
        .transitions
        .iter()
        .map(|t| {
            json!({
                "source": t.source,
                "destination": t.destination,
                "rule": t.label.rule,
                "label": t.label.to_string(),
                "subject": t.label.subject,
                "object": t.label.object,
            })
        })
        .collect();
    json!({
        "states": states,
        "transitions": transitions,
        "states_explored": lts.states_explored,
        "states_generated": lts.states_generated,
    })
}
