//! Plain-text printers for registers, labels, and whole transition systems.
//! All of them are pure functions of the LTS value.

use crate::lts::{Lts, TransitionLabel};
use crate::register::Register;

/// `{(1,a),(2,#1)}` — the register's sorted content.
pub fn pretty_register(reg: &Register) -> String {
    let mut out = String::from("{");
    for (i, (label, name)) in reg.entries().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("({label},{name})"));
    }
    out.push('}');
    out
}

/// Text form of a transition label: `1' 2`, `1 2*`, `t`.
pub fn pretty_label(label: &TransitionLabel) -> String {
    label.to_string()
}

/// Line-oriented rendering of the LTS: the root configuration first, then
/// one line per transition with its destination configuration. States whose
/// register hit capacity carry a `+` suffix.
pub fn pretty_lts(lts: &Lts) -> String {
    let Some(root) = lts.states.get(&0) else {
        return String::new();
    };
    let suffix = |id: usize| if lts.reg_size_reached.contains(&id) { "+" } else { "" };

    let mut out = format!(
        "s0{} = {} |- {}",
        suffix(0),
        pretty_register(&root.register),
        root.process
    );
    for t in &lts.transitions {
        let dst = &lts.states[&t.destination];
        out.push('\n');
        out.push_str(&format!(
            "s{}{}  {}  s{}{} = {} |- {}",
            t.source,
            suffix(t.source),
            t.label,
            t.destination,
            suffix(t.destination),
            pretty_register(&dst.register),
            dst.process
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::{explore, ExploreOptions};
    use loris_dsl::ast::Name;
    use loris_dsl::parse;

    #[test]
    fn register_form() {
        let reg = Register::seed([Name::free("a"), Name::Fresh(1)], 8);
        assert_eq!(pretty_register(&reg), "{(1,a),(2,#1)}");
        assert_eq!(pretty_register(&Register::seed([], 8)), "{}");
    }

    #[test]
    fn lts_lines() {
        let program = parse("a'<b>.0", "test.pi").unwrap();
        let lts = explore(&program, ExploreOptions::new(100)).unwrap();
        let text = pretty_lts(&lts);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "s0 = {(1,a),(2,b)} |- a'<b>.0");
        assert_eq!(lines[1], "s0  1' 2  s1 = {(1,a),(2,b)} |- 0");
    }
}
