use super::CommandDef;

pub(super) fn score_match(q: &str, candidate: &str) -> i32 {
    let q = q.to_lowercase();
    let c = candidate.to_lowercase();
    if c == q {
        return 100;
    }
    if c.starts_with(&q) {
        return 50 - (c.len() as i32 - q.len() as i32);
    }
    if c.contains(&q) {
        return 10;
    }
    0
}

/// Commands resembling `q`, best first.
pub(super) fn suggest_commands(q: &str, defs: &[CommandDef]) -> Vec<&'static str> {
    let mut scored: Vec<(i32, &'static str)> = defs
        .iter()
        .filter_map(|d| {
            let best = d
                .aliases
                .iter()
                .map(|a| score_match(q, a))
                .fold(score_match(q, d.name), i32::max);
            (best > 0).then_some((best, d.name))
        })
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.cmp(b)));
    scored.into_iter().map(|(_, name)| name).take(3).collect()
}

/// Exact name, then alias, then an unambiguous name prefix.
pub(super) fn resolve_command(cmd: &str, defs: &[CommandDef]) -> Option<&'static str> {
    if let Some(d) = defs.iter().find(|d| d.name == cmd) {
        return Some(d.name);
    }
    if let Some(d) = defs.iter().find(|d| d.aliases.iter().any(|&a| a == cmd)) {
        return Some(d.name);
    }
    let matches: Vec<_> = defs.iter().filter(|d| d.name.starts_with(cmd)).collect();
    match matches.as_slice() {
        [only] => Some(only.name),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/shell/suggest_tests.rs"]
mod tests;
