use anyhow::{Context, Result};

/// Splits a command line on whitespace; double quotes group words and `\`
/// escapes the next character.
pub(super) fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            cur.push(ch);
            escape = false;
            continue;
        }

        match ch {
            '\\' => {
                escape = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !cur.is_empty() || quoted {
                    out.push(std::mem::take(&mut cur));
                }
                quoted = false;
            }
            c => {
                cur.push(c);
            }
        }
    }

    if escape {
        anyhow::bail!("dangling escape");
    }
    if in_quotes {
        anyhow::bail!("unterminated quote");
    }
    if !cur.is_empty() || quoted {
        out.push(cur);
    }
    Ok(out)
}

pub(super) fn parse_index(arg: Option<&String>, what: &str) -> Result<usize> {
    let arg = arg.with_context(|| format!("missing {}", what))?;
    arg.parse::<usize>()
        .with_context(|| format!("invalid {} '{}'", what, arg))
}

pub(super) fn parse_key(arg: Option<&String>, what: &str) -> Result<i64> {
    let arg = arg.with_context(|| format!("missing {}", what))?;
    arg.parse::<i64>()
        .with_context(|| format!("invalid {} '{}'", what, arg))
}

/// Remaining arguments joined back into one value.
pub(super) fn rest(args: &[String]) -> String {
    args.join(" ")
}
