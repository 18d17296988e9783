//! Line-oriented annotation shell driving an [`Annotator`].

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::engine::{
    AdvanceOutcome, AnnotationSet, Annotator, Backend, Confirm, NavigateOutcome, NoteTarget,
    StageEvent, UNSAVED_PROMPT, find_collisions,
};
use crate::model::{BracketType, Grid, RowId, TaskKey, TaskStatus};

mod commands;
use commands::command_defs;

mod parse;
use parse::{parse_index, parse_key, rest, tokenize};

mod render;
use render::{
    render_config, render_grid, render_outcome, render_skeleton, render_worklist, summary_line,
};

mod suggest;
use suggest::{resolve_command, suggest_commands};

const PREVIEW_ROWS: usize = 8;

#[derive(Clone, Copy, Debug)]
struct CommandDef {
    name: &'static str,
    aliases: &'static [&'static str],
    usage: &'static str,
    help: &'static str,
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> bool {
    if write!(out, "{} [y/N] ", prompt)
        .and_then(|_| out.flush())
        .is_err()
    {
        return false;
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}

pub struct Shell<B> {
    annotator: Annotator<B>,
    defs: Vec<CommandDef>,
    quit: bool,
}

impl<B: Backend> Shell<B> {
    pub fn new(annotator: Annotator<B>) -> Self {
        let mut defs = command_defs();
        defs.sort_by(|a, b| a.name.cmp(b.name));
        Self {
            annotator,
            defs,
            quit: false,
        }
    }

    pub fn annotator(&self) -> &Annotator<B> {
        &self.annotator
    }

    pub fn prompt(&self) -> String {
        match self.annotator.current() {
            None => "tabskel>".to_string(),
            Some(task) => {
                let mut marks = String::new();
                if task.edit_mode() {
                    marks.push_str(" edit");
                }
                if task.draft().is_dirty() {
                    marks.push('*');
                }
                format!("{}{}>", task.key(), marks)
            }
        }
    }

    /// Reads commands until `quit` or end of input. Yes/no questions are
    /// answered from the same input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        self.annotator.prefetch_config();
        let banner = match self.annotator.refresh_worklist() {
            Ok(worklist) => summary_line(&worklist.summary()),
            Err(err) => format!("error: {}", err),
        };
        writeln!(out, "{}", banner).context("write output")?;

        while !self.quit {
            write!(out, "{} ", self.prompt()).context("write prompt")?;
            out.flush().context("flush output")?;
            let mut line = String::new();
            if input.read_line(&mut line).context("read command")? == 0 {
                writeln!(out).context("write output")?;
                break;
            }

            let mut confirm = |prompt: &str| ask(&mut *input, &mut *out, prompt);
            let result = self.execute(line.trim(), &mut confirm);
            match result {
                Ok(lines) => {
                    for l in lines {
                        writeln!(out, "{}", l).context("write output")?;
                    }
                }
                Err(err) => writeln!(out, "error: {:#}", err).context("write output")?,
            }
        }
        Ok(())
    }

    /// Runs one command line and returns the lines to print.
    pub fn execute(&mut self, line: &str, confirm: &mut impl Confirm) -> Result<Vec<String>> {
        let tokens = tokenize(line).context("parse error")?;
        let Some((first, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };
        let first = first.to_lowercase();
        let Some(cmd) = resolve_command(&first, &self.defs) else {
            let hints = suggest_commands(&first, &self.defs);
            if hints.is_empty() {
                anyhow::bail!("unknown command: {} (try help)", first);
            }
            anyhow::bail!("unknown command: {} (did you mean {}?)", first, hints.join(", "));
        };
        tracing::debug!(command = cmd, args = args.len(), "shell command");

        match cmd {
            "help" => self.cmd_help(args),
            "tasks" => Ok(self.cmd_tasks()),
            "refresh" => {
                self.annotator.refresh_worklist()?;
                Ok(self.cmd_tasks())
            }
            "open" => self.cmd_open(args, confirm),
            "next" => self.cmd_next(confirm),
            "show" => self.cmd_show(),
            "skeleton" => {
                let draft = self.annotator.draft().context("no task is open")?;
                Ok(render_skeleton(&draft.skeleton))
            }
            "edit" => self.cmd_edit(args),
            "set" => {
                let row = parse_index(args.first(), "row")?;
                let col = parse_index(args.get(1), "column")?;
                let value = rest(args.get(2..).unwrap_or_default());
                let outcome = self.annotator.set_cell(row, col, &value)?;
                Ok(render_outcome(&outcome))
            }
            "insert-row" => {
                let at = parse_index(args.first(), "row")?;
                let outcome = self.annotator.insert_row_at(at)?;
                Ok(render_outcome(&outcome))
            }
            "remove-row" => {
                let at = parse_index(args.first(), "row")?;
                let outcome = self.annotator.remove_row(at)?;
                Ok(render_outcome(&outcome))
            }
            "insert-col" => {
                let at = parse_index(args.first(), "column")?;
                let outcome = self.annotator.insert_column_at(at)?;
                Ok(render_outcome(&outcome))
            }
            "remove-col" => {
                let at = parse_index(args.first(), "column")?;
                let outcome = self.annotator.remove_column(at)?;
                Ok(render_outcome(&outcome))
            }
            "y" => {
                let col = parse_index(args.first(), "column")?;
                self.annotator.toggle_y_column(col)?;
                Ok(Vec::new())
            }
            "x" => {
                let (id, label) = self.row_arg(args.first(), "")?;
                self.annotator.toggle_x_row(id, &label)?;
                Ok(Vec::new())
            }
            "core" => {
                let (id, label) = self.row_arg(args.first(), "")?;
                self.annotator.set_core_row(id, &label)?;
                Ok(Vec::new())
            }
            "fe" => {
                let (id, label) = self.row_arg(args.first(), "FE")?;
                self.annotator.toggle_fe_row(id, &label)?;
                Ok(Vec::new())
            }
            "obs" => {
                let (id, label) = self.row_arg(args.first(), "N")?;
                self.annotator.toggle_obs_row(id, &label)?;
                Ok(Vec::new())
            }
            "field" => self.cmd_field(args),
            "bracket" => self.cmd_bracket(args),
            "note" => self.cmd_note(args),
            "status" => self.cmd_status(args),
            "save" => {
                self.annotator.save()?;
                Ok(vec!["saved".to_string()])
            }
            "done" => {
                let outcome = self.annotator.save_and_advance(true)?;
                Ok(advance_lines(outcome))
            }
            "suggest" => self.cmd_suggest(args),
            "accept" => {
                let collisions = self.annotator.accept_suggestion()?;
                let mut lines = vec!["suggestion applied".to_string()];
                for c in collisions {
                    lines.push(format!("warning: rows {:?} share id {}", c.positions, c.id));
                }
                Ok(lines)
            }
            "reject" => {
                self.annotator.reject_suggestion()?;
                Ok(vec!["suggestion dropped".to_string()])
            }
            "image" => {
                let url = self.annotator.image_url().context("no task is open")?;
                Ok(vec![url])
            }
            "config" => Ok(render_config(self.annotator.config())),
            "quit" => self.cmd_quit(confirm),
            other => anyhow::bail!("unknown command: {}", other),
        }
    }

    /// Row position argument resolved to its logical id, plus a default
    /// label taken from the row's first data cell.
    fn row_arg(&self, arg: Option<&String>, fallback_label: &str) -> Result<(RowId, String)> {
        let pos = parse_index(arg, "row")?;
        let draft = self.annotator.draft().context("no task is open")?;
        let id = self
            .annotator
            .row_id_at(pos)
            .with_context(|| format!("no row at position {}", pos))?;
        let label = draft
            .grid
            .cell(pos, 1)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback_label)
            .to_string();
        Ok((id, label))
    }

    fn cmd_help(&self, args: &[String]) -> Result<Vec<String>> {
        if args.is_empty() {
            let mut lines = vec!["Commands:".to_string()];
            for d in &self.defs {
                lines.push(format!("- {:<10} {}", d.name, d.help));
            }
            lines.push(String::new());
            lines.push("Rows are addressed by the # column of `show`.".to_string());
            return Ok(lines);
        }

        let q = args[0].to_lowercase();
        let d = self
            .defs
            .iter()
            .find(|d| d.name == q || d.aliases.iter().any(|&a| a == q))
            .with_context(|| format!("unknown command: {}", q))?;
        let mut lines = vec![
            format!("{} - {}", d.name, d.help),
            String::new(),
            format!("usage: {}", d.usage),
        ];
        if !d.aliases.is_empty() {
            lines.push(format!("aliases: {}", d.aliases.join(", ")));
        }
        Ok(lines)
    }

    fn cmd_tasks(&self) -> Vec<String> {
        render_worklist(
            self.annotator.worklist(),
            self.annotator.current().map(|t| t.info()),
        )
    }

    fn cmd_open(&mut self, args: &[String], confirm: &mut impl Confirm) -> Result<Vec<String>> {
        let target = match args {
            [index] => {
                let i = parse_index(Some(index), "task number")?;
                self.annotator
                    .worklist()
                    .items()
                    .get(i)
                    .map(|t| t.key())
                    .with_context(|| format!("no task #{} (see `tasks`)", i))?
            }
            [paper, table] => TaskKey::new(paper.as_str(), table.as_str()),
            _ => anyhow::bail!("usage: open <paper> <table> | open <#>"),
        };
        self.navigate(&target, confirm)
    }

    fn cmd_next(&mut self, confirm: &mut impl Confirm) -> Result<Vec<String>> {
        let next = match self.annotator.current() {
            Some(_) => self.annotator.find_next().map(|t| t.key()),
            None => self
                .annotator
                .worklist()
                .items()
                .iter()
                .find(|t| t.status != TaskStatus::Done)
                .map(|t| t.key()),
        };
        let Some(next) = next else {
            return Ok(vec!["no pending tasks".to_string()]);
        };
        self.navigate(&next, confirm)
    }

    fn navigate(&mut self, target: &TaskKey, confirm: &mut impl Confirm) -> Result<Vec<String>> {
        match self.annotator.attempt_navigate(target, confirm)? {
            NavigateOutcome::Opened(key) => {
                let mut lines = vec![format!("opened {} (view mode; `edit` to change)", key)];
                let collisions = self
                    .annotator
                    .draft()
                    .map(|d| find_collisions(&d.grid))
                    .unwrap_or_default();
                for c in collisions {
                    lines.push(format!("warning: rows {:?} share id {}", c.positions, c.id));
                }
                Ok(lines)
            }
            NavigateOutcome::Declined => Ok(vec!["kept current task".to_string()]),
        }
    }

    fn cmd_show(&self) -> Result<Vec<String>> {
        let draft = self.annotator.draft().context("no task is open")?;
        let mut lines = render_grid(&draft.grid, &draft.skeleton);
        if let Some(rows) = self.annotator.stage().staged_rows() {
            lines.push(format!(
                "suggestion staged ({} rows); `accept` or `reject`",
                rows.len()
            ));
        }
        Ok(lines)
    }

    fn cmd_edit(&mut self, args: &[String]) -> Result<Vec<String>> {
        let on = match args.first().map(|s| s.to_lowercase()).as_deref() {
            None | Some("on") => true,
            Some("off") => false,
            Some(other) => anyhow::bail!("expected on or off, got '{}'", other),
        };
        self.annotator.set_edit_mode(on)?;
        Ok(vec![
            if on { "edit mode on" } else { "edit mode off" }.to_string(),
        ])
    }

    fn cmd_field(&mut self, args: &[String]) -> Result<Vec<String>> {
        let set: AnnotationSet = args
            .first()
            .context("missing annotation set")?
            .parse()
            .map_err(anyhow::Error::msg)?;
        let key = parse_key(args.get(1), "key")?;
        let field = args.get(2).context("missing field name")?;
        let value = rest(args.get(3..).unwrap_or_default());
        self.annotator.update_field(set, key, field, &value)?;
        Ok(Vec::new())
    }

    fn cmd_bracket(&mut self, args: &[String]) -> Result<Vec<String>> {
        match args {
            [kind] => {
                let bracket: BracketType = kind.parse().map_err(anyhow::Error::msg)?;
                self.annotator.set_bracket_default(bracket)?;
            }
            [row, col, kind] => {
                let (id, _) = self.row_arg(Some(row), "")?;
                let col = parse_index(Some(col), "column")?;
                let bracket = match kind.as_str() {
                    "clear" => None,
                    other => Some(other.parse::<BracketType>().map_err(anyhow::Error::msg)?),
                };
                self.annotator.set_bracket_override(id, col, bracket)?;
            }
            _ => anyhow::bail!("usage: bracket <type> | bracket <row#> <col> <type|clear>"),
        }
        Ok(Vec::new())
    }

    fn cmd_note(&mut self, args: &[String]) -> Result<Vec<String>> {
        let kind = args.first().context("missing note target (row, col or cell)")?;
        let (target, text) = match kind.as_str() {
            "row" => {
                let (id, _) = self.row_arg(args.get(1), "")?;
                (NoteTarget::Row(id), rest(args.get(2..).unwrap_or_default()))
            }
            "col" => {
                let col = parse_index(args.get(1), "column")?;
                (NoteTarget::Column(col), rest(args.get(2..).unwrap_or_default()))
            }
            "cell" => {
                let (id, _) = self.row_arg(args.get(1), "")?;
                let col = parse_index(args.get(2), "column")?;
                (NoteTarget::Cell(id, col), rest(args.get(3..).unwrap_or_default()))
            }
            other => anyhow::bail!("unknown note target '{}' (row, col or cell)", other),
        };
        self.annotator.set_note(target, &text)?;
        Ok(Vec::new())
    }

    fn cmd_status(&mut self, args: &[String]) -> Result<Vec<String>> {
        let status: TaskStatus = args
            .first()
            .context("missing status")?
            .parse()
            .map_err(anyhow::Error::msg)?;
        match self.annotator.mark_status(status)? {
            Some(outcome) => {
                let mut lines = vec![format!("saved as {}", status)];
                lines.extend(advance_lines(outcome));
                Ok(lines)
            }
            None => Ok(vec![format!("saved as {}", status)]),
        }
    }

    fn cmd_suggest(&mut self, args: &[String]) -> Result<Vec<String>> {
        let instruction = rest(args);
        let instruction = (!instruction.trim().is_empty()).then_some(instruction.as_str());
        match self.annotator.request_suggestion(instruction)? {
            StageEvent::Staged => {
                let rows = self.annotator.stage().staged_rows().unwrap_or_default();
                let preview = Grid::from_rows(rows.iter().take(PREVIEW_ROWS).cloned().collect());
                let skeleton = self
                    .annotator
                    .draft()
                    .map(|d| d.skeleton.clone())
                    .unwrap_or_default();
                let mut lines = vec![format!(
                    "suggestion staged ({} rows); `accept` or `reject`",
                    rows.len()
                )];
                lines.extend(render_grid(&preview, &skeleton));
                if rows.len() > PREVIEW_ROWS {
                    lines.push(format!("... {} more rows", rows.len() - PREVIEW_ROWS));
                }
                Ok(lines)
            }
            StageEvent::Stale => Ok(vec!["suggestion was superseded; ignored".to_string()]),
        }
    }

    fn cmd_quit(&mut self, confirm: &mut impl Confirm) -> Result<Vec<String>> {
        if self.annotator.is_dirty() {
            if !confirm.confirm(UNSAVED_PROMPT) {
                return Ok(vec!["not quitting; unsaved changes kept".to_string()]);
            }
            self.annotator.save()?;
        }
        self.quit = true;
        Ok(Vec::new())
    }
}

fn advance_lines(outcome: AdvanceOutcome) -> Vec<String> {
    match outcome {
        AdvanceOutcome::Opened(key) => vec![format!("opened {} in edit mode", key)],
        AdvanceOutcome::NoPending => vec!["all tasks are done".to_string()],
    }
}

#[cfg(test)]
#[path = "tests/shell/shell_tests.rs"]
mod tests;
