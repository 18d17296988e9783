use super::CommandDef;

pub(super) fn command_defs() -> Vec<CommandDef> {
    vec![
        CommandDef {
            name: "help",
            aliases: &["h", "?"],
            usage: "help [command]",
            help: "Show help",
        },
        CommandDef {
            name: "tasks",
            aliases: &["ls"],
            usage: "tasks",
            help: "List the worklist with status counts",
        },
        CommandDef {
            name: "refresh",
            aliases: &["r"],
            usage: "refresh",
            help: "Reload the worklist from the server",
        },
        CommandDef {
            name: "open",
            aliases: &["o"],
            usage: "open <paper> <table> | open <#>",
            help: "Open a task (asks before dropping unsaved edits)",
        },
        CommandDef {
            name: "next",
            aliases: &["n"],
            usage: "next",
            help: "Open the next task that is not done",
        },
        CommandDef {
            name: "show",
            aliases: &["grid"],
            usage: "show",
            help: "Print the grid draft with row ids and tags",
        },
        CommandDef {
            name: "skeleton",
            aliases: &["sk"],
            usage: "skeleton",
            help: "Print the skeleton draft",
        },
        CommandDef {
            name: "edit",
            aliases: &["e"],
            usage: "edit [on|off]",
            help: "Enter or leave edit mode",
        },
        CommandDef {
            name: "set",
            aliases: &[],
            usage: "set <row#> <col> <value>",
            help: "Set one cell",
        },
        CommandDef {
            name: "insert-row",
            aliases: &["ir"],
            usage: "insert-row <row#>",
            help: "Insert an empty row at a position",
        },
        CommandDef {
            name: "remove-row",
            aliases: &["rr"],
            usage: "remove-row <row#>",
            help: "Remove the row at a position",
        },
        CommandDef {
            name: "insert-col",
            aliases: &["ic"],
            usage: "insert-col <col>",
            help: "Insert an empty column at an index (not 0)",
        },
        CommandDef {
            name: "remove-col",
            aliases: &["rc"],
            usage: "remove-col <col>",
            help: "Remove the column at an index (not 0)",
        },
        CommandDef {
            name: "y",
            aliases: &[],
            usage: "y <col>",
            help: "Toggle a Y (outcome) column",
        },
        CommandDef {
            name: "x",
            aliases: &[],
            usage: "x <row#>",
            help: "Toggle an X (regressor) row",
        },
        CommandDef {
            name: "core",
            aliases: &[],
            usage: "core <row#>",
            help: "Mark a row as the key regressor",
        },
        CommandDef {
            name: "fe",
            aliases: &[],
            usage: "fe <row#>",
            help: "Toggle a fixed-effects row",
        },
        CommandDef {
            name: "obs",
            aliases: &[],
            usage: "obs <row#>",
            help: "Toggle an observation-count row",
        },
        CommandDef {
            name: "field",
            aliases: &["f"],
            usage: "field <y|x|fe|obs> <key> <field> <value>",
            help: "Set a field on a tagged column or row",
        },
        CommandDef {
            name: "bracket",
            aliases: &["br"],
            usage: "bracket <type> | bracket <row#> <col> <type|clear>",
            help: "Set the default or a per-cell bracket type",
        },
        CommandDef {
            name: "note",
            aliases: &[],
            usage: "note <row <row#>|col <col>|cell <row#> <col>> [text]",
            help: "Set or clear a note",
        },
        CommandDef {
            name: "status",
            aliases: &["st"],
            usage: "status <not_started|in_progress|done>",
            help: "Save with a status (done moves on)",
        },
        CommandDef {
            name: "save",
            aliases: &["w"],
            usage: "save",
            help: "Save grid and skeleton",
        },
        CommandDef {
            name: "done",
            aliases: &[],
            usage: "done",
            help: "Mark done, save, and open the next task",
        },
        CommandDef {
            name: "suggest",
            aliases: &["ai"],
            usage: "suggest [instruction]",
            help: "Ask the model for a corrected grid",
        },
        CommandDef {
            name: "accept",
            aliases: &[],
            usage: "accept",
            help: "Replace the grid draft with the staged suggestion",
        },
        CommandDef {
            name: "reject",
            aliases: &[],
            usage: "reject",
            help: "Drop the staged suggestion",
        },
        CommandDef {
            name: "image",
            aliases: &["img"],
            usage: "image",
            help: "Print the source image URL",
        },
        CommandDef {
            name: "config",
            aliases: &[],
            usage: "config",
            help: "Show the server configuration",
        },
        CommandDef {
            name: "quit",
            aliases: &["q", "exit"],
            usage: "quit",
            help: "Exit (asks before dropping unsaved edits)",
        },
    ]
}
