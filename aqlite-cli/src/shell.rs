/// Interactive REPL shell for AQL-lite
///
/// Line editing, history and keyword completion on top of a [`Session`].
/// AQL statements may span lines and run once a line ends with `;`.
/// Dot-commands cover the explorer operations that have no AQL form.

use crate::output::{print_deliveries, OutputFormat};
use crate::session::{Session, STORE_LABEL};
use anyhow::{Context, Result};
use aqlite_api::{Key, Request};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Helper,
};
use std::path::PathBuf;

const META_COMMANDS: &[&str] = &[
    ".help",
    ".exit",
    ".quit",
    ".format",
    ".timer",
    ".clear",
    ".namespaces",
    ".browse",
    ".delete",
    ".edit",
    ".truncate",
    ".connect",
    ".disconnect",
];

const AQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "PK",
];

/// Autocomplete helper for AQL keywords and dot-commands
#[derive(Clone, Default)]
struct AqlCompleter;

impl AqlCompleter {
    fn complete_meta(&self, line: &str) -> Vec<Pair> {
        META_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect()
    }

    fn complete_keyword(&self, word: &str) -> Vec<Pair> {
        let word_upper = word.to_uppercase();
        AQL_KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word_upper))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect()
    }
}

impl Completer for AqlCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_prefix = &line[..pos];

        if line_prefix.starts_with('.') && !line_prefix.contains(char::is_whitespace) {
            return Ok((0, self.complete_meta(line_prefix)));
        }

        let word_start = line_prefix
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map_or(0, |i| i + 1);
        Ok((word_start, self.complete_keyword(&line_prefix[word_start..])))
    }
}

impl Hinter for AqlCompleter {
    type Hint = String;
}

impl Highlighter for AqlCompleter {}

impl Validator for AqlCompleter {}

impl Helper for AqlCompleter {}

/// Parsed dot-command
#[derive(Debug, Clone, PartialEq)]
enum MetaCommand {
    Help,
    Exit,
    Format(Option<String>),
    Timer(Option<String>),
    Clear,
    Connect,
    Disconnect,
    Run(Request),
    Usage(&'static str),
    Unknown(String),
}

fn parse_meta(line: &str) -> MetaCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let arg = |i: usize| parts.get(i).map(|s| s.to_string());

    match parts.first().copied().unwrap_or("") {
        ".help" => MetaCommand::Help,
        ".exit" | ".quit" => MetaCommand::Exit,
        ".format" => MetaCommand::Format(arg(1)),
        ".timer" => MetaCommand::Timer(arg(1)),
        ".clear" => MetaCommand::Clear,
        ".connect" => MetaCommand::Connect,
        ".disconnect" => MetaCommand::Disconnect,
        ".namespaces" => MetaCommand::Run(Request::Catalogue),
        ".browse" => match parts.len() {
            2 | 3 => MetaCommand::Run(Request::Browse {
                namespace: parts[1].to_string(),
                set: arg(2),
            }),
            _ => MetaCommand::Usage(".browse <namespace> [set]"),
        },
        ".delete" => match parts.as_slice() {
            [_, namespace, set, key] => {
                MetaCommand::Run(Request::DeleteRecord(Key::new(*namespace, *set, *key)))
            }
            _ => MetaCommand::Usage(".delete <namespace> <set> <key>"),
        },
        ".edit" if parts.len() >= 6 => MetaCommand::Run(Request::EditBin {
            key: Key::new(parts[1], parts[2], parts[3]),
            bin: parts[4].to_string(),
            raw: parts[5..].join(" "),
        }),
        ".edit" => MetaCommand::Usage(".edit <namespace> <set> <key> <bin> <value>"),
        ".truncate" => match parts.as_slice() {
            [_, namespace, set] => MetaCommand::Run(Request::Truncate {
                namespace: namespace.to_string(),
                set: set.to_string(),
            }),
            _ => MetaCommand::Usage(".truncate <namespace> <set>"),
        },
        other => MetaCommand::Unknown(other.to_string()),
    }
}

/// Dot-commands are single line; AQL runs once the buffer ends with `;`
fn is_complete(buffer: &str) -> bool {
    buffer.starts_with('.') || buffer.trim_end().ends_with(';')
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".aqlite_history"))
        .unwrap_or_else(|| ".aqlite_history".into())
}

/// Interactive shell session state
pub struct Shell {
    session: Session,
    /// Line editor with history and autocomplete
    editor: rustyline::Editor<AqlCompleter, rustyline::history::FileHistory>,
    format: OutputFormat,
    show_timing: bool,
}

impl Shell {
    pub fn new(session: Session, format: OutputFormat) -> Result<Self> {
        let mut editor = rustyline::Editor::new().context("Failed to initialize line editor")?;
        editor.set_helper(Some(AqlCompleter));

        let history = history_path();
        if history.exists() {
            let _ = editor.load_history(&history);
        }

        Ok(Self {
            session,
            editor,
            format,
            show_timing: true,
        })
    }

    /// Run the interactive REPL until `.exit` or Ctrl+D
    pub fn run(mut self) -> Result<()> {
        self.print_welcome();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                format!("{} ", "aql>".green().bold())
            } else {
                format!("{}  ", "...>".dimmed())
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() && buffer.is_empty() {
                        continue;
                    }

                    if !buffer.is_empty() {
                        buffer.push(' ');
                    }
                    buffer.push_str(line);

                    if !is_complete(&buffer) {
                        continue;
                    }

                    let input = std::mem::take(&mut buffer);
                    let _ = self.editor.add_history_entry(input.as_str());

                    if input.starts_with('.') {
                        if !self.execute_meta(&input)? {
                            break;
                        }
                    } else {
                        self.run_request(Request::aql(input))?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading line: {}", err);
                    break;
                }
            }
        }

        println!();
        self.save_history();
        self.session.close();
        Ok(())
    }

    /// Run a dot-command. Returns false when the shell should exit.
    fn execute_meta(&mut self, line: &str) -> Result<bool> {
        match parse_meta(line) {
            MetaCommand::Help => self.show_help(),
            MetaCommand::Exit => return Ok(false),
            MetaCommand::Format(None) => {
                println!("Usage: .format <table|json|jsonl|csv>");
                println!("Current format: {:?}", self.format);
            }
            MetaCommand::Format(Some(name)) => match OutputFormat::parse(&name) {
                Some(format) => {
                    self.format = format;
                    println!("Output format set to: {:?}", self.format);
                }
                None => println!(
                    "{} {}. Use: table, json, jsonl or csv",
                    "Invalid format:".red(),
                    name
                ),
            },
            MetaCommand::Timer(value) => self.set_timer(value.as_deref()),
            MetaCommand::Clear => print!("\x1B[2J\x1B[1;1H"),
            MetaCommand::Connect => println!("{}", self.session.connect()),
            MetaCommand::Disconnect => println!("{}", self.session.disconnect()),
            MetaCommand::Run(request) => self.run_request(request)?,
            MetaCommand::Usage(usage) => println!("Usage: {}", usage),
            MetaCommand::Unknown(cmd) => {
                println!("{} {}", "Unknown command:".yellow(), cmd);
                println!("Type .help for available commands");
            }
        }
        Ok(true)
    }

    fn run_request(&mut self, request: Request) -> Result<()> {
        let start = std::time::Instant::now();
        let deliveries = self.session.run(request);
        let elapsed = start.elapsed();

        print_deliveries(&deliveries, self.format)?;
        if self.show_timing {
            println!("{}", format!("({:.2}ms)", elapsed.as_secs_f64() * 1000.0).dimmed());
        }
        Ok(())
    }

    fn set_timer(&mut self, value: Option<&str>) {
        match value.map(str::to_lowercase).as_deref() {
            Some("on" | "true" | "1") => self.show_timing = true,
            Some("off" | "false" | "0") => self.show_timing = false,
            Some(other) => {
                println!("{} {}. Use: on or off", "Invalid value:".red(), other);
                return;
            }
            None => {
                println!("Usage: .timer <on|off>");
                println!("Current: {}", if self.show_timing { "on" } else { "off" });
                return;
            }
        }
        println!("Timer {}", if self.show_timing { "enabled" } else { "disabled" });
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold());
        println!("\n  {}", "Meta-commands:".cyan());
        println!("    .help                                 Show this help message");
        println!("    .exit, .quit                          Exit the shell");
        println!("    .format <type>                        Set output format (table|json|jsonl|csv)");
        println!("    .timer <on|off>                       Toggle timing display");
        println!("    .clear                                Clear the screen");
        println!("    .namespaces                           List namespaces and sets");
        println!("    .browse <ns> [set]                    Scan a namespace or set");
        println!("    .delete <ns> <set> <key>              Delete one record");
        println!("    .edit <ns> <set> <key> <bin> <value>  Overwrite one bin");
        println!("    .truncate <ns> <set>                  Delete every record of a set");
        println!("    .connect, .disconnect                 Attach or detach the in-memory store");

        println!("\n  {}", "AQL Statements:".cyan());
        println!("    SELECT * FROM test.users;");
        println!("    SELECT name, age FROM test.users WHERE age = 30;");
        println!("    INSERT INTO test.users (Pk, name, age) VALUES ('u1', 'Ann', 30);");
        println!("    UPDATE test.users SET age = 31 WHERE pk = 'u1';");
        println!("    DELETE FROM test.users WHERE name = 'Ann';");

        println!("\n  {}", "Keyboard Shortcuts:".cyan());
        println!("    Ctrl+C             Cancel current input");
        println!("    Ctrl+D             Exit shell");
        println!("    Tab                Autocomplete commands and keywords");
        println!();
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "AQL-lite interactive shell".cyan().bold());
        println!("  {} {}", "Store:".cyan(), STORE_LABEL);
        println!(
            "  {} End statements with {}. Type {} for commands.",
            "Tip:".yellow().bold(),
            ";".bold(),
            ".help".bold()
        );
        println!();
    }

    fn save_history(&mut self) {
        if let Err(e) = self.editor.save_history(&history_path()) {
            eprintln!("{} could not save history: {}", "Warning:".yellow(), e);
        }
    }
}
