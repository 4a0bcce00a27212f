//! Interactive read loop.
//!
//! Input is accumulated until `{} () []` balance out, then fed through the
//! shared session. Parse and runtime errors print and the loop continues;
//! only EOF or an interrupt on an empty line ends the session.

use std::io::Write as _;
use std::rc::Rc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use sqd_core::builtins::Host;
use sqd_core::session::Session;
use sqd_core::val::Val;

use sqd_core::include::{needs_continuation, try_parse_include};

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = " > ";

fn print_repl_help() {
    eprintln!("Commands: :quit | :exit | :q, :classes, :help");
}

pub fn run() -> Result<()> {
    let registry = Rc::new(sqd_stdlib::registry());
    let mut session = Session::new(Rc::clone(&registry), Host::new());
    let mut editor = DefaultEditor::new()?;

    let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
    println!("Hello {}! This is the Squid interpreter.", user);
    let classes = sqd_core::builtins::CLASS_NAMES.join(", ");
    println!("Available classes: {}\n", classes);

    loop {
        let mut acc = String::new();
        loop {
            let prompt = if acc.is_empty() { PROMPT } else { CONTINUATION_PROMPT };
            match editor.readline(prompt) {
                Ok(line) => {
                    acc.push_str(&line);
                    if needs_continuation(&acc) {
                        acc.push('\n');
                        continue;
                    }
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    eprintln!("^C");
                    acc.clear();
                    break;
                }
                Err(ReadlineError::Eof) => {
                    if acc.trim().is_empty() {
                        println!();
                        return Ok(());
                    }
                    break;
                }
                Err(e) => {
                    eprintln!("Readline error: {}", e);
                    acc.clear();
                    break;
                }
            }
        }

        let input = acc.trim().to_string();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        if let Some(command) = input.strip_prefix(':') {
            match command {
                "quit" | "exit" | "q" => return Ok(()),
                "classes" => println!("{}", sqd_core::builtins::CLASS_NAMES.join(", ")),
                "help" => print_repl_help(),
                other => eprintln!("Unknown command :{}. Type :help for help.", other),
            }
            continue;
        }

        if let Some(spec) = try_parse_include(&input) {
            if let Err(e) = session.include(&spec) {
                println!("Include error: {}", e);
            }
            continue;
        }

        match session.execute(&input) {
            Ok(Some(value)) if !matches!(value, Val::Null) => {
                println!("{}", value.inspect());
            }
            Ok(_) => {}
            Err(e) => {
                println!("{}", e);
            }
        }
        let _ = session.host.out.flush();
    }
}
