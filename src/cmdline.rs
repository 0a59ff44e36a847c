use crate::interpreter::{self, Interpreter};
use crate::printer::{pr_str, PrintMode};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Script(interpreter::Error),
    Usage(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IO(e) => write!(f, "{}", e),
            Error::Script(e) => write!(f, "{}", e),
            Error::Usage(program) => write!(f, "usage: {} [FILE]", program),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IO(e)
    }
}

impl From<interpreter::Error> for Error {
    fn from(e: interpreter::Error) -> Self {
        Self::Script(e)
    }
}

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("nelox")?;
    interface.set_prompt("nelox> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".nelox_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// Red when stderr is a terminal, plain otherwise.
pub fn paint_error(message: &str) -> String {
    match atty::is(atty::Stream::Stderr) {
        true => Red.paint(message).to_string(),
        false => message.to_owned(),
    }
}

/// Every line runs in one session, so definitions carry over. An error ends
/// the line it happened on, not the loop.
pub fn repl<T: Terminal>(interface: &Interface<T>, interpreter: &mut Interpreter) {
    let scope = interpreter.session();
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                match interpreter.interpret_in(&line, &scope) {
                    Ok(value) if value.is_nothing() => (),
                    Ok(value) => {
                        let text = pr_str(&value, PrintMode::ReadableRepresentation);
                        writeln!(interface, "{}", text).ok();
                    }
                    Err(e) => eprintln!("{}", paint_error(&e.to_string())),
                }
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

pub fn run_file(path: &str, interpreter: &mut Interpreter) -> Result<(), Error> {
    let source = std::fs::read_to_string(path)?;
    log::info!("running {}", path);
    interpreter.interpret(&source)?;
    Ok(())
}

pub fn launch(args: Vec<String>) -> Result<(), Error> {
    let mut interpreter = Interpreter::new();
    match args.as_slice() {
        [_] => {
            let interface = setup()?;
            repl(&interface, &mut interpreter);
            save_history(&interface)?;
            Ok(())
        }
        [_, path] => run_file(path, &mut interpreter),
        _ => Err(Error::Usage(
            args.first().cloned().unwrap_or_else(|| "nelox".to_owned()),
        )),
    }
}
