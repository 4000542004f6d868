#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::too_many_lines)]

use markup_stream::{Dialect, Name, Token, Tokenizer};
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;

pub(crate) fn test_main(
    input: &mut dyn io::BufRead,
    stdout: &mut dyn Write,
    dialect: Dialect,
) -> Result<(), Box<dyn Error>> {
    let mut tokenizer = Tokenizer::new();
    tokenizer.set_dialect(dialect);
    tokenizer.set_error_recovery(dialect != Dialect::Xml);
    tokenizer.set_input(input);

    for token in &mut tokenizer {
        let token = match token {
            Ok(token) => token,
            Err(err) => return Err(format!("Tokenize error: {err}").into()),
        };
        match &token {
            Token::ElementBegin(name) => {
                write!(stdout, "+ELM")?;
                print_name(stdout, name)?;
            }
            Token::ElementVoid(name) => {
                write!(stdout, "=VOID")?;
                print_name(stdout, name)?;
            }
            Token::ElementEnd(name) => {
                write!(stdout, "-ELM")?;
                print_name(stdout, name)?;
            }
            Token::Attribute(name) => {
                write!(stdout, "=ATT")?;
                print_name(stdout, name)?;
            }
            Token::Text(value) => {
                write!(stdout, "=TXT :")?;
                print_escaped(stdout, value)?;
            }
            Token::Whitespace(value) => {
                write!(stdout, "=WSP :")?;
                print_escaped(stdout, value)?;
            }
            Token::PrefixBegin { prefix, namespace } => {
                write!(stdout, "+PFX {prefix} <{namespace}>")?;
            }
            Token::PrefixEnd { prefix, namespace } => {
                write!(stdout, "-PFX {prefix} <{namespace}>")?;
            }
            Token::Unparsed { format, value } => {
                write!(stdout, "=BLK {format} :")?;
                print_escaped(stdout, value)?;
            }
        }
        writeln!(stdout)?;
    }
    Ok(())
}

fn print_name(stdout: &mut dyn Write, name: &Name) -> io::Result<()> {
    if !name.is_empty() {
        write!(stdout, " {name}")?;
    }
    if !name.namespace.is_empty() {
        write!(stdout, " <{}>", name.namespace)?;
    }
    Ok(())
}

fn print_escaped(stdout: &mut dyn Write, s: &str) -> io::Result<()> {
    for ch in s.bytes() {
        let repr: &[u8] = match &ch {
            b'\\' => b"\\\\",
            b'\0' => b"\\0",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            c => core::slice::from_ref(c),
        };
        stdout.write_all(repr)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1).peekable();
    let dialect = if args.peek().map(String::as_str) == Some("--xml") {
        args.next();
        Dialect::Xml
    } else {
        Dialect::Html
    };
    let args: Vec<String> = args.collect();
    if args.is_empty() {
        let _ = writeln!(
            io::stderr(),
            "Usage: run-tokenizer-test-suite [--xml] <in.html>...",
        );
        return ExitCode::FAILURE;
    }
    for arg in args {
        let file = match File::open(&arg) {
            Ok(file) => file,
            Err(err) => {
                let _ = writeln!(io::stderr(), "{arg}: {err}");
                return ExitCode::FAILURE;
            }
        };
        let mut input = BufReader::new(file);
        let mut stdout = io::stdout();
        let result = test_main(&mut input, &mut stdout, dialect);
        if let Err(err) = result {
            let _ = writeln!(io::stderr(), "{err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
