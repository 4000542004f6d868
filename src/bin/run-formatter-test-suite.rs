#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::too_many_lines)]

use markup_stream::{Dialect, Formatter, Name, Token};
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::process::ExitCode;

pub(crate) fn test_main(
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    dialect: Dialect,
) -> Result<(), Box<dyn Error>> {
    let mut formatter = Formatter::new();
    formatter.set_dialect(dialect);
    formatter.set_output(stdout);

    let mut buf = io::BufReader::new(stdin);
    let mut line_buffer = String::with_capacity(1024);

    loop {
        line_buffer.clear();
        let n = buf.read_line(&mut line_buffer)?;
        if n == 0 {
            break;
        }
        let line = line_buffer.strip_suffix('\n').unwrap_or(&line_buffer);
        if line.is_empty() {
            continue;
        }

        let token = if let Some(rest) = line.strip_prefix("+ELM") {
            Token::ElementBegin(get_name(rest, false))
        } else if let Some(rest) = line.strip_prefix("=VOID") {
            Token::ElementVoid(get_name(rest, false))
        } else if let Some(rest) = line.strip_prefix("-ELM") {
            Token::ElementEnd(get_name(rest, false))
        } else if let Some(rest) = line.strip_prefix("=ATT") {
            Token::Attribute(get_name(rest, true))
        } else if let Some(rest) = line.strip_prefix("=TXT") {
            Token::Text(get_value(rest)?)
        } else if let Some(rest) = line.strip_prefix("=WSP") {
            Token::Whitespace(get_value(rest)?)
        } else if let Some(rest) = line.strip_prefix("=BLK ") {
            let (format, value) = rest.split_once(" :").ok_or("missing block value")?;
            Token::unparsed(String::from(format), unescape(value)?)
        } else if let Some(rest) = line.strip_prefix("+PFX") {
            let (prefix, namespace) = get_binding(rest)?;
            Token::prefix_begin(prefix, namespace)
        } else if let Some(rest) = line.strip_prefix("-PFX") {
            let (prefix, namespace) = get_binding(rest)?;
            Token::prefix_end(prefix, namespace)
        } else {
            return Err(format!("Unknown token: '{line}'").into());
        };

        formatter.emit(&token)?;
    }
    formatter.finish()?;
    Ok(())
}

fn get_namespace(rest: &str) -> Option<&str> {
    let (_, from_angle_open) = rest.split_once('<')?;
    let (until_angle_close, _) = from_angle_open.split_once('>')?;
    Some(until_angle_close)
}

fn get_name(rest: &str, is_attribute: bool) -> Name {
    let qname = rest
        .split_whitespace()
        .next()
        .filter(|word| !word.starts_with('<'))
        .unwrap_or_default();
    let (prefix, local_name) = Name::split_qualified(qname);
    let namespace = get_namespace(rest).unwrap_or_default();
    if is_attribute {
        Name::attribute_with_namespace(local_name, prefix, namespace)
    } else {
        Name::with_namespace(local_name, prefix, namespace)
    }
}

fn get_binding(rest: &str) -> Result<(&str, &str), Box<dyn Error>> {
    let namespace = get_namespace(rest).ok_or("missing namespace")?;
    let prefix = rest
        .split_whitespace()
        .next()
        .filter(|word| !word.starts_with('<'))
        .unwrap_or_default();
    Ok((prefix, namespace))
}

fn get_value(rest: &str) -> Result<String, Box<dyn Error>> {
    let value = rest.strip_prefix(" :").ok_or("missing value")?;
    unescape(value)
}

fn unescape(value: &str) -> Result<String, Box<dyn Error>> {
    let mut buffer = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            buffer.push(match chars.next().ok_or("unterminated escape sequence")? {
                '\\' => '\\',
                '0' => '\0',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                otherwise => return Err(format!("invalid escape character: {otherwise:?}").into()),
            });
        } else {
            buffer.push(ch);
        }
    }
    Ok(buffer)
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
            "Usage: run-formatter-test-suite [--xml] <test.tokens>...",
        );
        return ExitCode::FAILURE;
    }
    for arg in args {
        let mut stdin = match File::open(&arg) {
            Ok(file) => file,
            Err(err) => {
                let _ = writeln!(io::stderr(), "{arg}: {err}");
                return ExitCode::FAILURE;
            }
        };
        let mut stdout = io::stdout();
        let result = test_main(&mut stdin, &mut stdout, dialect);
        let _ = writeln!(stdout);
        if let Err(err) = result {
            let _ = writeln!(io::stderr(), "{err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
