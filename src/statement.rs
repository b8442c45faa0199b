/// One line of an AnonLang program, classified by its leading keyword or
/// shape. Expression text is kept raw; variable substitution happens when
/// the statement runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `write <expr>`
    Write(String),
    /// `writeln` or `writeln <expr>`
    WriteLine(Option<String>),
    /// `var <name> = <expr>`
    Declare { name: String, initializer: String },
    /// `++<name>`
    Increment(String),
    /// `--<name>`
    Decrement(String),
    /// `repeat <count>`; the body is the next line.
    Repeat(String),
    /// `<name> = <expr>`
    Assign { name: String, expression: String },
}

impl Statement {
    /// Classify a line. Returns `None` when no statement form matches.
    pub fn parse(line: &str) -> Option<Statement> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("write ") {
            return Some(Statement::Write(rest.trim().to_string()));
        }
        if line == "writeln" {
            return Some(Statement::WriteLine(None));
        }
        if let Some(rest) = line.strip_prefix("writeln ") {
            let rest = rest.trim();
            return Some(Statement::WriteLine((!rest.is_empty()).then(|| rest.to_string())));
        }
        if let Some(rest) = line.strip_prefix("var ") {
            let (name, initializer) = rest.split_once('=').unwrap_or((rest, ""));
            return Some(Statement::Declare {
                name: name.trim().to_string(),
                initializer: initializer.trim().to_string(),
            });
        }
        if let Some(rest) = line.strip_prefix("++") {
            return Some(Statement::Increment(rest.trim().to_string()));
        }
        if let Some(rest) = line.strip_prefix("--") {
            return Some(Statement::Decrement(rest.trim().to_string()));
        }
        if let Some(rest) = line.strip_prefix("repeat ") {
            return Some(Statement::Repeat(rest.trim().to_string()));
        }

        let (name, expression) = line.split_once('=')?;
        let name = name.trim();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Statement::Assign { name: name.to_string(), expression: expression.trim().to_string() })
    }
}
