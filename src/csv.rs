//! Minimal RFC 4180 field quoting and record splitting.

/// Appends `fields` as one CSV line (CRLF terminated) to `out`.
pub fn write_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

/// Splits CSV text into records, honouring quoted fields, `""` escapes, and
/// line breaks inside quotes. Blank lines are skipped.
///
/// Each record comes back with the one-based line it starts on. An
/// unterminated quote fails with the line where that quote opened.
pub fn parse_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, usize> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut start = 1;
    let mut quote_line = 1;

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => {
                in_quotes = true;
                quoted = true;
                quote_line = line;
            }
            (',', false) => fields.push(std::mem::take(&mut field)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, start, std::mem::take(&mut fields), quoted);
                quoted = false;
                line += 1;
                start = line;
            }
            (c, _) => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }

    if in_quotes {
        return Err(quote_line);
    }
    fields.push(field);
    push_record(&mut records, start, fields, quoted);
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>, quoted: bool) {
    if !quoted && fields.len() == 1 && fields[0].trim().is_empty() {
        return;
    }
    records.push((line, fields));
}
