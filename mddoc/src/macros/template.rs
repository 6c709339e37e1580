use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("placeholder {{{index}}} needs {needed} argument(s), got {given}")]
    MissingArgument {
        index: usize,
        needed: usize,
        given: usize,
    },
    #[error("unbalanced brace at offset {0}")]
    UnbalancedBrace(usize),
}

/// Fill a positional template.
///
/// `{0}`, `{1}`, ... are replaced by the matching argument; `{{` and `}}`
/// produce literal braces. Surplus arguments are ignored.
pub fn instantiate(template: &str, args: &[String]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, n)| n == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut digits = String::new();
                while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                if digits.is_empty() || chars.next_if(|&(_, n)| n == '}').is_none() {
                    return Err(TemplateError::UnbalancedBrace(pos));
                }
                let index: usize = digits
                    .parse()
                    .map_err(|_| TemplateError::UnbalancedBrace(pos))?;
                let arg = args.get(index).ok_or(TemplateError::MissingArgument {
                    index,
                    needed: index + 1,
                    given: args.len(),
                })?;
                out.push_str(arg);
            }
            '}' => {
                if chars.next_if(|&(_, n)| n == '}').is_none() {
                    return Err(TemplateError::UnbalancedBrace(pos));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
