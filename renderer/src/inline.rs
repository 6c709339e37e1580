//! Render-time pass over expanded element text.
//!
//! Literal text is written with the `_`, `*` and `~` toggles and `\`
//! escapes applied. Invocations still present after macro expansion are
//! looked up in the fixed intrinsic vocabulary below; anything else is
//! reported and dropped.

use mddoc::parser::{Invocation, find_invocations};

use crate::builder::{DocumentBuilder, NoteKind, Region};
use crate::context::ConversionContext;
use crate::error::RenderError;
use crate::formatting::Alignment;
use crate::options::SoftBreak;

/// Render one run of inline text into the current paragraph.
pub fn render_inline(
    text: &str,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let mut cursor = 0;
    for invocation in find_invocations(text) {
        write_literal(&text[cursor..invocation.span.start], ctx, builder)?;
        render_intrinsic(&invocation, ctx, builder)?;
        cursor = invocation.span.end;
    }
    write_literal(&text[cursor..], ctx, builder)
}

fn write_literal(
    text: &str,
    ctx: &ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let mut run = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    run.push(escaped);
                }
            }
            '_' | '*' | '~' => {
                flush(&mut run, builder)?;
                let formatting = builder.formatting_mut();
                match c {
                    '_' => formatting.toggle_underline(),
                    '*' => formatting.font.bold = !formatting.font.bold,
                    _ => formatting.font.strike_through = !formatting.font.strike_through,
                }
            }
            '\r' => {}
            '\n' => {
                if ctx.options.soft_break == SoftBreak::Space {
                    run.push(' ');
                }
            }
            _ => run.push(c),
        }
    }
    flush(&mut run, builder)
}

fn flush(run: &mut String, builder: &mut dyn DocumentBuilder) -> Result<(), RenderError> {
    if !run.is_empty() {
        builder.write(run)?;
        run.clear();
    }
    Ok(())
}

fn render_intrinsic(
    invocation: &Invocation,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let args = &invocation.args;
    match invocation.name.as_str() {
        "C" | "counter" => match args.first() {
            Some(name) => {
                let value = ctx.counters.increment(name);
                builder.write(&value.to_string())?;
            }
            None => ctx.warn("command `counter` needs at least 1 argument"),
        },
        "ref" => match args.first() {
            Some(name) => builder.write(&ctx.counters.get(name).to_string())?,
            None => ctx.warn("command `ref` needs at least 1 argument"),
        },
        "concat" => builder.write(&unescape(&args.concat()))?,
        "center" => builder.formatting_mut().paragraph.alignment = Alignment::Center,
        "justified" => builder.formatting_mut().paragraph.alignment = Alignment::Justify,
        "right" => builder.formatting_mut().paragraph.alignment = Alignment::Right,
        "header" => render_regions(&Region::HEADERS, &args.join(" "), ctx, builder)?,
        "footer" => render_regions(&Region::FOOTERS, &args.join(" "), ctx, builder)?,
        "wordfield" => match args.as_slice() {
            [kind, argument, ..] => builder.insert_field(
                &unescape(kind).to_uppercase(),
                Some(unescape(argument).to_uppercase().as_str()),
            )?,
            _ => ctx.warn("command `wordfield` needs 2 arguments"),
        },
        "pagenum" => builder.insert_field("PAGE", None)?,
        "numpages" => builder.insert_field("NUMPAGES", None)?,
        "style" => {
            let name = args.first().map_or("", String::as_str);
            if !ctx.apply_style(name, builder.formatting_mut()) {
                log::debug!("style `{}` is not defined", name);
            }
        }
        mddoc::parser::invocation::FOOTNOTE => {
            builder.insert_note(NoteKind::Footnote, &unescape(&args.join(" ")))?
        }
        mddoc::parser::invocation::ENDNOTE => {
            builder.insert_note(NoteKind::Endnote, &unescape(&args.join(" ")))?
        }
        other => ctx.warn(format!("unrecognized command `{}`", other)),
    }
    Ok(())
}

/// Drop each `\` and keep the character after it.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

/// Render `text` into every region of a header or footer set, then return
/// to the body even if one of the regions failed.
fn render_regions(
    regions: &[Region],
    text: &str,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let mut rendered = Ok(());
    for &region in regions {
        if let Err(err) = builder.move_to_region(region) {
            rendered = Err(err.into());
            break;
        }
        rendered = render_inline(text, ctx, builder);
        if rendered.is_err() {
            break;
        }
    }
    builder.move_to_body()?;
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RecordingBuilder;
    use crate::options::RenderOptions;
    use mddoc::MacroTable;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> (RecordingBuilder, ConversionContext) {
        let mut ctx = ConversionContext::new(MacroTable::new(), RenderOptions::default());
        let mut builder = RecordingBuilder::new();
        render_inline(text, &mut ctx, &mut builder).unwrap();
        (builder, ctx)
    }

    #[test]
    fn toggles_split_runs() {
        let (builder, _) = render("plain *bold* _under_ ~gone~");
        let runs: Vec<(&str, bool)> = builder
            .writes()
            .map(|(text, f)| (text, f.font.bold))
            .collect();
        assert_eq!(
            runs,
            vec![
                ("plain ", false),
                ("bold", true),
                (" ", false),
                ("under", false),
                (" ", false),
                ("gone", false),
            ]
        );
        let struck: Vec<&str> = builder
            .writes()
            .filter(|(_, f)| f.font.strike_through)
            .map(|(text, _)| text)
            .collect();
        assert_eq!(struck, vec!["gone"]);
    }

    #[test]
    fn escapes_write_literally() {
        let (builder, ctx) = render(r"50\% off \*really\* a\_b");
        assert_eq!(builder.body_text(), "50% off *really* a_b");
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn soft_breaks_follow_options() {
        let (builder, _) = render("line one\nline two");
        assert_eq!(builder.body_text(), "line oneline two");

        let mut ctx = ConversionContext::new(
            MacroTable::new(),
            RenderOptions {
                soft_break: SoftBreak::Space,
                ..Default::default()
            },
        );
        let mut builder = RecordingBuilder::new();
        render_inline("line one\nline two", &mut ctx, &mut builder).unwrap();
        assert_eq!(builder.body_text(), "line one line two");
    }

    #[test]
    fn counters_and_refs() {
        let (builder, _) = render("%C{Fig} %counter{Fig} %ref{Fig} %ref{Tab}");
        assert_eq!(builder.body_text(), "1 2 2 0");
    }

    #[test]
    fn fields_and_notes() {
        let (builder, _) = render("p%pagenum{}/%numpages{} %wordfield{date now}@{see this}^{later}");
        assert_eq!(
            builder.body_text(),
            "p{PAGE}/{NUMPAGES} {DATE NOW}[footnote: see this][endnote: later]"
        );
    }

    #[test]
    fn alignment_commands() {
        let (builder, _) = render("%right{}x");
        assert_eq!(builder.formatting().paragraph.alignment, Alignment::Right);
        let (builder, _) = render("%justified{}");
        assert_eq!(builder.formatting().paragraph.alignment, Alignment::Justify);
    }

    #[test]
    fn header_fills_every_region_and_returns() {
        let (builder, _) = render("before%header{Draft %pagenum{}}after");
        assert_eq!(builder.body_text(), "beforeafter");
        for region in Region::HEADERS {
            assert_eq!(builder.region_text(region), "Draft {PAGE}");
        }
        assert_eq!(builder.region_text(Region::FooterPrimary), "");
    }

    #[test]
    fn missing_arguments_and_unknown_names_warn() {
        let (builder, ctx) = render("a%counter{}b%wordfield{x}c%sparkle{1}d");
        assert_eq!(builder.body_text(), "abcd");
        let messages: Vec<&str> = ctx.diagnostics.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "command `counter` needs at least 1 argument",
                "command `wordfield` needs 2 arguments",
                "unrecognized command `sparkle`",
            ]
        );
    }

    #[test]
    fn escapes_are_resolved_in_written_arguments() {
        let (builder, ctx) = render(r"see@{a\ b \*c\*}%concat{x\% y}%wordfield{date\} now}");
        assert_eq!(
            builder.body_text(),
            "see[footnote: a b *c*]x%y{DATE} NOW}"
        );
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn concat_joins_without_separator() {
        let (builder, _) = render("%concat{a b c}");
        assert_eq!(builder.body_text(), "abc");
    }
}
