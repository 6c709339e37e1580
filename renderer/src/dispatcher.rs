use std::path::Path;
use std::sync::LazyLock;

use mddoc::element::TITLE_LEVEL;
use mddoc::{BlockElement, Document, ElementKind, Parser, Warning};
use regex::Regex;

use crate::builder::{DocumentBuilder, ListKind};
use crate::context::ConversionContext;
use crate::error::RenderError;
use crate::formatting::Alignment;
use crate::inline::render_inline;
use crate::options::RenderOptions;

/// Deepest outline level a headline can carry.
const MAX_OUTLINE_LEVEL: i32 = 9;

static CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+").expect("invalid table cell separator regex"));

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a parsed document into `builder`.
///
/// A failing element is reported with its source line and skipped; every
/// element is followed by a paragraph break regardless.
pub fn render(
    document: &Document,
    builder: &mut dyn DocumentBuilder,
    options: &RenderOptions,
) -> Vec<Warning> {
    let mut ctx = ConversionContext::new(document.macros.clone(), options.clone());
    options.apply_to(builder.formatting_mut());
    ctx.capture_default_style(builder.formatting());

    for element in &document.elements {
        ctx.line = element.line;
        log::trace!("rendering {}", element);
        if let Err(err) = render_element(element, &mut ctx, builder) {
            ctx.warn(err.to_string());
        }
        if let Err(err) = builder.insert_paragraph() {
            ctx.warn(err.to_string());
        }
    }

    ctx.into_diagnostics()
}

/// Parse and render `source`. Parse warnings come first.
pub fn convert(
    source: &str,
    builder: &mut dyn DocumentBuilder,
    options: &RenderOptions,
) -> Vec<Warning> {
    let (document, mut diagnostics) = Parser::new(source).parse();
    diagnostics.extend(render(&document, builder, options));
    diagnostics
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

fn render_element(
    element: &BlockElement,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    ctx.apply_style("", builder.formatting_mut());

    match element.kind {
        ElementKind::PlainText => render_inline(element.text(), ctx, builder),
        ElementKind::BlockQuote => {
            let paragraph = &mut builder.formatting_mut().paragraph;
            paragraph.left_indent = 10.0;
            paragraph.space_before = 10.0;
            paragraph.space_after = 10.0;
            ctx.apply_style("blockquote", builder.formatting_mut());
            render_inline(element.text(), ctx, builder)
        }
        ElementKind::Headline => render_headline(element, ctx, builder),
        ElementKind::Image => render_image(element, ctx, builder),
        ElementKind::Command => {
            ctx.warn(format!(
                "skipped command `{}`; invalid position",
                element.text()
            ));
            Ok(())
        }
        ElementKind::UnorderedList => render_list(ListKind::Bullet, element, ctx, builder),
        ElementKind::OrderedList => render_list(ListKind::Numbered, element, ctx, builder),
        ElementKind::Table => render_table(element, ctx, builder),
    }
}

fn render_headline(
    element: &BlockElement,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let level = element
        .heading_level()
        .ok_or_else(|| RenderError::malformed(element.kind, "missing heading level"))?;

    ctx.apply_style("headline", builder.formatting_mut());
    let formatting = builder.formatting_mut();
    formatting.paragraph.space_before = 10.0;
    if level <= TITLE_LEVEL {
        formatting.font.size = if level == TITLE_LEVEL { 24.0 } else { 18.0 };
        formatting.paragraph.alignment = Alignment::Center;
    } else {
        formatting.paragraph.outline_level = level.min(MAX_OUTLINE_LEVEL) as u8;
        formatting.font.bold = true;
    }
    ctx.apply_style(&format!("headline{}", level), builder.formatting_mut());

    render_inline(element.text(), ctx, builder)
}

fn render_image(
    element: &BlockElement,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let Some(path) = element.args.first() else {
        ctx.warn("image directive needs at least 1 argument");
        return Ok(());
    };

    ctx.apply_style("image", builder.formatting_mut());
    builder.insert_image(Path::new(path))?;
    builder.insert_paragraph()?;
    if let Some(counter) = caption_counter(element) {
        write_caption(element, counter, ctx, builder)?;
    }
    Ok(())
}

fn render_list(
    kind: ListKind,
    element: &BlockElement,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    builder.start_list(kind)?;
    for item in element.items() {
        render_inline(item, ctx, builder)?;
        builder.insert_paragraph()?;
    }
    builder.end_list()?;
    Ok(())
}

fn render_table(
    element: &BlockElement,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    if let Some(counter) = caption_counter(element) {
        write_caption(element, counter, ctx, builder)?;
        builder.insert_paragraph()?;
    }

    ctx.apply_style("", builder.formatting_mut());
    ctx.apply_style("table", builder.formatting_mut());

    // First and last rows are delimiter lines.
    let rows = element.items();
    let data = match rows.len() {
        0..=2 => &[][..],
        n => &rows[1..n - 1],
    };

    builder.start_table()?;
    for row in data {
        for cell in split_cells(row) {
            builder.insert_cell()?;
            render_inline(cell, ctx, builder)?;
        }
        builder.end_row()?;
    }
    builder.end_table()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Counter name of a labelled image or table, if it has a caption.
fn caption_counter(element: &BlockElement) -> Option<&str> {
    if element.label.is_empty() {
        return None;
    }
    element
        .args
        .get(1)
        .map(String::as_str)
        .filter(|counter| !counter.is_empty())
}

/// Number the caption, bind the number to the element's label and write
/// `<counter><n>[ <words>]`.
fn write_caption(
    element: &BlockElement,
    counter: &str,
    ctx: &mut ConversionContext,
    builder: &mut dyn DocumentBuilder,
) -> Result<(), RenderError> {
    let value = ctx.counters.increment(counter);
    ctx.counters.set(element.label.as_str(), value);
    ctx.apply_style("caption", builder.formatting_mut());

    let mut caption = format!("{}{}", counter, value);
    let words = element.args.get(2..).unwrap_or_default();
    if !words.is_empty() {
        caption.push(' ');
        caption.push_str(&words.join(" "));
    }
    builder.write(&caption)?;
    Ok(())
}

/// Cells are `|`-separated when the row has a pipe, else tab-separated.
fn split_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    if row.contains('|') {
        let row = row.strip_prefix('|').unwrap_or(row);
        let row = row.strip_suffix('|').unwrap_or(row);
        row.split('|').map(str::trim).collect()
    } else {
        CELL_SEPARATOR.split(row).collect()
    }
}
