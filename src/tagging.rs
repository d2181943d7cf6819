use crate::blocking::{Block, Label};
use crate::errors::UnlabeledBlockError;

/// Render a labeled record as inline tags, e.g.
/// `<nome>João Silva</nome><endereco>Rua das Flores</endereco>`.
///
/// Consecutive blocks with the same label end up inside one tag, their texts
/// joined by a space. The original text of a block is used when it's known,
/// its normalized value otherwise. `&`, `<` and `>` in the text are escaped.
pub fn render_tagged(blocks: &[Block]) -> Result<String, UnlabeledBlockError> {
    let mut rendered = String::new();
    let mut run: Option<(&Label, Vec<&str>)> = None;

    for (position, block) in blocks.iter().enumerate() {
        let label = block
            .label
            .as_ref()
            .ok_or(UnlabeledBlockError { position })?;
        let text = block.raw_value.as_deref().unwrap_or(&block.value);

        if let Some((current, texts)) = &mut run {
            if *current == label {
                texts.push(text);
                continue;
            }
        }

        if let Some((current, texts)) = run.take() {
            push_tag(&mut rendered, current, &texts);
        }
        run = Some((label, vec![text]));
    }

    if let Some((current, texts)) = run {
        push_tag(&mut rendered, current, &texts);
    }

    Ok(rendered)
}

fn push_tag(rendered: &mut String, label: &Label, texts: &[&str]) {
    rendered.push('<');
    rendered.push_str(label.as_str());
    rendered.push('>');
    for (i, text) in texts.iter().enumerate() {
        if i > 0 {
            rendered.push(' ');
        }
        push_escaped(rendered, text.trim());
    }
    rendered.push_str("</");
    rendered.push_str(label.as_str());
    rendered.push('>');
}

fn push_escaped(rendered: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => rendered.push_str("&amp;"),
            '<' => rendered.push_str("&lt;"),
            '>' => rendered.push_str("&gt;"),
            c => rendered.push(c),
        }
    }
}
