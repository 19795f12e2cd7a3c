//! Tree exporters
//!
//! Pure, recursive transforms of a [`List`] subtree into text, plain text,
//! JSON and OPML. Exporters only read name, note, completion state and
//! children — mirrors therefore render with their resolved content — and
//! never mutate the model.

use serde_json::{json, Value};

use crate::models::ROOT_ID;
use crate::services::list::List;
use crate::utils::{decode_entities, escape_xml, strip_tags};

/// Renders a list as indented text.
///
/// Each node contributes `- name`, with its note on the following line
/// indented by two extra spaces and children indented four more spaces
/// than their parent. The root (or the list itself when `omit_header` is
/// set) contributes no line of its own.
pub fn to_text(list: &List, omit_header: bool) -> String {
    render_text(list, omit_header, "")
}

fn render_text(list: &List, omit_header: bool, indent: &str) -> String {
    let mut text = Vec::new();
    let print_header = !omit_header && list.id() != ROOT_ID;
    if print_header {
        text.push(format!("{indent}- {}", list.name()));
        let note = list.note();
        if !note.is_empty() {
            text.push(format!("{indent}  {note}"));
        }
    }

    let child_indent = if print_header {
        format!("{indent}    ")
    } else {
        indent.to_string()
    };
    let chunks: Vec<String> = list
        .items()
        .iter()
        .map(|child| render_text(child, false, &child_indent))
        .collect();
    if !chunks.is_empty() {
        text.push(chunks.join("\n"));
    }

    text.join("\n")
}

/// Renders a list as plain text.
///
/// Completed nodes are prefixed with `[COMPLETE] `, HTML-ish tags are
/// stripped and the entities `&amp; &lt; &gt;` decoded, notes are wrapped
/// in literal quotes, and children are indented by two spaces. When called
/// on the root, top-level items are separated by blank lines.
pub fn to_plain_text(list: &List) -> String {
    if list.id() == ROOT_ID {
        list.items()
            .iter()
            .map(|child| render_plain(child, ""))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        render_plain(list, "")
    }
}

fn render_plain(list: &List, indent: &str) -> String {
    let mut lines = Vec::new();
    let marker = if list.is_completed() { "[COMPLETE] " } else { "" };
    lines.push(format!("{indent}{marker}{}", plain(&list.name())));

    let note = list.note();
    if !note.is_empty() {
        lines.push(format!("{indent}\"{}\"", plain(&note)));
    }

    let child_indent = format!("{indent}  ");
    for child in list.items() {
        lines.push(render_plain(&child, &child_indent));
    }
    lines.join("\n")
}

fn plain(text: &str) -> String {
    decode_entities(&strip_tags(text))
}

/// Renders a list as a JSON tree of
/// `{id, name, note, isCompleted, items}`.
pub fn to_json(list: &List) -> Value {
    json!({
        "id": list.id(),
        "name": list.name(),
        "note": list.note(),
        "isCompleted": list.is_completed(),
        "items": list.items().iter().map(to_json).collect::<Vec<_>>(),
    })
}

/// Renders a list as an OPML 2.0 document.
///
/// Attribute order is fixed as `_complete`, `text`, `_note`; leaf nodes
/// self-close; the root contributes no `<outline>` element of its own.
pub fn to_opml(list: &List) -> String {
    format!(
        "<?xml version=\"1.0\"?><opml version=\"2.0\"><body>{}</body></opml>",
        render_opml(list)
    )
}

fn render_opml(list: &List) -> String {
    let children: String = list.items().iter().map(render_opml).collect();
    if list.id() == ROOT_ID {
        return children;
    }

    let mut attributes = String::new();
    if list.is_completed() {
        attributes.push_str(" _complete=\"true\"");
    }
    attributes.push_str(&format!(" text=\"{}\"", escape_xml(&list.name())));
    let note = list.note();
    if !note.is_empty() {
        attributes.push_str(&format!(" _note=\"{}\"", escape_xml(&note)));
    }

    if children.is_empty() {
        format!("<outline{attributes} />")
    } else {
        format!("<outline{attributes}>{children}</outline>")
    }
}
