//! Small Markdown-to-HTML renderer for file previews.
//!
//! Supports headers, bold/italic, links, code spans and fenced blocks, `* `
//! lists and line breaks. Raw text is escaped before any markup is produced,
//! and each substitution runs over the output of the previous one. Markers
//! without a closing partner are left as text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(e) => panic!("hardcoded fallback regex must compile: {e}"),
        },
    }
}

static H3: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?m)^### (.*)$"));
static H2: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?m)^## (.*)$"));
static H1: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?m)^# (.*)$"));
static BOLD_ITALIC: Lazy<Regex> = Lazy::new(|| compile_regex(r"\*\*\*(.+?)\*\*\*"));
static BOLD_STAR: Lazy<Regex> = Lazy::new(|| compile_regex(r"\*\*(.+?)\*\*"));
static BOLD_UNDERSCORE: Lazy<Regex> = Lazy::new(|| compile_regex(r"__(.+?)__"));
// The opening marker must hug its text so `* item` list lines stay intact.
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| compile_regex(r"\*(\S.*?)\*"));
static ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| compile_regex(r"_(\S.*?)_"));
static LINK: Lazy<Regex> = Lazy::new(|| compile_regex(r"\[([^\]]+)\]\(([^)]+)\)"));
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| compile_regex(r"```\n?([^`]+?)\n?```"));
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| compile_regex(r"`([^`]+)`"));

pub fn render(raw: &str) -> String {
    let html = escape_html(&raw.replace("\r\n", "\n"));

    let html = H3.replace_all(&html, "<h3>${1}</h3>");
    let html = H2.replace_all(&html, "<h2>${1}</h2>");
    let html = H1.replace_all(&html, "<h1>${1}</h1>");

    // Best effort: overlapping markers such as `***a** b*` can close tags out of order.
    let html = BOLD_ITALIC.replace_all(&html, "<b><i>${1}</i></b>");
    let html = BOLD_STAR.replace_all(&html, "<b>${1}</b>");
    let html = BOLD_UNDERSCORE.replace_all(&html, "<b>${1}</b>");
    let html = ITALIC_STAR.replace_all(&html, "<i>${1}</i>");
    let html = ITALIC_UNDERSCORE.replace_all(&html, "<i>${1}</i>");

    let html = LINK.replace_all(&html, |caps: &Captures| {
        if is_safe_href(&caps[2]) {
            format!(r#"<a href="{}" target="_blank">{}</a>"#, &caps[2], &caps[1])
        } else {
            caps[1].to_string()
        }
    });

    let html = CODE_BLOCK.replace_all(&html, "<pre><code>${1}</code></pre>");
    let html = CODE_SPAN.replace_all(&html, "<code>${1}</code>");

    wrap_lists(&html).replace('\n', "<br>")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// http(s), mailto or scheme-less targets only; anything else renders as its label.
fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    let scheme_end = href.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if href[i..].starts_with(':') => {
            let scheme = href[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").filter(|item| !item.is_empty())
}

/// Turns `* ` lines into `<li>` and wraps each consecutive run in one `<ul>`.
fn wrap_lists(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n').peekable();
    let mut first = true;
    while let Some(line) = lines.next() {
        if !first {
            out.push('\n');
        }
        first = false;

        let Some(item) = list_item(line) else {
            out.push_str(line);
            continue;
        };
        out.push_str("<ul>");
        push_item(&mut out, item);
        while let Some(next) = lines.peek().copied().and_then(list_item) {
            push_item(&mut out, next);
            lines.next();
        }
        out.push_str("</ul>");
    }
    out
}

fn push_item(out: &mut String, item: &str) {
    out.push_str("<li>");
    out.push_str(item);
    out.push_str("</li>");
}
