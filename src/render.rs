use regex::RegexBuilder;

use crate::search::FacetCount;
use crate::store::Lesson;

pub fn loading_html() -> &'static str {
    r#"<li class="loading-message">Loading lessons...</li>"#
}

pub fn error_html() -> &'static str {
    r#"<li class="error-message">Error loading lessons</li>"#
}

pub fn empty_html() -> &'static str {
    r#"<li class="no-results">No lessons found</li>"#
}

pub fn result_count_label(count: usize) -> String {
    format!("{} {}", count, if count == 1 { "result" } else { "results" })
}

/// Results list markup: one entry per lesson in view order, or the
/// no-results placeholder.
pub fn hits_html(view: &[&Lesson], query: &str) -> String {
    if view.is_empty() {
        return empty_html().to_string();
    }
    view.iter().map(|lesson| hit_html(lesson, query)).collect()
}

fn hit_html(lesson: &Lesson, query: &str) -> String {
    let mut out = String::new();
    out.push_str(r#"<li class="ais-Hits-item"><div class="hit"><div class="hit-content">"#);
    out.push_str(&format!(
        r#"<div class="hit-header"><h2 class="hit-name">{}</h2><div class="hit-status"><span class="badge badge-success">✓ Ready</span></div></div>"#,
        highlight(&lesson.title, query)
    ));
    out.push_str(&format!(
        r#"<p class="hit-category-breadcrumb">Grade {} • {}</p>"#,
        escape_html(&lesson.grade_display()),
        escape_html(&lesson.subject_display())
    ));
    out.push_str(r#"<div class="hit-concepts">"#);
    for concept in &lesson.concepts {
        out.push_str(&format!(
            r#"<span class="concept-tag">{}</span>"#,
            escape_html(concept)
        ));
    }
    out.push_str("</div>");
    out.push_str(&format!(
        r#"<p class="hit-author">By {}"#,
        escape_html(&lesson.original_author)
    ));
    if let Some(revised_by) = &lesson.revised_by {
        out.push_str(&format!(" • Revised by {}", escape_html(revised_by)));
    }
    out.push_str("</p>");
    if let Some(date) = &lesson.date_finalized {
        out.push_str(&format!(
            r#"<div class="hit-footer"><span class="hit-date">Finalized: {}</span></div>"#,
            escape_html(date)
        ));
    }
    out.push_str(&format!(
        r#"<div class="hit-actions"><button class="btn-primary" data-link="{}">View Lesson →</button></div>"#,
        escape_html(&lesson.link)
    ));
    out.push_str("</div></div></li>");
    out
}

/// Facet panel markup: one checkbox per token with its count; checked state
/// mirrors the current selection.
pub fn facet_html(counts: &[FacetCount]) -> String {
    let mut out = String::new();
    for c in counts {
        out.push_str(&format!(
            r#"<li><label><input type="checkbox" value="{v}" class="facet-checkbox"{checked}><span class="facet-value">{v}</span><span class="facet-count">{n}</span></label></li>"#,
            v = escape_html(&c.value),
            checked = if c.selected { " checked" } else { "" },
            n = c.count
        ));
    }
    out
}

/// Wrap case-insensitive query matches in `<mark>`. The query is
/// regex-escaped first so characters like `(` or `+` can never change the
/// pattern; matching runs on the raw text and escaping happens per segment.
pub fn highlight(text: &str, query: &str) -> String {
    if query.trim().is_empty() {
        return escape_html(text);
    }
    let re = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(_) => return escape_html(text),
    };

    let mut out = String::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str("<mark>");
        out.push_str(&escape_html(m.as_str()));
        out.push_str("</mark>");
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
