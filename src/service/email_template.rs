use crate::types::import::ImportResult;

pub const IMPORT_EMAIL_SUBJECT: &str = "Your documents have been imported";

/// Minimal HTML escaping for text interpolated into the email body.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) links are rendered as anchors.
fn safe_link(url: &str) -> Option<&str> {
    let lower = url.trim_start().to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://")).then_some(url.trim())
}

/// HTML summary of an import run.
pub fn render_import_email(results: &[ImportResult]) -> String {
    let imported = results.iter().filter(|r| r.is_success()).count();
    let failed = results.len() - imported;

    let mut html = String::from(
        "<div style=\"font-family: -apple-system, Helvetica, Arial, sans-serif; color: #111;\">",
    );
    html.push_str("<h2>Your import is complete</h2>");
    let plural = if imported == 1 { "" } else { "s" };
    html.push_str(&format!(
        "<p>{imported} document{plural} imported successfully"
    ));
    if failed > 0 {
        html.push_str(&format!(", {failed} failed"));
    }
    html.push_str(".</p>");

    if !results.is_empty() {
        html.push_str("<ul>");
        for r in results {
            let title = escape_html(&r.title);
            html.push_str("<li>");
            match r.url.as_deref().and_then(safe_link) {
                Some(url) => {
                    html.push_str(&format!("<a href=\"{}\">{title}</a>", escape_html(url)))
                }
                None => html.push_str(&title),
            }
            if !r.is_success() {
                let reason = r.error.as_deref().unwrap_or("import failed");
                html.push_str(&format!(
                    " <span style=\"color: #b91c1c;\">({})</span>",
                    escape_html(reason)
                ));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }

    html.push_str(
        "<p>Your documents are now searchable in Amurex.</p><p>The Amurex team</p></div>",
    );
    html
}
