//! Browser-side preview documents.
//!
//! A preview document is a complete HTML page that runs an artifact's code in
//! the viewer's browser. It is served with [`CONTENT_SECURITY_POLICY`], whose
//! `sandbox` directive turns the page into an opaque origin: scripts run, but
//! the page has no cookies, no storage and no access to the embedding page.
//!
//! Server-side runs come back as fragments. Their markup is artifact output,
//! so a fragment never inlines it: it is an `<iframe sandbox="">` whose
//! `srcdoc` holds the escaped markup. Scripts and event handlers in it do
//! not run and remote resources are not fetched.

use appshelf_core::Artifact;

use super::{MountContent, RenderMode};

/// Header value served with every preview document.
pub const CONTENT_SECURITY_POLICY: &str = "sandbox allow-scripts; default-src 'none'; \
script-src 'unsafe-inline' 'unsafe-eval'; style-src 'unsafe-inline'; img-src data:";

/// Policy embedded in fragment documents, which never run scripts.
const FRAGMENT_POLICY: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src data:";

const INLINE_ERROR_STYLE: &str = "color: #e53e3e; padding: 10px;";

const BASE_STYLE: &str = "body { margin: 0; font-family: system-ui, sans-serif; } \
#app { padding: 8px; }";

const TILE_STYLE: &str = ".viewport { transform: scale(0.85); transform-origin: top left; \
width: 117.5%; height: 117.5%; overflow: hidden; }";

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Makes a JavaScript string literal safe inside a `<script>` element.
///
/// `</` can close the element (`</script`, in any case) and `<!--` can switch
/// the parser into script-data-escaped state. Both are rewritten with a
/// backslash that the JavaScript parser drops again.
pub fn escape_script(literal: &str) -> String {
    literal.replace("</", "<\\/").replace("<!--", "<\\!--")
}

fn layout(mode: RenderMode, app: &str) -> String {
    match mode {
        RenderMode::Tile => format!("<div class=\"viewport\">{}</div>", app),
        RenderMode::Detail => app.to_string(),
    }
}

fn style(mode: RenderMode) -> String {
    match mode {
        RenderMode::Tile => format!("{} {}", BASE_STYLE, TILE_STYLE),
        RenderMode::Detail => BASE_STYLE.to_string(),
    }
}

/// Builds the preview page for `artifact`.
///
/// The code is embedded as a string and compiled with `new Function` inside
/// `try/catch`, so syntax errors are caught the same way as runtime errors
/// and shown inside `#app`.
pub fn document(artifact: &Artifact, mode: RenderMode) -> String {
    // Serializing a str cannot fail.
    let source = serde_json::to_string(&artifact.code).unwrap_or_else(|_| "\"\"".to_string());
    let source = escape_script(&source);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
<script>
(function () {{
  var source = {source};
  try {{
    new Function(source)();
  }} catch (error) {{
    var app = document.getElementById('app');
    var box = document.createElement('div');
    box.setAttribute('style', '{error_style}');
    box.textContent = 'Error: ' + (error && error.message ? error.message : String(error));
    app.innerHTML = '';
    app.appendChild(box);
  }}
}})();
</script>
</body>
</html>
"#,
        title = escape_html(&artifact.title),
        style = style(mode),
        body = layout(mode, "<div id=\"app\"></div>"),
        source = source,
        error_style = INLINE_ERROR_STYLE,
    )
}

/// Renders the outcome of a server-side run as an inert iframe using the
/// same layout contract as [`document`].
pub fn fragment(content: &MountContent, mode: RenderMode) -> String {
    let inner = match content {
        MountContent::Html(html) => html.clone(),
        MountContent::InlineError(message) => format!(
            "<div style=\"{}\">Error: {}</div>",
            INLINE_ERROR_STYLE,
            escape_html(message)
        ),
    };
    let page = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
<meta http-equiv=\"Content-Security-Policy\" content=\"{policy}\">\
<style>{style}</style></head><body>{body}</body></html>",
        policy = FRAGMENT_POLICY,
        style = style(mode),
        body = layout(mode, &format!("<div id=\"app\">{}</div>", inner)),
    );
    format!(
        "<iframe class=\"appshelf-preview\" sandbox=\"\" srcdoc=\"{}\"></iframe>",
        escape_html(&page)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use appshelf_core::{ArtifactId, Owner};
    use chrono::Utc;

    fn artifact(title: &str, code: &str) -> Artifact {
        Artifact {
            id: ArtifactId::new("demo1"),
            title: title.to_string(),
            code: code.to_string(),
            tags: vec![],
            author: "Demo".to_string(),
            created_at: Utc::now(),
            owner_id: Owner::Anonymous,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b class="x">Tom & 'Jerry'</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_escape_script_neutralizes_closing_tags() {
        let escaped = escape_script(r#""a</SCRIPT><script>b</script><!--c""#);
        assert!(!escaped.to_lowercase().contains("</script"));
        assert!(!escaped.contains("<!--"));
        assert_eq!(escaped, r#""a<\/SCRIPT><script>b<\/script><\!--c""#);
    }

    #[test]
    fn test_document_cannot_break_out_of_script() {
        let doc = document(
            &artifact("x", "document.body.innerHTML = '</script><img src=x>';"),
            RenderMode::Detail,
        );
        assert_eq!(doc.matches("</script>").count(), 1);
        assert!(doc.contains("<\\/script><img src=x>"));
    }

    #[test]
    fn test_document_escapes_title() {
        let doc = document(&artifact("<Counter>", "1"), RenderMode::Detail);
        assert!(doc.contains("<title>&lt;Counter&gt;</title>"));
    }

    #[test]
    fn test_tile_and_detail_layouts() {
        let a = artifact("Counter", "let x = 1;");
        let tile = document(&a, RenderMode::Tile);
        let detail = document(&a, RenderMode::Detail);

        assert!(tile.contains("scale(0.85)"));
        assert!(tile.contains("117.5%"));
        assert!(tile.contains("overflow: hidden"));
        assert!(tile.contains("<div class=\"viewport\"><div id=\"app\"></div></div>"));

        assert!(!detail.contains("scale(0.85)"));
        assert!(detail.contains("<div id=\"app\"></div>"));
        // Error containment is the same in both modes.
        assert!(tile.contains("catch (error)"));
        assert!(detail.contains("catch (error)"));
    }

    /// Reverses [`escape_html`] to read the srcdoc back.
    fn srcdoc(fragment: &str) -> String {
        let start = fragment.find("srcdoc=\"").unwrap() + "srcdoc=\"".len();
        let end = fragment.rfind("\"></iframe>").unwrap();
        fragment[start..end]
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_fragment_inline_error_is_escaped() {
        let html = fragment(
            &MountContent::InlineError("<b>x</b> is not defined".to_string()),
            RenderMode::Detail,
        );
        assert!(srcdoc(&html).contains(
            "<div id=\"app\"><div style=\"color: #e53e3e; padding: 10px;\">Error: &lt;b&gt;x&lt;/b&gt; is not defined</div></div>"
        ));
    }

    #[test]
    fn test_fragment_tile_wraps_html() {
        let html = fragment(&MountContent::Html("<h2>0</h2>".to_string()), RenderMode::Tile);
        let page = srcdoc(&html);
        assert!(page.contains("<div class=\"viewport\"><div id=\"app\"><h2>0</h2></div></div>"));
        assert!(page.contains("scale(0.85)"));
    }

    #[test]
    fn test_fragment_keeps_artifact_markup_out_of_host_page() {
        let payload = "<img src=x onerror=\"fetch('/steal?'+document.cookie)\"><script>alert(1)</script>";
        let html = fragment(&MountContent::Html(payload.to_string()), RenderMode::Detail);

        assert!(html.starts_with("<iframe class=\"appshelf-preview\" sandbox=\"\" srcdoc=\""));
        assert!(html.ends_with("\"></iframe>"));
        // Only the iframe element itself is live markup.
        assert_eq!(html.matches('<').count(), 2);
        assert!(!html.contains("<img"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror=\""));

        let page = srcdoc(&html);
        assert!(page.contains(payload));
        assert!(page.contains(FRAGMENT_POLICY));
    }

    #[test]
    fn test_csp_sandboxes_document() {
        assert!(CONTENT_SECURITY_POLICY.starts_with("sandbox allow-scripts;"));
        assert!(!CONTENT_SECURITY_POLICY.contains("allow-same-origin"));
    }
}
