//! Fallback root index for aggregates the engine left without one.

use folio_attrs::Format;

use crate::package_list::link_extension;

/// File name of the root index for `format`.
pub fn index_file(format: &Format) -> String {
    format!("index.{}", link_extension(format))
}

/// Renders an index linking every `(name, path)` module.
pub fn render_index(title: &str, format: &Format, modules: &[(String, String)]) -> String {
    let ext = link_extension(format);
    if ext == "md" {
        let mut out = format!("# {title}\n\n## All modules\n\n");
        for (name, path) in modules {
            out.push_str(&format!("- [{name}]({path}/index.md)\n"));
        }
        return out;
    }

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(title)));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n<h2>All modules</h2>\n<ul>\n", escape(title)));
    for (name, path) in modules {
        out.push_str(&format!(
            "<li><a href=\"{}/index.html\">{}</a></li>\n",
            escape(path),
            escape(name)
        ));
    }
    out.push_str("</ul>\n</body>\n</html>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules() -> Vec<(String, String)> {
        vec![
            ("goodbye".to_string(), "goodbye".to_string()),
            ("hello".to_string(), "hello".to_string()),
        ]
    }

    #[test]
    fn html_index_links_modules() {
        let html = render_index("docs", &Format::html(), &modules());
        assert!(html.contains("<a href=\"hello/index.html\">hello</a>"));
        assert!(html.contains("<a href=\"goodbye/index.html\">goodbye</a>"));
        assert_eq!(index_file(&Format::html()), "index.html");
    }

    #[test]
    fn markdown_index_for_gfm() {
        let md = render_index("docs", &Format::gfm(), &modules());
        assert!(md.contains("- [hello](hello/index.md)"));
        assert_eq!(index_file(&Format::gfm()), "index.md");
    }

    #[test]
    fn names_are_escaped() {
        let html = render_index("a<b>", &Format::javadoc(), &[]);
        assert!(html.contains("<title>a&lt;b&gt;</title>"));
    }
}
